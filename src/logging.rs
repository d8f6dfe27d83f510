//! Logging configuration using tracing
//!
//! Structured logging to stderr, filtered through the RUST_LOG environment
//! variable. Store events carry `message_id`, `owner_id` and `role` fields so
//! one mailbox can be followed through a log.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is unset: failures from everywhere, plus the
/// database open and other lifecycle events from this crate
pub const DEFAULT_FILTER: &str = "warn,gamemail=info";

/// Initialize the tracing subscriber
///
/// # Example RUST_LOG values
/// - `RUST_LOG=error` - Only failed store operations
/// - `RUST_LOG=gamemail=debug` - Cache misses, skipped attachments, removed ownership entries
/// - `RUST_LOG=gamemail::dao=trace` - Every statement the mail store runs, with its SQL
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| {
            crate::GameMailError::Other(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}
