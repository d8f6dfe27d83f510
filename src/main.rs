//! gamemail - mail store administration
//!
//! Inspect a game server's mail database: inboxes, outboxes, expired mail.

use chrono::Utc;
use clap::{Parser, Subcommand};
use gamemail::config::MailConfig;
use gamemail::dao::MailStore;
use gamemail::items::IdOnlyItemStore;
use gamemail::model::{Mail, MailHandle};
use gamemail::GameMailError;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// gamemail - inspect a game server's mail store
#[derive(Parser, Debug)]
#[command(name = "gamemail")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/gamemail/config.yaml)
    #[arg(short, long, env = "GAMEMAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration and create the database schema
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show one mail by message id
    Show {
        /// Message id
        id: i32,
    },

    /// List mail received by a character
    Inbox {
        /// Character object id
        owner: i32,
    },

    /// List mail sent by a character
    Sent {
        /// Character object id
        owner: i32,
    },

    /// List mail that expired at or before a time
    Expired {
        /// Unix time in seconds (default: now)
        #[arg(long)]
        before: Option<i32>,
    },

    /// Show store operation counters for this run
    Stats,
}

fn main() {
    if let Err(e) = gamemail::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        if e.is_store_failure() {
            eprintln!("Check database.path in the configuration, or set RUST_LOG=gamemail=debug");
            process::exit(2);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> gamemail::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(MailConfig::default_path);

    if let Commands::Init { force } = cli.command {
        return handle_init(&config_path, force);
    }

    let config = match MailConfig::load(&config_path) {
        Ok(config) => config,
        Err(GameMailError::Config(msg)) if msg.contains("Config file not found") => {
            return Err(GameMailError::Config(
                "No configuration found. Run 'gamemail init' first to create one.".to_string(),
            ));
        }
        Err(e) => return Err(e),
    };

    let store = MailStore::open(&config, Arc::new(IdOnlyItemStore))?;

    match cli.command {
        // Handled before the store is opened
        Commands::Init { .. } => Ok(()),
        Commands::Show { id } => match store.try_load(id)? {
            Some(mail) => print_mails(&[mail], cli.json),
            None => Err(GameMailError::Other(format!("Mail {} not found", id))),
        },
        Commands::Inbox { owner } => print_mails(&store.received_by_owner(owner), cli.json),
        Commands::Sent { owner } => print_mails(&store.sent_by_owner(owner), cli.json),
        Commands::Expired { before } => {
            let threshold = match before {
                Some(t) => t,
                None => now_secs()?,
            };
            print_mails(&store.try_find_expired(threshold)?, cli.json)
        }
        Commands::Stats => {
            let stats = store.stats();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("loads:   {}", stats.load_count);
                println!("inserts: {}", stats.insert_count);
                println!("updates: {}", stats.update_count);
                println!("deletes: {}", stats.delete_count);
                println!("cached:  {}", store.cache().len());
            }
            Ok(())
        }
    }
}

fn handle_init(path: &Path, force: bool) -> gamemail::Result<()> {
    let config = if path.exists() && !force {
        println!("Using existing configuration at {}", path.display());
        MailConfig::load(path)?
    } else {
        let config = MailConfig::new();
        config.save(path)?;
        println!("Wrote configuration to {}", path.display());
        config
    };

    MailStore::open(&config, Arc::new(IdOnlyItemStore))?;
    println!("Mail database ready at {}", config.database.path.display());
    Ok(())
}

fn now_secs() -> gamemail::Result<i32> {
    let now = Utc::now().timestamp();
    i32::try_from(now).map_err(|_| {
        GameMailError::Other(format!("Current time {} does not fit mail timestamps", now))
    })
}

fn print_mails(mails: &[MailHandle], json: bool) -> gamemail::Result<()> {
    let snapshots: Vec<Mail> = mails.iter().map(MailHandle::snapshot).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("No mail.");
        return Ok(());
    }

    for mail in &snapshots {
        let flag = if mail.unread { "*" } else { " " };
        println!(
            "{} #{:<8} {:<16} -> {:<16} {:<32} items={} price={} expires={}",
            flag,
            mail.message_id(),
            mail.sender_name,
            mail.receiver_name,
            mail.topic,
            mail.attachments.len(),
            mail.price,
            mail.expire_time
        );
    }

    Ok(())
}
