//! Stat conditions for skill and item effects
//!
//! A condition is a pure boolean check evaluated against an [`Env`] that
//! describes the acting character. Conditions carry their configuration at
//! construction time and hold no mutable state, so one instance can be shared
//! across threads and evaluated any number of times.
//!
//! # Example
//!
//! ```
//! use conditions::{CastleLight, Condition, Env, Not};
//! use conditions::{Castle, Creature, Player};
//!
//! struct Fortress;
//! impl Castle for Fortress {
//!     fn is_light(&self) -> bool { true }
//! }
//!
//! struct Knight { castle: Fortress }
//! impl Player for Knight {
//!     fn clan_id(&self) -> Option<i32> { Some(7) }
//!     fn castle(&self) -> Option<&dyn Castle> { Some(&self.castle) }
//! }
//! impl Creature for Knight {
//!     fn as_player(&self) -> Option<&dyn Player> { Some(self) }
//! }
//!
//! let knight = Knight { castle: Fortress };
//! let env = Env::new(&knight);
//!
//! assert!(CastleLight::new(true).test(&env));
//! assert!(!Not::new(CastleLight::new(true)).test(&env));
//! ```

mod castle_light;
mod env;
mod logic;

pub use castle_light::CastleLight;
pub use env::{Castle, Creature, Env, Player};
pub use logic::{And, Not, Or};

/// A boolean check over an evaluation environment
pub trait Condition: Send + Sync {
    /// Evaluate the condition
    fn test(&self, env: &Env<'_>) -> bool;

    /// Short identifier used in logs and rule listings
    fn name(&self) -> &'static str;
}

impl<C: Condition + ?Sized> Condition for Box<C> {
    fn test(&self, env: &Env<'_>) -> bool {
        (**self).test(env)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
