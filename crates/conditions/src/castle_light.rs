//! Condition: castle light/dark side

use crate::{Condition, Env};

/// Passes when the character's clan castle sided with the configured side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastleLight {
    light: bool,
}

impl CastleLight {
    pub fn new(light: bool) -> Self {
        Self { light }
    }

    pub fn light(&self) -> bool {
        self.light
    }
}

impl Condition for CastleLight {
    fn test(&self, env: &Env<'_>) -> bool {
        let Some(player) = env.character.as_player() else {
            return false;
        };

        if !player.has_clan() {
            return false;
        }

        match player.castle() {
            Some(castle) => castle.is_light() == self.light,
            None => false,
        }
    }

    fn name(&self) -> &'static str {
        "castle-light"
    }
}
