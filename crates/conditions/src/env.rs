//! Evaluation environment and the capabilities conditions can query

/// A castle (fortification) held by a clan
pub trait Castle {
    /// Whether the castle sided with light (`false` means dark)
    fn is_light(&self) -> bool;
}

/// Player-only capabilities
pub trait Player {
    /// Clan the player belongs to, if any
    fn clan_id(&self) -> Option<i32>;

    /// Castle owned by the player's clan, if any
    fn castle(&self) -> Option<&dyn Castle>;

    fn has_clan(&self) -> bool {
        self.clan_id().is_some()
    }
}

/// Any character in the world: players, monsters, summons
pub trait Creature {
    /// Player view of this creature, `None` for non-player characters
    fn as_player(&self) -> Option<&dyn Player>;

    fn is_player(&self) -> bool {
        self.as_player().is_some()
    }
}

/// Environment a condition is evaluated in
#[derive(Clone, Copy)]
pub struct Env<'a> {
    /// The acting character
    pub character: &'a dyn Creature,
}

impl<'a> Env<'a> {
    pub fn new(character: &'a dyn Creature) -> Self {
        Self { character }
    }
}

impl std::fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("character_is_player", &self.character.is_player())
            .finish()
    }
}
