//! Logical composition of conditions

use crate::{Condition, Env};

/// Passes when every inner condition passes (an empty list passes)
#[derive(Default)]
pub struct And {
    conditions: Vec<Box<dyn Condition>>,
}

impl And {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Condition for And {
    fn test(&self, env: &Env<'_>) -> bool {
        self.conditions.iter().all(|c| c.test(env))
    }

    fn name(&self) -> &'static str {
        "and"
    }
}

/// Passes when any inner condition passes (an empty list fails)
#[derive(Default)]
pub struct Or {
    conditions: Vec<Box<dyn Condition>>,
}

impl Or {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Condition for Or {
    fn test(&self, env: &Env<'_>) -> bool {
        self.conditions.iter().any(|c| c.test(env))
    }

    fn name(&self) -> &'static str {
        "or"
    }
}

/// Inverts the inner condition
pub struct Not {
    inner: Box<dyn Condition>,
}

impl Not {
    pub fn new(condition: impl Condition + 'static) -> Self {
        Self {
            inner: Box::new(condition),
        }
    }
}

impl Condition for Not {
    fn test(&self, env: &Env<'_>) -> bool {
        !self.inner.test(env)
    }

    fn name(&self) -> &'static str {
        "not"
    }
}
