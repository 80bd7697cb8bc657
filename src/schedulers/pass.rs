use std::any::Any;

use crate::{
    Result,
    ports::{MatchContext, Scheduler},
    state::{Decision, State},
};

/// Never acts. Useful as a do-nothing opponent.
pub struct PassScheduler {
    name: String,
}

impl PassScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::new("Pass")
    }
}

impl Scheduler for PassScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_match_details(&mut self, _context: &MatchContext, _agent: usize, _mirror: bool) {}

    fn decide(&mut self, _state: &State) -> Result<Decision> {
        Ok(Decision::forced())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
