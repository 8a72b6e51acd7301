//! Move-search abstraction for the horde side.
//!
//! An oracle only ever sees a position and the moves the overlay allows; it
//! never holds powers and never mutates game state.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::position::Position;
use crate::board::types::Move;
use crate::game::config::BotEngine;
use crate::oracle::greedy::GreedyOracle;
use crate::oracle::random::RandomOracle;

#[derive(Debug, Clone, Default)]
pub struct OracleOutput {
    pub best_move: Option<Move>,
    pub info_lines: Vec<String>,
}

pub trait MoveOracle: Send {
    fn name(&self) -> &str;

    fn new_game(&mut self) {}

    /// Pick one of `allowed` for the side to move in `position`, or `None`
    /// when the list is empty.
    fn best_move(
        &mut self,
        position: &Position,
        allowed: &[Move],
        think_time: Duration,
    ) -> Result<OracleOutput, String>;
}

pub fn build_oracle(kind: BotEngine, seed: Option<u64>) -> Box<dyn MoveOracle> {
    match kind {
        BotEngine::Greedy => Box::new(GreedyOracle::new(seed)),
        BotEngine::Random => Box::new(RandomOracle::new(seed)),
    }
}

/// Reproducible when seeded, otherwise drawn from the thread rng.
pub(crate) fn oracle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}
