//! Uniform random oracle. Also the fallback when the configured oracle
//! cannot be started.

use std::time::Duration;

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;

use crate::board::position::Position;
use crate::board::types::Move;
use crate::oracle::oracle_trait::{oracle_rng, MoveOracle, OracleOutput};

pub struct RandomOracle {
    rng: StdRng,
}

impl RandomOracle {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: oracle_rng(seed),
        }
    }
}

impl Default for RandomOracle {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MoveOracle for RandomOracle {
    fn name(&self) -> &str {
        "random"
    }

    fn best_move(
        &mut self,
        _position: &Position,
        allowed: &[Move],
        _think_time: Duration,
    ) -> Result<OracleOutput, String> {
        let mut out = OracleOutput::default();
        out.info_lines
            .push(format!("random oracle allowed_moves {}", allowed.len()));
        out.best_move = allowed.choose(&mut self.rng).copied();
        Ok(out)
    }
}
