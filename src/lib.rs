//! Crate root module declarations for Chessuranga.
//!
//! A chess variant layered on an ordinary bitboard position: timed clocks,
//! power cards placed as board zones, per-piece buffs and a horde mode with
//! respawning pieces. The board layer knows nothing about the overlay; the
//! game layer drives both.

pub mod board {
    pub mod attacks;
    pub mod fen;
    pub mod movegen;
    pub mod position;
    pub mod render;
    pub mod types;
}

pub mod rules {
    pub mod capture;
    pub mod catalog;
    pub mod clock;
    pub mod horde;
    pub mod ledger;
    pub mod overrides;
    pub mod resolvers;
    pub mod zones;
}

pub mod game {
    pub mod config;
    pub mod decorations;
    pub mod errors;
    pub mod events;
    pub mod interaction;
    pub mod orchestrator;
    pub mod state;
}

pub mod oracle {
    pub mod greedy;
    pub mod oracle_trait;
    pub mod random;
    pub mod worker;
}

pub mod session;

pub mod frontend {
    pub mod text_loop;
}

pub mod utils {
    pub mod game_record;
}
