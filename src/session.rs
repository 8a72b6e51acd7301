//! Single owner of a [`Game`] plus the horde's move oracle.
//!
//! Background work (the oracle thread) never touches the game directly: its
//! replies are pulled in by [`Session::pump`] and applied through the same
//! entry point as human moves, and only when they answer the latest request
//! of the current game session.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::game::config::{GameConfig, GameMode};
use crate::game::errors::GameError;
use crate::game::orchestrator::{Game, MoveReport};
use crate::oracle::oracle_trait::MoveOracle;
use crate::oracle::random::RandomOracle;
use crate::oracle::worker::{OracleWorker, SearchReply, SearchRequest};

enum OracleBackend {
    Worker(OracleWorker),
    /// Answered on the caller's thread, used when no worker could be started.
    Inline(Box<dyn MoveOracle>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    request_id: u64,
    session_id: u64,
}

pub struct Session {
    game: Game,
    oracle: OracleBackend,
    next_request_id: u64,
    outstanding: Option<Outstanding>,
}

impl Session {
    /// Start the configured oracle on its own thread, falling back to inline
    /// random moves when it is unavailable.
    pub fn new(config: GameConfig) -> Self {
        let oracle = match OracleWorker::for_config(&config) {
            Ok(worker) => {
                info!(oracle = worker.name(), "move oracle ready");
                OracleBackend::Worker(worker)
            }
            Err(err) => {
                warn!(%err, "move oracle unavailable, horde plays random moves");
                OracleBackend::Inline(Box::new(RandomOracle::new(config.seed)))
            }
        };
        Self::with_backend(config, oracle)
    }

    /// Session whose oracle runs synchronously inside [`Session::pump`].
    pub fn with_inline_oracle(config: GameConfig, oracle: Box<dyn MoveOracle>) -> Self {
        Self::with_backend(config, OracleBackend::Inline(oracle))
    }

    fn with_backend(config: GameConfig, oracle: OracleBackend) -> Self {
        Self {
            game: Game::new(config),
            oracle,
            next_request_id: 0,
            outstanding: None,
        }
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn oracle_name(&self) -> &str {
        match &self.oracle {
            OracleBackend::Worker(worker) => worker.name(),
            OracleBackend::Inline(oracle) => oracle.name(),
        }
    }

    #[inline]
    pub fn is_searching(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn start(&mut self, mode: GameMode) {
        self.outstanding = None;
        if let OracleBackend::Inline(oracle) = &mut self.oracle {
            oracle.new_game();
        }
        self.game.start(mode);
    }

    pub fn reset(&mut self) {
        self.outstanding = None;
        self.game.reset();
    }

    /// Feed real elapsed time to the game clock and respawn queue.
    pub fn advance(&mut self, elapsed: Duration) {
        self.game.advance_time(elapsed);
    }

    /// Apply any finished search and ask for a new one when the horde is to
    /// move. Returns the horde move applied by this call, if any.
    pub fn pump(&mut self) -> Result<Option<MoveReport>, GameError> {
        let replies: Vec<SearchReply> = match &self.oracle {
            OracleBackend::Worker(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
            OracleBackend::Inline(_) => Vec::new(),
        };
        let mut applied = None;
        for reply in replies {
            if let Some(report) = self.accept_reply(reply)? {
                applied = Some(report);
            }
        }
        if applied.is_some() || self.outstanding.is_some() || !self.game.is_bot_turn() {
            return Ok(applied);
        }

        let allowed = self.game.bot_allowed_moves();
        if allowed.is_empty() {
            debug!("horde has no allowed move");
            return Ok(None);
        }
        self.next_request_id += 1;
        let key = Outstanding {
            request_id: self.next_request_id,
            session_id: self.game.session_id(),
        };
        let request = SearchRequest {
            request_id: key.request_id,
            session_id: key.session_id,
            position: self.game.position().clone(),
            allowed,
            think_time: self.game.config().bot_think_time,
        };

        let submitted = match &mut self.oracle {
            OracleBackend::Worker(worker) => worker.submit(request).map(|()| None),
            OracleBackend::Inline(oracle) => Ok(Some(search_inline(oracle.as_mut(), &request))),
        };
        match submitted {
            Ok(None) => {
                debug!(request = key.request_id, "horde search requested");
                self.outstanding = Some(key);
                Ok(None)
            }
            Ok(Some(reply)) => {
                self.outstanding = Some(key);
                self.accept_reply(reply)
            }
            Err(err) => {
                warn!(%err, "move oracle lost, horde plays random moves");
                self.oracle =
                    OracleBackend::Inline(Box::new(RandomOracle::new(self.game.config().seed)));
                Ok(None)
            }
        }
    }

    /// Like [`Session::pump`], but waits up to `timeout` for an outstanding
    /// worker search to finish.
    pub fn await_bot(&mut self, timeout: Duration) -> Result<Option<MoveReport>, GameError> {
        if let Some(report) = self.pump()? {
            return Ok(Some(report));
        }
        let reply = match &self.oracle {
            OracleBackend::Worker(worker) if self.outstanding.is_some() => {
                worker.recv_timeout(timeout)
            }
            _ => None,
        };
        match reply {
            Some(reply) => self.accept_reply(reply),
            None => Ok(None),
        }
    }

    fn accept_reply(&mut self, reply: SearchReply) -> Result<Option<MoveReport>, GameError> {
        let key = Outstanding {
            request_id: reply.request_id,
            session_id: reply.session_id,
        };
        if self.outstanding != Some(key) || key.session_id != self.game.session_id() {
            debug!(
                request = reply.request_id,
                session = reply.session_id,
                "discarding stale oracle reply"
            );
            return Ok(None);
        }
        self.outstanding = None;
        for line in &reply.info_lines {
            debug!(request = reply.request_id, "{line}");
        }
        if !self.game.is_bot_turn() {
            return Ok(None);
        }
        match reply.best_move {
            Some(mv) => self.game.apply_bot_move(mv).map(Some),
            None => Err(GameError::OracleNoMove),
        }
    }
}

fn search_inline(oracle: &mut dyn MoveOracle, request: &SearchRequest) -> SearchReply {
    let output = oracle
        .best_move(&request.position, &request.allowed, Duration::ZERO)
        .unwrap_or_else(|err| {
            warn!(%err, "inline oracle search failed");
            Default::default()
        });
    SearchReply {
        request_id: request.request_id,
        session_id: request.session_id,
        best_move: output.best_move,
        info_lines: output.info_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::{Color, Move};

    fn config() -> GameConfig {
        GameConfig {
            bot_engine: "random".to_owned(),
            bot_think_time: Duration::ZERO,
            respawn_delay: Duration::from_millis(10),
            seed: Some(17),
            ..GameConfig::default()
        }
    }

    fn mv(text: &str) -> Move {
        text.parse().expect("test move should parse")
    }

    #[test]
    fn inline_oracle_answers_the_horde_turn() {
        let mut session =
            Session::with_inline_oracle(config(), Box::new(RandomOracle::new(Some(1))));
        session.start(GameMode::Horde);
        assert_eq!(session.pump().expect("nothing to do"), None);

        session
            .game_mut()
            .attempt_move(mv("e2e4"))
            .expect("human move");
        let report = session
            .pump()
            .expect("horde move")
            .expect("horde should move at once");
        assert_eq!(report.applied.piece.color, Color::Dark);
        assert_eq!(session.game().side_to_move(), Color::Light);
        assert!(!session.is_searching());
    }

    #[test]
    fn worker_oracle_answers_the_horde_turn() {
        let mut session = Session::new(config());
        assert_eq!(session.oracle_name(), "random");
        session.start(GameMode::Horde);
        session
            .game_mut()
            .attempt_move(mv("d2d4"))
            .expect("human move");

        let report = session
            .await_bot(Duration::from_secs(5))
            .expect("horde move")
            .expect("worker should reply in time");
        assert_eq!(report.applied.piece.color, Color::Dark);
        assert_eq!(session.game().side_to_move(), Color::Light);
    }

    #[test]
    fn unknown_engine_falls_back_to_random() {
        let session = Session::new(GameConfig {
            bot_engine: "stockfish".to_owned(),
            ..config()
        });
        assert_eq!(session.oracle_name(), "random");
    }

    #[test]
    fn stale_replies_are_discarded() {
        let mut session =
            Session::with_inline_oracle(config(), Box::new(RandomOracle::new(Some(1))));
        session.start(GameMode::Horde);
        session
            .game_mut()
            .attempt_move(mv("e2e4"))
            .expect("human move");
        let old_session = session.game().session_id();
        session.outstanding = Some(Outstanding {
            request_id: 4,
            session_id: old_session,
        });

        session.reset();
        session.start(GameMode::Horde);
        let before = session.game().position().clone();
        let stale = SearchReply {
            request_id: 4,
            session_id: old_session,
            best_move: Some(mv("e7e5")),
            info_lines: Vec::new(),
        };
        assert_eq!(session.accept_reply(stale).expect("stale reply"), None);
        assert_eq!(session.game().position(), &before);
    }

    #[test]
    fn mismatched_request_id_is_ignored() {
        let mut session =
            Session::with_inline_oracle(config(), Box::new(RandomOracle::new(Some(1))));
        session.start(GameMode::Horde);
        session
            .game_mut()
            .attempt_move(mv("e2e4"))
            .expect("human move");
        let current = session.game().session_id();
        session.outstanding = Some(Outstanding {
            request_id: 2,
            session_id: current,
        });
        let early = SearchReply {
            request_id: 1,
            session_id: current,
            best_move: Some(mv("e7e5")),
            info_lines: Vec::new(),
        };
        assert_eq!(session.accept_reply(early).expect("early reply"), None);
        assert_eq!(session.game().side_to_move(), Color::Dark);
        assert!(session.is_searching());
    }
}
