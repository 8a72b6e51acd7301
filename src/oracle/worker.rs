//! Background oracle thread.
//!
//! The worker owns its oracle and talks to the session only through two
//! channels. Replies carry the request and session ids they were asked with
//! so the session can discard anything stale.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::board::position::Position;
use crate::board::types::Move;
use crate::game::config::GameConfig;
use crate::game::errors::GameError;
use crate::oracle::oracle_trait::{build_oracle, MoveOracle, OracleOutput};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub request_id: u64,
    pub session_id: u64,
    pub position: Position,
    pub allowed: Vec<Move>,
    /// Minimum time before the reply is posted.
    pub think_time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReply {
    pub request_id: u64,
    pub session_id: u64,
    pub best_move: Option<Move>,
    pub info_lines: Vec<String>,
}

enum WorkerMessage {
    Search(SearchRequest),
    Shutdown,
}

pub struct OracleWorker {
    name: String,
    requests: Sender<WorkerMessage>,
    replies: Receiver<SearchReply>,
    handle: Option<JoinHandle<()>>,
}

impl OracleWorker {
    pub fn spawn(oracle: Box<dyn MoveOracle>) -> Result<Self, GameError> {
        let name = oracle.name().to_owned();
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("chessuranga-oracle".to_owned())
            .spawn(move || run_worker(oracle, request_rx, reply_tx))
            .map_err(|err| GameError::OracleUnavailable(err.to_string()))?;
        debug!(oracle = %name, "oracle worker spawned");
        Ok(Self {
            name,
            requests: request_tx,
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    /// Start the oracle named in `config`.
    pub fn for_config(config: &GameConfig) -> Result<Self, GameError> {
        let kind = config.bot_engine_kind().ok_or_else(|| {
            GameError::OracleUnavailable(format!("unknown engine '{}'", config.bot_engine))
        })?;
        Self::spawn(build_oracle(kind, config.seed))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn submit(&self, request: SearchRequest) -> Result<(), GameError> {
        self.requests
            .send(WorkerMessage::Search(request))
            .map_err(|_| GameError::OracleUnavailable("oracle worker has stopped".to_owned()))
    }

    pub fn try_recv(&self) -> Option<SearchReply> {
        self.replies.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SearchReply> {
        self.replies.recv_timeout(timeout).ok()
    }
}

impl Drop for OracleWorker {
    fn drop(&mut self) {
        let _ = self.requests.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    mut oracle: Box<dyn MoveOracle>,
    requests: Receiver<WorkerMessage>,
    replies: Sender<SearchReply>,
) {
    let mut current_session = None;
    while let Ok(message) = requests.recv() {
        let request = match message {
            WorkerMessage::Search(request) => request,
            WorkerMessage::Shutdown => break,
        };
        if current_session != Some(request.session_id) {
            oracle.new_game();
            current_session = Some(request.session_id);
        }

        let started = Instant::now();
        let output = oracle
            .best_move(&request.position, &request.allowed, request.think_time)
            .unwrap_or_else(|err| {
                warn!(%err, "oracle search failed");
                OracleOutput::default()
            });
        if let Some(rest) = request.think_time.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }

        let reply = SearchReply {
            request_id: request.request_id,
            session_id: request.session_id,
            best_move: output.best_move,
            info_lines: output.info_lines,
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
    debug!("oracle worker stopped");
}
