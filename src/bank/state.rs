//! Serializes access to a session by draining operations from a channel.
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bank::{Operation, Session};

/// Owns the session while operations are applied one at a time.
pub struct State {
    /// The session every operation is applied to.
    session: Session,
    /// A channel receiver for incoming operations.
    receiver: mpsc::Receiver<Operation>,
    /// Number of operations that were rejected.
    rejected: usize,
}

impl State {
    /// Creates a state that applies operations from `receiver` to `session`.
    pub fn new(session: Session, receiver: mpsc::Receiver<Operation>) -> Self {
        State {
            session,
            receiver,
            rejected: 0,
        }
    }

    /// Gets the session operations are applied to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Gets the number of operations rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Hands the session back once the loop has finished.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Runs until every sender is dropped.
    pub async fn run(&mut self) {
        while let Some(operation) = self.receiver.recv().await {
            match operation.apply(&mut self.session) {
                Ok(outcome) => debug!(?outcome, "operation applied"),
                Err(error) => {
                    self.rejected += 1;
                    warn!(op = ?operation.op_type(), %error, "operation rejected");
                }
            }
        }
    }
}
