//! Progress reporting handle passed to transports
//!
//! Each transport call receives a [`ProgressReporter`] bound to the entry and
//! attempt it was issued for. Reports are applied straight to the session
//! state under its lock, and are ignored once the entry is gone, has left
//! `uploading`, or has moved on to a newer attempt.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::app::models::FileId;

use super::state::SessionState;

#[derive(Debug, Clone)]
enum Target {
    Session {
        state: Arc<Mutex<SessionState>>,
        id: FileId,
        attempt: u32,
    },
    Channel(mpsc::UnboundedSender<f64>),
    Detached,
}

/// Attempt-scoped progress sink for one transport call
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    target: Target,
}

impl ProgressReporter {
    pub(crate) fn for_attempt(state: Arc<Mutex<SessionState>>, id: FileId, attempt: u32) -> Self {
        Self {
            target: Target::Session { state, id, attempt },
        }
    }

    /// Reporter that forwards every value to a channel
    ///
    /// Useful for driving a transport outside a session.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<f64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                target: Target::Channel(tx),
            },
            rx,
        )
    }

    /// Reporter that discards every value
    pub fn detached() -> Self {
        Self {
            target: Target::Detached,
        }
    }

    /// Report progress as a percentage in `[0, 100]`
    ///
    /// Returns `true` if the value was applied.
    pub async fn report(&self, percent: f64) -> bool {
        match &self.target {
            Target::Session { state, id, attempt } => {
                state.lock().await.apply_progress(id, *attempt, percent)
            }
            Target::Channel(tx) => tx.send(percent).is_ok(),
            Target::Detached => false,
        }
    }

    /// Check whether reports can still land anywhere
    ///
    /// A session reporter goes dead once its entry is removed, resolved, or
    /// superseded by a retry. A channel reporter goes dead when the receiver
    /// is dropped. A detached reporter is always live.
    pub async fn is_live(&self) -> bool {
        match &self.target {
            Target::Session { state, id, attempt } => {
                state.lock().await.is_current_attempt(id, *attempt)
            }
            Target::Channel(tx) => !tx.is_closed(),
            Target::Detached => true,
        }
    }

    /// Entry this reporter is bound to, if any
    pub fn file_id(&self) -> Option<&FileId> {
        match &self.target {
            Target::Session { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Attempt this reporter is bound to, if any
    pub fn attempt(&self) -> Option<u32> {
        match &self.target {
            Target::Session { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}
