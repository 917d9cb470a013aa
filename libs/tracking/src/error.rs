//! Tracking Error Types

use crate::messages::TrackingId;
use actor_runtime::ActorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// The runtime failed the request (timeout, lookup, shutdown)
    #[error(transparent)]
    Runtime(#[from] ActorError),

    #[error("No tracking entry with id {id}")]
    EntryNotFound { id: TrackingId },

    #[error("Unexpected reply to {request}: {reply}")]
    UnexpectedReply {
        request: &'static str,
        reply: String,
    },
}

pub type Result<T> = std::result::Result<T, TrackingError>;

impl TrackingError {
    /// True when the backing actor did not answer in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackingError::Runtime(ActorError::AskTimeout { .. }))
    }
}
