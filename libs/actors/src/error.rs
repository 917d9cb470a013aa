//! Runtime Error Types
//!
//! Error taxonomy for actor creation, lookup, messaging and shutdown.
//! `Undeliverable` and `ShutdownIncomplete` are never returned to a sender;
//! they only appear inside [`Incident`](crate::incidents::Incident) records.

use thiserror::Error;

/// Why a message could not reach a live recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// No actor is registered under the target identity
    NotFound,
    /// The target has stopped accepting messages
    Terminated,
    /// The target mailbox is at capacity
    MailboxFull,
    /// The target does not accept this payload type
    TypeMismatch,
    /// A reply arrived after its ask had already timed out
    AskExpired,
    /// A reply was produced for a message with no sender and no correlation
    NoReplyAddress,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            DeliveryFailure::NotFound => "target not found",
            DeliveryFailure::Terminated => "target terminated",
            DeliveryFailure::MailboxFull => "mailbox full",
            DeliveryFailure::TypeMismatch => "payload type not accepted",
            DeliveryFailure::AskExpired => "ask already expired",
            DeliveryFailure::NoReplyAddress => "no reply address",
        };
        f.write_str(reason)
    }
}

/// Main runtime error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// An actor is already registered under this identity
    #[error("Duplicate identity: actor '{id}' is already registered")]
    DuplicateIdentity { id: String },

    /// Lookup miss
    #[error("Actor '{id}' not found")]
    NotFound { id: String },

    /// The requested parent is stopping and no longer adopts children
    #[error("Parent '{parent}' is {status} and cannot adopt '{child}'")]
    ParentUnavailable {
        parent: String,
        child: String,
        status: String,
    },

    /// No correlated reply arrived before the deadline
    #[error("Ask timeout: '{target}' did not reply within {timeout_ms}ms")]
    AskTimeout { target: String, timeout_ms: u64 },

    /// A reply arrived but carried an unexpected payload type
    #[error("Reply type mismatch: expected {expected}, got {actual}")]
    ReplyTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Marooned message (incident only)
    #[error("Undeliverable {message_type} to '{target}': {reason}")]
    Undeliverable {
        target: String,
        message_type: &'static str,
        reason: DeliveryFailure,
    },

    /// Child failed to confirm termination in time (incident only)
    #[error("Shutdown incomplete: '{child}' of '{parent}' did not terminate within {timeout_ms}ms")]
    ShutdownIncomplete {
        parent: String,
        child: String,
        timeout_ms: u64,
    },

    /// Failure raised by actor logic
    #[error("Handler error in '{actor}': {message}")]
    Handler { actor: String, message: String },

    /// Actor logic panicked while handling a message
    #[error("Actor '{actor}' panicked: {message}")]
    Panicked { actor: String, message: String },

    /// The system shut down while the operation was outstanding
    #[error("Actor system '{system}' stopped")]
    SystemStopped { system: String },

    /// Invalid runtime configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create a duplicate identity error
    pub fn duplicate(id: impl std::fmt::Display) -> Self {
        Self::DuplicateIdentity { id: id.to_string() }
    }

    /// Create a not found error
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create an ask timeout error
    pub fn ask_timeout(target: impl std::fmt::Display, timeout: std::time::Duration) -> Self {
        Self::AskTimeout {
            target: target.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create a handler error, usually from inside `Actor::handle`
    pub fn handler(actor: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Handler {
            actor: actor.to_string(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Whether the caller can reasonably retry or carry on
    pub fn is_recoverable(&self) -> bool {
        match self {
            ActorError::NotFound { .. } => true,
            ActorError::AskTimeout { .. } => true,
            ActorError::Undeliverable { .. } => true,
            ActorError::Handler { .. } => true,
            ActorError::DuplicateIdentity { .. } => false,
            ActorError::ParentUnavailable { .. } => false,
            ActorError::ReplyTypeMismatch { .. } => false,
            ActorError::ShutdownIncomplete { .. } => false,
            ActorError::Panicked { .. } => false,
            ActorError::SystemStopped { .. } => false,
            ActorError::Configuration { .. } => false,
        }
    }

    /// Short category name for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::DuplicateIdentity { .. } => "duplicate_identity",
            ActorError::NotFound { .. } => "not_found",
            ActorError::ParentUnavailable { .. } => "parent_unavailable",
            ActorError::AskTimeout { .. } => "ask_timeout",
            ActorError::ReplyTypeMismatch { .. } => "reply_type_mismatch",
            ActorError::Undeliverable { .. } => "undeliverable",
            ActorError::ShutdownIncomplete { .. } => "shutdown_incomplete",
            ActorError::Handler { .. } => "handler",
            ActorError::Panicked { .. } => "panicked",
            ActorError::SystemStopped { .. } => "system_stopped",
            ActorError::Configuration { .. } => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = ActorError::ask_timeout("tracker", Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "Ask timeout: 'tracker' did not reply within 250ms"
        );

        let err = ActorError::Undeliverable {
            target: "b".to_string(),
            message_type: "u32",
            reason: DeliveryFailure::MailboxFull,
        };
        assert_eq!(err.to_string(), "Undeliverable u32 to 'b': mailbox full");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ActorError::not_found("x").is_recoverable());
        assert!(ActorError::ask_timeout("x", Duration::from_secs(1)).is_recoverable());
        assert!(!ActorError::duplicate("x").is_recoverable());
        assert_eq!(ActorError::duplicate("x").category(), "duplicate_identity");
    }
}
