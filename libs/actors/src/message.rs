//! Message Envelopes
//!
//! The runtime never looks inside a payload. It carries the payload as a
//! boxed `Any` together with its type name, the optional sender identity
//! used for reply addressing, and the correlation token of an `ask`.
//! Each actor declares the one payload type it accepts
//! (`Actor::Message`); the processing loop downcasts at the mailbox boundary.

use crate::registry::ActorId;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Token routing an `ask` reply back to its waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Generate a process-unique token
    pub fn next() -> Self {
        Self(CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ask-{}", self.0)
    }
}

/// Immutable message value travelling through a mailbox
pub struct Envelope {
    payload: Box<dyn Any + Send>,
    message_type: &'static str,
    sender: Option<ActorId>,
    correlation: Option<CorrelationId>,
}

impl Envelope {
    /// Wrap a plain payload
    pub fn new<M: Send + 'static>(payload: M, sender: Option<ActorId>) -> Self {
        Self {
            payload: Box::new(payload),
            message_type: std::any::type_name::<M>(),
            sender,
            correlation: None,
        }
    }

    /// Wrap a payload that expects a correlated reply
    pub fn with_correlation<M: Send + 'static>(
        payload: M,
        sender: Option<ActorId>,
        correlation: CorrelationId,
    ) -> Self {
        Self {
            correlation: Some(correlation),
            ..Self::new(payload, sender)
        }
    }

    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    pub fn sender(&self) -> Option<&ActorId> {
        self.sender.as_ref()
    }

    pub fn correlation(&self) -> Option<CorrelationId> {
        self.correlation
    }

    /// Check the payload type without consuming the envelope
    pub fn is<M: 'static>(&self) -> bool {
        self.payload.is::<M>()
    }

    /// Take the payload out as `M`; hands the envelope back on mismatch
    pub fn downcast<M: 'static>(self) -> std::result::Result<(M, EnvelopeMeta), Envelope> {
        let Envelope {
            payload,
            message_type,
            sender,
            correlation,
        } = self;
        match payload.downcast::<M>() {
            Ok(typed) => Ok((
                *typed,
                EnvelopeMeta {
                    message_type,
                    sender,
                    correlation,
                },
            )),
            Err(payload) => Err(Envelope {
                payload,
                message_type,
                sender,
                correlation,
            }),
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message_type", &self.message_type)
            .field("sender", &self.sender)
            .field("correlation", &self.correlation)
            .finish()
    }
}

/// Addressing data of an envelope once its payload is taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeMeta {
    pub message_type: &'static str,
    pub sender: Option<ActorId>,
    pub correlation: Option<CorrelationId>,
}
