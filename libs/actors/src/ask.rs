//! Pending Asks
//!
//! Request/response on top of one-way delivery. Each `ask` parks a oneshot
//! slot under a fresh correlation token; the reply carrying that token fills
//! it. Whichever comes first, reply or deadline, removes the entry, so a
//! late reply finds nothing and is reported instead of reaching a stale
//! waiter.

use crate::error::{ActorError, Result};
use crate::message::CorrelationId;
use crate::registry::ActorId;
use dashmap::DashMap;
use std::any::Any;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::debug;

/// Reply payload with the type name it was produced as
pub(crate) type Reply = (Box<dyn Any + Send>, &'static str);

#[derive(Debug)]
struct PendingAsk {
    slot: oneshot::Sender<Reply>,
    target: ActorId,
    /// `None` when the timeout reaches past what `Instant` can represent
    deadline: Option<Instant>,
}

/// Table of outstanding asks, keyed by correlation token
#[derive(Debug, Default)]
pub(crate) struct PendingAsks {
    waiters: DashMap<CorrelationId, PendingAsk>,
}

impl PendingAsks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Park a waiter for a reply from `target`
    pub(crate) fn register(
        &self,
        target: &ActorId,
        timeout: Duration,
    ) -> (CorrelationId, oneshot::Receiver<Reply>) {
        let token = CorrelationId::next();
        let (slot, receiver) = oneshot::channel();
        self.waiters.insert(
            token,
            PendingAsk {
                slot,
                target: target.clone(),
                deadline: Instant::now().checked_add(timeout),
            },
        );
        (token, receiver)
    }

    /// Hand a reply to its waiter; gives the reply back when nobody waits
    pub(crate) fn complete(&self, token: CorrelationId, reply: Reply) -> std::result::Result<(), Reply> {
        match self.waiters.remove(&token) {
            Some((_, pending)) => {
                let remaining_ms = pending
                    .deadline
                    .map(|deadline| deadline.saturating_duration_since(Instant::now()).as_millis() as u64);
                debug!(
                    correlation = %token,
                    target_actor = %pending.target,
                    remaining_ms = ?remaining_ms,
                    "Completing ask"
                );
                pending.slot.send(reply)
            }
            None => Err(reply),
        }
    }

    /// Drop a waiter whose deadline fired
    pub(crate) fn discard(&self, token: CorrelationId) -> bool {
        self.waiters.remove(&token).is_some()
    }

    /// Drop every waiter; their asks fail with `SystemStopped`
    pub(crate) fn fail_all(&self) -> usize {
        let count = self.waiters.len();
        self.waiters.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }
}

/// Removes the waiter when the awaiting future is dropped before finishing
struct AbandonGuard<'a> {
    pending: &'a PendingAsks,
    token: CorrelationId,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.pending.discard(self.token) {
            debug!(correlation = %self.token, "Ask abandoned by caller");
        }
    }
}

/// Await a parked reply until `timeout`, then downcast it to `R`
///
/// The waiter is removed on every exit, including when the caller drops
/// this future early (an outer `select!` or timeout, an aborted task).
pub(crate) async fn await_reply<R: Send + 'static>(
    pending: &PendingAsks,
    token: CorrelationId,
    receiver: oneshot::Receiver<Reply>,
    target: &ActorId,
    timeout: Duration,
    system_name: &str,
) -> Result<R> {
    let _guard = AbandonGuard { pending, token };
    match tokio::time::timeout(timeout, receiver).await {
        Ok(Ok((payload, actual))) => payload
            .downcast::<R>()
            .map(|reply| *reply)
            .map_err(|_| ActorError::ReplyTypeMismatch {
                expected: std::any::type_name::<R>(),
                actual,
            }),
        Ok(Err(_)) => Err(ActorError::SystemStopped {
            system: system_name.to_string(),
        }),
        Err(_) => {
            debug!(correlation = %token, target_actor = %target, "Ask timed out");
            Err(ActorError::ask_timeout(target, timeout))
        }
    }
}
