//! Actor References
//!
//! The only way code outside an actor touches it. A reference can enqueue
//! messages, read the lifecycle status and request a stop; it never exposes
//! the actor's state or its execution context.

use crate::error::DeliveryFailure;
use crate::incidents::IncidentLog;
use crate::mailbox::Mailbox;
use crate::message::Envelope;
use crate::registry::ActorId;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::trace;

/// Actor lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorStatus {
    Created,
    Running,
    Stopping,
    Terminated,
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorStatus::Created => "created",
            ActorStatus::Running => "running",
            ActorStatus::Stopping => "stopping",
            ActorStatus::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// State shared by every clone of one actor's reference
#[derive(Debug)]
pub(crate) struct ActorCell {
    status: watch::Sender<ActorStatus>,
    abort: Mutex<Option<AbortHandle>>,
}

/// Location-transparent handle to a live actor
#[derive(Debug, Clone)]
pub struct ActorRef {
    id: ActorId,
    parent: Option<ActorId>,
    /// Bumped each time the actor is restarted in place
    incarnation: u64,
    mailbox: Mailbox,
    cell: Arc<ActorCell>,
    incidents: Arc<IncidentLog>,
}

impl ActorRef {
    pub(crate) fn new(
        id: ActorId,
        parent: Option<ActorId>,
        mailbox: Mailbox,
        incidents: Arc<IncidentLog>,
    ) -> Self {
        let (status, _) = watch::channel(ActorStatus::Created);
        Self {
            id,
            parent,
            incarnation: 0,
            mailbox,
            cell: Arc::new(ActorCell {
                status,
                abort: Mutex::new(None),
            }),
            incidents,
        }
    }

    /// A reference with no running loop behind it
    #[cfg(test)]
    pub(crate) fn detached(id: ActorId, parent: Option<ActorId>) -> Self {
        let (mailbox, _receiver) = Mailbox::new(16);
        Self::new(id, parent, mailbox, Arc::new(IncidentLog::new(16)))
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Parent identity; a lookup key into the registry, not ownership
    pub fn parent(&self) -> Option<&ActorId> {
        self.parent.as_ref()
    }

    pub fn incarnation(&self) -> u64 {
        self.incarnation
    }

    /// Current lifecycle status
    ///
    /// Cheap and non-blocking, but only a snapshot: the actor may have moved
    /// on by the time the caller acts on the value.
    pub fn status(&self) -> ActorStatus {
        *self.cell.status.borrow()
    }

    /// Whether both references point at the same actor instance
    pub fn same_actor(&self, other: &ActorRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Messages waiting in the mailbox
    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }

    /// Fire-and-forget send
    ///
    /// Returns immediately. A message that cannot be enqueued (terminated
    /// actor, full mailbox) is reported as marooned instead of failing.
    pub fn tell<M: Send + 'static>(&self, message: M, sender: Option<&ActorId>) {
        self.deliver(Envelope::new(message, sender.cloned()));
    }

    /// Enqueue a prepared envelope, reporting it when undeliverable
    pub(crate) fn deliver(&self, envelope: Envelope) -> bool {
        if self.status() == ActorStatus::Terminated {
            self.incidents.undeliverable(
                &self.id,
                envelope.sender(),
                envelope.message_type(),
                DeliveryFailure::Terminated,
            );
            return false;
        }

        trace!(actor_id = %self.id, message_type = envelope.message_type(), "Enqueueing message");
        match self.mailbox.enqueue(envelope) {
            Ok(()) => true,
            Err((envelope, reason)) => {
                self.incidents.undeliverable(
                    &self.id,
                    envelope.sender(),
                    envelope.message_type(),
                    reason,
                );
                false
            }
        }
    }

    /// Request a stop; processed after messages already in the mailbox
    pub fn stop(&self) {
        if !self.mailbox.request_stop() {
            trace!(actor_id = %self.id, "Stop requested for closed mailbox");
        }
    }

    /// Wait until the actor reaches `Terminated`; false on timeout
    pub async fn wait_terminated(&self, timeout: Duration) -> bool {
        let mut rx = self.cell.status.subscribe();
        let terminated = match tokio::time::timeout(
            timeout,
            rx.wait_for(|status| *status == ActorStatus::Terminated),
        )
        .await
        {
            Ok(result) => result.is_ok(),
            Err(_) => false,
        };
        terminated
    }

    /// Move to `next`; `Terminated` is final
    pub(crate) fn set_status(&self, next: ActorStatus) -> bool {
        self.cell.status.send_if_modified(|current| {
            if *current == ActorStatus::Terminated || *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    pub(crate) fn attach_task(&self, handle: AbortHandle) {
        *self.cell.abort.lock() = Some(handle);
    }

    /// Abort the processing loop without running its cleanup
    pub(crate) fn abort(&self) {
        if let Some(handle) = self.cell.abort.lock().take() {
            handle.abort();
        }
        self.set_status(ActorStatus::Terminated);
    }

    /// Same actor, next incarnation
    pub(crate) fn next_incarnation(&self) -> ActorRef {
        ActorRef {
            incarnation: self.incarnation + 1,
            ..self.clone()
        }
    }
}
