//! Actor Execution Context
//!
//! Handed by the processing loop to the actor's own callbacks and to nobody
//! else. It is how actor logic calls back into the system: creating
//! children, messaging other actors, replying, and asking.

use crate::actor::Actor;
use crate::actor_ref::ActorRef;
use crate::error::{DeliveryFailure, Result};
use crate::message::{CorrelationId, EnvelopeMeta};
use crate::registry::ActorId;
use crate::system::ActorSystem;
use std::time::Duration;
use tracing::debug;

/// Execution context of one actor
#[derive(Debug)]
pub struct ActorContext {
    myself: ActorRef,
    system: ActorSystem,
    /// Addressing data of the message being handled
    current: Option<EnvelopeMeta>,
}

impl ActorContext {
    pub(crate) fn new(myself: ActorRef, system: ActorSystem) -> Self {
        Self {
            myself,
            system,
            current: None,
        }
    }

    pub fn id(&self) -> &ActorId {
        self.myself.id()
    }

    /// Reference to this actor, suitable for handing to others
    pub fn myself(&self) -> &ActorRef {
        &self.myself
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    /// Parent identity, `None` for roots
    pub fn parent(&self) -> Option<&ActorId> {
        self.myself.parent()
    }

    /// Sender of the message being handled, if it gave one
    pub fn sender(&self) -> Option<&ActorId> {
        self.current.as_ref().and_then(|m| m.sender.as_ref())
    }

    /// Correlation token when the current message came from an `ask`
    pub fn correlation(&self) -> Option<CorrelationId> {
        self.current.as_ref().and_then(|m| m.correlation)
    }

    /// Answer the message being handled
    ///
    /// Completes the pending ask when the message carries a correlation
    /// token, otherwise tells the sender. With neither, or when the ask has
    /// already expired, the reply is reported as undeliverable.
    pub fn reply<R: Send + 'static>(&self, value: R) {
        let meta = self.current.as_ref();
        if let Some(token) = meta.and_then(|m| m.correlation) {
            self.system.complete_ask(token, value, self.id());
        } else if let Some(sender) = meta.and_then(|m| m.sender.as_ref()) {
            self.system.tell(sender, value, Some(self.id()));
        } else {
            self.system.incidents().undeliverable(
                self.id(),
                Some(self.id()),
                std::any::type_name::<R>(),
                DeliveryFailure::NoReplyAddress,
            );
        }
    }

    /// Create a child supervised by this actor
    pub fn create_child<A, F>(&self, factory: F, identity: impl Into<ActorId>) -> Result<ActorRef>
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.system.create(factory, identity, Some(self.id()))
    }

    /// Tell another actor by identity, with this actor as sender
    pub fn tell<M: Send + 'static>(&self, target: &ActorId, message: M) {
        self.system.tell(target, message, Some(self.id()));
    }

    /// Ask another actor and suspend this actor's turn until the reply
    ///
    /// Only this actor's task waits; the worker thread goes back to the
    /// scheduler and other actors keep running. This actor handles no other
    /// message meanwhile, so asking an actor that asks back ends in a
    /// timeout rather than a reply.
    pub async fn ask<R, M>(&self, target: &ActorRef, message: M, timeout: Duration) -> Result<R>
    where
        R: Send + 'static,
        M: Send + 'static,
    {
        self.system
            .ask_from(target, message, timeout, Some(self.id().clone()))
            .await
    }

    /// Ask without suspending the current turn
    ///
    /// The outcome, reply or error, is turned into a message of this actor's
    /// own type by `continuation` and enqueued to itself, so the actor keeps
    /// processing its mailbox while the request is in flight.
    pub fn ask_then<R, M, C, F>(&self, target: &ActorRef, message: M, timeout: Duration, continuation: F)
    where
        R: Send + 'static,
        M: Send + 'static,
        C: Send + 'static,
        F: FnOnce(Result<R>) -> C + Send + 'static,
    {
        let system = self.system.clone();
        let target = target.clone();
        let myself = self.myself.clone();
        debug!(actor_id = %myself.id(), target_actor = %target.id(), "Asking with continuation");

        self.system.runtime().spawn(async move {
            let outcome = system
                .ask_from(&target, message, timeout, Some(myself.id().clone()))
                .await;
            myself.tell(continuation(outcome), Some(target.id()));
        });
    }

    /// Queue a stop request for this actor behind its pending messages
    pub fn stop_self(&self) {
        self.myself.stop();
    }

    pub(crate) fn begin(&mut self, meta: EnvelopeMeta) {
        self.current = Some(meta);
    }

    pub(crate) fn finish(&mut self) {
        self.current = None;
    }

    pub(crate) fn rebind(&mut self, myself: ActorRef) {
        self.myself = myself;
    }
}
