//! Actor Behavior
//!
//! The trait actor authors implement. Each actor declares the single message
//! type it accepts; the runtime checks payloads against it at the mailbox
//! boundary and reports anything else as undeliverable.

use crate::context::ActorContext;
use crate::error::{ActorError, Result};
use crate::supervision::SupervisorDirective;
use async_trait::async_trait;
use std::sync::Arc;

/// Builds fresh actor state; reused when an actor restarts in place
pub type Factory<A> = Arc<dyn Fn() -> A + Send + Sync>;

/// Trait for actor behavior
#[async_trait]
pub trait Actor: Send + 'static {
    type Message: Send + 'static;

    /// Handle one message; never runs concurrently with another call for
    /// the same actor
    async fn handle(&mut self, msg: Self::Message, ctx: &mut ActorContext) -> Result<()>;

    /// Called when the processing loop starts, and again after a restart
    async fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Called once the mailbox is drained and all children have stopped
    async fn on_stop(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Decide what happens after `handle` failed or panicked
    async fn on_failure(
        &mut self,
        _error: &ActorError,
        _ctx: &mut ActorContext,
    ) -> SupervisorDirective {
        SupervisorDirective::Stop
    }
}
