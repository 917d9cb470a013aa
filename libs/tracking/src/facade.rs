//! Media Tracking Facade
//!
//! Typed wrapper over the tracking actor. The backing actor is resolved once
//! when the facade is built; each method then builds one `TrackingRequest`
//! and either `ask`s (queries) or `tell`s (notifications). Nothing here
//! touches actor state directly.

use crate::actor::TrackingActor;
use crate::error::{Result, TrackingError};
use crate::messages::{
    TrackingEvent, TrackingId, TrackingInfo, TrackingReply, TrackingRequest, TrackingSummary,
};
use actor_runtime::{ActorContext, ActorId, ActorRef, ActorSystem};
use std::time::Duration;
use tracing::debug;

/// Well-known identity of the tracking actor
pub const TRACKING_ACTOR_ID: &str = "mediatracking-actor";

/// Create the tracking actor under its well-known identity
pub fn spawn_tracking_actor(system: &ActorSystem) -> actor_runtime::Result<ActorRef> {
    system.from_type::<TrackingActor>(TRACKING_ACTOR_ID)
}

#[derive(Debug, Clone)]
enum Backing {
    Resolved(ActorRef),
    /// Not created yet when the facade was built; asks go by identity
    Unresolved(ActorId),
}

#[derive(Debug, Clone)]
pub struct MediaTrackingFacade {
    system: ActorSystem,
    backing: Backing,
    /// Set when built from inside an actor
    sender: Option<ActorId>,
    timeout: Duration,
}

impl MediaTrackingFacade {
    /// Facade for application code outside any actor
    pub fn from_system(system: &ActorSystem) -> Self {
        Self::resolve(system, None)
    }

    /// Facade for use inside an actor's callbacks
    pub fn from_context(ctx: &ActorContext) -> Self {
        Self::resolve(ctx.system(), Some(ctx.id().clone()))
    }

    fn resolve(system: &ActorSystem, sender: Option<ActorId>) -> Self {
        let backing = match system.get(TRACKING_ACTOR_ID) {
            Ok(actor_ref) => Backing::Resolved(actor_ref),
            Err(_) => {
                debug!(actor_id = TRACKING_ACTOR_ID, "Tracking actor not created yet");
                Backing::Unresolved(ActorId::from(TRACKING_ACTOR_ID))
            }
        };
        Self {
            system: system.clone(),
            backing,
            sender,
            timeout: system.config().ask_timeout(),
        }
    }

    /// Override the ask deadline taken from the runtime configuration
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start tracking a file and return its id
    pub async fn create_entry(&self, source_path: impl Into<String>) -> Result<TrackingId> {
        let request = TrackingRequest::CreateEntry {
            source_path: source_path.into(),
        };
        match self.ask(request).await? {
            TrackingReply::EntryCreated(id) => Ok(id),
            other => Err(unexpected("CreateEntry", other)),
        }
    }

    /// `None` when no entry has this id
    pub async fn lookup(&self, id: &TrackingId) -> Result<Option<TrackingInfo>> {
        match self.ask(TrackingRequest::Lookup { id: id.clone() }).await? {
            TrackingReply::EntryFound(info) => Ok(Some(info)),
            TrackingReply::EntryNotFound(_) => Ok(None),
            other => Err(unexpected("Lookup", other)),
        }
    }

    /// Record an event and wait for the actor to confirm it
    pub async fn register_event(&self, id: &TrackingId, event: TrackingEvent) -> Result<()> {
        let request = TrackingRequest::RegisterEvent {
            id: id.clone(),
            event,
        };
        match self.ask(request).await? {
            TrackingReply::EventRegistered(_) => Ok(()),
            TrackingReply::EntryNotFound(id) => Err(TrackingError::EntryNotFound { id }),
            other => Err(unexpected("RegisterEvent", other)),
        }
    }

    /// Record an event without waiting
    pub fn notify_event(&self, id: &TrackingId, event: TrackingEvent) {
        let request = TrackingRequest::NotifyEvent {
            id: id.clone(),
            event,
        };
        match &self.backing {
            Backing::Resolved(actor_ref) => actor_ref.tell(request, self.sender.as_ref()),
            Backing::Unresolved(id) => self.system.tell(id, request, self.sender.as_ref()),
        }
    }

    pub async fn summary(&self) -> Result<TrackingSummary> {
        match self.ask(TrackingRequest::Summary).await? {
            TrackingReply::Summary(summary) => Ok(summary),
            other => Err(unexpected("Summary", other)),
        }
    }

    async fn ask(&self, request: TrackingRequest) -> Result<TrackingReply> {
        let reply: TrackingReply = match &self.backing {
            Backing::Resolved(actor_ref) => self.system.ask(actor_ref, request, self.timeout).await?,
            Backing::Unresolved(id) => self.system.ask_id(id, request, self.timeout).await?,
        };
        Ok(reply)
    }
}

fn unexpected(request: &'static str, reply: TrackingReply) -> TrackingError {
    TrackingError::UnexpectedReply {
        request,
        reply: format!("{:?}", reply),
    }
}
