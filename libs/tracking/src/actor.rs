//! Tracking Actor
//!
//! Owns every tracking entry. All access goes through its mailbox.

use crate::messages::{TrackingId, TrackingInfo, TrackingReply, TrackingRequest, TrackingSummary};
use actor_runtime::{Actor, ActorContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct TrackingActor {
    entries: HashMap<TrackingId, TrackingInfo>,
    /// Creation order, for summaries
    order: Vec<TrackingId>,
}

impl TrackingActor {
    fn create_entry(&mut self, source_path: String) -> TrackingId {
        let id = TrackingId::generate();
        info!(tracking_id = %id, source_path = %source_path, "Tracking new media file");
        self.entries
            .insert(id.clone(), TrackingInfo::new(id.clone(), source_path));
        self.order.push(id.clone());
        id
    }

    fn summary(&self) -> TrackingSummary {
        let mut summary = TrackingSummary::default();
        for id in &self.order {
            match self.entries.get(id) {
                Some(info) if info.has_failed() => summary.failures.push(id.clone()),
                Some(_) => summary.successes.push(id.clone()),
                None => {}
            }
        }
        summary
    }
}

#[async_trait]
impl Actor for TrackingActor {
    type Message = TrackingRequest;

    async fn handle(&mut self, msg: TrackingRequest, ctx: &mut ActorContext) -> Result<()> {
        debug!(request = msg.name(), "Tracking request");
        match msg {
            TrackingRequest::CreateEntry { source_path } => {
                let id = self.create_entry(source_path);
                ctx.reply(TrackingReply::EntryCreated(id));
            }
            TrackingRequest::Lookup { id } => {
                let reply = match self.entries.get(&id) {
                    Some(info) => TrackingReply::EntryFound(info.clone()),
                    None => TrackingReply::EntryNotFound(id),
                };
                ctx.reply(reply);
            }
            TrackingRequest::RegisterEvent { id, event } => {
                let reply = match self.entries.get_mut(&id) {
                    Some(info) => {
                        info.apply(event);
                        TrackingReply::EventRegistered(id)
                    }
                    None => TrackingReply::EntryNotFound(id),
                };
                ctx.reply(reply);
            }
            TrackingRequest::NotifyEvent { id, event } => match self.entries.get_mut(&id) {
                Some(info) => info.apply(event),
                None => warn!(tracking_id = %id, kind = %event.kind, "Event for unknown tracking entry dropped"),
            },
            TrackingRequest::Summary => ctx.reply(TrackingReply::Summary(self.summary())),
        }
        Ok(())
    }

    async fn on_stop(&mut self, ctx: &mut ActorContext) -> Result<()> {
        let summary = self.summary();
        info!(
            actor_id = %ctx.id(),
            tracked = summary.total(),
            failures = summary.failures.len(),
            "Tracking actor stopped"
        );
        Ok(())
    }
}
