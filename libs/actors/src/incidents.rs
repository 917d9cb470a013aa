//! Marooned Messages and Faults
//!
//! Everything the runtime cannot hand back to a caller ends up here:
//! undeliverable messages, contained actor faults and incomplete shutdowns.
//! Recording is observability only. Nothing here ever fails a send.

use crate::error::{ActorError, DeliveryFailure};
use crate::registry::ActorId;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tracing::{error, warn};

/// Kind of recorded incident
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    Undeliverable,
    Fault,
    ShutdownIncomplete,
}

/// One recorded incident
#[derive(Debug, Clone)]
pub struct Incident {
    pub kind: IncidentKind,
    /// Actor the incident concerns (the intended recipient for marooned messages)
    pub target: ActorId,
    /// Who sent or caused it, when known
    pub origin: Option<ActorId>,
    pub error: ActorError,
    pub recorded_at: SystemTime,
}

impl Incident {
    /// Reason of an undeliverable message, `None` for other kinds
    pub fn delivery_failure(&self) -> Option<DeliveryFailure> {
        match &self.error {
            ActorError::Undeliverable { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Bounded log of the most recent incidents
#[derive(Debug)]
pub struct IncidentLog {
    recent: Mutex<VecDeque<Incident>>,
    capacity: usize,
    total_undeliverable: AtomicU64,
    total_faults: AtomicU64,
}

impl IncidentLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            total_undeliverable: AtomicU64::new(0),
            total_faults: AtomicU64::new(0),
        }
    }

    /// Undeliverable messages recorded since creation, including evicted ones
    pub fn total_undeliverable(&self) -> u64 {
        self.total_undeliverable.load(Ordering::Relaxed)
    }

    /// Faults and incomplete shutdowns recorded since creation
    pub fn total_faults(&self) -> u64 {
        self.total_faults.load(Ordering::Relaxed)
    }

    /// Record a marooned message
    pub fn undeliverable(
        &self,
        target: &ActorId,
        origin: Option<&ActorId>,
        message_type: &'static str,
        reason: DeliveryFailure,
    ) {
        warn!(
            target_actor = %target,
            origin = ?origin.map(|o| o.as_str()),
            message_type = message_type,
            reason = %reason,
            "Marooned message"
        );
        self.total_undeliverable.fetch_add(1, Ordering::Relaxed);
        self.push(Incident {
            kind: IncidentKind::Undeliverable,
            target: target.clone(),
            origin: origin.cloned(),
            error: ActorError::Undeliverable {
                target: target.to_string(),
                message_type,
                reason,
            },
            recorded_at: SystemTime::now(),
        });
    }

    /// Record a fault contained inside one actor
    pub fn fault(&self, actor: &ActorId, error: ActorError) {
        error!(
            actor_id = %actor,
            error = %error,
            error_category = error.category(),
            "Actor fault contained"
        );
        self.total_faults.fetch_add(1, Ordering::Relaxed);
        self.push(Incident {
            kind: IncidentKind::Fault,
            target: actor.clone(),
            origin: None,
            error,
            recorded_at: SystemTime::now(),
        });
    }

    /// Record a child that did not confirm termination in time
    pub fn orphaned(&self, parent: &ActorId, child: &ActorId, timeout: std::time::Duration) {
        let error = ActorError::ShutdownIncomplete {
            parent: parent.to_string(),
            child: child.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };
        error!(
            parent = %parent,
            child = %child,
            timeout_ms = timeout.as_millis() as u64,
            "Child did not terminate in time, orphaned"
        );
        self.total_faults.fetch_add(1, Ordering::Relaxed);
        self.push(Incident {
            kind: IncidentKind::ShutdownIncomplete,
            target: child.clone(),
            origin: Some(parent.clone()),
            error,
            recorded_at: SystemTime::now(),
        });
    }

    fn push(&self, incident: Incident) {
        let mut recent = self.recent.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(incident);
    }

    /// Snapshot, oldest first
    pub fn recent(&self) -> Vec<Incident> {
        self.recent.lock().iter().cloned().collect()
    }

    /// Snapshot filtered by kind
    pub fn of_kind(&self, kind: IncidentKind) -> Vec<Incident> {
        self.recent
            .lock()
            .iter()
            .filter(|i| i.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.recent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
