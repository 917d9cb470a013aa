//! Supervision
//!
//! Fault directives, the restart window, and structured teardown of a
//! subtree. A stopping owner signals every child first, then waits for each
//! of them. A child that misses its deadline is recorded as orphaned and
//! forcibly terminated together with its descendants, so shutdown never
//! hangs and the registry never points at a vanished parent.

use crate::actor_ref::ActorRef;
use crate::config::RestartPolicy;
use crate::registry::ActorId;
use crate::system::ActorSystem;
use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::debug;

/// Supervision directive for error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorDirective {
    /// Drop the failed message and keep processing
    Resume,
    /// Rebuild state from the factory, within the restart window
    Restart,
    /// Stop the actor and its children
    Stop,
}

/// Restart counting for one actor
#[derive(Debug)]
pub(crate) struct RestartTracker {
    policy: RestartPolicy,
    count: u32,
    window_start: Option<Instant>,
}

impl RestartTracker {
    pub(crate) fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            count: 0,
            window_start: None,
        }
    }

    /// Check if actor can be restarted or must stop
    pub(crate) fn should_restart(&mut self) -> bool {
        self.should_restart_at(Instant::now())
    }

    fn should_restart_at(&mut self, now: Instant) -> bool {
        match self.window_start {
            Some(start) if now.duration_since(start) <= self.policy.window() => {
                self.count += 1;
                self.count <= self.policy.max_restarts
            }
            _ => {
                self.window_start = Some(now);
                self.count = 1;
                self.count <= self.policy.max_restarts
            }
        }
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}

/// Stop `targets`, then wait for each of them
///
/// Every child gets `timeout` per generation in its own subtree, since it
/// first waits for its own children with the same bound.
pub(crate) async fn stop_and_confirm(
    system: &ActorSystem,
    owner: &ActorId,
    targets: Vec<ActorRef>,
    timeout: Duration,
) {
    if targets.is_empty() {
        return;
    }

    debug!(owner = %owner, children = targets.len(), "Stopping children");
    let budgets: Vec<Duration> = targets
        .iter()
        .map(|child| {
            let generations = system.registry().height_of(child.id()) as u32 + 1;
            timeout.saturating_mul(generations)
        })
        .collect();

    for child in &targets {
        child.stop();
    }

    let waits = targets
        .iter()
        .zip(budgets)
        .map(|(child, budget)| async move { (child, budget, child.wait_terminated(budget).await) });

    for (child, budget, confirmed) in join_all(waits).await {
        if !confirmed {
            system.force_terminate(owner, child, budget);
        }
    }
}

/// Stop every current child of `parent`
pub(crate) async fn stop_children(system: &ActorSystem, parent: &ActorId) {
    let children = system.registry().children_of(parent);
    stop_and_confirm(system, parent, children, system.config().shutdown_timeout()).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_window() {
        let mut tracker = RestartTracker::new(RestartPolicy {
            max_restarts: 2,
            window_secs: 60,
        });
        let start = Instant::now();

        assert!(tracker.should_restart_at(start));
        assert!(tracker.should_restart_at(start + Duration::from_secs(1)));
        assert!(!tracker.should_restart_at(start + Duration::from_secs(2)));
        assert_eq!(tracker.count(), 3);

        // A new window resets the count
        assert!(tracker.should_restart_at(start + Duration::from_secs(120)));
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn test_zero_restarts_allowed() {
        let mut tracker = RestartTracker::new(RestartPolicy {
            max_restarts: 0,
            window_secs: 60,
        });
        assert!(!tracker.should_restart());
    }
}
