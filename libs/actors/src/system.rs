//! Actor System Core
//!
//! Creation, addressing, messaging and teardown of actors. One tokio task
//! per actor owns the actor state and the receiving half of its mailbox, so
//! a given actor never handles two messages at once while all actors are
//! multiplexed over the runtime's worker pool.
//!
//! `ActorSystem` is a cheap, cloneable reference. It is explicitly
//! constructed and passed down; there is no global instance.
//!
//! # Lock Ordering
//!
//! The registry lock is never held across an `.await`, and pending asks live
//! in a sharded map that is never locked together with the registry.

use crate::actor::{Actor, Factory};
use crate::actor_ref::{ActorRef, ActorStatus};
use crate::ask::{await_reply, PendingAsks};
use crate::config::RuntimeConfig;
use crate::context::ActorContext;
use crate::error::{ActorError, DeliveryFailure, Result};
use crate::incidents::IncidentLog;
use crate::mailbox::{Mailbox, MailboxReceiver, Signal};
use crate::message::{CorrelationId, Envelope};
use crate::metrics::{SystemMetrics, SystemStats};
use crate::registry::{ActorId, ActorRegistry};
use crate::supervision::{self, RestartTracker, SupervisorDirective};

use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Core actor system managing actor lifecycles and routing
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

struct SystemInner {
    name: String,
    config: RuntimeConfig,
    registry: ActorRegistry,
    pending: PendingAsks,
    incidents: Arc<IncidentLog>,
    metrics: Arc<SystemMetrics>,
    runtime: Handle,
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.inner.name)
            .field("actors", &self.inner.registry.len())
            .field("pending_asks", &self.inner.pending.len())
            .finish()
    }
}

impl ActorSystem {
    /// Create an actor system with default configuration
    ///
    /// Must be called from within a tokio runtime; the system spawns its
    /// processing loops on that runtime.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_config(name, RuntimeConfig::default())
    }

    /// Create an actor system with explicit configuration
    pub fn with_config(name: impl Into<String>, config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            ActorError::configuration(format!("no tokio runtime available: {}", e), None)
        })?;
        let name = name.into();
        info!(
            system = %name,
            mailbox_capacity = config.mailbox_capacity,
            ask_timeout_ms = config.ask_timeout_ms,
            shutdown_timeout_ms = config.shutdown_timeout_ms,
            "Creating actor system"
        );

        Ok(Self {
            inner: Arc::new(SystemInner {
                incidents: Arc::new(IncidentLog::new(config.incident_log_capacity)),
                name,
                config,
                registry: ActorRegistry::new(),
                pending: PendingAsks::new(),
                metrics: Arc::new(SystemMetrics::default()),
                runtime,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub(crate) fn registry(&self) -> &ActorRegistry {
        &self.inner.registry
    }

    /// Marooned messages and faults
    pub fn incidents(&self) -> &IncidentLog {
        &self.inner.incidents
    }

    pub fn metrics(&self) -> Arc<SystemMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Create an actor and start its processing loop
    ///
    /// The factory builds the initial state and is kept for restarts in
    /// place. Fails with `DuplicateIdentity` when the identity is taken; the
    /// existing registration is left untouched.
    pub fn create<A, F>(
        &self,
        factory: F,
        identity: impl Into<ActorId>,
        parent: Option<&ActorId>,
    ) -> Result<ActorRef>
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        let id = identity.into();
        let start_time = Instant::now();
        let factory: Factory<A> = Arc::new(factory);

        let actor = std::panic::catch_unwind(AssertUnwindSafe(|| factory())).map_err(|panic| {
            ActorError::Panicked {
                actor: id.to_string(),
                message: panic_message(panic),
            }
        })?;

        let (mailbox, receiver) = Mailbox::new(self.inner.config.mailbox_capacity);
        let actor_ref = ActorRef::new(
            id.clone(),
            parent.cloned(),
            mailbox,
            Arc::clone(&self.inner.incidents),
        );
        self.inner.registry.register(actor_ref.clone())?;

        let task = ActorTask {
            id: id.clone(),
            actor,
            factory,
            receiver,
            ctx: ActorContext::new(actor_ref.clone(), self.clone()),
            restarts: RestartTracker::new(self.inner.config.restart),
            system: self.clone(),
        };
        let handle = self.inner.runtime.spawn(task.run());
        actor_ref.attach_task(handle.abort_handle());

        SystemMetrics::incr(&self.inner.metrics.actors_created);
        info!(
            actor_id = %id,
            system = %self.inner.name,
            parent = ?parent.map(|p| p.as_str()),
            actor_type = std::any::type_name::<A>(),
            spawn_duration_us = start_time.elapsed().as_micros() as u64,
            "Actor created"
        );
        Ok(actor_ref)
    }

    /// Create a root actor from its `Default` state
    pub fn from_type<A>(&self, identity: impl Into<ActorId>) -> Result<ActorRef>
    where
        A: Actor + Default,
    {
        self.create(A::default, identity, None)
    }

    /// Non-blocking lookup
    pub fn get(&self, identity: impl Into<ActorId>) -> Result<ActorRef> {
        let id = identity.into();
        self.inner
            .registry
            .get(&id)
            .ok_or_else(|| ActorError::not_found(&id))
    }

    pub fn parent_of(&self, identity: impl Into<ActorId>) -> Result<Option<ActorId>> {
        self.inner.registry.parent_of(&identity.into())
    }

    pub fn children_of(&self, identity: impl Into<ActorId>) -> Vec<ActorRef> {
        self.inner.registry.children_of(&identity.into())
    }

    /// Replace the registered handle for an existing identity
    pub fn update(&self, actor_ref: ActorRef) -> Result<()> {
        self.inner.registry.update(actor_ref)
    }

    /// Identities of every live actor
    pub fn actors(&self) -> Vec<ActorId> {
        self.inner.registry.list()
    }

    pub fn roots(&self) -> Vec<ActorRef> {
        self.inner.registry.roots()
    }

    /// Number of registered actors
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Record a message that could not be routed
    ///
    /// Observability only; the sender is never told.
    pub fn report_undeliverable(
        &self,
        target: &ActorId,
        origin: Option<&ActorId>,
        message_type: &'static str,
        reason: DeliveryFailure,
    ) {
        self.inner
            .incidents
            .undeliverable(target, origin, message_type, reason);
    }

    /// Fire-and-forget send by identity
    pub fn tell<M: Send + 'static>(&self, target: &ActorId, message: M, sender: Option<&ActorId>) {
        match self.inner.registry.get(target) {
            Some(actor_ref) => actor_ref.tell(message, sender),
            None => self.report_undeliverable(
                target,
                sender,
                std::any::type_name::<M>(),
                DeliveryFailure::NotFound,
            ),
        }
    }

    /// Request/response with timeout
    ///
    /// Resolves with the correlated reply, or `AskTimeout` once `timeout`
    /// elapses. A reply arriving after that is reported as undeliverable.
    pub async fn ask<R, M>(&self, target: &ActorRef, message: M, timeout: Duration) -> Result<R>
    where
        R: Send + 'static,
        M: Send + 'static,
    {
        self.ask_from(target, message, timeout, None).await
    }

    /// Ask by identity
    ///
    /// A missing target is reported and the call still ends in `AskTimeout`
    /// after `timeout`, like any other silent target.
    pub async fn ask_id<R, M>(
        &self,
        target: impl Into<ActorId>,
        message: M,
        timeout: Duration,
    ) -> Result<R>
    where
        R: Send + 'static,
        M: Send + 'static,
    {
        let id = target.into();
        match self.inner.registry.get(&id) {
            Some(actor_ref) => self.ask_from(&actor_ref, message, timeout, None).await,
            None => {
                SystemMetrics::incr(&self.inner.metrics.asks_sent);
                self.report_undeliverable(
                    &id,
                    None,
                    std::any::type_name::<M>(),
                    DeliveryFailure::NotFound,
                );
                tokio::time::sleep(timeout).await;
                SystemMetrics::incr(&self.inner.metrics.ask_timeouts);
                Err(ActorError::ask_timeout(&id, timeout))
            }
        }
    }

    /// Blocking ask for threads outside the async runtime
    ///
    /// Blocks the calling thread only. Panics if called from a runtime
    /// worker thread; use `ask` there.
    ///
    /// Needs a multi-thread runtime. On a `current_thread` runtime the
    /// blocked thread does not drive the system's actors or timers, so the
    /// reply only arrives while the runtime's own thread happens to run.
    pub fn ask_blocking<R, M>(&self, target: &ActorRef, message: M, timeout: Duration) -> Result<R>
    where
        R: Send + 'static,
        M: Send + 'static,
    {
        self.inner
            .runtime
            .block_on(self.ask_from(target, message, timeout, None))
    }

    pub(crate) async fn ask_from<R, M>(
        &self,
        target: &ActorRef,
        message: M,
        timeout: Duration,
        sender: Option<ActorId>,
    ) -> Result<R>
    where
        R: Send + 'static,
        M: Send + 'static,
    {
        SystemMetrics::incr(&self.inner.metrics.asks_sent);
        let (token, receiver) = self.inner.pending.register(target.id(), timeout);
        debug!(
            correlation = %token,
            target_actor = %target.id(),
            timeout_ms = timeout.as_millis() as u64,
            "Sending ask"
        );

        // An undeliverable request is already reported; the caller still
        // sees the deadline expire.
        target.deliver(Envelope::with_correlation(message, sender, token));

        let result = await_reply(
            &self.inner.pending,
            token,
            receiver,
            target.id(),
            timeout,
            &self.inner.name,
        )
        .await;
        if matches!(result, Err(ActorError::AskTimeout { .. })) {
            SystemMetrics::incr(&self.inner.metrics.ask_timeouts);
        }
        result
    }

    /// Route a reply to its pending ask, reporting it when the ask is gone
    pub(crate) fn complete_ask<R: Send + 'static>(
        &self,
        token: CorrelationId,
        value: R,
        origin: &ActorId,
    ) {
        let message_type = std::any::type_name::<R>();
        if self
            .inner
            .pending
            .complete(token, (Box::new(value), message_type))
            .is_err()
        {
            self.report_undeliverable(
                &ActorId::new(token.to_string()),
                Some(origin),
                message_type,
                DeliveryFailure::AskExpired,
            );
        }
    }

    /// Request a stop of the actor registered under `identity`
    pub fn stop(&self, identity: impl Into<ActorId>) -> Result<ActorRef> {
        let actor_ref = self.get(identity)?;
        actor_ref.stop();
        Ok(actor_ref)
    }

    /// Stop an actor and wait until its whole subtree is gone
    pub async fn stop_and_wait(&self, identity: impl Into<ActorId>) -> Result<()> {
        let actor_ref = self.get(identity)?;
        let owner = ActorId::new(self.inner.name.clone());
        supervision::stop_and_confirm(self, &owner, vec![actor_ref], self.inner.config.shutdown_timeout())
            .await;
        Ok(())
    }

    /// Stop every root, wait for the whole tree, fail outstanding asks
    pub async fn shutdown(&self) -> Result<()> {
        let shutdown_start = Instant::now();
        info!("Shutting down actor system {}", self.inner.name);

        let roots = self.inner.registry.roots();
        let owner = ActorId::new(self.inner.name.clone());
        supervision::stop_and_confirm(self, &owner, roots, self.inner.config.shutdown_timeout())
            .await;

        let failed_asks = self.inner.pending.fail_all();
        if failed_asks > 0 {
            warn!(
                system = %self.inner.name,
                failed_asks = failed_asks,
                "Failed outstanding asks during shutdown"
            );
        }

        let remaining = self.inner.registry.len();
        if remaining > 0 {
            warn!(
                system = %self.inner.name,
                remaining = remaining,
                "Actors created during shutdown are still registered"
            );
        }

        info!(
            system = %self.inner.name,
            shutdown_duration_ms = shutdown_start.elapsed().as_millis() as u64,
            "Actor system shutdown complete"
        );
        Ok(())
    }

    /// Terminate a child that missed its shutdown deadline
    ///
    /// Records the orphan, aborts its loop and every descendant loop, and
    /// deregisters them all.
    pub(crate) fn force_terminate(&self, owner: &ActorId, child: &ActorRef, timeout: Duration) {
        self.inner.incidents.orphaned(owner, child.id(), timeout);

        let mut doomed = self.inner.registry.descendants_of(child.id());
        doomed.reverse();
        doomed.push(child.clone());

        for actor_ref in doomed {
            actor_ref.abort();
            if self.inner.registry.unregister_instance(&actor_ref) {
                SystemMetrics::incr(&self.inner.metrics.actors_terminated);
            }
            SystemMetrics::incr(&self.inner.metrics.actors_orphaned);
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> SystemStats {
        let metrics = &self.inner.metrics;
        SystemStats {
            live_actors: self.inner.registry.len(),
            actors_created: metrics.actors_created.load(Ordering::Relaxed),
            actors_terminated: metrics.actors_terminated.load(Ordering::Relaxed),
            actors_orphaned: metrics.actors_orphaned.load(Ordering::Relaxed),
            messages_processed: metrics.messages_processed.load(Ordering::Relaxed),
            avg_processing_time_ns: metrics.avg_processing_time_ns(),
            actor_restarts: metrics.actor_restarts.load(Ordering::Relaxed),
            restart_failures: metrics.restart_failures.load(Ordering::Relaxed),
            asks_sent: metrics.asks_sent.load(Ordering::Relaxed),
            ask_timeouts: metrics.ask_timeouts.load(Ordering::Relaxed),
            pending_asks: self.inner.pending.len(),
            undeliverable_messages: self.inner.incidents.total_undeliverable(),
            faults: self.inner.incidents.total_faults(),
        }
    }
}

/// Processing loop of one actor
struct ActorTask<A: Actor> {
    id: ActorId,
    actor: A,
    factory: Factory<A>,
    receiver: MailboxReceiver,
    ctx: ActorContext,
    restarts: RestartTracker,
    system: ActorSystem,
}

/// Run an actor callback, turning a panic into an error
async fn guarded<F>(actor: &ActorId, callback: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(callback).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(ActorError::Panicked {
            actor: actor.to_string(),
            message: panic_message(panic),
        }),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<A: Actor> ActorTask<A> {
    async fn run(mut self) {
        let task_start = Instant::now();
        self.ctx.myself().set_status(ActorStatus::Running);
        debug!(actor_id = %self.id, "Starting actor processing loop");

        match guarded(&self.id, self.actor.on_start(&mut self.ctx)).await {
            Ok(()) => {
                while let Some(signal) = self.receiver.recv().await {
                    match signal {
                        Signal::Deliver(envelope) => {
                            if !self.dispatch(envelope).await {
                                break;
                            }
                        }
                        Signal::Stop => {
                            debug!(actor_id = %self.id, "Stop request reached the front of the mailbox");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                error!(
                    actor_id = %self.id,
                    error = %e,
                    startup_duration_ms = task_start.elapsed().as_millis() as u64,
                    "Actor failed to start"
                );
                self.system.incidents().fault(&self.id, e);
            }
        }

        self.terminate().await;
        info!(
            actor_id = %self.id,
            total_runtime_ms = task_start.elapsed().as_millis() as u64,
            "Actor terminated"
        );
    }

    /// Handle one envelope; false once the actor must stop
    async fn dispatch(&mut self, envelope: Envelope) -> bool {
        let (message, meta) = match envelope.downcast::<A::Message>() {
            Ok(typed) => typed,
            Err(envelope) => {
                self.system.report_undeliverable(
                    &self.id,
                    envelope.sender(),
                    envelope.message_type(),
                    DeliveryFailure::TypeMismatch,
                );
                return true;
            }
        };

        let start = Instant::now();
        self.ctx.begin(meta);
        let result = guarded(&self.id, self.actor.handle(message, &mut self.ctx)).await;
        self.ctx.finish();

        match result {
            Ok(()) => {
                self.system.inner.metrics.record_message_handled(start.elapsed());
                true
            }
            Err(e) => {
                error!(
                    actor_id = %self.id,
                    error = %e,
                    error_category = e.category(),
                    processing_duration_ns = start.elapsed().as_nanos() as u64,
                    "Actor message processing failed"
                );
                self.on_fault(e).await
            }
        }
    }

    async fn on_fault(&mut self, error: ActorError) -> bool {
        self.system.incidents().fault(&self.id, error.clone());

        let directive = AssertUnwindSafe(self.actor.on_failure(&error, &mut self.ctx))
            .catch_unwind()
            .await
            .unwrap_or(SupervisorDirective::Stop);

        match directive {
            SupervisorDirective::Resume => {
                debug!(actor_id = %self.id, directive = "Resume", "Actor resumed after error");
                true
            }
            SupervisorDirective::Restart => {
                if self.restarts.should_restart() {
                    warn!(
                        actor_id = %self.id,
                        directive = "Restart",
                        restart_count = self.restarts.count(),
                        max_restarts = self.system.config().restart.max_restarts,
                        "Restarting actor within restart limits"
                    );
                    self.restart().await
                } else {
                    error!(
                        actor_id = %self.id,
                        directive = "Restart",
                        restart_count = self.restarts.count(),
                        max_restarts = self.system.config().restart.max_restarts,
                        "Actor exceeded restart limit, stopping"
                    );
                    self.system.inner.metrics.record_actor_restart(false);
                    false
                }
            }
            SupervisorDirective::Stop => {
                warn!(actor_id = %self.id, directive = "Stop", error = %error, "Stopping actor due to error directive");
                false
            }
        }
    }

    /// Replace the state with a fresh one from the factory
    async fn restart(&mut self) -> bool {
        if let Err(e) = guarded(&self.id, self.actor.on_stop(&mut self.ctx)).await {
            warn!(actor_id = %self.id, error = %e, "on_stop failed during restart");
        }

        let factory = Arc::clone(&self.factory);
        match std::panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(fresh) => self.actor = fresh,
            Err(panic) => {
                self.system.incidents().fault(
                    &self.id,
                    ActorError::Panicked {
                        actor: self.id.to_string(),
                        message: panic_message(panic),
                    },
                );
                self.system.inner.metrics.record_actor_restart(false);
                return false;
            }
        }

        let next = self.ctx.myself().next_incarnation();
        if let Err(e) = self.system.update(next.clone()) {
            warn!(actor_id = %self.id, error = %e, "Registry update after restart failed");
        }
        self.ctx.rebind(next);

        match guarded(&self.id, self.actor.on_start(&mut self.ctx)).await {
            Ok(()) => {
                self.system.inner.metrics.record_actor_restart(true);
                info!(actor_id = %self.id, incarnation = self.ctx.myself().incarnation(), "Actor restarted");
                true
            }
            Err(e) => {
                self.system.incidents().fault(&self.id, e);
                self.system.inner.metrics.record_actor_restart(false);
                false
            }
        }
    }

    /// Stopping → Terminated: children, leftovers, cleanup, deregistration
    async fn terminate(&mut self) {
        let shutdown_start = Instant::now();
        let myself = self.ctx.myself().clone();
        myself.set_status(ActorStatus::Stopping);

        supervision::stop_children(&self.system, &self.id).await;

        for envelope in self.receiver.close_and_drain() {
            self.system.report_undeliverable(
                &self.id,
                envelope.sender(),
                envelope.message_type(),
                DeliveryFailure::Terminated,
            );
        }

        if let Err(e) = guarded(&self.id, self.actor.on_stop(&mut self.ctx)).await {
            error!(
                actor_id = %self.id,
                error = %e,
                shutdown_duration_ms = shutdown_start.elapsed().as_millis() as u64,
                "Actor failed to stop cleanly"
            );
        }

        self.system.registry().unregister_instance(&myself);
        myself.set_status(ActorStatus::Terminated);
        SystemMetrics::incr(&self.system.inner.metrics.actors_terminated);
        debug!(
            actor_id = %self.id,
            shutdown_duration_ms = shutdown_start.elapsed().as_millis() as u64,
            "Actor stopped cleanly"
        );
    }
}
