//! Integration Tests for the Actor Runtime
//!
//! Exercises the public contract end to end:
//! - per-sender FIFO delivery and the single-message-at-a-time guarantee
//! - parent/child bookkeeping and structured stop of subtrees
//! - ask/tell, timeouts and late replies
//! - fault containment, restart in place and marooned-message reporting

use actor_runtime::{
    Actor, ActorContext, ActorError, ActorId, ActorRef, ActorStatus, ActorSystem,
    DeliveryFailure, IncidentKind, Result, RuntimeConfig, SupervisorDirective,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

type Journal = Arc<Mutex<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Poll `condition` until it holds or `deadline` passes
async fn eventually<F: Fn() -> bool>(deadline: Duration, condition: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[derive(Debug)]
enum RecorderMsg {
    Note(String),
    Snapshot,
}

/// Records notes, bracketing each with start/end entries in a shared journal
struct Recorder {
    seen: Vec<String>,
    journal: Journal,
}

impl Recorder {
    fn factory(journal: &Journal) -> impl Fn() -> Recorder + Send + Sync + 'static {
        let journal = Arc::clone(journal);
        move || Recorder {
            seen: Vec::new(),
            journal: Arc::clone(&journal),
        }
    }
}

#[async_trait]
impl Actor for Recorder {
    type Message = RecorderMsg;

    async fn handle(&mut self, msg: RecorderMsg, ctx: &mut ActorContext) -> Result<()> {
        match msg {
            RecorderMsg::Note(note) => {
                self.journal.lock().push(format!("start {}", note));
                tokio::time::sleep(Duration::from_millis(2)).await;
                self.journal.lock().push(format!("end {}", note));
                self.seen.push(note);
            }
            RecorderMsg::Snapshot => ctx.reply(self.seen.clone()),
        }
        Ok(())
    }

    async fn on_stop(&mut self, ctx: &mut ActorContext) -> Result<()> {
        self.journal.lock().push(format!("stopped {}", ctx.id()));
        Ok(())
    }
}

/// Accepts anything and never answers
#[derive(Default)]
struct Silent;

#[async_trait]
impl Actor for Silent {
    type Message = u32;

    async fn handle(&mut self, _msg: u32, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }
}

/// Replies after the requested delay
#[derive(Default)]
struct Sluggish;

#[async_trait]
impl Actor for Sluggish {
    type Message = Duration;

    async fn handle(&mut self, delay: Duration, ctx: &mut ActorContext) -> Result<()> {
        tokio::time::sleep(delay).await;
        ctx.reply(42u32);
        Ok(())
    }
}

#[derive(Default)]
struct Doubler;

#[async_trait]
impl Actor for Doubler {
    type Message = u64;

    async fn handle(&mut self, n: u64, ctx: &mut ActorContext) -> Result<()> {
        ctx.reply(n * 2);
        Ok(())
    }
}

#[tokio::test]
async fn test_scenario_child_processes_tells_in_order() {
    init_tracing();
    let system = ActorSystem::new("ordering").unwrap();
    let journal = Journal::default();

    let a = system.from_type::<Silent>("A").unwrap();
    let b = system
        .create(Recorder::factory(&journal), "B", Some(a.id()))
        .unwrap();

    b.tell(RecorderMsg::Note("msg1".into()), None);
    b.tell(RecorderMsg::Note("msg2".into()), None);

    let seen: Vec<String> = system
        .ask(&b, RecorderMsg::Snapshot, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(seen, vec!["msg1", "msg2"]);
    assert_eq!(
        *journal.lock(),
        vec!["start msg1", "end msg1", "start msg2", "end msg2"]
    );
    assert_eq!(system.parent_of("B").unwrap(), Some(ActorId::from("A")));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_children_of_tracks_live_children() {
    let system = ActorSystem::new("hierarchy").unwrap();
    let parent = system.from_type::<Silent>("parent").unwrap();
    for name in ["c1", "c2", "c3"] {
        system.create(Silent::default, name, Some(parent.id())).unwrap();
    }

    let ids = |system: &ActorSystem| -> HashSet<String> {
        system
            .children_of("parent")
            .iter()
            .map(|c| c.id().to_string())
            .collect()
    };
    assert_eq!(ids(&system), ["c1", "c2", "c3"].iter().map(|s| s.to_string()).collect::<HashSet<_>>());

    system.stop_and_wait("c2").await.unwrap();
    assert_eq!(ids(&system), ["c1", "c3"].iter().map(|s| s.to_string()).collect::<HashSet<_>>());
    assert!(matches!(system.get("c2"), Err(ActorError::NotFound { .. })));
    assert_eq!(system.roots().len(), 1);
    assert_eq!(system.len(), 3);

    system.shutdown().await.unwrap();
    assert!(system.is_empty());
}

#[tokio::test]
async fn test_create_under_missing_parent_fails() {
    let system = ActorSystem::new("orphans").unwrap();
    let result = system.create(Silent::default, "child", Some(&ActorId::from("nobody")));
    assert!(matches!(result, Err(ActorError::NotFound { .. })));
    assert!(system.actors().is_empty());
}

#[tokio::test]
async fn test_duplicate_identity_keeps_existing_registration() {
    let system = ActorSystem::new("dup").unwrap();
    let first = system.from_type::<Silent>("dup").unwrap();

    let second = system.from_type::<Silent>("dup");
    assert!(matches!(second, Err(ActorError::DuplicateIdentity { .. })));

    let registered = system.get("dup").unwrap();
    assert!(registered.same_actor(&first));
    assert_eq!(system.stats().actors_created, 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ask_times_out_on_silent_target() {
    let system = ActorSystem::new("timeouts").unwrap();
    let silent = system.from_type::<Silent>("silent").unwrap();

    let start = Instant::now();
    let result: Result<u32> = system.ask(&silent, 7u32, Duration::from_millis(50)).await;
    assert!(matches!(result, Err(ActorError::AskTimeout { timeout_ms: 50, .. })));
    assert!(start.elapsed() >= Duration::from_millis(50));

    let stats = system.stats();
    assert_eq!(stats.asks_sent, 1);
    assert_eq!(stats.ask_timeouts, 1);
    assert_eq!(stats.pending_asks, 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ask_unknown_identity_times_out() {
    let system = ActorSystem::new("ghosts").unwrap();
    let result: Result<u32> = system.ask_id("ghost", 1u32, Duration::from_millis(30)).await;
    assert!(matches!(result, Err(ActorError::AskTimeout { .. })));

    let reported = system.incidents().of_kind(IncidentKind::Undeliverable);
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].delivery_failure(), Some(DeliveryFailure::NotFound));
}

#[tokio::test]
async fn test_ask_with_unbounded_timeout_gets_reply() {
    let system = ActorSystem::new("forever").unwrap();
    let doubler = system.from_type::<Doubler>("doubler").unwrap();

    let value: u64 = system.ask(&doubler, 21u64, Duration::MAX).await.unwrap();
    assert_eq!(value, 42);
    assert_eq!(system.stats().pending_asks, 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_abandoned_ask_leaves_no_pending_entry() {
    let system = ActorSystem::new("abandoned").unwrap();
    let silent = system.from_type::<Silent>("silent").unwrap();

    let outer = tokio::time::timeout(
        Duration::from_millis(20),
        system.ask::<u32, _>(&silent, 1u32, Duration::from_millis(50)),
    )
    .await;
    assert!(outer.is_err());
    assert_eq!(system.stats().pending_asks, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(system.stats().pending_asks, 0);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_huge_shutdown_timeout_still_stops_tree() {
    let config = RuntimeConfig {
        shutdown_timeout_ms: u64::MAX,
        ..RuntimeConfig::default()
    };
    let system = ActorSystem::with_config("patient", config).unwrap();
    let root = system.from_type::<Silent>("root").unwrap();
    let mid = system.create(Silent::default, "mid", Some(root.id())).unwrap();
    system.create(Silent::default, "leaf", Some(mid.id())).unwrap();

    system.stop_and_wait("root").await.unwrap();
    assert!(system.is_empty());
    assert!(system.incidents().of_kind(IncidentKind::ShutdownIncomplete).is_empty());
}

#[tokio::test]
async fn test_late_reply_is_reported_not_delivered() {
    let system = ActorSystem::new("late").unwrap();
    let sluggish = system.from_type::<Sluggish>("sluggish").unwrap();

    let result: Result<u32> = system
        .ask(&sluggish, Duration::from_millis(100), Duration::from_millis(20))
        .await;
    assert!(matches!(result, Err(ActorError::AskTimeout { .. })));

    let expired = eventually(Duration::from_secs(2), || {
        system
            .incidents()
            .of_kind(IncidentKind::Undeliverable)
            .iter()
            .any(|i| i.delivery_failure() == Some(DeliveryFailure::AskExpired))
    })
    .await;
    assert!(expired, "late reply should be reported as expired");

    // A fresh ask is not confused by the stale reply
    let value: u32 = system
        .ask(&sluggish, Duration::from_millis(1), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(value, 42);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reply_type_mismatch() {
    let system = ActorSystem::new("types").unwrap();
    let doubler = system.from_type::<Doubler>("doubler").unwrap();

    let result: Result<String> = system.ask(&doubler, 4u64, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(ActorError::ReplyTypeMismatch { .. })));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_undeliverable_messages_are_reported() {
    let system = ActorSystem::new("marooned").unwrap();
    let journal = Journal::default();
    let recorder = system.create(Recorder::factory(&journal), "rec", None).unwrap();

    system.tell(&ActorId::from("nobody"), 1u32, None);
    recorder.tell("wrong payload type".to_string(), None);
    // No sender and no correlation: the reply has nowhere to go
    recorder.tell(RecorderMsg::Snapshot, None);

    let reasons = || -> Vec<DeliveryFailure> {
        system
            .incidents()
            .of_kind(IncidentKind::Undeliverable)
            .iter()
            .filter_map(|i| i.delivery_failure())
            .collect()
    };
    assert!(eventually(Duration::from_secs(1), || reasons().len() == 3).await);
    let reasons = reasons();
    assert!(reasons.contains(&DeliveryFailure::NotFound));
    assert!(reasons.contains(&DeliveryFailure::TypeMismatch));
    assert!(reasons.contains(&DeliveryFailure::NoReplyAddress));
    assert_eq!(system.stats().undeliverable_messages, 3);

    system.stop_and_wait("rec").await.unwrap();
    recorder.tell(RecorderMsg::Note("after".into()), None);
    let last = system.incidents().recent().pop().unwrap();
    assert_eq!(last.delivery_failure(), Some(DeliveryFailure::Terminated));
}

/// Slow to start, so its mailbox fills up
#[derive(Default)]
struct SlowStarter;

#[async_trait]
impl Actor for SlowStarter {
    type Message = u32;

    async fn handle(&mut self, _msg: u32, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    async fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_mailbox_full_is_reported() {
    let config = RuntimeConfig {
        mailbox_capacity: 2,
        ..RuntimeConfig::default()
    };
    let system = ActorSystem::with_config("bounded", config).unwrap();
    let actor = system.from_type::<SlowStarter>("slow").unwrap();

    for i in 0..5u32 {
        actor.tell(i, None);
    }
    assert_eq!(actor.mailbox_len(), 2);

    let full = system
        .incidents()
        .of_kind(IncidentKind::Undeliverable)
        .iter()
        .filter(|i| i.delivery_failure() == Some(DeliveryFailure::MailboxFull))
        .count();
    assert_eq!(full, 3);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stopping_parent_terminates_children_first() {
    let system = ActorSystem::new("teardown").unwrap();
    let journal = Journal::default();

    let parent = system.create(Recorder::factory(&journal), "parent", None).unwrap();
    let children: Vec<ActorRef> = (0..4)
        .map(|i| {
            system
                .create(Recorder::factory(&journal), format!("child-{}", i), Some(parent.id()))
                .unwrap()
        })
        .collect();
    let grandchild = system
        .create(Recorder::factory(&journal), "grandchild", Some(children[0].id()))
        .unwrap();

    system.stop_and_wait("parent").await.unwrap();

    assert_eq!(parent.status(), ActorStatus::Terminated);
    assert_eq!(grandchild.status(), ActorStatus::Terminated);
    for child in &children {
        assert_eq!(child.status(), ActorStatus::Terminated);
    }

    let journal = journal.lock().clone();
    assert_eq!(journal.len(), 6);
    assert_eq!(journal.last().unwrap(), "stopped parent");
    let grandchild_at = journal.iter().position(|e| e == "stopped grandchild").unwrap();
    let child_at = journal.iter().position(|e| e == "stopped child-0").unwrap();
    assert!(grandchild_at < child_at);

    assert!(system.actors().is_empty());
    assert!(system.incidents().of_kind(IncidentKind::ShutdownIncomplete).is_empty());
}

/// Takes far longer to stop than any parent is willing to wait
#[derive(Default)]
struct Stubborn;

#[async_trait]
impl Actor for Stubborn {
    type Message = u32;

    async fn handle(&mut self, _msg: u32, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_unresponsive_child_is_orphaned() {
    let config = RuntimeConfig {
        shutdown_timeout_ms: 100,
        ..RuntimeConfig::default()
    };
    let system = ActorSystem::with_config("orphaning", config).unwrap();
    let parent = system.from_type::<Silent>("parent").unwrap();
    let stubborn = system.create(Stubborn::default, "stubborn", Some(parent.id())).unwrap();
    let sibling = system.create(Silent::default, "sibling", Some(parent.id())).unwrap();

    let start = Instant::now();
    system.stop_and_wait("parent").await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));

    assert_eq!(parent.status(), ActorStatus::Terminated);
    assert_eq!(stubborn.status(), ActorStatus::Terminated);
    assert_eq!(sibling.status(), ActorStatus::Terminated);
    assert!(system.actors().is_empty());

    let orphaned = system.incidents().of_kind(IncidentKind::ShutdownIncomplete);
    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0].target, ActorId::from("stubborn"));
    assert_eq!(orphaned[0].origin, Some(ActorId::from("parent")));
    assert_eq!(system.stats().actors_orphaned, 1);
}

#[derive(Debug)]
enum FragileMsg {
    Bump,
    Count,
    Fail,
    Panic,
}

/// Counter that restarts from zero after any fault
#[derive(Default)]
struct Fragile {
    count: u32,
}

#[async_trait]
impl Actor for Fragile {
    type Message = FragileMsg;

    async fn handle(&mut self, msg: FragileMsg, ctx: &mut ActorContext) -> Result<()> {
        match msg {
            FragileMsg::Bump => self.count += 1,
            FragileMsg::Count => ctx.reply(self.count),
            FragileMsg::Fail => return Err(ActorError::handler(ctx.id(), "asked to fail")),
            FragileMsg::Panic => panic!("asked to panic"),
        }
        Ok(())
    }

    async fn on_failure(&mut self, _error: &ActorError, _ctx: &mut ActorContext) -> SupervisorDirective {
        SupervisorDirective::Restart
    }
}

/// Counter that shrugs off faults
#[derive(Default)]
struct Stoic {
    count: u32,
}

#[async_trait]
impl Actor for Stoic {
    type Message = FragileMsg;

    async fn handle(&mut self, msg: FragileMsg, ctx: &mut ActorContext) -> Result<()> {
        match msg {
            FragileMsg::Bump => self.count += 1,
            FragileMsg::Count => ctx.reply(self.count),
            FragileMsg::Fail => return Err(ActorError::handler(ctx.id(), "asked to fail")),
            FragileMsg::Panic => panic!("asked to panic"),
        }
        Ok(())
    }

    async fn on_failure(&mut self, _error: &ActorError, _ctx: &mut ActorContext) -> SupervisorDirective {
        SupervisorDirective::Resume
    }
}

#[tokio::test]
async fn test_panic_restarts_actor_in_place() {
    let system = ActorSystem::new("restart").unwrap();
    let fragile = system.from_type::<Fragile>("fragile").unwrap();
    let bystander = system.from_type::<Doubler>("bystander").unwrap();

    fragile.tell(FragileMsg::Bump, None);
    fragile.tell(FragileMsg::Bump, None);
    fragile.tell(FragileMsg::Panic, None);
    fragile.tell(FragileMsg::Bump, None);

    let count: u32 = system
        .ask(&fragile, FragileMsg::Count, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(count, 1);

    let registered = system.get("fragile").unwrap();
    assert!(registered.same_actor(&fragile));
    assert_eq!(registered.incarnation(), 1);
    assert_eq!(registered.status(), ActorStatus::Running);

    let doubled: u64 = system.ask(&bystander, 21u64, Duration::from_secs(1)).await.unwrap();
    assert_eq!(doubled, 42);

    let stats = system.stats();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.actor_restarts, 1);
    let faults = system.incidents().of_kind(IncidentKind::Fault);
    assert!(matches!(faults[0].error, ActorError::Panicked { .. }));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restart_limit_stops_actor() {
    let config = RuntimeConfig {
        restart: actor_runtime::RestartPolicy {
            max_restarts: 1,
            window_secs: 60,
        },
        ..RuntimeConfig::default()
    };
    let system = ActorSystem::with_config("limits", config).unwrap();
    let fragile = system.from_type::<Fragile>("fragile").unwrap();

    fragile.tell(FragileMsg::Fail, None);
    fragile.tell(FragileMsg::Fail, None);

    assert!(fragile.wait_terminated(Duration::from_secs(1)).await);
    assert!(system.get("fragile").is_err());
    assert_eq!(system.stats().restart_failures, 1);
}

#[tokio::test]
async fn test_resume_keeps_state() {
    let system = ActorSystem::new("resume").unwrap();
    let stoic = system.from_type::<Stoic>("stoic").unwrap();

    stoic.tell(FragileMsg::Bump, None);
    stoic.tell(FragileMsg::Fail, None);
    stoic.tell(FragileMsg::Panic, None);
    stoic.tell(FragileMsg::Bump, None);

    let count: u32 = system.ask(&stoic, FragileMsg::Count, Duration::from_secs(1)).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(system.stats().faults, 2);

    system.shutdown().await.unwrap();
}

/// Keeps the default directive, so any fault stops it
#[derive(Default)]
struct Brittle;

#[async_trait]
impl Actor for Brittle {
    type Message = FragileMsg;

    async fn handle(&mut self, msg: FragileMsg, _ctx: &mut ActorContext) -> Result<()> {
        if let FragileMsg::Panic = msg {
            panic!("brittle actor broke");
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_default_directive_stops_faulty_actor() {
    let system = ActorSystem::new("default-stop").unwrap();
    let parent = system.from_type::<Silent>("parent").unwrap();
    let brittle = system.create(Brittle::default, "brittle", Some(parent.id())).unwrap();

    brittle.tell(FragileMsg::Panic, None);
    brittle.tell(FragileMsg::Bump, None);

    assert!(brittle.wait_terminated(Duration::from_secs(1)).await);
    assert!(matches!(system.get("brittle"), Err(ActorError::NotFound { .. })));
    assert!(system.children_of("parent").is_empty());
    assert_eq!(parent.status(), ActorStatus::Running);

    let stats = system.stats();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.actor_restarts, 0);
    // The message queued behind the fault is marooned
    let leftovers = system.incidents().of_kind(IncidentKind::Undeliverable);
    assert_eq!(leftovers.len(), 1);
    assert_eq!(leftovers[0].delivery_failure(), Some(DeliveryFailure::Terminated));

    system.shutdown().await.unwrap();
}

/// Asks a doubler from inside its own handler and forwards the answer
struct Relay {
    doubler: ActorRef,
}

#[async_trait]
impl Actor for Relay {
    type Message = u64;

    async fn handle(&mut self, n: u64, ctx: &mut ActorContext) -> Result<()> {
        let doubled: u64 = ctx.ask(&self.doubler, n, Duration::from_secs(1)).await?;
        ctx.reply(doubled + 1);
        Ok(())
    }
}

#[tokio::test]
async fn test_ask_from_inside_actor() {
    let system = ActorSystem::new("relay").unwrap();
    let doubler = system.from_type::<Doubler>("doubler").unwrap();
    let relay = {
        let doubler = doubler.clone();
        system
            .create(move || Relay { doubler: doubler.clone() }, "relay", None)
            .unwrap()
    };

    let value: u64 = system.ask(&relay, 10u64, Duration::from_secs(1)).await.unwrap();
    assert_eq!(value, 21);

    system.shutdown().await.unwrap();
}

#[derive(Debug)]
enum RequesterMsg {
    Start,
    Answer(Result<u64>),
    Ping,
}

/// Fires an ask with a continuation and keeps serving pings meanwhile
struct Requester {
    target: ActorRef,
    results: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Actor for Requester {
    type Message = RequesterMsg;

    async fn handle(&mut self, msg: RequesterMsg, ctx: &mut ActorContext) -> Result<()> {
        match msg {
            RequesterMsg::Start => {
                ctx.ask_then(&self.target, Duration::from_millis(80), Duration::from_secs(1), |reply: Result<u32>| {
                    RequesterMsg::Answer(reply.map(u64::from))
                });
            }
            RequesterMsg::Answer(Ok(value)) => self.results.lock().push(format!("answer {}", value)),
            RequesterMsg::Answer(Err(e)) => self.results.lock().push(format!("error {}", e)),
            RequesterMsg::Ping => self.results.lock().push("ping".to_string()),
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_ask_then_does_not_block_the_turn() {
    let system = ActorSystem::new("continuations").unwrap();
    let sluggish = system.from_type::<Sluggish>("sluggish").unwrap();
    let results: Arc<Mutex<Vec<String>>> = Arc::default();

    let requester = {
        let results = Arc::clone(&results);
        let target = sluggish.clone();
        system
            .create(
                move || Requester {
                    target: target.clone(),
                    results: Arc::clone(&results),
                },
                "requester",
                None,
            )
            .unwrap()
    };

    requester.tell(RequesterMsg::Start, None);
    requester.tell(RequesterMsg::Ping, None);

    assert!(eventually(Duration::from_secs(2), || results.lock().len() == 2).await);
    assert_eq!(*results.lock(), vec!["ping", "answer 42"]);

    system.shutdown().await.unwrap();
}

// `ask_blocking` needs worker threads to drive the actors while it blocks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ask_blocking_from_plain_thread() {
    let system = ActorSystem::new("blocking").unwrap();
    let doubler = system.from_type::<Doubler>("doubler").unwrap();

    let blocking_system = system.clone();
    let value = tokio::task::spawn_blocking(move || {
        blocking_system.ask_blocking::<u64, _>(&doubler, 8u64, Duration::from_secs(1))
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(value, 16);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_fails_outstanding_asks() {
    let system = ActorSystem::new("shutdown").unwrap();
    let silent = system.from_type::<Silent>("silent").unwrap();
    let journal = Journal::default();
    let root = system.create(Recorder::factory(&journal), "root", None).unwrap();
    system.create(Recorder::factory(&journal), "leaf", Some(root.id())).unwrap();

    let asker = {
        let system = system.clone();
        tokio::spawn(async move {
            system
                .ask::<u32, _>(&silent, 1u32, Duration::from_secs(30))
                .await
        })
    };
    assert!(eventually(Duration::from_secs(1), || system.stats().pending_asks == 1).await);

    system.shutdown().await.unwrap();
    let outcome = asker.await.unwrap();
    assert!(matches!(outcome, Err(ActorError::SystemStopped { .. })));

    assert!(system.actors().is_empty());
    let stats = system.stats();
    assert_eq!(stats.actors_created, 3);
    assert_eq!(stats.actors_terminated, 3);
    assert_eq!(stats.live_actors, 0);
}

#[tokio::test]
async fn test_context_creates_children() {
    #[derive(Default)]
    struct Spawner;

    #[async_trait]
    impl Actor for Spawner {
        type Message = String;

        async fn handle(&mut self, name: String, ctx: &mut ActorContext) -> Result<()> {
            let child = ctx.create_child(Silent::default, name)?;
            ctx.reply(child.id().clone());
            Ok(())
        }
    }

    let system = ActorSystem::new("spawning").unwrap();
    let spawner = system.from_type::<Spawner>("spawner").unwrap();

    let child: ActorId = system
        .ask(&spawner, "worker".to_string(), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(system.parent_of(&child).unwrap(), Some(ActorId::from("spawner")));

    // Identity already taken: the handler error is contained
    let retry: Result<ActorId> = system
        .ask(&spawner, "worker".to_string(), Duration::from_millis(50))
        .await;
    assert!(matches!(retry, Err(ActorError::AskTimeout { .. })));
    let faults = system.incidents().of_kind(IncidentKind::Fault);
    assert!(matches!(faults[0].error, ActorError::DuplicateIdentity { .. }));

    system.shutdown().await.unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_tell_order_is_preserved(notes in proptest::collection::vec("[a-z]{1,6}", 1..24)) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let seen = runtime.block_on(async {
            let system = ActorSystem::new("fifo").unwrap();
            let journal = Journal::default();
            let recorder = system.create(Recorder::factory(&journal), "rec", None).unwrap();
            for note in &notes {
                recorder.tell(RecorderMsg::Note(note.clone()), None);
            }
            let seen: Vec<String> = system
                .ask(&recorder, RecorderMsg::Snapshot, Duration::from_secs(5))
                .await
                .unwrap();
            system.shutdown().await.unwrap();
            seen
        });

        prop_assert_eq!(seen, notes);
    }
}
