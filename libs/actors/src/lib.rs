//! In-Process Actor Runtime
//!
//! Hierarchical actors with private state, FIFO mailboxes, fire-and-forget
//! `tell`, request/response `ask` with timeouts, and structured stop of whole
//! subtrees. Every actor runs as its own tokio task, so one actor handles one
//! message at a time while many actors share the worker pool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     ActorSystem                      │
//! │                                                      │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │ ActorRegistry│  │ PendingAsks  │  │ IncidentLog│  │
//! │  │ id → ref     │  │ token → slot │  │ marooned + │  │
//! │  │ id → parent  │  │              │  │ faults     │  │
//! │  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                      │
//! │  ┌─────────────┐  Mailbox   ┌──────────────────────┐ │
//! │  │ ActorRef    │───────────▶│ ActorTask (tokio)    │ │
//! │  │ tell / stop │  FIFO      │ state + ActorContext │ │
//! │  └─────────────┘            └──────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! `Created → Running → Stopping → Terminated`. A stop request is queued
//! behind pending messages. A stopping actor first stops all of its
//! children and waits for them, then runs `on_stop`, then leaves the
//! registry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use actor_runtime::{Actor, ActorContext, ActorSystem, Result};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Counter {
//!     total: u64,
//! }
//!
//! #[async_trait]
//! impl Actor for Counter {
//!     type Message = u64;
//!
//!     async fn handle(&mut self, msg: u64, ctx: &mut ActorContext) -> Result<()> {
//!         self.total += msg;
//!         ctx.reply(self.total);
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let system = ActorSystem::new("example")?;
//! let counter = system.from_type::<Counter>("counter")?;
//! let total: u64 = system.ask(&counter, 5u64, Duration::from_secs(1)).await?;
//! assert_eq!(total, 5);
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod actor_ref;
mod ask;
pub mod config;
pub mod context;
pub mod error;
pub mod incidents;
pub mod mailbox;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod supervision;
pub mod system;

pub use actor::{Actor, Factory};
pub use actor_ref::{ActorRef, ActorStatus};
pub use config::{RestartPolicy, RuntimeConfig};
pub use context::ActorContext;
pub use error::{ActorError, DeliveryFailure, Result};
pub use incidents::{Incident, IncidentKind, IncidentLog};
pub use mailbox::Mailbox;
pub use message::{CorrelationId, Envelope, EnvelopeMeta};
pub use metrics::{SystemMetrics, SystemStats};
pub use registry::{ActorId, ActorRegistry};
pub use supervision::SupervisorDirective;
pub use system::ActorSystem;
