//! Media Tracking
//!
//! Example consumer of the actor runtime: one actor keeps the tracking
//! entries of media files being processed, and `MediaTrackingFacade` offers
//! typed methods over it.
//!
//! ```rust,no_run
//! use actor_runtime::ActorSystem;
//! use media_tracking::{spawn_tracking_actor, MediaTrackingFacade, TrackingEvent};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let system = ActorSystem::new("media")?;
//! spawn_tracking_actor(&system)?;
//!
//! let tracking = MediaTrackingFacade::from_system(&system);
//! let id = tracking.create_entry("/incoming/song.mp3").await?;
//! tracking.notify_event(&id, TrackingEvent::new("TAGGED", "tags written"));
//! let summary = tracking.summary().await?;
//! assert_eq!(summary.total(), 1);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod error;
pub mod facade;
pub mod messages;

pub use actor::TrackingActor;
pub use error::{Result, TrackingError};
pub use facade::{spawn_tracking_actor, MediaTrackingFacade, TRACKING_ACTOR_ID};
pub use messages::{
    MediaFile, Severity, TrackingEvent, TrackingId, TrackingInfo, TrackingReply, TrackingRequest,
    TrackingSummary,
};
