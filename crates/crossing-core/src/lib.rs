//! Single-track crossing simulation
//!
//! Trains arrive from two directions and share one stretch of track. Every
//! train runs as its own task: it loads, then joins the ordered queue of its
//! direction. A single arbiter task grants the track to one train at a time.
//!
//! ## Core Components
//!
//! - **Train**: immutable record with direction, priority and durations
//! - **DirectionalQueue / QueuePair**: per-direction waiting lists kept in
//!   admission order, each behind its own lock
//! - **SelectionPolicy**: priority, tie-breaks and the starvation cap
//! - **LoadActor**: per-train task, loads then queues and notifies
//! - **Arbiter**: grants the track and simulates each crossing
//! - **EventSink**: receives `ReadyToGo`, `EnteredTrack` and `ExitedTrack`
//! - **CrossingSimulation**: builds a run, starts every task together and
//!   collects a `RunReport`
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use crossing_core::{parse_records, CrossingConfig, CrossingSimulation, TracingSink};
//!
//! # async fn demo() -> Result<(), crossing_core::CrossingError> {
//! let config = CrossingConfig::default();
//! let loaded = parse_records("E 2 3\nw 1 1\n", config.time_unit(), config.max_trains);
//! let simulation = CrossingSimulation::new(config, loaded.trains, Arc::new(TracingSink))?;
//! let report = simulation.run().await?;
//! println!("{:?}", report.admission_order());
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod arbiter;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod input;
pub mod policy;
pub mod queue;
pub mod simulation;
pub mod train;

// Core exports
pub use actor::{LoadActor, ReadyNotice};
pub use arbiter::{Admission, Arbiter, ArbiterPhase};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use clock::{Elapsed, SimClock, DEFAULT_TIME_UNIT};
pub use config::{CrossingConfig, DEFAULT_MAX_TRAINS};
pub use error::{CrossingError, CrossingResult};
pub use event::{
    CrossingEvent, EventKind, EventSink, FanoutSink, MemorySink, SharedSink, TracingSink,
    WriterSink,
};
pub use input::{parse_records, LoadedTrains};
pub use policy::{ArbiterState, Decision, DecisionReason, SelectionPolicy, DEFAULT_STARVATION_CAP};
pub use queue::{DirectionalQueue, Fronts, QueuePair};
pub use simulation::{CrossingSimulation, RunReport};
pub use train::{Direction, Priority, Train, TrainId};
