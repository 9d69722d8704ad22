//! inos-core: Assessment orchestration engine for the inos device diagnostics app
//!
//! This crate provides the engine behind the assessment list:
//!
//! - **Catalog** - [`Catalog`] for the ordered, flag-filtered set of [`Assessment`]s
//! - **Drivers** - [`AssessmentDriver`] implementations that probe hardware groups
//! - **Outcome streams** - [`outcome_stream`] reducing any probe to one pass/fail value
//! - **Orchestrator** - [`Orchestrator`] for single and serial runs with confirmation gating
//! - **Persistence** - [`ResultStore`] over a [`KeyValueStore`]
//! - **Event system** - [`EventBus`] trait and [`MemoryEventBus`] for UI and system signals
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inos_core::driver::{DriverKind, DriverSet, MockDriver};
//! use inos_core::{
//!     Assessment, Catalog, DeviceShape, MemoryEventBus, MemoryKeyValueStore, NoFeedback,
//!     Orchestrator, OrchestratorParts, ResultStore, StaticFlags, TimingConfig,
//! };
//!
//! async fn example() {
//!     let orchestrator = Orchestrator::new(OrchestratorParts {
//!         catalog: Catalog::new(Arc::new(StaticFlags::all_enabled())),
//!         shape: DeviceShape::phone(),
//!         drivers: DriverSet::new(
//!             Arc::new(MockDriver::new(DriverKind::Device)),
//!             Arc::new(MockDriver::new(DriverKind::Connectivity)),
//!             Arc::new(MockDriver::new(DriverKind::Physical)),
//!             Arc::new(MockDriver::new(DriverKind::Power)),
//!         ),
//!         bus: Arc::new(MemoryEventBus::default()),
//!         results: ResultStore::new(Arc::new(MemoryKeyValueStore::new())),
//!         timing: TimingConfig::immediate(),
//!         feedback: Arc::new(NoFeedback),
//!     });
//!
//!     orchestrator.run_single(Assessment::Cpu).wait().await;
//!     println!("{:?}", orchestrator.state().passed.get(Assessment::Cpu));
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   run_single / run_serial   ┌───────────────────┐
//! │      UI      │ ──────────────────────────▶ │   Orchestrator    │
//! │ (watch state)│ ◀────────────────────────── │  gate · results   │
//! └──────┬───────┘      OrchestratorState      └─────────┬─────────┘
//!        │ surface / count events                        │ outcome_stream
//!        ▼                                               ▼
//! ┌──────────────┐                             ┌───────────────────┐
//! │   EventBus   │ ──────────────────────────▶ │ AssessmentDriver  │
//! └──────────────┘                             │ device · power ·  │
//!                                              │ physical · conn.  │
//!                                              └───────────────────┘
//! ```

pub mod assessment;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod outcome;
pub mod store;
pub mod surface;

// Re-export key types for convenience
pub use assessment::{
    AppGate, Assessment, Catalog, DeviceShape, FeatureFlags, PassedAssessments, ProbePattern,
    StaticFlags, Surface, SystemTrigger,
};
pub use config::{CatalogConfig, EventsConfig, InosConfig, StoreConfig, TimingConfig};
pub use driver::{AssessmentDriver, DriverKind, DriverSet, Measurement, ProbeUpdate};
pub use error::{AssessmentError, ConfigError, InosError, StoreError};
pub use events::{DeviceEvent, EventBus, EventSeq, MemoryEventBus};
pub use orchestrator::{
    DeviceStatus, Feedback, NoFeedback, Orchestrator, OrchestratorParts, OrchestratorState,
    RunHandle, RunMode, RunOutcome, StatusKind,
};
pub use outcome::{OutcomeStream, ProbeContext, SurfaceControl, outcome_stream};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, ResultStore};
