#![forbid(unsafe_code)]
//! fxdeleg-telemetry: what the binder reports when it decides delegability.
//!
//! - `descriptor`: the immutable `DelegationTelemetryInfo` value, one
//!   constructor per event category.
//! - `status`: the closed set of delegation outcomes a descriptor is filed under.
//! - `tracker`: the sink seam (`DelegationTracker`) plus recording and
//!   `tracing`-backed implementations.
//! - `dsl`: YAML event files, for replaying binder decisions outside a binder.
//!
//! Transport, batching and persistence are the sink's business, not ours.

pub mod descriptor;
pub mod dsl;
pub mod error;
pub mod metrics;
pub mod status;
pub mod tracker;

pub use descriptor::DelegationTelemetryInfo;
pub use dsl::yaml::{parse_yaml_events, EventDef, EventFile};
pub use error::{Error, Result};
pub use status::DelegationStatus;
pub use tracker::{report, DelegationEvent, DelegationTracker, RecordingTracker};

#[cfg(feature = "tracing")]
pub use tracker::TracingTracker;
