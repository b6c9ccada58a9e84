#![forbid(unsafe_code)]
//! fxdeleg-core: the binder-side vocabulary that delegation telemetry reads.
//!
//! This crate models just enough of a formula-language front end for
//! telemetry to name things: operators, syntax nodes and their kinds,
//! resolved types, data-source and function handles, and the binding that
//! maps call nodes to the functions they resolved to.
//!
//! No IO lives here. Trackers and sinks belong in `fxdeleg-telemetry`.

pub mod binding;
pub mod config;
pub mod entities;
pub mod error;
pub mod functions;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod syntax;
pub mod types;

/// Crate version, stamped into CLI output for provenance.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
