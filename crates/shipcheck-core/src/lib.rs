//! Production-readiness scanner for Next.js and Supabase projects.
//!
//! Extractors turn source files and SQL migrations into a [`graph::Graph`],
//! rules turn the graph into [`finding::Finding`]s and the report builder
//! applies the baseline and decides whether the project can ship.

pub mod baseline;
pub mod boundary;
pub mod config;
pub mod extractors;
pub mod finding;
pub mod graph;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod rules;
pub mod scan;
pub mod source;
pub mod visitor;

pub use extractors::FileInfo;
pub use finding::Finding;
pub use graph::Graph;
pub use report::{BuildOptions, ShipStatus, ValidationContext, build_validation_context};
pub use scan::{CancellationToken, ScanEngine, ScanError, ScanOutcome};
