//! Application layer: the lifecycle engine that turns request files into
//! status reports.
//!
//! The `Engine` owns the shared `Registry` and the polling loop; every
//! admitted file gets its own `RequestProcessor` task holding an
//! immutable snapshot of the parsed request.

pub mod engine;
pub mod processor;
pub mod registry;
