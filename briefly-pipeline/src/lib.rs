//! One research run: search, extract, summarize, export.
//!
//! [`Orchestrator::run`] drives the stages in order and always returns a
//! [`RunReport`]; failures (including panics inside a stage) end the run in
//! [`Stage::Failed`] with a user-facing message and remedy.

mod orchestrator;
mod report;

pub use orchestrator::Orchestrator;
pub use report::{Failure, RunOutcome, RunReport, RunStats, Stage, StageTiming};
