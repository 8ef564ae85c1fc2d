//! Core engine: runs the lint pipeline per target and aggregates the results.

mod aggregate;
mod check;
mod ignore;
mod render;

pub use aggregate::{compute_exit_code, finalize_diagnostics, finalize_findings, verdict_for};
pub use check::{CheckPlan, TargetLifecycle, run_target, run_targets};
pub use ignore::load_ignore_manifest;
pub use render::{render_json, render_plain, render_summary, render_table};
