//! Domain logic: the rule catalog, rule evaluation and suppression reconciliation.
//!
//! This crate is I/O-free. It operates on an already built
//! [`booklint_model::SourceTree`] and never touches the filesystem.

pub mod catalog;
pub mod evaluate;
pub mod rules;
pub mod suppression;

pub use evaluate::{EvaluateOptions, Evaluation, evaluate};
pub use rules::{
    CatalogError, Predicate, RuleCatalog, RuleDefinition, RuleError, Violation, render_message,
};
pub use suppression::{IgnoreEntry, IgnoreManifest, Overrides, Reconciliation, reconcile};
