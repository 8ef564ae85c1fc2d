//! BDD-style integration tests for booklint CLI workflows.
//!
//! These tests follow Given/When/Then patterns to verify end-to-end CLI behavior.

#[path = "integration/test_book.rs"]
mod test_book;

#[path = "integration/acceptance_scenarios.rs"]
mod acceptance_scenarios;

#[path = "integration/target_resilience.rs"]
mod target_resilience;

#[path = "integration/suppression_overrides.rs"]
mod suppression_overrides;

#[path = "integration/output_modes.rs"]
mod output_modes;

#[path = "integration/fail_on_behavior.rs"]
mod fail_on_behavior;
