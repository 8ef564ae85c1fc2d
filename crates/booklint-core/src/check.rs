use std::path::{Path, PathBuf};

use booklint_domain::{EvaluateOptions, IgnoreManifest, Overrides, RuleCatalog, evaluate, reconcile};
use booklint_model::SourceTree;
use booklint_types::{
    DEFAULT_IGNORE_FILE, FailOn, REPORT_SCHEMA_V1, RunReport, TargetPhase, TargetReport, ToolMeta,
    Verdict, VerdictCounts,
};
use tracing::{debug, error, info, info_span};

use crate::aggregate::{count, finalize_diagnostics, finalize_findings, verdict_for};
use crate::ignore::load_ignore_manifest;

/// Everything one `check` invocation needs besides the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPlan {
    /// Target directories, in command-line order.
    pub targets: Vec<PathBuf>,
    pub overrides: Overrides,
    /// Evaluate rules on the rayon pool.
    pub parallel: bool,
    /// Ignore manifest file name, looked up in each target's root.
    pub ignore_file: String,
    pub fail_on: FailOn,
}

impl Default for CheckPlan {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            overrides: Overrides::default(),
            parallel: true,
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            fail_on: FailOn::default(),
        }
    }
}

/// Tracks a target through its phases and refuses to move backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLifecycle {
    target: String,
    phase: TargetPhase,
}

impl TargetLifecycle {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            phase: TargetPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> TargetPhase {
        self.phase
    }

    pub fn advance(&mut self, next: TargetPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal target transition {} -> {}",
            self.phase.as_str(),
            next.as_str()
        );
        debug!(target = %self.target, from = self.phase.as_str(), to = next.as_str(), "phase");
        self.phase = next;
    }
}

/// Runs the whole pipeline for one target directory.
///
/// A target that cannot be loaded ends in `parse_failed` with a single
/// failure entry and no findings. It never aborts the caller.
pub fn run_target(target: &Path, plan: &CheckPlan, catalog: &RuleCatalog) -> TargetReport {
    let name = target.display().to_string();
    let _span = info_span!("target", target = %name).entered();
    let mut lifecycle = TargetLifecycle::new(name.clone());

    lifecycle.advance(TargetPhase::Parsing);
    let tree = match SourceTree::load(target) {
        Ok(tree) => tree,
        Err(err) => {
            error!(error = %err, "target failed to load");
            lifecycle.advance(TargetPhase::ParseFailed);
            let mut failure = err.into_failure();
            if failure.path == name {
                failure.path.clear();
            }
            return TargetReport {
                target: name,
                phase: lifecycle.phase(),
                findings: Vec::new(),
                diagnostics: Vec::new(),
                failure: Some(failure),
                counts: VerdictCounts {
                    failed_targets: 1,
                    ..VerdictCounts::default()
                },
                rules_evaluated: 0,
            };
        }
    };
    lifecycle.advance(TargetPhase::Parsed);
    info!(
        documents = tree.documents().len(),
        stylesheets = tree.stylesheets().len(),
        "target loaded"
    );

    lifecycle.advance(TargetPhase::Evaluating);
    let evaluation = evaluate(
        &tree,
        catalog,
        EvaluateOptions {
            parallel: plan.parallel,
        },
    );

    lifecycle.advance(TargetPhase::Reconciling);
    let (manifest, mut diagnostics) = if plan.overrides.skip_ignore {
        debug!("ignore manifest skipped");
        (IgnoreManifest::empty(), Vec::new())
    } else {
        load_ignore_manifest(target, &plan.ignore_file, catalog)
    };
    let reconciliation = reconcile(evaluation.findings, &manifest, &plan.overrides);
    diagnostics.extend(evaluation.diagnostics);
    diagnostics.extend(reconciliation.diagnostics);

    let findings = finalize_findings(reconciliation.kept);
    let diagnostics = finalize_diagnostics(diagnostics);
    let counts = count(&findings, reconciliation.suppressed, diagnostics.len());
    info!(
        errors = counts.error,
        warnings = counts.warning,
        suppressed = counts.suppressed,
        diagnostics = counts.diagnostics,
        "target checked"
    );

    lifecycle.advance(TargetPhase::Reported);
    TargetReport {
        target: name,
        phase: lifecycle.phase(),
        findings,
        diagnostics,
        failure: None,
        counts,
        rules_evaluated: evaluation.rules_evaluated,
    }
}

/// Runs every target in order, handing each report to `on_target` as soon as
/// it is complete, and returns the aggregated report.
pub fn run_targets(
    plan: &CheckPlan,
    catalog: &RuleCatalog,
    mut on_target: impl FnMut(&TargetReport),
) -> RunReport {
    let mut targets = Vec::with_capacity(plan.targets.len());
    let mut counts = VerdictCounts::default();

    for target in &plan.targets {
        let report = run_target(target, plan, catalog);
        counts.absorb(&report.counts);
        on_target(&report);
        targets.push(report);
    }

    RunReport {
        schema: REPORT_SCHEMA_V1.to_string(),
        tool: ToolMeta {
            name: "booklint".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        targets,
        verdict: Verdict {
            status: verdict_for(&counts),
            counts,
        },
    }
}
