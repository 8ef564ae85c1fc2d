use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use booklint_model::SourceTree;
use booklint_types::{Diagnostic, DiagnosticKind, Finding, Location};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::rules::{RuleCatalog, RuleDefinition, Violation, render_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Run predicates on the rayon pool instead of the calling thread.
    pub parallel: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Raw findings in catalog order; the aggregator imposes the final order.
    pub findings: Vec<Finding>,
    /// One `internal_rule_error` per failed predicate.
    pub diagnostics: Vec<Diagnostic>,
    pub rules_evaluated: u32,
}

enum RuleOutcome {
    Findings(Vec<Finding>),
    Failed(Diagnostic),
}

/// Runs every predicate of `catalog` against `tree`.
///
/// A predicate that returns an error or panics contributes no findings and one
/// diagnostic; the remaining predicates still run.
pub fn evaluate(tree: &SourceTree, catalog: &RuleCatalog, options: EvaluateOptions) -> Evaluation {
    let run = |rule: &RuleDefinition| run_rule(tree, rule);
    let outcomes: Vec<RuleOutcome> = if options.parallel {
        catalog.rules().par_iter().map(run).collect()
    } else {
        catalog.rules().iter().map(run).collect()
    };

    let mut evaluation = Evaluation::default();
    for outcome in outcomes {
        evaluation.rules_evaluated = evaluation.rules_evaluated.saturating_add(1);
        match outcome {
            RuleOutcome::Findings(findings) => evaluation.findings.extend(findings),
            RuleOutcome::Failed(diagnostic) => evaluation.diagnostics.push(diagnostic),
        }
    }

    debug!(
        rules = evaluation.rules_evaluated,
        findings = evaluation.findings.len(),
        failed = evaluation.diagnostics.len(),
        "evaluated rule catalog"
    );
    evaluation
}

fn run_rule(tree: &SourceTree, rule: &RuleDefinition) -> RuleOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| (rule.predicate)(tree)));
    let error = match result {
        Ok(Ok(violations)) => return RuleOutcome::Findings(to_findings(rule, violations)),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
    };

    warn!(rule = rule.code, error = %error, "rule predicate failed");
    RuleOutcome::Failed(Diagnostic {
        kind: DiagnosticKind::InternalRuleError,
        path: String::new(),
        subject: Some(rule.code.to_string()),
        message: format!("rule {} failed: {error}", rule.code),
    })
}

/// Converts violations into findings, merging those that share a location.
///
/// Findings are identified by `(code, path, location)`, so several details at
/// one place are joined into a single message.
fn to_findings(rule: &RuleDefinition, violations: Vec<Violation>) -> Vec<Finding> {
    let mut merged: BTreeMap<(String, Location), Vec<String>> = BTreeMap::new();
    for violation in violations {
        let details = merged
            .entry((violation.path, violation.location))
            .or_default();
        if let Some(detail) = violation.detail {
            if !details.contains(&detail) {
                details.push(detail);
            }
        }
    }

    merged
        .into_iter()
        .map(|((path, location), details)| {
            let detail = (!details.is_empty()).then(|| details.join(", "));
            Finding {
                code: rule.code.to_string(),
                severity: rule.severity,
                path,
                location,
                message: render_message(rule.message, detail.as_deref()),
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
