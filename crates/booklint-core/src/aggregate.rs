use booklint_types::{Diagnostic, FailOn, Finding, Severity, VerdictCounts, VerdictStatus};

/// Sorts findings by `(code, path, location, message)` and drops repeats of
/// the same `(code, path, location)`, keeping the first in that order.
pub fn finalize_findings(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    findings.dedup_by(|later, earlier| later.identity() == earlier.identity());
    findings
}

/// Sorts diagnostics by `(kind, path, subject, message)` and removes exact repeats.
pub fn finalize_diagnostics(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort();
    diagnostics.dedup();
    diagnostics
}

/// Counts for one target after reconciliation.
pub(crate) fn count(findings: &[Finding], suppressed: u32, diagnostics: usize) -> VerdictCounts {
    let mut counts = VerdictCounts {
        suppressed,
        diagnostics: u32::try_from(diagnostics).unwrap_or(u32::MAX),
        ..VerdictCounts::default()
    };
    for finding in findings {
        match finding.severity {
            Severity::Warning => counts.warning = counts.warning.saturating_add(1),
            Severity::Error => counts.error = counts.error.saturating_add(1),
        }
    }
    counts
}

pub fn verdict_for(counts: &VerdictCounts) -> VerdictStatus {
    if counts.error > 0 || counts.failed_targets > 0 {
        VerdictStatus::Fail
    } else if counts.warning > 0 {
        VerdictStatus::Warn
    } else {
        VerdictStatus::Pass
    }
}

/// Process exit code for a finished run.
///
/// `0` pass, `2` an error finding or a failed target, `3` warnings under
/// `--fail-on warning`. Diagnostics never affect the result.
pub fn compute_exit_code(fail_on: FailOn, counts: &VerdictCounts) -> i32 {
    if matches!(fail_on, FailOn::Never) {
        return 0;
    }

    if counts.error > 0 || counts.failed_targets > 0 {
        return 2;
    }

    if matches!(fail_on, FailOn::Warning) && counts.warning > 0 {
        return 3;
    }

    0
}

#[cfg(test)]
mod tests {
    use booklint_types::{DiagnosticKind, Location};

    use super::*;

    fn finding(code: &str, path: &str, line: u32, message: &str) -> Finding {
        Finding {
            code: code.to_string(),
            severity: Severity::Error,
            path: path.to_string(),
            location: Location::Line { line },
            message: message.to_string(),
        }
    }

    #[test]
    fn findings_are_sorted_then_deduplicated_by_identity() {
        let out = finalize_findings(vec![
            finding("x-001", "b.css", 2, "late"),
            finding("c-002", "a.css", 9, "z"),
            finding("c-002", "a.css", 9, "a"),
            finding("c-002", "a.css", 1, "m"),
        ]);
        let keys: Vec<(&str, u32, &str)> = out
            .iter()
            .map(|f| (f.code.as_str(), f.location.line().unwrap_or(0), f.message.as_str()))
            .collect();
        assert_eq!(keys, vec![("c-002", 1, "m"), ("c-002", 9, "a"), ("x-001", 2, "late")]);
    }

    #[test]
    fn diagnostics_sort_by_kind_first() {
        let stale = Diagnostic {
            kind: DiagnosticKind::StaleSuppression,
            path: "booklint-ignore.toml".to_string(),
            subject: Some("s-013".to_string()),
            message: "stale".to_string(),
        };
        let internal = Diagnostic {
            kind: DiagnosticKind::InternalRuleError,
            path: String::new(),
            subject: Some("x-013".to_string()),
            message: "boom".to_string(),
        };
        let out = finalize_diagnostics(vec![stale.clone(), internal.clone(), stale.clone()]);
        assert_eq!(out, vec![internal, stale]);
    }

    #[test]
    fn exit_codes() {
        let errors = VerdictCounts {
            error: 1,
            ..VerdictCounts::default()
        };
        let warnings = VerdictCounts {
            warning: 2,
            diagnostics: 5,
            ..VerdictCounts::default()
        };
        let failed = VerdictCounts {
            failed_targets: 1,
            ..VerdictCounts::default()
        };
        assert_eq!(compute_exit_code(FailOn::Error, &errors), 2);
        assert_eq!(compute_exit_code(FailOn::Error, &failed), 2);
        assert_eq!(compute_exit_code(FailOn::Error, &warnings), 0);
        assert_eq!(compute_exit_code(FailOn::Warning, &warnings), 3);
        assert_eq!(compute_exit_code(FailOn::Never, &errors), 0);
        assert_eq!(compute_exit_code(FailOn::Error, &VerdictCounts::default()), 0);
    }

    #[test]
    fn verdict_follows_counts() {
        assert_eq!(verdict_for(&VerdictCounts::default()), VerdictStatus::Pass);
        let warn = VerdictCounts {
            warning: 1,
            ..VerdictCounts::default()
        };
        assert_eq!(verdict_for(&warn), VerdictStatus::Warn);
    }
}
