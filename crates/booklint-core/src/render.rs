use booklint_types::{Diagnostic, Finding, RunReport, TargetReport, VerdictStatus};

/// Human-readable rendering of one target, findings grouped per rule code.
pub fn render_table(report: &TargetReport) -> String {
    let mut out = String::new();

    if let Some(failure) = &report.failure {
        out.push_str(&format!("{}: failed ({}) ", report.target, failure.kind.as_str()));
        if !failure.path.is_empty() {
            out.push_str(&format!("{}: ", failure.path));
        }
        out.push_str(&format!("{}\n", failure.message));
        return out;
    }

    let counts = &report.counts;
    if report.findings.is_empty() {
        out.push_str(&format!("{}: no findings", report.target));
    } else {
        out.push_str(&format!(
            "{}: {} error(s), {} warning(s)",
            report.target, counts.error, counts.warning
        ));
    }
    if counts.suppressed > 0 {
        out.push_str(&format!(", {} suppressed", counts.suppressed));
    }
    out.push('\n');

    for group in report.findings.chunk_by(|a, b| a.code == b.code) {
        let first = &group[0];
        out.push_str(&format!(
            "{} ({}, {})\n",
            first.code,
            first.severity.as_str(),
            group.len()
        ));
        for finding in group {
            out.push_str(&render_finding_row(finding));
        }
    }

    if !report.diagnostics.is_empty() {
        out.push_str("diagnostics:\n");
        for diagnostic in &report.diagnostics {
            out.push_str(&format!(
                "  {}  {}  {}\n",
                diagnostic.kind.code(),
                display_path(&diagnostic.path),
                diagnostic.message
            ));
        }
    }

    out
}

fn render_finding_row(finding: &Finding) -> String {
    format!(
        "  {}  {}  {}\n",
        finding.path, finding.location, finding.message
    )
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "-" } else { path }
}

/// Tab-separated rendering for scripts: `code<TAB>file<TAB>message` per
/// finding, then the diagnostics under a `# diagnostics` line.
pub fn render_plain(report: &TargetReport) -> String {
    let mut out = String::new();

    if let Some(failure) = &report.failure {
        out.push_str(&format!(
            "{}-error\t{}\t{}\n",
            failure.kind.as_str(),
            target_path(&report.target, &failure.path),
            failure.message
        ));
        return out;
    }

    for finding in &report.findings {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            finding.code,
            target_path(&report.target, &finding.path),
            finding.message
        ));
    }

    if !report.diagnostics.is_empty() {
        out.push_str("# diagnostics\n");
        for diagnostic in &report.diagnostics {
            out.push_str(&render_plain_diagnostic(&report.target, diagnostic));
        }
    }

    out
}

fn render_plain_diagnostic(target: &str, diagnostic: &Diagnostic) -> String {
    format!(
        "{}\t{}\t{}\n",
        diagnostic.kind.code(),
        target_path(target, &diagnostic.path),
        diagnostic.message
    )
}

/// Joins a target-relative path onto the target as given on the command line.
/// An empty path names the target itself.
fn target_path(target: &str, path: &str) -> String {
    let target = target.trim_end_matches('/');
    if path.is_empty() {
        target.to_string()
    } else {
        format!("{target}/{path}")
    }
}

pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// One-line tally printed after all targets.
pub fn render_summary(report: &RunReport) -> String {
    let counts = &report.verdict.counts;
    let status = match report.verdict.status {
        VerdictStatus::Pass => "pass",
        VerdictStatus::Warn => "warn",
        VerdictStatus::Fail => "fail",
    };
    let mut out = format!(
        "{} target(s): {} error(s), {} warning(s)",
        report.targets.len(),
        counts.error,
        counts.warning
    );
    if counts.suppressed > 0 {
        out.push_str(&format!(", {} suppressed", counts.suppressed));
    }
    if counts.diagnostics > 0 {
        out.push_str(&format!(", {} diagnostic(s)", counts.diagnostics));
    }
    if counts.failed_targets > 0 {
        out.push_str(&format!(", {} failed target(s)", counts.failed_targets));
    }
    out.push_str(&format!(" [{status}]"));
    out
}

#[cfg(test)]
mod tests {
    use booklint_types::{
        DiagnosticKind, Location, REPORT_SCHEMA_V1, Severity, TargetFailure, TargetFailureKind,
        TargetPhase, ToolMeta, Verdict, VerdictCounts,
    };
    use insta::assert_snapshot;

    use super::*;

    fn finding(
        code: &str,
        severity: Severity,
        path: &str,
        location: Location,
        message: &str,
    ) -> Finding {
        Finding {
            code: code.to_string(),
            severity,
            path: path.to_string(),
            location,
            message: message.to_string(),
        }
    }

    fn sample() -> TargetReport {
        TargetReport {
            target: "books/london".to_string(),
            phase: TargetPhase::Reported,
            findings: vec![
                finding(
                    "s-004",
                    Severity::Error,
                    "epub/text/chapter-1.xhtml",
                    Location::Element {
                        line: 14,
                        locator: "/html/body/section/figure/img".to_string(),
                    },
                    "`<img>` element missing `alt` attribute.",
                ),
                finding(
                    "s-004",
                    Severity::Error,
                    "epub/text/chapter-2.xhtml",
                    Location::Element {
                        line: 9,
                        locator: "/html/body/section/img".to_string(),
                    },
                    "`<img>` element missing `alt` attribute.",
                ),
                finding(
                    "s-019",
                    Severity::Warning,
                    "epub/text/chapter-2.xhtml",
                    Location::Element {
                        line: 11,
                        locator: "/html/body/section/p".to_string(),
                    },
                    "`<h#>` element with `id` attribute.",
                ),
            ],
            diagnostics: vec![Diagnostic {
                kind: DiagnosticKind::StaleSuppression,
                path: "booklint-ignore.toml".to_string(),
                subject: Some("s-013".to_string()),
                message: "ignore entry 1 (s-013, chapter-9.xhtml) matched no finding; remove it"
                    .to_string(),
            }],
            failure: None,
            counts: VerdictCounts {
                error: 2,
                warning: 1,
                suppressed: 1,
                diagnostics: 1,
                failed_targets: 0,
            },
            rules_evaluated: 37,
        }
    }

    fn failed() -> TargetReport {
        TargetReport {
            target: "books/broken".to_string(),
            phase: TargetPhase::ParseFailed,
            findings: Vec::new(),
            diagnostics: Vec::new(),
            failure: Some(TargetFailure {
                kind: TargetFailureKind::Parse,
                path: "epub/text/chapter-1.xhtml".to_string(),
                message: "unexpected end of file".to_string(),
            }),
            counts: VerdictCounts {
                failed_targets: 1,
                ..VerdictCounts::default()
            },
            rules_evaluated: 0,
        }
    }

    fn run_report(targets: Vec<TargetReport>) -> RunReport {
        let mut counts = VerdictCounts::default();
        for target in &targets {
            counts.absorb(&target.counts);
        }
        RunReport {
            schema: REPORT_SCHEMA_V1.to_string(),
            tool: ToolMeta {
                name: "booklint".to_string(),
                version: "0.0.0".to_string(),
            },
            targets,
            verdict: Verdict {
                status: VerdictStatus::Fail,
                counts,
            },
        }
    }

    #[test]
    fn table_groups_findings_per_code() {
        assert_snapshot!(render_table(&sample()), @r"
        books/london: 2 error(s), 1 warning(s), 1 suppressed
        s-004 (error, 2)
          epub/text/chapter-1.xhtml  line 14 /html/body/section/figure/img  `<img>` element missing `alt` attribute.
          epub/text/chapter-2.xhtml  line 9 /html/body/section/img  `<img>` element missing `alt` attribute.
        s-019 (warning, 1)
          epub/text/chapter-2.xhtml  line 11 /html/body/section/p  `<h#>` element with `id` attribute.
        diagnostics:
          stale-suppression  booklint-ignore.toml  ignore entry 1 (s-013, chapter-9.xhtml) matched no finding; remove it
        ");
    }

    #[test]
    fn table_for_clean_and_failed_targets() {
        let clean = TargetReport {
            target: "books/clean".to_string(),
            findings: Vec::new(),
            diagnostics: Vec::new(),
            counts: VerdictCounts::default(),
            ..sample()
        };
        assert_eq!(render_table(&clean), "books/clean: no findings\n");
        assert_eq!(
            render_table(&failed()),
            "books/broken: failed (parse) epub/text/chapter-1.xhtml: unexpected end of file\n"
        );
    }

    #[test]
    fn plain_is_tab_separated() {
        let out = render_plain(&sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "s-004\tbooks/london/epub/text/chapter-1.xhtml\t`<img>` element missing `alt` attribute."
        );
        assert_eq!(lines[3], "# diagnostics");
        assert_eq!(
            lines[4],
            "stale-suppression\tbooks/london/booklint-ignore.toml\tignore entry 1 (s-013, chapter-9.xhtml) matched no finding; remove it"
        );
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn plain_failure_is_one_line() {
        assert_eq!(
            render_plain(&failed()),
            "parse-error\tbooks/broken/epub/text/chapter-1.xhtml\tunexpected end of file\n"
        );
    }

    #[test]
    fn target_paths_are_joined_once() {
        assert_eq!(target_path("book/", "epub/a.css"), "book/epub/a.css");
        assert_eq!(target_path("book", ""), "book");
    }

    #[test]
    fn summary_mentions_nonzero_extras() {
        assert_snapshot!(
            render_summary(&run_report(vec![sample(), failed()])),
            @"2 target(s): 2 error(s), 1 warning(s), 1 suppressed, 1 diagnostic(s), 1 failed target(s) [fail]"
        );
    }

    #[test]
    fn json_round_trips_the_report() {
        let report = run_report(vec![sample(), failed()]);
        let json = render_json(&report).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["schema"], REPORT_SCHEMA_V1);
        assert_eq!(value["targets"][1]["phase"], "parse_failed");
        assert_eq!(value["targets"][0]["findings"][0]["location"]["kind"], "element");
        assert_eq!(value["verdict"]["status"], "fail");
        let back: RunReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, report);
    }
}
