//! Table, plain and JSON output.

use booklint_testkit::EbookBuilder;
use booklint_testkit::fixtures::{IGNORE_STALE, sample_chapters};
use booklint_types::REPORT_SCHEMA_V1;

use super::test_book::Workspace;

fn pre_book() -> EbookBuilder {
    EbookBuilder::new()
        .chapter("chapter-2.xhtml", sample_chapters::PRE)
        .ignore_manifest(IGNORE_STALE)
}

/// Given: a book with one finding and a stale ignore entry
/// When: running check in plain mode
/// Then: stdout holds one tab-separated finding line and a diagnostics section
#[test]
fn given_plain_mode_when_check_then_tab_separated_lines() {
    let ws = Workspace::new();
    ws.add_book("book", &pre_book());

    let result = ws.run_check(&["book"], &["--plain"]);
    result.assert_exit_code(2);

    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(lines.len(), 3, "{}", result.stdout);
    assert_eq!(
        lines[0],
        "s-013\tbook/epub/text/chapter-2.xhtml\tIllegal `<pre>` element."
    );
    assert_eq!(lines[1], "# diagnostics");
    assert!(lines[2].starts_with("stale-suppression\tbook/booklint-ignore.toml\t"));
}

/// Given: the same book
/// When: running check in table mode
/// Then: findings are grouped under their code and a summary line follows
#[test]
fn given_table_mode_when_check_then_grouped_with_summary() {
    let ws = Workspace::new();
    ws.add_book("book", &pre_book());

    ws.run_check(&["book"], &[])
        .assert_exit_code(2)
        .assert_stdout_contains("book: 1 error(s), 0 warning(s)\n")
        .assert_stdout_contains("s-013 (error, 1)\n")
        .assert_stdout_contains("diagnostics:\n  stale-suppression  booklint-ignore.toml")
        .assert_stdout_contains("1 target(s): 1 error(s), 0 warning(s), 1 diagnostic(s) [fail]");
}

/// Given: the same book
/// When: running check in JSON mode
/// Then: stdout is exactly one run report
#[test]
fn given_json_mode_when_check_then_single_report() {
    let ws = Workspace::new();
    ws.add_book("book", &pre_book());

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(2).assert_stdout_not_contains("target(s):");
    assert_eq!(report.schema, REPORT_SCHEMA_V1);
    assert_eq!(report.tool.name, "booklint");
    assert_eq!(report.targets.len(), 1);
    assert_eq!(report.verdict.counts.error, 1);
    assert_eq!(report.verdict.counts.diagnostics, 1);
}

/// Given: `--plain` and `--json` together
/// Then: clap rejects the invocation
#[test]
fn given_plain_and_json_when_check_then_usage_error() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new());

    ws.run_check(&["book"], &["--plain", "--json"])
        .assert_exit_code(1)
        .assert_stderr_contains("cannot be used with");
}

/// Given: a clean book checked with `--verbose`
/// Then: info-level progress is logged to stderr, not stdout
#[test]
fn given_verbose_when_check_then_progress_on_stderr() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new());

    ws.run_check(&["book"], &["--verbose"])
        .assert_exit_code(0)
        .assert_stderr_contains("target checked")
        .assert_stdout_contains("book: no findings\n")
        .assert_stdout_not_contains("target checked");
}
