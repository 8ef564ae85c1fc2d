//! Ignore-manifest handling and the command-line overrides.

use booklint_testkit::EbookBuilder;
use booklint_testkit::fixtures::{IGNORE_IMG_ALT, IGNORE_STALE, MAP_IMAGE, sample_chapters};
use booklint_types::DiagnosticKind;

use super::test_book::{Workspace, codes};

fn img_book() -> EbookBuilder {
    EbookBuilder::new()
        .chapter("chapter-1.xhtml", sample_chapters::IMG_WITHOUT_ALT)
        .file(MAP_IMAGE, "not really a png")
}

/// Given: a manifest entry that matches nothing
/// When: running check on an otherwise clean book
/// Then: a stale-suppression diagnostic is reported
///   And: the exit code stays 0
#[test]
fn given_stale_entry_when_check_then_diagnostic_without_failing() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new().ignore_manifest(IGNORE_STALE));

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(0);
    let diagnostics = &report.targets[0].diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::StaleSuppression);
    assert_eq!(diagnostics[0].subject.as_deref(), Some("s-013"));
}

/// Given: a manifest that suppresses a finding
/// When: running check with `--skip-ignore`
/// Then: the finding comes back and no diagnostics are reported
#[test]
fn given_skip_ignore_when_check_then_manifest_is_not_read() {
    let ws = Workspace::new();
    ws.add_book(
        "book",
        &img_book().ignore_manifest(&format!("{IGNORE_IMG_ALT}\n{IGNORE_STALE}")),
    );

    let (result, report) = ws.run_check_json(&["book"], &["-s"]);

    result.assert_exit_code(2);
    assert_eq!(codes(&report, 0), vec!["s-004"]);
    assert!(report.targets[0].diagnostics.is_empty());
}

/// Given: a manifest that is not valid TOML
/// When: running check
/// Then: one suppression-config-error diagnostic is reported
///   And: the book is evaluated as if there were no manifest
#[test]
fn given_malformed_manifest_when_check_then_one_config_diagnostic() {
    let ws = Workspace::new();
    ws.add_book("book", &img_book().ignore_manifest("[[ignore]\ncode = \"s-004\""));

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(2);
    assert_eq!(codes(&report, 0), vec!["s-004"]);
    let diagnostics = &report.targets[0].diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::SuppressionConfigError);
}

/// Given: an entry naming a code that does not exist
/// When: running check
/// Then: a config diagnostic suggests the closest code
#[test]
fn given_unknown_code_in_manifest_when_check_then_suggestion() {
    let ws = Workspace::new();
    ws.add_book(
        "book",
        &EbookBuilder::new().ignore_manifest(
            "[[ignore]]\ncode = \"s-04\"\npath = \"chapter-1.xhtml\"\nreason = \"Typo.\"\n",
        ),
    );

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(0);
    let diagnostics = &report.targets[0].diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::SuppressionConfigError);
    assert!(diagnostics[0].message.contains("s-004"), "{}", diagnostics[0].message);
}

/// Given: the manifest stored under a custom file name
/// When: running check with `--ignore-file`
/// Then: the custom manifest is used
#[test]
fn given_custom_ignore_file_when_check_then_it_is_used() {
    let ws = Workspace::new();
    ws.add_book("book", &img_book());
    ws.write_file("book", "accepted.toml", IGNORE_IMG_ALT);

    let (result, report) = ws.run_check_json(&["book"], &["--ignore-file", "accepted.toml"]);

    result.assert_exit_code(0);
    assert!(report.targets[0].findings.is_empty());
    assert_eq!(report.targets[0].counts.suppressed, 1);
}

/// Given: two books sharing an allow list
/// When: running check with a comma-separated `--allow`
/// Then: every listed code is reported in every book
#[test]
fn given_comma_separated_allow_when_check_then_applies_to_all_targets() {
    let ws = Workspace::new();
    let manifest = format!(
        "{IGNORE_IMG_ALT}\n[[ignore]]\ncode = \"s-013\"\npath = \"chapter-2.xhtml\"\nreason = \"Verbatim poem.\"\n"
    );
    ws.add_book(
        "one",
        &img_book()
            .chapter("chapter-2.xhtml", sample_chapters::PRE)
            .ignore_manifest(&manifest),
    );
    ws.add_book(
        "two",
        &img_book()
            .chapter("chapter-2.xhtml", sample_chapters::PRE)
            .ignore_manifest(&manifest),
    );

    let (_, report) = ws.run_check_json(&["one", "two"], &["-a", "s-004,s-013"]);

    assert_eq!(codes(&report, 0), vec!["s-004", "s-013"]);
    assert_eq!(codes(&report, 1), vec!["s-004", "s-013"]);
}
