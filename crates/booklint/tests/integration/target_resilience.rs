//! One broken target never hides the others.

use booklint_testkit::EbookBuilder;
use booklint_testkit::fixtures::sample_chapters;
use booklint_types::{TargetFailureKind, TargetPhase, VerdictStatus};

use super::test_book::{Workspace, codes};

/// Given: three targets, the middle one with malformed XHTML
/// When: checking all three
/// Then: every target is reported in command-line order
///   And: only the middle one failed
///   And: the last target's findings are still reported
#[test]
fn given_broken_middle_target_when_check_then_others_still_reported() {
    let ws = Workspace::new();
    ws.add_book("alpha", &EbookBuilder::new());
    ws.add_book("beta", &EbookBuilder::new());
    ws.write_file(
        "beta",
        "epub/text/chapter-1.xhtml",
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<html><body><p>unclosed</body></html>\n",
    );
    ws.add_book(
        "gamma",
        &EbookBuilder::new().chapter("chapter-4.xhtml", sample_chapters::INLINE_STYLE),
    );

    let (result, report) = ws.run_check_json(&["alpha", "beta", "gamma"], &[]);

    result.assert_exit_code(2);
    let names: Vec<&str> = report.targets.iter().map(|t| t.target.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    assert_eq!(report.targets[0].phase, TargetPhase::Reported);
    assert!(report.targets[0].findings.is_empty());

    assert_eq!(report.targets[1].phase, TargetPhase::ParseFailed);
    let failure = report.targets[1].failure.as_ref().expect("failure entry");
    assert_eq!(failure.kind, TargetFailureKind::Parse);
    assert_eq!(failure.path, "epub/text/chapter-1.xhtml");

    assert_eq!(report.targets[2].phase, TargetPhase::Reported);
    assert!(codes(&report, 2).contains(&"x-012"));

    assert_eq!(report.verdict.status, VerdictStatus::Fail);
    assert_eq!(report.verdict.counts.failed_targets, 1);
}

/// Given: a path that does not exist next to a clean book
/// When: checking both
/// Then: the missing path is a structure failure and the clean book passes
#[test]
fn given_missing_directory_when_check_then_structure_failure_and_exit_2() {
    let ws = Workspace::new();
    ws.add_book("clean", &EbookBuilder::new());

    let (result, report) = ws.run_check_json(&["nowhere", "clean"], &[]);

    result.assert_exit_code(2);
    let failure = report.targets[0].failure.as_ref().expect("failure entry");
    assert_eq!(failure.kind, TargetFailureKind::Structure);
    assert!(failure.path.is_empty());
    assert!(report.targets[1].findings.is_empty());
    assert!(report.targets[1].failure.is_none());
}

/// Given: a failing target logged at the default level
/// Then: the failure is logged to stderr as it happens
#[test]
fn given_failed_target_when_check_then_error_is_logged() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new().without("mimetype"));

    ws.run_check(&["book"], &[])
        .assert_exit_code(2)
        .assert_stderr_contains("target failed to load")
        .assert_stdout_contains("book: failed (structure) mimetype: missing mandatory file");
}

/// Given: a book in the `src/` layout
/// Then: it is checked like any other book
#[test]
fn given_src_layout_when_check_then_paths_keep_the_prefix() {
    let ws = Workspace::new();
    ws.add_book(
        "book",
        &EbookBuilder::new()
            .src_layout()
            .chapter("chapter-2.xhtml", sample_chapters::PRE),
    );

    let (result, report) = ws.run_check_json(&["book"], &["--sequential"]);

    result.assert_exit_code(2);
    assert_eq!(codes(&report, 0), vec!["s-013"]);
    assert_eq!(report.targets[0].findings[0].path, "src/epub/text/chapter-2.xhtml");
}
