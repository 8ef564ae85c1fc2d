//! The four end-to-end scenarios every release must satisfy.

use booklint_testkit::EbookBuilder;
use booklint_testkit::fixtures::{IGNORE_IMG_ALT, MAP_IMAGE, sample_chapters};
use booklint_types::{Location, TargetFailureKind, TargetPhase};

use super::test_book::{Workspace, codes};

fn book_with_img_without_alt() -> EbookBuilder {
    EbookBuilder::new()
        .chapter("chapter-1.xhtml", sample_chapters::IMG_WITHOUT_ALT)
        .file(MAP_IMAGE, "not really a png")
}

/// Scenario A: a target missing its package document.
///
/// Given: a source tree without `epub/content.opf`
/// When: running check on it
/// Then: exactly one structure failure is reported for the target
///   And: no findings are reported for it
///   And: the exit code is non-zero
#[test]
fn given_missing_package_when_check_then_one_structure_failure() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new().without("epub/content.opf"));

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(2);
    let target = &report.targets[0];
    assert_eq!(target.phase, TargetPhase::ParseFailed);
    assert!(target.findings.is_empty());
    let failure = target.failure.as_ref().expect("failure entry");
    assert_eq!(failure.kind, TargetFailureKind::Structure);
    assert_eq!(failure.path, "epub/content.opf");
}

/// Scenario B: an image without `alt` and no ignore manifest.
///
/// Given: a chapter with `<img>` lacking `alt`
/// When: running check
/// Then: exactly one `s-004` finding points at that element
///   And: the exit code is non-zero
#[test]
fn given_img_without_alt_when_check_then_one_finding_at_the_element() {
    let ws = Workspace::new();
    ws.add_book("book", &book_with_img_without_alt());

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(2);
    assert_eq!(codes(&report, 0), vec!["s-004"]);
    let finding = &report.targets[0].findings[0];
    assert_eq!(finding.path, "epub/text/chapter-1.xhtml");
    assert!(
        matches!(
            &finding.location,
            Location::Element { locator, .. } if locator.ends_with("/figure/img")
        ),
        "unexpected location {:?}",
        finding.location
    );
}

/// Scenario C: the same violation accepted in the ignore manifest.
///
/// Given: the book from scenario B
///   And: an ignore entry for `s-004` in `chapter-1.xhtml`
/// When: running check
/// Then: no findings and no stale-suppression diagnostic
///   And: the exit code is zero
#[test]
fn given_matching_ignore_entry_when_check_then_finding_is_suppressed() {
    let ws = Workspace::new();
    ws.add_book("book", &book_with_img_without_alt().ignore_manifest(IGNORE_IMG_ALT));

    let (result, report) = ws.run_check_json(&["book"], &[]);

    result.assert_exit_code(0);
    let target = &report.targets[0];
    assert!(target.findings.is_empty());
    assert!(target.diagnostics.is_empty(), "{:?}", target.diagnostics);
    assert_eq!(target.counts.suppressed, 1);
}

/// Scenario D: the allow override beats the ignore manifest.
///
/// Given: the book and manifest from scenario C
/// When: running check with `--allow s-004`
/// Then: the `s-004` finding is reported again
///   And: the manifest entry still counts as used
#[test]
fn given_allow_override_when_check_then_finding_is_reported() {
    let ws = Workspace::new();
    ws.add_book("book", &book_with_img_without_alt().ignore_manifest(IGNORE_IMG_ALT));

    let (result, report) = ws.run_check_json(&["book"], &["--allow", "s-004"]);

    result.assert_exit_code(2);
    assert_eq!(codes(&report, 0), vec!["s-004"]);
    assert!(report.targets[0].diagnostics.is_empty());
    assert_eq!(report.targets[0].counts.suppressed, 0);
}
