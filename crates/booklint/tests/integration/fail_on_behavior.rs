//! Exit codes under the different `--fail-on` thresholds.

use booklint_testkit::EbookBuilder;
use booklint_testkit::fixtures::sample_chapters;

use super::test_book::Workspace;

const NESTED_BLOCKQUOTE: &str = r#"<section id="chapter-1" epub:type="chapter">
			<h2 epub:type="ordinal z3998:roman">I</h2>
			<blockquote>
				<blockquote>
					<p>Quoted twice.</p>
				</blockquote>
			</blockquote>
		</section>"#;

fn warning_only_book() -> EbookBuilder {
    EbookBuilder::new().chapter("chapter-1.xhtml", NESTED_BLOCKQUOTE)
}

/// Given: a book whose only finding is a warning
/// When: running check with the default threshold
/// Then: the exit code is 0 and the warning is still printed
#[test]
fn given_only_warnings_when_default_fail_on_then_exit_0() {
    let ws = Workspace::new();
    ws.add_book("book", &warning_only_book());

    ws.run_check(&["book"], &[])
        .assert_exit_code(0)
        .assert_stdout_contains("s-005 (warning, 1)");
}

/// Given: a book whose only finding is a warning
/// When: running check with `--fail-on warning`
/// Then: the exit code is 3
#[test]
fn given_only_warnings_when_fail_on_warning_then_exit_3() {
    let ws = Workspace::new();
    ws.add_book("book", &warning_only_book());

    ws.run_check(&["book"], &["--fail-on", "warning"])
        .assert_exit_code(3);
}

/// Given: a book with an error finding
/// When: running check with `--fail-on never`
/// Then: the exit code is 0
#[test]
fn given_errors_when_fail_on_never_then_exit_0() {
    let ws = Workspace::new();
    ws.add_book(
        "book",
        &EbookBuilder::new().chapter("chapter-2.xhtml", sample_chapters::PRE),
    );

    ws.run_check(&["book"], &["--fail-on", "never"])
        .assert_exit_code(0)
        .assert_stdout_contains("s-013");
}

/// Given: an error book checked with `--fail-on warning`
/// Then: errors still win with exit code 2
#[test]
fn given_errors_when_fail_on_warning_then_exit_2() {
    let ws = Workspace::new();
    ws.add_book(
        "book",
        &EbookBuilder::new().chapter("chapter-2.xhtml", sample_chapters::PRE),
    );

    ws.run_check(&["book"], &["--fail-on", "warning"])
        .assert_exit_code(2);
}

/// Given: a clean book and an unknown `--allow` code
/// When: running check
/// Then: the run is a usage error with exit code 1 and a suggestion
#[test]
fn given_unknown_allow_code_when_check_then_exit_1() {
    let ws = Workspace::new();
    ws.add_book("book", &EbookBuilder::new());

    ws.run_check(&["book"], &["--allow", "x-12"])
        .assert_exit_code(1)
        .assert_stderr_contains("Rule 'x-12' not found.")
        .assert_stderr_contains("x-012");
}
