use std::sync::LazyLock;

use booklint_model::SourceTree;
use booklint_types::{Category, Severity};
use regex::Regex;

use super::{body_text_matches, regex};
use crate::rules::{RuleDefinition, RuleError, Violation};

static MULTIPLE_SPACES: LazyLock<Regex> =
    LazyLock::new(|| regex(r"\S[ \u{a0}\u{200a}]{2,}\S"));
static REPEATED_EM_DASH: LazyLock<Regex> = LazyLock::new(|| regex(r"—{2,}"));
static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?:^|[^…\s])[ \u{a0}]+[!?;:,]"));

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "t-001",
            category: Category::Typography,
            severity: Severity::Error,
            message: "Double spacing found. Sentences should be single-spaced: `{detail}`.",
            predicate: multiple_spaces,
        },
        RuleDefinition {
            code: "t-014",
            category: Category::Typography,
            severity: Severity::Error,
            message: "Two or more em-dashes in a row found. Elided words should use the two- or three-em-dash Unicode character: `{detail}`.",
            predicate: repeated_em_dashes,
        },
        RuleDefinition {
            code: "t-041",
            category: Category::Typography,
            severity: Severity::Error,
            message: "Illegal space before punctuation: `{detail}`.",
            predicate: space_before_punctuation,
        },
    ]
}

fn multiple_spaces(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_text_matches(tree, &MULTIPLE_SPACES))
}

fn repeated_em_dashes(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_text_matches(tree, &REPEATED_EM_DASH))
}

fn space_before_punctuation(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_text_matches(tree, &SPACE_BEFORE_PUNCTUATION))
}
