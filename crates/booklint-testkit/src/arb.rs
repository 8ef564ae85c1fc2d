//! Proptest strategies for booklint data types.
//!
//! Strategies are constructive: every generated code has the `<letter>-NNN`
//! shape and every generated path is target-relative with `/` separators.

use booklint_types::{Finding, IgnoreEntryConfig, Location, Severity};
use proptest::prelude::*;

/// Maximum number of findings a generated run contains.
pub const MAX_FINDINGS: usize = 24;

/// Rule codes drawn from a small pool so that collisions are common.
pub const CODE_POOL: &[&str] = &["c-002", "s-004", "s-013", "t-001", "x-012", "x-017"];

/// File names drawn from a small pool so that collisions are common.
pub const FILE_POOL: &[&str] = &[
    "epub/text/chapter-1.xhtml",
    "epub/text/chapter-2.xhtml",
    "epub/text/preface.xhtml",
    "epub/css/local.css",
];

pub fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![Just(Severity::Warning), Just(Severity::Error)]
}

pub fn arb_rule_code() -> impl Strategy<Value = String> {
    prop::sample::select(CODE_POOL).prop_map(str::to_string)
}

pub fn arb_path() -> impl Strategy<Value = String> {
    prop::sample::select(FILE_POOL).prop_map(str::to_string)
}

pub fn arb_location() -> impl Strategy<Value = Location> {
    prop_oneof![
        Just(Location::File),
        (1u32..60).prop_map(|line| Location::Line { line }),
        (1u32..60, prop::sample::select(&["p", "img", "section/p[2]"][..])).prop_map(
            |(line, tail)| Location::Element {
                line,
                locator: format!("/html/body/{tail}"),
            }
        ),
    ]
}

pub fn arb_finding() -> impl Strategy<Value = Finding> {
    (
        arb_rule_code(),
        arb_severity(),
        arb_path(),
        arb_location(),
        "[a-z]{1,10}( [a-z]{1,10}){0,3}",
    )
        .prop_map(|(code, severity, path, location, message)| Finding {
            code,
            severity,
            path,
            location,
            message,
        })
}

pub fn arb_findings() -> impl Strategy<Value = Vec<Finding>> {
    prop::collection::vec(arb_finding(), 0..MAX_FINDINGS)
}

/// An ignore entry whose path is either an exact file name, a pattern with
/// a wildcard, or a full target-relative path.
pub fn arb_ignore_entry() -> impl Strategy<Value = IgnoreEntryConfig> {
    let path = prop_oneof![
        Just("chapter-1.xhtml".to_string()),
        Just("chapter-*.xhtml".to_string()),
        Just("*.css".to_string()),
        arb_path(),
    ];
    let contains = prop::option::of(prop::sample::select(&["img", "line", "p[2]"][..]));
    (arb_rule_code(), path, contains).prop_map(|(code, path, contains)| IgnoreEntryConfig {
        code,
        path,
        contains: contains.map(str::to_string),
        reason: Some("Accepted.".to_string()),
    })
}
