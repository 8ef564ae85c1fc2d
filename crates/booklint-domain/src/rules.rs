use std::collections::BTreeMap;

use booklint_model::{NodeId, SourceTree, XmlDocument};
use booklint_types::{Category, Location, RESERVED_CODES, Severity};

/// Placeholder in a message template replaced by a violation's detail.
pub const DETAIL_PLACEHOLDER: &str = "{detail}";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("rule code '{code}' is registered more than once")]
    DuplicateCode { code: String },

    #[error("rule code '{code}' is not of the form '{letter}-NNN' required by category {category}")]
    InvalidCode {
        code: String,
        category: &'static str,
        letter: char,
    },

    #[error("rule code '{code}' is reserved for diagnostics")]
    ReservedCode { code: String },
}

/// A predicate failed on a tree it should have handled.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One raw match of a predicate, before it becomes a [`booklint_types::Finding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub location: Location,
    /// Substituted for `{detail}` in the rule's message template.
    pub detail: Option<String>,
}

impl Violation {
    pub fn file(path: &str) -> Self {
        Self {
            path: path.to_string(),
            location: Location::File,
            detail: None,
        }
    }

    pub fn line(path: &str, line: u32) -> Self {
        Self {
            path: path.to_string(),
            location: Location::Line { line },
            detail: None,
        }
    }

    pub fn element(path: &str, dom: &XmlDocument, node: NodeId) -> Self {
        Self {
            path: path.to_string(),
            location: dom.location(node),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Uniform predicate signature: a pure function of a fully built tree.
pub type Predicate = fn(&SourceTree) -> Result<Vec<Violation>, RuleError>;

#[derive(Debug, Clone, Copy)]
pub struct RuleDefinition {
    pub code: &'static str,
    pub category: Category,
    pub severity: Severity,
    /// Message template; may contain `{detail}`.
    pub message: &'static str,
    pub predicate: Predicate,
}

/// Renders a rule's message for one violation.
///
/// Templates without a placeholder get the detail appended in parentheses.
pub fn render_message(template: &str, detail: Option<&str>) -> String {
    if template.contains(DETAIL_PLACEHOLDER) {
        return template.replace(DETAIL_PLACEHOLDER, detail.unwrap_or(""));
    }
    match detail {
        Some(detail) if !detail.is_empty() => format!("{template} ({detail})"),
        _ => template.to_string(),
    }
}

/// Immutable registry of rule definitions keyed by code.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    rules: Vec<RuleDefinition>,
}

impl RuleCatalog {
    /// Registers `definitions`, rejecting duplicate, malformed and reserved codes.
    ///
    /// Rules are kept in code order.
    pub fn new(
        definitions: impl IntoIterator<Item = RuleDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut by_code: BTreeMap<&'static str, RuleDefinition> = BTreeMap::new();
        for definition in definitions {
            validate_code(&definition)?;
            if by_code.insert(definition.code, definition).is_some() {
                return Err(CatalogError::DuplicateCode {
                    code: definition.code.to_string(),
                });
            }
        }
        Ok(Self {
            rules: by_code.into_values().collect(),
        })
    }

    /// The built-in catalog shipped with booklint.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(crate::catalog::builtin_rules())
    }

    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    pub fn get(&self, code: &str) -> Option<&RuleDefinition> {
        self.rules
            .binary_search_by(|rule| rule.code.cmp(code))
            .ok()
            .map(|index| &self.rules[index])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Codes close to `code`, best match first, for "did you mean" hints.
    pub fn similar_codes(&self, code: &str) -> Vec<&'static str> {
        let needle = code.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        if let Some(rule) = self.get(&needle) {
            return vec![rule.code];
        }
        let mut candidates: Vec<(&'static str, usize)> = Vec::new();
        for rule in &self.rules {
            if rule.code.starts_with(&needle) {
                candidates.push((rule.code, 0));
                continue;
            }
            let distance = edit_distance(&needle, rule.code);
            if distance <= 2 {
                candidates.push((rule.code, distance));
            }
        }
        candidates.sort_by_key(|(code, score)| (*score, *code));
        candidates.truncate(5);
        candidates.into_iter().map(|(code, _)| code).collect()
    }
}

fn validate_code(definition: &RuleDefinition) -> Result<(), CatalogError> {
    let code = definition.code;
    if RESERVED_CODES.contains(&code) {
        return Err(CatalogError::ReservedCode {
            code: code.to_string(),
        });
    }

    let letter = definition.category.letter();
    let well_formed = code.len() == 5
        && code.starts_with(letter)
        && code.as_bytes()[1] == b'-'
        && code.as_bytes()[2..].iter().all(u8::is_ascii_digit);
    if well_formed {
        Ok(())
    } else {
        Err(CatalogError::InvalidCode {
            code: code.to_string(),
            category: definition.category.as_str(),
            letter,
        })
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &SourceTree) -> Result<Vec<Violation>, RuleError> {
        Ok(Vec::new())
    }

    fn def(code: &'static str, category: Category) -> RuleDefinition {
        RuleDefinition {
            code,
            category,
            severity: Severity::Error,
            message: "Something is wrong.",
            predicate: noop,
        }
    }

    #[test]
    fn catalog_sorts_by_code() {
        let catalog = RuleCatalog::new([
            def("s-010", Category::Semantics),
            def("c-002", Category::Css),
            def("s-004", Category::Semantics),
        ])
        .expect("catalog");
        let codes: Vec<&str> = catalog.rules().iter().map(|r| r.code).collect();
        assert_eq!(codes, vec!["c-002", "s-004", "s-010"]);
        assert!(catalog.contains("s-004"));
        assert!(catalog.get("x-999").is_none());
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let err = RuleCatalog::new([
            def("s-004", Category::Semantics),
            def("s-004", Category::Semantics),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateCode {
                code: "s-004".to_string()
            }
        );
    }

    #[test]
    fn code_letter_must_match_category() {
        let err = RuleCatalog::new([def("s-004", Category::Css)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCode { letter: 'c', .. }));

        let err = RuleCatalog::new([def("s-04", Category::Semantics)]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCode { .. }));
    }

    #[test]
    fn reserved_codes_are_rejected() {
        let err = RuleCatalog::new([def("stale-suppression", Category::Semantics)]).unwrap_err();
        assert!(matches!(err, CatalogError::ReservedCode { .. }));
    }

    #[test]
    fn render_substitutes_or_appends_detail() {
        assert_eq!(
            render_message("Unused selector: {detail}.", Some("p.x")),
            "Unused selector: p.x."
        );
        assert_eq!(render_message("Bad id.", Some("a-01")), "Bad id. (a-01)");
        assert_eq!(render_message("Bad id.", None), "Bad id.");
        assert_eq!(render_message("Missing: {detail}", None), "Missing: ");
    }

    #[test]
    fn similar_codes_prefers_close_matches() {
        let catalog = RuleCatalog::new([
            def("s-004", Category::Semantics),
            def("s-005", Category::Semantics),
            def("x-017", Category::Xhtml),
        ])
        .expect("catalog");
        assert_eq!(catalog.similar_codes("s-00"), vec!["s-004", "s-005"]);
        assert_eq!(catalog.similar_codes("S-004"), vec!["s-004"]);
        assert_eq!(catalog.similar_codes(" s-005 "), vec!["s-005"]);
        assert_eq!(catalog.similar_codes("s-006"), vec!["s-004", "s-005"]);
        assert!(catalog.similar_codes("zzzzzz").is_empty());
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("s-004", "s-004"), 0);
        assert_eq!(edit_distance("s-004", "s-005"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = RuleCatalog::builtin().expect("builtin catalog");
        assert!(catalog.len() >= 30);
        for rule in catalog.rules() {
            let letter = rule.code.chars().next().unwrap_or(' ');
            assert_eq!(Category::from_letter(letter), Some(rule.category));
        }
    }
}
