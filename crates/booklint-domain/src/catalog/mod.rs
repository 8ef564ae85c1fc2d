//! Built-in rule definitions, one module per category.
//!
//! Every predicate follows the same shape: select candidate nodes, test side
//! conditions, emit one [`Violation`] per offending candidate. Predicates
//! return an empty list when the structure they inspect is absent.

mod css;
mod filesystem;
mod metadata;
mod semantics;
mod typography;
mod xhtml;

use booklint_model::{NodeId, ParsedXhtmlDocument, SourceTree};
use regex::Regex;

use crate::rules::{RuleDefinition, Violation};

/// All built-in rules, unsorted.
pub fn builtin_rules() -> Vec<RuleDefinition> {
    let mut rules = Vec::new();
    rules.extend(css::rules());
    rules.extend(filesystem::rules());
    rules.extend(metadata::rules());
    rules.extend(semantics::rules());
    rules.extend(typography::rules());
    rules.extend(xhtml::rules());
    rules
}

/// 1-based line of a byte offset.
fn line_at(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    let newlines = source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count();
    u32::try_from(newlines).unwrap_or(u32::MAX).saturating_add(1)
}

/// One violation per regex match in `source`, at the match's line.
fn source_matches(path: &str, source: &str, pattern: &Regex) -> Vec<Violation> {
    pattern
        .find_iter(source)
        .map(|m| Violation::line(path, line_at(source, m.start())).with_detail(m.as_str().trim()))
        .collect()
}

/// The package document and every content document, as `(path, source)`.
fn markup_sources(tree: &SourceTree) -> impl Iterator<Item = (&str, &str)> {
    let package = tree.package();
    std::iter::once((package.path(), package.source())).chain(
        tree.documents()
            .iter()
            .map(|(path, doc)| (path.as_str(), doc.source())),
    )
}

/// Body elements of every document satisfying `test`.
fn body_elements_where(
    tree: &SourceTree,
    test: impl Fn(&ParsedXhtmlDocument, NodeId) -> bool,
) -> Vec<Violation> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        for node in doc.body_elements() {
            if test(doc, node) {
                out.push(Violation::element(path, doc.dom(), node));
            }
        }
    }
    out
}

/// Elements anywhere in every document satisfying `test`.
fn elements_where(
    tree: &SourceTree,
    test: impl Fn(&ParsedXhtmlDocument, NodeId) -> bool,
) -> Vec<Violation> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        for node in doc.dom().elements() {
            if test(doc, node) {
                out.push(Violation::element(path, doc.dom(), node));
            }
        }
    }
    out
}

/// Text nodes below `<body>` with their parent element.
fn body_text_nodes(doc: &ParsedXhtmlDocument) -> Vec<(NodeId, &str)> {
    let Some(body) = doc.body() else {
        return Vec::new();
    };
    let dom = doc.dom();
    dom.descendants(body)
        .into_iter()
        .filter_map(|node| {
            let text = dom.text_node(node)?;
            let parent = dom.parent(node)?;
            Some((parent, text))
        })
        .collect()
}

/// Violations for text nodes in any body matching `pattern`, at the parent element.
fn body_text_matches(tree: &SourceTree, pattern: &Regex) -> Vec<Violation> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        for (parent, text) in body_text_nodes(doc) {
            for m in pattern.find_iter(text) {
                out.push(
                    Violation::element(path, doc.dom(), parent).with_detail(m.as_str().trim()),
                );
            }
        }
    }
    out
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in regex should compile")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_at_counts_newlines_before_offset() {
        let source = "a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 4), 3);
        assert_eq!(line_at(source, 400), 3);
    }

    #[test]
    fn every_category_contributes_rules() {
        let rules = builtin_rules();
        for category in booklint_types::Category::ALL {
            assert!(
                rules.iter().any(|rule| rule.category == category),
                "no rules for {category:?}"
            );
        }
    }
}
