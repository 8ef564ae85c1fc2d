use std::sync::LazyLock;

use booklint_model::SourceTree;
use booklint_types::{Category, Severity};
use regex::Regex;

use super::{body_elements_where, elements_where, markup_sources, regex, source_matches};
use crate::rules::{RuleDefinition, RuleError, Violation};

static UPPERCASE_UTF8: LazyLock<Regex> = LazyLock::new(|| regex("UTF-8"));
static ZERO_PADDED_ID: LazyLock<Regex> = LazyLock::new(|| regex(r"-0[0-9]"));

/// Elements whose ids may repeat across files; each file restates its section.
const SECTIONING: &[&str] = &["section", "article"];

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "x-001",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "String `UTF-8` must always be lowercase.",
            predicate: uppercase_utf8,
        },
        RuleDefinition {
            code: "x-007",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "`id` attributes starting with a number are illegal XHTML.",
            predicate: id_starts_with_digit,
        },
        RuleDefinition {
            code: "x-009",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "Illegal leading 0 in `id` attribute.",
            predicate: zero_padded_id,
        },
        RuleDefinition {
            code: "x-012",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "Illegal `style` attribute. Don’t use inline styles, any element can be targeted with a clever enough selector.",
            predicate: inline_style,
        },
        RuleDefinition {
            code: "x-013",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "CSS class found in XHTML, but not in CSS: `{detail}`.",
            predicate: classes_missing_from_css,
        },
        RuleDefinition {
            code: "x-015",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "Illegal element in `<head>`. Only `<title>` and `<link rel=\"stylesheet\">` are allowed.",
            predicate: illegal_head_elements,
        },
        RuleDefinition {
            code: "x-016",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "`xml:lang` attribute value starts with an uppercase letter: `{detail}`.",
            predicate: uppercase_language,
        },
        RuleDefinition {
            code: "x-017",
            category: Category::Xhtml,
            severity: Severity::Error,
            message: "Duplicate value for `id` attribute: `{detail}`.",
            predicate: duplicate_ids,
        },
    ]
}

fn uppercase_utf8(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let stylesheets = tree
        .stylesheets()
        .iter()
        .map(|(path, css)| (path.as_str(), css.source()));
    Ok(markup_sources(tree)
        .chain(stylesheets)
        .flat_map(|(path, source)| {
            source_matches(path, source, &UPPERCASE_UTF8)
                .into_iter()
                .map(|violation| Violation {
                    detail: None,
                    ..violation
                })
        })
        .collect())
}

fn id_starts_with_digit(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(elements_where(tree, |doc, node| {
        doc.dom()
            .attr(node, "id")
            .is_some_and(|id| id.starts_with(|c: char| c.is_ascii_digit()))
    }))
}

fn zero_padded_id(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(elements_where(tree, |doc, node| {
        doc.dom()
            .attr(node, "id")
            .is_some_and(|id| ZERO_PADDED_ID.is_match(id))
    }))
}

fn inline_style(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        doc.dom().has_attr(node, "style")
    }))
}

/// Whether `.class` occurs in `selector` as a whole class name.
fn selector_mentions_class(selector: &str, class: &str) -> bool {
    let needle = format!(".{class}");
    selector.match_indices(&needle).any(|(start, _)| {
        selector[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '-' || c == '_'))
    })
}

fn classes_missing_from_css(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    if tree.stylesheets().is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for class in tree.class_usage().keys() {
        let declared = tree
            .stylesheets()
            .values()
            .flat_map(|css| css.style_rules())
            .any(|rule| selector_mentions_class(&rule.selector_text, class));
        if declared {
            continue;
        }

        let first_use = tree.documents().iter().find_map(|(path, doc)| {
            let dom = doc.dom();
            dom.elements()
                .find(|node| dom.attr_tokens(*node, "class").any(|token| token == class.as_str()))
                .map(|node| Violation::element(path, dom, node))
        });
        let violation = first_use.ok_or_else(|| {
            RuleError::new(format!("class `{class}` is indexed but no element carries it"))
        })?;
        out.push(violation.with_detail(format!(".{class}")));
    }
    Ok(out)
}

fn illegal_head_elements(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        let Some(head) = doc.head() else {
            continue;
        };
        let dom = doc.dom();
        for child in dom.element_children(head) {
            let allowed = match dom.local_name(child) {
                "title" => true,
                "link" => dom.attr_tokens(child, "rel").any(|rel| rel == "stylesheet"),
                _ => false,
            };
            if !allowed {
                out.push(Violation::element(path, dom, child));
            }
        }
    }
    Ok(out)
}

fn uppercase_language(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        let dom = doc.dom();
        for node in dom.elements() {
            let Some(lang) = dom.attr(node, "xml:lang") else {
                continue;
            };
            if lang.starts_with(|c: char| c.is_uppercase()) {
                out.push(Violation::element(path, dom, node).with_detail(lang));
            }
        }
    }
    Ok(out)
}

fn duplicate_ids(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (id, occurrences) in tree.ids() {
        let mut located = Vec::with_capacity(occurrences.len());
        for occurrence in occurrences {
            let doc = tree.document(occurrence.path).ok_or_else(|| {
                RuleError::new(format!("id index points at unknown document `{}`", occurrence.path))
            })?;
            if !SECTIONING.contains(&doc.dom().local_name(occurrence.node)) {
                located.push((occurrence.path, doc.dom(), occurrence.node));
            }
        }
        for (path, dom, node) in located.into_iter().skip(1) {
            out.push(Violation::element(path, dom, node).with_detail(id));
        }
    }
    Ok(out)
}
