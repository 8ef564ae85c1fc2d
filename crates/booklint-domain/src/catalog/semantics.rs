use booklint_model::{NodeId, ParsedXhtmlDocument, SourceTree};
use booklint_types::{Category, Severity};

use super::{body_elements_where, elements_where};
use crate::rules::{RuleDefinition, RuleError, Violation};

/// Elements that may legitimately be empty.
const MAY_BE_EMPTY: &[&str] = &[
    "br", "hr", "img", "td", "th", "link", "col", "wbr", "source", "track", "area", "embed",
    "input", "none", "mspace", "mprescripts",
];

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "s-004",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<img>` element missing `alt` attribute.",
            predicate: img_without_alt,
        },
        RuleDefinition {
            code: "s-005",
            category: Category::Semantics,
            severity: Severity::Warning,
            message: "Nested `<blockquote>` element.",
            predicate: nested_blockquote,
        },
        RuleDefinition {
            code: "s-009",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<hgroup>` element with only one child.",
            predicate: single_child_hgroup,
        },
        RuleDefinition {
            code: "s-010",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "Empty element. Use `<hr/>` for thematic breaks if appropriate.",
            predicate: empty_elements,
        },
        RuleDefinition {
            code: "s-012",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "Illegal `<hr/>` as last child.",
            predicate: trailing_hr,
        },
        RuleDefinition {
            code: "s-013",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "Illegal `<pre>` element.",
            predicate: pre_elements,
        },
        RuleDefinition {
            code: "s-015",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "Element has `subtitle` semantic, but without a sibling having a `title` semantic.",
            predicate: orphan_subtitle,
        },
        RuleDefinition {
            code: "s-018",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<img>` element with `id` attribute. `id` attributes go on parent `<figure>` elements.",
            predicate: img_with_id,
        },
        RuleDefinition {
            code: "s-019",
            category: Category::Semantics,
            severity: Severity::Warning,
            message: "`<h#>` element with `id` attribute. `<h#>` elements should be wrapped in `<section>` elements, which should hold the `id` attribute.",
            predicate: heading_with_id,
        },
        RuleDefinition {
            code: "s-033",
            category: Category::Semantics,
            severity: Severity::Warning,
            message: "File language is not the same as the package language ({detail}).",
            predicate: language_mismatch,
        },
        RuleDefinition {
            code: "s-042",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<table>` element without `<tbody>` child.",
            predicate: table_without_tbody,
        },
        RuleDefinition {
            code: "s-055",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<th>` element not in `<thead>` ancestor. Note: `<th>` elements used as mid-table headings or horizontal row headings require the `scope` attribute.",
            predicate: stray_th,
        },
        RuleDefinition {
            code: "s-069",
            category: Category::Semantics,
            severity: Severity::Error,
            message: "`<body>` element missing direct child `<section>` or `<article>` element.",
            predicate: body_without_section,
        },
    ]
}

fn named(doc: &ParsedXhtmlDocument, node: NodeId, local: &str) -> bool {
    doc.dom().local_name(node) == local
}

fn img_without_alt(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(elements_where(tree, |doc, node| {
        named(doc, node, "img") && !doc.dom().has_attr(node, "alt")
    }))
}

fn nested_blockquote(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        named(doc, node, "blockquote")
            && doc
                .dom()
                .ancestors(node)
                .any(|ancestor| named(doc, ancestor, "blockquote"))
    }))
}

fn single_child_hgroup(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        named(doc, node, "hgroup") && doc.dom().element_children(node).count() == 1
    }))
}

fn is_empty_element(doc: &ParsedXhtmlDocument, node: NodeId) -> bool {
    let dom = doc.dom();
    if MAY_BE_EMPTY.contains(&dom.local_name(node)) {
        return false;
    }
    dom.children(node)
        .iter()
        .all(|child| dom.text_node(*child).is_some_and(|text| text.trim().is_empty()))
}

fn empty_elements(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, is_empty_element))
}

fn trailing_hr(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        named(doc, node, "hr") && doc.dom().next_element_sibling(node).is_none()
    }))
}

fn pre_elements(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| named(doc, node, "pre")))
}

fn orphan_subtitle(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        if !doc.has_semantic(node, "subtitle") {
            return false;
        }
        let Some(parent) = doc.dom().parent(node) else {
            return false;
        };
        !doc
            .dom()
            .element_children(parent)
            .any(|sibling| sibling != node && doc.has_semantic(sibling, "title"))
    }))
}

fn img_with_id(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        named(doc, node, "img") && doc.dom().has_attr(node, "id")
    }))
}

fn heading_with_id(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        matches!(doc.dom().local_name(node), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
            && doc.dom().has_attr(node, "id")
    }))
}

fn language_mismatch(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let Some(package_language) = tree.package().language() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        let Some(language) = doc.language() else {
            continue;
        };
        if !language.eq_ignore_ascii_case(&package_language) {
            let dom = doc.dom();
            out.push(
                Violation::element(path, dom, dom.root())
                    .with_detail(format!("file: `{language}`, package: `{package_language}`")),
            );
        }
    }
    Ok(out)
}

fn table_without_tbody(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        named(doc, node, "table") && doc.dom().child_named(node, "tbody").is_none()
    }))
}

fn stray_th(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(body_elements_where(tree, |doc, node| {
        let dom = doc.dom();
        named(doc, node, "th")
            && !dom.ancestors(node).any(|ancestor| named(doc, ancestor, "thead"))
            && !dom.attr_tokens(node, "scope").any(|scope| scope.contains("row"))
            && !dom.text(node).trim().is_empty()
    }))
}

fn body_without_section(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, doc) in tree.documents() {
        let Some(body) = doc.body() else {
            continue;
        };
        let dom = doc.dom();
        let mut children = dom.element_children(body);
        let ok = children.any(|child| {
            matches!(dom.local_name(child), "section" | "article")
                || (named(doc, child, "nav") && doc.has_semantic(child, "toc"))
        });
        if !ok {
            out.push(Violation::element(path, dom, body));
        }
    }
    Ok(out)
}
