use std::sync::LazyLock;

use booklint_model::SourceTree;
use booklint_model::paths::{parent_dir, resolve_href};
use booklint_types::{Category, Severity};
use regex::Regex;

use super::{line_at, markup_sources, regex, source_matches};
use crate::rules::{RuleDefinition, RuleError, Violation};

static GUTENBERG_URL: LazyLock<Regex> = LazyLock::new(|| regex(r#"gutenberg\.org[^"<\s]*"#));
static NON_HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r#"http://(?:[a-z0-9-]+\.)*(?:gutenberg\.org|archive\.org|hathitrust\.org|google\.com|wikipedia\.org|wikisource\.org|standardebooks\.org|fadedpage\.com|gutenberg\.ca|pgdp\.net|loc\.gov)[^"<\s]*"#,
    )
});

/// Metadata every package must declare, as `(element, meta property)`.
const REQUIRED_METADATA: &[(&str, Option<&str>)] = &[
    ("dc:identifier", None),
    ("dc:title", None),
    ("dc:language", None),
    ("dc:description", None),
    ("meta", Some("dcterms:modified")),
];

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "m-001",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "gutenberg.org URL missing leading `www.`: `{detail}`.",
            predicate: gutenberg_without_www,
        },
        RuleDefinition {
            code: "m-003",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "Non-HTTPS URL: `{detail}`.",
            predicate: non_https_urls,
        },
        RuleDefinition {
            code: "m-010",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "Invalid `refines` property, no element with that id: `{detail}`.",
            predicate: dangling_refines,
        },
        RuleDefinition {
            code: "m-012",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "Non-typogrified character in `<dc:title>` element.",
            predicate: untypogrified_title,
        },
        RuleDefinition {
            code: "m-043",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "The number of elements in the spine does not match the number of elements in the ToC and landmarks ({detail}).",
            predicate: spine_toc_mismatch,
        },
        RuleDefinition {
            code: "m-051",
            category: Category::Metadata,
            severity: Severity::Error,
            message: "Missing expected metadata: {detail}.",
            predicate: missing_metadata,
        },
    ]
}

fn gutenberg_without_www(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, source) in markup_sources(tree) {
        for m in GUTENBERG_URL.find_iter(source) {
            if source[..m.start()].ends_with("www.") {
                continue;
            }
            out.push(Violation::line(path, line_at(source, m.start())).with_detail(m.as_str()));
        }
    }
    Ok(out)
}

fn non_https_urls(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(markup_sources(tree)
        .flat_map(|(path, source)| source_matches(path, source, &NON_HTTPS_URL))
        .collect())
}

fn dangling_refines(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let package = tree.package();
    let dom = package.dom();
    let Some(metadata) = package.metadata() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for node in dom.element_children(metadata) {
        let Some(refines) = dom.attr(node, "refines") else {
            continue;
        };
        let id = refines.trim_start_matches('#');
        let exists = dom.elements().any(|other| dom.attr(other, "id") == Some(id));
        if !exists {
            out.push(Violation::element(package.path(), dom, node).with_detail(refines));
        }
    }
    Ok(out)
}

fn untypogrified_title(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let package = tree.package();
    let dom = package.dom();
    Ok(package
        .metadata_elements("dc:title")
        .filter(|node| {
            let title = dom.text(*node);
            title.contains(['\'', '"']) || title.contains("--")
        })
        .map(|node| Violation::element(package.path(), dom, node))
        .collect())
}

fn spine_toc_mismatch(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let package = tree.package();
    let Some(nav_item) = package.nav_item() else {
        return Ok(Vec::new());
    };
    let Some(nav) = tree.document(&nav_item.path) else {
        return Ok(Vec::new());
    };
    let dom = nav.dom();

    let navs: Vec<_> = dom
        .elements_named("nav")
        .filter(|node| nav.has_semantic(*node, "toc") || nav.has_semantic(*node, "landmarks"))
        .collect();
    if !navs.iter().any(|node| nav.has_semantic(*node, "toc")) {
        return Ok(Vec::new());
    }

    let base = parent_dir(&nav_item.path);
    let mut linked: Vec<String> = Vec::new();
    for nav_node in navs {
        for link in dom.descendants(nav_node) {
            if dom.local_name(link) != "a" {
                continue;
            }
            let Some(href) = dom.attr(link, "href") else {
                continue;
            };
            let target = resolve_href(base, href);
            if !linked.contains(&target) {
                linked.push(target);
            }
        }
    }

    let spine_count = package
        .spine()
        .iter()
        .filter(|itemref| itemref.linear)
        .filter_map(|itemref| package.item(&itemref.idref))
        .filter(|item| item.path != nav_item.path)
        .count();

    if spine_count == linked.len() {
        return Ok(Vec::new());
    }
    Ok(vec![Violation::file(package.path()).with_detail(format!(
        "spine: {spine_count}, ToC and landmarks: {}",
        linked.len()
    ))])
}

fn missing_metadata(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let package = tree.package();
    let missing: Vec<String> = REQUIRED_METADATA
        .iter()
        .filter(|(element, property)| match property {
            Some(property) => package.meta_properties(property).next().is_none(),
            None => package.metadata_elements(element).next().is_none(),
        })
        .map(|(element, property)| match property {
            Some(property) => format!("`<{element} property=\"{property}\">`"),
            None => format!("`<{element}>`"),
        })
        .collect();

    if missing.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Violation::file(package.path()).with_detail(missing.join(", "))])
}
