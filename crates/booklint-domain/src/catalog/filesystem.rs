use std::collections::BTreeSet;

use booklint_model::paths::{file_name, parent_dir, resolve_href};
use booklint_model::{CONTAINER_FILE, SourceTree};
use booklint_types::{Category, Severity};

use crate::rules::{RuleDefinition, RuleError, Violation};

/// Element/attribute pairs that reference other files of the book.
const REFERENCES: &[(&str, &str)] = &[
    ("img", "src"),
    ("link", "href"),
    ("source", "src"),
    ("audio", "src"),
    ("video", "src"),
];

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "f-002",
            category: Category::Filesystem,
            severity: Severity::Error,
            message: "Missing expected file or directory: `{detail}`.",
            predicate: missing_files,
        },
        RuleDefinition {
            code: "f-008",
            category: Category::Filesystem,
            severity: Severity::Error,
            message: "Filename is not URL-safe. Expected: `{detail}`.",
            predicate: unsafe_file_names,
        },
        RuleDefinition {
            code: "f-009",
            category: Category::Filesystem,
            severity: Severity::Error,
            message: "Illegal leading `0` in filename.",
            predicate: leading_zero_file_names,
        },
    ]
}

fn is_external(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('#')
        || href.contains("://")
        || href.starts_with("data:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
}

fn missing_files(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    let files = tree.files();

    let package = tree.package();
    for item in package.manifest() {
        if !files.contains(&item.path) {
            out.push(Violation::file(package.path()).with_detail(item.path.clone()));
        }
    }

    for (path, doc) in tree.documents() {
        let dom = doc.dom();
        let base = parent_dir(path);
        for &(element, attribute) in REFERENCES {
            for node in dom.elements_named(element) {
                let Some(href) = dom.attr(node, attribute) else {
                    continue;
                };
                if is_external(href.trim()) {
                    continue;
                }
                let target = resolve_href(base, href.trim());
                if !files.contains(&target) {
                    out.push(Violation::element(path, dom, node).with_detail(target));
                }
            }
        }
    }
    Ok(out)
}

/// Lowercase ASCII alphanumerics joined by single dashes.
fn url_safe(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c == '\'' || c == '’' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// The URL-safe form of a path segment; the extension is left alone.
fn expected_segment(segment: &str) -> String {
    match segment.split_once('.') {
        Some(("", _)) => segment.to_string(),
        Some((stem, extension)) => format!("{}.{extension}", url_safe(stem)),
        None => url_safe(segment),
    }
}

fn unsafe_file_names(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let prefix = tree.source_prefix().trim_end_matches('/');
    let meta_inf = parent_dir(CONTAINER_FILE);

    let mut paths: BTreeSet<&str> = BTreeSet::new();
    for file in tree.source_files() {
        paths.insert(file);
        let mut dir = parent_dir(file);
        while !dir.is_empty() && dir != prefix {
            paths.insert(dir);
            dir = parent_dir(dir);
        }
    }

    let mut out = Vec::new();
    for path in paths {
        let relative = path
            .strip_prefix(tree.source_prefix())
            .unwrap_or(path);
        if relative == meta_inf || relative.starts_with(&format!("{meta_inf}/")) {
            continue;
        }
        let name = file_name(path);
        let expected = expected_segment(name);
        if expected != name {
            let parent = parent_dir(path);
            let expected_path = if parent.is_empty() {
                expected
            } else {
                format!("{parent}/{expected}")
            };
            out.push(Violation::file(path).with_detail(expected_path));
        }
    }
    Ok(out)
}

fn leading_zero_file_names(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    Ok(tree
        .source_files()
        .filter(|path| file_name(path).contains("-0"))
        .map(Violation::file)
        .collect())
}
