use std::collections::BTreeMap;
use std::sync::LazyLock;

use booklint_model::{CompiledSelector, SourceTree};
use booklint_types::{Category, Severity};
use regex::Regex;

use super::regex;
use crate::rules::{RuleDefinition, RuleError, Violation};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

static XML_ATTRIBUTE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| regex(r"\[\s*xml\s*\|"));
static COLOR_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    regex(concat!(
        r"(?i)#[0-9a-f]{3,8}\b|\b(?:rgba?|hsla?)\s*\(",
        r"|\b(?:black|white|gr[ae]y|silver|red|maroon|blue|navy|green|lime|olive",
        r"|yellow|orange|purple|teal|aqua|fuchsia|currentcolor)\b",
    ))
});

pub(super) fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            code: "c-002",
            category: Category::Css,
            severity: Severity::Error,
            message: "Unused CSS selector: `{detail}`.",
            predicate: unused_selectors,
        },
        RuleDefinition {
            code: "c-003",
            category: Category::Css,
            severity: Severity::Error,
            message: "`[xml|attr]` selector in CSS, but no `@namespace xml \"http://www.w3.org/XML/1998/namespace\";` namespace declaration.",
            predicate: xml_attribute_without_namespace,
        },
        RuleDefinition {
            code: "c-004",
            category: Category::Css,
            severity: Severity::Warning,
            message: "Don’t specify border colors, so that reading systems can adjust for night mode: `{detail}`.",
            predicate: border_colors,
        },
        RuleDefinition {
            code: "c-007",
            category: Category::Css,
            severity: Severity::Error,
            message: "`hyphens` CSS property without `-epub-hyphens` copy.",
            predicate: hyphens_without_epub_copy,
        },
        RuleDefinition {
            code: "c-009",
            category: Category::Css,
            severity: Severity::Warning,
            message: "Duplicate CSS selector within the same media block: `{detail}`.",
            predicate: duplicate_selectors,
        },
    ]
}

fn selector_is_used(tree: &SourceTree, selector: &CompiledSelector) -> bool {
    tree.documents().values().any(|doc| {
        let dom = doc.dom();
        dom.elements().any(|node| selector.matches(dom, node))
    })
}

fn unused_selectors(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, css) in tree.stylesheets() {
        for rule in css.style_rules() {
            for selector in rule.selectors.iter().filter(|s| s.is_supported()) {
                if !selector_is_used(tree, selector) {
                    out.push(Violation::line(path, rule.line).with_detail(selector.text.clone()));
                }
            }
        }
    }
    Ok(out)
}

fn xml_attribute_without_namespace(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, css) in tree.stylesheets() {
        if css.namespace_uri("xml") == Some(XML_NAMESPACE) {
            continue;
        }
        for rule in css.style_rules() {
            if XML_ATTRIBUTE_SELECTOR.is_match(&rule.selector_text) {
                out.push(Violation::line(path, rule.line));
            }
        }
    }
    Ok(out)
}

fn is_border_shorthand(property: &str) -> bool {
    matches!(
        property,
        "border"
            | "border-top"
            | "border-right"
            | "border-bottom"
            | "border-left"
            | "border-block"
            | "border-inline"
            | "border-block-start"
            | "border-block-end"
            | "border-inline-start"
            | "border-inline-end"
    )
}

fn border_colors(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, css) in tree.stylesheets() {
        for rule in css.rules() {
            for decl in &rule.declarations {
                let colored = (decl.property.starts_with("border")
                    && decl.property.ends_with("-color"))
                    || (is_border_shorthand(&decl.property) && COLOR_VALUE.is_match(&decl.value));
                if colored {
                    out.push(
                        Violation::line(path, decl.line)
                            .with_detail(format!("{}: {}", decl.property, decl.value)),
                    );
                }
            }
        }
    }
    Ok(out)
}

fn hyphens_without_epub_copy(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, css) in tree.stylesheets() {
        for rule in css.rules() {
            if let Some(decl) = rule.declaration("hyphens") {
                if rule.declaration("-epub-hyphens").is_none() {
                    out.push(Violation::line(path, decl.line));
                }
            }
        }
    }
    Ok(out)
}

fn duplicate_selectors(tree: &SourceTree) -> Result<Vec<Violation>, RuleError> {
    let mut out = Vec::new();
    for (path, css) in tree.stylesheets() {
        let mut seen: BTreeMap<(Option<&str>, &str), u32> = BTreeMap::new();
        for rule in css.style_rules() {
            for selector in &rule.selectors {
                let key = (rule.media.as_deref(), selector.text.as_str());
                if seen.contains_key(&key) {
                    out.push(Violation::line(path, rule.line).with_detail(selector.text.clone()));
                } else {
                    seen.insert(key, rule.line);
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use booklint_testkit::EbookBuilder;
    use booklint_testkit::ebook::DEFAULT_CSS;
    use booklint_types::Location;

    use super::super::test_support::run;

    fn with_css(extra: &str) -> EbookBuilder {
        EbookBuilder::new().css(&format!("{DEFAULT_CSS}\n{extra}"))
    }

    #[test]
    fn unused_selector_is_reported_at_its_rule() {
        let found = run(
            "c-002",
            with_css("p.epigraph{\n\tfont-style: italic;\n}\n\nsection > p{\n\tmargin: 0;\n}"),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "epub/css/local.css");
        assert_eq!(found[0].detail.as_deref(), Some("p.epigraph"));
        assert_eq!(found[0].location, Location::Line { line: 9 });
    }

    #[test]
    fn unsupported_selectors_are_not_reported_as_unused() {
        let found = run("c-002", with_css("p:hover{\n\tcolor: inherit;\n}"));
        assert!(found.is_empty());
    }

    #[test]
    fn xml_attribute_needs_namespace() {
        let found = run("c-003", with_css("[xml|lang]{\n\tfont-style: italic;\n}"));
        assert_eq!(found.len(), 1);

        let declared = format!(
            "@namespace xml \"http://www.w3.org/XML/1998/namespace\";\n\
             {DEFAULT_CSS}\n[xml|lang]{{\n\tfont-style: italic;\n}}"
        );
        assert!(run("c-003", EbookBuilder::new().css(&declared)).is_empty());
    }

    #[test]
    fn border_colors_are_flagged() {
        let found = run(
            "c-004",
            with_css(
                "hr{\n\tborder: 1px solid #000;\n\tborder-top-color: red;\n\tborder-width: 1px;\n}",
            ),
        );
        assert_eq!(found.len(), 2);
        assert!(run("c-004", with_css("hr{\n\tborder: 1px solid;\n}")).is_empty());
    }

    #[test]
    fn hyphens_requires_epub_prefix_copy() {
        assert_eq!(run("c-007", with_css("p{\n\thyphens: auto;\n}")).len(), 1);
        let prefixed = with_css("p{\n\t-epub-hyphens: auto;\n\thyphens: auto;\n}");
        assert!(run("c-007", prefixed).is_empty());
    }

    #[test]
    fn duplicate_selectors_report_the_later_rule() {
        let found = run("c-009", with_css("h2{\n\tfont-weight: bold;\n}"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].location, Location::Line { line: 9 });

        let in_media = run(
            "c-009",
            with_css("@media (prefers-color-scheme: dark){\n\th2{\n\t\tcolor: inherit;\n\t}\n}"),
        );
        assert!(in_media.is_empty());
    }
}
