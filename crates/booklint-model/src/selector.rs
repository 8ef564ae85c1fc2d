//! Compiled CSS selectors and matching against an [`XmlDocument`].
//!
//! Only the subset of Selectors Level 3 that ebook stylesheets use is
//! supported. Anything else compiles to [`SelectorKind::Unsupported`], which
//! never matches.

use crate::xml::{NodeId, XmlDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSelector {
    /// Source text, whitespace-normalized.
    pub text: String,
    pub kind: SelectorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKind {
    Complex(ComplexSelector),
    Unsupported,
}

/// Compounds joined by combinators: `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// Local element name; `None` is the universal selector.
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
    pseudo_element: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    /// Qualified name with `:` as the prefix separator (`epub:type`).
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    Root,
    Empty,
    Nth { a: i32, b: i32, of_type: bool, from_end: bool },
    Not(Box<Compound>),
}

const PSEUDO_ELEMENTS: &[&str] = &[
    "before",
    "after",
    "first-letter",
    "first-line",
    "marker",
    "selection",
];

impl CompiledSelector {
    pub fn is_supported(&self) -> bool {
        matches!(self.kind, SelectorKind::Complex(_))
    }

    pub fn matches(&self, doc: &XmlDocument, node: NodeId) -> bool {
        match &self.kind {
            SelectorKind::Complex(complex) => complex.matches(doc, node),
            SelectorKind::Unsupported => false,
        }
    }

    /// Every element of `doc` matched by this selector, in document order.
    pub fn select(&self, doc: &XmlDocument) -> Vec<NodeId> {
        if !self.is_supported() {
            return Vec::new();
        }
        doc.elements().filter(|id| self.matches(doc, *id)).collect()
    }
}

/// Compiles a selector list (`a, b > c`) into one entry per selector.
pub fn compile_list(text: &str) -> Vec<CompiledSelector> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(compile)
        .collect()
}

/// Compiles one selector. Never fails: unparseable input becomes `Unsupported`.
pub fn compile(text: &str) -> CompiledSelector {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let kind = Parser::new(&normalized)
        .parse_complex()
        .map_or(SelectorKind::Unsupported, SelectorKind::Complex);
    CompiledSelector {
        text: normalized,
        kind,
    }
}

/// Splits on `sep` outside brackets, parentheses and quotes.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                c if c == sep && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Parser {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
                self.pos += 1;
            } else if ch == '\\' {
                self.pos += 2;
            } else {
                break;
            }
        }
        let end = self.pos.min(self.chars.len());
        (end > start).then(|| {
            self.chars[start..end]
                .iter()
                .filter(|ch| **ch != '\\')
                .collect()
        })
    }

    fn parse_complex(&mut self) -> Option<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::Adjacent,
                Some('~') => Combinator::Sibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return None,
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_ws();
            }
            // Pseudo-elements may only end a selector.
            if compounds.last().is_some_and(|c| c.pseudo_element.is_some()) {
                return None;
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Some(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Option<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.eat('*') {
            any = true;
            if self.eat('|') {
                compound.tag = self.ident();
            }
        } else if let Some(name) = self.ident() {
            any = true;
            compound.tag = Some(if self.eat('|') {
                if self.eat('*') {
                    return None;
                }
                self.ident()?
            } else {
                name
            });
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let double = self.eat(':');
                    let name = self.ident()?.to_ascii_lowercase();
                    if double || PSEUDO_ELEMENTS.contains(&name.as_str()) {
                        if compound.pseudo_element.is_some() {
                            return None;
                        }
                        compound.pseudo_element = Some(name);
                    } else {
                        compound.pseudos.push(self.parse_pseudo(&name)?);
                    }
                }
                _ => break,
            }
            any = true;
        }

        any.then_some(compound)
    }

    fn parse_attr(&mut self) -> Option<AttrSelector> {
        self.skip_ws();
        let mut name = if self.eat('*') {
            self.eat('|').then_some(())?;
            String::new()
        } else if self.eat('|') {
            String::new()
        } else {
            self.ident()?
        };
        if self.peek() == Some('|') && self.chars.get(self.pos + 1) != Some(&'=') {
            self.pos += 1;
            let local = self.ident()?;
            name = if name.is_empty() {
                local
            } else {
                format!("{name}:{local}")
            };
        }
        if name.is_empty() {
            name = self.ident()?;
        }
        self.skip_ws();

        if self.eat(']') {
            return Some(AttrSelector {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            });
        }

        let op = match self.peek()? {
            '=' => AttrOp::Equals,
            '~' => AttrOp::Includes,
            '|' => AttrOp::DashMatch,
            '^' => AttrOp::Prefix,
            '$' => AttrOp::Suffix,
            '*' => AttrOp::Substring,
            _ => return None,
        };
        self.pos += 1;
        if op != AttrOp::Equals && !self.eat('=') {
            return None;
        }
        self.skip_ws();
        let value = match self.peek()? {
            q @ ('"' | '\'') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|ch| ch != q) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.eat(q).then_some(())?;
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        // Case-sensitivity flags are not supported.
        self.eat(']').then_some(())?;
        Some(AttrSelector { name, op, value })
    }

    fn parse_pseudo(&mut self, name: &str) -> Option<Pseudo> {
        let pseudo = match name {
            "first-child" => Pseudo::FirstChild,
            "last-child" => Pseudo::LastChild,
            "only-child" => Pseudo::OnlyChild,
            "first-of-type" => Pseudo::FirstOfType,
            "last-of-type" => Pseudo::LastOfType,
            "only-of-type" => Pseudo::OnlyOfType,
            "root" => Pseudo::Root,
            "empty" => Pseudo::Empty,
            "not" => {
                self.eat('(').then_some(())?;
                self.skip_ws();
                let inner = self.parse_compound()?;
                self.skip_ws();
                self.eat(')').then_some(())?;
                if inner.pseudo_element.is_some() {
                    return None;
                }
                Pseudo::Not(Box::new(inner))
            }
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                self.eat('(').then_some(())?;
                let start = self.pos;
                while self.peek().is_some_and(|ch| ch != ')') {
                    self.pos += 1;
                }
                let arg: String = self.chars[start..self.pos].iter().collect();
                self.eat(')').then_some(())?;
                let (a, b) = parse_nth(&arg)?;
                Pseudo::Nth {
                    a,
                    b,
                    of_type: name.ends_with("of-type"),
                    from_end: name.contains("last"),
                }
            }
            _ => return None,
        };
        Some(pseudo)
    }
}

/// Parses the `an+b` micro-syntax.
fn parse_nth(arg: &str) -> Option<(i32, i32)> {
    let arg: String = arg.chars().filter(|c| !c.is_whitespace()).collect();
    let arg = arg.to_ascii_lowercase();
    match arg.as_str() {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        _ => {}
    }
    let Some((a, b)) = arg.split_once('n') else {
        return Some((0, arg.parse().ok()?));
    };
    let a = match a {
        "" | "+" => 1,
        "-" => -1,
        other => other.parse().ok()?,
    };
    let b = match b {
        "" => 0,
        other => other.strip_prefix('+').unwrap_or(other).parse().ok()?,
    };
    Some((a, b))
}

impl ComplexSelector {
    fn matches(&self, doc: &XmlDocument, node: NodeId) -> bool {
        self.match_from(doc, node, self.compounds.len() - 1)
    }

    fn match_from(&self, doc: &XmlDocument, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let next = index - 1;
        match self.combinators[next] {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|parent| self.match_from(doc, parent, next)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|ancestor| self.match_from(doc, ancestor, next)),
            Combinator::Adjacent => doc
                .prev_element_sibling(node)
                .is_some_and(|sibling| self.match_from(doc, sibling, next)),
            Combinator::Sibling => doc
                .preceding_element_siblings(node)
                .any(|sibling| self.match_from(doc, sibling, next)),
        }
    }
}

impl Compound {
    fn matches(&self, doc: &XmlDocument, node: NodeId) -> bool {
        if !doc.is_element(node) {
            return false;
        }
        if self.tag.as_deref().is_some_and(|tag| doc.local_name(node) != tag) {
            return false;
        }
        if !self.ids.iter().all(|id| doc.attr(node, "id") == Some(id.as_str())) {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|class| doc.attr_tokens(node, "class").any(|token| token == class))
        {
            return false;
        }
        if !self.attrs.iter().all(|attr| attr.matches(doc, node)) {
            return false;
        }
        self.pseudos.iter().all(|pseudo| pseudo.matches(doc, node))
    }
}

impl AttrSelector {
    fn matches(&self, doc: &XmlDocument, node: NodeId) -> bool {
        let value = if self.name.contains(':') {
            doc.attr(node, &self.name)
        } else {
            // Unprefixed names also match the local part of prefixed attributes.
            doc.attr(node, &self.name).or_else(|| {
                doc.attrs(node)
                    .iter()
                    .find(|(key, _)| key.rsplit_once(':').is_some_and(|(_, l)| l == self.name))
                    .map(|(_, v)| v.as_str())
            })
        };
        let Some(value) = value else {
            return false;
        };
        let wanted = self.value.as_str();
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => value == wanted,
            AttrOp::Includes => value.split_whitespace().any(|token| token == wanted),
            AttrOp::DashMatch => {
                value == wanted
                    || value
                        .strip_prefix(wanted)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOp::Prefix => !wanted.is_empty() && value.starts_with(wanted),
            AttrOp::Suffix => !wanted.is_empty() && value.ends_with(wanted),
            AttrOp::Substring => !wanted.is_empty() && value.contains(wanted),
        }
    }
}

impl Pseudo {
    fn matches(&self, doc: &XmlDocument, node: NodeId) -> bool {
        let Some(parent) = doc.parent(node) else {
            return matches!(self, Pseudo::Root)
                || matches!(self, Pseudo::Empty) && is_empty(doc, node)
                || matches!(self, Pseudo::Not(inner) if !inner.matches(doc, node));
        };
        let siblings: Vec<NodeId> = doc.element_children(parent).collect();
        let same_type: Vec<NodeId> = siblings
            .iter()
            .copied()
            .filter(|sibling| doc.name(*sibling) == doc.name(node))
            .collect();
        match self {
            Pseudo::FirstChild => siblings.first() == Some(&node),
            Pseudo::LastChild => siblings.last() == Some(&node),
            Pseudo::OnlyChild => siblings.len() == 1,
            Pseudo::FirstOfType => same_type.first() == Some(&node),
            Pseudo::LastOfType => same_type.last() == Some(&node),
            Pseudo::OnlyOfType => same_type.len() == 1,
            Pseudo::Root => false,
            Pseudo::Empty => is_empty(doc, node),
            Pseudo::Not(inner) => !inner.matches(doc, node),
            Pseudo::Nth {
                a,
                b,
                of_type,
                from_end,
            } => {
                let pool = if *of_type { &same_type } else { &siblings };
                let Some(position) = pool.iter().position(|sibling| *sibling == node) else {
                    return false;
                };
                let index = if *from_end {
                    pool.len() - position
                } else {
                    position + 1
                } as i32;
                nth_matches(*a, *b, index)
            }
        }
    }
}

fn is_empty(doc: &XmlDocument, node: NodeId) -> bool {
    doc.children(node).is_empty()
}

fn nth_matches(a: i32, b: i32, index: i32) -> bool {
    if a == 0 {
        return index == b;
    }
    let diff = index - b;
    diff % a == 0 && diff / a >= 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    const DOC: &str = r#"<html xmlns:epub="http://www.idpf.org/2007/ops">
<body>
<section id="chapter-1" epub:type="chapter bodymatter">
<h2 epub:type="title">I</h2>
<p class="first">One</p>
<p>Two</p>
<blockquote><p>Three</p></blockquote>
<p xml:lang="fr-CA">Quatre</p>
</section>
</body>
</html>"#;

    fn count(selector: &str) -> usize {
        let doc = xml::parse(DOC).expect("parse");
        compile(selector).select(&doc).len()
    }

    #[test]
    fn simple_selectors() {
        assert_eq!(count("p"), 4);
        assert_eq!(count("*"), 9);
        assert_eq!(count(".first"), 1);
        assert_eq!(count("#chapter-1"), 1);
        assert_eq!(count("p.first"), 1);
        assert_eq!(count("span"), 0);
    }

    #[test]
    fn combinators() {
        assert_eq!(count("section > p"), 3);
        assert_eq!(count("section p"), 4);
        assert_eq!(count("h2 + p"), 1);
        assert_eq!(count("h2 ~ p"), 3);
        assert_eq!(count("blockquote > p"), 1);
        assert_eq!(count("body > p"), 0);
    }

    #[test]
    fn namespaced_attribute_operators() {
        assert_eq!(count("[epub|type~=\"chapter\"]"), 1);
        assert_eq!(count("[epub|type^=\"chap\"]"), 1);
        assert_eq!(count("[epub|type$=\"matter\"]"), 1);
        assert_eq!(count("[epub|type*=\"body\"]"), 1);
        assert_eq!(count("[epub|type=\"chapter\"]"), 0);
        assert_eq!(count("[xml|lang|=\"fr\"]"), 1);
        assert_eq!(count("[lang|=fr]"), 1);
        assert_eq!(count("[epub|type]"), 2);
    }

    #[test]
    fn structural_pseudo_classes() {
        assert_eq!(count("p:first-of-type"), 2);
        assert_eq!(count("section > p:last-child"), 1);
        assert_eq!(count("h2:first-child"), 1);
        assert_eq!(count("blockquote p:only-child"), 1);
        assert_eq!(count("section > p:nth-child(2)"), 1);
        assert_eq!(count("section > *:nth-child(odd)"), 3);
        assert_eq!(count("section > p:not(.first)"), 2);
        assert_eq!(count("html:root"), 1);
    }

    #[test]
    fn pseudo_elements_match_their_element() {
        assert_eq!(count("p.first::first-letter"), 1);
        assert_eq!(count("h2:before"), 1);
    }

    #[test]
    fn unsupported_selectors_never_match() {
        let selector = compile("a:hover");
        assert!(!selector.is_supported());
        assert_eq!(count("a:hover"), 0);
        assert!(!compile("p::before span").is_supported());
        assert!(!compile("[data-x=\"a\" i]").is_supported());
    }

    #[test]
    fn compile_list_splits_outside_brackets() {
        let list = compile_list("p, [title=\"a,b\"],  h2 >  p ");
        let texts: Vec<&str> = list.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["p", "[title=\"a,b\"]", "h2 > p"]);
    }

    #[test]
    fn nth_syntax() {
        assert_eq!(parse_nth("2n+1"), Some((2, 1)));
        assert_eq!(parse_nth("-n + 3"), Some((-1, 3)));
        assert_eq!(parse_nth("n"), Some((1, 0)));
        assert_eq!(parse_nth("4"), Some((0, 4)));
        assert_eq!(parse_nth("x"), None);
        assert!(nth_matches(-1, 3, 2));
        assert!(!nth_matches(-1, 3, 4));
    }
}
