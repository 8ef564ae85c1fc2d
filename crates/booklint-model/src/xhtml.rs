use std::collections::BTreeMap;

use crate::selector::CompiledSelector;
use crate::xml::{self, NodeId, XmlDocument, XmlError};

/// A parsed XHTML content document with its derived indices.
#[derive(Debug, Clone)]
pub struct ParsedXhtmlDocument {
    path: String,
    source: String,
    dom: XmlDocument,
    ids: BTreeMap<String, Vec<NodeId>>,
    semantics: BTreeMap<NodeId, Vec<String>>,
    text: String,
    language: Option<String>,
}

impl ParsedXhtmlDocument {
    pub fn parse(path: impl Into<String>, source: impl Into<String>) -> Result<Self, XmlError> {
        let source = source.into();
        let dom = xml::parse(&source)?;

        let mut ids: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        let mut semantics: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();
        for node in dom.elements() {
            if let Some(id) = dom.attr(node, "id") {
                ids.entry(id.to_string()).or_default().push(node);
            }
            let tokens: Vec<String> = dom
                .attr_tokens(node, "epub:type")
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                semantics.insert(node, tokens);
            }
        }

        let root = dom.root();
        let text = match dom.child_named(root, "body") {
            Some(body) => dom.text(body),
            None => dom.text(root),
        };
        let language = dom
            .attr(root, "xml:lang")
            .or_else(|| dom.attr(root, "lang"))
            .map(str::to_string);

        Ok(ParsedXhtmlDocument {
            path: path.into(),
            source,
            dom,
            ids,
            semantics,
            text,
            language,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn dom(&self) -> &XmlDocument {
        &self.dom
    }

    pub fn head(&self) -> Option<NodeId> {
        self.dom.child_named(self.dom.root(), "head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.dom.child_named(self.dom.root(), "body")
    }

    /// id value → elements carrying it, within this document.
    pub fn ids(&self) -> &BTreeMap<String, Vec<NodeId>> {
        &self.ids
    }

    /// `epub:type` tokens of an element.
    pub fn semantics(&self, node: NodeId) -> &[String] {
        self.semantics.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_semantic(&self, node: NodeId, semantic: &str) -> bool {
        self.semantics(node).iter().any(|s| s == semantic)
    }

    /// Elements annotated with `semantic`, in document order.
    pub fn with_semantic<'a>(&'a self, semantic: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.semantics
            .iter()
            .filter(move |(_, tokens)| tokens.iter().any(|t| t == semantic))
            .map(|(node, _)| *node)
    }

    /// Cached text content of `<body>`.
    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// Declared language of the root element.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn select(&self, selector: &CompiledSelector) -> Vec<NodeId> {
        selector.select(&self.dom)
    }

    /// Elements under `<body>` (excluding it) in document order.
    pub fn body_elements(&self) -> Vec<NodeId> {
        self.body()
            .map(|body| {
                self.dom
                    .descendants(body)
                    .into_iter()
                    .filter(|node| self.dom.is_element(*node))
                    .collect()
            })
            .unwrap_or_default()
    }
}
