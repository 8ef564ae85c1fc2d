//! Arena XML tree built from `quick-xml` events.
//!
//! Nodes are stored in document (pre-order) order, so iterating the arena
//! front to back visits elements in reading order.

use booklint_types::Location;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    line: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum XmlError {
    #[error("line {line}: {message}")]
    Malformed { line: u32, message: String },
    #[error("document has no root element")]
    Empty,
}

impl XmlError {
    pub fn line(&self) -> Option<u32> {
        match self {
            XmlError::Malformed { line, .. } => Some(*line),
            XmlError::Empty => None,
        }
    }
}

/// An immutable, well-formed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
    root: NodeId,
}

struct LineIndex(Vec<usize>);

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex(starts)
    }

    fn line_at(&self, offset: usize) -> u32 {
        self.0.partition_point(|&start| start <= offset) as u32
    }
}

/// Parses `text` into an [`XmlDocument`].
///
/// Comments, processing instructions and the doctype are dropped. Text outside
/// the root element must be whitespace.
pub fn parse(text: &str) -> Result<XmlDocument, XmlError> {
    let lines = LineIndex::new(text);
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let line = lines.line_at(offset);
        let event = reader.read_event().map_err(|err| XmlError::Malformed {
            line: lines.line_at(reader.error_position() as usize),
            message: err.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let id = push_element(&mut nodes, &stack, &mut root, &start, line)?;
                stack.push(id);
            }
            Event::Empty(start) => {
                push_element(&mut nodes, &stack, &mut root, &start, line)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(content) => {
                let text = content.unescape().map_err(|err| XmlError::Malformed {
                    line,
                    message: err.to_string(),
                })?;
                push_text(&mut nodes, &stack, text.into_owned(), line)?;
            }
            Event::CData(content) => {
                let text = String::from_utf8_lossy(&content).into_owned();
                push_text(&mut nodes, &stack, text, line)?;
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        let name = match &nodes[open.0].kind {
            NodeKind::Element { name, .. } => name.clone(),
            NodeKind::Text(_) => String::new(),
        };
        return Err(XmlError::Malformed {
            line: lines.line_at(text.len()),
            message: format!("unclosed element <{name}>"),
        });
    }

    let root = root.ok_or(XmlError::Empty)?;
    Ok(XmlDocument { nodes, root })
}

fn push_element(
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    start: &BytesStart<'_>,
    line: u32,
) -> Result<NodeId, XmlError> {
    let malformed = |message: String| XmlError::Malformed { line, message };

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs: Vec<(String, String)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if attrs.iter().any(|(existing, _)| *existing == key) {
            return Err(malformed(format!("duplicate attribute `{key}` on <{name}>")));
        }
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(err.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }

    let id = NodeId(nodes.len());
    let parent = stack.last().copied();
    match parent {
        Some(parent) => nodes[parent.0].children.push(id),
        None if root.is_some() => {
            return Err(malformed(format!("second root element <{name}>")));
        }
        None => *root = Some(id),
    }

    nodes.push(Node {
        kind: NodeKind::Element { name, attrs },
        parent,
        children: Vec::new(),
        line,
    });
    Ok(id)
}

fn push_text(
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    text: String,
    line: u32,
) -> Result<(), XmlError> {
    let Some(&parent) = stack.last() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(XmlError::Malformed {
            line,
            message: "text outside the root element".to_string(),
        });
    };
    if text.is_empty() {
        return Ok(());
    }

    let id = NodeId(nodes.len());
    nodes[parent.0].children.push(id);
    nodes.push(Node {
        kind: NodeKind::Text(text),
        parent: Some(parent),
        children: Vec::new(),
        line,
    });
    Ok(())
}

impl XmlDocument {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Qualified element name (`dc:title`), or `""` for text nodes.
    pub fn name(&self, id: NodeId) -> &str {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => name,
            NodeKind::Text(_) => "",
        }
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        name.rsplit_once(':').map_or(name, |(_, local)| local)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs,
            NodeKind::Text(_) => &[],
        }
    }

    /// Raw text of a text node; `None` for elements.
    pub fn text_node(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Line of the element's start tag (or the text node's first character).
    pub fn line(&self, id: NodeId) -> u32 {
        self.nodes[id.0].line
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |node| self.parent(*node))
    }

    /// All element and text nodes below `id`, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            out.push(node);
            pending.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Every element in the document, in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.is_element(*id))
    }

    /// Elements whose local name is `local`, in document order.
    pub fn elements_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |id| self.local_name(*id) == local)
    }

    /// First child element with the given local name.
    pub fn child_named(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.element_children(id)
            .find(|child| self.local_name(*child) == local)
    }

    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.preceding_element_siblings(id).next()
    }

    /// Preceding element siblings, nearest first.
    pub fn preceding_element_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings: &[NodeId] = self.parent(id).map_or(&[], |parent| self.children(parent));
        let position = siblings.iter().position(|node| *node == id).unwrap_or(0);
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .filter(|node| self.is_element(*node))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings: &[NodeId] = self.parent(id).map_or(&[], |parent| self.children(parent));
        let position = siblings.iter().position(|node| *node == id)?;
        siblings[position + 1..]
            .iter()
            .copied()
            .find(|node| self.is_element(*node))
    }

    /// Concatenated text of the node and all its descendants.
    pub fn text(&self, id: NodeId) -> String {
        if let Some(text) = self.text_node(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text_node(node))
            .collect()
    }

    /// XPath-like locator, e.g. `/html/body/section/p[3]/img`.
    ///
    /// A position index is only added when the element has same-named siblings.
    pub fn locator(&self, id: NodeId) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_element(node) {
                let name = self.name(node);
                let segment = match self.parent(node) {
                    Some(parent) => {
                        let same: Vec<NodeId> = self
                            .element_children(parent)
                            .filter(|child| self.name(*child) == name)
                            .collect();
                        if same.len() > 1 {
                            let position =
                                same.iter().position(|child| *child == node).unwrap_or(0);
                            format!("{name}[{}]", position + 1)
                        } else {
                            name.to_string()
                        }
                    }
                    None => name.to_string(),
                };
                segments.push(segment);
            }
            current = self.parent(node);
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub fn location(&self, id: NodeId) -> Location {
        Location::Element {
            line: self.line(id),
            locator: self.locator(id),
        }
    }

    /// The element's start tag, e.g. `<img src="a.png" id="x">`.
    pub fn tag_string(&self, id: NodeId) -> String {
        let mut out = format!("<{}", self.name(id));
        for (key, value) in self.attrs(id) {
            out.push_str(&format!(" {key}=\"{}\"", value.replace('"', "&quot;")));
        }
        out.push('>');
        out
    }

    /// Whitespace-separated tokens of an attribute value.
    pub fn attr_tokens<'a>(&'a self, id: NodeId, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.attr(id, name).unwrap_or("").split_whitespace()
    }
}
