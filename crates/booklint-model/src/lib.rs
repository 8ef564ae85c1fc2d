//! Document model builder for booklint.
//!
//! [`SourceTree::load`] parses a target's package document, content documents
//! and stylesheets exactly once, builds the derived indices, and hands back an
//! immutable tree. Rule predicates only ever read from it.

mod error;
mod package;
mod tree;
mod xhtml;

pub mod css;
pub mod paths;
pub mod selector;
pub mod xml;

pub use css::{CssError, CssRule, Declaration, NamespaceDecl, ParsedCss};
pub use error::TargetError;
pub use package::{MEDIA_TYPE_CSS, MEDIA_TYPE_XHTML, ManifestItem, PackageDocument, SpineItem};
pub use selector::{CompiledSelector, SelectorKind};
pub use tree::{CONTAINER_FILE, EPUB_MIMETYPE, IdOccurrence, MIMETYPE_FILE, SourceTree};
pub use xhtml::ParsedXhtmlDocument;
pub use xml::{NodeId, XmlDocument, XmlError};
