//! The package document (`content.opf`): metadata, manifest and spine.

use crate::error::TargetError;
use crate::paths::{parent_dir, resolve_href};
use crate::xml::{self, NodeId, XmlDocument};

pub const MEDIA_TYPE_XHTML: &str = "application/xhtml+xml";
pub const MEDIA_TYPE_CSS: &str = "text/css";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Vec<String>,
    /// Target-relative path the href resolves to.
    pub path: String,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub idref: String,
    pub linear: bool,
}

#[derive(Debug, Clone)]
pub struct PackageDocument {
    path: String,
    source: String,
    dom: XmlDocument,
    manifest: Vec<ManifestItem>,
    spine: Vec<SpineItem>,
}

impl PackageDocument {
    /// Parses the package document at target-relative `path`.
    pub fn parse(path: &str, source: String) -> Result<Self, TargetError> {
        let dom = xml::parse(&source).map_err(|err| TargetError::parse(path, err))?;
        if dom.local_name(dom.root()) != "package" {
            return Err(TargetError::parse(
                path,
                format!("root element is <{}>, expected <package>", dom.name(dom.root())),
            ));
        }

        let base = parent_dir(path);
        let manifest_node = dom
            .child_named(dom.root(), "manifest")
            .ok_or_else(|| TargetError::structure(path, "package document has no <manifest>"))?;

        let mut manifest = Vec::new();
        for item in dom
            .element_children(manifest_node)
            .filter(|node| dom.local_name(*node) == "item")
        {
            let required = |name: &str| {
                dom.attr(item, name).map(str::to_string).ok_or_else(|| {
                    TargetError::parse(
                        path,
                        format!("line {}: <item> without `{name}`", dom.line(item)),
                    )
                })
            };
            let href = required("href")?;
            manifest.push(ManifestItem {
                id: required("id")?,
                media_type: required("media-type")?,
                properties: dom
                    .attr_tokens(item, "properties")
                    .map(str::to_string)
                    .collect(),
                path: resolve_href(base, &href),
                href,
            });
        }

        let spine = dom
            .child_named(dom.root(), "spine")
            .map(|spine| {
                dom.element_children(spine)
                    .filter(|node| dom.local_name(*node) == "itemref")
                    .map(|node| SpineItem {
                        idref: dom.attr(node, "idref").unwrap_or_default().to_string(),
                        linear: dom.attr(node, "linear") != Some("no"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(PackageDocument {
            path: path.to_string(),
            source,
            dom,
            manifest,
            spine,
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

    pub fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    pub fn spine(&self) -> &[SpineItem] {
        &self.spine
    }

    pub fn has_spine(&self) -> bool {
        self.dom.child_named(self.dom.root(), "spine").is_some()
    }

    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    pub fn item_by_path(&self, path: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.path == path)
    }

    /// The navigation document (`properties="nav"`).
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.has_property("nav"))
    }

    pub fn metadata(&self) -> Option<NodeId> {
        self.dom.child_named(self.dom.root(), "metadata")
    }

    /// Children of `<metadata>` with the given qualified name (`dc:title`, `meta`).
    pub fn metadata_elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.metadata()
            .into_iter()
            .flat_map(move |metadata| self.dom.element_children(metadata))
            .filter(move |node| self.dom.name(*node) == name)
    }

    /// Trimmed text of the first `<metadata>` child with the given name.
    pub fn metadata_text(&self, name: &str) -> Option<String> {
        self.metadata_elements(name)
            .next()
            .map(|node| self.dom.text(node).trim().to_string())
    }

    pub fn language(&self) -> Option<String> {
        self.metadata_text("dc:language").filter(|lang| !lang.is_empty())
    }

    /// `<meta>` elements with the given `property`.
    pub fn meta_properties<'a>(
        &'a self,
        property: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.metadata_elements("meta")
            .filter(move |node| self.dom.attr(*node, "property") == Some(property))
    }
}
