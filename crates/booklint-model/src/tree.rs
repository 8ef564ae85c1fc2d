//! [`SourceTree`]: one target, parsed once and indexed.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::css::ParsedCss;
use crate::error::TargetError;
use crate::package::{MEDIA_TYPE_CSS, MEDIA_TYPE_XHTML, PackageDocument};
use crate::xhtml::ParsedXhtmlDocument;
use crate::xml::{self, NodeId};

pub const MIMETYPE_FILE: &str = "mimetype";
pub const CONTAINER_FILE: &str = "META-INF/container.xml";
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// One occurrence of an `id` value somewhere in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdOccurrence<'a> {
    pub path: &'a str,
    pub node: NodeId,
}

/// The immutable, fully-indexed representation of one target.
///
/// A `SourceTree` is only ever returned complete. Any missing mandatory file
/// or malformed document aborts construction with a [`TargetError`].
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    source_prefix: String,
    files: BTreeSet<String>,
    mimetype: String,
    package: PackageDocument,
    documents: BTreeMap<String, ParsedXhtmlDocument>,
    stylesheets: BTreeMap<String, ParsedCss>,
    spine: Vec<String>,
    ids: BTreeMap<String, Vec<(String, NodeId)>>,
    class_usage: BTreeMap<String, usize>,
}

impl SourceTree {
    /// Loads the target rooted at `root` from disk.
    pub fn load(root: &Path) -> Result<Self, TargetError> {
        let label = root.display().to_string();
        if !root.is_dir() {
            return Err(TargetError::structure(label, "target is not a directory"));
        }

        let mut files = BTreeSet::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != ".git");
        for entry in walker {
            let entry = entry.map_err(|err| TargetError::structure(label.as_str(), err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.insert(relative.join("/"));
        }

        Self::build(root.to_path_buf(), files, |relative| {
            std::fs::read_to_string(root.join(relative))
        })
    }

    /// Builds a tree from in-memory file contents keyed by target-relative path.
    pub fn from_files(
        root: impl Into<PathBuf>,
        files: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, TargetError> {
        let contents: BTreeMap<String, String> = files.into_iter().collect();
        let paths = contents.keys().cloned().collect();
        Self::build(root.into(), paths, |relative| {
            contents
                .get(relative)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        })
    }

    fn build<F>(root: PathBuf, files: BTreeSet<String>, read: F) -> Result<Self, TargetError>
    where
        F: Fn(&str) -> io::Result<String>,
    {
        let source_prefix = if files.contains(&format!("src/{CONTAINER_FILE}")) {
            "src/".to_string()
        } else {
            String::new()
        };
        let in_source = |name: &str| format!("{source_prefix}{name}");

        let read_required = |path: &str| -> Result<String, TargetError> {
            if !files.contains(path) {
                return Err(TargetError::structure(path, "missing mandatory file"));
            }
            read(path).map_err(|err| match err.kind() {
                io::ErrorKind::InvalidData => TargetError::parse(path, "file is not valid UTF-8"),
                io::ErrorKind::NotFound => TargetError::structure(path, "missing mandatory file"),
                _ => TargetError::structure(path, err),
            })
        };

        let mimetype_path = in_source(MIMETYPE_FILE);
        let mimetype = read_required(&mimetype_path)?;

        let container_path = in_source(CONTAINER_FILE);
        let container_source = read_required(&container_path)?;
        let container = xml::parse(&container_source)
            .map_err(|err| TargetError::parse(container_path.as_str(), err))?;
        let rootfile = container
            .elements_named("rootfile")
            .find_map(|node| container.attr(node, "full-path"))
            .ok_or_else(|| {
                TargetError::structure(container_path.as_str(), "no <rootfile full-path> entry")
            })?;

        let package_path = in_source(rootfile);
        let package = PackageDocument::parse(&package_path, read_required(&package_path)?)?;

        let mut documents = BTreeMap::new();
        let mut stylesheets = BTreeMap::new();
        for item in package.manifest() {
            match item.media_type.as_str() {
                MEDIA_TYPE_XHTML => {
                    let source = read_required(&item.path)?;
                    let document = ParsedXhtmlDocument::parse(item.path.as_str(), source)
                        .map_err(|err| TargetError::parse(item.path.as_str(), err))?;
                    documents.insert(item.path.clone(), document);
                }
                MEDIA_TYPE_CSS => {
                    let source = read_required(&item.path)?;
                    let stylesheet = ParsedCss::parse(item.path.as_str(), source)
                        .map_err(|err| TargetError::parse(item.path.as_str(), err))?;
                    stylesheets.insert(item.path.clone(), stylesheet);
                }
                _ => {}
            }
        }

        let mut spine = Vec::new();
        for itemref in package.spine() {
            let item = package.item(&itemref.idref).ok_or_else(|| {
                TargetError::structure(
                    package_path.as_str(),
                    format!("spine references unknown manifest id `{}`", itemref.idref),
                )
            })?;
            spine.push(item.path.clone());
        }

        let mut ids: BTreeMap<String, Vec<(String, NodeId)>> = BTreeMap::new();
        let mut class_usage: BTreeMap<String, usize> = BTreeMap::new();
        for (path, document) in &documents {
            for (id, nodes) in document.ids() {
                let entry = ids.entry(id.clone()).or_default();
                entry.extend(nodes.iter().map(|node| (path.clone(), *node)));
            }
            let dom = document.dom();
            for node in dom.elements() {
                for class in dom.attr_tokens(node, "class") {
                    *class_usage.entry(class.to_string()).or_default() += 1;
                }
            }
        }

        debug!(
            root = %root.display(),
            documents = documents.len(),
            stylesheets = stylesheets.len(),
            files = files.len(),
            "source tree built"
        );

        Ok(SourceTree {
            root,
            source_prefix,
            files,
            mimetype,
            package,
            documents,
            stylesheets,
            spine,
            ids,
            class_usage,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `"src/"` when the target keeps its sources under `src/`, else `""`.
    pub fn source_prefix(&self) -> &str {
        &self.source_prefix
    }

    /// Every file of the target, target-relative, sorted.
    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    /// Files below the source root.
    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(|path| path.starts_with(&self.source_prefix))
            .map(String::as_str)
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn package(&self) -> &PackageDocument {
        &self.package
    }

    /// Content documents keyed by target-relative path.
    pub fn documents(&self) -> &BTreeMap<String, ParsedXhtmlDocument> {
        &self.documents
    }

    pub fn document(&self, path: &str) -> Option<&ParsedXhtmlDocument> {
        self.documents.get(path)
    }

    pub fn stylesheets(&self) -> &BTreeMap<String, ParsedCss> {
        &self.stylesheets
    }

    /// Content document paths in reading order.
    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// Every occurrence of `id` across all content documents.
    pub fn id_occurrences(&self, id: &str) -> Vec<IdOccurrence<'_>> {
        self.ids
            .get(id)
            .map(|found| {
                found
                    .iter()
                    .map(|(path, node)| IdOccurrence { path, node: *node })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tree-wide id index: id value → occurrences, ordered by path then document order.
    pub fn ids(&self) -> impl Iterator<Item = (&str, Vec<IdOccurrence<'_>>)> {
        self.ids.iter().map(|(id, found)| {
            let occurrences = found
                .iter()
                .map(|(path, node)| IdOccurrence { path, node: *node })
                .collect();
            (id.as_str(), occurrences)
        })
    }

    /// How many elements across the tree carry each class.
    pub fn class_usage(&self) -> &BTreeMap<String, usize> {
        &self.class_usage
    }
}
