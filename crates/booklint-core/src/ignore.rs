//! Loading a target's ignore manifest from disk.

use std::path::Path;

use anyhow::{Context, Result};
use booklint_domain::{IgnoreManifest, RuleCatalog};
use booklint_types::{Diagnostic, DiagnosticKind, IgnoreFile};
use tracing::debug;

/// Loads `<target>/<file_name>` and compiles it against `catalog`.
///
/// A missing file yields an empty manifest. An unreadable or malformed file
/// yields an empty manifest plus one `suppression_config_error`, so the target
/// is still evaluated.
pub fn load_ignore_manifest(
    target: &Path,
    file_name: &str,
    catalog: &RuleCatalog,
) -> (IgnoreManifest, Vec<Diagnostic>) {
    let path = target.join(file_name);
    if !path.is_file() {
        debug!(path = %path.display(), "no ignore manifest");
        return (IgnoreManifest::empty(), Vec::new());
    }

    match read_ignore_file(&path) {
        Ok(file) => {
            debug!(path = %path.display(), entries = file.ignore.len(), "loaded ignore manifest");
            IgnoreManifest::compile(&file, catalog, file_name)
        }
        Err(err) => {
            let diagnostic = Diagnostic {
                kind: DiagnosticKind::SuppressionConfigError,
                path: file_name.to_string(),
                subject: None,
                message: format!("{err:#}; evaluating without suppressions"),
            };
            (IgnoreManifest::empty(), vec![diagnostic])
        }
    }
}

fn read_ignore_file(path: &Path) -> Result<IgnoreFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read ignore manifest '{}'", path.display()))?;
    let file: IgnoreFile = toml::from_str(&text)
        .with_context(|| format!("parse ignore manifest '{}'", path.display()))?;
    Ok(file)
}
