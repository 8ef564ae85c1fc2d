//! Reconciling raw findings against a target's ignore manifest.
//!
//! Within one entry every field must match (code, path glob, optional
//! substring). Across entries a finding is suppressed when any entry matches.
//! Every entry that matched nothing is reported as stale.

use std::collections::BTreeSet;

use booklint_model::paths::file_name;
use booklint_types::{Diagnostic, DiagnosticKind, Finding, IgnoreFile};
use globset::{GlobBuilder, GlobMatcher};

use crate::rules::RuleCatalog;

/// A compiled ignore entry.
#[derive(Debug, Clone)]
pub struct IgnoreEntry {
    pub code: String,
    pub pattern: String,
    pub contains: Option<String>,
    pub reason: Option<String>,
    matcher: GlobMatcher,
    /// Patterns with a `/` match the whole target-relative path.
    match_full_path: bool,
}

impl IgnoreEntry {
    pub fn matches(&self, finding: &Finding) -> bool {
        if finding.code != self.code {
            return false;
        }

        let subject = if self.match_full_path {
            finding.path.as_str()
        } else {
            file_name(&finding.path)
        };
        if !self.matcher.is_match(subject) {
            return false;
        }

        match &self.contains {
            None => true,
            Some(needle) => {
                finding.message.contains(needle.as_str())
                    || finding.location.to_string().contains(needle.as_str())
            }
        }
    }

    fn describe(&self) -> String {
        match &self.contains {
            Some(needle) => format!("`{}` in `{}` containing `{needle}`", self.code, self.pattern),
            None => format!("`{}` in `{}`", self.code, self.pattern),
        }
    }
}

/// The ignore manifest of one target, compiled against a rule catalog.
#[derive(Debug, Clone, Default)]
pub struct IgnoreManifest {
    path: String,
    entries: Vec<IgnoreEntry>,
}

impl IgnoreManifest {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles `file`, read from `manifest_path`, against `catalog`.
    ///
    /// Never fails: malformed entries are dropped and reported as
    /// `suppression_config_error` diagnostics. Entries without a reason are
    /// reported but still applied.
    pub fn compile(
        file: &IgnoreFile,
        catalog: &RuleCatalog,
        manifest_path: &str,
    ) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut entries = Vec::with_capacity(file.ignore.len());
        let config_error = |subject: Option<&str>, message: String| Diagnostic {
            kind: DiagnosticKind::SuppressionConfigError,
            path: manifest_path.to_string(),
            subject: subject.map(str::to_string),
            message,
        };

        if file.ignore.is_empty() {
            diagnostics.push(config_error(
                None,
                "ignore manifest has no entries; delete the file".to_string(),
            ));
        }

        for (index, cfg) in file.ignore.iter().enumerate() {
            let number = index + 1;
            let code = cfg.code.trim();
            if code.is_empty() {
                diagnostics.push(config_error(None, format!("entry #{number} has an empty code")));
                continue;
            }
            if !catalog.contains(code) {
                let similar = catalog.similar_codes(code);
                let hint = if similar.is_empty() {
                    String::new()
                } else {
                    format!(" (did you mean {}?)", similar.join(", "))
                };
                diagnostics.push(config_error(
                    Some(code),
                    format!("entry #{number} references unknown rule code `{code}`{hint}"),
                ));
                continue;
            }

            let pattern = cfg.path.trim();
            if pattern.is_empty() {
                diagnostics.push(config_error(
                    Some(code),
                    format!("entry #{number} has an empty path pattern"),
                ));
                continue;
            }
            let matcher = match GlobBuilder::new(pattern).literal_separator(true).build() {
                Ok(glob) => glob.compile_matcher(),
                Err(err) => {
                    diagnostics.push(config_error(
                        Some(code),
                        format!("entry #{number} has invalid path pattern `{pattern}`: {err}"),
                    ));
                    continue;
                }
            };

            if matches!(pattern, "*" | "**" | "**/*") {
                diagnostics.push(config_error(
                    Some(code),
                    format!("entry #{number} path `{pattern}` matches every file; it is too general"),
                ));
            }

            let reason = cfg
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|reason| !reason.is_empty())
                .map(str::to_string);
            if reason.is_none() {
                diagnostics.push(config_error(
                    Some(code),
                    format!("entry #{number} (`{code}` in `{pattern}`) has no reason"),
                ));
            }

            entries.push(IgnoreEntry {
                code: code.to_string(),
                pattern: pattern.to_string(),
                contains: cfg.contains.clone().filter(|needle| !needle.is_empty()),
                reason,
                matcher,
                match_full_path: pattern.contains('/'),
            });
        }

        (
            Self {
                path: manifest_path.to_string(),
                entries,
            },
            diagnostics,
        )
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> &[IgnoreEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Invocation-level overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Codes reported even when an entry matches them.
    pub allow: BTreeSet<String>,
    /// Treat the manifest as empty.
    pub skip_ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciliation {
    pub kept: Vec<Finding>,
    pub suppressed: u32,
    /// One `stale_suppression` per unused entry.
    pub diagnostics: Vec<Diagnostic>,
}

/// Filters `findings` through `manifest` and `overrides`.
pub fn reconcile(
    findings: Vec<Finding>,
    manifest: &IgnoreManifest,
    overrides: &Overrides,
) -> Reconciliation {
    if overrides.skip_ignore {
        return Reconciliation {
            kept: findings,
            ..Reconciliation::default()
        };
    }

    let mut used = vec![false; manifest.entries.len()];
    let mut out = Reconciliation::default();
    for finding in findings {
        let mut matched = false;
        for (index, entry) in manifest.entries.iter().enumerate() {
            if entry.matches(&finding) {
                used[index] = true;
                matched = true;
            }
        }

        if matched && !overrides.allow.contains(&finding.code) {
            out.suppressed = out.suppressed.saturating_add(1);
        } else {
            out.kept.push(finding);
        }
    }

    for (entry, used) in manifest.entries.iter().zip(used) {
        if !used {
            out.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::StaleSuppression,
                path: manifest.path.clone(),
                subject: Some(entry.code.clone()),
                message: format!("ignore entry {} matched no finding; remove it", entry.describe()),
            });
        }
    }
    out
}
