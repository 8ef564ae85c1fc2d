//! Data types (findings, reports, ignore manifest) for booklint.
//!
//! This crate is intentionally "dumb": pure DTOs with serde + schemars.

use std::fmt;
use std::hash::{Hash, Hasher};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema Identifiers ─────────────────────────────────────────
pub const REPORT_SCHEMA_V1: &str = "booklint.report.v1";

// ── Frozen Vocabulary ──────────────────────────────────────────
// Reserved diagnostic codes. These can never be registered as rule codes.
pub const CODE_INTERNAL_RULE_ERROR: &str = "internal-rule-error";
pub const CODE_STALE_SUPPRESSION: &str = "stale-suppression";
pub const CODE_SUPPRESSION_CONFIG_ERROR: &str = "suppression-config-error";

pub const RESERVED_CODES: &[&str] = &[
    CODE_INTERNAL_RULE_ERROR,
    CODE_STALE_SUPPRESSION,
    CODE_SUPPRESSION_CONFIG_ERROR,
];

/// File name of the per-target ignore manifest.
pub const DEFAULT_IGNORE_FILE: &str = "booklint-ignore.toml";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Rule family. The letter prefixes every rule code in the family.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Css,
    Filesystem,
    Metadata,
    Semantics,
    Typography,
    Xhtml,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Css,
        Category::Filesystem,
        Category::Metadata,
        Category::Semantics,
        Category::Typography,
        Category::Xhtml,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Css => "css",
            Category::Filesystem => "filesystem",
            Category::Metadata => "metadata",
            Category::Semantics => "semantics",
            Category::Typography => "typography",
            Category::Xhtml => "xhtml",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Category::Css => 'c',
            Category::Filesystem => 'f',
            Category::Metadata => 'm',
            Category::Semantics => 's',
            Category::Typography => 't',
            Category::Xhtml => 'x',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.letter() == letter)
    }
}

/// Where inside a file a finding points.
///
/// Ordering is variant order first (`File < Line < Element`), then line, then
/// locator, which gives reading order within a file.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// The file as a whole.
    File,
    /// A 1-based line number.
    Line { line: u32 },
    /// An element, with the line its start tag begins on and an XPath-like locator.
    Element { line: u32, locator: String },
}

impl Location {
    pub fn line(&self) -> Option<u32> {
        match self {
            Location::File => None,
            Location::Line { line } | Location::Element { line, .. } => Some(*line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File => f.write_str("-"),
            Location::Line { line } => write!(f, "line {line}"),
            Location::Element { line, locator } => write!(f, "line {line} {locator}"),
        }
    }
}

/// A single rule violation.
///
/// Equality and hashing only consider `(code, path, location)`, so two
/// occurrences of the same violation compare equal even if their rendered
/// message differs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub code: String,
    pub severity: Severity,
    /// Target-relative path using `/` separators.
    pub path: String,
    pub location: Location,
    pub message: String,
}

impl Finding {
    pub fn identity(&self) -> (&str, &str, &Location) {
        (&self.code, &self.path, &self.location)
    }

    /// Total ordering key used by the report: code, file, location, then message.
    pub fn sort_key(&self) -> (&str, &str, &Location, &str) {
        (&self.code, &self.path, &self.location, &self.message)
    }
}

impl PartialEq for Finding {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Finding {}

impl Hash for Finding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A predicate failed or panicked; its results were dropped.
    InternalRuleError,
    /// An ignore entry matched no finding.
    StaleSuppression,
    /// An ignore entry (or the manifest itself) is malformed.
    SuppressionConfigError,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::InternalRuleError => CODE_INTERNAL_RULE_ERROR,
            DiagnosticKind::StaleSuppression => CODE_STALE_SUPPRESSION,
            DiagnosticKind::SuppressionConfigError => CODE_SUPPRESSION_CONFIG_ERROR,
        }
    }
}

/// Out-of-band report entry. Diagnostics are never suppressible and never
/// affect the exit code.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: String,
    /// Rule code the diagnostic is about, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetFailureKind {
    /// A mandatory file or directory is missing.
    Structure,
    /// A file is not well-formed.
    Parse,
}

impl TargetFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetFailureKind::Structure => "structure",
            TargetFailureKind::Parse => "parse",
        }
    }
}

/// The single entry reported for a target that could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetFailure {
    pub kind: TargetFailureKind,
    pub path: String,
    pub message: String,
}

/// Lifecycle of one target. No transition re-enters an earlier phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TargetPhase {
    NotStarted,
    Parsing,
    ParseFailed,
    Parsed,
    Evaluating,
    Reconciling,
    Reported,
}

impl TargetPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetPhase::NotStarted => "not_started",
            TargetPhase::Parsing => "parsing",
            TargetPhase::ParseFailed => "parse_failed",
            TargetPhase::Parsed => "parsed",
            TargetPhase::Evaluating => "evaluating",
            TargetPhase::Reconciling => "reconciling",
            TargetPhase::Reported => "reported",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TargetPhase::ParseFailed | TargetPhase::Reported)
    }

    pub fn can_advance_to(self, next: TargetPhase) -> bool {
        matches!(
            (self, next),
            (TargetPhase::NotStarted, TargetPhase::Parsing)
                | (TargetPhase::Parsing, TargetPhase::ParseFailed)
                | (TargetPhase::Parsing, TargetPhase::Parsed)
                | (TargetPhase::Parsed, TargetPhase::Evaluating)
                | (TargetPhase::Evaluating, TargetPhase::Reconciling)
                | (TargetPhase::Reconciling, TargetPhase::Reported)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    #[default]
    Error,
    Warning,
    Never,
}

impl FailOn {
    pub fn as_str(self) -> &'static str {
        match self {
            FailOn::Error => "error",
            FailOn::Warning => "warning",
            FailOn::Never => "never",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct VerdictCounts {
    pub warning: u32,
    pub error: u32,
    /// Findings removed by the ignore manifest.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub suppressed: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub diagnostics: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed_targets: u32,
}

impl VerdictCounts {
    pub fn absorb(&mut self, other: &VerdictCounts) {
        self.warning = self.warning.saturating_add(other.warning);
        self.error = self.error.saturating_add(other.error);
        self.suppressed = self.suppressed.saturating_add(other.suppressed);
        self.diagnostics = self.diagnostics.saturating_add(other.diagnostics);
        self.failed_targets = self.failed_targets.saturating_add(other.failed_targets);
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub counts: VerdictCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Result of processing one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetReport {
    /// The target path as given on the command line.
    pub target: String,
    pub phase: TargetPhase,
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<TargetFailure>,
    pub counts: VerdictCounts,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rules_evaluated: u32,
}

/// Aggregated result of a whole invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub schema: String,
    pub tool: ToolMeta,
    pub targets: Vec<TargetReport>,
    pub verdict: Verdict,
}

/// The on-disk ignore manifest (`booklint-ignore.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IgnoreFile {
    #[serde(default)]
    pub ignore: Vec<IgnoreEntryConfig>,
}

/// One accepted, known violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IgnoreEntryConfig {
    /// Rule code to suppress.
    pub code: String,
    /// Glob matched against the file name, or against the target-relative
    /// path when it contains `/`.
    pub path: String,
    /// Optional substring that must appear in the finding's message or locator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Why the violation is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
