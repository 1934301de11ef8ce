//! Per-file and per-build reports.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use swc_common::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A recovered problem inside one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Byte offsets of the affected node.
    pub lo: u32,
    pub hi: u32,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            lo: span.lo.0,
            hi: span.hi.0,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level} [{}..{}]: {}", self.lo, self.hi, self.message)
    }
}

/// Why names were left unchanged. Only filled when explanations are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeptNamesReport {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl KeptNamesReport {
    pub fn record(&mut self, name: &str, reason: impl fmt::Display) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .insert(reason.to_string());
    }

    #[must_use]
    pub fn reasons(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn merge(&mut self, other: KeptNamesReport) {
        for (name, reasons) in other.entries {
            self.entries.entry(name).or_default().extend(reasons);
        }
    }
}

/// Outcome of mangling one file.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub renamed: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Keys whose name was reused from the previous build.
    pub from_history: Vec<String>,
    #[serde(skip_serializing_if = "KeptNamesReport::is_empty")]
    pub kept: KeptNamesReport,
}

impl FileReport {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// A file that produced no output.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub message: String,
}

/// Aggregate of every file processed in one build.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    #[serde(skip_serializing_if = "KeptNamesReport::is_empty")]
    pub kept_names: KeptNamesReport,
}

impl BuildReport {
    pub fn push(&mut self, mut file: FileReport) {
        self.kept_names.merge(std::mem::take(&mut file.kept));
        self.files.push(file);
    }

    #[must_use]
    pub fn renamed_total(&self) -> usize {
        self.files.iter().map(|f| f.renamed).sum()
    }

    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::other(e.to_string()))
    }
}
