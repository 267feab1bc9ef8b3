//! Positioned diagnostic reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Span;
use crate::error::CompilationError;

/// One diagnostic: source path, position (or `-1` when unknown) and message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    pub path: String,
    pub line: i32,
    pub column: i32,
    pub message: String,
    /// Diagnostic class, e.g. `AmbiguousOverload`.
    pub class: String,
}

impl Report {
    pub fn new(path: impl Into<String>, span: Option<Span>, class: &str, message: impl Into<String>) -> Self {
        let (line, column) = match span {
            Some(span) => (span.line as i32, span.col as i32),
            None => (-1, -1),
        };
        Self {
            path: path.into(),
            line,
            column,
            message: message.into(),
            class: class.to_string(),
        }
    }

    /// Report for a view-level failure at its best known position.
    pub fn from_error(path: impl Into<String>, error: &CompilationError) -> Self {
        Self::new(path, error.span(), error.class(), error.to_string())
    }

    pub fn has_position(&self) -> bool {
        self.line >= 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{}): {}", self.path, self.line, self.column, self.message)
    }
}

/// Reports in order of discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    reports: Vec<Report>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: Report) {
        self.reports.push(report);
    }

    pub fn extend(&mut self, reports: impl IntoIterator<Item = Report>) {
        self.reports.extend(reports);
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    pub fn first(&self) -> Option<&Report> {
        self.reports.first()
    }

    pub fn as_slice(&self) -> &[Report] {
        &self.reports
    }

    pub fn into_vec(self) -> Vec<Report> {
        self.reports
    }
}

impl From<Report> for Diagnostics {
    fn from(report: Report) -> Self {
        Self {
            reports: vec![report],
        }
    }
}

impl FromIterator<Report> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Report>>(iter: I) -> Self {
        Self {
            reports: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Report;
    type IntoIter = std::slice::Iter<'a, Report>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.iter()
    }
}
