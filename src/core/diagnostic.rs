//! Compiler diagnostic lines
//!
//! The external compiler reports diagnostics as single lines of the form
//! `program: file: line: code: severity: message`. Fields are separated by
//! `": "` (colon-space), which keeps colons inside messages intact as long
//! as they are not followed by a space. Exactly six fields are required;
//! anything else is not a diagnostic and produces no record.

use std::fmt;

use serde::Serialize;

use crate::core::resource::ResourceId;

/// Field separator of the diagnostic grammar
const SEPARATOR: &str = ": ";

/// Number of fields in a well-formed diagnostic line
const FIELD_COUNT: usize = 6;

/// One parsed compiler diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Reporting program name (first field)
    pub program: String,
    /// File the diagnostic refers to, as printed by the compiler
    pub file_name: String,
    /// Reported line number; may be non-positive for file-level messages
    pub line: i64,
    /// Numeric error code
    pub code: i64,
    /// Severity label as printed by the compiler
    pub severity: String,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Parse one line of compiler output
    ///
    /// Returns `None` for lines that do not match the six-field grammar
    /// or whose line/code fields are not integers. Such lines are still
    /// worth echoing to the console; they just carry no structured data.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return None;
        }

        let line_number = fields[2].parse::<i64>().ok()?;
        let code = fields[3].parse::<i64>().ok()?;

        Some(Self {
            program: fields[0].to_string(),
            file_name: fields[1].to_string(),
            line: line_number,
            code,
            severity: fields[4].to_string(),
            message: fields[5].to_string(),
        })
    }

    /// Severity mapped for problem reporting
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_label(&self.severity)
    }

    /// Best-effort character span of the offending token
    ///
    /// Given the source text and the compiler's caret line (spaces plus a
    /// `^` under the offending column), counts characters up to the
    /// diagnostic's line, adds the caret column, and extends the span
    /// while characters are alphanumeric. Advisory only.
    #[must_use]
    pub fn resolve_span(&self, source: &str, caret_line: &str) -> Option<Span> {
        if self.line < 1 {
            return None;
        }
        let line_index = usize::try_from(self.line).ok()? - 1;
        let column = caret_line.find('^')?;

        let lines: Vec<&str> = source.split('\n').collect();
        let target = lines.get(line_index)?;

        let offset: usize = lines[..line_index].iter().map(|l| l.len() + 1).sum();
        let start = offset + column;

        let token_len = target
            .get(column..)
            .map_or(0, |rest| rest.chars().take_while(|c| c.is_alphanumeric()).count())
            .max(1);

        Some(Span {
            start,
            end: start + token_len,
        })
    }
}

/// Character span within a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Offset of the first character
    pub start: usize,
    /// Offset one past the last character
    pub end: usize,
}

/// Problem severity
///
/// The compiler's `error` label maps to [`Severity::Error`]; every other
/// label is reported as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Build-breaking problem
    Error,
    /// Advisory problem
    Warning,
}

impl Severity {
    /// Map a compiler severity label
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "error" {
            Self::Error
        } else {
            Self::Warning
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A diagnostic attached to a project resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Resource the problem is attached to
    pub resource: ResourceId,
    /// 1-based line number (non-positive diagnostic lines clamp to 1)
    pub line: u32,
    /// Mapped severity
    pub severity: Severity,
    /// Message text
    pub message: String,
}

impl Problem {
    /// Build a problem from a diagnostic resolved to a resource
    #[must_use]
    pub fn from_diagnostic(resource: ResourceId, diagnostic: &Diagnostic) -> Self {
        let line = u32::try_from(diagnostic.line.max(1)).unwrap_or(u32::MAX);
        Self {
            resource,
            line,
            severity: diagnostic.severity(),
            message: diagnostic.message.clone(),
        }
    }
}
