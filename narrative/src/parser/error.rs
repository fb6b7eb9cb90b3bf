use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// What went wrong. Fatal kinds abort the parse; the rest are reported as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("incorrectly formatted frontmatter")]
    FrontMatter,
    #[error("invalid dataset URL")]
    InvalidDatasetUrl,
    #[error("malformed section heading")]
    MalformedHeading,
    #[error("unsupported front matter")]
    Unsupported,
    #[error("unclosed fenced block")]
    UnclosedFence,
    #[error("duplicate main display block")]
    DuplicateMainDisplay,
    #[error("invalid parser configuration")]
    Config,
}

/// Parse errors with source location information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(
        kind: ParseErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn warning(
        kind: ParseErrorKind,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            span,
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Move the span by `offset` bytes. Used when a sub-slice was parsed.
    pub fn shifted(mut self, offset: usize) -> Self {
        self.span = self.span.start + offset..self.span.end + offset;
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
