// SPDX-License-Identifier: GPL-3.0-or-later

//! Structured compiler diagnostics.
//!
//! A [`Diagnostic`] is a tree: the primary complaint owns its notes, and
//! every note has the same shape as its parent. Producers (like a log
//! scraper) build it incrementally; consumers read it. There is no
//! validation and no derived computation here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A source line quoted by a diagnostic, with an optional caret line
/// marking the column range of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLine {
    pub line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub filename: String,
    /// 1-based, as the compiler reported it.
    pub line: u32,
    /// 1-based, as the compiler reported it.
    pub column: u32,
    pub message: String,
    #[serde(default)]
    pub notes: Vec<Diagnostic>,
    #[serde(default)]
    pub codelines: Vec<CodeLine>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(filename: impl Into<String>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
            message: message.into(),
            notes: Vec::new(),
            codelines: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Appends a note and returns it, so it can be populated further.
    pub fn add_note(
        &mut self,
        filename: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> &mut Diagnostic {
        self.notes.push(Diagnostic::new(filename, line, column, message));
        let last = self.notes.len() - 1;
        &mut self.notes[last]
    }

    pub fn add_code(&mut self, line: impl Into<String>, caret: Option<String>) {
        self.codelines.push(CodeLine { line: line.into(), caret });
    }

    pub fn add_suggestion(&mut self, line: impl Into<String>) {
        self.suggestions.push(line.into());
    }

    /// Iterates over this diagnostic and all nested notes, depth-first,
    /// parents before their notes.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Renders the location and the message: `file:line:column: message`.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.filename, self.line, self.column, self.message)
    }
}

/// Pre-order iterator returned by [`Diagnostic::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Diagnostic>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Diagnostic;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack.extend(current.notes.iter().rev());
        Some(current)
    }
}
