//! Sinks for lexical diagnostics.
//!
//! The scanner never stops on a malformed lexeme; it hands a line number and
//! message to a [`Reporter`] and carries on. Whether a pass that produced
//! reports should halt the pipeline is left to whoever holds the reporter.

use std::{io::Write, slice};

pub trait Reporter {
    fn report(&mut self, line: usize, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, line: usize, message: &str) {
        (**self).report(line, message)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

/// Collects every report in the order it was made.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, line: usize, message: &str) {
        self.entries.push(Diagnostic { line, message: message.to_string() });
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Writes `[line N] Error: message` for each report and keeps a count.
pub struct WriteReporter<W> {
    out: W,
    errors: usize,
}

impl<W: Write> WriteReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, errors: 0 }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn had_error(&self) -> bool {
        self.errors > 0
    }

    pub fn reset(&mut self) {
        self.errors = 0;
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for WriteReporter<W> {
    fn report(&mut self, line: usize, message: &str) {
        self.errors += 1;
        // A broken sink must not interrupt the scan.
        let _ = writeln!(self.out, "[line {}] Error: {}", line, message);
    }
}
