//! Structured load diagnostics.
//!
//! Non-fatal problems found while loading a document (a missing layer blob,
//! a corrupt tile, a duplicate uuid) are recorded here and carried by the
//! [`Document`](crate::Document) instead of being hidden behind a global
//! verbosity switch. Fatal problems are returned as [`Error`](crate::Error)s.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was skipped or substituted; the document is still usable.
    Warning,
    /// A layer or tile set was abandoned part-way through.
    Error,
}

/// One non-fatal problem found during load.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Layer name or tile index the problem was found in, when known.
    pub context: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{:?}: {}", ctx, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Collected diagnostics for one load.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, context: impl Into<Option<String>>, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            context: context.into(),
            message: message.into(),
        });
    }

    /// Record a non-fatal error.
    pub fn error(&mut self, context: impl Into<Option<String>>, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut diags = Diagnostics::new();
        diags.warn(None, "first");
        diags.error(Some("layer A".to_string()), "second");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.as_slice()[0].severity, Severity::Warning);
        assert_eq!(diags.as_slice()[1].severity, Severity::Error);
        assert!(diags.as_slice()[1].to_string().contains("layer A"));
    }
}
