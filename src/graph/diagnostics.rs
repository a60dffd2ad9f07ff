//! Diagnostics
//!
//! Collects recoverable problems found while compiling a schema. Nothing in
//! here aborts a compilation; fatal problems are [`CompileError`]s.
//!
//! [`CompileError`]: crate::CompileError

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Constraint entry is missing keys or has no known kind
    MalformedConstraint,
    /// Constraint scope matched neither an element nor an object field
    UnresolvedConstraintScope,
    /// Entry is not a type shape (no `type`, no `$ref`) and was skipped
    IgnoredEntry,
    /// Reorder pass moved a type in front of its dependent
    TypeRelocated,
    /// Extractor synthesized a new top-level type
    TypeHoisted,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedConstraint => "W001",
            Self::UnresolvedConstraintScope => "W002",
            Self::IgnoredEntry => "I001",
            Self::TypeRelocated => "I002",
            Self::TypeHoisted => "I003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedConstraint | Self::UnresolvedConstraintScope => Severity::Warning,

            Self::IgnoredEntry | Self::TypeRelocated | Self::TypeHoisted => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// What the diagnostic is about (type name, constraint id, ...)
    pub subject: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Additional context (scope paths, positions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from the compiler stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item, mirroring it to the log
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Warning => tracing::warn!(code = %item.code, subject = %item.subject, "{}", item.message),
            Severity::Info => tracing::debug!(code = %item.code, subject = %item.subject, "{}", item.message),
        }
        self.items.push(item);
    }

    /// Constraint entry that could not be loaded
    pub fn malformed_constraint(&mut self, id: &str, reason: impl Into<String>) {
        self.push(DiagnosticItem::new(
            id,
            DiagnosticCode::MalformedConstraint,
            format!("failed to load constraint \"{}\": {}", id, reason.into()),
        ));
    }

    /// Constraint whose scope resolved to nothing
    pub fn unresolved_scope(&mut self, id: &str, scope: &str) {
        self.push(
            DiagnosticItem::new(
                id,
                DiagnosticCode::UnresolvedConstraintScope,
                format!("constraint scope \"{}\" not found", scope),
            )
            .with_context(format!("constraint: {}", id)),
        );
    }

    /// Entry skipped because it is not a type
    pub fn ignored_entry(&mut self, section: &str, name: &str) {
        self.push(DiagnosticItem::new(
            name,
            DiagnosticCode::IgnoredEntry,
            format!("entry \"{}\" in {} is not a type and was skipped", name, section),
        ));
    }

    /// Type moved by the reorder pass
    pub fn relocated(&mut self, name: &str, from: usize, to: usize) {
        self.push(DiagnosticItem::new(
            name,
            DiagnosticCode::TypeRelocated,
            format!("moving {} from {} to {}", name, from, to),
        ));
    }

    /// New top-level type synthesized from a nested node
    pub fn hoisted(&mut self, name: &str, origin: &str) {
        self.push(
            DiagnosticItem::new(
                name,
                DiagnosticCode::TypeHoisted,
                format!("hoisted nested type \"{}\"", name),
            )
            .with_context(format!("declared at: {}", origin)),
        );
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items with a given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    /// Get all items
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Get total count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format diagnostics at or above `min` for display
    pub fn format(&self, min: Severity) -> String {
        let mut output = String::new();

        for item in self.items.iter().filter(|i| i.severity() >= min) {
            output.push_str(&format!("{}\n", item));
        }

        if self.warning_count() > 0 {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(Severity::Info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::UnresolvedConstraintScope.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::TypeRelocated.severity(), Severity::Info);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.unresolved_scope("u1", "/elements/missing");
        diags.relocated("Point", 3, 1);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.all()[0].code, DiagnosticCode::UnresolvedConstraintScope);
        assert_eq!(diags.with_code(DiagnosticCode::TypeRelocated).count(), 1);
    }

    #[test]
    fn test_format_filters_by_severity() {
        let mut diags = Diagnostics::new();
        diags.malformed_constraint("k1", "missing key \"refer\"");
        diags.hoisted("string_array", "tags");

        let text = diags.format(Severity::Warning);
        assert!(text.contains("[W001]"));
        assert!(!text.contains("I003"));
    }
}
