//! Per-build diagnostics sink.
//!
//! Non-fatal build conditions (unresolved references, missing sub-objects,
//! corrected encoding hazards) are reported here and never abort the build.

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Name of the project object the message is about, when known.
    pub object: Option<String>,
}

/// Collects diagnostics for a single build invocation.
///
/// Owned by the build context; never shared across builds.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>, object: Option<&str>) {
        self.push(Severity::Info, message, object);
    }

    pub fn warning(&mut self, message: impl Into<String>, object: Option<&str>) {
        self.push(Severity::Warning, message, object);
    }

    pub fn error(&mut self, message: impl Into<String>, object: Option<&str>) {
        self.push(Severity::Error, message, object);
    }

    fn push(&mut self, severity: Severity, message: impl Into<String>, object: Option<&str>) {
        self.entries.push(Diagnostic {
            severity,
            message: message.into(),
            object: object.map(str::to_string),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order_and_tracks_errors() {
        let mut diags = Diagnostics::new();
        diags.info("unused style: default", Some("default"));
        assert!(!diags.has_errors());

        diags.error("style not found", Some("w1"));
        assert!(diags.has_errors());
        assert_eq!(diags.entries().len(), 2);
        assert_eq!(diags.entries()[0].severity, Severity::Info);
        assert_eq!(diags.count(Severity::Error), 1);
    }
}
