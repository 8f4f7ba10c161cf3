use super::code::DiagnosticCode;
use super::severity::Severity;
use crate::source::SourceLocation;

/// A single diagnostic message, optionally anchored to a source location.
///
/// A small, serializable data struct rather than an exception: diagnostics
/// are values collected into a `Diagnostics` bag rather than thrown.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub details: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            code,
            severity,
            message: message.into(),
            location: None,
            details: None,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, Severity::Error, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, Severity::Warning, message)
    }

    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, Severity::Note, message)
    }

    pub fn with_location(mut self, location: SourceLocation) -> Diagnostic {
        self.location = Some(location);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Diagnostic {
        self.details = Some(details.into());
        self
    }
}
