use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    /// ANSI SGR code used when rendering to a terminal.
    pub fn color_code(self) -> &'static str {
        match self {
            Severity::Note => "36",    // cyan
            Severity::Warning => "33", // yellow
            Severity::Error => "31",   // red
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
