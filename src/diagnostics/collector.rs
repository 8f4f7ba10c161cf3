use std::fmt::Write as _;

use is_terminal::IsTerminal;

use super::diagnostic::Diagnostic;
use super::severity::Severity;
use crate::source::SourceBuffer;

/// Number of lines of surrounding source shown above and below a diagnostic's
/// line when rendering with context.
const CONTEXT_LINES: u32 = 4;

/// Accumulates diagnostics over the lifetime of a compilation session and
/// renders them for display.
///
/// Renders ANSI-colorized, caret-annotated source context by hand rather
/// than pulling in a terminal styling crate.
#[derive(Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    had_error: bool,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.had_error = true;
        }
        self.entries.push(diagnostic);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Renders every collected diagnostic against `buffer`, with ANSI color
    /// only when stdout is a real terminal.
    pub fn render(&self, buffer: &SourceBuffer) -> String {
        let color = std::io::stdout().is_terminal();
        let mut out = String::new();
        for diag in &self.entries {
            self.render_one(&mut out, diag, buffer, color);
        }
        out
    }

    fn render_one(&self, out: &mut String, diag: &Diagnostic, buffer: &SourceBuffer, color: bool) {
        let header = if color {
            format!(
                "\x1b[1;{}m{}[{}]\x1b[0m: {}",
                diag.severity.color_code(),
                diag.severity,
                diag.code,
                diag.message
            )
        } else {
            format!("{}[{}]: {}", diag.severity, diag.code, diag.message)
        };

        if let Some(location) = diag.location {
            let _ = writeln!(out, "{}:{}: {}", buffer.name(), location.position, header);
            let line = location.position.line;
            let start = line.saturating_sub(CONTEXT_LINES).max(1);
            let end = (line + CONTEXT_LINES).min(buffer.line_count());
            for l in start..=end {
                let text = buffer.line_text(l);
                let _ = writeln!(out, "{:>5} | {}", l, text);
                if l == line {
                    let caret_col = location.position.column.saturating_sub(1) as usize;
                    let underline_len = location.len().max(1) as usize;
                    let mut marker = String::new();
                    marker.push_str(&" ".repeat(caret_col));
                    marker.push_str(&"^".repeat(underline_len));
                    if color {
                        let _ = writeln!(
                            out,
                            "      | \x1b[1;{}m{}\x1b[0m",
                            diag.severity.color_code(),
                            marker
                        );
                    } else {
                        let _ = writeln!(out, "      | {}", marker);
                    }
                }
            }
        } else {
            let _ = writeln!(out, "{}", header);
        }

        if let Some(details) = &diag.details {
            let _ = writeln!(out, "      = {}", details);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::code::DiagnosticCode;

    #[test]
    fn had_error_tracks_only_error_severity() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning(DiagnosticCode::UnexpectedCharacter, "hm"));
        assert!(!diags.had_error());
        diags.push(Diagnostic::error(DiagnosticCode::UnexpectedToken, "bad"));
        assert!(diags.had_error());
    }

    #[test]
    fn render_includes_message_and_code() {
        let buffer = SourceBuffer::new("t.vl", "let x = 1\n".to_string());
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::error(DiagnosticCode::UnexpectedToken, "boom"));
        let rendered = diags.render(&buffer);
        assert!(rendered.contains("boom"));
        assert!(rendered.contains("E0009"));
    }
}
