use super::location::{Position, SourceLocation};
use super::rune::Rune;
use crate::diagnostics::{Diagnostic, DiagnosticCode};

/// Byte offset + resolved line number of a newline, used to binary-search
/// `line_by_index`.
#[derive(Clone, Copy, Debug)]
struct LineStart {
    byte_offset: u32,
    line: u32,
}

/// Owns the decoded source text and a rune-granular cursor over it.
///
/// Every accessor is bounds-checked and returns an error rather than
/// panicking; the unit of iteration is a decoded `char` (rune) rather than
/// a raw byte, since the lexer operates on Unicode scalar values.
pub struct SourceBuffer {
    text: String,
    /// Byte offset of each rune boundary, `runes.len() + 1` entries (the
    /// last entry is the end-of-buffer sentinel).
    rune_offsets: Vec<u32>,
    position: usize,
    /// Saved cursor positions, pushed/popped by the lexer when it needs to
    /// backtrack (e.g. speculative number-literal parsing).
    marks: Vec<usize>,
    /// Width (in runes) of each successive `next()` call, so `prev()` can
    /// step backward without recomputing UTF-8 boundaries.
    widths: Vec<u8>,
    line_starts: Vec<LineStart>,
    name: String,
    /// Diagnostics raised by construction-time validation and by
    /// out-of-bounds cursor moves, drained by the session once per phase.
    pending: Vec<Diagnostic>,
}

impl SourceBuffer {
    pub fn new(name: impl Into<String>, mut text: String) -> SourceBuffer {
        if !text.ends_with('\n') {
            text.push('\n');
        }

        let mut rune_offsets = Vec::with_capacity(text.len() + 1);
        let mut line_starts = vec![LineStart { byte_offset: 0, line: 1 }];
        let mut line = 1u32;
        for (offset, ch) in text.char_indices() {
            rune_offsets.push(offset as u32);
            if ch == '\n' {
                line += 1;
                line_starts.push(LineStart {
                    byte_offset: offset as u32 + 1,
                    line,
                });
            }
        }
        rune_offsets.push(text.len() as u32);

        let mut buffer = SourceBuffer {
            text,
            rune_offsets,
            position: 0,
            marks: Vec::new(),
            widths: Vec::new(),
            line_starts,
            name: name.into(),
            pending: Vec::new(),
        };
        buffer.validate();
        buffer
    }

    /// Scans the decoded text for an embedded NUL byte or a byte-order mark
    /// anywhere past the first rune, recording each as a diagnostic rather
    /// than rejecting the load outright.
    fn validate(&mut self) {
        for index in 0..self.len() {
            let rune = self.rune_at(index);
            if rune.value == '\u{0}' {
                let location = self.location_at(index);
                self.pending.push(
                    Diagnostic::error(DiagnosticCode::IllegalNulByte, "embedded NUL byte in source")
                        .with_location(location),
                );
            } else if rune == Rune::BOM && index != 0 {
                let location = self.location_at(index);
                self.pending.push(
                    Diagnostic::error(
                        DiagnosticCode::IllegalByteOrderMark,
                        "byte-order mark is only valid at the start of a file",
                    )
                    .with_location(location),
                );
            }
        }
    }

    fn location_at(&self, index: usize) -> SourceLocation {
        let start = self.byte_offset(index);
        let end = self.byte_offset(index + 1);
        SourceLocation::new(start, end, self.position_for(index))
    }

    /// Drains diagnostics accumulated since the last call: validation
    /// findings from construction plus any out-of-bounds cursor moves.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.pending)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rune_offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> usize {
        self.position
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.len()
    }

    fn rune_at(&self, index: usize) -> Rune {
        if index >= self.len() {
            return Rune::EOF;
        }
        let start = self.rune_offsets[index] as usize;
        let end = self.rune_offsets[index + 1] as usize;
        let slice = &self.text[start..end];
        Rune::new(slice.chars().next().unwrap(), (end - start) as u8)
    }

    pub fn current(&self) -> Rune {
        self.rune_at(self.position)
    }

    pub fn peek(&self, ahead: usize) -> Rune {
        self.rune_at(self.position + ahead)
    }

    /// Advances the cursor by one rune and returns the rune that was current
    /// before the advance. Attempting to advance past the end-of-buffer
    /// sentinel is reported rather than silently ignored.
    pub fn next(&mut self) -> Rune {
        let rune = self.current();
        if rune.is_eof() {
            let location = self.location_at(self.position);
            self.pending.push(
                Diagnostic::error(DiagnosticCode::AdvancePastEnd, "attempted to advance past end of buffer")
                    .with_location(location),
            );
            return rune;
        }
        self.position += 1;
        self.widths.push(1);
        rune
    }

    /// Steps the cursor backward by one rune. Only valid immediately after a
    /// `next()` whose width has not yet been popped by another `prev()`;
    /// rewinding past the beginning is reported rather than silently
    /// no-op'd.
    pub fn prev(&mut self) -> Rune {
        match self.widths.pop() {
            Some(_width) => {
                if self.position > 0 {
                    self.position -= 1;
                }
            }
            None => {
                let location = self.location_at(self.position);
                self.pending.push(
                    Diagnostic::error(
                        DiagnosticCode::AdvancePastBeginning,
                        "attempted to rewind past beginning of buffer",
                    )
                    .with_location(location),
                );
            }
        }
        self.current()
    }

    pub fn push_mark(&mut self) {
        self.marks.push(self.position);
    }

    pub fn pop_mark(&mut self) -> usize {
        self.marks.pop().unwrap_or(self.position)
    }

    /// Restores the cursor to the most recently pushed mark without popping
    /// it, for speculative re-reads.
    pub fn restore_top(&mut self) {
        if let Some(&mark) = self.marks.last() {
            self.position = mark;
            self.widths.clear();
        }
    }

    /// Pops the most recently pushed mark and rewinds the cursor to it.
    pub fn rewind_to_mark(&mut self) {
        let mark = self.pop_mark();
        self.position = mark;
        self.widths.clear();
    }

    pub fn byte_offset(&self, rune_index: usize) -> u32 {
        self.rune_offsets[rune_index.min(self.rune_offsets.len() - 1)]
    }

    /// O(log n) lookup of the 1-based line number containing a given byte
    /// offset, via binary search over pre-computed newline positions.
    pub fn line_by_index(&self, byte_offset: u32) -> u32 {
        match self
            .line_starts
            .binary_search_by_key(&byte_offset, |l| l.byte_offset)
        {
            Ok(i) => self.line_starts[i].line,
            Err(i) => self.line_starts[i - 1].line,
        }
    }

    pub fn position_for(&self, rune_index: usize) -> Position {
        let byte_offset = self.byte_offset(rune_index);
        let line = self.line_by_index(byte_offset);
        let line_start_byte = self.line_starts[(line - 1) as usize].byte_offset;
        let column = (byte_offset - line_start_byte) + 1;
        Position::new(line, column)
    }

    /// Returns the raw source text for one line (1-based), without its
    /// trailing newline.
    pub fn line_text(&self, line: u32) -> &str {
        let idx = (line - 1) as usize;
        if idx >= self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[idx].byte_offset as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|l| l.byte_offset as usize - 1)
            .unwrap_or(self.text.len());
        self.text[start..end.max(start)].trim_end_matches('\n')
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Extracts the source text between two rune indices.
    pub fn substring(&self, start: usize, end: usize) -> &str {
        let byte_start = self.byte_offset(start) as usize;
        let byte_end = self.byte_offset(end) as usize;
        &self.text[byte_start..byte_end]
    }

    pub fn make_slice(&self, start: usize, end: usize) -> String {
        self.substring(start, end).to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn appends_synthetic_trailing_newline() {
        let buf = SourceBuffer::new("t", "x".to_string());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn line_by_index_matches_manual_count() {
        let buf = SourceBuffer::new("t", "a\nbb\nccc".to_string());
        assert_eq!(buf.line_by_index(0), 1);
        assert_eq!(buf.line_by_index(2), 2);
        assert_eq!(buf.line_by_index(5), 3);
    }

    #[test]
    fn cursor_next_and_prev_roundtrip() {
        let mut buf = SourceBuffer::new("t", "ab".to_string());
        let a = buf.next();
        let b = buf.next();
        assert_eq!(a.value, 'a');
        assert_eq!(b.value, 'b');
        buf.prev();
        assert_eq!(buf.current().value, 'b');
    }

    #[test]
    fn marks_restore_cursor_position() {
        let mut buf = SourceBuffer::new("t", "abc".to_string());
        buf.next();
        buf.push_mark();
        buf.next();
        buf.next();
        buf.rewind_to_mark();
        assert_eq!(buf.current().value, 'b');
    }

    #[test]
    fn substring_extracts_expected_text() {
        let buf = SourceBuffer::new("t", "hello world".to_string());
        assert_eq!(buf.substring(0, 5), "hello");
    }

    #[test]
    fn embedded_nul_byte_is_reported() {
        let mut buf = SourceBuffer::new("t", "a\u{0}b".to_string());
        let diags = buf.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::IllegalNulByte);
    }

    #[test]
    fn bom_at_start_is_not_reported() {
        let mut buf = SourceBuffer::new("t", "\u{FEFF}x".to_string());
        assert!(buf.take_diagnostics().is_empty());
    }

    #[test]
    fn bom_past_start_is_reported() {
        let mut buf = SourceBuffer::new("t", "x\u{FEFF}y".to_string());
        let diags = buf.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::IllegalByteOrderMark);
    }

    #[test]
    fn advancing_past_end_is_reported() {
        let mut buf = SourceBuffer::new("t", "a".to_string());
        while !buf.at_end() {
            buf.next();
        }
        buf.next();
        let diags = buf.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::AdvancePastEnd);
    }

    #[test]
    fn rewinding_past_beginning_is_reported() {
        let mut buf = SourceBuffer::new("t", "ab".to_string());
        buf.prev();
        let diags = buf.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::AdvancePastBeginning);
    }
}
