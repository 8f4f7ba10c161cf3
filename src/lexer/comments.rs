use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source::{SourceBuffer, SourceLocation};

use super::token::BlockCommentToken;

/// Scans `// ...` or `-- ...` up to (not including) the newline.
pub fn lex_line_comment(buffer: &mut SourceBuffer) {
    loop {
        let rune = buffer.current();
        if rune.is_eof() || rune.value == '\n' {
            return;
        }
        buffer.next();
    }
}

/// Scans a `/* ... */` comment, recursing on nested `/*` so each nesting
/// level produces its own captured span.
pub fn lex_block_comment(buffer: &mut SourceBuffer, loc_of: impl Fn(usize, usize, &SourceBuffer) -> SourceLocation + Copy) -> Result<BlockCommentToken, Diagnostic> {
    let start = buffer.index();
    let mut children = Vec::new();

    loop {
        let rune = buffer.current();
        if rune.is_eof() {
            return Err(Diagnostic::error(
                DiagnosticCode::UnterminatedBlockComment,
                "unterminated block comment",
            ));
        }
        if rune.value == '*' && buffer.peek(1).value == '/' {
            buffer.next();
            buffer.next();
            let end = buffer.index();
            return Ok(BlockCommentToken { capture: loc_of(start, end, buffer), children });
        }
        if rune.value == '/' && buffer.peek(1).value == '*' {
            buffer.next();
            buffer.next();
            children.push(lex_block_comment(buffer, loc_of)?);
            continue;
        }
        buffer.next();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::Position;

    fn dummy_loc(start: usize, end: usize, _buffer: &SourceBuffer) -> SourceLocation {
        SourceLocation::new(start as u32, end as u32, Position::new(1, 1))
    }

    #[test]
    fn line_comment_stops_before_newline() {
        let mut buf = SourceBuffer::new("t", "rest\nmore".to_string());
        lex_line_comment(&mut buf);
        assert_eq!(buf.current().value, '\n');
    }

    #[test]
    fn block_comment_captures_nesting() {
        let mut buf = SourceBuffer::new("t", "a /* b */ c*/".to_string());
        let token = lex_block_comment(&mut buf, dummy_loc).unwrap();
        assert_eq!(token.children.len(), 1);
    }

    #[test]
    fn unterminated_block_comment_errors() {
        let mut buf = SourceBuffer::new("t", "never closed".to_string());
        assert!(lex_block_comment(&mut buf, dummy_loc).is_err());
    }
}
