use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source::SourceBuffer;

const STRUCTURAL_ESCAPES: &[char] = &['\\', '"', 'a', 'b', 'e', 'n', 'r', 't', 'v', '\''];

/// Scans a `"..."` string literal, validating escape sequences *lexically*
/// (length and digit-class only); the escape's decoded value is produced
/// later by `escape::decode` on the returned body text.
///
/// Assumes the opening `"` has already been consumed.
pub fn lex_string_literal(buffer: &mut SourceBuffer) -> Result<String, Diagnostic> {
    let mut body = String::new();
    loop {
        let rune = buffer.current();
        if rune.is_eof() {
            return Err(Diagnostic::error(
                DiagnosticCode::UnterminatedString,
                "unterminated string literal",
            ));
        }
        if rune.value == '"' {
            buffer.next();
            return Ok(body);
        }
        if rune.value == '\\' {
            body.push(buffer.next().value);
            validate_escape(buffer, &mut body)?;
            continue;
        }
        body.push(buffer.next().value);
    }
}

fn validate_escape(buffer: &mut SourceBuffer, body: &mut String) -> Result<(), Diagnostic> {
    let escape = buffer.current();
    if escape.is_eof() {
        return Err(Diagnostic::error(DiagnosticCode::UnterminatedString, "unterminated escape sequence"));
    }

    match escape.value {
        'x' => {
            body.push(buffer.next().value);
            expect_hex_digits(buffer, body, 2)
        }
        'u' => {
            body.push(buffer.next().value);
            expect_hex_digits(buffer, body, 4)
        }
        'U' => {
            body.push(buffer.next().value);
            expect_hex_digits(buffer, body, 8)
        }
        '0'..='9' => {
            for _ in 0..3 {
                if buffer.current().is_digit() {
                    body.push(buffer.next().value);
                } else {
                    break;
                }
            }
            Ok(())
        }
        c if STRUCTURAL_ESCAPES.contains(&c) => {
            body.push(buffer.next().value);
            Ok(())
        }
        other => Err(Diagnostic::error(
            DiagnosticCode::InvalidEscapeSequence,
            format!("unknown escape sequence '\\{}'", other),
        )),
    }
}

fn expect_hex_digits(buffer: &mut SourceBuffer, body: &mut String, count: usize) -> Result<(), Diagnostic> {
    for _ in 0..count {
        let rune = buffer.current();
        if !rune.is_xdigit() {
            return Err(Diagnostic::error(
                DiagnosticCode::InvalidEscapeSequence,
                "expected hex digit in escape sequence",
            ));
        }
        body.push(buffer.next().value);
    }
    Ok(())
}

/// Scans a `{{ ... }}` block literal body, requiring the matching `}}`.
pub fn lex_block_literal(buffer: &mut SourceBuffer) -> Result<String, Diagnostic> {
    let mut body = String::new();
    loop {
        let rune = buffer.current();
        if rune.is_eof() {
            return Err(Diagnostic::error(
                DiagnosticCode::UnterminatedBlockLiteral,
                "unterminated block literal",
            ));
        }
        if rune.value == '}' && buffer.peek(1).value == '}' {
            buffer.next();
            buffer.next();
            return Ok(body);
        }
        body.push(buffer.next().value);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scans_simple_string() {
        let mut buf = SourceBuffer::new("t", "hello\"".to_string());
        let body = lex_string_literal(&mut buf).unwrap();
        assert_eq!(body, "hello");
    }

    #[test]
    fn accepts_structural_escape() {
        let mut buf = SourceBuffer::new("t", r#"a\nb""#.to_string());
        let body = lex_string_literal(&mut buf).unwrap();
        assert_eq!(body, r"a\nb");
    }

    #[test]
    fn rejects_unterminated_string() {
        let mut buf = SourceBuffer::new("t", "abc".to_string());
        assert!(lex_string_literal(&mut buf).is_err());
    }

    #[test]
    fn validates_hex_escape_length() {
        let mut buf = SourceBuffer::new("t", r#"\xG""#.to_string());
        assert!(lex_string_literal(&mut buf).is_err());
    }

    #[test]
    fn block_literal_requires_double_close() {
        let mut buf = SourceBuffer::new("t", "text}}".to_string());
        let body = lex_block_literal(&mut buf).unwrap();
        assert_eq!(body, "text");
    }
}
