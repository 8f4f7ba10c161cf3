use super::token::{NumberSize, NumberToken, NumberType, Radix};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source::SourceBuffer;

/// Narrows a decoded integer magnitude to the smallest sufficient width:
/// every integer literal is minimized once lexing finishes.
fn narrow_integer(value: u64, negative: bool) -> (NumberSize, bool) {
    if negative {
        let signed = -(value as i128);
        if signed >= i8::MIN as i128 && signed <= i8::MAX as i128 {
            (NumberSize::Byte, true)
        } else if signed >= i16::MIN as i128 && signed <= i16::MAX as i128 {
            (NumberSize::Word, true)
        } else if signed >= i32::MIN as i128 && signed <= i32::MAX as i128 {
            (NumberSize::Dword, true)
        } else {
            (NumberSize::Qword, true)
        }
    } else if value <= u8::MAX as u64 {
        (NumberSize::Byte, false)
    } else if value <= u16::MAX as u64 {
        (NumberSize::Word, false)
    } else if value <= u32::MAX as u64 {
        (NumberSize::Dword, false)
    } else {
        (NumberSize::Qword, false)
    }
}

fn narrow_float(value: f64) -> NumberSize {
    if (value as f32) as f64 == value {
        NumberSize::Dword
    } else {
        NumberSize::Qword
    }
}

struct Scan {
    digits: String,
    saw_dot: bool,
    saw_exponent: bool,
    imaginary: bool,
}

/// Reads the run of digits (with `_` separators skipped), optional `.`
/// fraction, optional `e[+|-]digits` exponent, and optional trailing `i`,
/// constrained to `is_digit`. Does not consume a leading sign; the decimal
/// sub-tokenizer handles that itself via the `-0`..`-9` trie entries.
fn scan_digits(buffer: &mut SourceBuffer, is_digit: impl Fn(char) -> bool, allow_float: bool) -> Scan {
    let mut digits = String::new();
    let mut saw_dot = false;
    let mut saw_exponent = false;
    let mut imaginary = false;

    loop {
        let rune = buffer.current();
        if rune.value == '_' {
            buffer.next();
            continue;
        }
        if is_digit(rune.value) {
            digits.push(rune.value);
            buffer.next();
            continue;
        }
        if allow_float && rune.value == '.' && !saw_dot && !saw_exponent {
            let next = buffer.peek(1);
            if next.value == '.' {
                break; // `..` range operator, not a fraction.
            }
            saw_dot = true;
            digits.push('.');
            buffer.next();
            continue;
        }
        if allow_float && (rune.value == 'e' || rune.value == 'E') && !saw_exponent {
            let sign = buffer.peek(1);
            let after_sign_index = if sign.value == '+' || sign.value == '-' { 2 } else { 1 };
            let first_exp_digit = buffer.peek(after_sign_index);
            if first_exp_digit.is_digit() {
                saw_exponent = true;
                digits.push('e');
                buffer.next();
                if sign.value == '+' || sign.value == '-' {
                    digits.push(sign.value);
                    buffer.next();
                }
                continue;
            }
            break;
        }
        break;
    }

    if buffer.current().value == 'i' {
        imaginary = true;
        buffer.next();
    }

    Scan { digits, saw_dot, saw_exponent, imaginary }
}

fn finish(
    start: usize,
    buffer: &mut SourceBuffer,
    radix: Radix,
    scan: Scan,
) -> Result<NumberToken, Diagnostic> {
    if buffer.current().is_identifier_continuation() && !buffer.current().is_digit() {
        return Err(Diagnostic::error(
            DiagnosticCode::InvalidNumberLiteral,
            "unexpected letter after number literal",
        ));
    }

    let is_float = scan.saw_dot || scan.saw_exponent;
    if is_float {
        if radix != Radix::Decimal {
            return Err(Diagnostic::error(
                DiagnosticCode::InvalidNumberLiteral,
                "floating-point literals must be decimal",
            ));
        }
        let value: f64 = scan
            .digits
            .parse()
            .map_err(|_| Diagnostic::error(DiagnosticCode::InvalidNumberLiteral, "malformed floating-point literal"))?;
        return Ok(NumberToken {
            kind: NumberType::FloatingPoint,
            radix,
            size: narrow_float(value),
            is_signed: value.is_sign_negative(),
            imaginary: scan.imaginary,
            int_value: 0,
            float_value: value,
        });
    }

    if scan.digits.is_empty() {
        let _ = start;
        return Err(Diagnostic::error(DiagnosticCode::InvalidNumberLiteral, "empty number literal"));
    }

    let value = u64::from_str_radix(&scan.digits, radix as u32)
        .map_err(|_| Diagnostic::error(DiagnosticCode::NumberLiteralOverflow, "integer literal out of range"))?;
    let (size, is_signed) = narrow_integer(value, false);
    Ok(NumberToken {
        kind: NumberType::Integer,
        radix,
        size,
        is_signed,
        imaginary: scan.imaginary,
        int_value: value,
        float_value: 0.0,
    })
}

pub fn lex_decimal_number(buffer: &mut SourceBuffer, negative: bool) -> Result<NumberToken, Diagnostic> {
    let start = buffer.index();
    let scan = scan_digits(buffer, |c| c.is_ascii_digit(), true);
    let mut token = finish(start, buffer, Radix::Decimal, scan)?;
    if negative {
        if token.kind == NumberType::Integer {
            let (size, _) = narrow_integer(token.int_value, true);
            token.size = size;
            token.is_signed = true;
            token.int_value = (token.int_value as i64).wrapping_neg() as u64;
        } else {
            token.float_value = -token.float_value;
        }
    }
    Ok(token)
}

pub fn lex_hex_number(buffer: &mut SourceBuffer) -> Result<NumberToken, Diagnostic> {
    let start = buffer.index();
    let scan = scan_digits(buffer, |c| c.is_ascii_hexdigit(), false);
    finish(start, buffer, Radix::Hex, scan)
}

pub fn lex_octal_number(buffer: &mut SourceBuffer) -> Result<NumberToken, Diagnostic> {
    let start = buffer.index();
    let scan = scan_digits(buffer, |c| matches!(c, '0'..='7'), false);
    finish(start, buffer, Radix::Octal, scan)
}

pub fn lex_binary_number(buffer: &mut SourceBuffer) -> Result<NumberToken, Diagnostic> {
    let start = buffer.index();
    let scan = scan_digits(buffer, |c| matches!(c, '0' | '1'), false);
    finish(start, buffer, Radix::Binary, scan)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn narrows_small_unsigned_to_byte() {
        let mut buf = SourceBuffer::new("t", "200".to_string());
        let token = lex_decimal_number(&mut buf, false).unwrap();
        assert_eq!(token.size, NumberSize::Byte);
        assert_eq!(token.int_value, 200);
    }

    #[test]
    fn narrows_large_unsigned_to_qword() {
        let mut buf = SourceBuffer::new("t", "5000000000".to_string());
        let token = lex_decimal_number(&mut buf, false).unwrap();
        assert_eq!(token.size, NumberSize::Qword);
    }

    #[test]
    fn underscores_are_skipped() {
        let mut buf = SourceBuffer::new("t", "1_000".to_string());
        let token = lex_decimal_number(&mut buf, false).unwrap();
        assert_eq!(token.int_value, 1000);
    }

    #[test]
    fn promotes_to_float_on_dot() {
        let mut buf = SourceBuffer::new("t", "3.5".to_string());
        let token = lex_decimal_number(&mut buf, false).unwrap();
        assert_eq!(token.kind, NumberType::FloatingPoint);
        assert_eq!(token.float_value, 3.5);
    }

    #[test]
    fn hex_number_reads_expected_value() {
        let mut buf = SourceBuffer::new("t", "FF".to_string());
        let token = lex_hex_number(&mut buf).unwrap();
        assert_eq!(token.int_value, 255);
    }

    #[test]
    fn rejects_letter_immediately_after_digits() {
        let mut buf = SourceBuffer::new("t", "12x".to_string());
        assert!(lex_decimal_number(&mut buf, false).is_err());
    }

    #[test]
    fn marks_imaginary_suffix() {
        let mut buf = SourceBuffer::new("t", "5i".to_string());
        let token = lex_decimal_number(&mut buf, false).unwrap();
        assert!(token.imaginary);
    }
}
