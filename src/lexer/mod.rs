//! Tokenizes source text via a trie of lexemes plus a family of
//! sub-tokenizers for numbers, strings, block literals, and comments.
//!
//! Dispatch is rune-trie driven with a keyword gate; each token kind that
//! needs more than trie matching (numbers, strings, block literals,
//! comments) gets its own free function rather than one monolithic
//! tokenizer.

mod comments;
mod escape;
mod numbers;
mod strings;
mod token;
mod trie;

pub use escape::{decode as decode_escapes, EscapeError};
pub use token::{BlockCommentToken, NumberSize, NumberToken, NumberType, Radix, Token, TokenType};
pub use trie::{Lexeme, LexemeTrie, SubTokenizer};

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::intern::{InternPool, Symbol};
use crate::source::{SourceBuffer, SourceLocation};

/// Drives tokenization over one `SourceBuffer`, handing matched tokens to
/// the caller one at a time.
pub struct Lexer<'a> {
    buffer: &'a mut SourceBuffer,
    pool: &'a mut InternPool,
    diagnostics: &'a mut Diagnostics,
    trie: LexemeTrie,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(buffer: &'a mut SourceBuffer, pool: &'a mut InternPool, diagnostics: &'a mut Diagnostics) -> Lexer<'a> {
        Lexer {
            buffer,
            pool,
            diagnostics,
            trie: LexemeTrie::standard(),
            done: false,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.buffer.current().is_space() {
            self.buffer.next();
        }
    }

    fn location_for(&self, start: usize, end: usize) -> SourceLocation {
        let position = self.buffer.position_for(start);
        SourceLocation::new(start as u32, end as u32, position)
    }

    fn intern_slice(&mut self, start: usize, end: usize) -> Symbol {
        let text = self.buffer.make_slice(start, end);
        self.pool.intern(&text)
    }

    /// Produces the next token, or the synthetic `end_of_input` token once
    /// the buffer is exhausted.
    pub fn next_token(&mut self) -> Token {
        if self.done {
            let loc = self.location_for(self.buffer.index(), self.buffer.index());
            let lexeme = self.pool.intern("");
            return Token::new(TokenType::EndOfInput, lexeme, loc);
        }

        self.skip_whitespace();

        if self.buffer.at_end() {
            self.done = true;
            return self.next_token();
        }

        let start = self.buffer.index();
        self.buffer.push_mark();

        let current = self.buffer.current();
        if current.is_digit() {
            return self.lex_number_literal(start, false);
        }

        let matched = self.trie.walk(self.buffer);

        let matched = match matched {
            Some((lexeme, _count)) if lexeme.is_keyword && self.buffer.current().is_identifier_continuation() => None,
            other => other,
        };

        match matched {
            None => {
                self.buffer.rewind_to_mark();
                self.lex_identifier(start)
            }
            Some((lexeme, _count)) => match lexeme.tokenizer {
                Some(SubTokenizer::Identifier) => {
                    self.buffer.rewind_to_mark();
                    self.lex_identifier(start)
                }
                Some(SubTokenizer::DecimalNumber) => {
                    // The trie match consumed the leading `-` plus the
                    // first digit (the `-0`..`-9` lexemes); rewind to just
                    // past the sign so the sub-tokenizer sees every digit.
                    self.buffer.rewind_to_mark();
                    self.buffer.next();
                    self.finish_number(start, numbers::lex_decimal_number(self.buffer, true))
                }
                Some(SubTokenizer::HexNumber) => {
                    self.buffer.pop_mark();
                    self.finish_number(start, numbers::lex_hex_number(self.buffer))
                }
                Some(SubTokenizer::OctalNumber) => {
                    // The trie match consumed the leading `@` plus the
                    // first digit (the `@0`..`@7` lexemes); rewind to just
                    // past the `@` so the sub-tokenizer sees every digit.
                    self.buffer.rewind_to_mark();
                    self.buffer.next();
                    self.finish_number(start, numbers::lex_octal_number(self.buffer))
                }
                Some(SubTokenizer::BinaryNumber) => {
                    self.buffer.pop_mark();
                    self.finish_number(start, numbers::lex_binary_number(self.buffer))
                }
                Some(SubTokenizer::StringLiteral) => self.lex_string(start),
                Some(SubTokenizer::BlockLiteral) => self.lex_block_literal(start),
                Some(SubTokenizer::LineComment) => {
                    self.buffer.pop_mark();
                    comments::lex_line_comment(self.buffer);
                    let end = self.buffer.index();
                    let lexeme_sym = self.intern_slice(start, end);
                    Token::new(TokenType::LineComment, lexeme_sym, self.location_for(start, end))
                }
                Some(SubTokenizer::BlockComment) => self.lex_block_comment(start),
                None => {
                    self.buffer.pop_mark();
                    let end = self.buffer.index();
                    let lexeme_sym = self.intern_slice(start, end);
                    Token::new(lexeme.kind, lexeme_sym, self.location_for(start, end))
                }
            },
        }
    }

    fn lex_identifier(&mut self, start: usize) -> Token {
        let first = self.buffer.current();
        if !first.is_alpha() {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::ExpectedIdentifier, "expected identifier")
                    .with_location(self.location_for(start, start + 1)),
            );
            self.buffer.next();
            let lexeme_sym = self.intern_slice(start, self.buffer.index());
            return Token::new(TokenType::Identifier, lexeme_sym, self.location_for(start, self.buffer.index()));
        }
        self.buffer.next();
        while self.buffer.current().is_identifier_continuation() {
            self.buffer.next();
        }
        let end = self.buffer.index();
        let lexeme_sym = self.intern_slice(start, end);
        Token::new(TokenType::Identifier, lexeme_sym, self.location_for(start, end))
    }

    fn lex_number_literal(&mut self, start: usize, negative: bool) -> Token {
        self.buffer.pop_mark();
        let result = numbers::lex_decimal_number(self.buffer, negative);
        self.finish_number(start, result)
    }

    fn finish_number(&mut self, start: usize, result: Result<NumberToken, Diagnostic>) -> Token {
        let end = self.buffer.index();
        let location = self.location_for(start, end);
        let lexeme_sym = self.intern_slice(start, end);
        match result {
            Ok(number) => Token::new(TokenType::Number, lexeme_sym, location).with_number(number),
            Err(diag) => {
                self.diagnostics.push(diag.with_location(location));
                Token::new(TokenType::Number, lexeme_sym, location)
            }
        }
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.buffer.pop_mark();
        match strings::lex_string_literal(self.buffer) {
            Ok(_body) => {
                let end = self.buffer.index();
                let lexeme_sym = self.intern_slice(start, end);
                Token::new(TokenType::String, lexeme_sym, self.location_for(start, end))
            }
            Err(diag) => {
                let end = self.buffer.index();
                let location = self.location_for(start, end);
                self.diagnostics.push(diag.with_location(location));
                let lexeme_sym = self.intern_slice(start, end);
                Token::new(TokenType::String, lexeme_sym, location)
            }
        }
    }

    fn lex_block_literal(&mut self, start: usize) -> Token {
        self.buffer.pop_mark();
        match strings::lex_block_literal(self.buffer) {
            Ok(_body) => {
                let end = self.buffer.index();
                let lexeme_sym = self.intern_slice(start, end);
                Token::new(TokenType::BlockLiteral, lexeme_sym, self.location_for(start, end))
            }
            Err(diag) => {
                let end = self.buffer.index();
                let location = self.location_for(start, end);
                self.diagnostics.push(diag.with_location(location));
                let lexeme_sym = self.intern_slice(start, end);
                Token::new(TokenType::BlockLiteral, lexeme_sym, location)
            }
        }
    }

    fn lex_block_comment(&mut self, start: usize) -> Token {
        self.buffer.pop_mark();
        let loc_of = |s: usize, e: usize, buf: &SourceBuffer| -> SourceLocation {
            SourceLocation::new(s as u32, e as u32, buf.position_for(s))
        };
        let result = comments::lex_block_comment(self.buffer, loc_of);
        let end = self.buffer.index();
        let location = self.location_for(start, end);
        let lexeme_sym = self.intern_slice(start, end);
        match result {
            Ok(comment) => Token::new(TokenType::BlockComment, lexeme_sym, location).with_block_comment(comment),
            Err(diag) => {
                self.diagnostics.push(diag.with_location(location));
                Token::new(TokenType::BlockComment, lexeme_sym, location)
            }
        }
    }

    /// Collects the entire token stream, ending with `end_of_input`.
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        tracing::debug!(buffer = self.buffer.name(), "lexing source");
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tracing::trace!(kind = ?token.kind, "lexed token");
            let finished = token.is(TokenType::EndOfInput);
            tokens.push(token);
            if finished {
                break;
            }
        }
        tracing::debug!(count = tokens.len(), "lexing finished");
        tokens
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lex(src: &str) -> (Vec<Token>, Diagnostics) {
        let mut buffer = SourceBuffer::new("t", src.to_string());
        let mut pool = InternPool::new();
        let mut diagnostics = Diagnostics::new();
        let tokens = {
            let mut lexer = Lexer::new(&mut buffer, &mut pool, &mut diagnostics);
            lexer.tokenize_all()
        };
        (tokens, diagnostics)
    }

    #[test]
    fn tokenizes_identifier() {
        let (tokens, diags) = lex("hello");
        assert!(!diags.had_error());
        assert_eq!(tokens[0].kind, TokenType::Identifier);
        assert_eq!(tokens[1].kind, TokenType::EndOfInput);
    }

    #[test]
    fn tokenizes_keyword_vs_identifier_prefix() {
        let (tokens, _) = lex("if iffy");
        assert_eq!(tokens[0].kind, TokenType::KwIf);
        assert_eq!(tokens[1].kind, TokenType::Identifier);
    }

    #[test]
    fn tokenizes_declare_operator() {
        let (tokens, _) = lex("x := 1");
        assert_eq!(tokens[1].kind, TokenType::Declare);
    }

    #[test]
    fn tokenizes_hex_and_decimal_numbers() {
        let (tokens, _) = lex("$FF 10");
        assert_eq!(tokens[0].kind, TokenType::Number);
        assert_eq!(tokens[0].number.as_ref().unwrap().radix, Radix::Hex);
        assert_eq!(tokens[1].kind, TokenType::Number);
        assert_eq!(tokens[1].number.as_ref().unwrap().radix, Radix::Decimal);
    }

    #[test]
    fn tokenizes_string_literal() {
        let (tokens, diags) = lex(r#""hello""#);
        assert!(!diags.had_error());
        assert_eq!(tokens[0].kind, TokenType::String);
    }

    #[test]
    fn tokenizes_line_and_block_comments() {
        let (tokens, _) = lex("// hi\n/* a /* b */ */");
        assert_eq!(tokens[0].kind, TokenType::LineComment);
        assert_eq!(tokens[1].kind, TokenType::BlockComment);
        assert_eq!(tokens[1].block_comment.as_ref().unwrap().children.len(), 1);
    }

    #[test]
    fn emits_end_of_input_sentinel() {
        let (tokens, _) = lex("");
        assert_eq!(tokens.last().unwrap().kind, TokenType::EndOfInput);
    }

    #[test]
    fn range_exclusive_vs_dot_vs_range_inclusive() {
        let (tokens, _) = lex("a..<b a..b a.b");
        assert_eq!(tokens[1].kind, TokenType::RangeExclusive);
        assert_eq!(tokens[4].kind, TokenType::RangeInclusive);
        assert_eq!(tokens[7].kind, TokenType::Dot);
    }

    #[test]
    fn tokenizes_bare_at_as_annotation_marker() {
        let (tokens, diags) = lex("@foo;");
        assert!(!diags.had_error());
        assert_eq!(tokens[0].kind, TokenType::At);
        assert_eq!(tokens[1].kind, TokenType::Identifier);
        assert_eq!(tokens[2].kind, TokenType::Semicolon);
    }

    #[test]
    fn tokenizes_at_digit_as_octal_number() {
        let (tokens, diags) = lex("@17");
        assert!(!diags.had_error());
        assert_eq!(tokens[0].kind, TokenType::Number);
        assert_eq!(tokens[0].number.as_ref().unwrap().radix, Radix::Octal);
        assert_eq!(tokens[0].number.as_ref().unwrap().int_value, 0o17);
    }
}
