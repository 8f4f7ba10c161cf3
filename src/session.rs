//! Threads the intern pool, diagnostics bag, and AST arena through the
//! front-end pipeline (lex, then parse).
//!
//! `Session` owns the pool and arena for the lifetime of one compilation
//! so every phase shares one set of handles instead of passing them
//! around individually.

use crate::ast::{Arena, Entity};
use crate::diagnostics::Diagnostics;
use crate::intern::InternPool;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::source::SourceBuffer;

/// Owns the source buffer, interned strings, and diagnostics for one
/// compilation. Built fresh per input file; nothing here is shared across
/// sessions.
pub struct Session {
    pub buffer: SourceBuffer,
    pub pool: InternPool,
    pub diagnostics: Diagnostics,
}

/// The AST produced by a finished session: the module entity and the
/// arena it lives in, handed back alongside the `Session` so callers can
/// still resolve symbols and render diagnostics against the source.
pub struct ParsedModule {
    pub module: Entity,
    pub arena: Arena,
}

impl Session {
    pub fn new(name: impl Into<String>, text: String) -> Session {
        let mut buffer = SourceBuffer::new(name, text);
        let mut diagnostics = Diagnostics::new();
        for diagnostic in buffer.take_diagnostics() {
            diagnostics.push(diagnostic);
        }
        Session { buffer, pool: InternPool::new(), diagnostics }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut lexer = Lexer::new(&mut self.buffer, &mut self.pool, &mut self.diagnostics);
        let tokens = lexer.tokenize_all();
        for diagnostic in self.buffer.take_diagnostics() {
            self.diagnostics.push(diagnostic);
        }
        tokens
    }

    /// Runs the full lex-then-parse pipeline and returns the resulting AST.
    /// Diagnostics accumulate on `self.diagnostics` regardless of outcome;
    /// callers check `had_error()` rather than an embedded `Result`:
    /// diagnostics are values, not exceptions.
    pub fn compile(&mut self) -> ParsedModule {
        let tokens = self.tokenize();
        let (module, arena) = Parser::new(tokens, &mut self.pool, &mut self.diagnostics).parse();
        ParsedModule { module, arena }
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn render_diagnostics(&self) -> String {
        self.diagnostics.render(&self.buffer)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compiles_simple_program_without_errors() {
        let mut session = Session::new("test", "x := 1; y := x + 2;".to_string());
        let parsed = session.compile();
        assert!(!session.had_error());
        assert!(!parsed.arena.is_empty());
    }

    #[test]
    fn records_error_for_malformed_statement() {
        let mut session = Session::new("test", "x := ;".to_string());
        let _parsed = session.compile();
        assert!(session.had_error());
    }
}
