//! Pratt/TDOP expression parser and the statement-level driver that builds
//! the entity-component AST.
//!
//! Implemented as a binding-power ladder rather than plain recursive
//! descent, since the source language has real operator precedence that a
//! hand-encoded one-function-per-level descent would fight rather than
//! express directly.

mod lvalue;
mod rules;

use crate::ast::shapes::{
    Annotation, AssignmentOperator, BinaryOperator, Bitcast, Block, Break, Case, Cast,
    CompilationModule, Continue, Defer, Directive, Enum, Family, For, Goto, Identifier,
    IdentifierRef, If, Import, Module, Node, Ns, Proc, Return, Statement, Struct, Switch, Union,
    UnaryOperator, Use, While, With, Yield,
};
use crate::ast::{Arena, Entity, Scope};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::intern::InternPool;
use crate::lexer::{Token, TokenType};

/// Drives the AST arena from a finished token stream. The lexer and parser
/// are kept as separate passes (rather than parser-pulls-lexer) so a future
/// tool can inspect or replay the token stream independently.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    pool: &'a mut InternPool,
    diagnostics: &'a mut Diagnostics,
    arena: Arena,
    scope_stack: Vec<Entity>,
    block_stack: Vec<Entity>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, pool: &'a mut InternPool, diagnostics: &'a mut Diagnostics) -> Parser<'a> {
        Parser {
            tokens,
            pos: 0,
            pool,
            diagnostics,
            arena: Arena::new(),
            scope_stack: Vec::new(),
            block_stack: Vec::new(),
        }
    }

    /// Parses the whole token stream as a single compilation unit and
    /// returns the root `Module` entity, along with the arena it lives in.
    pub fn parse(mut self) -> (Entity, Arena) {
        tracing::debug!(tokens = self.tokens.len(), "parsing token stream");
        let module = self.parse_module();
        tracing::debug!("parsing finished");
        (module, self.arena)
    }

    fn current(&self) -> Token {
        self.tokens[self.pos].clone()
    }

    fn at_end(&self) -> bool {
        self.current().kind == TokenType::EndOfInput
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenType) -> Token {
        let token = self.advance();
        if token.kind != kind {
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::ExpectedToken,
                    format!("expected {:?}, found {:?}", kind, token.kind),
                )
                .with_location(token.location),
            );
        }
        token
    }

    fn resolve_name(&self, scope: Entity, name: &str) -> Option<Entity> {
        let mut current = Some(scope);
        while let Some(s) = current {
            let scope_data = self.arena.scope(s)?;
            if let Some(found) = scope_data.resolve_local(name) {
                return Some(found);
            }
            current = scope_data.parent;
            if current.is_none() {
                break;
            }
        }
        None
    }

    fn declare_name(&mut self, scope: Entity, name: &str, entity: Entity) {
        if let Some(scope_data) = self.arena.scope_mut(scope) {
            scope_data.declare(name, entity);
        }
    }

    fn current_scope(&self) -> Entity {
        *self.scope_stack.last().expect("scope stack is never empty while parsing a module body")
    }

    fn current_block(&self) -> Entity {
        *self.block_stack.last().expect("block stack is never empty while parsing a module body")
    }

    /// Opens a new `{ ... }` lexical scope, pushing it onto both stacks so
    /// nested parses resolve names through it. Pairs with `close_block`.
    fn open_block(&mut self, parent: Entity) -> (Entity, Entity) {
        let brace = self.expect(TokenType::LeftBrace);
        let scope_parent = self.scope_stack.last().copied();
        let block = self.arena.alloc(Node::child_of(brace.clone(), parent));
        let scope = self.arena.alloc(Node::child_of(brace, block));
        let scope_data = match scope_parent {
            Some(p) => Scope::child_of(p),
            None => Scope::root(),
        };
        self.arena.set_scope(scope, scope_data);
        self.arena.set_block(block, Block { scope, children: Vec::new() });
        self.block_stack.push(block);
        self.scope_stack.push(scope);
        (block, scope)
    }

    fn close_block(&mut self, block: Entity) {
        while self.current().kind != TokenType::RightBrace && !self.at_end() {
            let stmt = self.parse_statement(block);
            self.arena.block_mut(block).expect("just opened").children.push(stmt);
        }
        self.expect(TokenType::RightBrace);
        self.block_stack.pop();
        self.scope_stack.pop();
    }

    fn parse_block_body(&mut self, parent: Entity) -> Entity {
        let (block, _scope) = self.open_block(parent);
        self.close_block(block);
        block
    }

    fn parse_member_list(&mut self, parent: Entity) -> Vec<Entity> {
        self.expect(TokenType::LeftBrace);
        let mut members = Vec::new();
        while self.current().kind != TokenType::RightBrace && !self.at_end() {
            members.push(self.expression(rules::lbp(TokenType::Comma), parent));
            if self.current().kind == TokenType::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenType::RightBrace);
        members
    }

    fn parse_module(&mut self) -> Entity {
        let token = self.current();
        let module_entity = self.arena.alloc(Node::root(token.clone()));
        let block = self.arena.alloc(Node::child_of(token.clone(), module_entity));
        let scope = self.arena.alloc(Node::child_of(token, block));
        self.arena.set_scope(scope, Scope::root());
        self.arena.set_block(block, Block { scope, children: Vec::new() });
        self.block_stack.push(block);
        self.scope_stack.push(scope);

        while !self.at_end() {
            let stmt = self.parse_statement(block);
            self.arena.block_mut(block).expect("just opened").children.push(stmt);
        }

        self.block_stack.pop();
        self.scope_stack.pop();
        self.arena.set_module(module_entity, Module { block });
        module_entity
    }

    /// Parses one top-level statement, hoisting any leading comments,
    /// directives, or annotations onto the `Statement` node rather than
    /// leaving them as sibling expressions.
    fn parse_statement(&mut self, block: Entity) -> Entity {
        let token = self.current();
        let stmt = self.arena.alloc(Node::child_of(token, block));
        let expr = loop {
            let e = self.expression(0, stmt);
            if self.arena.is_directive(e) {
                self.arena.node_mut(stmt).directives.push(e);
                continue;
            }
            if self.arena.is_annotation(e) {
                self.arena.node_mut(stmt).annotations.push(e);
                continue;
            }
            if matches!(self.arena.node(e).token.kind, TokenType::LineComment | TokenType::BlockComment) {
                self.arena.node_mut(stmt).comments.push(e);
                continue;
            }
            break e;
        };
        self.expect(TokenType::Semicolon);
        self.arena.set_statement(stmt, Statement { expr: Some(expr), labels: Vec::new() });
        stmt
    }

    /// Pratt core: parses an expression, applying `led` handlers as long as
    /// the next token binds tighter than `rbp`.
    fn expression(&mut self, rbp: u8, parent: Entity) -> Entity {
        let token = self.advance();
        let mut lhs = self.nud(token, parent);
        while rules::lbp(self.current().kind) > rbp {
            let token = self.advance();
            lhs = self.led(token, lhs, parent);
        }
        lhs
    }

    fn nud(&mut self, token: Token, parent: Entity) -> Entity {
        use TokenType::*;
        match token.kind {
            Identifier => self.nud_identifier(token, parent),
            Number | String | BlockLiteral | LineComment | BlockComment | KwFallthrough => {
                self.arena.alloc(Node::child_of(token, parent))
            }
            Hash => self.nud_directive(token, parent),
            At => self.nud_annotation(token, parent),
            LeftParen => {
                let e = self.expression(0, parent);
                self.expect(RightParen);
                e
            }
            Minus | Tilde | Bang => self.nud_prefix(token, parent),
            KwIf => self.nud_if(token, parent),
            KwWhile => self.nud_while(token, parent),
            KwFor => self.nud_for(token, parent),
            KwSwitch => self.nud_switch(token, parent),
            KwCase => self.nud_case(token, parent),
            KwProc => self.nud_proc(token, parent),
            KwEnum => self.nud_enum(token, parent),
            KwStruct => self.nud_struct(token, parent),
            KwUnion => self.nud_union(token, parent),
            KwFamily => self.nud_family(token, parent),
            KwCast => self.nud_cast(token, parent, false),
            KwBitcast => self.nud_cast(token, parent, true),
            KwModule => self.nud_module_decl(token, parent),
            KwImport => self.nud_import(token, parent),
            KwNs => self.nud_ns(token, parent),
            KwDefer => self.nud_defer(token, parent),
            KwYield => self.nud_yield(token, parent),
            KwBreak => self.nud_break(token, parent),
            KwContinue => self.nud_continue(token, parent),
            KwReturn => self.nud_return(token, parent),
            KwGoto => self.nud_goto(token, parent),
            KwWith => self.nud_with(token, parent),
            KwUse => self.nud_use(token, parent),
            _ => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::ExpectedExpression,
                        format!("no nud production rule for {:?}", token.kind),
                    )
                    .with_location(token.location),
                );
                self.arena.alloc(Node::child_of(token, parent))
            }
        }
    }

    fn led(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        use TokenType::*;
        match token.kind {
            Plus | Minus | Star | Slash | Percent | StarStar | Pipe | Amp | Xor | Shl | Shr
            | Rol | Ror | Lt | Gt | Eq | Ne | Le | Ge | In | RangeInclusive | RangeExclusive
            | PipePipe | AmpAmp | Comma => self.led_binary(token, lhs, parent),
            Dot => self.led_member(token, lhs, parent),
            LeftBracket => self.led_subscript(token, lhs, parent),
            Declare | Bind | Assign => self.led_assignment(token, lhs, parent),
            PlusAssign | MinusAssign | StarAssign | SlashAssign | PercentAssign | PipeAssign
            | AmpAssign => self.led_compound_assignment(token, lhs, parent),
            Caret => self.led_postfix(token, lhs, parent),
            _ => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnexpectedToken,
                        format!("no led production rule for {:?}", token.kind),
                    )
                    .with_location(token.location),
                );
                lhs
            }
        }
    }

    fn nud_identifier(&mut self, token: Token, parent: Entity) -> Entity {
        let name = self.pool.resolve(token.lexeme).to_string();
        let scope = self.current_scope();
        if let Some(existing) = self.resolve_name(scope, &name) {
            let entity = self.arena.alloc(Node::child_of(token, parent));
            self.arena.set_identifier_ref(entity, IdentifierRef { identifier: existing });
            entity
        } else {
            let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
            let block = self.current_block();
            self.arena.set_identifier(entity, Identifier { name: token.lexeme, scope, block });
            self.declare_name(scope, &name, entity);
            entity
        }
    }

    fn nud_directive(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let name_token = self.expect(TokenType::Identifier);
        let lhs = self.arena.alloc(Node::child_of(name_token, entity));
        let rhs = if self.current().kind == TokenType::LeftParen {
            self.advance();
            let e = self.expression(0, entity);
            self.expect(TokenType::RightParen);
            Some(e)
        } else {
            None
        };
        self.arena.set_directive(entity, Directive { lhs, rhs });
        entity
    }

    fn nud_annotation(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let name_token = self.expect(TokenType::Identifier);
        let lhs = self.arena.alloc(Node::child_of(name_token, entity));
        let rhs = if self.current().kind == TokenType::LeftParen {
            self.advance();
            let e = self.expression(0, entity);
            self.expect(TokenType::RightParen);
            Some(e)
        } else {
            None
        };
        self.arena.set_annotation(entity, Annotation { lhs, rhs });
        entity
    }

    fn nud_prefix(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let lhs = self.expression(80, entity);
        self.arena.set_unary_operator(entity, UnaryOperator { op: token.lexeme, lhs });
        entity
    }

    fn led_postfix(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        self.arena.set_unary_operator(entity, UnaryOperator { op: token.lexeme, lhs });
        entity
    }

    fn led_binary(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        let bp = rules::lbp(token.kind);
        let next_rbp = if rules::is_right_associative(token.kind) { bp - 1 } else { bp };
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let rhs = self.expression(next_rbp, entity);
        self.arena.set_binary_operator(entity, BinaryOperator { op: token.lexeme, lhs, rhs });
        entity
    }

    fn led_member(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        if !lvalue::is_lvalue(&self.arena, lhs) {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::InvalidLvalue, "left-hand side of '.' must be an lvalue")
                    .with_location(token.location),
            );
        }
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let name_token = self.expect(TokenType::Identifier);
        let name = self.pool.resolve(name_token.lexeme).to_string();
        let scope = self.current_scope();
        let block = self.current_block();
        let rhs = self.arena.alloc(Node::child_of(name_token.clone(), entity));
        self.arena.set_identifier(rhs, Identifier { name: name_token.lexeme, scope, block });
        self.declare_name(scope, &name, rhs);
        self.arena.set_binary_operator(entity, BinaryOperator { op: token.lexeme, lhs, rhs });
        entity
    }

    fn led_subscript(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let rhs = self.expression(0, entity);
        self.expect(TokenType::RightBracket);
        self.arena.set_binary_operator(entity, BinaryOperator { op: token.lexeme, lhs, rhs });
        entity
    }

    fn led_assignment(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        if !lvalue::is_lvalue(&self.arena, lhs) {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::InvalidLvalue, "assignment requires a valid lvalue")
                    .with_location(token.location),
            );
        }
        let entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let bp = rules::lbp(token.kind);
        let rhs = self.expression(bp, entity);
        if self.arena.is_assignment_operator(rhs) {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::InvalidLvalue, "nested assignment is not allowed")
                    .with_location(token.location),
            );
        }
        self.arena.set_assignment_operator(entity, AssignmentOperator { lhs, rhs });
        entity
    }

    /// Desugars `a OP:= b` into `AssignmentOperator{lhs=a, rhs=BinaryOperator{op, lhs=a, rhs=b}}`
    /// at parse time, rather than carrying a separate compound-assignment shape.
    fn led_compound_assignment(&mut self, token: Token, lhs: Entity, parent: Entity) -> Entity {
        if !lvalue::is_lvalue(&self.arena, lhs) {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::InvalidLvalue, "compound assignment requires a valid lvalue")
                    .with_location(token.location),
            );
        }
        let op_kind = compound_operator_kind(token.kind);
        let assign_entity = self.arena.alloc(Node::child_of(token.clone(), parent));
        let bp = rules::lbp(token.kind);
        let b = self.expression(bp, assign_entity);
        if self.arena.is_assignment_operator(b) {
            self.diagnostics.push(
                Diagnostic::error(DiagnosticCode::InvalidLvalue, "nested assignment is not allowed")
                    .with_location(token.location),
            );
        }
        let bin_token = Token::new(op_kind, token.lexeme, token.location);
        let bin_entity = self.arena.alloc(Node::child_of(bin_token, assign_entity));
        self.arena.set_binary_operator(bin_entity, BinaryOperator { op: token.lexeme, lhs, rhs: b });
        self.arena.set_assignment_operator(assign_entity, AssignmentOperator { lhs, rhs: bin_entity });
        assign_entity
    }

    fn nud_if(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let predicate = self.expression(0, entity);
        let body = self.parse_block_body(entity);
        let else_or_elseif = if self.current().kind == TokenType::KwElse {
            self.advance();
            if self.current().kind == TokenType::KwIf {
                let if_token = self.advance();
                Some(self.nud_if(if_token, entity))
            } else {
                Some(self.parse_block_body(entity))
            }
        } else {
            None
        };
        self.arena.set_if(entity, If { predicate, body, else_or_elseif });
        entity
    }

    fn nud_while(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let predicate = self.expression(0, entity);
        let body = self.parse_block_body(entity);
        self.arena.set_while(entity, While { predicate, body });
        entity
    }

    fn nud_for(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let mut var_tokens = Vec::new();
        loop {
            var_tokens.push(self.expect(TokenType::Identifier));
            if self.current().kind == TokenType::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenType::In);
        let expr = self.expression(0, entity);
        let (block, scope) = self.open_block(entity);
        let mut vars = Vec::new();
        for vt in var_tokens {
            let var_entity = self.arena.alloc(Node::child_of(vt.clone(), entity));
            self.arena.set_identifier(var_entity, Identifier { name: vt.lexeme, scope, block });
            let name_text = self.pool.resolve(vt.lexeme).to_string();
            self.declare_name(scope, &name_text, var_entity);
            vars.push(var_entity);
        }
        self.close_block(block);
        self.arena.set_for(entity, For { expr, body: block, vars });
        entity
    }

    fn nud_switch(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = self.expression(0, entity);
        let body = self.parse_block_body(entity);
        self.arena.set_switch(entity, Switch { expr, body });
        entity
    }

    fn nud_case(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = if self.current().kind != TokenType::FatArrow {
            Some(self.expression(0, entity))
        } else {
            None
        };
        self.expect(TokenType::FatArrow);
        let body = self.parse_block_body(entity);
        self.arena.set_case(entity, Case { expr, body });
        entity
    }

    fn nud_proc(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let mut type_parameters = Vec::new();
        if self.current().kind == TokenType::Lt {
            self.advance();
            while self.current().kind != TokenType::Gt && !self.at_end() {
                let t = self.expect(TokenType::Identifier);
                type_parameters.push(self.arena.alloc(Node::child_of(t, entity)));
                if self.current().kind == TokenType::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenType::Gt);
        }
        self.expect(TokenType::LeftParen);
        let mut params = Vec::new();
        while self.current().kind != TokenType::RightParen && !self.at_end() {
            params.push(self.expression(rules::lbp(TokenType::Comma), entity));
            if self.current().kind == TokenType::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenType::RightParen);
        let mut return_params = Vec::new();
        if self.current().kind == TokenType::Arrow {
            self.advance();
            self.expect(TokenType::LeftParen);
            while self.current().kind != TokenType::RightParen && !self.at_end() {
                return_params.push(self.expression(rules::lbp(TokenType::Comma), entity));
                if self.current().kind == TokenType::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenType::RightParen);
        }
        let body = if self.current().kind == TokenType::LeftBrace {
            Some(self.parse_block_body(entity))
        } else {
            None
        };
        self.arena.set_proc(entity, Proc { body, params, return_params, type_parameters });
        entity
    }

    fn nud_enum(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let members = self.parse_member_list(entity);
        self.arena.set_enum(entity, Enum { members });
        entity
    }

    fn nud_struct(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let fields = self.parse_member_list(entity);
        self.arena.set_struct(entity, Struct { fields });
        entity
    }

    fn nud_union(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let fields = self.parse_member_list(entity);
        self.arena.set_union(entity, Union { fields });
        entity
    }

    fn nud_family(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let members = self.parse_member_list(entity);
        self.arena.set_family(entity, Family { members });
        entity
    }

    fn nud_cast(&mut self, token: Token, parent: Entity, is_bitcast: bool) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        self.expect(TokenType::Lt);
        let ty_token = self.expect(TokenType::Identifier);
        let ty = self.arena.alloc(Node::child_of(ty_token, entity));
        self.expect(TokenType::Gt);
        self.expect(TokenType::LeftParen);
        let expr = self.expression(0, entity);
        self.expect(TokenType::RightParen);
        if is_bitcast {
            self.arena.set_bitcast(entity, Bitcast { ty, expr });
        } else {
            self.arena.set_cast(entity, Cast { ty, expr });
        }
        entity
    }

    /// Named sub-module declarations (`module foo { ... }`) are distinct
    /// from the implicit top-level `Module` the parser opens at the very
    /// start of `parse`, so they get their own `CompilationModule` shape.
    fn nud_module_decl(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let name_token = self.expect(TokenType::Identifier);
        let block = self.parse_block_body(entity);
        self.arena.set_module_decl(entity, CompilationModule { name: name_token.lexeme, block });
        entity
    }

    fn nud_import(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let path_token = self.expect(TokenType::String);
        self.arena.set_import(entity, Import { path: path_token.lexeme });
        entity
    }

    fn nud_ns(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let name_token = self.expect(TokenType::Identifier);
        let body = self.parse_block_body(entity);
        self.arena.set_ns(entity, Ns { name: name_token.lexeme, body });
        entity
    }

    fn nud_defer(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = self.expression(0, entity);
        self.arena.set_defer(entity, Defer { expr });
        entity
    }

    fn nud_yield(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = if self.current().kind != TokenType::Semicolon {
            Some(self.expression(0, entity))
        } else {
            None
        };
        self.arena.set_yield(entity, Yield { expr });
        entity
    }

    fn nud_break(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let label = if self.current().kind == TokenType::Identifier {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.arena.set_break(entity, Break { label });
        entity
    }

    fn nud_continue(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let label = if self.current().kind == TokenType::Identifier {
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.arena.set_continue(entity, Continue { label });
        entity
    }

    fn nud_return(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = if self.current().kind != TokenType::Semicolon {
            Some(self.expression(0, entity))
        } else {
            None
        };
        self.arena.set_return(entity, Return { expr });
        entity
    }

    fn nud_goto(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let label_token = self.expect(TokenType::Identifier);
        self.arena.set_goto(entity, Goto { label: label_token.lexeme });
        entity
    }

    fn nud_with(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = self.expression(0, entity);
        let body = self.parse_block_body(entity);
        self.arena.set_with(entity, With { expr, body });
        entity
    }

    fn nud_use(&mut self, token: Token, parent: Entity) -> Entity {
        let entity = self.arena.alloc(Node::child_of(token, parent));
        let expr = self.expression(0, entity);
        self.arena.set_use(entity, Use { expr });
        entity
    }
}

fn compound_operator_kind(kind: TokenType) -> TokenType {
    use TokenType::*;
    match kind {
        PlusAssign => Plus,
        MinusAssign => Minus,
        StarAssign => Star,
        SlashAssign => Slash,
        PercentAssign => Percent,
        PipeAssign => Pipe,
        AmpAssign => Amp,
        other => other,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::Lexer;
    use crate::source::SourceBuffer;

    fn parse_source(text: &str) -> (Entity, Arena, Diagnostics) {
        let mut pool = InternPool::new();
        let mut diagnostics = Diagnostics::default();
        let mut buffer = SourceBuffer::new("test", text.to_string());
        let tokens = {
            let mut lexer = Lexer::new(&mut buffer, &mut pool, &mut diagnostics);
            lexer.tokenize_all()
        };
        let (module, arena) = Parser::new(tokens, &mut pool, &mut diagnostics).parse();
        (module, arena, diagnostics)
    }

    #[test]
    fn parses_declaration_statement() {
        let (module, arena, diagnostics) = parse_source("x := 1;");
        assert!(!diagnostics.had_error());
        let block = arena.module(module).unwrap().block;
        assert_eq!(arena.block(block).unwrap().children.len(), 1);
    }

    #[test]
    fn reuses_identifier_entity_on_second_reference() {
        let (module, arena, diagnostics) = parse_source("x := 1; x;");
        assert!(!diagnostics.had_error());
        // The first `x` declares; the second resolves to an IdentifierRef
        // pointing at the same entity rather than re-declaring.
        let mut saw_ref = false;
        crate::ast::walk(&arena, module, |e| {
            if let Some(r) = arena.identifier_ref(e) {
                assert!(arena.is_identifier(r.identifier));
                saw_ref = true;
            }
        });
        assert!(saw_ref);
    }

    #[test]
    fn compound_assignment_desugars_to_binary_rhs() {
        let (module, arena, diagnostics) = parse_source("x := 1; x +:= 2;");
        assert!(!diagnostics.had_error());
        let mut saw_assignment_with_binary_rhs = false;
        crate::ast::walk(&arena, module, |e| {
            if let Some(assign) = arena.assignment_operator(e) {
                if arena.is_binary_operator(assign.rhs) {
                    saw_assignment_with_binary_rhs = true;
                }
            }
        });
        assert!(saw_assignment_with_binary_rhs);
    }

    #[test]
    fn member_select_requires_lvalue() {
        let (_module, _arena, diagnostics) = parse_source("1.foo;");
        assert!(diagnostics.had_error());
    }

    #[test]
    fn if_else_if_chains_through_else_or_elseif() {
        let (module, arena, diagnostics) = parse_source("if x { 1; } else if x { 2; } else { 3; }");
        assert!(!diagnostics.had_error());
        let block = arena.module(module).unwrap().block;
        let stmt = arena.block(block).unwrap().children[0];
        let if_entity = arena.statement(stmt).unwrap().expr.unwrap();
        let if_node = arena.if_node(if_entity).unwrap();
        assert!(if_node.else_or_elseif.is_some());
    }
}
