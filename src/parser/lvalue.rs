use crate::ast::{Arena, Entity};
use crate::lexer::TokenType;

/// Checks whether `entity` is valid on the left of an assignment or member
/// select: `Identifier`/`IdentifierRef` always qualify; `BinaryOperator`
/// qualifies only for `,`, `[`, or `.`; `UnaryOperator` only for `^`
/// (pointer dereference).
pub fn is_lvalue(arena: &Arena, entity: Entity) -> bool {
    if arena.is_identifier(entity) || arena.is_identifier_ref(entity) {
        return true;
    }
    if arena.is_binary_operator(entity) {
        return matches!(
            arena.node(entity).token.kind,
            TokenType::Comma | TokenType::LeftBracket | TokenType::Dot
        );
    }
    if arena.is_unary_operator(entity) {
        return arena.node(entity).token.kind == TokenType::Caret;
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::shapes::{test_token, BinaryOperator, Node};
    use crate::intern::InternPool;

    #[test]
    fn identifier_is_lvalue() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let entity = arena.alloc(Node::root(test_token(&mut pool)));
        arena.set_identifier(entity, crate::ast::shapes::Identifier { name: pool.intern("x"), scope: entity, block: entity });
        assert!(is_lvalue(&arena, entity));
    }

    #[test]
    fn binary_plus_is_not_lvalue() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let lhs = arena.alloc(Node::root(test_token(&mut pool)));
        let rhs = arena.alloc(Node::root(test_token(&mut pool)));
        let entity = arena.alloc(Node::root(test_token(&mut pool)));
        let op = pool.intern("+");
        arena.set_binary_operator(entity, BinaryOperator { op, lhs, rhs });
        assert!(!is_lvalue(&arena, entity));
    }
}
