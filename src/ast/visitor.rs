use super::arena::Arena;
use super::entity::Entity;

/// Returns the entities a node owns, drawn from whichever shape component
/// is present. Entities with no recognized shape (e.g. a bare `Scope` or a
/// leaf `Identifier`) yield no children.
pub fn children(arena: &Arena, entity: Entity) -> Vec<Entity> {
    let mut out = Vec::new();

    if let Some(stmt) = arena.statement(entity) {
        out.extend(stmt.expr);
    }
    if let Some(block) = arena.block(entity) {
        out.push(block.scope);
        out.extend(block.children.iter().copied());
    }
    if let Some(bin) = arena.binary_operator(entity) {
        out.push(bin.lhs);
        out.push(bin.rhs);
    }
    if let Some(un) = arena.unary_operator(entity) {
        out.push(un.lhs);
    }
    if let Some(assign) = arena.assignment_operator(entity) {
        out.push(assign.lhs);
        out.push(assign.rhs);
    }
    if let Some(if_node) = arena.if_node(entity) {
        out.push(if_node.predicate);
        out.push(if_node.body);
        out.extend(if_node.else_or_elseif);
    }
    if let Some(while_node) = arena.while_node(entity) {
        out.push(while_node.predicate);
        out.push(while_node.body);
    }
    if let Some(for_node) = arena.for_node(entity) {
        out.push(for_node.expr);
        out.push(for_node.body);
        out.extend(for_node.vars.iter().copied());
    }
    if let Some(switch_node) = arena.switch_node(entity) {
        out.push(switch_node.expr);
        out.push(switch_node.body);
    }
    if let Some(case_node) = arena.case_node(entity) {
        out.extend(case_node.expr);
        out.push(case_node.body);
    }
    if let Some(proc_node) = arena.proc_node(entity) {
        out.extend(proc_node.body);
        out.extend(proc_node.params.iter().copied());
        out.extend(proc_node.return_params.iter().copied());
        out.extend(proc_node.type_parameters.iter().copied());
    }
    if let Some(module) = arena.module(entity) {
        out.push(module.block);
    }
    if let Some(module_decl) = arena.module_decl(entity) {
        out.push(module_decl.block);
    }
    if let Some(cast) = arena.cast_node(entity) {
        out.push(cast.ty);
        out.push(cast.expr);
    }
    if let Some(bitcast) = arena.bitcast_node(entity) {
        out.push(bitcast.ty);
        out.push(bitcast.expr);
    }
    if let Some(defer) = arena.defer_node(entity) {
        out.push(defer.expr);
    }
    if let Some(yield_node) = arena.yield_node(entity) {
        out.extend(yield_node.expr);
    }
    if let Some(return_node) = arena.return_node(entity) {
        out.extend(return_node.expr);
    }
    if let Some(with_node) = arena.with_node(entity) {
        out.push(with_node.expr);
        out.push(with_node.body);
    }
    if let Some(use_node) = arena.use_node(entity) {
        out.push(use_node.expr);
    }
    if let Some(enum_node) = arena.enum_node(entity) {
        out.extend(enum_node.members.iter().copied());
    }
    if let Some(struct_node) = arena.struct_node(entity) {
        out.extend(struct_node.fields.iter().copied());
    }
    if let Some(union_node) = arena.union_node(entity) {
        out.extend(union_node.fields.iter().copied());
    }
    if let Some(family_node) = arena.family_node(entity) {
        out.extend(family_node.members.iter().copied());
    }
    if let Some(ns_node) = arena.ns_node(entity) {
        out.push(ns_node.body);
    }

    out
}

/// Depth-first pre-order walk starting at `root`.
pub fn walk(arena: &Arena, root: Entity, mut visit: impl FnMut(Entity)) {
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        visit(entity);
        let mut kids = children(arena, entity);
        kids.reverse();
        stack.extend(kids);
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::shapes::{Block, BinaryOperator, Enum, Ns, Node, Statement};
    use crate::intern::InternPool;

    #[test]
    fn walk_visits_statement_expression() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let root = arena.alloc(Node::root(crate::ast::shapes::test_token(&mut pool)));
        let lhs = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let rhs = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let bin_entity = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let op = pool.intern("+");
        arena.set_binary_operator(bin_entity, BinaryOperator { op, lhs, rhs });
        let stmt = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        arena.set_statement(stmt, Statement { expr: Some(bin_entity), labels: Vec::new() });

        let mut visited = Vec::new();
        walk(&arena, stmt, |e| visited.push(e));
        assert_eq!(visited, vec![stmt, bin_entity, lhs, rhs]);
    }

    #[test]
    fn block_children_include_scope_and_statements() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let root = arena.alloc(Node::root(crate::ast::shapes::test_token(&mut pool)));
        let scope = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let stmt = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        arena.set_statement(stmt, Statement { expr: None, labels: Vec::new() });
        let block = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        arena.set_block(block, Block { scope, children: vec![stmt] });

        let kids = children(&arena, block);
        assert_eq!(kids, vec![scope, stmt]);
    }

    #[test]
    fn enum_children_include_every_member() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let root = arena.alloc(Node::root(crate::ast::shapes::test_token(&mut pool)));
        let a = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let b = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let enum_entity = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        arena.set_enum(enum_entity, Enum { members: vec![a, b] });

        assert_eq!(children(&arena, enum_entity), vec![a, b]);
    }

    #[test]
    fn ns_children_include_its_body() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let root = arena.alloc(Node::root(crate::ast::shapes::test_token(&mut pool)));
        let body = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let ns_entity = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let name = pool.intern("inner");
        arena.set_ns(ns_entity, Ns { name, body });

        assert_eq!(children(&arena, ns_entity), vec![body]);
    }

    #[test]
    fn walk_descends_into_namespace_body() {
        let mut pool = InternPool::new();
        let mut arena = Arena::new();
        let root = arena.alloc(Node::root(crate::ast::shapes::test_token(&mut pool)));
        let body = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let ns_entity = arena.alloc(Node::child_of(crate::ast::shapes::test_token(&mut pool), root));
        let name = pool.intern("inner");
        arena.set_ns(ns_entity, Ns { name, body });

        let mut visited = Vec::new();
        walk(&arena, ns_entity, |e| visited.push(e));
        assert_eq!(visited, vec![ns_entity, body]);
    }
}
