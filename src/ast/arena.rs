use super::entity::Entity;
use super::scope::Scope;
use super::shapes::*;

macro_rules! component_tables {
    ($( $field:ident : $ty:ty => $insert:ident, $get:ident, $get_mut:ident, $has:ident );+ $(;)?) => {
        #[derive(Default)]
        struct ShapeTables {
            $( $field: Vec<Option<$ty>>, )+
        }

        impl ShapeTables {
            fn grow_to(&mut self, len: usize) {
                $( if self.$field.len() < len { self.$field.resize_with(len, || None); } )+
            }
        }

        impl Arena {
            $(
                pub fn $insert(&mut self, entity: Entity, value: $ty) {
                    let index = entity.to_index();
                    self.shapes.grow_to(index + 1);
                    self.shapes.$field[index] = Some(value);
                }

                pub fn $get(&self, entity: Entity) -> Option<&$ty> {
                    self.shapes.$field.get(entity.to_index()).and_then(|slot| slot.as_ref())
                }

                pub fn $get_mut(&mut self, entity: Entity) -> Option<&mut $ty> {
                    self.shapes.$field.get_mut(entity.to_index()).and_then(|slot| slot.as_mut())
                }

                pub fn $has(&self, entity: Entity) -> bool {
                    self.$get(entity).is_some()
                }
            )+
        }
    };
}

component_tables! {
    module: Module => set_module, module, module_mut, is_module;
    module_decl: CompilationModule => set_module_decl, module_decl, module_decl_mut, is_module_decl;
    block: Block => set_block, block, block_mut, is_block;
    scope: Scope => set_scope, scope, scope_mut, is_scope;
    statement: Statement => set_statement, statement, statement_mut, is_statement;
    binary_operator: BinaryOperator => set_binary_operator, binary_operator, binary_operator_mut, is_binary_operator;
    unary_operator: UnaryOperator => set_unary_operator, unary_operator, unary_operator_mut, is_unary_operator;
    assignment_operator: AssignmentOperator => set_assignment_operator, assignment_operator, assignment_operator_mut, is_assignment_operator;
    identifier: Identifier => set_identifier, identifier, identifier_mut, is_identifier;
    identifier_ref: IdentifierRef => set_identifier_ref, identifier_ref, identifier_ref_mut, is_identifier_ref;
    directive: Directive => set_directive, directive, directive_mut, is_directive;
    annotation: Annotation => set_annotation, annotation, annotation_mut, is_annotation;
    if_: If => set_if, if_node, if_node_mut, is_if;
    while_: While => set_while, while_node, while_node_mut, is_while;
    for_: For => set_for, for_node, for_node_mut, is_for;
    switch_: Switch => set_switch, switch_node, switch_node_mut, is_switch;
    case_: Case => set_case, case_node, case_node_mut, is_case;
    proc_: Proc => set_proc, proc_node, proc_node_mut, is_proc;
    enum_: Enum => set_enum, enum_node, enum_node_mut, is_enum;
    struct_: Struct => set_struct, struct_node, struct_node_mut, is_struct;
    union_: Union => set_union, union_node, union_node_mut, is_union;
    family_: Family => set_family, family_node, family_node_mut, is_family;
    cast_: Cast => set_cast, cast_node, cast_node_mut, is_cast;
    bitcast_: Bitcast => set_bitcast, bitcast_node, bitcast_node_mut, is_bitcast;
    import_: Import => set_import, import_node, import_node_mut, is_import;
    ns_: Ns => set_ns, ns_node, ns_node_mut, is_ns;
    defer_: Defer => set_defer, defer_node, defer_node_mut, is_defer;
    yield_: Yield => set_yield, yield_node, yield_node_mut, is_yield;
    break_: Break => set_break, break_node, break_node_mut, is_break;
    continue_: Continue => set_continue, continue_node, continue_node_mut, is_continue;
    return_: Return => set_return, return_node, return_node_mut, is_return;
    goto_: Goto => set_goto, goto_node, goto_node_mut, is_goto;
    with_: With => set_with, with_node, with_node_mut, is_with;
    use_: Use => set_use, use_node, use_node_mut, is_use;
}

/// Owns every AST entity and its components. Entities are allocated
/// sequentially; components live in one sparse table per shape, so a
/// handle's component is retrieved in O(1) without inheritance or cyclic
/// ownership — every edge is handle-valued and the arena outlives all of
/// them.
#[derive(Default)]
pub struct Arena {
    nodes: Vec<Node>,
    shapes: ShapeTables,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    pub fn alloc(&mut self, node: Node) -> Entity {
        let entity = Entity::from_index(self.nodes.len());
        self.nodes.push(node);
        self.shapes.grow_to(self.nodes.len());
        entity
    }

    pub fn node(&self, entity: Entity) -> &Node {
        &self.nodes[entity.to_index()]
    }

    pub fn node_mut(&mut self, entity: Entity) -> &mut Node {
        &mut self.nodes[entity.to_index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replaces the expression slot on `statement` with the result of a
    /// later constant-folding pass. The replaced node is left allocated —
    /// the arena only frees memory when it itself is torn down.
    pub fn apply_fold_result(&mut self, statement: Entity, replacement: Entity) {
        if let Some(stmt) = self.statement_mut(statement) {
            stmt.expr = Some(replacement);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn allocated_entities_have_sequential_handles() {
        let mut pool = crate::intern::InternPool::new();
        let mut arena = Arena::new();
        let a = arena.alloc(Node::root(super::super::shapes::test_token(&mut pool)));
        let b = arena.alloc(Node::child_of(super::super::shapes::test_token(&mut pool), a));
        assert_ne!(a, b);
        assert_eq!(arena.node(b).parent, Some(a));
    }

    #[test]
    fn shape_tables_are_mutually_exclusive_per_entity() {
        let mut pool = crate::intern::InternPool::new();
        let mut arena = Arena::new();
        let a = arena.alloc(Node::root(super::super::shapes::test_token(&mut pool)));
        arena.set_identifier(a, Identifier { name: pool.intern("x"), scope: a, block: a });
        assert!(arena.is_identifier(a));
        assert!(!arena.is_block(a));
    }
}
