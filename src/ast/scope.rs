use std::collections::HashMap;

use super::entity::Entity;

/// One nesting level of identifier visibility. The `identifiers` map stores
/// both a declaration's bare name and, if it was declared under a qualified
/// path (`numbers::to_roman_numeral`), every partial-qualified suffix too,
/// so a reference written either way resolves without re-splitting at
/// lookup time.
#[derive(Clone, Debug)]
pub struct Scope {
    pub parent: Option<Entity>,
    pub children: Vec<Entity>,
    identifiers: HashMap<String, Entity>,
}

impl Scope {
    pub fn root() -> Scope {
        Scope { parent: None, children: Vec::new(), identifiers: HashMap::new() }
    }

    pub fn child_of(parent: Entity) -> Scope {
        Scope { parent: Some(parent), children: Vec::new(), identifiers: HashMap::new() }
    }

    /// Declares `name` in this scope. If `name` is qualified
    /// (`a::b::c`), every suffix (`b::c`, `c`) is also registered so
    /// lookups by any partially-qualified spelling succeed.
    pub fn declare(&mut self, name: &str, entity: Entity) {
        self.identifiers.insert(name.to_string(), entity);
        let segments: Vec<&str> = name.split("::").collect();
        for start in 1..segments.len() {
            let suffix = segments[start..].join("::");
            self.identifiers.entry(suffix).or_insert(entity);
        }
    }

    /// Looks up `name` in this scope only (no ancestor search).
    pub fn resolve_local(&self, name: &str) -> Option<Entity> {
        self.identifiers.get(name).copied()
    }

    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.identifiers.contains_key(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entity_at(index: usize) -> Entity {
        Entity::from_index(index)
    }

    #[test]
    fn declare_registers_bare_name() {
        let mut scope = Scope::root();
        scope.declare("numbers::to_roman_numeral", entity_at(0));
        assert_eq!(scope.resolve_local("to_roman_numeral"), Some(entity_at(0)));
        assert_eq!(scope.resolve_local("numbers::to_roman_numeral"), Some(entity_at(0)));
    }

    #[test]
    fn unqualified_declaration_has_no_suffixes() {
        let mut scope = Scope::root();
        scope.declare("x", entity_at(1));
        assert_eq!(scope.resolve_local("x"), Some(entity_at(1)));
    }
}
