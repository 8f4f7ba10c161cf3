//! The label pool: names unique within one assembly run, resolved to a
//! byte offset once `Assembler::assemble` finishes its first pass.
//!
//! A pool of handles that a programmatic builder can hand out before the
//! name's definition site has been emitted — `make_label_ref` covers the
//! forward-reference case, where a branch or jump targets a label that is
//! only defined later.

use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LabelId(pub(crate) u32);

#[derive(Default)]
pub struct LabelPool {
    names: HashMap<String, LabelId>,
    offsets: Vec<Option<u32>>,
}

impl LabelPool {
    pub fn new() -> LabelPool {
        LabelPool::default()
    }

    /// Declares a fresh, anonymous label (used for compiler-generated
    /// control-flow targets that never get a source name).
    pub fn make_anonymous(&mut self) -> LabelId {
        let id = LabelId(self.offsets.len() as u32);
        self.offsets.push(None);
        id
    }

    /// Declares `name`, or returns its existing handle if some earlier
    /// `make_label_ref` already reserved it as a forward reference.
    pub fn make_label(&mut self, name: &str) -> LabelId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.make_anonymous();
        self.names.insert(name.to_owned(), id);
        id
    }

    /// Returns a reference to `name`, reserving the handle if this is the
    /// first time it has been mentioned.
    pub fn make_label_ref(&mut self, name: &str) -> LabelId {
        self.make_label(name)
    }

    pub fn resolve(&mut self, id: LabelId, offset: u32) {
        self.offsets[id.0 as usize] = Some(offset);
    }

    pub fn offset_of(&self, id: LabelId) -> Option<u32> {
        self.offsets[id.0 as usize]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forward_reference_resolves_after_definition() {
        let mut pool = LabelPool::new();
        let reference = pool.make_label_ref("loop_top");
        assert_eq!(pool.offset_of(reference), None);

        let definition = pool.make_label("loop_top");
        assert_eq!(reference, definition);

        pool.resolve(definition, 42);
        assert_eq!(pool.offset_of(reference), Some(42));
    }

    #[test]
    fn distinct_names_get_distinct_handles() {
        let mut pool = LabelPool::new();
        let a = pool.make_label("a");
        let b = pool.make_label("b");
        assert_ne!(a, b);
    }
}
