use std::num::NonZeroU32;

/// An opaque handle into an `Arena`. Stable for the arena's lifetime;
/// compares and hashes in O(1), a small newtype handle rather than a
/// pointer or reference into the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Entity(NonZeroU32);

impl Entity {
    pub(super) fn from_index(index: usize) -> Entity {
        Entity(NonZeroU32::new(index as u32 + 1).expect("arena entity index overflow"))
    }

    pub(super) fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "%{}", self.0.get())
    }
}
