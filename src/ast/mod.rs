//! Entity-component AST: opaque handles indexing sparse per-shape
//! component tables, plus the scope model the parser builds identifier
//! bindings into.
//!
//! One table per component type, reimagined without inheritance: a node's
//! shape selects which table holds its data, and small newtype handles
//! stand in for pointers between nodes.

mod arena;
mod entity;
mod scope;
pub mod shapes;
mod visitor;

pub use arena::Arena;
pub use entity::Entity;
pub use scope::Scope;
pub use visitor::{children, walk};
