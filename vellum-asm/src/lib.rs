//! Programmatic assembler, instruction blocks, listing, and the debugger
//! bridge built on top of `vellum-vm`'s register file and encoding.

pub mod assembler;
pub mod block;
pub mod labels;
pub mod listing;

pub use assembler::{AssembleError, Assembler, ControlFlowFrame, RegisterClass};
pub use block::{BlockEntry, InstructionBlock, JumpTarget, ListingKind, PendingInstruction};
pub use labels::{LabelId, LabelPool};
pub use listing::{register_equals_breakpoint, simple_breakpoint, DebuggerBridge, Listing, ListingLine};
