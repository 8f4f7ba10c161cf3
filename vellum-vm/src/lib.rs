//! Register-based virtual machine: register file, heap, fixed-width
//! instruction encoding, the foreign-function bridge, and the `Terp`
//! interpreter that ties them together.

pub mod ffi;
pub mod heap;
pub mod instruction;
pub mod register;
pub mod terp;

pub use ffi::{FfiError, FfiType, ForeignFunctionTable, FunctionSignature};
pub use heap::{Heap, HeapVector, Storage, StorageMut};
pub use instruction::{Family, Instruction, Size, INSTRUCTION_BYTES};
pub use register::{Flags, Register, RegisterFile, RegisterId, REGISTER_COUNT};
pub use terp::{Breakpoint, BreakpointKind, ExitCode, TickResult, VmError, Terp};
