//! The two-pass assembler: resolves label offsets against a fixed base
//! address and encodes every block into a flat byte image. Walks
//! programmatically built blocks rather than parsing source text.

use std::collections::HashSet;
use std::convert::TryFrom;

use thiserror::Error;
use vellum_vm::{Family, Instruction, RegisterId, Size};

use crate::block::{BlockEntry, InstructionBlock, JumpTarget, PendingInstruction};
use crate::labels::{LabelId, LabelPool};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("label was referenced but never defined")]
    UnresolvedLabel,
    #[error("jump distance does not fit in the immediate field")]
    JumpTooFar,
    #[error("assembled program exceeds the maximum addressable size")]
    ProgramTooLarge,
    #[error("no free register available in the requested class")]
    NoRegisterAvailable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegisterClass {
    Integer,
    Float,
}

/// What a `break`/`continue`/`return`/`fallthrough`/`next_element` inside
/// the (out-of-scope) code generator resolves to: the label its jump
/// should target.
#[derive(Clone, Copy, Debug)]
pub enum ControlFlowFrame {
    Break(LabelId),
    Continue(LabelId),
    Return(LabelId),
    Fallthrough(LabelId),
    NextElement(LabelId),
}

const INTEGER_REGISTERS: [RegisterId; 32] = [
    RegisterId::R0, RegisterId::R1, RegisterId::R2, RegisterId::R3,
    RegisterId::R4, RegisterId::R5, RegisterId::R6, RegisterId::R7,
    RegisterId::R8, RegisterId::R9, RegisterId::R10, RegisterId::R11,
    RegisterId::R12, RegisterId::R13, RegisterId::R14, RegisterId::R15,
    RegisterId::R16, RegisterId::R17, RegisterId::R18, RegisterId::R19,
    RegisterId::R20, RegisterId::R21, RegisterId::R22, RegisterId::R23,
    RegisterId::R24, RegisterId::R25, RegisterId::R26, RegisterId::R27,
    RegisterId::R28, RegisterId::R29, RegisterId::R30, RegisterId::R31,
];

/// Owns the label pool, the control-flow and target-register stacks, and
/// the sequence of instruction blocks (one "current" at a time). The
/// register allocator splits the integer block in half to stand in for a
/// float class, since there is only one unified register file; a future
/// float bank would give `Float` its own range instead.
pub struct Assembler {
    pub labels: LabelPool,
    pub control_flow: Vec<ControlFlowFrame>,
    pub targets: Vec<RegisterId>,
    blocks: Vec<InstructionBlock>,
    current: usize,
    free_integer: Vec<RegisterId>,
    used_integer: HashSet<RegisterId>,
    free_float: Vec<RegisterId>,
    used_float: HashSet<RegisterId>,
}

impl Assembler {
    pub fn new() -> Assembler {
        let mut assembler = Assembler {
            labels: LabelPool::new(),
            control_flow: Vec::new(),
            targets: Vec::new(),
            blocks: vec![InstructionBlock::new("entry")],
            current: 0,
            free_integer: INTEGER_REGISTERS[..24].iter().rev().copied().collect(),
            used_integer: HashSet::new(),
            free_float: INTEGER_REGISTERS[24..].iter().rev().copied().collect(),
            used_float: HashSet::new(),
        };
        assembler.current = 0;
        assembler
    }

    pub fn current_block(&mut self) -> &mut InstructionBlock {
        &mut self.blocks[self.current]
    }

    /// Starts a new block and makes it current, returning its index.
    pub fn new_block(&mut self, name: impl Into<String>) -> usize {
        self.blocks.push(InstructionBlock::new(name));
        self.current = self.blocks.len() - 1;
        self.current
    }

    pub fn select_block(&mut self, index: usize) {
        self.current = index;
    }

    pub fn make_label(&mut self, name: &str) -> LabelId {
        self.labels.make_label(name)
    }

    pub fn make_label_ref(&mut self, name: &str) -> LabelId {
        self.labels.make_label_ref(name)
    }

    pub fn allocate_reg(&mut self, class: RegisterClass) -> Result<RegisterId, AssembleError> {
        let (free, used) = match class {
            RegisterClass::Integer => (&mut self.free_integer, &mut self.used_integer),
            RegisterClass::Float => (&mut self.free_float, &mut self.used_float),
        };
        let reg = free.pop().ok_or(AssembleError::NoRegisterAvailable)?;
        used.insert(reg);
        Ok(reg)
    }

    pub fn free_reg(&mut self, class: RegisterClass, reg: RegisterId) {
        let (free, used) = match class {
            RegisterClass::Integer => (&mut self.free_integer, &mut self.used_integer),
            RegisterClass::Float => (&mut self.free_float, &mut self.used_float),
        };
        if used.remove(&reg) {
            free.push(reg);
        }
    }

    /// Pass 1: compute the byte offset of every entry and resolve label
    /// offsets (relative to `base_address`, since labels end up holding
    /// absolute addresses the Terp can jump to directly).
    fn layout(&mut self, base_address: u32) -> Result<u32, AssembleError> {
        let mut offset: u32 = 0;
        for block in &self.blocks {
            for entry in &block.entries {
                match entry {
                    BlockEntry::Label(id) => self.labels.resolve(*id, base_address + offset),
                    BlockEntry::Instruction(pending) => {
                        offset = offset
                            .checked_add(pending.encoded_len() as u32)
                            .ok_or(AssembleError::ProgramTooLarge)?;
                    }
                    BlockEntry::Data(bytes) => {
                        offset = offset
                            .checked_add(bytes.len() as u32)
                            .ok_or(AssembleError::ProgramTooLarge)?;
                    }
                    BlockEntry::Align(alignment) => {
                        let remainder = offset % alignment;
                        if remainder != 0 {
                            offset += alignment - remainder;
                        }
                    }
                    BlockEntry::Comment(_) => {}
                }
            }
        }
        Ok(offset)
    }

    fn resolve_target(&self, target: &JumpTarget) -> Result<i64, AssembleError> {
        match target {
            JumpTarget::Address(address) => Ok(*address),
            JumpTarget::Label(id) => {
                self.labels.offset_of(*id).map(i64::from).ok_or(AssembleError::UnresolvedLabel)
            }
        }
    }

    fn finalize(&self, pending: &PendingInstruction) -> Result<Instruction, AssembleError> {
        match pending {
            PendingInstruction::Complete(instr) => Ok(*instr),
            PendingInstruction::Branch { family, size, rd, rs1, rs2, target } => {
                let address = self.resolve_target(target)?;
                let immediate = i32::try_from(address).map_err(|_| AssembleError::JumpTooFar)?;
                Ok(Instruction { family: *family, size: *size, rd: *rd, rs1: *rs1, rs2: *rs2, immediate, continuation: None })
            }
            PendingInstruction::Jump { family, target } => {
                let address = self.resolve_target(target)?;
                let immediate = i32::try_from(address).map_err(|_| AssembleError::JumpTooFar)?;
                Ok(Instruction {
                    family: *family,
                    size: Size::Qword,
                    rd: RegisterId::R0,
                    rs1: RegisterId::R0,
                    rs2: RegisterId::R0,
                    immediate,
                    continuation: None,
                })
            }
        }
    }

    /// Two-pass assembly: resolves every label to `base_address + offset`,
    /// then encodes every block in order into a flat byte image the
    /// caller loads into the heap's program region starting at
    /// `base_address`.
    pub fn assemble(&mut self, base_address: u32) -> Result<Vec<u8>, AssembleError> {
        tracing::debug!(base_address, blocks = self.blocks.len(), "assembling");
        self.layout(base_address)?;

        let mut out = Vec::new();
        let blocks = std::mem::take(&mut self.blocks);
        for block in &blocks {
            for entry in &block.entries {
                match entry {
                    BlockEntry::Instruction(pending) => {
                        let instr = self.finalize(pending)?;
                        out.extend_from_slice(&instr.encode());
                    }
                    BlockEntry::Data(bytes) => out.extend_from_slice(bytes),
                    BlockEntry::Align(alignment) => {
                        let remainder = out.len() as u32 % alignment;
                        if remainder != 0 {
                            out.resize(out.len() + (alignment - remainder) as usize, 0);
                        }
                    }
                    BlockEntry::Label(_) | BlockEntry::Comment(_) => {}
                }
            }
        }
        self.blocks = blocks;
        tracing::debug!(bytes = out.len(), "assembly finished");
        Ok(out)
    }
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use vellum_vm::{Family, Size};

    #[test]
    fn two_instructions_assemble_back_to_back() {
        let mut asm = Assembler::new();
        asm.current_block().mov(Size::Qword, RegisterId::R0, 5);
        asm.current_block().mov(Size::Qword, RegisterId::R1, 7);
        let bytes = asm.assemble(0).unwrap();
        assert_eq!(bytes.len(), vellum_vm::INSTRUCTION_BYTES * 2);
    }

    #[test]
    fn forward_jump_resolves_to_label_address() {
        let mut asm = Assembler::new();
        let target = asm.make_label_ref("skip");
        asm.current_block().jump_direct(JumpTarget::Label(target));
        let label = asm.make_label("skip");
        asm.current_block().mov(Size::Qword, RegisterId::R0, 1);

        let base = 0x1000;
        let bytes = asm.assemble(base).unwrap();
        let jump = Instruction::decode(&bytes[..vellum_vm::INSTRUCTION_BYTES]).unwrap();
        assert_eq!(jump.family, Family::Jump);
        assert_eq!(jump.immediate64() as u32, base + vellum_vm::INSTRUCTION_BYTES as u32);
        assert_eq!(asm.labels.offset_of(label), Some(base + vellum_vm::INSTRUCTION_BYTES as u32));
    }

    #[test]
    fn register_allocator_reuses_freed_registers() {
        let mut asm = Assembler::new();
        let r1 = asm.allocate_reg(RegisterClass::Integer).unwrap();
        asm.free_reg(RegisterClass::Integer, r1);
        let r2 = asm.allocate_reg(RegisterClass::Integer).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn align_pads_to_the_next_boundary() {
        let mut asm = Assembler::new();
        asm.current_block().data(vec![1u8, 2, 3]);
        asm.current_block().align(4);
        asm.current_block().mov(Size::Qword, RegisterId::R0, 9);
        let bytes = asm.assemble(0).unwrap();
        assert_eq!(bytes.len(), 4 + vellum_vm::INSTRUCTION_BYTES);
    }
}
