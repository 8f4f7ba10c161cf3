//! Instruction blocks: an ordered sequence of entries (instructions,
//! labels, comments, alignment padding, raw data) that the assembler's two
//! passes walk over. A single entry type carries the listing metadata
//! alongside each instruction.

use vellum_vm::{Family, Instruction, RegisterId, Size};

use crate::labels::LabelId;

/// A branch/jump target that may still need resolving against the label
/// pool, mirroring `vasm::instructions::JumpTarget`.
#[derive(Clone, Copy, Debug)]
pub enum JumpTarget {
    Address(i64),
    Label(LabelId),
}

/// An instruction whose encoding depends on a label offset that may not
/// be known yet. `Complete` instructions (the common case: arithmetic,
/// moves, loads/stores with a known immediate) need no second look.
#[derive(Clone, Debug)]
pub enum PendingInstruction {
    Complete(Instruction),
    Branch { family: Family, size: Size, rd: RegisterId, rs1: RegisterId, rs2: RegisterId, target: JumpTarget },
    Jump { family: Family, target: JumpTarget },
}

impl PendingInstruction {
    /// Byte length this entry will occupy once encoded. Branches and
    /// jumps never need the 64-bit continuation word: only `move.qw`
    /// literals do, and those only ever arrive as `Complete`.
    pub fn encoded_len(&self) -> usize {
        match self {
            PendingInstruction::Complete(instr) => instr.encoded_len(),
            PendingInstruction::Branch { .. } | PendingInstruction::Jump { .. } => {
                vellum_vm::INSTRUCTION_BYTES
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ListingKind {
    Blank,
    Instruction,
    Directive,
    Label,
    Comment,
}

#[derive(Clone, Debug)]
pub enum BlockEntry {
    Instruction(PendingInstruction),
    Label(LabelId),
    Comment(String),
    /// Pads the running offset up to the next multiple of `alignment`.
    Align(u32),
    Data(Vec<u8>),
}

impl BlockEntry {
    pub fn listing_kind(&self) -> ListingKind {
        match self {
            BlockEntry::Instruction(_) => ListingKind::Instruction,
            BlockEntry::Label(_) => ListingKind::Label,
            BlockEntry::Comment(_) => ListingKind::Comment,
            BlockEntry::Align(_) | BlockEntry::Data(_) => ListingKind::Directive,
        }
    }
}

/// One named instruction block. Code-gen (out of scope) appends entries
/// through the builder methods; `Assembler::assemble` walks every block in
/// order.
#[derive(Default)]
pub struct InstructionBlock {
    pub name: String,
    pub entries: Vec<BlockEntry>,
}

impl InstructionBlock {
    pub fn new(name: impl Into<String>) -> InstructionBlock {
        InstructionBlock { name: name.into(), entries: Vec::new() }
    }

    pub fn label(&mut self, id: LabelId) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Label(id));
        self
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Comment(text.into()));
        self
    }

    pub fn align(&mut self, alignment: u32) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Align(alignment));
        self
    }

    pub fn data(&mut self, bytes: impl Into<Vec<u8>>) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Data(bytes.into()));
        self
    }

    fn push(&mut self, instr: Instruction) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Instruction(PendingInstruction::Complete(instr)));
        self
    }

    pub fn mov(&mut self, size: Size, rd: RegisterId, immediate: i32) -> &mut InstructionBlock {
        self.push(Instruction::i(Family::Move, size, rd, RegisterId::R0, immediate))
    }

    pub fn mov64(&mut self, rd: RegisterId, immediate: i64) -> &mut InstructionBlock {
        let instr = Instruction::i(Family::Move, Size::Qword, rd, RegisterId::R0, immediate as i32)
            .with_continuation((immediate >> 32) as i32);
        self.push(instr)
    }

    pub fn load(&mut self, size: Size, rd: RegisterId, base: RegisterId, offset: i32) -> &mut InstructionBlock {
        self.push(Instruction::i(Family::Load, size, rd, base, offset))
    }

    pub fn store(&mut self, size: Size, value: RegisterId, base: RegisterId, offset: i32) -> &mut InstructionBlock {
        self.push(Instruction::i(Family::Store, size, value, base, offset))
    }

    pub fn bz(&mut self, rs1: RegisterId, target: JumpTarget) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Instruction(PendingInstruction::Branch {
            family: Family::Beq,
            size: Size::Qword,
            rd: RegisterId::R0,
            rs1,
            rs2: RegisterId::R0,
            target,
        }));
        self
    }

    pub fn jump_direct(&mut self, target: JumpTarget) -> &mut InstructionBlock {
        self.entries.push(BlockEntry::Instruction(PendingInstruction::Jump { family: Family::Jump, target }));
        self
    }

    pub fn push_reg(&mut self, size: Size, rs1: RegisterId) -> &mut InstructionBlock {
        self.push(Instruction::r(Family::PushS, size, RegisterId::R0, rs1, RegisterId::R0))
    }

    pub fn pop_reg(&mut self, size: Size, rd: RegisterId) -> &mut InstructionBlock {
        self.push(Instruction::r(Family::PopS, size, rd, RegisterId::R0, RegisterId::R0))
    }
}
