//! Fixed-width instruction encoding: one opcode byte, three 7-bit
//! register fields, and a 32-bit immediate, totaling 8 bytes; `move.qw`
//! with a 64-bit immediate is 16 bytes, the second word supplying the
//! upper 32 bits.
//!
//! The opcode byte packs a `Family` and a `Size` together via a mask/offset
//! scheme, mirroring the `FromPrimitive`/`ToPrimitive`-derived enum style
//! used for the operation family below.

use num_derive::{FromPrimitive, ToPrimitive};

use crate::register::RegisterId;

pub const INSTRUCTION_BYTES: usize = 8;

/// `b`/`w`/`dw`/`qw` operand widths, encoded in the low 2 bits of the
/// opcode byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive)]
pub enum Size {
    Byte = 0,
    Word = 1,
    Dword = 2,
    Qword = 3,
}

impl Size {
    pub fn bytes(self) -> u32 {
        match self {
            Size::Byte => 1,
            Size::Word => 2,
            Size::Dword => 4,
            Size::Qword => 8,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Size::Byte => "b",
            Size::Word => "w",
            Size::Dword => "dw",
            Size::Qword => "qw",
        }
    }
}

/// The operation family, independent of operand size. `Opcode::encode`
/// folds a family and a `Size` together into the single opcode byte via a
/// mask/offset pair, the same scheme used to pack other bitfields in this
/// encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive)]
pub enum Family {
    Nop,
    Load,
    Store,
    Move,
    Movez,
    Moves,
    AddI,
    AddIs,
    AddF,
    SubI,
    SubIs,
    SubF,
    MulI,
    MulIs,
    MulF,
    DivI,
    DivIs,
    DivF,
    ModI,
    ModIs,
    MAddI,
    MAddIs,
    MAddF,
    NegIs,
    NegF,
    Shr,
    Shl,
    Ror,
    Rol,
    And,
    Or,
    Xor,
    Not,
    PushI,
    PushS,
    PushM,
    PopS,
    PopM,
    Call,
    Ret,
    Trap,
    Jump,
    Beq,
    Bne,
    Bg,
    Bge,
    Bl,
    Ble,
    Bos,
    Boc,
    Bcs,
    Bcc,
    Seq,
    Sne,
    Sg,
    Sge,
    Sl,
    Sle,
    Sos,
    Soc,
    Scs,
    Scc,
    CmpI,
    CmpIs,
    CmpF,
    Bis,
    Bic,
    Exit,
}

impl Family {
    /// Families whose operand width varies with `Size`; everything else
    /// ignores the low 2 bits of the opcode byte.
    pub fn is_sized(self) -> bool {
        !matches!(
            self,
            Family::Nop
                | Family::PushI
                | Family::PushS
                | Family::PushM
                | Family::PopS
                | Family::PopM
                | Family::Call
                | Family::Ret
                | Family::Trap
                | Family::Jump
                | Family::Beq
                | Family::Bne
                | Family::Bg
                | Family::Bge
                | Family::Bl
                | Family::Ble
                | Family::Bos
                | Family::Boc
                | Family::Bcs
                | Family::Bcc
                | Family::Seq
                | Family::Sne
                | Family::Sg
                | Family::Sge
                | Family::Sl
                | Family::Sle
                | Family::Sos
                | Family::Soc
                | Family::Scs
                | Family::Scc
                | Family::Bis
                | Family::Bic
                | Family::Exit
        )
    }
}

/// A decoded instruction: family, operand size, the three register fields
/// (unused ones left at `RegisterId::R0`), the 32-bit immediate (or the
/// low half of a 64-bit one), and the optional continuation word.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub family: Family,
    pub size: Size,
    pub rd: RegisterId,
    pub rs1: RegisterId,
    pub rs2: RegisterId,
    pub immediate: i32,
    pub continuation: Option<i32>,
}

impl Instruction {
    pub fn r(family: Family, size: Size, rd: RegisterId, rs1: RegisterId, rs2: RegisterId) -> Instruction {
        Instruction { family, size, rd, rs1, rs2, immediate: 0, continuation: None }
    }

    pub fn i(family: Family, size: Size, rd: RegisterId, rs1: RegisterId, immediate: i32) -> Instruction {
        Instruction { family, size, rd, rs1, rs2: RegisterId::R0, immediate, continuation: None }
    }

    /// Full 64-bit immediate, combining `immediate` (low 32 bits) with
    /// `continuation` (high 32 bits) when present.
    pub fn immediate64(&self) -> i64 {
        let low = self.immediate as u32 as u64;
        let high = self.continuation.unwrap_or(0) as u32 as u64;
        ((high << 32) | low) as i64
    }

    pub fn with_continuation(mut self, high: i32) -> Instruction {
        self.continuation = Some(high);
        self
    }

    /// Number of bytes this instruction occupies: 16 when it carries a
    /// continuation word, 8 otherwise.
    pub fn encoded_len(&self) -> usize {
        if self.continuation.is_some() { INSTRUCTION_BYTES * 2 } else { INSTRUCTION_BYTES }
    }

    pub fn encode(&self) -> Vec<u8> {
        use num::ToPrimitive;
        let family_code = self.family.to_u8().expect("Family fits u8");
        let size_bits = if self.family.is_sized() { self.size.to_u8().expect("Size fits u8") } else { 0 };
        let opcode = (family_code << 2) | size_bits;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(opcode);
        out.push(register_byte(self.rd, self.continuation.is_some()));
        out.push(register_byte(self.rs1, false));
        out.push(register_byte(self.rs2, false));
        out.extend_from_slice(&self.immediate.to_le_bytes());
        if let Some(high) = self.continuation {
            out.push(0);
            out.push(0);
            out.push(0);
            out.push(0);
            out.extend_from_slice(&high.to_le_bytes());
        }
        out
    }

    /// Decodes one instruction from `bytes`, reading a second word when
    /// the continuation flag (the high bit of the `rd` byte) is set.
    pub fn decode(bytes: &[u8]) -> Option<Instruction> {
        if bytes.len() < INSTRUCTION_BYTES {
            return None;
        }
        use num::FromPrimitive;
        let opcode = bytes[0];
        let family = Family::from_u8(opcode >> 2)?;
        let size = Size::from_u8(opcode & 0b11)?;
        let (rd, has_continuation) = decode_register_byte(bytes[1]);
        let rs1 = RegisterId::from_index((bytes[2] & 0x7f) as usize)?;
        let rs2 = RegisterId::from_index((bytes[3] & 0x7f) as usize)?;
        let immediate = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        let mut instruction = Instruction { family, size, rd, rs1, rs2, immediate, continuation: None };
        if has_continuation {
            if bytes.len() < INSTRUCTION_BYTES * 2 {
                return None;
            }
            let high = i32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
            instruction = instruction.with_continuation(high);
        }
        Some(instruction)
    }
}

fn register_byte(id: RegisterId, continuation: bool) -> u8 {
    (id.index() as u8 & 0x7f) | if continuation { 0x80 } else { 0 }
}

fn decode_register_byte(byte: u8) -> (RegisterId, bool) {
    let id = RegisterId::from_index((byte & 0x7f) as usize).unwrap_or(RegisterId::R0);
    (id, byte & 0x80 != 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_an_i_format_instruction() {
        let instr = Instruction::i(Family::AddI, Size::Qword, RegisterId::R2, RegisterId::R0, 7);
        let bytes = instr.encode();
        assert_eq!(bytes.len(), INSTRUCTION_BYTES);
        let decoded = Instruction::decode(&bytes).unwrap();
        assert_eq!(decoded.family, Family::AddI);
        assert_eq!(decoded.size, Size::Qword);
        assert_eq!(decoded.rd, RegisterId::R2);
        assert_eq!(decoded.immediate, 7);
    }

    #[test]
    fn move_qw_with_continuation_round_trips_64_bits() {
        let value: i64 = 0x1_0000_0002;
        let instr = Instruction::i(Family::Move, Size::Qword, RegisterId::R0, RegisterId::R0, value as i32)
            .with_continuation((value >> 32) as i32);
        let bytes = instr.encode();
        assert_eq!(bytes.len(), INSTRUCTION_BYTES * 2);
        let decoded = Instruction::decode(&bytes).unwrap();
        assert_eq!(decoded.immediate64(), value);
    }

    #[test]
    fn unsized_families_ignore_the_size_bits() {
        let instr = Instruction::r(Family::Exit, Size::Byte, RegisterId::R0, RegisterId::R0, RegisterId::R0);
        let bytes = instr.encode();
        assert_eq!(bytes[0] & 0b11, 0);
    }
}
