//! Register file: 35 named registers holding a tagged 64-bit value, plus
//! the flag register.
//!
//! Registers are 64 bits wide so `qw`-sized operations have somewhere to
//! put a full 64-bit value: 32 general-purpose registers plus `PC`, `SP`,
//! and `FP`.

use num_derive::{FromPrimitive, ToPrimitive};
use util_derive::{EnumFromStr, InteropGetName};

pub const REGISTER_COUNT: usize = 35;

/// One 64-bit register, reinterpreted as signed, unsigned, or float on
/// read. A union of reinterpretations rather than a tagged enum, since the
/// VM never needs to know which interpretation was last written — only the
/// instruction reading it does.
#[derive(Clone, Copy)]
pub union Register {
    i: i64,
    u: u64,
    f: f64,
}

impl Register {
    pub fn i(self) -> i64 {
        unsafe { self.i }
    }

    pub fn u(self) -> u64 {
        unsafe { self.u }
    }

    pub fn f(self) -> f64 {
        unsafe { self.f }
    }

    pub fn set_i(&mut self, value: i64) {
        self.i = value;
    }

    pub fn set_u(&mut self, value: u64) {
        self.u = value;
    }

    pub fn set_f(&mut self, value: f64) {
        self.f = value;
    }
}

impl Default for Register {
    fn default() -> Register {
        Register { u: 0 }
    }
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Register({:#018x})", self.u())
    }
}

/// Register identifiers, addressed by a 7-bit field in the instruction
/// encoding (0..127). Slots 35..127 are reserved for future register-class
/// growth and decode to `RegisterId::try_from` failure today.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive, InteropGetName, EnumFromStr)]
pub enum RegisterId {
    R0, R1, R2, R3, R4, R5, R6, R7,
    R8, R9, R10, R11, R12, R13, R14, R15,
    R16, R17, R18, R19, R20, R21, R22, R23,
    R24, R25, R26, R27, R28, R29, R30, R31,
    PC,
    SP,
    FP,
}

impl RegisterId {
    pub fn from_index(index: usize) -> Option<RegisterId> {
        use num::FromPrimitive;
        RegisterId::from_usize(index)
    }

    pub fn index(self) -> usize {
        use num::ToPrimitive;
        self.to_usize().expect("RegisterId always fits usize")
    }
}

/// `Z`/`C`/`V`/`N` update on every arithmetic/logic write; `E`/`S` update
/// only on `cmp*`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Flags {
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,
    pub negative: bool,
    pub equal: bool,
    pub less: bool,
}

impl Flags {
    pub fn set_from_i64(&mut self, result: i64, carry: bool, overflow: bool) {
        self.zero = result == 0;
        self.negative = result < 0;
        self.carry = carry;
        self.overflow = overflow;
    }

    pub fn set_from_cmp(&mut self, equal: bool, less: bool) {
        self.equal = equal;
        self.less = less;
    }
}

/// The 35-register file plus the flag register, indexable by `RegisterId`.
#[derive(Clone, Debug)]
pub struct RegisterFile {
    registers: [Register; REGISTER_COUNT],
    pub flags: Flags,
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        RegisterFile { registers: [Register::default(); REGISTER_COUNT], flags: Flags::default() }
    }

    pub fn get(&self, id: RegisterId) -> Register {
        self.registers[id.index()]
    }

    pub fn set(&mut self, id: RegisterId, value: Register) {
        self.registers[id.index()] = value;
    }

    pub fn reset(&mut self) {
        self.registers = [Register::default(); REGISTER_COUNT];
        self.flags = Flags::default();
    }
}

impl Default for RegisterFile {
    fn default() -> RegisterFile {
        RegisterFile::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_reinterprets_bit_pattern() {
        let mut r = Register::default();
        r.set_i(-1);
        assert_eq!(r.u(), u64::MAX);
    }

    #[test]
    fn register_file_round_trips_by_id() {
        let mut file = RegisterFile::new();
        let mut value = Register::default();
        value.set_i(42);
        file.set(RegisterId::R3, value);
        assert_eq!(file.get(RegisterId::R3).i(), 42);
        assert_eq!(file.get(RegisterId::R4).i(), 0);
    }

    #[test]
    fn pc_sp_fp_follow_the_general_purpose_block() {
        assert_eq!(RegisterId::PC.index(), 32);
        assert_eq!(RegisterId::SP.index(), 33);
        assert_eq!(RegisterId::FP.index(), 34);
    }
}
