//! The interpreter loop: decode-execute-update-flags.
//!
//! A giant match over the decoded 8-byte instruction, using `Wrapping<T>`
//! arithmetic and per-interpretation `write_i`/`write_u`/`write_f`/`div`/
//! `set_if` helpers against the 64-bit register file and flag register.

use std::collections::HashMap;
use std::num::Wrapping;

use thiserror::Error;

use crate::ffi::{FfiError, ForeignFunctionTable, FunctionSignature};
use crate::heap::{Heap, HeapVector, Storage, StorageMut};
use crate::instruction::{Family, Instruction, Size, INSTRUCTION_BYTES};
use crate::register::{Register, RegisterFile, RegisterId};

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ExitCode {
    #[error("halted normally")]
    Halted,
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("unmapped memory access")]
    UnmappedMemory,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("unknown trap number")]
    UnknownTrap,
    #[error("exited with an unbalanced stack")]
    UnbalancedStack,
}

#[derive(Debug, Error)]
pub enum VmError {
    #[error(transparent)]
    Ffi(#[from] FfiError),
    #[error("{0}")]
    Exit(ExitCode),
}

pub enum TickResult {
    Running,
    Break,
    Exit(ExitCode),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BreakpointKind {
    Simple,
    FlagSet,
    FlagClear,
    RegisterEquals,
}

#[derive(Clone, Copy, Debug)]
pub struct Breakpoint {
    pub address: u32,
    pub enabled: bool,
    pub kind: BreakpointKind,
    pub register: Option<RegisterId>,
    pub expected: u64,
}

/// Register-based Terp: a register file, a heap (program + free space +
/// stack), a breakpoint map, and a foreign-function table, executed one
/// instruction at a time via `step`.
pub struct Terp {
    registers: RegisterFile,
    heap: Heap,
    heap_size: u32,
    stack_size: u32,
    breakpoints: HashMap<u32, Breakpoint>,
    foreign: ForeignFunctionTable,
    exited: bool,
    broken: bool,
}

impl Terp {
    pub fn new(heap_size: u32, stack_size: u32) -> Terp {
        let heap = Heap::new(heap_size, stack_size);
        let mut registers = RegisterFile::new();
        let top_of_stack = heap.heap_vector(HeapVector::TopOfStack);
        let program_start = heap.heap_vector(HeapVector::ProgramStart);
        registers.set(RegisterId::SP, reg_u(top_of_stack as u64));
        registers.set(RegisterId::FP, reg_u(top_of_stack as u64));
        registers.set(RegisterId::PC, reg_u(program_start as u64));

        Terp {
            registers,
            heap,
            heap_size,
            stack_size,
            breakpoints: HashMap::new(),
            foreign: ForeignFunctionTable::new(),
            exited: false,
            broken: false,
        }
    }

    pub fn load_program(&mut self, program: &[u8]) {
        self.heap.load_program(program);
    }

    pub fn register_trap(&mut self, trap: u32, signature: FunctionSignature) -> Result<(), FfiError> {
        self.foreign.register(trap, signature)
    }

    pub fn set_breakpoint(&mut self, breakpoint: Breakpoint) {
        self.breakpoints.insert(breakpoint.address, breakpoint);
    }

    pub fn clear_breakpoint(&mut self, address: u32) {
        self.breakpoints.remove(&address);
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn register_file(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_size(&self) -> u32 {
        self.heap_size
    }

    pub fn stack_size(&self) -> u32 {
        self.stack_size
    }

    pub fn heap_vector(&self, which: HeapVector) -> u32 {
        self.heap.heap_vector(which)
    }

    pub fn read(&self, size: u32, address: u32) -> Option<u64> {
        self.heap.read(address, size)
    }

    /// Re-initializes the register file and heap vectors without
    /// re-allocating the heap.
    pub fn reset(&mut self) {
        self.registers.reset();
        let top_of_stack = self.heap.heap_vector(HeapVector::TopOfStack);
        let program_start = self.heap.heap_vector(HeapVector::ProgramStart);
        self.registers.set(RegisterId::SP, reg_u(top_of_stack as u64));
        self.registers.set(RegisterId::FP, reg_u(top_of_stack as u64));
        self.registers.set(RegisterId::PC, reg_u(program_start as u64));
        self.exited = false;
        self.broken = false;
    }

    fn pc(&self) -> u32 {
        self.registers.get(RegisterId::PC).u() as u32
    }

    fn set_pc(&mut self, value: u32) {
        self.registers.set(RegisterId::PC, reg_u(value as u64));
    }

    fn sp(&self) -> u32 {
        self.registers.get(RegisterId::SP).u() as u32
    }

    fn set_sp(&mut self, value: u32) {
        self.registers.set(RegisterId::SP, reg_u(value as u64));
    }

    fn breakpoint_hits(&self, address: u32) -> bool {
        match self.breakpoints.get(&address) {
            None => false,
            Some(bp) if !bp.enabled => false,
            Some(bp) => match bp.kind {
                BreakpointKind::Simple => true,
                BreakpointKind::FlagSet => self.flag_named(bp.expected) ,
                BreakpointKind::FlagClear => !self.flag_named(bp.expected),
                BreakpointKind::RegisterEquals => {
                    bp.register.map(|r| self.registers.get(r).u() == bp.expected).unwrap_or(false)
                }
            },
        }
    }

    fn flag_named(&self, which: u64) -> bool {
        match which {
            0 => self.registers.flags.zero,
            1 => self.registers.flags.carry,
            2 => self.registers.flags.overflow,
            3 => self.registers.flags.negative,
            4 => self.registers.flags.equal,
            _ => self.registers.flags.less,
        }
    }

    /// Decodes and executes the instruction at `PC`, advancing `PC` past
    /// it (branches overwrite `PC` again inside the match). Checks the
    /// breakpoint map before decoding.
    pub fn step(&mut self) -> Result<TickResult, VmError> {
        if self.exited {
            return Ok(TickResult::Exit(ExitCode::Halted));
        }
        let address = self.pc();
        if self.breakpoint_hits(address) {
            self.broken = true;
            return Ok(TickResult::Break);
        }
        self.broken = false;

        let bytes = match self.heap.read_bytes(address, INSTRUCTION_BYTES as u32 * 2) {
            Some(bytes) => bytes.to_vec(),
            None => match self.heap.read_bytes(address, INSTRUCTION_BYTES as u32) {
                Some(bytes) => bytes.to_vec(),
                None => return self.exit(ExitCode::UnmappedMemory),
            },
        };
        let instruction = match Instruction::decode(&bytes) {
            Some(instr) => instr,
            None => return self.exit(ExitCode::InvalidOpcode),
        };
        self.set_pc(address + instruction.encoded_len() as u32);
        self.execute(instruction)
    }

    pub fn run(&mut self) -> Result<ExitCode, VmError> {
        tracing::debug!(pc = self.pc(), "starting run");
        loop {
            match self.step()? {
                TickResult::Running => continue,
                TickResult::Break => {
                    tracing::debug!(pc = self.pc(), "hit breakpoint");
                    return Ok(ExitCode::Halted);
                }
                TickResult::Exit(code) => {
                    tracing::debug!(?code, "terp exited");
                    return Ok(code);
                }
            }
        }
    }

    fn exit(&mut self, code: ExitCode) -> Result<TickResult, VmError> {
        self.exited = true;
        Ok(TickResult::Exit(code))
    }

    fn read_rd(&self, instr: &Instruction) -> Register {
        self.registers.get(instr.rd)
    }
    fn read_rs1(&self, instr: &Instruction) -> Register {
        self.registers.get(instr.rs1)
    }
    fn read_rs2(&self, instr: &Instruction) -> Register {
        self.registers.get(instr.rs2)
    }

    fn write_i(&mut self, instr: &Instruction, value: Wrapping<i64>) {
        self.write_i_flags(instr, value, false, false);
    }

    fn write_i_flags(&mut self, instr: &Instruction, value: Wrapping<i64>, carry: bool, overflow: bool) {
        let mut r = Register::default();
        r.set_i(value.0);
        self.registers.set(instr.rd, r);
        self.registers.flags.set_from_i64(value.0, carry, overflow);
    }

    fn write_f(&mut self, instr: &Instruction, value: f64) {
        let mut r = Register::default();
        r.set_f(value);
        self.registers.set(instr.rd, r);
        self.registers.flags.zero = value == 0.0;
        self.registers.flags.negative = value < 0.0;
    }

    fn push(&mut self, value: u64, size: u32) -> Result<(), ExitCode> {
        let new_sp = self.sp().checked_sub(size).ok_or(ExitCode::StackUnderflow)?;
        if new_sp < self.heap.heap_vector(HeapVector::BottomOfStack) {
            return Err(ExitCode::StackOverflow);
        }
        if !self.heap.write(new_sp, size, value) {
            return Err(ExitCode::UnmappedMemory);
        }
        self.set_sp(new_sp);
        Ok(())
    }

    fn pop(&mut self, size: u32) -> Result<u64, ExitCode> {
        let sp = self.sp();
        if sp + size > self.heap.heap_vector(HeapVector::TopOfStack) {
            return Err(ExitCode::StackUnderflow);
        }
        let value = self.heap.read(sp, size).ok_or(ExitCode::UnmappedMemory)?;
        self.set_sp(sp + size);
        Ok(value)
    }

    fn execute(&mut self, instr: Instruction) -> Result<TickResult, VmError> {
        let size_bytes = instr.size.bytes();
        let rs1i = Wrapping(self.read_rs1(&instr).i());
        let rs2i = Wrapping(self.read_rs2(&instr).i());
        let rs1f = self.read_rs1(&instr).f();
        let rs2f = self.read_rs2(&instr).f();
        let immediate = Wrapping(instr.immediate64());

        match instr.family {
            Family::Nop => {}

            Family::Move => {
                self.write_i(&instr, immediate);
            }
            Family::Movez => {
                self.write_i(&instr, Wrapping(zero_extend(immediate.0, instr.size)));
            }
            Family::Moves => {
                self.write_i(&instr, Wrapping(sign_extend(immediate.0, instr.size)));
            }

            Family::Load => {
                let address = (rs1i + immediate).0 as u32;
                match self.heap.read(address, size_bytes) {
                    Some(value) => self.write_i(&instr, Wrapping(value as i64)),
                    None => return self.exit(ExitCode::UnmappedMemory),
                }
            }
            Family::Store => {
                let address = (rs1i + immediate).0 as u32;
                let value = self.read_rd(&instr).u();
                if !self.heap.write(address, size_bytes, value) {
                    return self.exit(ExitCode::UnmappedMemory);
                }
            }

            Family::AddI | Family::AddIs => {
                let (result, carry, overflow) = add_with_flags(rs1i.0, rs2i.0);
                self.write_i_flags(&instr, Wrapping(result), carry, overflow);
            }
            Family::SubI | Family::SubIs => {
                let (result, carry, overflow) = sub_with_flags(rs1i.0, rs2i.0);
                self.write_i_flags(&instr, Wrapping(result), carry, overflow);
            }
            Family::MulI | Family::MulIs => {
                let (result, carry, overflow) = mul_with_flags(rs1i.0, rs2i.0);
                self.write_i_flags(&instr, Wrapping(result), carry, overflow);
            }
            Family::DivI | Family::DivIs => {
                if rs2i.0 == 0 {
                    return self.exit(ExitCode::DivisionByZero);
                }
                let (result, overflow) = rs1i.0.overflowing_div(rs2i.0);
                self.write_i_flags(&instr, Wrapping(result), false, overflow);
            }
            Family::ModI | Family::ModIs => {
                if rs2i.0 == 0 {
                    return self.exit(ExitCode::DivisionByZero);
                }
                let (result, overflow) = rs1i.0.overflowing_rem(rs2i.0);
                self.write_i_flags(&instr, Wrapping(result), false, overflow);
            }
            Family::MAddI | Family::MAddIs => {
                let (product, mul_carry, mul_overflow) = mul_with_flags(rs1i.0, rs2i.0);
                let (result, add_carry, add_overflow) = add_with_flags(product, immediate.0);
                self.write_i_flags(&instr, Wrapping(result), mul_carry || add_carry, mul_overflow || add_overflow);
            }
            Family::NegIs => {
                let (result, overflow) = rs1i.0.overflowing_neg();
                self.write_i_flags(&instr, Wrapping(result), rs1i.0 != 0, overflow);
            }

            Family::AddF => self.write_f(&instr, rs1f + rs2f),
            Family::SubF => self.write_f(&instr, rs1f - rs2f),
            Family::MulF => self.write_f(&instr, rs1f * rs2f),
            Family::DivF => self.write_f(&instr, rs1f / rs2f),
            Family::MAddF => self.write_f(&instr, rs1f * rs2f + self.read_rd(&instr).f()),
            Family::NegF => self.write_f(&instr, -rs1f),

            Family::Shr => self.write_i(&instr, Wrapping(((rs1i.0 as u64) >> (rs2i.0 as u32 & 63)) as i64)),
            Family::Shl => self.write_i(&instr, Wrapping(rs1i.0.wrapping_shl(rs2i.0 as u32 & 63))),
            Family::Ror => self.write_i(&instr, Wrapping((rs1i.0 as u64).rotate_right(rs2i.0 as u32 & 63) as i64)),
            Family::Rol => self.write_i(&instr, Wrapping((rs1i.0 as u64).rotate_left(rs2i.0 as u32 & 63) as i64)),
            Family::And => self.write_i(&instr, rs1i & rs2i),
            Family::Or => self.write_i(&instr, rs1i | rs2i),
            Family::Xor => self.write_i(&instr, rs1i ^ rs2i),
            Family::Not => self.write_i(&instr, !rs1i),

            Family::PushI => self.push(immediate.0 as u64, 8).map_err(VmError::Exit)?,
            Family::PushS => self.push(self.read_rs1(&instr).u(), size_bytes).map_err(VmError::Exit)?,
            Family::PushM => {
                for id in 0..crate::register::REGISTER_COUNT as u32 {
                    let reg = RegisterId::from_index(id as usize).expect("in range");
                    self.push(self.registers.get(reg).u(), 8).map_err(VmError::Exit)?;
                }
            }
            Family::PopS => {
                let value = self.pop(size_bytes).map_err(VmError::Exit)?;
                self.write_i(&instr, Wrapping(value as i64));
            }
            Family::PopM => {
                for id in (0..crate::register::REGISTER_COUNT as u32).rev() {
                    let reg = RegisterId::from_index(id as usize).expect("in range");
                    let value = self.pop(8).map_err(VmError::Exit)?;
                    let mut r = Register::default();
                    r.set_u(value);
                    self.registers.set(reg, r);
                }
            }

            Family::Call => {
                self.push(self.pc() as u64, 4).map_err(VmError::Exit)?;
                self.set_pc(instr.immediate64() as u32);
            }
            Family::Ret => {
                let address = self.pop(4).map_err(VmError::Exit)?;
                self.set_pc(address as u32);
            }
            Family::Jump => self.set_pc(instr.immediate64() as u32),

            Family::Beq => self.branch_if(rs1i.0 == rs2i.0, instr.immediate64() as u32),
            Family::Bne => self.branch_if(rs1i.0 != rs2i.0, instr.immediate64() as u32),
            Family::Bg => self.branch_if(rs1i.0 > rs2i.0, instr.immediate64() as u32),
            Family::Bge => self.branch_if(rs1i.0 >= rs2i.0, instr.immediate64() as u32),
            Family::Bl => self.branch_if(rs1i.0 < rs2i.0, instr.immediate64() as u32),
            Family::Ble => self.branch_if(rs1i.0 <= rs2i.0, instr.immediate64() as u32),
            Family::Bos => self.branch_if(self.registers.flags.overflow, instr.immediate64() as u32),
            Family::Boc => self.branch_if(!self.registers.flags.overflow, instr.immediate64() as u32),
            Family::Bcs => self.branch_if(self.registers.flags.carry, instr.immediate64() as u32),
            Family::Bcc => self.branch_if(!self.registers.flags.carry, instr.immediate64() as u32),
            Family::Bis => self.branch_if(self.flag_named(instr.immediate as u64), instr.immediate64() as u32),
            Family::Bic => self.branch_if(!self.flag_named(instr.immediate as u64), instr.immediate64() as u32),

            Family::Seq => self.set_if(&instr, rs1i.0 == rs2i.0),
            Family::Sne => self.set_if(&instr, rs1i.0 != rs2i.0),
            Family::Sg => self.set_if(&instr, rs1i.0 > rs2i.0),
            Family::Sge => self.set_if(&instr, rs1i.0 >= rs2i.0),
            Family::Sl => self.set_if(&instr, rs1i.0 < rs2i.0),
            Family::Sle => self.set_if(&instr, rs1i.0 <= rs2i.0),
            Family::Sos => self.set_if(&instr, self.registers.flags.overflow),
            Family::Soc => self.set_if(&instr, !self.registers.flags.overflow),
            Family::Scs => self.set_if(&instr, self.registers.flags.carry),
            Family::Scc => self.set_if(&instr, !self.registers.flags.carry),

            Family::CmpI | Family::CmpIs => {
                self.registers.flags.set_from_cmp(rs1i.0 == rs2i.0, rs1i.0 < rs2i.0);
            }
            Family::CmpF => {
                self.registers.flags.set_from_cmp(rs1f == rs2f, rs1f < rs2f);
            }

            Family::Trap => {
                let args: Vec<Register> = vec![self.read_rs1(&instr), self.read_rs2(&instr)];
                let trap_number = instr.immediate as u32;
                let result = self.foreign.call(trap_number, &args).map_err(VmError::Ffi)?;
                let mut r = Register::default();
                r.set_u(result);
                self.registers.set(instr.rd, r);
            }

            Family::Exit => {
                let top_of_stack = self.heap.heap_vector(HeapVector::TopOfStack);
                if self.sp() != top_of_stack {
                    return self.exit(ExitCode::UnbalancedStack);
                }
                return self.exit(ExitCode::Halted);
            }
        }

        Ok(TickResult::Running)
    }

    fn branch_if(&mut self, condition: bool, target: u32) {
        if condition {
            self.set_pc(target);
        }
    }

    fn set_if(&mut self, instr: &Instruction, condition: bool) {
        self.write_i(instr, Wrapping(if condition { 1 } else { 0 }));
    }
}

fn reg_u(value: u64) -> Register {
    let mut r = Register::default();
    r.set_u(value);
    r
}

fn sign_extend(value: i64, size: Size) -> i64 {
    match size {
        Size::Byte => value as i8 as i64,
        Size::Word => value as i16 as i64,
        Size::Dword => value as i32 as i64,
        Size::Qword => value,
    }
}

fn zero_extend(value: i64, size: Size) -> i64 {
    match size {
        Size::Byte => value as u8 as i64,
        Size::Word => value as u16 as i64,
        Size::Dword => value as u32 as i64,
        Size::Qword => value,
    }
}

/// `(result, carry, overflow)`: carry is the unsigned-add carry out, overflow
/// the signed-add overflow, computed independently since they disagree
/// whenever the operands' signs differ from their bit patterns' high bit.
fn add_with_flags(a: i64, b: i64) -> (i64, bool, bool) {
    let (_, carry) = (a as u64).overflowing_add(b as u64);
    let (result, overflow) = a.overflowing_add(b);
    (result, carry, overflow)
}

fn sub_with_flags(a: i64, b: i64) -> (i64, bool, bool) {
    let (_, carry) = (a as u64).overflowing_sub(b as u64);
    let (result, overflow) = a.overflowing_sub(b);
    (result, carry, overflow)
}

fn mul_with_flags(a: i64, b: i64) -> (i64, bool, bool) {
    let (_, carry) = (a as u64).overflowing_mul(b as u64);
    let (result, overflow) = a.overflowing_mul(b);
    (result, carry, overflow)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::instruction::{Family, Instruction, Size};
    use crate::register::RegisterId;

    fn encode_all(instructions: &[Instruction]) -> Vec<u8> {
        instructions.iter().flat_map(|i| i.encode()).collect()
    }

    #[test]
    fn scenario_s6_vm_arithmetic() {
        let program = vec![
            Instruction::i(Family::Move, Size::Qword, RegisterId::R0, RegisterId::R0, 5),
            Instruction::i(Family::Move, Size::Qword, RegisterId::R1, RegisterId::R0, 7),
            Instruction::r(Family::AddI, Size::Qword, RegisterId::R2, RegisterId::R0, RegisterId::R1),
            Instruction::r(Family::Exit, Size::Byte, RegisterId::R0, RegisterId::R0, RegisterId::R0),
        ];
        let bytes = encode_all(&program);

        let mut terp = Terp::new(4096, 1024);
        terp.load_program(&bytes);
        let code = terp.run().unwrap();

        assert_eq!(code, ExitCode::Halted);
        assert_eq!(terp.register_file().get(RegisterId::R2).i(), 12);
        assert!(terp.has_exited());
    }

    #[test]
    fn division_by_zero_is_reported() {
        let program = vec![
            Instruction::r(Family::DivI, Size::Qword, RegisterId::R0, RegisterId::R1, RegisterId::R2),
        ];
        let bytes = encode_all(&program);
        let mut terp = Terp::new(4096, 1024);
        terp.load_program(&bytes);
        assert_eq!(terp.run().unwrap(), ExitCode::DivisionByZero);
    }

    #[test]
    fn cmp_sets_equal_and_less_flags() {
        let mut terp = Terp::new(4096, 1024);
        let mut three = Register::default();
        three.set_i(3);
        let mut five = Register::default();
        five.set_i(5);
        terp.registers.set(RegisterId::R1, three);
        terp.registers.set(RegisterId::R2, five);
        let bytes = Instruction::r(Family::CmpI, Size::Qword, RegisterId::R0, RegisterId::R1, RegisterId::R2).encode();
        terp.load_program(&bytes);
        terp.step().unwrap();
        assert!(!terp.register_file().flags.equal);
        assert!(terp.register_file().flags.less);
    }

    #[test]
    fn signed_add_overflow_sets_overflow_not_carry() {
        let mut terp = Terp::new(4096, 1024);
        let mut max = Register::default();
        max.set_i(i64::MAX);
        let mut one = Register::default();
        one.set_i(1);
        terp.registers.set(RegisterId::R1, max);
        terp.registers.set(RegisterId::R2, one);
        let bytes = Instruction::r(Family::AddI, Size::Qword, RegisterId::R0, RegisterId::R1, RegisterId::R2).encode();
        terp.load_program(&bytes);
        terp.step().unwrap();
        assert!(terp.register_file().flags.overflow);
        assert!(!terp.register_file().flags.carry);
    }

    #[test]
    fn unsigned_add_carry_without_signed_overflow() {
        let mut terp = Terp::new(4096, 1024);
        let mut minus_one = Register::default();
        minus_one.set_i(-1);
        let mut one = Register::default();
        one.set_i(1);
        terp.registers.set(RegisterId::R1, minus_one);
        terp.registers.set(RegisterId::R2, one);
        let bytes = Instruction::r(Family::AddI, Size::Qword, RegisterId::R0, RegisterId::R1, RegisterId::R2).encode();
        terp.load_program(&bytes);
        terp.step().unwrap();
        assert!(!terp.register_file().flags.overflow);
        assert!(terp.register_file().flags.carry);
        assert_eq!(terp.register_file().get(RegisterId::R0).i(), 0);
    }

    #[test]
    fn signed_negation_overflow_on_i64_min() {
        let mut terp = Terp::new(4096, 1024);
        let mut min = Register::default();
        min.set_i(i64::MIN);
        terp.registers.set(RegisterId::R1, min);
        let bytes = Instruction::r(Family::NegIs, Size::Qword, RegisterId::R0, RegisterId::R1, RegisterId::R0).encode();
        terp.load_program(&bytes);
        terp.step().unwrap();
        assert!(terp.register_file().flags.overflow);
    }

    #[test]
    fn breakpoint_halts_before_executing_its_address() {
        let program = vec![
            Instruction::i(Family::Move, Size::Qword, RegisterId::R0, RegisterId::R0, 1),
            Instruction::r(Family::Exit, Size::Byte, RegisterId::R0, RegisterId::R0, RegisterId::R0),
        ];
        let bytes = encode_all(&program);
        let mut terp = Terp::new(4096, 1024);
        terp.load_program(&bytes);
        let break_address = terp.heap_vector(HeapVector::ProgramStart) + INSTRUCTION_BYTES as u32;
        terp.set_breakpoint(Breakpoint {
            address: break_address,
            enabled: true,
            kind: BreakpointKind::Simple,
            register: None,
            expected: 0,
        });
        let result = terp.run().unwrap();
        assert_eq!(result, ExitCode::Halted);
        assert!(terp.is_broken());
        assert_eq!(terp.register_file().get(RegisterId::PC).u() as u32, break_address);
    }
}
