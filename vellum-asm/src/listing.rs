//! The listing (a source-interleaved disassembly) and the debugger bridge
//! that answers read-only queries against it plus a running `Terp`.
//!
//! Each assembled instruction contributes an entry to a full
//! `address -> listing line` index, alongside a breakpoint map keyed the
//! same way.

use vellum_vm::{Breakpoint, BreakpointKind, RegisterId, Terp};

use crate::block::ListingKind;

#[derive(Clone, Debug)]
pub struct ListingLine {
    pub address: u32,
    pub source: String,
    pub kind: ListingKind,
}

/// One listing per source file: a vector of `listing_line` entries sorted
/// by address, carrying the full line text rather than just a line-count
/// span.
#[derive(Default)]
pub struct Listing {
    lines: Vec<ListingLine>,
}

impl Listing {
    pub fn new() -> Listing {
        Listing::default()
    }

    pub fn push(&mut self, line: ListingLine) {
        self.lines.push(line);
    }

    /// Binary search for the listing line whose address range contains
    /// `address`: the last line whose own address is `<= address`.
    pub fn line_containing(&self, address: u32) -> Option<&ListingLine> {
        match self.lines.binary_search_by_key(&address, |line| line.address) {
            Ok(index) => Some(&self.lines[index]),
            Err(0) => None,
            Err(index) => Some(&self.lines[index - 1]),
        }
    }

    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }
}

/// A read-only observer over a `Terp` and its `Listing`: the narrow
/// interface a debugger UI drives instead of poking the VM directly.
pub struct DebuggerBridge<'a> {
    terp: &'a Terp,
    listing: &'a Listing,
}

impl<'a> DebuggerBridge<'a> {
    pub fn new(terp: &'a Terp, listing: &'a Listing) -> DebuggerBridge<'a> {
        DebuggerBridge { terp, listing }
    }

    pub fn source_line_for(&self, address: u32) -> Option<&ListingLine> {
        self.listing.line_containing(address)
    }

    pub fn byte_at(&self, address: u32) -> Option<u8> {
        self.terp.read(1, address).map(|value| value as u8)
    }

    /// Every register holding a non-zero bit pattern, the closest useful
    /// reading of "which registers are live" without full liveness
    /// analysis (out of scope for a read-only debugger view).
    pub fn live_registers(&self) -> Vec<(RegisterId, u64)> {
        (0..vellum_vm::REGISTER_COUNT)
            .filter_map(|index| RegisterId::from_index(index))
            .map(|id| (id, self.terp.register_file().get(id).u()))
            .filter(|(_, value)| *value != 0)
            .collect()
    }

    pub fn current_line(&self) -> Option<&ListingLine> {
        self.source_line_for(self.terp.register_file().get(RegisterId::PC).u() as u32)
    }
}

/// Builds a simple, unconditional `Breakpoint`, kept here rather than
/// re-exported bare so callers consistently go through one constructor per
/// kind instead of hand-filling the struct.
pub fn simple_breakpoint(address: u32) -> Breakpoint {
    Breakpoint { address, enabled: true, kind: BreakpointKind::Simple, register: None, expected: 0 }
}

pub fn register_equals_breakpoint(address: u32, register: RegisterId, expected: u64) -> Breakpoint {
    Breakpoint { address, enabled: true, kind: BreakpointKind::RegisterEquals, register: Some(register), expected }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn line_containing_finds_the_enclosing_instruction() {
        let mut listing = Listing::new();
        listing.push(ListingLine { address: 0, source: "entry:".into(), kind: ListingKind::Label });
        listing.push(ListingLine { address: 8, source: "mov r0, 5".into(), kind: ListingKind::Instruction });
        listing.push(ListingLine { address: 16, source: "exit".into(), kind: ListingKind::Instruction });

        let line = listing.line_containing(10).unwrap();
        assert_eq!(line.address, 8);
    }

    #[test]
    fn address_before_any_line_has_no_owner() {
        let mut listing = Listing::new();
        listing.push(ListingLine { address: 8, source: "mov r0, 5".into(), kind: ListingKind::Instruction });
        assert!(listing.line_containing(0).is_none());
    }
}
