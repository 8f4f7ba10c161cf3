//! Foreign function calls: loading a shared library and invoking a
//! registered symbol by trap number, marshaling register-file arguments
//! through libffi.
//!
//! The VM calls out to host code, so the natural tools are `libloading`
//! (`dlopen`-equivalent shared-library loading) and `libffi` (dynamic call
//! trampolines for arbitrary signatures), rather than hand-rolling either.

use std::collections::HashMap;

use libffi::middle::{Arg, Cif, CodePtr, Type};
use libloading::{Library, Symbol};
use thiserror::Error;

use crate::register::Register;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FfiType {
    Void,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Pointer,
    StructPtr,
}

impl FfiType {
    fn libffi_type(self) -> Type {
        match self {
            FfiType::Void => Type::void(),
            FfiType::U8 => Type::u8(),
            FfiType::U16 => Type::u16(),
            FfiType::U32 => Type::u32(),
            FfiType::U64 => Type::u64(),
            FfiType::I8 => Type::i8(),
            FfiType::I16 => Type::i16(),
            FfiType::I32 => Type::i32(),
            FfiType::I64 => Type::i64(),
            FfiType::F32 => Type::f32(),
            FfiType::F64 => Type::f64(),
            FfiType::Pointer | FfiType::StructPtr => Type::pointer(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub symbol: String,
    pub library: String,
    pub return_type: FfiType,
    pub parameters: Vec<FfiType>,
}

#[derive(Debug, Error)]
pub enum FfiError {
    #[error("foreign library '{0}' could not be loaded")]
    LibraryNotFound(String),
    #[error("foreign symbol '{0}' not found")]
    SymbolNotFound(String),
    #[error("trap number {0} is not registered")]
    UnknownTrap(u32),
}

/// Owns every loaded shared library and the signatures registered against
/// trap numbers. Libraries stay loaded for the Terp's lifetime so function
/// pointers handed to libffi remain valid.
#[derive(Default)]
pub struct ForeignFunctionTable {
    libraries: HashMap<String, Library>,
    traps: HashMap<u32, FunctionSignature>,
}

impl ForeignFunctionTable {
    pub fn new() -> ForeignFunctionTable {
        ForeignFunctionTable::default()
    }

    pub fn register(&mut self, trap: u32, signature: FunctionSignature) -> Result<(), FfiError> {
        if !self.libraries.contains_key(&signature.library) {
            let library = unsafe { Library::new(&signature.library) }
                .map_err(|_| FfiError::LibraryNotFound(signature.library.clone()))?;
            self.libraries.insert(signature.library.clone(), library);
        }
        self.traps.insert(trap, signature);
        Ok(())
    }

    /// Invokes the function registered for `trap`, marshaling `args`
    /// (already read from the register file or stack by the caller) and
    /// returning the raw 64-bit result bit pattern.
    pub fn call(&self, trap: u32, args: &[Register]) -> Result<u64, FfiError> {
        let signature = self.traps.get(&trap).ok_or(FfiError::UnknownTrap(trap))?;
        let library = self
            .libraries
            .get(&signature.library)
            .ok_or_else(|| FfiError::LibraryNotFound(signature.library.clone()))?;

        let pointer: Symbol<*const ()> = unsafe {
            library
                .get(signature.symbol.as_bytes())
                .map_err(|_| FfiError::SymbolNotFound(signature.symbol.clone()))?
        };
        let code_ptr = CodePtr(*pointer as *mut _);

        let arg_types: Vec<Type> = signature.parameters.iter().map(|t| t.libffi_type()).collect();
        let cif = Cif::new(arg_types, signature.return_type.libffi_type());

        let raw_args: Vec<u64> = args.iter().map(|r| r.u()).collect();
        let ffi_args: Vec<Arg> = raw_args.iter().map(Arg::new).collect();

        let result: u64 = unsafe { cif.call(code_ptr, &ffi_args) };
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unregistered_trap_is_reported() {
        let table = ForeignFunctionTable::new();
        assert!(matches!(table.call(7, &[]), Err(FfiError::UnknownTrap(7))));
    }
}
