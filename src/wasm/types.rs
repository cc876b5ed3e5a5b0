//! Value types, function signatures and function bodies.

use crate::core::MachineRepresentation;
use std::fmt;

/// WebAssembly value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    S128,
    FuncRef,
    ExternRef,
}

impl ValueType {
    /// Machine representation used when the value lives in a register.
    pub fn machine_representation(self) -> MachineRepresentation {
        match self {
            ValueType::I32 => MachineRepresentation::Word32,
            ValueType::I64 => MachineRepresentation::Word64,
            ValueType::F32 => MachineRepresentation::Float32,
            ValueType::F64 => MachineRepresentation::Float64,
            ValueType::S128 => MachineRepresentation::Simd128,
            ValueType::FuncRef | ValueType::ExternRef => MachineRepresentation::Tagged,
        }
    }

    pub fn is_reference(self) -> bool {
        matches!(self, ValueType::FuncRef | ValueType::ExternRef)
    }

    /// One-letter code used in signature names.
    pub fn short_name(self) -> char {
        match self {
            ValueType::I32 => 'i',
            ValueType::I64 => 'l',
            ValueType::F32 => 'f',
            ValueType::F64 => 'd',
            ValueType::S128 => 's',
            ValueType::FuncRef | ValueType::ExternRef => 'r',
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::S128 => "v128",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        };
        f.write_str(name)
    }
}

/// Function type: parameter and result types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionSig {
    params: Vec<ValueType>,
    returns: Vec<ValueType>,
}

impl FunctionSig {
    pub fn new(params: impl Into<Vec<ValueType>>, returns: impl Into<Vec<ValueType>>) -> Self {
        Self {
            params: params.into(),
            returns: returns.into(),
        }
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn returns(&self) -> &[ValueType] {
        &self.returns
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn return_count(&self) -> usize {
        self.returns.len()
    }
}

/// Prints signatures as `<returns>_<params>`, e.g. `i_ii`.
impl fmt::Display for FunctionSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ty in &self.returns {
            write!(f, "{}", ty.short_name())?;
        }
        f.write_str("_")?;
        for ty in &self.params {
            write!(f, "{}", ty.short_name())?;
        }
        Ok(())
    }
}

/// Read-only view of one function's code.
#[derive(Debug, Clone, Copy)]
pub struct FunctionBody<'a> {
    pub sig: &'a FunctionSig,
    /// Offset of the body in the module wire bytes.
    pub offset: u32,
    pub bytes: &'a [u8],
}

impl<'a> FunctionBody<'a> {
    pub fn new(sig: &'a FunctionSig, offset: u32, bytes: &'a [u8]) -> Self {
        Self { sig, offset, bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
