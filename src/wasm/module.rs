// This module describes the module a function belongs to. WasmModule holds the signature
// table, the function table (imports first, then declared functions with the byte range of
// their bodies) and the optional function-name section. WireBytesStorage shares the raw
// module bytes across threads without locking. CompilationEnv bundles the module with the
// features it may use; it is immutable and outlives every compilation started from it.
// get_debug_name derives the human-readable name a compilation is labeled with in logs and
// traces: the name-section entry when one exists and decodes as UTF-8, otherwise a
// "wasm-function#<index>" placeholder.

//! Module environment and wire bytes.

use super::types::{FunctionBody, FunctionSig};
use super::features::WasmFeatureSet;
use crate::core::Zone;
use hashbrown::HashMap;
use std::sync::Arc;

/// Byte range inside the module wire bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireBytesRef {
    pub offset: u32,
    pub length: u32,
}

impl WireBytesRef {
    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// One past the last byte; `None` when the range wraps past `u32::MAX`.
    pub fn end_offset(&self) -> Option<u32> {
        self.offset.checked_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Entry of the module function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasmFunction {
    pub func_index: u32,
    pub sig_index: u32,
    /// Body location; empty for imports.
    pub code: WireBytesRef,
    pub imported: bool,
}

/// Decoded module metadata needed to compile its functions.
#[derive(Debug, Default)]
pub struct WasmModule {
    pub signatures: Vec<FunctionSig>,
    pub functions: Vec<WasmFunction>,
    pub num_imported_functions: u32,
    function_names: HashMap<u32, WireBytesRef>,
}

impl WasmModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_signature(&mut self, sig: FunctionSig) -> u32 {
        self.signatures.push(sig);
        (self.signatures.len() - 1) as u32
    }

    /// Declare an imported function. Imports must precede declared functions.
    pub fn add_import(&mut self, sig_index: u32) -> u32 {
        debug_assert_eq!(self.functions.len() as u32, self.num_imported_functions);
        let func_index = self.functions.len() as u32;
        self.functions.push(WasmFunction {
            func_index,
            sig_index,
            code: WireBytesRef::default(),
            imported: true,
        });
        self.num_imported_functions += 1;
        func_index
    }

    pub fn add_function(&mut self, sig_index: u32, code: WireBytesRef) -> u32 {
        let func_index = self.functions.len() as u32;
        self.functions.push(WasmFunction {
            func_index,
            sig_index,
            code,
            imported: false,
        });
        func_index
    }

    pub fn function(&self, func_index: u32) -> Option<&WasmFunction> {
        self.functions.get(func_index as usize)
    }

    pub fn signature(&self, sig_index: u32) -> Option<&FunctionSig> {
        self.signatures.get(sig_index as usize)
    }

    pub fn set_function_name(&mut self, func_index: u32, name: WireBytesRef) {
        self.function_names.insert(func_index, name);
    }

    pub fn function_name(&self, func_index: u32) -> Option<WireBytesRef> {
        self.function_names.get(&func_index).copied()
    }
}

/// Shared, immutable module bytes.
#[derive(Debug, Clone)]
pub struct WireBytesStorage {
    bytes: Arc<[u8]>,
}

impl WireBytesStorage {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn module_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, range: WireBytesRef) -> Option<&[u8]> {
        let end = range.end_offset()?;
        self.bytes.get(range.offset as usize..end as usize)
    }

    /// Decode `range` as a UTF-8 name.
    pub fn get_name(&self, range: WireBytesRef) -> Option<&str> {
        if range.is_empty() {
            return None;
        }
        std::str::from_utf8(self.get(range)?).ok()
    }

    /// Body of a declared function; `None` for imports or out-of-range indices.
    pub fn function_body<'a>(&'a self, module: &'a WasmModule, func_index: u32) -> Option<FunctionBody<'a>> {
        let function = module.function(func_index)?;
        if function.imported {
            return None;
        }
        let sig = module.signature(function.sig_index)?;
        let bytes = self.get(function.code)?;
        Some(FunctionBody::new(sig, function.code.offset, bytes))
    }
}

/// Read-only environment shared by all compilations of a module.
#[derive(Debug, Clone)]
pub struct CompilationEnv {
    pub module: Arc<WasmModule>,
    pub enabled_features: WasmFeatureSet,
}

impl CompilationEnv {
    pub fn new(module: Arc<WasmModule>, enabled_features: WasmFeatureSet) -> Self {
        Self {
            module,
            enabled_features,
        }
    }
}

/// Name used to label the compilation of `func_index`.
pub fn get_debug_name<'zone>(
    zone: &'zone Zone,
    module: &WasmModule,
    wire_bytes: &WireBytesStorage,
    func_index: u32,
) -> &'zone str {
    if let Some(name) = module
        .function_name(func_index)
        .and_then(|range| wire_bytes.get_name(range))
    {
        return zone.alloc_str(name);
    }
    zone.alloc_str(&format!("wasm-function#{}", func_index))
}
