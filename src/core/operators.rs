// This module defines the operators that label graph nodes and the two registries that hand
// them out. CommonOperatorBuilder covers control and constant operators (start, end,
// parameters, constants, return, merge, phi, branch). MachineOperatorBuilder covers
// machine-level arithmetic, memory access, and optional operators; it is configured with
// the host pointer representation, the set of optional operators the backend supports, and
// the backend's alignment requirements for unaligned memory access. Operators without
// parameters are statics shared by every compilation; parameterized operators are
// allocated in the zone of the compilation that asked for them. Both registries are
// read-only once constructed.

//! Common and machine operator registries.

use super::zone::Zone;
use std::fmt;
use std::ops::BitOr;

/// Machine-level value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineRepresentation {
    Word8,
    Word16,
    Word32,
    Word64,
    Float32,
    Float64,
    Simd128,
    Tagged,
}

impl MachineRepresentation {
    /// Representation of a host pointer.
    pub fn pointer() -> Self {
        if cfg!(target_pointer_width = "64") {
            MachineRepresentation::Word64
        } else {
            MachineRepresentation::Word32
        }
    }

    pub fn size_in_bytes(self) -> u32 {
        match self {
            MachineRepresentation::Word8 => 1,
            MachineRepresentation::Word16 => 2,
            MachineRepresentation::Word32 | MachineRepresentation::Float32 => 4,
            MachineRepresentation::Word64 | MachineRepresentation::Float64 => 8,
            MachineRepresentation::Simd128 => 16,
            MachineRepresentation::Tagged => Self::pointer().size_in_bytes(),
        }
    }

    pub fn is_floating_point(self) -> bool {
        matches!(
            self,
            MachineRepresentation::Float32
                | MachineRepresentation::Float64
                | MachineRepresentation::Simd128
        )
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Node opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Common operators.
    Start,
    End,
    Dead,
    Parameter,
    Int32Constant,
    Int64Constant,
    Float32Constant,
    Float64Constant,
    Return,
    Merge,
    Phi,
    Branch,
    IfTrue,
    IfFalse,

    // Machine operators.
    Int32Add,
    Int32Sub,
    Int32Mul,
    Int64Add,
    Int64Sub,
    Int64Mul,
    Word32And,
    Word32Or,
    Word32Xor,
    Word32Shl,
    Word32Equal,
    Word64And,
    Word64Equal,
    Load,
    Store,
    UnalignedLoad,
    UnalignedStore,

    // Optional machine operators.
    Word32Ctz,
    Word64Ctz,
    Word32Popcnt,
    Word64Popcnt,
    Word32ReverseBits,
    Word64ReverseBits,
    Float32RoundDown,
    Float64RoundDown,
    Float32RoundUp,
    Float64RoundUp,
    Float64RoundTruncate,
}

/// Static parameter carried by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorParameter {
    None,
    Index(u32),
    Count(u32),
    Int32(i32),
    Int64(i64),
    Float32Bits(u32),
    Float64Bits(u64),
    Representation(MachineRepresentation),
    Phi {
        rep: MachineRepresentation,
        count: u32,
    },
}

/// An operator labels a graph node and fixes its input/output arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    pub value_inputs: u32,
    pub control_inputs: u32,
    pub value_outputs: u32,
    pub parameter: OperatorParameter,
}

impl Operator {
    pub const fn new(
        opcode: Opcode,
        mnemonic: &'static str,
        value_inputs: u32,
        control_inputs: u32,
        value_outputs: u32,
    ) -> Self {
        Self {
            opcode,
            mnemonic,
            value_inputs,
            control_inputs,
            value_outputs,
            parameter: OperatorParameter::None,
        }
    }

    const fn with_parameter(mut self, parameter: OperatorParameter) -> Self {
        self.parameter = parameter;
        self
    }

    /// Total number of inputs a node with this operator takes.
    pub fn input_count(&self) -> usize {
        (self.value_inputs + self.control_inputs) as usize
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        match self.parameter {
            OperatorParameter::None => Ok(()),
            OperatorParameter::Index(i) | OperatorParameter::Count(i) => write!(f, "[{}]", i),
            OperatorParameter::Int32(v) => write!(f, "[{}]", v),
            OperatorParameter::Int64(v) => write!(f, "[{}]", v),
            OperatorParameter::Float32Bits(bits) => write!(f, "[{}]", f32::from_bits(bits)),
            OperatorParameter::Float64Bits(bits) => write!(f, "[{}]", f64::from_bits(bits)),
            OperatorParameter::Representation(rep) => write!(f, "[{:?}]", rep),
            OperatorParameter::Phi { rep, count } => write!(f, "[{:?}, {}]", rep, count),
        }
    }
}

static DEAD: Operator = Operator::new(Opcode::Dead, "Dead", 0, 0, 0);
static BRANCH: Operator = Operator::new(Opcode::Branch, "Branch", 1, 1, 0);
static IF_TRUE: Operator = Operator::new(Opcode::IfTrue, "IfTrue", 0, 1, 0);
static IF_FALSE: Operator = Operator::new(Opcode::IfFalse, "IfFalse", 0, 1, 0);

/// Registry of control-flow and constant operators.
pub struct CommonOperatorBuilder<'zone> {
    zone: &'zone Zone,
}

impl<'zone> CommonOperatorBuilder<'zone> {
    pub fn new(zone: &'zone Zone) -> Self {
        Self { zone }
    }

    /// Graph entry. Produces the instance plus `param_count` values.
    pub fn start(&self, param_count: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Start, "Start", 0, 0, param_count + 1)
                .with_parameter(OperatorParameter::Count(param_count)),
        )
    }

    pub fn end(&self, control_count: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::End, "End", 0, control_count, 0)
                .with_parameter(OperatorParameter::Count(control_count)),
        )
    }

    pub fn dead(&self) -> &'zone Operator {
        &DEAD
    }

    /// Projection of parameter `index` out of the start node.
    pub fn parameter(&self, index: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Parameter, "Parameter", 1, 0, 1)
                .with_parameter(OperatorParameter::Index(index)),
        )
    }

    pub fn int32_constant(&self, value: i32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Int32Constant, "Int32Constant", 0, 0, 1)
                .with_parameter(OperatorParameter::Int32(value)),
        )
    }

    pub fn int64_constant(&self, value: i64) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Int64Constant, "Int64Constant", 0, 0, 1)
                .with_parameter(OperatorParameter::Int64(value)),
        )
    }

    pub fn float32_constant(&self, value: f32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Float32Constant, "Float32Constant", 0, 0, 1)
                .with_parameter(OperatorParameter::Float32Bits(value.to_bits())),
        )
    }

    pub fn float64_constant(&self, value: f64) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Float64Constant, "Float64Constant", 0, 0, 1)
                .with_parameter(OperatorParameter::Float64Bits(value.to_bits())),
        )
    }

    /// Return of `value_count` values; the last input is control.
    pub fn return_op(&self, value_count: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Return, "Return", value_count, 1, 0)
                .with_parameter(OperatorParameter::Count(value_count)),
        )
    }

    pub fn merge(&self, control_count: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Merge, "Merge", 0, control_count, 0)
                .with_parameter(OperatorParameter::Count(control_count)),
        )
    }

    pub fn phi(&self, rep: MachineRepresentation, value_count: u32) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Phi, "Phi", value_count, 1, 1)
                .with_parameter(OperatorParameter::Phi {
                    rep,
                    count: value_count,
                }),
        )
    }

    pub fn branch(&self) -> &'zone Operator {
        &BRANCH
    }

    pub fn if_true(&self) -> &'zone Operator {
        &IF_TRUE
    }

    pub fn if_false(&self) -> &'zone Operator {
        &IF_FALSE
    }
}

/// Optional machine operators a backend can lower natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SupportedOperatorFlags(u32);

impl SupportedOperatorFlags {
    pub const WORD32_CTZ: Self = Self(1 << 0);
    pub const WORD64_CTZ: Self = Self(1 << 1);
    pub const WORD32_POPCNT: Self = Self(1 << 2);
    pub const WORD64_POPCNT: Self = Self(1 << 3);
    pub const WORD32_REVERSE_BITS: Self = Self(1 << 4);
    pub const WORD64_REVERSE_BITS: Self = Self(1 << 5);
    pub const FLOAT32_ROUND_DOWN: Self = Self(1 << 6);
    pub const FLOAT64_ROUND_DOWN: Self = Self(1 << 7);
    pub const FLOAT32_ROUND_UP: Self = Self(1 << 8);
    pub const FLOAT64_ROUND_UP: Self = Self(1 << 9);
    pub const FLOAT64_ROUND_TRUNCATE: Self = Self(1 << 10);

    const ALL_BITS: u32 = (1 << 11) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for SupportedOperatorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which unaligned memory accesses the backend can emit directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentRequirements {
    unaligned_load_unsupported: u16,
    unaligned_store_unsupported: u16,
}

impl AlignmentRequirements {
    pub fn full_unaligned_access_support() -> Self {
        Self {
            unaligned_load_unsupported: 0,
            unaligned_store_unsupported: 0,
        }
    }

    pub fn no_unaligned_access_support() -> Self {
        Self {
            unaligned_load_unsupported: u16::MAX,
            unaligned_store_unsupported: u16::MAX,
        }
    }

    pub fn some_unaligned_access_support(
        unsupported_loads: &[MachineRepresentation],
        unsupported_stores: &[MachineRepresentation],
    ) -> Self {
        Self {
            unaligned_load_unsupported: unsupported_loads.iter().fold(0, |m, r| m | r.bit()),
            unaligned_store_unsupported: unsupported_stores.iter().fold(0, |m, r| m | r.bit()),
        }
    }

    pub fn is_unaligned_load_supported(&self, rep: MachineRepresentation) -> bool {
        self.unaligned_load_unsupported & rep.bit() == 0
    }

    pub fn is_unaligned_store_supported(&self, rep: MachineRepresentation) -> bool {
        self.unaligned_store_unsupported & rep.bit() == 0
    }
}

impl Default for AlignmentRequirements {
    fn default() -> Self {
        Self::full_unaligned_access_support()
    }
}

static INT32_ADD: Operator = Operator::new(Opcode::Int32Add, "Int32Add", 2, 0, 1);
static INT32_SUB: Operator = Operator::new(Opcode::Int32Sub, "Int32Sub", 2, 0, 1);
static INT32_MUL: Operator = Operator::new(Opcode::Int32Mul, "Int32Mul", 2, 0, 1);
static INT64_ADD: Operator = Operator::new(Opcode::Int64Add, "Int64Add", 2, 0, 1);
static INT64_SUB: Operator = Operator::new(Opcode::Int64Sub, "Int64Sub", 2, 0, 1);
static INT64_MUL: Operator = Operator::new(Opcode::Int64Mul, "Int64Mul", 2, 0, 1);
static WORD32_AND: Operator = Operator::new(Opcode::Word32And, "Word32And", 2, 0, 1);
static WORD32_OR: Operator = Operator::new(Opcode::Word32Or, "Word32Or", 2, 0, 1);
static WORD32_XOR: Operator = Operator::new(Opcode::Word32Xor, "Word32Xor", 2, 0, 1);
static WORD32_SHL: Operator = Operator::new(Opcode::Word32Shl, "Word32Shl", 2, 0, 1);
static WORD32_EQUAL: Operator = Operator::new(Opcode::Word32Equal, "Word32Equal", 2, 0, 1);
static WORD64_AND: Operator = Operator::new(Opcode::Word64And, "Word64And", 2, 0, 1);
static WORD64_EQUAL: Operator = Operator::new(Opcode::Word64Equal, "Word64Equal", 2, 0, 1);

static WORD32_CTZ: Operator = Operator::new(Opcode::Word32Ctz, "Word32Ctz", 1, 0, 1);
static WORD64_CTZ: Operator = Operator::new(Opcode::Word64Ctz, "Word64Ctz", 1, 0, 1);
static WORD32_POPCNT: Operator = Operator::new(Opcode::Word32Popcnt, "Word32Popcnt", 1, 0, 1);
static WORD64_POPCNT: Operator = Operator::new(Opcode::Word64Popcnt, "Word64Popcnt", 1, 0, 1);
static WORD32_REVERSE_BITS: Operator =
    Operator::new(Opcode::Word32ReverseBits, "Word32ReverseBits", 1, 0, 1);
static WORD64_REVERSE_BITS: Operator =
    Operator::new(Opcode::Word64ReverseBits, "Word64ReverseBits", 1, 0, 1);
static FLOAT32_ROUND_DOWN: Operator =
    Operator::new(Opcode::Float32RoundDown, "Float32RoundDown", 1, 0, 1);
static FLOAT64_ROUND_DOWN: Operator =
    Operator::new(Opcode::Float64RoundDown, "Float64RoundDown", 1, 0, 1);
static FLOAT32_ROUND_UP: Operator = Operator::new(Opcode::Float32RoundUp, "Float32RoundUp", 1, 0, 1);
static FLOAT64_ROUND_UP: Operator = Operator::new(Opcode::Float64RoundUp, "Float64RoundUp", 1, 0, 1);
static FLOAT64_ROUND_TRUNCATE: Operator =
    Operator::new(Opcode::Float64RoundTruncate, "Float64RoundTruncate", 1, 0, 1);

/// Registry of machine-level operators for the target.
pub struct MachineOperatorBuilder<'zone> {
    zone: &'zone Zone,
    word: MachineRepresentation,
    flags: SupportedOperatorFlags,
    alignment: AlignmentRequirements,
}

impl<'zone> MachineOperatorBuilder<'zone> {
    pub fn new(
        zone: &'zone Zone,
        word: MachineRepresentation,
        flags: SupportedOperatorFlags,
        alignment: AlignmentRequirements,
    ) -> Self {
        debug_assert!(matches!(
            word,
            MachineRepresentation::Word32 | MachineRepresentation::Word64
        ));
        Self {
            zone,
            word,
            flags,
            alignment,
        }
    }

    /// Pointer-sized word representation.
    pub fn word(&self) -> MachineRepresentation {
        self.word
    }

    pub fn is_64(&self) -> bool {
        self.word == MachineRepresentation::Word64
    }

    pub fn flags(&self) -> SupportedOperatorFlags {
        self.flags
    }

    pub fn alignment_requirements(&self) -> AlignmentRequirements {
        self.alignment
    }

    pub fn int32_add(&self) -> &'zone Operator {
        &INT32_ADD
    }

    pub fn int32_sub(&self) -> &'zone Operator {
        &INT32_SUB
    }

    pub fn int32_mul(&self) -> &'zone Operator {
        &INT32_MUL
    }

    pub fn int64_add(&self) -> &'zone Operator {
        &INT64_ADD
    }

    pub fn int64_sub(&self) -> &'zone Operator {
        &INT64_SUB
    }

    pub fn int64_mul(&self) -> &'zone Operator {
        &INT64_MUL
    }

    pub fn word32_and(&self) -> &'zone Operator {
        &WORD32_AND
    }

    pub fn word32_or(&self) -> &'zone Operator {
        &WORD32_OR
    }

    pub fn word32_xor(&self) -> &'zone Operator {
        &WORD32_XOR
    }

    pub fn word32_shl(&self) -> &'zone Operator {
        &WORD32_SHL
    }

    pub fn word32_equal(&self) -> &'zone Operator {
        &WORD32_EQUAL
    }

    pub fn word64_and(&self) -> &'zone Operator {
        &WORD64_AND
    }

    pub fn word64_equal(&self) -> &'zone Operator {
        &WORD64_EQUAL
    }

    /// Pointer-sized addition.
    pub fn int_ptr_add(&self) -> &'zone Operator {
        if self.is_64() {
            self.int64_add()
        } else {
            self.int32_add()
        }
    }

    /// Pointer-sized subtraction.
    pub fn int_ptr_sub(&self) -> &'zone Operator {
        if self.is_64() {
            self.int64_sub()
        } else {
            self.int32_sub()
        }
    }

    /// Aligned load. Inputs: base, index, control.
    pub fn load(&self, rep: MachineRepresentation) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Load, "Load", 2, 1, 1)
                .with_parameter(OperatorParameter::Representation(rep)),
        )
    }

    /// Aligned store. Inputs: base, index, value, control.
    pub fn store(&self, rep: MachineRepresentation) -> &'zone Operator {
        self.zone.alloc(
            Operator::new(Opcode::Store, "Store", 3, 1, 0)
                .with_parameter(OperatorParameter::Representation(rep)),
        )
    }

    /// Load from a possibly unaligned address, lowered to a plain load when
    /// the target handles unaligned access for `rep`.
    pub fn unaligned_load(&self, rep: MachineRepresentation) -> &'zone Operator {
        if self.alignment.is_unaligned_load_supported(rep) {
            return self.load(rep);
        }
        self.zone.alloc(
            Operator::new(Opcode::UnalignedLoad, "UnalignedLoad", 2, 1, 1)
                .with_parameter(OperatorParameter::Representation(rep)),
        )
    }

    /// Store to a possibly unaligned address.
    pub fn unaligned_store(&self, rep: MachineRepresentation) -> &'zone Operator {
        if self.alignment.is_unaligned_store_supported(rep) {
            return self.store(rep);
        }
        self.zone.alloc(
            Operator::new(Opcode::UnalignedStore, "UnalignedStore", 3, 1, 0)
                .with_parameter(OperatorParameter::Representation(rep)),
        )
    }

    fn optional(&self, flag: SupportedOperatorFlags, op: &'static Operator) -> Option<&'zone Operator> {
        self.flags.contains(flag).then_some(op)
    }

    pub fn word32_ctz(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD32_CTZ, &WORD32_CTZ)
    }

    pub fn word64_ctz(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD64_CTZ, &WORD64_CTZ)
    }

    pub fn word32_popcnt(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD32_POPCNT, &WORD32_POPCNT)
    }

    pub fn word64_popcnt(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD64_POPCNT, &WORD64_POPCNT)
    }

    pub fn word32_reverse_bits(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD32_REVERSE_BITS, &WORD32_REVERSE_BITS)
    }

    pub fn word64_reverse_bits(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::WORD64_REVERSE_BITS, &WORD64_REVERSE_BITS)
    }

    pub fn float32_round_down(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::FLOAT32_ROUND_DOWN, &FLOAT32_ROUND_DOWN)
    }

    pub fn float64_round_down(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::FLOAT64_ROUND_DOWN, &FLOAT64_ROUND_DOWN)
    }

    pub fn float32_round_up(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::FLOAT32_ROUND_UP, &FLOAT32_ROUND_UP)
    }

    pub fn float64_round_up(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::FLOAT64_ROUND_UP, &FLOAT64_ROUND_UP)
    }

    pub fn float64_round_truncate(&self) -> Option<&'zone Operator> {
        self.optional(SupportedOperatorFlags::FLOAT64_ROUND_TRUNCATE, &FLOAT64_ROUND_TRUNCATE)
    }
}
