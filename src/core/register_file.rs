//! Machine registers as seen by call descriptors.
//!
//! Registers are named by bank and index. The GP bank holds the sixteen x86-64
//! integer registers in encoding order (RAX = 0 ... R15 = 15); the FP bank
//! holds XMM0-XMM15.

use std::fmt;

pub const GP_BANK: u8 = 0;
pub const FP_BANK: u8 = 1;

const REGS_PER_BANK: u8 = 16;

const GP_NAMES: [&str; REGS_PER_BANK as usize] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12", "r13",
    "r14", "r15",
];

/// A register, identified by bank and encoding index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsmReg {
    pub bank: u8,
    pub id: u8,
}

impl AsmReg {
    pub const fn new(bank: u8, id: u8) -> Self {
        Self { bank, id }
    }

    pub const fn gp(id: u8) -> Self {
        Self::new(GP_BANK, id)
    }

    pub const fn fp(id: u8) -> Self {
        Self::new(FP_BANK, id)
    }

    pub fn is_gp(&self) -> bool {
        self.bank == GP_BANK
    }

    fn is_valid(&self) -> bool {
        self.bank <= FP_BANK && self.id < REGS_PER_BANK
    }
}

impl fmt::Display for AsmReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.bank, self.is_valid()) {
            (GP_BANK, true) => f.write_str(GP_NAMES[self.id as usize]),
            (FP_BANK, true) => write!(f, "xmm{}", self.id),
            _ => write!(f, "r{}:{}", self.bank, self.id),
        }
    }
}

/// Set of registers, one 16-bit mask per bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegBitSet {
    gp: u16,
    fp: u16,
}

impl RegBitSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn mask(&self, bank: u8) -> Option<u16> {
        match bank {
            GP_BANK => Some(self.gp),
            FP_BANK => Some(self.fp),
            _ => None,
        }
    }

    pub fn contains(&self, reg: AsmReg) -> bool {
        reg.is_valid() && self.mask(reg.bank).is_some_and(|mask| mask & (1 << reg.id) != 0)
    }

    /// Add `reg`; registers outside the x86-64 file are ignored.
    pub fn set(&mut self, reg: AsmReg) {
        if !reg.is_valid() {
            return;
        }
        let bit = 1u16 << reg.id;
        if reg.is_gp() {
            self.gp |= bit;
        } else {
            self.fp |= bit;
        }
    }

    pub fn union(&mut self, other: &RegBitSet) {
        self.gp |= other.gp;
        self.fp |= other.fp;
    }

    pub fn count_in_bank(&self, bank: u8) -> u32 {
        self.mask(bank).map_or(0, u16::count_ones)
    }

    pub fn is_empty(&self) -> bool {
        self.gp == 0 && self.fp == 0
    }
}

impl FromIterator<AsmReg> for RegBitSet {
    fn from_iter<I: IntoIterator<Item = AsmReg>>(iter: I) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|reg| set.set(reg));
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(AsmReg::gp(0).to_string(), "rax");
        assert_eq!(AsmReg::gp(6).to_string(), "rsi");
        assert_eq!(AsmReg::gp(15).to_string(), "r15");
        assert_eq!(AsmReg::fp(3).to_string(), "xmm3");
        assert_eq!(AsmReg::new(2, 1).to_string(), "r2:1");
    }

    #[test]
    fn test_set_operations() {
        let mut set = RegBitSet::new();
        assert!(set.is_empty());

        set.set(AsmReg::gp(6));
        set.set(AsmReg::fp(1));
        assert!(set.contains(AsmReg::gp(6)));
        assert!(set.contains(AsmReg::fp(1)));
        assert!(!set.contains(AsmReg::fp(6)));
        assert_eq!(set.count_in_bank(GP_BANK), 1);

        let other: RegBitSet = [AsmReg::gp(0), AsmReg::gp(6)].into_iter().collect();
        set.union(&other);
        assert_eq!(set.count_in_bank(GP_BANK), 2);
        assert_eq!(set.count_in_bank(FP_BANK), 1);
    }

    #[test]
    fn test_registers_outside_file_ignored() {
        let mut set = RegBitSet::new();
        set.set(AsmReg::new(3, 0));
        set.set(AsmReg::gp(16));
        assert!(set.is_empty());
        assert!(!set.contains(AsmReg::gp(16)));
        assert_eq!(set.count_in_bank(7), 0);
    }
}
