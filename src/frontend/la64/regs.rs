use std::fmt;

/// LA64 integer register ($zero, $ra, $tp, $sp, $a0-$a7, $t0-$t8, $r21,
/// $fp, $s0-$s8). Register 0 always reads as zero and writes to it are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IReg {
    R0 = 0, R1, R2, R3, R4, R5, R6, R7,
    R8, R9, R10, R11, R12, R13, R14, R15,
    R16, R17, R18, R19, R20, R21, R22, R23,
    R24, R25, R26, R27, R28, R29, R30, R31,
}

impl IReg {
    pub const ZERO: IReg = IReg::R0;
    pub const RA: IReg = IReg::R1;

    pub fn number(self) -> usize {
        self as usize
    }

    pub fn from_u8(val: u8) -> Self {
        assert!(val <= 31, "Invalid register number: {}", val);
        // SAFETY: val is in 0..=31, matching the repr(u8) layout
        unsafe { std::mem::transmute(val) }
    }

    pub fn from_u32(val: u32) -> Self {
        Self::from_u8(val as u8)
    }

    /// Architectural assembler name, used by the disassembly trace.
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 32] = [
            "$zero", "$ra", "$tp", "$sp",
            "$a0", "$a1", "$a2", "$a3", "$a4", "$a5", "$a6", "$a7",
            "$t0", "$t1", "$t2", "$t3", "$t4", "$t5", "$t6", "$t7", "$t8",
            "$r21",
            "$fp",
            "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$s8",
        ];
        NAMES[self.number()]
    }
}

impl fmt::Display for IReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// LA64 floating-point register. Each slot stores a 64-bit value; the low 32
/// bits are used for single precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FReg {
    F0 = 0, F1, F2, F3, F4, F5, F6, F7,
    F8, F9, F10, F11, F12, F13, F14, F15,
    F16, F17, F18, F19, F20, F21, F22, F23,
    F24, F25, F26, F27, F28, F29, F30, F31,
}

impl FReg {
    pub fn number(self) -> usize {
        self as usize
    }

    pub fn from_u8(val: u8) -> Self {
        assert!(val <= 31, "Invalid FP register number: {}", val);
        // SAFETY: val is in 0..=31, matching the repr(u8) layout
        unsafe { std::mem::transmute(val) }
    }

    pub fn from_u32(val: u32) -> Self {
        Self::from_u8(val as u8)
    }

    pub fn name(self) -> &'static str {
        const NAMES: [&str; 32] = [
            "$fa0", "$fa1", "$fa2", "$fa3", "$fa4", "$fa5", "$fa6", "$fa7",
            "$ft0", "$ft1", "$ft2", "$ft3", "$ft4", "$ft5", "$ft6", "$ft7",
            "$ft8", "$ft9", "$ft10", "$ft11", "$ft12", "$ft13", "$ft14", "$ft15",
            "$fs0", "$fs1", "$fs2", "$fs3", "$fs4", "$fs5", "$fs6", "$fs7",
        ];
        NAMES[self.number()]
    }
}

impl fmt::Display for FReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the eight single-bit FP condition-code flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Fcc {
    C0 = 0, C1, C2, C3, C4, C5, C6, C7,
}

impl Fcc {
    pub fn number(self) -> usize {
        self as usize
    }

    pub fn from_u8(val: u8) -> Self {
        assert!(val <= 7, "Invalid FCC number: {}", val);
        // SAFETY: val is in 0..=7, matching the repr(u8) layout
        unsafe { std::mem::transmute(val) }
    }

    pub fn from_u32(val: u32) -> Self {
        Self::from_u8(val as u8)
    }
}

impl fmt::Display for Fcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$fcc{}", self.number())
    }
}

/// One of the four FCSR sub-views (see the guest-state emitter for masks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FcsrView {
    Fcsr0 = 0,
    Fcsr1,
    Fcsr2,
    Fcsr3,
}

impl FcsrView {
    pub fn from_u32(val: u32) -> Self {
        match val {
            0 => FcsrView::Fcsr0,
            1 => FcsrView::Fcsr1,
            2 => FcsrView::Fcsr2,
            3 => FcsrView::Fcsr3,
            _ => panic!("Invalid FCSR view: {}", val),
        }
    }
}

impl fmt::Display for FcsrView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$fcsr{}", *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ireg_names() {
        assert_eq!(IReg::from_u32(0).name(), "$zero");
        assert_eq!(IReg::from_u32(1).name(), "$ra");
        assert_eq!(IReg::from_u32(11).name(), "$a7");
        assert_eq!(IReg::from_u32(20).name(), "$t8");
        assert_eq!(IReg::from_u32(31).name(), "$s8");
    }

    #[test]
    fn test_freg_names() {
        assert_eq!(FReg::from_u32(0).name(), "$fa0");
        assert_eq!(FReg::from_u32(8).name(), "$ft0");
        assert_eq!(FReg::from_u32(31).name(), "$fs7");
    }

    #[test]
    fn test_fcc_display() {
        assert_eq!(format!("{}", Fcc::from_u32(3)), "$fcc3");
    }

    #[test]
    #[should_panic]
    fn test_ireg_out_of_range() {
        IReg::from_u32(32);
    }
}
