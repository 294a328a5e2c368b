use std::fmt;

use crate::frontend::la64::regs::{FReg, Fcc, IReg};
use crate::frontend::la64::{GuestField, Helper, JumpKind};
use crate::ir::types::Type;

/// Index into a Block's instruction arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef(pub u32);

impl InstRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// An IR value: either an immediate or a reference to an instruction's result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Void,
    Inst(InstRef),
    ImmU1(bool),
    ImmU8(u8),
    ImmU16(u16),
    ImmU32(u32),
    ImmU64(u64),
    ImmIReg(IReg),
    ImmFReg(FReg),
    ImmFcc(Fcc),
    ImmField(GuestField),
    ImmHelper(Helper),
    ImmJumpKind(JumpKind),
}

impl Value {
    /// Get the IR type of this value.
    pub fn get_type(&self) -> Type {
        match self {
            Value::Void => Type::Void,
            Value::Inst(_) => Type::Opaque,
            Value::ImmU1(_) => Type::U1,
            Value::ImmU8(_) => Type::U8,
            Value::ImmU16(_) => Type::U16,
            Value::ImmU32(_) => Type::U32,
            Value::ImmU64(_) => Type::U64,
            Value::ImmIReg(_) => Type::IReg,
            Value::ImmFReg(_) => Type::FReg,
            Value::ImmFcc(_) => Type::Fcc,
            Value::ImmField(_) => Type::Field,
            Value::ImmHelper(_) => Type::Helper,
            Value::ImmJumpKind(_) => Type::JumpKind,
        }
    }

    /// Returns true if this is an immediate value (not an instruction reference).
    pub fn is_immediate(&self) -> bool {
        !matches!(self, Value::Inst(_) | Value::Void)
    }

    /// Returns true if this is a reference to an instruction.
    pub fn is_inst(&self) -> bool {
        matches!(self, Value::Inst(_))
    }

    /// Get the instruction reference, panics if not an Inst value.
    pub fn inst_ref(&self) -> InstRef {
        match self {
            Value::Inst(r) => *r,
            _ => panic!("Value::inst_ref called on non-Inst value: {:?}", self),
        }
    }

    /// Get as bool, panics if not ImmU1.
    pub fn get_u1(&self) -> bool {
        match self {
            Value::ImmU1(v) => *v,
            _ => panic!("Value::get_u1 called on {:?}", self),
        }
    }

    /// Get as u8, panics if not ImmU8.
    pub fn get_u8(&self) -> u8 {
        match self {
            Value::ImmU8(v) => *v,
            _ => panic!("Value::get_u8 called on {:?}", self),
        }
    }

    /// Get as u32, panics if not ImmU32.
    pub fn get_u32(&self) -> u32 {
        match self {
            Value::ImmU32(v) => *v,
            _ => panic!("Value::get_u32 called on {:?}", self),
        }
    }

    /// Get as u64, panics if not ImmU64.
    pub fn get_u64(&self) -> u64 {
        match self {
            Value::ImmU64(v) => *v,
            _ => panic!("Value::get_u64 called on {:?}", self),
        }
    }

    /// Get as integer register, panics otherwise.
    pub fn get_ireg(&self) -> IReg {
        match self {
            Value::ImmIReg(r) => *r,
            _ => panic!("Value::get_ireg called on {:?}", self),
        }
    }

    /// Get as FP register, panics otherwise.
    pub fn get_freg(&self) -> FReg {
        match self {
            Value::ImmFReg(r) => *r,
            _ => panic!("Value::get_freg called on {:?}", self),
        }
    }

    /// Get as FCC selector, panics otherwise.
    pub fn get_fcc(&self) -> Fcc {
        match self {
            Value::ImmFcc(c) => *c,
            _ => panic!("Value::get_fcc called on {:?}", self),
        }
    }

    /// Get as guest-state field, panics otherwise.
    pub fn get_field(&self) -> GuestField {
        match self {
            Value::ImmField(g) => *g,
            _ => panic!("Value::get_field called on {:?}", self),
        }
    }

    /// Get as helper identity, panics otherwise.
    pub fn get_helper(&self) -> Helper {
        match self {
            Value::ImmHelper(h) => *h,
            _ => panic!("Value::get_helper called on {:?}", self),
        }
    }

    /// Get as jump kind, panics otherwise.
    pub fn get_jump_kind(&self) -> JumpKind {
        match self {
            Value::ImmJumpKind(j) => *j,
            _ => panic!("Value::get_jump_kind called on {:?}", self),
        }
    }

    /// Get any integer immediate as u64 (zero-extends smaller types).
    pub fn get_imm_as_u64(&self) -> u64 {
        match self {
            Value::ImmU1(v) => *v as u64,
            Value::ImmU8(v) => *v as u64,
            Value::ImmU16(v) => *v as u64,
            Value::ImmU32(v) => *v as u64,
            Value::ImmU64(v) => *v,
            _ => panic!("Value::get_imm_as_u64 called on {:?}", self),
        }
    }

    /// Returns true if this is an immediate zero value.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::ImmU1(v) => !v,
            Value::ImmU8(v) => *v == 0,
            Value::ImmU16(v) => *v == 0,
            Value::ImmU32(v) => *v == 0,
            Value::ImmU64(v) => *v == 0,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Inst(r) => write!(f, "{}", r),
            Value::ImmU1(v) => write!(f, "#{}", *v as u8),
            Value::ImmU8(v) => write!(f, "#{:#x}", v),
            Value::ImmU16(v) => write!(f, "#{:#x}", v),
            Value::ImmU32(v) => write!(f, "#{:#x}", v),
            Value::ImmU64(v) => write!(f, "#{:#x}", v),
            Value::ImmIReg(r) => write!(f, "{}", r),
            Value::ImmFReg(r) => write!(f, "{}", r),
            Value::ImmFcc(c) => write!(f, "{}", c),
            Value::ImmField(g) => write!(f, "{:?}", g),
            Value::ImmHelper(h) => write!(f, "{:?}", h),
            Value::ImmJumpKind(j) => write!(f, "{:?}", j),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::ImmU1(v) }
}
impl From<u8> for Value {
    fn from(v: u8) -> Self { Value::ImmU8(v) }
}
impl From<u16> for Value {
    fn from(v: u16) -> Self { Value::ImmU16(v) }
}
impl From<u32> for Value {
    fn from(v: u32) -> Self { Value::ImmU32(v) }
}
impl From<u64> for Value {
    fn from(v: u64) -> Self { Value::ImmU64(v) }
}
impl From<IReg> for Value {
    fn from(r: IReg) -> Self { Value::ImmIReg(r) }
}
impl From<FReg> for Value {
    fn from(r: FReg) -> Self { Value::ImmFReg(r) }
}
impl From<Fcc> for Value {
    fn from(c: Fcc) -> Self { Value::ImmFcc(c) }
}
impl From<InstRef> for Value {
    fn from(r: InstRef) -> Self { Value::Inst(r) }
}
