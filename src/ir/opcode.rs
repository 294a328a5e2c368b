use std::fmt;

use crate::ir::types::Type;

/// IR opcodes.
///
/// Expressions return a non-Void type; statements (guest-state puts, memory
/// writes, fences, exits) return Void. FP operations work on bit patterns
/// (U32/U64) and take an explicit IR-encoded rounding mode as their first
/// operand wherever the operation can round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    // --- Core ---
    /// Record of a call to an external pure helper (byte/bit reversal, CRC,
    /// cpucfg, fclass, FCSR recomputation). Unused argument slots are Void.
    CallPure,
    /// External IR-injection hook.
    InjectIr,
    /// Conditional side exit: if guard, jump to the constant target with the
    /// given jump kind.
    Exit,

    // --- ALU ---
    Add32,
    Add64,
    Sub32,
    Sub64,
    SignedMullWord,
    UnsignedMullWord,
    SignedMullLong,
    UnsignedMullLong,
    SignedDiv32,
    SignedDiv64,
    UnsignedDiv32,
    UnsignedDiv64,
    SignedRem32,
    SignedRem64,
    UnsignedRem32,
    UnsignedRem64,
    And32,
    And64,
    Or32,
    Or64,
    Xor32,
    Xor64,
    Not32,
    Not64,
    Or1,

    // --- Shifts (value, 8-bit count) ---
    LogicalShiftLeft32,
    LogicalShiftLeft64,
    LogicalShiftRight32,
    LogicalShiftRight64,
    ArithmeticShiftRight32,
    ArithmeticShiftRight64,

    // --- Comparisons ---
    CmpEq32,
    CmpNe32,
    CmpLt32S,
    CmpLt32U,
    CmpEq64,
    CmpNe64,
    CmpLt64S,
    CmpLe64S,
    CmpLt64U,
    CmpLe64U,

    // --- Select ---
    Select32,
    Select64,

    // --- Widening halves ---
    LeastSignificantWord,
    MostSignificantWord,
    LeastSignificantLong,
    MostSignificantLong,
    LeastSignificantByte,

    // --- Extensions ---
    SignExtendBitToLong,
    ZeroExtendBitToLong,
    ZeroExtendBitToByte,
    SignExtendByteToLong,
    SignExtendHalfToLong,
    SignExtendWordToLong,
    ZeroExtendByteToWord,
    ZeroExtendByteToLong,
    ZeroExtendHalfToLong,
    ZeroExtendWordToLong,

    // --- Counts ---
    CountLeadingZeros32,
    CountLeadingZeros64,
    CountTrailingZeros32,
    CountTrailingZeros64,

    // --- FP arithmetic (bit-pattern domain, rm first where rounding) ---
    FPAdd32,
    FPAdd64,
    FPSub32,
    FPSub64,
    FPMul32,
    FPMul64,
    FPDiv32,
    FPDiv64,
    FPMulAdd32,
    FPMulAdd64,
    FPMulSub32,
    FPMulSub64,
    FPNeg32,
    FPNeg64,
    FPAbs32,
    FPAbs64,
    FPSqrt32,
    FPSqrt64,
    FPRSqrt32,
    FPRSqrt64,
    FPScaleB32,
    FPScaleB64,
    FPLogB32,
    FPLogB64,
    FPMaxNum32,
    FPMaxNum64,
    FPMinNum32,
    FPMinNum64,
    FPMaxNumAbs32,
    FPMaxNumAbs64,
    FPMinNumAbs32,
    FPMinNumAbs64,
    FPRoundToInt32,
    FPRoundToInt64,

    /// 4-way FP compare; result encodes UN=0x45, LT=0x01, GT=0x00, EQ=0x40.
    FPCompare32,
    FPCompare64,

    // --- FP conversions ---
    FPSingleToDouble,
    FPDoubleToSingle,
    FPSingleToFixedS32,
    FPSingleToFixedS64,
    FPDoubleToFixedS32,
    FPDoubleToFixedS64,
    FPFixedS32ToSingle,
    FPFixedS64ToSingle,
    FPFixedS32ToDouble,
    FPFixedS64ToDouble,

    // --- Memory ---
    ReadMemory8,
    ReadMemory16,
    ReadMemory32,
    ReadMemory64,
    WriteMemory8,
    WriteMemory16,
    WriteMemory32,
    WriteMemory64,
    /// (addr, expected, new) -> old value read from memory.
    CompareAndSwap32,
    CompareAndSwap64,
    LoadLinked32,
    LoadLinked64,
    /// (addr, value) -> U1 success.
    StoreConditional32,
    StoreConditional64,
    MemoryFence,
    InstructionFence,

    // --- Guest-state access ---
    GetGpr8,
    GetGpr16,
    GetGpr32,
    GetGpr64,
    SetGpr,
    SetPc,
    GetFpr64,
    SetFpr32,
    SetFpr64,
    GetFcc,
    SetFcc,
    GetFcsrRaw,
    SetFcsrRaw,
    GetField,
    SetField,
}

/// Opcode metadata: return type and argument types.
struct OpcodeInfo {
    ret: Type,
    args: &'static [Type],
}

impl Opcode {
    /// Returns the return type of this opcode.
    pub fn return_type(self) -> Type {
        self.info().ret
    }

    /// Returns the argument types of this opcode.
    pub fn arg_types(self) -> &'static [Type] {
        self.info().args
    }

    /// Returns the number of arguments this opcode takes.
    pub fn num_args(self) -> usize {
        self.info().args.len()
    }

    /// Returns true if this opcode has side effects (writes to guest state,
    /// memory, or control flow).
    pub fn has_side_effects(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            InjectIr
                | Exit
                | WriteMemory8
                | WriteMemory16
                | WriteMemory32
                | WriteMemory64
                | CompareAndSwap32
                | CompareAndSwap64
                | LoadLinked32
                | LoadLinked64
                | StoreConditional32
                | StoreConditional64
                | MemoryFence
                | InstructionFence
                | SetGpr
                | SetPc
                | SetFpr32
                | SetFpr64
                | SetFcc
                | SetFcsrRaw
                | SetField
        )
    }

    /// Returns true if this is a memory read operation.
    pub fn is_memory_read(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            ReadMemory8 | ReadMemory16 | ReadMemory32 | ReadMemory64 | LoadLinked32 | LoadLinked64
        )
    }

    /// Returns true if this is a memory write operation.
    pub fn is_memory_write(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            WriteMemory8
                | WriteMemory16
                | WriteMemory32
                | WriteMemory64
                | CompareAndSwap32
                | CompareAndSwap64
                | StoreConditional32
                | StoreConditional64
        )
    }

    /// Returns true if this reads guest registers or fields.
    pub fn reads_guest_state(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            GetGpr8
                | GetGpr16
                | GetGpr32
                | GetGpr64
                | GetFpr64
                | GetFcc
                | GetFcsrRaw
                | GetField
        )
    }

    /// Returns true if this writes guest registers or fields.
    pub fn writes_guest_state(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            SetGpr | SetPc | SetFpr32 | SetFpr64 | SetFcc | SetFcsrRaw | SetField
        )
    }

    fn info(self) -> OpcodeInfo {
        use Opcode::*;
        const V: Type = Type::Void;
        const U1: Type = Type::U1;
        const U8: Type = Type::U8;
        const U16: Type = Type::U16;
        const U32: Type = Type::U32;
        const U64: Type = Type::U64;
        const U128: Type = Type::U128;
        const IR: Type = Type::IReg;
        const FR: Type = Type::FReg;
        const CC: Type = Type::Fcc;
        const FLD: Type = Type::Field;
        const HLP: Type = Type::Helper;
        const JK: Type = Type::JumpKind;
        const OPQ: Type = Type::Opaque;
        match self {
            // Core
            CallPure => OpcodeInfo { ret: U64, args: &[HLP, OPQ, OPQ, OPQ, OPQ] },
            InjectIr => OpcodeInfo { ret: V, args: &[] },
            Exit => OpcodeInfo { ret: V, args: &[U1, U64, JK] },

            // ALU
            Add32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            Add64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            Sub32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            Sub64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            SignedMullWord => OpcodeInfo { ret: U64, args: &[U32, U32] },
            UnsignedMullWord => OpcodeInfo { ret: U64, args: &[U32, U32] },
            SignedMullLong => OpcodeInfo { ret: U128, args: &[U64, U64] },
            UnsignedMullLong => OpcodeInfo { ret: U128, args: &[U64, U64] },
            SignedDiv32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            SignedDiv64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            UnsignedDiv32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            UnsignedDiv64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            SignedRem32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            SignedRem64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            UnsignedRem32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            UnsignedRem64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            And32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            And64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            Or32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            Or64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            Xor32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            Xor64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            Not32 => OpcodeInfo { ret: U32, args: &[U32] },
            Not64 => OpcodeInfo { ret: U64, args: &[U64] },
            Or1 => OpcodeInfo { ret: U1, args: &[U1, U1] },

            // Shifts
            LogicalShiftLeft32 => OpcodeInfo { ret: U32, args: &[U32, U8] },
            LogicalShiftLeft64 => OpcodeInfo { ret: U64, args: &[U64, U8] },
            LogicalShiftRight32 => OpcodeInfo { ret: U32, args: &[U32, U8] },
            LogicalShiftRight64 => OpcodeInfo { ret: U64, args: &[U64, U8] },
            ArithmeticShiftRight32 => OpcodeInfo { ret: U32, args: &[U32, U8] },
            ArithmeticShiftRight64 => OpcodeInfo { ret: U64, args: &[U64, U8] },

            // Comparisons
            CmpEq32 => OpcodeInfo { ret: U1, args: &[U32, U32] },
            CmpNe32 => OpcodeInfo { ret: U1, args: &[U32, U32] },
            CmpLt32S => OpcodeInfo { ret: U1, args: &[U32, U32] },
            CmpLt32U => OpcodeInfo { ret: U1, args: &[U32, U32] },
            CmpEq64 => OpcodeInfo { ret: U1, args: &[U64, U64] },
            CmpNe64 => OpcodeInfo { ret: U1, args: &[U64, U64] },
            CmpLt64S => OpcodeInfo { ret: U1, args: &[U64, U64] },
            CmpLe64S => OpcodeInfo { ret: U1, args: &[U64, U64] },
            CmpLt64U => OpcodeInfo { ret: U1, args: &[U64, U64] },
            CmpLe64U => OpcodeInfo { ret: U1, args: &[U64, U64] },

            // Select
            Select32 => OpcodeInfo { ret: U32, args: &[U1, U32, U32] },
            Select64 => OpcodeInfo { ret: U64, args: &[U1, U64, U64] },

            // Halves
            LeastSignificantWord => OpcodeInfo { ret: U32, args: &[U64] },
            MostSignificantWord => OpcodeInfo { ret: U32, args: &[U64] },
            LeastSignificantLong => OpcodeInfo { ret: U64, args: &[U128] },
            MostSignificantLong => OpcodeInfo { ret: U64, args: &[U128] },
            LeastSignificantByte => OpcodeInfo { ret: U8, args: &[U32] },

            // Extensions
            SignExtendBitToLong => OpcodeInfo { ret: U64, args: &[U1] },
            ZeroExtendBitToLong => OpcodeInfo { ret: U64, args: &[U1] },
            ZeroExtendBitToByte => OpcodeInfo { ret: U8, args: &[U1] },
            SignExtendByteToLong => OpcodeInfo { ret: U64, args: &[U8] },
            SignExtendHalfToLong => OpcodeInfo { ret: U64, args: &[U16] },
            SignExtendWordToLong => OpcodeInfo { ret: U64, args: &[U32] },
            ZeroExtendByteToWord => OpcodeInfo { ret: U32, args: &[U8] },
            ZeroExtendByteToLong => OpcodeInfo { ret: U64, args: &[U8] },
            ZeroExtendHalfToLong => OpcodeInfo { ret: U64, args: &[U16] },
            ZeroExtendWordToLong => OpcodeInfo { ret: U64, args: &[U32] },

            // Counts
            CountLeadingZeros32 => OpcodeInfo { ret: U32, args: &[U32] },
            CountLeadingZeros64 => OpcodeInfo { ret: U64, args: &[U64] },
            CountTrailingZeros32 => OpcodeInfo { ret: U32, args: &[U32] },
            CountTrailingZeros64 => OpcodeInfo { ret: U64, args: &[U64] },

            // FP arithmetic
            FPAdd32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPAdd64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64] },
            FPSub32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPSub64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64] },
            FPMul32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPMul64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64] },
            FPDiv32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPDiv64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64] },
            FPMulAdd32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32, U32] },
            FPMulAdd64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64, U64] },
            FPMulSub32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32, U32] },
            FPMulSub64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64, U64] },
            FPNeg32 => OpcodeInfo { ret: U32, args: &[U32] },
            FPNeg64 => OpcodeInfo { ret: U64, args: &[U64] },
            FPAbs32 => OpcodeInfo { ret: U32, args: &[U32] },
            FPAbs64 => OpcodeInfo { ret: U64, args: &[U64] },
            FPSqrt32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPSqrt64 => OpcodeInfo { ret: U64, args: &[U32, U64] },
            FPRSqrt32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPRSqrt64 => OpcodeInfo { ret: U64, args: &[U32, U64] },
            FPScaleB32 => OpcodeInfo { ret: U32, args: &[U32, U32, U32] },
            FPScaleB64 => OpcodeInfo { ret: U64, args: &[U32, U64, U64] },
            FPLogB32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPLogB64 => OpcodeInfo { ret: U64, args: &[U32, U64] },
            FPMaxNum32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPMaxNum64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            FPMinNum32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPMinNum64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            FPMaxNumAbs32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPMaxNumAbs64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            FPMinNumAbs32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPMinNumAbs64 => OpcodeInfo { ret: U64, args: &[U64, U64] },
            FPRoundToInt32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPRoundToInt64 => OpcodeInfo { ret: U64, args: &[U32, U64] },
            FPCompare32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPCompare64 => OpcodeInfo { ret: U32, args: &[U64, U64] },

            // FP conversions
            FPSingleToDouble => OpcodeInfo { ret: U64, args: &[U32] },
            FPDoubleToSingle => OpcodeInfo { ret: U32, args: &[U32, U64] },
            FPSingleToFixedS32 => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPSingleToFixedS64 => OpcodeInfo { ret: U64, args: &[U32, U32] },
            FPDoubleToFixedS32 => OpcodeInfo { ret: U32, args: &[U32, U64] },
            FPDoubleToFixedS64 => OpcodeInfo { ret: U64, args: &[U32, U64] },
            FPFixedS32ToSingle => OpcodeInfo { ret: U32, args: &[U32, U32] },
            FPFixedS64ToSingle => OpcodeInfo { ret: U32, args: &[U32, U64] },
            FPFixedS32ToDouble => OpcodeInfo { ret: U64, args: &[U32] },
            FPFixedS64ToDouble => OpcodeInfo { ret: U64, args: &[U32, U64] },

            // Memory
            ReadMemory8 => OpcodeInfo { ret: U8, args: &[U64] },
            ReadMemory16 => OpcodeInfo { ret: U16, args: &[U64] },
            ReadMemory32 => OpcodeInfo { ret: U32, args: &[U64] },
            ReadMemory64 => OpcodeInfo { ret: U64, args: &[U64] },
            WriteMemory8 => OpcodeInfo { ret: V, args: &[U64, U8] },
            WriteMemory16 => OpcodeInfo { ret: V, args: &[U64, U16] },
            WriteMemory32 => OpcodeInfo { ret: V, args: &[U64, U32] },
            WriteMemory64 => OpcodeInfo { ret: V, args: &[U64, U64] },
            CompareAndSwap32 => OpcodeInfo { ret: U32, args: &[U64, U32, U32] },
            CompareAndSwap64 => OpcodeInfo { ret: U64, args: &[U64, U64, U64] },
            LoadLinked32 => OpcodeInfo { ret: U32, args: &[U64] },
            LoadLinked64 => OpcodeInfo { ret: U64, args: &[U64] },
            StoreConditional32 => OpcodeInfo { ret: U1, args: &[U64, U32] },
            StoreConditional64 => OpcodeInfo { ret: U1, args: &[U64, U64] },
            MemoryFence => OpcodeInfo { ret: V, args: &[] },
            InstructionFence => OpcodeInfo { ret: V, args: &[] },

            // Guest state
            GetGpr8 => OpcodeInfo { ret: U8, args: &[IR] },
            GetGpr16 => OpcodeInfo { ret: U16, args: &[IR] },
            GetGpr32 => OpcodeInfo { ret: U32, args: &[IR] },
            GetGpr64 => OpcodeInfo { ret: U64, args: &[IR] },
            SetGpr => OpcodeInfo { ret: V, args: &[IR, U64] },
            SetPc => OpcodeInfo { ret: V, args: &[U64] },
            GetFpr64 => OpcodeInfo { ret: U64, args: &[FR] },
            SetFpr32 => OpcodeInfo { ret: V, args: &[FR, U32] },
            SetFpr64 => OpcodeInfo { ret: V, args: &[FR, U64] },
            GetFcc => OpcodeInfo { ret: U8, args: &[CC] },
            SetFcc => OpcodeInfo { ret: V, args: &[CC, U8] },
            GetFcsrRaw => OpcodeInfo { ret: U32, args: &[] },
            SetFcsrRaw => OpcodeInfo { ret: V, args: &[U32] },
            GetField => OpcodeInfo { ret: U64, args: &[FLD] },
            SetField => OpcodeInfo { ret: V, args: &[FLD, U64] },
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_metadata() {
        assert_eq!(Opcode::MemoryFence.return_type(), Type::Void);
        assert_eq!(Opcode::MemoryFence.num_args(), 0);

        assert_eq!(Opcode::Add64.return_type(), Type::U64);
        assert_eq!(Opcode::Add64.num_args(), 2);

        assert_eq!(Opcode::GetGpr64.return_type(), Type::U64);
        assert_eq!(Opcode::GetGpr64.num_args(), 1);

        assert_eq!(Opcode::SetGpr.return_type(), Type::Void);
        assert_eq!(Opcode::SetGpr.num_args(), 2);

        assert_eq!(Opcode::Exit.num_args(), 3);
        assert_eq!(Opcode::CallPure.num_args(), 5);
    }

    #[test]
    fn test_side_effects() {
        assert!(Opcode::SetGpr.has_side_effects());
        assert!(Opcode::Exit.has_side_effects());
        assert!(Opcode::CompareAndSwap32.has_side_effects());
        assert!(Opcode::MemoryFence.has_side_effects());
        assert!(!Opcode::Add64.has_side_effects());
        assert!(!Opcode::GetGpr64.has_side_effects());
        assert!(!Opcode::CallPure.has_side_effects());
    }

    #[test]
    fn test_memory_predicates() {
        assert!(Opcode::ReadMemory32.is_memory_read());
        assert!(Opcode::LoadLinked64.is_memory_read());
        assert!(Opcode::WriteMemory64.is_memory_write());
        assert!(Opcode::StoreConditional32.is_memory_write());
        assert!(!Opcode::Add32.is_memory_read());
    }
}
