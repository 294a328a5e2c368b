use crate::frontend::la64::{Helper, JumpKind};
use crate::ir::block::Block;
use crate::ir::opcode::Opcode;
use crate::ir::value::Value;

/// Base IR emitter: the builder API for constructing IR blocks.
/// Wraps a Block and appends instructions to it.
pub struct IREmitter<'a> {
    pub block: &'a mut Block,
}

impl<'a> IREmitter<'a> {
    pub fn new(block: &'a mut Block) -> Self {
        Self { block }
    }

    /// Internal: emit an instruction and return its Value as an InstRef.
    fn emit(&mut self, opcode: Opcode, args: &[Value]) -> Value {
        let r = self.block.append(opcode, args);
        Value::Inst(r)
    }

    /// Internal: emit an instruction returning void (no result value).
    fn emit_void(&mut self, opcode: Opcode, args: &[Value]) {
        self.block.append(opcode, args);
    }

    // --- Immediates ---

    pub fn imm1(&self, value: bool) -> Value { Value::ImmU1(value) }
    pub fn imm8(&self, value: u8) -> Value { Value::ImmU8(value) }
    pub fn imm16(&self, value: u16) -> Value { Value::ImmU16(value) }
    pub fn imm32(&self, value: u32) -> Value { Value::ImmU32(value) }
    pub fn imm64(&self, value: u64) -> Value { Value::ImmU64(value) }

    // --- ALU ---

    pub fn add_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Add32, &[a, b])
    }

    pub fn add_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Add64, &[a, b])
    }

    pub fn sub_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Sub32, &[a, b])
    }

    pub fn sub_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Sub64, &[a, b])
    }

    pub fn signed_mull_word(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedMullWord, &[a, b])
    }

    pub fn unsigned_mull_word(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedMullWord, &[a, b])
    }

    pub fn signed_mull_long(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedMullLong, &[a, b])
    }

    pub fn unsigned_mull_long(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedMullLong, &[a, b])
    }

    pub fn signed_div_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedDiv32, &[a, b])
    }

    pub fn signed_div_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedDiv64, &[a, b])
    }

    pub fn unsigned_div_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedDiv32, &[a, b])
    }

    pub fn unsigned_div_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedDiv64, &[a, b])
    }

    pub fn signed_rem_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedRem32, &[a, b])
    }

    pub fn signed_rem_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::SignedRem64, &[a, b])
    }

    pub fn unsigned_rem_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedRem32, &[a, b])
    }

    pub fn unsigned_rem_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::UnsignedRem64, &[a, b])
    }

    pub fn and_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::And32, &[a, b])
    }

    pub fn and_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::And64, &[a, b])
    }

    pub fn or_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Or32, &[a, b])
    }

    pub fn or_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Or64, &[a, b])
    }

    pub fn xor_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Xor32, &[a, b])
    }

    pub fn xor_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Xor64, &[a, b])
    }

    pub fn not_32(&mut self, a: Value) -> Value {
        self.emit(Opcode::Not32, &[a])
    }

    pub fn not_64(&mut self, a: Value) -> Value {
        self.emit(Opcode::Not64, &[a])
    }

    pub fn or_1(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::Or1, &[a, b])
    }

    // --- Shifts ---

    pub fn logical_shift_left_32(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::LogicalShiftLeft32, &[value, shift])
    }

    pub fn logical_shift_left_64(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::LogicalShiftLeft64, &[value, shift])
    }

    pub fn logical_shift_right_32(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::LogicalShiftRight32, &[value, shift])
    }

    pub fn logical_shift_right_64(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::LogicalShiftRight64, &[value, shift])
    }

    pub fn arithmetic_shift_right_32(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::ArithmeticShiftRight32, &[value, shift])
    }

    pub fn arithmetic_shift_right_64(&mut self, value: Value, shift: Value) -> Value {
        self.emit(Opcode::ArithmeticShiftRight64, &[value, shift])
    }

    // --- Comparisons ---

    pub fn cmp_eq_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpEq32, &[a, b])
    }

    pub fn cmp_ne_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpNe32, &[a, b])
    }

    pub fn cmp_lt_32s(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLt32S, &[a, b])
    }

    pub fn cmp_lt_32u(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLt32U, &[a, b])
    }

    pub fn cmp_eq_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpEq64, &[a, b])
    }

    pub fn cmp_ne_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpNe64, &[a, b])
    }

    pub fn cmp_lt_64s(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLt64S, &[a, b])
    }

    pub fn cmp_le_64s(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLe64S, &[a, b])
    }

    pub fn cmp_lt_64u(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLt64U, &[a, b])
    }

    pub fn cmp_le_64u(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::CmpLe64U, &[a, b])
    }

    // --- Select ---

    pub fn select_32(&mut self, cond: Value, then_val: Value, else_val: Value) -> Value {
        self.emit(Opcode::Select32, &[cond, then_val, else_val])
    }

    pub fn select_64(&mut self, cond: Value, then_val: Value, else_val: Value) -> Value {
        self.emit(Opcode::Select64, &[cond, then_val, else_val])
    }

    // --- Halves ---

    pub fn least_significant_word(&mut self, value: Value) -> Value {
        self.emit(Opcode::LeastSignificantWord, &[value])
    }

    pub fn most_significant_word(&mut self, value: Value) -> Value {
        self.emit(Opcode::MostSignificantWord, &[value])
    }

    pub fn least_significant_long(&mut self, value: Value) -> Value {
        self.emit(Opcode::LeastSignificantLong, &[value])
    }

    pub fn most_significant_long(&mut self, value: Value) -> Value {
        self.emit(Opcode::MostSignificantLong, &[value])
    }

    pub fn least_significant_byte(&mut self, value: Value) -> Value {
        self.emit(Opcode::LeastSignificantByte, &[value])
    }

    // --- Extensions ---

    pub fn sign_extend_bit_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::SignExtendBitToLong, &[a])
    }

    pub fn zero_extend_bit_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendBitToLong, &[a])
    }

    pub fn zero_extend_bit_to_byte(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendBitToByte, &[a])
    }

    pub fn sign_extend_byte_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::SignExtendByteToLong, &[a])
    }

    pub fn sign_extend_half_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::SignExtendHalfToLong, &[a])
    }

    pub fn sign_extend_word_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::SignExtendWordToLong, &[a])
    }

    pub fn zero_extend_byte_to_word(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendByteToWord, &[a])
    }

    pub fn zero_extend_byte_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendByteToLong, &[a])
    }

    pub fn zero_extend_half_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendHalfToLong, &[a])
    }

    pub fn zero_extend_word_to_long(&mut self, a: Value) -> Value {
        self.emit(Opcode::ZeroExtendWordToLong, &[a])
    }

    // --- Counts ---

    pub fn count_leading_zeros_32(&mut self, a: Value) -> Value {
        self.emit(Opcode::CountLeadingZeros32, &[a])
    }

    pub fn count_leading_zeros_64(&mut self, a: Value) -> Value {
        self.emit(Opcode::CountLeadingZeros64, &[a])
    }

    pub fn count_trailing_zeros_32(&mut self, a: Value) -> Value {
        self.emit(Opcode::CountTrailingZeros32, &[a])
    }

    pub fn count_trailing_zeros_64(&mut self, a: Value) -> Value {
        self.emit(Opcode::CountTrailingZeros64, &[a])
    }

    // --- FP arithmetic ---

    pub fn fp_add_32(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPAdd32, &[rm, a, b])
    }

    pub fn fp_add_64(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPAdd64, &[rm, a, b])
    }

    pub fn fp_sub_32(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPSub32, &[rm, a, b])
    }

    pub fn fp_sub_64(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPSub64, &[rm, a, b])
    }

    pub fn fp_mul_32(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMul32, &[rm, a, b])
    }

    pub fn fp_mul_64(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMul64, &[rm, a, b])
    }

    pub fn fp_div_32(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPDiv32, &[rm, a, b])
    }

    pub fn fp_div_64(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPDiv64, &[rm, a, b])
    }

    pub fn fp_mul_add_32(&mut self, rm: Value, a: Value, b: Value, c: Value) -> Value {
        self.emit(Opcode::FPMulAdd32, &[rm, a, b, c])
    }

    pub fn fp_mul_add_64(&mut self, rm: Value, a: Value, b: Value, c: Value) -> Value {
        self.emit(Opcode::FPMulAdd64, &[rm, a, b, c])
    }

    pub fn fp_mul_sub_32(&mut self, rm: Value, a: Value, b: Value, c: Value) -> Value {
        self.emit(Opcode::FPMulSub32, &[rm, a, b, c])
    }

    pub fn fp_mul_sub_64(&mut self, rm: Value, a: Value, b: Value, c: Value) -> Value {
        self.emit(Opcode::FPMulSub64, &[rm, a, b, c])
    }

    pub fn fp_neg_32(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPNeg32, &[a])
    }

    pub fn fp_neg_64(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPNeg64, &[a])
    }

    pub fn fp_abs_32(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPAbs32, &[a])
    }

    pub fn fp_abs_64(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPAbs64, &[a])
    }

    pub fn fp_sqrt_32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPSqrt32, &[rm, a])
    }

    pub fn fp_sqrt_64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPSqrt64, &[rm, a])
    }

    pub fn fp_rsqrt_32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPRSqrt32, &[rm, a])
    }

    pub fn fp_rsqrt_64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPRSqrt64, &[rm, a])
    }

    pub fn fp_scaleb_32(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPScaleB32, &[rm, a, b])
    }

    pub fn fp_scaleb_64(&mut self, rm: Value, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPScaleB64, &[rm, a, b])
    }

    pub fn fp_logb_32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPLogB32, &[rm, a])
    }

    pub fn fp_logb_64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPLogB64, &[rm, a])
    }

    pub fn fp_max_num_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMaxNum32, &[a, b])
    }

    pub fn fp_max_num_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMaxNum64, &[a, b])
    }

    pub fn fp_min_num_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMinNum32, &[a, b])
    }

    pub fn fp_min_num_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMinNum64, &[a, b])
    }

    pub fn fp_max_num_abs_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMaxNumAbs32, &[a, b])
    }

    pub fn fp_max_num_abs_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMaxNumAbs64, &[a, b])
    }

    pub fn fp_min_num_abs_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMinNumAbs32, &[a, b])
    }

    pub fn fp_min_num_abs_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPMinNumAbs64, &[a, b])
    }

    pub fn fp_round_to_int_32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPRoundToInt32, &[rm, a])
    }

    pub fn fp_round_to_int_64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPRoundToInt64, &[rm, a])
    }

    pub fn fp_compare_32(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPCompare32, &[a, b])
    }

    pub fn fp_compare_64(&mut self, a: Value, b: Value) -> Value {
        self.emit(Opcode::FPCompare64, &[a, b])
    }

    // --- FP conversions ---

    pub fn fp_single_to_double(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPSingleToDouble, &[a])
    }

    pub fn fp_double_to_single(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPDoubleToSingle, &[rm, a])
    }

    pub fn fp_single_to_fixed_s32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPSingleToFixedS32, &[rm, a])
    }

    pub fn fp_single_to_fixed_s64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPSingleToFixedS64, &[rm, a])
    }

    pub fn fp_double_to_fixed_s32(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPDoubleToFixedS32, &[rm, a])
    }

    pub fn fp_double_to_fixed_s64(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPDoubleToFixedS64, &[rm, a])
    }

    pub fn fp_fixed_s32_to_single(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPFixedS32ToSingle, &[rm, a])
    }

    pub fn fp_fixed_s64_to_single(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPFixedS64ToSingle, &[rm, a])
    }

    pub fn fp_fixed_s32_to_double(&mut self, a: Value) -> Value {
        self.emit(Opcode::FPFixedS32ToDouble, &[a])
    }

    pub fn fp_fixed_s64_to_double(&mut self, rm: Value, a: Value) -> Value {
        self.emit(Opcode::FPFixedS64ToDouble, &[rm, a])
    }

    // --- Memory ---

    pub fn read_memory_8(&mut self, addr: Value) -> Value {
        self.emit(Opcode::ReadMemory8, &[addr])
    }

    pub fn read_memory_16(&mut self, addr: Value) -> Value {
        self.emit(Opcode::ReadMemory16, &[addr])
    }

    pub fn read_memory_32(&mut self, addr: Value) -> Value {
        self.emit(Opcode::ReadMemory32, &[addr])
    }

    pub fn read_memory_64(&mut self, addr: Value) -> Value {
        self.emit(Opcode::ReadMemory64, &[addr])
    }

    pub fn write_memory_8(&mut self, addr: Value, value: Value) {
        self.emit_void(Opcode::WriteMemory8, &[addr, value]);
    }

    pub fn write_memory_16(&mut self, addr: Value, value: Value) {
        self.emit_void(Opcode::WriteMemory16, &[addr, value]);
    }

    pub fn write_memory_32(&mut self, addr: Value, value: Value) {
        self.emit_void(Opcode::WriteMemory32, &[addr, value]);
    }

    pub fn write_memory_64(&mut self, addr: Value, value: Value) {
        self.emit_void(Opcode::WriteMemory64, &[addr, value]);
    }

    pub fn compare_and_swap_32(&mut self, addr: Value, expected: Value, new: Value) -> Value {
        self.emit(Opcode::CompareAndSwap32, &[addr, expected, new])
    }

    pub fn compare_and_swap_64(&mut self, addr: Value, expected: Value, new: Value) -> Value {
        self.emit(Opcode::CompareAndSwap64, &[addr, expected, new])
    }

    pub fn load_linked_32(&mut self, addr: Value) -> Value {
        self.emit(Opcode::LoadLinked32, &[addr])
    }

    pub fn load_linked_64(&mut self, addr: Value) -> Value {
        self.emit(Opcode::LoadLinked64, &[addr])
    }

    pub fn store_conditional_32(&mut self, addr: Value, value: Value) -> Value {
        self.emit(Opcode::StoreConditional32, &[addr, value])
    }

    pub fn store_conditional_64(&mut self, addr: Value, value: Value) -> Value {
        self.emit(Opcode::StoreConditional64, &[addr, value])
    }

    pub fn memory_fence(&mut self) {
        self.emit_void(Opcode::MemoryFence, &[]);
    }

    pub fn instruction_fence(&mut self) {
        self.emit_void(Opcode::InstructionFence, &[]);
    }

    // --- Helpers / hooks / exits ---

    /// Record a call to an external pure helper. Unused slots are Void.
    pub fn call_pure(&mut self, helper: Helper, args: &[Value]) -> Value {
        assert!(args.len() <= 4, "too many helper args");
        let mut full = [Value::Void; 5];
        full[0] = Value::ImmHelper(helper);
        for (i, a) in args.iter().enumerate() {
            full[i + 1] = *a;
        }
        self.emit(Opcode::CallPure, &full)
    }

    pub fn inject_ir(&mut self) {
        self.emit_void(Opcode::InjectIr, &[]);
    }

    /// Conditional side exit to a constant guest address.
    pub fn exit(&mut self, guard: Value, target: u64, kind: JumpKind) {
        self.emit_void(
            Opcode::Exit,
            &[guard, Value::ImmU64(target), Value::ImmJumpKind(kind)],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::InstRef;

    #[test]
    fn test_emitter_build_add() {
        let mut block = Block::new(0x1000);
        {
            let mut e = IREmitter::new(&mut block);
            let a = e.imm64(5);
            let b = e.imm64(3);
            let _result = e.add_64(a, b);
        }
        assert_eq!(block.inst_count(), 1);
        assert_eq!(block.get(InstRef(0)).opcode, Opcode::Add64);
    }

    #[test]
    fn test_emitter_exit() {
        let mut block = Block::new(0);
        {
            let mut e = IREmitter::new(&mut block);
            let g = e.imm1(true);
            e.exit(g, 0x2000, JumpKind::Boring);
        }
        assert_eq!(block.inst_count(), 1);
        let inst = block.get(InstRef(0));
        assert_eq!(inst.opcode, Opcode::Exit);
        assert_eq!(inst.arg(1).get_u64(), 0x2000);
        assert_eq!(inst.arg(2).get_jump_kind(), JumpKind::Boring);
    }

    #[test]
    fn test_emitter_call_pure() {
        let mut block = Block::new(0);
        {
            let mut e = IREmitter::new(&mut block);
            let a = e.imm64(0x1234);
            let _ = e.call_pure(Helper::RevBD, &[a]);
        }
        let inst = block.get(InstRef(0));
        assert_eq!(inst.opcode, Opcode::CallPure);
        assert_eq!(inst.arg(0).get_helper(), Helper::RevBD);
        assert_eq!(inst.arg(2), Value::Void);
    }
}
