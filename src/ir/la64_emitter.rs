use crate::frontend::la64::regs::{FReg, Fcc, FcsrView, IReg};
use crate::frontend::la64::{FpOp, GuestField, Helper, JumpKind};
use crate::ir::block::Block;
use crate::ir::emitter::IREmitter;
use crate::ir::opcode::Opcode;
use crate::ir::value::Value;

/// Reserved-bit mask honored by whole-register FCSR writes.
pub const FCSR_WRITE_MASK: u32 = 0x1f1f03df;

/// LA64-specific IR emitter. Extends IREmitter with guest-state access,
/// alignment/bound trap exits and the FCSR protocols.
pub struct La64IREmitter<'a> {
    pub base: IREmitter<'a>,
    /// Guest address of the instruction currently being translated.
    pub pc: u64,
}

impl<'a> La64IREmitter<'a> {
    pub fn new(block: &'a mut Block, pc: u64) -> Self {
        Self {
            base: IREmitter::new(block),
            pc,
        }
    }

    /// Access the underlying base emitter for generic operations.
    pub fn ir(&mut self) -> &mut IREmitter<'a> {
        &mut self.base
    }

    fn emit(&mut self, opcode: Opcode, args: &[Value]) -> Value {
        let r = self.base.block.append(opcode, args);
        Value::Inst(r)
    }

    fn emit_void(&mut self, opcode: Opcode, args: &[Value]) {
        self.base.block.append(opcode, args);
    }

    // --- Integer registers and PC ---

    pub fn get_gpr8(&mut self, reg: IReg) -> Value {
        self.emit(Opcode::GetGpr8, &[Value::ImmIReg(reg)])
    }

    pub fn get_gpr16(&mut self, reg: IReg) -> Value {
        self.emit(Opcode::GetGpr16, &[Value::ImmIReg(reg)])
    }

    pub fn get_gpr32(&mut self, reg: IReg) -> Value {
        self.emit(Opcode::GetGpr32, &[Value::ImmIReg(reg)])
    }

    pub fn get_gpr64(&mut self, reg: IReg) -> Value {
        self.emit(Opcode::GetGpr64, &[Value::ImmIReg(reg)])
    }

    /// Write a 64-bit value to an integer register. Register 0 is
    /// architecturally zero, so writes to it are discarded.
    pub fn set_gpr(&mut self, reg: IReg, value: Value) {
        if reg != IReg::ZERO {
            self.emit_void(Opcode::SetGpr, &[Value::ImmIReg(reg), value]);
        }
    }

    pub fn set_pc(&mut self, value: Value) {
        self.emit_void(Opcode::SetPc, &[value]);
    }

    // --- Floating-point registers ---

    pub fn get_fpr64(&mut self, reg: FReg) -> Value {
        self.emit(Opcode::GetFpr64, &[Value::ImmFReg(reg)])
    }

    /// Single-precision view: the low 32 bits of the 64-bit slot. Reads the
    /// full slot and truncates so memory-checker tools never see a partial
    /// register read.
    pub fn get_fpr32(&mut self, reg: FReg) -> Value {
        let full = self.get_fpr64(reg);
        self.base.least_significant_word(full)
    }

    pub fn set_fpr64(&mut self, reg: FReg, value: Value) {
        self.emit_void(Opcode::SetFpr64, &[Value::ImmFReg(reg), value]);
    }

    /// Write the low 32 bits of an FP register; the upper 32 bits are left
    /// unspecified.
    pub fn set_fpr32(&mut self, reg: FReg, value: Value) {
        self.emit_void(Opcode::SetFpr32, &[Value::ImmFReg(reg), value]);
    }

    // --- FP condition codes ---

    pub fn get_fcc(&mut self, cc: Fcc) -> Value {
        self.emit(Opcode::GetFcc, &[Value::ImmFcc(cc)])
    }

    pub fn set_fcc(&mut self, cc: Fcc, value: Value) {
        self.emit_void(Opcode::SetFcc, &[Value::ImmFcc(cc), value]);
    }

    // --- FCSR ---
    //
    //   bits  | meaning
    //   ---------------
    //   4:0   | enables
    //   7:5   | reserved (bit 7 honored as an enable by hardware)
    //   9:8   | rounding mode
    //   15:10 | reserved
    //   20:16 | sticky flags
    //   23:21 | reserved
    //   28:24 | cause
    //   31:29 | reserved

    /// Read an FCSR sub-view. View 1 is the enables (hardware keeps bit 7
    /// there), view 2 is cause+flags, view 3 is the rounding mode.
    pub fn get_fcsr(&mut self, view: FcsrView) -> Value {
        let raw = self.emit(Opcode::GetFcsrRaw, &[]);
        match view {
            FcsrView::Fcsr0 => raw,
            FcsrView::Fcsr1 => {
                let m = self.base.imm32(0x0000009f);
                self.base.and_32(raw, m)
            }
            FcsrView::Fcsr2 => {
                let m = self.base.imm32(0x1f1f0000);
                self.base.and_32(raw, m)
            }
            FcsrView::Fcsr3 => {
                let m = self.base.imm32(0x00000300);
                self.base.and_32(raw, m)
            }
        }
    }

    /// Write an FCSR sub-view. Sub-view writes read-modify-write the raw
    /// field so bits outside the view's mask are preserved; whole-register
    /// writes honor the reserved-bit mask.
    pub fn set_fcsr(&mut self, view: FcsrView, value: Value) {
        let merged = match view {
            FcsrView::Fcsr0 => {
                let m = self.base.imm32(FCSR_WRITE_MASK);
                self.base.and_32(value, m)
            }
            FcsrView::Fcsr1 => self.merge_fcsr(value, 0x0000009f),
            FcsrView::Fcsr2 => self.merge_fcsr(value, 0x1f1f0000),
            FcsrView::Fcsr3 => self.merge_fcsr(value, 0x00000300),
        };
        self.emit_void(Opcode::SetFcsrRaw, &[merged]);
    }

    fn merge_fcsr(&mut self, value: Value, mask: u32) -> Value {
        let raw = self.emit(Opcode::GetFcsrRaw, &[]);
        let keep_m = self.base.imm32(!mask);
        let keep = self.base.and_32(raw, keep_m);
        let take_m = self.base.imm32(mask);
        let take = self.base.and_32(value, take_m);
        self.base.or_32(keep, take)
    }

    /// Dynamic rounding mode, translated from the LA64 FCSR encoding
    /// {nearest=0, zero=1, +inf=2, -inf=3} to the IR encoding
    /// {nearest=0, -inf=1, +inf=2, zero=3} by xor(rm, (rm << 1) & 2).
    pub fn rounding_mode(&mut self) -> Value {
        let raw = self.emit(Opcode::GetFcsrRaw, &[]);
        let eight = self.base.imm8(8);
        let shr = self.base.logical_shift_right_32(raw, eight);
        let three = self.base.imm32(0x3);
        let rm = self.base.and_32(shr, three);
        let one = self.base.imm8(1);
        let shl = self.base.logical_shift_left_32(rm, one);
        let two = self.base.imm32(2);
        let and = self.base.and_32(shl, two);
        self.base.xor_32(rm, and)
    }

    pub fn round_to_nearest(&mut self) -> Value {
        self.base.imm32(0x0)
    }

    pub fn round_down(&mut self) -> Value {
        self.base.imm32(0x1)
    }

    pub fn round_up(&mut self) -> Value {
        self.base.imm32(0x2)
    }

    pub fn round_to_zero(&mut self) -> Value {
        self.base.imm32(0x3)
    }

    /// Invoke the FCSR-update helper for an FP operation and store the new
    /// cause+flags sub-word. Runs before the operation itself so the sticky
    /// flags reflect this operation's exception status.
    pub fn calculate_fcsr(&mut self, op: FpOp, srcs: &[FReg]) {
        assert!(!srcs.is_empty() && srcs.len() <= 3);
        let mut args = vec![Value::ImmU64(op as u64)];
        for src in srcs {
            let v = self.get_fpr64(*src);
            args.push(v);
        }
        let call = self.base.call_pure(Helper::FcsrUpdate, &args);
        let fcsr2 = self.base.least_significant_word(call);
        self.set_fcsr(FcsrView::Fcsr2, fcsr2);
    }

    // --- Guest fields ---

    pub fn get_field(&mut self, field: GuestField) -> Value {
        self.emit(Opcode::GetField, &[Value::ImmField(field)])
    }

    pub fn set_field(&mut self, field: GuestField, value: Value) {
        self.emit_void(Opcode::SetField, &[Value::ImmField(field), value]);
    }

    // --- Trap exits ---

    /// Guard expression for an alignment check: addr & mask != 0.
    pub fn misaligned(&mut self, addr: Value, mask: u64) -> Value {
        let m = self.base.imm64(mask);
        let and = self.base.and_64(addr, m);
        let zero = self.base.imm64(0);
        self.base.cmp_ne_64(and, zero)
    }

    /// Emit a bus-error exit to PC+4 if the address is misaligned.
    pub fn sigbus_if_misaligned(&mut self, addr: Value, mask: u64) {
        let cond = self.misaligned(addr, mask);
        self.exit_sigbus(cond);
    }

    /// Bus-error (alignment) exit to the fall-through address.
    pub fn exit_sigbus(&mut self, cond: Value) {
        let target = self.pc.wrapping_add(4);
        self.base.exit(cond, target, JumpKind::SigBus);
    }

    /// Bound-check-failure exit to the fall-through address.
    pub fn exit_sigsys(&mut self, cond: Value) {
        let target = self.pc.wrapping_add(4);
        self.base.exit(cond, target, JumpKind::SigSys);
    }

    /// Ordinary conditional exit at a byte offset from the current PC.
    pub fn exit_boring(&mut self, cond: Value, offs: u64) {
        let target = self.pc.wrapping_add(offs);
        self.base.exit(cond, target, JumpKind::Boring);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::InstRef;

    #[test]
    fn test_zero_register_write_discarded() {
        let mut block = Block::new(0x1000);
        {
            let mut e = La64IREmitter::new(&mut block, 0x1000);
            let v = e.ir().imm64(42);
            e.set_gpr(IReg::ZERO, v);
        }
        assert!(block.is_empty());
    }

    #[test]
    fn test_gpr_write() {
        let mut block = Block::new(0x1000);
        {
            let mut e = La64IREmitter::new(&mut block, 0x1000);
            let v = e.ir().imm64(42);
            e.set_gpr(IReg::R1, v);
        }
        assert_eq!(block.opcodes(), vec![Opcode::SetGpr]);
        assert_eq!(block.get(InstRef(0)).arg(0).get_ireg(), IReg::R1);
    }

    #[test]
    fn test_fpr32_reads_full_slot() {
        let mut block = Block::new(0);
        {
            let mut e = La64IREmitter::new(&mut block, 0);
            let _ = e.get_fpr32(FReg::F3);
        }
        assert_eq!(
            block.opcodes(),
            vec![Opcode::GetFpr64, Opcode::LeastSignificantWord]
        );
    }

    #[test]
    fn test_fcsr_whole_write_masks_reserved_bits() {
        let mut block = Block::new(0);
        {
            let mut e = La64IREmitter::new(&mut block, 0);
            let v = e.ir().imm32(0xffff_ffff);
            e.set_fcsr(FcsrView::Fcsr0, v);
        }
        assert_eq!(block.opcodes(), vec![Opcode::And32, Opcode::SetFcsrRaw]);
        assert_eq!(block.get(InstRef(0)).arg(1).get_u32(), FCSR_WRITE_MASK);
    }

    #[test]
    fn test_fcsr_subview_write_preserves_other_bits() {
        let mut block = Block::new(0);
        {
            let mut e = La64IREmitter::new(&mut block, 0);
            let v = e.ir().imm32(0x3);
            e.set_fcsr(FcsrView::Fcsr3, v);
        }
        // RMW: read raw, mask keep, mask take, or, write back.
        assert_eq!(
            block.opcodes(),
            vec![
                Opcode::GetFcsrRaw,
                Opcode::And32,
                Opcode::And32,
                Opcode::Or32,
                Opcode::SetFcsrRaw,
            ]
        );
        assert_eq!(block.get(InstRef(1)).arg(1).get_u32(), !0x0000_0300u32);
        assert_eq!(block.get(InstRef(2)).arg(1).get_u32(), 0x0000_0300);
    }

    #[test]
    fn test_rounding_mode_recoding_shape() {
        let mut block = Block::new(0);
        {
            let mut e = La64IREmitter::new(&mut block, 0);
            let _ = e.rounding_mode();
        }
        assert_eq!(
            block.opcodes(),
            vec![
                Opcode::GetFcsrRaw,
                Opcode::LogicalShiftRight32,
                Opcode::And32,
                Opcode::LogicalShiftLeft32,
                Opcode::And32,
                Opcode::Xor32,
            ]
        );
    }

    #[test]
    fn test_rounding_recode_involution() {
        // The guest-to-IR recoding maps {0,1,2,3} to {0,3,2,1} and is its
        // own inverse.
        let recode = |rm: u32| rm ^ ((rm << 1) & 2);
        assert_eq!((0..4).map(recode).collect::<Vec<_>>(), vec![0, 3, 2, 1]);
        for rm in 0..4 {
            assert_eq!(recode(recode(rm)), rm);
        }
    }

    #[test]
    fn test_alignment_exit() {
        let mut block = Block::new(0x1000);
        {
            let mut e = La64IREmitter::new(&mut block, 0x1000);
            let addr = e.get_gpr64(IReg::R5);
            e.sigbus_if_misaligned(addr, 0x7);
        }
        let ops = block.opcodes();
        assert_eq!(*ops.last().unwrap(), Opcode::Exit);
        let exit = block.get(InstRef((ops.len() - 1) as u32));
        assert_eq!(exit.arg(1).get_u64(), 0x1004);
        assert_eq!(exit.arg(2).get_jump_kind(), JumpKind::SigBus);
    }
}
