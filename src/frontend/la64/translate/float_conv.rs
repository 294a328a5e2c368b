//! Floating-point conversion emitters.
//!
//! Integer-bound conversions bind the rounding mode from one of the four
//! explicit constants or from the dynamic FCSR, and replace the result with
//! the architectural maximum signed value when the FCSR update reported
//! invalid or overflow (bits 20 and 18).

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::FReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{ArchCaps, FpOp};
use crate::ir::value::Value;

/// Rounding-mode binding of a conversion form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    Down,
    Up,
    Zero,
    Nearest,
    Dynamic,
}

impl<'a> Translator<'a> {
    fn conv_rounding(&mut self, rounding: Rounding) -> Value {
        match rounding {
            Rounding::Down => self.ir.round_down(),
            Rounding::Up => self.ir.round_up(),
            Rounding::Zero => self.ir.round_to_zero(),
            Rounding::Nearest => self.ir.round_to_nearest(),
            Rounding::Dynamic => self.ir.rounding_mode(),
        }
    }

    /// Invalid-or-overflow flag of the recorded FCSR: bits 18 and 20 of the
    /// sticky-flag field.
    fn invalid_or_overflow(&mut self) -> Value {
        let raw = self.ir.get_fcsr(crate::frontend::la64::regs::FcsrView::Fcsr0);
        let sixteen = self.ir.ir().imm8(16);
        let shr = self.ir.ir().logical_shift_right_32(raw, sixteen);
        let mask = self.ir.ir().imm32(0x14);
        let and = self.ir.ir().and_32(shr, mask);
        let zero = self.ir.ir().imm32(0);
        self.ir.ir().cmp_ne_32(and, zero)
    }

    /// FP to 32-bit integer, with the saturated replacement.
    fn ftint_w(&mut self, op: FpOp, rounding: Rounding, src64: bool, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(op, &[fj]);
        let rm = self.conv_rounding(rounding);
        let e = if src64 {
            let a = self.fpr64(fj);
            self.ir.ir().fp_double_to_fixed_s32(rm, a)
        } else {
            let a = self.fpr32(fj);
            self.ir.ir().fp_single_to_fixed_s32(rm, a)
        };
        let bad = self.invalid_or_overflow();
        let max = self.ir.ir().imm32(0x7fffffff);
        let res = self.ir.ir().select_32(bad, max, e);
        self.put_fpr32(fd, res);
        true
    }

    /// FP to 64-bit integer, with the saturated replacement.
    fn ftint_l(&mut self, op: FpOp, rounding: Rounding, src64: bool, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(op, &[fj]);
        let rm = self.conv_rounding(rounding);
        let e = if src64 {
            let a = self.fpr64(fj);
            self.ir.ir().fp_double_to_fixed_s64(rm, a)
        } else {
            let a = self.fpr32(fj);
            self.ir.ir().fp_single_to_fixed_s64(rm, a)
        };
        let bad = self.invalid_or_overflow();
        let max = self.ir.ir().imm64(0x7fffffffffffffff);
        let res = self.ir.ir().select_64(bad, max, e);
        self.put_fpr64(fd, res);
        true
    }

    fn fp_gate(&mut self, mnemonic: &str, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("{} {}, {}", mnemonic, FReg::from_u32(fd), FReg::from_u32(fj));
        self.missing_cap(ArchCaps::FP)
    }

    pub(crate) fn fcvt_s_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("fcvt.s.d", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FCvtSD, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_double_to_single(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fcvt_d_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("fcvt.d.s", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FCvtDS, &[fj]);
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_single_to_double(a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn ftintrm_w_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrm.w.s", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRmWS, Rounding::Down, false, insn)
    }

    pub(crate) fn ftintrm_w_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrm.w.d", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRmWD, Rounding::Down, true, insn)
    }

    pub(crate) fn ftintrm_l_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrm.l.s", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRmLS, Rounding::Down, false, insn)
    }

    pub(crate) fn ftintrm_l_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrm.l.d", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRmLD, Rounding::Down, true, insn)
    }

    pub(crate) fn ftintrp_w_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrp.w.s", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRpWS, Rounding::Up, false, insn)
    }

    pub(crate) fn ftintrp_w_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrp.w.d", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRpWD, Rounding::Up, true, insn)
    }

    pub(crate) fn ftintrp_l_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrp.l.s", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRpLS, Rounding::Up, false, insn)
    }

    pub(crate) fn ftintrp_l_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrp.l.d", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRpLD, Rounding::Up, true, insn)
    }

    pub(crate) fn ftintrz_w_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrz.w.s", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRzWS, Rounding::Zero, false, insn)
    }

    pub(crate) fn ftintrz_w_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrz.w.d", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRzWD, Rounding::Zero, true, insn)
    }

    pub(crate) fn ftintrz_l_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrz.l.s", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRzLS, Rounding::Zero, false, insn)
    }

    pub(crate) fn ftintrz_l_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrz.l.d", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRzLD, Rounding::Zero, true, insn)
    }

    pub(crate) fn ftintrne_w_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrne.w.s", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRneWS, Rounding::Nearest, false, insn)
    }

    pub(crate) fn ftintrne_w_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrne.w.d", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintRneWD, Rounding::Nearest, true, insn)
    }

    pub(crate) fn ftintrne_l_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrne.l.s", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRneLS, Rounding::Nearest, false, insn)
    }

    pub(crate) fn ftintrne_l_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftintrne.l.d", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintRneLD, Rounding::Nearest, true, insn)
    }

    pub(crate) fn ftint_w_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftint.w.s", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintWS, Rounding::Dynamic, false, insn)
    }

    pub(crate) fn ftint_w_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftint.w.d", insn) {
            return true;
        }
        self.ftint_w(FpOp::FTintWD, Rounding::Dynamic, true, insn)
    }

    pub(crate) fn ftint_l_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftint.l.s", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintLS, Rounding::Dynamic, false, insn)
    }

    pub(crate) fn ftint_l_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ftint.l.d", insn) {
            return true;
        }
        self.ftint_l(FpOp::FTintLD, Rounding::Dynamic, true, insn)
    }

    pub(crate) fn ffint_s_w(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ffint.s.w", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FFintSW, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_fixed_s32_to_single(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn ffint_s_l(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ffint.s.l", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FFintSL, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_fixed_s64_to_single(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn ffint_d_w(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ffint.d.w", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FFintDW, &[fj]);
        // Every 32-bit integer is exactly representable as a double; no
        // rounding-mode operand.
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_fixed_s32_to_double(a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn ffint_d_l(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("ffint.d.l", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FFintDL, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_fixed_s64_to_double(rm, a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn frint_s(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("frint.s", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FRintS, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_round_to_int_32(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn frint_d(&mut self, insn: InsnWord) -> bool {
        if self.fp_gate("frint.d", insn) {
            return true;
        }
        let (fd, fj) = (insn.fd(), insn.fj());
        self.fcsr_update(FpOp::FRintD, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_round_to_int_64(rm, a);
        self.put_fpr64(fd, res);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;
    use crate::ir::value::Value;

    fn block_for(word: u32) -> Block {
        let mut block = Block::new(0x1000);
        let bytes = word.to_le_bytes();
        let dres = decode(
            &mut block,
            &bytes,
            0,
            0x1000,
            GuestArch::LoongArch64,
            ArchCaps::FP,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    #[test]
    fn test_ftintrz_w_s_constant_rounding_and_saturation() {
        // ftintrz.w.s $fa0, $fa1
        let block = block_for(0x011a8420);
        let conv = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::FPSingleToFixedS32)
            .unwrap();
        // Round-to-zero is the IR constant 3.
        assert_eq!(conv.1.arg(0), Value::ImmU32(0x3));
        // The saturated replacement selects the max signed 32-bit value.
        let sel = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Select32)
            .unwrap();
        assert_eq!(sel.1.arg(1), Value::ImmU32(0x7fffffff));
    }

    #[test]
    fn test_ftint_l_d_dynamic_rounding() {
        // ftint.l.d $fa0, $fa1
        let block = block_for(0x011b2820);
        // Dynamic rounding reads the FCSR and recodes it.
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::Xor32));
        let sel = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Select64)
            .unwrap();
        assert_eq!(sel.1.arg(1), Value::ImmU64(0x7fffffffffffffff));
    }

    #[test]
    fn test_ffint_d_w_is_exact() {
        // ffint.d.w $fa0, $fa1
        let block = block_for(0x011d2020);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::FPFixedS32ToDouble));
        // No saturation select on the int-to-FP path.
        assert!(!ops.contains(&Opcode::Select64));
    }

    #[test]
    fn test_fcvt_d_s_widens_exactly() {
        // fcvt.d.s $fa0, $fa1
        let block = block_for(0x01192420);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::FPSingleToDouble));
    }

    #[test]
    fn test_frint_d() {
        // frint.d $fa0, $fa1
        let block = block_for(0x011e4820);
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::FPRoundToInt64));
    }
}
