//! Floating-point move emitters: register moves, fsel, transfers between
//! the integer and FP files, and the FCSR/FCC moves.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::{FReg, Fcc, FcsrView, IReg};
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::ArchCaps;

impl<'a> Translator<'a> {
    pub(crate) fn fmov_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fmov.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr32(fj);
        self.put_fpr32(fd, a);
        true
    }

    pub(crate) fn fmov_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fmov.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr64(fj);
        self.put_fpr64(fd, a);
        true
    }

    /// fd = FCC[ca] == 0 ? fj : fk.
    pub(crate) fn fsel(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, ca) = (insn.fd(), insn.fj(), insn.fk(), insn.ca());
        trace!("fsel {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), Fcc::from_u32(ca));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let cc = self.ir.get_fcc(Fcc::from_u32(ca));
        let wide = self.ir.ir().zero_extend_byte_to_long(cc);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_eq_64(wide, zero);
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().select_64(cond, a, b);
        self.put_fpr64(fd, res);
        true
    }

    /// The hardware writes the full 64-bit source, equivalent to
    /// movgr2fr.d; a stricter reading of the ISA would zero-extend the low
    /// word. Mirrored as the hardware behaves.
    pub(crate) fn movgr2fr_w(&mut self, insn: InsnWord) -> bool {
        let (fd, rj) = (insn.fd(), insn.rj());
        trace!("movgr2fr.w {}, {}", FReg::from_u32(fd), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.gpr64(rj);
        self.put_fpr64(fd, a);
        true
    }

    pub(crate) fn movgr2fr_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj) = (insn.fd(), insn.rj());
        trace!("movgr2fr.d {}, {}", FReg::from_u32(fd), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.gpr64(rj);
        self.put_fpr64(fd, a);
        true
    }

    /// Write the high half of the FP register, keeping the low half.
    pub(crate) fn movgr2frh_w(&mut self, insn: InsnWord) -> bool {
        let (fd, rj) = (insn.fd(), insn.rj());
        trace!("movgr2frh.w {}, {}", FReg::from_u32(fd), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let src = self.gpr64(rj);
        let thirty_two = self.ir.ir().imm8(32);
        let hi = self.ir.ir().logical_shift_left_64(src, thirty_two);
        let old = self.fpr64(fd);
        let shl = self.ir.ir().logical_shift_left_64(old, thirty_two);
        let lo = self.ir.ir().logical_shift_right_64(shl, thirty_two);
        let res = self.ir.ir().or_64(hi, lo);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn movfr2gr_s(&mut self, insn: InsnWord) -> bool {
        let (rd, fj) = (insn.rd(), insn.fj());
        trace!("movfr2gr.s {}, {}", IReg::from_u32(rd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr32(fj);
        self.put_gpr_sx32(rd, a);
        true
    }

    pub(crate) fn movfr2gr_d(&mut self, insn: InsnWord) -> bool {
        let (rd, fj) = (insn.rd(), insn.fj());
        trace!("movfr2gr.d {}, {}", IReg::from_u32(rd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr64(fj);
        self.put_gpr(rd, a);
        true
    }

    pub(crate) fn movfrh2gr_s(&mut self, insn: InsnWord) -> bool {
        let (rd, fj) = (insn.rd(), insn.fj());
        trace!("movfrh2gr.s {}, {}", IReg::from_u32(rd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr64(fj);
        let thirty_two = self.ir.ir().imm8(32);
        let shr = self.ir.ir().logical_shift_right_64(a, thirty_two);
        let lo = self.ir.ir().least_significant_word(shr);
        self.put_gpr_sx32(rd, lo);
        true
    }

    pub(crate) fn movgr2fcsr(&mut self, insn: InsnWord) -> bool {
        let (fcsr, rj) = (insn.fcsr_lo(), insn.rj());
        trace!("movgr2fcsr {}, {}", FcsrView::from_u32(fcsr), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.gpr32(rj);
        self.ir.set_fcsr(FcsrView::from_u32(fcsr), a);
        true
    }

    pub(crate) fn movfcsr2gr(&mut self, insn: InsnWord) -> bool {
        let (rd, fcsr) = (insn.rd(), insn.fcsr_hi());
        trace!("movfcsr2gr {}, {}", IReg::from_u32(rd), FcsrView::from_u32(fcsr));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let v = self.ir.get_fcsr(FcsrView::from_u32(fcsr));
        self.put_gpr_sx32(rd, v);
        true
    }

    pub(crate) fn movfr2cf(&mut self, insn: InsnWord) -> bool {
        let (cd, fj) = (insn.cd(), insn.fj());
        trace!("movfr2cf {}, {}", Fcc::from_u32(cd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr64(fj);
        let one = self.ir.ir().imm64(0x1);
        let and = self.ir.ir().and_64(a, one);
        let lo = self.ir.ir().least_significant_word(and);
        let byte = self.ir.ir().least_significant_byte(lo);
        self.ir.set_fcc(Fcc::from_u32(cd), byte);
        true
    }

    /// The hardware clears the high bits on this transfer.
    pub(crate) fn movcf2fr(&mut self, insn: InsnWord) -> bool {
        let (fd, cj) = (insn.fd(), insn.cj());
        trace!("movcf2fr {}, {}", FReg::from_u32(fd), Fcc::from_u32(cj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let cc = self.ir.get_fcc(Fcc::from_u32(cj));
        let wide = self.ir.ir().zero_extend_byte_to_long(cc);
        self.put_fpr64(fd, wide);
        true
    }

    pub(crate) fn movgr2cf(&mut self, insn: InsnWord) -> bool {
        let (cd, rj) = (insn.cd(), insn.rj());
        trace!("movgr2cf {}, {}", Fcc::from_u32(cd), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.gpr64(rj);
        let one = self.ir.ir().imm64(0x1);
        let and = self.ir.ir().and_64(a, one);
        let lo = self.ir.ir().least_significant_word(and);
        let byte = self.ir.ir().least_significant_byte(lo);
        self.ir.set_fcc(Fcc::from_u32(cd), byte);
        true
    }

    /// The hardware clears the high bits on this transfer.
    pub(crate) fn movcf2gr(&mut self, insn: InsnWord) -> bool {
        let (rd, cj) = (insn.rd(), insn.cj());
        trace!("movcf2gr {}, {}", IReg::from_u32(rd), Fcc::from_u32(cj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let cc = self.ir.get_fcc(Fcc::from_u32(cj));
        let wide = self.ir.ir().zero_extend_byte_to_long(cc);
        self.put_gpr(rd, wide);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::regs::Fcc;
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

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
    fn test_movgr2fr_w_writes_full_slot() {
        // movgr2fr.w $fa0, $r1
        let block = block_for(0x0114a420);
        let ops = block.opcodes();
        // The full 64-bit source lands in the register, matching the
        // hardware rather than a zero-extending reading of the ISA.
        assert_eq!(ops, vec![Opcode::GetGpr64, Opcode::SetFpr64, Opcode::SetPc]);
    }

    #[test]
    fn test_movgr2frh_w_keeps_low_half() {
        // movgr2frh.w $fa0, $r1
        let block = block_for(0x0114ac20);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::GetFpr64));
        assert!(ops.contains(&Opcode::Or64));
    }

    #[test]
    fn test_fsel_selects_on_fcc() {
        // fsel $fa0, $fa1, $fa2, $fcc3
        let block = block_for(0x0d018820);
        let get = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::GetFcc)
            .unwrap();
        assert_eq!(get.1.arg(0).get_fcc(), Fcc::C3);
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::Select64));
    }

    #[test]
    fn test_movfcsr2gr_view3_masks_rounding_mode() {
        // movfcsr2gr $r1, $fcsr3
        let block = block_for(0x0114c861);
        let and = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::And32)
            .unwrap();
        assert_eq!(and.1.arg(1).get_u32(), 0x0000_0300);
    }

    #[test]
    fn test_movgr2fcsr_view0_reserved_mask() {
        // movgr2fcsr $fcsr0, $r1
        let block = block_for(0x0114c020);
        let and = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::And32)
            .unwrap();
        assert_eq!(and.1.arg(1).get_u32(), 0x1f1f03df);
    }

    #[test]
    fn test_movcf2gr_zero_extends() {
        // movcf2gr $r1, $fcc2
        let block = block_for(0x0114dc41);
        let ops = block.opcodes();
        assert_eq!(
            ops,
            vec![
                Opcode::GetFcc,
                Opcode::ZeroExtendByteToLong,
                Opcode::SetGpr,
                Opcode::SetPc,
            ]
        );
    }
}
