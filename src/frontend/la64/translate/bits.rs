//! Bit-manipulation emitters: extensions, leading/trailing counts, byte and
//! bit reversal (via pure helpers), bytepick and the bit-string
//! insert/extract pair.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::Helper;

impl<'a> Translator<'a> {
    pub(crate) fn ext_w_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("ext.w.h {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr16(rj);
        let wide = self.ir.ir().sign_extend_half_to_long(a);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ext_w_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("ext.w.b {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr8(rj);
        let wide = self.ir.ir().sign_extend_byte_to_long(a);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn clo_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("clo.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr32(rj);
        let not = self.ir.ir().not_32(a);
        let clz = self.ir.ir().count_leading_zeros_32(not);
        let wide = self.ir.ir().zero_extend_word_to_long(clz);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn clz_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("clz.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr32(rj);
        let clz = self.ir.ir().count_leading_zeros_32(a);
        let wide = self.ir.ir().zero_extend_word_to_long(clz);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn cto_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("cto.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr32(rj);
        let not = self.ir.ir().not_32(a);
        let ctz = self.ir.ir().count_trailing_zeros_32(not);
        let wide = self.ir.ir().zero_extend_word_to_long(ctz);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ctz_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("ctz.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr32(rj);
        let ctz = self.ir.ir().count_trailing_zeros_32(a);
        let wide = self.ir.ir().zero_extend_word_to_long(ctz);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn clo_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("clo.d {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr64(rj);
        let not = self.ir.ir().not_64(a);
        let clz = self.ir.ir().count_leading_zeros_64(not);
        self.put_gpr(rd, clz);
        true
    }

    pub(crate) fn clz_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("clz.d {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr64(rj);
        let clz = self.ir.ir().count_leading_zeros_64(a);
        self.put_gpr(rd, clz);
        true
    }

    pub(crate) fn cto_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("cto.d {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr64(rj);
        let not = self.ir.ir().not_64(a);
        let ctz = self.ir.ir().count_trailing_zeros_64(not);
        self.put_gpr(rd, ctz);
        true
    }

    pub(crate) fn ctz_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("ctz.d {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr64(rj);
        let ctz = self.ir.ir().count_trailing_zeros_64(a);
        self.put_gpr(rd, ctz);
        true
    }

    /// Shared shape of the byte/bit reversal family: one helper call on the
    /// full source register.
    fn rev_helper(&mut self, mnemonic: &str, helper: Helper, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("{} {}, {}", mnemonic, IReg::from_u32(rd), IReg::from_u32(rj));

        let a = self.gpr64(rj);
        let call = self.ir.ir().call_pure(helper, &[a]);
        self.put_gpr(rd, call);
        true
    }

    pub(crate) fn revb_2h(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revb.2h", Helper::RevB2H, insn)
    }

    pub(crate) fn revb_4h(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revb.4h", Helper::RevB4H, insn)
    }

    pub(crate) fn revb_2w(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revb.2w", Helper::RevB2W, insn)
    }

    pub(crate) fn revb_d(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revb.d", Helper::RevBD, insn)
    }

    pub(crate) fn revh_2w(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revh.2w", Helper::RevH2W, insn)
    }

    pub(crate) fn revh_d(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("revh.d", Helper::RevHD, insn)
    }

    pub(crate) fn bitrev_4b(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("bitrev.4b", Helper::BitRev4B, insn)
    }

    pub(crate) fn bitrev_8b(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("bitrev.8b", Helper::BitRev8B, insn)
    }

    pub(crate) fn bitrev_w(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("bitrev.w", Helper::BitRevW, insn)
    }

    pub(crate) fn bitrev_d(&mut self, insn: InsnWord) -> bool {
        self.rev_helper("bitrev.d", Helper::BitRevD, insn)
    }

    /// Concatenate rk:rj and extract the aligned 4-byte window starting at
    /// byte lane sa2.
    pub(crate) fn bytepick_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk, sa2) = (insn.rd(), insn.rj(), insn.rk(), insn.sa2());
        trace!("bytepick.w {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk), sa2);

        let shift = 8 * (4 - sa2);
        let b = self.gpr32(rk);
        let shl = self.shl32_guarded(b, 32 - shift);
        let a = self.gpr32(rj);
        let shr = self.shr32_guarded(a, shift);
        let or = self.ir.ir().or_32(shl, shr);
        self.put_gpr_sx32(rd, or);
        true
    }

    pub(crate) fn bytepick_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk, sa3) = (insn.rd(), insn.rj(), insn.rk(), insn.sa3());
        trace!("bytepick.d {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk), sa3);

        let shift = 8 * (8 - sa3);
        let b = self.gpr64(rk);
        let shl = self.shl64_guarded(b, 64 - shift);
        let a = self.gpr64(rj);
        let shr = self.shr64_guarded(a, shift);
        let or = self.ir.ir().or_64(shl, shr);
        self.put_gpr(rd, or);
        true
    }

    /// Insert rj[msb-lsb:0] into rd[msb:lsb]: clear the destination window,
    /// align the source window, OR the three pieces.
    pub(crate) fn bstrins_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, msb, lsb) = (insn.rd(), insn.rj(), insn.msbw(), insn.lsbw());
        trace!("bstrins.w {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), msb, lsb);

        let old = self.gpr32(rd);
        // Bits above the window; degenerate msb = 31 leaves nothing.
        let high = if msb == 31 {
            self.ir.ir().imm32(0)
        } else {
            let sh = self.ir.ir().imm8((msb + 1) as u8);
            let shr = self.ir.ir().logical_shift_right_32(old, sh);
            self.ir.ir().logical_shift_left_32(shr, sh)
        };
        let src = self.gpr32(rj);
        let shl_n = self.ir.ir().imm8((31 - msb + lsb) as u8);
        let shl = self.ir.ir().logical_shift_left_32(src, shl_n);
        let shr_n = self.ir.ir().imm8((31 - msb) as u8);
        let window = self.ir.ir().logical_shift_right_32(shl, shr_n);
        // Bits below the window; degenerate lsb = 0 leaves nothing.
        let low = if lsb == 0 {
            self.ir.ir().imm32(0)
        } else {
            let sh = self.ir.ir().imm8((32 - lsb) as u8);
            let shl = self.ir.ir().logical_shift_left_32(old, sh);
            self.ir.ir().logical_shift_right_32(shl, sh)
        };
        let or1 = self.ir.ir().or_32(high, window);
        let or2 = self.ir.ir().or_32(or1, low);
        self.put_gpr_sx32(rd, or2);
        true
    }

    pub(crate) fn bstrpick_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, msb, lsb) = (insn.rd(), insn.rj(), insn.msbw(), insn.lsbw());
        trace!("bstrpick.w {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), msb, lsb);

        let src = self.gpr32(rj);
        let shl_n = self.ir.ir().imm8((31 - msb) as u8);
        let shl = self.ir.ir().logical_shift_left_32(src, shl_n);
        let shr_n = self.ir.ir().imm8((31 - msb + lsb) as u8);
        let shr = self.ir.ir().logical_shift_right_32(shl, shr_n);
        self.put_gpr_sx32(rd, shr);
        true
    }

    pub(crate) fn bstrins_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, msb, lsb) = (insn.rd(), insn.rj(), insn.msbd(), insn.lsbd());
        trace!("bstrins.d {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), msb, lsb);

        let old = self.gpr64(rd);
        let high = if msb == 63 {
            self.ir.ir().imm64(0)
        } else {
            let sh = self.ir.ir().imm8((msb + 1) as u8);
            let shr = self.ir.ir().logical_shift_right_64(old, sh);
            self.ir.ir().logical_shift_left_64(shr, sh)
        };
        let src = self.gpr64(rj);
        let shl_n = self.ir.ir().imm8((63 - msb + lsb) as u8);
        let shl = self.ir.ir().logical_shift_left_64(src, shl_n);
        let shr_n = self.ir.ir().imm8((63 - msb) as u8);
        let window = self.ir.ir().logical_shift_right_64(shl, shr_n);
        let low = if lsb == 0 {
            self.ir.ir().imm64(0)
        } else {
            let sh = self.ir.ir().imm8((64 - lsb) as u8);
            let shl = self.ir.ir().logical_shift_left_64(old, sh);
            self.ir.ir().logical_shift_right_64(shl, sh)
        };
        let or1 = self.ir.ir().or_64(high, window);
        let or2 = self.ir.ir().or_64(or1, low);
        self.put_gpr(rd, or2);
        true
    }

    pub(crate) fn bstrpick_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, msb, lsb) = (insn.rd(), insn.rj(), insn.msbd(), insn.lsbd());
        trace!("bstrpick.d {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), msb, lsb);

        let src = self.gpr64(rj);
        let shl_n = self.ir.ir().imm8((63 - msb) as u8);
        let shl = self.ir.ir().logical_shift_left_64(src, shl_n);
        let shr_n = self.ir.ir().imm8((63 - msb + lsb) as u8);
        let shr = self.ir.ir().logical_shift_right_64(shl, shr_n);
        self.put_gpr(rd, shr);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch, Helper};
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
            ArchCaps::empty(),
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    #[test]
    fn test_revb_d_is_helper_call() {
        // revb.d $r1, $r2
        let block = block_for(0x00003c41);
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .expect("no helper call");
        assert_eq!(call.1.arg(0).get_helper(), Helper::RevBD);
    }

    #[test]
    fn test_bstrpick_d_full_width_is_identity_shifts() {
        // bstrpick.d $r1, $r2, 63, 0: both shift counts are zero.
        let block = block_for(0x00ff0041);
        for (_, inst) in block.iter() {
            if inst.opcode == Opcode::LogicalShiftLeft64
                || inst.opcode == Opcode::LogicalShiftRight64
            {
                assert_eq!(inst.arg(1), Value::ImmU8(0));
            }
        }
    }

    #[test]
    fn test_bstrins_w_full_window_drops_old_halves() {
        // bstrins.w $r1, $r2, 31, 0: high and low keeps degenerate to zero.
        let block = block_for(0x007f0041);
        let ors: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Or32)
            .collect();
        assert_eq!(ors.len(), 2);
        assert_eq!(ors[0].1.arg(0), Value::ImmU32(0));
        assert_eq!(ors[1].1.arg(1), Value::ImmU32(0));
    }

    #[test]
    fn test_bytepick_w_lane_zero() {
        // bytepick.w $r1, $r2, $r3, 0: shift = 32, so the rj half is the
        // literal zero and rk passes through unshifted.
        let block = block_for(0x00080c41);
        let or = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Or32)
            .unwrap();
        assert_eq!(or.1.arg(1), Value::ImmU32(0));
    }

    #[test]
    fn test_clo_w_shape() {
        // clo.w $r1, $r2
        let ops = block_for(0x00001041).opcodes();
        assert_eq!(
            ops,
            vec![
                Opcode::GetGpr32,
                Opcode::Not32,
                Opcode::CountLeadingZeros32,
                Opcode::ZeroExtendWordToLong,
                Opcode::SetGpr,
                Opcode::SetPc,
            ]
        );
    }
}
