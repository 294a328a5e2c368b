//! Fixed-point shift and rotate emitters.
//!
//! Word shifts operate on a 32-bit value with an 8-bit count and
//! sign-extend the result; doubleword shifts operate on the full register.
//! Rotates are synthesized from shr | shl.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;

impl<'a> Translator<'a> {
    pub(crate) fn sll_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sll.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let n = self.gpr8(rk);
        let shl = self.ir.ir().logical_shift_left_32(a, n);
        self.put_gpr_sx32(rd, shl);
        true
    }

    pub(crate) fn srl_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("srl.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let n = self.gpr8(rk);
        let shr = self.ir.ir().logical_shift_right_32(a, n);
        self.put_gpr_sx32(rd, shr);
        true
    }

    pub(crate) fn sra_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sra.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let n = self.gpr8(rk);
        let sar = self.ir.ir().arithmetic_shift_right_32(a, n);
        self.put_gpr_sx32(rd, sar);
        true
    }

    pub(crate) fn sll_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sll.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let n = self.gpr8(rk);
        let shl = self.ir.ir().logical_shift_left_64(a, n);
        self.put_gpr(rd, shl);
        true
    }

    pub(crate) fn srl_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("srl.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let n = self.gpr8(rk);
        let shr = self.ir.ir().logical_shift_right_64(a, n);
        self.put_gpr(rd, shr);
        true
    }

    pub(crate) fn sra_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sra.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let n = self.gpr8(rk);
        let sar = self.ir.ir().arithmetic_shift_right_64(a, n);
        self.put_gpr(rd, sar);
        true
    }

    pub(crate) fn rotr_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("rotr.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let n = self.gpr8(rk);
        let shr = self.ir.ir().logical_shift_right_32(a, n);
        let n32 = self.ir.ir().zero_extend_byte_to_word(n);
        let thirty_two = self.ir.ir().imm32(32);
        let sub = self.ir.ir().sub_32(thirty_two, n32);
        let sub8 = self.ir.ir().least_significant_byte(sub);
        let shl = self.ir.ir().logical_shift_left_32(a, sub8);
        let or = self.ir.ir().or_32(shr, shl);
        self.put_gpr_sx32(rd, or);
        true
    }

    pub(crate) fn rotr_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("rotr.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let n = self.gpr8(rk);
        let shr = self.ir.ir().logical_shift_right_64(a, n);
        let n32 = self.ir.ir().zero_extend_byte_to_word(n);
        let sixty_four = self.ir.ir().imm32(64);
        let sub = self.ir.ir().sub_32(sixty_four, n32);
        let sub8 = self.ir.ir().least_significant_byte(sub);
        let shl = self.ir.ir().logical_shift_left_64(a, sub8);
        let or = self.ir.ir().or_64(shr, shl);
        self.put_gpr(rd, or);
        true
    }

    pub(crate) fn slli_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui5) = (insn.rd(), insn.rj(), insn.ui5());
        trace!("slli.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui5);

        let a = self.gpr32(rj);
        let sh = self.ir.ir().imm8(ui5 as u8);
        let shl = self.ir.ir().logical_shift_left_32(a, sh);
        self.put_gpr_sx32(rd, shl);
        true
    }

    pub(crate) fn slli_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui6) = (insn.rd(), insn.rj(), insn.ui6());
        trace!("slli.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui6);

        let a = self.gpr64(rj);
        let sh = self.ir.ir().imm8(ui6 as u8);
        let shl = self.ir.ir().logical_shift_left_64(a, sh);
        self.put_gpr(rd, shl);
        true
    }

    pub(crate) fn srli_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui5) = (insn.rd(), insn.rj(), insn.ui5());
        trace!("srli.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui5);

        let a = self.gpr32(rj);
        let sh = self.ir.ir().imm8(ui5 as u8);
        let shr = self.ir.ir().logical_shift_right_32(a, sh);
        self.put_gpr_sx32(rd, shr);
        true
    }

    pub(crate) fn srli_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui6) = (insn.rd(), insn.rj(), insn.ui6());
        trace!("srli.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui6);

        let a = self.gpr64(rj);
        let sh = self.ir.ir().imm8(ui6 as u8);
        let shr = self.ir.ir().logical_shift_right_64(a, sh);
        self.put_gpr(rd, shr);
        true
    }

    pub(crate) fn srai_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui5) = (insn.rd(), insn.rj(), insn.ui5());
        trace!("srai.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui5);

        let a = self.gpr32(rj);
        let sh = self.ir.ir().imm8(ui5 as u8);
        let sar = self.ir.ir().arithmetic_shift_right_32(a, sh);
        self.put_gpr_sx32(rd, sar);
        true
    }

    pub(crate) fn srai_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui6) = (insn.rd(), insn.rj(), insn.ui6());
        trace!("srai.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui6);

        let a = self.gpr64(rj);
        let sh = self.ir.ir().imm8(ui6 as u8);
        let sar = self.ir.ir().arithmetic_shift_right_64(a, sh);
        self.put_gpr(rd, sar);
        true
    }

    pub(crate) fn rotri_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui5) = (insn.rd(), insn.rj(), insn.ui5());
        trace!("rotri.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui5);

        let a = self.gpr32(rj);
        let shr = self.shr32_guarded(a, ui5);
        let shl = self.shl32_guarded(a, 32 - ui5);
        let or = self.ir.ir().or_32(shr, shl);
        self.put_gpr_sx32(rd, or);
        true
    }

    pub(crate) fn rotri_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui6) = (insn.rd(), insn.rj(), insn.ui6());
        trace!("rotri.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui6);

        let a = self.gpr64(rj);
        let shr = self.shr64_guarded(a, ui6);
        let shl = self.shl64_guarded(a, 64 - ui6);
        let or = self.ir.ir().or_64(shr, shl);
        self.put_gpr(rd, or);
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
            ArchCaps::empty(),
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    #[test]
    fn test_rotri_w_by_zero_replaces_degenerate_shl() {
        // rotri.w $r1, $r2, 0: shl by 32 would be undefined, so the shifted
        // half is the literal zero.
        let block = block_for(0x004c8041);
        let ops = block.opcodes();
        assert!(!ops.contains(&Opcode::LogicalShiftLeft32));
        assert!(ops.contains(&Opcode::LogicalShiftRight32));
        let or = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Or32)
            .unwrap();
        assert_eq!(or.1.arg(1), Value::ImmU32(0));
    }

    #[test]
    fn test_rotri_d_nonzero_has_both_halves() {
        // rotri.d $r1, $r2, 1
        let block = block_for(0x004d0441);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::LogicalShiftLeft64));
        assert!(ops.contains(&Opcode::LogicalShiftRight64));
        assert!(ops.contains(&Opcode::Or64));
    }

    #[test]
    fn test_sll_w_sign_extends() {
        // sll.w $r1, $r2, $r3
        let ops = block_for(0x00170c41).opcodes();
        assert!(ops.contains(&Opcode::LogicalShiftLeft32));
        assert!(ops.contains(&Opcode::SignExtendWordToLong));
    }

    #[test]
    fn test_srai_d_uses_arithmetic_shift() {
        // srai.d $r1, $r2, 4
        let ops = block_for(0x00491041).opcodes();
        assert!(ops.contains(&Opcode::ArithmeticShiftRight64));
    }
}
