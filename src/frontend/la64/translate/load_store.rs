//! Fixed-point load/store emitters: immediate-displaced, register-indexed,
//! word-scaled pointer forms, prefetch hints and the two fences.

use log::trace;

use crate::frontend::la64::insn::{sext32, InsnWord};
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;

impl<'a> Translator<'a> {
    pub(crate) fn ld_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().sign_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ld_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x1);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().sign_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ld_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ld_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x7);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_gpr(rd, val);
        true
    }

    pub(crate) fn st_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("st.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        let val = self.gpr8(rd);
        self.ir.ir().write_memory_8(addr, val);
        true
    }

    pub(crate) fn st_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("st.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x1);
        let val = self.gpr16(rd);
        self.ir.ir().write_memory_16(addr, val);
        true
    }

    pub(crate) fn st_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("st.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x3);
        let val = self.gpr32(rd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn st_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("st.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x7);
        let val = self.gpr64(rd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn ld_bu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.bu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().zero_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ld_hu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.hu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x1);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().zero_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ld_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("ld.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().zero_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    // --- Register-indexed forms ---

    pub(crate) fn ldx_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().sign_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldx_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x1);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().sign_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldx_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldx_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x7);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_gpr(rd, val);
        true
    }

    pub(crate) fn stx_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stx.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        let val = self.gpr8(rd);
        self.ir.ir().write_memory_8(addr, val);
        true
    }

    pub(crate) fn stx_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stx.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x1);
        let val = self.gpr16(rd);
        self.ir.ir().write_memory_16(addr, val);
        true
    }

    pub(crate) fn stx_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stx.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x3);
        let val = self.gpr32(rd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn stx_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stx.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x7);
        let val = self.gpr64(rd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn ldx_bu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.bu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().zero_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldx_hu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.hu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x1);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().zero_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldx_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldx.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().zero_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    // --- Prefetch hints: no memory access is performed ---

    pub(crate) fn preld(&mut self, insn: InsnWord) -> bool {
        let (hint, rj, si12) = (insn.hint5(), insn.rj(), insn.si12());
        trace!("preld {}, {}, {}", hint, IReg::from_u32(rj), sext32(si12, 12) as i32);
        true
    }

    pub(crate) fn preldx(&mut self, insn: InsnWord) -> bool {
        let (hint, rj, si12) = (insn.hint5(), insn.rj(), insn.si12());
        trace!("preldx {}, {}, {}", hint, IReg::from_u32(rj), sext32(si12, 12) as i32);
        true
    }

    // --- Barriers ---

    pub(crate) fn dbar(&mut self, insn: InsnWord) -> bool {
        trace!("dbar {}", insn.hint15());
        self.ir.ir().memory_fence();
        true
    }

    pub(crate) fn ibar(&mut self, insn: InsnWord) -> bool {
        trace!("ibar {}", insn.hint15());
        self.ir.ir().instruction_fence();
        true
    }

    // --- Word-scaled pointer forms ---

    pub(crate) fn ldptr_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!("ldptr.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si14, 14) as i32);

        let addr = self.addr_si14(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn stptr_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!("stptr.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si14, 14) as i32);

        let addr = self.addr_si14(insn);
        self.check_align(addr, 0x3);
        let val = self.gpr32(rd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn ldptr_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!("ldptr.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si14, 14) as i32);

        let addr = self.addr_si14(insn);
        self.check_align(addr, 0x7);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_gpr(rd, val);
        true
    }

    pub(crate) fn stptr_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!("stptr.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si14, 14) as i32);

        let addr = self.addr_si14(insn);
        self.check_align(addr, 0x7);
        let val = self.gpr64(rd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch, JumpKind};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn block_for_caps(word: u32, caps: ArchCaps) -> Block {
        let mut block = Block::new(0x1000);
        let bytes = word.to_le_bytes();
        let dres = decode(
            &mut block,
            &bytes,
            0,
            0x1000,
            GuestArch::LoongArch64,
            caps,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    fn block_for(word: u32) -> Block {
        block_for_caps(word, ArchCaps::empty())
    }

    #[test]
    fn test_ld_b_has_no_alignment_check() {
        // ld.b $r1, $r2, 0
        let ops = block_for(0x28000041).opcodes();
        assert!(!ops.contains(&Opcode::Exit));
        assert!(ops.contains(&Opcode::ReadMemory8));
        assert!(ops.contains(&Opcode::SignExtendByteToLong));
    }

    #[test]
    fn test_ld_d_alignment_mask_is_seven() {
        // ld.d $r1, $r2, 0
        let block = block_for(0x28c00041);
        let and = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::And64)
            .expect("no alignment mask");
        assert_eq!(and.1.arg(1).get_u64(), 0x7);
        let exit = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Exit)
            .unwrap();
        assert_eq!(exit.1.arg(2).get_jump_kind(), JumpKind::SigBus);
    }

    #[test]
    fn test_st_w_stores_low_word() {
        // st.w $r1, $r2, 4
        let ops = block_for(0x29801041).opcodes();
        assert!(ops.contains(&Opcode::GetGpr32));
        assert!(ops.contains(&Opcode::WriteMemory32));
    }

    #[test]
    fn test_ldx_d_indexes_by_register() {
        // ldx.d $r1, $r2, $r3
        let ops = block_for_caps(0x380c0c41, ArchCaps::UAL).opcodes();
        assert_eq!(
            ops,
            vec![
                Opcode::GetGpr64,
                Opcode::GetGpr64,
                Opcode::Add64,
                Opcode::ReadMemory64,
                Opcode::SetGpr,
                Opcode::SetPc,
            ]
        );
    }

    #[test]
    fn test_preld_emits_nothing() {
        // preld 0, $r2, 0
        let ops = block_for(0x2ac00040).opcodes();
        assert_eq!(ops, vec![Opcode::SetPc]);
    }

    #[test]
    fn test_dbar_and_ibar_fences() {
        // dbar 0
        let ops = block_for(0x38720000).opcodes();
        assert_eq!(ops, vec![Opcode::MemoryFence, Opcode::SetPc]);
        // ibar 0
        let ops = block_for(0x38728000).opcodes();
        assert_eq!(ops, vec![Opcode::InstructionFence, Opcode::SetPc]);
    }

    #[test]
    fn test_stptr_d_word_scaled_displacement() {
        // stptr.d $r1, $r2, 4 (si14 = 1, scaled to byte offset 4)
        let block = block_for_caps(0x27000441, ArchCaps::UAL);
        let imm = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Add64)
            .unwrap();
        assert_eq!(imm.1.arg(1).get_u64(), 4);
    }
}
