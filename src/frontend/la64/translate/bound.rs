//! Bounds-checked load/store emitters and the bound assertions.
//!
//! The gt forms require addr > bound, the le forms require addr <= bound;
//! a failing comparison exits with a system-error signal. The alignment
//! check on the sized forms applies regardless of unaligned-access support.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::ir::value::Value;

impl<'a> Translator<'a> {
    /// addr <= bound, i.e. the failure condition of the gt forms.
    fn bound_gt_fails(&mut self, addr: Value, insn: InsnWord) -> Value {
        let bound = self.gpr64(insn.rk());
        self.ir.ir().cmp_le_64u(addr, bound)
    }

    /// bound < addr, i.e. the failure condition of the le forms.
    fn bound_le_fails(&mut self, addr: Value, insn: InsnWord) -> Value {
        let bound = self.gpr64(insn.rk());
        self.ir.ir().cmp_lt_64u(bound, addr)
    }

    pub(crate) fn ldgt_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldgt.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().sign_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldgt_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldgt.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x1);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().sign_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldgt_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldgt.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldgt_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldgt.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_gpr(rd, val);
        true
    }

    pub(crate) fn ldle_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldle.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_8(addr);
        let wide = self.ir.ir().sign_extend_byte_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldle_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldle.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x1);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_16(addr);
        let wide = self.ir.ir().sign_extend_half_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldle_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldle.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(val);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn ldle_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("ldle.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_gpr(rd, val);
        true
    }

    pub(crate) fn stgt_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stgt.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr8(rd);
        self.ir.ir().write_memory_8(addr, val);
        true
    }

    pub(crate) fn stgt_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stgt.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x1);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr16(rd);
        self.ir.ir().write_memory_16(addr, val);
        true
    }

    pub(crate) fn stgt_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stgt.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr32(rd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn stgt_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stgt.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let fail = self.bound_gt_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr64(rd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn stle_b(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stle.b {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr8(rd);
        self.ir.ir().write_memory_8(addr, val);
        true
    }

    pub(crate) fn stle_h(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stle.h {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x1);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr16(rd);
        self.ir.ir().write_memory_16(addr, val);
        true
    }

    pub(crate) fn stle_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stle.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr32(rd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn stle_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("stle.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let fail = self.bound_le_fails(addr, insn);
        self.ir.exit_sigsys(fail);
        let val = self.gpr64(rd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn asrtle_d(&mut self, insn: InsnWord) -> bool {
        let (rj, rk) = (insn.rj(), insn.rk());
        trace!("asrtle.d {}, {}", IReg::from_u32(rj), IReg::from_u32(rk));

        let bound = self.gpr64(rk);
        let addr = self.gpr64(rj);
        let fail = self.ir.ir().cmp_lt_64u(bound, addr);
        self.ir.exit_sigsys(fail);
        true
    }

    pub(crate) fn asrtgt_d(&mut self, insn: InsnWord) -> bool {
        let (rj, rk) = (insn.rj(), insn.rk());
        trace!("asrtgt.d {}, {}", IReg::from_u32(rj), IReg::from_u32(rk));

        let addr = self.gpr64(rj);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_le_64u(addr, bound);
        self.ir.exit_sigsys(fail);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch, JumpKind};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn block_for(word: u32, caps: ArchCaps) -> Block {
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

    #[test]
    fn test_ldgt_w_emits_sigbus_then_sigsys() {
        // ldgt.w $r1, $r2, $r3
        let block = block_for(0x38790c41, ArchCaps::empty());
        let kinds: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Exit)
            .map(|(_, i)| i.arg(2).get_jump_kind())
            .collect();
        assert_eq!(kinds, vec![JumpKind::SigBus, JumpKind::SigSys]);
    }

    #[test]
    fn test_ldgt_alignment_check_survives_ual() {
        // Bound-checked accesses always verify alignment.
        let block = block_for(0x38790c41, ArchCaps::UAL);
        assert!(block
            .iter()
            .any(|(_, i)| i.opcode == Opcode::Exit
                && i.arg(2).get_jump_kind() == JumpKind::SigBus));
    }

    #[test]
    fn test_ldgt_b_failure_is_le() {
        // ldgt.b requires addr > bound, so the exit fires on addr <= bound.
        let block = block_for(0x38780c41, ArchCaps::empty());
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::CmpLe64U));
    }

    #[test]
    fn test_ldle_b_failure_is_lt() {
        // ldle.b requires addr <= bound, so the exit fires on bound < addr.
        let block = block_for(0x387a0c41, ArchCaps::empty());
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::CmpLt64U));
    }

    #[test]
    fn test_asrtgt_d() {
        // asrtgt.d $r2, $r3
        let block = block_for(0x00018c40, ArchCaps::empty());
        let exit = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Exit)
            .unwrap();
        assert_eq!(exit.1.arg(2).get_jump_kind(), JumpKind::SigSys);
    }
}
