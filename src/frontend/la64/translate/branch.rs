//! Control-flow emitters.
//!
//! Conditional branches emit a guarded exit at a word-scaled, sign-extended
//! offset from the current PC and fall through otherwise. Unconditional
//! transfers write the final PC and stop the translation with an ordinary
//! jump kind.

use log::trace;

use crate::frontend::la64::insn::{sext32, sext64, InsnWord};
use crate::frontend::la64::regs::{Fcc, IReg};
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{ArchCaps, DisCont, JumpKind};

impl<'a> Translator<'a> {
    pub(crate) fn beqz(&mut self, insn: InsnWord) -> bool {
        let (rj, offs21) = (insn.rj(), insn.offs21());
        trace!("beqz {}, {}", IReg::from_u32(rj), sext32(offs21, 21) as i32);

        let a = self.gpr64(rj);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_eq_64(a, zero);
        self.ir.exit_boring(cond, sext64((offs21 as u64) << 2, 23));
        true
    }

    pub(crate) fn bnez(&mut self, insn: InsnWord) -> bool {
        let (rj, offs21) = (insn.rj(), insn.offs21());
        trace!("bnez {}, {}", IReg::from_u32(rj), sext32(offs21, 21) as i32);

        let a = self.gpr64(rj);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_ne_64(a, zero);
        self.ir.exit_boring(cond, sext64((offs21 as u64) << 2, 23));
        true
    }

    pub(crate) fn bceqz(&mut self, insn: InsnWord) -> bool {
        let (cj, offs21) = (insn.cj(), insn.offs21());
        trace!("bceqz {}, {}", Fcc::from_u32(cj), sext32(offs21, 21) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let cc = self.ir.get_fcc(Fcc::from_u32(cj));
        let wide = self.ir.ir().zero_extend_byte_to_long(cc);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_eq_64(wide, zero);
        self.ir.exit_boring(cond, sext64((offs21 as u64) << 2, 23));
        true
    }

    pub(crate) fn bcnez(&mut self, insn: InsnWord) -> bool {
        let (cj, offs21) = (insn.cj(), insn.offs21());
        trace!("bcnez {}, {}", Fcc::from_u32(cj), sext32(offs21, 21) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let cc = self.ir.get_fcc(Fcc::from_u32(cj));
        let wide = self.ir.ir().zero_extend_byte_to_long(cc);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_ne_64(wide, zero);
        self.ir.exit_boring(cond, sext64((offs21 as u64) << 2, 23));
        true
    }

    /// The source is snapshotted before the link write so rd == rj
    /// computes the target from the pre-link value.
    pub(crate) fn jirl(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("jirl {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(offs16, 16) as i32);

        let target_base = self.gpr64(rj);
        let ret = self.ir.pc.wrapping_add(4);
        let link = self.ir.ir().imm64(ret);
        self.put_gpr(rd, link);
        let disp = self.ir.ir().imm64(sext64((offs16 as u64) << 2, 18));
        let target = self.ir.ir().add_64(target_base, disp);
        self.ir.set_pc(target);

        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(JumpKind::Boring);
        true
    }

    pub(crate) fn b(&mut self, insn: InsnWord) -> bool {
        let offs26 = insn.offs26();
        trace!("b {}", sext32(offs26, 26) as i32);

        let target = self.ir.pc.wrapping_add(sext64((offs26 as u64) << 2, 28));
        let pc = self.ir.ir().imm64(target);
        self.ir.set_pc(pc);

        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(JumpKind::Boring);
        true
    }

    pub(crate) fn bl(&mut self, insn: InsnWord) -> bool {
        let offs26 = insn.offs26();
        trace!("bl {}", sext32(offs26, 26) as i32);

        let ret = self.ir.pc.wrapping_add(4);
        let link = self.ir.ir().imm64(ret);
        self.put_gpr(1, link);
        let target = self.ir.pc.wrapping_add(sext64((offs26 as u64) << 2, 28));
        let pc = self.ir.ir().imm64(target);
        self.ir.set_pc(pc);

        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(JumpKind::Boring);
        true
    }

    pub(crate) fn beq(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("beq {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let a = self.gpr64(rj);
        let b = self.gpr64(rd);
        let cond = self.ir.ir().cmp_eq_64(a, b);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }

    pub(crate) fn bne(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("bne {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let a = self.gpr64(rj);
        let b = self.gpr64(rd);
        let cond = self.ir.ir().cmp_ne_64(a, b);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }

    pub(crate) fn blt(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("blt {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let a = self.gpr64(rj);
        let b = self.gpr64(rd);
        let cond = self.ir.ir().cmp_lt_64s(a, b);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }

    pub(crate) fn bge(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("bge {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let b = self.gpr64(rd);
        let a = self.gpr64(rj);
        let cond = self.ir.ir().cmp_le_64s(b, a);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }

    pub(crate) fn bltu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("bltu {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let a = self.gpr64(rj);
        let b = self.gpr64(rd);
        let cond = self.ir.ir().cmp_lt_64u(a, b);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }

    pub(crate) fn bgeu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, offs16) = (insn.rd(), insn.rj(), insn.offs16());
        trace!("bgeu {}, {}, {}", IReg::from_u32(rj), IReg::from_u32(rd), sext32(offs16, 16) as i32);

        let b = self.gpr64(rd);
        let a = self.gpr64(rj);
        let cond = self.ir.ir().cmp_le_64u(b, a);
        self.ir.exit_boring(cond, sext64((offs16 as u64) << 2, 18));
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, DisCont, Endness, GuestArch, JumpKind};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn run(word: u32, caps: ArchCaps) -> (Block, crate::frontend::la64::DisResult) {
        let mut block = Block::new(0x10000);
        let bytes = word.to_le_bytes();
        let dres = decode(
            &mut block,
            &bytes,
            0,
            0x10000,
            GuestArch::LoongArch64,
            caps,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        (block, dres)
    }

    #[test]
    fn test_beqz_backward_offset() {
        // beqz $r1, -4
        let offs21 = (-1i32 as u32) & 0x1fffff;
        let word = 0x40000000 | ((offs21 & 0xffff) << 10) | ((offs21 >> 16) & 0x1f) | (1 << 5);
        let (block, dres) = run(word, ArchCaps::empty());
        assert_eq!(dres.next, DisCont::Continue);
        let exit = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Exit)
            .unwrap();
        assert_eq!(exit.1.arg(1).get_u64(), 0xfffc);
    }

    #[test]
    fn test_bcnez_reads_fcc() {
        // bcnez $fcc1, 4
        let word = 0x48000000 | (1 << 10) | (1 << 5) | (0b01 << 8);
        let (block, dres) = run(word, ArchCaps::FP);
        assert_eq!(dres.next, DisCont::Continue);
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::GetFcc));
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::CmpNe64));
    }

    #[test]
    fn test_jirl_same_source_and_dest() {
        // jirl $r1, $r1, 0: the link write must not disturb the target.
        let (block, dres) = run(0x4c000021, ArchCaps::empty());
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::Boring));
        let ops = block.opcodes();
        let read = ops.iter().position(|o| *o == Opcode::GetGpr64).unwrap();
        let link = ops.iter().position(|o| *o == Opcode::SetGpr).unwrap();
        let setpc = ops.iter().position(|o| *o == Opcode::SetPc).unwrap();
        assert!(read < link && link < setpc);
        // The PC target is computed from the snapshot, not the link value.
        let add = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Add64)
            .unwrap();
        let base = add.1.arg(0).inst_ref();
        assert_eq!(block.get(base).opcode, Opcode::GetGpr64);
    }

    #[test]
    fn test_bge_swaps_operands() {
        // bge $r1, $r2, 4: rj >= rd becomes rd <= rj.
        let word = 0x64000000 | (1 << 10) | (1 << 5) | 2;
        let (block, _) = run(word, ArchCaps::empty());
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::CmpLe64S));
    }

    #[test]
    fn test_b_and_bl_target() {
        // b -8
        let offs26 = ((-2i32) as u32) & 0x3ffffff;
        let word = 0x50000000 | ((offs26 & 0xffff) << 10) | (offs26 >> 16);
        let (block, dres) = run(word, ArchCaps::empty());
        assert_eq!(dres.stop, Some(JumpKind::Boring));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.arg(0).get_u64(), 0xfff8);
    }
}
