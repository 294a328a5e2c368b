//! CRC accelerators, traps, system calls, timer reads and CPU
//! identification.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{ArchCaps, DisCont, Helper, JumpKind};

impl<'a> Translator<'a> {
    fn crc_helper(&mut self, mnemonic: &str, helper: Helper, width: u64, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("{} {}, {}, {}", mnemonic, IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let acc = self.gpr64(rk);
        let data = self.gpr64(rj);
        let w = self.ir.ir().imm64(width);
        let call = self.ir.ir().call_pure(helper, &[acc, data, w]);
        self.put_gpr(rd, call);
        true
    }

    pub(crate) fn crc_w_b_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crc.w.b.w", Helper::Crc, 8, insn)
    }

    pub(crate) fn crc_w_h_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crc.w.h.w", Helper::Crc, 16, insn)
    }

    pub(crate) fn crc_w_w_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crc.w.w.w", Helper::Crc, 32, insn)
    }

    pub(crate) fn crc_w_d_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crc.w.d.w", Helper::Crc, 64, insn)
    }

    pub(crate) fn crcc_w_b_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crcc.w.b.w", Helper::Crcc, 8, insn)
    }

    pub(crate) fn crcc_w_h_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crcc.w.h.w", Helper::Crcc, 16, insn)
    }

    pub(crate) fn crcc_w_w_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crcc.w.w.w", Helper::Crcc, 32, insn)
    }

    pub(crate) fn crcc_w_d_w(&mut self, insn: InsnWord) -> bool {
        self.crc_helper("crcc.w.d.w", Helper::Crcc, 64, insn)
    }

    /// Most LoongArch instructions do not raise exceptions; the compiler
    /// notifies the kernel with a trap code instead. Codes 6 and 7 are the
    /// overflow and divide-by-zero conventions.
    pub(crate) fn break_inst(&mut self, insn: InsnWord) -> bool {
        let code = insn.code();
        trace!("break {}", code);

        let next = self.ir.pc.wrapping_add(4);
        let pc = self.ir.ir().imm64(next);
        self.ir.set_pc(pc);

        let kind = match code {
            6 => JumpKind::SigFpeIntOvf,
            7 => JumpKind::SigFpeIntDiv,
            _ => JumpKind::SigTrap,
        };
        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(kind);
        true
    }

    pub(crate) fn syscall(&mut self, insn: InsnWord) -> bool {
        trace!("syscall {}", insn.hint15());

        let next = self.ir.pc.wrapping_add(4);
        let pc = self.ir.ir().imm64(next);
        self.ir.set_pc(pc);

        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(JumpKind::SysSyscall);
        true
    }

    // The stable-counter reads return literal zero: the frontend has no
    // timer virtualization. TODO: revisit once the framework exposes a
    // virtual counter to translated code.

    pub(crate) fn rdtimel_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("rdtimel.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let zero = self.ir.ir().imm64(0);
        self.put_gpr(rd, zero);
        true
    }

    pub(crate) fn rdtimeh_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("rdtimeh.w {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let zero = self.ir.ir().imm64(0);
        self.put_gpr(rd, zero);
        true
    }

    pub(crate) fn rdtime_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("rdtime.d {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        let zero = self.ir.ir().imm64(0);
        self.put_gpr(rd, zero);
        true
    }

    pub(crate) fn cpucfg(&mut self, insn: InsnWord) -> bool {
        let (rd, rj) = (insn.rd(), insn.rj());
        trace!("cpucfg {}, {}", IReg::from_u32(rd), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::CPUCFG) {
            return true;
        }

        let sel = self.gpr64(rj);
        let call = self.ir.ir().call_pure(Helper::CpuCfg, &[sel]);
        self.put_gpr(rd, call);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{
        decode, AbiInfo, ArchCaps, DisCont, Endness, GuestArch, Helper, JumpKind,
    };
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn run(word: u32, caps: ArchCaps) -> (Block, crate::frontend::la64::DisResult) {
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
        (block, dres)
    }

    #[test]
    fn test_crc_w_w_w_helper() {
        // crc.w.w.w $r1, $r2, $r3
        let (block, dres) = run(0x00250c41, ArchCaps::empty());
        assert_eq!(dres.len, 4);
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert_eq!(call.1.arg(0).get_helper(), Helper::Crc);
        assert_eq!(call.1.arg(3).get_u64(), 32);
    }

    #[test]
    fn test_crcc_w_d_w_width() {
        // crcc.w.d.w $r1, $r2, $r3
        let (block, _) = run(0x00278c41, ArchCaps::empty());
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert_eq!(call.1.arg(0).get_helper(), Helper::Crcc);
        assert_eq!(call.1.arg(3).get_u64(), 64);
    }

    #[test]
    fn test_rdtime_d_returns_zero() {
        // rdtime.d $r1, $r2
        let (block, dres) = run(0x00006841, ArchCaps::empty());
        assert_eq!(dres.next, DisCont::Continue);
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .unwrap();
        assert_eq!(set.1.arg(1).get_u64(), 0);
    }

    #[test]
    fn test_cpucfg_gated() {
        // cpucfg $r1, $r2
        let (block, dres) = run(0x00006c41, ArchCaps::empty());
        assert_eq!(dres.stop, Some(JumpKind::SigIll));
        assert!(block.is_empty());

        let (block, dres) = run(0x00006c41, ArchCaps::CPUCFG);
        assert_eq!(dres.next, DisCont::Continue);
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert_eq!(call.1.arg(0).get_helper(), Helper::CpuCfg);
    }
}
