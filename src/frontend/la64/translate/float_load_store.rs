//! Floating-point load/store emitters, mirroring the integer families:
//! immediate-displaced, register-indexed and bounds-checked forms.

use log::trace;

use crate::frontend::la64::insn::{sext32, InsnWord};
use crate::frontend::la64::regs::{FReg, IReg};
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::ArchCaps;

impl<'a> Translator<'a> {
    pub(crate) fn fld_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, si12) = (insn.fd(), insn.rj(), insn.si12());
        trace!("fld.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        self.put_fpr32(fd, val);
        true
    }

    pub(crate) fn fst_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, si12) = (insn.fd(), insn.rj(), insn.si12());
        trace!("fst.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x3);
        let val = self.fpr32(fd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn fld_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, si12) = (insn.fd(), insn.rj(), insn.si12());
        trace!("fld.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x7);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_fpr64(fd, val);
        true
    }

    pub(crate) fn fst_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, si12) = (insn.fd(), insn.rj(), insn.si12());
        trace!("fst.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_si12(insn);
        self.check_align(addr, 0x7);
        let val = self.fpr64(fd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn fldx_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldx.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x3);
        let val = self.ir.ir().read_memory_32(addr);
        self.put_fpr32(fd, val);
        true
    }

    pub(crate) fn fldx_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldx.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x7);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_fpr64(fd, val);
        true
    }

    pub(crate) fn fstx_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstx.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x3);
        let val = self.fpr32(fd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn fstx_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstx.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.addr_reg(insn);
        self.check_align(addr, 0x7);
        let val = self.fpr64(fd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    // Bounds-checked forms. The alignment check applies regardless of
    // unaligned-access support, as for the integer family.

    pub(crate) fn fldgt_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldgt.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_le_64u(addr, bound);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_32(addr);
        self.put_fpr32(fd, val);
        true
    }

    pub(crate) fn fldgt_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldgt.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_le_64u(addr, bound);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_fpr64(fd, val);
        true
    }

    pub(crate) fn fldle_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldle.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_lt_64u(bound, addr);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_32(addr);
        self.put_fpr32(fd, val);
        true
    }

    pub(crate) fn fldle_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fldle.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_lt_64u(bound, addr);
        self.ir.exit_sigsys(fail);
        let val = self.ir.ir().read_memory_64(addr);
        self.put_fpr64(fd, val);
        true
    }

    pub(crate) fn fstgt_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstgt.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_le_64u(addr, bound);
        self.ir.exit_sigsys(fail);
        let val = self.fpr32(fd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn fstgt_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstgt.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_le_64u(addr, bound);
        self.ir.exit_sigsys(fail);
        let val = self.fpr64(fd);
        self.ir.ir().write_memory_64(addr, val);
        true
    }

    pub(crate) fn fstle_s(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstle.s {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_lt_64u(bound, addr);
        self.ir.exit_sigsys(fail);
        let val = self.fpr32(fd);
        self.ir.ir().write_memory_32(addr, val);
        true
    }

    pub(crate) fn fstle_d(&mut self, insn: InsnWord) -> bool {
        let (fd, rj, rk) = (insn.fd(), insn.rj(), insn.rk());
        trace!("fstle.d {}, {}, {}", FReg::from_u32(fd), IReg::from_u32(rj), IReg::from_u32(rk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let bound = self.gpr64(rk);
        let fail = self.ir.ir().cmp_lt_64u(bound, addr);
        self.ir.exit_sigsys(fail);
        let val = self.fpr64(fd);
        self.ir.ir().write_memory_64(addr, val);
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
    fn test_fld_s_loads_low_word() {
        // fld.s $fa0, $r1, 0
        let ops = block_for(0x2b000020, ArchCaps::FP | ArchCaps::UAL).opcodes();
        assert_eq!(
            ops,
            vec![
                Opcode::GetGpr64,
                Opcode::Add64,
                Opcode::ReadMemory32,
                Opcode::SetFpr32,
                Opcode::SetPc,
            ]
        );
    }

    #[test]
    fn test_fst_d_requires_fp() {
        // fst.d $fa0, $r1, 0
        let mut block = Block::new(0x1000);
        let bytes = 0x2bc00020u32.to_le_bytes();
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
        assert_eq!(dres.stop, Some(JumpKind::SigIll));
        assert!(block.is_empty());
    }

    #[test]
    fn test_fldgt_d_checks_survive_ual() {
        // fldgt.d $fa0, $r1, $r2
        let block = block_for(0x38748820, ArchCaps::FP | ArchCaps::UAL);
        let kinds: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Exit)
            .map(|(_, i)| i.arg(2).get_jump_kind())
            .collect();
        assert_eq!(kinds, vec![JumpKind::SigBus, JumpKind::SigSys]);
    }

    #[test]
    fn test_fstx_s_register_indexed() {
        // fstx.s $fa0, $r1, $r2
        let ops = block_for(0x38380820, ArchCaps::FP | ArchCaps::UAL).opcodes();
        assert!(ops.contains(&Opcode::WriteMemory32));
        assert!(ops.contains(&Opcode::LeastSignificantWord));
    }
}
