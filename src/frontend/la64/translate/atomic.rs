//! Atomic read-modify-write emitters (the am* family).
//!
//! Each form loads the current value, applies its reducer, and installs the
//! result with a CAS. A CAS mismatch exits back to the same PC so the
//! dispatcher re-runs the instruction; the pre-image lands in the
//! destination register. The _db forms bracket the sequence with memory
//! fences. Alignment is checked regardless of unaligned-access support.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::ArchCaps;
use crate::ir::value::Value;

/// Reducer applied between the loaded pre-image and the source operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AmOp {
    Swap,
    Add,
    And,
    Or,
    Xor,
    Max,
    Min,
    MaxU,
    MinU,
}

impl<'a> Translator<'a> {
    fn am_w(&mut self, op: AmOp, fence: bool, rd: u32, rj: u32, rk: u32) -> bool {
        if fence {
            self.ir.ir().memory_fence();
        }

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x3);

        let old = self.ir.ir().read_memory_32(addr);
        let src = self.gpr32(rk);
        let new = self.am_reduce_32(op, old, src);

        let got = self.ir.ir().compare_and_swap_32(addr, old, new);
        let missed = self.ir.ir().cmp_ne_32(got, old);
        self.ir.exit_boring(missed, 0); // retry the whole instruction
        self.put_gpr_sx32(rd, old);

        if fence {
            self.ir.ir().memory_fence();
        }
        true
    }

    fn am_d(&mut self, op: AmOp, fence: bool, rd: u32, rj: u32, rk: u32) -> bool {
        if fence {
            self.ir.ir().memory_fence();
        }

        let addr = self.gpr64(rj);
        self.ir.sigbus_if_misaligned(addr, 0x7);

        let old = self.ir.ir().read_memory_64(addr);
        let src = self.gpr64(rk);
        let new = self.am_reduce_64(op, old, src);

        let got = self.ir.ir().compare_and_swap_64(addr, old, new);
        let missed = self.ir.ir().cmp_ne_64(got, old);
        self.ir.exit_boring(missed, 0);
        self.put_gpr(rd, old);

        if fence {
            self.ir.ir().memory_fence();
        }
        true
    }

    fn am_reduce_32(&mut self, op: AmOp, old: Value, src: Value) -> Value {
        match op {
            AmOp::Swap => src,
            AmOp::Add => self.ir.ir().add_32(old, src),
            AmOp::And => self.ir.ir().and_32(old, src),
            AmOp::Or => self.ir.ir().or_32(old, src),
            AmOp::Xor => self.ir.ir().xor_32(old, src),
            AmOp::Max => {
                let lt = self.ir.ir().cmp_lt_32s(src, old);
                self.ir.ir().select_32(lt, old, src)
            }
            AmOp::Min => {
                let lt = self.ir.ir().cmp_lt_32s(old, src);
                self.ir.ir().select_32(lt, old, src)
            }
            AmOp::MaxU => {
                let lt = self.ir.ir().cmp_lt_32u(src, old);
                self.ir.ir().select_32(lt, old, src)
            }
            AmOp::MinU => {
                let lt = self.ir.ir().cmp_lt_32u(old, src);
                self.ir.ir().select_32(lt, old, src)
            }
        }
    }

    fn am_reduce_64(&mut self, op: AmOp, old: Value, src: Value) -> Value {
        match op {
            AmOp::Swap => src,
            AmOp::Add => self.ir.ir().add_64(old, src),
            AmOp::And => self.ir.ir().and_64(old, src),
            AmOp::Or => self.ir.ir().or_64(old, src),
            AmOp::Xor => self.ir.ir().xor_64(old, src),
            AmOp::Max => {
                let lt = self.ir.ir().cmp_lt_64s(src, old);
                self.ir.ir().select_64(lt, old, src)
            }
            AmOp::Min => {
                let lt = self.ir.ir().cmp_lt_64s(old, src);
                self.ir.ir().select_64(lt, old, src)
            }
            AmOp::MaxU => {
                let lt = self.ir.ir().cmp_lt_64u(src, old);
                self.ir.ir().select_64(lt, old, src)
            }
            AmOp::MinU => {
                let lt = self.ir.ir().cmp_lt_64u(old, src);
                self.ir.ir().select_64(lt, old, src)
            }
        }
    }

    fn am_insn(
        &mut self,
        insn: InsnWord,
        mnemonic: &str,
        op: AmOp,
        fence: bool,
        size64: bool,
    ) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("{} {}, {}, {}", mnemonic, IReg::from_u32(rd), IReg::from_u32(rk), IReg::from_u32(rj));

        if self.missing_cap(ArchCaps::LAM) {
            return true;
        }
        if size64 {
            self.am_d(op, fence, rd, rj, rk)
        } else {
            self.am_w(op, fence, rd, rj, rk)
        }
    }

    pub(crate) fn amswap_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amswap.w", AmOp::Swap, false, false)
    }

    pub(crate) fn amswap_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amswap.d", AmOp::Swap, false, true)
    }

    pub(crate) fn amadd_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amadd.w", AmOp::Add, false, false)
    }

    pub(crate) fn amadd_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amadd.d", AmOp::Add, false, true)
    }

    pub(crate) fn amand_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amand.w", AmOp::And, false, false)
    }

    pub(crate) fn amand_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amand.d", AmOp::And, false, true)
    }

    pub(crate) fn amor_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amor.w", AmOp::Or, false, false)
    }

    pub(crate) fn amor_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amor.d", AmOp::Or, false, true)
    }

    pub(crate) fn amxor_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amxor.w", AmOp::Xor, false, false)
    }

    pub(crate) fn amxor_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amxor.d", AmOp::Xor, false, true)
    }

    pub(crate) fn ammax_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax.w", AmOp::Max, false, false)
    }

    pub(crate) fn ammax_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax.d", AmOp::Max, false, true)
    }

    pub(crate) fn ammin_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin.w", AmOp::Min, false, false)
    }

    pub(crate) fn ammin_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin.d", AmOp::Min, false, true)
    }

    pub(crate) fn ammax_wu(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax.wu", AmOp::MaxU, false, false)
    }

    pub(crate) fn ammax_du(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax.du", AmOp::MaxU, false, true)
    }

    pub(crate) fn ammin_wu(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin.wu", AmOp::MinU, false, false)
    }

    pub(crate) fn ammin_du(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin.du", AmOp::MinU, false, true)
    }

    pub(crate) fn amswap_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amswap_db.w", AmOp::Swap, true, false)
    }

    pub(crate) fn amswap_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amswap_db.d", AmOp::Swap, true, true)
    }

    pub(crate) fn amadd_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amadd_db.w", AmOp::Add, true, false)
    }

    pub(crate) fn amadd_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amadd_db.d", AmOp::Add, true, true)
    }

    pub(crate) fn amand_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amand_db.w", AmOp::And, true, false)
    }

    pub(crate) fn amand_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amand_db.d", AmOp::And, true, true)
    }

    pub(crate) fn amor_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amor_db.w", AmOp::Or, true, false)
    }

    pub(crate) fn amor_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amor_db.d", AmOp::Or, true, true)
    }

    pub(crate) fn amxor_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amxor_db.w", AmOp::Xor, true, false)
    }

    pub(crate) fn amxor_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "amxor_db.d", AmOp::Xor, true, true)
    }

    pub(crate) fn ammax_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax_db.w", AmOp::Max, true, false)
    }

    pub(crate) fn ammax_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax_db.d", AmOp::Max, true, true)
    }

    pub(crate) fn ammin_db_w(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin_db.w", AmOp::Min, true, false)
    }

    pub(crate) fn ammin_db_d(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin_db.d", AmOp::Min, true, true)
    }

    pub(crate) fn ammax_db_wu(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax_db.wu", AmOp::MaxU, true, false)
    }

    pub(crate) fn ammax_db_du(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammax_db.du", AmOp::MaxU, true, true)
    }

    pub(crate) fn ammin_db_wu(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin_db.wu", AmOp::MinU, true, false)
    }

    pub(crate) fn ammin_db_du(&mut self, insn: InsnWord) -> bool {
        self.am_insn(insn, "ammin_db.du", AmOp::MinU, true, true)
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch, JumpKind};
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
            ArchCaps::LAM,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    const AMADD_W: u32 = 0x38610c41; // amadd.w $r1, $r3, $r2
    const AMADD_DB_W: u32 = 0x386a0c41; // amadd_db.w $r1, $r3, $r2
    const AMMAX_D: u32 = 0x38658c41; // ammax.d $r1, $r3, $r2
    const AMMIN_WU: u32 = 0x38680c41; // ammin.wu $r1, $r3, $r2

    #[test]
    fn test_amadd_w_shape() {
        let block = block_for(AMADD_W);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::Add32));
        assert!(ops.contains(&Opcode::CompareAndSwap32));
        // No fences in the plain form.
        assert!(!ops.contains(&Opcode::MemoryFence));
        // Alignment exit first, then the retry exit to the same PC.
        let exits: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Exit)
            .collect();
        assert_eq!(exits.len(), 2);
        assert_eq!(exits[0].1.arg(2).get_jump_kind(), JumpKind::SigBus);
        assert_eq!(exits[1].1.arg(2).get_jump_kind(), JumpKind::Boring);
        assert_eq!(exits[1].1.arg(1).get_u64(), 0x1000);
    }

    #[test]
    fn test_amadd_db_w_fences() {
        let ops = block_for(AMADD_DB_W).opcodes();
        let fences = ops.iter().filter(|o| **o == Opcode::MemoryFence).count();
        assert_eq!(fences, 2);
        assert_eq!(ops.first(), Some(&Opcode::MemoryFence));
        assert_eq!(ops.last(), Some(&Opcode::SetPc));
        // Trailing fence comes after the destination write.
        let set = ops.iter().position(|o| *o == Opcode::SetGpr).unwrap();
        let last_fence = ops.iter().rposition(|o| *o == Opcode::MemoryFence).unwrap();
        assert!(set < last_fence);
    }

    #[test]
    fn test_ammax_d_signed_select() {
        let ops = block_for(AMMAX_D).opcodes();
        assert!(ops.contains(&Opcode::CmpLt64S));
        assert!(ops.contains(&Opcode::Select64));
        assert!(ops.contains(&Opcode::CompareAndSwap64));
    }

    #[test]
    fn test_ammin_wu_unsigned_select() {
        let ops = block_for(AMMIN_WU).opcodes();
        assert!(ops.contains(&Opcode::CmpLt32U));
        assert!(ops.contains(&Opcode::Select32));
    }

    #[test]
    fn test_am_writes_preimage_sign_extended() {
        let block = block_for(AMADD_W);
        // The destination receives the sign-extended pre-image, not the sum.
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .unwrap();
        let src = set.1.arg(1).inst_ref();
        assert_eq!(block.get(src).opcode, Opcode::SignExtendWordToLong);
        let inner = block.get(src).arg(0).inst_ref();
        assert_eq!(block.get(inner).opcode, Opcode::ReadMemory32);
    }
}
