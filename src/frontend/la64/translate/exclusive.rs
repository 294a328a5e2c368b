//! Load-linked / store-conditional emitters.
//!
//! Two implementation modes, selected by the ABI record: direct mode uses
//! the IR's native LLSC statements; fallback mode synthesizes the pair on
//! top of CAS and three guest shadow fields (transaction size, address and
//! loaded data). Alignment is checked in both modes regardless of
//! unaligned-access support.

use log::trace;

use crate::frontend::la64::insn::{sext32, InsnWord};
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::GuestField;

impl<'a> Translator<'a> {
    /// Fallback ll: record size/address/data in the shadow fields, then
    /// write the loaded value to the destination.
    fn ll_fallback(&mut self, insn: InsnWord, size64: bool) -> bool {
        let rd = insn.rd();
        let addr = self.addr_si14(insn);
        self.ir
            .sigbus_if_misaligned(addr, if size64 { 0x7 } else { 0x3 });

        let res = if size64 {
            self.ir.ir().read_memory_64(addr)
        } else {
            let w = self.ir.ir().read_memory_32(addr);
            self.ir.ir().sign_extend_word_to_long(w)
        };

        let size = self.ir.ir().imm64(if size64 { 8 } else { 4 });
        self.ir.set_field(GuestField::LlscSize, size);
        self.ir.set_field(GuestField::LlscAddr, addr);
        self.ir.set_field(GuestField::LlscData, res);

        self.put_gpr(rd, res);
        true
    }

    /// Fallback sc: mark the result failed, clear the reservation so any
    /// re-entry finds none, then exit to the fall-through on size mismatch,
    /// address mismatch, changed memory, or CAS failure. Only when every
    /// check passes is the result rewritten to success.
    fn sc_fallback(&mut self, insn: InsnWord, size64: bool) -> bool {
        let rd = insn.rd();
        let addr = self.addr_si14(insn);
        self.ir
            .sigbus_if_misaligned(addr, if size64 { 0x7 } else { 0x3 });

        let new = if size64 {
            self.gpr64(rd)
        } else {
            self.gpr32(rd)
        };

        let zero = self.ir.ir().imm64(0);
        self.put_gpr(rd, zero);

        let size = self.ir.get_field(GuestField::LlscSize);
        let none = self.ir.ir().imm64(0);
        self.ir.set_field(GuestField::LlscSize, none);

        let want = self.ir.ir().imm64(if size64 { 8 } else { 4 });
        let size_bad = self.ir.ir().cmp_ne_64(size, want);
        self.ir.exit_boring(size_bad, 4);

        let ll_addr = self.ir.get_field(GuestField::LlscAddr);
        let addr_bad = self.ir.ir().cmp_ne_64(addr, ll_addr);
        self.ir.exit_boring(addr_bad, 4);

        let data = self.ir.get_field(GuestField::LlscData);
        let cas_bad = if size64 {
            let cur = self.ir.ir().read_memory_64(addr);
            let data_bad = self.ir.ir().cmp_ne_64(cur, data);
            self.ir.exit_boring(data_bad, 4);
            let old = self.ir.ir().compare_and_swap_64(addr, data, new);
            self.ir.ir().cmp_ne_64(old, data)
        } else {
            let expd = self.ir.ir().least_significant_word(data);
            let cur = self.ir.ir().read_memory_32(addr);
            let cur_wide = self.ir.ir().sign_extend_word_to_long(cur);
            let data_bad = self.ir.ir().cmp_ne_64(cur_wide, data);
            self.ir.exit_boring(data_bad, 4);
            let old = self.ir.ir().compare_and_swap_32(addr, expd, new);
            self.ir.ir().cmp_ne_32(old, expd)
        };
        self.ir.exit_boring(cas_bad, 4);

        let one = self.ir.ir().imm64(1);
        self.put_gpr(rd, one);
        true
    }

    pub(crate) fn ll_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!(
            "ll.w {}, {}, {}{}",
            IReg::from_u32(rd),
            IReg::from_u32(rj),
            sext32(si14, 14) as i32,
            if self.abi.use_fallback_llsc { " (fallback implementation)" } else { "" }
        );

        if self.abi.use_fallback_llsc {
            return self.ll_fallback(insn, false);
        }
        let addr = self.addr_si14(insn);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        let res = self.ir.ir().load_linked_32(addr);
        let wide = self.ir.ir().sign_extend_word_to_long(res);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn sc_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!(
            "sc.w {}, {}, {}{}",
            IReg::from_u32(rd),
            IReg::from_u32(rj),
            sext32(si14, 14) as i32,
            if self.abi.use_fallback_llsc { " (fallback implementation)" } else { "" }
        );

        if self.abi.use_fallback_llsc {
            return self.sc_fallback(insn, false);
        }
        let addr = self.addr_si14(insn);
        self.ir.sigbus_if_misaligned(addr, 0x3);
        // The native statement carries the success flag in its result temp.
        let val = self.gpr32(rd);
        let _success = self.ir.ir().store_conditional_32(addr, val);
        true
    }

    pub(crate) fn ll_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!(
            "ll.d {}, {}, {}{}",
            IReg::from_u32(rd),
            IReg::from_u32(rj),
            sext32(si14, 14) as i32,
            if self.abi.use_fallback_llsc { " (fallback implementation)" } else { "" }
        );

        if self.abi.use_fallback_llsc {
            return self.ll_fallback(insn, true);
        }
        let addr = self.addr_si14(insn);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let res = self.ir.ir().load_linked_64(addr);
        self.put_gpr(rd, res);
        true
    }

    pub(crate) fn sc_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si14) = (insn.rd(), insn.rj(), insn.si14());
        trace!(
            "sc.d {}, {}, {}{}",
            IReg::from_u32(rd),
            IReg::from_u32(rj),
            sext32(si14, 14) as i32,
            if self.abi.use_fallback_llsc { " (fallback implementation)" } else { "" }
        );

        if self.abi.use_fallback_llsc {
            return self.sc_fallback(insn, true);
        }
        let addr = self.addr_si14(insn);
        self.ir.sigbus_if_misaligned(addr, 0x7);
        let val = self.gpr64(rd);
        let _success = self.ir.ir().store_conditional_64(addr, val);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{
        decode, AbiInfo, ArchCaps, Endness, GuestArch, GuestField, JumpKind,
    };
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn block_for(word: u32, abi: AbiInfo, caps: ArchCaps) -> Block {
        let mut block = Block::new(0x1000);
        let bytes = word.to_le_bytes();
        let dres = decode(
            &mut block,
            &bytes,
            0,
            0x1000,
            GuestArch::LoongArch64,
            caps,
            abi,
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    const LL_W: u32 = 0x20000441; // ll.w $r1, $r2, 4
    const SC_W: u32 = 0x21000441; // sc.w $r1, $r2, 4
    const LL_D: u32 = 0x22000441; // ll.d $r1, $r2, 4
    const SC_D: u32 = 0x23000441; // sc.d $r1, $r2, 4

    fn fallback() -> AbiInfo {
        AbiInfo {
            use_fallback_llsc: true,
        }
    }

    #[test]
    fn test_ll_w_direct_mode() {
        let ops = block_for(LL_W, AbiInfo::default(), ArchCaps::empty()).opcodes();
        assert!(ops.contains(&Opcode::LoadLinked32));
        assert!(!ops.contains(&Opcode::SetField));
    }

    #[test]
    fn test_sc_d_direct_mode() {
        let ops = block_for(SC_D, AbiInfo::default(), ArchCaps::empty()).opcodes();
        assert!(ops.contains(&Opcode::StoreConditional64));
    }

    #[test]
    fn test_ll_alignment_check_survives_ual() {
        let ops = block_for(LL_D, AbiInfo::default(), ArchCaps::UAL).opcodes();
        assert!(ops.contains(&Opcode::Exit));
    }

    #[test]
    fn test_ll_w_fallback_records_shadow_state() {
        let block = block_for(LL_W, fallback(), ArchCaps::empty());
        let fields: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::SetField)
            .map(|(_, i)| i.arg(0).get_field())
            .collect();
        assert_eq!(
            fields,
            vec![
                GuestField::LlscSize,
                GuestField::LlscAddr,
                GuestField::LlscData,
            ]
        );
        // Transaction size is 4 bytes.
        let set_size = block
            .iter()
            .find(|(_, i)| {
                i.opcode == Opcode::SetField && i.arg(0).get_field() == GuestField::LlscSize
            })
            .unwrap();
        assert_eq!(set_size.1.arg(1).get_u64(), 4);
    }

    #[test]
    fn test_sc_w_fallback_protocol() {
        let block = block_for(SC_W, fallback(), ArchCaps::empty());
        let ops = block.opcodes();

        // The reservation is cleared exactly once.
        let clears = block
            .iter()
            .filter(|(_, i)| {
                i.opcode == Opcode::SetField && i.arg(0).get_field() == GuestField::LlscSize
            })
            .count();
        assert_eq!(clears, 1);

        // Four fall-through failure exits (size, address, data, CAS) plus
        // the alignment trap.
        let boring_exits = block
            .iter()
            .filter(|(_, i)| {
                i.opcode == Opcode::Exit && i.arg(2).get_jump_kind() == JumpKind::Boring
            })
            .count();
        assert_eq!(boring_exits, 4);
        assert!(ops.contains(&Opcode::CompareAndSwap32));

        // Failure write precedes the CAS; success write follows it.
        let cas = ops.iter().position(|o| *o == Opcode::CompareAndSwap32).unwrap();
        let sets: Vec<_> = ops
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Opcode::SetGpr)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(sets.len(), 2);
        assert!(sets[0] < cas && cas < sets[1]);
    }

    #[test]
    fn test_sc_d_fallback_uses_64bit_cas() {
        let ops = block_for(SC_D, fallback(), ArchCaps::empty()).opcodes();
        assert!(ops.contains(&Opcode::CompareAndSwap64));
        assert!(ops.contains(&Opcode::ReadMemory64));
    }
}
