//! Recognition of the instrumentation preamble.
//!
//! Four specific no-op shifts flag a 16-byte preamble that never occurs in
//! natural code:
//!
//!   00450c00  srli.d $zero, $zero, 3
//!   00453400  srli.d $zero, $zero, 13
//!   00457400  srli.d $zero, $zero, 29
//!   00454c00  srli.d $zero, $zero, 19
//!
//! One of four marker no-op `or` instructions follows and selects the
//! hosting framework's action. Anything else after the preamble is a
//! decode bug, not guest code.

use log::trace;

use crate::frontend::la64::insn::fetch_word;
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{DisCont, GuestField, JumpKind};

const PREAMBLE: [u32; 4] = [0x00450c00, 0x00453400, 0x00457400, 0x00454c00];

impl<'a> Translator<'a> {
    /// Spot the preamble and translate the marker. Returns false when the
    /// bytes are ordinary code.
    pub(crate) fn dis_special(&mut self, code: &[u8]) -> bool {
        if code.len() < 20 {
            return false;
        }
        for (i, expect) in PREAMBLE.iter().enumerate() {
            if fetch_word(&code[i * 4..]) != *expect {
                return false;
            }
        }

        match fetch_word(&code[16..]) {
            // or $t1, $t1, $t1
            0x001535ad => {
                trace!("$a7 = client_request ( $t0 )");
                let after = self.ir.pc.wrapping_add(20);
                let next = self.ir.ir().imm64(after);
                self.ir.set_pc(next);
                self.dres.len = 20;
                self.dres.next = DisCont::StopHere;
                self.dres.stop = Some(JumpKind::ClientReq);
                true
            }
            // or $t2, $t2, $t2
            0x001539ce => {
                trace!("$a7 = guest_NRADDR");
                let nraddr = self.ir.get_field(GuestField::Nraddr);
                self.ir.set_gpr(IReg::R11, nraddr);
                self.dres.len = 20;
                true
            }
            // or $t3, $t3, $t3
            0x00153def => {
                trace!("branch-and-link-to-noredir $t8");
                let after = self.ir.pc.wrapping_add(20);
                let link = self.ir.ir().imm64(after);
                self.ir.set_gpr(IReg::RA, link);
                let target = self.ir.get_gpr64(IReg::R20);
                self.ir.set_pc(target);
                self.dres.len = 20;
                self.dres.next = DisCont::StopHere;
                self.dres.stop = Some(JumpKind::NoRedir);
                true
            }
            // or $t4, $t4, $t4
            0x00154210 => {
                trace!("IR injection");
                self.ir.ir().inject_ir();
                // The injected operation can change between runs, so the
                // translation of these 20 bytes is flushed every time.
                let here = self.ir.pc;
                let start = self.ir.ir().imm64(here);
                self.ir.set_field(GuestField::CmStart, start);
                let len = self.ir.ir().imm64(20);
                self.ir.set_field(GuestField::CmLen, len);
                let next = self.ir.ir().imm64(here.wrapping_add(20));
                self.ir.set_pc(next);
                self.dres.len = 20;
                self.dres.next = DisCont::StopHere;
                self.dres.stop = Some(JumpKind::InvalICache);
                true
            }
            word => panic!(
                "instrumentation preamble followed by unrecognized word {:#010x}",
                word
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{
        decode, AbiInfo, ArchCaps, DisCont, Endness, GuestArch, GuestField, JumpKind,
    };
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn run(words: &[u32]) -> (Block, crate::frontend::la64::DisResult) {
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        let mut block = Block::new(0x20000);
        let dres = decode(
            &mut block,
            &bytes,
            0,
            0x20000,
            GuestArch::LoongArch64,
            ArchCaps::empty(),
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        (block, dres)
    }

    fn with_marker(marker: u32) -> [u32; 5] {
        [0x00450c00, 0x00453400, 0x00457400, 0x00454c00, marker]
    }

    #[test]
    fn test_preamble_head_alone_is_ordinary_code() {
        // The first preamble word on its own is srli.d $zero, $zero, 3 and
        // decodes as an ordinary 4-byte instruction.
        let (_, dres) = run(&[0x00450c00]);
        assert_eq!(dres.len, 4);
        assert_eq!(dres.next, DisCont::Continue);
    }

    #[test]
    fn test_noredir_marker() {
        let (block, dres) = run(&with_marker(0x00153def));
        assert_eq!(dres.len, 20);
        assert_eq!(dres.stop, Some(JumpKind::NoRedir));
        // Link in $ra, then jump to $t8.
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .unwrap();
        assert_eq!(set.1.arg(1).get_u64(), 0x20014);
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
    }

    #[test]
    fn test_inject_ir_marker_invalidates_cache() {
        let (block, dres) = run(&with_marker(0x00154210));
        assert_eq!(dres.len, 20);
        assert_eq!(dres.stop, Some(JumpKind::InvalICache));
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::InjectIr));
        let fields: Vec<_> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::SetField)
            .map(|(_, i)| (i.arg(0).get_field(), i.arg(1).get_u64()))
            .collect();
        assert_eq!(
            fields,
            vec![(GuestField::CmStart, 0x20000), (GuestField::CmLen, 20)]
        );
    }

    #[test]
    #[should_panic]
    fn test_unknown_marker_is_fatal() {
        // A preamble followed by anything unrecognized can only be a
        // decoder bug.
        let _ = run(&with_marker(0x00150000));
    }
}
