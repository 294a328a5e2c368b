//! Floating-point comparison emitters.
//!
//! A single 4-way compare yields a result group encoding UN=0x45, LT=0x01,
//! GT=0x00, EQ=0x40; each of the 22 LA64 conditions maps that group to a
//! Boolean stored in one of the eight FCC flags. The signaling (S) and
//! quiet (C) variants differ only in the FCSR-update helper's behavior;
//! the Boolean mapping is identical.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::{FReg, Fcc};
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{ArchCaps, FpOp};
use crate::ir::value::Value;

/// Which members of {UN, LT, GT, EQ} satisfy a condition.
#[derive(Debug, Clone, Copy)]
struct CondSet {
    un: bool,
    lt: bool,
    gt: bool,
    eq: bool,
}

impl<'a> Translator<'a> {
    fn is_un(&mut self, result: Value) -> Value {
        let c = self.ir.ir().imm32(0x45);
        self.ir.ir().cmp_eq_32(result, c)
    }

    fn is_lt(&mut self, result: Value) -> Value {
        let c = self.ir.ir().imm32(0x1);
        self.ir.ir().cmp_eq_32(result, c)
    }

    fn is_gt(&mut self, result: Value) -> Value {
        let c = self.ir.ir().imm32(0x0);
        self.ir.ir().cmp_eq_32(result, c)
    }

    fn is_eq(&mut self, result: Value) -> Value {
        let c = self.ir.ir().imm32(0x40);
        self.ir.ir().cmp_eq_32(result, c)
    }

    fn fcmp(&mut self, mnemonic: &str, op: FpOp, set: CondSet, size64: bool, insn: InsnWord) -> bool {
        let (cd, fj, fk) = (insn.cd(), insn.fj(), insn.fk());
        trace!("{} {}, {}, {}", mnemonic, Fcc::from_u32(cd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }

        let result = if size64 {
            let a = self.fpr64(fj);
            let b = self.fpr64(fk);
            self.ir.ir().fp_compare_64(a, b)
        } else {
            let a = self.fpr32(fj);
            let b = self.fpr32(fk);
            self.ir.ir().fp_compare_32(a, b)
        };

        let mut cond: Option<Value> = None;
        if set.un {
            let e = self.is_un(result);
            cond = Some(e);
        }
        if set.lt {
            let e = self.is_lt(result);
            cond = Some(match cond {
                Some(c) => self.ir.ir().or_1(c, e),
                None => e,
            });
        }
        if set.gt {
            let e = self.is_gt(result);
            cond = Some(match cond {
                Some(c) => self.ir.ir().or_1(c, e),
                None => e,
            });
        }
        if set.eq {
            let e = self.is_eq(result);
            cond = Some(match cond {
                Some(c) => self.ir.ir().or_1(c, e),
                None => e,
            });
        }
        // The "always false" conditions select no member at all.
        let cond = cond.unwrap_or_else(|| self.ir.ir().imm1(false));

        self.fcsr_update(op, &[fj, fk]);
        let byte = self.ir.ir().zero_extend_bit_to_byte(cond);
        self.ir.set_fcc(Fcc::from_u32(cd), byte);
        true
    }
}

const NONE: CondSet = CondSet { un: false, lt: false, gt: false, eq: false };
const LT: CondSet = CondSet { un: false, lt: true, gt: false, eq: false };
const EQ: CondSet = CondSet { un: false, lt: false, gt: false, eq: true };
const LE: CondSet = CondSet { un: false, lt: true, gt: false, eq: true };
const UN: CondSet = CondSet { un: true, lt: false, gt: false, eq: false };
const ULT: CondSet = CondSet { un: true, lt: true, gt: false, eq: false };
const UEQ: CondSet = CondSet { un: true, lt: false, gt: false, eq: true };
const ULE: CondSet = CondSet { un: true, lt: true, gt: false, eq: true };
const NE: CondSet = CondSet { un: false, lt: true, gt: true, eq: false };
const OR: CondSet = CondSet { un: false, lt: true, gt: true, eq: true };
const UNE: CondSet = CondSet { un: true, lt: true, gt: true, eq: false };

macro_rules! fcmp_insn {
    ($name:ident, $mnemonic:literal, $op:ident, $set:ident, $size64:literal) => {
        impl<'a> Translator<'a> {
            pub(crate) fn $name(&mut self, insn: InsnWord) -> bool {
                self.fcmp($mnemonic, FpOp::$op, $set, $size64, insn)
            }
        }
    };
}

fcmp_insn!(fcmp_caf_s, "fcmp.caf.s", FCmpCafS, NONE, false);
fcmp_insn!(fcmp_caf_d, "fcmp.caf.d", FCmpCafD, NONE, true);
fcmp_insn!(fcmp_saf_s, "fcmp.saf.s", FCmpSafS, NONE, false);
fcmp_insn!(fcmp_saf_d, "fcmp.saf.d", FCmpSafD, NONE, true);
fcmp_insn!(fcmp_clt_s, "fcmp.clt.s", FCmpCltS, LT, false);
fcmp_insn!(fcmp_clt_d, "fcmp.clt.d", FCmpCltD, LT, true);
fcmp_insn!(fcmp_slt_s, "fcmp.slt.s", FCmpSltS, LT, false);
fcmp_insn!(fcmp_slt_d, "fcmp.slt.d", FCmpSltD, LT, true);
fcmp_insn!(fcmp_ceq_s, "fcmp.ceq.s", FCmpCeqS, EQ, false);
fcmp_insn!(fcmp_ceq_d, "fcmp.ceq.d", FCmpCeqD, EQ, true);
fcmp_insn!(fcmp_seq_s, "fcmp.seq.s", FCmpSeqS, EQ, false);
fcmp_insn!(fcmp_seq_d, "fcmp.seq.d", FCmpSeqD, EQ, true);
fcmp_insn!(fcmp_cle_s, "fcmp.cle.s", FCmpCleS, LE, false);
fcmp_insn!(fcmp_cle_d, "fcmp.cle.d", FCmpCleD, LE, true);
fcmp_insn!(fcmp_sle_s, "fcmp.sle.s", FCmpSleS, LE, false);
fcmp_insn!(fcmp_sle_d, "fcmp.sle.d", FCmpSleD, LE, true);
fcmp_insn!(fcmp_cun_s, "fcmp.cun.s", FCmpCunS, UN, false);
fcmp_insn!(fcmp_cun_d, "fcmp.cun.d", FCmpCunD, UN, true);
fcmp_insn!(fcmp_sun_s, "fcmp.sun.s", FCmpSunS, UN, false);
fcmp_insn!(fcmp_sun_d, "fcmp.sun.d", FCmpSunD, UN, true);
fcmp_insn!(fcmp_cult_s, "fcmp.cult.s", FCmpCultS, ULT, false);
fcmp_insn!(fcmp_cult_d, "fcmp.cult.d", FCmpCultD, ULT, true);
fcmp_insn!(fcmp_sult_s, "fcmp.sult.s", FCmpSultS, ULT, false);
fcmp_insn!(fcmp_sult_d, "fcmp.sult.d", FCmpSultD, ULT, true);
fcmp_insn!(fcmp_cueq_s, "fcmp.cueq.s", FCmpCueqS, UEQ, false);
fcmp_insn!(fcmp_cueq_d, "fcmp.cueq.d", FCmpCueqD, UEQ, true);
fcmp_insn!(fcmp_sueq_s, "fcmp.sueq.s", FCmpSueqS, UEQ, false);
fcmp_insn!(fcmp_sueq_d, "fcmp.sueq.d", FCmpSueqD, UEQ, true);
fcmp_insn!(fcmp_cule_s, "fcmp.cule.s", FCmpCuleS, ULE, false);
fcmp_insn!(fcmp_cule_d, "fcmp.cule.d", FCmpCuleD, ULE, true);
fcmp_insn!(fcmp_sule_s, "fcmp.sule.s", FCmpSuleS, ULE, false);
fcmp_insn!(fcmp_sule_d, "fcmp.sule.d", FCmpSuleD, ULE, true);
fcmp_insn!(fcmp_cne_s, "fcmp.cne.s", FCmpCneS, NE, false);
fcmp_insn!(fcmp_cne_d, "fcmp.cne.d", FCmpCneD, NE, true);
fcmp_insn!(fcmp_sne_s, "fcmp.sne.s", FCmpSneS, NE, false);
fcmp_insn!(fcmp_sne_d, "fcmp.sne.d", FCmpSneD, NE, true);
fcmp_insn!(fcmp_cor_s, "fcmp.cor.s", FCmpCorS, OR, false);
fcmp_insn!(fcmp_cor_d, "fcmp.cor.d", FCmpCorD, OR, true);
fcmp_insn!(fcmp_sor_s, "fcmp.sor.s", FCmpSorS, OR, false);
fcmp_insn!(fcmp_sor_d, "fcmp.sor.d", FCmpSorD, OR, true);
fcmp_insn!(fcmp_cune_s, "fcmp.cune.s", FCmpCuneS, UNE, false);
fcmp_insn!(fcmp_cune_d, "fcmp.cune.d", FCmpCuneD, UNE, true);
fcmp_insn!(fcmp_sune_s, "fcmp.sune.s", FCmpSuneS, UNE, false);
fcmp_insn!(fcmp_sune_d, "fcmp.sune.d", FCmpSuneD, UNE, true);

impl<'a> Translator<'a> {
    pub(crate) fn dis_fcmp_s(&mut self, insn: InsnWord) -> bool {
        match insn.cond() {
            0x0 => self.fcmp_caf_s(insn),
            0x1 => self.fcmp_saf_s(insn),
            0x2 => self.fcmp_clt_s(insn),
            0x3 => self.fcmp_slt_s(insn),
            0x4 => self.fcmp_ceq_s(insn),
            0x5 => self.fcmp_seq_s(insn),
            0x6 => self.fcmp_cle_s(insn),
            0x7 => self.fcmp_sle_s(insn),
            0x8 => self.fcmp_cun_s(insn),
            0x9 => self.fcmp_sun_s(insn),
            0xa => self.fcmp_cult_s(insn),
            0xb => self.fcmp_sult_s(insn),
            0xc => self.fcmp_cueq_s(insn),
            0xd => self.fcmp_sueq_s(insn),
            0xe => self.fcmp_cule_s(insn),
            0xf => self.fcmp_sule_s(insn),
            0x10 => self.fcmp_cne_s(insn),
            0x11 => self.fcmp_sne_s(insn),
            0x14 => self.fcmp_cor_s(insn),
            0x15 => self.fcmp_sor_s(insn),
            0x18 => self.fcmp_cune_s(insn),
            0x19 => self.fcmp_sune_s(insn),
            _ => false,
        }
    }

    pub(crate) fn dis_fcmp_d(&mut self, insn: InsnWord) -> bool {
        match insn.cond() {
            0x0 => self.fcmp_caf_d(insn),
            0x1 => self.fcmp_saf_d(insn),
            0x2 => self.fcmp_clt_d(insn),
            0x3 => self.fcmp_slt_d(insn),
            0x4 => self.fcmp_ceq_d(insn),
            0x5 => self.fcmp_seq_d(insn),
            0x6 => self.fcmp_cle_d(insn),
            0x7 => self.fcmp_sle_d(insn),
            0x8 => self.fcmp_cun_d(insn),
            0x9 => self.fcmp_sun_d(insn),
            0xa => self.fcmp_cult_d(insn),
            0xb => self.fcmp_sult_d(insn),
            0xc => self.fcmp_cueq_d(insn),
            0xd => self.fcmp_sueq_d(insn),
            0xe => self.fcmp_cule_d(insn),
            0xf => self.fcmp_sule_d(insn),
            0x10 => self.fcmp_cne_d(insn),
            0x11 => self.fcmp_sne_d(insn),
            0x14 => self.fcmp_cor_d(insn),
            0x15 => self.fcmp_sor_d(insn),
            0x18 => self.fcmp_cune_d(insn),
            0x19 => self.fcmp_sune_d(insn),
            _ => false,
        }
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
            ArchCaps::FP,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    fn fcmp_s_word(cond: u32) -> u32 {
        // fcmp.<cond>.s $fcc0, $fa1, $fa2
        0x0c100000 | (cond << 15) | (2 << 10) | (1 << 5)
    }

    #[test]
    fn test_fcmp_ceq_checks_eq_group() {
        let block = block_for(fcmp_s_word(0x4));
        let eq_consts: Vec<u32> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::CmpEq32)
            .map(|(_, i)| i.arg(1).get_u32())
            .collect();
        assert_eq!(eq_consts, vec![0x40]);
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::SetFcc));
    }

    #[test]
    fn test_fcmp_cule_ors_three_members() {
        let block = block_for(fcmp_s_word(0xe));
        let eq_consts: Vec<u32> = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::CmpEq32)
            .map(|(_, i)| i.arg(1).get_u32())
            .collect();
        assert_eq!(eq_consts, vec![0x45, 0x1, 0x40]);
        let ors = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Or1)
            .count();
        assert_eq!(ors, 2);
    }

    #[test]
    fn test_fcmp_caf_is_constant_false() {
        let block = block_for(fcmp_s_word(0x0));
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::ZeroExtendBitToByte)
            .unwrap();
        assert_eq!(set.1.arg(0), Value::ImmU1(false));
    }

    #[test]
    fn test_fcmp_d_uses_double_compare() {
        // fcmp.clt.d $fcc0, $fa1, $fa2
        let word = 0x0c200000 | (0x2 << 15) | (2 << 10) | (1 << 5);
        let block = block_for(word);
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::FPCompare64));
    }

    #[test]
    fn test_fcmp_signaling_same_shape_as_quiet() {
        let quiet = block_for(fcmp_s_word(0x2)).opcodes();
        let signaling = block_for(fcmp_s_word(0x3)).opcodes();
        assert_eq!(quiet, signaling);
    }
}
