//! Fixed-point arithmetic and logical emitters.

use log::trace;

use crate::frontend::la64::insn::{sext32, sext64, InsnWord};
use crate::frontend::la64::regs::IReg;
use crate::frontend::la64::translate::Translator;

impl<'a> Translator<'a> {
    pub(crate) fn add_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("add.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let add = self.ir.ir().add_32(a, b);
        self.put_gpr_sx32(rd, add);
        true
    }

    pub(crate) fn add_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("add.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let add = self.ir.ir().add_64(a, b);
        self.put_gpr(rd, add);
        true
    }

    pub(crate) fn sub_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sub.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let sub = self.ir.ir().sub_32(a, b);
        self.put_gpr_sx32(rd, sub);
        true
    }

    pub(crate) fn sub_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sub.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let sub = self.ir.ir().sub_64(a, b);
        self.put_gpr(rd, sub);
        true
    }

    pub(crate) fn slt(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("slt {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let cond = self.ir.ir().cmp_lt_64s(a, b);
        let wide = self.ir.ir().zero_extend_bit_to_long(cond);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn sltu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("sltu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let cond = self.ir.ir().cmp_lt_64u(a, b);
        let wide = self.ir.ir().zero_extend_bit_to_long(cond);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn slti(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("slti {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(sext64(si12 as u64, 12));
        let cond = self.ir.ir().cmp_lt_64s(a, imm);
        let wide = self.ir.ir().zero_extend_bit_to_long(cond);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn sltui(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("sltui {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(sext64(si12 as u64, 12));
        let cond = self.ir.ir().cmp_lt_64u(a, imm);
        let wide = self.ir.ir().zero_extend_bit_to_long(cond);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn nor(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("nor {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let or = self.ir.ir().or_64(a, b);
        let not = self.ir.ir().not_64(or);
        self.put_gpr(rd, not);
        true
    }

    pub(crate) fn and(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("and {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let and = self.ir.ir().and_64(a, b);
        self.put_gpr(rd, and);
        true
    }

    pub(crate) fn or(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("or {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let or = self.ir.ir().or_64(a, b);
        self.put_gpr(rd, or);
        true
    }

    pub(crate) fn xor(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("xor {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let xor = self.ir.ir().xor_64(a, b);
        self.put_gpr(rd, xor);
        true
    }

    pub(crate) fn orn(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("orn {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let not = self.ir.ir().not_64(b);
        let or = self.ir.ir().or_64(a, not);
        self.put_gpr(rd, or);
        true
    }

    pub(crate) fn andn(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("andn {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let not = self.ir.ir().not_64(b);
        let and = self.ir.ir().and_64(a, not);
        self.put_gpr(rd, and);
        true
    }

    /// rd = rj when rk != 0, else 0. Synthesized from a 1-bit sign
    /// extension used as an all-ones/all-zeros mask.
    pub(crate) fn maskeqz(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("maskeqz {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let b = self.gpr64(rk);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_ne_64(b, zero);
        let mask = self.ir.ir().sign_extend_bit_to_long(cond);
        let a = self.gpr64(rj);
        let and = self.ir.ir().and_64(mask, a);
        self.put_gpr(rd, and);
        true
    }

    pub(crate) fn masknez(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("masknez {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let b = self.gpr64(rk);
        let zero = self.ir.ir().imm64(0);
        let cond = self.ir.ir().cmp_eq_64(b, zero);
        let mask = self.ir.ir().sign_extend_bit_to_long(cond);
        let a = self.gpr64(rj);
        let and = self.ir.ir().and_64(mask, a);
        self.put_gpr(rd, and);
        true
    }

    // --- Multiplication ---

    pub(crate) fn mul_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mul.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let mul = self.ir.ir().signed_mull_word(a, b);
        let lo = self.ir.ir().least_significant_word(mul);
        self.put_gpr_sx32(rd, lo);
        true
    }

    pub(crate) fn mulh_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulh.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let mul = self.ir.ir().signed_mull_word(a, b);
        let hi = self.ir.ir().most_significant_word(mul);
        self.put_gpr_sx32(rd, hi);
        true
    }

    pub(crate) fn mulh_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulh.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let mul = self.ir.ir().unsigned_mull_word(a, b);
        let hi = self.ir.ir().most_significant_word(mul);
        self.put_gpr_sx32(rd, hi);
        true
    }

    pub(crate) fn mul_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mul.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let mul = self.ir.ir().signed_mull_long(a, b);
        let lo = self.ir.ir().least_significant_long(mul);
        self.put_gpr(rd, lo);
        true
    }

    pub(crate) fn mulh_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulh.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let mul = self.ir.ir().signed_mull_long(a, b);
        let hi = self.ir.ir().most_significant_long(mul);
        self.put_gpr(rd, hi);
        true
    }

    pub(crate) fn mulh_du(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulh.du {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let mul = self.ir.ir().unsigned_mull_long(a, b);
        let hi = self.ir.ir().most_significant_long(mul);
        self.put_gpr(rd, hi);
        true
    }

    pub(crate) fn mulw_d_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulw.d.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let mul = self.ir.ir().signed_mull_word(a, b);
        self.put_gpr(rd, mul);
        true
    }

    pub(crate) fn mulw_d_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mulw.d.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let mul = self.ir.ir().unsigned_mull_word(a, b);
        self.put_gpr(rd, mul);
        true
    }

    // --- Division ---
    //
    // The architecture delivers an implementation-specific value on divide
    // by zero; the trap, when wanted, arrives via a separate break
    // instruction emitted by the compiler. No check here.

    pub(crate) fn div_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("div.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let div = self.ir.ir().signed_div_32(a, b);
        self.put_gpr_sx32(rd, div);
        true
    }

    pub(crate) fn mod_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mod.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let rem = self.ir.ir().signed_rem_32(a, b);
        self.put_gpr_sx32(rd, rem);
        true
    }

    pub(crate) fn div_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("div.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let div = self.ir.ir().unsigned_div_32(a, b);
        self.put_gpr_sx32(rd, div);
        true
    }

    pub(crate) fn mod_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mod.wu {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr32(rj);
        let b = self.gpr32(rk);
        let rem = self.ir.ir().unsigned_rem_32(a, b);
        self.put_gpr_sx32(rd, rem);
        true
    }

    pub(crate) fn div_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("div.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let div = self.ir.ir().signed_div_64(a, b);
        self.put_gpr(rd, div);
        true
    }

    pub(crate) fn mod_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mod.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let rem = self.ir.ir().signed_rem_64(a, b);
        self.put_gpr(rd, rem);
        true
    }

    pub(crate) fn div_du(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("div.du {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let div = self.ir.ir().unsigned_div_64(a, b);
        self.put_gpr(rd, div);
        true
    }

    pub(crate) fn mod_du(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk) = (insn.rd(), insn.rj(), insn.rk());
        trace!("mod.du {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk));

        let a = self.gpr64(rj);
        let b = self.gpr64(rk);
        let rem = self.ir.ir().unsigned_rem_64(a, b);
        self.put_gpr(rd, rem);
        true
    }

    // --- Shift-add ---

    pub(crate) fn alsl_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk, sa2) = (insn.rd(), insn.rj(), insn.rk(), insn.sa2());
        trace!("alsl.w {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk), sa2);

        let a = self.gpr32(rj);
        let sh = self.ir.ir().imm8((sa2 + 1) as u8);
        let shl = self.ir.ir().logical_shift_left_32(a, sh);
        let b = self.gpr32(rk);
        let add = self.ir.ir().add_32(shl, b);
        self.put_gpr_sx32(rd, add);
        true
    }

    pub(crate) fn alsl_wu(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk, sa2) = (insn.rd(), insn.rj(), insn.rk(), insn.sa2());
        trace!("alsl.wu {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk), sa2);

        let a = self.gpr32(rj);
        let sh = self.ir.ir().imm8((sa2 + 1) as u8);
        let shl = self.ir.ir().logical_shift_left_32(a, sh);
        let b = self.gpr32(rk);
        let add = self.ir.ir().add_32(shl, b);
        let wide = self.ir.ir().zero_extend_word_to_long(add);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn alsl_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, rk, sa2) = (insn.rd(), insn.rj(), insn.rk(), insn.sa2());
        trace!("alsl.d {}, {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), IReg::from_u32(rk), sa2);

        let a = self.gpr64(rj);
        let sh = self.ir.ir().imm8((sa2 + 1) as u8);
        let shl = self.ir.ir().logical_shift_left_64(a, sh);
        let b = self.gpr64(rk);
        let add = self.ir.ir().add_64(shl, b);
        self.put_gpr(rd, add);
        true
    }

    // --- Wide immediates ---

    pub(crate) fn lu12i_w(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("lu12i.w {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let imm = self.ir.ir().imm32(si20 << 12);
        let wide = self.ir.ir().sign_extend_word_to_long(imm);
        self.put_gpr(rd, wide);
        true
    }

    pub(crate) fn lu32i_d(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("lu32i.d {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let imm = self.ir.ir().imm64((sext32(si20, 20) as u64) << 32);
        let old = self.gpr64(rd);
        let sh = self.ir.ir().imm8(32);
        let shl = self.ir.ir().logical_shift_left_64(old, sh);
        let shr = self.ir.ir().logical_shift_right_64(shl, sh);
        let or = self.ir.ir().or_64(imm, shr);
        self.put_gpr(rd, or);
        true
    }

    pub(crate) fn lu52i_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("lu52i.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let imm = self.ir.ir().imm64((si12 as u64) << 52);
        let src = self.gpr64(rj);
        let sh = self.ir.ir().imm8(12);
        let shl = self.ir.ir().logical_shift_left_64(src, sh);
        let shr = self.ir.ir().logical_shift_right_64(shl, sh);
        let or = self.ir.ir().or_64(imm, shr);
        self.put_gpr(rd, or);
        true
    }

    // --- PC-relative ---

    pub(crate) fn pcaddi(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("pcaddi {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let v = self.ir.pc.wrapping_add(sext64((si20 as u64) << 2, 22));
        let imm = self.ir.ir().imm64(v);
        self.put_gpr(rd, imm);
        true
    }

    pub(crate) fn pcalau12i(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("pcalau12i {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let v = self.ir.pc.wrapping_add(sext64((si20 as u64) << 12, 32));
        let imm = self.ir.ir().imm64(v);
        let sh = self.ir.ir().imm8(12);
        let shr = self.ir.ir().logical_shift_right_64(imm, sh);
        let shl = self.ir.ir().logical_shift_left_64(shr, sh);
        self.put_gpr(rd, shl);
        true
    }

    pub(crate) fn pcaddu12i(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("pcaddu12i {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let v = self.ir.pc.wrapping_add(sext64((si20 as u64) << 12, 32));
        let imm = self.ir.ir().imm64(v);
        self.put_gpr(rd, imm);
        true
    }

    pub(crate) fn pcaddu18i(&mut self, insn: InsnWord) -> bool {
        let (rd, si20) = (insn.rd(), insn.si20());
        trace!("pcaddu18i {}, {}", IReg::from_u32(rd), sext32(si20, 20) as i32);

        let v = self.ir.pc.wrapping_add(sext64((si20 as u64) << 18, 38));
        let imm = self.ir.ir().imm64(v);
        self.put_gpr(rd, imm);
        true
    }

    // --- Immediate forms ---

    pub(crate) fn addi_w(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("addi.w {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let a = self.gpr32(rj);
        let imm = self.ir.ir().imm32(sext32(si12, 12));
        let add = self.ir.ir().add_32(a, imm);
        self.put_gpr_sx32(rd, add);
        true
    }

    pub(crate) fn addi_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si12) = (insn.rd(), insn.rj(), insn.si12());
        trace!("addi.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si12, 12) as i32);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(sext64(si12 as u64, 12));
        let add = self.ir.ir().add_64(a, imm);
        self.put_gpr(rd, add);
        true
    }

    pub(crate) fn addu16i_d(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, si16) = (insn.rd(), insn.rj(), insn.si16());
        trace!("addu16i.d {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), sext32(si16, 16) as i32);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(sext64((si16 as u64) << 16, 32));
        let add = self.ir.ir().add_64(a, imm);
        self.put_gpr(rd, add);
        true
    }

    pub(crate) fn andi(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui12) = (insn.rd(), insn.rj(), insn.ui12());
        trace!("andi {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui12);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(ui12 as u64);
        let and = self.ir.ir().and_64(a, imm);
        self.put_gpr(rd, and);
        true
    }

    pub(crate) fn ori(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui12) = (insn.rd(), insn.rj(), insn.ui12());
        trace!("ori {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui12);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(ui12 as u64);
        let or = self.ir.ir().or_64(a, imm);
        self.put_gpr(rd, or);
        true
    }

    pub(crate) fn xori(&mut self, insn: InsnWord) -> bool {
        let (rd, rj, ui12) = (insn.rd(), insn.rj(), insn.ui12());
        trace!("xori {}, {}, {}", IReg::from_u32(rd), IReg::from_u32(rj), ui12);

        let a = self.gpr64(rj);
        let imm = self.ir.ir().imm64(ui12 as u64);
        let xor = self.ir.ir().xor_64(a, imm);
        self.put_gpr(rd, xor);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch};
    use crate::ir::block::Block;
    use crate::ir::opcode::Opcode;

    fn opcodes_for(word: u32) -> Vec<Opcode> {
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
        block.opcodes()
    }

    #[test]
    fn test_add_w_shape() {
        // add.w $r1, $r2, $r3
        assert_eq!(
            opcodes_for(0x00100c41),
            vec![
                Opcode::GetGpr32,
                Opcode::GetGpr32,
                Opcode::Add32,
                Opcode::SignExtendWordToLong,
                Opcode::SetGpr,
                Opcode::SetPc,
            ]
        );
    }

    #[test]
    fn test_mulh_w_extracts_high_half() {
        // mulh.w $r4, $r5, $r6
        let ops = opcodes_for(0x001c98a4);
        assert!(ops.contains(&Opcode::SignedMullWord));
        assert!(ops.contains(&Opcode::MostSignificantWord));
    }

    #[test]
    fn test_maskeqz_uses_sign_mask() {
        // maskeqz $r4, $r5, $r6
        let ops = opcodes_for(0x001398a4);
        assert!(ops.contains(&Opcode::CmpNe64));
        assert!(ops.contains(&Opcode::SignExtendBitToLong));
        assert!(ops.contains(&Opcode::And64));
    }

    #[test]
    fn test_div_emits_no_zero_check() {
        // div.w $r4, $r5, $r6: division by zero is implementation-defined,
        // no trap is emitted here.
        let ops = opcodes_for(0x002098a4);
        assert!(!ops.contains(&Opcode::Exit));
        assert!(ops.contains(&Opcode::SignedDiv32));
    }

    #[test]
    fn test_pcaddu12i_folds_pc() {
        // pcaddu12i $r1, 1
        let ops = opcodes_for(0x1c000021);
        assert_eq!(ops, vec![Opcode::SetGpr, Opcode::SetPc]);
    }
}
