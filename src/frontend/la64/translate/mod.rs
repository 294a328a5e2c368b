//! Per-instruction translation: the dispatch cascade routes a raw 32-bit
//! word to exactly one emitter method; the emitters append IR into the
//! caller's block.

mod arith;
mod atomic;
mod bits;
mod bound;
mod branch;
mod exclusive;
mod float_arith;
mod float_cmp;
mod float_conv;
mod float_load_store;
mod float_move;
mod load_store;
mod shift;
mod special;
mod system;

use log::{trace, warn};

use crate::frontend::la64::insn::{fetch_word, InsnWord};
use crate::frontend::la64::regs::{FReg, IReg};
use crate::frontend::la64::{
    AbiInfo, ArchCaps, DisCont, DisResult, Endness, FpOp, GuestArch, JumpKind,
};
use crate::ir::block::Block;
use crate::ir::la64_emitter::La64IREmitter;
use crate::ir::value::Value;

/// Per-invocation translation context. Created at entry, consumed by exactly
/// one dispatch cascade, discarded when `decode` returns; nothing outlives
/// the call except the IR appended to the caller's block.
pub(crate) struct Translator<'a> {
    pub ir: La64IREmitter<'a>,
    pub caps: ArchCaps,
    pub abi: AbiInfo,
    pub dres: DisResult,
}

impl<'a> Translator<'a> {
    fn new(block: &'a mut Block, pc: u64, caps: ArchCaps, abi: AbiInfo) -> Self {
        Self {
            ir: La64IREmitter::new(block, pc),
            caps,
            abi,
            dres: DisResult::default(),
        }
    }

    // --- Shared register/addressing helpers ---

    pub(crate) fn gpr8(&mut self, n: u32) -> Value {
        self.ir.get_gpr8(IReg::from_u32(n))
    }

    pub(crate) fn gpr16(&mut self, n: u32) -> Value {
        self.ir.get_gpr16(IReg::from_u32(n))
    }

    pub(crate) fn gpr32(&mut self, n: u32) -> Value {
        self.ir.get_gpr32(IReg::from_u32(n))
    }

    pub(crate) fn gpr64(&mut self, n: u32) -> Value {
        self.ir.get_gpr64(IReg::from_u32(n))
    }

    pub(crate) fn put_gpr(&mut self, n: u32, value: Value) {
        self.ir.set_gpr(IReg::from_u32(n), value);
    }

    /// Write a 32-bit result sign-extended to 64 bits.
    pub(crate) fn put_gpr_sx32(&mut self, n: u32, value: Value) {
        let wide = self.ir.ir().sign_extend_word_to_long(value);
        self.put_gpr(n, wide);
    }

    pub(crate) fn fpr32(&mut self, n: u32) -> Value {
        self.ir.get_fpr32(FReg::from_u32(n))
    }

    pub(crate) fn fpr64(&mut self, n: u32) -> Value {
        self.ir.get_fpr64(FReg::from_u32(n))
    }

    pub(crate) fn put_fpr32(&mut self, n: u32, value: Value) {
        self.ir.set_fpr32(FReg::from_u32(n), value);
    }

    pub(crate) fn put_fpr64(&mut self, n: u32, value: Value) {
        self.ir.set_fpr64(FReg::from_u32(n), value);
    }

    /// Record the FCSR-update helper call for an FP operation on the given
    /// source registers.
    pub(crate) fn fcsr_update(&mut self, op: FpOp, srcs: &[u32]) {
        let regs: Vec<FReg> = srcs.iter().map(|n| FReg::from_u32(*n)).collect();
        self.ir.calculate_fcsr(op, &regs);
    }

    /// rj + sign-extended 12-bit displacement.
    pub(crate) fn addr_si12(&mut self, insn: InsnWord) -> Value {
        let base = self.gpr64(insn.rj());
        let disp = crate::frontend::la64::insn::sext64(insn.si12() as u64, 12);
        let imm = self.ir.ir().imm64(disp);
        self.ir.ir().add_64(base, imm)
    }

    /// rj + sign-extended word-scaled 14-bit displacement.
    pub(crate) fn addr_si14(&mut self, insn: InsnWord) -> Value {
        let base = self.gpr64(insn.rj());
        let disp = crate::frontend::la64::insn::sext64((insn.si14() as u64) << 2, 16);
        let imm = self.ir.ir().imm64(disp);
        self.ir.ir().add_64(base, imm)
    }

    /// rj + rk.
    pub(crate) fn addr_reg(&mut self, insn: InsnWord) -> Value {
        let base = self.gpr64(insn.rj());
        let index = self.gpr64(insn.rk());
        self.ir.ir().add_64(base, index)
    }

    // Shift-by-immediate helpers for the rotate/bytepick synthesis. A shift
    // by the full operand width would be an undefined IR value; the static
    // degenerate count is replaced by the literal zero it produces.

    pub(crate) fn shl32_guarded(&mut self, val: Value, n: u32) -> Value {
        if n >= 32 {
            self.ir.ir().imm32(0)
        } else {
            let sh = self.ir.ir().imm8(n as u8);
            self.ir.ir().logical_shift_left_32(val, sh)
        }
    }

    pub(crate) fn shr32_guarded(&mut self, val: Value, n: u32) -> Value {
        if n >= 32 {
            self.ir.ir().imm32(0)
        } else {
            let sh = self.ir.ir().imm8(n as u8);
            self.ir.ir().logical_shift_right_32(val, sh)
        }
    }

    pub(crate) fn shl64_guarded(&mut self, val: Value, n: u32) -> Value {
        if n >= 64 {
            self.ir.ir().imm64(0)
        } else {
            let sh = self.ir.ir().imm8(n as u8);
            self.ir.ir().logical_shift_left_64(val, sh)
        }
    }

    pub(crate) fn shr64_guarded(&mut self, val: Value, n: u32) -> Value {
        if n >= 64 {
            self.ir.ir().imm64(0)
        } else {
            let sh = self.ir.ir().imm8(n as u8);
            self.ir.ir().logical_shift_right_64(val, sh)
        }
    }

    /// Alignment-trap check, suppressed when the target advertises
    /// unaligned-access support.
    pub(crate) fn check_align(&mut self, addr: Value, mask: u64) {
        if !self.caps.contains(ArchCaps::UAL) {
            self.ir.sigbus_if_misaligned(addr, mask);
        }
    }

    /// Capability gate: when `cap` is absent, translate to a SigILL stop and
    /// report the instruction handled.
    pub(crate) fn missing_cap(&mut self, cap: ArchCaps) -> bool {
        if !self.caps.contains(cap) {
            self.stop_here(JumpKind::SigIll);
            true
        } else {
            false
        }
    }

    pub(crate) fn stop_here(&mut self, kind: JumpKind) {
        self.dres.next = DisCont::StopHere;
        self.dres.stop = Some(kind);
    }

    // --- Dispatch cascade ---

    fn dis_insn(&mut self, insn: InsnWord) -> bool {
        match insn.bits(31, 30) {
            0b00 => self.dis_00(insn),
            0b01 => self.dis_01(insn),
            _ => false,
        }
    }

    fn dis_00(&mut self, insn: InsnWord) -> bool {
        match insn.bits(29, 26) {
            0b0000 => self.dis_00_0000(insn),
            0b0010 => match insn.bits(25, 20) {
                0b000001 => self.fmadd_s(insn),
                0b000010 => self.fmadd_d(insn),
                0b000101 => self.fmsub_s(insn),
                0b000110 => self.fmsub_d(insn),
                0b001001 => self.fnmadd_s(insn),
                0b001010 => self.fnmadd_d(insn),
                0b001101 => self.fnmsub_s(insn),
                0b001110 => self.fnmsub_d(insn),
                _ => false,
            },
            0b0011 => match insn.bits(25, 20) {
                0b000001 if insn.bits(4, 3) == 0b00 => self.dis_fcmp_s(insn),
                0b000010 if insn.bits(4, 3) == 0b00 => self.dis_fcmp_d(insn),
                0b010000 if insn.bits(19, 18) == 0b00 => self.fsel(insn),
                _ => false,
            },
            0b0100 => self.addu16i_d(insn),
            0b0101 => {
                if insn.bits(25, 25) == 0 {
                    self.lu12i_w(insn)
                } else {
                    self.lu32i_d(insn)
                }
            }
            0b0110 => {
                if insn.bits(25, 25) == 0 {
                    self.pcaddi(insn)
                } else {
                    self.pcalau12i(insn)
                }
            }
            0b0111 => {
                if insn.bits(25, 25) == 0 {
                    self.pcaddu12i(insn)
                } else {
                    self.pcaddu18i(insn)
                }
            }
            0b1000 => match insn.bits(25, 24) {
                0b00 => self.ll_w(insn),
                0b01 => self.sc_w(insn),
                0b10 => self.ll_d(insn),
                _ => self.sc_d(insn),
            },
            0b1001 => match insn.bits(25, 24) {
                0b00 => self.ldptr_w(insn),
                0b01 => self.stptr_w(insn),
                0b10 => self.ldptr_d(insn),
                _ => self.stptr_d(insn),
            },
            0b1010 => self.dis_00_1010(insn),
            0b1110 => match insn.bits(25, 22) {
                0b0000 => self.dis_00_1110_0000(insn),
                0b0001 => self.dis_00_1110_0001(insn),
                _ => false,
            },
            _ => false,
        }
    }

    fn dis_00_0000(&mut self, insn: InsnWord) -> bool {
        match insn.bits(25, 22) {
            0b0000 => self.dis_00_0000_0000(insn),
            0b0001 => self.dis_00_0000_0001(insn),
            0b0010 => self.bstrins_d(insn),
            0b0011 => self.bstrpick_d(insn),
            0b0100 => self.dis_00_0000_0100(insn),
            0b1000 => self.slti(insn),
            0b1001 => self.sltui(insn),
            0b1010 => self.addi_w(insn),
            0b1011 => self.addi_d(insn),
            0b1100 => self.lu52i_d(insn),
            0b1101 => self.andi(insn),
            0b1110 => self.ori(insn),
            0b1111 => self.xori(insn),
            _ => false,
        }
    }

    fn dis_00_0000_0000(&mut self, insn: InsnWord) -> bool {
        let ok = match insn.bits(21, 15) {
            0b0000000 => match insn.bits(14, 10) {
                0b00100 => self.clo_w(insn),
                0b00101 => self.clz_w(insn),
                0b00110 => self.cto_w(insn),
                0b00111 => self.ctz_w(insn),
                0b01000 => self.clo_d(insn),
                0b01001 => self.clz_d(insn),
                0b01010 => self.cto_d(insn),
                0b01011 => self.ctz_d(insn),
                0b01100 => self.revb_2h(insn),
                0b01101 => self.revb_4h(insn),
                0b01110 => self.revb_2w(insn),
                0b01111 => self.revb_d(insn),
                0b10000 => self.revh_2w(insn),
                0b10001 => self.revh_d(insn),
                0b10010 => self.bitrev_4b(insn),
                0b10011 => self.bitrev_8b(insn),
                0b10100 => self.bitrev_w(insn),
                0b10101 => self.bitrev_d(insn),
                0b10110 => self.ext_w_h(insn),
                0b10111 => self.ext_w_b(insn),
                0b11000 => self.rdtimel_w(insn),
                0b11001 => self.rdtimeh_w(insn),
                0b11010 => self.rdtime_d(insn),
                0b11011 => self.cpucfg(insn),
                _ => false,
            },
            0b0000010 => self.asrtle_d(insn),
            0b0000011 => self.asrtgt_d(insn),
            0b0100000 => self.add_w(insn),
            0b0100001 => self.add_d(insn),
            0b0100010 => self.sub_w(insn),
            0b0100011 => self.sub_d(insn),
            0b0100100 => self.slt(insn),
            0b0100101 => self.sltu(insn),
            0b0100110 => self.maskeqz(insn),
            0b0100111 => self.masknez(insn),
            0b0101000 => self.nor(insn),
            0b0101001 => self.and(insn),
            0b0101010 => self.or(insn),
            0b0101011 => self.xor(insn),
            0b0101100 => self.orn(insn),
            0b0101101 => self.andn(insn),
            0b0101110 => self.sll_w(insn),
            0b0101111 => self.srl_w(insn),
            0b0110000 => self.sra_w(insn),
            0b0110001 => self.sll_d(insn),
            0b0110010 => self.srl_d(insn),
            0b0110011 => self.sra_d(insn),
            0b0110110 => self.rotr_w(insn),
            0b0110111 => self.rotr_d(insn),
            0b0111000 => self.mul_w(insn),
            0b0111001 => self.mulh_w(insn),
            0b0111010 => self.mulh_wu(insn),
            0b0111011 => self.mul_d(insn),
            0b0111100 => self.mulh_d(insn),
            0b0111101 => self.mulh_du(insn),
            0b0111110 => self.mulw_d_w(insn),
            0b0111111 => self.mulw_d_wu(insn),
            0b1000000 => self.div_w(insn),
            0b1000001 => self.mod_w(insn),
            0b1000010 => self.div_wu(insn),
            0b1000011 => self.mod_wu(insn),
            0b1000100 => self.div_d(insn),
            0b1000101 => self.mod_d(insn),
            0b1000110 => self.div_du(insn),
            0b1000111 => self.mod_du(insn),
            0b1001000 => self.crc_w_b_w(insn),
            0b1001001 => self.crc_w_h_w(insn),
            0b1001010 => self.crc_w_w_w(insn),
            0b1001011 => self.crc_w_d_w(insn),
            0b1001100 => self.crcc_w_b_w(insn),
            0b1001101 => self.crcc_w_h_w(insn),
            0b1001110 => self.crcc_w_w_w(insn),
            0b1001111 => self.crcc_w_d_w(insn),
            0b1010100 => self.break_inst(insn),
            0b1010110 => self.syscall(insn),
            _ => false,
        };
        if ok {
            return ok;
        }

        match insn.bits(21, 18) {
            0b0001 => {
                if insn.bits(17, 17) == 0 {
                    self.alsl_w(insn)
                } else {
                    self.alsl_wu(insn)
                }
            }
            0b0010 => {
                if insn.bits(17, 17) == 0 {
                    self.bytepick_w(insn)
                } else {
                    false
                }
            }
            0b0011 => self.bytepick_d(insn),
            0b1011 => {
                if insn.bits(17, 17) == 0 {
                    self.alsl_d(insn)
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn dis_00_0000_0001(&mut self, insn: InsnWord) -> bool {
        if insn.bits(21, 21) == 0 {
            match insn.bits(20, 16) {
                0b00000 if insn.bits(15, 15) == 1 => self.slli_w(insn),
                0b00001 => self.slli_d(insn),
                0b00100 if insn.bits(15, 15) == 1 => self.srli_w(insn),
                0b00101 => self.srli_d(insn),
                0b01000 if insn.bits(15, 15) == 1 => self.srai_w(insn),
                0b01001 => self.srai_d(insn),
                0b01100 if insn.bits(15, 15) == 1 => self.rotri_w(insn),
                0b01101 => self.rotri_d(insn),
                _ => false,
            }
        } else if insn.bits(15, 15) == 0 {
            self.bstrins_w(insn)
        } else {
            self.bstrpick_w(insn)
        }
    }

    fn dis_00_0000_0100(&mut self, insn: InsnWord) -> bool {
        match insn.bits(21, 15) {
            0b0000001 => self.fadd_s(insn),
            0b0000010 => self.fadd_d(insn),
            0b0000101 => self.fsub_s(insn),
            0b0000110 => self.fsub_d(insn),
            0b0001001 => self.fmul_s(insn),
            0b0001010 => self.fmul_d(insn),
            0b0001101 => self.fdiv_s(insn),
            0b0001110 => self.fdiv_d(insn),
            0b0010001 => self.fmax_s(insn),
            0b0010010 => self.fmax_d(insn),
            0b0010101 => self.fmin_s(insn),
            0b0010110 => self.fmin_d(insn),
            0b0011001 => self.fmaxa_s(insn),
            0b0011010 => self.fmaxa_d(insn),
            0b0011101 => self.fmina_s(insn),
            0b0011110 => self.fmina_d(insn),
            0b0100001 => self.fscaleb_s(insn),
            0b0100010 => self.fscaleb_d(insn),
            0b0100101 => self.fcopysign_s(insn),
            0b0100110 => self.fcopysign_d(insn),
            0b0101000 => match insn.bits(14, 10) {
                0b00001 => self.fabs_s(insn),
                0b00010 => self.fabs_d(insn),
                0b00101 => self.fneg_s(insn),
                0b00110 => self.fneg_d(insn),
                0b01001 => self.flogb_s(insn),
                0b01010 => self.flogb_d(insn),
                0b01101 => self.fclass_s(insn),
                0b01110 => self.fclass_d(insn),
                0b10001 => self.fsqrt_s(insn),
                0b10010 => self.fsqrt_d(insn),
                0b10101 => self.frecip_s(insn),
                0b10110 => self.frecip_d(insn),
                0b11001 => self.frsqrt_s(insn),
                0b11010 => self.frsqrt_d(insn),
                _ => false,
            },
            0b0101001 => match insn.bits(14, 10) {
                0b00101 => self.fmov_s(insn),
                0b00110 => self.fmov_d(insn),
                0b01001 => self.movgr2fr_w(insn),
                0b01010 => self.movgr2fr_d(insn),
                0b01011 => self.movgr2frh_w(insn),
                0b01101 => self.movfr2gr_s(insn),
                0b01110 => self.movfr2gr_d(insn),
                0b01111 => self.movfrh2gr_s(insn),
                0b10000 => self.movgr2fcsr(insn),
                0b10010 => self.movfcsr2gr(insn),
                0b10100 if insn.bits(4, 3) == 0b00 => self.movfr2cf(insn),
                0b10101 if insn.bits(9, 8) == 0b00 => self.movcf2fr(insn),
                0b10110 if insn.bits(4, 3) == 0b00 => self.movgr2cf(insn),
                0b10111 if insn.bits(9, 8) == 0b00 => self.movcf2gr(insn),
                _ => false,
            },
            0b0110010 => match insn.bits(14, 10) {
                0b00110 => self.fcvt_s_d(insn),
                0b01001 => self.fcvt_d_s(insn),
                _ => false,
            },
            0b0110100 => match insn.bits(14, 10) {
                0b00001 => self.ftintrm_w_s(insn),
                0b00010 => self.ftintrm_w_d(insn),
                0b01001 => self.ftintrm_l_s(insn),
                0b01010 => self.ftintrm_l_d(insn),
                0b10001 => self.ftintrp_w_s(insn),
                0b10010 => self.ftintrp_w_d(insn),
                0b11001 => self.ftintrp_l_s(insn),
                0b11010 => self.ftintrp_l_d(insn),
                _ => false,
            },
            0b0110101 => match insn.bits(14, 10) {
                0b00001 => self.ftintrz_w_s(insn),
                0b00010 => self.ftintrz_w_d(insn),
                0b01001 => self.ftintrz_l_s(insn),
                0b01010 => self.ftintrz_l_d(insn),
                0b10001 => self.ftintrne_w_s(insn),
                0b10010 => self.ftintrne_w_d(insn),
                0b11001 => self.ftintrne_l_s(insn),
                0b11010 => self.ftintrne_l_d(insn),
                _ => false,
            },
            0b0110110 => match insn.bits(14, 10) {
                0b00001 => self.ftint_w_s(insn),
                0b00010 => self.ftint_w_d(insn),
                0b01001 => self.ftint_l_s(insn),
                0b01010 => self.ftint_l_d(insn),
                _ => false,
            },
            0b0111010 => match insn.bits(14, 10) {
                0b00100 => self.ffint_s_w(insn),
                0b00110 => self.ffint_s_l(insn),
                0b01000 => self.ffint_d_w(insn),
                0b01010 => self.ffint_d_l(insn),
                _ => false,
            },
            0b0111100 => match insn.bits(14, 10) {
                0b10001 => self.frint_s(insn),
                0b10010 => self.frint_d(insn),
                _ => false,
            },
            _ => false,
        }
    }

    fn dis_00_1010(&mut self, insn: InsnWord) -> bool {
        match insn.bits(25, 22) {
            0b0000 => self.ld_b(insn),
            0b0001 => self.ld_h(insn),
            0b0010 => self.ld_w(insn),
            0b0011 => self.ld_d(insn),
            0b0100 => self.st_b(insn),
            0b0101 => self.st_h(insn),
            0b0110 => self.st_w(insn),
            0b0111 => self.st_d(insn),
            0b1000 => self.ld_bu(insn),
            0b1001 => self.ld_hu(insn),
            0b1010 => self.ld_wu(insn),
            0b1011 => self.preld(insn),
            0b1100 => self.fld_s(insn),
            0b1101 => self.fst_s(insn),
            0b1110 => self.fld_d(insn),
            0b1111 => self.fst_d(insn),
            _ => false,
        }
    }

    fn dis_00_1110_0000(&mut self, insn: InsnWord) -> bool {
        match insn.bits(21, 15) {
            0b0000000 => self.ldx_b(insn),
            0b0001000 => self.ldx_h(insn),
            0b0010000 => self.ldx_w(insn),
            0b0011000 => self.ldx_d(insn),
            0b0100000 => self.stx_b(insn),
            0b0101000 => self.stx_h(insn),
            0b0110000 => self.stx_w(insn),
            0b0111000 => self.stx_d(insn),
            0b1000000 => self.ldx_bu(insn),
            0b1001000 => self.ldx_hu(insn),
            0b1010000 => self.ldx_wu(insn),
            0b1011000 => self.preldx(insn),
            0b1100000 => self.fldx_s(insn),
            0b1101000 => self.fldx_d(insn),
            0b1110000 => self.fstx_s(insn),
            0b1111000 => self.fstx_d(insn),
            _ => false,
        }
    }

    fn dis_00_1110_0001(&mut self, insn: InsnWord) -> bool {
        match insn.bits(21, 15) {
            0b1000000 => self.amswap_w(insn),
            0b1000001 => self.amswap_d(insn),
            0b1000010 => self.amadd_w(insn),
            0b1000011 => self.amadd_d(insn),
            0b1000100 => self.amand_w(insn),
            0b1000101 => self.amand_d(insn),
            0b1000110 => self.amor_w(insn),
            0b1000111 => self.amor_d(insn),
            0b1001000 => self.amxor_w(insn),
            0b1001001 => self.amxor_d(insn),
            0b1001010 => self.ammax_w(insn),
            0b1001011 => self.ammax_d(insn),
            0b1001100 => self.ammin_w(insn),
            0b1001101 => self.ammin_d(insn),
            0b1001110 => self.ammax_wu(insn),
            0b1001111 => self.ammax_du(insn),
            0b1010000 => self.ammin_wu(insn),
            0b1010001 => self.ammin_du(insn),
            0b1010010 => self.amswap_db_w(insn),
            0b1010011 => self.amswap_db_d(insn),
            0b1010100 => self.amadd_db_w(insn),
            0b1010101 => self.amadd_db_d(insn),
            0b1010110 => self.amand_db_w(insn),
            0b1010111 => self.amand_db_d(insn),
            0b1011000 => self.amor_db_w(insn),
            0b1011001 => self.amor_db_d(insn),
            0b1011010 => self.amxor_db_w(insn),
            0b1011011 => self.amxor_db_d(insn),
            0b1011100 => self.ammax_db_w(insn),
            0b1011101 => self.ammax_db_d(insn),
            0b1011110 => self.ammin_db_w(insn),
            0b1011111 => self.ammin_db_d(insn),
            0b1100000 => self.ammax_db_wu(insn),
            0b1100001 => self.ammax_db_du(insn),
            0b1100010 => self.ammin_db_wu(insn),
            0b1100011 => self.ammin_db_du(insn),
            0b1100100 => self.dbar(insn),
            0b1100101 => self.ibar(insn),
            0b1101000 => self.fldgt_s(insn),
            0b1101001 => self.fldgt_d(insn),
            0b1101010 => self.fldle_s(insn),
            0b1101011 => self.fldle_d(insn),
            0b1101100 => self.fstgt_s(insn),
            0b1101101 => self.fstgt_d(insn),
            0b1101110 => self.fstle_s(insn),
            0b1101111 => self.fstle_d(insn),
            0b1110000 => self.ldgt_b(insn),
            0b1110001 => self.ldgt_h(insn),
            0b1110010 => self.ldgt_w(insn),
            0b1110011 => self.ldgt_d(insn),
            0b1110100 => self.ldle_b(insn),
            0b1110101 => self.ldle_h(insn),
            0b1110110 => self.ldle_w(insn),
            0b1110111 => self.ldle_d(insn),
            0b1111000 => self.stgt_b(insn),
            0b1111001 => self.stgt_h(insn),
            0b1111010 => self.stgt_w(insn),
            0b1111011 => self.stgt_d(insn),
            0b1111100 => self.stle_b(insn),
            0b1111101 => self.stle_h(insn),
            0b1111110 => self.stle_w(insn),
            0b1111111 => self.stle_d(insn),
            _ => false,
        }
    }

    fn dis_01(&mut self, insn: InsnWord) -> bool {
        match insn.bits(29, 26) {
            0b0000 => self.beqz(insn),
            0b0001 => self.bnez(insn),
            0b0010 => match insn.bits(9, 8) {
                0b00 => self.bceqz(insn),
                0b01 => self.bcnez(insn),
                _ => false,
            },
            0b0011 => self.jirl(insn),
            0b0100 => self.b(insn),
            0b0101 => self.bl(insn),
            0b0110 => self.beq(insn),
            0b0111 => self.bne(insn),
            0b1000 => self.blt(insn),
            0b1001 => self.bge(insn),
            0b1010 => self.bltu(insn),
            0b1011 => self.bgeu(insn),
            _ => false,
        }
    }
}

/// Decode a single LoongArch64 instruction into IR.
///
/// `guest_bytes[delta..]` holds the instruction bytes; `guest_ip` is its
/// guest address. On success, `len` is 4 (or 20 for the instrumentation
/// preamble) and, for fall-through instructions, a final PC write to
/// `guest_ip + len` has been appended. On decode failure no IR from the
/// failed attempt survives except a paranoia PC write-back, and the result
/// is `len = 0`, stop-here, NoDecode.
#[allow(clippy::too_many_arguments)]
pub fn decode(
    block: &mut Block,
    guest_bytes: &[u8],
    delta: usize,
    guest_ip: u64,
    guest_arch: GuestArch,
    caps: ArchCaps,
    abi: AbiInfo,
    _host_endness: Endness,
    sigill_diag: bool,
) -> DisResult {
    assert_eq!(guest_arch, GuestArch::LoongArch64);
    assert_eq!(guest_ip & 3, 0, "misaligned guest PC {:#x}", guest_ip);

    let code = &guest_bytes[delta..];
    let insn = fetch_word(code);
    trace!("0x{:x}:\t0x{:08x}", guest_ip, insn);

    let mut tr = Translator::new(block, guest_ip, caps, abi);

    // Spot the instrumentation preamble first; it is chosen to never occur
    // in natural code.
    let mut ok = tr.dis_special(code);
    if !ok {
        ok = tr.dis_insn(InsnWord(insn));
    }

    if ok {
        let dres = tr.dres;
        assert!(dres.len == 4 || dres.len == 20);
        if dres.next == DisCont::Continue {
            let next = tr.ir.ir().imm64(guest_ip + dres.len as u64);
            tr.ir.set_pc(next);
        }
        dres
    } else {
        // The sub-decoders must not have touched the result record.
        assert_eq!(tr.dres.len, 4);
        assert_eq!(tr.dres.next, DisCont::Continue);
        assert_eq!(tr.dres.stop, None);

        if sigill_diag {
            let mut buf = String::with_capacity(39);
            for i in 0..32 {
                if i > 0 && (i & 3) == 0 {
                    buf.push(' ');
                }
                buf.push(if insn & (1 << (31 - i)) != 0 { '1' } else { '0' });
            }
            warn!("unhandled instruction 0x{:08x}", insn);
            warn!("{}", buf);
        }

        // Tell the dispatcher that this insn cannot be decoded and is the
        // next to be executed. PC should be up-to-date already, but be
        // paranoid and write it again.
        let cur = tr.ir.ir().imm64(guest_ip);
        tr.ir.set_pc(cur);
        DisResult {
            len: 0,
            next: DisCont::StopHere,
            stop: Some(JumpKind::NoDecode),
            hint: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::la64::regs::IReg;
    use crate::ir::opcode::Opcode;
    use crate::ir::value::Value;

    fn run(words: &[u32], pc: u64, caps: ArchCaps, abi: AbiInfo) -> (Block, DisResult) {
        let mut bytes = Vec::new();
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        let mut block = Block::new(pc);
        let dres = decode(
            &mut block,
            &bytes,
            0,
            pc,
            GuestArch::LoongArch64,
            caps,
            abi,
            Endness::Little,
            false,
        );
        (block, dres)
    }

    fn run_one(word: u32) -> (Block, DisResult) {
        run(&[word], 0x10000, ArchCaps::empty(), AbiInfo::default())
    }

    #[test]
    fn test_add_w_zero_dest_discards_write() {
        // add.w $zero, $zero, $zero
        let (block, dres) = run_one(0x00100000);
        assert_eq!(dres.len, 4);
        assert_eq!(dres.next, DisCont::Continue);
        // No SetGpr; the only write is the fall-through PC update.
        assert!(block.iter().all(|(_, i)| i.opcode != Opcode::SetGpr));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10004);
    }

    #[test]
    fn test_lu12i_w_zero_dest() {
        // lu12i.w $zero, 2
        let (block, dres) = run_one(0x14000040);
        assert_eq!(dres.len, 4);
        assert!(block.iter().all(|(_, i)| i.opcode != Opcode::SetGpr));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
    }

    #[test]
    fn test_andi_writes_r1() {
        // andi $r1, $zero, 2
        let (block, dres) = run_one(0x03400801);
        assert_eq!(dres.len, 4);
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .expect("no register write");
        assert_eq!(set.1.arg(0).get_ireg(), IReg::R1);
    }

    #[test]
    fn test_ld_w_alignment_check_and_discard() {
        // ld.w $zero, $r1, 0
        let (block, dres) = run_one(0x28800020);
        assert_eq!(dres.len, 4);
        assert_eq!(dres.next, DisCont::Continue);
        let ops = block.opcodes();
        // Alignment exit precedes the load; the loaded value is discarded.
        let exit_pos = ops.iter().position(|o| *o == Opcode::Exit).unwrap();
        let load_pos = ops.iter().position(|o| *o == Opcode::ReadMemory32).unwrap();
        assert!(exit_pos < load_pos);
        assert!(ops.iter().all(|o| *o != Opcode::SetGpr));
    }

    #[test]
    fn test_ldptr_w_alignment_check_and_discard() {
        // ldptr.w $zero, $r1, 0
        let (block, dres) = run_one(0x24000020);
        assert_eq!(dres.len, 4);
        let ops = block.opcodes();
        let exit_pos = ops.iter().position(|o| *o == Opcode::Exit).unwrap();
        let load_pos = ops.iter().position(|o| *o == Opcode::ReadMemory32).unwrap();
        assert!(exit_pos < load_pos);
        assert!(ops.iter().all(|o| *o != Opcode::SetGpr));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10004);
    }

    #[test]
    fn test_ld_w_no_alignment_check_with_ual() {
        let (block, _) = run(
            &[0x28800020],
            0x10000,
            ArchCaps::UAL,
            AbiInfo::default(),
        );
        assert!(block.iter().all(|(_, i)| i.opcode != Opcode::Exit));
    }

    #[test]
    fn test_jirl_reads_source_before_link() {
        // jirl $zero, $r1, 0
        let (block, dres) = run_one(0x4c000020);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::Boring));
        let ops = block.opcodes();
        // Source read comes first; link write to $zero is discarded.
        assert_eq!(ops[0], Opcode::GetGpr64);
        assert!(ops.iter().all(|o| *o != Opcode::SetGpr));
        assert_eq!(*ops.last().unwrap(), Opcode::SetPc);
    }

    #[test]
    fn test_beq_conditional_exit() {
        // beq $zero, $zero, 1
        let (block, dres) = run_one(0x58000400);
        assert_eq!(dres.len, 4);
        assert_eq!(dres.next, DisCont::Continue);
        let exit = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::Exit)
            .expect("no exit");
        assert_eq!(exit.1.arg(1).get_u64(), 0x10004);
        assert_eq!(exit.1.arg(2).get_jump_kind(), JumpKind::Boring);
        // Fall-through PC write also targets pc + 4.
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10004);
    }

    #[test]
    fn test_client_request_preamble() {
        let words = [0x00450c00, 0x00453400, 0x00457400, 0x00454c00, 0x001535ad];
        let (block, dres) = run(&words, 0x10000, ArchCaps::empty(), AbiInfo::default());
        assert_eq!(dres.len, 20);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::ClientReq));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10014);
    }

    #[test]
    fn test_nraddr_preamble_falls_through() {
        let words = [0x00450c00, 0x00453400, 0x00457400, 0x00454c00, 0x001539ce];
        let (block, dres) = run(&words, 0x10000, ArchCaps::empty(), AbiInfo::default());
        assert_eq!(dres.len, 20);
        assert_eq!(dres.next, DisCont::Continue);
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .unwrap();
        assert_eq!(set.1.arg(0).get_ireg(), IReg::R11);
        // Fall-through PC write skips the whole 20-byte unit.
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10014);
    }

    #[test]
    fn test_no_decode() {
        // 0xffffffff matches nothing.
        let (block, dres) = run_one(0xffffffff);
        assert_eq!(dres.len, 0);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::NoDecode));
        // Only the paranoia PC write-back survives.
        assert_eq!(block.opcodes(), vec![Opcode::SetPc]);
        assert_eq!(block.get(crate::ir::value::InstRef(0)).arg(0).get_u64(), 0x10000);
    }

    #[test]
    fn test_decode_idempotent_modulo_block() {
        let (block1, dres1) = run_one(0x00100c41); // add.w $r1, $r2, $r3
        let (block2, dres2) = run_one(0x00100c41);
        assert_eq!(dres1.len, dres2.len);
        assert_eq!(block1.opcodes(), block2.opcodes());
        for ((_, a), (_, b)) in block1.iter().zip(block2.iter()) {
            assert_eq!(a.args, b.args);
        }
    }

    #[test]
    fn test_fp_without_capability_is_sigill() {
        // fadd.s $fa0, $fa1, $fa2
        let (block, dres) = run_one(0x01008820);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::SigIll));
        // No IR beyond the gate.
        assert!(block.is_empty());
    }

    #[test]
    fn test_syscall() {
        // syscall 0
        let (block, dres) = run_one(0x002b0000);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::SysSyscall));
        let (_, first) = block.iter().next().unwrap();
        assert_eq!(first.opcode, Opcode::SetPc);
        assert_eq!(first.arg(0).get_u64(), 0x10004);
    }

    #[test]
    fn test_break_trap_kinds() {
        // break 6 -> integer overflow; break 7 -> divide; break 0 -> trap
        let (_, d6) = run_one(0x002a0006);
        assert_eq!(d6.stop, Some(JumpKind::SigFpeIntOvf));
        let (_, d7) = run_one(0x002a0007);
        assert_eq!(d7.stop, Some(JumpKind::SigFpeIntDiv));
        let (_, d0) = run_one(0x002a0000);
        assert_eq!(d0.stop, Some(JumpKind::SigTrap));
    }

    #[test]
    fn test_b_stops_with_boring() {
        // b 8
        let (block, dres) = run_one(0x50000800);
        assert_eq!(dres.next, DisCont::StopHere);
        assert_eq!(dres.stop, Some(JumpKind::Boring));
        let (_, last) = block.iter().last().unwrap();
        assert_eq!(last.opcode, Opcode::SetPc);
        assert_eq!(last.arg(0).get_u64(), 0x10008);
    }

    #[test]
    fn test_bl_links_ra() {
        // bl 8
        let (block, dres) = run_one(0x54000800);
        assert_eq!(dres.stop, Some(JumpKind::Boring));
        let set = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::SetGpr)
            .unwrap();
        assert_eq!(set.1.arg(0).get_ireg(), IReg::R1);
        assert_eq!(set.1.arg(1), Value::ImmU64(0x10004));
    }

    #[test]
    fn test_amswap_requires_lam() {
        // amswap.w $r1, $r2, $r3
        let (block, dres) = run_one(0x38600861);
        assert_eq!(dres.stop, Some(JumpKind::SigIll));
        assert!(block.is_empty());
    }

    #[test]
    fn test_am_retry_exit_with_lam() {
        let (block, dres) = run(
            &[0x38600861],
            0x10000,
            ArchCaps::LAM,
            AbiInfo::default(),
        );
        assert_eq!(dres.next, DisCont::Continue);
        // The retry exit targets the same PC (offset 0).
        let retry = block
            .iter()
            .filter(|(_, i)| i.opcode == Opcode::Exit)
            .last()
            .unwrap();
        assert_eq!(retry.1.arg(1).get_u64(), 0x10000);
        // A CAS is present.
        assert!(block.iter().any(|(_, i)| i.opcode == Opcode::CompareAndSwap32));
    }
}
