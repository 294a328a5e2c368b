//! Floating-point arithmetic emitters.
//!
//! Every operation that can raise FP exceptions first invokes the
//! FCSR-update helper with the operation identity and the operand bit
//! patterns, then builds the IR operator; the sticky flags therefore
//! reflect this operation before its result is computed. FP values travel
//! as bit patterns, with a rounding-mode operand threaded through every
//! operation that can round.

use log::trace;

use crate::frontend::la64::insn::InsnWord;
use crate::frontend::la64::regs::FReg;
use crate::frontend::la64::translate::Translator;
use crate::frontend::la64::{ArchCaps, FpOp, Helper};

impl<'a> Translator<'a> {
    pub(crate) fn fadd_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fadd.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FAddS, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_add_32(rm, a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fadd_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fadd.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FAddD, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_add_64(rm, a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fsub_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fsub.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FSubS, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_sub_32(rm, a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fsub_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fsub.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FSubD, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_sub_64(rm, a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fmul_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmul.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMulS, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_mul_32(rm, a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmul_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmul.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMulD, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_mul_64(rm, a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fdiv_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fdiv.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FDivS, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_div_32(rm, a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fdiv_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fdiv.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FDivD, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_div_64(rm, a, b);
        self.put_fpr64(fd, res);
        true
    }

    // --- Fused multiply-add family (three sources) ---

    pub(crate) fn fmadd_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fmadd.s {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaddS, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let c = self.fpr32(fa);
        let res = self.ir.ir().fp_mul_add_32(rm, a, b, c);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmadd_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fmadd.d {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaddD, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let c = self.fpr64(fa);
        let res = self.ir.ir().fp_mul_add_64(rm, a, b, c);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fmsub_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fmsub.s {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMsubS, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let c = self.fpr32(fa);
        let res = self.ir.ir().fp_mul_sub_32(rm, a, b, c);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmsub_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fmsub.d {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMsubD, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let c = self.fpr64(fa);
        let res = self.ir.ir().fp_mul_sub_64(rm, a, b, c);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fnmadd_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fnmadd.s {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNmaddS, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let c = self.fpr32(fa);
        let madd = self.ir.ir().fp_mul_add_32(rm, a, b, c);
        let res = self.ir.ir().fp_neg_32(madd);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fnmadd_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fnmadd.d {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNmaddD, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let c = self.fpr64(fa);
        let madd = self.ir.ir().fp_mul_add_64(rm, a, b, c);
        let res = self.ir.ir().fp_neg_64(madd);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fnmsub_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fnmsub.s {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNmsubS, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let c = self.fpr32(fa);
        let msub = self.ir.ir().fp_mul_sub_32(rm, a, b, c);
        let res = self.ir.ir().fp_neg_32(msub);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fnmsub_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk, fa) = (insn.fd(), insn.fj(), insn.fk(), insn.fa());
        trace!("fnmsub.d {}, {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk), FReg::from_u32(fa));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNmsubD, &[fj, fk, fa]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let c = self.fpr64(fa);
        let msub = self.ir.ir().fp_mul_sub_64(rm, a, b, c);
        let res = self.ir.ir().fp_neg_64(msub);
        self.put_fpr64(fd, res);
        true
    }

    // --- Max/min (numeric and by magnitude) ---

    pub(crate) fn fmax_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmax.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaxS, &[fj, fk]);
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_max_num_32(a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmax_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmax.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaxD, &[fj, fk]);
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_max_num_64(a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fmin_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmin.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMinS, &[fj, fk]);
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_min_num_32(a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmin_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmin.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMinD, &[fj, fk]);
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_min_num_64(a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fmaxa_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmaxa.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaxAS, &[fj, fk]);
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_max_num_abs_32(a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmaxa_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmaxa.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMaxAD, &[fj, fk]);
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_max_num_abs_64(a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fmina_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmina.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMinAS, &[fj, fk]);
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_min_num_abs_32(a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fmina_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fmina.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FMinAD, &[fj, fk]);
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_min_num_abs_64(a, b);
        self.put_fpr64(fd, res);
        true
    }

    // --- Single-source forms ---

    pub(crate) fn fabs_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fabs.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FAbsS, &[fj]);
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_abs_32(a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fabs_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fabs.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FAbsD, &[fj]);
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_abs_64(a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fneg_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fneg.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNegS, &[fj]);
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_neg_32(a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fneg_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fneg.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FNegD, &[fj]);
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_neg_64(a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fsqrt_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fsqrt.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FSqrtS, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_sqrt_32(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fsqrt_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fsqrt.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FSqrtD, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_sqrt_64(rm, a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn frecip_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("frecip.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FRecipS, &[fj]);
        let rm = self.ir.rounding_mode();
        let one = self.ir.ir().imm32(1.0f32.to_bits());
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_div_32(rm, one, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn frecip_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("frecip.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FRecipD, &[fj]);
        let rm = self.ir.rounding_mode();
        let one = self.ir.ir().imm64(1.0f64.to_bits());
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_div_64(rm, one, a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn frsqrt_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("frsqrt.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FRsqrtS, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_rsqrt_32(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn frsqrt_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("frsqrt.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FRsqrtD, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_rsqrt_64(rm, a);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fscaleb_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fscaleb.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FScalebS, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let b = self.fpr32(fk);
        let res = self.ir.ir().fp_scaleb_32(rm, a, b);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fscaleb_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fscaleb.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FScalebD, &[fj, fk]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let b = self.fpr64(fk);
        let res = self.ir.ir().fp_scaleb_64(rm, a, b);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn flogb_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("flogb.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FLogbS, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr32(fj);
        let res = self.ir.ir().fp_logb_32(rm, a);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn flogb_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("flogb.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        self.fcsr_update(FpOp::FLogbD, &[fj]);
        let rm = self.ir.rounding_mode();
        let a = self.fpr64(fj);
        let res = self.ir.ir().fp_logb_64(rm, a);
        self.put_fpr64(fd, res);
        true
    }

    /// Copysign never raises exceptions; it is pure bit manipulation around
    /// the sign bit, done in the integer domain.
    pub(crate) fn fcopysign_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fcopysign.s {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr32(fj);
        let one = self.ir.ir().imm8(1);
        let shl1 = self.ir.ir().logical_shift_left_32(a, one);
        let body = self.ir.ir().logical_shift_right_32(shl1, one);
        let b = self.fpr32(fk);
        let thirty_one = self.ir.ir().imm8(31);
        let shr2 = self.ir.ir().logical_shift_right_32(b, thirty_one);
        let sign = self.ir.ir().logical_shift_left_32(shr2, thirty_one);
        let res = self.ir.ir().or_32(body, sign);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fcopysign_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj, fk) = (insn.fd(), insn.fj(), insn.fk());
        trace!("fcopysign.d {}, {}, {}", FReg::from_u32(fd), FReg::from_u32(fj), FReg::from_u32(fk));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.fpr64(fj);
        let one = self.ir.ir().imm8(1);
        let shl1 = self.ir.ir().logical_shift_left_64(a, one);
        let body = self.ir.ir().logical_shift_right_64(shl1, one);
        let b = self.fpr64(fk);
        let sixty_three = self.ir.ir().imm8(63);
        let shr2 = self.ir.ir().logical_shift_right_64(b, sixty_three);
        let sign = self.ir.ir().logical_shift_left_64(shr2, sixty_three);
        let res = self.ir.ir().or_64(body, sign);
        self.put_fpr64(fd, res);
        true
    }

    pub(crate) fn fclass_s(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fclass.s {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.ir.get_fpr64(FReg::from_u32(fj));
        let call = self.ir.ir().call_pure(Helper::FClassS, &[a]);
        let res = self.ir.ir().least_significant_word(call);
        self.put_fpr32(fd, res);
        true
    }

    pub(crate) fn fclass_d(&mut self, insn: InsnWord) -> bool {
        let (fd, fj) = (insn.fd(), insn.fj());
        trace!("fclass.d {}, {}", FReg::from_u32(fd), FReg::from_u32(fj));

        if self.missing_cap(ArchCaps::FP) {
            return true;
        }
        let a = self.ir.get_fpr64(FReg::from_u32(fj));
        let call = self.ir.ir().call_pure(Helper::FClassD, &[a]);
        self.put_fpr64(fd, call);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::frontend::la64::{decode, AbiInfo, ArchCaps, Endness, GuestArch, Helper};
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
            ArchCaps::FP,
            AbiInfo::default(),
            Endness::Little,
            false,
        );
        assert_eq!(dres.len, 4, "word {:#010x} did not decode", word);
        block
    }

    #[test]
    fn test_fadd_s_updates_fcsr_before_operation() {
        // fadd.s $fa0, $fa1, $fa2
        let block = block_for(0x01008820);
        let ops = block.opcodes();
        let call = ops.iter().position(|o| *o == Opcode::CallPure).unwrap();
        let add = ops.iter().position(|o| *o == Opcode::FPAdd32).unwrap();
        let fcsr_write = ops.iter().position(|o| *o == Opcode::SetFcsrRaw).unwrap();
        assert!(call < fcsr_write && fcsr_write < add);
        // Helper identity and operand count.
        let (_, inst) = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert_eq!(inst.arg(0).get_helper(), Helper::FcsrUpdate);
    }

    #[test]
    fn test_fmadd_d_three_sources() {
        // fmadd.d $fa0, $fa1, $fa2, $fa3
        let block = block_for(0x08218820);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::FPMulAdd64));
        // Three operand reads feed the FCSR helper.
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert!(call.1.arg(2).is_inst());
        assert!(call.1.arg(3).is_inst());
        assert!(call.1.arg(4).is_inst());
    }

    #[test]
    fn test_fnmadd_s_negates() {
        // fnmadd.s $fa0, $fa1, $fa2, $fa3
        let ops = block_for(0x08918820).opcodes();
        assert!(ops.contains(&Opcode::FPMulAdd32));
        assert!(ops.contains(&Opcode::FPNeg32));
    }

    #[test]
    fn test_fcopysign_s_is_integer_bit_play() {
        // fcopysign.s $fa0, $fa1, $fa2
        let ops = block_for(0x01128820).opcodes();
        // No FCSR helper call and no FP operator, just shifts and an or.
        assert!(!ops.contains(&Opcode::CallPure));
        assert!(ops.contains(&Opcode::LogicalShiftLeft32));
        assert!(ops.contains(&Opcode::LogicalShiftRight32));
        assert!(ops.contains(&Opcode::Or32));
    }

    #[test]
    fn test_frecip_d_divides_one() {
        // frecip.d $fa0, $fa1
        let block = block_for(0x01145820);
        let div = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::FPDiv64)
            .unwrap();
        // Numerator is the bit pattern of 1.0.
        assert_eq!(div.1.arg(1).get_u64(), 1.0f64.to_bits());
    }

    #[test]
    fn test_fclass_d_helper() {
        // fclass.d $fa0, $fa1
        let block = block_for(0x01143820);
        let call = block
            .iter()
            .find(|(_, i)| i.opcode == Opcode::CallPure)
            .unwrap();
        assert_eq!(call.1.arg(0).get_helper(), Helper::FClassD);
    }

    #[test]
    fn test_fmax_s_has_no_rounding_operand() {
        // fmax.s $fa0, $fa1, $fa2: max never rounds, so no dynamic
        // rounding-mode read beyond the FCSR update itself.
        let block = block_for(0x01088820);
        let ops = block.opcodes();
        assert!(ops.contains(&Opcode::FPMaxNum32));
        assert!(!ops.contains(&Opcode::Xor32));
    }
}
