//! LoongArch64 frontend: decode context, capability/ABI records, and the
//! per-instruction translator.

pub mod insn;
pub mod regs;
pub mod translate;

use bitflags::bitflags;

pub use translate::decode;

bitflags! {
    /// Optional features of the guest CPU the translation targets.
    ///
    /// An instruction that requires a capability the target does not
    /// advertise translates to a single SigILL exit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ArchCaps: u32 {
        /// Floating-point unit present.
        const FP = 1 << 0;
        /// Unaligned accesses allowed (suppresses alignment-trap checks).
        const UAL = 1 << 1;
        /// LoongArch Atomic Memory extension (am* instructions).
        const LAM = 1 << 2;
        /// The cpucfg instruction is available.
        const CPUCFG = 1 << 3;
    }
}

/// ABI details the decoder needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiInfo {
    /// Implement ll/sc on top of CAS and guest shadow state instead of the
    /// IR's native load-linked/store-conditional statements.
    pub use_fallback_llsc: bool,
}

/// Host endianness. Instruction words are fetched little-endian regardless;
/// guest-state sub-register reads are expressed through full-slot reads, so
/// the decoder itself is endianness-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endness {
    Little,
    Big,
}

/// Guest architecture tag handed to the entry point. Anything other than
/// LoongArch64 is a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestArch {
    LoongArch64,
}

/// Why a translation stops, or which signal/service the emitted IR requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// Ordinary control transfer.
    Boring,
    /// System call request.
    SysSyscall,
    /// Misaligned access signal.
    SigBus,
    /// Bound-check failure signal.
    SigSys,
    /// Missing-capability / illegal instruction signal.
    SigIll,
    /// Generic trap.
    SigTrap,
    /// Integer overflow trap (break 6).
    SigFpeIntOvf,
    /// Integer divide trap (break 7).
    SigFpeIntDiv,
    /// Instrumentation client request.
    ClientReq,
    /// Call with no translation redirection.
    NoRedir,
    /// Compiled-code cache invalidation request.
    InvalICache,
    /// The instruction word did not decode.
    NoDecode,
}

/// Whether the enclosing translation loop continues after this instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisCont {
    Continue,
    StopHere,
}

/// Reserved advisory for the enclosing translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisHint {
    #[default]
    None,
}

/// The per-instruction translation result.
#[derive(Debug, Clone, Copy)]
pub struct DisResult {
    /// Bytes consumed: 4 for ordinary instructions, 20 for the special
    /// preamble, 0 when decode failed.
    pub len: u32,
    /// Continue to the fall-through address or stop here.
    pub next: DisCont,
    /// Stop reason; only meaningful when `next` is StopHere.
    pub stop: Option<JumpKind>,
    /// Reserved advisory.
    pub hint: DisHint,
}

impl Default for DisResult {
    fn default() -> Self {
        Self {
            len: 4,
            next: DisCont::Continue,
            stop: None,
            hint: DisHint::None,
        }
    }
}

/// Named guest-state fields beyond the register files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuestField {
    /// LL/SC fallback: transaction size in bytes (0 = none in progress).
    LlscSize,
    /// LL/SC fallback: transaction address.
    LlscAddr,
    /// LL/SC fallback: value loaded.
    LlscData,
    /// Next-redirect address for the client-request protocol.
    Nraddr,
    /// Start PC of the range to flush from the compiled-code cache.
    CmStart,
    /// Byte length of the range to flush.
    CmLen,
}

/// External pure helpers the emitted IR may call. The framework supplies the
/// implementations; the decoder only records the identity and the evaluated
/// inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    RevB2H,
    RevB4H,
    RevB2W,
    RevBD,
    RevH2W,
    RevHD,
    BitRev4B,
    BitRev8B,
    BitRevW,
    BitRevD,
    Crc,
    Crcc,
    CpuCfg,
    FClassS,
    FClassD,
    /// Recompute the FCSR cause+flags sub-word for an FP operation.
    FcsrUpdate,
}

/// Identity of an FP operation, passed to the FCSR-update helper so it can
/// reproduce the operation's exception behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum FpOp {
    FAddS,
    FAddD,
    FSubS,
    FSubD,
    FMulS,
    FMulD,
    FDivS,
    FDivD,
    FMaddS,
    FMaddD,
    FMsubS,
    FMsubD,
    FNmaddS,
    FNmaddD,
    FNmsubS,
    FNmsubD,
    FMaxS,
    FMaxD,
    FMinS,
    FMinD,
    FMaxAS,
    FMaxAD,
    FMinAS,
    FMinAD,
    FAbsS,
    FAbsD,
    FNegS,
    FNegD,
    FSqrtS,
    FSqrtD,
    FRecipS,
    FRecipD,
    FRsqrtS,
    FRsqrtD,
    FScalebS,
    FScalebD,
    FLogbS,
    FLogbD,
    FCmpCafS,
    FCmpCafD,
    FCmpSafS,
    FCmpSafD,
    FCmpCltS,
    FCmpCltD,
    FCmpSltS,
    FCmpSltD,
    FCmpCeqS,
    FCmpCeqD,
    FCmpSeqS,
    FCmpSeqD,
    FCmpCleS,
    FCmpCleD,
    FCmpSleS,
    FCmpSleD,
    FCmpCunS,
    FCmpCunD,
    FCmpSunS,
    FCmpSunD,
    FCmpCultS,
    FCmpCultD,
    FCmpSultS,
    FCmpSultD,
    FCmpCueqS,
    FCmpCueqD,
    FCmpSueqS,
    FCmpSueqD,
    FCmpCuleS,
    FCmpCuleD,
    FCmpSuleS,
    FCmpSuleD,
    FCmpCneS,
    FCmpCneD,
    FCmpSneS,
    FCmpSneD,
    FCmpCorS,
    FCmpCorD,
    FCmpSorS,
    FCmpSorD,
    FCmpCuneS,
    FCmpCuneD,
    FCmpSuneS,
    FCmpSuneD,
    FCvtSD,
    FCvtDS,
    FTintRmWS,
    FTintRmWD,
    FTintRmLS,
    FTintRmLD,
    FTintRpWS,
    FTintRpWD,
    FTintRpLS,
    FTintRpLD,
    FTintRzWS,
    FTintRzWD,
    FTintRzLS,
    FTintRzLD,
    FTintRneWS,
    FTintRneWD,
    FTintRneLS,
    FTintRneLD,
    FTintWS,
    FTintWD,
    FTintLS,
    FTintLD,
    FFintSW,
    FFintSL,
    FFintDW,
    FFintDL,
    FRintS,
    FRintD,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_caps_bitflags() {
        let caps = ArchCaps::FP | ArchCaps::LAM;
        assert!(caps.contains(ArchCaps::FP));
        assert!(caps.contains(ArchCaps::LAM));
        assert!(!caps.contains(ArchCaps::UAL));
    }

    #[test]
    fn test_dis_result_defaults() {
        let dres = DisResult::default();
        assert_eq!(dres.len, 4);
        assert_eq!(dres.next, DisCont::Continue);
        assert_eq!(dres.stop, None);
    }
}
