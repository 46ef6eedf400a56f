//! ARM detail types: registers, condition codes, shifts, system registers,
//! detail operands and the per-instruction ARM detail record.
//!
//! Register numbers produced by the raw decoder are the same numbers as the
//! public [`ArmReg`] ids, so no translation step sits between the two.
//!
//! ```text
//!   0        invalid
//!   1..=13   status / special registers (apsr .. spsr)
//!   14..=45  d0 .. d31
//!   46..=49  fpinst2, mvfr0 .. mvfr2
//!   50..=65  q0 .. q15
//!   66..=78  r0 .. r12
//!   79..=110 s0 .. s31
//!   111      vpr
//! ```

use core::fmt;

use crate::detail::Access;
use crate::ir::{FixedList, Syntax};

// ── Registers ────────────────────────────────────────────────────────────

/// ARM register id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmReg(pub u16);

impl ArmReg {
    pub const INVALID: ArmReg = ArmReg(0);
    pub const APSR: ArmReg = ArmReg(1);
    pub const APSR_NZCV: ArmReg = ArmReg(2);
    pub const CPSR: ArmReg = ArmReg(3);
    pub const FPEXC: ArmReg = ArmReg(4);
    pub const FPINST: ArmReg = ArmReg(5);
    pub const FPSCR: ArmReg = ArmReg(6);
    pub const FPSCR_NZCV: ArmReg = ArmReg(7);
    pub const FPSID: ArmReg = ArmReg(8);
    pub const ITSTATE: ArmReg = ArmReg(9);
    pub const LR: ArmReg = ArmReg(10);
    pub const PC: ArmReg = ArmReg(11);
    pub const SP: ArmReg = ArmReg(12);
    pub const SPSR: ArmReg = ArmReg(13);
    pub const D0: ArmReg = ArmReg(14);
    pub const D31: ArmReg = ArmReg(45);
    pub const FPINST2: ArmReg = ArmReg(46);
    pub const MVFR0: ArmReg = ArmReg(47);
    pub const MVFR1: ArmReg = ArmReg(48);
    pub const MVFR2: ArmReg = ArmReg(49);
    pub const Q0: ArmReg = ArmReg(50);
    pub const Q15: ArmReg = ArmReg(65);
    pub const R0: ArmReg = ArmReg(66);
    pub const R12: ArmReg = ArmReg(78);
    pub const S0: ArmReg = ArmReg(79);
    pub const S31: ArmReg = ArmReg(110);
    pub const VPR: ArmReg = ArmReg(111);
    /// One past the last register id.
    pub const ENDING: ArmReg = ArmReg(112);

    /// General purpose register `r{n}`. `r13..=r15` map to `sp`, `lr`, `pc`.
    ///
    /// # Panics
    /// Panics if `n > 15`.
    pub const fn r(n: u16) -> ArmReg {
        match n {
            0..=12 => ArmReg(Self::R0.0 + n),
            13 => Self::SP,
            14 => Self::LR,
            15 => Self::PC,
            _ => panic!("general purpose register out of range"),
        }
    }

    /// Double-precision register `d{n}`.
    pub const fn d(n: u16) -> ArmReg {
        assert!(n < 32, "d register out of range");
        ArmReg(Self::D0.0 + n)
    }

    /// Quad register `q{n}`.
    pub const fn q(n: u16) -> ArmReg {
        assert!(n < 16, "q register out of range");
        ArmReg(Self::Q0.0 + n)
    }

    /// Single-precision register `s{n}`.
    pub const fn s(n: u16) -> ArmReg {
        assert!(n < 32, "s register out of range");
        ArmReg(Self::S0.0 + n)
    }

    /// Raw id.
    #[inline]
    pub const fn id(self) -> u16 {
        self.0
    }

    /// `true` for `q0..=q15`.
    #[inline]
    pub const fn is_quad(self) -> bool {
        self.0 >= Self::Q0.0 && self.0 <= Self::Q15.0
    }

    /// Register name in the requested syntax, `None` for invalid ids.
    pub fn name(self, syntax: Syntax) -> Option<&'static str> {
        if syntax == Syntax::NoRegName {
            match self {
                Self::SP => return Some("r13"),
                Self::LR => return Some("r14"),
                Self::PC => return Some("r15"),
                _ => {}
            }
        }
        match REG_NAMES.get(self.0 as usize) {
            Some(&"") | None => None,
            Some(name) => Some(*name),
        }
    }
}

impl fmt::Display for ArmReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name(Syntax::Default) {
            Some(name) => f.write_str(name),
            None => write!(f, "reg{}", self.0),
        }
    }
}

static REG_NAMES: [&str; ArmReg::ENDING.0 as usize] = [
    "",
    "apsr", "apsr_nzcv", "cpsr", "fpexc", "fpinst", "fpscr", "fpscr_nzcv", "fpsid",
    "itstate", "lr", "pc", "sp", "spsr",
    "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7",
    "d8", "d9", "d10", "d11", "d12", "d13", "d14", "d15",
    "d16", "d17", "d18", "d19", "d20", "d21", "d22", "d23",
    "d24", "d25", "d26", "d27", "d28", "d29", "d30", "d31",
    "fpinst2", "mvfr0", "mvfr1", "mvfr2",
    "q0", "q1", "q2", "q3", "q4", "q5", "q6", "q7",
    "q8", "q9", "q10", "q11", "q12", "q13", "q14", "q15",
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7",
    "r8", "r9", "r10", "r11", "r12",
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7",
    "s8", "s9", "s10", "s11", "s12", "s13", "s14", "s15",
    "s16", "s17", "s18", "s19", "s20", "s21", "s22", "s23",
    "s24", "s25", "s26", "s27", "s28", "s29", "s30", "s31",
    "vpr",
];

// ── Condition codes ──────────────────────────────────────────────────────

/// Condition code stored in the detail record.
///
/// The value is the 4-bit encoding plus one, so that zero can mean
/// "no condition".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArmCc {
    #[default]
    Invalid = 0,
    Eq = 1,
    Ne = 2,
    Hs = 3,
    Lo = 4,
    Mi = 5,
    Pl = 6,
    Vs = 7,
    Vc = 8,
    Hi = 9,
    Ls = 10,
    Ge = 11,
    Lt = 12,
    Gt = 13,
    Le = 14,
    Al = 15,
}

impl ArmCc {
    /// Converts a 4-bit encoded condition (`0 = eq` .. `14 = al`).
    pub fn from_encoding(code: u8) -> Option<ArmCc> {
        use ArmCc::*;
        Some(match code {
            0 => Eq,
            1 => Ne,
            2 => Hs,
            3 => Lo,
            4 => Mi,
            5 => Pl,
            6 => Vs,
            7 => Vc,
            8 => Hi,
            9 => Ls,
            10 => Ge,
            11 => Lt,
            12 => Gt,
            13 => Le,
            14 => Al,
            _ => return None,
        })
    }

    /// The 4-bit encoding, `None` for [`ArmCc::Invalid`].
    pub fn encoding(self) -> Option<u8> {
        (self as u8).checked_sub(1)
    }

    /// Assembler suffix (`"eq"`, `"ne"`, ...). Empty for `al` and invalid.
    pub fn suffix(self) -> &'static str {
        use ArmCc::*;
        match self {
            Invalid | Al => "",
            Eq => "eq",
            Ne => "ne",
            Hs => "hs",
            Lo => "lo",
            Mi => "mi",
            Pl => "pl",
            Vs => "vs",
            Vc => "vc",
            Hi => "hi",
            Ls => "ls",
            Ge => "ge",
            Lt => "lt",
            Gt => "gt",
            Le => "le",
        }
    }
}

/// MVE vector predication code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArmVcc {
    #[default]
    None = 0,
    Then = 1,
    Else = 2,
}

impl ArmVcc {
    pub fn from_raw(raw: i64) -> Option<ArmVcc> {
        match raw {
            0 => Some(ArmVcc::None),
            1 => Some(ArmVcc::Then),
            2 => Some(ArmVcc::Else),
            _ => None,
        }
    }
}

// ── Shifts ───────────────────────────────────────────────────────────────

/// Shift applied to a register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArmShifter {
    #[default]
    Invalid = 0,
    Asr = 1,
    Lsl = 2,
    Lsr = 3,
    Ror = 4,
    Rrx = 5,
    AsrReg = 6,
    LslReg = 7,
    LsrReg = 8,
    RorReg = 9,
    RrxReg = 10,
}

impl ArmShifter {
    /// Maps the decoder's shift opcode (`0 = none, 1 = asr, 2 = lsl,
    /// 3 = lsr, 4 = ror, 5 = rrx`).
    pub fn from_shift_opc(opc: u8) -> Option<ArmShifter> {
        match opc {
            0 => Some(ArmShifter::Invalid),
            1 => Some(ArmShifter::Asr),
            2 => Some(ArmShifter::Lsl),
            3 => Some(ArmShifter::Lsr),
            4 => Some(ArmShifter::Ror),
            5 => Some(ArmShifter::Rrx),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ArmShifter::Invalid => "invalid",
            ArmShifter::Asr | ArmShifter::AsrReg => "asr",
            ArmShifter::Lsl | ArmShifter::LslReg => "lsl",
            ArmShifter::Lsr | ArmShifter::LsrReg => "lsr",
            ArmShifter::Ror | ArmShifter::RorReg => "ror",
            ArmShifter::Rrx | ArmShifter::RrxReg => "rrx",
        }
    }
}

/// Shift kind plus amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmShift {
    pub kind: ArmShifter,
    pub value: u32,
}

/// Immediate shift amount as encoded: an encoded 0 means 32.
#[inline]
pub fn translate_shift_imm(imm: u32) -> u32 {
    if imm == 0 {
        32
    } else {
        imm
    }
}

// ── System registers ─────────────────────────────────────────────────────

/// ARM system register id.
///
/// The `SPSR_*` / `CPSR_*` field values are single bits and may be OR-ed
/// together; every value from [`ArmSysreg::APSR`] upwards names one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmSysreg(pub u16);

impl ArmSysreg {
    pub const INVALID: ArmSysreg = ArmSysreg(0);

    pub const SPSR_C: ArmSysreg = ArmSysreg(1);
    pub const SPSR_X: ArmSysreg = ArmSysreg(2);
    pub const SPSR_S: ArmSysreg = ArmSysreg(4);
    pub const SPSR_F: ArmSysreg = ArmSysreg(8);

    pub const CPSR_C: ArmSysreg = ArmSysreg(16);
    pub const CPSR_X: ArmSysreg = ArmSysreg(32);
    pub const CPSR_S: ArmSysreg = ArmSysreg(64);
    pub const CPSR_F: ArmSysreg = ArmSysreg(128);

    pub const APSR: ArmSysreg = ArmSysreg(256);
    pub const APSR_G: ArmSysreg = ArmSysreg(257);
    pub const APSR_NZCVQ: ArmSysreg = ArmSysreg(258);
    pub const APSR_NZCVQG: ArmSysreg = ArmSysreg(259);
    pub const IAPSR: ArmSysreg = ArmSysreg(260);
    pub const IAPSR_G: ArmSysreg = ArmSysreg(261);
    pub const IAPSR_NZCVQG: ArmSysreg = ArmSysreg(262);
    pub const IAPSR_NZCVQ: ArmSysreg = ArmSysreg(263);
    pub const EAPSR: ArmSysreg = ArmSysreg(264);
    pub const EAPSR_G: ArmSysreg = ArmSysreg(265);
    pub const EAPSR_NZCVQG: ArmSysreg = ArmSysreg(266);
    pub const EAPSR_NZCVQ: ArmSysreg = ArmSysreg(267);
    pub const XPSR: ArmSysreg = ArmSysreg(268);
    pub const XPSR_G: ArmSysreg = ArmSysreg(269);
    pub const XPSR_NZCVQG: ArmSysreg = ArmSysreg(270);
    pub const XPSR_NZCVQ: ArmSysreg = ArmSysreg(271);
    pub const IPSR: ArmSysreg = ArmSysreg(272);
    pub const EPSR: ArmSysreg = ArmSysreg(273);
    pub const IEPSR: ArmSysreg = ArmSysreg(274);
    pub const MSP: ArmSysreg = ArmSysreg(275);
    pub const PSP: ArmSysreg = ArmSysreg(276);
    pub const PRIMASK: ArmSysreg = ArmSysreg(277);
    pub const BASEPRI: ArmSysreg = ArmSysreg(278);
    pub const BASEPRI_MAX: ArmSysreg = ArmSysreg(279);
    pub const FAULTMASK: ArmSysreg = ArmSysreg(280);
    pub const CONTROL: ArmSysreg = ArmSysreg(281);
    pub const MSPLIM: ArmSysreg = ArmSysreg(282);
    pub const PSPLIM: ArmSysreg = ArmSysreg(283);
    pub const MSP_NS: ArmSysreg = ArmSysreg(284);
    pub const PSP_NS: ArmSysreg = ArmSysreg(285);
    pub const MSPLIM_NS: ArmSysreg = ArmSysreg(286);
    pub const PSPLIM_NS: ArmSysreg = ArmSysreg(287);
    pub const PRIMASK_NS: ArmSysreg = ArmSysreg(288);
    pub const BASEPRI_NS: ArmSysreg = ArmSysreg(289);
    pub const FAULTMASK_NS: ArmSysreg = ArmSysreg(290);
    pub const CONTROL_NS: ArmSysreg = ArmSysreg(291);
    pub const SP_NS: ArmSysreg = ArmSysreg(292);

    /// Register name, `None` for invalid ids and for mixed SPSR/CPSR fields.
    pub fn name(self) -> Option<&'static str> {
        let v = self.0;
        if v == 0 {
            return None;
        }
        if v < 16 {
            return Some(SPSR_FIELD_NAMES[v as usize]);
        }
        if v < 256 {
            if v & 0xf != 0 {
                return None;
            }
            return Some(CPSR_FIELD_NAMES[(v >> 4) as usize]);
        }
        NAMED_SYSREGS.get((v - 256) as usize).copied()
    }
}

impl fmt::Display for ArmSysreg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "sysreg{}", self.0),
        }
    }
}

// Field letters are printed in f, s, x, c order.
static SPSR_FIELD_NAMES: [&str; 16] = [
    "", "spsr_c", "spsr_x", "spsr_xc", "spsr_s", "spsr_sc", "spsr_sx", "spsr_sxc", "spsr_f",
    "spsr_fc", "spsr_fx", "spsr_fxc", "spsr_fs", "spsr_fsc", "spsr_fsx", "spsr_fsxc",
];

static CPSR_FIELD_NAMES: [&str; 16] = [
    "", "cpsr_c", "cpsr_x", "cpsr_xc", "cpsr_s", "cpsr_sc", "cpsr_sx", "cpsr_sxc", "cpsr_f",
    "cpsr_fc", "cpsr_fx", "cpsr_fxc", "cpsr_fs", "cpsr_fsc", "cpsr_fsx", "cpsr_fsxc",
];

static NAMED_SYSREGS: [&str; 37] = [
    "apsr", "apsr_g", "apsr_nzcvq", "apsr_nzcvqg",
    "iapsr", "iapsr_g", "iapsr_nzcvqg", "iapsr_nzcvq",
    "eapsr", "eapsr_g", "eapsr_nzcvqg", "eapsr_nzcvq",
    "xpsr", "xpsr_g", "xpsr_nzcvqg", "xpsr_nzcvq",
    "ipsr", "epsr", "iepsr", "msp", "psp", "primask", "basepri", "basepri_max",
    "faultmask", "control", "msplim", "psplim",
    "msp_ns", "psp_ns", "msplim_ns", "psplim_ns", "primask_ns", "basepri_ns",
    "faultmask_ns", "control_ns", "sp_ns",
];

// ── Detail operands ──────────────────────────────────────────────────────

/// Memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmMem {
    pub base: ArmReg,
    pub index: ArmReg,
    /// Index scale, `1` unless the addressing mode says otherwise.
    pub scale: i32,
    pub disp: i32,
    /// Left shift applied to the index register.
    pub lshift: i32,
}

impl Default for ArmMem {
    fn default() -> Self {
        Self {
            base: ArmReg::INVALID,
            index: ArmReg::INVALID,
            scale: 1,
            disp: 0,
            lshift: 0,
        }
    }
}

/// Payload of a detail operand. Exactly one kind per operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArmOpValue {
    #[default]
    Invalid,
    Reg(ArmReg),
    Imm(i64),
    /// Coprocessor number (`p0..p15`).
    Pimm(i64),
    /// Coprocessor register (`c0..c15`).
    Cimm(i64),
    /// Predicate carried as an explicit operand.
    Pred(i64),
    Mem(ArmMem),
    Sysreg(ArmSysreg),
}

/// One classified ARM operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmOp {
    pub value: ArmOpValue,
    pub access: Access,
    pub shift: ArmShift,
    /// `-1` unless the operand is a vector element.
    pub vector_index: i32,
    /// `-1` unless the operand names a single NEON lane.
    pub neon_lane: i8,
    /// The offset is subtracted from the base.
    pub subtracted: bool,
}

impl ArmOp {
    /// A blank operand with the "no lane / no index" sentinels.
    pub const EMPTY: ArmOp = ArmOp {
        value: ArmOpValue::Invalid,
        access: Access::empty(),
        shift: ArmShift {
            kind: ArmShifter::Invalid,
            value: 0,
        },
        vector_index: -1,
        neon_lane: -1,
        subtracted: false,
    };

    pub fn reg(reg: ArmReg, access: Access) -> Self {
        Self {
            value: ArmOpValue::Reg(reg),
            access,
            ..Self::EMPTY
        }
    }

    pub fn imm(imm: i64, access: Access) -> Self {
        Self {
            value: ArmOpValue::Imm(imm),
            access,
            ..Self::EMPTY
        }
    }

    pub fn mem(mem: ArmMem, access: Access) -> Self {
        Self {
            value: ArmOpValue::Mem(mem),
            access,
            ..Self::EMPTY
        }
    }

    pub fn sysreg(reg: ArmSysreg) -> Self {
        Self {
            value: ArmOpValue::Sysreg(reg),
            ..Self::EMPTY
        }
    }

    /// The register, when the operand is a register.
    pub fn as_reg(&self) -> Option<ArmReg> {
        match self.value {
            ArmOpValue::Reg(r) => Some(r),
            _ => None,
        }
    }

    /// The memory reference, when the operand is one.
    pub fn as_mem(&self) -> Option<&ArmMem> {
        match &self.value {
            ArmOpValue::Mem(m) => Some(m),
            _ => None,
        }
    }
}

impl Default for ArmOp {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Maximum number of detail operands per instruction.
pub const MAX_ARM_OPERANDS: usize = 36;

/// ARM-specific part of a detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmDetail {
    pub cc: ArmCc,
    pub vcc: ArmVcc,
    pub update_flags: bool,
    pub writeback: bool,
    /// IT block layout (see [`crate::arm_builder`]), `0` outside `it`.
    pub pred_mask: u8,
    pub operands: FixedList<ArmOp, MAX_ARM_OPERANDS>,
}

impl ArmDetail {
    pub fn new() -> Self {
        Self {
            cc: ArmCc::Invalid,
            vcc: ArmVcc::None,
            update_flags: false,
            writeback: false,
            pred_mask: 0,
            operands: FixedList::filled(ArmOp::EMPTY),
        }
    }

    /// Number of classified operands.
    #[inline]
    pub fn op_count(&self) -> usize {
        self.operands.len()
    }
}

impl Default for ArmDetail {
    fn default() -> Self {
        Self::new()
    }
}

// ── Instructions ─────────────────────────────────────────────────────────

/// Public ARM instruction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum ArmInsn {
    #[default]
    Invalid = 0,
    Add,
    B,
    Bfi,
    Bl,
    Blx,
    Bx,
    Cbnz,
    Cbz,
    Cdp,
    Cmn,
    Csel,
    It,
    Ldm,
    Ldr,
    Ldrex,
    Ldrh,
    Mov,
    Msr,
    Pld,
    Pop,
    Push,
    Str,
    Svc,
    Tbb,
    Vadd,
    Vld1,
    Vld2,
    Vst1,
    Ending,
}

impl ArmInsn {
    const ALL: [ArmInsn; 29] = [
        ArmInsn::Invalid,
        ArmInsn::Add,
        ArmInsn::B,
        ArmInsn::Bfi,
        ArmInsn::Bl,
        ArmInsn::Blx,
        ArmInsn::Bx,
        ArmInsn::Cbnz,
        ArmInsn::Cbz,
        ArmInsn::Cdp,
        ArmInsn::Cmn,
        ArmInsn::Csel,
        ArmInsn::It,
        ArmInsn::Ldm,
        ArmInsn::Ldr,
        ArmInsn::Ldrex,
        ArmInsn::Ldrh,
        ArmInsn::Mov,
        ArmInsn::Msr,
        ArmInsn::Pld,
        ArmInsn::Pop,
        ArmInsn::Push,
        ArmInsn::Str,
        ArmInsn::Svc,
        ArmInsn::Tbb,
        ArmInsn::Vadd,
        ArmInsn::Vld1,
        ArmInsn::Vld2,
        ArmInsn::Vst1,
    ];

    /// Looks up a public id.
    pub fn from_id(id: u16) -> Option<ArmInsn> {
        Self::ALL.get(id as usize).copied()
    }

    /// Mnemonic, `None` for [`ArmInsn::Invalid`] and [`ArmInsn::Ending`].
    pub fn name(self) -> Option<&'static str> {
        use ArmInsn::*;
        Some(match self {
            Invalid | Ending => return None,
            Add => "add",
            B => "b",
            Bfi => "bfi",
            Bl => "bl",
            Blx => "blx",
            Bx => "bx",
            Cbnz => "cbnz",
            Cbz => "cbz",
            Cdp => "cdp",
            Cmn => "cmn",
            Csel => "csel",
            It => "it",
            Ldm => "ldm",
            Ldr => "ldr",
            Ldrex => "ldrex",
            Ldrh => "ldrh",
            Mov => "mov",
            Msr => "msr",
            Pld => "pld",
            Pop => "pop",
            Push => "push",
            Str => "str",
            Svc => "svc",
            Tbb => "tbb",
            Vadd => "vadd",
            Vld1 => "vld1",
            Vld2 => "vld2",
            Vst1 => "vst1",
        })
    }
}

impl fmt::Display for ArmInsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Zero-allocation: write Debug chars lowercased directly to the formatter.
        use fmt::Write as _;
        struct LowerWriter<'a, 'b>(&'a mut fmt::Formatter<'b>);
        impl fmt::Write for LowerWriter<'_, '_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                for c in s.chars() {
                    self.0.write_char(c.to_ascii_lowercase())?;
                }
                Ok(())
            }
        }
        write!(LowerWriter(f), "{:?}", self)
    }
}

// ── Groups ───────────────────────────────────────────────────────────────

/// ARM instruction group. Values below 128 are generic groups shared with
/// other architectures; the rest are ARM feature predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArmGroup {
    Invalid = 0,
    Jump = 1,
    Call = 2,
    Int = 4,
    Privilege = 6,
    BranchRelative = 7,
    IsArm = 128,
    IsThumb,
    IsThumb2,
    IsMClass,
    IsNotMClass,
    HasV5T,
    HasV6,
    HasV7,
    HasV8,
    HasV8MBaseline,
    HasDsp,
    HasNeon,
    HasVfp2,
    HasVfp3,
    HasFpRegs,
    HasMveInt,
    HasDb,
    HasMp,
    HasCrc,
}

impl ArmGroup {
    const FEATURE_GROUPS: [ArmGroup; 19] = [
        ArmGroup::IsArm,
        ArmGroup::IsThumb,
        ArmGroup::IsThumb2,
        ArmGroup::IsMClass,
        ArmGroup::IsNotMClass,
        ArmGroup::HasV5T,
        ArmGroup::HasV6,
        ArmGroup::HasV7,
        ArmGroup::HasV8,
        ArmGroup::HasV8MBaseline,
        ArmGroup::HasDsp,
        ArmGroup::HasNeon,
        ArmGroup::HasVfp2,
        ArmGroup::HasVfp3,
        ArmGroup::HasFpRegs,
        ArmGroup::HasMveInt,
        ArmGroup::HasDb,
        ArmGroup::HasMp,
        ArmGroup::HasCrc,
    ];

    pub fn from_id(id: u8) -> Option<ArmGroup> {
        match id {
            1 => Some(ArmGroup::Jump),
            2 => Some(ArmGroup::Call),
            4 => Some(ArmGroup::Int),
            6 => Some(ArmGroup::Privilege),
            7 => Some(ArmGroup::BranchRelative),
            128..=255 => Self::FEATURE_GROUPS.get((id - 128) as usize).copied(),
            _ => None,
        }
    }

    pub fn name(self) -> Option<&'static str> {
        use ArmGroup::*;
        Some(match self {
            Invalid => return None,
            Jump => "jump",
            Call => "call",
            Int => "int",
            Privilege => "privilege",
            BranchRelative => "branch_relative",
            IsArm => "IsARM",
            IsThumb => "IsThumb",
            IsThumb2 => "IsThumb2",
            IsMClass => "IsMClass",
            IsNotMClass => "IsNotMClass",
            HasV5T => "HasV5T",
            HasV6 => "HasV6",
            HasV7 => "HasV7",
            HasV8 => "HasV8",
            HasV8MBaseline => "HasV8MBaseline",
            HasDsp => "HasDSP",
            HasNeon => "HasNEON",
            HasVfp2 => "HasVFP2",
            HasVfp3 => "HasVFP3",
            HasFpRegs => "HasFPRegs",
            HasMveInt => "HasMVEInt",
            HasDb => "HasDB",
            HasMp => "HasMP",
            HasCrc => "HasCRC",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn reg_names_cover_every_bank() {
        assert_eq!(ArmReg::r(0).name(Syntax::Default), Some("r0"));
        assert_eq!(ArmReg::R12.name(Syntax::Default), Some("r12"));
        assert_eq!(ArmReg::d(31).name(Syntax::Default), Some("d31"));
        assert_eq!(ArmReg::q(7).name(Syntax::Default), Some("q7"));
        assert_eq!(ArmReg::s(31), ArmReg::S31);
        assert_eq!(ArmReg::S31.name(Syntax::Default), Some("s31"));
        assert_eq!(ArmReg::VPR.name(Syntax::Default), Some("vpr"));
        assert_eq!(ArmReg::INVALID.name(Syntax::Default), None);
        assert_eq!(ArmReg::ENDING.name(Syntax::Default), None);
    }

    #[test]
    fn noregname_prints_numeric_specials() {
        assert_eq!(ArmReg::r(13), ArmReg::SP);
        assert_eq!(ArmReg::SP.name(Syntax::Default), Some("sp"));
        assert_eq!(ArmReg::SP.name(Syntax::NoRegName), Some("r13"));
        assert_eq!(ArmReg::LR.name(Syntax::NoRegName), Some("r14"));
        assert_eq!(ArmReg::PC.name(Syntax::NoRegName), Some("r15"));
        assert_eq!(ArmReg::r(4).name(Syntax::NoRegName), Some("r4"));
    }

    #[test]
    fn cc_encoding_is_offset_by_one() {
        assert_eq!(ArmCc::from_encoding(0), Some(ArmCc::Eq));
        assert_eq!(ArmCc::from_encoding(14), Some(ArmCc::Al));
        assert_eq!(ArmCc::from_encoding(15), None);
        assert_eq!(ArmCc::Vc.encoding(), Some(7));
        assert_eq!(ArmCc::Invalid.encoding(), None);
        assert_eq!(ArmCc::Ge.suffix(), "ge");
    }

    #[test]
    fn sysreg_field_names() {
        assert_eq!(ArmSysreg::SPSR_C.name(), Some("spsr_c"));
        let fc = ArmSysreg(ArmSysreg::CPSR_F.0 | ArmSysreg::CPSR_C.0);
        assert_eq!(fc.name(), Some("cpsr_fc"));
        let all = ArmSysreg(0xf);
        assert_eq!(all.name(), Some("spsr_fsxc"));
        assert_eq!(ArmSysreg(0x11).name(), None, "mixed spsr/cpsr fields");
    }

    #[test]
    fn sysreg_named_registers() {
        assert_eq!(ArmSysreg::APSR.name(), Some("apsr"));
        assert_eq!(ArmSysreg::APSR_NZCVQG.name(), Some("apsr_nzcvqg"));
        assert_eq!(ArmSysreg::BASEPRI_MAX.name(), Some("basepri_max"));
        assert_eq!(ArmSysreg::SP_NS.name(), Some("sp_ns"));
        assert_eq!(ArmSysreg(ArmSysreg::SP_NS.0 + 1).name(), None);
    }

    #[test]
    fn empty_operand_has_sentinels() {
        let op = ArmOp::default();
        assert_eq!(op.neon_lane, -1);
        assert_eq!(op.vector_index, -1);
        assert_eq!(op.value, ArmOpValue::Invalid);
        assert_eq!(ArmMem::default().scale, 1);
    }

    #[test]
    fn insn_ids_line_up_with_names() {
        for (id, insn) in ArmInsn::ALL.iter().enumerate() {
            assert_eq!(*insn as usize, id);
            if let Some(name) = insn.name() {
                assert_eq!(name, insn.to_string());
            }
        }
        assert_eq!(ArmInsn::from_id(ArmInsn::Ending as u16), None);
    }

    #[test]
    fn group_lookup() {
        assert_eq!(ArmGroup::from_id(1), Some(ArmGroup::Jump));
        assert_eq!(ArmGroup::from_id(3), None);
        assert_eq!(ArmGroup::from_id(130), Some(ArmGroup::IsThumb2));
        assert_eq!(ArmGroup::HasMveInt.name(), Some("HasMVEInt"));
        for g in ArmGroup::FEATURE_GROUPS {
            assert_eq!(ArmGroup::from_id(g as u8), Some(g));
        }
    }

    #[test]
    fn shift_translation() {
        assert_eq!(translate_shift_imm(0), 32);
        assert_eq!(translate_shift_imm(3), 3);
        assert_eq!(ArmShifter::from_shift_opc(2), Some(ArmShifter::Lsl));
        assert_eq!(ArmShifter::from_shift_opc(6), None);
    }
}
