//! x86 detail types.
//!
//! x86 decoders fill [`X86Detail`] directly while decoding; there is no
//! separate operand builder. This module holds the record, its name tables
//! and the register-access summary.

use core::fmt;

use crate::detail::{Access, Detail, RegAccess};
use crate::ir::FixedList;

// ── Registers ────────────────────────────────────────────────────────────

/// x86 register id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X86Reg(pub u16);

impl X86Reg {
    pub const INVALID: X86Reg = X86Reg(0);
    pub const AH: X86Reg = X86Reg(1);
    pub const AL: X86Reg = X86Reg(2);
    pub const AX: X86Reg = X86Reg(3);
    pub const BH: X86Reg = X86Reg(4);
    pub const BL: X86Reg = X86Reg(5);
    pub const BP: X86Reg = X86Reg(6);
    pub const BPL: X86Reg = X86Reg(7);
    pub const BX: X86Reg = X86Reg(8);
    pub const CH: X86Reg = X86Reg(9);
    pub const CL: X86Reg = X86Reg(10);
    pub const CS: X86Reg = X86Reg(11);
    pub const CX: X86Reg = X86Reg(12);
    pub const DH: X86Reg = X86Reg(13);
    pub const DI: X86Reg = X86Reg(14);
    pub const DIL: X86Reg = X86Reg(15);
    pub const DL: X86Reg = X86Reg(16);
    pub const DS: X86Reg = X86Reg(17);
    pub const DX: X86Reg = X86Reg(18);
    pub const EAX: X86Reg = X86Reg(19);
    pub const EBP: X86Reg = X86Reg(20);
    pub const EBX: X86Reg = X86Reg(21);
    pub const ECX: X86Reg = X86Reg(22);
    pub const EDI: X86Reg = X86Reg(23);
    pub const EDX: X86Reg = X86Reg(24);
    pub const EFLAGS: X86Reg = X86Reg(25);
    pub const EIP: X86Reg = X86Reg(26);
    pub const ES: X86Reg = X86Reg(27);
    pub const ESI: X86Reg = X86Reg(28);
    pub const ESP: X86Reg = X86Reg(29);
    pub const FPSW: X86Reg = X86Reg(30);
    pub const FS: X86Reg = X86Reg(31);
    pub const GS: X86Reg = X86Reg(32);
    pub const IP: X86Reg = X86Reg(33);
    pub const RAX: X86Reg = X86Reg(34);
    pub const RBP: X86Reg = X86Reg(35);
    pub const RBX: X86Reg = X86Reg(36);
    pub const RCX: X86Reg = X86Reg(37);
    pub const RDI: X86Reg = X86Reg(38);
    pub const RDX: X86Reg = X86Reg(39);
    pub const RIP: X86Reg = X86Reg(40);
    pub const RSI: X86Reg = X86Reg(41);
    pub const RSP: X86Reg = X86Reg(42);
    pub const SI: X86Reg = X86Reg(43);
    pub const SIL: X86Reg = X86Reg(44);
    pub const SP: X86Reg = X86Reg(45);
    pub const SPL: X86Reg = X86Reg(46);
    pub const SS: X86Reg = X86Reg(47);
    pub const R8: X86Reg = X86Reg(48);
    pub const R9: X86Reg = X86Reg(49);
    pub const R10: X86Reg = X86Reg(50);
    pub const R11: X86Reg = X86Reg(51);
    pub const R12: X86Reg = X86Reg(52);
    pub const R13: X86Reg = X86Reg(53);
    pub const R14: X86Reg = X86Reg(54);
    pub const R15: X86Reg = X86Reg(55);
    pub const ST0: X86Reg = X86Reg(56);
    pub const ST1: X86Reg = X86Reg(57);
    pub const ST2: X86Reg = X86Reg(58);
    pub const ST3: X86Reg = X86Reg(59);
    pub const ST4: X86Reg = X86Reg(60);
    pub const ST5: X86Reg = X86Reg(61);
    pub const ST6: X86Reg = X86Reg(62);
    pub const ST7: X86Reg = X86Reg(63);
    pub const XMM0: X86Reg = X86Reg(64);
    pub const XMM1: X86Reg = X86Reg(65);
    pub const XMM2: X86Reg = X86Reg(66);
    pub const XMM3: X86Reg = X86Reg(67);
    pub const XMM4: X86Reg = X86Reg(68);
    pub const XMM5: X86Reg = X86Reg(69);
    pub const XMM6: X86Reg = X86Reg(70);
    pub const XMM7: X86Reg = X86Reg(71);
    pub const XMM8: X86Reg = X86Reg(72);
    pub const XMM9: X86Reg = X86Reg(73);
    pub const XMM10: X86Reg = X86Reg(74);
    pub const XMM11: X86Reg = X86Reg(75);
    pub const XMM12: X86Reg = X86Reg(76);
    pub const XMM13: X86Reg = X86Reg(77);
    pub const XMM14: X86Reg = X86Reg(78);
    pub const XMM15: X86Reg = X86Reg(79);
    pub const YMM0: X86Reg = X86Reg(80);
    pub const YMM1: X86Reg = X86Reg(81);
    pub const YMM2: X86Reg = X86Reg(82);
    pub const YMM3: X86Reg = X86Reg(83);
    pub const YMM4: X86Reg = X86Reg(84);
    pub const YMM5: X86Reg = X86Reg(85);
    pub const YMM6: X86Reg = X86Reg(86);
    pub const YMM7: X86Reg = X86Reg(87);
    pub const YMM8: X86Reg = X86Reg(88);
    pub const YMM9: X86Reg = X86Reg(89);
    pub const YMM10: X86Reg = X86Reg(90);
    pub const YMM11: X86Reg = X86Reg(91);
    pub const YMM12: X86Reg = X86Reg(92);
    pub const YMM13: X86Reg = X86Reg(93);
    pub const YMM14: X86Reg = X86Reg(94);
    pub const YMM15: X86Reg = X86Reg(95);
    pub const K0: X86Reg = X86Reg(96);
    pub const K1: X86Reg = X86Reg(97);
    pub const K2: X86Reg = X86Reg(98);
    pub const K3: X86Reg = X86Reg(99);
    pub const K4: X86Reg = X86Reg(100);
    pub const K5: X86Reg = X86Reg(101);
    pub const K6: X86Reg = X86Reg(102);
    pub const K7: X86Reg = X86Reg(103);
    /// One past the last register id.
    pub const ENDING: X86Reg = X86Reg(104);

    /// Register name, `None` for invalid ids.
    pub fn name(self) -> Option<&'static str> {
        match X86_REG_NAMES.get(self.0 as usize) {
            Some(&"") | None => None,
            Some(name) => Some(*name),
        }
    }
}

impl fmt::Display for X86Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "reg{}", self.0),
        }
    }
}

static X86_REG_NAMES: [&str; X86Reg::ENDING.0 as usize] = [
    "", "ah", "al", "ax", "bh", "bl", "bp", "bpl",
    "bx", "ch", "cl", "cs", "cx", "dh", "di", "dil",
    "dl", "ds", "dx", "eax", "ebp", "ebx", "ecx", "edi",
    "edx", "eflags", "eip", "es", "esi", "esp", "fpsw", "fs",
    "gs", "ip", "rax", "rbp", "rbx", "rcx", "rdi", "rdx",
    "rip", "rsi", "rsp", "si", "sil", "sp", "spl", "ss",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
    "st(0)", "st(1)", "st(2)", "st(3)", "st(4)", "st(5)", "st(6)", "st(7)",
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7",
    "xmm8", "xmm9", "xmm10", "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
    "ymm0", "ymm1", "ymm2", "ymm3", "ymm4", "ymm5", "ymm6", "ymm7",
    "ymm8", "ymm9", "ymm10", "ymm11", "ymm12", "ymm13", "ymm14", "ymm15",
    "k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7",
];

// ── Instructions & groups ────────────────────────────────────────────────

/// Public x86 instruction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum X86Insn {
    #[default]
    Invalid = 0,
    Add,
    Call,
    Fadd,
    Fcomi,
    Jmp,
    Lea,
    Mov,
    Nop,
    Pop,
    Push,
    Ret,
    Vaddps,
    Xor,
}

impl X86Insn {
    const ALL: [X86Insn; 14] = [
        X86Insn::Invalid,
        X86Insn::Add,
        X86Insn::Call,
        X86Insn::Fadd,
        X86Insn::Fcomi,
        X86Insn::Jmp,
        X86Insn::Lea,
        X86Insn::Mov,
        X86Insn::Nop,
        X86Insn::Pop,
        X86Insn::Push,
        X86Insn::Ret,
        X86Insn::Vaddps,
        X86Insn::Xor,
    ];

    pub fn from_id(id: u16) -> Option<X86Insn> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn name(self) -> Option<&'static str> {
        use X86Insn::*;
        Some(match self {
            Invalid => return None,
            Add => "add",
            Call => "call",
            Fadd => "fadd",
            Fcomi => "fcomi",
            Jmp => "jmp",
            Lea => "lea",
            Mov => "mov",
            Nop => "nop",
            Pop => "pop",
            Push => "push",
            Ret => "ret",
            Vaddps => "vaddps",
            Xor => "xor",
        })
    }
}

/// x86 instruction group. Values below 128 are the generic groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum X86Group {
    Invalid = 0,
    Jump = 1,
    Call = 2,
    Ret = 3,
    Int = 4,
    Iret = 5,
    Privilege = 6,
    BranchRelative = 7,
    Vm = 128,
    Not64BitMode,
    Mode64,
    Cmov,
    Sse1,
    Sse2,
    Avx,
    Avx512,
    Fpu,
}

impl X86Group {
    const ARCH_GROUPS: [X86Group; 9] = [
        X86Group::Vm,
        X86Group::Not64BitMode,
        X86Group::Mode64,
        X86Group::Cmov,
        X86Group::Sse1,
        X86Group::Sse2,
        X86Group::Avx,
        X86Group::Avx512,
        X86Group::Fpu,
    ];

    pub fn from_id(id: u8) -> Option<X86Group> {
        match id {
            1 => Some(X86Group::Jump),
            2 => Some(X86Group::Call),
            3 => Some(X86Group::Ret),
            4 => Some(X86Group::Int),
            5 => Some(X86Group::Iret),
            6 => Some(X86Group::Privilege),
            7 => Some(X86Group::BranchRelative),
            128..=255 => Self::ARCH_GROUPS.get((id - 128) as usize).copied(),
            _ => None,
        }
    }

    pub fn name(self) -> Option<&'static str> {
        use X86Group::*;
        Some(match self {
            Invalid => return None,
            Jump => "jump",
            Call => "call",
            Ret => "ret",
            Int => "int",
            Iret => "iret",
            Privilege => "privilege",
            BranchRelative => "branch_relative",
            Vm => "vm",
            Not64BitMode => "not64bitmode",
            Mode64 => "mode64",
            Cmov => "cmov",
            Sse1 => "sse1",
            Sse2 => "sse2",
            Avx => "avx",
            Avx512 => "avx512",
            Fpu => "fpu",
        })
    }
}

// ── Flags ────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// EFLAGS effects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EFlags: u64 {
        const MODIFY_AF = 1 << 0;
        const MODIFY_CF = 1 << 1;
        const MODIFY_SF = 1 << 2;
        const MODIFY_ZF = 1 << 3;
        const MODIFY_PF = 1 << 4;
        const MODIFY_OF = 1 << 5;
        const MODIFY_TF = 1 << 6;
        const MODIFY_IF = 1 << 7;
        const MODIFY_DF = 1 << 8;
        const MODIFY_NT = 1 << 9;
        const MODIFY_RF = 1 << 10;
        const PRIOR_OF = 1 << 11;
        const PRIOR_SF = 1 << 12;
        const PRIOR_ZF = 1 << 13;
        const PRIOR_AF = 1 << 14;
        const PRIOR_PF = 1 << 15;
        const PRIOR_CF = 1 << 16;
        const PRIOR_TF = 1 << 17;
        const PRIOR_IF = 1 << 18;
        const PRIOR_DF = 1 << 19;
        const PRIOR_NT = 1 << 20;
        const RESET_OF = 1 << 21;
        const RESET_CF = 1 << 22;
        const RESET_DF = 1 << 23;
        const RESET_IF = 1 << 24;
        const RESET_SF = 1 << 25;
        const RESET_AF = 1 << 26;
        const RESET_TF = 1 << 27;
        const RESET_NT = 1 << 28;
        const RESET_PF = 1 << 29;
        const SET_CF = 1 << 30;
        const SET_DF = 1 << 31;
        const SET_IF = 1 << 32;
        const TEST_OF = 1 << 33;
        const TEST_SF = 1 << 34;
        const TEST_ZF = 1 << 35;
        const TEST_PF = 1 << 36;
        const TEST_CF = 1 << 37;
        const TEST_NT = 1 << 38;
        const TEST_DF = 1 << 39;
        const UNDEFINED_OF = 1 << 40;
        const UNDEFINED_SF = 1 << 41;
        const UNDEFINED_ZF = 1 << 42;
        const UNDEFINED_PF = 1 << 43;
        const UNDEFINED_AF = 1 << 44;
        const UNDEFINED_CF = 1 << 45;
        const RESET_RF = 1 << 46;
        const TEST_RF = 1 << 47;
        const TEST_IF = 1 << 48;
        const TEST_TF = 1 << 49;
        const TEST_AF = 1 << 50;
        const RESET_ZF = 1 << 51;
        const SET_OF = 1 << 52;
        const SET_SF = 1 << 53;
        const SET_ZF = 1 << 54;
        const SET_AF = 1 << 55;
        const SET_PF = 1 << 56;
        const RESET_0F = 1 << 57;
        const RESET_AC = 1 << 58;
    }
}

static EFLAG_NAMES: [&str; 59] = [
    "MOD_AF", "MOD_CF", "MOD_SF", "MOD_ZF", "MOD_PF", "MOD_OF", "MOD_TF", "MOD_IF",
    "MOD_DF", "MOD_NT", "MOD_RF", "PRIOR_OF", "PRIOR_SF", "PRIOR_ZF", "PRIOR_AF", "PRIOR_PF",
    "PRIOR_CF", "PRIOR_TF", "PRIOR_IF", "PRIOR_DF", "PRIOR_NT", "RESET_OF", "RESET_CF",
    "RESET_DF", "RESET_IF", "RESET_SF", "RESET_AF", "RESET_TF", "RESET_NT", "RESET_PF",
    "SET_CF", "SET_DF", "SET_IF", "TEST_OF", "TEST_SF", "TEST_ZF", "TEST_PF", "TEST_CF",
    "TEST_NT", "TEST_DF", "UNDEF_OF", "UNDEF_SF", "UNDEF_ZF", "UNDEF_PF", "UNDEF_AF",
    "UNDEF_CF", "RESET_RF", "TEST_RF", "TEST_IF", "TEST_TF", "TEST_AF", "RESET_ZF", "SET_OF",
    "SET_SF", "SET_ZF", "SET_AF", "SET_PF", "RESET_0F", "RESET_AC",
];

impl EFlags {
    /// Short name of a single-bit value (`"MOD_CF"`, `"UNDEF_OF"`, ...).
    pub fn bit_name(self) -> Option<&'static str> {
        single_bit_name(self.bits(), &EFLAG_NAMES)
    }
}

bitflags::bitflags! {
    /// x87 condition code effects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FpuFlags: u64 {
        const MODIFY_C0 = 1 << 0;
        const MODIFY_C1 = 1 << 1;
        const MODIFY_C2 = 1 << 2;
        const MODIFY_C3 = 1 << 3;
        const RESET_C0 = 1 << 4;
        const RESET_C1 = 1 << 5;
        const RESET_C2 = 1 << 6;
        const RESET_C3 = 1 << 7;
        const SET_C0 = 1 << 8;
        const SET_C1 = 1 << 9;
        const SET_C2 = 1 << 10;
        const SET_C3 = 1 << 11;
        const UNDEFINED_C0 = 1 << 12;
        const UNDEFINED_C1 = 1 << 13;
        const UNDEFINED_C2 = 1 << 14;
        const UNDEFINED_C3 = 1 << 15;
        const TEST_C0 = 1 << 16;
        const TEST_C1 = 1 << 17;
        const TEST_C2 = 1 << 18;
        const TEST_C3 = 1 << 19;
    }
}

static FPU_FLAG_NAMES: [&str; 20] = [
    "MOD_C0", "MOD_C1", "MOD_C2", "MOD_C3", "RESET_C0", "RESET_C1", "RESET_C2", "RESET_C3",
    "SET_C0", "SET_C1", "SET_C2", "SET_C3", "UNDEF_C0", "UNDEF_C1", "UNDEF_C2", "UNDEF_C3",
    "TEST_C0", "TEST_C1", "TEST_C2", "TEST_C3",
];

impl FpuFlags {
    /// Short name of a single-bit value (`"MOD_C1"`, ...).
    pub fn bit_name(self) -> Option<&'static str> {
        single_bit_name(self.bits(), &FPU_FLAG_NAMES)
    }
}

fn single_bit_name(bits: u64, names: &[&'static str]) -> Option<&'static str> {
    if bits.count_ones() != 1 {
        return None;
    }
    names.get(bits.trailing_zeros() as usize).copied()
}

// ── Operands & record ────────────────────────────────────────────────────

/// Operand kind, used to count and index operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum X86OpType {
    #[default]
    Invalid,
    Reg,
    Imm,
    Mem,
}

/// Memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X86Mem {
    pub segment: X86Reg,
    pub base: X86Reg,
    pub index: X86Reg,
    pub scale: i32,
    pub disp: i64,
}

impl Default for X86Mem {
    fn default() -> Self {
        Self {
            segment: X86Reg::INVALID,
            base: X86Reg::INVALID,
            index: X86Reg::INVALID,
            scale: 1,
            disp: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum X86OpValue {
    #[default]
    Invalid,
    Reg(X86Reg),
    Imm(i64),
    Mem(X86Mem),
}

/// One x86 operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X86Op {
    pub value: X86OpValue,
    /// Size in bytes.
    pub size: u8,
    pub access: Access,
    /// AVX broadcast kind, `0` when none.
    pub avx_bcast: u8,
    /// `{z}` zeroing opmask.
    pub avx_zero_opmask: bool,
}

impl X86Op {
    pub fn ty(&self) -> X86OpType {
        match self.value {
            X86OpValue::Invalid => X86OpType::Invalid,
            X86OpValue::Reg(_) => X86OpType::Reg,
            X86OpValue::Imm(_) => X86OpType::Imm,
            X86OpValue::Mem(_) => X86OpType::Mem,
        }
    }

    pub fn reg(reg: X86Reg, size: u8, access: Access) -> Self {
        Self {
            value: X86OpValue::Reg(reg),
            size,
            access,
            ..Self::default()
        }
    }

    pub fn imm(imm: i64, size: u8) -> Self {
        Self {
            value: X86OpValue::Imm(imm),
            size,
            access: Access::READ,
            ..Self::default()
        }
    }

    pub fn mem(mem: X86Mem, size: u8, access: Access) -> Self {
        Self {
            value: X86OpValue::Mem(mem),
            size,
            access,
            ..Self::default()
        }
    }
}

pub const MAX_X86_OPERANDS: usize = 8;

/// x86-specific part of a detail record.
///
/// The condition code, broadcast and rounding fields use `0` for "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X86Detail {
    /// Legacy prefixes: lock/rep, segment, operand size, address size.
    pub prefix: [u8; 4],
    /// Opcode bytes, zero padded.
    pub opcode: [u8; 4],
    pub rex: u8,
    pub addr_size: u8,
    pub modrm: u8,
    pub sib: u8,
    pub disp: i64,
    pub sib_index: X86Reg,
    pub sib_scale: i8,
    pub sib_base: X86Reg,
    pub xop_cc: u8,
    pub sse_cc: u8,
    pub avx_cc: u8,
    pub avx_sae: bool,
    pub avx_rm: u8,
    pub eflags: EFlags,
    pub fpu_flags: FpuFlags,
    pub operands: FixedList<X86Op, MAX_X86_OPERANDS>,
}

impl X86Detail {
    /// Number of operands of kind `ty`.
    pub fn op_count(&self, ty: X86OpType) -> usize {
        self.operands.iter().filter(|op| op.ty() == ty).count()
    }

    /// Index of the `position`-th operand of kind `ty`, counting from 1.
    pub fn op_index(&self, ty: X86OpType, position: usize) -> Option<usize> {
        if position == 0 {
            return None;
        }
        self.operands
            .iter()
            .enumerate()
            .filter(|(_, op)| op.ty() == ty)
            .nth(position - 1)
            .map(|(i, _)| i)
    }
}

/// Every register the instruction reads or writes: implicit ones first,
/// then registers by access and memory segment/base/index as reads.
pub fn reg_access(detail: &Detail) -> RegAccess {
    let mut access = RegAccess::from_implicit(detail);
    let Some(x86) = detail.as_x86() else {
        return access;
    };
    for op in x86.operands.iter() {
        match op.value {
            X86OpValue::Reg(reg) if reg != X86Reg::INVALID => access.add(reg.0, op.access),
            X86OpValue::Mem(mem) => {
                for reg in [mem.segment, mem.base, mem.index] {
                    if reg != X86Reg::INVALID {
                        access.add_read(reg.0);
                    }
                }
            }
            _ => {}
        }
    }
    access
}

pub fn reg_name(reg: u16) -> Option<&'static str> {
    X86Reg(reg).name()
}

pub fn insn_name(id: u16) -> Option<&'static str> {
    X86Insn::from_id(id).and_then(X86Insn::name)
}

pub fn group_name(id: u8) -> Option<&'static str> {
    X86Group::from_id(id).and_then(X86Group::name)
}
