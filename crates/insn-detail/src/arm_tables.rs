//! ARM metadata tables.
//!
//! Three tables, all indexed by raw decoder opcode:
//!
//! - the operand descriptor table: declared type, access and data types of
//!   every raw operand slot,
//! - the operand walk table: the order in which raw operands are visited
//!   and which operand group each one belongs to,
//! - the instruction map: public id, implicit registers and groups, sorted
//!   by opcode for binary search.
//!
//! Plus the M-class system register lookups used by `msr`.

use crate::arm::{ArmGroup, ArmInsn, ArmReg, ArmSysreg};
use crate::arm_builder::{
    contract_violation, OpGroup, PredicateKind, UnimplementedGroup, VectorListLen,
};
use crate::detail::Access;

/// Raw decoder opcodes.
pub mod opc {
    pub const INVALID: u32 = 0;
    pub const ADDRSI: u32 = 1;
    pub const BCC: u32 = 2;
    pub const BL: u32 = 3;
    pub const BL_PRED: u32 = 4;
    pub const BLXI: u32 = 5;
    pub const BX: u32 = 6;
    pub const CDP: u32 = 7;
    pub const CMNRI: u32 = 8;
    pub const LDREX: u32 = 9;
    pub const MOVI: u32 = 10;
    pub const MOVR: u32 = 11;
    pub const MSR: u32 = 12;
    pub const PLDI12: u32 = 13;
    pub const STR_PRE_IMM: u32 = 14;
    pub const T2B: u32 = 15;
    pub const T2BFI: u32 = 16;
    pub const T2CSEL: u32 = 17;
    pub const T2LDMIA: u32 = 18;
    pub const T2LDREX: u32 = 19;
    pub const T2LDRI12: u32 = 20;
    pub const T2LDRS: u32 = 21;
    pub const T2MOVI: u32 = 22;
    pub const T2MSR_M: u32 = 23;
    pub const T2TBB: u32 = 24;
    pub const T_B: u32 = 25;
    pub const T_BCC: u32 = 26;
    pub const T_BL: u32 = 27;
    pub const T_BLXI: u32 = 28;
    pub const T_CBNZ: u32 = 29;
    pub const T_CBZ: u32 = 30;
    pub const T_IT: u32 = 31;
    pub const T_LDMIA_UPD: u32 = 32;
    pub const T_LDRHI: u32 = 33;
    pub const T_POP: u32 = 34;
    pub const T_PUSH: u32 = 35;
    pub const T_SVC: u32 = 36;
    pub const MVE_VADDI32: u32 = 37;
    pub const VLD1D8: u32 = 38;
    pub const VLD1LND8: u32 = 39;
    pub const VLD2D16: u32 = 40;
    pub const VST1D8_WB_REG: u32 = 41;
    /// One past the last opcode.
    pub const INSTRUCTION_LIST_END: u32 = 42;
}

/// Most raw operand slots any opcode declares.
pub const MAX_OPERANDS: usize = 16;

// ── Operand descriptors ──────────────────────────────────────────────────

/// Declared kind of a raw operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpType {
    #[default]
    Invalid,
    Reg,
    Imm,
    Pred,
    /// Base register of a memory operand.
    MemReg,
    /// Index register of a memory operand.
    MemIndexReg,
    /// Displacement of a memory operand.
    MemImm,
}

impl OpType {
    #[inline]
    pub fn is_reg(self) -> bool {
        matches!(self, OpType::Reg | OpType::MemReg | OpType::MemIndexReg)
    }

    #[inline]
    pub fn is_imm(self) -> bool {
        matches!(self, OpType::Imm | OpType::MemImm)
    }
}

/// Element type carried by an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    I1,
    I8,
    I16,
    I32,
    F64,
    V8I8,
    V4I16,
    V2I32,
    V4I32,
}

/// Descriptor of one raw operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDesc {
    pub ty: OpType,
    pub access: Access,
    pub dtypes: &'static [DataType],
}

impl OpDesc {
    /// Descriptor of an undeclared slot.
    pub const INVALID: OpDesc = OpDesc {
        ty: OpType::Invalid,
        access: Access::empty(),
        dtypes: &[],
    };
}

const R: Access = Access::READ;
const W: Access = Access::WRITE;
const RW: Access = Access::READ.union(Access::WRITE);

const GPR: &[DataType] = &[DataType::I32];
const DPR: &[DataType] = &[DataType::F64, DataType::V8I8, DataType::V4I16, DataType::V2I32];
const QPR: &[DataType] = &[DataType::V4I32];
const BYTE: &[DataType] = &[DataType::I8];
const HALF: &[DataType] = &[DataType::I16];
const FLAG: &[DataType] = &[DataType::I1];

const fn desc(ty: OpType, access: Access, dtypes: &'static [DataType]) -> OpDesc {
    OpDesc { ty, access, dtypes }
}

const fn reg(access: Access) -> OpDesc {
    desc(OpType::Reg, access, GPR)
}

const fn imm(access: Access) -> OpDesc {
    desc(OpType::Imm, access, GPR)
}

const fn mem_base(access: Access) -> OpDesc {
    desc(OpType::MemReg, access, GPR)
}

const fn mem_index(access: Access) -> OpDesc {
    desc(OpType::MemIndexReg, access, GPR)
}

const fn mem_disp(access: Access) -> OpDesc {
    desc(OpType::MemImm, access, GPR)
}

/// Condition code slot followed by its predicate register.
const P: OpDesc = desc(OpType::Pred, R, GPR);
const PREG: OpDesc = reg(R);
/// Optional `cc_out` register of flag-setting forms.
const CC_OUT: OpDesc = desc(OpType::Reg, W, FLAG);

static OPERANDS: [&[OpDesc]; opc::INSTRUCTION_LIST_END as usize] = [
    // INVALID
    &[],
    // ADDRSI: add rd, rn, rm, <shift>
    &[reg(W), reg(R), reg(R), imm(R), P, PREG, CC_OUT],
    // BCC
    &[imm(R), P, PREG],
    // BL
    &[imm(R)],
    // BL_PRED
    &[imm(R), P, PREG],
    // BLXI
    &[imm(R)],
    // BX
    &[reg(R)],
    // CDP: coproc, opc1, crd, crn, crm, opc2
    &[imm(R), imm(R), imm(R), imm(R), imm(R), imm(R), P, PREG],
    // CMNRI
    &[reg(R), imm(R), P, PREG],
    // LDREX
    &[reg(W), mem_base(R), P, PREG],
    // MOVI
    &[reg(W), imm(R), P, PREG, CC_OUT],
    // MOVR
    &[reg(W), reg(R), P, PREG, CC_OUT],
    // MSR: mask, rn
    &[imm(W), reg(R), P, PREG],
    // PLDI12
    &[mem_base(R), mem_disp(R)],
    // STR_PRE_IMM: rn_wb, rt, rn, offset
    &[reg(W), reg(R), mem_base(W), mem_disp(W), P, PREG],
    // T2B
    &[imm(R), P, PREG],
    // T2BFI: rd, rd (tied), rn, inverted mask
    &[reg(W), reg(R), reg(R), imm(R), P, PREG],
    // T2CSEL
    &[reg(W), reg(R), reg(R), desc(OpType::Pred, R, GPR)],
    // T2LDMIA: rn, pred, reglist...
    &[reg(R), P, PREG, reg(W)],
    // T2LDREX
    &[reg(W), mem_base(R), mem_disp(R), P, PREG],
    // T2LDRI12
    &[reg(W), mem_base(R), mem_disp(R), P, PREG],
    // T2LDRS: rt, rn, rm, lsl
    &[reg(W), mem_base(R), mem_index(R), imm(R), P, PREG],
    // T2MOVI
    &[reg(W), imm(R), P, PREG, CC_OUT],
    // T2MSR_M
    &[imm(W), reg(R), P, PREG],
    // T2TBB
    &[mem_base(R), mem_index(R), P, PREG],
    // T_B
    &[imm(R), P, PREG],
    // T_BCC
    &[imm(R), P, PREG],
    // T_BL
    &[P, PREG, imm(R)],
    // T_BLXI
    &[P, PREG, imm(R)],
    // T_CBNZ
    &[reg(R), imm(R)],
    // T_CBZ
    &[reg(R), imm(R)],
    // T_IT: firstcond, mask
    &[desc(OpType::Pred, R, GPR), imm(R)],
    // T_LDMIA_UPD: rn_wb, rn, pred, reglist...
    &[reg(W), reg(RW), P, PREG, reg(W)],
    // T_LDRHI
    &[desc(OpType::Reg, W, HALF), mem_base(R), mem_disp(R), P, PREG],
    // T_POP
    &[P, PREG, reg(W)],
    // T_PUSH
    &[P, PREG, reg(R)],
    // T_SVC
    &[imm(R), P, PREG],
    // MVE_VADDI32: qd, qn, qm, vpred, vpr
    &[
        desc(OpType::Reg, W, QPR),
        desc(OpType::Reg, R, QPR),
        desc(OpType::Reg, R, QPR),
        desc(OpType::Pred, R, GPR),
        reg(R),
    ],
    // VLD1D8: vd, rn, align
    &[desc(OpType::Reg, W, DPR), mem_base(R), mem_disp(R), P, PREG],
    // VLD1LND8: vd, rn, align, vd (tied), lane
    &[
        desc(OpType::Reg, W, BYTE),
        mem_base(R),
        mem_disp(R),
        desc(OpType::Reg, R, BYTE),
        imm(R),
        P,
        PREG,
    ],
    // VLD2D16
    &[desc(OpType::Reg, W, DPR), mem_base(R), mem_disp(R), P, PREG],
    // VST1D8_WB_REG: rn_wb, rn, align, rm, vd
    &[
        reg(W),
        mem_base(W),
        mem_disp(W),
        reg(R),
        desc(OpType::Reg, R, DPR),
        P,
        PREG,
    ],
];

/// Descriptor of raw operand `slot` of `opcode`.
///
/// Slots an opcode does not declare read as [`OpDesc::INVALID`].
///
/// # Panics
/// Panics (after logging) if `opcode` is out of range or `slot` is not
/// below [`MAX_OPERANDS`].
pub fn op_desc(opcode: u32, slot: usize) -> OpDesc {
    let Some(descs) = OPERANDS.get(opcode as usize) else {
        contract_violation(opcode, format_args!("opcode out of range"));
    };
    if slot >= MAX_OPERANDS {
        contract_violation(opcode, format_args!("operand slot {} out of range", slot));
    }
    descs.get(slot).copied().unwrap_or(OpDesc::INVALID)
}

#[inline]
pub fn op_type(opcode: u32, slot: usize) -> OpType {
    op_desc(opcode, slot).ty
}

#[inline]
pub fn op_access(opcode: u32, slot: usize) -> Access {
    op_desc(opcode, slot).access
}

// ── Operand walks ────────────────────────────────────────────────────────

/// One step of an operand walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Classify raw operand `n` as a member of a group.
    Classify(OpGroup, u8),
    /// `lsl` by the immediate in raw operand `n`.
    ShiftLsl(u8),
    /// Shift packed as `amount << 3 | opc` in raw operand `n`.
    SoRegShift(u8),
    BeginMem,
    EndMem,
    Writeback,
}

const fn op(n: u8) -> Step {
    Step::Classify(OpGroup::Operand, n)
}

const fn pred(n: u8) -> Step {
    Step::Classify(OpGroup::Predicate(PredicateKind::Plain), n)
}

const fn group(g: OpGroup, n: u8) -> Step {
    Step::Classify(g, n)
}

const REG_LIST: OpGroup = OpGroup::RegisterList;
const MANDATORY: OpGroup = OpGroup::Predicate(PredicateKind::Mandatory);

const BRANCH_PRED: &[Step] = &[pred(1), op(0)];
const BRANCH: &[Step] = &[op(0)];
const THUMB_CALL: &[Step] = &[pred(0), op(2)];
const COMPARE_BRANCH: &[Step] = &[op(0), op(1)];
const MOVE: &[Step] = &[group(OpGroup::SBitModifier, 4), pred(2), op(0), op(1)];
const LOAD_IMM: &[Step] = &[pred(3), op(0), Step::BeginMem, op(1), op(2), Step::EndMem];
const MSR: &[Step] = &[pred(2), group(OpGroup::MsrMask, 0), op(1)];

static WALKS: [&[Step]; opc::INSTRUCTION_LIST_END as usize] = [
    // INVALID
    &[],
    // ADDRSI
    &[
        group(OpGroup::SBitModifier, 6),
        pred(4),
        op(0),
        op(1),
        op(2),
        Step::SoRegShift(3),
    ],
    // BCC
    BRANCH_PRED,
    // BL
    BRANCH,
    // BL_PRED
    BRANCH_PRED,
    // BLXI
    BRANCH,
    // BX
    BRANCH,
    // CDP
    &[
        pred(6),
        group(OpGroup::PImmediate, 0),
        op(1),
        group(OpGroup::CImmediate, 2),
        group(OpGroup::CImmediate, 3),
        group(OpGroup::CImmediate, 4),
        op(5),
    ],
    // CMNRI
    &[pred(2), op(0), op(1)],
    // LDREX
    &[pred(2), op(0), group(OpGroup::AddrMode7, 1)],
    // MOVI
    MOVE,
    // MOVR
    MOVE,
    // MSR
    MSR,
    // PLDI12
    &[Step::BeginMem, op(0), op(1), Step::EndMem],
    // STR_PRE_IMM
    &[
        pred(4),
        op(1),
        Step::BeginMem,
        op(2),
        op(3),
        Step::EndMem,
        Step::Writeback,
    ],
    // T2B
    BRANCH_PRED,
    // T2BFI
    &[
        pred(4),
        op(0),
        op(2),
        group(
            OpGroup::Unimplemented(UnimplementedGroup::BitfieldInvMaskImm),
            3,
        ),
    ],
    // T2CSEL
    &[op(0), op(1), op(2), group(MANDATORY, 3)],
    // T2LDMIA
    &[pred(1), op(0), group(REG_LIST, 3)],
    // T2LDREX
    LOAD_IMM,
    // T2LDRI12
    LOAD_IMM,
    // T2LDRS
    &[
        pred(4),
        op(0),
        Step::BeginMem,
        op(1),
        op(2),
        Step::ShiftLsl(3),
        Step::EndMem,
    ],
    // T2MOVI
    MOVE,
    // T2MSR_M
    MSR,
    // T2TBB
    &[pred(2), Step::BeginMem, op(0), op(1), Step::EndMem],
    // T_B
    BRANCH_PRED,
    // T_BCC
    BRANCH_PRED,
    // T_BL
    THUMB_CALL,
    // T_BLXI
    THUMB_CALL,
    // T_CBNZ
    COMPARE_BRANCH,
    // T_CBZ
    COMPARE_BRANCH,
    // T_IT
    &[group(OpGroup::ThumbItMask, 1), group(MANDATORY, 0)],
    // T_LDMIA_UPD
    &[pred(2), op(1), Step::Writeback, group(REG_LIST, 4)],
    // T_LDRHI
    LOAD_IMM,
    // T_POP
    &[pred(0), group(REG_LIST, 2)],
    // T_PUSH
    &[pred(0), group(REG_LIST, 2)],
    // T_SVC
    &[pred(1), op(0)],
    // MVE_VADDI32
    &[group(OpGroup::VptPredicate, 3), op(0), op(1), op(2)],
    // VLD1D8
    &[
        pred(3),
        group(OpGroup::VectorList(VectorListLen::One), 0),
        group(OpGroup::AddrMode6, 1),
    ],
    // VLD1LND8
    &[
        pred(5),
        op(0),
        Step::BeginMem,
        group(OpGroup::NoHashImmediate, 4),
        Step::EndMem,
        group(OpGroup::AddrMode6, 1),
    ],
    // VLD2D16
    &[
        pred(3),
        group(OpGroup::VectorList(VectorListLen::Two), 0),
        group(OpGroup::AddrMode6, 1),
    ],
    // VST1D8_WB_REG
    &[
        pred(5),
        group(OpGroup::VectorList(VectorListLen::One), 4),
        group(OpGroup::AddrMode6, 1),
        group(OpGroup::AddrMode6Offset, 3),
        Step::Writeback,
    ],
];

/// Operand walk of `opcode`, empty for unknown opcodes.
pub fn walk(opcode: u32) -> &'static [Step] {
    WALKS.get(opcode as usize).copied().unwrap_or(&[])
}

// ── Instruction map ──────────────────────────────────────────────────────

/// Per-opcode instruction facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsnMapEntry {
    pub opcode: u32,
    pub id: ArmInsn,
    /// Implicitly read registers.
    pub regs_use: &'static [ArmReg],
    /// Implicitly written registers.
    pub regs_mod: &'static [ArmReg],
    pub groups: &'static [ArmGroup],
    pub branch: bool,
    pub indirect_branch: bool,
}

const fn entry(opcode: u32, id: ArmInsn, groups: &'static [ArmGroup]) -> InsnMapEntry {
    InsnMapEntry {
        opcode,
        id,
        regs_use: &[],
        regs_mod: &[],
        groups,
        branch: false,
        indirect_branch: false,
    }
}

const fn branch(
    opcode: u32,
    id: ArmInsn,
    regs_use: &'static [ArmReg],
    regs_mod: &'static [ArmReg],
    groups: &'static [ArmGroup],
) -> InsnMapEntry {
    InsnMapEntry {
        opcode,
        id,
        regs_use,
        regs_mod,
        groups,
        branch: true,
        indirect_branch: false,
    }
}

const fn implicit(
    mut e: InsnMapEntry,
    regs_use: &'static [ArmReg],
    regs_mod: &'static [ArmReg],
) -> InsnMapEntry {
    e.regs_use = regs_use;
    e.regs_mod = regs_mod;
    e
}

const fn indirect(mut e: InsnMapEntry) -> InsnMapEntry {
    e.branch = true;
    e.indirect_branch = true;
    e
}

use ArmGroup as G;

const CALL_USE: &[ArmReg] = &[ArmReg::PC];
const CALL_MOD: &[ArmReg] = &[ArmReg::LR, ArmReg::PC];
const FLAGS: &[ArmReg] = &[ArmReg::CPSR];
const STACK: &[ArmReg] = &[ArmReg::SP];

/// Instruction map, sorted by opcode.
pub static INSN_MAP: [InsnMapEntry; 41] = [
    entry(opc::ADDRSI, ArmInsn::Add, &[G::IsArm]),
    branch(opc::BCC, ArmInsn::B, FLAGS, &[], &[G::BranchRelative, G::IsArm]),
    branch(opc::BL, ArmInsn::Bl, CALL_USE, CALL_MOD, &[G::Call, G::BranchRelative, G::IsArm]),
    branch(opc::BL_PRED, ArmInsn::Bl, CALL_USE, CALL_MOD, &[G::Call, G::BranchRelative, G::IsArm]),
    branch(
        opc::BLXI,
        ArmInsn::Blx,
        CALL_USE,
        CALL_MOD,
        &[G::Call, G::BranchRelative, G::IsArm, G::HasV5T],
    ),
    indirect(entry(opc::BX, ArmInsn::Bx, &[G::IsArm])),
    entry(opc::CDP, ArmInsn::Cdp, &[G::IsArm]),
    implicit(entry(opc::CMNRI, ArmInsn::Cmn, &[G::IsArm]), &[], FLAGS),
    entry(opc::LDREX, ArmInsn::Ldrex, &[G::IsArm]),
    entry(opc::MOVI, ArmInsn::Mov, &[G::IsArm]),
    entry(opc::MOVR, ArmInsn::Mov, &[G::IsArm]),
    entry(opc::MSR, ArmInsn::Msr, &[G::IsArm]),
    entry(opc::PLDI12, ArmInsn::Pld, &[G::IsArm]),
    entry(opc::STR_PRE_IMM, ArmInsn::Str, &[G::IsArm]),
    branch(opc::T2B, ArmInsn::B, &[], &[], &[G::BranchRelative, G::IsThumb2]),
    entry(opc::T2BFI, ArmInsn::Bfi, &[G::IsThumb2, G::HasV6]),
    implicit(entry(opc::T2CSEL, ArmInsn::Csel, &[G::IsThumb2, G::HasV8]), FLAGS, &[]),
    entry(opc::T2LDMIA, ArmInsn::Ldm, &[G::IsThumb2]),
    entry(opc::T2LDREX, ArmInsn::Ldrex, &[G::IsThumb, G::HasV8MBaseline]),
    entry(opc::T2LDRI12, ArmInsn::Ldr, &[G::IsThumb2]),
    entry(opc::T2LDRS, ArmInsn::Ldr, &[G::IsThumb2]),
    entry(opc::T2MOVI, ArmInsn::Mov, &[G::IsThumb2]),
    entry(opc::T2MSR_M, ArmInsn::Msr, &[G::IsThumb2, G::IsMClass]),
    indirect(entry(opc::T2TBB, ArmInsn::Tbb, &[G::IsThumb2])),
    branch(opc::T_B, ArmInsn::B, &[], &[], &[G::BranchRelative, G::IsThumb]),
    branch(opc::T_BCC, ArmInsn::B, FLAGS, &[], &[G::BranchRelative, G::IsThumb]),
    branch(opc::T_BL, ArmInsn::Bl, CALL_USE, CALL_MOD, &[G::Call, G::BranchRelative, G::IsThumb]),
    branch(
        opc::T_BLXI,
        ArmInsn::Blx,
        CALL_USE,
        CALL_MOD,
        &[G::Call, G::BranchRelative, G::IsThumb, G::HasV5T, G::IsNotMClass],
    ),
    branch(opc::T_CBNZ, ArmInsn::Cbnz, &[], &[], &[G::BranchRelative, G::IsThumb2]),
    branch(opc::T_CBZ, ArmInsn::Cbz, &[], &[], &[G::BranchRelative, G::IsThumb2]),
    implicit(entry(opc::T_IT, ArmInsn::It, &[G::IsThumb2]), &[], &[ArmReg::ITSTATE]),
    entry(opc::T_LDMIA_UPD, ArmInsn::Ldm, &[G::IsThumb]),
    entry(opc::T_LDRHI, ArmInsn::Ldrh, &[G::IsThumb]),
    implicit(entry(opc::T_POP, ArmInsn::Pop, &[G::IsThumb]), STACK, STACK),
    implicit(entry(opc::T_PUSH, ArmInsn::Push, &[G::IsThumb]), STACK, STACK),
    entry(opc::T_SVC, ArmInsn::Svc, &[G::Int, G::IsThumb]),
    entry(opc::MVE_VADDI32, ArmInsn::Vadd, &[G::HasMveInt]),
    entry(opc::VLD1D8, ArmInsn::Vld1, &[G::HasNeon]),
    entry(opc::VLD1LND8, ArmInsn::Vld1, &[G::HasNeon]),
    entry(opc::VLD2D16, ArmInsn::Vld2, &[G::HasNeon]),
    entry(opc::VST1D8_WB_REG, ArmInsn::Vst1, &[G::HasNeon]),
];

// ── M-class system registers ─────────────────────────────────────────────

/// 12-bit `SYSm` lookup entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MClassSysreg12 {
    pub sysm: u16,
    pub reg: ArmSysreg,
    /// Only valid with the DSP extension.
    pub requires_dsp: bool,
}

const fn sysreg12(sysm: u16, reg: ArmSysreg, requires_dsp: bool) -> MClassSysreg12 {
    MClassSysreg12 {
        sysm,
        reg,
        requires_dsp,
    }
}

// Sorted by `sysm`.
static MCLASS_12BIT: [MClassSysreg12; 9] = [
    sysreg12(0x400, ArmSysreg::APSR_G, true),
    sysreg12(0x401, ArmSysreg::IAPSR_G, true),
    sysreg12(0x402, ArmSysreg::EAPSR_G, true),
    sysreg12(0x403, ArmSysreg::XPSR_G, true),
    sysreg12(0x800, ArmSysreg::APSR_NZCVQ, false),
    sysreg12(0xc00, ArmSysreg::APSR_NZCVQG, true),
    sysreg12(0xc01, ArmSysreg::IAPSR_NZCVQG, true),
    sysreg12(0xc02, ArmSysreg::EAPSR_NZCVQG, true),
    sysreg12(0xc03, ArmSysreg::XPSR_NZCVQG, true),
];

static MCLASS_APSR_NON_DEPRECATED: [(u16, ArmSysreg); 4] = [
    (0x00, ArmSysreg::APSR_NZCVQ),
    (0x01, ArmSysreg::IAPSR_NZCVQ),
    (0x02, ArmSysreg::EAPSR_NZCVQ),
    (0x03, ArmSysreg::XPSR_NZCVQ),
];

static MCLASS_8BIT: [(u16, ArmSysreg); 25] = [
    (0x00, ArmSysreg::APSR),
    (0x01, ArmSysreg::IAPSR),
    (0x02, ArmSysreg::EAPSR),
    (0x03, ArmSysreg::XPSR),
    (0x05, ArmSysreg::IPSR),
    (0x06, ArmSysreg::EPSR),
    (0x07, ArmSysreg::IEPSR),
    (0x08, ArmSysreg::MSP),
    (0x09, ArmSysreg::PSP),
    (0x0a, ArmSysreg::MSPLIM),
    (0x0b, ArmSysreg::PSPLIM),
    (0x10, ArmSysreg::PRIMASK),
    (0x11, ArmSysreg::BASEPRI),
    (0x12, ArmSysreg::BASEPRI_MAX),
    (0x13, ArmSysreg::FAULTMASK),
    (0x14, ArmSysreg::CONTROL),
    (0x88, ArmSysreg::MSP_NS),
    (0x89, ArmSysreg::PSP_NS),
    (0x8a, ArmSysreg::MSPLIM_NS),
    (0x8b, ArmSysreg::PSPLIM_NS),
    (0x90, ArmSysreg::PRIMASK_NS),
    (0x91, ArmSysreg::BASEPRI_NS),
    (0x93, ArmSysreg::FAULTMASK_NS),
    (0x94, ArmSysreg::CONTROL_NS),
    (0x98, ArmSysreg::SP_NS),
];

fn lookup(table: &[(u16, ArmSysreg)], sysm: u16) -> Option<ArmSysreg> {
    table
        .binary_search_by_key(&sysm, |&(k, _)| k)
        .ok()
        .map(|i| table[i].1)
}

/// Looks up a full 12-bit `SYSm` value (mask bits included).
pub fn mclass_sysreg_by_12bit(sysm: u16) -> Option<&'static MClassSysreg12> {
    MCLASS_12BIT
        .binary_search_by_key(&sysm, |e| e.sysm)
        .ok()
        .map(|i| &MCLASS_12BIT[i])
}

/// Looks up the ARMv7 `apsr` spellings.
pub fn mclass_sysreg_apsr_non_deprecated(sysm: u16) -> Option<ArmSysreg> {
    lookup(&MCLASS_APSR_NON_DEPRECATED, sysm)
}

/// Looks up an 8-bit `SYSm` value.
pub fn mclass_sysreg_by_8bit(sysm: u16) -> Option<ArmSysreg> {
    lookup(&MCLASS_8BIT, sysm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insn_map_is_sorted_and_complete() {
        assert!(INSN_MAP.windows(2).all(|w| w[0].opcode < w[1].opcode));
        assert_eq!(INSN_MAP.len() as u32, opc::INSTRUCTION_LIST_END - 1);
        assert_eq!(INSN_MAP[0].opcode, 1);
    }

    #[test]
    fn sysreg_tables_are_sorted() {
        assert!(MCLASS_12BIT.windows(2).all(|w| w[0].sysm < w[1].sysm));
        assert!(MCLASS_8BIT.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(MCLASS_APSR_NON_DEPRECATED.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn every_declared_table_fits_slot_limit() {
        for (opcode, descs) in OPERANDS.iter().enumerate() {
            assert!(descs.len() <= MAX_OPERANDS, "opcode {opcode}");
        }
    }

    #[test]
    fn walks_only_name_declared_slots() {
        for opcode in 0..opc::INSTRUCTION_LIST_END {
            for step in walk(opcode) {
                let slot = match *step {
                    Step::Classify(_, n) | Step::ShiftLsl(n) | Step::SoRegShift(n) => n,
                    _ => continue,
                };
                assert_ne!(
                    op_type(opcode, slot as usize),
                    OpType::Invalid,
                    "opcode {opcode} slot {slot}"
                );
            }
        }
    }

    #[test]
    fn undeclared_slot_is_invalid() {
        assert_eq!(op_type(opc::BX, 5), OpType::Invalid);
        assert_eq!(op_access(opc::BX, 5), Access::empty());
        assert_eq!(op_desc(opc::BX, 0).dtypes, &[DataType::I32]);
    }

    #[test]
    #[should_panic(expected = "opcode out of range")]
    fn opcode_out_of_range_is_fatal() {
        op_desc(opc::INSTRUCTION_LIST_END, 0);
    }

    #[test]
    #[should_panic(expected = "operand slot 16 out of range")]
    fn slot_out_of_range_is_fatal() {
        op_desc(opc::BX, MAX_OPERANDS);
    }

    #[test]
    fn mclass_lookups() {
        let g = mclass_sysreg_by_12bit(0x400).unwrap();
        assert_eq!(g.reg, ArmSysreg::APSR_G);
        assert!(g.requires_dsp);
        assert!(mclass_sysreg_by_12bit(0x014).is_none());
        assert_eq!(mclass_sysreg_by_8bit(0x98), Some(ArmSysreg::SP_NS));
        assert_eq!(mclass_sysreg_by_8bit(0x04), None);
        assert_eq!(
            mclass_sysreg_apsr_non_deprecated(0x03),
            Some(ArmSysreg::XPSR_NZCVQ)
        );
    }
}
