//! ARM operand detail builder.
//!
//! The builder turns raw decoder operands into classified [`ArmOp`]s. It is
//! driven by a sequence of [`ClassifyRequest`]s in the order the operands
//! appear in the instruction's assembly form (see [`crate::arm_tables::walk`]).
//! What a raw operand *means* comes from two places: the operand group the
//! request names, and the declared [`OpType`] in the opcode metadata table.
//! The raw operand's own tag is never trusted to decide anything.
//!
//! ## Memory operands
//!
//! One ARM memory operand is assembled from several raw operands (base,
//! index, displacement, lane). The builder keeps a two-state [`MemState`]:
//!
//! ```text
//!   Idle ──begin_mem──▶ Building ──end_mem──▶ Idle
//!                        │    ▲
//!                        └────┘ set base / index / disp / shift / lane
//! ```
//!
//! While `Building`, the operand lives in the slot past the last committed
//! operand and is invisible to readers; `end_mem` commits it. Opening twice
//! or closing while idle is a caller bug and trips a debug assertion.
//!
//! ## Contract violations
//!
//! An operand group with no detail mapping, a predicate code out of range, a
//! zero IT mask or a raw operand of the wrong kind all mean the tables and
//! the decoder disagree. Guessing would shift every following operand out of
//! place, so these log at `error` level and panic.

use core::fmt;

use crate::arm::{
    translate_shift_imm, ArmCc, ArmDetail, ArmMem, ArmOp, ArmOpValue, ArmReg, ArmShifter,
    ArmSysreg, ArmVcc,
};
use crate::arm_tables::{self, opc, OpType, Step};
use crate::arm_transform::{
    add_pc, qpr_to_dpr_list_0, qpr_to_dpr_list_1, qpr_to_dpr_list_2, qpr_to_dpr_list_3,
    shift_left_3, ValueTransform,
};
use crate::detail::Access;
use crate::ir::{Features, McInst};

// ── Operand groups ───────────────────────────────────────────────────────

/// Flavour of a condition-code operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    /// Optional predicate; code 15 means "none".
    Plain,
    /// Always printed.
    Mandatory,
    /// Always printed, inverted in the assembly form.
    MandatoryInverted,
    /// Restricted set used by MVE compares; `hs` is kept as `hs`.
    MandatoryRestricted,
}

/// Number of D registers in a NEON vector list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VectorListLen {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

/// Operand groups that exist in the instruction set but have no detail
/// mapping yet. Template arguments of the assembly printer are carried as
/// typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnimplementedGroup {
    SoRegReg,
    ModImm,
    T2So,
    ThumbS4Imm,
    ThumbSrImm,
    BitfieldInvMaskImm,
    CpsiMod,
    CpsiFlag,
    GprPair,
    MemBOption,
    FpImm,
    VectorIndex,
    InstSyncBOption,
    CoprocOptionImm,
    PostIdxImm8s4,
    ThumbLdrLabel,
    ThumbAddrModeImm5S1,
    ThumbAddrModeImm5S2,
    ThumbAddrModeImm5S4,
    ThumbAddrModeRr,
    ThumbAddrModeSp,
    AddrMode2,
    AddrMode2Offset,
    AddrMode3Offset,
    T2AddrModeSoReg,
    T2AddrModeImm8Offset,
    T2AddrModeImm8s4Offset,
    T2AddrModeImm0_1020s4,
    PostIdxReg,
    PostIdxImm8,
    BankedReg,
    PkhLslShiftImm,
    PkhAsrShiftImm,
    ImmPlusOne,
    Setend,
    MveSaturate,
    ShiftImm,
    RotImm,
    AddrModeTbb,
    AddrModeTbh,
    TraceSyncBOption,
    VmovModImm,
    FBits16,
    FBits32,
    VectorListAllLanes(VectorListLen),
    VectorListSpaced(VectorListLen),
    VectorListSpacedAllLanes(VectorListLen),
    VptMask,
    AdrLabel { shift: u8 },
    AddrMode5 { always_print_imm0: bool },
    AddrMode5Fp16 { always_print_imm0: bool },
    AddrModeImm12 { always_print_imm0: bool },
    AddrMode3 { always_print_imm0: bool },
    T2AddrModeImm8 { always_print_imm0: bool },
    T2AddrModeImm8s4 { always_print_imm0: bool },
    MveVectorList { regs: u8 },
    MveAddrModeRq { shift: u8 },
    ComplexRotation { angle: u16, remainder: u16 },
}

/// What a raw operand is, as far as the assembly form is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpGroup {
    Predicate(PredicateKind),
    VptPredicate,
    /// No special handling: the declared operand type decides.
    Operand,
    PImmediate,
    CImmediate,
    AddrMode6,
    AddrMode6Offset,
    AddrMode7,
    SBitModifier,
    VectorList(VectorListLen),
    NoHashImmediate,
    RegisterList,
    ThumbItMask,
    MsrMask,
    Unimplemented(UnimplementedGroup),
}

/// One unit of work for the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifyRequest {
    /// Classify raw operand `op` as a member of `group`.
    Operand { group: OpGroup, op: u8 },
    /// Attach a shift to the open memory operand, or else to the last
    /// committed operand. `opc` is the decoder's shift opcode.
    RegImmShift { opc: u8, imm: u32 },
}

/// Memory operand assembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemState {
    #[default]
    Idle,
    Building,
}

#[derive(Clone, Copy)]
enum ImmKind {
    Imm,
    Pimm,
    Cimm,
}

const VECTOR_LIST_TRANSFORMS: [ValueTransform; 4] = [
    qpr_to_dpr_list_0,
    qpr_to_dpr_list_1,
    qpr_to_dpr_list_2,
    qpr_to_dpr_list_3,
];

/// Logs and aborts on a table/decoder disagreement.
#[cold]
#[track_caller]
pub(crate) fn contract_violation(opcode: u32, what: fmt::Arguments<'_>) -> ! {
    tracing::error!(opcode, "ARM detail contract violation: {}", what);
    panic!("ARM detail contract violation (opcode {}): {}", opcode, what);
}

// ── Builder ──────────────────────────────────────────────────────────────

/// Builds the operand list of one instruction.
///
/// The builder borrows the instruction and its ARM detail for exactly one
/// build, so the memory state can never leak into another instruction.
pub struct DetailBuilder<'a> {
    inst: &'a McInst,
    detail: &'a mut ArmDetail,
    features: Features,
    mem: MemState,
}

impl<'a> DetailBuilder<'a> {
    pub fn new(inst: &'a McInst, detail: &'a mut ArmDetail, features: Features) -> Self {
        Self {
            inst,
            detail,
            features,
            mem: MemState::Idle,
        }
    }

    /// Current memory operand state.
    #[inline]
    pub fn mem_state(&self) -> MemState {
        self.mem
    }

    #[inline]
    fn doing_mem(&self) -> bool {
        self.mem == MemState::Building
    }

    /// Number of committed operands.
    #[inline]
    pub fn op_count(&self) -> usize {
        self.detail.operands.len()
    }

    /// Replays an operand walk.
    pub fn run(&mut self, steps: &[Step]) -> &mut Self {
        for step in steps {
            match *step {
                Step::Classify(group, op) => {
                    self.classify(ClassifyRequest::Operand { group, op });
                }
                Step::ShiftLsl(op) => {
                    let imm = self.raw_imm(op as usize) as u32;
                    self.classify(ClassifyRequest::RegImmShift {
                        opc: ArmShifter::Lsl as u8,
                        imm,
                    });
                }
                Step::SoRegShift(op) => {
                    let imm = self.raw_imm(op as usize) as u32;
                    self.classify(ClassifyRequest::RegImmShift {
                        opc: (imm & 7) as u8,
                        imm: imm >> 3,
                    });
                }
                Step::BeginMem => {
                    self.begin_mem();
                }
                Step::EndMem => {
                    self.end_mem();
                }
                Step::Writeback => {
                    self.set_writeback();
                }
            }
        }
        self
    }

    /// Opens a memory operand in the slot past the last committed operand.
    pub fn begin_mem(&mut self) -> &mut Self {
        debug_assert!(
            self.mem == MemState::Idle,
            "memory operand already open (opcode {})",
            self.inst.opcode
        );
        self.mem = MemState::Building;
        let access = arm_tables::op_access(self.inst.opcode, self.op_count());
        *self.detail.operands.active_mut() = ArmOp::mem(ArmMem::default(), access);
        self
    }

    /// Commits the open memory operand.
    pub fn end_mem(&mut self) -> &mut Self {
        debug_assert!(
            self.mem == MemState::Building,
            "no memory operand open (opcode {})",
            self.inst.opcode
        );
        self.mem = MemState::Idle;
        self.detail.operands.commit();
        self
    }

    /// Marks base register writeback.
    pub fn set_writeback(&mut self) -> &mut Self {
        self.detail.writeback = true;
        self
    }

    /// Ends the build. A memory operand still open here is a walk bug.
    pub fn finish(self) {
        debug_assert!(
            self.mem == MemState::Idle,
            "memory operand left open (opcode {})",
            self.inst.opcode
        );
    }

    /// Classifies one request.
    pub fn classify(&mut self, req: ClassifyRequest) -> &mut Self {
        match req {
            ClassifyRequest::RegImmShift { opc, imm } => self.reg_imm_shift(opc, imm),
            ClassifyRequest::Operand { group, op } => self.operand_group(group, op as usize),
        }
        self
    }

    fn operand_group(&mut self, group: OpGroup, op: usize) {
        match group {
            OpGroup::Predicate(kind) => self.predicate(kind, op),
            OpGroup::VptPredicate => {
                let raw = self.raw_imm(op);
                match ArmVcc::from_raw(raw) {
                    Some(vcc) => self.detail.vcc = vcc,
                    None => self.violation(format_args!("VPT predicate {} out of range", raw)),
                }
            }
            OpGroup::Operand => self.generic_operand(op),
            OpGroup::PImmediate => self.push_imm(op, ImmKind::Pimm, None),
            OpGroup::CImmediate => self.push_imm(op, ImmKind::Cimm, None),
            OpGroup::AddrMode6 => {
                self.begin_mem();
                self.set_mem(op, true, None);
                self.set_mem(op + 1, false, Some(shift_left_3));
                self.end_mem();
            }
            OpGroup::AddrMode6Offset => {
                if self.raw_reg(op) != 0 {
                    self.push_reg(op, None);
                }
            }
            OpGroup::AddrMode7 => {
                self.begin_mem();
                self.set_mem(op, true, None);
                self.end_mem();
            }
            OpGroup::SBitModifier => {
                if self.raw_reg(op) != 0 {
                    self.detail.update_flags = true;
                }
            }
            OpGroup::VectorList(len) => {
                for transform in &VECTOR_LIST_TRANSFORMS[..len as usize] {
                    self.push_reg(op, Some(*transform));
                }
            }
            OpGroup::NoHashImmediate => {
                if self.doing_mem() {
                    self.set_neon_lane(op);
                } else {
                    self.push_imm(op, ImmKind::Imm, None);
                }
            }
            OpGroup::RegisterList => {
                let access = arm_tables::op_access(self.inst.opcode, op);
                for i in op..self.inst.num_operands() {
                    let reg = self.raw_reg(i);
                    self.detail.operands.push(ArmOp::reg(ArmReg(reg), access));
                }
            }
            OpGroup::ThumbItMask => self.it_mask(op),
            OpGroup::MsrMask => self.msr_mask(op),
            OpGroup::Unimplemented(g) => self.violation(format_args!(
                "operand group {:?} at operand {} has no detail mapping",
                g, op
            )),
        }
    }

    fn generic_operand(&mut self, op: usize) {
        let ty = arm_tables::op_type(self.inst.opcode, op);
        match ty {
            OpType::Imm | OpType::MemImm => {
                if self.doing_mem() {
                    self.set_mem(op, false, None);
                } else {
                    self.push_imm(op, ImmKind::Imm, Some(add_pc));
                }
            }
            OpType::Reg | OpType::MemReg | OpType::MemIndexReg => {
                if self.doing_mem() {
                    self.set_mem(op, ty != OpType::MemIndexReg, None);
                } else {
                    self.push_reg(op, None);
                }
            }
            OpType::Pred => self.push_pred(op),
            OpType::Invalid => {
                self.violation(format_args!("operand {} has no declared type", op));
            }
        }
    }

    fn predicate(&mut self, kind: PredicateKind, op: usize) {
        let code = self.raw_imm(op);
        if code == 15 && kind == PredicateKind::Plain {
            self.detail.cc = ArmCc::Invalid;
            return;
        }
        if code == 2 && kind == PredicateKind::MandatoryRestricted {
            self.detail.cc = ArmCc::Hs;
            return;
        }
        match u8::try_from(code).ok().and_then(ArmCc::from_encoding) {
            Some(cc) => self.detail.cc = cc,
            None => self.violation(format_args!("condition code {} out of range", code)),
        }
    }

    /// Decodes the IT mask into the then/else layout:
    /// one bit per extra instruction, MSB first, `0` = then, `1` = else,
    /// followed by a terminal `1`.
    ///
    /// ```text
    ///   it    0b1     itt   0b01     ite   0b11
    ///   itee  0b111   itete 0b1011
    /// ```
    fn it_mask(&mut self, op: usize) {
        if op == 0 {
            self.violation(format_args!("IT mask without a preceding condition"));
        }
        let mask = (self.raw_imm(op) as u32) & 0xf;
        if mask == 0 {
            self.violation(format_args!("IT mask is zero"));
        }
        let cond_bit0 = (self.raw_imm(op - 1) as u32) & 1;
        let tz = mask.trailing_zeros();
        let mut pred: u8 = 0;
        for pos in (tz + 1..=3).rev() {
            let then = (mask >> pos) & 1 == cond_bit0;
            pred = (pred << 1) | u8::from(!then);
        }
        self.detail.pred_mask = (pred << 1) | 1;
    }

    fn msr_mask(&mut self, op: usize) {
        let raw = self.raw_imm(op) as u32;
        let access = arm_tables::op_access(self.inst.opcode, op);

        if self.inst.is_mclass() {
            let is_msr_m = self.inst.opcode == opc::T2MSR_M;
            let sysm12 = (raw & 0xfff) as u16;
            if is_msr_m && self.features.contains(Features::DSP) {
                if let Some(entry) = arm_tables::mclass_sysreg_by_12bit(sysm12) {
                    if entry.requires_dsp {
                        self.push_sysreg(entry.reg, access);
                        return;
                    }
                }
            }
            let sysm = sysm12 & 0xff;
            if is_msr_m && self.features.contains(Features::V7) {
                if let Some(reg) = arm_tables::mclass_sysreg_apsr_non_deprecated(sysm) {
                    self.push_sysreg(reg, access);
                    return;
                }
            }
            if let Some(reg) = arm_tables::mclass_sysreg_by_8bit(sysm) {
                self.push_sysreg(reg, access);
                return;
            }
            self.detail
                .operands
                .push(ArmOp::imm(i64::from(sysm), access));
            return;
        }

        let r_bit = (raw >> 4) & 1 != 0;
        let mask = raw & 0xf;
        if !r_bit {
            let named = match mask {
                4 => Some(ArmSysreg::APSR_G),
                8 => Some(ArmSysreg::APSR_NZCVQ),
                12 => Some(ArmSysreg::APSR_NZCVQG),
                _ => None,
            };
            if let Some(reg) = named {
                self.push_sysreg(reg, access);
                return;
            }
        }
        if mask == 0 {
            return;
        }
        let (f, s, x, c) = if r_bit {
            (
                ArmSysreg::SPSR_F,
                ArmSysreg::SPSR_S,
                ArmSysreg::SPSR_X,
                ArmSysreg::SPSR_C,
            )
        } else {
            (
                ArmSysreg::CPSR_F,
                ArmSysreg::CPSR_S,
                ArmSysreg::CPSR_X,
                ArmSysreg::CPSR_C,
            )
        };
        let mut reg = 0u16;
        if mask & 8 != 0 {
            reg |= f.0;
        }
        if mask & 4 != 0 {
            reg |= s.0;
        }
        if mask & 2 != 0 {
            reg |= x.0;
        }
        if mask & 1 != 0 {
            reg |= c.0;
        }
        self.push_sysreg(ArmSysreg(reg), access);
    }

    fn reg_imm_shift(&mut self, opc: u8, imm: u32) {
        let kind = match ArmShifter::from_shift_opc(opc) {
            Some(kind) => kind,
            None => self.violation(format_args!("shift opcode {} out of range", opc)),
        };
        // No shift, and `lsl #0`, leave the operand unshifted.
        if kind == ArmShifter::Invalid || (kind == ArmShifter::Lsl && imm == 0) {
            return;
        }
        let target = if self.doing_mem() {
            self.detail.operands.active_mut()
        } else {
            match self.detail.operands.last_mut() {
                Some(op) => op,
                None => contract_violation(
                    self.inst.opcode,
                    format_args!("shift with no operand to attach to"),
                ),
            }
        };
        target.shift.kind = kind;
        if kind != ArmShifter::Rrx {
            target.shift.value = translate_shift_imm(imm);
        }
    }

    // ── Primitive appenders ──────────────────────────────────────────────

    fn push_reg(&mut self, op: usize, transform: Option<ValueTransform>) {
        let ty = arm_tables::op_type(self.inst.opcode, op);
        if !ty.is_reg() {
            self.violation(format_args!("operand {} declared {:?}, not a register", op, ty));
        }
        let raw = u64::from(self.raw_reg(op));
        let reg = transform.map_or(raw, |t| t(self.inst, op, raw));
        let access = arm_tables::op_access(self.inst.opcode, op);
        self.detail
            .operands
            .push(ArmOp::reg(ArmReg(reg as u16), access));
    }

    fn push_imm(&mut self, op: usize, kind: ImmKind, transform: Option<ValueTransform>) {
        let raw = self.raw_imm(op) as u64;
        let value = transform.map_or(raw, |t| t(self.inst, op, raw)) as i64;
        let access = arm_tables::op_access(self.inst.opcode, op);
        let value = match kind {
            ImmKind::Imm => ArmOpValue::Imm(value),
            ImmKind::Pimm => ArmOpValue::Pimm(value),
            ImmKind::Cimm => ArmOpValue::Cimm(value),
        };
        self.detail.operands.push(ArmOp {
            value,
            access,
            ..ArmOp::EMPTY
        });
    }

    fn push_pred(&mut self, op: usize) {
        let value = self.raw_imm(op);
        let access = arm_tables::op_access(self.inst.opcode, op);
        self.detail.operands.push(ArmOp {
            value: ArmOpValue::Pred(value),
            access,
            ..ArmOp::EMPTY
        });
    }

    fn push_sysreg(&mut self, reg: ArmSysreg, access: Access) {
        self.detail.operands.push(ArmOp {
            access,
            ..ArmOp::sysreg(reg)
        });
    }

    /// Writes one field of the open memory operand. Registers become the
    /// base or the index, immediates the displacement; the declared type of
    /// raw operand `op` decides which.
    fn set_mem(&mut self, op: usize, is_base: bool, transform: Option<ValueTransform>) {
        let opcode = self.inst.opcode;
        let ty = arm_tables::op_type(opcode, op);
        let raw = self.inst.operand(op);
        let access = arm_tables::op_access(opcode, op);
        let slot = self.detail.operands.active_mut();
        let mut mem = match slot.value {
            ArmOpValue::Mem(m) => m,
            _ => ArmMem::default(),
        };
        if ty.is_reg() {
            let Some(reg) = raw.as_reg() else {
                contract_violation(opcode, format_args!("operand {} is not a register", op));
            };
            let reg = transform.map_or(u64::from(reg), |t| t(self.inst, op, u64::from(reg)));
            if is_base {
                mem.base = ArmReg(reg as u16);
            } else {
                mem.index = ArmReg(reg as u16);
            }
        } else if ty.is_imm() {
            let Some(imm) = raw.as_imm() else {
                contract_violation(opcode, format_args!("operand {} is not an immediate", op));
            };
            mem.disp = transform.map_or(imm as u64, |t| t(self.inst, op, imm as u64)) as i32;
        } else {
            contract_violation(
                opcode,
                format_args!("operand {} declared {:?} inside a memory operand", op, ty),
            );
        }
        slot.value = ArmOpValue::Mem(mem);
        slot.access = access;
        slot.subtracted = false;
    }

    /// Folds a lane index into the previous operand, which the following
    /// `end_mem` re-seals.
    fn set_neon_lane(&mut self, op: usize) {
        let lane = self.raw_imm(op);
        if self.detail.operands.is_empty() {
            self.violation(format_args!("lane index with no preceding operand"));
        }
        self.detail.operands.retract();
        self.detail.operands.active_mut().neon_lane = lane as i8;
    }

    // ── Raw operand access ───────────────────────────────────────────────

    fn raw_reg(&self, op: usize) -> u16 {
        match self.inst.operand(op).as_reg() {
            Some(r) => r,
            None => self.violation(format_args!("operand {} is not a register", op)),
        }
    }

    fn raw_imm(&self, op: usize) -> i64 {
        match self.inst.operand(op).as_imm() {
            Some(v) => v,
            None => self.violation(format_args!("operand {} is not an immediate", op)),
        }
    }

    #[track_caller]
    fn violation(&self, what: fmt::Arguments<'_>) -> ! {
        contract_violation(self.inst.opcode, what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Mode;

    fn build(inst: &McInst, steps: &[Step]) -> ArmDetail {
        let mut detail = ArmDetail::new();
        let mut b = DetailBuilder::new(inst, &mut detail, Features::default());
        b.run(steps);
        b.finish();
        detail
    }

    fn op(group: OpGroup, op: u8) -> ClassifyRequest {
        ClassifyRequest::Operand { group, op }
    }

    // ── Predicates ────────────────────────────────────────────────

    #[test]
    fn plain_predicate_15_is_no_condition() {
        let mut inst = McInst::new(opc::MOVR, 0, Mode::ARM);
        inst.push_reg(ArmReg::r(0).0).push_reg(ArmReg::r(1).0).push_imm(15).push_reg(0);
        let d = build(&inst, &[Step::Classify(OpGroup::Predicate(PredicateKind::Plain), 2)]);
        assert_eq!(d.cc, ArmCc::Invalid);
        assert_eq!(d.op_count(), 0, "predicates never append operands");
    }

    #[test]
    fn predicate_is_encoding_plus_one() {
        let mut inst = McInst::new(opc::BCC, 0, Mode::ARM);
        inst.push_imm(0).push_imm(1).push_reg(ArmReg::CPSR.0);
        let d = build(&inst, &[Step::Classify(OpGroup::Predicate(PredicateKind::Plain), 1)]);
        assert_eq!(d.cc, ArmCc::Ne);
        assert_eq!(d.cc as u8, 2);
    }

    #[test]
    fn restricted_predicate_keeps_hs() {
        let mut inst = McInst::new(opc::T2CSEL, 0, Mode::THUMB);
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(2);
        let kind = PredicateKind::MandatoryRestricted;
        let d = build(&inst, &[Step::Classify(OpGroup::Predicate(kind), 3)]);
        assert_eq!(d.cc, ArmCc::Hs);
    }

    #[test]
    fn inverted_predicate_stores_the_raw_condition() {
        let mut inst = McInst::new(opc::T2CSEL, 0, Mode::THUMB);
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(0);
        let kind = PredicateKind::MandatoryInverted;
        let d = build(&inst, &[Step::Classify(OpGroup::Predicate(kind), 3)]);
        assert_eq!(d.cc, ArmCc::Eq);
        assert_eq!(d.op_count(), 0);
    }

    #[test]
    #[should_panic(expected = "condition code 15 out of range")]
    fn mandatory_predicate_rejects_15() {
        let mut inst = McInst::new(opc::T2CSEL, 0, Mode::THUMB);
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(15);
        let kind = PredicateKind::Mandatory;
        build(&inst, &[Step::Classify(OpGroup::Predicate(kind), 3)]);
    }

    #[test]
    fn vpt_predicate_sets_vcc() {
        let mut inst = McInst::new(opc::MVE_VADDI32, 0, Mode::THUMB);
        let q = |n| ArmReg::q(n).0;
        inst.push_reg(q(0)).push_reg(q(1)).push_reg(q(2)).push_imm(2).push_reg(0);
        let d = build(&inst, &[Step::Classify(OpGroup::VptPredicate, 3)]);
        assert_eq!(d.vcc, ArmVcc::Else);
    }

    #[test]
    #[should_panic(expected = "VPT predicate 3 out of range")]
    fn vpt_predicate_out_of_range() {
        let mut inst = McInst::new(opc::MVE_VADDI32, 0, Mode::THUMB);
        inst.push_reg(50).push_reg(51).push_reg(52).push_imm(3).push_reg(0);
        build(&inst, &[Step::Classify(OpGroup::VptPredicate, 3)]);
    }

    // ── Generic operands & lists ──────────────────────────────────

    #[test]
    fn register_list_shares_access() {
        let mut inst = McInst::new(opc::T2LDMIA, 0, Mode::THUMB);
        inst.push_reg(ArmReg::r(0).0).push_imm(14).push_reg(0);
        for r in 1..=3 {
            inst.push_reg(ArmReg::r(r).0);
        }
        let d = build(&inst, &[Step::Classify(OpGroup::RegisterList, 3)]);
        assert_eq!(d.op_count(), 3);
        for (k, op) in d.operands.iter().enumerate() {
            assert_eq!(op.as_reg(), Some(ArmReg::r(k as u16 + 1)));
            assert_eq!(op.access, Access::WRITE);
        }
    }

    #[test]
    fn generic_immediate_gets_pc_added_for_branches() {
        let mut inst = McInst::new(opc::BL, 0x100, Mode::ARM);
        inst.push_imm(0x40);
        let d = build(&inst, &[Step::Classify(OpGroup::Operand, 0)]);
        assert_eq!(d.operands[0].value, ArmOpValue::Imm(0x148));
    }

    #[test]
    fn generic_declared_pred_appends_pred_operand() {
        let mut inst = McInst::new(opc::MVE_VADDI32, 0, Mode::THUMB);
        inst.push_reg(50).push_reg(51).push_reg(52).push_imm(1).push_reg(0);
        let d = build(&inst, &[Step::Classify(OpGroup::Operand, 3)]);
        assert_eq!(d.operands[0].value, ArmOpValue::Pred(1));
    }

    #[test]
    fn pimm_and_cimm() {
        let mut inst = McInst::new(opc::CDP, 0, Mode::ARM);
        for v in [7, 1, 2, 3, 4, 5, 14] {
            inst.push_imm(v);
        }
        inst.push_reg(0);
        let d = build(
            &inst,
            &[
                Step::Classify(OpGroup::PImmediate, 0),
                Step::Classify(OpGroup::CImmediate, 2),
            ],
        );
        assert_eq!(d.operands[0].value, ArmOpValue::Pimm(7));
        assert_eq!(d.operands[1].value, ArmOpValue::Cimm(2));
    }

    #[test]
    fn sbit_only_when_cc_out_is_set() {
        let mut movs = McInst::new(opc::MOVR, 0, Mode::ARM);
        movs.push_reg(68).push_reg(69).push_imm(14).push_reg(0).push_reg(ArmReg::CPSR.0);
        let d = build(&movs, &[Step::Classify(OpGroup::SBitModifier, 4)]);
        assert!(d.update_flags);

        let mut mov = McInst::new(opc::MOVR, 0, Mode::ARM);
        mov.push_reg(68).push_reg(69).push_imm(14).push_reg(0).push_reg(0);
        let d = build(&mov, &[Step::Classify(OpGroup::SBitModifier, 4)]);
        assert!(!d.update_flags);
    }

    #[test]
    fn vector_list_two_renumbers_quad() {
        let mut inst = McInst::new(opc::VLD2D16, 0, Mode::ARM);
        inst.push_reg(ArmReg::q(2).0).push_reg(ArmReg::r(0).0).push_imm(0);
        inst.push_imm(14).push_reg(0);
        let d = build(&inst, &[Step::Classify(OpGroup::VectorList(VectorListLen::Two), 0)]);
        assert_eq!(d.op_count(), 2);
        assert_eq!(d.operands[0].as_reg(), Some(ArmReg::d(4)));
        assert_eq!(d.operands[1].as_reg(), Some(ArmReg::d(5)));
    }

    #[test]
    fn vector_list_three_and_four() {
        let mut inst = McInst::new(opc::VLD2D16, 0, Mode::ARM);
        inst.push_reg(ArmReg::q(1).0).push_reg(ArmReg::r(0).0).push_imm(0);
        inst.push_imm(14).push_reg(0);

        let d = build(&inst, &[Step::Classify(OpGroup::VectorList(VectorListLen::Three), 0)]);
        assert_eq!(d.op_count(), 3);
        for (k, op) in d.operands.iter().enumerate() {
            assert_eq!(op.as_reg(), Some(ArmReg::d(2 + k as u16)));
            assert_eq!(op.access, Access::WRITE);
        }

        let d = build(&inst, &[Step::Classify(OpGroup::VectorList(VectorListLen::Four), 0)]);
        assert_eq!(d.op_count(), 4);
        assert_eq!(d.operands[3].as_reg(), Some(ArmReg::d(5)));
    }

    // ── Memory protocol ───────────────────────────────────────────

    fn ldrh() -> McInst {
        let mut inst = McInst::new(opc::T_LDRHI, 0, Mode::THUMB);
        inst.push_reg(ArmReg::r(5).0).push_reg(ArmReg::r(7).0).push_imm(62);
        inst.push_imm(14).push_reg(0);
        inst
    }

    #[test]
    fn open_close_adds_exactly_one() {
        let inst = ldrh();
        let mut detail = ArmDetail::new();
        let mut b = DetailBuilder::new(&inst, &mut detail, Features::default());
        b.begin_mem();
        assert_eq!(b.op_count(), 0);
        assert_eq!(b.mem_state(), MemState::Building);
        b.classify(op(OpGroup::Operand, 1));
        b.classify(op(OpGroup::Operand, 2));
        assert_eq!(b.op_count(), 0, "open operand is not yet visible");
        b.end_mem();
        assert_eq!(b.op_count(), 1);
        b.finish();
        let mem = detail.operands[0].as_mem().copied().unwrap();
        assert_eq!(mem.base, ArmReg::r(7));
        assert_eq!(mem.index, ArmReg::INVALID);
        assert_eq!(mem.disp, 62);
        assert_eq!(mem.scale, 1);
        assert_eq!(detail.operands[0].access, Access::READ);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "memory operand already open")]
    fn double_open_is_rejected() {
        let inst = ldrh();
        let mut detail = ArmDetail::new();
        let mut b = DetailBuilder::new(&inst, &mut detail, Features::default());
        b.begin_mem();
        b.begin_mem();
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "no memory operand open")]
    fn close_while_idle_is_rejected() {
        let inst = ldrh();
        let mut detail = ArmDetail::new();
        DetailBuilder::new(&inst, &mut detail, Features::default()).end_mem();
    }

    #[test]
    fn index_register_from_declared_type() {
        let mut inst = McInst::new(opc::T2TBB, 0, Mode::THUMB);
        inst.push_reg(ArmReg::r(3).0).push_reg(ArmReg::r(8).0).push_imm(14).push_reg(0);
        let d = build(
            &inst,
            &[
                Step::BeginMem,
                Step::Classify(OpGroup::Operand, 0),
                Step::Classify(OpGroup::Operand, 1),
                Step::EndMem,
            ],
        );
        let mem = d.operands[0].as_mem().copied().unwrap();
        assert_eq!(mem.base, ArmReg::r(3));
        assert_eq!(mem.index, ArmReg::r(8));
    }

    #[test]
    fn shift_lands_on_open_memory_operand() {
        let mut inst = McInst::new(opc::T2LDRS, 0, Mode::THUMB);
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(2).push_imm(14).push_reg(0);
        let d = build(
            &inst,
            &[
                Step::BeginMem,
                Step::Classify(OpGroup::Operand, 1),
                Step::Classify(OpGroup::Operand, 2),
                Step::ShiftLsl(3),
                Step::EndMem,
            ],
        );
        assert_eq!(d.operands[0].shift.kind, ArmShifter::Lsl);
        assert_eq!(d.operands[0].shift.value, 2);
    }

    #[test]
    fn so_reg_shift_on_last_operand() {
        let mut inst = McInst::new(opc::ADDRSI, 0, Mode::ARM);
        // asr #0 encodes asr #32
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(1);
        inst.push_imm(14).push_reg(0).push_reg(0);
        let d = build(
            &inst,
            &[Step::Classify(OpGroup::Operand, 2), Step::SoRegShift(3)],
        );
        assert_eq!(d.operands[0].shift.kind, ArmShifter::Asr);
        assert_eq!(d.operands[0].shift.value, 32);
    }

    #[test]
    fn lsl_zero_is_no_shift() {
        let mut inst = McInst::new(opc::ADDRSI, 0, Mode::ARM);
        inst.push_reg(66).push_reg(67).push_reg(68).push_imm(2);
        inst.push_imm(14).push_reg(0).push_reg(0);
        let d = build(
            &inst,
            &[Step::Classify(OpGroup::Operand, 2), Step::SoRegShift(3)],
        );
        assert_eq!(d.operands[0].shift.kind, ArmShifter::Invalid);
    }

    #[test]
    fn addrmode6_is_self_contained() {
        let mut inst = McInst::new(opc::VLD1D8, 0, Mode::ARM);
        inst.push_reg(ArmReg::d(0).0).push_reg(ArmReg::r(0).0).push_imm(8);
        inst.push_imm(14).push_reg(0);
        let d = build(&inst, &[Step::Classify(OpGroup::AddrMode6, 1)]);
        assert_eq!(d.op_count(), 1);
        let mem = d.operands[0].as_mem().copied().unwrap();
        assert_eq!(mem.base, ArmReg::r(0));
        assert_eq!(mem.disp, 64);
    }

    #[test]
    fn addrmode7_is_base_only() {
        let mut inst = McInst::new(opc::LDREX, 0, Mode::ARM);
        inst.push_reg(ArmReg::r(2).0).push_reg(ArmReg::r(1).0).push_imm(14).push_reg(0);
        let d = build(
            &inst,
            &[
                Step::Classify(OpGroup::Operand, 0),
                Step::Classify(OpGroup::AddrMode7, 1),
            ],
        );
        assert_eq!(d.op_count(), 2);
        let mem = d.operands[1].as_mem().copied().unwrap();
        assert_eq!(mem.base, ArmReg::r(1));
        assert_eq!(mem.index, ArmReg::INVALID);
        assert_eq!(mem.disp, 0);
        assert_eq!(d.operands[1].access, Access::READ);
    }

    fn vst1_wb(rm: u16) -> McInst {
        let mut inst = McInst::new(opc::VST1D8_WB_REG, 0, Mode::ARM);
        inst.push_reg(ArmReg::r(0).0).push_reg(ArmReg::r(0).0).push_imm(0);
        inst.push_reg(rm).push_reg(ArmReg::d(0).0).push_imm(14).push_reg(0);
        inst
    }

    #[test]
    fn addrmode6_offset_only_for_a_register() {
        let steps = [Step::Classify(OpGroup::AddrMode6Offset, 3)];

        let d = build(&vst1_wb(0), &steps);
        assert_eq!(d.op_count(), 0, "no register means fixed post-increment");

        let d = build(&vst1_wb(ArmReg::r(2).0), &steps);
        assert_eq!(d.op_count(), 1);
        assert_eq!(d.operands[0].as_reg(), Some(ArmReg::r(2)));
        assert_eq!(d.operands[0].access, Access::READ);
    }

    #[test]
    fn lane_folds_into_previous_operand() {
        let mut inst = McInst::new(opc::VLD1LND8, 0, Mode::ARM);
        inst.push_reg(ArmReg::d(0).0).push_reg(ArmReg::r(0).0).push_imm(0);
        inst.push_reg(ArmReg::d(0).0).push_imm(3).push_imm(14).push_reg(0);
        let d = build(
            &inst,
            &[
                Step::Classify(OpGroup::Operand, 0),
                Step::BeginMem,
                Step::Classify(OpGroup::NoHashImmediate, 4),
                Step::EndMem,
            ],
        );
        assert_eq!(d.op_count(), 1);
        assert_eq!(d.operands[0].as_reg(), Some(ArmReg::d(0)));
        assert_eq!(d.operands[0].neon_lane, 3);
    }

    #[test]
    fn nohash_outside_memory_is_immediate() {
        let mut inst = McInst::new(opc::VLD1LND8, 0, Mode::ARM);
        inst.push_reg(14).push_reg(66).push_imm(0).push_reg(14).push_imm(3);
        let d = build(&inst, &[Step::Classify(OpGroup::NoHashImmediate, 4)]);
        assert_eq!(d.operands[0].value, ArmOpValue::Imm(3));
        assert_eq!(d.operands[0].neon_lane, -1);
    }

    // ── IT mask ───────────────────────────────────────────────────

    fn it(first_cond: i64, mask: i64) -> u8 {
        let mut inst = McInst::new(opc::T_IT, 0, Mode::THUMB);
        inst.push_imm(first_cond).push_imm(mask);
        build(&inst, &[Step::Classify(OpGroup::ThumbItMask, 1)]).pred_mask
    }

    #[test]
    fn it_mask_layouts() {
        // it eq
        assert_eq!(it(0, 0b1000), 0b1);
        // itt eq / ite eq
        assert_eq!(it(0, 0b0100), 0b01);
        assert_eq!(it(0, 0b1100), 0b11);
        // ite ne: the else bit is the inverse of cond bit 0
        assert_eq!(it(1, 0b0100), 0b11);
        assert_eq!(it(1, 0b1100), 0b01);
        // itee eq
        assert_eq!(it(0, 0b1110), 0b111);
        // itttt eq: only the terminal bit
        assert_eq!(it(0, 0b0001), 0b0001);
        // itete eq
        assert_eq!(it(0, 0b1011), 0b1011);
    }

    #[test]
    #[should_panic(expected = "IT mask is zero")]
    fn it_mask_zero_is_fatal() {
        it(0, 0);
    }

    // ── MSR mask ──────────────────────────────────────────────────

    fn msr(mode: Mode, opcode: u32, raw: i64, features: Features) -> ArmOp {
        let mut inst = McInst::new(opcode, 0, mode);
        inst.push_imm(raw).push_reg(66).push_imm(14).push_reg(0);
        let mut detail = ArmDetail::new();
        let mut b = DetailBuilder::new(&inst, &mut detail, features);
        b.classify(op(OpGroup::MsrMask, 0));
        b.finish();
        assert_eq!(detail.op_count(), 1);
        detail.operands[0]
    }

    #[test]
    fn msr_a32_apsr_aliases() {
        let all = Features::default();
        assert_eq!(
            msr(Mode::ARM, opc::MSR, 8, all).value,
            ArmOpValue::Sysreg(ArmSysreg::APSR_NZCVQ)
        );
        assert_eq!(
            msr(Mode::ARM, opc::MSR, 4, all).value,
            ArmOpValue::Sysreg(ArmSysreg::APSR_G)
        );
        assert_eq!(
            msr(Mode::ARM, opc::MSR, 12, all).value,
            ArmOpValue::Sysreg(ArmSysreg::APSR_NZCVQG)
        );
    }

    #[test]
    fn msr_a32_field_masks() {
        let all = Features::default();
        // cpsr_fc
        let cpsr = msr(Mode::ARM, opc::MSR, 0b1001, all);
        assert_eq!(
            cpsr.value,
            ArmOpValue::Sysreg(ArmSysreg(ArmSysreg::CPSR_F.0 | ArmSysreg::CPSR_C.0))
        );
        // spsr_fsxc
        let spsr = msr(Mode::ARM, opc::MSR, 0x1f, all);
        assert_eq!(spsr.value, ArmOpValue::Sysreg(ArmSysreg(0xf)));
        assert_eq!(spsr.access, Access::WRITE);
    }

    #[test]
    fn msr_a32_zero_mask_appends_nothing() {
        let mut inst = McInst::new(opc::MSR, 0, Mode::ARM);
        inst.push_imm(0x10).push_reg(66).push_imm(14).push_reg(0);
        let mut detail = ArmDetail::new();
        DetailBuilder::new(&inst, &mut detail, Features::default())
            .classify(op(OpGroup::MsrMask, 0));
        assert_eq!(detail.op_count(), 0);
    }

    #[test]
    fn msr_mclass_lookup_order() {
        let all = Features::default();
        // apsr_g needs DSP and the 12-bit form
        let g = msr(Mode::MCLASS, opc::T2MSR_M, 0x400, all);
        assert_eq!(g.value, ArmOpValue::Sysreg(ArmSysreg::APSR_G));
        // without DSP the same encoding falls through to the 8-bit apsr form
        let no_dsp = msr(Mode::MCLASS, opc::T2MSR_M, 0x400, Features::V7);
        assert_eq!(no_dsp.value, ArmOpValue::Sysreg(ArmSysreg::APSR_NZCVQ));
        // v7 prefers the non-deprecated spelling
        let nzcvq = msr(Mode::MCLASS, opc::T2MSR_M, 0x800, all);
        assert_eq!(nzcvq.value, ArmOpValue::Sysreg(ArmSysreg::APSR_NZCVQ));
        let plain = msr(Mode::MCLASS, opc::T2MSR_M, 0x800, Features::empty());
        assert_eq!(plain.value, ArmOpValue::Sysreg(ArmSysreg::APSR));
        let control = msr(Mode::MCLASS, opc::T2MSR_M, 0x814, all);
        assert_eq!(control.value, ArmOpValue::Sysreg(ArmSysreg::CONTROL));
    }

    #[test]
    fn msr_mclass_unknown_falls_back_to_immediate() {
        let op = msr(Mode::MCLASS, opc::T2MSR_M, 0x8ff, Features::default());
        assert_eq!(op.value, ArmOpValue::Imm(0xff));
    }

    // ── Unimplemented groups ──────────────────────────────────────

    #[test]
    #[should_panic(expected = "has no detail mapping")]
    fn unimplemented_group_is_fatal() {
        let mut inst = McInst::new(opc::T2BFI, 0, Mode::THUMB);
        inst.push_reg(66).push_reg(66).push_reg(67).push_imm(0xff).push_imm(14).push_reg(0);
        let group = OpGroup::Unimplemented(UnimplementedGroup::BitfieldInvMaskImm);
        build(&inst, &[Step::Classify(group, 3)]);
    }

    #[test]
    #[should_panic(expected = "not a register")]
    fn raw_kind_mismatch_is_fatal() {
        let mut inst = McInst::new(opc::BX, 0, Mode::ARM);
        inst.push_imm(3);
        build(&inst, &[Step::Classify(OpGroup::Operand, 0)]);
    }
}
