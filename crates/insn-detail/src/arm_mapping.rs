//! ARM instruction classification and detail record lifecycle.

use crate::arm::{ArmDetail, ArmGroup, ArmInsn, ArmOpValue, ArmReg};
use crate::arm_builder::DetailBuilder;
use crate::arm_tables::{self, InsnMapEntry, INSN_MAP};
use crate::detail::{ArchDetail, Detail, RegAccess};
use crate::ir::{Features, McInst, Syntax};

/// Finds the instruction map entry of a raw opcode.
pub fn find_insn(opcode: u32) -> Option<&'static InsnMapEntry> {
    INSN_MAP
        .binary_search_by_key(&opcode, |e| e.opcode)
        .ok()
        .map(|i| &INSN_MAP[i])
}

/// Maps a raw opcode to its public id and, when `detail` is given, fills in
/// the implicit registers and groups.
///
/// An unknown opcode leaves `detail` untouched.
pub fn classify_insn(opcode: u32, detail: Option<&mut Detail>) -> Option<ArmInsn> {
    let Some(entry) = find_insn(opcode) else {
        tracing::trace!(opcode, "ARM opcode not in instruction map");
        return None;
    };
    if let Some(detail) = detail {
        for reg in entry.regs_use.iter().filter(|r| r.0 != 0) {
            detail.regs_read.push(reg.0);
        }
        for reg in entry.regs_mod.iter().filter(|r| r.0 != 0) {
            detail.regs_write.push(reg.0);
        }
        for group in entry.groups {
            detail.groups.push(*group as u8);
        }
        let sets_flags = entry.regs_mod.contains(&ArmReg::CPSR);
        if let Some(arm) = detail.as_arm_mut() {
            arm.update_flags = sets_flags;
        }
        if (entry.branch || entry.indirect_branch) && !detail.in_group(ArmGroup::Jump as u8) {
            detail.groups.push(ArmGroup::Jump as u8);
        }
    }
    Some(entry.id)
}

/// Resets `detail` for a new ARM instruction. `None` means detail is off.
pub fn init_detail(detail: Option<&mut Detail>) {
    if let Some(detail) = detail {
        detail.clear_common();
        detail.arch = ArchDetail::Arm(ArmDetail::new());
    }
}

/// Replays the operand walk of `inst` into `arm`.
pub fn build_operands(inst: &McInst, arm: &mut ArmDetail, features: Features) {
    let mut builder = DetailBuilder::new(inst, arm, features);
    builder.run(arm_tables::walk(inst.opcode));
    builder.finish();
}

/// Runs the whole pipeline: reset, classify, operand walk.
///
/// A set S bit adds `cpsr` to the implicit writes. Returns `None` for
/// opcodes missing from the instruction map; the record is left reset in
/// that case.
pub fn build_detail(inst: &McInst, detail: &mut Detail, features: Features) -> Option<ArmInsn> {
    init_detail(Some(&mut *detail));
    let id = classify_insn(inst.opcode, Some(&mut *detail))?;
    let Some(arm) = detail.as_arm_mut() else {
        return Some(id);
    };
    build_operands(inst, arm, features);
    if arm.update_flags && !detail.writes(ArmReg::CPSR.0) {
        detail.regs_write.push(ArmReg::CPSR.0);
    }
    Some(id)
}

/// Every register the instruction reads or writes.
///
/// Implicit registers come first, then explicit operands: registers by
/// their access, memory base and index as reads, and the base as a write
/// too when the instruction writes back.
pub fn reg_access(detail: &Detail) -> RegAccess {
    let mut access = RegAccess::from_implicit(detail);
    let Some(arm) = detail.as_arm() else {
        return access;
    };
    for op in arm.operands.iter() {
        match op.value {
            ArmOpValue::Reg(reg) if reg != ArmReg::INVALID => access.add(reg.0, op.access),
            ArmOpValue::Mem(mem) => {
                if mem.base != ArmReg::INVALID {
                    access.add_read(mem.base.0);
                    if arm.writeback {
                        access.add_write(mem.base.0);
                    }
                }
                if mem.index != ArmReg::INVALID {
                    access.add_read(mem.index.0);
                }
            }
            _ => {}
        }
    }
    access
}

pub fn reg_name(reg: u16, syntax: Syntax) -> Option<&'static str> {
    ArmReg(reg).name(syntax)
}

pub fn insn_name(id: u16) -> Option<&'static str> {
    ArmInsn::from_id(id).and_then(ArmInsn::name)
}

pub fn group_name(id: u8) -> Option<&'static str> {
    ArmGroup::from_id(id).and_then(ArmGroup::name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::{ArmCc, ArmOp};
    use crate::arm_tables::opc;
    use crate::detail::Access;
    use crate::ir::Mode;

    #[test]
    fn unknown_opcode_leaves_record_alone() {
        let mut d = Detail::arm();
        d.groups.push(42);
        assert_eq!(classify_insn(opc::INVALID, Some(&mut d)), None);
        assert_eq!(classify_insn(opc::INSTRUCTION_LIST_END, Some(&mut d)), None);
        assert_eq!(d.groups.as_slice(), &[42]);
    }

    #[test]
    fn classify_copies_implicit_state() {
        let mut d = Detail::arm();
        assert_eq!(classify_insn(opc::T_BL, Some(&mut d)), Some(ArmInsn::Bl));
        assert_eq!(d.regs_read.as_slice(), &[ArmReg::PC.0]);
        assert_eq!(d.regs_write.as_slice(), &[ArmReg::LR.0, ArmReg::PC.0]);
        assert!(d.in_group(ArmGroup::Call as u8));
        assert!(d.in_group(ArmGroup::Jump as u8));
        assert!(!d.as_arm().unwrap().update_flags);
    }

    #[test]
    fn cpsr_write_sets_update_flags() {
        let mut d = Detail::arm();
        classify_insn(opc::CMNRI, Some(&mut d));
        assert!(d.as_arm().unwrap().update_flags);
    }

    #[test]
    fn classify_without_detail() {
        assert_eq!(classify_insn(opc::T_IT, None), Some(ArmInsn::It));
    }

    #[test]
    fn init_detail_resets_sentinels() {
        let mut d = Detail::arm();
        {
            let arm = d.as_arm_mut().unwrap();
            arm.cc = ArmCc::Eq;
            arm.operands.push(ArmOp::reg(ArmReg::r(0), Access::READ));
            arm.operands.as_mut_slice()[0].neon_lane = 2;
        }
        d.regs_read.push(3);
        init_detail(Some(&mut d));
        let arm = d.as_arm().unwrap();
        assert_eq!(arm.cc, ArmCc::Invalid);
        assert_eq!(arm.op_count(), 0);
        assert!(d.regs_read.is_empty());
        init_detail(None);
    }

    #[test]
    fn writeback_base_is_read_and_written() {
        let mut inst = McInst::new(opc::STR_PRE_IMM, 0, Mode::ARM);
        let (r1, r2) = (ArmReg::r(1).0, ArmReg::r(2).0);
        inst.push_reg(r1).push_reg(r2).push_reg(r1).push_imm(4).push_imm(14).push_reg(0);
        let mut d = Detail::arm();
        assert_eq!(build_detail(&inst, &mut d, Features::default()), Some(ArmInsn::Str));
        let acc = reg_access(&d);
        assert_eq!(acc.read.as_slice(), &[r2, r1]);
        assert_eq!(acc.write.as_slice(), &[r1]);
    }

    #[test]
    fn s_bit_writes_cpsr_once() {
        let (r2, r3) = (ArmReg::r(2).0, ArmReg::r(3).0);
        let mut inst = McInst::new(opc::MOVR, 0, Mode::ARM);
        inst.push_reg(r2).push_reg(r3).push_imm(14).push_reg(0).push_reg(ArmReg::CPSR.0);
        let mut d = Detail::arm();
        build_detail(&inst, &mut d, Features::default());
        assert_eq!(d.regs_write.as_slice(), &[ArmReg::CPSR.0]);
        let acc = reg_access(&d);
        assert_eq!(acc.read.as_slice(), &[r3]);
        assert_eq!(acc.write.as_slice(), &[ArmReg::CPSR.0, r2]);

        // cmn already lists cpsr
        let mut inst = McInst::new(opc::CMNRI, 0, Mode::ARM);
        inst.push_reg(r2).push_imm(1).push_imm(14).push_reg(0);
        build_detail(&inst, &mut d, Features::default());
        assert_eq!(d.regs_write.as_slice(), &[ArmReg::CPSR.0]);
    }

    #[test]
    fn names() {
        assert_eq!(reg_name(ArmReg::SP.0, Syntax::Default), Some("sp"));
        assert_eq!(reg_name(ArmReg::SP.0, Syntax::NoRegName), Some("r13"));
        assert_eq!(reg_name(0, Syntax::Default), None);
        assert_eq!(insn_name(ArmInsn::Ldrh as u16), Some("ldrh"));
        assert_eq!(insn_name(0), None);
        assert_eq!(group_name(ArmGroup::IsThumb2 as u8), Some("IsThumb2"));
        assert_eq!(group_name(ArmGroup::Jump as u8), Some("jump"));
        assert_eq!(group_name(3), None);
    }
}
