//! Value transforms applied while copying a raw operand into the detail
//! record.
//!
//! Each transform sees the whole instruction, the raw operand index and the
//! raw value, and returns the value to store. They are pure: the same
//! inputs always give the same output.

use crate::arm::ArmReg;
use crate::arm_tables::opc;
use crate::ir::McInst;

/// `(instruction, raw operand index, raw value) -> resolved value`.
pub type ValueTransform = fn(&McInst, usize, u64) -> u64;

/// Opcodes whose immediate is a PC-relative branch target.
const REL_BRANCHES: &[u32] = &[
    opc::BL,
    opc::BL_PRED,
    opc::BCC,
    opc::T2B,
    opc::T_B,
    opc::T_BCC,
    opc::T_CBNZ,
    opc::T_CBZ,
    opc::BLXI,
    opc::T_BL,
    opc::T_BLXI,
];

/// Thumb branches that switch to ARM state: the target is computed from the
/// word-aligned PC.
const BLX_TO_ARM: &[u32] = &[opc::T_BLXI];

/// `true` if `opcode` is a PC-relative branch.
pub fn is_rel_branch(opcode: u32) -> bool {
    REL_BRANCHES.contains(&opcode)
}

/// Resolves a relative branch offset to an absolute target.
///
/// The PC reads as the instruction address plus 8 in ARM state and plus 4 in
/// Thumb state. Arithmetic wraps at 32 bits. Any opcode that is not a
/// relative branch passes through untouched.
pub fn add_pc(inst: &McInst, _op: usize, value: u64) -> u64 {
    if !is_rel_branch(inst.opcode) {
        return value;
    }
    let imm = value as i32;
    let mut pc = inst.address as u32;
    if inst.is_thumb() {
        pc = pc.wrapping_add(4);
        if BLX_TO_ARM.contains(&inst.opcode) {
            pc &= !3;
        }
    } else {
        pc = pc.wrapping_add(8);
    }
    u64::from(pc.wrapping_add(imm as u32))
}

#[inline]
fn qpr_to_dpr(value: u64, offset: u16) -> u64 {
    let reg = ArmReg(value as u16);
    if value > u64::from(u16::MAX) || !reg.is_quad() {
        return value;
    }
    let k = reg.0 - ArmReg::Q0.0;
    u64::from(ArmReg::D0.0 + offset + 2 * k)
}

/// `q{k}` to `d{2k}`.
pub fn qpr_to_dpr_list_0(_inst: &McInst, _op: usize, value: u64) -> u64 {
    qpr_to_dpr(value, 0)
}

/// `q{k}` to `d{2k+1}`.
pub fn qpr_to_dpr_list_1(_inst: &McInst, _op: usize, value: u64) -> u64 {
    qpr_to_dpr(value, 1)
}

/// `q{k}` to `d{2k+2}`.
pub fn qpr_to_dpr_list_2(_inst: &McInst, _op: usize, value: u64) -> u64 {
    qpr_to_dpr(value, 2)
}

/// `q{k}` to `d{2k+3}`.
pub fn qpr_to_dpr_list_3(_inst: &McInst, _op: usize, value: u64) -> u64 {
    qpr_to_dpr(value, 3)
}

/// Alignment field of addrmode6, stored in bytes by the decoder and
/// reported in bits.
pub fn shift_left_3(_inst: &McInst, _op: usize, value: u64) -> u64 {
    value << 3
}
