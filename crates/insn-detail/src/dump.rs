//! Single-line diagnostic renderings of finished detail records.
//!
//! The formats match the line-oriented detail corpora used by regression
//! suites of classic disassembler engines, so a dump can be diffed against
//! an expected line directly.

use alloc::string::{String, ToString};
use core::fmt;

use crate::detail::Access;
use crate::engine::Insn;
#[cfg(feature = "arm")]
use crate::ir::Syntax;
#[cfg(feature = "x86")]
use crate::ir::Mode;

/// Writes `0x..` for non-negative values and `-0x..` otherwise.
struct SignedHex(i64);

impl fmt::Display for SignedHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-0x{:x}", self.0.unsigned_abs())
        } else {
            write!(f, "0x{:x}", self.0)
        }
    }
}

fn access_name(access: Access) -> Option<&'static str> {
    if access == Access::READ {
        Some("READ")
    } else if access == Access::WRITE {
        Some("WRITE")
    } else if access == Access::READ | Access::WRITE {
        Some("READ | WRITE")
    } else {
        None
    }
}

// ── x86 ──────────────────────────────────────────────────────────────────

#[cfg(feature = "x86")]
mod x86_line {
    use super::*;
    use crate::x86::{self, EFlags, FpuFlags, X86Group, X86OpType, X86OpValue, X86Reg};

    /// `Display` adapter producing the x86 detail line of an instruction.
    ///
    /// Fields are `" | "`-prefixed and concatenated. SIB fields are left out
    /// in 16-bit mode. Nothing is written when the instruction carries no
    /// x86 detail.
    pub struct X86DetailLine<'a> {
        pub insn: &'a Insn,
        pub mode: Mode,
    }

    impl fmt::Display for X86DetailLine<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let Some(detail) = self.insn.detail() else {
                return Ok(());
            };
            let Some(x) = detail.as_x86() else {
                return Ok(());
            };

            f.write_str(" | Prefix:")?;
            for b in x.prefix {
                write!(f, "0x{:02x} ", b)?;
            }
            f.write_str(" | Opcode:")?;
            for b in x.opcode {
                write!(f, "0x{:02x} ", b)?;
            }
            write!(f, " | rex: 0x{:x}", x.rex)?;
            write!(f, " | addr_size: {}", x.addr_size)?;
            write!(f, " | modrm: 0x{:x}", x.modrm)?;
            write!(f, " | disp: 0x{:x}", x.disp)?;

            if !self.mode.contains(Mode::MODE_16) {
                write!(f, " | sib: 0x{:x}", x.sib)?;
                if x.sib_base != X86Reg::INVALID {
                    write!(f, " | sib_base: {}", x.sib_base)?;
                }
                if x.sib_index != X86Reg::INVALID {
                    write!(f, " | sib_index: {}", x.sib_index)?;
                }
                if x.sib_scale != 0 {
                    write!(f, " | sib_scale: {}", x.sib_scale)?;
                }
            }

            if x.xop_cc != 0 {
                write!(f, " | xop_cc: {}", x.xop_cc)?;
            }
            if x.sse_cc != 0 {
                write!(f, " | sse_cc: {}", x.sse_cc)?;
            }
            if x.avx_cc != 0 {
                write!(f, " | avx_cc: {}", x.avx_cc)?;
            }
            if x.avx_sae {
                f.write_str(" | avx_sae: 1")?;
            }
            if x.avx_rm != 0 {
                write!(f, " | avx_rm: {}", x.avx_rm)?;
            }

            let imm_count = x.op_count(X86OpType::Imm);
            if imm_count > 0 {
                write!(f, " | imm_count: {}", imm_count)?;
                for pos in 1..=imm_count {
                    let imm = x
                        .op_index(X86OpType::Imm, pos)
                        .and_then(|i| match x.operands[i].value {
                            X86OpValue::Imm(v) => Some(v),
                            _ => None,
                        })
                        .unwrap_or_default();
                    write!(f, " | imms[{}]: 0x{:x}", pos, imm)?;
                }
            }

            if !x.operands.is_empty() {
                write!(f, " | op_count: {}", x.operands.len())?;
            }
            for (i, op) in x.operands.iter().enumerate() {
                match op.value {
                    X86OpValue::Reg(reg) => write!(f, " | operands[{}].type: REG = {}", i, reg)?,
                    X86OpValue::Imm(imm) => {
                        write!(f, " | operands[{}].type: IMM = 0x{:x}", i, imm)?;
                    }
                    X86OpValue::Mem(mem) => {
                        write!(f, " | operands[{}].type: MEM", i)?;
                        if mem.segment != X86Reg::INVALID {
                            write!(f, " | operands[{}].mem.segment: REG = {}", i, mem.segment)?;
                        }
                        if mem.base != X86Reg::INVALID {
                            write!(f, " | operands[{}].mem.base: REG = {}", i, mem.base)?;
                        }
                        if mem.index != X86Reg::INVALID {
                            write!(f, " | operands[{}].mem.index: REG = {}", i, mem.index)?;
                        }
                        if mem.scale != 1 {
                            write!(f, " | operands[{}].mem.scale: {}", i, mem.scale)?;
                        }
                        if mem.disp != 0 {
                            write!(f, " | operands[{}].mem.disp: 0x{:x}", i, mem.disp)?;
                        }
                    }
                    X86OpValue::Invalid => {}
                }
                if op.avx_bcast != 0 {
                    write!(f, " | operands[{}].avx_bcast: {}", i, op.avx_bcast)?;
                }
                if op.avx_zero_opmask {
                    write!(f, " | operands[{}].avx_zero_opmask: TRUE", i)?;
                }
                write!(f, " | operands[{}].size: {}", i, op.size)?;
                if let Some(name) = access_name(op.access) {
                    write!(f, " | operands[{}].access: {}", i, name)?;
                }
            }

            let access = x86::reg_access(detail);
            if !access.read.is_empty() {
                f.write_str(" | Registers read:")?;
                for &r in access.read.iter() {
                    write!(f, " {}", X86Reg(r))?;
                }
            }
            if !access.write.is_empty() {
                f.write_str(" | Registers modified:")?;
                for &r in access.write.iter() {
                    write!(f, " {}", X86Reg(r))?;
                }
            }

            if !x.eflags.is_empty() || !x.fpu_flags.is_empty() {
                if detail.in_group(X86Group::Fpu as u8) {
                    f.write_str(" | FPU_FLAGS:")?;
                    for flag in x.fpu_flags.iter() {
                        if let Some(name) = FpuFlags::bit_name(flag) {
                            write!(f, " {}", name)?;
                        }
                    }
                } else {
                    f.write_str(" | EFLAGS:")?;
                    for flag in x.eflags.iter() {
                        if let Some(name) = EFlags::bit_name(flag) {
                            write!(f, " {}", name)?;
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(feature = "x86")]
pub use x86_line::X86DetailLine;

/// Renders the x86 detail line of `insn` decoded in `mode`.
///
/// Returns an empty string when the instruction has no x86 detail.
#[cfg(feature = "x86")]
pub fn x86_detail_line(insn: &Insn, mode: Mode) -> String {
    X86DetailLine { insn, mode }.to_string()
}

// ── ARM ──────────────────────────────────────────────────────────────────

#[cfg(feature = "arm")]
mod arm_line {
    use super::*;
    use crate::arm::{ArmCc, ArmGroup, ArmOpValue, ArmReg, ArmShifter};
    use crate::arm_mapping;

    /// Writes `" ; "`-separated items and a closing `" ;"`.
    struct Items<'a, 'b> {
        f: &'a mut fmt::Formatter<'b>,
        first: bool,
    }

    impl Items<'_, '_> {
        fn item(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
            if !self.first {
                self.f.write_str(" ; ")?;
            }
            self.first = false;
            self.f.write_fmt(args)
        }

        fn close(self) -> fmt::Result {
            if self.first {
                Ok(())
            } else {
                self.f.write_str(" ;")
            }
        }
    }

    /// `Display` adapter producing the ARM detail line of an instruction.
    pub struct ArmDetailLine<'a> {
        pub insn: &'a Insn,
        pub syntax: Syntax,
    }

    impl ArmDetailLine<'_> {
        fn reg(&self, reg: ArmReg) -> RegName {
            RegName(reg, self.syntax)
        }
    }

    struct RegName(ArmReg, Syntax);

    impl fmt::Display for RegName {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.0.name(self.1) {
                Some(name) => f.write_str(name),
                None => write!(f, "reg{}", self.0 .0),
            }
        }
    }

    impl fmt::Display for ArmDetailLine<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let Some(detail) = self.insn.detail() else {
                return Ok(());
            };
            let Some(arm) = detail.as_arm() else {
                return Ok(());
            };
            let mut out = Items { f, first: true };

            if arm.op_count() > 0 {
                out.item(format_args!("op_count: {}", arm.op_count()))?;
            }
            for (i, op) in arm.operands.iter().enumerate() {
                match op.value {
                    ArmOpValue::Reg(reg) => {
                        out.item(format_args!("operands[{}].type: REG = {}", i, self.reg(reg)))?;
                    }
                    ArmOpValue::Imm(imm) => {
                        out.item(format_args!("operands[{}].type: IMM = {}", i, SignedHex(imm)))?;
                    }
                    ArmOpValue::Pimm(p) => {
                        out.item(format_args!("operands[{}].type: P-IMM = {}", i, p))?;
                    }
                    ArmOpValue::Cimm(c) => {
                        out.item(format_args!("operands[{}].type: C-IMM = {}", i, c))?;
                    }
                    ArmOpValue::Pred(p) => {
                        out.item(format_args!("operands[{}].type: PRED = {}", i, p))?;
                    }
                    ArmOpValue::Sysreg(reg) => {
                        out.item(format_args!("operands[{}].type: SYSREG = {}", i, reg))?;
                    }
                    ArmOpValue::Mem(mem) => {
                        out.item(format_args!("operands[{}].type: MEM", i))?;
                        if mem.base != ArmReg::INVALID {
                            out.item(format_args!(
                                "operands[{}].mem.base: REG = {}",
                                i,
                                self.reg(mem.base)
                            ))?;
                        }
                        if mem.index != ArmReg::INVALID {
                            out.item(format_args!(
                                "operands[{}].mem.index: REG = {}",
                                i,
                                self.reg(mem.index)
                            ))?;
                        }
                        if mem.scale != 1 {
                            out.item(format_args!("operands[{}].mem.scale: {}", i, mem.scale))?;
                        }
                        if mem.disp != 0 {
                            out.item(format_args!(
                                "operands[{}].mem.disp: {}",
                                i,
                                SignedHex(i64::from(mem.disp))
                            ))?;
                        }
                        if mem.lshift != 0 {
                            out.item(format_args!(
                                "operands[{}].mem.lshift: 0x{:x}",
                                i, mem.lshift
                            ))?;
                        }
                    }
                    ArmOpValue::Invalid => {}
                }
                if op.neon_lane != -1 {
                    out.item(format_args!("operands[{}].neon_lane = {}", i, op.neon_lane))?;
                }
                if op.vector_index != -1 {
                    out.item(format_args!("operands[{}].vector_index = {}", i, op.vector_index))?;
                }
                if let Some(name) = access_name(op.access) {
                    out.item(format_args!("operands[{}].access: {}", i, name))?;
                }
                if op.shift.kind != ArmShifter::Invalid && op.shift.value != 0 {
                    let kind = op.shift.kind as u8;
                    if kind < ArmShifter::AsrReg as u8 {
                        out.item(format_args!("Shift: {} = {}", kind, op.shift.value))?;
                    } else {
                        let reg = ArmReg(op.shift.value as u16);
                        out.item(format_args!("Shift: {} = {}", kind, self.reg(reg)))?;
                    }
                }
                if op.subtracted {
                    out.item(format_args!("operands[{}].subtracted = True", i))?;
                }
            }

            if let Some(code) = arm.cc.encoding().filter(|_| arm.cc != ArmCc::Al) {
                out.item(format_args!("Code condition: {}", code))?;
            }
            if arm.update_flags {
                out.item(format_args!("Update-flags: True"))?;
            }
            if arm.writeback {
                out.item(format_args!("Write-back: True"))?;
            }
            if arm.pred_mask != 0 {
                out.item(format_args!("Predicate Mask: 0x{:x}", arm.pred_mask))?;
            }

            let access = arm_mapping::reg_access(detail);
            if !access.read.is_empty() {
                out.item(format_args!("Registers read:"))?;
                for &r in access.read.iter() {
                    write!(out.f, " {}", self.reg(ArmReg(r)))?;
                }
            }
            if !access.write.is_empty() {
                out.item(format_args!("Registers modified:"))?;
                for &r in access.write.iter() {
                    write!(out.f, " {}", self.reg(ArmReg(r)))?;
                }
            }
            if !detail.groups.is_empty() {
                out.item(format_args!("Groups:"))?;
                for &g in detail.groups.iter() {
                    match ArmGroup::from_id(g).and_then(ArmGroup::name) {
                        Some(name) => write!(out.f, " {}", name)?,
                        None => write!(out.f, " group{}", g)?,
                    }
                }
            }
            out.close()
        }
    }
}

#[cfg(feature = "arm")]
pub use arm_line::ArmDetailLine;

/// Renders the ARM detail line of `insn`, naming registers per `syntax`.
///
/// Returns an empty string when the instruction has no ARM detail.
#[cfg(feature = "arm")]
pub fn arm_detail_line(insn: &Insn, syntax: Syntax) -> String {
    ArmDetailLine { insn, syntax }.to_string()
}
