//! The architecture-neutral detail record.
//!
//! A [`Detail`] is created once per disassembler handle (or per [`crate::Insn`])
//! and reset in place before every decode, so repeated decodes into the same
//! storage never allocate.

use crate::ir::FixedList;

#[cfg(feature = "arm")]
use crate::arm::ArmDetail;
#[cfg(feature = "x86")]
use crate::x86::X86Detail;

bitflags::bitflags! {
    /// How an operand is accessed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Access: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

/// Implicit read register capacity.
pub const MAX_IMPLICIT_READS: usize = 20;
/// Implicit write register capacity.
pub const MAX_IMPLICIT_WRITES: usize = 20;
/// Group list capacity.
pub const MAX_GROUPS: usize = 8;

/// Architecture payload of a detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchDetail {
    #[default]
    None,
    #[cfg(feature = "arm")]
    Arm(ArmDetail),
    #[cfg(feature = "x86")]
    X86(X86Detail),
}

/// Per-instruction detail: implicit registers, groups and the
/// architecture-specific operand record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detail {
    /// Registers read without appearing as an operand.
    pub regs_read: FixedList<u16, MAX_IMPLICIT_READS>,
    /// Registers written without appearing as an operand.
    pub regs_write: FixedList<u16, MAX_IMPLICIT_WRITES>,
    /// Group ids the instruction belongs to.
    pub groups: FixedList<u8, MAX_GROUPS>,
    pub arch: ArchDetail,
}

impl Detail {
    /// An empty record carrying an ARM payload.
    #[cfg(feature = "arm")]
    pub fn arm() -> Self {
        Self {
            arch: ArchDetail::Arm(ArmDetail::new()),
            ..Self::default()
        }
    }

    /// An empty record carrying an x86 payload.
    #[cfg(feature = "x86")]
    pub fn x86() -> Self {
        Self {
            arch: ArchDetail::X86(X86Detail::default()),
            ..Self::default()
        }
    }

    /// Empties the generic lists. The payload is reset by the architecture
    /// (see `arm_mapping::init_detail`).
    pub fn clear_common(&mut self) {
        self.regs_read = FixedList::new();
        self.regs_write = FixedList::new();
        self.groups = FixedList::new();
    }

    /// Returns `true` if the instruction is in group `id`.
    pub fn in_group(&self, id: u8) -> bool {
        self.groups.contains(&id)
    }

    /// Returns `true` if `reg` is an implicit read.
    pub fn reads(&self, reg: u16) -> bool {
        self.regs_read.contains(&reg)
    }

    /// Returns `true` if `reg` is an implicit write.
    pub fn writes(&self, reg: u16) -> bool {
        self.regs_write.contains(&reg)
    }

    #[cfg(feature = "arm")]
    pub fn as_arm(&self) -> Option<&ArmDetail> {
        match &self.arch {
            ArchDetail::Arm(d) => Some(d),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "arm")]
    pub fn as_arm_mut(&mut self) -> Option<&mut ArmDetail> {
        match &mut self.arch {
            ArchDetail::Arm(d) => Some(d),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "x86")]
    pub fn as_x86(&self) -> Option<&X86Detail> {
        match &self.arch {
            ArchDetail::X86(d) => Some(d),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    #[cfg(feature = "x86")]
    pub fn as_x86_mut(&mut self) -> Option<&mut X86Detail> {
        match &mut self.arch {
            ArchDetail::X86(d) => Some(d),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Capacity of each side of a [`RegAccess`] summary.
pub const MAX_ACCESS_REGS: usize = 64;

/// Every register an instruction reads or writes, implicit ones first,
/// without duplicates, in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegAccess {
    pub read: FixedList<u16, MAX_ACCESS_REGS>,
    pub write: FixedList<u16, MAX_ACCESS_REGS>,
}

impl RegAccess {
    /// Seeds the summary with the implicit lists of `detail`.
    pub fn from_implicit(detail: &Detail) -> Self {
        let mut access = Self::default();
        for &r in detail.regs_read.iter() {
            access.add_read(r);
        }
        for &r in detail.regs_write.iter() {
            access.add_write(r);
        }
        access
    }

    /// Records a read unless `reg` is already listed.
    pub fn add_read(&mut self, reg: u16) {
        if !self.read.contains(&reg) {
            self.read.push(reg);
        }
    }

    /// Records a write unless `reg` is already listed.
    pub fn add_write(&mut self, reg: u16) {
        if !self.write.contains(&reg) {
            self.write.push(reg);
        }
    }

    /// Records `reg` on each side named by `access`.
    pub fn add(&mut self, reg: u16, access: Access) {
        if access.contains(Access::READ) {
            self.add_read(reg);
        }
        if access.contains(Access::WRITE) {
            self.add_write(reg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_access_dedups_in_order() {
        let mut acc = RegAccess::default();
        acc.add(5, Access::READ);
        acc.add(3, Access::READ | Access::WRITE);
        acc.add(5, Access::READ | Access::WRITE);
        assert_eq!(acc.read.as_slice(), &[5, 3]);
        assert_eq!(acc.write.as_slice(), &[3, 5]);
    }

    #[test]
    fn implicit_registers_come_first() {
        let mut d = Detail::default();
        d.regs_read.push(12);
        d.regs_write.push(12);
        d.regs_write.push(3);
        let mut acc = RegAccess::from_implicit(&d);
        acc.add(12, Access::READ);
        acc.add(66, Access::WRITE);
        assert_eq!(acc.read.as_slice(), &[12]);
        assert_eq!(acc.write.as_slice(), &[12, 3, 66]);
    }

    #[test]
    fn clear_common_keeps_payload_kind() {
        let mut d = Detail::default();
        d.groups.push(1);
        d.regs_read.push(2);
        d.clear_common();
        assert!(d.groups.is_empty());
        assert!(d.regs_read.is_empty());
        assert!(!d.in_group(1));
    }

    #[cfg(feature = "arm")]
    #[test]
    fn arm_payload_accessors() {
        let mut d = Detail::arm();
        assert!(d.as_arm().is_some());
        if let Some(arm) = d.as_arm_mut() {
            arm.writeback = true;
        }
        assert!(d.as_arm().is_some_and(|a| a.writeback));
        assert!(Detail::default().as_arm().is_none());
    }
}
