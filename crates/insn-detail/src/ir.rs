//! Intermediate representation shared by the decoders and the detail layer.
//!
//! A raw decoder produces an [`McInst`]: an opcode number plus a positional
//! list of [`McOperand`]s. Nothing in here knows what the operands mean; that
//! is the job of the per-architecture metadata tables.

use core::fmt;
use core::hash::{Hash, Hasher};

// ─── Architecture & mode ─────────────────────────────────────────────────

/// Target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arch {
    /// ARM (A32, Thumb, Thumb-2, M-class).
    Arm,
    /// x86 (16-, 32- and 64-bit).
    X86,
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::Arm => write!(f, "ARM"),
            Arch::X86 => write!(f, "x86"),
        }
    }
}

bitflags::bitflags! {
    /// Decoder mode flags.
    ///
    /// Bit values follow the classic disassembler engine numbering so that
    /// mode words read from existing tooling can be used unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Mode: u32 {
        /// ARM A32 (the empty mode).
        const ARM = 0;
        /// 16-bit x86.
        const MODE_16 = 1 << 1;
        /// 32-bit x86.
        const MODE_32 = 1 << 2;
        /// 64-bit x86.
        const MODE_64 = 1 << 3;
        /// Thumb / Thumb-2.
        const THUMB = 1 << 4;
        /// Cortex-M profile (implies Thumb).
        const MCLASS = 1 << 5;
        /// ARMv8 A32 encodings.
        const V8 = 1 << 6;
        /// Big-endian byte order.
        const BIG_ENDIAN = 1 << 31;
    }
}

impl Mode {
    /// Returns `true` when the flags form a valid mode for `arch`.
    pub fn is_valid_for(self, arch: Arch) -> bool {
        match arch {
            Arch::Arm => {
                let allowed = Mode::THUMB | Mode::MCLASS | Mode::V8 | Mode::BIG_ENDIAN;
                allowed.contains(self)
            }
            Arch::X86 => {
                let width = self & (Mode::MODE_16 | Mode::MODE_32 | Mode::MODE_64);
                width.bits().count_ones() == 1 && width == self
            }
        }
    }
}

/// Register naming syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Syntax {
    /// Conventional names (`sp`, `lr`, `pc`); `r9..r12` stay numeric.
    #[default]
    Default,
    /// Numeric ARM register names only (`r13`, `r14`, `r15`).
    NoRegName,
}

bitflags::bitflags! {
    /// Optional subtarget features consulted by the ARM detail builder.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Features: u32 {
        /// DSP extension (M-class `apsr_g` style system registers).
        const DSP = 1 << 0;
        /// ARMv7 (non-deprecated `apsr` spellings).
        const V7 = 1 << 1;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::all()
    }
}

// ─── FixedList: stack-allocated bounded array ────────────────────────────

/// Stack-allocated list of at most `N` elements.
///
/// The length is the single source of truth: slots past it are never
/// reachable through the public API, whatever they contain.
#[derive(Clone, Copy)]
pub struct FixedList<T: Copy + Default, const N: usize> {
    items: [T; N],
    len: u8,
}

impl<T: Copy + Default, const N: usize> FixedList<T, N> {
    /// Maximum number of elements.
    pub const MAX_LEN: usize = N;

    /// Creates a new empty list.
    #[inline]
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }

    /// Creates a list whose every slot, including the unused ones, holds `fill`.
    #[inline]
    pub fn filled(fill: T) -> Self {
        Self {
            items: [fill; N],
            len: 0,
        }
    }

    /// Appends an element.
    ///
    /// # Panics
    /// Panics if the list is full.
    #[inline]
    pub fn push(&mut self, item: T) {
        assert!(
            (self.len as usize) < N,
            "FixedList overflow: max {} elements",
            N
        );
        self.items[self.len as usize] = item;
        self.len += 1;
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the active elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len as usize]
    }

    /// Returns the active elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items[..self.len as usize]
    }

    /// Returns the last active element.
    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Empties the list and overwrites every slot with `fill`.
    pub fn reset(&mut self, fill: T) {
        self.items = [fill; N];
        self.len = 0;
    }

    // The three helpers below exist for the two-phase memory operand
    // protocol: fill the slot at the cursor, then commit it.

    /// The slot at the cursor (one past the last active element).
    ///
    /// # Panics
    /// Panics if the list is full.
    pub(crate) fn active_mut(&mut self) -> &mut T {
        assert!(
            (self.len as usize) < N,
            "FixedList overflow: max {} elements",
            N
        );
        &mut self.items[self.len as usize]
    }

    /// Makes the slot at the cursor an active element.
    pub(crate) fn commit(&mut self) {
        assert!(
            (self.len as usize) < N,
            "FixedList overflow: max {} elements",
            N
        );
        self.len += 1;
    }

    /// Moves the cursor back over the last element without clearing it.
    pub(crate) fn retract(&mut self) {
        assert!(self.len > 0, "FixedList underflow");
        self.len -= 1;
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> FixedList<T, N> {
    /// Returns `true` if `item` is among the active elements.
    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.as_slice().contains(item)
    }
}

impl<T: Copy + Default, const N: usize> core::ops::Deref for FixedList<T, N> {
    type Target = [T];
    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy + Default, const N: usize> core::ops::DerefMut for FixedList<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq for FixedList<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy + Default + Eq, const N: usize> Eq for FixedList<T, N> {}

impl<T: Copy + Default + Hash, const N: usize> Hash for FixedList<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq<[T]> for FixedList<T, N> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Copy + Default + fmt::Debug, const N: usize> fmt::Debug for FixedList<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T: Copy + Default, const N: usize> Default for FixedList<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> From<&[T]> for FixedList<T, N> {
    fn from(v: &[T]) -> Self {
        assert!(
            v.len() <= N,
            "FixedList: max {} elements, got {}",
            N,
            v.len()
        );
        let mut list = Self::new();
        for &item in v {
            list.push(item);
        }
        list
    }
}

impl<'a, T: Copy + Default, const N: usize> IntoIterator for &'a FixedList<T, N> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(feature = "serde")]
impl<T: Copy + Default + serde::Serialize, const N: usize> serde::Serialize for FixedList<T, N> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.as_slice() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, T, const N: usize> serde::Deserialize<'de> for FixedList<T, N>
where
    T: Copy + Default + serde::Deserialize<'de>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v: alloc::vec::Vec<T> = alloc::vec::Vec::deserialize(deserializer)?;
        if v.len() > N {
            return Err(serde::de::Error::custom(alloc::format!(
                "too many elements: {} > {}",
                v.len(),
                N
            )));
        }
        Ok(Self::from(&v[..]))
    }
}

// ─── Raw instruction ─────────────────────────────────────────────────────

/// A raw decoder operand. Predicates and masks travel as immediates; their
/// meaning comes from the opcode metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum McOperand {
    /// Unset slot.
    #[default]
    Invalid,
    /// Register number in the architecture's register space.
    Reg(u16),
    /// Immediate value.
    Imm(i64),
}

impl McOperand {
    /// The register number, if this is a register operand.
    #[inline]
    pub fn as_reg(self) -> Option<u16> {
        match self {
            McOperand::Reg(r) => Some(r),
            _ => None,
        }
    }

    /// The immediate value, if this is an immediate operand.
    #[inline]
    pub fn as_imm(self) -> Option<i64> {
        match self {
            McOperand::Imm(v) => Some(v),
            _ => None,
        }
    }
}

/// Raw operand list capacity.
pub const MAX_MC_OPERANDS: usize = 48;

/// A decoded instruction before detail materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct McInst {
    /// Architecture-specific raw opcode number.
    pub opcode: u32,
    /// Positional raw operands.
    pub operands: FixedList<McOperand, MAX_MC_OPERANDS>,
    /// Address of the first byte of the instruction.
    pub address: u64,
    /// Mode the instruction was decoded in.
    pub mode: Mode,
}

impl McInst {
    /// Creates an empty instruction.
    pub fn new(opcode: u32, address: u64, mode: Mode) -> Self {
        Self {
            opcode,
            operands: FixedList::new(),
            address,
            mode,
        }
    }

    /// Clears the instruction for reuse by the next decode.
    pub fn reset(&mut self, address: u64, mode: Mode) {
        self.opcode = 0;
        self.operands = FixedList::new();
        self.address = address;
        self.mode = mode;
    }

    /// Appends a register operand.
    pub fn push_reg(&mut self, reg: u16) -> &mut Self {
        self.operands.push(McOperand::Reg(reg));
        self
    }

    /// Appends an immediate operand.
    pub fn push_imm(&mut self, imm: i64) -> &mut Self {
        self.operands.push(McOperand::Imm(imm));
        self
    }

    /// The raw operand at `index`, or [`McOperand::Invalid`] past the end.
    #[inline]
    pub fn operand(&self, index: usize) -> McOperand {
        self.operands.get(index).copied().unwrap_or_default()
    }

    /// Number of raw operands.
    #[inline]
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    /// Decoded in Thumb state.
    #[inline]
    pub fn is_thumb(&self) -> bool {
        self.mode.intersects(Mode::THUMB | Mode::MCLASS)
    }

    /// Decoded for an M-profile core.
    #[inline]
    pub fn is_mclass(&self) -> bool {
        self.mode.contains(Mode::MCLASS)
    }
}
