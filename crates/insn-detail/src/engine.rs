//! Public disassembler API: configuration plus the decode → classify →
//! build pipeline over a caller-supplied raw decoder.

use alloc::boxed::Box;
use alloc::vec::Vec;

#[cfg(feature = "arm")]
use crate::arm_mapping;
use crate::detail::{Detail, RegAccess};
use crate::error::Error;
use crate::ir::{Arch, Features, FixedList, McInst, Mode, Syntax};
#[cfg(feature = "x86")]
use crate::x86;

/// The raw bitstream decoder: bytes in, opcode and raw operands out.
///
/// ARM decoders only fill `inst`; the detail record is built afterwards
/// from the metadata tables. x86 decoders fill the x86 payload of `detail`
/// themselves when it is given.
pub trait RawDecoder {
    /// Decodes one instruction at the start of `code`.
    ///
    /// Returns the encoding size in bytes, or `None` if the bytes are not a
    /// valid instruction.
    fn decode(
        &self,
        code: &[u8],
        address: u64,
        mode: Mode,
        inst: &mut McInst,
        detail: Option<&mut Detail>,
    ) -> Option<u16>;
}

impl<D: RawDecoder + ?Sized> RawDecoder for &D {
    fn decode(
        &self,
        code: &[u8],
        address: u64,
        mode: Mode,
        inst: &mut McInst,
        detail: Option<&mut Detail>,
    ) -> Option<u16> {
        (**self).decode(code, address, mode, inst, detail)
    }
}

/// Disassembler options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Build detail records (off by default).
    pub detail: bool,
    /// Register naming syntax.
    pub syntax: Syntax,
    /// Optional ARM subtarget features.
    pub features: Features,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            detail: false,
            syntax: Syntax::Default,
            features: Features::default(),
        }
    }
}

/// Longest encoding kept in [`Insn::bytes`].
pub const MAX_INSN_BYTES: usize = 16;

/// One decoded instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Insn {
    /// Public instruction id (`ArmInsn` / `X86Insn`), `0` if unknown.
    pub id: u16,
    pub address: u64,
    pub size: u16,
    pub bytes: FixedList<u8, MAX_INSN_BYTES>,
    /// Present only when detail is enabled.
    pub detail: Option<Box<Detail>>,
}

impl Insn {
    /// The detail record, if any.
    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_deref()
    }
}

/// Returns `true` if support for `arch` is compiled in.
pub fn arch_enabled(arch: Arch) -> bool {
    match arch {
        Arch::Arm => cfg!(feature = "arm"),
        Arch::X86 => cfg!(feature = "x86"),
    }
}

/// A configured disassembler handle.
///
/// # Examples
///
/// ```
/// use insn_detail::arm_tables::opc;
/// use insn_detail::{Arch, Detail, Disassembler, McInst, Mode, RawDecoder};
///
/// // Always decodes `movs r2, r3`.
/// struct Movs;
///
/// impl RawDecoder for Movs {
///     fn decode(
///         &self,
///         _code: &[u8],
///         _address: u64,
///         _mode: Mode,
///         inst: &mut McInst,
///         _detail: Option<&mut Detail>,
///     ) -> Option<u16> {
///         inst.opcode = opc::MOVR;
///         inst.push_reg(68).push_reg(69).push_imm(14).push_reg(0).push_reg(3);
///         Some(4)
///     }
/// }
///
/// let mut dis = Disassembler::new(Arch::Arm, Mode::ARM, Movs)?;
/// dis.detail(true);
/// let insn = dis.disasm_one(&[0x03, 0x20, 0xb0, 0xe1], 0x1000)?;
/// assert_eq!(dis.insn_name(insn.id), Some("mov"));
/// assert!(insn.detail().and_then(Detail::as_arm).is_some_and(|a| a.update_flags));
/// # Ok::<(), insn_detail::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Disassembler<D> {
    arch: Arch,
    mode: Mode,
    options: Options,
    decoder: D,
}

impl<D: RawDecoder> Disassembler<D> {
    /// Creates a handle for `arch` in `mode`.
    pub fn new(arch: Arch, mode: Mode, decoder: D) -> Result<Self, Error> {
        if !arch_enabled(arch) {
            return Err(Error::UnsupportedArch { arch });
        }
        if !mode.is_valid_for(arch) {
            return Err(Error::InvalidMode { arch, mode });
        }
        Ok(Self {
            arch,
            mode,
            options: Options::default(),
            decoder,
        })
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Turns detail generation on or off.
    pub fn detail(&mut self, enabled: bool) -> &mut Self {
        self.options.detail = enabled;
        self
    }

    pub fn syntax(&mut self, syntax: Syntax) -> &mut Self {
        self.options.syntax = syntax;
        self
    }

    pub fn features(&mut self, features: Features) -> &mut Self {
        self.options.features = features;
        self
    }

    /// Replaces all options at once.
    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    /// Decodes the instruction at the start of `code`.
    pub fn disasm_one(&self, code: &[u8], address: u64) -> Result<Insn, Error> {
        let mut insn = Insn::default();
        self.disasm_into(code, address, &mut insn)?;
        Ok(insn)
    }

    /// Decodes into caller-owned storage. A detail record already present
    /// in `insn` is reset and reused.
    pub fn disasm_into(&self, code: &[u8], address: u64, insn: &mut Insn) -> Result<(), Error> {
        let mut inst = McInst::new(0, address, self.mode);
        let mut detail = if self.options.detail {
            Some(&mut **insn.detail.get_or_insert_with(Box::default))
        } else {
            insn.detail = None;
            None
        };

        let (size, id) = match self.arch {
            #[cfg(feature = "arm")]
            Arch::Arm => {
                let Some(size) = self.decoder.decode(code, address, self.mode, &mut inst, None)
                else {
                    return Err(self.decode_failed(address));
                };
                let id = match detail.as_deref_mut() {
                    Some(d) => arm_mapping::build_detail(&inst, d, self.options.features),
                    None => arm_mapping::classify_insn(inst.opcode, None),
                };
                (size, id.map_or(0, |id| id as u16))
            }
            #[cfg(feature = "x86")]
            Arch::X86 => {
                if let Some(d) = detail.as_deref_mut() {
                    *d = Detail::x86();
                }
                let Some(size) =
                    self.decoder.decode(code, address, self.mode, &mut inst, detail)
                else {
                    return Err(self.decode_failed(address));
                };
                (size, inst.opcode as u16)
            }
            #[allow(unreachable_patterns)]
            _ => return Err(Error::UnsupportedArch { arch: self.arch }),
        };

        insn.id = id;
        insn.address = address;
        insn.size = size;
        let len = (size as usize).min(code.len()).min(MAX_INSN_BYTES);
        insn.bytes = FixedList::from(&code[..len]);
        Ok(())
    }

    /// Decodes up to `count` instructions (`0` = all), stopping at the first
    /// undecodable one.
    pub fn disasm(&self, code: &[u8], address: u64, count: usize) -> Vec<Insn> {
        let mut out = Vec::new();
        let mut offset = 0usize;
        while offset < code.len() && (count == 0 || out.len() < count) {
            let mut insn = Insn::default();
            let addr = address.wrapping_add(offset as u64);
            if self.disasm_into(&code[offset..], addr, &mut insn).is_err() || insn.size == 0 {
                break;
            }
            offset += insn.size as usize;
            out.push(insn);
        }
        out
    }

    #[cold]
    fn decode_failed(&self, address: u64) -> Error {
        tracing::debug!(arch = %self.arch, address, "raw decoder rejected input");
        Error::InvalidInstruction { address }
    }

    // ── Names ────────────────────────────────────────────────────────────

    pub fn reg_name(&self, reg: u16) -> Option<&'static str> {
        match self.arch {
            #[cfg(feature = "arm")]
            Arch::Arm => arm_mapping::reg_name(reg, self.options.syntax),
            #[cfg(feature = "x86")]
            Arch::X86 => x86::reg_name(reg),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    pub fn insn_name(&self, id: u16) -> Option<&'static str> {
        match self.arch {
            #[cfg(feature = "arm")]
            Arch::Arm => arm_mapping::insn_name(id),
            #[cfg(feature = "x86")]
            Arch::X86 => x86::insn_name(id),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    pub fn group_name(&self, id: u8) -> Option<&'static str> {
        match self.arch {
            #[cfg(feature = "arm")]
            Arch::Arm => arm_mapping::group_name(id),
            #[cfg(feature = "x86")]
            Arch::X86 => x86::group_name(id),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    // ── Detail queries ───────────────────────────────────────────────────

    fn detail_of<'i>(&self, insn: &'i Insn) -> Result<&'i Detail, Error> {
        if !self.options.detail {
            return Err(Error::DetailDisabled);
        }
        insn.detail().ok_or(Error::DetailDisabled)
    }

    /// Every register `insn` reads or writes, implicit and explicit.
    pub fn regs_access(&self, insn: &Insn) -> Result<RegAccess, Error> {
        let detail = self.detail_of(insn)?;
        Ok(match self.arch {
            #[cfg(feature = "arm")]
            Arch::Arm => arm_mapping::reg_access(detail),
            #[cfg(feature = "x86")]
            Arch::X86 => x86::reg_access(detail),
            #[allow(unreachable_patterns)]
            _ => RegAccess::from_implicit(detail),
        })
    }

    /// Whether `insn` belongs to group `group`.
    pub fn insn_group(&self, insn: &Insn, group: u8) -> Result<bool, Error> {
        Ok(self.detail_of(insn)?.in_group(group))
    }

    /// Whether `insn` implicitly reads `reg`.
    pub fn reg_read(&self, insn: &Insn, reg: u16) -> Result<bool, Error> {
        Ok(self.detail_of(insn)?.reads(reg))
    }

    /// Whether `insn` implicitly writes `reg`.
    pub fn reg_write(&self, insn: &Insn, reg: u16) -> Result<bool, Error> {
        Ok(self.detail_of(insn)?.writes(reg))
    }
}
