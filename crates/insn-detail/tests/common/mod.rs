//! Shared fixture decoder for integration tests.
//!
//! Real bitstream decoding is out of scope for this crate, so tests feed the
//! pipeline through a decoder that recognises a fixed set of encodings and
//! replays the raw operands a decoder would produce for them.

#![allow(dead_code)]

use insn_detail::{Detail, McInst, McOperand, Mode, RawDecoder};

/// One known encoding.
pub struct Fixture {
    pub bytes: &'static [u8],
    /// Modes the encoding decodes in; `None` matches any.
    pub mode: Option<Mode>,
    pub opcode: u32,
    pub operands: &'static [McOperand],
    /// Fills the x86 payload, for x86 fixtures.
    pub fill: Option<fn(&mut Detail)>,
}

impl Fixture {
    pub const fn arm(bytes: &'static [u8], opcode: u32, operands: &'static [McOperand]) -> Self {
        Self {
            bytes,
            mode: None,
            opcode,
            operands,
            fill: None,
        }
    }

    pub const fn thumb(
        bytes: &'static [u8],
        opcode: u32,
        operands: &'static [McOperand],
    ) -> Self {
        Self {
            mode: Some(Mode::THUMB),
            ..Self::arm(bytes, opcode, operands)
        }
    }

    pub const fn x86(bytes: &'static [u8], id: u32, fill: fn(&mut Detail)) -> Self {
        Self {
            bytes,
            mode: None,
            opcode: id,
            operands: &[],
            fill: Some(fill),
        }
    }
}

/// Decodes by longest-prefix match against a fixture list.
pub struct FixtureDecoder {
    fixtures: &'static [Fixture],
}

impl FixtureDecoder {
    pub const fn new(fixtures: &'static [Fixture]) -> Self {
        Self { fixtures }
    }
}

impl RawDecoder for FixtureDecoder {
    fn decode(
        &self,
        code: &[u8],
        _address: u64,
        mode: Mode,
        inst: &mut McInst,
        detail: Option<&mut Detail>,
    ) -> Option<u16> {
        let fx = self
            .fixtures
            .iter()
            .filter(|f| code.starts_with(f.bytes))
            .filter(|f| f.mode.map_or(true, |m| mode.contains(m)))
            .max_by_key(|f| f.bytes.len())?;
        inst.opcode = fx.opcode;
        for &op in fx.operands {
            inst.operands.push(op);
        }
        if let (Some(fill), Some(detail)) = (fx.fill, detail) {
            fill(detail);
        }
        Some(fx.bytes.len() as u16)
    }
}

// ── ARM register shorthands ─────────────────────────────────────────────

pub const fn r(n: u16) -> McOperand {
    McOperand::Reg(insn_detail::arm::ArmReg::r(n).0)
}

pub const fn imm(v: i64) -> McOperand {
    McOperand::Imm(v)
}

/// The `al` predicate and its (absent) predicate register.
pub const AL: [McOperand; 2] = [McOperand::Imm(14), McOperand::Reg(0)];
