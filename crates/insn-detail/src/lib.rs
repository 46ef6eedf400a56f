//! # insn-detail: Structured Instruction Detail for ARM and x86
//!
//! `insn-detail` turns the raw output of an instruction decoder (an opcode
//! number plus positional operands) into a structured detail record:
//! typed operands with access flags, implicit registers, instruction groups,
//! condition codes, shifts, write-back and IT-block state.
//!
//! ## Quick Start
//!
//! ```rust
//! use insn_detail::arm::ArmReg;
//! use insn_detail::arm_tables::opc;
//! use insn_detail::{arm_mapping, Detail, Features, McInst, Mode};
//!
//! // cmn r1, #15
//! let mut inst = McInst::new(opc::CMNRI, 0x1000, Mode::ARM);
//! inst.push_reg(ArmReg::r(1).0).push_imm(15).push_imm(14).push_reg(0);
//!
//! let mut detail = Detail::arm();
//! arm_mapping::build_detail(&inst, &mut detail, Features::default());
//! let arm = detail.as_arm().unwrap();
//! assert_eq!(arm.op_count(), 2);
//! assert!(arm.update_flags);
//! ```
//!
//! ## Features
//!
//! - **Table driven**: per-opcode operand descriptors and operand walks are
//!   `static` data; no allocation on the ARM detail path.
//! - **Pluggable decoders**: bring any bitstream decoder through
//!   [`RawDecoder`]; [`Disassembler`] runs decode, classify and build.
//! - **`no_std` + `alloc`**: embeddable in firmware and analysis sandboxes.
//! - **Diagnostic dumps**: single-line renderings for regression corpora.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Pedantic lint policy ─────────────────────────────────────────────────
// Raw operand values travel as i64/u64 and are narrowed to register ids,
// masks and shift amounts all over the detail builder; the table modules
// hold dense hex literals for encodings. The lints below are expected and
// acceptable in this context.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::similar_names,
    clippy::too_many_lines,
    clippy::single_match_else,
    clippy::manual_let_else,
    clippy::unused_self,
    clippy::map_unwrap_or,
    clippy::return_self_not_must_use,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::new_without_default
)]

extern crate alloc;

/// ARM registers, condition codes, shifts, system registers and the ARM
/// detail record.
#[cfg(feature = "arm")]
pub mod arm;
/// Operand detail builder: classify requests → detail operands.
#[cfg(feature = "arm")]
pub mod arm_builder;
/// Instruction classifier, detail lifecycle and register-access summary.
#[cfg(feature = "arm")]
pub mod arm_mapping;
/// Opcode metadata: operand descriptors, operand walks, instruction map.
#[cfg(feature = "arm")]
pub mod arm_tables;
/// Pure raw-value transforms (PC-relative targets, register renumbering).
#[cfg(feature = "arm")]
pub mod arm_transform;
/// Architecture-neutral detail record and register-access summary.
pub mod detail;
/// Single-line diagnostic dumps of detail records.
pub mod dump;
/// Public disassembler API: raw decoder trait, options, pipeline.
pub mod engine;
/// Error types.
pub mod error;
/// Intermediate representation: raw instructions, modes, fixed lists.
pub mod ir;
/// x86 detail record, flags and name tables.
#[cfg(feature = "x86")]
pub mod x86;

// Re-exports
pub use detail::{Access, ArchDetail, Detail, RegAccess};
pub use engine::{arch_enabled, Disassembler, Insn, Options, RawDecoder};
pub use error::Error;
pub use ir::{Arch, Features, FixedList, McInst, McOperand, Mode, Syntax};
