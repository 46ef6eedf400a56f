//! Error types for the disassembler front end.
//!
//! Contract violations inside the detail builder are not errors: they panic
//! (see [`crate::arm_builder`]). The variants below cover the recoverable
//! conditions a caller can act on.

use core::fmt;

use crate::ir::{Arch, Mode};

/// Disassembly error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Support for the architecture was not compiled in.
    UnsupportedArch {
        /// The requested architecture.
        arch: Arch,
    },

    /// The mode flags are not valid for the architecture.
    InvalidMode {
        /// The requested architecture.
        arch: Arch,
        /// The rejected mode flags.
        mode: Mode,
    },

    /// The raw decoder rejected the bytes at `address`.
    InvalidInstruction {
        /// Address of the undecodable instruction.
        address: u64,
    },

    /// A detail query was made while detail generation is off.
    DetailDisabled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedArch { arch } => {
                write!(f, "architecture {} is not enabled in this build", arch)
            }
            Error::InvalidMode { arch, mode } => {
                write!(f, "invalid mode 0x{:x} for {}", mode.bits(), arch)
            }
            Error::InvalidInstruction { address } => {
                write!(f, "invalid instruction at 0x{:x}", address)
            }
            Error::DetailDisabled => write!(f, "instruction detail is disabled"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
