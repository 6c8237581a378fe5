//! Error kinds for rammachine operations

use crate::ErrorTier;
use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to decide how to report a failure; the
/// default [`ErrorTier`] of each kind tells them who has to fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    // =========================================================================
    // Configuration errors (opcode registry construction)
    // =========================================================================
    /// Invalid machine configuration or parameters
    ConfigInvalid,

    /// The same mnemonic was registered twice
    DuplicateOpcode,

    // =========================================================================
    // Parse errors (program loading)
    // =========================================================================
    /// Failed to parse a source line
    ParseFailed,

    /// The line names a mnemonic the machine does not know
    UnknownOpcode,

    /// The operand is missing, superfluous or not numeric
    InvalidOperand,

    /// The operand uses an addressing mode the opcode does not allow
    AddressingModeNotAllowed,

    // =========================================================================
    // Runtime errors (program execution)
    // =========================================================================
    /// A register index resolved to a negative number
    NegativeRegister,

    /// The operation has no handler
    InvalidOpcode,

    /// The operation carries no operand but its handler needs one
    MissingOperand,

    /// Jump target label does not exist in the program
    LabelNotFound,

    /// Division with a zero divisor
    DivisionByZero,

    /// Accumulator arithmetic left the value range
    ArithmeticOverflow,

    /// READ ran past the end of the input sequence
    InputExhausted,

    /// READ hit a non-numeric input token
    InvalidInput,

    /// Stepping was requested with the instruction pointer outside the program
    InstructionPointerOutOfRange,

    /// The configured step limit was reached
    StepLimitExceeded,

    // =========================================================================
    // Host errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// IO operation failed
    IoFailed,

    /// Serialization/deserialization failed
    SerializationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",

            // Configuration
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::DuplicateOpcode => "DuplicateOpcode",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::UnknownOpcode => "UnknownOpcode",
            ErrorKind::InvalidOperand => "InvalidOperand",
            ErrorKind::AddressingModeNotAllowed => "AddressingModeNotAllowed",

            // Runtime
            ErrorKind::NegativeRegister => "NegativeRegister",
            ErrorKind::InvalidOpcode => "InvalidOpcode",
            ErrorKind::MissingOperand => "MissingOperand",
            ErrorKind::LabelNotFound => "LabelNotFound",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::ArithmeticOverflow => "ArithmeticOverflow",
            ErrorKind::InputExhausted => "InputExhausted",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::InstructionPointerOutOfRange => "InstructionPointerOutOfRange",
            ErrorKind::StepLimitExceeded => "StepLimitExceeded",

            // Host
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
        }
    }

    /// The tier an error of this kind belongs to unless overridden
    pub fn default_tier(&self) -> ErrorTier {
        match self {
            ErrorKind::ConfigInvalid | ErrorKind::DuplicateOpcode => ErrorTier::Configuration,

            ErrorKind::ParseFailed
            | ErrorKind::UnknownOpcode
            | ErrorKind::InvalidOperand
            | ErrorKind::AddressingModeNotAllowed => ErrorTier::Load,

            ErrorKind::NegativeRegister
            | ErrorKind::InvalidOpcode
            | ErrorKind::MissingOperand
            | ErrorKind::LabelNotFound
            | ErrorKind::DivisionByZero
            | ErrorKind::ArithmeticOverflow
            | ErrorKind::InputExhausted
            | ErrorKind::InvalidInput
            | ErrorKind::InstructionPointerOutOfRange
            | ErrorKind::StepLimitExceeded => ErrorTier::Runtime,

            ErrorKind::Unexpected
            | ErrorKind::FileNotFound
            | ErrorKind::IoFailed
            | ErrorKind::SerializationFailed => ErrorTier::Host,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::LabelNotFound.to_string(), "LabelNotFound");
        assert_eq!(ErrorKind::DivisionByZero.to_string(), "DivisionByZero");
    }

    #[test]
    fn test_default_tier() {
        assert_eq!(ErrorKind::DuplicateOpcode.default_tier(), ErrorTier::Configuration);
        assert_eq!(ErrorKind::UnknownOpcode.default_tier(), ErrorTier::Load);
        assert_eq!(ErrorKind::InputExhausted.default_tier(), ErrorTier::Runtime);
        assert_eq!(ErrorKind::IoFailed.default_tier(), ErrorTier::Host);
    }
}
