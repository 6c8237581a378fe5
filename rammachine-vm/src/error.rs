//! RAM machine error helpers
//!
//! Re-exports rammachine-error and provides VM-specific conveniences.

// Re-export the core error types
pub use rammachine_error::{Error, ErrorKind, ErrorTier, Result};

use crate::operation::Operation;

// =============================================================================
// Parse-time constructors
// =============================================================================

/// Create a parse error for a jump without a target label
pub fn missing_jump_label(mnemonic: &str) -> Error {
    Error::invalid_operand(format!("operation {} requires a target label", mnemonic))
        .with_context("mnemonic", mnemonic.to_string())
}

/// Create a TooManyArguments parse error
pub fn too_many_arguments(mnemonic: &str, found: usize) -> Error {
    Error::invalid_operand(format!("too many arguments for {}", mnemonic))
        .with_context("mnemonic", mnemonic.to_string())
        .with_context("found", found.to_string())
}

/// Create a parse error for an operand given to a parameterless opcode
pub fn unexpected_parameter(mnemonic: &str) -> Error {
    Error::invalid_operand(format!("operation {} takes no parameter", mnemonic))
        .with_context("mnemonic", mnemonic.to_string())
}

/// Create a parse error for an opcode missing its numeric parameter
pub fn missing_parameter(mnemonic: &str) -> Error {
    Error::invalid_operand(format!("operation {} requires a parameter", mnemonic))
        .with_context("mnemonic", mnemonic.to_string())
}

/// Create a parse error for a non-numeric operand
pub fn non_numeric_argument(text: &str) -> Error {
    Error::invalid_operand(format!("non-numeric argument '{}'", text))
        .with_context("argument", text.to_string())
}

/// Create an AddressingModeNotAllowed error
pub fn addressing_mode_not_allowed(mnemonic: &str, mode: &str) -> Error {
    Error::new(
        ErrorKind::AddressingModeNotAllowed,
        format!("operation {} does not allow {} operands", mnemonic, mode),
    )
    .with_context("mnemonic", mnemonic.to_string())
    .with_context("mode", mode.to_string())
}

// =============================================================================
// Runtime constructors
// =============================================================================

/// Attach the offending operation to a runtime error
pub fn at_operation(err: Error, operation: &Operation) -> Error {
    if err.context_value("operation").is_some() {
        return err;
    }
    err.with_context("line", operation.line().to_string())
        .with_context("operation", operation.to_string())
}

/// Create an InvalidOpcode error for an operation without a handler
pub fn invalid_opcode(operation: &Operation) -> Error {
    Error::new(
        ErrorKind::InvalidOpcode,
        format!("unknown operation: {}", operation.opcode()),
    )
    .with_context("mnemonic", operation.opcode().to_string())
}

/// Create a MissingOperand error
pub fn missing_operand() -> Error {
    Error::new(ErrorKind::MissingOperand, "missing value for operation")
}

/// Create a DivisionByZero error
pub fn division_by_zero() -> Error {
    Error::new(ErrorKind::DivisionByZero, "attempted to divide by zero")
}

/// Create an ArithmeticOverflow error
pub fn arithmetic_overflow(op: &'static str, lhs: i64, rhs: i64) -> Error {
    Error::new(
        ErrorKind::ArithmeticOverflow,
        format!("{} {} {} overflows the accumulator", lhs, op, rhs),
    )
}

/// Create an InputExhausted error
pub fn input_exhausted(consumed: usize) -> Error {
    Error::new(ErrorKind::InputExhausted, "no inputs left for operation")
        .with_context("consumed", consumed.to_string())
}

/// Create an InvalidInput error
pub fn invalid_input(token: &str) -> Error {
    Error::new(ErrorKind::InvalidInput, format!("non-numeric input '{}'", token))
        .with_context("input", token.to_string())
}

/// Create an InstructionPointerOutOfRange error
pub fn instruction_pointer_out_of_range(pointer: i64, len: usize) -> Error {
    Error::new(
        ErrorKind::InstructionPointerOutOfRange,
        format!("no operation at instruction pointer {}", pointer),
    )
    .with_context("pointer", pointer.to_string())
    .with_context("program_len", len.to_string())
}

/// Create a StepLimitExceeded error
pub fn step_limit_exceeded(max: u64) -> Error {
    Error::new(ErrorKind::StepLimitExceeded, format!("step limit {} exceeded", max))
        .with_context("max_steps", max.to_string())
}
