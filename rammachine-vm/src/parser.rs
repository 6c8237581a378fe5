//! # Operation Parser
//!
//! Turns program text into [`Operation`]s validated against an
//! [`OpcodeRegistry`].
//!
//! ## Syntax
//!
//! ```text
//! [label[:]] MNEMONIC [operand | target-label]   # optional comment
//! ```
//!
//! - A first token that is not a mnemonic defines a label
//! - `=n` direct value, `*n` pointer, bare `n` register
//! - Register indices (bare and pointer operands) must be non-negative
//!
//! One line's failure never aborts the batch: [`parse_program`] collects a
//! [`Diagnostic`] per bad line and keeps every good one.

use crate::error::{self, Error, ErrorKind, ErrorTier, Result};
use crate::operation::{AddressingMode, Operation, Program};
use crate::registry::OpcodeRegistry;
use std::fmt;

/// Default comment start character
pub const DEFAULT_COMMENT_MARKER: char = '#';

const LABEL_SUFFIX: char = ':';

/// Drop everything from `marker` on, then trim
pub fn strip_comment(line: &str, marker: char) -> &str {
    match line.find(marker) {
        Some(i) => line[..i].trim(),
        None => line.trim(),
    }
}

/// Parse one comment-stripped, trimmed line.
///
/// `sequence` is the source line number recorded on the operation.
pub fn parse_operation(line: &str, registry: &OpcodeRegistry, sequence: usize) -> Result<Operation> {
    parse_tokens(line, registry, sequence).map_err(|e| {
        e.with_operation("parser::parse_operation")
            .with_context("line", sequence.to_string())
    })
}

fn parse_tokens(line: &str, registry: &OpcodeRegistry, sequence: usize) -> Result<Operation> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Err(Error::parse_failed("empty line"));
    };

    let mut rest = &tokens[..];
    let mut label = None;
    if !registry.contains(first) {
        let name = first.strip_suffix(LABEL_SUFFIX).unwrap_or(first);
        rest = &rest[1..];
        if rest.is_empty() {
            return Err(Error::unknown_opcode(first));
        }
        if name.is_empty() {
            return Err(Error::parse_failed("empty label"));
        }
        label = Some(name.to_string());
    }

    let mnemonic = rest[0];
    let descriptor = registry
        .resolve(mnemonic)
        .ok_or_else(|| Error::unknown_opcode(mnemonic))?;
    let args = &rest[1..];

    let operation = Operation::new(line, sequence, descriptor.mnemonic).with_label(label);

    if descriptor.requires_jump_label {
        return match args {
            [target] => Ok(operation.with_target(*target)),
            [] => Err(error::missing_jump_label(descriptor.mnemonic)),
            _ => Err(error::too_many_arguments(descriptor.mnemonic, args.len())),
        };
    }

    if !descriptor.requires_numeric_argument {
        if !args.is_empty() {
            return Err(error::unexpected_parameter(descriptor.mnemonic));
        }
        return Ok(operation);
    }

    let arg = match args {
        [arg] => *arg,
        [] => return Err(error::missing_parameter(descriptor.mnemonic)),
        _ => return Err(error::too_many_arguments(descriptor.mnemonic, args.len())),
    };

    let (mode, digits) = if let Some(rest) = arg.strip_prefix('*') {
        (AddressingMode::Pointer, rest)
    } else if let Some(rest) = arg.strip_prefix('=') {
        (AddressingMode::Direct, rest)
    } else {
        (AddressingMode::Registry, arg)
    };

    if !descriptor.allows(mode) {
        return Err(error::addressing_mode_not_allowed(descriptor.mnemonic, mode.as_str()));
    }

    let value: i64 = digits
        .parse()
        .map_err(|e| error::non_numeric_argument(arg).set_source(e))?;

    if mode != AddressingMode::Direct && value < 0 {
        return Err(Error::negative_register(value).with_tier(ErrorTier::Load));
    }

    Ok(operation.with_value(value, mode))
}

/// One rejected source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line number
    pub line: usize,
    pub kind: ErrorKind,
    pub message: String,
    /// The line as parsed (comment stripped)
    pub source: String,
}

impl Diagnostic {
    pub fn new(line: usize, source: impl Into<String>, err: &Error) -> Self {
        Self {
            line,
            kind: err.kind(),
            message: err.message().to_string(),
            source: source.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.message, self.source)
    }
}

/// Parse every non-blank line; bad lines become diagnostics
pub fn parse_program<I, S>(lines: I, registry: &OpcodeRegistry, comment_marker: char) -> (Program, Vec<Diagnostic>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut operations = Vec::new();
    let mut diagnostics = Vec::new();

    for (i, raw) in lines.into_iter().enumerate() {
        let line_no = i + 1;
        let text = strip_comment(raw.as_ref(), comment_marker);
        if text.is_empty() {
            continue;
        }

        match parse_operation(text, registry, line_no) {
            Ok(op) => operations.push(op),
            Err(e) => {
                tracing::debug!(line = line_no, error = %e, "rejected source line");
                diagnostics.push(Diagnostic::new(line_no, text, &e));
            }
        }
    }

    (Program::new(operations), diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::RamMachine;
    use crate::interpreter::Machine;
    use pretty_assertions::assert_eq;

    fn registry() -> OpcodeRegistry {
        OpcodeRegistry::new(RamMachine::opcodes(), RamMachine::case_policy()).unwrap()
    }

    fn parse(line: &str) -> Result<Operation> {
        parse_operation(line, &registry(), 1)
    }

    fn kind(line: &str) -> ErrorKind {
        parse(line).unwrap_err().kind()
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("  LOAD 1  # load it", '#'), "LOAD 1");
        assert_eq!(strip_comment("# only comment", '#'), "");
        assert_eq!(strip_comment("  HALT ", '#'), "HALT");
        assert_eq!(strip_comment("HALT ; bye", ';'), "HALT");
    }

    #[test]
    fn test_addressing_modes() {
        let op = parse("LOAD =5").unwrap();
        assert_eq!((op.mode(), op.value()), (AddressingMode::Direct, Some(5)));

        let op = parse("LOAD 5").unwrap();
        assert_eq!((op.mode(), op.value()), (AddressingMode::Registry, Some(5)));

        let op = parse("LOAD *5").unwrap();
        assert_eq!((op.mode(), op.value()), (AddressingMode::Pointer, Some(5)));

        let op = parse("LOAD =-5").unwrap();
        assert_eq!(op.value(), Some(-5));
    }

    #[test]
    fn test_mnemonic_case_insensitive() {
        let op = parse("load =1").unwrap();
        assert_eq!(op.opcode(), "LOAD");
        assert_eq!(op.raw(), "load =1");
    }

    #[test]
    fn test_label_definition() {
        let op = parse("LOOP: JUMP LOOP").unwrap();
        assert_eq!(op.label(), Some("LOOP"));
        assert_eq!(op.target(), Some("LOOP"));

        let op = parse("start READ 1").unwrap();
        assert_eq!(op.label(), Some("start"));
        assert_eq!(op.opcode(), "READ");
    }

    #[test]
    fn test_label_without_operation() {
        assert_eq!(kind("LONELY"), ErrorKind::UnknownOpcode);
        assert_eq!(kind("L1 L2 HALT"), ErrorKind::UnknownOpcode);
        assert_eq!(kind(": HALT"), ErrorKind::ParseFailed);
    }

    #[test]
    fn test_jump_argument_count() {
        assert_eq!(kind("JUMP"), ErrorKind::InvalidOperand);
        assert_eq!(kind("JZERO A B"), ErrorKind::InvalidOperand);
        assert_eq!(parse("JGTZ 12").unwrap().target(), Some("12"));
    }

    #[test]
    fn test_parameterless() {
        assert!(parse("HALT").unwrap().value().is_none());
        let err = parse("HALT 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperand);
        assert!(err.message().contains("takes no parameter"));
    }

    #[test]
    fn test_numeric_argument_count() {
        let err = parse("ADD").unwrap_err();
        assert!(err.message().contains("requires a parameter"));
        assert_eq!(kind("ADD 1 2"), ErrorKind::InvalidOperand);
    }

    #[test]
    fn test_disallowed_modes() {
        assert_eq!(kind("STORE =3"), ErrorKind::AddressingModeNotAllowed);
        assert_eq!(kind("READ =3"), ErrorKind::AddressingModeNotAllowed);
        assert!(parse("STORE *3").is_ok());
    }

    #[test]
    fn test_non_numeric() {
        let err = parse("ADD x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperand);
        assert!(err.source_ref().is_some());
        assert_eq!(kind("ADD *=3"), ErrorKind::InvalidOperand);
    }

    #[test]
    fn test_negative_register_rejected() {
        let err = parse("LOAD -1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NegativeRegister);
        assert_eq!(err.tier(), ErrorTier::Load);

        assert_eq!(kind("WRITE *-2"), ErrorKind::NegativeRegister);
    }

    #[test]
    fn test_unknown_mnemonic_after_label() {
        let err = parse("L1 FROB 3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
        assert_eq!(err.context_value("mnemonic"), Some("FROB"));
    }

    #[test]
    fn test_alias_resolves_to_its_own_mnemonic() {
        assert_eq!(parse("mult =2").unwrap().opcode(), "MULT");
    }

    #[test]
    fn test_parse_program_collects_diagnostics() {
        let source = [
            "# square the input",
            "      READ 1",
            "LOAD 1",
            "",
            "MUL 1",
            "STORE 2",
            "WRITE 2",
            "LOAD =0",
            "JZERO END",
            "BOGUS 7",
            "WRITE =99",
            "END: HALT   # done",
        ];

        let (program, diagnostics) = parse_program(source, &registry(), DEFAULT_COMMENT_MARKER);

        assert_eq!(program.len(), 9);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 10);
        assert_eq!(diagnostics[0].kind, ErrorKind::UnknownOpcode);
        assert_eq!(diagnostics[0].source, "BOGUS 7");

        let last = program.get(8).unwrap();
        assert_eq!(last.raw(), "END: HALT");
        assert_eq!(last.line(), 12);
        assert_eq!(last.to_string(), "12: END: HALT");
    }

    #[test]
    fn test_diagnostic_display() {
        let err = parse("HALT 1").unwrap_err();
        let diag = Diagnostic::new(4, "HALT 1", &err);
        assert_eq!(diag.to_string(), "line 4: operation HALT takes no parameter (HALT 1)");
    }
}
