//! Error tiers - who has to act on an error

use std::fmt;

/// Where in the interpreter lifecycle an error belongs.
///
/// - `Configuration`: the machine definition itself is broken; no interpreter
///   can be built until the opcode table is fixed.
/// - `Load`: one source line failed to parse; reported as a diagnostic and
///   never fatal to the rest of the program.
/// - `Runtime`: the current run was aborted by the offending operation.
/// - `Host`: the environment around the machine failed (files, config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorTier {
    Configuration,
    Load,
    Runtime,
    Host,
}

impl ErrorTier {
    /// Whether the error aborted a run in progress
    pub fn is_runtime(&self) -> bool {
        matches!(self, ErrorTier::Runtime)
    }

    /// Whether fixing the error requires editing the program text
    pub fn is_program_error(&self) -> bool {
        matches!(self, ErrorTier::Load | ErrorTier::Runtime)
    }
}

impl fmt::Display for ErrorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTier::Configuration => write!(f, "configuration"),
            ErrorTier::Load => write!(f, "load"),
            ErrorTier::Runtime => write!(f, "runtime"),
            ErrorTier::Host => write!(f, "host"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_display() {
        assert_eq!(ErrorTier::Configuration.to_string(), "configuration");
        assert_eq!(ErrorTier::Runtime.to_string(), "runtime");
    }

    #[test]
    fn test_tier_predicates() {
        assert!(ErrorTier::Runtime.is_runtime());
        assert!(!ErrorTier::Load.is_runtime());
        assert!(ErrorTier::Load.is_program_error());
        assert!(!ErrorTier::Host.is_program_error());
    }
}
