//! The main Error type for rammachine

use crate::{ErrorKind, ErrorTier};
use std::fmt;

/// The unified error type for all rammachine operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description
/// - `tier`: Configuration, load, runtime or host failure
/// - `operation`: What function raised the error
/// - `context`: Key-value pairs for debugging (offending operation, line)
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use rammachine_error::{Error, ErrorKind, ErrorTier};
///
/// let err = Error::new(ErrorKind::LabelNotFound, "label 'LOOP' not found")
///     .with_operation("context::jump_to")
///     .with_context("label", "LOOP")
///     .with_context("operation", "3: JUMP LOOP");
///
/// assert_eq!(err.kind(), ErrorKind::LabelNotFound);
/// assert_eq!(err.tier(), ErrorTier::Runtime);
/// assert_eq!(err.context_value("operation"), Some("3: JUMP LOOP"));
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    tier: ErrorTier,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tier: kind.default_tier(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error tier
    pub fn tier(&self) -> ErrorTier {
        self.tier
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get the first context value recorded under `key`
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Override the tier derived from the kind
    pub fn with_tier(mut self, tier: ErrorTier) -> Self {
        self.tier = tier;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.tier)?;

        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.tier, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// =============================================================================
// Convenient From implementations (be careful not to leak raw errors!)
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a DuplicateOpcode error
    pub fn duplicate_opcode(mnemonic: impl Into<String>) -> Self {
        let mnemonic = mnemonic.into();
        Self::new(ErrorKind::DuplicateOpcode, format!("duplicate definition for '{}'", mnemonic))
            .with_context("mnemonic", mnemonic)
    }

    /// Create a ParseFailed error
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    /// Create an UnknownOpcode error
    pub fn unknown_opcode(mnemonic: impl Into<String>) -> Self {
        let mnemonic = mnemonic.into();
        Self::new(ErrorKind::UnknownOpcode, format!("unknown operation: {}", mnemonic))
            .with_context("mnemonic", mnemonic)
    }

    /// Create an InvalidOperand error
    pub fn invalid_operand(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperand, message)
    }

    /// Create a NegativeRegister error
    pub fn negative_register(index: i64) -> Self {
        Self::new(
            ErrorKind::NegativeRegister,
            format!("attempted to access negative register {}", index),
        )
        .with_context("register", index.to_string())
    }

    /// Create a LabelNotFound error
    pub fn label_not_found(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(ErrorKind::LabelNotFound, format!("label '{}' not found", label))
            .with_context("label", label)
    }
}
