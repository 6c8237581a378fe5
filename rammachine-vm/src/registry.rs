//! # Opcode Registry
//!
//! Declarative table mapping mnemonics to handlers and addressing-mode
//! constraints. A concrete machine lists its [`OpcodeEntry`] values once;
//! [`OpcodeRegistry::new`] validates the whole table so an interpreter can
//! never be built from an inconsistent instruction set.
//!
//! ## Construction checks
//! - no mnemonic registered twice under the configured [`CasePolicy`]
//! - mnemonics are non-empty, contain no whitespace and do not start with an
//!   addressing sigil
//! - descriptor flags are consistent (a jump takes no numeric argument, and
//!   direct/pointer addressing is only meaningful with a numeric argument)
//!
//! The handler signature is checked by the compiler through [`Handler`].

use crate::context::ExecutionContext;
use crate::error::{self, Error, Result};
use crate::operation::{AddressingMode, Operation};
use serde::Serialize;
use std::collections::HashMap;

/// Opcode implementation: mutate the machine, optionally emit one output line
pub type Handler = fn(&mut ExecutionContext<'_>, &Operation) -> Result<Option<String>>;

/// Static metadata describing an opcode's argument shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpcodeDescriptor {
    pub mnemonic: &'static str,
    pub description: &'static str,
    pub requires_numeric_argument: bool,
    pub allow_direct: bool,
    pub allow_pointer: bool,
    pub requires_jump_label: bool,
}

impl OpcodeDescriptor {
    /// Opcode taking one numeric operand; registry mode is always allowed
    pub const fn numeric(mnemonic: &'static str, allow_direct: bool, allow_pointer: bool) -> Self {
        Self {
            mnemonic,
            description: "",
            requires_numeric_argument: true,
            allow_direct,
            allow_pointer,
            requires_jump_label: false,
        }
    }

    /// Opcode taking one jump-target label
    pub const fn jump(mnemonic: &'static str) -> Self {
        Self {
            mnemonic,
            description: "",
            requires_numeric_argument: false,
            allow_direct: false,
            allow_pointer: false,
            requires_jump_label: true,
        }
    }

    /// Opcode taking no argument at all
    pub const fn bare(mnemonic: &'static str) -> Self {
        Self {
            mnemonic,
            description: "",
            requires_numeric_argument: false,
            allow_direct: false,
            allow_pointer: false,
            requires_jump_label: false,
        }
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Same constraints under another mnemonic
    pub const fn alias(mut self, mnemonic: &'static str) -> Self {
        self.mnemonic = mnemonic;
        self
    }

    pub fn allows(&self, mode: AddressingMode) -> bool {
        match mode {
            AddressingMode::Direct => self.allow_direct,
            AddressingMode::Pointer => self.allow_pointer,
            AddressingMode::Registry => self.requires_numeric_argument,
        }
    }

    fn validate(&self) -> Result<()> {
        let m = self.mnemonic;
        if m.is_empty() || m.chars().any(char::is_whitespace) {
            return Err(Error::config_invalid(format!("invalid mnemonic '{}'", m))
                .with_context("mnemonic", m));
        }
        if m.starts_with(['*', '=']) {
            return Err(Error::config_invalid(format!(
                "mnemonic '{}' starts with an addressing sigil",
                m
            ))
            .with_context("mnemonic", m));
        }
        if self.requires_jump_label && self.requires_numeric_argument {
            return Err(Error::config_invalid(format!(
                "{} cannot take both a jump label and a numeric argument",
                m
            ))
            .with_context("mnemonic", m));
        }
        if !self.requires_numeric_argument && (self.allow_direct || self.allow_pointer) {
            return Err(Error::config_invalid(format!(
                "{} allows addressing modes but takes no numeric argument",
                m
            ))
            .with_context("mnemonic", m));
        }
        Ok(())
    }
}

/// One row of a machine's instruction table
#[derive(Clone, Copy)]
pub struct OpcodeEntry {
    pub descriptor: OpcodeDescriptor,
    pub handler: Handler,
}

impl OpcodeEntry {
    pub const fn new(descriptor: OpcodeDescriptor, handler: Handler) -> Self {
        Self { descriptor, handler }
    }
}

/// Mnemonic matching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CasePolicy {
    Sensitive,
    #[default]
    Insensitive,
}

impl CasePolicy {
    fn key(&self, mnemonic: &str) -> String {
        match self {
            CasePolicy::Sensitive => mnemonic.to_string(),
            CasePolicy::Insensitive => mnemonic.to_ascii_uppercase(),
        }
    }
}

/// Validated mnemonic → (descriptor, handler) table
pub struct OpcodeRegistry {
    policy: CasePolicy,
    entries: Vec<OpcodeEntry>,
    index: HashMap<String, usize>,
}

impl OpcodeRegistry {
    /// Build the registry, rejecting any inconsistent entry
    pub fn new(entries: Vec<OpcodeEntry>, policy: CasePolicy) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            entry
                .descriptor
                .validate()
                .map_err(|e| e.with_operation("registry::new"))?;

            let key = policy.key(entry.descriptor.mnemonic);
            if index.insert(key, i).is_some() {
                return Err(Error::duplicate_opcode(entry.descriptor.mnemonic)
                    .with_operation("registry::new"));
            }
        }

        tracing::debug!(opcodes = entries.len(), ?policy, "opcode registry built");

        Ok(Self {
            policy,
            entries,
            index,
        })
    }

    pub fn case_policy(&self) -> CasePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, mnemonic: &str) -> Option<&OpcodeEntry> {
        let i = self.index.get(&self.policy.key(mnemonic))?;
        self.entries.get(*i)
    }

    /// Whether `mnemonic` names an opcode under the case policy
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.index.contains_key(&self.policy.key(mnemonic))
    }

    /// Descriptor for `mnemonic` under the case policy
    pub fn resolve(&self, mnemonic: &str) -> Option<&OpcodeDescriptor> {
        self.entry(mnemonic).map(|e| &e.descriptor)
    }

    /// All descriptors in declaration order
    pub fn descriptors(&self) -> impl Iterator<Item = &OpcodeDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Run the handler for `operation`.
    ///
    /// Errors come back with the operation's text attached.
    pub fn dispatch(
        &self,
        ctx: &mut ExecutionContext<'_>,
        operation: &Operation,
    ) -> Result<Option<String>> {
        let entry = self.entry(operation.opcode()).ok_or_else(|| {
            error::at_operation(
                error::invalid_opcode(operation).with_operation("registry::dispatch"),
                operation,
            )
        })?;

        tracing::trace!(operation = %operation, "dispatch");
        (entry.handler)(ctx, operation).map_err(|e| error::at_operation(e, operation))
    }
}
