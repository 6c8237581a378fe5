//! # RAM Machine Operations
//!
//! An [`Operation`] is one parsed, validated source line. Operations are
//! immutable once parsed; a [`Program`] is the ordered list of them, and its
//! order is the execution order.

use serde::Serialize;
use std::fmt;

/// How an operation's numeric literal is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressingMode {
    /// `=n` - the literal itself
    Direct,
    /// `n` - the value stored in register n
    #[default]
    Registry,
    /// `*n` - register n holds the index of the register to use
    Pointer,
}

impl AddressingMode {
    /// Leading sigil selecting this mode in source text
    pub fn sigil(&self) -> &'static str {
        match self {
            AddressingMode::Direct => "=",
            AddressingMode::Registry => "",
            AddressingMode::Pointer => "*",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressingMode::Direct => "direct",
            AddressingMode::Registry => "registry",
            AddressingMode::Pointer => "pointer",
        }
    }
}

/// One parsed instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    raw: String,
    line: usize,
    opcode: String,
    label: Option<String>,
    value: Option<i64>,
    mode: AddressingMode,
    target: Option<String>,
}

impl Operation {
    pub(crate) fn new(raw: impl Into<String>, line: usize, opcode: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            line,
            opcode: opcode.into(),
            label: None,
            value: None,
            mode: AddressingMode::default(),
            target: None,
        }
    }

    pub(crate) fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub(crate) fn with_value(mut self, value: i64, mode: AddressingMode) -> Self {
        self.value = Some(value);
        self.mode = mode;
        self
    }

    pub(crate) fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Source text as written (comment stripped, trimmed)
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 1-based source line number
    pub fn line(&self) -> usize {
        self.line
    }

    /// Canonical mnemonic of the opcode
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    /// Label defined on this line
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Numeric literal, sigil stripped
    pub fn value(&self) -> Option<i64> {
        self.value
    }

    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    /// Jump target label
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.raw)
    }
}

/// Ordered operations; index = execution position
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    operations: Vec<Operation>,
}

impl Program {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Index of the first operation defining `label`
    pub fn find_label(&self, label: &str) -> Option<usize> {
        self.operations
            .iter()
            .position(|op| op.label() == Some(label))
    }

    /// Labels defined more than once, in order of their second definition
    pub fn duplicate_labels(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for label in self.operations.iter().filter_map(|op| op.label()) {
            if !seen.insert(label) && !dups.contains(&label) {
                dups.push(label);
            }
        }
        dups
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.operations.iter().enumerate() {
            // Labelled lines at column 0, the rest indented
            let indent = if op.label().is_some() { "" } else { "    " };
            writeln!(f, "{:3} | {}{}", i, indent, op.raw())?;
        }
        Ok(())
    }
}
