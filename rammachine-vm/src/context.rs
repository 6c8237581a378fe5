//! Handler-facing view of the machine while one operation executes.

use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::operation::Program;

/// Input tokens for READ plus the read cursor
#[derive(Debug, Clone, Default)]
pub struct InputTape {
    tokens: Option<Vec<String>>,
    cursor: usize,
}

impl InputTape {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: Some(tokens),
            cursor: 0,
        }
    }

    /// Replace the stored tokens and rewind the cursor
    pub fn load(&mut self, tokens: Vec<String>) {
        self.tokens = Some(tokens);
        self.cursor = 0;
    }

    /// Discard the stored tokens and rewind the cursor
    pub fn clear(&mut self) {
        self.tokens = None;
        self.cursor = 0;
    }

    /// Whether any input sequence was supplied (possibly empty)
    pub fn is_provided(&self) -> bool {
        self.tokens.is_some()
    }

    /// Next unread token
    pub fn peek(&self) -> Option<&str> {
        self.tokens.as_ref()?.get(self.cursor).map(|s| s.as_str())
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Number of tokens consumed so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.tokens
            .as_ref()
            .map(|t| t.len().saturating_sub(self.cursor))
            .unwrap_or(0)
    }
}

/// What an opcode handler can see and touch
pub struct ExecutionContext<'a> {
    memory: &'a mut Memory,
    program: &'a Program,
    input: &'a mut InputTape,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(memory: &'a mut Memory, program: &'a Program, input: &'a mut InputTape) -> Self {
        Self {
            memory,
            program,
            input,
        }
    }

    pub fn memory(&self) -> &Memory {
        &*self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut *self.memory
    }

    pub fn program(&self) -> &Program {
        self.program
    }

    pub fn input(&mut self) -> &mut InputTape {
        &mut *self.input
    }

    /// Retarget to the first operation labelled `label`.
    ///
    /// The pointer is left one before the target; the engine's
    /// post-step increment lands on it.
    pub fn jump_to(&mut self, label: &str) -> Result<()> {
        let index = self
            .program
            .find_label(label)
            .ok_or_else(|| Error::label_not_found(label).with_operation("context::jump_to"))?;

        self.memory.set_instruction_pointer(index as i64 - 1);
        Ok(())
    }

    /// Move the pointer past the end so the run loop stops
    pub fn halt(&mut self) {
        self.memory.set_instruction_pointer(self.program.len() as i64);
    }
}
