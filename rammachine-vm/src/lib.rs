//! # RAM Machine VM
//!
//! An interpreter framework for register machines, shipping the classic
//! single-accumulator RAM machine.
//!
//! ## Core Concepts
//! - **Memory**: Accumulator, sparse integer registers, instruction pointer
//! - **Opcode Registry**: Validated mnemonic → handler table built from a [`Machine`]
//! - **Parser**: Source lines → [`Operation`]s, with per-line [`Diagnostic`]s
//! - **Interpreter**: Single-step and run-to-completion execution with delay and stop
//!
//! ```rust
//! use rammachine_vm::{Interpreter, InterpreterConfig};
//!
//! let mut vm = Interpreter::new(InterpreterConfig::default())?;
//! let diagnostics = vm.load_code(["READ 1", "LOAD 1", "MUL 1", "STORE 1", "WRITE 1"]);
//! assert!(diagnostics.is_empty());
//!
//! let outputs = vm.run(vec!["12".to_string()])?;
//! assert_eq!(outputs, vec!["144"]);
//! # Ok::<(), rammachine_vm::Error>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod operation;
pub mod parser;
pub mod ram;
pub mod registry;

pub use config::InterpreterConfig;
pub use context::{ExecutionContext, InputTape};
pub use error::{Error, ErrorKind, ErrorTier, Result};
pub use interpreter::{ExecutionState, Interpreter, Machine, StopHandle, INTERRUPTED_NOTICE};
pub use memory::{Accessor, Address, Memory, NamedRegisters, Value};
pub use operation::{AddressingMode, Operation, Program};
pub use parser::{parse_operation, parse_program, strip_comment, Diagnostic, DEFAULT_COMMENT_MARKER};
pub use ram::RamMachine;
pub use registry::{CasePolicy, Handler, OpcodeDescriptor, OpcodeEntry, OpcodeRegistry};
