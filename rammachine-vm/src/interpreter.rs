//! # Execution Engine
//!
//! Owns memory, the loaded program and the opcode registry of one machine,
//! and drives single-step and run-to-completion execution.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──execute_async/run──> Running ──end of program / HALT / error──> Halted
//!                                │
//!                                └──stop requested──> Interrupted
//! ```
//!
//! A run checks the interruption flag after every step, so a stop request
//! takes effect even with a zero step delay. [`StopHandle::stop`] waits on
//! the state channel until the engine has left `Running`.
//!
//! `load_code` and `reset` take `&mut self` and so cannot overlap a run on
//! the same interpreter; stop it through a [`StopHandle`] first.

use crate::config::InterpreterConfig;
use crate::context::{ExecutionContext, InputTape};
use crate::error::{self, Result};
use crate::memory::{Memory, NamedRegisters};
use crate::operation::Program;
use crate::parser::{self, Diagnostic};
use crate::ram::RamMachine;
use crate::registry::{CasePolicy, OpcodeEntry, OpcodeRegistry};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Output line appended when a run is stopped from outside
pub const INTERRUPTED_NOTICE: &str = "Execution has been interrupted.";

/// A concrete machine: its instruction table and named registers
pub trait Machine {
    const NAME: &'static str;

    /// Declarative opcode table, validated once by [`OpcodeRegistry::new`]
    fn opcodes() -> Vec<OpcodeEntry>;

    fn case_policy() -> CasePolicy {
        CasePolicy::Insensitive
    }

    fn named_registers() -> NamedRegisters {
        NamedRegisters::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Execution State
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    Halted,
    Interrupted,
}

impl ExecutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Running => "running",
            ExecutionState::Halted => "halted",
            ExecutionState::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between an interpreter and its stop handles
#[derive(Debug)]
struct Shared {
    interrupted: AtomicBool,
    state: watch::Sender<ExecutionState>,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(ExecutionState::Idle);
        Self {
            interrupted: AtomicBool::new(false),
            state,
        }
    }

    fn state(&self) -> ExecutionState {
        *self.state.borrow()
    }

    fn set_state(&self, state: ExecutionState) {
        self.state.send_replace(state);
    }
}

/// Cloneable handle for stopping a run from another task
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    pub fn state(&self) -> ExecutionState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ExecutionState::Running
    }

    /// Request a stop and wait until the engine is no longer running.
    ///
    /// Returns immediately when nothing is running.
    pub async fn stop(&self) {
        if !self.is_running() {
            return;
        }

        let mut rx = self.shared.state.subscribe();
        self.shared.interrupted.store(true, Ordering::SeqCst);
        tracing::debug!("stop requested");

        // The sender lives in `shared`, which we hold, so the channel cannot close
        let _ = rx.wait_for(|s| *s != ExecutionState::Running).await;
    }
}

/// Marks a run as interrupted if its future is dropped mid-run
struct RunGuard {
    shared: Arc<Shared>,
}

impl RunGuard {
    fn finish(&self, state: ExecutionState) {
        self.shared.set_state(state);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.shared.state.send_if_modified(|s| {
            if *s == ExecutionState::Running {
                *s = ExecutionState::Interrupted;
                true
            } else {
                false
            }
        });
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Interpreter
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Interpreter {
    machine: &'static str,
    config: InterpreterConfig,
    registry: OpcodeRegistry,
    memory: Memory,
    program: Program,
    input: InputTape,
    steps: u64,
    shared: Arc<Shared>,
}

impl Interpreter {
    /// Create a RAM machine interpreter
    pub fn new(config: InterpreterConfig) -> Result<Self> {
        Self::for_machine::<RamMachine>(config)
    }

    /// Create an interpreter for any machine definition.
    ///
    /// Fails when the machine's opcode table is inconsistent.
    pub fn for_machine<M: Machine>(config: InterpreterConfig) -> Result<Self> {
        let registry = OpcodeRegistry::new(M::opcodes(), M::case_policy())
            .map_err(|e| e.with_context("machine", M::NAME))?;

        tracing::debug!(machine = M::NAME, opcodes = registry.len(), "interpreter created");

        Ok(Self {
            machine: M::NAME,
            config,
            registry,
            memory: Memory::with_named_registers(M::named_registers()),
            program: Program::default(),
            input: InputTape::default(),
            steps: 0,
            shared: Arc::new(Shared::new()),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn machine_name(&self) -> &'static str {
        self.machine
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn registry(&self) -> &OpcodeRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn input(&self) -> &InputTape {
        &self.input
    }

    pub fn state(&self) -> ExecutionState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ExecutionState::Running
    }

    /// Operations executed since the last load or reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the program with every line that parses.
    ///
    /// Returns one diagnostic per rejected line. Labels are not checked
    /// here; jumps resolve them when they execute.
    pub fn load_code<I, S>(&mut self, lines: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (program, diagnostics) =
            parser::parse_program(lines, &self.registry, self.config.comment_marker);

        for label in program.duplicate_labels() {
            tracing::warn!(label, "duplicate label, jumps use the first definition");
        }
        if !diagnostics.is_empty() {
            tracing::warn!(rejected = diagnostics.len(), "some lines failed to parse");
        }
        tracing::info!(
            operations = program.len(),
            diagnostics = diagnostics.len(),
            "program loaded"
        );

        self.program = program;
        self.memory.set_instruction_pointer(0);
        self.steps = 0;
        self.shared.set_state(ExecutionState::Idle);
        diagnostics
    }

    /// Supply READ input for single-stepping; rewinds the read cursor
    pub fn set_inputs(&mut self, inputs: Vec<String>) {
        self.input.load(inputs);
    }

    /// Clear memory, program, inputs and step count
    pub fn reset(&mut self) {
        self.memory.clear();
        self.program.clear();
        self.input.clear();
        self.steps = 0;
        self.shared.interrupted.store(false, Ordering::SeqCst);
        self.shared.set_state(ExecutionState::Idle);
        tracing::debug!("interpreter reset");
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Whether the instruction pointer is on an operation
    pub fn has_next(&self) -> bool {
        usize::try_from(self.memory.instruction_pointer()).is_ok_and(|i| i < self.program.len())
    }

    /// Execute the operation under the instruction pointer, then advance.
    ///
    /// On error the pointer stays on the failing operation.
    pub fn execute_next(&mut self) -> Result<Option<String>> {
        let ip = self.memory.instruction_pointer();
        let operation = usize::try_from(ip)
            .ok()
            .and_then(|i| self.program.get(i))
            .ok_or_else(|| {
                error::instruction_pointer_out_of_range(ip, self.program.len())
                    .with_operation("interpreter::execute_next")
            })?;

        if let Some(max) = self.config.max_steps {
            if self.steps >= max {
                return Err(error::at_operation(
                    error::step_limit_exceeded(max).with_operation("interpreter::execute_next"),
                    operation,
                ));
            }
        }

        let mut ctx = ExecutionContext::new(&mut self.memory, &self.program, &mut self.input);
        let output = self.registry.dispatch(&mut ctx, operation)?;

        tracing::debug!(ip, operation = %operation, acc = self.memory.accumulator(), "step");

        self.steps += 1;
        let next = self.memory.instruction_pointer().saturating_add(1);
        self.memory.set_instruction_pointer(next);
        Ok(output)
    }

    fn begin_run(&mut self, inputs: Vec<String>) -> RunGuard {
        self.input.load(inputs);
        self.shared.interrupted.store(false, Ordering::SeqCst);
        self.shared.set_state(ExecutionState::Running);
        tracing::debug!(
            ip = self.memory.instruction_pointer(),
            inputs = self.input.remaining(),
            "run started"
        );
        RunGuard {
            shared: Arc::clone(&self.shared),
        }
    }

    fn step_into(&mut self, outputs: &mut Vec<String>, guard: &RunGuard) -> Result<()> {
        match self.execute_next() {
            Ok(Some(line)) => {
                outputs.push(line);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "run aborted");
                guard.finish(ExecutionState::Halted);
                Err(e)
            }
        }
    }

    /// Consume a pending stop request
    fn take_interrupt(&self, outputs: &mut Vec<String>, guard: &RunGuard) -> bool {
        if !self.shared.interrupted.swap(false, Ordering::SeqCst) {
            return false;
        }
        tracing::warn!(steps = self.steps, "run interrupted");
        outputs.push(INTERRUPTED_NOTICE.to_string());
        guard.finish(ExecutionState::Interrupted);
        true
    }

    fn finish_run(&self, outputs: &[String], guard: &RunGuard) {
        tracing::info!(steps = self.steps, outputs = outputs.len(), "run finished");
        guard.finish(ExecutionState::Halted);
    }

    /// Run from the current instruction pointer until the program ends.
    ///
    /// Sleeps `step_delay` between steps when nonzero. A stop request is
    /// honored after the step in flight and adds [`INTERRUPTED_NOTICE`] to
    /// the outputs. A runtime error halts the engine and is returned as is.
    pub async fn execute_async(&mut self, inputs: Vec<String>) -> Result<Vec<String>> {
        let guard = self.begin_run(inputs);
        let delay = self.config.step_delay();
        let mut outputs = Vec::new();

        while self.has_next() {
            self.step_into(&mut outputs, &guard)?;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if self.take_interrupt(&mut outputs, &guard) {
                return Ok(outputs);
            }
        }

        self.finish_run(&outputs, &guard);
        Ok(outputs)
    }

    /// Blocking counterpart of [`execute_async`](Self::execute_async), without delay
    pub fn run(&mut self, inputs: Vec<String>) -> Result<Vec<String>> {
        let guard = self.begin_run(inputs);
        let mut outputs = Vec::new();

        while self.has_next() {
            self.step_into(&mut outputs, &guard)?;

            if self.take_interrupt(&mut outputs, &guard) {
                return Ok(outputs);
            }
        }

        self.finish_run(&outputs, &guard);
        Ok(outputs)
    }

    /// Stop a running execution and wait for it; no-op when idle
    pub async fn stop_execution(&self) {
        self.stop_handle().stop().await
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("machine", &self.machine)
            .field("state", &self.state())
            .field("ip", &self.memory.instruction_pointer())
            .field("operations", &self.program.len())
            .field("steps", &self.steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::operation::Operation;
    use crate::registry::OpcodeDescriptor;
    use crate::test_utils::init_test_logging;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn interpreter() -> Interpreter {
        init_test_logging();
        Interpreter::new(InterpreterConfig::default()).unwrap()
    }

    fn loaded(lines: &[&str]) -> Interpreter {
        let mut interp = interpreter();
        let diagnostics = interp.load_code(lines);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        interp
    }

    fn inputs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    const ARITHMETIC: &[&str] = &[
        "LOAD =3",
        "ADD =4",
        "STORE 1",
        "MUL 1       # 49",
        "SUB =9",
        "DIV =8",
        "WRITE 1",
        "WRITE =-2",
        "HALT",
        "WRITE =100",
    ];

    #[tokio::test]
    async fn test_deterministic_runs() {
        let mut interp = interpreter();

        interp.reset();
        interp.load_code(ARITHMETIC);
        let first = interp.execute_async(Vec::new()).await.unwrap();
        let acc = interp.memory().accumulator();

        interp.reset();
        interp.load_code(ARITHMETIC);
        let second = interp.execute_async(Vec::new()).await.unwrap();

        assert_eq!(first, vec!["7", "-2"]);
        assert_eq!(first, second);
        assert_eq!(acc, 5);
        assert_eq!(interp.state(), ExecutionState::Halted);
    }

    #[test]
    fn test_unset_register_writes_zero() {
        let mut interp = loaded(&["LOAD 5", "WRITE 5"]);

        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["0"]);
        assert!(!interp.memory().has_value(5));
    }

    #[test]
    fn test_store_then_load() {
        let mut interp = loaded(&["LOAD =42", "STORE 3", "LOAD =0", "LOAD 3", "WRITE 3", "WRITE 4"]);

        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["42", "0"]);
        assert_eq!(interp.memory().accumulator(), 42);
        assert_eq!(interp.memory().get(3), 42);
    }

    #[test]
    fn test_conditional_jumps_fall_through() {
        let mut interp = loaded(&[
            "LOAD =1",
            "JZERO SKIP",
            "WRITE =10",
            "SKIP: LOAD =0",
            "JGTZ END",
            "WRITE =20",
            "LOAD =-5",
            "JGTZ END",
            "WRITE =30",
            "LOAD =5",
            "JGTZ END",
            "WRITE =40",
            "END: HALT",
        ]);

        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["10", "20", "30"]);
    }

    #[test]
    fn test_jzero_taken_and_backward_jump() {
        let mut interp = loaded(&[
            "      LOAD =3",
            "TOP:  WRITE =1",
            "      SUB =1",
            "      JZERO DONE",
            "      JUMP TOP",
            "DONE: HALT",
        ]);

        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["1", "1", "1"]);
        assert_eq!(interp.memory().accumulator(), 0);
    }

    #[test]
    fn test_duplicate_labels_use_first() {
        let mut interp = loaded(&["JUMP A", "A: WRITE =1", "HALT", "A: WRITE =2"]);

        assert_eq!(interp.program().duplicate_labels(), vec!["A"]);
        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["1"]);
    }

    #[test]
    fn test_missing_label_is_runtime_error() {
        let mut interp = loaded(&["WRITE =1", "JUMP NOWHERE"]);

        let err = interp.run(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LabelNotFound);
        assert_eq!(err.context_value("operation"), Some("2: JUMP NOWHERE"));
        assert_eq!(interp.state(), ExecutionState::Halted);
    }

    #[test]
    fn test_negative_dereference() {
        let mut interp = loaded(&["LOAD =-1", "STORE 5", "LOAD *5"]);

        let err = interp.run(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NegativeRegister);
        assert_eq!(err.context_value("operation"), Some("3: LOAD *5"));
        assert_eq!(interp.memory().instruction_pointer(), 2);

        // A literal negative register never makes it into the program
        let diagnostics = interp.load_code(["LOAD -1"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::NegativeRegister);
        assert!(interp.program().is_empty());
    }

    #[test]
    fn test_division_by_zero_keeps_accumulator() {
        let mut interp = loaded(&["LOAD =17", "DIV 9"]);

        let err = interp.run(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
        assert_eq!(interp.memory().accumulator(), 17);
        assert_eq!(interp.state(), ExecutionState::Halted);
    }

    #[test]
    fn test_read_non_numeric() {
        let mut interp = loaded(&["READ 1", "READ 2"]);

        let err = interp.run(inputs(&["3", "x"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.context_value("operation"), Some("2: READ 2"));
        assert_eq!(interp.memory().get(1), 3);
        assert!(!interp.memory().has_value(2));
    }

    #[test]
    fn test_read_exhausted() {
        let mut interp = loaded(&["READ 1", "READ *1"]);

        let err = interp.run(inputs(&["4"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputExhausted);
        assert_eq!(err.context_value("consumed"), Some("1"));
    }

    #[test]
    fn test_read_through_pointer() {
        let mut interp = loaded(&["READ 1", "READ *1", "WRITE *1"]);

        assert_eq!(interp.run(inputs(&["8", "-6"])).unwrap(), vec!["-6"]);
        assert_eq!(interp.memory().get(8), -6);
    }

    #[test]
    fn test_load_reports_bad_line_keeps_the_rest() {
        let mut interp = interpreter();
        let diagnostics = interp.load_code([
            "READ 1",
            "LOAD 1",
            "MUL 1",
            "STORE 2",
            "WRITE 2",
            "STORE =2",
            "JZERO END",
            "ADD =1",
            "WRITE 2",
            "END: HALT",
        ]);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 6);
        assert_eq!(diagnostics[0].kind, ErrorKind::AddressingModeNotAllowed);
        assert_eq!(interp.program().len(), 9);
        assert_eq!(interp.run(inputs(&["6"])).unwrap(), vec!["36", "36"]);
    }

    #[test]
    fn test_single_step() {
        let mut interp = loaded(&["READ 1", "WRITE 1"]);
        interp.set_inputs(inputs(&["9"]));

        assert_eq!(interp.execute_next().unwrap(), None);
        assert_eq!(interp.execute_next().unwrap(), Some("9".to_string()));
        assert_eq!(interp.steps(), 2);
        assert_eq!(interp.state(), ExecutionState::Idle);

        let err = interp.execute_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InstructionPointerOutOfRange);
    }

    #[test]
    fn test_step_limit() {
        let mut interp = interpreter();
        interp.config.max_steps = Some(50);
        interp.load_code(["LOOP: JUMP LOOP"]);

        let err = interp.run(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepLimitExceeded);
        assert_eq!(interp.steps(), 50);
    }

    #[test]
    fn test_reset() {
        let mut interp = loaded(&["LOAD =2", "STORE 4"]);
        interp.run(Vec::new()).unwrap();

        interp.reset();

        assert_eq!(interp.memory().accumulator(), 0);
        assert_eq!(interp.memory().registers().count(), 0);
        assert!(interp.program().is_empty());
        assert!(!interp.input().is_provided());
        assert_eq!(interp.steps(), 0);
        assert_eq!(interp.state(), ExecutionState::Idle);
        assert_eq!(interp.run(Vec::new()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_named_registers() {
        let mut interp = loaded(&["LOAD =11"]);
        interp.run(Vec::new()).unwrap();

        assert_eq!(interp.memory().read_named("acc"), Some(11));
        assert_eq!(interp.memory().read_named("IP"), Some(1));
        assert!(interp.memory_mut().write_named("ACC", -4));
        assert_eq!(interp.memory().accumulator(), -4);
        assert_eq!(interp.memory().read_named("R1"), None);
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let interp = interpreter();

        tokio_test::block_on(interp.stop_execution());
        assert_eq!(interp.state(), ExecutionState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_infinite_loop_without_delay() {
        let mut interp = loaded(&["LOOP: JUMP LOOP"]);
        let handle = interp.stop_handle();

        let run = tokio::spawn(async move {
            let result = interp.execute_async(Vec::new()).await;
            (interp, result)
        });

        while !handle.is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        handle.stop().await;
        assert_eq!(handle.state(), ExecutionState::Interrupted);

        let (interp, result) = run.await.unwrap();
        assert_eq!(result.unwrap(), vec![INTERRUPTED_NOTICE]);
        assert_eq!(interp.state(), ExecutionState::Interrupted);
        assert!(interp.steps() > 0);
    }

    #[tokio::test]
    async fn test_stop_during_delay() {
        init_test_logging();
        let config = InterpreterConfig::default().with_step_delay(Duration::from_millis(5));
        let mut interp = Interpreter::new(config).unwrap();
        interp.load_code(["LOOP: WRITE =1", "JUMP LOOP"]);
        let handle = interp.stop_handle();

        let run = tokio::spawn(async move { interp.execute_async(Vec::new()).await });

        while !handle.is_running() {
            tokio::task::yield_now().await;
        }
        handle.stop().await;

        let outputs = run.await.unwrap().unwrap();
        assert_eq!(outputs.last().map(String::as_str), Some(INTERRUPTED_NOTICE));
        assert_eq!(
            outputs.iter().filter(|o| o.as_str() == INTERRUPTED_NOTICE).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_dropped_run_is_interrupted() {
        let config = InterpreterConfig::default().with_step_delay(Duration::from_millis(50));
        let mut interp = Interpreter::new(config).unwrap();
        interp.load_code(["LOOP: JUMP LOOP"]);
        let handle = interp.stop_handle();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), interp.execute_async(Vec::new())).await;

        assert!(timed_out.is_err());
        assert_eq!(handle.state(), ExecutionState::Interrupted);
    }

    // A second machine built on the same engine
    struct Echo;

    fn ping(ctx: &mut ExecutionContext<'_>, _: &Operation) -> Result<Option<String>> {
        Ok(Some(format!("pong {}", ctx.memory().instruction_pointer())))
    }

    fn stop(ctx: &mut ExecutionContext<'_>, _: &Operation) -> Result<Option<String>> {
        ctx.halt();
        Ok(None)
    }

    impl Machine for Echo {
        const NAME: &'static str = "ECHO";

        fn opcodes() -> Vec<OpcodeEntry> {
            vec![
                OpcodeEntry::new(OpcodeDescriptor::bare("ping"), ping),
                OpcodeEntry::new(OpcodeDescriptor::bare("stop"), stop),
            ]
        }

        fn case_policy() -> CasePolicy {
            CasePolicy::Sensitive
        }
    }

    #[test]
    fn test_custom_machine() {
        let mut interp = Interpreter::for_machine::<Echo>(InterpreterConfig::default()).unwrap();
        assert_eq!(interp.machine_name(), "ECHO");

        let diagnostics = interp.load_code(["ping", "PING", "ping", "stop", "ping"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::UnknownOpcode);

        assert_eq!(interp.run(Vec::new()).unwrap(), vec!["pong 0", "pong 1"]);
        assert!(interp.memory().named_registers().is_empty());
    }

    struct Broken;

    impl Machine for Broken {
        const NAME: &'static str = "BROKEN";

        fn opcodes() -> Vec<OpcodeEntry> {
            vec![
                OpcodeEntry::new(OpcodeDescriptor::bare("NOP"), stop),
                OpcodeEntry::new(OpcodeDescriptor::bare("nop"), stop),
            ]
        }
    }

    #[test]
    fn test_inconsistent_machine_cannot_be_built() {
        let err = Interpreter::for_machine::<Broken>(InterpreterConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateOpcode);
        assert_eq!(err.context_value("machine"), Some("BROKEN"));
    }
}
