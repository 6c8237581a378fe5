//! # RAM Machine CLI
//!
//! Command-line front end for the RAM machine interpreter.
//!
//! Usage:
//!   rammachine run <file.ram> [-i TOKEN ...]
//!   rammachine check <file.ram>
//!   rammachine opcodes [--json]
//!
//! Examples:
//!   rammachine run square.ram -i 12
//!   rammachine run loop.ram --delay-ms 100 --trace
//!   rammachine --verbose run loop.ram --max-steps 1000

use clap::{Parser, Subcommand};
use rammachine_error::{Error, ErrorKind, Result};
use rammachine_vm::{
    Diagnostic, ExecutionState, Interpreter, InterpreterConfig, Memory, OpcodeDescriptor,
    OpcodeRegistry,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rammachine")]
#[command(author, version, about = "RAM machine interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON interpreter config (step_delay_ms, max_steps, comment_marker)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode - only print program output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log interpreter events at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and run a program
    Run {
        /// Path to the program source
        file: PathBuf,

        /// Input token for READ (repeatable, consumed in order)
        #[arg(short, long = "input", allow_hyphen_values = true)]
        inputs: Vec<String>,

        /// Pause between steps, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Abort after this many executed operations
        #[arg(long)]
        max_steps: Option<u64>,

        /// Single-step and print IP / ACC after every operation
        #[arg(long)]
        trace: bool,

        /// Run even if some lines failed to parse
        #[arg(long)]
        allow_errors: bool,
    },
    /// Parse a program and report bad lines
    Check {
        /// Path to the program source
        file: PathBuf,
    },
    /// Show the opcode table
    Opcodes {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    // RUST_LOG controls the level, WARN (DEBUG with --verbose) when unset
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read a program file into source lines
fn read_program(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::from(e)
            .with_operation("cli::read_program")
            .with_context("path", path.display().to_string())
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Config file (if any) with command-line overrides applied
fn build_config(
    path: Option<&Path>,
    delay_ms: Option<u64>,
    max_steps: Option<u64>,
) -> Result<InterpreterConfig> {
    let mut config = match path {
        Some(p) => InterpreterConfig::load(p)?,
        None => InterpreterConfig::default(),
    };
    if let Some(ms) = delay_ms {
        config.step_delay_ms = ms;
    }
    if max_steps.is_some() {
        config.max_steps = max_steps;
    }
    Ok(config)
}

fn print_diagnostics(file: &Path, diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}:{}", file.display(), diag);
    }
}

/// Operand column of the opcode table
fn operand_syntax(d: &OpcodeDescriptor) -> String {
    if d.requires_jump_label {
        return "label".to_string();
    }
    if !d.requires_numeric_argument {
        return "-".to_string();
    }
    let mut forms = Vec::new();
    if d.allow_direct {
        forms.push("=n");
    }
    forms.push("n");
    if d.allow_pointer {
        forms.push("*n");
    }
    forms.join(" ")
}

fn format_opcodes(registry: &OpcodeRegistry) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<8} {:<10} {}\n", "OPCODE", "OPERAND", "DESCRIPTION"));
    for d in registry.descriptors() {
        out.push_str(&format!(
            "{:<8} {:<10} {}\n",
            d.mnemonic,
            operand_syntax(d),
            d.description
        ));
    }
    out
}

fn format_memory(memory: &Memory) -> String {
    let mut out = format!(
        "ACC = {}\nIP  = {}\n",
        memory.accumulator(),
        memory.instruction_pointer()
    );
    for (address, value) in memory.registers() {
        out.push_str(&format!("R{:<3}= {}\n", address, value));
    }
    out
}

fn show_opcodes(config: InterpreterConfig, json: bool) -> Result<()> {
    let interp = Interpreter::new(config)?;
    let registry = interp.registry();

    if json {
        let descriptors: Vec<_> = registry.descriptors().collect();
        let text = serde_json::to_string_pretty(&descriptors).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, e.to_string())
                .with_operation("cli::show_opcodes")
                .set_source(e)
        })?;
        println!("{}", text);
    } else {
        println!("{} machine, {} opcodes\n", interp.machine_name(), registry.len());
        print!("{}", format_opcodes(registry));
    }
    Ok(())
}

fn check_program(config: InterpreterConfig, file: &Path, quiet: bool) -> Result<bool> {
    let lines = read_program(file)?;
    let mut interp = Interpreter::new(config)?;
    let diagnostics = interp.load_code(&lines);

    print_diagnostics(file, &diagnostics);
    if !quiet {
        println!(
            "{}: {} operations, {} errors",
            file.display(),
            interp.program().len(),
            diagnostics.len()
        );
    }
    Ok(diagnostics.is_empty())
}

/// Single-step the loaded program, printing machine state after each operation
async fn trace_program(interp: &mut Interpreter, inputs: Vec<String>) -> Result<Vec<String>> {
    let delay = interp.config().step_delay();
    let mut outputs = Vec::new();
    interp.set_inputs(inputs);

    println!("{:>4} | {:<24} | ACC", "IP", "OPERATION");
    while interp.has_next() {
        let ip = interp.memory().instruction_pointer();
        let raw = usize::try_from(ip)
            .ok()
            .and_then(|i| interp.program().get(i))
            .map(|op| op.raw().to_string())
            .unwrap_or_default();

        let output = interp.execute_next()?;
        println!("{:>4} | {:<24} | {}", ip, raw, interp.memory().accumulator());
        if let Some(line) = output {
            println!("     > {}", line);
            outputs.push(line);
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(outputs)
}

async fn run_program(
    config: InterpreterConfig,
    file: &Path,
    inputs: Vec<String>,
    trace: bool,
    allow_errors: bool,
    quiet: bool,
) -> Result<bool> {
    let lines = read_program(file)?;
    let mut interp = Interpreter::new(config)?;
    let diagnostics = interp.load_code(&lines);

    if !diagnostics.is_empty() {
        print_diagnostics(file, &diagnostics);
        if !allow_errors {
            eprintln!(
                "{} line(s) failed to parse; pass --allow-errors to run anyway",
                diagnostics.len()
            );
            return Ok(false);
        }
    }

    if !quiet {
        println!("Running: {} ({} operations)", file.display(), interp.program().len());
        if interp.config().step_delay_ms > 0 {
            println!("Step delay: {} ms", interp.config().step_delay_ms);
        }
        println!();
    }

    let outputs = if trace {
        trace_program(&mut interp, inputs).await
    } else {
        let handle = interp.stop_handle();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping...");
                handle.stop().await;
            }
        });

        let result = interp.execute_async(inputs).await;
        ctrl_c.abort();
        result
    };

    let outputs = match outputs {
        Ok(outputs) => outputs,
        Err(e) => {
            eprintln!("\n=== RUNTIME ERROR ===\n");
            eprintln!("{}", e);
            if !quiet {
                eprintln!("\n--- Memory ---");
                eprint!("{}", format_memory(interp.memory()));
            }
            return Ok(false);
        }
    };

    if !trace {
        for line in &outputs {
            println!("{}", line);
        }
    }

    if !quiet {
        println!(
            "\n--- {} after {} steps ---",
            interp.state(),
            interp.steps()
        );
        print!("{}", format_memory(interp.memory()));
    }

    Ok(interp.state() != ExecutionState::Interrupted)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            inputs,
            delay_ms,
            max_steps,
            trace,
            allow_errors,
        } => match build_config(cli.config.as_deref(), delay_ms, max_steps) {
            Ok(config) => run_program(config, &file, inputs, trace, allow_errors, cli.quiet).await,
            Err(e) => Err(e),
        },
        Commands::Check { file } => build_config(cli.config.as_deref(), None, None)
            .and_then(|config| check_program(config, &file, cli.quiet)),
        Commands::Opcodes { json } => build_config(cli.config.as_deref(), None, None)
            .and_then(|config| show_opcodes(config, json))
            .map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            tracing::debug!("{:?}", e);
            std::process::exit(2);
        }
    }
}
