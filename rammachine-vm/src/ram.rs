//! # RAM Machine Instruction Set
//!
//! The classic single-accumulator random access machine.
//!
//! | Opcode | Operand | Effect |
//! |---|---|---|
//! | LOAD | `=n` `n` `*n` | ACC := operand |
//! | STORE | `n` `*n` | register := ACC |
//! | ADD SUB MUL DIV | `=n` `n` `*n` | ACC := ACC op operand |
//! | READ | `n` `*n` | register := next input |
//! | WRITE | `=n` `n` `*n` | emit operand |
//! | JUMP JZERO JGTZ | label | jump (always / ACC = 0 / ACC > 0) |
//! | HALT | - | stop |

use crate::context::ExecutionContext;
use crate::error::{self, Error, Result};
use crate::interpreter::Machine;
use crate::memory::{Accessor, Address, Memory, NamedRegisters, Value};
use crate::operation::{AddressingMode, Operation};
use crate::registry::{CasePolicy, OpcodeDescriptor, OpcodeEntry};

/// The RAM machine definition
#[derive(Debug, Clone, Copy, Default)]
pub struct RamMachine;

const MUL: OpcodeDescriptor =
    OpcodeDescriptor::numeric("MUL", true, true).describe("Multiply the accumulator by the operand");

impl Machine for RamMachine {
    const NAME: &'static str = "RAM";

    fn opcodes() -> Vec<OpcodeEntry> {
        vec![
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("LOAD", true, true).describe("Load the operand into the accumulator"),
                load,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("STORE", false, true).describe("Store the accumulator into a register"),
                store,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("ADD", true, true).describe("Add the operand to the accumulator"),
                add,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("SUB", true, true).describe("Subtract the operand from the accumulator"),
                sub,
            ),
            OpcodeEntry::new(MUL, mul),
            OpcodeEntry::new(MUL.alias("MULT"), mul),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("DIV", true, true)
                    .describe("Divide the accumulator by the operand, truncating toward zero"),
                div,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("READ", false, true).describe("Read the next input into a register"),
                read,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::numeric("WRITE", true, true).describe("Output the operand"),
                write,
            ),
            OpcodeEntry::new(OpcodeDescriptor::jump("JUMP").describe("Jump to a label"), jump),
            OpcodeEntry::new(
                OpcodeDescriptor::jump("JZERO").describe("Jump to a label if the accumulator is zero"),
                jzero,
            ),
            OpcodeEntry::new(
                OpcodeDescriptor::jump("JGTZ").describe("Jump to a label if the accumulator is positive"),
                jgtz,
            ),
            OpcodeEntry::new(OpcodeDescriptor::bare("HALT").describe("Stop the program"), halt),
        ]
    }

    fn case_policy() -> CasePolicy {
        CasePolicy::Insensitive
    }

    fn named_registers() -> NamedRegisters {
        NamedRegisters::new()
            .with("ACC", Accessor::new(Memory::accumulator, Memory::set_accumulator))
            .with(
                "IP",
                Accessor::new(Memory::instruction_pointer, Memory::set_instruction_pointer),
            )
    }
}

// =============================================================================
// Operand resolution
// =============================================================================

fn to_address(index: i64) -> Result<Address> {
    Address::try_from(index).map_err(|_| Error::negative_register(index))
}

fn literal(op: &Operation) -> Result<i64> {
    op.value().ok_or_else(error::missing_operand)
}

/// Register an operand designates (destination of STORE / READ)
fn target_register(ctx: &ExecutionContext<'_>, op: &Operation) -> Result<Address> {
    let value = literal(op)?;
    match op.mode() {
        AddressingMode::Registry => to_address(value),
        AddressingMode::Pointer => to_address(ctx.memory().get(to_address(value)?)),
        AddressingMode::Direct => Err(Error::invalid_operand("direct value not allowed for operation")),
    }
}

/// Value an operand denotes
fn fetch(ctx: &ExecutionContext<'_>, op: &Operation) -> Result<Value> {
    match op.mode() {
        AddressingMode::Direct => literal(op),
        _ => Ok(ctx.memory().get(target_register(ctx, op)?)),
    }
}

fn arithmetic(
    ctx: &mut ExecutionContext<'_>,
    op: &Operation,
    symbol: &'static str,
    apply: fn(Value, Value) -> Option<Value>,
) -> Result<Option<String>> {
    let rhs = fetch(ctx, op)?;
    let lhs = ctx.memory().accumulator();
    let result = apply(lhs, rhs).ok_or_else(|| error::arithmetic_overflow(symbol, lhs, rhs))?;
    ctx.memory_mut().set_accumulator(result);
    Ok(None)
}

// =============================================================================
// Handlers
// =============================================================================

fn load(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    let value = fetch(ctx, op)?;
    ctx.memory_mut().set_accumulator(value);
    Ok(None)
}

fn store(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    let address = target_register(ctx, op)?;
    let acc = ctx.memory().accumulator();
    ctx.memory_mut().set(address, acc);
    Ok(None)
}

fn add(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    arithmetic(ctx, op, "+", Value::checked_add)
}

fn sub(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    arithmetic(ctx, op, "-", Value::checked_sub)
}

fn mul(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    arithmetic(ctx, op, "*", Value::checked_mul)
}

fn div(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    if fetch(ctx, op)? == 0 {
        return Err(error::division_by_zero().with_operation("ram::div"));
    }
    arithmetic(ctx, op, "/", Value::checked_div)
}

fn read(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    let input = ctx.input();
    let token = match input.peek() {
        Some(token) => token.to_string(),
        None => return Err(error::input_exhausted(input.cursor()).with_operation("ram::read")),
    };
    let value: Value = token.trim().parse().map_err(|e| {
        error::invalid_input(&token)
            .with_operation("ram::read")
            .set_source(e)
    })?;

    let address = target_register(ctx, op)?;
    ctx.memory_mut().set(address, value);
    ctx.input().advance();
    Ok(None)
}

fn write(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    Ok(Some(fetch(ctx, op)?.to_string()))
}

fn jump(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    let target = op.target().ok_or_else(error::missing_operand)?;
    ctx.jump_to(target)?;
    Ok(None)
}

fn jzero(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    if ctx.memory().accumulator() == 0 {
        jump(ctx, op)?;
    }
    Ok(None)
}

fn jgtz(ctx: &mut ExecutionContext<'_>, op: &Operation) -> Result<Option<String>> {
    if ctx.memory().accumulator() > 0 {
        jump(ctx, op)?;
    }
    Ok(None)
}

fn halt(ctx: &mut ExecutionContext<'_>, _op: &Operation) -> Result<Option<String>> {
    ctx.halt();
    Ok(None)
}
