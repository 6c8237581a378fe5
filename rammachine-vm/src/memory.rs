//! # RAM Machine Memory
//!
//! Sparse register store for the RAM machine.
//! Registers are addressed by non-negative integers and hold `i64` values.
//! Reading a register that was never written yields zero without
//! materializing it; writing always materializes it.
//!
//! Besides the registers, memory holds the accumulator and the instruction
//! pointer, and optionally a table of named registers built by the concrete
//! machine (e.g. `ACC`, `IP`).

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Register address
pub type Address = u64;

/// Register and accumulator value
pub type Value = i64;

/// Getter/setter pair exposing one piece of machine state under a name
#[derive(Clone, Copy)]
pub struct Accessor {
    get: fn(&Memory) -> Value,
    set: fn(&mut Memory, Value),
}

impl Accessor {
    pub fn new(get: fn(&Memory) -> Value, set: fn(&mut Memory, Value)) -> Self {
        Self { get, set }
    }

    pub fn get(&self, memory: &Memory) -> Value {
        (self.get)(memory)
    }

    pub fn set(&self, memory: &mut Memory, value: Value) {
        (self.set)(memory, value)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor")
    }
}

/// Case-insensitive table of named registers
#[derive(Debug, Clone, Default)]
pub struct NamedRegisters {
    accessors: HashMap<String, Accessor>,
    /// Declaration order, for listing
    names: Vec<String>,
}

impl NamedRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`; a later definition of the same name replaces the earlier one
    pub fn with(mut self, name: &str, accessor: Accessor) -> Self {
        let key = name.to_ascii_uppercase();
        if self.accessors.insert(key.clone(), accessor).is_none() {
            self.names.push(key);
        }
        self
    }

    pub fn lookup(&self, name: &str) -> Option<Accessor> {
        self.accessors.get(&name.to_ascii_uppercase()).copied()
    }

    /// Registered names (upper-cased) in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// RAM machine memory: accumulator, sparse registers, instruction pointer
#[derive(Debug, Clone, Default, Serialize)]
pub struct Memory {
    accumulator: Value,
    registers: BTreeMap<Address, Value>,
    instruction_pointer: i64,
    /// Highest written address + 1 (diagnostic only, never a bound)
    size: u64,
    #[serde(skip)]
    named: NamedRegisters,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory exposing the given named registers
    pub fn with_named_registers(named: NamedRegisters) -> Self {
        Self {
            named,
            ..Self::default()
        }
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Read a register; unset registers read as zero
    pub fn get(&self, address: Address) -> Value {
        self.registers.get(&address).copied().unwrap_or(0)
    }

    /// Write a register, materializing it
    pub fn set(&mut self, address: Address, value: Value) {
        self.registers.insert(address, value);
        self.size = self.size.max(address.saturating_add(1));
    }

    /// Whether the register was ever written (even with zero)
    pub fn has_value(&self, address: Address) -> bool {
        self.registers.contains_key(&address)
    }

    /// Highest written address + 1, zero when nothing was written
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Materialized registers in ascending address order
    pub fn registers(&self) -> impl Iterator<Item = (Address, Value)> + '_ {
        self.registers.iter().map(|(a, v)| (*a, *v))
    }

    // =========================================================================
    // Accumulator / instruction pointer
    // =========================================================================

    pub fn accumulator(&self) -> Value {
        self.accumulator
    }

    pub fn set_accumulator(&mut self, value: Value) {
        self.accumulator = value;
    }

    pub fn instruction_pointer(&self) -> i64 {
        self.instruction_pointer
    }

    pub fn set_instruction_pointer(&mut self, pointer: i64) {
        self.instruction_pointer = pointer;
    }

    /// Reset accumulator, registers and instruction pointer.
    ///
    /// Named registers survive: they describe the machine, not its state.
    pub fn clear(&mut self) {
        self.accumulator = 0;
        self.registers.clear();
        self.instruction_pointer = 0;
        self.size = 0;
    }

    // =========================================================================
    // Named registers
    // =========================================================================

    pub fn named_registers(&self) -> &NamedRegisters {
        &self.named
    }

    /// Read a named register, `None` when the name is unknown
    pub fn read_named(&self, name: &str) -> Option<Value> {
        let accessor = self.named.lookup(name)?;
        Some(accessor.get(self))
    }

    /// Write a named register; returns false when the name is unknown
    pub fn write_named(&mut self, name: &str, value: Value) -> bool {
        match self.named.lookup(name) {
            Some(accessor) => {
                accessor.set(self, value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named() -> NamedRegisters {
        NamedRegisters::new()
            .with("acc", Accessor::new(Memory::accumulator, Memory::set_accumulator))
            .with(
                "IP",
                Accessor::new(Memory::instruction_pointer, Memory::set_instruction_pointer),
            )
    }

    #[test]
    fn test_unset_register_reads_zero() {
        let mem = Memory::new();

        assert_eq!(mem.get(5), 0);
        assert!(!mem.has_value(5));
        assert_eq!(mem.registers().count(), 0);
    }

    #[test]
    fn test_set_get() {
        let mut mem = Memory::new();

        mem.set(3, 42);
        mem.set(3, -7);

        assert_eq!(mem.get(3), -7);
        assert!(mem.has_value(3));
    }

    #[test]
    fn test_write_zero_materializes() {
        let mut mem = Memory::new();

        mem.set(9, 0);
        assert!(mem.has_value(9));
        assert_eq!(mem.registers().collect::<Vec<_>>(), vec![(9, 0)]);
    }

    #[test]
    fn test_size_is_high_water_mark() {
        let mut mem = Memory::new();
        assert_eq!(mem.size(), 0);

        mem.set(10, 1);
        mem.set(2, 1);
        assert_eq!(mem.size(), 11);

        mem.set(u64::MAX, 1);
        assert_eq!(mem.size(), u64::MAX);
    }

    #[test]
    fn test_registers_sorted() {
        let mut mem = Memory::new();
        mem.set(7, 70);
        mem.set(1, 10);
        mem.set(4, 40);

        let regs: Vec<_> = mem.registers().collect();
        assert_eq!(regs, vec![(1, 10), (4, 40), (7, 70)]);
    }

    #[test]
    fn test_clear() {
        let mut mem = Memory::with_named_registers(named());
        mem.set(1, 5);
        mem.set_accumulator(12);
        mem.set_instruction_pointer(4);

        mem.clear();

        assert_eq!(mem.accumulator(), 0);
        assert_eq!(mem.instruction_pointer(), 0);
        assert_eq!(mem.size(), 0);
        assert!(!mem.has_value(1));
        assert_eq!(mem.named_registers().len(), 2);
    }

    #[test]
    fn test_named_registers_case_insensitive() {
        let mut mem = Memory::with_named_registers(named());

        assert!(mem.write_named("Acc", 17));
        assert_eq!(mem.accumulator(), 17);
        assert_eq!(mem.read_named("ACC"), Some(17));

        assert!(mem.write_named("ip", 3));
        assert_eq!(mem.instruction_pointer(), 3);
    }

    #[test]
    fn test_named_register_not_found() {
        let mut mem = Memory::with_named_registers(named());

        assert_eq!(mem.read_named("R0"), None);
        assert!(!mem.write_named("R0", 1));
    }

    #[test]
    fn test_named_listing_order() {
        let names: Vec<_> = named().names().map(String::from).collect();
        assert_eq!(names, vec!["ACC", "IP"]);
    }
}
