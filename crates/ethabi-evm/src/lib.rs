//! Word-granular EVM memory, a stack, and gas accounting for the memory
//! opcodes (MLOAD/MSTORE/MSTORE8/MSIZE/MCOPY).

mod error;
mod gas;
mod memory;
mod stack;

pub use error::EvmError;
pub use gas::GasTracker;
pub use memory::Memory;
pub use stack::Stack;

use alloy_primitives::U256;

/// Gas cost of MLOAD, MSTORE, MSTORE8.
pub const FASTEST_STEP: u64 = 3;
/// Gas cost of MSIZE.
pub const QUICK_STEP: u64 = 2;

/// Which hardfork's opcode set is active. Only the Cancun gate (MCOPY)
/// matters to this crate today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFlags {
    pub cancun_enabled: bool,
}

impl Default for SpecFlags {
    fn default() -> Self {
        SpecFlags { cancun_enabled: true }
    }
}

/// Owns the memory, stack, and gas tracker for one execution context and
/// exposes the memory-family opcodes as single steps.
pub struct Interpreter {
    pub memory: Memory,
    pub stack: Stack,
    pub gas: GasTracker,
    pub spec: SpecFlags,
}

impl Interpreter {
    pub fn new(gas_limit: u64, spec: SpecFlags) -> Self {
        Interpreter {
            memory: Memory::new(),
            stack: Stack::new(),
            gas: GasTracker::new(gas_limit),
            spec,
        }
    }

    /// `MLOAD(offset)`: pushes the big-endian word at `offset`.
    pub fn mload(&mut self, offset: U256) -> Result<(), EvmError> {
        let offset = to_usize(offset)?;
        let end = offset.checked_add(32).ok_or(EvmError::Overflow)?;
        let expansion = self.memory.expand(end);
        self.gas.charge(FASTEST_STEP + expansion)?;
        let value = self.memory.word_to_int(offset);
        self.stack.push(value)
    }

    /// `MSTORE(offset, value)`: writes `value` big-endian at `offset`.
    pub fn mstore(&mut self, offset: U256, value: U256) -> Result<(), EvmError> {
        let offset = to_usize(offset)?;
        let end = offset.checked_add(32).ok_or(EvmError::Overflow)?;
        let expansion = self.memory.expand(end);
        self.gas.charge(FASTEST_STEP + expansion)?;
        self.memory.set_word(offset, value);
        Ok(())
    }

    /// `MSTORE8(offset, value)`: writes the low byte of `value` at `offset`.
    pub fn mstore8(&mut self, offset: U256, value: U256) -> Result<(), EvmError> {
        let offset = to_usize(offset)?;
        let end = offset.checked_add(1).ok_or(EvmError::Overflow)?;
        let expansion = self.memory.expand(end);
        self.gas.charge(FASTEST_STEP + expansion)?;
        let byte = value.to_be_bytes::<32>()[31];
        self.memory.set_byte(offset, byte);
        Ok(())
    }

    /// `MSIZE`: pushes the current memory size in bytes.
    pub fn msize(&mut self) -> Result<(), EvmError> {
        self.gas.charge(QUICK_STEP)?;
        self.stack.push(U256::from(self.memory.size() as u64))
    }

    /// `MCOPY(dst, src, len)`: overlap-safe byte copy, gated on Cancun.
    pub fn mcopy(&mut self, dst: U256, src: U256, len: U256) -> Result<(), EvmError> {
        if !self.spec.cancun_enabled {
            return Err(EvmError::InstructionNotEnabled);
        }
        let dst = to_usize(dst)?;
        let src = to_usize(src)?;
        let len = to_usize(len)?;
        if len == 0 {
            self.gas.charge(memory_copy_low_cost(0))?;
            return Ok(());
        }
        let dst_end = dst.checked_add(len).ok_or(EvmError::Overflow)?;
        let src_end = src.checked_add(len).ok_or(EvmError::Overflow)?;
        let expansion = self.memory.expand(dst_end.max(src_end));
        self.gas.charge(memory_copy_low_cost(len) + expansion)?;
        self.memory.copy_within(dst, src, len);
        Ok(())
    }
}

/// `3 + 3*ceil(len/32)`: the per-word word-copy charge levied on top of
/// memory expansion for MCOPY.
fn memory_copy_low_cost(len: usize) -> u64 {
    let words = ((len + 31) / 32) as u64;
    3 + 3 * words
}

fn to_usize(value: U256) -> Result<usize, EvmError> {
    value.try_into().map_err(|_| EvmError::Overflow)
}
