//! Error taxonomy and the exit-code policy fixed by SPEC_FULL.md §7.

use thiserror::Error;

use crate::word::Word;

/// Faults raised by the interpreter or the collector while a program runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Illegal/unknown opcode {opcode} at address {address}")]
    IllegalOpcode { opcode: Word, address: usize },

    #[error("Cannot take car of null")]
    NullCar,

    #[error("Cannot take cdr of null")]
    NullCdr,

    #[error("{value} is not a valid heap pointer")]
    InvalidHeapPointer { value: Word },

    #[error("Division by zero")]
    DivideByZero,

    #[error("Stack overflow (sp {sp} exceeds capacity {capacity})")]
    StackOverflow { sp: i64, capacity: usize },

    #[error("Stack underflow (index {index} below 0)")]
    StackUnderflow { index: i64 },

    #[error("Program counter {pc} out of bounds (program has {len} words)")]
    PcOutOfBounds { pc: usize, len: usize },

    #[error("Out of memory")]
    OutOfMemory,
}

impl RuntimeError {
    /// Heap exhaustion is the one fault that aborts the process (exit 1)
    /// rather than returning the usual fault code (-1). See SPEC_FULL.md §7.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::OutOfMemory)
    }
}

/// Top-level error covering the whole run: usage, I/O, and the runtime
/// faults in [`RuntimeError`].
#[derive(Debug, Error)]
pub enum VmError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("failed to read program file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed program file: {0}")]
    Parse(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl VmError {
    /// The process exit code this error maps to, per SPEC_FULL.md §6/§7:
    /// 0 is reserved for a clean `STOP` and is never produced by an error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VmError::Runtime(e) if e.is_fatal() => 1,
            VmError::Usage(_) | VmError::Io(_) | VmError::Parse(_) | VmError::Runtime(_) => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_maps_to_abort_exit_code() {
        let err = VmError::Runtime(RuntimeError::OutOfMemory);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn other_runtime_faults_map_to_minus_one() {
        let err = VmError::Runtime(RuntimeError::NullCar);
        assert_eq!(err.exit_code(), -1);
    }

    #[test]
    fn usage_and_io_map_to_minus_one() {
        assert_eq!(VmError::Usage("bad".into()).exit_code(), -1);
        assert_eq!(VmError::Parse("bad token".into()).exit_code(), -1);
    }
}
