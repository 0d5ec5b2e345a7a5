//! This module contains errors pertaining to the execution of opcodes on the
//! operand stack and the integer pool.

use thiserror::Error;

use crate::{error::container, vm::pool::SlotId};

/// Errors that occur while executing an opcode.
///
/// None of these are arithmetic errors, as all arithmetic on words is total.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("Opcode required {requested:?} stack frames but only {available:?} were available")]
    StackUnderflow { requested: usize, available: usize },

    #[error("Maximum stack depth of {limit:?} exceeded with request for {requested:?} frames")]
    StackOverflow { requested: usize, limit: usize },

    #[error(transparent)]
    PoolConsistencyViolation(#[from] PoolViolation),
}

/// The ways in which the single-owner discipline of the integer pool can be
/// broken.
///
/// These always indicate a defect in the code driving the pool, never bad
/// input to the virtual machine.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PoolViolation {
    #[error("Slot {slot:?} does not belong to pool {pool:?}")]
    ForeignSlot { slot: SlotId, pool: u32 },

    #[error("Slot {slot:?} was released while already free")]
    DoubleRelease { slot: SlotId },

    #[error("Slot {slot:?} appears in the free list more than once")]
    DuplicateFreeEntry { slot: SlotId },

    #[error("Slot {slot:?} is in the free list while still live")]
    LiveSlotIsFree { slot: SlotId },

    #[error("The free list holds {listed:?} slots but {marked:?} are marked free")]
    FreeListMismatch { listed: usize, marked: usize },

    #[error("{count:?} slots were still live when the pool was reset")]
    LeakedSlots { count: usize },
}

/// An execution error with an associated location in the bytecode.
pub type LocatedError = container::Located<Error>;

/// The result type for methods that may have execution errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, program_counter: u32) -> Self::Located {
        container::Located {
            location: program_counter,
            payload:  self,
        }
    }
}

/// Make it possible to attach locations to pool violations directly.
impl container::Locatable for PoolViolation {
    type Located = LocatedError;

    fn locate(self, program_counter: u32) -> Self::Located {
        container::Located {
            location: program_counter,
            payload:  self.into(),
        }
    }
}

/// Allow pool violations that have been located to be forwarded as general
/// located execution errors by re-wrapping the payload.
impl From<container::Located<PoolViolation>> for LocatedError {
    fn from(value: container::Located<PoolViolation>) -> Self {
        Self {
            location: value.location,
            payload:  value.payload.into(),
        }
    }
}
