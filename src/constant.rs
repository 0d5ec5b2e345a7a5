//! This module contains constants that are needed throughout the codebase.

/// The width of a word on the virtual machine in bits.
pub const WORD_SIZE_BITS: usize = 256;

/// The width of a byte on the virtual machine (and most other places) in bits.
pub const BYTE_SIZE_BITS: usize = 8;

/// The width of a word on the virtual machine in bytes.
pub const WORD_SIZE_BYTES: usize = WORD_SIZE_BITS / BYTE_SIZE_BITS;

/// The maximum stack depth for the virtual machine.
pub const MAXIMUM_STACK_DEPTH: usize = 1024;

/// The default maximum number of slots that a pool keeps hold of when it is
/// returned to the [`crate::vm::pool::PoolCache`].
///
/// Slots beyond this number are freed rather than being kept around for the
/// next execution context.
pub const DEFAULT_MAXIMUM_RETAINED_SLOTS: usize = 256;

/// The default number of idle pools that a [`crate::vm::pool::PoolCache`] will
/// keep.
pub const DEFAULT_POOL_CACHE_CAPACITY: usize = 25;

/// The value that is written into free slots when seeding a pool with stale
/// data.
///
/// It is the 256-bit two's complement representation of `-1337`.
pub const STALE_SEED_VALUE: [u8; WORD_SIZE_BYTES] = {
    let mut bytes = [0xff; WORD_SIZE_BYTES];
    bytes[WORD_SIZE_BYTES - 2] = 0xfa;
    bytes[WORD_SIZE_BYTES - 1] = 0xc7;
    bytes
};

/// The number of stale slots that the fixture runner seeds into each pool
/// before running any cases.
pub const STALE_SEED_SLOT_COUNT: usize = 3;
