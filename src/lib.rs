//! This library implements the arithmetic core of a stack-based virtual
//! machine over 256-bit words, in which every arithmetic operation wraps
//! around modulo 2^256.
//!
//! # How it Works
//!
//! From a very high level, executing an arithmetic opcode proceeds as follows:
//!
//! 1. An [`vm::ExecutionContext`] is started with an [`vm::pool::IntPool`]
//!    checked out of a [`vm::pool::PoolCache`]. The context owns both its
//!    operand stack and its pool.
//! 2. Constants are pushed onto the stack. Each one occupies a
//!    [`vm::pool::Slot`] acquired from the pool, and the stack holds only the
//!    slot handles.
//! 3. An [`opcode::Opcode`] is dispatched through a static table to its
//!    executor. The executor pops its operands, reuses the slot of the leftmost
//!    operand for the result, and releases the rest back to the pool.
//! 4. When the context finishes, every remaining slot is released and the pool
//!    is checked back into the cache for the next context to reuse.
//!
//! # Basic Usage
//!
//! ```
//! use word_arithmetic_core::{
//!     opcode::Opcode,
//!     vm::{pool::PoolCache, word::Word, Config, ExecutionContext},
//! };
//!
//! let mut cache = PoolCache::default();
//! let mut context = ExecutionContext::new(Config::default(), &mut cache);
//!
//! context.push_word(Word::from(10)).unwrap();
//! context.push_word(Word::from(3)).unwrap();
//! context.execute(Opcode::Sub).unwrap();
//!
//! assert_eq!(context.pop_word().unwrap(), Word::from(7));
//! context.finish(&mut cache).unwrap();
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod constant;
pub mod error;
pub mod fixture;
pub mod opcode;
pub mod vm;

// Re-exports to provide the library interface.
pub use opcode::Opcode;
pub use vm::{pool::PoolCache, word::Word, Config, ExecutionContext};
