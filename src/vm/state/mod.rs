//! The per-context state of the virtual machine that opcodes operate on.

pub mod stack;
