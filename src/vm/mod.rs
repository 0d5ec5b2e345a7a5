//! This module contains the execution context that the arithmetic opcodes run
//! within, along with the state that it owns.

pub mod pool;
pub mod state;
pub mod word;

use tracing::debug;

use crate::{
    constant::{DEFAULT_MAXIMUM_RETAINED_SLOTS, DEFAULT_POOL_CACHE_CAPACITY, MAXIMUM_STACK_DEPTH},
    error::{
        container::Locatable,
        execution::{PoolViolation, Result},
    },
    opcode::{self, Opcode},
    vm::{
        pool::{IntPool, PoolCache},
        state::stack::Stack,
        word::Word,
    },
};

/// The state borrowed by an opcode for the duration of a single execution.
///
/// The signature of every executor is uniform across opcode families, so the
/// call context also carries the read-only contract code and call data even
/// though the arithmetic opcodes never look at them.
#[derive(Debug)]
pub struct CallContext<'a> {
    /// The operand stack of the execution context.
    pub stack: &'a mut Stack,

    /// The integer pool of the execution context.
    pub pool: &'a mut IntPool,

    /// The code of the contract being executed.
    pub code: &'a [u8],

    /// The input data for the call being executed.
    pub call_data: &'a [u8],
}

impl<'a> CallContext<'a> {
    /// Bundles the provided state into a call context.
    pub fn new(
        stack: &'a mut Stack,
        pool: &'a mut IntPool,
        code: &'a [u8],
        call_data: &'a [u8],
    ) -> Self {
        Self {
            stack,
            pool,
            code,
            call_data,
        }
    }
}

/// A single run of the virtual machine, owning its own operand stack and
/// integer pool.
///
/// Neither the stack nor the pool is ever shared with another context. The
/// pool is borrowed from a [`PoolCache`] on construction and should be handed
/// back via [`Self::finish`] once the context is done.
#[derive(Debug)]
pub struct ExecutionContext {
    /// The operand stack.
    stack: Stack,

    /// The pool from which every slot on `stack` was acquired.
    pool: IntPool,

    /// The program counter of the next opcode to execute.
    program_counter: u32,

    /// The configuration of the context.
    config: Config,
}

impl ExecutionContext {
    /// Creates a new execution context using a pool checked out of `cache`.
    #[must_use]
    pub fn new(config: Config, cache: &mut PoolCache) -> Self {
        Self::with_pool(config, cache.checkout())
    }

    /// Creates a new execution context that uses the provided `pool`.
    ///
    /// The pool must not have any live slots.
    #[must_use]
    pub fn with_pool(config: Config, pool: IntPool) -> Self {
        let stack = Stack::with_maximum_depth(config.maximum_stack_depth);
        debug!(pool = pool.id(), "Started execution context");
        Self {
            stack,
            pool,
            program_counter: 0,
            config,
        }
    }

    /// Gets the operand stack.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Gets the integer pool.
    #[must_use]
    pub fn pool(&self) -> &IntPool {
        &self.pool
    }

    /// Gets the integer pool mutably.
    ///
    /// Slots acquired through this must be released to the same pool before
    /// the context finishes.
    pub fn pool_mut(&mut self) -> &mut IntPool {
        &mut self.pool
    }

    /// Gets the configuration of the context.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets the program counter of the next opcode to execute.
    #[must_use]
    pub fn program_counter(&self) -> u32 {
        self.program_counter
    }

    /// Moves the program counter to `value`.
    pub fn set_program_counter(&mut self, value: u32) {
        self.program_counter = value;
    }

    /// Borrows the stack and pool of the context as a call context for
    /// executing opcodes over `code` with `call_data`.
    pub fn call_context<'a>(&'a mut self, code: &'a [u8], call_data: &'a [u8]) -> CallContext<'a> {
        CallContext::new(&mut self.stack, &mut self.pool, code, call_data)
    }

    /// Executes `opcode` at the current program counter, and advances the
    /// program counter to the one the opcode returns.
    ///
    /// # Errors
    ///
    /// If the opcode fails to execute. The program counter is left unchanged
    /// in that case.
    pub fn execute(&mut self, opcode: Opcode) -> Result<u32> {
        let program_counter = self.program_counter;
        let next = opcode::execute(opcode, program_counter, &mut self.call_context(&[], &[]))?;
        self.program_counter = next;

        Ok(next)
    }

    /// Pushes a constant `word` onto the stack, storing it in a slot from the
    /// pool.
    ///
    /// # Errors
    ///
    /// If the stack is full.
    pub fn push_word(&mut self, word: Word) -> Result<()> {
        self.stack.check_capacity(1).locate(self.program_counter)?;
        let slot = self.pool.acquire_with(word);
        self.stack.push(slot).locate(self.program_counter)
    }

    /// Pops the top word off the stack, returning its slot to the pool.
    ///
    /// # Errors
    ///
    /// If the stack is empty.
    pub fn pop_word(&mut self) -> Result<Word> {
        let slot = self.stack.pop().locate(self.program_counter)?;
        let word = self.pool.get(&slot).locate(self.program_counter)?;
        self.pool.release(slot).locate(self.program_counter)?;

        Ok(word)
    }

    /// Reads the word at `depth` on the stack without removing it.
    ///
    /// # Errors
    ///
    /// If no frame exists at `depth`.
    pub fn peek_word(&self, depth: usize) -> Result<Word> {
        let slot = self.stack.peek(depth).locate(self.program_counter)?;
        Ok(self.pool.get(slot).locate(self.program_counter)?)
    }

    /// Checks that the pool's free list is internally consistent and that it
    /// shares no slot with the stack.
    ///
    /// # Errors
    ///
    /// If the single-owner discipline of the pool has been broken.
    pub fn check_consistency(&self) -> std::result::Result<(), PoolViolation> {
        self.pool.check_consistency(self.stack.slot_ids())
    }

    /// Tears down the context, releasing every slot on the stack and checking
    /// the pool back into `cache`.
    ///
    /// # Errors
    ///
    /// If any slot acquired from the pool was never returned to it. The pool
    /// is dropped rather than cached in that case.
    pub fn finish(mut self, cache: &mut PoolCache) -> Result<()> {
        let program_counter = self.program_counter;
        let remaining = self.stack.size();
        for slot in self.stack.drain() {
            self.pool.release(slot).locate(program_counter)?;
        }

        let leaked = self.pool.live();
        if leaked != 0 {
            return Err(PoolViolation::LeakedSlots { count: leaked }.locate(program_counter));
        }

        debug!(pool = self.pool.id(), remaining, "Finished execution context");
        cache.checkin(self.pool);

        Ok(())
    }
}

/// The configuration for the execution context and its integer pools.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The maximum number of frames the operand stack can hold.
    ///
    /// Defaults to [`MAXIMUM_STACK_DEPTH`].
    pub maximum_stack_depth: usize,

    /// The maximum number of slots that a pool keeps storage for when it is
    /// returned to the cache.
    ///
    /// Defaults to [`DEFAULT_MAXIMUM_RETAINED_SLOTS`].
    pub maximum_retained_slots: usize,

    /// The maximum number of idle pools that a [`PoolCache`] built from this
    /// configuration keeps.
    ///
    /// Defaults to [`DEFAULT_POOL_CACHE_CAPACITY`].
    pub pool_cache_capacity: usize,
}

impl Config {
    /// Sets the `maximum_stack_depth` config parameter to `value`.
    #[must_use]
    pub fn with_maximum_stack_depth(mut self, value: usize) -> Self {
        self.maximum_stack_depth = value;
        self
    }

    /// Sets the `maximum_retained_slots` config parameter to `value`.
    #[must_use]
    pub fn with_maximum_retained_slots(mut self, value: usize) -> Self {
        self.maximum_retained_slots = value;
        self
    }

    /// Sets the `pool_cache_capacity` config parameter to `value`.
    #[must_use]
    pub fn with_pool_cache_capacity(mut self, value: usize) -> Self {
        self.pool_cache_capacity = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let maximum_stack_depth = MAXIMUM_STACK_DEPTH;
        let maximum_retained_slots = DEFAULT_MAXIMUM_RETAINED_SLOTS;
        let pool_cache_capacity = DEFAULT_POOL_CACHE_CAPACITY;
        Self {
            maximum_stack_depth,
            maximum_retained_slots,
            pool_cache_capacity,
        }
    }
}
