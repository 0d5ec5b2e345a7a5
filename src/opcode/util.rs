//! This file contains the shared stack and pool protocol that every arithmetic
//! executor follows.
//!
//! # Operand Order
//!
//! Operands are pushed in source order, so the _last_ operand of an operation
//! is on top of the stack. Each helper therefore pops the rightmost operand
//! first, and hands the operands to the operation in source order.
//!
//! # Slot Reuse
//!
//! The slot of the leftmost operand is reused to hold the result, and the
//! slots of every other operand are released back to the pool once the result
//! has been pushed. The arity of the operation is checked before anything is
//! popped. If the pool rejects an operand once it has been popped, every
//! operand the pool still owns is released before the error is returned.

use tracing::debug;

use crate::{
    error::{container::Locatable, execution::Result},
    vm::{
        pool::{IntPool, Slot},
        word::Word,
        CallContext,
    },
};

/// Executes an operation of one operand at `program_counter`, replacing the
/// top of the stack with `operation(operand)`.
///
/// Returns the program counter of the next opcode, wrapping around at
/// [`u32::MAX`].
///
/// # Errors
///
/// If the stack is empty, or if the operand does not belong to the pool.
pub fn unary_op(
    program_counter: u32,
    context: &mut CallContext<'_>,
    operation: impl FnOnce(Word) -> Word,
) -> Result<u32> {
    context.stack.check_frames(1).locate(program_counter)?;
    let operand = context.stack.pop().locate(program_counter)?;

    let pool = &mut *context.pool;
    let outcome = pool.get(&operand).and_then(|value| pool.set(&operand, operation(value)));
    if let Err(violation) = outcome {
        release_all(context.pool, [operand]);
        return Err(violation.locate(program_counter));
    }

    context.stack.push(operand).locate(program_counter)?;

    Ok(program_counter.wrapping_add(1))
}

/// Executes an operation of two operands at `program_counter`, replacing the
/// `left` and `right` operands on the stack with `operation(left, right)`.
///
/// Returns the program counter of the next opcode, wrapping around at
/// [`u32::MAX`].
///
/// # Errors
///
/// If there are fewer than two items on the stack, or if an operand does not
/// belong to the pool.
pub fn binary_op(
    program_counter: u32,
    context: &mut CallContext<'_>,
    operation: impl FnOnce(Word, Word) -> Word,
) -> Result<u32> {
    context.stack.check_frames(2).locate(program_counter)?;
    let right = context.stack.pop().locate(program_counter)?;
    let left = context.stack.pop().locate(program_counter)?;

    let pool = &mut *context.pool;
    let outcome = pool.get(&left).and_then(|left_value| {
        let right_value = pool.get(&right)?;
        pool.set(&left, operation(left_value, right_value))
    });
    if let Err(violation) = outcome {
        release_all(context.pool, [left, right]);
        return Err(violation.locate(program_counter));
    }

    context.stack.push(left).locate(program_counter)?;
    context.pool.release(right).locate(program_counter)?;

    Ok(program_counter.wrapping_add(1))
}

/// Executes an operation of three operands at `program_counter`, replacing the
/// `left`, `right` and `modulus` operands on the stack with
/// `operation(left, right, modulus)`.
///
/// Returns the program counter of the next opcode, wrapping around at
/// [`u32::MAX`].
///
/// # Errors
///
/// If there are fewer than three items on the stack, or if an operand does not
/// belong to the pool.
pub fn ternary_op(
    program_counter: u32,
    context: &mut CallContext<'_>,
    operation: impl FnOnce(Word, Word, Word) -> Word,
) -> Result<u32> {
    context.stack.check_frames(3).locate(program_counter)?;
    let modulus = context.stack.pop().locate(program_counter)?;
    let right = context.stack.pop().locate(program_counter)?;
    let left = context.stack.pop().locate(program_counter)?;

    let pool = &mut *context.pool;
    let outcome = pool.get(&left).and_then(|left_value| {
        let right_value = pool.get(&right)?;
        let modulus_value = pool.get(&modulus)?;
        pool.set(&left, operation(left_value, right_value, modulus_value))
    });
    if let Err(violation) = outcome {
        release_all(context.pool, [left, right, modulus]);
        return Err(violation.locate(program_counter));
    }

    context.stack.push(left).locate(program_counter)?;
    context.pool.release(right).locate(program_counter)?;
    context.pool.release(modulus).locate(program_counter)?;

    Ok(program_counter.wrapping_add(1))
}

/// Hands the operands of a failed operation back to `pool`.
///
/// Operands that the pool refuses, such as slots from another pool, are
/// dropped.
fn release_all(pool: &mut IntPool, slots: impl IntoIterator<Item = Slot>) {
    for slot in slots {
        if let Err(violation) = pool.release(slot) {
            debug!(pool = pool.id(), %violation, "Dropping operand of failed opcode");
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::execution::{Error, PoolViolation},
        opcode::util::{binary_op, ternary_op, unary_op},
        vm::{
            pool::{IntPool, PoolCache},
            state::stack::Stack,
            word::Word,
            CallContext,
            Config,
            ExecutionContext,
        },
    };

    /// Creates an execution context with `words` pushed in order.
    fn context_with(words: &[u64]) -> anyhow::Result<ExecutionContext> {
        let mut cache = PoolCache::default();
        let mut context = ExecutionContext::new(Config::default(), &mut cache);
        for word in words {
            context.push_word(Word::from(*word))?;
        }

        Ok(context)
    }

    #[test]
    fn binary_op_passes_operands_in_push_order() -> anyhow::Result<()> {
        let mut context = context_with(&[10, 3])?;
        let mut seen = None;
        binary_op(0, &mut context.call_context(&[], &[]), |left, right| {
            seen = Some((left, right));
            left
        })?;

        assert_eq!(seen, Some((Word::from(10), Word::from(3))));
        Ok(())
    }

    #[test]
    fn binary_op_reuses_the_left_slot() -> anyhow::Result<()> {
        let mut context = context_with(&[1, 2])?;
        let left_id = context.stack().peek(1)?.id();
        let right_id = context.stack().peek(0)?.id();

        binary_op(0, &mut context.call_context(&[], &[]), |l, r| l + r)?;

        assert_eq!(context.stack().peek(0)?.id(), left_id);
        assert_eq!(context.pool().free_slot_ids().collect::<Vec<_>>(), vec![right_id]);
        context.check_consistency()?;

        Ok(())
    }

    #[test]
    fn unary_op_keeps_the_operand_slot() -> anyhow::Result<()> {
        let mut context = context_with(&[5])?;
        let id = context.stack().peek(0)?.id();

        let next = unary_op(3, &mut context.call_context(&[], &[]), |x| !x)?;

        assert_eq!(next, 4);
        assert_eq!(context.stack().peek(0)?.id(), id);
        assert_eq!(context.pool().size(), 0);
        assert_eq!(context.pop_word()?, !Word::from(5));

        Ok(())
    }

    #[test]
    fn ternary_op_pops_the_modulus_first() -> anyhow::Result<()> {
        let mut context = context_with(&[1, 2, 3])?;
        let mut seen = None;
        ternary_op(0, &mut context.call_context(&[], &[]), |l, r, n| {
            seen = Some((l, r, n));
            l
        })?;

        assert_eq!(seen, Some((Word::from(1), Word::from(2), Word::from(3))));
        assert_eq!(context.stack().size(), 1);
        assert_eq!(context.pool().size(), 2);

        Ok(())
    }

    #[test]
    fn underflow_leaves_the_stack_untouched() -> anyhow::Result<()> {
        let mut context = context_with(&[1, 2])?;
        let error = ternary_op(9, &mut context.call_context(&[], &[]), |l, _, _| l)
            .expect_err("Executed with too few operands");

        assert_eq!(error.location, 9);
        assert_eq!(
            error.payload,
            Error::StackUnderflow {
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(context.stack().size(), 2);
        assert_eq!(context.pool().live(), 2);

        Ok(())
    }

    #[test]
    fn program_counter_wraps_at_the_end_of_the_address_space() -> anyhow::Result<()> {
        let mut context = context_with(&[5])?;
        let next = unary_op(u32::MAX, &mut context.call_context(&[], &[]), |x| x)?;

        assert_eq!(next, 0);
        Ok(())
    }

    #[test]
    fn foreign_operands_do_not_strand_owned_slots() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut other = IntPool::new();
        let mut stack = Stack::new();
        stack.push(pool.acquire_with(Word::from(1)))?;
        stack.push(other.acquire_with(Word::from(2)))?;

        let mut context = CallContext::new(&mut stack, &mut pool, &[], &[]);
        let error = binary_op(5, &mut context, |l, r| l + r)
            .expect_err("Executed with an operand from another pool");

        assert_eq!(error.location, 5);
        assert!(matches!(
            error.payload,
            Error::PoolConsistencyViolation(PoolViolation::ForeignSlot { .. })
        ));
        assert!(stack.is_empty());
        assert_eq!(pool.live(), 0);
        pool.check_consistency(std::iter::empty())?;

        Ok(())
    }

    #[test]
    fn foreign_modulus_does_not_strand_owned_slots() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut other = IntPool::new();
        let mut stack = Stack::new();
        stack.push(pool.acquire_with(Word::from(1)))?;
        stack.push(pool.acquire_with(Word::from(2)))?;
        stack.push(other.acquire_with(Word::from(3)))?;

        let mut context = CallContext::new(&mut stack, &mut pool, &[], &[]);
        ternary_op(0, &mut context, |l, _, _| l).expect_err("Executed with a foreign modulus");

        assert!(stack.is_empty());
        assert_eq!(pool.live(), 0);

        Ok(())
    }
}
