//! This module contains the implementation of the virtual machine's operand
//! stack.

use crate::{
    constant::MAXIMUM_STACK_DEPTH,
    error::execution::Error,
    vm::pool::{Slot, SlotId},
};

/// The representation of the virtual machine's operand stack.
///
/// # Indexing
///
/// Indexing into this stack is zero-based, where frame 0 is the top stack
/// frame.
///
/// # Contents
///
/// The stack stores [`Slot`] handles rather than words. It never looks inside
/// the slots it holds, and has no knowledge of the pool they came from.
#[derive(Debug, Eq, PartialEq)]
pub struct Stack {
    data:          Vec<Slot>,
    maximum_depth: usize,
}

impl Stack {
    /// Creates a new stack without any items on it, limited to
    /// [`MAXIMUM_STACK_DEPTH`] frames.
    #[must_use]
    pub fn new() -> Self {
        Self::with_maximum_depth(MAXIMUM_STACK_DEPTH)
    }

    /// Creates a new stack without any items on it, limited to
    /// `maximum_depth` frames.
    #[must_use]
    pub fn with_maximum_depth(maximum_depth: usize) -> Self {
        let data = Vec::with_capacity(maximum_depth);
        Self {
            data,
            maximum_depth,
        }
    }

    /// Pushes the provided slot onto the top of the stack.
    ///
    /// # Errors
    ///
    /// If the stack cannot grow to accommodate the requested `slot`. The slot
    /// is dropped in that case, so callers that need it back should call
    /// [`Self::check_capacity`] first.
    pub fn push(&mut self, slot: Slot) -> Result<(), Error> {
        self.check_capacity(1)?;
        self.data.push(slot);
        Ok(())
    }

    /// Pops the top slot from the stack.
    ///
    /// # Errors
    ///
    /// If the stack has no item to pop.
    pub fn pop(&mut self) -> Result<Slot, Error> {
        self.data.pop().ok_or(Error::StackUnderflow {
            requested: 1,
            available: 0,
        })
    }

    /// Reads the slot at the provided `depth` without removing it.
    ///
    /// # Errors
    ///
    /// If `depth` does not exist in the stack.
    pub fn peek(&self, depth: usize) -> Result<&Slot, Error> {
        self.check_frames(depth + 1)?;

        // This is a safe unsigned subtraction as `check_frames` will have
        // returned an error if `depth` exceeds the current size.
        let index = self.data.len() - 1 - depth;
        Ok(&self.data[index])
    }

    /// Checks that at least `count` frames are present on the stack.
    ///
    /// # Errors
    ///
    /// If fewer than `count` frames exist.
    pub fn check_frames(&self, count: usize) -> Result<(), Error> {
        if count > self.data.len() {
            return Err(Error::StackUnderflow {
                requested: count,
                available: self.data.len(),
            });
        }

        Ok(())
    }

    /// Checks that `count` more frames can be pushed onto the stack.
    ///
    /// # Errors
    ///
    /// If pushing `count` frames would exceed the maximum depth.
    pub fn check_capacity(&self, count: usize) -> Result<(), Error> {
        let requested = self.data.len() + count;
        if requested > self.maximum_depth {
            return Err(Error::StackOverflow {
                requested,
                limit: self.maximum_depth,
            });
        }

        Ok(())
    }

    /// Gets the current size of the stack.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Checks if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Gets the maximum number of frames the stack can hold.
    #[must_use]
    pub fn maximum_depth(&self) -> usize {
        self.maximum_depth
    }

    /// Gets the identities of the slots on the stack, from the bottom up.
    pub fn slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.data.iter().map(Slot::id)
    }

    /// Removes every slot from the stack, from the top down.
    ///
    /// This is only intended for tearing down an execution context, where each
    /// slot is handed back to its pool.
    pub fn drain(&mut self) -> impl Iterator<Item = Slot> + '_ {
        self.data.drain(..).rev()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        constant::MAXIMUM_STACK_DEPTH,
        error::execution::Error,
        vm::{pool::IntPool, state::stack::Stack},
    };

    /// Constructs a new stack with `item_count` slots from `pool` pushed onto
    /// it.
    fn new_stack_with_items(pool: &mut IntPool, item_count: usize) -> anyhow::Result<Stack> {
        let mut stack = Stack::new();
        for _ in 0..item_count {
            stack.push(pool.acquire())?;
        }

        Ok(stack)
    }

    #[test]
    fn can_construct_new_stack() {
        let stack = Stack::new();
        assert_eq!(stack.size(), 0);
        assert_eq!(stack.maximum_depth(), MAXIMUM_STACK_DEPTH);
    }

    #[test]
    fn can_push_item_within_capacity() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut stack = Stack::new();
        stack.push(pool.acquire())?;

        Ok(())
    }

    #[test]
    fn cannot_push_outside_of_capacity() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut stack = new_stack_with_items(&mut pool, MAXIMUM_STACK_DEPTH)?;
        let error = stack
            .push(pool.acquire())
            .expect_err("Pushing onto a full stack did not error");
        assert_eq!(
            error,
            Error::StackOverflow {
                requested: MAXIMUM_STACK_DEPTH + 1,
                limit:     MAXIMUM_STACK_DEPTH,
            }
        );

        Ok(())
    }

    #[test]
    fn respects_custom_maximum_depth() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut stack = Stack::with_maximum_depth(2);
        stack.push(pool.acquire())?;
        stack.push(pool.acquire())?;
        stack
            .check_capacity(1)
            .expect_err("A full stack reported spare capacity");

        Ok(())
    }

    #[test]
    fn pops_in_last_in_first_out_order() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut stack = Stack::new();
        let first = pool.acquire();
        let second = pool.acquire();
        let (first_id, second_id) = (first.id(), second.id());
        stack.push(first)?;
        stack.push(second)?;

        assert_eq!(stack.pop()?.id(), second_id);
        assert_eq!(stack.pop()?.id(), first_id);

        Ok(())
    }

    #[test]
    fn cannot_pop_item_when_empty() {
        let mut stack = Stack::default();
        let error = stack.pop().expect_err("Did not error when popping empty stack");
        assert_eq!(
            error,
            Error::StackUnderflow {
                requested: 1,
                available: 0,
            }
        );
    }

    #[test]
    fn can_peek_item_at_depth() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let stack = new_stack_with_items(&mut pool, 10)?;
        let bottom = stack.peek(9)?;
        assert_eq!(bottom.id().index, 0);
        let top = stack.peek(0)?;
        assert_eq!(top.id().index, 9);

        Ok(())
    }

    #[test]
    fn cannot_peek_item_at_invalid_depth() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let stack = new_stack_with_items(&mut pool, 10)?;
        stack
            .peek(10)
            .expect_err("Read an item at a depth that doesn't exist");

        Ok(())
    }

    #[test]
    fn cannot_peek_item_in_empty_stack() {
        let stack = Stack::default();
        stack.peek(0).expect_err("Read a frame from an empty stack");
    }

    #[test]
    fn reports_missing_frames() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let stack = new_stack_with_items(&mut pool, 1)?;
        assert_eq!(
            stack.check_frames(2),
            Err(Error::StackUnderflow {
                requested: 2,
                available: 1,
            })
        );

        Ok(())
    }

    #[test]
    fn drain_empties_the_stack_from_the_top() -> anyhow::Result<()> {
        let mut pool = IntPool::new();
        let mut stack = new_stack_with_items(&mut pool, 3)?;
        let indices: Vec<_> = stack.drain().map(|slot| slot.id().index).collect();

        assert_eq!(indices, vec![2, 1, 0]);
        assert!(stack.is_empty());

        Ok(())
    }
}
