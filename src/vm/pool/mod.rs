//! This module contains the integer pool that opcodes borrow word storage
//! from, along with the [`cache::PoolCache`] that recycles pools between
//! execution contexts.
//!
//! # Ownership
//!
//! Storage in the pool is handed out as [`Slot`]s. A slot is a move-only
//! handle: it cannot be cloned or copied, so at any point in time it is owned
//! by exactly one of the operand stack, an executing opcode, or the pool's own
//! free list. This makes it impossible for two stack entries to alias the same
//! mutable storage.
//!
//! What the type system cannot rule out is handing a slot to a pool it did not
//! come from. Those misuses are detected at runtime and reported as
//! [`PoolViolation`]s.
//!
//! # Stale Values
//!
//! Slots are never cleared when they are released, so a freshly acquired slot
//! will usually still hold whatever value it held last. Callers must always
//! write a slot before they read it.

pub mod cache;

use std::{
    collections::HashSet,
    sync::atomic::{AtomicU32, Ordering},
};

use bitvec::vec::BitVec;

use crate::{error::execution::PoolViolation, vm::word::Word};

pub use cache::PoolCache;

/// The source of unique pool identities for this process.
static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);

/// The copyable identity of a [`Slot`].
///
/// This exists purely for diagnostics, and cannot be used to access the pool.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotId {
    /// The identity of the pool that the slot belongs to.
    pub pool: u32,

    /// The index of the slot's storage within its pool.
    pub index: u32,
}

/// A move-only handle to a single word of storage in an [`IntPool`].
#[derive(Debug, Eq, PartialEq)]
pub struct Slot {
    pool:  u32,
    index: u32,
}

impl Slot {
    /// Gets the identity of this slot.
    #[must_use]
    pub fn id(&self) -> SlotId {
        SlotId {
            pool:  self.pool,
            index: self.index,
        }
    }
}

/// An arena of reusable word storage.
///
/// The pool grows on demand and never shrinks while slots are live. See the
/// [module documentation](self) for the rules on slot ownership.
#[derive(Debug)]
pub struct IntPool {
    /// The unique identity of this pool.
    id: u32,

    /// The storage for every slot this pool has ever handed out.
    values: Vec<Word>,

    /// The slots that are available to be acquired.
    free: Vec<Slot>,

    /// One bit per slot in `values`, set when that slot is in `free`.
    free_mask: BitVec,
}

impl IntPool {
    /// Creates a new pool without any storage.
    #[must_use]
    pub fn new() -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            values: Vec::new(),
            free: Vec::new(),
            free_mask: BitVec::new(),
        }
    }

    /// Gets the unique identity of this pool.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Takes a slot from the pool, growing the pool if no free slot exists.
    ///
    /// The value in the returned slot is unspecified and must be overwritten
    /// before it is read.
    ///
    /// # Panics
    ///
    /// If the pool would grow beyond [`u32::MAX`] slots. This is a programmer
    /// bug.
    pub fn acquire(&mut self) -> Slot {
        if let Some(slot) = self.free.pop() {
            self.free_mask.set(slot.index as usize, false);
            return slot;
        }

        let index = self
            .values
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("Pool size should not exceed {}", u32::MAX));
        self.values.push(Word::zero());
        self.free_mask.push(false);

        Slot {
            pool: self.id,
            index,
        }
    }

    /// Takes a slot from the pool and writes `value` into it.
    pub fn acquire_with(&mut self, value: Word) -> Slot {
        let slot = self.acquire();
        self.values[slot.index as usize] = value;
        slot
    }

    /// Returns `slot` to the pool so that it can be acquired again.
    ///
    /// # Errors
    ///
    /// If `slot` does not belong to this pool, or if it is somehow already
    /// free.
    pub fn release(&mut self, slot: Slot) -> Result<(), PoolViolation> {
        self.check_owner(&slot)?;

        let index = slot.index as usize;
        if self.free_mask[index] {
            return Err(PoolViolation::DoubleRelease { slot: slot.id() });
        }

        self.free_mask.set(index, true);
        self.free.push(slot);

        Ok(())
    }

    /// Reads the value stored in `slot`.
    ///
    /// # Errors
    ///
    /// If `slot` does not belong to this pool.
    pub fn get(&self, slot: &Slot) -> Result<Word, PoolViolation> {
        self.check_owner(slot)?;
        Ok(self.values[slot.index as usize])
    }

    /// Writes `value` into `slot`.
    ///
    /// # Errors
    ///
    /// If `slot` does not belong to this pool.
    pub fn set(&mut self, slot: &Slot, value: Word) -> Result<(), PoolViolation> {
        self.check_owner(slot)?;
        self.values[slot.index as usize] = value;

        Ok(())
    }

    /// Gets the number of slots that are free to be acquired.
    ///
    /// This is for diagnostics only.
    #[must_use]
    pub fn size(&self) -> usize {
        self.free.len()
    }

    /// Gets the total number of slots that the pool has storage for.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Gets the number of slots that are currently handed out.
    #[must_use]
    pub fn live(&self) -> usize {
        self.capacity() - self.size()
    }

    /// Gets the identities of the slots in the free list, in the order in
    /// which they will next be acquired.
    pub fn free_slot_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.free.iter().rev().map(Slot::id)
    }

    /// Checks the internal bookkeeping of the pool against the identities of
    /// the slots that the caller believes to be `live`.
    ///
    /// # Errors
    ///
    /// If the free list contains a duplicate, if it disagrees with the free
    /// mask, or if any of the `live` slots is in the free list or belongs to
    /// a different pool.
    pub fn check_consistency(
        &self,
        live: impl IntoIterator<Item = SlotId>,
    ) -> Result<(), PoolViolation> {
        let mut free_ids = HashSet::with_capacity(self.free.len());
        for slot in &self.free {
            let id = slot.id();
            if !free_ids.insert(id) {
                return Err(PoolViolation::DuplicateFreeEntry { slot: id });
            }
        }

        let marked = self.free_mask.count_ones();
        let all_listed_are_marked = self.free.iter().all(|slot| self.free_mask[slot.index as usize]);
        if marked != self.free.len() || !all_listed_are_marked {
            return Err(PoolViolation::FreeListMismatch {
                listed: self.free.len(),
                marked,
            });
        }

        for id in live {
            if id.pool != self.id {
                return Err(PoolViolation::ForeignSlot {
                    slot: id,
                    pool: self.id,
                });
            }
            if free_ids.contains(&id) {
                return Err(PoolViolation::LiveSlotIsFree { slot: id });
            }
        }

        Ok(())
    }

    /// Prepares an idle pool for reuse by another execution context, keeping
    /// storage for at most `maximum_retained` slots.
    ///
    /// Retained slots keep their stale values.
    ///
    /// # Errors
    ///
    /// If any slot is still live, as its storage could otherwise be handed out
    /// twice.
    pub fn reset(&mut self, maximum_retained: usize) -> Result<(), PoolViolation> {
        let live = self.live();
        if live != 0 {
            return Err(PoolViolation::LeakedSlots { count: live });
        }

        let retained = self.values.len().min(maximum_retained);
        self.values.truncate(retained);
        self.free_mask.clear();
        self.free_mask.resize(retained, true);

        // `retained` fits in a `u32` as it is no larger than the prior capacity.
        #[allow(clippy::cast_possible_truncation)]
        let indices = 0..retained as u32;
        let pool = self.id;
        self.free = indices.rev().map(|index| Slot { pool, index }).collect();

        Ok(())
    }

    /// Checks that `slot` was handed out by this pool.
    fn check_owner(&self, slot: &Slot) -> Result<(), PoolViolation> {
        if slot.pool == self.id && (slot.index as usize) < self.values.len() {
            Ok(())
        } else {
            Err(PoolViolation::ForeignSlot {
                slot: slot.id(),
                pool: self.id,
            })
        }
    }
}

impl Default for IntPool {
    fn default() -> Self {
        Self::new()
    }
}
