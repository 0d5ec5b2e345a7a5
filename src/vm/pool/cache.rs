//! This module contains the cache that allows integer pools to be recycled
//! between short-lived execution contexts.

use tracing::debug;

use crate::{
    constant::{DEFAULT_MAXIMUM_RETAINED_SLOTS, DEFAULT_POOL_CACHE_CAPACITY},
    vm::{pool::IntPool, Config},
};

/// A cache of idle [`IntPool`]s.
///
/// The cache is owned by the host and passed explicitly to each execution
/// context that needs a pool. Pools are checked out when a context starts and
/// checked back in when it finishes, so reuse of a pool between contexts is
/// always sequential.
#[derive(Debug)]
pub struct PoolCache {
    /// The idle pools, ready to be checked out.
    pools: Vec<IntPool>,

    /// The maximum number of idle pools to keep.
    capacity: usize,

    /// The maximum number of slots each idle pool keeps storage for.
    maximum_retained_slots: usize,
}

impl PoolCache {
    /// Creates a new, empty, cache that holds at most `capacity` idle pools,
    /// each retaining storage for at most `maximum_retained_slots` slots.
    #[must_use]
    pub fn new(capacity: usize, maximum_retained_slots: usize) -> Self {
        let pools = Vec::with_capacity(capacity);
        Self {
            pools,
            capacity,
            maximum_retained_slots,
        }
    }

    /// Creates a new, empty, cache sized according to `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pool_cache_capacity, config.maximum_retained_slots)
    }

    /// Takes an idle pool from the cache, or creates a new pool if the cache
    /// is empty.
    pub fn checkout(&mut self) -> IntPool {
        match self.pools.pop() {
            Some(pool) => {
                debug!(pool = pool.id(), idle = self.pools.len(), "Reusing cached pool");
                pool
            }
            None => {
                let pool = IntPool::new();
                debug!(pool = pool.id(), "Created new pool");
                pool
            }
        }
    }

    /// Returns `pool` to the cache.
    ///
    /// The pool is dropped instead if the cache is already full, or if the
    /// pool still has live slots and hence cannot be reset for reuse.
    pub fn checkin(&mut self, mut pool: IntPool) {
        if self.pools.len() >= self.capacity {
            debug!(pool = pool.id(), "Pool cache full, dropping pool");
            return;
        }

        if let Err(violation) = pool.reset(self.maximum_retained_slots) {
            debug!(pool = pool.id(), %violation, "Dropping pool that cannot be reset");
            return;
        }

        debug!(pool = pool.id(), idle = self.pools.len() + 1, "Pool returned to cache");
        self.pools.push(pool);
    }

    /// Gets the number of idle pools in the cache.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Checks if the cache holds no idle pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets the maximum number of idle pools the cache will keep.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PoolCache {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CACHE_CAPACITY, DEFAULT_MAXIMUM_RETAINED_SLOTS)
    }
}
