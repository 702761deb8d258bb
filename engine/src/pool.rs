// Chunked slab allocator for orders and limit levels.
//
// Like `common::mem_pool::MemPool`, this is a single-threaded, zero-allocation
// (after warm-up) object pool with a LIFO free list for cache locality. Unlike
// `MemPool`, capacity is a runtime parameter rather than a const generic:
// storage is split into fixed-size chunks so that growing the pool (pushing a
// new chunk) never moves a previously handed-out slot. An optional hard cap
// turns growth into a rejected allocation instead of an unbounded one.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

const CHUNK_LEN: usize = 1024;

/// A growable, address-stable slab of `T`.
///
/// # Safety
///
/// Single-threaded use only; see `common::mem_pool::MemPool` for the same
/// contract. A slot index must only be used with the pool that produced it,
/// must not be read before being written by `allocate`+a subsequent write,
/// and must not be used after `deallocate`.
pub struct SlabPool<T> {
    chunks: UnsafeCell<Vec<Box<[MaybeUninit<T>; CHUNK_LEN]>>>,
    free_list: UnsafeCell<Vec<usize>>,
    max_capacity: Option<usize>,
}

/// Returned when a pool has a configured hard cap and it has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolExhausted;

impl<T> SlabPool<T> {
    /// Creates a pool pre-grown to hold at least `initial_capacity` slots.
    pub fn new(initial_capacity: usize) -> Self {
        Self::with_max_capacity(initial_capacity, None)
    }

    /// Creates a pool pre-grown to hold at least `initial_capacity` slots,
    /// which will never grow past `max_capacity` once one is supplied.
    pub fn with_max_capacity(initial_capacity: usize, max_capacity: Option<usize>) -> Self {
        let pool = Self {
            chunks: UnsafeCell::new(Vec::new()),
            free_list: UnsafeCell::new(Vec::new()),
            max_capacity,
        };
        let chunks_needed = initial_capacity.div_ceil(CHUNK_LEN).max(1);
        for _ in 0..chunks_needed {
            pool.push_chunk();
        }
        pool
    }

    fn push_chunk(&self) {
        // SAFETY: single-threaded access required by the pool's contract;
        // no other reference into `chunks`/`free_list` is held across this call.
        unsafe {
            let chunks = &mut *self.chunks.get();
            let base = chunks.len() * CHUNK_LEN;
            chunks.push(Box::new(
                [const { MaybeUninit::uninit() }; CHUNK_LEN],
            ));
            let free_list = &mut *self.free_list.get();
            free_list.reserve(CHUNK_LEN);
            for i in (0..CHUNK_LEN).rev() {
                free_list.push(base + i);
            }
        }
    }

    /// Total number of slots currently backed by storage (allocated + free).
    pub fn capacity(&self) -> usize {
        // SAFETY: read-only length access.
        unsafe { (*self.chunks.get()).len() * CHUNK_LEN }
    }

    /// Number of slots currently on the free list. Diagnostic use only:
    /// `capacity() - free_count()` is the number of live allocations.
    pub fn free_count(&self) -> usize {
        // SAFETY: read-only length access.
        unsafe { (*self.free_list.get()).len() }
    }

    /// Allocates a slot, growing the backing storage by one chunk if the
    /// free list is empty and capacity allows it.
    ///
    /// Returns the uninitialized slot's index. The caller must write to it
    /// via `get_mut` before reading.
    pub fn allocate(&self) -> Result<usize, PoolExhausted> {
        // SAFETY: single-threaded access required by the pool's contract.
        let has_free = unsafe { !(*self.free_list.get()).is_empty() };
        if !has_free {
            let capacity = self.capacity();
            if let Some(max) = self.max_capacity {
                if capacity >= max {
                    return Err(PoolExhausted);
                }
            }
            self.push_chunk();
        }
        // SAFETY: free list is non-empty after the growth check above.
        unsafe {
            let free_list = &mut *self.free_list.get();
            Ok(free_list.pop().expect("free list replenished above"))
        }
    }

    /// Returns a slot to the pool. The caller must not use `index` again
    /// until it is handed back out by a later `allocate`.
    pub fn deallocate(&self, index: usize) {
        // SAFETY: single-threaded access required by the pool's contract.
        unsafe {
            let free_list = &mut *self.free_list.get();
            debug_assert!(
                !free_list.contains(&index),
                "double-free detected in SlabPool"
            );
            free_list.push(index);
        }
    }

    fn slot_ptr(&self, index: usize) -> *mut T {
        // SAFETY: caller guarantees `index` is in bounds for an allocated slot.
        unsafe {
            let chunks = &mut *self.chunks.get();
            let chunk = &mut chunks[index / CHUNK_LEN];
            chunk[index % CHUNK_LEN].as_mut_ptr()
        }
    }

    /// Returns a shared reference to the slot at `index`.
    ///
    /// # Safety (caller contract, not enforced)
    /// `index` must refer to a currently allocated, initialized slot.
    #[inline]
    pub fn get(&self, index: usize) -> &T {
        unsafe { &*self.slot_ptr(index) }
    }

    /// Returns a mutable reference to the slot at `index`.
    ///
    /// # Safety (caller contract, not enforced)
    /// `index` must refer to a currently allocated slot, and no other
    /// reference to it may be live.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub fn get_mut(&self, index: usize) -> &mut T {
        unsafe { &mut *self.slot_ptr(index) }
    }
}

// SAFETY: ownership of T can move between threads; concurrent access to the
// same pool from multiple threads is still unsound and is not claimed here.
unsafe impl<T: Send> Send for SlabPool<T> {}
