//! Heap accounting for the host process.
//!
//! A counting wrapper around the system allocator tracks live bytes; free
//! memory is reported against a fixed budget so the low-water figures look
//! like they would on the device.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use thermo_core::memory::MemoryStats;

pub struct CountingAllocator {
    allocated: AtomicUsize,
}

impl CountingAllocator {
    pub const fn new() -> Self {
        Self {
            allocated: AtomicUsize::new(0),
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.allocated.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.allocated.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            self.allocated.fetch_sub(layout.size(), Ordering::Relaxed);
            self.allocated.fetch_add(new_size, Ordering::Relaxed);
        }
        new_ptr
    }
}

#[global_allocator]
pub static ALLOCATOR: CountingAllocator = CountingAllocator::new();

/// Allocator figures measured against a pretend heap of `budget` bytes.
pub struct HeapStats {
    budget: usize,
}

impl HeapStats {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }
}

impl MemoryStats for HeapStats {
    fn current_free_bytes(&self) -> usize {
        self.budget.saturating_sub(ALLOCATOR.allocated())
    }

    fn allocated_bytes(&self) -> usize {
        ALLOCATOR.allocated()
    }
}
