//! Heap statistics from the `esp-alloc` global heap.

use thermo_core::memory::MemoryStats;

pub struct EspHeap;

impl MemoryStats for EspHeap {
    fn current_free_bytes(&self) -> usize {
        esp_alloc::HEAP.free()
    }

    fn allocated_bytes(&self) -> usize {
        esp_alloc::HEAP.used()
    }
}
