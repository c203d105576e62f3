//! Runtime memory model: typed stack cells and a byte-addressed heap
//!
//! Neither structure is thread-safe; callers needing sharing must add their
//! own synchronization.

mod allocator;
mod stack;

pub use allocator::Heap;
pub use stack::{SlotType, Stack};
