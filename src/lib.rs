//! # firstfit - A First-Fit Free-List Allocator
//!
//! This crate provides a small **first-fit** allocator with block splitting and
//! coalescing of adjacent free blocks, on top of one contiguous heap that grows
//! in coarse chunks (via `sbrk` or an owned buffer).
//!
//! ## Overview
//!
//! ```text
//!   Heap layout:
//!
//!   ┌──────┬─────────┬──────┬──────────────┬──────┬─────────┬──────┬───────────┐
//!   │ hdr  │  used   │ hdr  │    free      │ hdr  │  used   │ hdr  │   free    │
//!   └──────┴─────────┴──────┴──────────────┴──────┴─────────┴──────┴───────────┘
//!                       │                                      ▲
//!   free list ──────────┴──────────── next ────────────────────┘
//!
//!   Free blocks are linked in address order through their headers.
//!   allocate() takes the first free block that is large enough.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   firstfit
//!   ├── align      - ALIGNMENT and the align! macro
//!   ├── block      - Block header encoding, header/payload offsets (internal)
//!   ├── config     - HeapConfig (growth increment, split threshold)
//!   ├── error      - AllocError
//!   ├── heap       - Heap: allocate, deallocate, allocate_zeroed, resize
//!   ├── source     - HeapSource: SbrkSource and ArenaSource
//!   └── stats      - Counters and free-list dumps
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use firstfit::Heap;
//!
//! let mut heap = Heap::with_arena(64 * 1024);
//!
//! let ptr = heap.allocate(100).unwrap();
//! heap.bytes_mut(ptr)[..5].copy_from_slice(b"hello");
//!
//! let ptr = heap.resize(Some(ptr), 400).unwrap().unwrap();
//! assert_eq!(&heap.bytes(ptr)[..5], b"hello");
//!
//! heap.deallocate(Some(ptr));
//! println!("{}", heap.free_list());
//! ```
//!
//! ## How It Works
//!
//! Allocation scans the free list from its head and stops at the first block
//! that fits. Whatever that block has left over is split off as a new free
//! block, as long as the leftover can hold a header plus a minimal payload:
//!
//! ```text
//!   Split of a 1024 byte block for allocate(104):
//!
//!   before  ┌──────┬──────────────────────────────────────────────┐
//!           │ 1024 │                                              │
//!           └──────┴──────────────────────────────────────────────┘
//!   after   ┌──────┬─────────┬──────┬─────────────────────────────┐
//!           │ 104  │  used   │ 904  │           free              │
//!           └──────┴─────────┴──────┴─────────────────────────────┘
//!                  ▲
//!                  └── Ptr returned to the caller
//! ```
//!
//! When no block fits, the heap grows by a fixed increment (1024 bytes by
//! default, or the request itself if it is larger) plus one header. The heap
//! never shrinks.
//!
//! Freeing inserts the block back at its address-ordered position and merges
//! it with the block after it and the block before it, when they touch:
//!
//! ```text
//!   ┌──────┬──────┐┌──────┬──────┐┌──────┬──────┐       ┌──────┬──────────────────┐
//!   │ free │  A   ││ hdr  │  B   ││ free │  C   │  ──►  │ free │    A + B + C     │
//!   └──────┴──────┘└──────┴──────┘└──────┴──────┘       └──────┴──────────────────┘
//!                   deallocate(B)
//! ```
//!
//! ## Handles
//!
//! Blocks are addressed by offset inside the heap region. [`Ptr`] wraps the
//! payload offset; [`Heap::bytes`] and [`Heap::bytes_mut`] give access to the
//! payload, and [`Heap::as_ptr`] yields the absolute address when one is needed.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives
//! - **First fit**: no attempt at limiting fragmentation
//! - **No corruption detection**: double frees and foreign handles are
//!   undefined (checked only by debug assertions)
//! - **Monotonic heap**: memory is never given back to the OS

pub mod align;
mod block;
pub mod config;
pub mod error;
mod heap;
pub mod source;
pub mod stats;

pub use block::HEADER_SIZE;
pub use config::HeapConfig;
pub use error::AllocError;
pub use heap::{Heap, Ptr};
pub use source::{ArenaSource, HeapSource, SbrkSource};
pub use stats::{FreeBlockInfo, FreeListDump, HeapStats};
