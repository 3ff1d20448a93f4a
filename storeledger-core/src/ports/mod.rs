//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The conversion
//! engines depend only on these traits, not on concrete implementations.

mod id_allocator;
mod sink;

pub use id_allocator::IdAllocator;
pub use sink::LedgerSink;
