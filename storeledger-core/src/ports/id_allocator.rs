//! Transaction id allocation port

/// Supplies transaction ids
///
/// Ids handed out by one allocator are strictly increasing and never repeat.
pub trait IdAllocator {
    /// Take the next id
    fn next_id(&mut self) -> u64;

    /// The id the next call to `next_id` will return
    fn peek(&self) -> u64;
}

impl<T: IdAllocator + ?Sized> IdAllocator for &mut T {
    fn next_id(&mut self) -> u64 {
        (**self).next_id()
    }

    fn peek(&self) -> u64 {
        (**self).peek()
    }
}
