//! Per-manager scratch buffer.

/// Smallest size the scratch buffer is ever grown to (1 MiB).
pub const MIN_SCRATCH_SIZE: usize = 1024 * 1024;

/// A single growable byte buffer reused across reads.
///
/// The buffer is allocated lazily, grows to the largest size ever requested and never shrinks
/// until [`ScratchBuffer::release`] drops it.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    bytes: Vec<u8>,
}

impl ScratchBuffer {
    /// Create an empty scratch buffer. Nothing is allocated until first use.
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Get the buffer, growing it to at least `max(min_size, MIN_SCRATCH_SIZE)` bytes.
    ///
    /// The returned slice may be longer than requested; its contents are whatever the previous
    /// user left behind.
    pub fn get(&mut self, min_size: usize) -> &mut [u8] {
        let size = min_size.max(MIN_SCRATCH_SIZE);
        if self.bytes.len() < size {
            tracing::trace!(from = self.bytes.len(), to = size, "growing scratch buffer");
            self.bytes.resize(size, 0);
        }
        &mut self.bytes
    }

    /// Current size in bytes (zero before first use).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Free the allocation.
    pub fn release(&mut self) {
        self.bytes = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_allocation() {
        let scratch = ScratchBuffer::new();
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_floor_applied() {
        let mut scratch = ScratchBuffer::new();
        assert_eq!(scratch.get(16).len(), MIN_SCRATCH_SIZE);
    }

    #[test]
    fn test_grows_but_never_shrinks() {
        let mut scratch = ScratchBuffer::new();
        let big = MIN_SCRATCH_SIZE * 3;
        assert_eq!(scratch.get(big).len(), big);
        assert_eq!(scratch.get(10).len(), big);
        assert_eq!(scratch.len(), big);
    }

    #[test]
    fn test_release() {
        let mut scratch = ScratchBuffer::new();
        scratch.get(0);
        scratch.release();
        assert!(scratch.is_empty());
    }
}
