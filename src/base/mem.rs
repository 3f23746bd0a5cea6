use smallvec::SmallVec;
use thiserror::Error;

/// Owned read result; accesses are at most 8 bytes so this never spills to the heap.
pub type MemBytes = SmallVec<[u8; 8]>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    #[error("memory access of size {size} @ {addr:#08x} is out of bounds (span {span:#x})")]
    OutOfBounds { addr: u32, size: usize, span: usize },
}

/// Trait for simulated memories backing the cache.
pub trait HasMemory {
    /// Number of addressable bytes.
    fn span(&self) -> usize;

    fn read_impl(&self, addr: usize, n: usize) -> &[u8];
    fn write_impl(&mut self, addr: usize, data: &[u8]);

    fn check_bounds(&self, addr: u32, n: usize) -> Result<usize, MemError> {
        let start = addr as usize;
        match start.checked_add(n) {
            Some(end) if end <= self.span() => Ok(start),
            _ => Err(MemError::OutOfBounds {
                addr,
                size: n,
                span: self.span(),
            }),
        }
    }

    fn read(&self, addr: u32, n: usize) -> Result<MemBytes, MemError> {
        let start = self.check_bounds(addr, n)?;
        Ok(SmallVec::from_slice(self.read_impl(start, n)))
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), MemError> {
        let start = self.check_bounds(addr, data.len())?;
        self.write_impl(start, data);
        Ok(())
    }
}
