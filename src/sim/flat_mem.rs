use crate::base::mem::HasMemory;

/// 16 MiB of simulated main memory.
pub const ADDRESS_SPACE_SIZE: usize = 1 << 24;

/// Flat byte array modelling the whole address space, zeroed on creation.
/// Avoids hash-table lookup for every memory access.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    bytes: Vec<u8>,
}

impl HasMemory for FlatMemory {
    fn span(&self) -> usize {
        self.bytes.len()
    }

    fn read_impl(&self, addr: usize, n: usize) -> &[u8] {
        &self.bytes[addr..addr + n]
    }

    fn write_impl(&mut self, addr: usize, data: &[u8]) {
        let bytes = &mut self.bytes[addr..addr + data.len()];
        bytes.copy_from_slice(data);
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatMemory {
    pub fn new() -> Self {
        Self::new_with_size(ADDRESS_SPACE_SIZE)
    }

    pub fn new_with_size(size: usize) -> Self {
        let bytes = vec![0u8; size];
        Self { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::mem::MemError;

    #[test]
    fn starts_zeroed() {
        let mem = FlatMemory::new();
        assert_eq!(mem.span(), ADDRESS_SPACE_SIZE);
        assert_eq!(mem.read(0x1234, 8).unwrap().as_slice(), &[0u8; 8]);
    }

    #[test]
    fn write_then_read_back() {
        let mut mem = FlatMemory::new();
        mem.write(0x10, &[1, 2, 3, 4]).unwrap();
        assert_eq!(mem.read(0x10, 4).unwrap().as_slice(), &[1, 2, 3, 4]);
        assert_eq!(mem.read(0x12, 2).unwrap().as_slice(), &[3, 4]);
    }

    #[test]
    fn last_byte_is_addressable() {
        let mut mem = FlatMemory::new();
        let last = (ADDRESS_SPACE_SIZE - 1) as u32;
        mem.write(last, &[0xab]).unwrap();
        assert_eq!(mem.read(last, 1).unwrap().as_slice(), &[0xab]);
    }

    #[test]
    fn read_past_end_fails() {
        let mem = FlatMemory::new();
        let err = mem.read(0xFFFFFE, 4).unwrap_err();
        assert_eq!(
            err,
            MemError::OutOfBounds {
                addr: 0xFFFFFE,
                size: 4,
                span: ADDRESS_SPACE_SIZE
            }
        );
        assert!(mem.read(u32::MAX, 8).is_err());
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let mut mem = FlatMemory::new();
        assert!(mem.write(0xFFFFFD, &[9, 9, 9, 9]).is_err());
        assert_eq!(mem.read(0xFFFFFC, 4).unwrap().as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn reads_are_independent_copies() {
        let mut mem = FlatMemory::new();
        mem.write(0, &[7, 7]).unwrap();
        let first = mem.read(0, 2).unwrap();
        mem.write(0, &[8, 8]).unwrap();
        let second = mem.read(0, 2).unwrap();
        assert_eq!(first.as_slice(), &[7, 7]);
        assert_eq!(second.as_slice(), &[8, 8]);
    }
}
