use thiserror::Error;

pub const MAX_CACHE_SIZE: u32 = 2 << 20; // 2 MiB
pub const MAX_BLOCK_SIZE: u32 = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache size, associativity and block size must all be positive (got size={size}, ways={ways}, block={block})")]
    Zero { size: u32, ways: u32, block: u32 },
    #[error("cache size {0} bytes exceeds the maximum of 2 MiB")]
    CacheTooLarge(u64),
    #[error("block size {0} bytes exceeds the maximum of 1024 bytes")]
    BlockTooLarge(u32),
    #[error("block size {0} is not a power of two")]
    BlockNotPowerOfTwo(u32),
    #[error("cache of {size} bytes cannot hold a single set of {ways} x {block}-byte blocks")]
    NoSets { size: u32, ways: u32, block: u32 },
    #[error("set count {0} is not a power of two")]
    SetsNotPowerOfTwo(u32),
}

/// Set index of `address`: `(address / block_size) mod sets`.
/// `sets` must be a power of two.
#[inline]
pub fn get_set_index(address: u32, sets: u32, block_size: u32) -> u32 {
    (address / block_size) & (sets - 1)
}

/// Tag of `address`, i.e. everything above the offset and index bits.
/// `sets` and `block_size` must be powers of two.
#[inline]
pub fn get_tag(address: u32, sets: u32, block_size: u32) -> u32 {
    let offset_bits = block_size.trailing_zeros();
    let index_bits = sets.trailing_zeros();
    address >> (offset_bits + index_bits)
}

/// Validated cache shape. Construction is the only place the power-of-two
/// requirements are checked; decoding relies on them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    size: u32,
    ways: u32,
    block_size: u32,
    sets: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAddr {
    pub tag: u32,
    pub set_index: u32,
    pub offset: u32,
}

impl CacheGeometry {
    pub fn new(size: u32, ways: u32, block_size: u32) -> Result<Self, ConfigError> {
        if size == 0 || ways == 0 || block_size == 0 {
            return Err(ConfigError::Zero {
                size,
                ways,
                block: block_size,
            });
        }
        if size > MAX_CACHE_SIZE {
            return Err(ConfigError::CacheTooLarge(size as u64));
        }
        if block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::BlockTooLarge(block_size));
        }
        if !block_size.is_power_of_two() {
            return Err(ConfigError::BlockNotPowerOfTwo(block_size));
        }

        let set_bytes = ways as u64 * block_size as u64;
        let sets = size as u64 / set_bytes;
        if sets == 0 {
            return Err(ConfigError::NoSets {
                size,
                ways,
                block: block_size,
            });
        }
        // sets <= size <= MAX_CACHE_SIZE, so this cannot truncate
        let sets = sets as u32;
        if !sets.is_power_of_two() {
            return Err(ConfigError::SetsNotPowerOfTwo(sets));
        }

        Ok(Self {
            size,
            ways,
            block_size,
            sets,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn ways(&self) -> u32 {
        self.ways
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn sets(&self) -> u32 {
        self.sets
    }

    pub fn offset_bits(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    pub fn index_bits(&self) -> u32 {
        self.sets.trailing_zeros()
    }

    pub fn set_index(&self, address: u32) -> u32 {
        get_set_index(address, self.sets, self.block_size)
    }

    pub fn tag(&self, address: u32) -> u32 {
        get_tag(address, self.sets, self.block_size)
    }

    pub fn decompose(&self, address: u32) -> DecodedAddr {
        DecodedAddr {
            tag: self.tag(address),
            set_index: self.set_index(address),
            offset: address & (self.block_size - 1),
        }
    }

    pub fn recompose(&self, decoded: DecodedAddr) -> u32 {
        let off = self.offset_bits();
        // off + idx <= 31 for every valid geometry
        (decoded.tag << (off + self.index_bits())) | (decoded.set_index << off) | decoded.offset
    }
}
