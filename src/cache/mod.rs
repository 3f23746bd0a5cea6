pub mod geometry;
pub mod policy;
pub mod tag_array;


pub use geometry::{CacheGeometry, ConfigError};
pub use policy::{Lru, ReplacementPolicy};
pub use tag_array::{CacheLine, CacheTagArray};
