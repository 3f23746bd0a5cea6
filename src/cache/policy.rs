//! Replacement policy over the recency counters stored in each [`CacheLine`].
//!
//! A counter of 0 marks the most recently used line of a set. Touching a line
//! resets its counter and ages every other line of the same set by one, so
//! counters are only meaningful relative to each other within one set.

use crate::cache::tag_array::CacheLine;

pub trait ReplacementPolicy {
    /// Record a use of `way` within `set`.
    fn touch(&self, set: &mut [CacheLine], way: usize);

    /// Pick the way to evict from `set`.
    fn select_victim(&self, set: &[CacheLine]) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Lru;

impl ReplacementPolicy for Lru {
    fn touch(&self, set: &mut [CacheLine], way: usize) {
        for (idx, line) in set.iter_mut().enumerate() {
            if idx == way {
                line.recency = 0;
            } else {
                line.recency = line.recency.saturating_add(1);
            }
        }
    }

    /// Oldest line wins; ties go to the lowest way. Validity is not consulted,
    /// so a cold line (recency 0) only loses to nothing older.
    fn select_victim(&self, set: &[CacheLine]) -> usize {
        let mut victim = 0;
        let mut oldest = match set.first() {
            Some(line) => line.recency,
            None => return 0,
        };
        for (way, line) in set.iter().enumerate().skip(1) {
            if line.recency > oldest {
                victim = way;
                oldest = line.recency;
            }
        }
        victim
    }
}
