use crate::cache::geometry::CacheGeometry;
use crate::cache::policy::ReplacementPolicy;
use log::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u32,
    pub valid: bool,
    pub recency: u64,
}

/// What a fill displaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub way: usize,
    pub evicted_tag: Option<u32>,
}

/// Per-line state for every set, stored set-major in one allocation.
#[derive(Debug)]
pub struct CacheTagArray<P> {
    sets: usize,
    ways: usize,
    lines: Vec<CacheLine>,
    policy: P,
}

impl<P: ReplacementPolicy> CacheTagArray<P> {
    pub fn new(geometry: &CacheGeometry, policy: P) -> Self {
        let sets = geometry.sets() as usize;
        let ways = geometry.ways() as usize;
        Self {
            sets,
            ways,
            lines: vec![CacheLine::default(); sets * ways],
            policy,
        }
    }

    pub fn sets(&self) -> usize {
        self.sets
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    pub fn set(&self, set_idx: usize) -> &[CacheLine] {
        let base = set_idx * self.ways;
        &self.lines[base..base + self.ways]
    }

    fn set_mut(&mut self, set_idx: usize) -> &mut [CacheLine] {
        let base = set_idx * self.ways;
        &mut self.lines[base..base + self.ways]
    }

    pub fn line(&self, set_idx: usize, way: usize) -> &CacheLine {
        &self.set(set_idx)[way]
    }

    /// First valid way of `set_idx` holding `tag`.
    pub fn lookup(&self, set_idx: usize, tag: u32) -> Option<usize> {
        self.set(set_idx)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    pub fn touch(&mut self, set_idx: usize, way: usize) {
        let policy = &self.policy;
        let base = set_idx * self.ways;
        policy.touch(&mut self.lines[base..base + self.ways], way);
    }

    pub fn select_victim(&self, set_idx: usize) -> usize {
        self.policy.select_victim(self.set(set_idx))
    }

    /// Install `tag` into the victim way of `set_idx` and make it most recent.
    pub fn fill(&mut self, set_idx: usize, tag: u32) -> Fill {
        let way = self.select_victim(set_idx);
        let line = &mut self.set_mut(set_idx)[way];
        let evicted_tag = line.valid.then_some(line.tag);
        line.valid = true;
        line.tag = tag;
        if let Some(old) = evicted_tag {
            debug!("set {set_idx} way {way}: evict tag {old:#x} for {tag:#x}");
        }
        self.touch(set_idx, way);
        Fill { way, evicted_tag }
    }
}
