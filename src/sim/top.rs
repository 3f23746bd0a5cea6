use log::{debug, info};

use crate::base::mem::HasMemory;
use crate::cache::{CacheGeometry, CacheTagArray, ConfigError, Lru, ReplacementPolicy};
use crate::sim::config::CacheConfig;
use crate::sim::flat_mem::FlatMemory;
use crate::sim::report::{AccessReport, Outcome, ReportSink};
use crate::sim::stats::CacheStats;
use crate::sim::trace::{AccessRecord, TraceError};

/// Single-level cache in front of a flat memory. Owns every piece of state of
/// one simulation run, so independent runs never share anything.
pub struct CacheSim<P = Lru, M = FlatMemory> {
    geometry: CacheGeometry,
    tags: CacheTagArray<P>,
    mem: M,
    stats: CacheStats,
}

impl CacheSim {
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = config.geometry()?;
        Ok(Self::with_parts(geometry, Lru, FlatMemory::new()))
    }
}

impl<P: ReplacementPolicy, M: HasMemory> CacheSim<P, M> {
    pub fn with_parts(geometry: CacheGeometry, policy: P, mem: M) -> Self {
        info!(
            "cache: {} bytes, {} sets x {} ways x {}-byte blocks",
            geometry.size(),
            geometry.sets(),
            geometry.ways(),
            geometry.block_size()
        );
        Self {
            geometry,
            tags: CacheTagArray::new(&geometry, policy),
            mem,
            stats: CacheStats::default(),
        }
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn tags(&self) -> &CacheTagArray<P> {
        &self.tags
    }

    pub fn mem(&self) -> &M {
        &self.mem
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Simulate one access: decode, look up, update the set, then move data.
    pub fn access(&mut self, record: &AccessRecord) -> AccessReport {
        let addr = record.addr();
        let decoded = self.geometry.decompose(addr);
        let set_idx = decoded.set_index as usize;
        let hit_way = self.tags.lookup(set_idx, decoded.tag);

        let (outcome, data) = match record {
            // no-write-allocate: the lookup never affects a store
            AccessRecord::Store { data, .. } => match self.mem.write(addr, data) {
                Ok(()) => (Outcome::Miss, None),
                Err(err) => {
                    debug!("{}", err);
                    (Outcome::OutOfBounds, None)
                }
            },
            AccessRecord::Load { size, .. } => match self.mem.read(addr, *size as usize) {
                Err(err) => {
                    debug!("{}", err);
                    (Outcome::OutOfBounds, None)
                }
                Ok(bytes) => match hit_way {
                    Some(way) => {
                        self.tags.touch(set_idx, way);
                        (Outcome::Hit, Some(bytes))
                    }
                    None => {
                        let fill = self.tags.fill(set_idx, decoded.tag);
                        if fill.evicted_tag.is_some() {
                            self.stats.record_eviction();
                        }
                        (Outcome::Miss, Some(bytes))
                    }
                },
            },
        };

        let report = AccessReport {
            kind: record.kind(),
            addr,
            outcome,
            data,
        };
        debug!("set {} tag {:#x}: {}", set_idx, decoded.tag, report);
        self.stats.record(&report);
        report
    }

    /// Drive a whole record stream through the cache, in order, into `sink`.
    /// Stops at the first trace read failure or sink error.
    pub fn run<I, S>(&mut self, records: I, sink: &mut S) -> anyhow::Result<CacheStats>
    where
        I: IntoIterator<Item = Result<AccessRecord, TraceError>>,
        S: ReportSink + ?Sized,
    {
        for record in records {
            let report = self.access(&record?);
            sink.emit(&report)?;
        }
        sink.finish()?;
        info!(
            "done: {} accesses, {} load hits, {} load misses, {} out of bounds",
            self.stats.accesses(),
            self.stats.load_hits(),
            self.stats.load_misses(),
            self.stats.out_of_bounds()
        );
        Ok(self.stats)
    }
}
