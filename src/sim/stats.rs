use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::sim::report::{AccessReport, Outcome};
use crate::sim::trace::AccessKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    accesses: u64,
    loads: u64,
    stores: u64,
    load_hits: u64,
    load_misses: u64,
    store_misses: u64,
    out_of_bounds: u64,
    evictions: u64,
}

impl CacheStats {
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn loads(&self) -> u64 {
        self.loads
    }

    pub fn stores(&self) -> u64 {
        self.stores
    }

    pub fn load_hits(&self) -> u64 {
        self.load_hits
    }

    pub fn load_misses(&self) -> u64 {
        self.load_misses
    }

    pub fn store_misses(&self) -> u64 {
        self.store_misses
    }

    pub fn out_of_bounds(&self) -> u64 {
        self.out_of_bounds
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Fraction of in-bounds loads that hit, or `None` before the first one.
    pub fn load_hit_rate(&self) -> Option<f64> {
        let classified = self.load_hits + self.load_misses;
        (classified > 0).then(|| self.load_hits as f64 / classified as f64)
    }

    pub fn record(&mut self, report: &AccessReport) {
        self.accesses = self.accesses.saturating_add(1);
        match report.kind {
            AccessKind::Load => self.loads = self.loads.saturating_add(1),
            AccessKind::Store => self.stores = self.stores.saturating_add(1),
        }
        match (report.kind, report.outcome) {
            (_, Outcome::OutOfBounds) => self.out_of_bounds = self.out_of_bounds.saturating_add(1),
            (AccessKind::Load, Outcome::Hit) => self.load_hits = self.load_hits.saturating_add(1),
            (AccessKind::Load, Outcome::Miss) => {
                self.load_misses = self.load_misses.saturating_add(1)
            }
            (AccessKind::Store, _) => self.store_misses = self.store_misses.saturating_add(1),
        }
    }

    pub fn record_eviction(&mut self) {
        self.evictions = self.evictions.saturating_add(1);
    }
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "accesses:      {}", self.accesses)?;
        writeln!(
            f,
            "loads:         {} ({} hit, {} miss)",
            self.loads, self.load_hits, self.load_misses
        )?;
        writeln!(f, "stores:        {}", self.stores)?;
        writeln!(f, "out of bounds: {}", self.out_of_bounds)?;
        writeln!(f, "evictions:     {}", self.evictions)?;
        match self.load_hit_rate() {
            Some(rate) => write!(f, "load hit rate: {:.2}%", rate * 100.0),
            None => write!(f, "load hit rate: n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kind: AccessKind, outcome: Outcome) -> AccessReport {
        AccessReport {
            kind,
            addr: 0,
            outcome,
            data: None,
        }
    }

    #[test]
    fn counts_by_kind_and_outcome() {
        let mut stats = CacheStats::default();
        stats.record(&report(AccessKind::Load, Outcome::Miss));
        stats.record(&report(AccessKind::Load, Outcome::Hit));
        stats.record(&report(AccessKind::Load, Outcome::Hit));
        stats.record(&report(AccessKind::Store, Outcome::Miss));
        stats.record(&report(AccessKind::Store, Outcome::OutOfBounds));
        stats.record_eviction();

        assert_eq!(stats.accesses(), 5);
        assert_eq!(stats.loads(), 3);
        assert_eq!(stats.stores(), 2);
        assert_eq!(stats.load_hits(), 2);
        assert_eq!(stats.load_misses(), 1);
        assert_eq!(stats.store_misses(), 1);
        assert_eq!(stats.out_of_bounds(), 1);
        assert_eq!(stats.evictions(), 1);
        let rate = stats.load_hit_rate().unwrap();
        assert!((rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn hit_rate_is_undefined_without_loads() {
        let mut stats = CacheStats::default();
        assert_eq!(stats.load_hit_rate(), None);
        stats.record(&report(AccessKind::Store, Outcome::Miss));
        assert_eq!(stats.load_hit_rate(), None);
        assert!(stats.to_string().ends_with("n/a"));
    }

}
