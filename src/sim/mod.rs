pub mod config;
pub mod flat_mem;
pub mod report;
pub mod stats;
pub mod top;
pub mod trace;
