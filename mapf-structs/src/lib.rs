pub mod config;
pub mod stats;

pub use config::{DestroyStrategy, LnsConfig, RepairStrategy, SizeMode};
pub use stats::{IterationStat, RunSummary};
