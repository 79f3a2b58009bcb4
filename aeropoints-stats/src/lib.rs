pub mod aggregator;
pub mod snapshot;
pub mod refresher;

pub use aggregator::{SearchStatsAggregator, StatItem};
pub use snapshot::{SearchStatsSnapshot, StatsLimits};
pub use refresher::{RefresherHandle, StatsRefresher};
