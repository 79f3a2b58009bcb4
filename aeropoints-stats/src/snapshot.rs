use aeropoints_core::{time_ago, FlightSearchRecord};
use aeropoints_store::app_config::StatsConfig;
use serde::Serialize;

use crate::aggregator::{SearchStatsAggregator, StatItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsLimits {
    pub top: usize,
    pub recent: usize,
}

impl Default for StatsLimits {
    fn default() -> Self {
        Self {
            top: SearchStatsAggregator::DEFAULT_TOP_LIMIT,
            recent: SearchStatsAggregator::DEFAULT_RECENT_LIMIT,
        }
    }
}

impl From<&StatsConfig> for StatsLimits {
    fn from(config: &StatsConfig) -> Self {
        Self {
            top: config.top_limit,
            recent: config.recent_limit,
        }
    }
}

/// Everything the statistics panel shows, derived from one history read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatsSnapshot {
    pub total_searches: usize,
    pub top_destinations: Vec<StatItem>,
    pub top_origins: Vec<StatItem>,
    pub recent_activity: Vec<FlightSearchRecord>,
    /// Epoch milliseconds the snapshot was built at.
    pub computed_at: i64,
}

impl SearchStatsSnapshot {
    pub fn compute(history: &[FlightSearchRecord], limits: StatsLimits, now: i64) -> Self {
        Self {
            total_searches: SearchStatsAggregator::total_count(history),
            top_destinations: SearchStatsAggregator::top_destinations(history, limits.top),
            top_origins: SearchStatsAggregator::top_origins(history, limits.top),
            recent_activity: SearchStatsAggregator::recent_activity(history, limits.recent),
            computed_at: now,
        }
    }

    pub fn empty(now: i64) -> Self {
        Self::compute(&[], StatsLimits::default(), now)
    }

    /// No history yet; the panel should be hidden rather than show zeros.
    pub fn is_empty(&self) -> bool {
        self.total_searches == 0
    }

    /// `JFK → LHR · 5m ago` lines for the recent activity list.
    pub fn activity_lines(&self) -> Vec<String> {
        self.recent_activity
            .iter()
            .map(|record| format!("{} · {}", record.route_label(), time_ago(record.timestamp, self.computed_at)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeropoints_core::FlightSearch;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_snapshot_from_history() {
        let history = vec![
            FlightSearchRecord::new(FlightSearch::new("LAX", "NRT", "2024-12-26"), NOW - 30_000),
            FlightSearchRecord::new(FlightSearch::new("JFK", "LHR", "2024-12-25"), NOW - 2 * 3_600_000),
        ];
        let snapshot = SearchStatsSnapshot::compute(&history, StatsLimits::default(), NOW);

        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.total_searches, 2);
        assert_eq!(snapshot.top_origins[0].code, "LAX");
        assert_eq!(snapshot.top_destinations.len(), 2);
        assert_eq!(
            snapshot.activity_lines(),
            vec!["LAX → NRT · just now".to_string(), "JFK → LHR · 2h ago".to_string()]
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = SearchStatsSnapshot::empty(NOW);
        assert!(snapshot.is_empty());
        assert!(snapshot.top_destinations.is_empty());
        assert!(snapshot.activity_lines().is_empty());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalSearches"], 0);
    }

    #[test]
    fn test_limits_from_config() {
        let limits = StatsLimits::from(&StatsConfig {
            top_limit: 2,
            recent_limit: 1,
            refresh_interval_secs: 30,
        });
        assert_eq!(limits, StatsLimits { top: 2, recent: 1 });
    }
}
