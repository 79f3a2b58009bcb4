use std::collections::HashMap;

use aeropoints_core::FlightSearchRecord;
use serde::{Deserialize, Serialize};

/// How often a code appears in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatItem {
    pub code: String,
    /// Most recent city name recorded for this code, if any.
    pub city: Option<String>,
    pub count: usize,
}

/// Summary views over a history snapshot. Input is expected most recent
/// first, as returned by `SearchHistoryStore::list`.
pub struct SearchStatsAggregator;

impl SearchStatsAggregator {
    pub const DEFAULT_TOP_LIMIT: usize = 5;
    pub const DEFAULT_RECENT_LIMIT: usize = 3;

    /// Destinations by search count. Equal counts keep the more recently
    /// searched code first.
    pub fn top_destinations(history: &[FlightSearchRecord], limit: usize) -> Vec<StatItem> {
        rank_by(history, limit, |r| (&r.search.destination, r.search.destination_city.as_deref()))
    }

    pub fn top_origins(history: &[FlightSearchRecord], limit: usize) -> Vec<StatItem> {
        rank_by(history, limit, |r| (&r.search.origin, r.search.origin_city.as_deref()))
    }

    pub fn recent_activity(history: &[FlightSearchRecord], limit: usize) -> Vec<FlightSearchRecord> {
        history.iter().take(limit).cloned().collect()
    }

    pub fn total_count(history: &[FlightSearchRecord]) -> usize {
        history.len()
    }
}

fn rank_by<'a, F>(history: &'a [FlightSearchRecord], limit: usize, field: F) -> Vec<StatItem>
where
    F: Fn(&'a FlightSearchRecord) -> (&'a String, Option<&'a str>),
{
    // First-seen order is recency order
    let mut items: Vec<StatItem> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in history {
        let (code, city) = field(record);
        match index.get(code.as_str()) {
            Some(&i) => {
                let item = &mut items[i];
                item.count += 1;
                if item.city.is_none() {
                    item.city = city.map(str::to_string);
                }
            }
            None => {
                index.insert(code.as_str(), items.len());
                items.push(StatItem {
                    code: code.clone(),
                    city: city.map(str::to_string),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable, which preserves the recency tie-break
    items.sort_by(|a, b| b.count.cmp(&a.count));
    items.truncate(limit);
    items
}
