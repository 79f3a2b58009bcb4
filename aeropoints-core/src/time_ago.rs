const SECOND: i64 = 1_000;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Relative age of `timestamp` as seen at `now`, both in epoch milliseconds.
///
/// Buckets: under a minute is "just now", then whole minutes, hours, days,
/// and finally weeks with no upper cap. Timestamps in the future read as
/// "just now".
pub fn time_ago(timestamp: i64, now: i64) -> String {
    let elapsed = now.saturating_sub(timestamp).max(0);

    if elapsed < MINUTE {
        "just now".to_string()
    } else if elapsed < HOUR {
        format!("{}m ago", elapsed / MINUTE)
    } else if elapsed < DAY {
        format!("{}h ago", elapsed / HOUR)
    } else if elapsed < WEEK {
        format!("{}d ago", elapsed / DAY)
    } else {
        format!("{}w ago", elapsed / WEEK)
    }
}
