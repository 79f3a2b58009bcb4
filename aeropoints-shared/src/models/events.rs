use serde::{Deserialize, Serialize};

/// Change notifications published by the history stores.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEvent {
    FlightSearchRecorded {
        origin: String,
        destination: String,
        timestamp: i64,
        /// True when an existing entry was moved to the front instead of added.
        refreshed: bool,
    },
    FlightHistoryCleared,
    AirportRecorded {
        code: String,
        role: String, // "origin" | "destination"
        timestamp: i64,
    },
    AirportHistoryCleared,
    /// A stored payload could not be read back and was dropped.
    HistoryDiscarded {
        key: String,
    },
}
