use aeropoints_core::iata::is_iata_code;
use aeropoints_core::{Clock, CoreResult, FlightSearch, FlightSearchRecord, KeyValueStorage, SystemClock};
use aeropoints_shared::HistoryEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::app_config::HistoryConfig;
use crate::history_log::HistoryLog;

/// Recent flight searches for one user profile, most recent first.
///
/// Construct once per session and hand it to whatever needs it. Reads and
/// clears never fail: storage problems surface as an empty history.
pub struct SearchHistoryStore<S, C = SystemClock> {
    log: HistoryLog<S>,
    clock: C,
}

impl<S: KeyValueStorage> SearchHistoryStore<S, SystemClock> {
    pub fn open(storage: S, config: &HistoryConfig) -> Self {
        Self::open_with_clock(storage, config, SystemClock)
    }
}

impl<S: KeyValueStorage, C: Clock> SearchHistoryStore<S, C> {
    pub fn open_with_clock(storage: S, config: &HistoryConfig, clock: C) -> Self {
        let log = HistoryLog::new(storage, config.storage_key.clone(), config.max_entries);
        let existing: Vec<FlightSearchRecord> = log.load();
        info!(
            "Search history '{}' opened with {} of {} entries",
            log.key(),
            existing.len(),
            log.max_entries()
        );
        Self { log, clock }
    }

    /// Record a submitted search stamped with the current time.
    ///
    /// A search equal on route, dates, cabin and passenger count replaces the
    /// older entry. Only invalid input is reported as an error.
    pub fn record(&self, search: FlightSearch) -> CoreResult<FlightSearchRecord> {
        let now = self.clock.now_millis();
        self.record_at(search, now)
    }

    /// Like [`record`](Self::record) with a caller-supplied timestamp. The
    /// stored timestamp is never older than the current newest entry.
    pub fn record_at(&self, search: FlightSearch, timestamp: i64) -> CoreResult<FlightSearchRecord> {
        let search = search.normalized()?;
        if !is_iata_code(&search.origin) || !is_iata_code(&search.destination) {
            debug!("Recording non-IATA route {} -> {}", search.origin, search.destination);
        }

        let (record, outcome) = self.log.insert_with(|newest| {
            let timestamp = newest.map_or(timestamp, |newest| timestamp.max(newest));
            FlightSearchRecord::new(search, timestamp)
        });

        if outcome.refreshed {
            debug!("Refreshed flight search ({}) in history", record.route_label());
        } else {
            info!("Added flight search ({}) to history", record.route_label());
        }
        if outcome.evicted > 0 {
            debug!("Evicted {} oldest flight search(es)", outcome.evicted);
        }

        self.log.publish(HistoryEvent::FlightSearchRecorded {
            origin: record.origin().to_string(),
            destination: record.destination().to_string(),
            timestamp: record.timestamp,
            refreshed: outcome.refreshed,
        });
        Ok(record)
    }

    pub fn list(&self) -> Vec<FlightSearchRecord> {
        self.log.load()
    }

    /// Idempotent.
    pub fn clear(&self) {
        if self.log.clear() {
            info!("Flight search history cleared");
        }
        self.log.publish(HistoryEvent::FlightHistoryCleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.log.subscribe()
    }

    pub fn max_entries(&self) -> usize {
        self.log.max_entries()
    }

    pub fn storage(&self) -> &S {
        self.log.storage()
    }
}
