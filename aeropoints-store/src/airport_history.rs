use aeropoints_core::{AirportRole, AirportSelection, AirportVisit, Clock, CoreResult, KeyValueStorage, SystemClock};
use aeropoints_shared::HistoryEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::app_config::HistoryConfig;
use crate::history_log::HistoryLog;

/// Airports recently picked in the origin and destination fields.
pub struct AirportHistoryStore<S, C = SystemClock> {
    log: HistoryLog<S>,
    clock: C,
}

impl<S: KeyValueStorage> AirportHistoryStore<S, SystemClock> {
    pub fn open(storage: S, config: &HistoryConfig) -> Self {
        Self::open_with_clock(storage, config, SystemClock)
    }
}

impl<S: KeyValueStorage, C: Clock> AirportHistoryStore<S, C> {
    pub fn open_with_clock(storage: S, config: &HistoryConfig, clock: C) -> Self {
        Self {
            log: HistoryLog::new(storage, config.storage_key.clone(), config.max_entries),
            clock,
        }
    }

    pub fn record(&self, selection: AirportSelection) -> CoreResult<AirportVisit> {
        let now = self.clock.now_millis();
        // Validate before touching storage
        let visit = selection.into_visit(now)?;

        let (visit, outcome) = self.log.insert_with(|newest| {
            let timestamp = newest.map_or(visit.timestamp, |newest| visit.timestamp.max(newest));
            AirportVisit { timestamp, ..visit }
        });
        if outcome.refreshed {
            debug!("Refreshed {} ({}) in airport history", visit.code, visit.role);
        } else {
            info!("Added {} ({}) to airport search history", visit.code, visit.role);
        }

        self.log.publish(HistoryEvent::AirportRecorded {
            code: visit.code.clone(),
            role: visit.role.as_str().to_string(),
            timestamp: visit.timestamp,
        });
        Ok(visit)
    }

    pub fn list(&self) -> Vec<AirportVisit> {
        self.log.load()
    }

    /// Recent picks for one field, most recent first.
    pub fn list_by_role(&self, role: AirportRole) -> Vec<AirportVisit> {
        self.list().into_iter().filter(|visit| visit.role == role).collect()
    }

    pub fn clear(&self) {
        if self.log.clear() {
            info!("Airport search history cleared");
        }
        self.log.publish(HistoryEvent::AirportHistoryCleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.log.subscribe()
    }
}
