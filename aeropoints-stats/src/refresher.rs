use std::sync::Arc;
use std::time::Duration;

use aeropoints_core::{Clock, KeyValueStorage, SystemClock};
use aeropoints_shared::HistoryEvent;
use aeropoints_store::app_config::StatsConfig;
use aeropoints_store::SearchHistoryStore;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::snapshot::{SearchStatsSnapshot, StatsLimits};

/// Keeps a [`SearchStatsSnapshot`] current for the statistics panel.
///
/// Recomputes from the store on every interval tick and whenever the store
/// reports a change. Every pass starts from a fresh `list()`; nothing is
/// carried over from the previous snapshot.
pub struct StatsRefresher<S, C> {
    store: Arc<SearchHistoryStore<S, C>>,
    limits: StatsLimits,
    interval: Duration,
    clock: Arc<dyn Clock>,
}

/// Stops the refresher when shut down or dropped.
pub struct RefresherHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl<S, C> StatsRefresher<S, C>
where
    S: KeyValueStorage + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<SearchHistoryStore<S, C>>, config: &StatsConfig) -> Self {
        Self {
            store,
            limits: StatsLimits::from(config),
            interval: Duration::from_secs(config.refresh_interval_secs.max(1)),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn compute(&self) -> SearchStatsSnapshot {
        let history = self.store.list();
        SearchStatsSnapshot::compute(&history, self.limits, self.clock.now_millis())
    }

    /// Start refreshing on the current tokio runtime. The receiver already
    /// holds a snapshot when this returns.
    pub fn spawn(self) -> (watch::Receiver<SearchStatsSnapshot>, RefresherHandle) {
        // Subscribe before spawning so changes made right after this call are seen
        let events = self.store.subscribe();
        let (tx, rx) = watch::channel(self.compute());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(events, tx, shutdown_rx));
        (
            rx,
            RefresherHandle {
                shutdown: Some(shutdown_tx),
                task,
            },
        )
    }

    async fn run(
        self,
        mut events: broadcast::Receiver<HistoryEvent>,
        tx: watch::Sender<SearchStatsSnapshot>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut events_open = true;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; spawn() already computed it
        ticker.tick().await;

        info!("Stats refresher started, interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Stats refresher shutting down");
                    break;
                }
                _ = ticker.tick() => {}
                event = events.recv(), if events_open => match event {
                    Ok(event) => debug!("Refreshing stats after {:?}", event),
                    Err(RecvError::Lagged(skipped)) => debug!("Stats refresher skipped {} history events", skipped),
                    Err(RecvError::Closed) => {
                        events_open = false;
                        continue;
                    }
                },
            }

            if tx.send(self.compute()).is_err() {
                info!("No stats subscribers left, stopping refresher");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeropoints_core::{FlightSearch, ManualClock};
    use aeropoints_store::app_config::HistoryConfig;
    use aeropoints_store::MemoryStorage;

    fn config(refresh_interval_secs: u64) -> StatsConfig {
        StatsConfig {
            refresh_interval_secs,
            ..StatsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_refreshes_on_record() {
        let store = Arc::new(SearchHistoryStore::open(MemoryStorage::new(), &HistoryConfig::flight_default()));
        let (mut rx, handle) = StatsRefresher::new(store.clone(), &config(3_600)).spawn();
        assert!(rx.borrow().is_empty());

        store.record(FlightSearch::new("JFK", "LHR", "2024-12-25")).unwrap();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("refresh timed out")
            .unwrap();
        assert_eq!(rx.borrow().total_searches, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_tick() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(SearchHistoryStore::open(storage.clone(), &HistoryConfig::flight_default()));
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let (mut rx, handle) = StatsRefresher::new(store, &config(60))
            .with_clock(clock.clone())
            .spawn();
        tokio::task::yield_now().await;

        // Written behind the store's back, so only the timer can notice
        storage.insert_raw(
            "flight_search_history",
            r#"[{"origin":"SFO","destination":"HNL","departureDate":"2024-07-01","passengers":1,"timestamp":1700000000000}]"#,
        );
        clock.advance(90_000);

        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.total_searches, 1);
        assert_eq!(snapshot.top_destinations[0].code, "HNL");
        assert_eq!(snapshot.activity_lines(), vec!["SFO → HNL · 1m ago".to_string()]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_stops_when_receivers_dropped() {
        let store = Arc::new(SearchHistoryStore::open(MemoryStorage::new(), &HistoryConfig::flight_default()));
        let (rx, handle) = StatsRefresher::new(store.clone(), &config(3_600)).spawn();
        drop(rx);

        store.clear();
        tokio::time::timeout(Duration::from_secs(5), handle.task)
            .await
            .expect("refresher did not stop")
            .unwrap();
    }
}
