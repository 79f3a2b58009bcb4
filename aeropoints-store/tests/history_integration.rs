use std::fs;
use std::sync::Arc;

use aeropoints_core::{AirportRole, AirportSelection, CabinClass, FlightSearch, ManualClock};
use aeropoints_shared::HistoryEvent;
use aeropoints_store::app_config::HistoryConfig;
use aeropoints_store::{AirportHistoryStore, FileStorage, MemoryStorage, SearchHistoryStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("aeropoints_store=debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_history_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = HistoryConfig::flight_default();

    {
        let store = SearchHistoryStore::open(FileStorage::new(dir.path()).unwrap(), &config);
        store
            .record(
                FlightSearch::new("JFK", "LHR", "2024-12-25")
                    .with_return_date("2025-01-02")
                    .with_cabin_class(CabinClass::Business)
                    .with_cities("New York", "London"),
            )
            .unwrap();
        store.record(FlightSearch::new("LAX", "NRT", "2024-12-26")).unwrap();
    }

    let reopened = SearchHistoryStore::open(FileStorage::new(dir.path()).unwrap(), &config);
    let history = reopened.list();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].origin(), "LAX");
    assert_eq!(history[1].search.destination_city.as_deref(), Some("London"));
    assert_eq!(history[1].search.cabin_class, CabinClass::Business);

    let raw = fs::read_to_string(dir.path().join("flight_search_history.json")).unwrap();
    assert!(raw.contains("\"departureDate\":\"2024-12-25\""));
    assert!(raw.contains("\"cabinClass\":\"business\""));
}

#[test]
fn test_corrupted_file_reads_as_empty_and_is_dropped() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flight_search_history.json");
    fs::write(&path, "{not json").unwrap();

    let store = SearchHistoryStore::open(FileStorage::new(dir.path()).unwrap(), &HistoryConfig::flight_default());
    assert!(store.list().is_empty());
    assert!(!path.exists());

    // Still usable afterwards
    store.record(FlightSearch::new("SFO", "HNL", "2024-07-01")).unwrap();
    assert_eq!(store.list().len(), 1);
}

#[test]
fn test_wrong_shape_is_treated_as_corruption() {
    let storage = Arc::new(MemoryStorage::new());
    storage.insert_raw("flight_search_history", r#"{"origin":"JFK"}"#);

    let store = SearchHistoryStore::open(storage.clone(), &HistoryConfig::flight_default());
    let mut events = store.subscribe();
    assert!(store.list().is_empty());
    assert!(!storage.contains_key("flight_search_history"));
    // Discarded at open(), so nothing is left to discard on list()
    assert!(events.try_recv().is_err());

    storage.insert_raw("flight_search_history", r#"[{"origin":"JFK","destination":"LHR","departureDate":"2024-12-25","passengers":0,"timestamp":1}]"#);
    assert!(store.list().is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        HistoryEvent::HistoryDiscarded { key: "flight_search_history".to_string() }
    );
}

#[test]
fn test_unavailable_storage_fails_soft() {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    let store = SearchHistoryStore::open(storage.clone(), &HistoryConfig::flight_default());
    store.record(FlightSearch::new("JFK", "LHR", "2024-12-25")).unwrap();

    storage.disable();
    assert!(store.list().is_empty());
    assert!(store.record(FlightSearch::new("LAX", "NRT", "2024-12-26")).is_ok());
    store.clear();

    // Nothing was lost or changed while storage was off
    storage.enable();
    let history = store.list();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].origin(), "JFK");
}

/// Deterministic mix of repeated and fresh searches checked against a
/// straightforward reference model.
#[test]
fn test_bound_and_dedup_against_model() {
    let bound = 7;
    let clock = Arc::new(ManualClock::new(1_000));
    let config = HistoryConfig {
        max_entries: bound,
        storage_key: "flight_search_history".to_string(),
    };
    let store = SearchHistoryStore::open_with_clock(MemoryStorage::new(), &config, clock.clone());

    let airports = ["JFK", "LHR", "LAX", "NRT", "SFO", "CDG"];
    let mut model: Vec<(String, String, u32)> = Vec::new();
    let mut seed: u64 = 42;

    for _ in 0..200 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let origin = airports[(seed >> 33) as usize % airports.len()];
        let destination = airports[(seed >> 41) as usize % airports.len()];
        let passengers = 1 + ((seed >> 50) % 2) as u32;

        store
            .record(FlightSearch::new(origin, destination, "2024-12-25").with_passengers(passengers))
            .unwrap();
        if seed % 3 == 0 {
            clock.advance(1);
        }

        let entry = (origin.to_string(), destination.to_string(), passengers);
        model.retain(|e| e != &entry);
        model.insert(0, entry);
        model.truncate(bound);

        let history = store.list();
        assert!(history.len() <= bound);
        let actual: Vec<(String, String, u32)> = history
            .iter()
            .map(|r| (r.origin().to_string(), r.destination().to_string(), r.search.passengers))
            .collect();
        assert_eq!(actual, model);
        assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}

#[test]
fn test_airport_and_flight_histories_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let flights = SearchHistoryStore::open(storage.clone(), &HistoryConfig::flight_default());
    let airports = AirportHistoryStore::open(storage, &HistoryConfig::airport_default());

    flights.record(FlightSearch::new("JFK", "LHR", "2024-12-25")).unwrap();
    airports
        .record(AirportSelection::new("JFK", AirportRole::Origin).with_city("New York"))
        .unwrap();

    flights.clear();
    assert!(flights.list().is_empty());
    assert_eq!(airports.list_by_role(AirportRole::Origin).len(), 1);
    assert!(dir.path().join("airport_search_history.json").exists());
}
