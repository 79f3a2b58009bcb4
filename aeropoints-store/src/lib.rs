pub mod app_config;
pub mod memory_storage;
pub mod file_storage;
pub mod history_log;
pub mod search_history;
pub mod airport_history;

pub use airport_history::AirportHistoryStore;
pub use file_storage::FileStorage;
pub use history_log::{HistoryEntry, HistoryLog, InsertOutcome};
pub use memory_storage::MemoryStorage;
pub use search_history::SearchHistoryStore;
