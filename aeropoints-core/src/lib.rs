pub mod search;
pub mod repository;
pub mod iata;
pub mod clock;
pub mod time_ago;

pub use clock::{Clock, ManualClock, SystemClock};
pub use iata::{AirportRole, AirportSelection, AirportVisit};
pub use repository::{KeyValueStorage, StorageError};
pub use search::{CabinClass, FlightSearch, FlightSearchRecord, SearchKey};
pub use time_ago::time_ago;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
