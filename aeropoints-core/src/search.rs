use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::iata::normalize_airport_code;
use crate::{CoreError, CoreResult};

/// Fare tier requested by the search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn label(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::PremiumEconomy => "Premium Economy",
            CabinClass::Business => "Business",
            CabinClass::First => "First",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A flight search as submitted by the search form, before it is stamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearch {
    pub origin: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<String>,
    /// ISO 8601 date. Kept as given; only parsed for display.
    pub departure_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(default)]
    pub cabin_class: CabinClass,
    pub passengers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_program: Option<String>,
}

impl FlightSearch {
    /// One-way economy search for a single passenger.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            origin_city: None,
            destination_city: None,
            departure_date: departure_date.into(),
            return_date: None,
            cabin_class: CabinClass::Economy,
            passengers: 1,
            mileage_program: None,
        }
    }

    pub fn with_return_date(mut self, return_date: impl Into<String>) -> Self {
        self.return_date = Some(return_date.into());
        self
    }

    pub fn with_cabin_class(mut self, cabin_class: CabinClass) -> Self {
        self.cabin_class = cabin_class;
        self
    }

    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn with_cities(mut self, origin_city: impl Into<String>, destination_city: impl Into<String>) -> Self {
        self.origin_city = Some(origin_city.into());
        self.destination_city = Some(destination_city.into());
        self
    }

    pub fn with_mileage_program(mut self, program: impl Into<String>) -> Self {
        self.mileage_program = Some(program.into());
        self
    }

    /// Canonicalize codes and optional text, rejecting searches that cannot be
    /// keyed (missing airports or no passengers).
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.origin = normalize_airport_code(&self.origin)
            .ok_or_else(|| CoreError::InvalidInput("origin is empty".to_string()))?;
        self.destination = normalize_airport_code(&self.destination)
            .ok_or_else(|| CoreError::InvalidInput("destination is empty".to_string()))?;
        if self.passengers == 0 {
            return Err(CoreError::InvalidInput("passengers must be at least 1".to_string()));
        }
        self.origin_city = non_blank(self.origin_city);
        self.destination_city = non_blank(self.destination_city);
        self.return_date = non_blank(self.return_date);
        self.mileage_program = non_blank(self.mileage_program);
        Ok(self)
    }

    pub fn key(&self) -> SearchKey<'_> {
        SearchKey {
            origin: &self.origin,
            destination: &self.destination,
            departure_date: &self.departure_date,
            return_date: self.return_date.as_deref(),
            cabin_class: self.cabin_class,
            passengers: self.passengers,
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fields that decide whether two searches are the same search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchKey<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub departure_date: &'a str,
    pub return_date: Option<&'a str>,
    pub cabin_class: CabinClass,
    pub passengers: u32,
}

/// A search as persisted in history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlightSearchRecord {
    #[serde(flatten)]
    pub search: FlightSearch,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl FlightSearchRecord {
    pub fn new(search: FlightSearch, timestamp: i64) -> Self {
        Self { search, timestamp }
    }

    pub fn key(&self) -> SearchKey<'_> {
        self.search.key()
    }

    pub fn origin(&self) -> &str {
        &self.search.origin
    }

    pub fn destination(&self) -> &str {
        &self.search.destination
    }

    pub fn is_round_trip(&self) -> bool {
        self.search.is_round_trip()
    }

    /// Check a record read back from storage.
    pub fn validate(&self) -> CoreResult<()> {
        if self.search.origin.trim().is_empty() || self.search.destination.trim().is_empty() {
            return Err(CoreError::InvalidInput("record without origin or destination".to_string()));
        }
        if self.search.passengers == 0 {
            return Err(CoreError::InvalidInput("record without passengers".to_string()));
        }
        Ok(())
    }

    pub fn route_label(&self) -> String {
        format!("{} → {}", self.search.origin, self.search.destination)
    }

    /// One-line summary for the recent searches dropdown,
    /// e.g. `Dec 25 - Jan 2 · Business · 2 passengers`.
    pub fn describe(&self) -> String {
        let mut dates = display_date(&self.search.departure_date);
        if let Some(return_date) = &self.search.return_date {
            dates.push_str(" - ");
            dates.push_str(&display_date(return_date));
        }
        let plural = if self.search.passengers == 1 { "" } else { "s" };
        format!(
            "{} · {} · {} passenger{}",
            dates, self.search.cabin_class, self.search.passengers, plural
        )
    }
}

fn display_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%b %-d").to_string(),
        Err(_) => raw.to_string(),
    }
}
