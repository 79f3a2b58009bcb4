use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ============================================================================
// Airport codes
// ============================================================================

/// Trim and uppercase an airport/city code. Returns `None` when nothing is left.
///
/// Codes are not checked against a registry: metro codes (e.g. `NYC`) and
/// four-letter ICAO identifiers are stored the same way as IATA codes.
pub fn normalize_airport_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// True for a three-letter alphabetic code such as `JFK`.
pub fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic())
}

// ============================================================================
// Airport picks from the autocomplete fields
// ============================================================================

/// Which search field an airport was picked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AirportRole {
    Origin,
    Destination,
}

impl AirportRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AirportRole::Origin => "origin",
            AirportRole::Destination => "destination",
        }
    }
}

impl fmt::Display for AirportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportSelection {
    pub code: String,
    pub city: Option<String>,
    pub name: Option<String>,
    pub role: AirportRole,
}

impl AirportSelection {
    pub fn new(code: impl Into<String>, role: AirportRole) -> Self {
        Self {
            code: code.into(),
            city: None,
            name: None,
            role,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn into_visit(self, timestamp: i64) -> CoreResult<AirportVisit> {
        let code = normalize_airport_code(&self.code)
            .ok_or_else(|| CoreError::InvalidInput("airport code is empty".to_string()))?;
        Ok(AirportVisit {
            code,
            city: self.city.filter(|c| !c.trim().is_empty()),
            name: self.name.filter(|n| !n.trim().is_empty()),
            role: self.role,
            timestamp,
        })
    }
}

/// A persisted airport pick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AirportVisit {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub role: AirportRole,
    pub timestamp: i64,
}

impl AirportVisit {
    pub fn validate(&self) -> CoreResult<()> {
        if self.code.trim().is_empty() {
            return Err(CoreError::InvalidInput("airport visit without code".to_string()));
        }
        Ok(())
    }

    /// `JFK - New York (John F. Kennedy International)`, degrading gracefully
    /// when the city or name were not captured.
    pub fn display_label(&self) -> String {
        match (&self.city, &self.name) {
            (Some(city), Some(name)) => format!("{} - {} ({})", self.code, city, name),
            (Some(city), None) => format!("{} - {}", self.code, city),
            (None, Some(name)) => format!("{} - {}", self.code, name),
            (None, None) => self.code.clone(),
        }
    }
}
