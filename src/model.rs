//! Core data types for the TalsimResult → SOS-T conversion.
//!
//! This module defines the shared domain model imported by all other modules:
//! the injected constant tables, the per-request parameter map, and the error
//! taxonomy. It contains no I/O.

use serde::Deserialize;
use thiserror::Error;

use crate::transport::TransportError;

// ---------------------------------------------------------------------------
// Constant tables
// ---------------------------------------------------------------------------

/// Position used for every station, as (longitude, latitude, altitude).
///
/// The values are written verbatim into requests, so they are kept as the
/// exact strings the service should receive rather than as floats.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StationPosition {
    pub longitude_deg: String,
    pub latitude_deg: String,
    pub altitude_m: String,
}

impl Default for StationPosition {
    fn default() -> Self {
        // Provisional: TalsimResult carries no spatial reference yet.
        Self {
            longitude_deg: "7.369676".to_string(),
            latitude_deg: "51.14431".to_string(),
            altitude_m: "0.0".to_string(),
        }
    }
}

/// Values that do not come from the document but are written into every
/// request. Injected into the extractor so provisional values live in one
/// place and can be overridden from the `[constants]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionConstants {
    pub station_position: StationPosition,
    pub feature_of_interest_sampling: String,
    pub feature_of_interest_sampled: String,
    pub offering_name: String,
    pub offering_value: String,
    pub input_property_name: String,
    pub input_property_value: String,
}

impl Default for ConversionConstants {
    fn default() -> Self {
        Self {
            station_position: StationPosition::default(),
            feature_of_interest_sampling: "foi/test/sampling".to_string(),
            feature_of_interest_sampled: "foi/test/sampled".to_string(),
            offering_name: "TalsimResult".to_string(),
            offering_value: "TalsimResult".to_string(),
            input_property_name: "Volumen".to_string(),
            input_property_value: "Volumen".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter map
// ---------------------------------------------------------------------------

/// Placeholder → substitution value, in insertion order.
///
/// Inserting an existing placeholder replaces its value in place, so the
/// order reflects the first time each placeholder was set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: Vec<(&'static str, String)>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, placeholder: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == placeholder) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((placeholder, value)),
        }
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == placeholder)
            .map(|(_, value)| value.as_str())
    }

    pub fn remove(&mut self, placeholder: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| *key == placeholder)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Which SOS-T operation a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InsertSensor,
    InsertObservation,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::InsertSensor => write!(f, "InsertSensor"),
            Operation::InsertObservation => write!(f, "InsertObservation"),
        }
    }
}

/// Errors that can arise while extracting, building, or submitting requests.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The XML input could not be parsed into a tree at all.
    #[error("XML parse error: {0}")]
    Xml(String),
    /// An expected child node, attribute, or document-level element is missing.
    #[error("no {kind} '{name}' found in '{scope}'")]
    NotFound {
        kind: &'static str,
        name: String,
        scope: String,
    },
    /// A structural precondition of the TalsimResult layout is violated.
    #[error("malformed TalsimResult: {0}")]
    MalformedDocument(String),
    /// An event date/time pair cannot be composed into a timestamp.
    #[error("malformed timestamp (date '{date}', time '{time}'): {reason}")]
    MalformedTimestamp {
        date: String,
        time: String,
        reason: String,
    },
    /// The service answered without the expected success marker.
    #[error("{operation} request failed, service responded: {body}")]
    InsertFailure { operation: Operation, body: String },
    /// The HTTP exchange itself did not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ConversionError {
    pub(crate) fn not_found(kind: &'static str, name: &str, scope: &str) -> Self {
        ConversionError::NotFound {
            kind,
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
