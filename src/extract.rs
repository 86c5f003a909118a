//! Parameter extraction: TalsimResult → placeholder values.
//!
//! Both request kinds go through one `ParameterExtractor::extract` call,
//! parameterized by an `ExtractionContext`: the whole document for the
//! InsertSensor request, or one header/event pair for an InsertObservation
//! request. Constant values come from the injected `ConversionConstants`.

use chrono::{SecondsFormat, TimeZone, Utc};

use crate::catalog::{self, ObservableProperty};
use crate::document::{Event, Header, SimulationDocument};
use crate::logging::{self, Stage};
use crate::model::{ConversionConstants, ConversionError, ParameterMap, Result};
use crate::template::placeholders;

/// What a parameter map is being built for.
#[derive(Debug, Clone, Copy)]
pub enum ExtractionContext<'c> {
    /// InsertSensor: every series of the document.
    Document(&'c SimulationDocument),
    /// InsertObservation: one event of one series.
    Event {
        header: &'c Header,
        event: Event<'c>,
        time_zone: &'c str,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ParameterExtractor {
    constants: ConversionConstants,
}

impl ParameterExtractor {
    pub fn new(constants: ConversionConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &ConversionConstants {
        &self.constants
    }

    /// Build a fresh parameter map for `context`.
    pub fn extract(&self, context: ExtractionContext<'_>) -> Result<ParameterMap> {
        match context {
            ExtractionContext::Document(doc) => self.sensor_parameters(doc),
            ExtractionContext::Event {
                header,
                event,
                time_zone,
            } => self.observation_parameters(header, event, time_zone),
        }
    }

    pub fn extract_sensor_parameters(&self, doc: &SimulationDocument) -> Result<ParameterMap> {
        self.extract(ExtractionContext::Document(doc))
    }

    pub fn extract_observation_parameters(
        &self,
        header: &Header,
        event: Event<'_>,
        time_zone: &str,
    ) -> Result<ParameterMap> {
        self.extract(ExtractionContext::Event {
            header,
            event,
            time_zone,
        })
    }

    fn sensor_parameters(&self, doc: &SimulationDocument) -> Result<ParameterMap> {
        let series = doc.series();
        if series.is_empty() {
            return Err(ConversionError::MalformedDocument(
                "document contains no series".to_string(),
            ));
        }

        let headers = series
            .iter()
            .map(|s| s.header())
            .collect::<Result<Vec<_>>>()?;
        let station_name = &headers[0].station_name;

        let mut parameters = ParameterMap::new();
        for (s, header) in series.iter().zip(&headers) {
            let property = resolve_property(header, s.index);
            parameters.insert(property.placeholders.name, property.name);
            parameters.insert(property.placeholders.value, property.value);
            parameters.insert(property.placeholders.unit, header.units.as_str());

            if header.station_name != *station_name {
                // Only the first station is registered; multi-station documents
                // are an open product question.
                logging::warn(
                    Stage::Sensor,
                    Some(&series_label(s.index, header)),
                    &format!(
                        "station '{}' differs from first series station '{}'; registering '{}' only",
                        header.station_name, station_name, station_name
                    ),
                );
            }
        }

        let c = &self.constants;
        parameters.insert(placeholders::INPUT_NAME, c.input_property_name.as_str());
        parameters.insert(placeholders::INPUT_VALUE, c.input_property_value.as_str());

        parameters.insert(placeholders::STATION_IDENTIFIER, station_name.as_str());

        parameters.insert(
            placeholders::POSITION_LON_IN_DEG,
            c.station_position.longitude_deg.as_str(),
        );
        parameters.insert(
            placeholders::POSITION_LAT_IN_DEG,
            c.station_position.latitude_deg.as_str(),
        );
        parameters.insert(
            placeholders::POSITION_ALT_IN_METERS,
            c.station_position.altitude_m.as_str(),
        );

        parameters.insert(
            placeholders::FEATURE_OF_INTEREST_IDENTIFIER,
            c.feature_of_interest_sampling.as_str(),
        );
        parameters.insert(placeholders::OFFERING_IDENTIFIER_NAME, c.offering_name.as_str());
        parameters.insert(placeholders::OFFERING_IDENTIFIER_VALUE, c.offering_value.as_str());

        Ok(parameters)
    }

    fn observation_parameters(
        &self,
        header: &Header,
        event: Event<'_>,
        _time_zone: &str,
    ) -> Result<ParameterMap> {
        let c = &self.constants;
        let mut parameters = ParameterMap::new();

        parameters.insert(placeholders::PROCEDURE_IDENTIFIER, header.station_name.as_str());

        // The document's timeZone is not applied; every time is published as UTC.
        let phenomenon_time = compose_phenomenon_time(event.date, event.time)?;
        parameters.insert(placeholders::PHENOMENON_TIME, phenomenon_time.as_str());

        parameters.insert(placeholders::UOM_NAME, header.units.as_str());

        let observable_property = catalog::lookup(&header.parameter_id).value;
        parameters.insert(placeholders::OBSERVABLE_PROPERTY, observable_property);

        parameters.insert(
            placeholders::SAMPLING_FEATURE_LON_IN_DEG,
            c.station_position.longitude_deg.as_str(),
        );
        parameters.insert(
            placeholders::SAMPLING_FEATURE_LAT_IN_DEG,
            c.station_position.latitude_deg.as_str(),
        );
        parameters.insert(
            placeholders::FOI_SAMPLING_FEATURE,
            c.feature_of_interest_sampling.as_str(),
        );
        parameters.insert(
            placeholders::FOI_SAMPLED_FEATURE,
            c.feature_of_interest_sampled.as_str(),
        );
        parameters.insert(placeholders::OFFERING_IDENTIFIER, c.offering_name.as_str());

        parameters.insert(
            placeholders::OBSERVATION_IDENTIFIER,
            observation_identifier(&header.station_name, observable_property, &phenomenon_time),
        );

        // Verbatim: no numeric validation or rounding.
        parameters.insert(placeholders::RESULT_VALUE, event.value);

        Ok(parameters)
    }
}

fn resolve_property(header: &Header, series_index: usize) -> &'static ObservableProperty {
    warn_if_unknown_code(header, series_index);
    catalog::lookup(&header.parameter_id)
}

/// Log when an unknown code is about to be silently published as `1ZU`.
pub(crate) fn warn_if_unknown_code(header: &Header, series_index: usize) {
    if !catalog::is_known(&header.parameter_id) {
        logging::warn(
            Stage::Document,
            Some(&series_label(series_index, header)),
            &format!(
                "unknown parameterId '{}', publishing as '{}'",
                header.parameter_id,
                catalog::FALLBACK.code()
            ),
        );
    }
}

pub(crate) fn series_label(index: usize, header: &Header) -> String {
    format!("#{} {}", index, header.parameter_id)
}

// ---------------------------------------------------------------------------
// Timestamps and identifiers
// ---------------------------------------------------------------------------

/// Combine `YYYY-MM-DD` and `HH:MM:SS` into a UTC timestamp with
/// millisecond precision, e.g. `2014-02-10T00:15:00.000Z`.
pub fn compose_phenomenon_time(date: &str, time: &str) -> Result<String> {
    let malformed = |reason: String| ConversionError::MalformedTimestamp {
        date: date.to_string(),
        time: time.to_string(),
        reason,
    };

    let [year, month, day] = split_components(date, '-', "date").map_err(malformed)?;
    let [hour, minute, second] = split_components(time, ':', "time").map_err(malformed)?;

    let year = i32::try_from(year).map_err(|_| malformed(format!("year {} is out of range", year)))?;
    let timestamp = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| malformed("not a valid calendar date and time".to_string()))?;

    Ok(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn split_components(
    text: &str,
    separator: char,
    what: &str,
) -> std::result::Result<[u32; 3], String> {
    let parts: Vec<&str> = text.split(separator).collect();
    if parts.len() != 3 {
        return Err(format!(
            "{} needs 3 '{}'-separated fields, found {}",
            what,
            separator,
            parts.len()
        ));
    }

    let mut fields = [0u32; 3];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part
            .parse()
            .map_err(|_| format!("{} field '{}' is not an integer", what, part))?;
    }
    Ok(fields)
}

/// `<station>_<observableProperty>_<phenomenonTime>`.
///
/// Unique only per (station, property, time); nothing checks for collisions.
pub fn observation_identifier(station: &str, observable_property: &str, phenomenon_time: &str) -> String {
    format!("{}_{}_{}", station, observable_property, phenomenon_time)
}
