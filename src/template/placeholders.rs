//! Literal placeholder tokens shared with the SOS request templates.
//!
//! Every token is wrapped in `%` on both sides, so no token can be a proper
//! substring of another. Keep it that way when adding tokens: the renderer
//! replaces tokens one after another and relies on it.

// ---------------------------------------------------------------------------
// InsertSensor
// ---------------------------------------------------------------------------

pub const STATION_IDENTIFIER: &str = "%STATION_IDENTIFIER%";
pub const OFFERING_IDENTIFIER_NAME: &str = "%OFFERING_IDENTIFIER_NAME%";
pub const OFFERING_IDENTIFIER_VALUE: &str = "%OFFERING_IDENTIFIER_VALUE%";

pub const POSITION_LON_IN_DEG: &str = "%POSITION_LON_IN_DEG%";
pub const POSITION_LAT_IN_DEG: &str = "%POSITION_LAT_IN_DEG%";
pub const POSITION_ALT_IN_METERS: &str = "%POSITION_ALT_IN_METERS%";

pub const INPUT_NAME: &str = "%OBSERVABLE_PROPERTY_INPUT_NAME%";
pub const INPUT_VALUE: &str = "%OBSERVABLE_PROPERTY_INPUT_VALUE%";

pub const OUTPUT_NAME_1ZU: &str = "%OBSERVABLE_PROPERTY_OUTPUT_NAME_1ZU%";
pub const OUTPUT_VALUE_1ZU: &str = "%OBSERVABLE_PROPERTY_OUTPUT_VALUE_1ZU%";
pub const UOM_DEFINITION_1ZU: &str = "%UOM_DEFINITION_1ZU%";

pub const OUTPUT_NAME_VOL: &str = "%OBSERVABLE_PROPERTY_OUTPUT_NAME_VOL%";
pub const OUTPUT_VALUE_VOL: &str = "%OBSERVABLE_PROPERTY_OUTPUT_VALUE_VOL%";
pub const UOM_DEFINITION_VOL: &str = "%UOM_DEFINITION_VOL%";

pub const OUTPUT_NAME_WSP: &str = "%OBSERVABLE_PROPERTY_OUTPUT_NAME_WSP%";
pub const OUTPUT_VALUE_WSP: &str = "%OBSERVABLE_PROPERTY_OUTPUT_VALUE_WSP%";
pub const UOM_DEFINITION_WSP: &str = "%UOM_DEFINITION_WSP%";

pub const OUTPUT_NAME_QA1: &str = "%OBSERVABLE_PROPERTY_OUTPUT_NAME_QA1%";
pub const OUTPUT_VALUE_QA1: &str = "%OBSERVABLE_PROPERTY_OUTPUT_VALUE_QA1%";
pub const UOM_DEFINITION_QA1: &str = "%UOM_DEFINITION_QA1%";

pub const OUTPUT_NAME_QH1: &str = "%OBSERVABLE_PROPERTY_OUTPUT_NAME_QH1%";
pub const OUTPUT_VALUE_QH1: &str = "%OBSERVABLE_PROPERTY_OUTPUT_VALUE_QH1%";
pub const UOM_DEFINITION_QH1: &str = "%UOM_DEFINITION_QH1%";

pub const FEATURE_OF_INTEREST_IDENTIFIER: &str = "%FEATURE_OF_INTEREST_IDENTIFIER%";

// ---------------------------------------------------------------------------
// InsertObservation
// ---------------------------------------------------------------------------

pub const OFFERING_IDENTIFIER: &str = "%OFFERING_IDENTIFIER%";
pub const OBSERVATION_IDENTIFIER: &str = "%OBSERVATION_IDENTIFIER%";
pub const PHENOMENON_TIME: &str = "%PHENOMENON_TIME%";
pub const PROCEDURE_IDENTIFIER: &str = "%PROCEDURE_IDENTIFIER%";
pub const OBSERVABLE_PROPERTY: &str = "%OBSERVABLE_PROPERTY%";

pub const FOI_SAMPLING_FEATURE: &str = "%FEATURE_OF_INTEREST_IDENTIFIER_SAMPLING_FEATURE%";
pub const FOI_SAMPLED_FEATURE: &str = "%FEATURE_OF_INTEREST_IDENTIFIER_SAMPLED_FEATURE%";
pub const SAMPLING_FEATURE_LON_IN_DEG: &str = "%SAMPLING_FEATURE_LON_IN_DEG%";
pub const SAMPLING_FEATURE_LAT_IN_DEG: &str = "%SAMPLING_FEATURE_LAT_IN_DEG%";

pub const UOM_NAME: &str = "%UOM_NAME%";
pub const RESULT_VALUE: &str = "%RESULT_VALUE%";

/// Every placeholder the InsertSensor template may contain.
pub static INSERT_SENSOR: &[&str] = &[
    STATION_IDENTIFIER,
    OFFERING_IDENTIFIER_NAME,
    OFFERING_IDENTIFIER_VALUE,
    POSITION_LON_IN_DEG,
    POSITION_LAT_IN_DEG,
    POSITION_ALT_IN_METERS,
    INPUT_NAME,
    INPUT_VALUE,
    OUTPUT_NAME_1ZU,
    OUTPUT_VALUE_1ZU,
    UOM_DEFINITION_1ZU,
    OUTPUT_NAME_VOL,
    OUTPUT_VALUE_VOL,
    UOM_DEFINITION_VOL,
    OUTPUT_NAME_WSP,
    OUTPUT_VALUE_WSP,
    UOM_DEFINITION_WSP,
    OUTPUT_NAME_QA1,
    OUTPUT_VALUE_QA1,
    UOM_DEFINITION_QA1,
    OUTPUT_NAME_QH1,
    OUTPUT_VALUE_QH1,
    UOM_DEFINITION_QH1,
    FEATURE_OF_INTEREST_IDENTIFIER,
];

/// Every placeholder the InsertObservation template may contain.
pub static INSERT_OBSERVATION: &[&str] = &[
    OFFERING_IDENTIFIER,
    OBSERVATION_IDENTIFIER,
    PHENOMENON_TIME,
    PROCEDURE_IDENTIFIER,
    OBSERVABLE_PROPERTY,
    FOI_SAMPLING_FEATURE,
    FOI_SAMPLED_FEATURE,
    SAMPLING_FEATURE_LON_IN_DEG,
    SAMPLING_FEATURE_LAT_IN_DEG,
    UOM_NAME,
    RESULT_VALUE,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> Vec<&'static str> {
        INSERT_SENSOR.iter().chain(INSERT_OBSERVATION).copied().collect()
    }

    #[test]
    fn test_no_placeholder_is_a_substring_of_another() {
        // A token nested inside another would be partially replaced first
        // and corrupt the longer one.
        let all = all();
        for a in &all {
            for b in &all {
                if a != b {
                    assert!(!b.contains(a), "'{}' is contained in '{}'", a, b);
                }
            }
        }
    }

    #[test]
    fn test_placeholders_are_percent_delimited() {
        for token in all() {
            assert!(token.len() > 2);
            assert!(token.starts_with('%') && token.ends_with('%'), "{}", token);
            assert!(!token[1..token.len() - 1].contains('%'), "{}", token);
        }
    }

    #[test]
    fn test_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for token in all() {
            assert!(seen.insert(token), "duplicate placeholder '{}'", token);
        }
    }
}
