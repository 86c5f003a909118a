//! Observable-property catalog for TalsimResult parameter codes.
//!
//! Talsim labels every output series with a short `parameterId` code. This
//! module is the single source of truth mapping those codes onto the
//! observable property published to the SOS, together with the placeholder
//! triple each property fills in the InsertSensor template.

use crate::template::placeholders;

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// The five Talsim output parameters the SOS sensor description knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterCode {
    /// `1ZU`: inflow into the reservoir.
    Inflow,
    /// `VOL`: stored volume.
    Volume,
    /// `WSP`: water level.
    WaterLevel,
    /// `QA1`: regular release.
    Release,
    /// `QH1`: flood spillway discharge.
    FloodSpill,
}

impl ParameterCode {
    /// Exact, case-sensitive match against the known codes.
    pub fn from_code(code: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.parameter)
    }

    /// Like `from_code`, but unknown codes resolve to `Inflow` (`1ZU`).
    ///
    /// Downstream consumers rely on this fallback. It is probably a latent
    /// defect: an unknown series is published as "Zufluss". Callers should
    /// log when `from_code` would have returned `None`.
    pub fn resolve(code: &str) -> Self {
        Self::from_code(code).unwrap_or(FALLBACK)
    }

    pub fn code(self) -> &'static str {
        self.property().code
    }

    pub fn property(self) -> &'static ObservableProperty {
        CATALOG
            .iter()
            .find(|entry| entry.parameter == self)
            .unwrap_or(&CATALOG[0])
    }
}

/// Code used for anything the catalog does not recognise.
pub const FALLBACK: ParameterCode = ParameterCode::Inflow;

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// Placeholder names an output property populates in the InsertSensor template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorPlaceholders {
    pub name: &'static str,
    pub value: &'static str,
    pub unit: &'static str,
}

/// What a parameter code is published as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservableProperty {
    pub parameter: ParameterCode,
    /// Talsim `parameterId`.
    pub code: &'static str,
    /// Display name in the sensor description.
    pub name: &'static str,
    /// Identifier used as `observableProperty` in requests.
    pub value: &'static str,
    /// Plain-language meaning of the quantity.
    pub meaning: &'static str,
    pub placeholders: SensorPlaceholders,
}

/// All known parameter codes. The first entry is also the fallback.
pub static CATALOG: &[ObservableProperty] = &[
    ObservableProperty {
        parameter: ParameterCode::Inflow,
        code: "1ZU",
        name: "Zufluss",
        value: "Zufluss",
        meaning: "Inflow into the reservoir",
        placeholders: SensorPlaceholders {
            name: placeholders::OUTPUT_NAME_1ZU,
            value: placeholders::OUTPUT_VALUE_1ZU,
            unit: placeholders::UOM_DEFINITION_1ZU,
        },
    },
    ObservableProperty {
        parameter: ParameterCode::Volume,
        code: "VOL",
        name: "Volumen",
        value: "Volumen",
        meaning: "Stored reservoir volume",
        placeholders: SensorPlaceholders {
            name: placeholders::OUTPUT_NAME_VOL,
            value: placeholders::OUTPUT_VALUE_VOL,
            unit: placeholders::UOM_DEFINITION_VOL,
        },
    },
    ObservableProperty {
        parameter: ParameterCode::WaterLevel,
        code: "WSP",
        name: "Wasserstand",
        value: "Wasserstand",
        meaning: "Water surface level",
        placeholders: SensorPlaceholders {
            name: placeholders::OUTPUT_NAME_WSP,
            value: placeholders::OUTPUT_VALUE_WSP,
            unit: placeholders::UOM_DEFINITION_WSP,
        },
    },
    ObservableProperty {
        parameter: ParameterCode::Release,
        code: "QA1",
        name: "Abgabe",
        value: "Abgabe",
        meaning: "Regular release downstream",
        placeholders: SensorPlaceholders {
            name: placeholders::OUTPUT_NAME_QA1,
            value: placeholders::OUTPUT_VALUE_QA1,
            unit: placeholders::UOM_DEFINITION_QA1,
        },
    },
    ObservableProperty {
        parameter: ParameterCode::FloodSpill,
        code: "QH1",
        name: "Hochwasserentlastung",
        value: "Hochwasserentlastung",
        meaning: "Discharge over the flood spillway",
        placeholders: SensorPlaceholders {
            name: placeholders::OUTPUT_NAME_QH1,
            value: placeholders::OUTPUT_VALUE_QH1,
            unit: placeholders::UOM_DEFINITION_QH1,
        },
    },
];

/// Looks up a `parameterId`, returning the `1ZU` entry for unknown codes.
pub fn lookup(code: &str) -> &'static ObservableProperty {
    ParameterCode::resolve(code).property()
}

/// Returns `true` if `code` is one of the five known codes.
pub fn is_known(code: &str) -> bool {
    ParameterCode::from_code(code).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_documented_properties() {
        let expected = [
            ("1ZU", "Zufluss"),
            ("VOL", "Volumen"),
            ("WSP", "Wasserstand"),
            ("QA1", "Abgabe"),
            ("QH1", "Hochwasserentlastung"),
        ];
        for (code, name) in expected {
            let property = lookup(code);
            assert_eq!(property.code, code);
            assert_eq!(property.name, name, "display name for '{}'", code);
            assert_eq!(property.value, name, "value for '{}'", code);
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_1zu() {
        for code in ["XYZ", "", "vol", " VOL", "1zu"] {
            let property = lookup(code);
            assert_eq!(property.code, "1ZU", "'{}' should fall back to 1ZU", code);
            assert_eq!(property.value, "Zufluss");
            assert!(!is_known(code));
        }
    }

    #[test]
    fn test_fallback_is_first_catalog_entry() {
        assert_eq!(CATALOG[0].parameter, FALLBACK);
        assert_eq!(FALLBACK.code(), "1ZU");
    }

    #[test]
    fn test_no_duplicate_codes() {
        let mut seen = std::collections::HashSet::new();
        for entry in CATALOG {
            assert!(seen.insert(entry.code), "duplicate code '{}'", entry.code);
        }
    }

    #[test]
    fn test_every_parameter_has_exactly_one_entry() {
        for parameter in [
            ParameterCode::Inflow,
            ParameterCode::Volume,
            ParameterCode::WaterLevel,
            ParameterCode::Release,
            ParameterCode::FloodSpill,
        ] {
            let count = CATALOG.iter().filter(|e| e.parameter == parameter).count();
            assert_eq!(count, 1, "{:?} should appear once", parameter);
            assert_eq!(ParameterCode::from_code(parameter.code()), Some(parameter));
        }
    }

    #[test]
    fn test_placeholder_triples_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for entry in CATALOG {
            let p = entry.placeholders;
            for placeholder in [p.name, p.value, p.unit] {
                assert!(seen.insert(placeholder), "placeholder '{}' reused", placeholder);
                assert!(
                    placeholder.ends_with(&format!("_{}%", entry.code)),
                    "placeholder '{}' should be keyed by '{}'",
                    placeholder,
                    entry.code
                );
            }
        }
    }
}
