//! talsim_sos_bridge: publishes Talsim reservoir simulation results to a
//! transactional Sensor Observation Service (SOS-T).
//!
//! # Module structure
//!
//! ```text
//! talsim_sos_bridge
//! ├── document   — TalsimResult XML tree, node/attribute lookup, Series/Header/Event views
//! ├── catalog    — parameterId → observable property registry (1ZU fallback)
//! ├── model      — constants, ParameterMap, ConversionError
//! ├── extract    — placeholder values for InsertSensor / InsertObservation
//! ├── template
//! │   └── placeholders — the fixed %TOKEN% vocabulary
//! ├── request    — rendered requests, lazy per-event iteration
//! ├── validate   — success-marker check on service responses
//! ├── transport  — Transport trait + blocking reqwest client
//! ├── submit     — sequential run with abort-on-first-failure, RunReport
//! ├── config     — TOML config, template files, authorization token
//! └── logging    — tracing setup and stage-tagged log helpers
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod extract;
pub mod logging;
pub mod model;
pub mod request;
pub mod submit;
pub mod template;
pub mod transport;
pub mod validate;
