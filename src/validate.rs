//! SOS-T response classification.
//!
//! A response counts as successful when its body contains the operation's
//! response element name. This is a substring check, not schema validation:
//! an exception report quoting `InsertSensorResponse` would pass.

use crate::document::parse_element_tree;
use crate::model::{ConversionError, Operation, Result};

pub const INSERT_SENSOR_SUCCESS_MARKER: &str = "InsertSensorResponse";
pub const INSERT_OBSERVATION_SUCCESS_MARKER: &str = "InsertObservationResponse";

/// Local name of the element carrying an OWS exception's message.
pub const EXCEPTION_TEXT_TAG: &str = "ExceptionText";

pub fn success_marker(operation: Operation) -> &'static str {
    match operation {
        Operation::InsertSensor => INSERT_SENSOR_SUCCESS_MARKER,
        Operation::InsertObservation => INSERT_OBSERVATION_SUCCESS_MARKER,
    }
}

pub fn check_response(operation: Operation, body: &str) -> Result<()> {
    if body.contains(success_marker(operation)) {
        Ok(())
    } else {
        Err(ConversionError::InsertFailure {
            operation,
            body: body.to_string(),
        })
    }
}

pub fn check_sensor_response(body: &str) -> Result<()> {
    check_response(Operation::InsertSensor, body)
}

pub fn check_observation_response(body: &str) -> Result<()> {
    check_response(Operation::InsertObservation, body)
}

/// Text of the first `ExceptionText` element in an exception report, if any.
///
/// Matches on the local name, so any namespace prefix is accepted. Bodies
/// that are not well-formed XML, and empty exception texts, give `None`.
pub fn exception_text(body: &str) -> Option<String> {
    let root = parse_element_tree(body).ok()?;
    root.descendants()
        .find(|node| local_name(&node.name) == EXCEPTION_TEXT_TAG)
        .map(|node| node.text_content().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCEPTION: &str = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="2.0.0">
  <ows:Exception exceptionCode="InvalidParameterValue" locator="procedure">
    <ows:ExceptionText>The procedure is already registered</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;

    #[test]
    fn test_sensor_response_success() {
        assert!(check_sensor_response("<InsertSensorResponse>...</InsertSensorResponse>").is_ok());
        assert!(
            check_sensor_response("<swes:InsertSensorResponse xmlns:swes=\"x\"/>").is_ok()
        );
    }

    #[test]
    fn test_observation_response_success() {
        assert!(check_observation_response(
            "<sos:InsertObservationResponse xmlns:sos=\"http://www.opengis.net/sos/2.0\"/>"
        )
        .is_ok());
    }

    #[test]
    fn test_exception_report_is_failure_with_full_body() {
        match check_sensor_response(EXCEPTION) {
            Err(ConversionError::InsertFailure { operation, body }) => {
                assert_eq!(operation, Operation::InsertSensor);
                assert_eq!(body, EXCEPTION);
            }
            other => panic!("expected InsertFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_markers_are_not_interchangeable() {
        assert!(check_observation_response("<InsertSensorResponse/>").is_err());
        assert!(check_sensor_response("<InsertObservationResponse/>").is_err());
    }

    #[test]
    fn test_empty_body_is_failure() {
        assert!(check_observation_response("").is_err());
    }

    #[test]
    fn test_exception_text_extraction() {
        assert_eq!(
            exception_text(EXCEPTION).as_deref(),
            Some("The procedure is already registered")
        );
        assert_eq!(exception_text("<InsertSensorResponse/>"), None);
        assert_eq!(exception_text("<ExceptionText>unprefixed</ExceptionText>").as_deref(), Some("unprefixed"));
    }

    #[test]
    fn test_empty_exception_text_does_not_borrow_following_text() {
        let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1">
  <ows:Exception exceptionCode="NoApplicableCode"><ows:ExceptionText/></ows:Exception>
  <ows:Note>unrelated</ows:Note>
</ows:ExceptionReport>"#;
        assert_eq!(exception_text(body), None);
    }

    #[test]
    fn test_exception_text_ignores_attributes_and_comments() {
        let body = r#"<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1">
  <!-- ExceptionText>not this< -->
  <ows:Exception exceptionCode="InvalidParameterValue" locator="ExceptionText">
    <ows:ExceptionText>the real message</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        assert_eq!(exception_text(body).as_deref(), Some("the real message"));
    }

    #[test]
    fn test_exception_text_of_malformed_body_is_none() {
        assert_eq!(exception_text("<ows:ExceptionReport><ows:ExceptionText>cut off"), None);
        assert_eq!(exception_text("Internal Server Error"), None);
    }
}
