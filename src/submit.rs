//! Submission orchestration: register the sensor, then insert every
//! observation, strictly in document order.
//!
//! The run is sequential and stops at the first failure of any kind. Nothing
//! is retried; a request is only built once everything before it was
//! accepted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::catalog;
use crate::document::{Series, SimulationDocument};
use crate::extract::{self, ParameterExtractor};
use crate::logging::{self, Stage};
use crate::model::{ConversionError, Operation};
use crate::request::{self, RequestTemplates};
use crate::transport::{RequestHeaders, Transport};
use crate::validate;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Where in the run a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStage {
    RegisterSensor,
    /// Reading the header or time zone before the first event of a series.
    PrepareSeries { series: usize },
    InsertObservation { series: usize, event: usize },
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStage::RegisterSensor => write!(f, "sensor registration"),
            RunStage::PrepareSeries { series } => write!(f, "preparing series #{}", series),
            RunStage::InsertObservation { series, event } => {
                write!(f, "observation insert (series #{}, event #{})", series, event)
            }
        }
    }
}

/// The failure that ended a run.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct SubmissionError {
    pub stage: RunStage,
    /// The rendered request, when the failure happened after rendering.
    pub request: Option<String>,
    #[source]
    pub source: ConversionError,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesReport {
    pub index: usize,
    pub parameter_id: String,
    pub observable_property: String,
    pub events_submitted: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub station: String,
    pub series: Vec<SeriesReport>,
    pub observations: usize,
}

#[derive(Debug, Default)]
struct Progress {
    station: String,
    series: Vec<SeriesReport>,
    observations: usize,
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

pub struct Submitter<T: Transport> {
    transport: T,
    url: String,
    headers: RequestHeaders,
    templates: RequestTemplates,
    extractor: ParameterExtractor,
}

impl<T: Transport> Submitter<T> {
    pub fn new(
        transport: T,
        url: impl Into<String>,
        headers: RequestHeaders,
        templates: RequestTemplates,
        extractor: ParameterExtractor,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            headers,
            templates,
            extractor,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Convert and submit the whole document.
    pub fn run(&self, doc: &SimulationDocument) -> Result<RunReport, SubmissionError> {
        let started = Utc::now();
        let series = doc.series();
        let mut progress = Progress::default();

        logging::info(
            Stage::System,
            None,
            &format!("Submitting {} series to {}", series.len(), self.url),
        );

        let outcome = self.run_stages(doc, &series, &mut progress);
        logging::log_run_summary(series.len(), progress.series.len(), progress.observations);
        outcome?;

        Ok(RunReport {
            started,
            finished: Utc::now(),
            station: progress.station,
            series: progress.series,
            observations: progress.observations,
        })
    }

    fn run_stages(
        &self,
        doc: &SimulationDocument,
        series: &[Series<'_>],
        progress: &mut Progress,
    ) -> Result<(), SubmissionError> {
        progress.station = self.register_sensor(doc)?;

        for s in series {
            let report = self.insert_series(doc, s, progress)?;
            progress.series.push(report);
        }
        Ok(())
    }

    fn register_sensor(&self, doc: &SimulationDocument) -> Result<String, SubmissionError> {
        let stage = RunStage::RegisterSensor;
        let request =
            request::build_sensor_request(&self.extractor, doc, &self.templates.insert_sensor)
                .map_err(|e| fail(Stage::Sensor, stage, None, None, e))?;

        if let Err(e) = self.submit(Operation::InsertSensor, &request, None) {
            return Err(fail(Stage::Sensor, stage, None, Some(request), e));
        }

        // Registration succeeded, so the first series has a readable header.
        let station = doc
            .series()
            .first()
            .and_then(|s| s.header().ok())
            .map(|h| h.station_name)
            .unwrap_or_default();
        logging::info(Stage::Sensor, None, &format!("Registered sensor '{}'", station));
        Ok(station)
    }

    fn insert_series(
        &self,
        doc: &SimulationDocument,
        series: &Series<'_>,
        progress: &mut Progress,
    ) -> Result<SeriesReport, SubmissionError> {
        let requests = request::observation_requests(
            &self.extractor,
            doc,
            series,
            &self.templates.insert_observation,
        )
        .map_err(|e| {
            fail(
                Stage::Observation,
                RunStage::PrepareSeries { series: series.index },
                None,
                None,
                e,
            )
        })?;

        let header = requests.header().clone();
        let label = extract::series_label(series.index, &header);
        let total = requests.len();
        let mut submitted = 0;

        for (event, built) in requests.enumerate() {
            let stage = RunStage::InsertObservation {
                series: series.index,
                event,
            };
            let request = built.map_err(|e| fail(Stage::Observation, stage, Some(&label), None, e))?;
            if let Err(e) = self.submit(Operation::InsertObservation, &request, Some(&label)) {
                return Err(fail(Stage::Observation, stage, Some(&label), Some(request), e));
            }
            submitted += 1;
            progress.observations += 1;
        }

        logging::info(
            Stage::Observation,
            Some(&label),
            &format!("Inserted {}/{} observations", submitted, total),
        );

        Ok(SeriesReport {
            index: series.index,
            parameter_id: header.parameter_id.clone(),
            observable_property: catalog::lookup(&header.parameter_id).value.to_string(),
            events_submitted: submitted,
        })
    }

    /// POST one request and check the response for the operation's marker.
    fn submit(
        &self,
        operation: Operation,
        request: &str,
        series: Option<&str>,
    ) -> Result<(), ConversionError> {
        logging::debug(Stage::Transport, series, &format!("{} request:\n{}", operation, request));

        let response = self.transport.post(&self.url, request, &self.headers)?;

        logging::debug(
            Stage::Transport,
            series,
            &format!("{} response (HTTP {}):\n{}", operation, response.status, response.body),
        );
        if !response.is_success() {
            let detail = validate::exception_text(&response.body)
                .unwrap_or_else(|| "no exception text".to_string());
            logging::warn(
                Stage::Transport,
                series,
                &format!("{} returned HTTP {}: {}", operation, response.status, detail),
            );
        }

        validate::check_response(operation, &response.body)
    }
}

fn fail(
    log_stage: Stage,
    stage: RunStage,
    series: Option<&str>,
    request: Option<String>,
    source: ConversionError,
) -> SubmissionError {
    logging::log_failure(log_stage, series, &stage.to_string(), &source);
    SubmissionError {
        stage,
        request,
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::transport::{HttpResponse, TransportError};

    const DOC: &str = r#"<TalsimResult>
  <timeZone>+01:00</timeZone>
  <series>
    <header>
      <parameterId>VOL</parameterId>
      <stationName>Talbecken</stationName>
      <units>hm3</units>
    </header>
    <event date="2014-02-10" time="00:15:00" value="1.5"/>
    <event date="2014-02-10" time="00:30:00" value="1.6"/>
    <event date="2014-02-10" time="00:45:00" value="1.7"/>
  </series>
  <series>
    <header>
      <parameterId>WSP</parameterId>
      <stationName>Talbecken</stationName>
      <units>m</units>
    </header>
    <event date="2014-02-10" time="00:15:00" value="301.2"/>
  </series>
</TalsimResult>"#;

    /// Answers from a script, one reply per call; records every body.
    struct ScriptedTransport {
        replies: RefCell<Vec<Result<HttpResponse, TransportError>>>,
        sent: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(mut replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
            replies.reverse();
            Self {
                replies: RefCell::new(replies),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn post(
            &self,
            _url: &str,
            body: &str,
            _headers: &RequestHeaders,
        ) -> Result<HttpResponse, TransportError> {
            self.sent.borrow_mut().push(body.to_string());
            self.replies
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Request("script exhausted".to_string())))
        }
    }

    fn ok(body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn submitter(replies: Vec<Result<HttpResponse, TransportError>>) -> Submitter<ScriptedTransport> {
        Submitter::new(
            ScriptedTransport::new(replies),
            "http://sos.test/service",
            RequestHeaders::new("token"),
            RequestTemplates {
                insert_sensor: "sensor %STATION_IDENTIFIER%".to_string(),
                insert_observation: "obs %OBSERVABLE_PROPERTY% %RESULT_VALUE%".to_string(),
            },
            ParameterExtractor::default(),
        )
    }

    #[test]
    fn test_successful_run_reports_every_series() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let submitter = submitter(vec![
            ok("<InsertSensorResponse/>"),
            ok("<InsertObservationResponse/>"),
            ok("<InsertObservationResponse/>"),
            ok("<InsertObservationResponse/>"),
            ok("<InsertObservationResponse/>"),
        ]);

        let report = submitter.run(&doc).unwrap();
        assert_eq!(report.station, "Talbecken");
        assert_eq!(report.observations, 4);
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.series[0].observable_property, "Volumen");
        assert_eq!(report.series[0].events_submitted, 3);
        assert_eq!(report.series[1].parameter_id, "WSP");
        assert!(report.finished >= report.started);

        let sent = submitter.transport().sent.borrow();
        assert_eq!(
            *sent,
            vec![
                "sensor Talbecken",
                "obs Volumen 1.5",
                "obs Volumen 1.6",
                "obs Volumen 1.7",
                "obs Wasserstand 301.2",
            ]
        );
    }

    #[test]
    fn test_rejected_sensor_stops_before_observations() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let submitter = submitter(vec![ok("<ows:ExceptionReport/>")]);

        let err = submitter.run(&doc).unwrap_err();
        assert_eq!(err.stage, RunStage::RegisterSensor);
        assert_eq!(err.request.as_deref(), Some("sensor Talbecken"));
        assert!(matches!(
            err.source,
            ConversionError::InsertFailure { operation: Operation::InsertSensor, .. }
        ));
        assert_eq!(submitter.transport().sent.borrow().len(), 1);
    }

    #[test]
    fn test_failed_event_aborts_remaining_events_and_series() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let submitter = submitter(vec![
            ok("<InsertSensorResponse/>"),
            ok("<InsertObservationResponse/>"),
            Ok(HttpResponse {
                status: 400,
                body: "<ows:ExceptionReport><ows:ExceptionText>bad</ows:ExceptionText></ows:ExceptionReport>"
                    .to_string(),
            }),
            ok("<InsertObservationResponse/>"),
        ]);

        let err = submitter.run(&doc).unwrap_err();
        assert_eq!(err.stage, RunStage::InsertObservation { series: 0, event: 1 });
        assert_eq!(err.request.as_deref(), Some("obs Volumen 1.6"));
        match &err.source {
            ConversionError::InsertFailure { body, .. } => assert!(body.contains("bad")),
            other => panic!("expected InsertFailure, got {:?}", other),
        }
        assert_eq!(submitter.transport().sent.borrow().len(), 3);
    }

    #[test]
    fn test_transport_error_is_surfaced() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let submitter = submitter(vec![Err(TransportError::Request("connection refused".to_string()))]);

        let err = submitter.run(&doc).unwrap_err();
        assert_eq!(err.stage, RunStage::RegisterSensor);
        assert!(matches!(err.source, ConversionError::Transport(_)));
    }

    #[test]
    fn test_document_without_series_sends_nothing() {
        let doc = SimulationDocument::parse("<TalsimResult><timeZone>Z</timeZone></TalsimResult>").unwrap();
        let submitter = submitter(vec![]);

        let err = submitter.run(&doc).unwrap_err();
        assert_eq!(err.stage, RunStage::RegisterSensor);
        assert_eq!(err.request, None);
        assert!(matches!(err.source, ConversionError::MalformedDocument(_)));
        assert!(submitter.transport().sent.borrow().is_empty());
    }

    #[test]
    fn test_missing_time_zone_fails_while_preparing_series() {
        let doc = SimulationDocument::parse(&DOC.replace("<timeZone>+01:00</timeZone>", "")).unwrap();
        let submitter = submitter(vec![ok("<InsertSensorResponse/>")]);

        let err = submitter.run(&doc).unwrap_err();
        assert_eq!(err.stage, RunStage::PrepareSeries { series: 0 });
        assert!(matches!(err.source, ConversionError::NotFound { .. }));
        assert_eq!(submitter.transport().sent.borrow().len(), 1);
    }

    #[test]
    fn test_run_stage_display() {
        assert_eq!(RunStage::RegisterSensor.to_string(), "sensor registration");
        assert_eq!(
            RunStage::InsertObservation { series: 1, event: 4 }.to_string(),
            "observation insert (series #1, event #4)"
        );
    }
}
