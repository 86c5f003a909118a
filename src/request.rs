//! SOS-T request construction.
//!
//! Combines the parameter extractor with the template renderer: one
//! InsertSensor request per document, one InsertObservation request per
//! event. Observation requests are produced lazily by `ObservationRequests`
//! so the submitter never builds a request it will not send.

use crate::document::{Element, Event, Header, Series, SimulationDocument};
use crate::extract::{self, ParameterExtractor};
use crate::model::Result;
use crate::template;

/// The two request templates, loaded once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplates {
    pub insert_sensor: String,
    pub insert_observation: String,
}

/// Render the InsertSensor request for the whole document.
pub fn build_sensor_request(
    extractor: &ParameterExtractor,
    doc: &SimulationDocument,
    template: &str,
) -> Result<String> {
    let parameters = extractor.extract_sensor_parameters(doc)?;
    Ok(template::render(template, &parameters))
}

/// Render every InsertObservation request of `series`, in document order.
pub fn build_observation_requests_for_series(
    extractor: &ParameterExtractor,
    doc: &SimulationDocument,
    series: &Series<'_>,
    template: &str,
) -> Result<Vec<String>> {
    observation_requests(extractor, doc, series, template)?.collect()
}

/// Lazily render the InsertObservation requests of `series`.
///
/// The header and the document time zone are read once, up front; each
/// event is read and rendered only when the iterator reaches it. An unknown
/// `parameterId` is reported here, once per series.
pub fn observation_requests<'a>(
    extractor: &'a ParameterExtractor,
    doc: &SimulationDocument,
    series: &Series<'a>,
    template: &'a str,
) -> Result<ObservationRequests<'a>> {
    let header = series.header()?;
    let time_zone = doc.time_zone()?;
    extract::warn_if_unknown_code(&header, series.index);
    Ok(ObservationRequests {
        extractor,
        template,
        header,
        time_zone,
        events: series.event_nodes().into_iter(),
    })
}

pub struct ObservationRequests<'a> {
    extractor: &'a ParameterExtractor,
    template: &'a str,
    header: Header,
    time_zone: String,
    events: std::vec::IntoIter<&'a Element>,
}

impl<'a> ObservationRequests<'a> {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    fn render(&self, node: &Element) -> Result<String> {
        let event = Event::from_node(node)?;
        let parameters =
            self.extractor
                .extract_observation_parameters(&self.header, event, &self.time_zone)?;
        Ok(template::render(self.template, &parameters))
    }
}

impl<'a> Iterator for ObservationRequests<'a> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.events.next()?;
        Some(self.render(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl ExactSizeIterator for ObservationRequests<'_> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tracing_subscriber::layer::{Context, Layer};
    use tracing_subscriber::prelude::*;

    use super::*;
    use crate::model::ConversionError;

    /// Counts WARN events seen by the thread-local subscriber.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    const DOC: &str = r#"<TalsimResult>
  <timeZone>+01:00</timeZone>
  <series>
    <header>
      <parameterId>VOL</parameterId>
      <stationName>Talbecken</stationName>
      <units>hm3</units>
    </header>
    <event date="2014-02-10" time="00:30:00" value="3"/>
    <event date="2014-02-10" time="00:15:00" value="1"/>
    <event date="2014-02-10" time="00:45:00" value="2"/>
  </series>
</TalsimResult>"#;

    const OBS_TEMPLATE: &str = "%PHENOMENON_TIME%|%RESULT_VALUE%";

    #[test]
    fn test_requests_follow_document_order() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let series = doc.series();
        let requests = build_observation_requests_for_series(
            &ParameterExtractor::default(),
            &doc,
            &series[0],
            OBS_TEMPLATE,
        )
        .unwrap();
        assert_eq!(
            requests,
            vec![
                "2014-02-10T00:30:00.000Z|3",
                "2014-02-10T00:15:00.000Z|1",
                "2014-02-10T00:45:00.000Z|2",
            ]
        );
    }

    #[test]
    fn test_sensor_request_renders_station() {
        let doc = SimulationDocument::parse(DOC).unwrap();
        let request = build_sensor_request(
            &ParameterExtractor::default(),
            &doc,
            "<id>%STATION_IDENTIFIER%</id><p>%OBSERVABLE_PROPERTY_OUTPUT_NAME_VOL%</p>",
        )
        .unwrap();
        assert_eq!(request, "<id>Talbecken</id><p>Volumen</p>");
    }

    #[test]
    fn test_lazy_iterator_stops_at_bad_event() {
        let xml = DOC.replace(r#"time="00:15:00" "#, "");
        let doc = SimulationDocument::parse(&xml).unwrap();
        let series = doc.series();
        let extractor = ParameterExtractor::default();
        let mut requests = observation_requests(&extractor, &doc, &series[0], OBS_TEMPLATE).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.next().unwrap().is_ok());
        assert!(matches!(
            requests.next().unwrap(),
            Err(ConversionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_missing_time_zone_fails_before_any_request() {
        let xml = DOC.replace("<timeZone>+01:00</timeZone>", "");
        let doc = SimulationDocument::parse(&xml).unwrap();
        let series = doc.series();
        let extractor = ParameterExtractor::default();
        let result = observation_requests(&extractor, &doc, &series[0], OBS_TEMPLATE);
        assert!(matches!(result, Err(ConversionError::NotFound { .. })));
    }

    #[test]
    fn test_series_without_events_yields_nothing() {
        let doc = SimulationDocument::parse(
            "<r><timeZone>Z</timeZone><series><header><parameterId>VOL</parameterId>\
             <stationName>S</stationName><units>m</units></header></series></r>",
        )
        .unwrap();
        let series = doc.series();
        let requests = build_observation_requests_for_series(
            &ParameterExtractor::default(),
            &doc,
            &series[0],
            OBS_TEMPLATE,
        )
        .unwrap();
        assert!(requests.is_empty());
    }

    #[test]
    fn test_unknown_code_warns_once_per_series() {
        let doc = SimulationDocument::parse(&DOC.replace(">VOL<", ">XYZ<")).unwrap();
        let series = doc.series();
        let extractor = ParameterExtractor::default();
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

        let requests = tracing::subscriber::with_default(subscriber, || {
            build_observation_requests_for_series(
                &extractor,
                &doc,
                &series[0],
                "%OBSERVABLE_PROPERTY%",
            )
        })
        .unwrap();

        assert_eq!(requests, vec!["Zufluss", "Zufluss", "Zufluss"]);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}
