//! TalsimResult document model.
//!
//! Builds a small read-only element tree from the simulation output with
//! quick-xml, and provides the lookups the extractor needs: child by tag,
//! attribute by name, first element document-wide, and the typed `Series`,
//! `Header` and `Event` views over the tree.
//!
//! A TalsimResult looks roughly like:
//!
//! ```xml
//! <TalsimResult>
//!   <timeZone>+01:00</timeZone>
//!   <series>
//!     <header>
//!       <parameterId>VOL</parameterId>
//!       <stationName>Talbecken</stationName>
//!       <units>hm3</units>
//!       ...
//!     </header>
//!     <event date="2014-02-10" time="00:15:00" value="1.234"/>
//!   </series>
//! </TalsimResult>
//! ```

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

use crate::model::{ConversionError, Result};

// ---------------------------------------------------------------------------
// Tag and attribute names
// ---------------------------------------------------------------------------

pub const SERIES_TAG: &str = "series";
pub const HEADER_TAG: &str = "header";
pub const EVENT_TAG: &str = "event";
pub const TIME_ZONE_TAG: &str = "timeZone";

pub const PARAMETER_ID_TAG: &str = "parameterId";
pub const LOCATION_ID_TAG: &str = "locationId";
pub const STATION_NAME_TAG: &str = "stationName";
pub const UNITS_TAG: &str = "units";
pub const MISSING_VALUE_TAG: &str = "missVal";
pub const START_DATE_TAG: &str = "startDate";
pub const END_DATE_TAG: &str = "endDate";

pub const DATE_ATTR: &str = "date";
pub const TIME_ATTR: &str = "time";
pub const VALUE_ATTR: &str = "value";

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

/// One XML element with its attributes, text, and child elements in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| ConversionError::Xml(err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| ConversionError::Xml(err.to_string()))?;
            attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        Ok(Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// This element followed by all of its descendants, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }

    pub fn children_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }
}

/// Pre-order walk over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Parse XML text into an element tree.
pub fn parse_element_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => stack.push(Element::from_start(&e)?),
            Ok(XmlEvent::Empty(e)) => {
                let element = Element::from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(XmlEvent::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ConversionError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(XmlEvent::Text(t)) => {
                if let Some(current) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|err| ConversionError::Xml(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Ok(XmlEvent::CData(t)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(err) => {
                return Err(ConversionError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    err
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ConversionError::Xml(format!(
            "element '{}' is never closed",
            open.name
        )));
    }

    root.ok_or_else(|| ConversionError::Xml("document has no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ConversionError::Xml(format!(
                "second root element '{}'",
                element.name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// First direct child of `node` named `tag`.
pub fn find_child_by_tag<'a>(node: &'a Element, tag: &str) -> Result<&'a Element> {
    node.children
        .iter()
        .find(|child| child.name == tag)
        .ok_or_else(|| ConversionError::not_found("child element", tag, &node.name))
}

/// Value of the attribute `name` on `node`.
pub fn find_attribute<'a>(node: &'a Element, name: &str) -> Result<&'a str> {
    node.attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| ConversionError::not_found("attribute", name, &node.name))
}

/// First element named `tag` anywhere in the document, root included.
pub fn find_first_by_tag<'a>(doc: &'a SimulationDocument, tag: &str) -> Result<&'a Element> {
    doc.root
        .descendants()
        .find(|node| node.name == tag)
        .ok_or_else(|| ConversionError::not_found("element", tag, &doc.root.name))
}

/// Every `series` element in the document, in document order.
pub fn all_series_nodes(doc: &SimulationDocument) -> Vec<Series<'_>> {
    doc.root
        .descendants()
        .filter(|node| node.name == SERIES_TAG)
        .enumerate()
        .map(|(index, node)| Series { index, node })
        .collect()
}

/// Direct `event` children of one series. Never searches outside the series.
pub fn all_event_nodes<'a>(series: &Series<'a>) -> Vec<&'a Element> {
    series.node.children_by_tag(EVENT_TAG).collect()
}

// ---------------------------------------------------------------------------
// Typed views
// ---------------------------------------------------------------------------

/// A parsed TalsimResult. Read-only after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationDocument {
    pub root: Element,
}

impl SimulationDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(SimulationDocument {
            root: parse_element_tree(xml)?,
        })
    }

    pub fn series(&self) -> Vec<Series<'_>> {
        all_series_nodes(self)
    }

    /// The document-level `timeZone` string.
    pub fn time_zone(&self) -> Result<String> {
        Ok(find_first_by_tag(self, TIME_ZONE_TAG)?.text_content())
    }
}

/// One output variable: a header plus its events.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    /// Position among all series of the document.
    pub index: usize,
    pub node: &'a Element,
}

impl<'a> Series<'a> {
    pub fn header(&self) -> Result<Header> {
        Header::from_series(self)
    }

    /// Events in document order. Attribute presence is checked lazily via
    /// `Event::from_node` so a bad event fails only when it is reached.
    pub fn event_nodes(&self) -> Vec<&'a Element> {
        all_event_nodes(self)
    }
}

/// A `date`/`time` attribute pair, as on `startDate` and `endDate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStamp {
    pub date: String,
    pub time: String,
}

/// Static metadata of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub parameter_id: String,
    pub station_name: String,
    pub units: String,
    pub location_id: Option<String>,
    pub missing_value: Option<String>,
    pub start: Option<DateStamp>,
    pub end: Option<DateStamp>,
}

impl Header {
    pub fn from_series(series: &Series<'_>) -> Result<Self> {
        let mut headers = series.node.children_by_tag(HEADER_TAG);
        let node = headers.next().ok_or_else(|| {
            ConversionError::MalformedDocument(format!("series #{} has no header", series.index))
        })?;
        if headers.next().is_some() {
            return Err(ConversionError::MalformedDocument(format!(
                "series #{} has more than one header",
                series.index
            )));
        }

        let required = |tag: &str| -> Result<String> {
            find_child_by_tag(node, tag)
                .map(Element::text_content)
                .map_err(|_| {
                    ConversionError::MalformedDocument(format!(
                        "header of series #{} is missing '{}'",
                        series.index, tag
                    ))
                })
        };
        let optional = |tag: &str| find_child_by_tag(node, tag).ok().map(Element::text_content);
        let stamp = |tag: &str| -> Option<DateStamp> {
            let stamp_node = find_child_by_tag(node, tag).ok()?;
            Some(DateStamp {
                date: find_attribute(stamp_node, DATE_ATTR).ok()?.to_string(),
                time: find_attribute(stamp_node, TIME_ATTR).ok()?.to_string(),
            })
        };

        Ok(Header {
            parameter_id: required(PARAMETER_ID_TAG)?,
            station_name: required(STATION_NAME_TAG)?,
            units: required(UNITS_TAG)?,
            location_id: optional(LOCATION_ID_TAG),
            missing_value: optional(MISSING_VALUE_TAG),
            start: stamp(START_DATE_TAG),
            end: stamp(END_DATE_TAG),
        })
    }
}

/// One timestamped value, borrowed from its `event` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub value: &'a str,
}

impl<'a> Event<'a> {
    pub fn from_node(node: &'a Element) -> Result<Self> {
        Ok(Event {
            date: find_attribute(node, DATE_ATTR)?,
            time: find_attribute(node, TIME_ATTR)?,
            value: find_attribute(node, VALUE_ATTR)?,
        })
    }
}
