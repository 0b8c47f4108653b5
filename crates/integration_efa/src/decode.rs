//! Departure monitor response decoding
//!
//! Turns the raw bytes of an `XML_DM_REQUEST` answer into a
//! [`DepartureMonitorResult`]. The character set is taken from the byte-order
//! mark or the document's XML declaration first, then from the charset the
//! transport reported, and falls back to UTF-8.
//!
//! The relevant part of the document looks like this:
//!
//! ```xml
//! <itdRequest>
//!   <itdDepartureMonitorRequest>
//!     <itdOdv type="stop" usage="dm">
//!       <itdOdvName state="identified">
//!         <odvNameElem matchQuality="100000" stopID="2000101">Königsplatz</odvNameElem>
//!       </itdOdvName>
//!     </itdOdv>
//!     <itdDepartureList>
//!       <itdDeparture countdown="4" platform="2">
//!         <itdDateTime>
//!           <itdDate day="11" month="2" year="2026"/>
//!           <itdTime hour="14" minute="37"/>
//!         </itdDateTime>
//!         <itdServingLine number="3" direction="Hauptbahnhof"/>
//!       </itdDeparture>
//!     </itdDepartureList>
//!   </itdDepartureMonitorRequest>
//! </itdRequest>
//! ```

use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::error::EfaError;
use crate::models::{Departure, DepartureMonitorResult, Line, ScheduledAt, Stop, StopState};

/// Decode a departure monitor response body
///
/// `transport_charset` is the `charset` parameter of the response's
/// `Content-Type`, if any. It is only consulted when the document itself
/// does not declare an encoding.
///
/// # Errors
///
/// Returns [`EfaError::MalformedResponse`] if the body cannot be decoded in
/// the resolved character set, is not well-formed XML, or lacks the
/// stop identification block.
pub fn decode(
    body: &[u8],
    transport_charset: Option<&str>,
) -> Result<DepartureMonitorResult, EfaError> {
    let text = decode_text(body, transport_charset)?;

    let raw: RawRequest = quick_xml::de::from_str(&text)
        .map_err(|e| EfaError::MalformedResponse(format!("invalid XML: {e}")))?;

    convert_request(raw)
}

/// Decode the body into text using the resolved character set
fn decode_text<'a>(
    body: &'a [u8],
    transport_charset: Option<&str>,
) -> Result<Cow<'a, str>, EfaError> {
    let (encoding, content) = match Encoding::for_bom(body) {
        Some((encoding, bom_len)) => (encoding, &body[bom_len..]),
        None => {
            let encoding = match declared_encoding(body)? {
                Some(label) => lookup_encoding(&label)?,
                None => transport_charset.map_or(Ok(UTF_8), lookup_encoding)?,
            };
            (encoding, body)
        },
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(content)
        .ok_or_else(|| {
            EfaError::MalformedResponse(format!("body is not valid {}", encoding.name()))
        })
}

/// Read the `encoding` pseudo-attribute of the XML declaration, if present
fn declared_encoding(body: &[u8]) -> Result<Option<String>, EfaError> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();

    match reader.read_event_into(&mut buf) {
        Ok(Event::Decl(decl)) => match decl.encoding() {
            Some(Ok(label)) => Ok(Some(String::from_utf8_lossy(&label).into_owned())),
            Some(Err(e)) => Err(EfaError::MalformedResponse(format!(
                "invalid XML declaration: {e}"
            ))),
            None => Ok(None),
        },
        Ok(_) => Ok(None),
        Err(e) => Err(EfaError::MalformedResponse(format!("invalid XML: {e}"))),
    }
}

fn lookup_encoding(label: &str) -> Result<&'static Encoding, EfaError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EfaError::MalformedResponse(format!("unsupported encoding {label:?}")))
}

/// Parse a numeric attribute; an empty value counts as zero
fn parse_number<T>(attribute: &str, value: &str) -> Result<T, EfaError>
where
    T: FromStr + Default,
    T::Err: Display,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(T::default());
    }
    value.parse().map_err(|e| {
        EfaError::MalformedResponse(format!("attribute {attribute}={value:?}: {e}"))
    })
}

fn convert_request(raw: RawRequest) -> Result<DepartureMonitorResult, EfaError> {
    let monitor = raw.departure_monitor.ok_or_else(|| {
        EfaError::MalformedResponse("missing itdDepartureMonitorRequest".to_string())
    })?;

    let odv_name = monitor
        .odv
        .and_then(|odv| odv.name)
        .ok_or_else(|| EfaError::MalformedResponse("missing itdOdvName".to_string()))?;

    let stop = convert_stop(odv_name)?;

    let departures = monitor
        .departure_list
        .map(|list| list.departures)
        .unwrap_or_default()
        .into_iter()
        .map(convert_departure)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DepartureMonitorResult { stop, departures })
}

fn convert_stop(raw: RawOdvName) -> Result<Stop, EfaError> {
    let state = StopState::from(raw.state);
    let first = raw.elements.into_iter().next();

    if !state.is_identified() {
        // Ambiguous or unknown stops are rejected later; keep whatever is usable.
        let elem = first.unwrap_or_default();
        return Ok(Stop {
            name: elem.name.trim().to_string(),
            id: parse_number("stopID", &elem.stop_id).unwrap_or_default(),
            match_quality: parse_number("matchQuality", &elem.match_quality)
                .unwrap_or_default(),
            state,
        });
    }

    let elem = first.ok_or_else(|| {
        EfaError::MalformedResponse("identified stop without odvNameElem".to_string())
    })?;

    Ok(Stop {
        name: elem.name.trim().to_string(),
        id: parse_number("stopID", &elem.stop_id)?,
        match_quality: parse_number("matchQuality", &elem.match_quality)?,
        state,
    })
}

fn convert_departure(raw: RawDeparture) -> Result<Departure, EfaError> {
    let date_time = raw.date_time.unwrap_or_default();
    let date = date_time.date.unwrap_or_default();
    let time = date_time.time.unwrap_or_default();
    let line = raw.serving_line.unwrap_or_default();

    Ok(Departure {
        countdown: parse_number("countdown", &raw.countdown)?,
        platform: raw.platform,
        scheduled_at: ScheduledAt {
            day: parse_number("day", &date.day)?,
            month: parse_number("month", &date.month)?,
            year: parse_number("year", &date.year)?,
            hour: parse_number("hour", &time.hour)?,
            minute: parse_number("minute", &time.minute)?,
        },
        line: Line {
            number: line.number,
            direction: line.direction,
        },
    })
}

// --- Raw XML document types for deserialization ---
//
// Numeric attributes are read as text and converted afterwards, so an empty
// attribute of a non-identified stop does not fail the whole document.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRequest {
    #[serde(rename = "itdDepartureMonitorRequest")]
    departure_monitor: Option<RawDepartureMonitorRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDepartureMonitorRequest {
    #[serde(rename = "itdOdv")]
    odv: Option<RawOdv>,
    #[serde(rename = "itdDepartureList")]
    departure_list: Option<RawDepartureList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOdv {
    #[serde(rename = "itdOdvName")]
    name: Option<RawOdvName>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOdvName {
    #[serde(rename = "@state")]
    state: String,
    #[serde(rename = "odvNameElem")]
    elements: Vec<RawOdvNameElem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOdvNameElem {
    #[serde(rename = "$text")]
    name: String,
    #[serde(rename = "@matchQuality")]
    match_quality: String,
    #[serde(rename = "@stopID")]
    stop_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDepartureList {
    #[serde(rename = "itdDeparture")]
    departures: Vec<RawDeparture>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeparture {
    #[serde(rename = "@countdown")]
    countdown: String,
    #[serde(rename = "@platform")]
    platform: String,
    #[serde(rename = "itdDateTime")]
    date_time: Option<RawDateTime>,
    #[serde(rename = "itdServingLine")]
    serving_line: Option<RawServingLine>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDateTime {
    #[serde(rename = "itdDate")]
    date: Option<RawDate>,
    #[serde(rename = "itdTime")]
    time: Option<RawTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDate {
    #[serde(rename = "@day")]
    day: String,
    #[serde(rename = "@month")]
    month: String,
    #[serde(rename = "@year")]
    year: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTime {
    #[serde(rename = "@hour")]
    hour: String,
    #[serde(rename = "@minute")]
    minute: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServingLine {
    #[serde(rename = "@number")]
    number: String,
    #[serde(rename = "@direction")]
    direction: String,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const THREE_DEPARTURES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<itdRequest version="9.0" language="de">
  <itdDepartureMonitorRequest requestID="1">
    <itdOdv type="stop" usage="dm">
      <itdOdvPlace state="identified" method="itp"><odvPlaceElem>Augsburg</odvPlaceElem></itdOdvPlace>
      <itdOdvName state="identified" method="itp">
        <odvNameElem matchQuality="100000" stopID="2000101" anyType="stop">Königsplatz</odvNameElem>
        <odvNameInput>Königsplatz</odvNameInput>
      </itdOdvName>
    </itdOdv>
    <itdDateTime ttpFrom="20251214" ttpTo="20261212"/>
    <itdServingLines>
      <itdServingLine number="3" direction="Haunstetten West P+R"/>
    </itdServingLines>
    <itdDepartureList>
      <itdDeparture stopID="2000101" countdown="0" platform="A" area="1">
        <itdDateTime>
          <itdDate year="2026" month="2" day="11" weekday="4"/>
          <itdTime hour="14" minute="33" ap=""/>
        </itdDateTime>
        <itdServingLine number="3" direction="Haunstetten West P+R" symbol="3">
          <itdNoTrain name="Straßenbahn"/>
        </itdServingLine>
      </itdDeparture>
      <itdDeparture stopID="2000101" countdown="4" platform="2">
        <itdDateTime>
          <itdDate year="2026" month="2" day="11" weekday="4"/>
          <itdTime hour="14" minute="37"/>
        </itdDateTime>
        <itdServingLine number="B32" direction="Univiertel &amp; Messe"/>
      </itdDeparture>
      <itdDeparture stopID="2000101" countdown="61" platform="">
        <itdDateTime>
          <itdDate year="2026" month="2" day="11"/>
          <itdTime hour="15" minute="34"/>
        </itdDateTime>
        <itdServingLine number="N71" direction="Hauptbahnhof"/>
      </itdDeparture>
    </itdDepartureList>
  </itdDepartureMonitorRequest>
</itdRequest>"#;

    fn latin1(text: &str) -> Vec<u8> {
        text.chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap())
            .collect()
    }

    fn stop_only(state: &str, encoding: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="{encoding}"?>
<itdRequest>
  <itdDepartureMonitorRequest>
    <itdOdv type="stop" usage="dm">
      <itdOdvName state="{state}">
        <odvNameElem matchQuality="100000" stopID="123">Königsplatz</odvNameElem>
      </itdOdvName>
    </itdOdv>
  </itdDepartureMonitorRequest>
</itdRequest>"#
        )
    }

    #[test]
    fn test_identified_without_departures() {
        let result = decode(stop_only("identified", "UTF-8").as_bytes(), None).unwrap();
        assert_eq!(result.stop.name, "Königsplatz");
        assert_eq!(result.stop.id, 123);
        assert_eq!(result.stop.match_quality, 100_000);
        assert!(result.stop.state.is_identified());
        assert!(result.departures.is_empty());
    }

    #[test]
    fn test_empty_departure_list() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"><odvNameElem stopID="7">Rathaus</odvNameElem></itdOdvName></itdOdv>
            <itdDepartureList/>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let result = decode(xml.as_bytes(), None).unwrap();
        assert_eq!(result.stop.id, 7);
        assert!(result.departures.is_empty());
    }

    #[test]
    fn test_departures_keep_document_order() {
        let result = decode(THREE_DEPARTURES.as_bytes(), None).unwrap();
        let departures = &result.departures;
        assert_eq!(departures.len(), 3);

        assert_eq!(departures[0].countdown, 0);
        assert_eq!(departures[0].platform, "A");
        assert_eq!(departures[0].line.number, "3");
        assert_eq!(departures[0].line.direction, "Haunstetten West P+R");
        assert_eq!(
            departures[0].scheduled_at,
            ScheduledAt {
                day: 11,
                month: 2,
                year: 2026,
                hour: 14,
                minute: 33,
            }
        );

        assert_eq!(departures[1].countdown, 4);
        assert_eq!(departures[1].platform, "2");
        assert_eq!(departures[1].line.number, "B32");
        assert_eq!(departures[1].line.direction, "Univiertel & Messe");
        assert_eq!(departures[1].scheduled_at.minute, 37);

        assert_eq!(departures[2].countdown, 61);
        assert_eq!(departures[2].platform, "");
        assert_eq!(departures[2].line.number, "N71");
        assert_eq!(departures[2].scheduled_at.hour, 15);
    }

    #[test]
    fn test_non_identified_state_is_kept_for_rejection() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="list">
                <odvNameElem matchQuality="900" stopID="">Königsplatz, Augsburg</odvNameElem>
                <odvNameElem matchQuality="800" stopID="">Königsplatz, Berlin</odvNameElem>
            </itdOdvName></itdOdv>
            <itdDepartureList>
                <itdDeparture countdown="4" platform="2"><itdServingLine number="3" direction="Hbf"/></itdDeparture>
            </itdDepartureList>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let result = decode(xml.as_bytes(), None).unwrap();
        assert_eq!(result.stop.state, StopState::Other("list".to_string()));
        assert_eq!(result.stop.name, "Königsplatz, Augsburg");

        match result.into_identified() {
            Err(EfaError::StopNotResolved { state }) => assert_eq!(state, "list"),
            other => panic!("expected StopNotResolved, got {other:?}"),
        }
    }

    #[test]
    fn test_not_identified_without_name_element() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="notidentified"/></itdOdv>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let result = decode(xml.as_bytes(), None).unwrap();
        assert!(!result.stop.state.is_identified());
        assert!(matches!(
            result.into_identified(),
            Err(EfaError::StopNotResolved { .. })
        ));
    }

    #[test]
    fn test_declared_latin1_is_honored() {
        let body = latin1(&stop_only("identified", "ISO-8859-1"));
        assert!(std::str::from_utf8(&body).is_err());

        let result = decode(&body, Some("utf-8")).unwrap();
        assert_eq!(result.stop.name, "Königsplatz");
    }

    #[test]
    fn test_transport_charset_used_without_declaration() {
        let xml = stop_only("identified", "UTF-8").replace(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "",
        );
        let body = latin1(&xml);

        let result = decode(&body, Some("iso-8859-1")).unwrap();
        assert_eq!(result.stop.name, "Königsplatz");
    }

    #[test]
    fn test_utf8_bom() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice(stop_only("identified", "UTF-8").as_bytes());
        let result = decode(&body, None).unwrap();
        assert_eq!(result.stop.name, "Königsplatz");
    }

    #[test]
    fn test_invalid_bytes_for_encoding() {
        let xml = stop_only("identified", "UTF-8");
        let body = latin1(&xml);
        let err = decode(&body, None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let xml = stop_only("identified", "x-no-such-charset");
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_truncated_document() {
        let cut = THREE_DEPARTURES.find("</itdDepartureList>").unwrap();
        let err = decode(THREE_DEPARTURES[..cut].as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));

        let cut = THREE_DEPARTURES.find(r#"minute="33""#).unwrap();
        let err = decode(THREE_DEPARTURES[..cut].as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_mismatched_tags() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"><odvNameElem stopID="1">A</odvNameElem></itdOdv>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_not_xml_at_all() {
        let err = decode(b"<html><body>Service Unavailable</body></html>", None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
        let err = decode(b"", None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_stop_block() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdDepartureList/>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(err.to_string().contains("itdOdvName"));

        let xml = r"<itdRequest><itdTripRequest/></itdRequest>";
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_identified_without_name_element() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"/></itdOdv>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(matches!(err, EfaError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_numeric_countdown() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"><odvNameElem stopID="1">A</odvNameElem></itdOdvName></itdOdv>
            <itdDepartureList><itdDeparture countdown="soon"/></itdDepartureList>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let err = decode(xml.as_bytes(), None).unwrap_err();
        assert!(err.to_string().contains("countdown"));
    }

    #[test]
    fn test_missing_optional_parts_default() {
        let xml = r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"><odvNameElem stopID="1">A</odvNameElem></itdOdvName></itdOdv>
            <itdDepartureList><itdDeparture countdown="3"/></itdDepartureList>
        </itdDepartureMonitorRequest></itdRequest>"#;
        let result = decode(xml.as_bytes(), None).unwrap();
        let departure = &result.departures[0];
        assert_eq!(departure.countdown, 3);
        assert_eq!(departure.platform, "");
        assert_eq!(departure.scheduled_at, ScheduledAt::default());
        assert_eq!(departure.line.number, "");
    }

    fn departure_document(countdown: i64, platform: &str) -> String {
        format!(
            r#"<itdRequest><itdDepartureMonitorRequest>
            <itdOdv><itdOdvName state="identified"><odvNameElem stopID="1">A</odvNameElem></itdOdvName></itdOdv>
            <itdDepartureList><itdDeparture countdown="{countdown}" platform="{platform}">
                <itdServingLine number="3" direction="Hbf"/>
            </itdDeparture></itdDepartureList>
            </itdDepartureMonitorRequest></itdRequest>"#
        )
    }

    proptest! {
        #[test]
        fn countdown_and_platform_survive_decoding(
            countdown in 0i64..100_000,
            platform in "[A-Za-z0-9 ]{0,8}",
        ) {
            let xml = departure_document(countdown, &platform);
            let result = decode(xml.as_bytes(), None).unwrap();
            prop_assert_eq!(result.departures.len(), 1);
            prop_assert_eq!(result.departures[0].countdown, countdown);
            prop_assert_eq!(&result.departures[0].platform, &platform);
        }
    }
}
