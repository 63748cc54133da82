// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Beacon extraction from raw access-log lines.
//!
//! A beacon is the query string of a tracking-pixel request embedded in the
//! log line, introduced by `" /dig?"` and terminated by the protocol-version
//! marker `" HTTP/"`. The marker is matched without the version digits so
//! both HTTP/1.0 and HTTP/1.1 clients are covered.

use percent_encoding::percent_decode_str;

const BEACON_MARKER: &str = " /dig?";
const PROTOCOL_MARKER: &str = " HTTP/";

/// Client-side telemetry carried by one beacon request.
///
/// All fields may be empty: a line without a beacon, or with a beacon that
/// fails to decode, degrades to an all-empty event rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeaconEvent {
    pub time: String,
    pub url: String,
    pub refer: String,
    pub ua: String,
}

/// Tagged outcome of beacon extraction.
///
/// `Degraded` is not an error: the record still flows through the pipeline
/// as an all-empty event and is counted under whatever page the empty URL
/// classifies to. The tag exists so callers and tests can observe the
/// degradation instead of inferring it from empty fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Parsed(BeaconEvent),
    Degraded,
}

impl Extraction {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded)
    }

    /// The event to feed downstream; `Degraded` yields the empty event.
    pub fn into_event(self) -> BeaconEvent {
        match self {
            Extraction::Parsed(event) => event,
            Extraction::Degraded => BeaconEvent::default(),
        }
    }
}

/// Extracts the beacon query string from one raw log line.
pub fn extract(line: &str) -> Extraction {
    let line = line.trim();
    let Some(start) = line.find(BEACON_MARKER) else {
        return Extraction::Degraded;
    };
    let query_start = start + BEACON_MARKER.len();
    let Some(query_len) = line[query_start..].find(PROTOCOL_MARKER) else {
        return Extraction::Degraded;
    };
    let query = &line[query_start..query_start + query_len];

    let mut event = BeaconEvent::default();
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let Some(value) = decode_component(value) else {
            return Extraction::Degraded;
        };
        match key {
            "time" => event.time = value,
            "url" => event.url = value,
            "refer" => event.refer = value,
            "ua" => event.ua = value,
            _ => {}
        }
    }
    Extraction::Parsed(event)
}

// Form-urlencoded component: '+' is a space, percent escapes must decode to
// valid UTF-8 or the whole beacon is treated as unparseable.
fn decode_component(raw: &str) -> Option<String> {
    let raw = raw.replace('+', " ");
    percent_decode_str(&raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_line(time: &str, url: &str, refer: &str, ua: &str) -> String {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("time", time)
            .append_pair("url", url)
            .append_pair("refer", refer)
            .append_pair("ua", ua)
            .finish();
        format!(
            "127.0.0.1 - - [08/Mar/2018:00:48:34 +0800] \"OPTIONS /dig?{} HTTP/1.1\" 200 43 \"-\" \"{}\" \"-\"",
            query, ua
        )
    }

    #[test]
    fn test_extract_well_formed_line() {
        let line = encoded_line(
            "2018-03-08 00:48:34",
            "http://localhost:8888/movie/12846.html",
            "http://localhost:8888/list/2.html",
            "Mozilla/5.0 (Windows NT 6.1; rv:2.0.1) Gecko/20100101 Firefox/4.0.1",
        );
        let Extraction::Parsed(event) = extract(&line) else {
            panic!("expected parsed event");
        };
        assert_eq!(event.time, "2018-03-08 00:48:34");
        assert_eq!(event.url, "http://localhost:8888/movie/12846.html");
        assert_eq!(event.refer, "http://localhost:8888/list/2.html");
        assert_eq!(
            event.ua,
            "Mozilla/5.0 (Windows NT 6.1; rv:2.0.1) Gecko/20100101 Firefox/4.0.1"
        );
    }

    #[test]
    fn test_extract_line_without_marker_degrades() {
        let line = "127.0.0.1 - - [08/Mar/2018:00:48:34 +0800] \"GET /index.html HTTP/1.1\" 200 43";
        let extraction = extract(line);
        assert!(extraction.is_degraded());
        assert_eq!(extraction.into_event(), BeaconEvent::default());
    }

    #[test]
    fn test_extract_http10_terminator() {
        let line = "x \"OPTIONS /dig?time=1&url=u&refer=r&ua=a HTTP/1.0\" 200 43";
        let Extraction::Parsed(event) = extract(line) else {
            panic!("expected parsed event");
        };
        assert_eq!(event.time, "1");
        assert_eq!(event.url, "u");
    }

    #[test]
    fn test_extract_missing_protocol_marker_degrades() {
        let line = "127.0.0.1 - - \"OPTIONS /dig?time=1&url=u";
        assert!(extract(line).is_degraded());
    }

    #[test]
    fn test_extract_invalid_percent_encoding_degrades() {
        // %FF is not valid UTF-8 once decoded
        let line = "x \"OPTIONS /dig?time=1&url=%FF%FE&refer=r&ua=a HTTP/1.1\" 200";
        assert!(extract(line).is_degraded());
    }

    #[test]
    fn test_extract_missing_fields_stay_empty() {
        let line = "x \"OPTIONS /dig?time=1 HTTP/1.1\" 200";
        let Extraction::Parsed(event) = extract(line) else {
            panic!("expected parsed event");
        };
        assert_eq!(event.time, "1");
        assert_eq!(event.url, "");
        assert_eq!(event.refer, "");
        assert_eq!(event.ua, "");
    }

    #[test]
    fn test_extract_plus_decodes_to_space() {
        let line = "x \"OPTIONS /dig?ua=Mozilla%2F4.0+compatible HTTP/1.1\" 200";
        let Extraction::Parsed(event) = extract(line) else {
            panic!("expected parsed event");
        };
        assert_eq!(event.ua, "Mozilla/4.0 compatible");
    }
}
