//! Alert feed wire format
//!
//! The feed wraps a JSON object in a UTF-8 byte-order mark and a trailing
//! CRLF. An empty body, or a bare BOM + CRLF heartbeat, means no alert.
//! Payload shape: `{ "id": "<alarm id>", "data": ["<location code>", ...] }`

use crate::domain::error::FeedError;
use crate::domain::types::RawAlert;
use serde_json::Value;

/// UTF-8 byte-order mark the feed prepends to every body
const BOM: &[u8] = b"\xef\xbb\xbf";
/// Trailing line terminator the feed appends to every body
const CRLF: &[u8] = b"\r\n";

/// Decode one feed response into a `RawAlert`
///
/// `None` and empty bodies both decode to the no-alert value.
pub fn parse(raw: Option<&[u8]>) -> Result<RawAlert, FeedError> {
    let Some(raw) = raw else {
        return Ok(RawAlert::none());
    };

    let body = raw.strip_prefix(BOM).unwrap_or(raw);
    let body = body.strip_suffix(CRLF).unwrap_or(body);

    // Idle heartbeat: nothing left once the wrapper is removed
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawAlert::none());
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        FeedError::Parse(format!("{} ({})", e, String::from_utf8_lossy(raw)))
    })?;

    let alarm_id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::Schema(format!("`id` not found in {}", value)))?;

    let codes = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| FeedError::Schema(format!("`data` not found in {}", value)))?;

    let location_codes = codes
        .iter()
        .map(|code| {
            code.as_str()
                .map(str::to_string)
                .ok_or_else(|| FeedError::Schema(format!("non-string entry {} in `data`", code)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawAlert::new(alarm_id, location_codes))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Captured response from the live feed
    const SAMPLE: &[u8] = b"\xef\xbb\xbf{\r\n  \"id\": \"132949694460000000\",\r\n  \"cat\": \"1\",\r\n  \"title\": \"\xd7\x99\xd7\xa8\xd7\x99 \xd7\x98\xd7\x99\xd7\x9c\xd7\x99\xd7\x9d \xd7\x95\xd7\xa8\xd7\xa7\xd7\x98\xd7\x95\xd7\xaa\",\r\n  \"data\": [\r\n    \"\xd7\xa9\xd7\x93\xd7\xa8\xd7\x95\xd7\xaa, \xd7\x90\xd7\x99\xd7\x91\xd7\x99\xd7\x9d, \xd7\xa0\xd7\x99\xd7\xa8 \xd7\xa2\xd7\x9d\",\r\n    \"\xd7\x90\xd7\xa8\xd7\x96\",\r\n    \"\xd7\x9e\xd7\xa4\xd7\x9c\xd7\xa1\xd7\x99\xd7\x9d\",\r\n    \"\xd7\x9e\xd7\x98\xd7\x95\xd7\x95\xd7\x97 \xd7\xa0\xd7\x99\xd7\xa8 \xd7\xa2\xd7\x9d\"\r\n  ],\r\n  \"desc\": \"\xd7\x94\xd7\x99\xd7\x9b\xd7\xa0\xd7\xa1\xd7\x95 \xd7\x9c\xd7\x9e\xd7\xa8\xd7\x97\xd7\x91 \xd7\x94\xd7\x9e\xd7\x95\xd7\x92\xd7\x9f\"\r\n}\r\n";

    #[test]
    fn test_parse_sample() {
        let alert = parse(Some(SAMPLE)).unwrap();
        assert_eq!(alert.alarm_id.as_deref(), Some("132949694460000000"));
        assert_eq!(
            alert.location_codes,
            vec!["שדרות, איבים, ניר עם", "ארז", "מפלסים", "מטווח ניר עם"]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(None).unwrap(), RawAlert::none());
        assert_eq!(parse(Some(b"")).unwrap(), RawAlert::none());
    }

    #[test]
    fn test_parse_idle_heartbeat() {
        assert!(parse(Some(b"\xef\xbb\xbf\r\n")).unwrap().is_empty());
        assert!(parse(Some(b"\xef\xbb\xbf")).unwrap().is_empty());
        assert!(parse(Some(b"\r\n")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_unwrapped_json() {
        let alert = parse(Some(br#"{"id": "7", "data": ["a", "b"]}"#)).unwrap();
        assert_eq!(alert.alarm_id.as_deref(), Some("7"));
        assert_eq!(alert.location_codes, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse(Some(b"\xef\xbb\xbf<html>nope</html>\r\n")).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_parse_missing_id() {
        let err = parse(Some(b"\xef\xbb\xbf{\"data\": [\"a\"]}\r\n")).unwrap_err();
        assert!(matches!(err, FeedError::Schema(ref msg) if msg.contains("id")));
    }

    #[test]
    fn test_parse_missing_data() {
        let err = parse(Some(b"\xef\xbb\xbf{\"id\": \"1\"}\r\n")).unwrap_err();
        assert!(matches!(err, FeedError::Schema(ref msg) if msg.contains("data")));
    }

    #[test]
    fn test_parse_non_string_code() {
        let err = parse(Some(br#"{"id": "1", "data": ["a", 2]}"#)).unwrap_err();
        assert!(matches!(err, FeedError::Schema(_)));
    }

    #[test]
    fn test_parse_empty_data_is_no_alert() {
        let alert = parse(Some(br#"{"id": "1", "data": []}"#)).unwrap();
        assert!(alert.is_empty());
        assert_eq!(alert.alarm_id.as_deref(), Some("1"));
    }
}
