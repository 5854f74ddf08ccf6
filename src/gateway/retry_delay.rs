//! Retry delay extraction from provider error payloads
//!
//! Google-style APIs attach a `google.rpc.RetryInfo` entry to the `details` list of
//! a 429 error, carrying a protobuf duration string such as `"37s"` or `"0.5s"`.
//! Depending on how the payload was wrapped on its way to us, that list can sit
//! at a handful of different paths; they are probed in order and the first usable
//! entry wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Paths (as JSON pointers) where a structured detail list may live
const DETAIL_LIST_POINTERS: &[&str] = &[
    "/error/details",
    "/details",
    "/errorDetails",
    "/response/data/error/details",
];

/// Type tag suffix identifying a retry-info detail entry
const RETRY_INFO_TYPE_SUFFIX: &str = "RetryInfo";

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)s$").expect("duration pattern is valid")
});

/// Parse a duration string of the form `<number>s` into whole milliseconds, rounding up
///
/// Returns `None` for anything else (missing suffix, non-numeric, negative, overflow).
pub fn parse_duration_ms(raw: &str) -> Option<u64> {
    let captures = DURATION.captures(raw.trim())?;
    let seconds: f64 = captures.get(1)?.as_str().parse().ok()?;
    let millis = (seconds * 1000.0).ceil();
    if !millis.is_finite() || millis < 0.0 || millis > u64::MAX as f64 {
        return None;
    }
    Some(millis as u64)
}

/// Find the provider-specified retry delay in an error payload
///
/// Never fails: malformed shapes and missing fields are "not found".
pub fn parse_retry_delay(payload: &Value) -> Option<u64> {
    DETAIL_LIST_POINTERS
        .iter()
        .filter_map(|pointer| payload.pointer(pointer).and_then(Value::as_array))
        .flatten()
        .filter(|entry| is_retry_info(entry))
        .find_map(|entry| {
            entry
                .get("retryDelay")
                .and_then(Value::as_str)
                .and_then(parse_duration_ms)
        })
}

fn is_retry_info(entry: &Value) -> bool {
    entry
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|tag| tag.ends_with(RETRY_INFO_TYPE_SUFFIX))
}
