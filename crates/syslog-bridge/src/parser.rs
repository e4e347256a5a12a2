// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Frame parser for classic RFC 3164-style syslog lines.
//!
//! The grammar is a single anchored expression:
//! `<PRI>MMM DD HH:MM:SS HOST TAG: BODY`. Lines that do not match it from
//! position 0 produce a raw-only event; there is no partial extraction and
//! no best-effort substring scanning.

use crate::event::{decode_pri, SyslogEvent};
use crate::timestamp::resolve_timestamp;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

// The body may contain embedded newlines; only the head of the line is
// anchored, so `(?s:.*)` keeps them verbatim. At most one whitespace
// character after the tag colon is consumed.
const FRAME_PATTERN: &str = r"^<(?P<pri>\d+)>(?P<timestamp>\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<host>\S+)\s+(?P<tag>[^:]+):\s?(?P<body>(?s:.*))$";

fn frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(FRAME_PATTERN).expect("frame pattern must compile"))
}

/// Parse one datagram's decoded, trimmed text into a [`SyslogEvent`].
///
/// `received_at` is the listener's receipt instant; it is stored on the
/// event and doubles as the reference for year resolution, which happens
/// immediately after receipt. One call, one line, one result; never an
/// error. A matched line whose timestamp token is not a valid calendar date
/// keeps every other derived field and leaves `timestamp` absent.
pub fn parse(raw: &str, received_at: DateTime<Utc>) -> SyslogEvent {
    let Some(caps) = frame_pattern().captures(raw) else {
        return SyslogEvent::unparsed(raw, received_at);
    };

    // A PRI whose digits overflow u32 is no realistic sender's priority;
    // treat it as a frame miss rather than guessing.
    let Ok(pri) = caps["pri"].parse::<u32>() else {
        return SyslogEvent::unparsed(raw, received_at);
    };
    let (facility, severity) = decode_pri(pri);

    SyslogEvent {
        raw: raw.to_string(),
        pri: Some(pri),
        facility: Some(facility),
        severity: Some(severity),
        timestamp: resolve_timestamp(&caps["timestamp"], received_at),
        host: Some(caps["host"].to_string()),
        tag: Some(caps["tag"].to_string()),
        message: Some(caps["body"].to_string()),
        received_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 11, 22, 14, 16).unwrap()
    }

    #[test]
    fn test_parse_well_formed_line() {
        let line = "<34>Oct 11 22:14:15 mymachine su: 'su root' failed for lonvick on /dev/pts/8";
        let event = parse(line, received_at());

        assert_eq!(event.pri, Some(34));
        assert_eq!(event.facility, Some(4));
        assert_eq!(event.severity, Some(2));
        assert_eq!(event.host.as_deref(), Some("mymachine"));
        assert_eq!(event.tag.as_deref(), Some("su"));
        assert_eq!(
            event.message.as_deref(),
            Some("'su root' failed for lonvick on /dev/pts/8")
        );
        assert_eq!(
            event.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 10, 11, 22, 14, 15).unwrap())
        );
        assert_eq!(event.raw, line);
        assert_eq!(event.received_at, received_at());
    }

    #[test]
    fn test_parse_miss_keeps_only_raw() {
        let line = "random line without syslog framing";
        let event = parse(line, received_at());
        assert_eq!(event, SyslogEvent::unparsed(line, received_at()));
    }

    #[test]
    fn test_parse_miss_on_unanchored_frame() {
        // the grammar must match from position 0
        let event = parse("noise <34>Oct 11 22:14:15 h su: x", received_at());
        assert_eq!(event.pri, None);
        assert_eq!(event.host, None);
    }

    #[test]
    fn test_invalid_timestamp_keeps_other_fields() {
        let event = parse("<13>Feb 30 12:00:00 host cron: tick", received_at());

        assert_eq!(event.timestamp, None);
        assert_eq!(event.pri, Some(13));
        assert_eq!(event.facility, Some(1));
        assert_eq!(event.severity, Some(5));
        assert_eq!(event.host.as_deref(), Some("host"));
        assert_eq!(event.tag.as_deref(), Some("cron"));
        assert_eq!(event.message.as_deref(), Some("tick"));
    }

    #[test]
    fn test_single_digit_day_with_leading_space() {
        let event = parse("<0>Oct  5 01:02:03 box kernel: boot", received_at());
        assert_eq!(event.host.as_deref(), Some("box"));
        assert_eq!(
            event.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 10, 5, 1, 2, 3).unwrap())
        );
    }

    #[test]
    fn test_tag_ends_at_first_colon() {
        let event = parse("<34>Oct 11 22:14:15 h app: a:b:c", received_at());
        assert_eq!(event.tag.as_deref(), Some("app"));
        assert_eq!(event.message.as_deref(), Some("a:b:c"));
    }

    #[test]
    fn test_at_most_one_space_stripped_after_colon() {
        let event = parse("<34>Oct 11 22:14:15 h app:  two spaces", received_at());
        assert_eq!(event.message.as_deref(), Some(" two spaces"));

        let event = parse("<34>Oct 11 22:14:15 h app:nospace", received_at());
        assert_eq!(event.message.as_deref(), Some("nospace"));
    }

    #[test]
    fn test_empty_body() {
        let event = parse("<34>Oct 11 22:14:15 h app: ", received_at());
        assert_eq!(event.message.as_deref(), Some(""));
    }

    #[test]
    fn test_embedded_newline_preserved_in_body() {
        let event = parse("<34>Oct 11 22:14:15 h app: line one\nline two", received_at());
        assert_eq!(event.message.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_pri_overflow_is_a_frame_miss() {
        let line = "<99999999999999999999>Oct 11 22:14:15 h app: x";
        let event = parse(line, received_at());
        assert_eq!(event, SyslogEvent::unparsed(line, received_at()));
    }

    proptest! {
        #[test]
        fn pri_decomposition_holds(pri in 0u32..=1000) {
            let line = format!("<{pri}>Oct 11 22:14:15 host app: hello");
            let event = parse(&line, received_at());
            prop_assert_eq!(event.pri, Some(pri));
            prop_assert_eq!(event.facility, Some(pri / 8));
            prop_assert_eq!(event.severity, Some(pri % 8));
        }
    }
}
