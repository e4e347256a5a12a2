// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Year resolution for classic syslog timestamps.
//!
//! RFC 3164-style timestamps carry no year. The resolver pairs the token with
//! the current year and rolls back one year when that would place the message
//! in the future, which handles December messages processed in January.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};

const MONTH_DAY_TIME_FORMAT: &str = "%Y %b %d %H:%M:%S";

/// Resolve a `%b %d %H:%M:%S` token against `now` into an absolute instant.
///
/// Returns `None` when the token is not a valid calendar date, including the
/// case where the rolled-back date does not exist (Feb 29 of a non-leap
/// year). Callers represent that as an absent timestamp; no sentinel value
/// can be told apart from a legitimate one.
pub fn resolve_timestamp(token: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // The day field may carry a leading space ("Oct  5"); collapse runs of
    // whitespace before handing the token to chrono.
    let normalized = token.split_whitespace().collect::<Vec<_>>().join(" ");
    let with_year = format!("{} {}", now.year(), normalized);
    let naive = NaiveDateTime::parse_from_str(&with_year, MONTH_DAY_TIME_FORMAT).ok()?;

    let candidate = Utc.from_utc_datetime(&naive);
    if candidate > now {
        let previous_year = naive.with_year(now.year() - 1)?;
        return Some(Utc.from_utc_datetime(&previous_year));
    }
    Some(candidate)
}
