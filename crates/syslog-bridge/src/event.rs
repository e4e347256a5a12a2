// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The structured result of parsing one syslog datagram.

use crate::errors::WriteError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One syslog datagram, parsed.
///
/// `raw` and `received_at` are always set. The six derived fields are either
/// all present (the line matched the frame grammar) or all absent (it did
/// not), with one documented exception: `timestamp` alone is `None` when the
/// line matched but its timestamp token is not a valid calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyslogEvent {
    /// The exact original message text.
    pub raw: String,
    /// Syslog priority value, `<PRI>` on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pri: Option<u32>,
    /// `pri / 8`. Historically 0-23; larger values pass through undecoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility: Option<u32>,
    /// `pri % 8`. 0 = emergency, 7 = debug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u32>,
    /// Sender-claimed message time, year-resolved against the receipt instant.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_utc"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Sender-claimed hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Process/program tag, everything before the first colon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Free-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the bridge observed the datagram. Assigned by the listener.
    #[serde(serialize_with = "serialize_utc")]
    pub received_at: DateTime<Utc>,
}

impl SyslogEvent {
    /// The frame-miss event: only the raw text and the receipt instant.
    pub fn unparsed(raw: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        SyslogEvent {
            raw: raw.into(),
            pri: None,
            facility: None,
            severity: None,
            timestamp: None,
            host: None,
            tag: None,
            message: None,
            received_at,
        }
    }

    /// Flatten the event into the field/value pairs of one stream record.
    ///
    /// Present fields become strings, absent fields are omitted entirely
    /// (never an empty string or a null marker), and any non-string value
    /// that is not a plain scalar is rendered as compact JSON text, since
    /// the destination record model supports only flat field/value pairs.
    pub fn to_record(&self) -> Result<Vec<(String, String)>, WriteError> {
        let map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            // a struct always serializes to a JSON object
            _ => serde_json::Map::new(),
        };

        let mut fields = Vec::with_capacity(map.len());
        for (key, value) in map {
            let flat = match value {
                Value::String(text) => text,
                Value::Object(_) | Value::Array(_) => serde_json::to_string(&value)?,
                scalar => scalar.to_string(),
            };
            fields.push((key, flat));
        }
        Ok(fields)
    }
}

/// `pri` decomposes as `facility * 8 + severity`. No upper-bound check: the
/// wire grammar is the only gate, and out-of-range facilities are left for
/// downstream consumers to flag.
pub fn decode_pri(pri: u32) -> (u32, u32) {
    (pri / 8, pri % 8)
}

fn serialize_utc<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn serialize_opt_utc<S: Serializer>(
    dt: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match dt {
        Some(dt) => serialize_utc(dt, serializer),
        None => serializer.serialize_none(),
    }
}
