// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Time bucketing and windowed storage-key derivation.
//!
//! Every counter lives under keys of the form
//! `{pv|uv}_[{page_type}_]{day|hour|min}_{bucket}` where the bucket is the
//! event timestamp truncated to the granularity and rendered as epoch
//! seconds. The per-day UV distinct set is keyed `uv_hpll_{day_bucket}`.

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::page::PageRef;
use crate::visit::CounterKind;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Hour,
    Min,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Granularity::Day, Granularity::Hour, Granularity::Min];

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Hour => "hour",
            Granularity::Min => "min",
        }
    }
}

/// Truncates a beacon timestamp to the granularity and returns it as epoch
/// seconds. Accepts `%Y-%m-%d %H:%M:%S` or a raw epoch-seconds integer.
///
/// Unparseable timestamps (including the empty timestamp of a degraded
/// beacon) bucket deterministically to 0 so degraded traffic stays visible
/// under a single well-known key per granularity.
pub fn bucket(timestamp: &str, granularity: Granularity) -> i64 {
    let Some(parsed) = parse_timestamp(timestamp) else {
        return 0;
    };
    let truncated = match granularity {
        Granularity::Day => parsed.date().and_hms_opt(0, 0, 0),
        Granularity::Hour => parsed.with_minute(0).and_then(|dt| dt.with_second(0)),
        Granularity::Min => parsed.with_second(0),
    };
    truncated.map_or(0, |dt| dt.and_utc().timestamp())
}

fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT) {
        return Some(parsed);
    }
    timestamp
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
}

/// The key of the per-day approximate-distinct set used for UV admission.
pub fn distinct_day_key(timestamp: &str) -> String {
    format!("uv_hpll_{}", bucket(timestamp, Granularity::Day))
}

/// The six windowed sorted-set keys one increment request fans out to:
/// {site-wide, per-page-type} x {day, hour, min}.
pub fn storage_keys(kind: CounterKind, page: &PageRef, timestamp: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(6);
    for granularity in Granularity::ALL {
        keys.push(format!(
            "{}_{}_{}",
            kind,
            granularity.as_str(),
            bucket(timestamp, granularity)
        ));
    }
    for granularity in Granularity::ALL {
        keys.push(format!(
            "{}_{}_{}_{}",
            kind,
            page.page_type,
            granularity.as_str(),
            bucket(timestamp, granularity)
        ));
    }
    keys
}
