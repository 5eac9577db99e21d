// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The current instant as (server-local wall clock, UTC).
///
/// Check-in days are server-local calendar days.
pub fn now_local_and_utc() -> (NaiveDateTime, DateTime<Utc>) {
    let now = Utc::now();
    (now.with_timezone(&Local).naive_local(), now)
}
