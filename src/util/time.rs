// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Timestamps for records and human-readable relative times for the feed.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;
const WEEK: i64 = DAY * 7;
const MONTH: i64 = DAY * 30;

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Rounds half toward positive infinity, so -2.5 becomes -2.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn relative(amount: i64, unit: &str) -> String {
    let plural = if amount.abs() == 1 { "" } else { "s" };
    if amount < 0 {
        format!("{} {}{} ago", amount.abs(), unit, plural)
    } else {
        format!("in {} {}{}", amount, unit, plural)
    }
}

/// Describe `timestamp` relative to `now` (both unix milliseconds).
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    if timestamp == 0 {
        return "Unknown time".to_string();
    }

    let diff_seconds = round_half_up((timestamp - now) as f64 / 1000.0);
    let abs_seconds = diff_seconds.abs();

    if abs_seconds < 45 {
        return "Just now".to_string();
    }
    if abs_seconds < HOUR {
        return relative(round_half_up(diff_seconds as f64 / MINUTE as f64), "minute");
    }
    if abs_seconds < DAY {
        return relative(round_half_up(diff_seconds as f64 / HOUR as f64), "hour");
    }

    let day_diff = round_half_up(diff_seconds as f64 / DAY as f64);
    match day_diff {
        0 => return "Today".to_string(),
        -1 => return "Yesterday".to_string(),
        1 => return "Tomorrow".to_string(),
        d if d.abs() < 7 => return relative(d, "day"),
        _ => {}
    }

    if abs_seconds < MONTH {
        return relative(round_half_up(diff_seconds as f64 / WEEK as f64), "week");
    }

    match DateTime::<Utc>::from_timestamp_millis(timestamp) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "Unknown time".to_string(),
    }
}
