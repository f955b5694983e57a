//! Quiz time limits, edited one unit at a time.
//!
//! The limit is stored as whole seconds. A form shows three independent inputs
//! (hours, minutes, seconds); editing one rebuilds the total from the other two
//! as they currently read plus the new value. Out-of-range values are allowed
//! and roll over when read back, so 90 minutes reads as 1 hour 30 minutes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    pub fn seconds(&self) -> u64 {
        match self {
            TimeUnit::Hours => 3600,
            TimeUnit::Minutes => 60,
            TimeUnit::Seconds => 1,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
        })
    }
}

impl FromStr for TimeUnit {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            "m" | "min" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "s" | "sec" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            other => Err(SyncError::Validation(format!(
                "Unknown time unit '{}'",
                other
            ))),
        }
    }
}

/// Read one unit out of a total.
pub fn unit_value(unit: TimeUnit, total: u64) -> u64 {
    match unit {
        TimeUnit::Hours => total / 3600,
        TimeUnit::Minutes => (total % 3600) / 60,
        TimeUnit::Seconds => total % 60,
    }
}

/// New total after the `unit` input changed to `raw`.
pub fn handle_time_change(unit: TimeUnit, raw: &str, total: u64) -> u64 {
    let value = parse_unit_input(raw);
    [TimeUnit::Hours, TimeUnit::Minutes, TimeUnit::Seconds]
        .into_iter()
        .map(|u| {
            let amount = if u == unit { value } else { unit_value(u, total) };
            amount.saturating_mul(u.seconds())
        })
        .fold(0u64, u64::saturating_add)
}

/// Lenient numeric parse: fractions truncate, negatives and junk become 0.
fn parse_unit_input(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return n.max(0) as u64;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ninety_minutes_rolls_into_hours() {
        let total = handle_time_change(TimeUnit::Minutes, "90", 0);
        assert_eq!(total, 5400);
        assert_eq!(unit_value(TimeUnit::Hours, total), 1);
        assert_eq!(unit_value(TimeUnit::Minutes, total), 30);
        assert_eq!(unit_value(TimeUnit::Seconds, total), 0);
    }

    #[test]
    fn test_other_units_are_kept() {
        // 1h 2m 3s, then set minutes to 10
        let total = handle_time_change(TimeUnit::Minutes, "10", 3723);
        assert_eq!(total, 3600 + 600 + 3);
    }

    #[test]
    fn test_negative_and_junk_clamp_to_zero() {
        assert_eq!(handle_time_change(TimeUnit::Seconds, "-5", 65), 60);
        assert_eq!(handle_time_change(TimeUnit::Hours, "abc", 7200), 0);
        assert_eq!(handle_time_change(TimeUnit::Minutes, "", 125), 5);
    }

    #[test]
    fn test_fractions_truncate() {
        assert_eq!(handle_time_change(TimeUnit::Hours, " 1.9 ", 0), 3600);
    }

    #[test]
    fn test_unit_names_parse() {
        assert_eq!("Minutes".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert_eq!("h".parse::<TimeUnit>().unwrap(), TimeUnit::Hours);
        assert!("days".parse::<TimeUnit>().is_err());
    }
}
