use chrono::NaiveTime;
use thiserror::Error;

const HHMM: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time '{value}' (expected 24-hour HH:MM)")]
pub struct TimeFormatError {
    value: String,
}

impl TimeFormatError {
    pub fn value(&self) -> &str {
        &self.value
    }
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime, TimeFormatError> {
    NaiveTime::parse_from_str(value.trim(), HHMM).map_err(|_| TimeFormatError {
        value: value.to_string(),
    })
}

/// Minutes from `start` to `end`. End before start yields a negative count;
/// overnight spans are not wrapped.
pub fn try_elapsed_minutes(start: &str, end: &str) -> Result<i64, TimeFormatError> {
    let start = parse_hhmm(start)?;
    let end = parse_hhmm(end)?;
    Ok((end - start).num_minutes())
}

/// Like [`try_elapsed_minutes`] but an unparseable bound gives 0.
pub fn elapsed_minutes(start: &str, end: &str) -> i64 {
    try_elapsed_minutes(start, end).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_minutes_spans_hours() {
        assert_eq!(elapsed_minutes("09:00", "10:30"), 90);
        assert_eq!(elapsed_minutes("00:00", "23:59"), 1439);
    }

    #[test]
    fn malformed_bounds_give_zero() {
        assert_eq!(elapsed_minutes("bad", "10:30"), 0);
        assert_eq!(elapsed_minutes("09:00", "25:00"), 0);
        assert_eq!(elapsed_minutes("", ""), 0);
    }

    #[test]
    fn end_before_start_is_negative() {
        assert_eq!(elapsed_minutes("22:00", "06:00"), -960);
    }

    #[test]
    fn try_elapsed_reports_offending_value() {
        let err = try_elapsed_minutes("09:00", "noon").unwrap_err();
        assert_eq!(err.value(), "noon");
        assert!(err.to_string().contains("HH:MM"));
    }
}
