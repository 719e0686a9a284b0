use crate::error::AnalyticsError;
use chrono::{DateTime, NaiveDate, Utc};

// Kazakhstan runs on a single UTC+5 zone.
const KZ_OFFSET_SECS: i32 = 5 * 3600;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` request argument.
pub fn parse_date_arg(field: &'static str, value: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AnalyticsError::invalid_date(field, value))
}

/// Anchor date for the trailing window: the explicit argument, or today's local date.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> Result<NaiveDate, AnalyticsError> {
    if let Some(s) = as_of_date_arg.filter(|s| !s.trim().is_empty()) {
        return parse_date_arg("end_date", s);
    }

    let Some(kz) = chrono::FixedOffset::east_opt(KZ_OFFSET_SECS) else {
        return Ok(now_utc.date_naive());
    };
    Ok(now_utc.with_timezone(&kz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    #[test]
    fn explicit_argument_wins() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2025-06-30"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }

    #[test]
    fn rolls_to_next_local_day_late_utc_evening() {
        // 2025-10-01 20:00 UTC = 2025-10-02 01:00 in Almaty.
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 20, 0, 0).unwrap();
        let d = resolve_as_of_date(None, now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 10, 2).unwrap());
    }

    #[test]
    fn same_day_during_local_daytime() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 6, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("  "), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
    }

    #[test]
    fn malformed_dates_are_invalid_arguments() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 6, 0, 0).unwrap();
        for bad in ["2025/10/01", "01-10-2025", "2025-13-01", "yesterday"] {
            let err = resolve_as_of_date(Some(bad), now).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{bad}");
        }
    }
}
