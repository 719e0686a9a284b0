use chrono::NaiveDate;
use std::fmt;

/// Coarse class used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Internal,
}

#[derive(Debug)]
pub enum AnalyticsError {
    /// The ledger holds no records at all for this user.
    UserNotFound { user_id: i64 },
    /// A date filter left zero records.
    NoRecordsInRange { user_id: i64 },
    /// The user exists but has no dated records in the trailing window.
    EmptyWindow {
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },
    InvalidArgument { field: &'static str, value: String },
    /// Ledger I/O failed.
    Source(anyhow::Error),
}

impl AnalyticsError {
    pub fn invalid_date(field: &'static str, value: &str) -> Self {
        AnalyticsError::InvalidArgument {
            field,
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyticsError::UserNotFound { .. }
            | AnalyticsError::NoRecordsInRange { .. }
            | AnalyticsError::EmptyWindow { .. } => ErrorKind::NotFound,
            AnalyticsError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            AnalyticsError::Source(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyticsError::UserNotFound { user_id } => {
                write!(f, "user {user_id} not found")
            }
            AnalyticsError::NoRecordsInRange { user_id } => {
                write!(f, "no transactions for user {user_id} in the requested range")
            }
            AnalyticsError::EmptyWindow {
                user_id,
                start,
                end,
            } => write!(
                f,
                "no transactions for user {user_id} between {start} and {end}"
            ),
            AnalyticsError::InvalidArgument { field, value } => {
                write!(f, "invalid {field} {value:?}: expected YYYY-MM-DD")
            }
            AnalyticsError::Source(err) => write!(f, "ledger source failed: {err:#}"),
        }
    }
}

impl std::error::Error for AnalyticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyticsError::Source(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AnalyticsError {
    fn from(err: anyhow::Error) -> Self {
        AnalyticsError::Source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            AnalyticsError::UserNotFound { user_id: 1 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AnalyticsError::EmptyWindow {
                user_id: 1,
                start: d,
                end: d
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AnalyticsError::invalid_date("end_date", "2025/01/01").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            AnalyticsError::from(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn invalid_argument_message_names_field() {
        let err = AnalyticsError::invalid_date("start_date", "01-02-2025");
        assert_eq!(
            err.to_string(),
            "invalid start_date \"01-02-2025\": expected YYYY-MM-DD"
        );
    }
}
