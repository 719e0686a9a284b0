//! The read path into transaction data.

pub mod csv;
pub mod memory;
pub mod postgres;

use crate::domain::report::LedgerStatement;
use crate::domain::transaction::TransactionRecord;
use crate::error::AnalyticsError;
use crate::time::parse_date_arg;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every record of `user_id` in source order; empty when the user is unknown.
    async fn user_records(&self, user_id: i64) -> anyhow::Result<Vec<TransactionRecord>>;

    fn source_name(&self) -> &'static str;
}

/// Full history of a user, failing with `UserNotFound` when there is none.
pub async fn history(
    ledger: &dyn Ledger,
    user_id: i64,
) -> Result<Vec<TransactionRecord>, AnalyticsError> {
    let records = ledger.user_records(user_id).await?;
    if records.is_empty() {
        return Err(AnalyticsError::UserNotFound { user_id });
    }
    Ok(records)
}

/// A user's records, optionally narrowed to `[start_date, end_date]` (inclusive, date only).
///
/// Undated records are kept only when no bound is given.
pub async fn fetch(
    ledger: &dyn Ledger,
    user_id: i64,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<LedgerStatement, AnalyticsError> {
    let start = parse_bound("start_date", start_date)?;
    let end = parse_bound("end_date", end_date)?;

    let records = history(ledger, user_id).await?;
    let (salary, balance_left) = (records[0].salary, records[0].balance_left);

    let transactions: Vec<TransactionRecord> = if start.is_none() && end.is_none() {
        records
    } else {
        records
            .into_iter()
            .filter(|r| within(r.date, start, end))
            .collect()
    };
    if transactions.is_empty() {
        return Err(AnalyticsError::NoRecordsInRange { user_id });
    }

    tracing::debug!(
        user_id,
        source = ledger.source_name(),
        ?start,
        ?end,
        count = transactions.len(),
        "ledger fetched"
    );

    Ok(LedgerStatement {
        user_id,
        salary,
        balance_left,
        total_spent: transactions.iter().fold(0i64, |acc, r| acc.saturating_add(r.amount)),
        transactions_count: transactions.len(),
        transactions,
    })
}

fn parse_bound(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, AnalyticsError> {
    match value {
        Some(v) if !v.trim().is_empty() => parse_date_arg(field, v).map(Some),
        _ => Ok(None),
    }
}

fn within(date: Option<NaiveDate>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let Some(d) = date else {
        return false;
    };
    start.map_or(true, |s| s <= d) && end.map_or(true, |e| d <= e)
}
