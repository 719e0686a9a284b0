//! Loader for the ledger CSV export.
//!
//! Columns used: `id`, `date`, `category`, `amount`, `salary`, `balance_left`. Others
//! (`name`, `status`, `currency`, ...) are ignored.

use crate::domain::transaction::TransactionRecord;
use anyhow::{ensure, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Row {
    id: i64,
    #[serde(default)]
    date: String,
    #[serde(default)]
    category: String,
    amount: i64,
    salary: i64,
    #[serde(default)]
    balance_left: Option<f64>,
}

pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<TransactionRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open ledger csv {}", path.display()))?;
    let records = from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("ledger csv {}", path.display()))?;
    tracing::info!(path = %path.display(), records = records.len(), "ledger csv loaded");
    Ok(records)
}

pub fn from_reader<R: std::io::Read>(reader: R) -> anyhow::Result<Vec<TransactionRecord>> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    let mut undated = 0usize;
    for (i, row) in rdr.deserialize::<Row>().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let row = row.with_context(|| format!("line {line}: malformed row"))?;
        ensure!(row.amount >= 0, "line {line}: negative amount {}", row.amount);

        let date = parse_ledger_date(&row.date);
        if date.is_none() {
            undated += 1;
        }
        out.push(TransactionRecord {
            user_id: row.id,
            date,
            category: row.category,
            amount: row.amount,
            salary: row.salary,
            balance_left: row.balance_left.unwrap_or(0.0) as i64,
        });
    }

    if undated > 0 {
        tracing::warn!(undated, "ledger rows without a usable date");
    }
    Ok(out)
}

/// Date part of a ledger timestamp; `None` when it cannot be read.
pub fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
