use crate::domain::transaction::TransactionRecord;
use crate::ledger::Ledger;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Ledger backed by the `ledger_transactions` table the import job fills.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: sqlx::PgPool,
}

impl PgLedger {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    user_id: i64,
    tx_date: Option<NaiveDate>,
    category: String,
    amount: i64,
    salary: i64,
    balance_left: i64,
}

impl From<LedgerRow> for TransactionRecord {
    fn from(r: LedgerRow) -> Self {
        TransactionRecord {
            user_id: r.user_id,
            date: r.tx_date,
            category: r.category,
            amount: r.amount,
            salary: r.salary,
            balance_left: r.balance_left,
        }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn user_records(&self, user_id: i64) -> anyhow::Result<Vec<TransactionRecord>> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            "SELECT user_id, tx_date, category, amount, salary, balance_left \
             FROM ledger_transactions \
             WHERE user_id = $1 \
             ORDER BY seq",
        )
        .persistent(false)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("select ledger_transactions failed")?;

        Ok(rows.into_iter().map(TransactionRecord::from).collect())
    }

    fn source_name(&self) -> &'static str {
        "postgres"
    }
}
