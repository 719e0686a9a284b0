use crate::domain::transaction::TransactionRecord;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

const DEFAULT_BATCH: usize = 500;

/// Replaces every stored row of the users present in `records`, inside one transaction.
///
/// Source order is preserved through the `seq` column.
pub async fn replace_user_records(
    pool: &sqlx::PgPool,
    records: &[TransactionRecord],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!records.is_empty(), "records must be non-empty");

    let chunk_size: usize = std::env::var("LEDGER_IMPORT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_BATCH);
    anyhow::ensure!(chunk_size >= 1, "LEDGER_IMPORT_BATCH must be >= 1");

    let users: Vec<i64> = records
        .iter()
        .map(|r| r.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let deleted = sqlx::query("DELETE FROM ledger_transactions WHERE user_id = ANY($1)")
        .persistent(false)
        .bind(&users)
        .execute(&mut *tx)
        .await
        .context("delete previous ledger_transactions failed")?
        .rows_affected();
    tracing::debug!(users = users.len(), deleted, "previous ledger rows removed");

    let mut inserted: u64 = 0;
    for (batch_idx, chunk) in records.chunks(chunk_size).enumerate() {
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO ledger_transactions (user_id, tx_date, category, amount, salary, balance_left) ",
        );
        qb.push_values(chunk, |mut b, r| {
            b.push_bind(r.user_id)
                .push_bind(r.date)
                .push_bind(r.category.trim())
                .push_bind(r.amount)
                .push_bind(r.salary)
                .push_bind(r.balance_left);
        });

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch insert ledger_transactions failed")?;
        inserted += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "ledger_transactions batch insert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(inserted)
}

pub async fn record_import_run(
    pool: &sqlx::PgPool,
    source: &str,
    status: &str,
    error: Option<&str>,
    rows: u64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let imported_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO ledger_import_runs (id, imported_at, source, status, error, rows) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(id)
    .bind(imported_at)
    .bind(source)
    .bind(status)
    .bind(error)
    .bind(i64::try_from(rows).unwrap_or(i64::MAX))
    .execute(pool)
    .await
    .context("insert ledger_import_runs failed")?;

    Ok(id)
}
