use anyhow::Context;

// Advisory locks belong to the session, so acquire and release on the same connection.
const IMPORT_LOCK_KEY: i64 = 0x4C45_4447_4552; // "LEDGER"

pub async fn try_acquire_import_lock(conn: &mut sqlx::PgConnection) -> anyhow::Result<bool> {
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(IMPORT_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await
        .context("failed to acquire ledger import lock")?;
    Ok(acquired.0)
}

pub async fn release_import_lock(conn: &mut sqlx::PgConnection) -> anyhow::Result<()> {
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .persistent(false)
        .bind(IMPORT_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .context("failed to release ledger import lock")?;
    Ok(())
}
