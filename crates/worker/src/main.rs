use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::config::Settings;
use finsight_core::storage::{ledger_import, lock};

mod plan;

#[derive(Debug, Parser)]
#[command(name = "finsight_worker")]
struct Args {
    /// Ledger CSV export to import. Defaults to LEDGER_CSV_PATH.
    #[arg(long)]
    csv: Option<String>,

    /// Parse and summarise without writing to the database.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let source = match args.csv.as_deref() {
        Some(path) => path,
        None => settings.require_ledger_csv_path()?,
    };

    let records = finsight_core::ledger::csv::load_file(source)?;
    let plan = plan::plan(&records);
    for (user_id, rows) in &plan.per_user {
        tracing::debug!(user_id, rows, "user rows");
    }
    if !plan.salary_conflicts.is_empty() {
        tracing::warn!(users = ?plan.salary_conflicts, "salary differs between rows of the same user");
    }
    tracing::info!(
        source,
        rows = plan.rows,
        users = plan.per_user.len(),
        undated = plan.undated,
        unknown_category = plan.unknown_category,
        dry_run = args.dry_run,
        "ledger import planned"
    );

    if args.dry_run || records.is_empty() {
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    finsight_core::storage::migrate(&pool).await?;

    let mut lock_conn = pool.acquire().await.context("acquire lock connection failed")?;
    if !lock::try_acquire_import_lock(&mut lock_conn).await? {
        tracing::warn!("ledger import lock not acquired; another import in progress");
        return Ok(());
    }

    match ledger_import::replace_user_records(&pool, &records).await {
        Ok(inserted) => {
            let run_id =
                ledger_import::record_import_run(&pool, source, "success", None, inserted).await?;
            tracing::info!(%run_id, inserted, "ledger import finished");
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let detail = format!("{err:#}");
            let run_id =
                ledger_import::record_import_run(&pool, source, "error", Some(detail.as_str()), 0).await?;
            tracing::error!(%run_id, error = %err, "ledger import failed");
        }
    }

    let _ = lock::release_import_lock(&mut lock_conn).await;
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
