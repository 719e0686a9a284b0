use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::catalog::EngineConfig;
use finsight_core::config::Settings;
use finsight_core::dialogue::{DialogueFeed, DialogueSeed, HttpDialogueFeed};
use finsight_core::domain::report::{AnalyticsReport, LedgerStatement, SpendingSummary};
use finsight_core::domain::Segment;
use finsight_core::ledger::{self, InMemoryLedger, Ledger, PgLedger};
use finsight_core::time::resolve_as_of_date;
use finsight_core::{AnalyticsError, Engine, ErrorKind};

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

    // An unusable engine config is fatal; a missing ledger only degrades the data routes.
    let engine = Engine::new(EngineConfig::load(settings.engine_config_path.as_deref())?)?;
    let ledger = connect_ledger(&settings).await;
    let dialogue = connect_dialogue(&settings);

    let state = AppState {
        ledger,
        engine: Arc::new(engine),
        dialogue,
    };

    let app = router(state);

    let port = settings.port.unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(segment_routes(Segment::Retail))
        .nest("/SME", segment_routes(Segment::Business))
        .route("/chat/:user_id/seed", post(seed_dialogue));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

fn segment_routes(segment: Segment) -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/transactions", get(get_transactions))
        .route("/users/:user_id/spending/3m", get(get_spending_3m))
        .route("/analytics/:user_id", get(get_analytics))
        .layer(Extension(segment))
}

async fn connect_ledger(settings: &Settings) -> Option<Arc<dyn Ledger>> {
    if let Ok(db_url) = settings.require_database_url() {
        let pool = match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                return None;
            }
        };
        if let Err(e) = finsight_core::storage::migrate(&pool).await {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
            return None;
        }
        tracing::info!("ledger: postgres");
        return Some(Arc::new(PgLedger::new(pool)));
    }

    match settings.require_ledger_csv_path() {
        Ok(path) => match ledger::csv::load_file(path) {
            Ok(records) => {
                let ledger = InMemoryLedger::new(records);
                tracing::info!(path, users = ledger.users(), records = ledger.records(), "ledger: csv");
                Some(Arc::new(ledger))
            }
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %format!("{e:#}"), "ledger csv load failed; starting API in degraded mode");
                None
            }
        },
        Err(_) => {
            tracing::warn!("neither DATABASE_URL nor LEDGER_CSV_PATH set; starting API in degraded mode");
            None
        }
    }
}

fn connect_dialogue(settings: &Settings) -> Option<Arc<dyn DialogueFeed>> {
    settings.dialogue_base_url.as_ref()?;
    match HttpDialogueFeed::from_settings(settings) {
        Ok(feed) => Some(Arc::new(feed)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "dialogue feed disabled");
            None
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    ledger: Option<Arc<dyn Ledger>>,
    engine: Arc<Engine>,
    dialogue: Option<Arc<dyn DialogueFeed>>,
}

impl AppState {
    fn ledger(&self) -> Result<&dyn Ledger, ApiError> {
        self.ledger
            .as_deref()
            .ok_or_else(|| ApiError::unavailable("ledger is not configured"))
    }
}

#[derive(Debug, Deserialize)]
struct DateRange {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsOf {
    #[serde(alias = "as_of_date")]
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedQuery {
    segment: Option<String>,
}

#[derive(Debug, Serialize)]
struct SeedResponse {
    user_id: i64,
    segment: Segment,
    thread_id: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    fn unavailable(detail: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            detail: detail.to_string(),
        }
    }

    fn internal(err: &anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: "internal error".to_string(),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        if let AnalyticsError::Source(source) = &err {
            return Self::internal(source);
        }
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

async fn get_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(range): Query<DateRange>,
) -> Result<Json<LedgerStatement>, ApiError> {
    let statement = ledger::fetch(
        state.ledger()?,
        user_id,
        range.start_date.as_deref(),
        range.end_date.as_deref(),
    )
    .await?;
    Ok(Json(statement))
}

async fn get_spending_3m(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<AsOf>,
) -> Result<Json<SpendingSummary>, ApiError> {
    let as_of = resolve_as_of_date(q.end_date.as_deref(), Utc::now())?;
    let records = ledger::history(state.ledger()?, user_id).await?;
    Ok(Json(state.engine.spending_summary(user_id, &records, as_of)?))
}

async fn get_analytics(
    State(state): State<AppState>,
    Extension(segment): Extension<Segment>,
    Path(user_id): Path<i64>,
    Query(q): Query<AsOf>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let as_of = resolve_as_of_date(q.end_date.as_deref(), Utc::now())?;
    let records = ledger::history(state.ledger()?, user_id).await?;
    let report = state.engine.analyze(segment, user_id, &records, as_of)?;
    Ok(Json(report))
}

async fn seed_dialogue(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<SeedQuery>,
) -> Result<Json<SeedResponse>, ApiError> {
    let segment = match q.segment.as_deref() {
        None => Segment::Retail,
        Some(s) => Segment::parse(s).ok_or_else(|| ApiError {
            status: StatusCode::BAD_REQUEST,
            detail: format!("unknown segment {s:?}: expected retail or business"),
        })?,
    };
    let feed = state
        .dialogue
        .clone()
        .ok_or_else(|| ApiError::unavailable("dialogue feed is not configured"))?;

    let records = ledger::history(state.ledger()?, user_id).await?;
    let as_of = resolve_as_of_date(None, Utc::now())?;
    // A user without recent activity still gets a thread, just without the window summary.
    let summary = state.engine.spending_summary(user_id, &records, as_of).ok();

    let seed = DialogueSeed::new(segment, user_id, records, summary);
    let thread_id = feed.seed(&seed).await.map_err(|e| ApiError::internal(&e))?;

    Ok(Json(SeedResponse {
        user_id,
        segment,
        thread_id,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::domain::TransactionRecord;

    fn record(date: &str, category: &str, amount: i64) -> TransactionRecord {
        TransactionRecord {
            user_id: 7,
            date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            category: category.to_string(),
            amount,
            salary: 500_000,
            balance_left: 80_000,
        }
    }

    fn state(with_ledger: bool) -> AppState {
        let ledger: Option<Arc<dyn Ledger>> = with_ledger.then(|| {
            Arc::new(InMemoryLedger::new(vec![
                record("2025-05-05", "Кофе и рестораны", 20_000),
                record("2025-06-10", "Такси", 5_000),
            ])) as Arc<dyn Ledger>
        });
        AppState {
            ledger,
            engine: Arc::new(Engine::new(EngineConfig::builtin().unwrap()).unwrap()),
            dialogue: None,
        }
    }

    fn as_of(end_date: &str) -> Query<AsOf> {
        Query(AsOf {
            end_date: Some(end_date.to_string()),
        })
    }

    #[tokio::test]
    async fn analytics_is_bound_to_the_route_segment() {
        let Json(report) = get_analytics(
            State(state(true)),
            Extension(Segment::Business),
            Path(7),
            as_of("2025-06-30"),
        )
        .await
        .unwrap();
        assert_eq!(report.segment, Segment::Business);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.product_name == "Бизнес-карта"));
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let err = get_analytics(
            State(state(true)),
            Extension(Segment::Retail),
            Path(99),
            as_of("2025-06-30"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = get_spending_3m(State(state(true)), Path(7), as_of("30.06.2025"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.detail.contains("end_date"));

        let err = get_transactions(
            State(state(false)),
            Path(7),
            Query(DateRange {
                start_date: None,
                end_date: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn seeding_without_feed_is_unavailable() {
        let err = seed_dialogue(
            State(state(true)),
            Path(7),
            Query(SeedQuery {
                segment: Some("sme".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = seed_dialogue(
            State(state(true)),
            Path(7),
            Query(SeedQuery {
                segment: Some("corp".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn healthz_sits_outside_the_versioned_prefix() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state(false))).await.unwrap();
        });

        let res = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "ok");

        let res = reqwest::get(format!("http://{addr}/api/v1/healthz")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
