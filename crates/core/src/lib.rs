pub mod analytics;
pub mod catalog;
pub mod dialogue;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod recommend;
pub mod storage;
pub mod time;

pub use analytics::Engine;
pub use error::{AnalyticsError, ErrorKind};

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub ledger_csv_path: Option<String>,
        pub engine_config_path: Option<String>,
        pub sentry_dsn: Option<String>,
        pub dialogue_base_url: Option<String>,
        pub dialogue_api_key: Option<String>,
        pub port: Option<u16>,
    }

    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = var("PORT")
                .map(|p| p.parse::<u16>().with_context(|| format!("PORT is not a port number: {p}")))
                .transpose()?;

            Ok(Self {
                database_url: var("DATABASE_URL"),
                ledger_csv_path: var("LEDGER_CSV_PATH"),
                engine_config_path: var("ENGINE_CONFIG_PATH"),
                sentry_dsn: var("SENTRY_DSN"),
                dialogue_base_url: var("DIALOGUE_BASE_URL"),
                dialogue_api_key: var("DIALOGUE_API_KEY"),
                port,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_ledger_csv_path(&self) -> anyhow::Result<&str> {
            self.ledger_csv_path
                .as_deref()
                .context("LEDGER_CSV_PATH is required")
        }

        pub fn require_dialogue_base_url(&self) -> anyhow::Result<&str> {
            self.dialogue_base_url
                .as_deref()
                .context("DIALOGUE_BASE_URL is required")
        }
    }

}
