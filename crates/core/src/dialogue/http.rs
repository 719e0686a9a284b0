use crate::config::Settings;
use crate::dialogue::{DialogueFeed, DialogueSeed};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const THREADS_PATH: &str = "/v1/threads";

#[derive(Debug, Clone)]
pub struct HttpDialogueFeed {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retries: u32,
}

#[derive(Debug, Deserialize)]
struct ThreadCreated {
    #[serde(alias = "id")]
    thread_id: String,
}

impl HttpDialogueFeed {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_dialogue_base_url()?.to_string();
        let api_key = settings.dialogue_api_key.clone();

        let timeout_secs = std::env::var("DIALOGUE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("DIALOGUE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build dialogue http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), THREADS_PATH)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn seed_once(&self, seed: &DialogueSeed) -> Result<String> {
        let res = self
            .http
            .post(self.url())
            .headers(self.headers()?)
            .json(seed)
            .send()
            .await
            .context("dialogue request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read dialogue response")?;
        if !status.is_success() {
            anyhow::bail!("dialogue service HTTP {status}: {text}");
        }

        parse_thread_id(&text)
    }
}

fn parse_thread_id(body: &str) -> Result<String> {
    let created = serde_json::from_str::<ThreadCreated>(body)
        .with_context(|| format!("dialogue response has no thread id: {body}"))?;
    anyhow::ensure!(
        !created.thread_id.trim().is_empty(),
        "dialogue service returned an empty thread id"
    );
    Ok(created.thread_id)
}

#[async_trait::async_trait]
impl DialogueFeed for HttpDialogueFeed {
    async fn seed(&self, seed: &DialogueSeed) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.seed_once(seed).await {
                Ok(thread_id) => {
                    tracing::info!(user_id = seed.user_id, segment = %seed.segment, %thread_id, "dialogue seeded");
                    return Ok(thread_id);
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "dialogue seed failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
