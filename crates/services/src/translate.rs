use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text translation backend. One call per (text, target) pair; callers
/// decide what a failure means for them.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// REST translation client (LibreTranslate-compatible request shape).
pub struct HttpTranslator {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTranslator {
    pub fn new(url: &str, api_key: Option<&str>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build translation HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
        })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        let request = TranslateRequest {
            q: text,
            source,
            target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("translation request to '{}' failed", self.url))?
            .error_for_status()
            .context("translation backend returned an error status")?;
        let body: TranslateResponse = response
            .json()
            .await
            .context("unparseable translation response")?;
        Ok(body.translated_text)
    }
}
