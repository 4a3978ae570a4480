//! HTTP client for the external LLM completion server (C13 collaborator).
//! Wire format is a thin JSON envelope around [`LlmRequest`]/[`LlmResponse`]
//! — prompt engineering and model selection live above this boundary in
//! `sa-orchestrator`, per spec.md §1.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use sa_domain::config::LlmConfig;
use sa_domain::error::{Error, Result};
use sa_domain::llm::{LlmClient, LlmRequest, LlmResponse, LlmToken};
use sa_domain::stream::BoxStream;
use sa_domain::trace::TraceEvent;

pub struct HttpLlmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        let api_key = config.api_key_env.as_deref().and_then(|var| std::env::var(var).ok());
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("building reqwest client for LLM completion server");
        Self { client, base_url: config.base_url.clone(), api_key }
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let url = format!("{}/v1/complete", self.base_url.trim_end_matches('/'));
        let response = self
            .request(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("LLM completion request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!("LLM completion server returned {}", response.status())));
        }

        let response = response.json::<LlmResponse>().await.map_err(|e| Error::Upstream(format!("LLM completion response malformed: {e}")))?;

        TraceEvent::LlmRequest {
            provider: self.base_url.clone(),
            model: response.model.clone().unwrap_or_else(|| "unknown".to_string()),
            role: "assistant".to_string(),
            streaming: false,
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: None,
            completion_tokens: None,
        }
        .emit();

        Ok(response)
    }

    async fn stream(&self, request: LlmRequest) -> Result<BoxStream<'static, LlmToken>> {
        let url = format!("{}/v1/complete/stream", self.base_url.trim_end_matches('/'));
        let response = self
            .request(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("LLM stream request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!("LLM completion server returned {}", response.status())));
        }

        let mut bytes_stream = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut buf = String::new();
            while let Some(chunk) = bytes_stream.next().await {
                let Ok(chunk) = chunk else { break };
                buf.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buf.find("\n\n") {
                    let frame = buf[..pos].to_string();
                    buf.drain(..pos + 2);
                    let Some(payload) = frame.strip_prefix("data: ") else { continue };
                    if payload == "[DONE]" {
                        yield LlmToken { text: String::new(), done: true };
                        return;
                    }
                    if let Ok(token) = serde_json::from_str::<LlmToken>(payload) {
                        yield token;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
