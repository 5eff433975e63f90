//! manual-providers - HTTP collaborator clients
//!
//! OpenAI-compatible clients for the embedding, rerank, and generation
//! collaborators, implementing the `manual-core` traits. Each request is
//! bounded by the configured timeout; retry policy lives with the caller.

mod embedding;
mod generate;
mod rerank;

pub use embedding::HttpEmbedder;
pub use generate::HttpGenerator;
pub use rerank::HttpReranker;

use manual_core::{ManualError, ProviderConfig, Result};

/// Build a client honoring the provider's timeout.
fn client(config: &ProviderConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| ManualError::http(format!("failed to build HTTP client: {}", e)))
}

/// POST a JSON body and return the parsed JSON response.
///
/// Rate-limit and availability statuses come back as `Collaborator`
/// errors so the caller's retry predicate can distinguish them.
async fn post_json(
    config: &ProviderConfig,
    service: &str,
    path: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let url = format!("{}{}", config.base_url.trim_end_matches('/'), path);

    let mut request = client(config)?.post(&url).json(body);
    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ManualError::http(format!("{} request failed: {}", service, e)))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(ManualError::collaborator(
            service,
            format!("HTTP {}: {}", status, detail),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| ManualError::http(format!("{} response was not JSON: {}", service, e)))
}
