pub mod config;
pub mod export;
pub mod serve;
pub mod stats;
pub mod timer;

use focusmode_core::Config;
use url::Url;

/// Base URL of the API server: `--api-url` if given, else the config file.
pub fn api_base(config: &Config, api_url: Option<&str>) -> Result<Url, url::ParseError> {
    Url::parse(api_url.unwrap_or(&config.server.api_url))
}

/// Turn a non-2xx response into an error carrying the server's message.
pub async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, Box<dyn std::error::Error>> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let message = body
        .get("error")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());
    Err(format!("server returned {status}: {message}").into())
}
