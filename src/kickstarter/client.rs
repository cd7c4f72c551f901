//! HTTP client for Kickstarter pledge pages using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::kickstarter::markers::PLEDGE_PATH;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// Builds the pledge page URL for a project: query and fragment are dropped
/// and the pledge path is appended.
pub fn pledge_url(project_url: &str) -> String {
    let base = project_url.split(['?', '#']).next().unwrap_or_default().trim_end_matches('/');
    format!("{}{}", base, PLEDGE_PATH)
}

/// A single failed attempt to retrieve a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: status {0}")]
    Status(u16),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("General error: {0}")]
    Other(String),
}

impl FetchError {
    /// Short label for the kind of failure, used in retry logs.
    pub fn class(&self) -> &'static str {
        match self {
            FetchError::Status(_) => "HTTP error",
            FetchError::Timeout(_) => "Timeout",
            FetchError::Connection(_) => "Connection error",
            FetchError::Other(_) => "General error",
        }
    }
}

impl From<wreq::Error> for FetchError {
    fn from(err: wreq::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// Trait for one attempt at fetching a page - enables mocking for tests.
#[async_trait]
pub trait PledgeFetch: Send + Sync {
    /// Performs a GET and returns the body decoded as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Kickstarter HTTP client with browser impersonation.
pub struct KickstarterClient {
    client: Client,
}

impl KickstarterClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PledgeFetch for KickstarterClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config { request_timeout_secs: 5, ..Config::default() }
    }

    #[test]
    fn test_pledge_url() {
        assert_eq!(
            pledge_url("https://www.kickstarter.com/projects/me/thing"),
            "https://www.kickstarter.com/projects/me/thing/pledge/new"
        );
        assert_eq!(
            pledge_url("https://www.kickstarter.com/projects/me/thing?ref=home"),
            "https://www.kickstarter.com/projects/me/thing/pledge/new"
        );
        assert_eq!(
            pledge_url("https://www.kickstarter.com/projects/me/thing/#faq"),
            "https://www.kickstarter.com/projects/me/thing/pledge/new"
        );
    }

    #[test]
    fn test_fetch_error_class() {
        assert_eq!(FetchError::Status(500).class(), "HTTP error");
        assert_eq!(FetchError::Timeout("t".into()).class(), "Timeout");
        assert_eq!(FetchError::Connection("c".into()).class(), "Connection error");
        assert_eq!(FetchError::Other("o".into()).class(), "General error");
        assert!(FetchError::Status(404).to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = r#"<html><body><li class="pledge--all-gone">Sold out</li></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/projects/me/thing/pledge/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let client = KickstarterClient::new(&make_test_config()).unwrap();
        let url = pledge_url(&format!("{}/projects/me/thing?ref=discovery", mock_server.uri()));

        let body = client.fetch(&url).await.unwrap();
        assert!(body.contains("pledge--all-gone"));
    }

    #[tokio::test]
    async fn test_fetch_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = KickstarterClient::new(&make_test_config()).unwrap();
        let err = client.fetch(&format!("{}/missing", mock_server.uri())).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
        assert_eq!(err.class(), "HTTP error");
    }

    #[tokio::test]
    async fn test_fetch_http_error_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = KickstarterClient::new(&make_test_config()).unwrap();
        let err = client.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_empty_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let client = KickstarterClient::new(&make_test_config()).unwrap();
        assert!(client.fetch(&mock_server.uri()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let client = KickstarterClient::new(&make_test_config()).unwrap();
        let err = client.fetch("http://127.0.0.1:1/pledge/new").await.unwrap_err();
        assert!(!matches!(err, FetchError::Status(_)));
    }
}
