//! HTTP client with rate limiting for encyclopedia pages

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::ScrapeConfig;

/// Scraper errors
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Delay between requests in milliseconds
    pub delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max retry attempts
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScrapeConfig::default().into()
    }
}

impl From<ScrapeConfig> for ScraperConfig {
    fn from(config: ScrapeConfig) -> Self {
        Self {
            delay_ms: config.delay_ms,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries.max(1),
            user_agent: config.user_agent,
        }
    }
}

/// Page fetcher with rate limiting
pub struct WikiClient {
    client: reqwest::Client,
    config: ScraperConfig,
    last_request: Arc<Mutex<Instant>>,
}

impl WikiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            last_request: Arc::new(Mutex::new(Instant::now() - Duration::from_secs(10))),
        })
    }

    /// Wait for rate limit
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        let delay = Duration::from_millis(self.config.delay_ms);

        if elapsed < delay {
            tokio::time::sleep(delay - elapsed).await;
        }

        *last = Instant::now();
    }

    /// Fetch HTML page with rate limiting and retry
    ///
    /// A 404 is returned at once; other failures are retried with a linear
    /// backoff.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        for attempt in 0..self.config.max_retries {
            self.wait_for_rate_limit().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(ScraperError::RequestFailed);
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(ScraperError::NotFound(url.to_string()));
                    }
                    tracing::warn!(
                        "Request failed with status {} (attempt {}/{})",
                        status,
                        attempt + 1,
                        self.config.max_retries
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.config.max_retries,
                        e
                    );
                }
            }

            if attempt + 1 < self.config.max_retries {
                let backoff = Duration::from_millis(self.config.delay_ms * (attempt as u64 + 1));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(ScraperError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.config.max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_pipeline_settings() {
        let config: ScraperConfig = ScrapeConfig {
            delay_ms: 250,
            timeout_secs: 5,
            max_retries: 0,
            user_agent: "test-agent".to_string(),
        }
        .into();

        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.timeout_secs, 5);
        // At least one attempt is always made
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_default_delay() {
        assert_eq!(ScraperConfig::default().delay_ms, 100);
    }

    #[tokio::test]
    async fn test_rate_limit_spaces_requests() {
        let client = WikiClient::new(ScraperConfig {
            delay_ms: 50,
            ..ScraperConfig::default()
        })
        .unwrap();

        let start = Instant::now();
        client.wait_for_rate_limit().await;
        client.wait_for_rate_limit().await;

        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
