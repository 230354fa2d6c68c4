use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::ScanConfig;

pub const PSI_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Device profile the measurement runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure for one (URL, strategy) pair after all attempts.
/// Carries the last HTTP status or transport error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub detail: String,
}

/// One attempt's result: the HTTP status and, on 200, the parsed body.
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// Seam between the retry loop and the wire, so tests can count attempts
/// and stub responses.
pub trait Transport {
    async fn get(&self, target: &str, strategy: Strategy) -> Result<TransportResponse, String>;
}

/// Production transport: one GET against the PSI endpoint per call.
pub struct HttpTransport {
    client: Client,
    api_key: String,
    categories: Vec<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ScanConfig) -> Result<Self, String> {
        let client = Client::builder()
            .build()
            .map_err(|e| format!("client build failed: {e}"))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            categories: config.categories.clone(),
            timeout: config.request_timeout,
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, target: &str, strategy: Strategy) -> Result<TransportResponse, String> {
        let mut query: Vec<(&str, &str)> = vec![
            ("url", target),
            ("strategy", strategy.as_str()),
            ("key", &self.api_key),
        ];
        for category in &self.categories {
            query.push(("category", category));
        }

        let resp = self
            .client
            .get(PSI_ENDPOINT)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Ok(TransportResponse {
                status,
                body: Value::Null,
            });
        }

        let body = resp
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {e}"))?;
        Ok(TransportResponse { status, body })
    }
}

/// Fixed-delay retry around a transport. Deliberately no backoff or jitter;
/// the workload is low-volume against a rate-limited API.
pub struct Fetcher<T> {
    transport: T,
    retry_count: u32,
    delay: Duration,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, retry_count: u32, delay: Duration) -> Self {
        Self {
            transport,
            retry_count,
            delay,
        }
    }

    /// Fetch the raw PSI document for one (URL, strategy) pair. Exhausting
    /// all attempts yields a `FetchFailure`, never an abort of the batch.
    pub async fn fetch(&self, target: &str, strategy: Strategy) -> Result<Value, FetchFailure> {
        let mut last_error = String::from("no attempts made");
        for attempt in 1..=self.retry_count {
            match self.transport.get(target, strategy).await {
                Ok(resp) if resp.status == 200 => return Ok(resp.body),
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status);
                    eprintln!("[psi] failed [{target}] [{strategy}] - {last_error}");
                }
                Err(e) => {
                    last_error = e;
                    eprintln!(
                        "[psi] retry {attempt}/{} [{target}] [{strategy}] - {last_error}",
                        self.retry_count
                    );
                }
            }
            // Paces retries; also runs after the final attempt, matching the
            // pair-level pacing the batch loop expects.
            tokio::time::sleep(self.delay).await;
        }
        eprintln!(
            "[psi] giving up [{target}] [{strategy}] after {} attempts - {last_error}",
            self.retry_count
        );
        Err(FetchFailure { detail: last_error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingTransport {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for FailingTransport {
        async fn get(&self, _: &str, _: Strategy) -> Result<TransportResponse, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("connection refused".to_string())
        }
    }

    struct StatusTransport {
        status: u16,
    }

    impl Transport for StatusTransport {
        async fn get(&self, _: &str, _: Strategy) -> Result<TransportResponse, String> {
            Ok(TransportResponse {
                status: self.status,
                body: Value::Null,
            })
        }
    }

    struct FlakyTransport {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for FlakyTransport {
        async fn get(&self, _: &str, _: Strategy) -> Result<TransportResponse, String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("timed out".to_string())
            } else {
                Ok(TransportResponse {
                    status: 200,
                    body: serde_json::json!({"lighthouseResult": {}}),
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_with_fixed_delay() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = Fetcher::new(
            FailingTransport {
                calls: calls.clone(),
            },
            3,
            Duration::from_secs(5),
        );

        let start = tokio::time::Instant::now();
        let err = fetcher
            .fetch("https://a.example/", Strategy::Mobile)
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.detail, "connection refused");
        // Three attempts, a 5s sleep after each.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn non_success_status_becomes_failure_detail() {
        let fetcher = Fetcher::new(StatusTransport { status: 429 }, 2, Duration::from_secs(5));
        let err = fetcher
            .fetch("https://a.example/", Strategy::Desktop)
            .await
            .unwrap_err();
        assert_eq!(err.detail, "HTTP 429");
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_a_later_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = Fetcher::new(
            FlakyTransport {
                calls: calls.clone(),
            },
            3,
            Duration::from_secs(5),
        );

        let body = fetcher
            .fetch("https://a.example/", Strategy::Mobile)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(body.get("lighthouseResult").is_some());
    }
}
