use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::DomainError;

/// Error code used for transport timeouts
pub const TIMEOUT_ERROR_CODE: &str = "timeout";

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, DomainError>;

    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, DomainError>;
}

/// Real HTTP client using reqwest.
///
/// A request that fails with a transport timeout is retried once; HTTP
/// status errors are returned as-is.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder + Send + Sync,
        url: &str,
    ) -> Result<Value, DomainError> {
        let response = match build().send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url = %url, "Request timed out, retrying once");
                build().send().await.map_err(transport_error)?
            }
            Err(e) => return Err(transport_error(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = %status, "Provider returned an error status");
            return Err(status_error(status, &error_body, retry_after));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, DomainError> {
        let build = || {
            let mut request = self.client.post(url);
            for (key, value) in &headers {
                request = request.header(*key, *value);
            }
            request.json(body)
        };

        self.send(build, url).await
    }

    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, DomainError> {
        let build = || {
            let mut request = self.client.get(url);
            for (key, value) in &headers {
                request = request.header(*key, *value);
            }
            request
        };

        self.send(build, url).await
    }
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::provider_with_code(
            "http",
            format!("Request timed out: {}", e),
            TIMEOUT_ERROR_CODE,
            None,
        )
    } else {
        DomainError::provider("http", format!("Request failed: {}", e))
    }
}

/// Map an error status to a provider error, keeping the vendor's code when
/// the body carries one
fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> DomainError {
    let vendor_code = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let error = json.get("error")?;
        error
            .get("code")
            .and_then(|c| c.as_str())
            .or_else(|| error.get("type").and_then(|t| t.as_str()))
            .map(str::to_string)
    });

    let code = vendor_code.unwrap_or_else(|| match status.as_u16() {
        429 => "rate_limit_exceeded".to_string(),
        401 | 403 => "authentication_error".to_string(),
        code if code >= 500 => "server_error".to_string(),
        code => format!("http_{}", code),
    });

    DomainError::provider_with_code("http", format!("HTTP {}: {}", status, body), code, retry_after)
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|secs| secs.ceil() as u64)
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Scripted client; responses per `METHOD url` are consumed in order and
    /// the last one repeats
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, Vec<Result<Value, DomainError>>>>,
        requests: RwLock<Vec<(String, Option<Value>)>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        fn push(self, key: String, response: Result<Value, DomainError>) -> Self {
            self.responses
                .write()
                .unwrap()
                .entry(key)
                .or_default()
                .push(response);
            self
        }

        pub fn with_response(self, url: impl Into<String>, response: Value) -> Self {
            self.push(format!("POST {}", url.into()), Ok(response))
        }

        pub fn with_get_response(self, url: impl Into<String>, response: Value) -> Self {
            self.push(format!("GET {}", url.into()), Ok(response))
        }

        pub fn with_error(self, url: impl Into<String>, error: DomainError) -> Self {
            self.push(format!("POST {}", url.into()), Err(error))
        }

        /// Recorded requests as (`METHOD url`, body)
        pub fn requests(&self) -> Vec<(String, Option<Value>)> {
            self.requests.read().unwrap().clone()
        }

        pub fn request_count(&self, method_and_url: &str) -> usize {
            self.requests
                .read()
                .unwrap()
                .iter()
                .filter(|(key, _)| key == method_and_url)
                .count()
        }

        fn next(&self, key: String, body: Option<Value>) -> Result<Value, DomainError> {
            self.requests.write().unwrap().push((key.clone(), body));

            let mut responses = self.responses.write().unwrap();
            let queue = responses
                .get_mut(&key)
                .ok_or_else(|| DomainError::provider("mock", format!("No mock response for {}", key)))?;

            if queue.len() > 1 {
                queue.remove(0)
            } else {
                queue
                    .first()
                    .cloned()
                    .unwrap_or_else(|| Err(DomainError::provider("mock", "empty")))
            }
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &Value,
        ) -> Result<Value, DomainError> {
            self.next(format!("POST {}", url), Some(body.clone()))
        }

        async fn get_json(&self, url: &str, _headers: Vec<(&str, &str)>) -> Result<Value, DomainError> {
            self.next(format!("GET {}", url), None)
        }
    }
}
