//! Backend client
//!
//! [`RemoteService`] is the seam between the session and the external
//! type checker. [`HttpBackend`] is the production implementation: JSON
//! over HTTP with a pooled hyper client.

use crate::config::SessionConfig;
use crate::error::{BananaError, Result};
use async_trait::async_trait;
use banana_error::BananaReport;
use banana_schema::{Catalog, TypeTable};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::Method;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use url::Url;

/// The four endpoints of the type-checking backend
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Component catalog, fetched once per session
    async fn fetch_catalog(&self) -> Result<Catalog>;

    /// Type table of `content`; an empty table means "no update"
    async fn infer_types(&self, content: &str) -> Result<TypeTable>;

    async fn typecheck(&self, content: &str) -> Result<BananaReport>;

    /// Hands the pipeline to the backend for execution
    async fn submit(&self, content: &str) -> Result<BananaReport>;
}

/// Request body shared by every POST endpoint
#[derive(Debug, Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

/// [`RemoteService`] over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    config: SessionConfig,
}

impl HttpBackend {
    pub fn new(config: SessionConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.send(Method::GET, url, Bytes::new()).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, content: &str) -> Result<T> {
        let body = serde_json::to_vec(&ContentBody { content })?;
        self.send(Method::POST, url, Bytes::from(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url, body: Bytes) -> Result<T> {
        let request = hyper::Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Full::new(body))?;

        tracing::debug!(%method, %url, "backend request");

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = response.into_body().collect().await?.to_bytes();
            Ok::<_, BananaError>((status, bytes))
        };

        let (status, bytes) = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| BananaError::Timeout(limit.as_millis() as u64))??,
            None => exchange.await?,
        };

        if !status.is_success() {
            return Err(BananaError::status(
                status.as_u16(),
                String::from_utf8_lossy(&bytes),
            ));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RemoteService for HttpBackend {
    async fn fetch_catalog(&self) -> Result<Catalog> {
        self.get(self.config.metadata_url()?).await
    }

    async fn infer_types(&self, content: &str) -> Result<TypeTable> {
        self.post(self.config.metadata_url()?, content).await
    }

    async fn typecheck(&self, content: &str) -> Result<BananaReport> {
        self.post(self.config.typecheck_url()?, content).await
    }

    async fn submit(&self, content: &str) -> Result<BananaReport> {
        self.post(self.config.submit_url()?, content).await
    }
}

/// Runs `op` once, then up to `retries` more times while it fails.
///
/// Attempts are sequential with no backoff. Returns the first success or
/// the error of the last attempt.
pub async fn with_retries<T, F, Fut>(retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt <= retries => {
                tracing::warn!(attempt, %err, "backend request failed, retrying");
            }
            Err(err) => {
                tracing::warn!(attempt, %err, "backend request failed, giving up");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(failures: u32, calls: &AtomicU32) -> impl Future<Output = Result<u32>> + '_ {
        async move {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= failures {
                Err(BananaError::Transport(format!("attempt {} refused", call)))
            } else {
                Ok(call)
            }
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = AtomicU32::new(0);
        let value = with_retries(2, || flaky(0, &calls)).await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let value = with_retries(2, || flaky(2, &calls)).await.unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_at_most_three_attempts() {
        let calls = AtomicU32::new(0);
        let err = with_retries(2, || flaky(5, &calls)).await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.to_string(), "transport error: attempt 3 refused");
    }

    #[test]
    fn test_zero_retries_is_single_attempt() {
        let calls = AtomicU32::new(0);
        let result = tokio_test::block_on(with_retries(0, || flaky(1, &calls)));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_content_body_shape() {
        let body = serde_json::to_string(&ContentBody { content: "a = 1" }).unwrap();
        assert_eq!(body, r#"{"content":"a = 1"}"#);
    }
}
