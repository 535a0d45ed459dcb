//! Rate-limited submission client for the registry API.

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::auth::{StaticTokenProvider, TokenProvider};
use crate::config::{ClientConfig, CrptConfig};
use crate::document::{Document, DocumentRequest};
use crate::error::{CrptError, Result};
use crate::ratelimit::{Admission, SlidingWindowLimiter};

/// Client that submits documents to the registry, one slot per document.
///
/// Every submission waits on the [`Admission`] it was built with before the
/// request is even constructed. Failures are returned as-is; nothing is
/// retried.
#[derive(Clone)]
pub struct CrptClient {
    http: reqwest::Client,
    api_url: Url,
    default_product_group: String,
    admission: Arc<dyn Admission>,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for CrptClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrptClient")
            .field("api_url", &self.api_url.as_str())
            .field("default_product_group", &self.default_product_group)
            .finish_non_exhaustive()
    }
}

impl CrptClient {
    /// Create a client gated by `admission`.
    pub fn new(config: &ClientConfig, admission: Arc<dyn Admission>) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| CrptError::Config(format!("invalid api_url {}: {}", config.api_url, e)))?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        debug!(api_url = %api_url, "Creating CRPT client");

        Ok(Self {
            http,
            api_url,
            default_product_group: config.default_product_group.clone(),
            admission,
            tokens: Arc::new(StaticTokenProvider::new(config.token.clone())),
        })
    }

    /// Create a client together with its own sliding window limiter.
    pub fn from_config(config: &CrptConfig) -> Result<Self> {
        let limiter = SlidingWindowLimiter::new(
            config.rate_limiting.window,
            config.rate_limiting.requests_per_window,
        )?;
        Self::new(&config.client, Arc::new(limiter))
    }

    /// Replace the token source.
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    /// The product group used by [`submit`](Self::submit).
    pub fn default_product_group(&self) -> &str {
        &self.default_product_group
    }

    /// Submit `document` under the default product group.
    ///
    /// Returns the response body on success.
    pub async fn submit(&self, document: &Document, signature: &str) -> Result<String> {
        self.submit_with_group(document, signature, &self.default_product_group)
            .await
    }

    /// Submit `document` under `product_group`.
    ///
    /// # Errors
    ///
    /// - [`CrptError::Cancelled`] if the wait for a slot was abandoned
    /// - [`CrptError::Transport`] on network failure
    /// - [`CrptError::Status`] on a non-2xx response
    #[instrument(skip(self, document, signature), fields(doc_id = ?document.doc_id))]
    pub async fn submit_with_group(
        &self,
        document: &Document,
        signature: &str,
        product_group: &str,
    ) -> Result<String> {
        self.admission.acquire().await?;

        let request = self
            .build_request(document, signature, product_group)
            .await?;
        debug!(url = %request.url(), "Sending document");

        let response = self.http.execute(request).await.map_err(|e| {
            error!(error = %e, "Document submission failed");
            CrptError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            info!(status = status.as_u16(), body = %body, "Document created successfully");
            Ok(body)
        } else {
            error!(status = status.as_u16(), body = %body, "Document creation failed");
            Err(CrptError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Build the outbound request for `document` without sending it.
    pub async fn build_request(
        &self,
        document: &Document,
        signature: &str,
        product_group: &str,
    ) -> Result<reqwest::Request> {
        let body = DocumentRequest::new(document, signature)?.to_json()?;
        let token = self.tokens.token().await?;

        let request = self
            .http
            .post(self.api_url.clone())
            .query(&[("pg", product_group)])
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(token)
            .body(body)
            .build()?;
        Ok(request)
    }
}
