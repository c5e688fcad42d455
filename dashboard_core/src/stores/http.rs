use crate::{error::StoreError, stores::ObjectStore};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Fetches `<endpoint>/<bucket>/<file>` over HTTP.
///
/// The default endpoint serves Google Cloud Storage objects by public URL.
pub struct HttpStore {
    endpoint: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dashboard-metrics-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transient(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            client,
        })
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn object_url(&self, bucket: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            bucket.trim_matches('/'),
            file_name.trim_start_matches('/')
        )
    }
}

fn classify_status(status: StatusCode, url: &str) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(url.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::PermissionDenied(format!("{} ({})", url, status))
        }
        _ => StoreError::Transient(format!("{} returned {}", url, status)),
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(bucket, file_name);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transient(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &url));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transient(format!("{}: {}", url, e)))?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}
