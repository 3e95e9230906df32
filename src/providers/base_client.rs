use crate::core::error::{DispatchError, PratError};
use crate::dispatch::Transport;
use crate::providers::ProviderRequest;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const ERROR_BODY_PREVIEW: usize = 200;

/// reqwest-backed transport. One POST per call, no retries.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, PratError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PratError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ProviderRequest) -> Result<String, DispatchError> {
        let mut builder = self.client.post(&request.endpoint);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(request.body.to_string()).send().await?;
        let status = response.status();

        if !status.is_success() {
            // vendor error bodies stay out of the error value
            let body = response.text().await.unwrap_or_default();
            debug!(
                status = status.as_u16(),
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "backend returned error status"
            );
            return Err(DispatchError::Transport {
                status: Some(status.as_u16()),
                message: format!("backend returned HTTP {}", status),
            });
        }

        Ok(response.text().await?)
    }
}
