//! HTTP implementation of the remote gateway.

use super::{ListFilter, RemoteError, RemoteGateway};
use crate::config::Config;
use async_trait::async_trait;
use marks_engine::{Bookmark, BookmarkPatch};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Talks JSON to `{base}/bookmarks` and probes `{base}/health`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    token: Option<String>,
    probe_timeout: Duration,
}

impl HttpGateway {
    /// Create a gateway. `request_timeout` bounds every bookmark call.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let base_url: String = base_url.into();
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| RemoteError::Transport(format!("invalid base url: {base_url}")))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
            probe_timeout,
        })
    }

    /// Create a gateway from client configuration.
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            config.request_timeout,
            config.probe_timeout,
        )
    }

    /// Check whether the API answers its health endpoint within the probe timeout.
    pub async fn ping(&self) -> bool {
        let Ok(url) = self.endpoint(&["health"]) else {
            return false;
        };
        let request = self.client.get(url).timeout(self.probe_timeout);

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health probe failed");
                false
            }
        }
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("invalid base url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bookmarks_url(&self) -> Result<Url, RemoteError> {
        self.endpoint(&["bookmarks"])
    }

    fn bookmark_url(&self, id: &str) -> Result<Url, RemoteError> {
        self.endpoint(&["bookmarks", id])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::Status(status.as_u16())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Bookmark>, RemoteError> {
        let response = self
            .send(self.client.get(self.bookmarks_url()?).query(filter))
            .await?;
        decode(response).await
    }

    async fn create(&self, bookmark: &Bookmark) -> Result<Bookmark, RemoteError> {
        let response = self
            .send(self.client.post(self.bookmarks_url()?).json(bookmark))
            .await?;
        decode(response).await
    }

    async fn update(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, RemoteError> {
        let response = self
            .send(self.client.put(self.bookmark_url(id)?).json(patch))
            .await?;
        decode(response).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.send(self.client.delete(self.bookmark_url(id)?)).await?;
        Ok(())
    }
}
