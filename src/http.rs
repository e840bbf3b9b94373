//! `reqwest`-backed manifest fetcher.

use url::Url;

use crate::error::FetchError;
use crate::hydration::{FetchResponse, ManifestFetcher};

#[derive(Debug, Clone, Default)]
pub struct HttpManifestFetcher {
    client: reqwest::Client,
}

impl HttpManifestFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        Ok(FetchResponse { status, body })
    }
}
