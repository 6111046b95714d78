//! HTTP fetching for image embedding.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};

use crate::mail::{FetchResponse, Fetcher};

/// Fetches with `reqwest`. Any HTTP status is returned to the caller
/// rather than treated as an error.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let res = self.client.get(url).send().await?;
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = res.bytes().await?.to_vec();

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}
