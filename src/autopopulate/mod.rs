//! Dataset auto-population from a documentation URL.

pub mod kitten;

pub use kitten::{Agent, Contact, KittenData};

use async_trait::async_trait;
use log::info;

#[derive(thiserror::Error, Debug)]
pub enum AutoPopulateError {
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait AutoPopulator: Send + Sync {
    /// Metadata inferred from `documentation_url`, if the page yields any.
    async fn fetch(&self, documentation_url: &str)
        -> Result<Option<KittenData>, AutoPopulateError>;
}

/// Used when no auto-population service is configured.
pub struct NoAutoPopulation;

#[async_trait]
impl AutoPopulator for NoAutoPopulation {
    async fn fetch(&self, _documentation_url: &str) -> Result<Option<KittenData>, AutoPopulateError> {
        Ok(None)
    }
}

/// Asks an HTTP metadata extraction service for kitten data.
///
/// `GET {endpoint}?url={documentation_url}` answers 200 with a
/// [`KittenData`] body, or 404 when nothing could be extracted.
pub struct HttpKittenClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpKittenClient {
    pub fn new(endpoint: impl Into<String>, timeout: std::time::Duration) -> Result<Self, AutoPopulateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AutoPopulateError::Http(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AutoPopulator for HttpKittenClient {
    async fn fetch(&self, documentation_url: &str) -> Result<Option<KittenData>, AutoPopulateError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("url", documentation_url)])
            .send()
            .await
            .map_err(|e| AutoPopulateError::Http(e.to_string()))?;

        match resp.status().as_u16() {
            200 => {
                let data: KittenData = resp
                    .json()
                    .await
                    .map_err(|e| AutoPopulateError::InvalidResponse(e.to_string()))?;
                info!("Kitten data found for {}", documentation_url);
                Ok(Some(data))
            }
            404 => Ok(None),
            status => Err(AutoPopulateError::Http(format!(
                "unexpected status {} for {}",
                status, documentation_url
            ))),
        }
    }
}
