use crate::catalog::CatalogQuestion;
use crate::error::EngineResult;
use crate::storage::entity::answer;
use crate::storage::repository::ResponseRepository;
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Url;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::time::Duration;

/// Reports whether a URL can be fetched right now. No retries.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn resolves(&self, url: &str) -> bool;
}

pub struct HttpUrlProbe {
    client: reqwest::Client,
}

impl HttpUrlProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("certgen/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn resolves(&self, url: &str) -> bool {
        let parsed = match Url::parse(url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => return false,
        };
        match self.client.get(parsed).send().await {
            Ok(resp) => {
                let status = resp.status();
                if !status.is_success() {
                    info!("URL {} answered {}", url, status);
                }
                status.is_success()
            }
            Err(e) => {
                warn!("URL {} did not resolve: {}", url, e);
                false
            }
        }
    }
}

/// Probes every unchecked URL response of a set with a non-blank value and
/// records the outcome. Returns how many responses were probed.
pub async fn check_response_set(
    db: &DatabaseConnection,
    probe: &dyn UrlProbe,
    response_set_id: i32,
    questions: &[CatalogQuestion],
) -> EngineResult<usize> {
    let url_answers: HashMap<i32, &answer::Model> = questions
        .iter()
        .flat_map(|q| q.answers.iter())
        .filter(|a| a.is_url())
        .map(|a| (a.id, a))
        .collect();
    if url_answers.is_empty() {
        return Ok(0);
    }

    let mut probed = 0;
    for response in ResponseRepository::for_response_set(db, response_set_id).await? {
        if response.url_checked || !url_answers.contains_key(&response.answer_id) {
            continue;
        }
        let Some(url) = response.value().filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let resolves = probe.resolves(url).await;
        ResponseRepository::record_url_check(db, response.id, resolves).await?;
        probed += 1;
    }
    Ok(probed)
}
