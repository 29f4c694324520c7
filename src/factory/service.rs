use crate::error::EngineResult;
use crate::storage::entity::certificate_generator;
use crate::storage::repository::{
    CampaignRepository, DatasetRepository, GeneratorRepository, GeneratorStatus, NewGenerator,
    ResponseSetRepository,
};
use log::info;
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    pub campaign_id: Option<i32>,
    pub jurisdiction: Option<String>,
    pub create_user: bool,
    /// Existing dataset page to match instead of the documentation URL.
    pub dataset_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Queued {
    Generator(certificate_generator::Model),
    /// The dataset already has a published certificate; nothing was queued.
    Duplicate { dataset_id: i32 },
}

/// Queues background generation for documentation URLs.
pub struct CertificateFactory {
    db: Arc<DatabaseConnection>,
    default_jurisdiction: String,
}

impl CertificateFactory {
    pub fn new(db: Arc<DatabaseConnection>, default_jurisdiction: impl Into<String>) -> Self {
        Self {
            db,
            default_jurisdiction: default_jurisdiction.into(),
        }
    }

    pub async fn queue(
        &self,
        documentation_url: &str,
        user_id: i32,
        options: QueueOptions,
    ) -> EngineResult<Queued> {
        let lookup = options.dataset_url.as_deref().unwrap_or(documentation_url);

        let mut existing_dataset_id = None;
        if let Some(dataset) = DatasetRepository::find_by_documentation_url(&self.db, lookup).await? {
            if ResponseSetRepository::published_for_dataset(&self.db, dataset.id)
                .await?
                .is_some()
            {
                if let Some(campaign_id) = options.campaign_id {
                    CampaignRepository::increment_duplicate_count(&self.db, campaign_id).await?;
                }
                info!(
                    "Dataset {} already certified, not queueing {}",
                    dataset.id, documentation_url
                );
                return Ok(Queued::Duplicate {
                    dataset_id: dataset.id,
                });
            }
            existing_dataset_id = Some(dataset.id);
        }

        let generator = GeneratorRepository::create(
            &self.db,
            NewGenerator {
                user_id,
                response_set_id: None,
                certification_campaign_id: options.campaign_id,
                request: json!({ "documentationUrl": documentation_url }),
                status: GeneratorStatus::Queued,
                jurisdiction: Some(
                    options
                        .jurisdiction
                        .unwrap_or_else(|| self.default_jurisdiction.clone()),
                ),
                create_user: options.create_user,
                existing_dataset_id,
            },
        )
        .await?;
        info!("Queued generator {} for {}", generator.id, documentation_url);
        Ok(Queued::Generator(generator))
    }
}
