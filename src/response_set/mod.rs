pub mod state;

pub use state::{ResponseSetEvent, ResponseSetState};

use crate::error::{EngineError, EngineResult};
use crate::storage::entity::{certificate, response_set};
use crate::storage::repository::{NewResponseSet, ResponseSetRepository};
use log::{info, warn};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::sync::Arc;

/// Attributes replaced when cloning; `None` keeps the source's value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneOverrides {
    pub survey_id: Option<i32>,
    pub user_id: Option<i32>,
    pub dataset_id: Option<i32>,
}

pub struct ResponseSetService {
    db: Arc<DatabaseConnection>,
}

impl ResponseSetService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, attrs: NewResponseSet) -> EngineResult<response_set::Model> {
        let created = ResponseSetRepository::create(&self.db, attrs).await?;
        info!(
            "Created response set {} [{}] for survey {} (dataset {:?})",
            created.id, created.access_code, created.survey_id, created.dataset_id
        );
        Ok(created)
    }

    pub async fn find(&self, id: i32) -> EngineResult<response_set::Model> {
        ResponseSetRepository::find(&self.db, id)
            .await?
            .ok_or(EngineError::ResponseSetNotFound(id))
    }

    pub fn ensure_modifications_allowed(rs: &response_set::Model) -> EngineResult<()> {
        if rs.modifications_allowed() {
            Ok(())
        } else {
            Err(EngineError::ModificationsNotAllowed)
        }
    }

    /// draft → complete. Completeness is the caller's job.
    pub async fn complete(&self, rs: &response_set::Model) -> EngineResult<response_set::Model> {
        self.fire(rs, ResponseSetEvent::Complete).await
    }

    /// complete → published. Earlier published sets of the dataset are left
    /// alone; lookups pick the latest one.
    pub async fn publish(&self, rs: &response_set::Model) -> EngineResult<response_set::Model> {
        self.fire(rs, ResponseSetEvent::Publish).await
    }

    pub async fn supersede(&self, rs: &response_set::Model) -> EngineResult<response_set::Model> {
        self.fire(rs, ResponseSetEvent::Supersede).await
    }

    async fn fire(
        &self,
        rs: &response_set::Model,
        event: ResponseSetEvent,
    ) -> EngineResult<response_set::Model> {
        let from = rs.lifecycle()?;
        let to = from.apply(event)?;

        // state and certificate flip together or not at all
        let txn = self.db.begin().await?;
        let moved =
            ResponseSetRepository::transition(&txn, rs.id, from.as_str(), to.as_str()).await?;
        if moved && to == ResponseSetState::Published {
            ResponseSetRepository::publish_certificate(&txn, rs.id).await?;
        }
        txn.commit().await?;

        let current = self.find(rs.id).await?;
        if !moved {
            // someone else moved it first
            warn!(
                "Response set {} left {} before {} could apply",
                rs.id, from, event
            );
            return Err(EngineError::IllegalTransition {
                from: current.lifecycle()?,
                event,
            });
        }

        info!("Response set {}: {} -> {}", rs.id, from, to);
        Ok(current)
    }

    /// New draft copying survey/user/dataset from `source` unless overridden.
    /// Responses are not copied.
    pub async fn clone_response_set(
        &self,
        source: &response_set::Model,
        overrides: CloneOverrides,
    ) -> EngineResult<response_set::Model> {
        let attrs = NewResponseSet {
            survey_id: overrides.survey_id.unwrap_or(source.survey_id),
            user_id: overrides.user_id.or(source.user_id),
            dataset_id: overrides.dataset_id.or(source.dataset_id),
        };
        let cloned = self.create(attrs).await?;
        info!("Cloned response set {} into {}", source.id, cloned.id);
        Ok(cloned)
    }

    /// Moves a respondent onto another survey version. The old set is
    /// superseded only while it is still a draft.
    pub async fn switch_survey(
        &self,
        source: &response_set::Model,
        survey_id: i32,
    ) -> EngineResult<response_set::Model> {
        let cloned = self
            .clone_response_set(
                source,
                CloneOverrides {
                    survey_id: Some(survey_id),
                    ..Default::default()
                },
            )
            .await?;
        if source.lifecycle()?.is_draft() {
            self.supersede(source).await?;
        }
        Ok(cloned)
    }

    pub async fn latest_for_dataset(
        &self,
        dataset_id: i32,
        user_id: Option<i32>,
    ) -> EngineResult<Option<response_set::Model>> {
        Ok(ResponseSetRepository::latest_for_dataset(&self.db, dataset_id, user_id).await?)
    }

    pub async fn latest_completed_for_dataset(
        &self,
        dataset_id: i32,
    ) -> EngineResult<Option<response_set::Model>> {
        Ok(ResponseSetRepository::latest_completed_for_dataset(&self.db, dataset_id).await?)
    }

    pub async fn published_for_dataset(
        &self,
        dataset_id: i32,
    ) -> EngineResult<Option<response_set::Model>> {
        Ok(ResponseSetRepository::published_for_dataset(&self.db, dataset_id).await?)
    }

    pub async fn certificate(&self, response_set_id: i32) -> EngineResult<certificate::Model> {
        ResponseSetRepository::certificate_for(&self.db, response_set_id)
            .await?
            .ok_or(EngineError::ResponseSetNotFound(response_set_id))
    }

    /// The dataset's certificate: the one belonging to its latest published set.
    pub async fn current_certificate(
        &self,
        dataset_id: i32,
    ) -> EngineResult<Option<certificate::Model>> {
        match self.published_for_dataset(dataset_id).await? {
            Some(rs) => Ok(Some(self.certificate(rs.id).await?)),
            None => Ok(None),
        }
    }
}
