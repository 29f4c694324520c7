use crate::answer::{resolve, RequestPayload};
use crate::autopopulate::{AutoPopulator, KittenData};
use crate::catalog::{CatalogQuestion, SchemaResponse, SurveyCatalog};
use crate::error::{EngineError, EngineResult};
use crate::generator::result::{GenerationResult, UpdateOutcome};
use crate::response_set::{CloneOverrides, ResponseSetService};
use crate::storage::entity::{certificate, certificate_generator, response_set, user};
use crate::storage::repository::{
    DatasetRepository, GeneratorRepository, NewGenerator, NewResponseSet, ResponseSetRepository,
    UserRepository,
};
use crate::users::UserResolver;
use crate::validation::{self, check_response_set, UrlProbe};
use log::{debug, info, warn};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;

const DATA_TITLE_KEY: &str = "dataTitle";

/// Turns stored API requests into response sets and certificates.
pub struct GeneratorService {
    db: Arc<DatabaseConnection>,
    catalog: Arc<SurveyCatalog>,
    response_sets: ResponseSetService,
    users: UserResolver,
    url_probe: Arc<dyn UrlProbe>,
    auto_populator: Arc<dyn AutoPopulator>,
    public_host: String,
}

impl GeneratorService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: Arc<SurveyCatalog>,
        url_probe: Arc<dyn UrlProbe>,
        auto_populator: Arc<dyn AutoPopulator>,
    ) -> Self {
        Self {
            response_sets: ResponseSetService::new(db.clone()),
            users: UserResolver::new(db.clone()),
            db,
            catalog,
            url_probe,
            auto_populator,
            public_host: String::new(),
        }
    }

    pub fn with_public_host(mut self, host: impl Into<String>) -> Self {
        self.public_host = host.into();
        self
    }

    pub fn catalog(&self) -> &SurveyCatalog {
        &self.catalog
    }

    pub async fn schema(&self, jurisdiction: &str) -> EngineResult<SchemaResponse> {
        SchemaResponse::from_result(self.catalog.schema(jurisdiction).await)
    }

    /// Runs the generator's stored request against its response set,
    /// publishing the certificate when everything validates.
    ///
    /// Safe to call again with a refined request: the response set is reused
    /// and every answered question is replaced.
    pub async fn generate(
        &self,
        generator_id: i32,
        jurisdiction: &str,
        create_user: bool,
        dataset_id: Option<i32>,
    ) -> EngineResult<certificate::Model> {
        let generator = GeneratorRepository::find(&self.db, generator_id)
            .await?
            .ok_or(EngineError::GeneratorNotFound(generator_id))?;
        let request: Value = serde_json::from_str(&generator.request)?;
        let payload = RequestPayload::from_value(&request);

        let rs = self
            .prepare_response_set(&generator, jurisdiction, dataset_id, &payload)
            .await?;
        ResponseSetService::ensure_modifications_allowed(&rs)?;

        let questions = self.catalog.questions(rs.survey_id).await?;
        self.answer_questions(&rs, &questions, &payload).await?;
        check_response_set(&self.db, self.url_probe.as_ref(), rs.id, &questions).await?;

        let kitten = match payload.documentation_url() {
            Some(url) => self.autopopulate(&rs, url).await?,
            None => None,
        };
        if let Some(dataset_id) = rs.dataset_id {
            self.apply_dataset_defaults(dataset_id, &payload, kitten.as_ref())
                .await?;
        }

        let rs = self.response_sets.find(rs.id).await?;
        let owner = self
            .users
            .determine_user(&rs, create_user, generator.user_id)
            .await?;
        ResponseSetRepository::assign_user(&self.db, rs.id, owner.id).await?;
        if let Some(dataset_id) = rs.dataset_id {
            DatasetRepository::claim_owner(&self.db, dataset_id, owner.id).await?;
        }

        let rs = self.response_sets.find(rs.id).await?;
        let report = validation::validate(&self.db, rs.id, &questions).await?;
        if report.passed() {
            let completed = self.response_sets.complete(&rs).await?;
            self.response_sets.publish(&completed).await?;
        } else {
            info!(
                "Response set {} stays draft: {}",
                rs.id,
                report.errors.join("; ")
            );
        }

        GeneratorRepository::mark_completed(&self.db, generator.id).await?;
        self.response_sets.certificate(rs.id).await
    }

    async fn prepare_response_set(
        &self,
        generator: &certificate_generator::Model,
        jurisdiction: &str,
        dataset_id: Option<i32>,
        payload: &RequestPayload,
    ) -> EngineResult<response_set::Model> {
        if let Some(rs_id) = generator.response_set_id {
            let rs = self.response_sets.find(rs_id).await?;
            return match dataset_id {
                Some(id) if rs.dataset_id != Some(id) => {
                    ResponseSetRepository::set_dataset(&self.db, rs.id, id).await?;
                    self.response_sets.find(rs.id).await
                }
                _ => Ok(rs),
            };
        }

        let code = self.catalog.migrate_access_code(jurisdiction);
        let survey = self.catalog.resolve_jurisdiction(&code).await?;
        let dataset = match dataset_id {
            Some(id) => DatasetRepository::find(&self.db, id)
                .await?
                .ok_or(EngineError::DatasetNotFound)?,
            None => {
                DatasetRepository::create(
                    &self.db,
                    None,
                    payload.documentation_url().map(str::to_string),
                )
                .await?
            }
        };

        let rs = self
            .response_sets
            .create(NewResponseSet {
                survey_id: survey.id,
                user_id: Some(generator.user_id),
                dataset_id: Some(dataset.id),
            })
            .await?;
        GeneratorRepository::attach_response_set(&self.db, generator.id, rs.id).await?;
        Ok(rs)
    }

    async fn answer_questions(
        &self,
        rs: &response_set::Model,
        questions: &[CatalogQuestion],
        payload: &RequestPayload,
    ) -> EngineResult<()> {
        for question in questions.iter().filter(|q| !q.is_label()) {
            if let Some(value) = payload.get(question.reference_identifier()) {
                resolve(&self.db, rs.id, question, value).await?;
            }
        }
        Ok(())
    }

    /// Auto-population is best effort; failures are logged and skipped.
    async fn autopopulate(
        &self,
        rs: &response_set::Model,
        documentation_url: &str,
    ) -> EngineResult<Option<KittenData>> {
        let data = match self.auto_populator.fetch(documentation_url).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("No kitten data for {}", documentation_url);
                return Ok(None);
            }
            Err(e) => {
                warn!("Auto-population failed for {}: {}", documentation_url, e);
                return Ok(None);
            }
        };
        ResponseSetRepository::set_kitten_data(&self.db, rs.id, serde_json::to_string(&data)?)
            .await?;
        Ok(Some(data))
    }

    async fn apply_dataset_defaults(
        &self,
        dataset_id: i32,
        payload: &RequestPayload,
        kitten: Option<&KittenData>,
    ) -> EngineResult<()> {
        let title = payload
            .text(DATA_TITLE_KEY)
            .or_else(|| kitten.and_then(|k| k.title.as_deref()));
        if let Some(title) = title {
            DatasetRepository::set_default_title(&self.db, dataset_id, title).await?;
        }
        if let Some(curator) = kitten.and_then(KittenData::curator) {
            DatasetRepository::set_default_curator(&self.db, dataset_id, curator).await?;
        }
        if let Some(url) = payload.documentation_url() {
            DatasetRepository::set_default_documentation_url(&self.db, dataset_id, url).await?;
        }
        Ok(())
    }

    /// Applies `request` to the dataset's latest response set on behalf of
    /// `user`. A set on an older survey, or one that can no longer change, is
    /// cloned first and the original left as it was.
    pub async fn update(
        &self,
        dataset_id: i32,
        request: &Value,
        jurisdiction: &str,
        user: &user::Model,
    ) -> EngineResult<UpdateOutcome> {
        let code = self.catalog.migrate_access_code(jurisdiction);
        let survey = self.catalog.resolve_jurisdiction(&code).await?;

        let owner_filter = if user.admin { None } else { Some(user.id) };
        let mut rs = self
            .response_sets
            .latest_for_dataset(dataset_id, owner_filter)
            .await?
            .ok_or(EngineError::DatasetNotFound)?;

        if rs.survey_id != survey.id || !rs.modifications_allowed() {
            rs = self
                .response_sets
                .clone_response_set(
                    &rs,
                    CloneOverrides {
                        survey_id: Some(survey.id),
                        user_id: Some(user.id),
                        dataset_id: Some(dataset_id),
                    },
                )
                .await?;
        }

        let generator = match GeneratorRepository::for_response_set(&self.db, rs.id).await? {
            Some(existing) => existing,
            None => {
                GeneratorRepository::create(
                    &self.db,
                    NewGenerator {
                        user_id: user.id,
                        response_set_id: Some(rs.id),
                        request: request.clone(),
                        jurisdiction: Some(code.clone()),
                        existing_dataset_id: Some(dataset_id),
                        ..Default::default()
                    },
                )
                .await?
            }
        };
        GeneratorRepository::set_request(&self.db, generator.id, request).await?;

        self.generate(generator.id, &code, false, None).await?;

        let rs = self.response_sets.find(rs.id).await?;
        let questions = self.catalog.questions(rs.survey_id).await?;
        let errors = validation::response_errors(&self.db, rs.id, &questions).await?;
        Ok(UpdateOutcome {
            success: true,
            published: rs.is_published(),
            errors,
        })
    }

    /// Where the latest generation for a dataset stands.
    pub async fn generation_result(&self, dataset_id: i32) -> EngineResult<GenerationResult> {
        let generator = GeneratorRepository::latest_for_dataset(&self.db, dataset_id)
            .await?
            .ok_or(EngineError::DatasetNotFound)?;
        let dataset_url = DatasetRepository::api_url(&self.public_host, dataset_id);
        let rs_id = match generator.response_set_id {
            Some(id) if generator.completed => id,
            _ => return Ok(GenerationResult::pending(dataset_url)),
        };

        let rs = self.response_sets.find(rs_id).await?;
        let questions = self.catalog.questions(rs.survey_id).await?;
        let errors = validation::response_errors(&self.db, rs.id, &questions).await?;
        let owner_email = match rs.user_id {
            Some(uid) => UserRepository::find(&self.db, uid).await?.map(|u| u.email),
            None => None,
        };
        Ok(GenerationResult::Finished {
            success: true,
            published: rs.is_published(),
            owner_email,
            errors,
            dataset_url,
        })
    }
}
