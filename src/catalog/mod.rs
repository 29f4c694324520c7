pub mod definition;
pub mod migration;
pub mod schema;

pub use definition::{AnswerDefinition, QuestionDefinition, SectionDefinition, SurveyDefinition};
pub use migration::MigrationTable;
pub use schema::{SchemaQuestion, SchemaResponse, SurveySchema};

use crate::error::{EngineError, EngineResult};
use crate::storage::entity::{answer, question, survey};
use crate::storage::repository::CatalogRepository;
use log::debug;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    None,
    One,
    Any,
    Repeater,
}

impl QuestionType {
    /// Unknown stored types mean the catalog is corrupt.
    pub fn parse(raw: &str) -> EngineResult<Self> {
        match raw {
            "none" => Ok(QuestionType::None),
            "one" => Ok(QuestionType::One),
            "any" => Ok(QuestionType::Any),
            "repeater" => Ok(QuestionType::Repeater),
            other => Err(EngineError::UnhandledQuestionType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::None => "none",
            QuestionType::One => "one",
            QuestionType::Any => "any",
            QuestionType::Repeater => "repeater",
        }
    }

    /// Name exposed in the public schema.
    pub fn schema_name(&self) -> &'static str {
        match self {
            QuestionType::None => "string",
            QuestionType::One => "radio",
            QuestionType::Any => "checkbox",
            QuestionType::Repeater => "repeating",
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionType::One | QuestionType::Any)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question with its answers, as the resolution and validation code sees it.
#[derive(Debug, Clone)]
pub struct CatalogQuestion {
    pub question: question::Model,
    pub answers: Vec<answer::Model>,
}

impl CatalogQuestion {
    pub fn id(&self) -> i32 {
        self.question.id
    }

    pub fn reference_identifier(&self) -> &str {
        &self.question.reference_identifier
    }

    pub fn question_type(&self) -> EngineResult<QuestionType> {
        QuestionType::parse(&self.question.question_type)
    }

    pub fn is_label(&self) -> bool {
        self.question.display_type.as_deref() == Some("label")
    }

    pub fn is_mandatory(&self) -> bool {
        self.question.is_mandatory
    }

    /// The answer free-text questions store their responses against.
    pub fn sole_answer(&self) -> EngineResult<&answer::Model> {
        self.answers
            .first()
            .ok_or_else(|| EngineError::MissingAnswer(self.question.reference_identifier.clone()))
    }

    pub fn answer_by_reference(&self, reference: &str) -> Option<&answer::Model> {
        self.answers
            .iter()
            .find(|a| a.reference_identifier == reference)
    }
}

pub struct SurveyCatalog {
    db: Arc<DatabaseConnection>,
    migrations: MigrationTable,
}

impl SurveyCatalog {
    pub fn new(db: Arc<DatabaseConnection>, migrations: MigrationTable) -> Self {
        Self { db, migrations }
    }

    pub fn migrate_access_code(&self, code: &str) -> String {
        let migrated = self.migrations.migrate(code);
        if migrated != code {
            debug!("Jurisdiction {} migrated to {}", code, migrated);
        }
        migrated.to_string()
    }

    pub async fn import(&self, def: &SurveyDefinition) -> EngineResult<survey::Model> {
        Ok(CatalogRepository::import(&self.db, def).await?)
    }

    pub async fn newest_survey_for_access_code(
        &self,
        code: &str,
    ) -> EngineResult<Option<survey::Model>> {
        Ok(CatalogRepository::newest_for_access_code(&self.db, code).await?)
    }

    /// Newest survey for a jurisdiction or `JurisdictionNotFound`.
    pub async fn resolve_jurisdiction(&self, code: &str) -> EngineResult<survey::Model> {
        self.newest_survey_for_access_code(code)
            .await?
            .ok_or(EngineError::JurisdictionNotFound)
    }

    /// A survey is superseded once a newer survey shares its access code.
    pub async fn is_superseded(&self, survey: &survey::Model) -> EngineResult<bool> {
        let newest = self
            .newest_survey_for_access_code(&survey.access_code)
            .await?;
        Ok(newest.map(|n| n.id != survey.id).unwrap_or(false))
    }

    /// Questions with their answers, in catalog order.
    pub async fn questions(&self, survey_id: i32) -> EngineResult<Vec<CatalogQuestion>> {
        let questions = CatalogRepository::questions_in_order(&self.db, survey_id).await?;
        let ids: Vec<i32> = questions.iter().map(|q| q.id).collect();
        let mut answers = CatalogRepository::answers_by_question(&self.db, &ids).await?;
        Ok(questions
            .into_iter()
            .map(|question| CatalogQuestion {
                answers: answers.remove(&question.id).unwrap_or_default(),
                question,
            })
            .collect())
    }

    pub async fn schema(&self, jurisdiction: &str) -> EngineResult<SurveySchema> {
        let survey = self.resolve_jurisdiction(jurisdiction).await?;
        let questions = self.questions(survey.id).await?;
        schema::project(&questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{cert_generator_survey, test_db};

    #[tokio::test]
    async fn newest_survey_wins_for_shared_access_code() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db.clone(), MigrationTable::default());

        let first = catalog.import(&cert_generator_survey()).await.unwrap();
        let second = catalog.import(&cert_generator_survey()).await.unwrap();

        let newest = catalog
            .newest_survey_for_access_code("cert-generator")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(newest.id, second.id);
        assert!(catalog.is_superseded(&first).await.unwrap());
        assert!(!catalog.is_superseded(&second).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_access_code_has_no_survey() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db, MigrationTable::default());

        assert!(catalog
            .newest_survey_for_access_code("nowhere")
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            catalog.resolve_jurisdiction("nowhere").await,
            Err(EngineError::JurisdictionNotFound)
        ));
    }

    #[tokio::test]
    async fn questions_come_back_in_catalog_order() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db, MigrationTable::default());
        let survey = catalog.import(&cert_generator_survey()).await.unwrap();

        let refs: Vec<String> = catalog
            .questions(survey.id)
            .await
            .unwrap()
            .iter()
            .map(|q| q.reference_identifier().to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "introText",
                "dataTitle",
                "releaseType",
                "publisherUrl",
                "publisherRights",
                "chooseAny",
                "exampleTitles",
                "licenceNotes",
            ]
        );
    }

    #[test]
    fn corrupt_question_type_is_rejected() {
        assert!(matches!(
            QuestionType::parse("grid"),
            Err(EngineError::UnhandledQuestionType(t)) if t == "grid"
        ));
        assert_eq!(QuestionType::parse("any").unwrap(), QuestionType::Any);
    }
}
