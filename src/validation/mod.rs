//! Completeness checks run before a response set may be completed.
//!
//! Validation failures are user-facing strings, not errors: the generator
//! returns them next to a successful result.

pub mod probe;

pub use probe::{check_response_set, HttpUrlProbe, UrlProbe};

use crate::catalog::CatalogQuestion;
use crate::error::EngineResult;
use crate::storage::entity::{answer, response};
use crate::storage::repository::ResponseRepository;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub mandatory_complete: bool,
    pub urls_resolve: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mandatory_complete && self.urls_resolve
    }
}

pub fn invalid_url_message(reference: &str) -> String {
    format!("The question '{}' must have a valid URL", reference)
}

pub fn mandatory_message(reference: &str) -> String {
    format!("The question '{}' is mandatory", reference)
}

/// Choice responses always count; free-text ones need a non-blank value.
fn is_empty(response: &response::Model, answer: Option<&answer::Model>) -> bool {
    match answer {
        Some(a) if a.response_class == "answer" => false,
        _ => response
            .value()
            .map(|v| v.trim().is_empty())
            .unwrap_or(true),
    }
}

/// Pure evaluation over already-loaded rows. `responses` must be in creation
/// order and `questions` in catalog order.
pub fn evaluate(questions: &[CatalogQuestion], responses: &[response::Model]) -> ValidationReport {
    let answers: HashMap<i32, &answer::Model> = questions
        .iter()
        .flat_map(|q| q.answers.iter())
        .map(|a| (a.id, a))
        .collect();
    let references: HashMap<i32, &str> = questions
        .iter()
        .map(|q| (q.id(), q.reference_identifier()))
        .collect();

    let mut errors = Vec::new();

    let mut urls_resolve = true;
    for r in responses {
        let is_url = answers.get(&r.answer_id).map(|a| a.is_url()).unwrap_or(false);
        if is_url && r.error {
            urls_resolve = false;
            let reference = references.get(&r.question_id).copied().unwrap_or("unknown");
            errors.push(invalid_url_message(reference));
        }
    }

    let mut mandatory_complete = true;
    for q in questions.iter().filter(|q| q.is_mandatory()) {
        let answered = responses
            .iter()
            .filter(|r| r.question_id == q.id())
            .any(|r| !is_empty(r, answers.get(&r.answer_id).copied()));
        if !answered {
            mandatory_complete = false;
            errors.push(mandatory_message(q.reference_identifier()));
        }
    }

    ValidationReport {
        mandatory_complete,
        urls_resolve,
        errors,
    }
}

pub async fn validate(
    db: &DatabaseConnection,
    response_set_id: i32,
    questions: &[CatalogQuestion],
) -> EngineResult<ValidationReport> {
    let responses = ResponseRepository::for_response_set(db, response_set_id).await?;
    Ok(evaluate(questions, &responses))
}

pub async fn all_mandatory_questions_complete(
    db: &DatabaseConnection,
    response_set_id: i32,
    questions: &[CatalogQuestion],
) -> EngineResult<bool> {
    Ok(validate(db, response_set_id, questions)
        .await?
        .mandatory_complete)
}

pub async fn all_urls_resolve(
    db: &DatabaseConnection,
    response_set_id: i32,
    questions: &[CatalogQuestion],
) -> EngineResult<bool> {
    Ok(validate(db, response_set_id, questions).await?.urls_resolve)
}

pub async fn response_errors(
    db: &DatabaseConnection,
    response_set_id: i32,
    questions: &[CatalogQuestion],
) -> EngineResult<Vec<String>> {
    Ok(validate(db, response_set_id, questions).await?.errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{resolve, FieldValue};
    use crate::catalog::{MigrationTable, SurveyCatalog};
    use crate::storage::repository::{NewResponseSet, ResponseSetRepository};
    use crate::test_support::{seed_survey, test_db, StaticUrlProbe};
    use std::sync::Arc;

    struct Fixture {
        db: Arc<DatabaseConnection>,
        questions: Vec<CatalogQuestion>,
        response_set_id: i32,
    }

    impl Fixture {
        async fn new() -> Self {
            let db = test_db().await;
            let survey = seed_survey(&db).await;
            let catalog = SurveyCatalog::new(db.clone(), MigrationTable::default());
            let questions = catalog.questions(survey.id).await.unwrap();
            let rs = ResponseSetRepository::create(
                &db,
                NewResponseSet {
                    survey_id: survey.id,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            Self {
                db,
                questions,
                response_set_id: rs.id,
            }
        }

        async fn answer(&self, reference: &str, value: &str) {
            let q = self
                .questions
                .iter()
                .find(|q| q.reference_identifier() == reference)
                .unwrap();
            resolve(
                &self.db,
                self.response_set_id,
                q,
                &FieldValue::Text(value.to_string()),
            )
            .await
            .unwrap();
        }

        async fn report(&self) -> ValidationReport {
            validate(&self.db, self.response_set_id, &self.questions)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn empty_set_lists_every_mandatory_question_in_catalog_order() {
        let fx = Fixture::new().await;
        let report = fx.report().await;

        assert!(!report.mandatory_complete);
        assert!(report.urls_resolve);
        assert_eq!(
            report.errors,
            vec![
                "The question 'dataTitle' is mandatory",
                "The question 'publisherUrl' is mandatory",
            ]
        );
    }

    #[tokio::test]
    async fn blank_text_does_not_satisfy_a_mandatory_question() {
        let fx = Fixture::new().await;
        fx.answer("dataTitle", "   ").await;
        fx.answer("publisherUrl", "http://www.example.com").await;

        let report = fx.report().await;
        assert_eq!(report.errors, vec!["The question 'dataTitle' is mandatory"]);
    }

    #[tokio::test]
    async fn unchecked_urls_pass_and_failed_probes_are_reported_first() {
        let fx = Fixture::new().await;
        fx.answer("publisherUrl", "http://www.example/error").await;

        assert!(all_urls_resolve(&fx.db, fx.response_set_id, &fx.questions)
            .await
            .unwrap());

        let probe = StaticUrlProbe::unreachable(["http://www.example/error"]);
        let probed = check_response_set(&fx.db, &probe, fx.response_set_id, &fx.questions)
            .await
            .unwrap();
        assert_eq!(probed, 1);

        let errors = response_errors(&fx.db, fx.response_set_id, &fx.questions)
            .await
            .unwrap();
        assert_eq!(
            errors,
            vec![
                "The question 'publisherUrl' must have a valid URL",
                "The question 'dataTitle' is mandatory",
            ]
        );
        assert!(!all_mandatory_questions_complete(&fx.db, fx.response_set_id, &fx.questions)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn checked_urls_are_not_probed_again() {
        let fx = Fixture::new().await;
        fx.answer("publisherUrl", "http://www.example.com").await;
        let probe = StaticUrlProbe::default();

        let first = check_response_set(&fx.db, &probe, fx.response_set_id, &fx.questions)
            .await
            .unwrap();
        let second = check_response_set(&fx.db, &probe, fx.response_set_id, &fx.questions)
            .await
            .unwrap();
        assert_eq!((first, second), (1, 0));
    }

    #[tokio::test]
    async fn complete_answers_pass() {
        let fx = Fixture::new().await;
        fx.answer("dataTitle", "Bus stops").await;
        fx.answer("publisherUrl", "http://www.example.com").await;

        let report = fx.report().await;
        assert!(report.passed());
        assert!(report.errors.is_empty());
    }
}
