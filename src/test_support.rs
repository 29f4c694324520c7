//! Shared fixtures for unit tests.

use crate::autopopulate::{AutoPopulateError, AutoPopulator, KittenData};
use crate::catalog::{AnswerDefinition, QuestionDefinition, SectionDefinition, SurveyDefinition};
use crate::storage::entity::{survey, user};
use crate::storage::repository::{CatalogRepository, NewUser, UserRepository};
use crate::storage::connect_in_memory;
use crate::users::password;
use crate::validation::UrlProbe;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub async fn test_db() -> Arc<DatabaseConnection> {
    Arc::new(connect_in_memory().await.expect("in-memory database"))
}

fn answer(reference: &str, text: &str, response_class: &str) -> AnswerDefinition {
    AnswerDefinition {
        reference_identifier: reference.to_string(),
        text: text.to_string(),
        response_class: response_class.to_string(),
        input_type: None,
    }
}

fn question(
    reference: &str,
    text: &str,
    question_type: &str,
    is_mandatory: bool,
    answers: Vec<AnswerDefinition>,
) -> QuestionDefinition {
    QuestionDefinition {
        reference_identifier: reference.to_string(),
        text: text.to_string(),
        question_type: question_type.to_string(),
        display_type: None,
        is_mandatory,
        answers,
    }
}

/// Small two-section survey covering every question type.
pub fn cert_generator_survey() -> SurveyDefinition {
    let intro = QuestionDefinition {
        display_type: Some("label".to_string()),
        ..question("introText", "About this certificate", "none", false, vec![])
    };
    let publisher_url = question(
        "publisherUrl",
        "Publisher website",
        "none",
        true,
        vec![AnswerDefinition {
            input_type: Some("url".to_string()),
            ..answer("publisherUrl_1", "", "string")
        }],
    );

    SurveyDefinition {
        title: "Certificate generator".to_string(),
        access_code: "cert-generator".to_string(),
        survey_version: 1,
        sections: vec![
            SectionDefinition {
                title: "General".to_string(),
                questions: vec![
                    intro,
                    question(
                        "dataTitle",
                        "Data title",
                        "none",
                        true,
                        vec![answer("dataTitle_1", "", "string")],
                    ),
                    question(
                        "releaseType",
                        "What kind of release is this?",
                        "one",
                        false,
                        vec![
                            answer("oneoff", "One-off release", "answer"),
                            answer("collection", "A collection of datasets", "answer"),
                            answer("series", "Ongoing release of a series", "answer"),
                        ],
                    ),
                    publisher_url,
                ],
            },
            SectionDefinition {
                title: "Legal".to_string(),
                questions: vec![
                    question(
                        "publisherRights",
                        "Do you have the rights to publish?",
                        "one",
                        false,
                        vec![
                            answer("yes", "Yes", "answer"),
                            answer("no", "No", "answer"),
                            answer("unsure", "Not sure", "answer"),
                        ],
                    ),
                    question(
                        "chooseAny",
                        "Pick any",
                        "any",
                        false,
                        vec![
                            answer("one", "One", "answer"),
                            answer("two", "Two", "answer"),
                            answer("three", "Three", "answer"),
                        ],
                    ),
                    question(
                        "exampleTitles",
                        "Example titles",
                        "repeater",
                        false,
                        vec![answer("exampleTitles_1", "", "string")],
                    ),
                    question(
                        "licenceNotes",
                        "Licence notes",
                        "none",
                        false,
                        vec![answer("licenceNotes_1", "", "text")],
                    ),
                ],
            },
        ],
    }
}

pub async fn seed_survey(db: &DatabaseConnection) -> survey::Model {
    CatalogRepository::import(db, &cert_generator_survey())
        .await
        .expect("survey import")
}

pub async fn seed_user(db: &DatabaseConnection, email: &str, admin: bool) -> user::Model {
    UserRepository::create(
        db,
        NewUser {
            email: email.to_string(),
            name: None,
            encrypted_password: password::digest_password("secret"),
            admin,
            skip_confirmation: true,
        },
    )
    .await
    .expect("user insert")
}

/// Every URL resolves except the listed ones.
#[derive(Debug, Default)]
pub struct StaticUrlProbe {
    unreachable: HashSet<String>,
}

impl StaticUrlProbe {
    pub fn unreachable<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unreachable: urls.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UrlProbe for StaticUrlProbe {
    async fn resolves(&self, url: &str) -> bool {
        !self.unreachable.contains(url)
    }
}

/// Canned kitten data keyed by documentation URL.
#[derive(Debug, Default)]
pub struct StaticAutoPopulator {
    pages: HashMap<String, KittenData>,
    failing: HashSet<String>,
}

impl StaticAutoPopulator {
    pub fn with_page(mut self, url: &str, data: KittenData) -> Self {
        self.pages.insert(url.to_string(), data);
        self
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }
}

#[async_trait]
impl AutoPopulator for StaticAutoPopulator {
    async fn fetch(&self, documentation_url: &str) -> Result<Option<KittenData>, AutoPopulateError> {
        if self.failing.contains(documentation_url) {
            return Err(AutoPopulateError::Http("connection refused".to_string()));
        }
        Ok(self.pages.get(documentation_url).cloned())
    }
}
