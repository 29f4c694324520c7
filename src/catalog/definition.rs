//! Already-parsed survey definitions accepted by the catalog importer.
//!
//! The authoring format itself lives elsewhere; these types only describe the
//! shape the importer persists.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDefinition {
    pub title: String,
    pub access_code: String,
    #[serde(default)]
    pub survey_version: i32,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub reference_identifier: String,
    pub text: String,
    /// none / one / any / repeater
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub display_type: Option<String>,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub answers: Vec<AnswerDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDefinition {
    pub reference_identifier: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_response_class")]
    pub response_class: String,
    #[serde(default)]
    pub input_type: Option<String>,
}

fn default_question_type() -> String {
    "none".to_string()
}

fn default_response_class() -> String {
    "answer".to_string()
}
