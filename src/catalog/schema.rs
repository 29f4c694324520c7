use super::CatalogQuestion;
use crate::error::{EngineError, EngineResult};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, String>>,
}

/// Reference identifier → question description, in catalog order.
pub type SurveySchema = IndexMap<String, SchemaQuestion>;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SchemaResponse {
    Schema { schema: SurveySchema },
    Errors { errors: Vec<String> },
}

impl SchemaResponse {
    /// Lookup failures become an `errors` body; anything else stays an error.
    pub fn from_result(result: EngineResult<SurveySchema>) -> EngineResult<Self> {
        match result {
            Ok(schema) => Ok(SchemaResponse::Schema { schema }),
            Err(err @ EngineError::JurisdictionNotFound) => Ok(SchemaResponse::Errors {
                errors: vec![err.to_string()],
            }),
            Err(err) => Err(err),
        }
    }
}

pub fn project(questions: &[CatalogQuestion]) -> EngineResult<SurveySchema> {
    let mut schema = SurveySchema::new();
    for q in questions {
        if q.is_label() {
            continue;
        }
        let kind = q.question_type()?;
        let options = kind.has_options().then(|| {
            q.answers
                .iter()
                .map(|a| (a.reference_identifier.clone(), a.text.clone()))
                .collect()
        });
        schema.insert(
            q.reference_identifier().to_string(),
            SchemaQuestion {
                question: q.question.text.clone(),
                kind: kind.schema_name(),
                required: q.is_mandatory(),
                options,
            },
        );
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MigrationTable, SurveyCatalog};
    use crate::test_support::{cert_generator_survey, test_db};
    use serde_json::json;

    #[tokio::test]
    async fn schema_skips_labels_and_lists_options() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db, MigrationTable::default());
        catalog.import(&cert_generator_survey()).await.unwrap();

        let schema = catalog.schema("cert-generator").await.unwrap();

        assert!(!schema.contains_key("introText"));
        assert_eq!(schema.keys().next().map(String::as_str), Some("dataTitle"));

        let title = &schema["dataTitle"];
        assert_eq!(title.kind, "string");
        assert!(title.required);
        assert!(title.options.is_none());

        let release = &schema["releaseType"];
        assert_eq!(release.kind, "radio");
        let options = release.options.as_ref().unwrap();
        assert_eq!(options.get("oneoff").map(String::as_str), Some("One-off release"));

        assert_eq!(schema["chooseAny"].kind, "checkbox");
        assert_eq!(schema["exampleTitles"].kind, "repeating");
        assert!(schema["exampleTitles"].options.is_none());
    }

    #[tokio::test]
    async fn missing_jurisdiction_reports_errors_body() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db, MigrationTable::default());

        let body = SchemaResponse::from_result(catalog.schema("atlantis").await).unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "errors": ["Jurisdiction not found"] })
        );
    }

    #[tokio::test]
    async fn schema_body_serialises_under_schema_key() {
        let db = test_db().await;
        let catalog = SurveyCatalog::new(db, MigrationTable::default());
        catalog.import(&cert_generator_survey()).await.unwrap();

        let body = SchemaResponse::from_result(catalog.schema("cert-generator").await).unwrap();
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value["schema"]["dataTitle"],
            json!({ "question": "Data title", "type": "string", "required": true })
        );
    }
}
