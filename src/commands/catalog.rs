use crate::catalog::{SurveyCatalog, SurveyDefinition};
use crate::commands::CommandError;
use crate::generator::GeneratorService;
use log::info;

pub async fn import(catalog: &SurveyCatalog, path: &str) -> Result<String, CommandError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let def: SurveyDefinition = serde_json::from_str(&raw)?;
    let survey = catalog.import(&def).await?;
    info!("Imported survey {} from {}", survey.id, path);
    Ok(format!(
        "imported survey {} ({}, access code {})",
        survey.id, survey.title, survey.access_code
    ))
}

pub async fn schema(generator: &GeneratorService, jurisdiction: &str) -> Result<String, CommandError> {
    let body = generator.schema(jurisdiction).await?;
    Ok(serde_json::to_string_pretty(&body)?)
}
