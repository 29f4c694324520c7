pub mod app_command;
pub mod catalog;
pub mod queue;

pub use app_command::{AppCommand, HELP};

use crate::catalog::SurveyCatalog;
use crate::error::EngineError;
use crate::factory::{CertificateFactory, GenerationWorkers};
use crate::generator::GeneratorService;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a command needs, wired once at startup.
pub struct AppContext {
    pub catalog: Arc<SurveyCatalog>,
    pub generator: Arc<GeneratorService>,
    pub factory: CertificateFactory,
    pub workers: GenerationWorkers,
}

/// Runs one command and returns the text to print.
pub async fn execute(cmd: AppCommand, ctx: &AppContext) -> Result<String, CommandError> {
    match cmd {
        AppCommand::Import { path } => catalog::import(&ctx.catalog, &path).await,
        AppCommand::Schema { jurisdiction } => catalog::schema(&ctx.generator, &jurisdiction).await,
        AppCommand::Queue {
            url,
            user_id,
            jurisdiction,
        } => queue::queue(&ctx.factory, &url, user_id, jurisdiction).await,
        AppCommand::Worker => queue::work(&ctx.workers).await,
        AppCommand::Help => Ok(HELP.to_string()),
        AppCommand::Unknown(msg) => Err(CommandError::Usage(msg)),
    }
}
