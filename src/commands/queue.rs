use crate::commands::CommandError;
use crate::factory::{CertificateFactory, GenerationWorkers, QueueOptions, Queued};
use log::info;

pub async fn queue(
    factory: &CertificateFactory,
    url: &str,
    user_id: i32,
    jurisdiction: Option<String>,
) -> Result<String, CommandError> {
    let options = QueueOptions {
        jurisdiction,
        create_user: true,
        ..Default::default()
    };
    match factory.queue(url, user_id, options).await? {
        Queued::Generator(g) => Ok(format!("queued generator {} for {}", g.id, url)),
        Queued::Duplicate { dataset_id } => Ok(format!(
            "dataset {} already has a published certificate",
            dataset_id
        )),
    }
}

/// Recovers interrupted work, then runs workers until ctrl-c.
pub async fn work(workers: &GenerationWorkers) -> Result<String, CommandError> {
    workers.recover().await;
    let handles = workers.start();
    info!("Started {} generation worker(s)", handles.len());

    tokio::signal::ctrl_c().await?;
    for h in &handles {
        h.abort();
    }
    Ok(format!("stopped {} worker(s)", handles.len()))
}
