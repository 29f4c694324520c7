use crate::error::EngineResult;
use crate::generator::GeneratorService;
use crate::storage::entity::certificate_generator;
use crate::storage::repository::{GeneratorRepository, GeneratorStatus};
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Background workers draining QUEUED generators.
#[derive(Clone)]
pub struct GenerationWorkers {
    db: Arc<DatabaseConnection>,
    generator: Arc<GeneratorService>,
    default_jurisdiction: String,
    worker_count: usize,
    poll_interval: Duration,
}

impl GenerationWorkers {
    pub fn new(
        db: Arc<DatabaseConnection>,
        generator: Arc<GeneratorService>,
        default_jurisdiction: impl Into<String>,
        worker_count: usize,
    ) -> Self {
        Self {
            db,
            generator,
            default_jurisdiction: default_jurisdiction.into(),
            worker_count: worker_count.max(1),
            poll_interval: Duration::from_millis(300),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Spawns `worker_count` resident workers.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        (0..self.worker_count)
            .map(|idx| {
                let worker_id = format!("w{}", idx + 1);
                let workers = self.clone();
                tokio::spawn(async move {
                    loop {
                        match workers.run_once(&worker_id).await {
                            Ok(true) => continue,
                            Ok(false) => sleep(workers.poll_interval).await,
                            Err(e) => {
                                warn!("[{}] claim failed: {}", worker_id, e);
                                sleep(workers.poll_interval).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Claims and runs one generator. Returns false when the queue was empty.
    pub async fn run_once(&self, worker_id: &str) -> EngineResult<bool> {
        let Some(job) = GeneratorRepository::claim_next(&self.db, worker_id).await? else {
            return Ok(false);
        };
        info!("[{}] running generator {}", worker_id, job.id);

        match self.run(&job).await {
            Ok(()) => {
                GeneratorRepository::mark_status(&self.db, job.id, GeneratorStatus::Done, None)
                    .await?;
            }
            Err(message) => {
                warn!("[{}] generator {} failed: {}", worker_id, job.id, message);
                GeneratorRepository::mark_status(
                    &self.db,
                    job.id,
                    GeneratorStatus::Failed,
                    Some(message),
                )
                .await?;
            }
        }
        Ok(true)
    }

    async fn run(&self, job: &certificate_generator::Model) -> Result<(), String> {
        let jurisdiction = job
            .jurisdiction
            .as_deref()
            .unwrap_or(&self.default_jurisdiction);
        let cert = self
            .generator
            .generate(job.id, jurisdiction, job.create_user, job.existing_dataset_id)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            "Generator {} finished (certificate {}, published: {})",
            job.id, cert.id, cert.published
        );
        Ok(())
    }

    /// Startup recovery: generators left CLAIMED by a dead process go back
    /// to the queue.
    pub async fn recover(&self) -> u64 {
        match GeneratorRepository::reset_stale(&self.db).await {
            Ok(count) if count > 0 => {
                info!("Requeued {} interrupted generator(s)", count);
                count
            }
            Ok(_) => 0,
            Err(e) => {
                error!("Failed to requeue interrupted generators: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MigrationTable, SurveyCatalog};
    use crate::factory::{CertificateFactory, QueueOptions, Queued};
    use crate::storage::repository::ResponseSetRepository;
    use crate::test_support::{
        seed_survey, seed_user, test_db, StaticAutoPopulator, StaticUrlProbe,
    };

    async fn setup() -> (Arc<DatabaseConnection>, GenerationWorkers, CertificateFactory, i32) {
        let db = test_db().await;
        seed_survey(&db).await;
        let user = seed_user(&db, "bulk@example.org", false).await;
        let service = Arc::new(GeneratorService::new(
            db.clone(),
            Arc::new(SurveyCatalog::new(db.clone(), MigrationTable::default())),
            Arc::new(StaticUrlProbe::default()),
            Arc::new(StaticAutoPopulator::default()),
        ));
        let workers = GenerationWorkers::new(db.clone(), service, "cert-generator", 1);
        let factory = CertificateFactory::new(db.clone(), "cert-generator");
        (db, workers, factory, user.id)
    }

    async fn queue(factory: &CertificateFactory, user_id: i32, options: QueueOptions) -> i32 {
        match factory
            .queue("http://docs.example.com", user_id, options)
            .await
            .unwrap()
        {
            Queued::Generator(g) => g.id,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_queue_does_nothing() {
        let (_, workers, _, _) = setup().await;
        assert!(!workers.run_once("w1").await.unwrap());
    }

    #[tokio::test]
    async fn queued_generator_runs_to_done() {
        let (db, workers, factory, user_id) = setup().await;
        let id = queue(&factory, user_id, QueueOptions::default()).await;

        assert!(workers.run_once("w1").await.unwrap());
        assert!(!workers.run_once("w1").await.unwrap());

        let job = GeneratorRepository::find(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, "DONE");
        assert_eq!(job.claimed_by.as_deref(), Some("w1"));
        assert!(job.completed);

        // only the documentation URL was supplied, so the set stays draft
        let rs = ResponseSetRepository::find(&db, job.response_set_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(rs.lifecycle().unwrap().is_draft());
    }

    #[tokio::test]
    async fn failures_are_recorded_on_the_generator() {
        let (db, workers, factory, user_id) = setup().await;
        let id = queue(
            &factory,
            user_id,
            QueueOptions {
                jurisdiction: Some("atlantis".into()),
                ..Default::default()
            },
        )
        .await;

        assert!(workers.run_once("w1").await.unwrap());
        let job = GeneratorRepository::find(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, "FAILED");
        assert_eq!(job.last_error_message.as_deref(), Some("Jurisdiction not found"));
    }

    #[tokio::test]
    async fn recover_requeues_claimed_generators() {
        let (db, workers, factory, user_id) = setup().await;
        let id = queue(&factory, user_id, QueueOptions::default()).await;
        GeneratorRepository::claim_next(&db, "dead-worker")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(workers.recover().await, 1);
        let job = GeneratorRepository::find(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, "QUEUED");
        assert!(workers.run_once("w2").await.unwrap());
    }

    #[tokio::test]
    async fn started_workers_drain_the_queue() {
        let (db, workers, factory, user_id) = setup().await;
        let id = queue(&factory, user_id, QueueOptions::default()).await;

        let handles = workers
            .with_poll_interval(Duration::from_millis(10))
            .start();
        let mut status = String::new();
        for _ in 0..200 {
            status = GeneratorRepository::find(&db, id).await.unwrap().unwrap().status;
            if status == "DONE" {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        for h in handles {
            h.abort();
        }
        assert_eq!(status, "DONE");
    }
}
