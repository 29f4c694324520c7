use crate::storage::entity::{
    answer, certificate, certificate_generator, certification_campaign, dataset, question,
    response, response_set, section, survey, user,
};
use log::info;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, Schema, Statement,
};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl StorageConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(8),
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }

    /// A private in-memory database. SQLite gives every connection its own
    /// memory database, so the pool is pinned to a single connection.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(8),
            idle_timeout: None,
        }
    }
}

pub async fn establish_connection(cfg: &StorageConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(cfg.url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(cfg.connect_timeout)
        .acquire_timeout(cfg.connect_timeout)
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    if let Some(idle) = cfg.idle_timeout {
        opt.idle_timeout(idle);
    }

    let db = Database::connect(opt).await?;
    let backend = db.get_database_backend();

    if backend == DatabaseBackend::Sqlite {
        db.execute(Statement::from_string(
            backend,
            "PRAGMA journal_mode=WAL;".to_string(),
        ))
        .await?;
    }

    create_tables(&db).await?;

    info!("Database connection established and tables initialized.");

    Ok(db)
}

pub async fn connect_in_memory() -> Result<DatabaseConnection, DbErr> {
    establish_connection(&StorageConfig::in_memory()).await
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(schema.create_table_from_entity(entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Catalog
    create_table(db, survey::Entity).await?;
    create_table(db, section::Entity).await?;
    create_table(db, question::Entity).await?;
    create_table(db, answer::Entity).await?;

    // Accounts and datasets
    create_table(db, user::Entity).await?;
    create_table(db, dataset::Entity).await?;

    // Responses
    create_table(db, response_set::Entity).await?;
    create_table(db, response::Entity).await?;
    create_table(db, certificate::Entity).await?;

    // Generation
    create_table(db, certification_campaign::Entity).await?;
    create_table(db, certificate_generator::Entity).await?;

    let backend = db.get_database_backend();
    for sql in [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_questions_survey_ref ON questions(survey_id, reference_identifier);",
        "CREATE INDEX IF NOT EXISTS idx_responses_set_question ON responses(response_set_id, question_id);",
        "CREATE INDEX IF NOT EXISTS idx_response_sets_dataset ON response_sets(dataset_id);",
        "CREATE INDEX IF NOT EXISTS idx_surveys_access_code ON surveys(access_code);",
    ] {
        db.execute(Statement::from_string(backend, sql.to_string()))
            .await?;
    }

    Ok(())
}
