use anyhow::Context;
use certgen::autopopulate::{AutoPopulator, HttpKittenClient, NoAutoPopulation};
use certgen::catalog::SurveyCatalog;
use certgen::commands::{self, AppCommand, AppContext};
use certgen::factory::{CertificateFactory, GenerationWorkers};
use certgen::generator::GeneratorService;
use certgen::storage;
use certgen::validation::HttpUrlProbe;
use certgen::EngineConfig;
use log::{info, warn};
use std::sync::Arc;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("certgen", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let line = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let cmd = line.parse::<AppCommand>().unwrap_or(AppCommand::Help);
    if cmd == AppCommand::Help {
        println!("{}", commands::HELP);
        return Ok(());
    }

    let config = EngineConfig::from_env();
    let db = Arc::new(
        storage::establish_connection(&config.storage)
            .await
            .with_context(|| format!("cannot open database {}", config.storage.url))?,
    );
    info!("Using database {}", config.storage.url);

    let auto_populator: Arc<dyn AutoPopulator> = match &config.kitten_url {
        Some(url) => Arc::new(HttpKittenClient::new(url.clone(), config.url_timeout)?),
        None => {
            warn!("CERTGEN_KITTEN_URL not set, auto-population disabled");
            Arc::new(NoAutoPopulation)
        }
    };
    let catalog = Arc::new(SurveyCatalog::new(db.clone(), config.migrations.clone()));
    let generator = Arc::new(
        GeneratorService::new(
            db.clone(),
            catalog.clone(),
            Arc::new(HttpUrlProbe::new(config.url_timeout)?),
            auto_populator,
        )
        .with_public_host(config.public_host.clone()),
    );

    let ctx = AppContext {
        factory: CertificateFactory::new(db.clone(), config.default_jurisdiction.clone()),
        workers: GenerationWorkers::new(
            db.clone(),
            generator.clone(),
            config.default_jurisdiction.clone(),
            config.workers,
        ),
        catalog,
        generator,
    };

    let out = commands::execute(cmd, &ctx).await?;
    println!("{}", out);
    Ok(())
}
