mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::{DelayQueueEntry, DeleteResult, Repos};
pub use repos::{
    IDelayQueueRepo, IInteractionRepo, INotificationRepo, InMemoryDelayQueueRepo,
    InMemoryInteractionRepo, InMemoryNotificationRepo,
};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};

#[derive(Clone)]
pub struct NudgeContext {
    pub repos: Repos,
    pub services: Services,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl NudgeContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&params.postgres_connection_string)
            .await?;
        let repos = Repos::create_postgres(pool);
        let config = Config::new();
        let services = Services::create(&repos, &config);
        Ok(Self {
            repos,
            services,
            config,
            sys: Arc::new(RealSys {}),
        })
    }

    /// Context backed entirely by in-memory stores. This is what every
    /// test runs against.
    pub fn create_inmemory() -> Self {
        let repos = Repos::create_inmemory();
        let config = Config::new();
        let services = Services::create(&repos, &config);
        Self {
            repos,
            services,
            config,
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<NudgeContext> {
    NudgeContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string()?,
    })
    .await
}

fn get_psql_connection_string() -> anyhow::Result<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .map_err(|_| anyhow::anyhow!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string().expect("DATABASE_URL to be present"))
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
