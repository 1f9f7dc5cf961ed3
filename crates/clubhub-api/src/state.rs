//! Application state wiring the orchestrator to its adapters.
//!
//! The orchestrator is generic over its repository and club directory;
//! AppState pins it to the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use clubhub_core::llm::box_provider::BoxLlmProvider;
use clubhub_core::orchestrator::Orchestrator;
use clubhub_infra::config::{data_dir, database_url, load_config};
use clubhub_infra::llm::create_provider;
use clubhub_infra::sqlite::club::SqliteClubDirectory;
use clubhub_infra::sqlite::pool::DatabasePool;
use clubhub_infra::sqlite::session::SqliteSessionRepository;
use clubhub_types::config::AppConfig;

/// Orchestrator pinned to the infra implementations.
pub type ConcreteOrchestrator = Orchestrator<SqliteSessionRepository, SqliteClubDirectory>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load config, open the database and wire the orchestrator.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;
        let db_url = database_url(&config, &data_dir);
        let pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database {db_url}"))?;

        let provider = create_provider(&config.llm).context("failed to create LLM provider")?;

        Ok(Self::from_parts(pool, provider, config, data_dir))
    }

    pub fn from_parts(
        pool: DatabasePool,
        provider: BoxLlmProvider,
        config: AppConfig,
        data_dir: PathBuf,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            SqliteSessionRepository::new(pool.clone()),
            Arc::new(SqliteClubDirectory::new(pool)),
            Arc::new(provider),
            &config,
        );

        tracing::info!(
            agents = ?orchestrator.registry().names(),
            model = %config.llm.model,
            "Orchestrator ready"
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
            data_dir,
        }
    }
}
