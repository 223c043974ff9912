use std::sync::Arc;

use anyhow::Context;

use propdesk_assistant::api::{self, AppState};
use propdesk_assistant::assistant::{Database, Orchestrator, ToolCatalog};
use propdesk_assistant::inference::config::{find_config_path, load_config};
use propdesk_assistant::inference::CompletionClient;
use propdesk_assistant::{data_dir, init_tracing, resolve_db_path};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config_path = find_config_path(&cwd)?;
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&data_dir(), config.logging.format);
    tracing::info!(config = %config_path.display(), "configuration loaded");

    // Fail fast: a missing credential would fail every turn anyway.
    config.require_credential()?;

    let db_path = resolve_db_path(config.storage.database_path.as_deref());
    let database = Arc::new(
        Database::open(&db_path).with_context(|| format!("opening database {db_path}"))?,
    );
    tracing::info!(path = %db_path, "database opened");

    let catalog = Arc::new(ToolCatalog::property_management()?);
    let client = Arc::new(CompletionClient::new(config.completion.clone())?);
    tracing::info!(
        model = %client.default_model(),
        tools = catalog.len(),
        "completion gateway ready"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        database.clone(),
        database.clone(),
        client,
        catalog,
        config.context.clone(),
    )?);

    let state = AppState::new(orchestrator, database)
        .with_allowed_origins(config.server.allowed_origins.clone());

    api::serve(&config.server.bind, state)
        .await
        .with_context(|| format!("serving on {}", config.server.bind))?;
    Ok(())
}
