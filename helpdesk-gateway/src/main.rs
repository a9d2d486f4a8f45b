use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_gateway::chat::ChatOrchestrator;
use helpdesk_gateway::escalation::FeedbackHandler;
use helpdesk_gateway::providers::OpenAiCompatibleClient;
use helpdesk_gateway::server;
use helpdesk_gateway::state::AppState;
use helpdesk_knowledge::{IndexOptions, KnowledgeError, KnowledgeIndex};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    helpdesk_core::load_dotenv();

    // Load configuration
    let config = helpdesk_core::Config::load()?;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(helpdesk_gateway::log_bridge::GatewayLogBridge)
        .init();

    info!(
        "Configuration loaded (model: {}, timeout: {}s)",
        config.settings.generation.model, config.settings.generation.timeout_seconds
    );

    // Initialize database
    let db = match &config.settings.database.path {
        Some(path) => helpdesk_db::HelpdeskDbPool::open(&PathBuf::from(path)).await?,
        None => helpdesk_db::HelpdeskDbPool::new().await?,
    };

    // Load the knowledge corpus
    let options = IndexOptions::from(&config.settings.knowledge);
    let corpus_path = PathBuf::from(&config.settings.knowledge.corpus_path);
    let index = match KnowledgeIndex::load(&corpus_path, options.clone()).await {
        Ok(index) => index,
        Err(KnowledgeError::CorpusNotFound(path)) => {
            warn!(
                "Knowledge corpus not found at {}, answering without context",
                path.display()
            );
            KnowledgeIndex::empty(options)
        }
        Err(e) => return Err(e.into()),
    };

    // Create the generation client
    let api_key = config.generation_api_key().map(str::to_string);
    if api_key.is_none() {
        warn!(
            "{} is not set; every question will be escalated",
            config.settings.generation.api_key_env
        );
    }
    let generator = OpenAiCompatibleClient::from_settings(&config.settings.generation, api_key)?;

    // Create shared application state
    let orchestrator = ChatOrchestrator::new(
        Arc::new(index),
        Arc::new(generator),
        db.clone(),
        &config.settings,
    )?;
    let state = Arc::new(AppState::new(orchestrator, FeedbackHandler::new(db)));
    state.install_global_log();

    // Security: Verify localhost-only binding
    if config.settings.gateway.host != "127.0.0.1" && config.settings.gateway.host != "localhost" {
        warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            config.settings.gateway.host
        );
    }

    // Start the HTTP server
    let bind_addr = config.bind_addr();
    info!("Starting helpdesk server on {}", bind_addr);

    server::run(state, &bind_addr, &config.settings.gateway.cors_origins).await
}
