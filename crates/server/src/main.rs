//! Voice Agent Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_agent_config::{load_settings, Settings};
use voice_agent_llm::{LlmConfig, LlmCoordinator, OpenAiCompatibleBackend};
use voice_agent_server::{create_router, AppState};
use voice_agent_session::{InMemorySessionStore, RedisSessionStore, SessionManager, SessionStore};
use voice_agent_tools::{StubPmsConnectorFactory, ToolDispatcher};
use voice_agent_tts::TtsCoordinator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("VOICE_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("Loaded configuration from files (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("Warning: Failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Voice Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(environment = ?config.environment, region = ?config.region, "Configuration loaded");

    let session_store: Arc<dyn SessionStore> = match RedisSessionStore::connect(&config.persistence.redis_url).await {
        Ok(store) => {
            tracing::info!(redis_url = %config.persistence.redis_url, "Connected to Redis session store");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis. Falling back to in-memory session store.");
            Arc::new(InMemorySessionStore::default())
        }
    };

    let llm_config = LlmConfig {
        model: config.collaborators.llm_model.clone(),
        endpoint: config.collaborators.llm_url.clone(),
        api_key: config.collaborators.llm_api_key.clone(),
        ..LlmConfig::default()
    };
    let llm_backend = Arc::new(OpenAiCompatibleBackend::new(llm_config)?);
    let pms_factory = Arc::new(StubPmsConnectorFactory);
    let dispatcher = Arc::new(ToolDispatcher::new(pms_factory));
    let llm = Arc::new(LlmCoordinator::new(llm_backend, dispatcher, "VoiceHive Hotel", "en"));

    let tts = Arc::new(TtsCoordinator::new(config.collaborators.tts_router_url.as_str())?);

    let session_manager = Arc::new(SessionManager::new(session_store, llm, tts, config.persistence.session_ttl_seconds));

    let state = AppState::new(Arc::new(config.clone()), session_manager);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("voice_agent={level},tower_http=debug").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
