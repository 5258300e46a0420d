use std::path::PathBuf;
use std::sync::Arc;

use giftwise_common::GiftwiseError;
use metrics_exporter_prometheus::PrometheusBuilder;

use giftwise_engine::advisor::GiftAdvisorSession;
use giftwise_engine::config;
use giftwise_engine::date_context::SystemClock;
use giftwise_engine::llm::LlmClient;
use giftwise_engine::routes::{create_router, AppState};
use giftwise_engine::tools::handlers::register_gift_tools;
use giftwise_engine::tools::{ToolHandlerContext, ToolRegistry};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Giftwise starting");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Giftwise failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), GiftwiseError> {
    let config_dir = std::env::var("GIFTWISE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    // Misconfiguration refuses to start.
    let engine_config = config::load_config(&config_dir)?;

    let metrics_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        GiftwiseError::Internal(format!("Failed to install Prometheus recorder: {}", e))
    })?;

    let llm = LlmClient::new(
        engine_config.system.llm.clone(),
        engine_config.system.retry.llm_api.clone(),
    )?;

    // The registry is built once here and never mutated afterwards.
    let mut tool_registry = ToolRegistry::new(ToolHandlerContext {
        clock: Arc::new(SystemClock),
    });
    register_gift_tools(&mut tool_registry);
    tool_registry
        .load_definitions(&engine_config.tool_schemas)
        .map_err(GiftwiseError::Config)?;

    let system_prompt = engine_config
        .gift_advisor_prompt()
        .ok_or_else(|| GiftwiseError::Config("Gift advisor prompt missing".into()))?
        .to_string();

    let advisor = GiftAdvisorSession::new(
        Arc::new(llm),
        Arc::new(tool_registry),
        system_prompt,
        &engine_config.system.orchestration,
    );

    let state = Arc::new(AppState {
        advisor,
        metrics_handle,
    });

    let app = create_router(state, &engine_config.system.server.allowed_origins);

    let port = engine_config.system.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .map_err(|e| GiftwiseError::Internal(format!("Failed to bind port {}: {}", port, e)))?;

    tracing::info!(
        port = port,
        llm_url = %engine_config.system.llm.base_url,
        model = %engine_config.system.llm.model,
        "Giftwise listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| GiftwiseError::Internal(format!("HTTP server error: {}", e)))
}
