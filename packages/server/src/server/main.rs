// Main entry point for the GBB info search server

use std::sync::Arc;

use anyhow::{Context, Result};
use gbbinfo_core::domains::intent::{load_static_table, IntentCache, IntentRouter, NameIndex};
use gbbinfo_core::kernel::{AuditRecorder, GeminiOracle, JsonlAuditLedger, ServerDeps};
use gbbinfo_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gbbinfo_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GBB info search server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let layout = config.site_layout();
    let settings = config.router_settings();

    // Static question table and recent participants
    let static_table = load_static_table(&config.intent_cache_path())?;
    let seasons = layout.recent_years(2);
    let index = NameIndex::load(
        static_table.keys().map(String::as_str),
        &config.participants_dir(),
        &seasons,
    )
    .context("Failed to load participant datasets")?;
    let intent_cache = IntentCache::seed(
        static_table.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        &index,
    );

    // External collaborators
    let oracle = Arc::new(GeminiOracle::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    ));
    let audit = if config.audit_enabled {
        tracing::info!(path = %config.audit_ledger_path.display(), "Audit ledger enabled");
        AuditRecorder::spawn(
            Arc::new(JsonlAuditLedger::new(config.audit_ledger_path.clone())),
            config.audit_queue_capacity,
        )
    } else {
        tracing::info!("Audit ledger disabled");
        AuditRecorder::disabled()
    };

    let router = Arc::new(IntentRouter::new(
        layout,
        settings,
        intent_cache,
        &index,
        ServerDeps::new(oracle, audit),
    ));

    // Build application
    let app = build_app(router);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
