use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nerdherd_api::config::ServiceConfig;
use nerdherd_api::state::AppState;
use nerdherd_bedrock::{BedrockCompleter, BedrockModerator};
use nerdherd_diagnosis::persist::spawn_persistence_worker;
use nerdherd_diagnosis::session::Collaborators;
use nerdherd_storage::S3RecordStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON for log shipping, human-readable otherwise.
    if std::env::var("NERDHERD_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let config = ServiceConfig::load()?;
    tracing::info!(
        region = %config.region,
        bucket = %config.bucket,
        model_id = %config.model_id,
        max_questions = config.max_questions,
        session_ttl_secs = config.session_ttl_secs,
        "configuration loaded"
    );

    let sdk_config = nerdherd_api::aws::build_aws_config(&config.region, &config.credentials).await;

    let store = Arc::new(S3RecordStore::new(
        nerdherd_storage::client::build_client(&sdk_config),
        config.bucket.clone(),
    ));
    let (events, worker) = spawn_persistence_worker(store.clone());

    let collaborators = Collaborators::new(
        Arc::new(BedrockModerator::new(
            &sdk_config,
            config.guardrail_id.clone(),
            config.guardrail_version.clone(),
        )),
        Arc::new(
            BedrockCompleter::new(&sdk_config, config.model_id.clone())
                .with_params(config.inference_params()),
        ),
    );

    let state = AppState::new(
        store,
        collaborators,
        config.session_settings(),
        events,
        config.admin_token.clone(),
    );
    if state.admin_token.is_none() {
        tracing::warn!("no admin token configured; admin routes are disabled");
    }

    let sweeper = state.spawn_session_sweeper(config.session_ttl());

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, nerdherd_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The sweeper holds a state clone, and with it an event sender.
    sweeper.abort();
    let _ = sweeper.await;

    // Every session sender is gone with the router; let queued writes land.
    worker.await?;
    Ok(())
}
