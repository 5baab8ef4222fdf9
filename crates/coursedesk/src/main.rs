use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use coursedesk::catalog::CourseApiClient;
use coursedesk::config::AppConfig;
use coursedesk::server::create_router;
use coursedesk::types::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // A config file path may be passed as the only argument; otherwise the
    // environment (and .env) is used.
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            AppConfig::load_from_file(Path::new(&path))?
        }
        None => AppConfig::from_env()?,
    };

    info!(
        "Course service: {}, section service: {}, token configured: {}",
        config.course_service_url,
        config.section_service_url,
        config.api_token.is_some()
    );

    let client = CourseApiClient::with_config(config.client_config())?;
    let bind_address = config.bind_address.clone();
    let app_state = Arc::new(AppState::new(config, client));
    spawn_form_sweeper(app_state.clone());

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Drops abandoned section forms even when no new form is opened.
fn spawn_form_sweeper(app_state: Arc<AppState>) {
    let period = app_state.forms.idle_ttl().min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            app_state.forms.cleanup_expired();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler there is nothing to wait on; keep serving
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
