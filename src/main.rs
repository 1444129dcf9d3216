use std::sync::Arc;

use bulls_backend::api::{self, AppState};
use bulls_backend::config::Config;
use bulls_backend::db::Database;
use bulls_backend::session::SessionManager;
use bulls_backend::store::SessionStore;
use bulls_backend::{metrics, sweeper, telemetry};

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    let config = Config::load();
    metrics::register_metrics();

    // The game cannot run without its store; abort startup if it is unreachable.
    let db = Database::new(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let store: Arc<dyn SessionStore> = Arc::new(db);

    if let Some(max_idle) = config.session_idle_ttl {
        tracing::info!(
            "Expiring sessions idle for {}s (sweep every {}s)",
            max_idle.as_secs(),
            config.sweep_interval.as_secs()
        );
        sweeper::spawn_session_sweeper(store.clone(), max_idle, config.sweep_interval);
    }

    if config.session_secret.is_none() {
        tracing::warn!("SESSION_SECRET not set; session cookies will not survive a restart");
    }

    let state = AppState::new(SessionManager::new(store), config.session_secret.as_deref());
    let app = api::router(state, config.static_dir.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Bulls and Cows backend listening on {addr}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
