mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use middleware::{REQUEST_ID_HEADER, correlation_middleware};

use crate::adapter::memory::InMemoryStore;
use crate::config;
use crate::error::AppError;
use crate::logging::init_logging;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application entry point. Loads configuration, initializes logging and
/// starts the server.
pub async fn run() -> Result<(), AppError> {
    // Handle healthcheck subcommand (for Docker healthcheck in distroless image)
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        match crate::healthcheck().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1)
            }
        }
    }

    // Nothing else starts until the profile is known to be valid.
    let settings = config::get_configuration()?;
    init_logging(&settings.log)?;
    tracing::info!(environment = %settings.environment(), "Loaded settings");

    let shutdown_token = CancellationToken::new();

    let store = Arc::new(InMemoryStore::new());
    let app_state = state::AppState::new(store, settings.environment());
    let app = router::main_router(app_state);

    server::serve(app, settings.http_port, shutdown_token).await
}
