use keycloak_demo::core::config::{self, WebConfig};
use keycloak_demo::core::server;
use keycloak_demo::features::web::{routes, WebState};
use std::time::Duration;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

fn main() -> anyhow::Result<()> {
    let (runtime, worker_threads) = server::build_runtime()?;
    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    config::load_dotenv();
    server::init_tracing();

    let config = WebConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    tracing::info!(
        "Configuration loaded: authority={}, client_id={}, api_base_url={}, tokio_worker_threads={}",
        config.auth.authority,
        config.auth.client_id,
        config.endpoints.api_base_url,
        worker_threads
    );

    let state = WebState::new(&config)?;

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::debug!("Purged {} expired session(s)", removed);
            }
        }
    });
    tracing::info!("Session store initialized (ttl={:?})", config.session_ttl);

    let app = routes::routes(
        state,
        &config.auth.callback_path,
        &config.auth.signed_out_callback_path,
    );
    let app = server::with_http_layers(app);

    let addr = config.app.server_address();
    let listener = server::bind_listener(&addr)?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Sign-in callback at {}", config.redirect_uri());

    server::serve(listener, app).await
}
