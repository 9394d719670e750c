use savannah_server::{
    app,
    auth::{AppState, IdentityProvider, OidcClient},
    config::ServerConfig,
    error::StartupError,
    notify::{AfricasTalkingSms, NoopNotifier, Notifier},
};
use savannah_store::{MemoryStore, PgStore, Repository};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!("{}", report);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> savannah_core::Result<(), StartupError> {
    // Load configuration from environment
    let config = ServerConfig::from_env().map_err(|e| StartupError::Configuration {
        details: e.to_string(),
    })?;
    tracing::info!("Loaded configuration");

    let repo = open_repository(&config).await?;

    // Initialize OIDC client
    tracing::info!("Discovering OIDC provider...");
    let provider: Arc<dyn IdentityProvider> = Arc::new(
        OidcClient::discover(&config.oidc)
            .await
            .map_err(|e| StartupError::Discovery {
                details: e.to_string(),
            })?,
    );

    let notifier: Arc<dyn Notifier> = match config.sms.credentials() {
        Some((username, api_key)) => {
            let mut sms = AfricasTalkingSms::new(username, api_key, config.sms.timeout())
                .map_err(StartupError::from)?;
            if let Some(host) = config.sms.host.as_deref() {
                sms = sms.with_host(host);
            }
            tracing::info!(host = sms.host(), "SMS notifications enabled");
            Arc::new(sms)
        }
        None => {
            tracing::warn!("SMS credentials not set, order confirmations are disabled");
            Arc::new(NoopNotifier)
        }
    };

    let addr: SocketAddr = config
        .listen_address
        .parse()
        .map_err(|e| StartupError::Configuration {
            details: format!("invalid listen address '{}': {}", config.listen_address, e),
        })?;
    let grace = config.shutdown_grace();

    let app_state = Arc::new(AppState::new(repo, provider, notifier, config.cookies));
    let router = app::router(app_state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Serve {
            details: format!("failed to bind to {addr}: {e}"),
        })?;

    tracing::info!("listening on http://{}", addr);

    serve(listener, router, grace).await
}

async fn open_repository(
    config: &ServerConfig,
) -> savannah_core::Result<Arc<dyn Repository>, StartupError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory storage");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let store = PgStore::connect(database_url, config.database_max_connections)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    tracing::info!("Running database migrations...");
    store.migrate().await.map_err(|e| StartupError::Database {
        details: e.to_string(),
    })?;

    Ok(Arc::new(store))
}

/// Serves until a shutdown signal, then drains for at most `grace`.
async fn serve(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    grace: Duration,
) -> savannah_core::Result<(), StartupError> {
    let stop = Arc::new(Notify::new());
    let stopped = stop.clone();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { stopped.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => return server_outcome(result),
        () = shutdown_signal() => {}
    }

    stop.notify_one();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => server_outcome(result),
        Err(_) => {
            tracing::warn!(
                grace_seconds = grace.as_secs(),
                "In-flight requests did not finish in time, aborting"
            );
            server.abort();
            Ok(())
        }
    }
}

fn server_outcome(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> savannah_core::Result<(), StartupError> {
    match result {
        Ok(Ok(())) => {
            tracing::info!("Server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(StartupError::Serve {
            details: e.to_string(),
        }
        .into()),
        Err(e) => Err(StartupError::Serve {
            details: format!("server task failed: {e}"),
        }
        .into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
