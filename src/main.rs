use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use corpusloom::infrastructure::container::AppContainer;
use corpusloom::infrastructure::database::connection::{database_url, run_migrations};
use corpusloom::infrastructure::worker::{WorkerConfig, wait_for_database};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let worker_config = WorkerConfig::default();

    let database_url = match database_url() {
        Ok(url) => url,
        Err(err) => {
            error!(error = %err, "database configuration is missing");
            std::process::exit(1);
        }
    };

    wait_for_database(
        &database_url,
        worker_config.db_wait_timeout,
        worker_config.db_wait_poll,
    )
    .await;

    if let Err(err) = run_migrations() {
        // The worker's tick path retries quietly while the database comes
        // up; unapplied migrations will fail loudly there if it never does.
        warn!(error = %err, "could not run migrations at startup");
    }

    let container = match AppContainer::from_env() {
        Ok(container) => container,
        Err(err) => {
            error!(error = %err, "invalid worker configuration");
            std::process::exit(1);
        }
    };

    let worker = container.worker.clone();
    let run_handle = tokio::spawn(worker.clone().run());

    shutdown_signal().await;
    worker.shutdown();
    if let Err(err) = run_handle.await {
        error!(error = %err, "worker task ended abnormally");
    }
    info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install interrupt handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install terminate handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("interrupt received"),
        _ = terminate => info!("terminate received"),
    }
}
