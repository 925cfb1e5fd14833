mod backend;
mod config;
mod error;
mod logging;
mod provisioning;
mod rest;
mod scheduler;
mod seed;
mod session;
mod store;
mod telemetry;

use backend::BackendClient;
use config::CONFIG;
use error::ConsoleError;
use session::{Auth, FileSessionStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use store::{ConsoleStore, StoreSettings};
use tokio::sync::watch;
use tracing::{error, info, warn};

static TERMINATED: AtomicUsize = AtomicUsize::new(0);

fn register_sigint_handler(shutdown: watch::Sender<bool>) {
    let res = ctrlc::set_handler(move || {
        let count = TERMINATED.fetch_add(1, Ordering::Relaxed);
        if count >= 1 {
            info!("Force killing");
            std::process::exit(0);
        }
        info!("Shutting down, press CTRL-C again to force");
        let _ = shutdown.send(true);
    });
    if let Err(err) = res {
        warn!("Could not register SIGINT handler: {}", err);
    }
}

/// Pulls farms, plots and valves from the backend into the store
async fn sync_backend(
    store: &ConsoleStore,
    backend: &BackendClient,
) -> Result<(), error::BackendError> {
    let farms = backend.farms().await?;
    let plots = backend.plots().await?;
    let valves = backend.valves().await?;
    store.load(farms);
    store.load(plots);
    store.load(valves);
    Ok(())
}

#[tokio::main]
pub async fn main() -> Result<(), ConsoleError> {
    logging::init_tracing();

    let store = ConsoleStore::new(StoreSettings {
        provision_delay: CONFIG.provision_delay(),
        ..Default::default()
    });
    let auth = Auth::restore(Box::new(FileSessionStore::new(CONFIG.session_file())))?;
    let backend = BackendClient::new(&CONFIG.api_base_url())?;
    backend.set_token(auth.token());

    match sync_backend(&store, &backend).await {
        Ok(_) => info!(url = %backend.base_url(), "Synchronized with backend"),
        Err(err) => {
            warn!(url = %backend.base_url(), "Backend unavailable: {}", err);
            if CONFIG.seed_demo_data() {
                seed::seed_demo_data(&store)?;
            }
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    register_sigint_handler(shutdown_tx);

    let telemetry_loop = tokio::spawn(telemetry::dispatch_telemetry_loop(
        store.clone(),
        CONFIG.telemetry_interval(),
        shutdown_rx.clone(),
    ));

    let ctx = rest::Context {
        store: store.clone(),
        backend: Arc::new(backend),
        auth: Arc::new(auth),
    };
    if let Err(err) = rest::dispatch_server_daemon(ctx, CONFIG.server_port(), shutdown_rx).await {
        error!("Webserver failed: {}", err);
    }

    store.shutdown();
    telemetry_loop.abort();
    let _ = telemetry_loop.await;
    Ok(())
}
