use anyhow::Result;
use fleetwarden::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let client = stores::build_http_client(&app_config.stores)?;

    let market: Arc<dyn market_repo::MarketHistory> = Arc::new(
        market_repo::HttpMarketHistory::new(client.clone(), app_config.stores.market_url.clone()),
    );
    let launch: Arc<dyn launch_repo::LaunchConfigStore> = Arc::new(
        launch_repo::HttpLaunchConfigStore::new(client.clone(), app_config.stores.launch_url.clone()),
    );
    let params: Arc<dyn param_repo::ParameterStore> = Arc::new(
        param_repo::HttpParameterStore::new(client.clone(), app_config.stores.parameter_url.clone()),
    );
    let archive: Arc<dyn archive_repo::LogArchive> = Arc::new(archive_repo::HttpLogArchive::new(
        client.clone(),
        app_config.stores.archive_url.clone(),
    ));
    let scaler: Arc<dyn scaler_repo::FleetScaler> = Arc::new(scaler_repo::HttpFleetScaler::new(
        client,
        app_config.stores.scaler_url.clone(),
    ));

    let retry = retry::RetryPolicy::from_config(&app_config.retry);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = bid_worker::spawn(
        bid_worker::BidWorkerDeps {
            market,
            launch,
            params,
            shutdown_rx,
        },
        bid_worker::BidWorkerConfig::from_app_config(&app_config),
    );

    let coordinator = Arc::new(lifecycle::Coordinator::new(
        scaler,
        archive,
        lifecycle::HookPolicy::from_config(&app_config.lifecycle),
        retry,
    ));

    let app = routes::app(coordinator);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In Docker: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                let _ = worker_handle.await;
            }
        }
    }

    Ok(())
}
