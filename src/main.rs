use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use config::CorralConfig;
use control::ControlPlane;
use runtime::docker::DockerRuntime;
use scheduler::SyncScheduler;
use storage::sqlite::SqliteStore;

mod api;
mod cli;
mod config;
mod container;
mod control;
mod error;
mod runtime;
mod scheduler;
mod signals;
mod storage;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before the config template is rendered
    let _ = dotenv::dotenv();

    // Initialize the logger
    env_logger::init();

    let args = cli::get_cli_args();

    let config = match CorralConfig::try_init(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Unable to load config {:?}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };

    if args.check {
        log::info!("Config {:?} is valid", args.config);
        return ExitCode::SUCCESS;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: CorralConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let shutdown = signals::handle_shutdown()?;

    let docker = DockerRuntime::connect(&config.docker)?;
    if let Err(e) = docker.ping().await {
        // Requests fail with runtime_unavailable until the daemon is back.
        log::warn!("Docker daemon is not reachable yet: {}", e);
    }

    let store = SqliteStore::open(&config.storage).await?;
    store.initialize().await?;

    let control = Arc::new(ControlPlane::new(
        Arc::new(docker),
        Arc::new(store),
        config.serialize_per_name,
    ));

    let scheduler = config.sync.interval.map(|interval| {
        let scheduler = SyncScheduler::new(
            Arc::clone(&control),
            Duration::from_secs(interval.get()),
            shutdown.clone(),
        );
        tokio::spawn(scheduler.run())
    });

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    let state = Arc::new(api::AppState::new(control, config.api_key()));

    signals::notify_ready();
    api::serve(listener, state, signals::wait_for_shutdown(shutdown)).await?;

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.await {
            log::error!("Background sync task failed: {}", e);
        }
    }

    log::info!("Shut down cleanly");
    Ok(())
}
