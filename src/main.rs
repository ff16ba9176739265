// ABOUTME: Entry point for the shopstack CLI application.
// ABOUTME: Parses arguments and dispatches to the API server or one-shot commands.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use shopstack::api::create_router;
use shopstack::config::{self, Config};
use shopstack::error::{Error, Result};
use shopstack::host::resolve_public_host;
use shopstack::output::{Output, OutputMode};
use shopstack::probe::ReqwestProbe;
use shopstack::progress::ProgressTracker;
use shopstack::provision::Provisioner;
use shopstack::runtime::{BollardRuntime, connect_local};
use shopstack::types::{AdminCredentials, TenantId};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const PROGRESS_POLL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let default_filter = if cli.verbose {
        "shopstack=debug,tower_http=debug"
    } else {
        "shopstack=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;
    match cli.command {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            println!("Wrote {}", cwd.join(config::CONFIG_FILENAME).display());
            Ok(())
        }
        Commands::Serve { listen } => {
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            serve(config, listen).await
        }
        Commands::Provision {
            email,
            password,
            json,
            quiet,
        } => {
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            let output = Output::new(OutputMode::from_flags(json, quiet));
            provision(config, AdminCredentials::new(email, password), output).await
        }
        Commands::Teardown { tenant } => {
            let id = TenantId::parse(&tenant)?;
            let config = Config::resolve(cli.config.as_deref(), &cwd)?;
            teardown(config, id).await
        }
    }
}

async fn provisioner(config: Config) -> Result<Provisioner<BollardRuntime, ReqwestProbe>> {
    let runtime = connect_local(&config.runtime).await?;
    tracing::info!(runtime = %runtime.runtime_type(), "connected to container runtime");

    let public_host = resolve_public_host(&config).await;
    let probe = ReqwestProbe::new()?;
    Ok(Provisioner::new(
        Arc::new(runtime),
        Arc::new(probe),
        config,
        public_host,
    ))
}

async fn serve(config: Config, listen: Option<SocketAddr>) -> Result<()> {
    let addr = listen.unwrap_or(config.listen);
    let sweep_interval = config.progress.sweep_interval;
    let provisioner = Arc::new(provisioner(config).await?);

    let sweeper = provisioner.progress().spawn_sweeper(sweep_interval);
    let app = create_router(Arc::clone(&provisioner));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        public_host = provisioner.public_host(),
        "provisioning API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("provisioning API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

async fn provision(config: Config, credentials: AdminCredentials, mut output: Output) -> Result<()> {
    let provisioner = provisioner(config).await?;
    output.start_timer();

    let prepared = provisioner.prepare(credentials).await?;
    output.progress(&format!("Provisioning {} on port {}", prepared.id, prepared.port));

    let watcher = (output.mode() == OutputMode::Normal)
        .then(|| watch_progress(provisioner.progress().clone(), prepared.id));

    let result = provisioner.run(prepared).await;
    if let Some(watcher) = watcher {
        watcher.abort();
    }

    match result {
        Ok(report) => {
            output.report(&report);
            Ok(())
        }
        Err(e) => {
            // Plain modes get the message from main's error path.
            if output.mode() == OutputMode::Json {
                output.error(&e.to_string());
            }
            Err(Error::Provision(e))
        }
    }
}

/// Echo each new progress message while a run is active.
fn watch_progress(progress: ProgressTracker, id: TenantId) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        let mut ticker = tokio::time::interval(PROGRESS_POLL);
        loop {
            ticker.tick().await;
            let Some(record) = progress.get(id) else {
                continue;
            };
            if record.message != last {
                println!("  [{:>3}%] {}", record.percent, record.message);
                last = record.message.clone();
            }
            if record.status.is_terminal() {
                return;
            }
        }
    })
}

async fn teardown(config: Config, id: TenantId) -> Result<()> {
    let output = Output::new(OutputMode::Normal);
    let provisioner = provisioner(config).await?;
    let warnings = provisioner.teardown(id).await?;
    for warning in &warnings {
        output.warning(warning);
    }
    output.success(&format!("Removed containers for {id}"));
    Ok(())
}
