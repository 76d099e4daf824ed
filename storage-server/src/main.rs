//! Storage provider daemon

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use storage_server::activity::ActivityTracker;
use storage_server::args::Args;
use storage_server::build_provider;
use storage_server::credentials::{CredentialsSource, FixedCredentials};
use storage_server::server::Server;
use storage_server::store::StoreOptions;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = args.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = &args.credentials {
        load_credentials(path, args.account_id, &args.service_id).await;
    }

    let activity = ActivityTracker::new();
    let options = StoreOptions {
        allow_duplicate_names: args.allow_duplicate_names,
        page_size: args.page_size,
    };
    let provider = build_provider(&args.roots, options, args.max_upload_size, activity.clone());
    let sessions = provider.sessions().clone();

    let control_addr = SocketAddr::new(args.bind, args.port);
    let transfer_addr = SocketAddr::new(args.bind, args.transfer_port);
    let server = match Server::bind(control_addr, transfer_addr, provider, activity.clone()).await
    {
        Ok(server) => server,
        Err(e) => {
            error!("failed to bind {} / {}: {}", control_addr, transfer_addr, e);
            return ExitCode::FAILURE;
        }
    };

    let idle_timeout = Duration::from_secs(args.idle_timeout);
    let idle = async {
        if idle_timeout.is_zero() {
            std::future::pending::<()>().await;
        }
        activity.idle_for(idle_timeout).await;
    };

    let exit = tokio::select! {
        _ = setup_shutdown_signal() => {
            info!("shutdown signal received");
            ExitCode::SUCCESS
        }
        _ = idle => {
            info!("idle for {}s, exiting", args.idle_timeout);
            ExitCode::SUCCESS
        }
        result = server.run() => {
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("listener failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    };

    sessions.shutdown();
    exit
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Look up the account's credentials once so misconfiguration shows early
async fn load_credentials(path: &Path, account_id: u32, service_id: &str) {
    let source = match FixedCredentials::from_file(path, account_id, service_id) {
        Ok(source) => source,
        Err(e) => {
            warn!("credentials unavailable: {}", e);
            return;
        }
    };
    match source.get_credentials(account_id, service_id).await {
        Ok(credentials) => info!(
            "loaded {} credentials for account {} ({})",
            credentials.kind(),
            account_id,
            service_id
        ),
        Err(e) => warn!("credentials unavailable: {}", e),
    }
}

/// Resolve on SIGTERM/SIGINT (Ctrl+C elsewhere)
async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                error!("failed to install signal handlers: {}", e);
                return std::future::pending().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
