//! Drydock Publisher - Entry Point
//!
//! A post-build tool that packages a build's output, uploads it to the Depot
//! object store and drives a Drydock deployment to completion. Invoked by the
//! build system after a successful build; exits 0 on success, 1 on failure.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::Context;
use drydock_publisher::config::PublisherConfig;
use drydock_publisher::creds;
use drydock_publisher::logs::{init_logging, LogOptions};
use drydock_publisher::pipeline;
use drydock_publisher::pipeline::run_publish;
use drydock_publisher::remote::region::TOKEN_BROKER_URL;
use drydock_publisher::remote::tokens::HttpTokenBroker;
use drydock_publisher::remote::ClientBundle;
use drydock_publisher::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version_info()).unwrap());
        return;
    }

    // Retrieve the config file
    let config_path = cli_args
        .get("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("drydock-publisher.json"));
    let config = match PublisherConfig::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Unable to read config file {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: config.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Connection check mode
    if cli_args.contains_key("check") {
        match run_check(&config).await {
            Ok(()) => return,
            Err(e) => {
                error!("Connection check failed: {e}");
                std::process::exit(1);
            }
        }
    }

    // Run the publish pipeline starting here
    let workspace_root = cli_args
        .get("workspace")
        .map(PathBuf::from)
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    info!(
        "Publishing workspace {} to application '{}'",
        workspace_root.display(),
        config.application_name
    );

    let cancel = Box::pin(await_shutdown_signal());
    let success = run_publish(&config, &workspace_root, cancel).await;
    std::process::exit(if success { 0 } else { 1 });
}

/// Build the clients the way a publish run would and probe both services
async fn run_check(config: &PublisherConfig) -> anyhow::Result<()> {
    let strategy = pipeline::effective_strategy(&config.auth);
    let broker = HttpTokenBroker::new(TOKEN_BROKER_URL)?;
    let credential = creds::resolve(&strategy, &broker, &config.polling)
        .await
        .context("credential resolution failed")?;
    let bundle = ClientBundle::build(&config.region, credential, &config.proxy)?;

    pipeline::check::run_check(
        bundle.depot.as_ref(),
        bundle.deploy.as_ref(),
        &config.bucket,
        &config.application_name,
    )
    .await
    .context("connection check failed")?;
    Ok(())
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
