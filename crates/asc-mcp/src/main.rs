// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::error;

use asc_mcp::config::Config;
use asc_mcp::release::{ReleaseRequest, DEFAULT_PLATFORM};
use asc_mcp::store::AppStore;

#[derive(Debug, Parser)]
#[command(name = "asc-mcp", version, about = "App Store Connect tool server")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve JSON-RPC tool calls on stdin/stdout (default).
    Serve,
    /// List all apps.
    Apps,
    /// Show one app.
    AppInfo { bundle_id: String },
    /// List builds for an app.
    Builds { bundle_id: String },
    /// Move a version one step toward release.
    Release {
        bundle_id: String,
        version: String,
        build_number: String,
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
    },
    /// Create an App Store version record.
    CreateVersion {
        bundle_id: String,
        version: String,
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
    },
    /// Remove a beta tester from a group.
    RemoveTester { email: String, group_id: String, bundle_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }
    if let Err(e) = init_tracing(&cli.config) {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }

    let result = match cli.command {
        None | Some(Command::Serve) => asc_mcp::run(cli.config).await,
        Some(command) => one_shot(&cli.config, command).await,
    };
    if let Err(e) = result {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

/// Run a single operation and print its result.
async fn one_shot(config: &Config, command: Command) -> anyhow::Result<()> {
    let store = AppStore::from_config(config)?;
    let result: Value = match command {
        Command::Serve => anyhow::bail!("serve is not a one-shot command"),
        Command::Apps => store.list_apps().await?,
        Command::AppInfo { bundle_id } => store.get_app_info(&bundle_id).await?,
        Command::Builds { bundle_id } => store.list_builds(&bundle_id).await?,
        Command::Release { bundle_id, version, build_number, platform } => {
            store
                .release_version(&ReleaseRequest { bundle_id, version, build_number, platform })
                .await?
        }
        Command::CreateVersion { bundle_id, version, platform } => {
            store.create_version(&bundle_id, &version, &platform).await?
        }
        Command::RemoveTester { email, group_id, bundle_id } => {
            store.remove_tester_from_group(&email, &group_id, &bundle_id).await?
        }
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Logs go to stderr (stdout carries the protocol), plus the log file if set.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt::{self, writer::BoxMakeWriter, writer::MakeWriterExt};
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.log_file {
        Some(ref path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("open log file {}: {e}", path.display()))?;
            BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file)))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let ansi = config.log_file.is_none();

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(writer).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(writer).with_ansi(ansi).init();
        }
    }
    Ok(())
}
