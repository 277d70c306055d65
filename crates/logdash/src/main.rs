mod output;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use logdash_core::config::Config;
use logdash_warehouse::BigQueryClient;
use logdash_web::{AppState, GatewayClient};

use crate::output::print_logs_human;
use crate::telemetry::{LogFormat, init_cli_tracing, init_run_tracing, shutdown_tracing};

#[derive(Parser, Debug)]
#[command(name = "logdash")]
#[command(about = "Dashboard for recent logs stored in BigQuery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Serve the log gateway and dashboard page")]
    Run {
        #[arg(long)]
        listen_addr: Option<String>,
        #[arg(long, help = "Gateway URL the page fetches from")]
        gateway_url: Option<String>,
        #[arg(long)]
        credentials_path: Option<PathBuf>,
    },
    #[command(about = "Fetch recent logs from a running gateway once")]
    Logs {
        #[arg(long)]
        json: bool,
        #[arg(long, help = "Gateway URL (defaults to the configured one)")]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            listen_addr,
            gateway_url,
            credentials_path,
        } => {
            init_run_tracing(LogFormat::from_env());
            let result = run_server(listen_addr, gateway_url, credentials_path).await;
            shutdown_tracing();
            result
        }
        Commands::Logs { json, url } => {
            init_cli_tracing();
            let url = match url {
                Some(url) => url,
                None => Config::load().context("load config")?.gateway_url(),
            };
            let resp = GatewayClient::new(url)
                .fetch_logs()
                .await
                .context("fetch logs from gateway")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resp)?);
            } else {
                print_logs_human(&resp);
            }
            Ok(())
        }
    }
}

async fn run_server(
    listen_addr: Option<String>,
    gateway_url: Option<String>,
    credentials_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut cfg = Config::load().context("load config")?;
    if let Some(v) = listen_addr {
        cfg.listen_addr = v;
    }
    if let Some(v) = gateway_url {
        cfg.gateway_url = Some(v);
    }
    if let Some(v) = credentials_path {
        cfg.credentials_path = v;
    }

    let addr: SocketAddr = cfg
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", cfg.listen_addr))?;
    let source = BigQueryClient::from_config(&cfg).context("build warehouse client")?;

    eprintln!("logdash run");
    eprintln!("  dashboard: http://{addr}/");
    eprintln!("  gateway:   {}", cfg.gateway_url());
    eprintln!("  table:     {}", cfg.qualified_table());
    eprintln!("  warehouse: {}", cfg.bigquery_endpoint);

    tracing::info!(
        project = %cfg.project_id,
        table = %cfg.qualified_table(),
        "starting logdash"
    );

    let state = AppState::new(
        Arc::new(source),
        cfg.gateway_url(),
        cfg.display_project_id().to_string(),
    );
    logdash_web::run_server(state, addr).await?;
    tracing::info!("shut down");
    Ok(())
}
