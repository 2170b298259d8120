//! kubegate-agent - workload operations for one cluster
//!
//! The agent runs inside each managed cluster and:
//! - Connects to the Kubernetes API (in-cluster config or kubeconfig)
//! - Serves namespace/deployment listings and restarts over HTTP

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kubegate_agent::server::start_server;
use kubegate_agent::KubeWorkloads;
use log::info;

#[derive(Parser)]
#[command(name = "kubegate-agent")]
#[command(about = "Per-cluster workload agent for kubegate", long_about = None)]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "AGENT_LISTEN", default_value = "0.0.0.0:8000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("kubegate-agent starting...");

    let workloads = KubeWorkloads::try_default()
        .await
        .context("Failed to connect to Kubernetes")?;

    start_server(Arc::new(workloads), args.listen).await?;

    info!("kubegate-agent stopped");
    Ok(())
}
