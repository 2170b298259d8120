pub mod commands;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::router::Timeouts;
use crate::GatewayError;

#[derive(Parser)]
#[command(name = "kubegate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Authenticated gateway for workloads across Kubernetes clusters", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the gateway")]
    Serve(ServeArgs),
    #[command(about = "Load the credentials and cluster documents and report what was found")]
    Validate {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

#[derive(Args, Clone)]
pub struct SourceArgs {
    #[arg(
        long,
        env = "USERS_FILE",
        default_value = "/app/users.json",
        help = "JSON object of username -> password"
    )]
    pub users_file: PathBuf,

    #[arg(
        long,
        env = "CLUSTERS_FILE",
        default_value = "/app/clusters.json",
        help = "JSON object of cluster name -> agent base URL"
    )]
    pub clusters_file: PathBuf,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    #[arg(
        short,
        long,
        env = "AGG_LISTEN",
        default_value = "0.0.0.0:8000",
        help = "Address to listen on"
    )]
    pub listen: SocketAddr,

    #[arg(
        long,
        env = "AGG_SECRET",
        hide_env_values = true,
        help = "Secret used to sign session tokens"
    )]
    pub secret: String,

    #[arg(long, default_value_t = 720, help = "Session token lifetime in minutes")]
    pub token_ttl_minutes: u64,

    #[arg(long, default_value_t = 5, help = "Timeout for list calls to agents, in seconds")]
    pub list_timeout_secs: u64,

    #[arg(long, default_value_t = 10, help = "Timeout for restart calls to agents, in seconds")]
    pub restart_timeout_secs: u64,

    #[arg(
        long = "cors-origin",
        default_value = "http://localhost:8100",
        help = "Origin allowed to call the API from a browser (repeatable)"
    )]
    pub cors_origins: Vec<String>,

    #[command(flatten)]
    pub sources: SourceArgs,
}

impl TryFrom<ServeArgs> for Config {
    type Error = GatewayError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let ttl_secs = args.token_ttl_minutes.checked_mul(60).ok_or_else(|| {
            GatewayError::ConfigError(format!(
                "token TTL of {} minutes is out of range",
                args.token_ttl_minutes
            ))
        })?;

        Ok(Config {
            listen: args.listen,
            secret: args.secret,
            users_file: args.sources.users_file,
            clusters_file: args.sources.clusters_file,
            token_ttl: Duration::from_secs(ttl_secs),
            timeouts: Timeouts {
                list: Duration::from_secs(args.list_timeout_secs),
                restart: Duration::from_secs(args.restart_timeout_secs),
            },
            cors_origins: args.cors_origins,
        })
    }
}
