//! kubegatectl - command-line client for the kubegate aggregator
//!
//! Commands:
//! - `kubegatectl login -u USER` - Obtain a bearer token
//! - `kubegatectl clusters` - List registered clusters
//! - `kubegatectl namespaces <cluster>` - List namespaces in a cluster
//! - `kubegatectl deployments <cluster> <namespace>` - List deployments
//! - `kubegatectl restart <cluster> <namespace> <deployment>` - Rolling restart

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kubegate_cli::{truncate, ClientError, GatewayClient};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "kubegatectl")]
#[command(about = "Operate deployments across clusters through kubegate", long_about = None)]
#[command(version)]
struct Cli {
    /// Aggregator base URL
    #[arg(
        short,
        long,
        env = "KUBEGATE_SERVER",
        default_value = "http://localhost:8000",
        global = true
    )]
    server: String,

    /// Bearer token from `kubegatectl login`
    #[arg(long, env = "KUBEGATE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// User name recorded on forwarded audit events
    #[arg(long, env = "KUBEGATE_USER", default_value = "anonymous", global = true)]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a bearer token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "KUBEGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List registered clusters
    Clusters,
    /// List namespaces in a cluster
    Namespaces { cluster: String },
    /// List deployments in a namespace
    Deployments { cluster: String, namespace: String },
    /// Trigger a rolling restart of a deployment
    Restart {
        cluster: String,
        namespace: String,
        deployment: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut client = GatewayClient::new(&cli.server, cli.token, cli.user)?;

    match cli.command {
        Commands::Login { username, password } => login(&mut client, &username, &password).await,
        Commands::Clusters => list_clusters(&client).await,
        Commands::Namespaces { cluster } => list_namespaces(&client, &cluster).await,
        Commands::Deployments { cluster, namespace } => {
            list_deployments(&client, &cluster, &namespace).await
        }
        Commands::Restart {
            cluster,
            namespace,
            deployment,
        } => restart(&client, &cluster, &namespace, &deployment).await,
    }
}

async fn login(client: &mut GatewayClient, username: &str, password: &str) -> Result<()> {
    let token = client
        .login(username, password)
        .await
        .context("Login failed")?;

    client.log_event("info", "login.success", Map::new()).await;

    println!("{}", token.access_token);
    eprintln!();
    eprintln!("export KUBEGATE_TOKEN={}", token.access_token);
    eprintln!("export KUBEGATE_USER={}", username);

    Ok(())
}

async fn list_clusters(client: &GatewayClient) -> Result<()> {
    let result = client.clusters().await;
    report(client, "clusters.load", &result, Map::new()).await;
    let clusters = result.context("Failed to list clusters")?;

    print_names("CLUSTER", &clusters, "No clusters registered.");
    Ok(())
}

async fn list_namespaces(client: &GatewayClient, cluster: &str) -> Result<()> {
    let result = client.namespaces(cluster).await;
    report(client, "namespaces.load", &result, details(&[("cluster", cluster)])).await;
    let namespaces = result.with_context(|| format!("Failed to list namespaces in {}", cluster))?;

    print_names("NAMESPACE", &namespaces, "No namespaces found.");
    Ok(())
}

async fn list_deployments(client: &GatewayClient, cluster: &str, namespace: &str) -> Result<()> {
    let result = client.deployments(cluster, namespace).await;
    report(
        client,
        "deployments.load",
        &result,
        details(&[("cluster", cluster), ("namespace", namespace)]),
    )
    .await;
    let deployments = result
        .with_context(|| format!("Failed to list deployments in {}/{}", cluster, namespace))?;

    print_names("DEPLOYMENT", &deployments, "No deployments found.");
    Ok(())
}

async fn restart(
    client: &GatewayClient,
    cluster: &str,
    namespace: &str,
    deployment: &str,
) -> Result<()> {
    let fields = details(&[
        ("cluster", cluster),
        ("namespace", namespace),
        ("deployment", deployment),
    ]);

    client
        .log_event("info", "restart.request", fields.clone())
        .await;

    let result = client.restart(cluster, namespace, deployment).await;
    match &result {
        Ok(_) => client.log_event("info", "restart.success", fields).await,
        Err(e) => {
            let mut fields = fields;
            fields.insert("error".to_string(), json!(e.to_string()));
            client.log_event("error", "restart.failed", fields).await;
        }
    }

    let response = result.with_context(|| {
        format!("Failed to restart {}/{} on {}", namespace, deployment, cluster)
    })?;

    println!("{:<10} {}", "STATUS", "MESSAGE");
    println!("{}", "-".repeat(60));
    println!("{:<10} {}", response.status, response.message);

    Ok(())
}

/// Forward `event` on success, `<event>.failed` with the error otherwise
async fn report<T>(
    client: &GatewayClient,
    event: &str,
    result: &Result<T, ClientError>,
    mut fields: Map<String, Value>,
) {
    match result {
        Ok(_) => client.log_event("info", event, fields).await,
        Err(e) => {
            fields.insert("error".to_string(), json!(e.to_string()));
            client
                .log_event("error", &format!("{}.failed", event), fields)
                .await;
        }
    }
}

fn details(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect()
}

fn print_names(header: &str, names: &[String], empty: &str) {
    if names.is_empty() {
        println!("{}", empty);
        return;
    }

    println!("{}", header);
    println!("{}", "-".repeat(40));
    for name in names {
        println!("{}", truncate(name, 40));
    }
}
