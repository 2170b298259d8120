use crate::auth::CredentialStore;
use crate::cli::{Commands, SourceArgs};
use crate::config::Config;
use crate::registry::ClusterRegistry;
use crate::{server, Result};
use tracing::info;

pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Serve(args) => server::serve(Config::try_from(args)?).await,
        Commands::Validate { sources } => handle_validate(sources),
    }
}

fn handle_validate(sources: SourceArgs) -> Result<()> {
    info!("Validating configuration documents");

    let credentials = CredentialStore::load(&sources.users_file)?;
    let registry = ClusterRegistry::load(&sources.clusters_file)?;

    println!(
        "Users:    {} ({})",
        credentials.len(),
        sources.users_file.display()
    );
    println!(
        "Clusters: {} ({})",
        registry.len(),
        sources.clusters_file.display()
    );
    for name in registry.names() {
        if let Ok(url) = registry.resolve(&name) {
            println!("  {:<20} {}", name, url);
        }
    }

    Ok(())
}
