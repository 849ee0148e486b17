use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use youth_policy_match::config::Settings;
use youth_policy_match::services::catalog::{builtin_policies, parse_policy_file};
use youth_policy_match::services::PostgresStore;

#[derive(Parser, Debug)]
#[command(
    name = "seed-policies",
    about = "Load policy records into the catalog store",
    version
)]
struct Cli {
    /// TOML file of `[[policies]]` tables (defaults to the built-in catalog)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Database URL (overrides configuration and DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
    /// Parse and report without writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let policies = match &cli.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            parse_policy_file(&text)?
        }
        None => builtin_policies(),
    };
    info!("Loaded {} policy records", policies.len());

    if cli.dry_run {
        for policy in &policies {
            info!("{} [{}] {}", policy.policy_id, policy.category, policy.title);
        }
        return Ok(());
    }

    let database = Settings::load()?.database;
    let url = match cli.database_url {
        Some(url) => url,
        None => database
            .url
            .clone()
            .ok_or("no database configured (set DATABASE_URL or --database-url)")?,
    };

    let store = PostgresStore::new(
        &url,
        2,
        1,
        database.acquire_timeout(),
        database.idle_timeout(),
    )
    .await?;

    let mut written = 0usize;
    for policy in &policies {
        if !policy.has_identity() {
            warn!("Skipping policy without identifier (title: {:?})", policy.title);
            continue;
        }
        match store.upsert_policy(policy).await {
            Ok(()) => written += 1,
            Err(e) => error!("Failed to upsert {}: {}", policy.policy_id, e),
        }
    }

    info!("Seeded {} of {} policies", written, policies.len());
    Ok(())
}
