//! polimport - imports a converted security-policy bundle into a policy
//! management server.
//!
//! Reads the interchange JSON produced by the conversion front-end, logs
//! into the management server, and drives the import pipeline. Per-object
//! rejections are reported and skipped; only transport or authentication
//! failures exit non-zero.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use polimport_api::MgmtClient;
use polimport_engine::{Migration, MigrationOptions};
use polimport_model::PolicyBundle;

/// Import a converted policy bundle into a management server.
#[derive(Parser, Debug)]
#[command(name = "polimport", version, about, long_about = None)]
struct Args {
    /// Management server IP address or name.
    #[arg(short, long, default_value = "127.0.0.1")]
    management: String,

    /// Server port.
    #[arg(long, default_value_t = 443)]
    port: u16,

    /// User name.
    #[arg(short, long)]
    user: String,

    /// User password.
    #[arg(short, long)]
    password: String,

    /// The name/uid of the domain to log into in a multi-domain setup.
    #[arg(short, long)]
    domain: Option<String>,

    /// JSON file with the converted objects.
    #[arg(short, long, default_value = "cp_objects.json")]
    file: PathBuf,

    /// Maximum number of objects/rules to add before publishing.
    #[arg(short, long, default_value_t = 100)]
    threshold: u32,

    /// Prefer 'Global' server objects over 'Local' ones when merging.
    #[arg(long)]
    replace_from_global_first: bool,

    /// Rename candidates to try before giving an object up.
    #[arg(long, default_value_t = 100)]
    max_rename_attempts: u32,

    /// Accept the server's certificate without verification.
    #[arg(long)]
    tls_insecure: bool,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let bundle = PolicyBundle::from_json_str(&content)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    tracing::info!(
        file = %args.file.display(),
        objects = bundle.len(),
        "bundle parsed"
    );

    let base_url = format!("https://{}:{}", args.management, args.port);
    let mut client = MgmtClient::new(
        &base_url,
        Duration::from_secs(args.timeout),
        !args.tls_insecure,
    )?;
    tracing::info!(server = %base_url, user = %args.user, "logging in");
    client
        .login(&args.user, &args.password, args.domain.as_deref())
        .await
        .context("login failed")?;

    let options = MigrationOptions {
        threshold: args.threshold,
        global_first: args.replace_from_global_first,
        max_rename_attempts: args.max_rename_attempts,
    };
    let result = Migration::new(options).run(&client, &bundle).await;
    client.logout().await;

    let report = result.context("import run failed")?;
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}
