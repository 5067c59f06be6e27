use clap::Parser;
use tracing_subscriber::EnvFilter;
use vms_client::cli::{Cli, Reported};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so VMS_API_BASE_URL and friends can live next to the project
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = vms_client::cli::run(cli).await {
        // Already shown as a toast
        if e.downcast_ref::<Reported>().is_none() {
            match std::env::var("CLI_VERBOSE").as_deref() {
                Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
                _ => eprintln!("Error: {e}"),
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
