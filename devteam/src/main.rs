use anyhow::Result;
use clap::Parser;

use devteam::cli::{self, Cli};
use devteam::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // stdout carries tool server traffic and console output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devteam=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_to(&mut config);

    cli::run(args, config).await
}
