use clap::Parser;
use fitcoach_lib::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  // Logs go to stderr so they stay out of the chat transcript.
  // RUST_LOG overrides the default, e.g. RUST_LOG=fitcoach_lib=debug
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fitcoach_lib=warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  cli::run(Cli::parse()).await
}
