use clap::Parser;
use forzudo_lib::cli::Cli;
use forzudo_lib::{commands, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forzudo=info,forzudo_lib=info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let result = match Config::from_env() {
    Ok(config) => commands::run(cli, config).await,
    Err(e) => Err(e.into()),
  };

  if let Err(e) = result {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
