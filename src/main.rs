mod api;
mod app;
mod commands;
mod config;
mod event;
mod query;
mod session;
mod ui;
mod util;

use app::App;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Terminal dashboard for a portfolio backend", version)]
struct Args {
  /// Path to a config file (defaults to ./folio.yaml, then XDG config dir)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Override the backend base URL from the config file
  #[arg(long)]
  api_url: Option<String>,
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .ok_or_else(|| eyre!("could not determine data directory"))?
    .join("folio");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::never(log_dir, "folio.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "folio=info".into()))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let args = Args::parse();

  // Keep the guard alive so buffered log lines flush on exit
  let _guard = init_logging()?;

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(api_url) = args.api_url {
    config.api.base_url = api_url;
  }
  let mut app = App::new(config)?;
  app.run().await
}
