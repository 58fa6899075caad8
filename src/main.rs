mod app;
mod config;
mod data;
mod error;
mod handlers;
mod state;

use clap::Parser;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!("Starting nurse finder with {config:?}");

    app::serve(config).await
}
