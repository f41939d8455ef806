pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;
pub mod uploads;

use cli::Args;
use config::AppConfig;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_args(&args)?;
    config.ensure_dirs()?;
    config.log_summary();

    let server = Server::new(config);
    server.run().await?;

    Ok(())
}
