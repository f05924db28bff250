use std::sync::Arc;

use bashim::BashClient;
use constants::STARTUP_TIME;
use handlers::ResultIds;

#[derive(Clone)]
pub struct Data {
    bash: BashClient,
    result_ids: Arc<ResultIds>,
    bot_username: String,
}

type Error = Box<dyn std::error::Error + Send + Sync>;

mod bashim;
mod commands;
mod config;
mod constants;
mod format;
mod handlers;
mod init;
mod models;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = &*STARTUP_TIME;

    init::run().await
}
