mod artifact;
mod call;
mod command_line;
mod deploy;
mod error;
mod execute;
mod inspect;
mod report;
mod setting;
mod utils;

use anyhow::Result;
use clap::Parser;
use command_line::CommandLine;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    command_line::clear_empty_env();
    env_logger::init();
    let cmd = CommandLine::parse();
    cmd.execute().await
}
