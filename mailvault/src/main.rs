use clap::Parser;
use std::process::ExitCode;

use mailvault::cli::Cli;
use mailvault::services::logger;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init();
    mailvault::run(cli.command).await
}
