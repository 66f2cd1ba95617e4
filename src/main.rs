use clap::Parser;
use colored::Colorize;
use tracing::debug;

use linkvault::cli::{Cli, run_command};
use linkvault::errors::LinkvaultError;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = linkvault::config::init_config(cli.config.as_deref()) {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
    let config = linkvault::config::get_config();

    let _log_guard = match linkvault::system::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };
    debug!("Configuration loaded");

    if let Err(e) = run_command(cli.command, &config).await {
        match e.downcast_ref::<LinkvaultError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
        }
        std::process::exit(1);
    }
}
