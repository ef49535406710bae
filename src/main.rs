use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tmc_core::cli::Cli;
use tmc_core::config::Config;
use tmc_core::manager::Session;
use tmc_core::utils::{AppError, report_error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    tracing::debug!("tmc v{}", tmc_core::VERSION);

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<AppError>() {
            Some(app_err) => report_error(app_err),
            None => eprintln!("❌ {:#}", err),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // Ensure configuration exists and load it
    let (config, config_path) = match &cli.config {
        Some(path) => (Config::load_custom(path)?, path.clone()),
        None => {
            Config::ensure_config_exists()?;
            (Config::load()?, Config::config_file_path())
        }
    };

    if !config.general.color {
        colored::control::set_override(false);
    }

    let mut session = Session::open(config, config_path)?;
    cli.command.execute(&mut session).await
}
