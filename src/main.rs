mod cli;
use cli::{CliMode, USAGE, parse_cli_mode, run};
use tracing_subscriber::EnvFilter;

use calpop::storage::config::Config;

fn main() {
    setup_logging();

    let args = match parse_cli_mode() {
        Ok(CliMode::Run(args)) => args,
        Ok(CliMode::Help) => {
            println!("{}", USAGE);
            return;
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging() {
    let log_dir = Config::config_dir();

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "calpop.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("calpop started");
}
