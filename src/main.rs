mod app;
mod calendar;
mod config;
mod email_sender;
mod options;

use crate::config::resolve_config_path;
use crate::email_sender::Mailer;
use crate::options::Opt;
use clap::Parser;
use lettre::SmtpTransport;
use log::debug;
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    // --- Load .env file (RUST_LOG and friends) at the very beginning ---
    let dotenv = dotenvy::dotenv();

    // Missing -m/-t prints usage and exits non-zero here
    let opt = Opt::parse();

    env_logger::Builder::new()
        .filter_level(opt.log_level())
        .parse_default_env()
        .init();
    match dotenv {
        Ok(path) => debug!("Loaded .env file from: {:?}", path),
        Err(_) => debug!("No .env file loaded"),
    }

    let config_path = resolve_config_path(&opt.config);
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let outcome = app::execute(&opt, &config_path, &program, Mailer::<SmtpTransport>::connect)?;
    Ok(outcome.into())
}
