use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use satchel_config::Config;
use satcheld::{run_daemon, telemetry};

fn main() -> ExitCode {
    let config = Config::parse();
    if let Err(error) = telemetry::initialise(&config) {
        eprintln!("satcheld: {error}");
        return ExitCode::FAILURE;
    }
    match run_daemon(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = %error, "daemon exited with failure");
            ExitCode::FAILURE
        }
    }
}
