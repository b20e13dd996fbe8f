//! Configuration surface for the Satchel daemon.
//!
//! The daemon is configured entirely through command-line flags: a home
//! directory for engine state, the endpoints the engine listens on, and the
//! location of the container runtime backend it supervises. This crate owns
//! the flag declarations plus the small value types they parse into
//! ([`ListenEndpoint`], [`LogFormat`]); validation that depends on the
//! filesystem (home-directory checks, stale socket cleanup) belongs to the
//! daemon's bootstrap sequence, not here.

pub mod defaults;
pub mod logging;
pub mod socket;

pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{EndpointParseError, ListenEndpoint};

use std::path::PathBuf;

use clap::Parser;
use clap::builder::TypedValueParser as _;

/// Command-line configuration for the Satchel daemon.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "satcheld", version, about = "Satchel container engine daemon")]
pub struct Config {
    /// Directory holding daemon state; created when absent.
    ///
    /// Parsed via [`clap::builder::OsStringValueParser`] so an empty value
    /// reaches bootstrap validation instead of being rejected by clap.
    #[arg(
        long,
        value_name = "DIR",
        default_value = defaults::HOME_DIR,
        value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from)
    )]
    pub home_dir: PathBuf,

    /// Endpoint the engine listens on, as a unix:// or tcp:// URL; repeatable.
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "ENDPOINT",
        default_value = defaults::LISTEN_ENDPOINT
    )]
    pub listen: Vec<ListenEndpoint>,

    /// Switch daemon and runtime backend logging to debug level.
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Socket path the runtime backend serves on.
    #[arg(short = 'c', long, value_name = "PATH", default_value = defaults::RUNTIME_ADDR)]
    pub runtime_addr: PathBuf,

    /// Runtime backend executable to launch.
    #[arg(long, value_name = "PATH", default_value = defaults::RUNTIME_PATH)]
    pub runtime_path: PathBuf,

    /// Configuration file handed to the runtime backend.
    #[arg(long, value_name = "FILE", default_value = defaults::RUNTIME_CONFIG)]
    pub runtime_config: PathBuf,

    /// Log output format.
    #[arg(long, value_name = "FORMAT", default_value_t)]
    pub log_format: LogFormat,
}

impl Config {
    /// Log level implied by the debug flag, shared by daemon telemetry and
    /// the runtime backend's own logging.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_dir: PathBuf::from(defaults::HOME_DIR),
            listen: vec![defaults::listen_endpoint()],
            debug: false,
            runtime_addr: PathBuf::from(defaults::RUNTIME_ADDR),
            runtime_path: PathBuf::from(defaults::RUNTIME_PATH),
            runtime_config: PathBuf::from(defaults::RUNTIME_CONFIG),
            log_format: LogFormat::default(),
        }
    }
}
