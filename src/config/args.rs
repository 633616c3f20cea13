//! Command-line and environment overrides.
//!
//! Each flag may also come from the environment variable named beside it;
//! an explicit flag wins over the variable, and both win over the file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{LogFormat, StubConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "rest-stub")]
#[command(about = "Header-driven HTTP stub server", long_about = None)]
pub struct StubArgs {
    /// TOML configuration file
    #[arg(short, long, env = "REST_STUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on (keeps the host of the bind address)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Full bind address, e.g. 127.0.0.1:48200
    #[arg(short, long, env = "BIND_ADDRESS")]
    pub bind: Option<String>,

    /// Directory holding stub content files
    #[arg(long, env = "CONTENT")]
    pub content: Option<PathBuf>,

    /// Largest request body accepted for echo
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Log level or filter directive
    #[arg(short = 'L', long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Validate the effective configuration and exit
    #[arg(long)]
    pub validate: bool,
}

impl StubArgs {
    /// Effective configuration: the file (or defaults) with overrides
    /// applied. Not validated.
    pub fn load(&self) -> Result<StubConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => StubConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut StubConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.listener.bind_address = with_port(&config.listener.bind_address, port);
        }
        if let Some(root) = &self.content {
            config.content.root = root.clone();
        }
        if let Some(limit) = self.max_body_bytes {
            config.content.max_body_bytes = limit;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}

/// Replace the port of `bind`, keeping its host.
fn with_port(bind: &str, port: u16) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind}:{port}"),
    }
}
