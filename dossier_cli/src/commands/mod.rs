pub mod classify;
pub mod docs;
pub mod qa;
pub mod web;
pub mod wiki;

use crate::cli::{Cli, OutputFormat};
use dossier_core::{build_clients, Clients, DossierConfig};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Core(#[from] dossier_core::ClientError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CommandError {
    /// Hint printed under the error message, if there is a useful one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CommandError::Core(e) => match (e.code_str(), e.upstream_status()) {
                ("upstream_error", Some(401 | 403)) => {
                    Some("Check the API key in your config file or environment.")
                }
                ("upstream_error", Some(429)) => Some("Rate limited; wait a bit and retry."),
                ("upstream_error", None) => {
                    Some("Is the service reachable? For `web`, is the metasearch server running?")
                }
                ("config_error", _) => Some("Fix the config file or pass --config <path>."),
                _ => None,
            },
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

pub fn load_config(cli: &Cli) -> Result<DossierConfig> {
    let config = DossierConfig::load(cli.config.as_deref())?;
    debug!(
        config = ?cli.config,
        context7_key = config.context7.api_key.is_some(),
        stackexchange_key = config.stackexchange.api_key.is_some(),
        "configuration loaded"
    );
    Ok(config)
}

pub fn load_clients(cli: &Cli) -> Result<Clients> {
    let config = load_config(cli)?;
    Ok(build_clients(&config)?)
}

/// Spinner on stderr while a request is in flight; only for pretty output.
pub fn spinner(cli: &Cli, message: impl Into<String>) -> Option<ProgressBar> {
    if cli.output != OutputFormat::Pretty {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Some(spinner)
}

pub fn finish(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
