use std::path::{Path, PathBuf};

use clap::Parser;
use serde::de::DeserializeOwned;

use crate::logging;

const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// The log level to use, this is a tracing env filter
    pub level: String,

    /// What logging mode we should use
    pub mode: logging::Mode,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            mode: logging::Mode::Default,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),
    #[error("failed to build config: {0}")]
    Build(#[from] config::ConfigError),
    #[error("failed to resolve config path: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
struct Cli {
    /// The path to the config file
    #[arg(short, long)]
    config: Option<String>,
}

/// Loads `C` from (highest priority first) environment variables named
/// `{PREFIX}_SECTION__KEY`, a config file and the `Default` impl of `C`.
///
/// The file is taken from `--config` when `enable_cli` is set, then from
/// `{PREFIX}_CONFIG_FILE`, then from `default_file`. A file named explicitly
/// must exist, the default one may be missing. Returns the canonical path of
/// the file that was loaded.
pub fn parse<C: DeserializeOwned>(
    enable_cli: bool,
    env_prefix: &str,
    default_file: Option<String>,
) -> Result<(C, Option<String>), ConfigError> {
    let cli_file = if enable_cli { Cli::parse().config } else { None };
    let explicit = cli_file.or_else(|| std::env::var(format!("{env_prefix}_CONFIG_FILE")).ok());
    let key_provided = explicit.is_some();

    let mut builder = config::Config::builder();
    let mut config_path = None;

    if let Some(path) = explicit.or(default_file) {
        match find_file(&path) {
            Some(file) => {
                builder = builder.add_source(config::File::from(file.as_path()));
                config_path = Some(std::fs::canonicalize(&file)?.display().to_string());
            }
            None if key_provided => return Err(ConfigError::FileNotFound(path)),
            None => tracing::debug!(path, "no config file found"),
        }
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    Ok((config, config_path))
}

fn find_file(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    FILE_EXTENSIONS
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}
