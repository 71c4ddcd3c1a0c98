//! Configuration loading from flags or from the per-user config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

use crate::config::cli::Cli;
use crate::config::schema::{split_list, RuntimeConfig, Settings};
use crate::config::validation::{validate, ValidationError};

/// Written on first run when no config file exists.
pub const CONFIG_TEMPLATE: &str = "filename=\nkeyword=\nn=0\nbot_id=\nchat_id=\ndebug=false\n";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}", format_missing(.0))]
    Validation(Vec<ValidationError>),

    #[error("configuration file created at {}. Please fill in the required parameters.", .0.display())]
    TemplateCreated(PathBuf),

    #[error("unable to determine the home directory")]
    NoHomeDirectory,
}

fn format_missing(errors: &[ValidationError]) -> String {
    let mut out = String::from("Missing arguments! ");
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&err.to_string());
    }
    out
}

/// `~/.config/tg_log.ini`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(dirs.home_dir().join(".config").join("tg_log.ini"))
}

/// Produce the runtime configuration from process arguments, falling back
/// to `~/.config/tg_log.ini` when no flag was given.
pub fn resolve_from_args(cli: Cli) -> Result<RuntimeConfig, ConfigError> {
    resolve_with(cli, default_config_path)
}

/// Like `resolve_from_args`, with an explicit config file location.
pub fn resolve(cli: Cli, config_path: &Path) -> Result<RuntimeConfig, ConfigError> {
    resolve_with(cli, || Ok(config_path.to_path_buf()))
}

/// Flags win when any are present. Otherwise the config file is read, or
/// bootstrapped from the template if missing.
fn resolve_with(
    cli: Cli,
    config_path: impl FnOnce() -> Result<PathBuf, ConfigError>,
) -> Result<RuntimeConfig, ConfigError> {
    let settings = if cli.is_empty() {
        load_or_bootstrap(&config_path()?)?
    } else {
        cli.into_settings()
    };

    validate(settings).map_err(ConfigError::Validation)
}

/// Read the config file, writing the template first if it does not exist.
pub fn load_or_bootstrap(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        write_template(path)?;
        return Err(ConfigError::TemplateCreated(path.to_path_buf()));
    }
    load_settings(path)
}

/// Read and parse an existing config file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&content).map_err(|(line, message)| ConfigError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

fn write_template(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source: io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, CONFIG_TEMPLATE).map_err(io_err)
}

/// Parse `key=value` lines. Errors carry the 1-based line number.
pub fn parse_settings(content: &str) -> Result<Settings, (usize, String)> {
    let mut settings = Settings::default();

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err((lineno, format!("expected `key=value`, got `{}`", line)));
        };
        let value = value.trim();

        match key.trim() {
            "filename" => settings.filenames = split_list(value).map(PathBuf::from).collect(),
            "keyword" => settings.keywords = split_list(value).map(str::to_string).collect(),
            "n" => {
                settings.n = if value.is_empty() {
                    0
                } else {
                    value
                        .parse()
                        .map_err(|_| (lineno, format!("`n` must be a non-negative integer, got `{}`", value)))?
                };
            }
            "bot_id" => settings.bot_id = value.to_string(),
            "chat_id" => settings.chat_id = value.to_string(),
            "debug" => {
                settings.debug = parse_bool(value)
                    .ok_or_else(|| (lineno, format!("`debug` must be true or false, got `{}`", value)))?;
            }
            _ => {}
        }
    }

    Ok(settings)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Some(false),
        "true" | "1" | "yes" => Some(true),
        _ => None,
    }
}
