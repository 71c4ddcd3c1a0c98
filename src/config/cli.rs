//! Command-line flags.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::config::schema::{split_list, Settings};

const CONFIG_HELP: &str = "\
If no command-line arguments are provided, the configuration is read from
~/.config/tg_log.ini. The file is created with empty fields on first run.
Format:
  filename=<path_to_log_file1,path_to_log_file2,...>
  keyword=<keyword1,keyword2,...>
  n=<number_of_words>
  bot_id=<telegram_bot_id>
  chat_id=<telegram_chat_id>
  debug=<true|false>";

#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(name = "log-alert-relay", version)]
#[command(about = "Monitor log files and send keyword alerts to Telegram", long_about = None)]
#[command(after_help = CONFIG_HELP)]
pub struct Cli {
    /// Path to the log file(s), separated by commas
    #[arg(long, value_name = "PATH[,PATH...]", value_delimiter = ',')]
    pub filename: Vec<String>,

    /// Keyword(s) to watch for, separated by commas or spaces
    #[arg(long, value_name = "KEYWORD", num_args = 1.., value_delimiter = ',')]
    pub keyword: Vec<String>,

    /// Number of words to include in the message
    #[arg(long, value_name = "N")]
    pub n: Option<usize>,

    /// Telegram bot token
    #[arg(long = "bot-id", value_name = "TOKEN")]
    pub bot_id: Option<String>,

    /// Telegram chat id
    #[arg(long = "chat-id", value_name = "ID")]
    pub chat_id: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// True when no flag was given at all, which selects the config file.
    pub fn is_empty(&self) -> bool {
        *self == Cli::default()
    }

    /// Convert flags into unvalidated settings.
    pub fn into_settings(self) -> Settings {
        Settings {
            filenames: self
                .filename
                .iter()
                .flat_map(|value| split_list(value))
                .map(PathBuf::from)
                .collect(),
            keywords: self
                .keyword
                .iter()
                .flat_map(|value| split_list(value))
                .map(str::to_string)
                .collect(),
            n: self.n.unwrap_or(0),
            bot_id: self.bot_id.unwrap_or_default(),
            chat_id: self.chat_id.unwrap_or_default(),
            debug: self.debug,
        }
    }
}

/// Full help text, printed after configuration errors.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
