//! Configuration view: `taskboard config`.

use anyhow::{Context as _, Result};
use console::style;
use taskboard::config::{Config, ENV_API_URL, ENV_TOKEN, default_config_path};

use super::super::{Cli, ConfigCommands};
use super::overrides;

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = Config::load(&overrides(cli)).context("Failed to load configuration")?;
            println!();
            println!("{}", style("Taskboard Configuration").bold().cyan());
            println!();
            let file_state = if config.config_path.exists() {
                ""
            } else {
                " (not found, using defaults)"
            };
            println!("Config file: {}{}", config.config_path.display(), file_state);
            println!();
            println!("  api_url = \"{}\"", config.api_url);
            println!(
                "  token = {}",
                if config.token.is_some() { "<set>" } else { "<not set>" }
            );
            println!("  poll_interval_secs = {}", config.poll_interval.as_secs());
            println!("  request_timeout_secs = {}", config.request_timeout.as_secs());
            println!("  page_size = {}", config.page_size);
            println!();
            println!("Environment overrides: {}, {}", ENV_API_URL, ENV_TOKEN);
        }
        Some(ConfigCommands::Path) => {
            let path = cli.config.clone().unwrap_or_else(default_config_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
