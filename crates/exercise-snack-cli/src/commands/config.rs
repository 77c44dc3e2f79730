use std::path::Path;

use clap::Subcommand;
use exercise_snack_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "schedule.work_start_hour")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(config_path: &Path, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(config_path)?;
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            if !config.schedule.is_active() {
                eprintln!("warning: end hour must be after start hour; no reminders will be scheduled");
            }
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load_from(config_path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save_to(config_path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => println!("{}", config_path.display()),
    }
    Ok(())
}
