//! Configuration view and validation commands (`weditor config`).

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

use weditor::config::{CONFIG_FILE_NAME, EditorConfig, Overrides};

use super::super::ConfigCommands;

pub fn cmd_config(
    explicit: Option<&Path>,
    overrides: &Overrides,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = EditorConfig::load(explicit, overrides)?;
            match &config.settings_path {
                Some(path) => println!("# Config file: {}", path.display()),
                None => println!("# No config file found, using defaults"),
            }
            println!("{}", config.to_toml()?);
        }
        Some(ConfigCommands::Validate) => {
            let config = EditorConfig::load(explicit, overrides)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init { force }) => {
            let path = explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
            let mut config = EditorConfig::default();
            config.apply_overrides(overrides);
            config.save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
