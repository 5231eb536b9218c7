//! Config Command
//!
//! Manage WeaveDoc configuration.
//!
//! Usage:
//!   weavedoc config show [-g] [-f json]
//!   weavedoc config path
//!   weavedoc config init [-g] [--force]

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    if !global {
        // Merged effective config
        return ConfigLoader::show_config(format == "json");
    }

    match ConfigLoader::global_config_path() {
        Some(global_path) if global_path.exists() => {
            let content = std::fs::read_to_string(&global_path)?;
            println!("# Global Config: {}\n", global_path.display());
            println!("{}", content);
        }
        Some(_) => {
            println!("No global config found.");
            println!("Run 'weavedoc config init --global' to create one.");
        }
        None => println!("Cannot determine global config directory."),
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let dir = ConfigLoader::init_global(force)?;
    let output = Output::new();
    output.success("Initialized global configuration");
    output.field("Directory", &dir.display().to_string());
    if let Some(config_path) = ConfigLoader::global_config_path() {
        output.field("Config", &config_path.display().to_string());
    }
    Ok(())
}

/// Initialize project configuration in the current directory
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let module_name = root.file_name().and_then(|n| n.to_str());

    let dir = ConfigLoader::init_project(&root, module_name, force)?;
    let output = Output::new();
    output.success("Initialized project configuration");
    output.field("Directory", &dir.display().to_string());
    output.field("Config", &dir.join("config.toml").display().to_string());
    Ok(())
}
