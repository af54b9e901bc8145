//! Command implementations by domain.

pub mod agent;
pub mod check;
pub mod department;
pub mod system;
pub mod templates;
pub mod workflow;

use crate::ui;
use motus_registry::config::load_config;
use motus_registry::RegistryManager;
use motus_types::config::RegistryConfig;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

/// Global flags shared by every command.
pub struct Context {
    pub config: Option<PathBuf>,
    pub base: Option<PathBuf>,
}

impl Context {
    pub fn registry_config(&self) -> RegistryConfig {
        let mut config = load_config(self.config.as_deref());
        if let Some(base) = &self.base {
            config.base_path = base.clone();
        }
        config
    }
}

/// Print the error and exit with status 1.
pub fn or_exit<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            ui::error(&e.to_string());
            std::process::exit(1);
        }
    }
}

pub fn runtime() -> Runtime {
    or_exit(Runtime::new())
}

/// Runtime plus a loaded registry. A registry that fails to load ends the process.
pub fn open_registry(ctx: &Context) -> (Runtime, RegistryManager) {
    let rt = runtime();
    let mut registry = RegistryManager::new(ctx.registry_config());
    if let Err(e) = rt.block_on(registry.load()) {
        ui::error_with_fix(
            &format!("Failed to load registries: {e}"),
            "check the JSON files under config/registries, or restore them with `motus import`",
        );
        std::process::exit(1);
    }
    (rt, registry)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> T {
    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
        ui::error(&format!("Error reading {}: {e}", path.display()));
        std::process::exit(1);
    });
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        ui::error(&format!("Invalid JSON in {}: {e}", path.display()));
        std::process::exit(1);
    })
}

pub fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", or_exit(serde_json::to_string_pretty(value)));
}
