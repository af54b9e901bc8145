//! Configuration loading from `~/.motus/motus.toml` with defaults.

use motus_types::config::RegistryConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable overriding the Motus home directory.
pub const MOTUS_HOME_ENV: &str = "MOTUS_HOME";

/// Load registry configuration from a TOML file, with defaults.
///
/// A missing, unreadable or malformed file is logged and replaced by defaults.
pub fn load_config(path: Option<&Path>) -> RegistryConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<RegistryConfig>(&contents) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Loaded configuration");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %config_path.display(),
                        "Failed to parse config, using defaults"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to read config file, using defaults"
                );
            }
        }
    } else {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
    }

    RegistryConfig::default()
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    motus_home().join("motus.toml")
}

/// Get the Motus home directory: `$MOTUS_HOME`, else `~/.motus`.
pub fn motus_home() -> PathBuf {
    if let Some(home) = std::env::var_os(MOTUS_HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".motus")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_missing_file() {
        let config = load_config(Some(Path::new("/nonexistent/motus.toml")));
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motus.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "base_path = \"/srv/motus\"").unwrap();
        writeln!(f, "agents_dir = \".claude/agents\"").unwrap();
        writeln!(f, "strict_validation = true").unwrap();
        drop(f);

        let config = load_config(Some(&path));
        assert!(config.strict_validation);
        assert_eq!(config.agents_path(), PathBuf::from("/srv/motus/.claude/agents"));
        assert_eq!(config.default_model, "sonnet");
    }

    #[test]
    fn test_load_config_malformed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motus.toml");
        std::fs::write(&path, "strict_validation = \"not a bool\"").unwrap();
        let config = load_config(Some(&path));
        assert!(!config.strict_validation);
    }

    #[test]
    fn test_default_config_path_name() {
        assert!(default_config_path().ends_with("motus.toml"));
    }
}
