//! Registry configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a registry instance. Relative paths resolve against `base_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Project root.
    pub base_path: PathBuf,
    /// Directory holding `departments.json`, `agents.json` and `workflows.json`.
    pub registries_dir: PathBuf,
    /// Where agent definition files are written.
    pub agents_dir: PathBuf,
    /// Output directory for generated documentation.
    pub docs_dir: PathBuf,
    /// Directory of template overrides. `None` uses only the bundled set.
    pub templates_dir: Option<PathBuf>,
    /// OAuth server source file patched when OAuth2 integrations are registered.
    pub oauth_server: PathBuf,
    /// Token directory name under the user's home, as written into generated
    /// server code.
    pub token_dir: String,
    pub default_model: String,
    pub default_tools: Vec<String>,
    /// Run the validator before every add.
    pub strict_validation: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            registries_dir: PathBuf::from("config/registries"),
            agents_dir: PathBuf::from("agents"),
            docs_dir: PathBuf::from("org-docs"),
            templates_dir: Some(PathBuf::from("templates")),
            oauth_server: PathBuf::from("oauth-manager/server.js"),
            token_dir: ".motus".to_string(),
            default_model: "sonnet".to_string(),
            default_tools: vec!["Read".into(), "Write".into(), "Task".into()],
            strict_validation: false,
        }
    }
}

impl RegistryConfig {
    /// Default settings rooted at `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base.into(),
            ..Self::default()
        }
    }

    /// Resolve a path against the base path; absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn registries_path(&self) -> PathBuf {
        self.resolve(&self.registries_dir)
    }

    pub fn agents_path(&self) -> PathBuf {
        self.resolve(&self.agents_dir)
    }

    pub fn docs_path(&self) -> PathBuf {
        self.resolve(&self.docs_dir)
    }

    pub fn templates_path(&self) -> Option<PathBuf> {
        self.templates_dir.as_ref().map(|dir| self.resolve(dir))
    }

    pub fn oauth_server_path(&self) -> PathBuf {
        self.resolve(&self.oauth_server)
    }
}
