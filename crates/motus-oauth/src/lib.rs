//! OAuth2 integration injector for the Motus OAuth manager.
//!
//! The OAuth manager is a small Node server whose source file carries a config
//! table, per-service client initialisers and `connect`/`callback` route
//! branches. Registering a service splices generated fragments into that file
//! at fixed anchor points (see [`injector::Anchors`]).

pub mod codegen;
pub mod injector;
pub mod providers;

pub use injector::{AnchorKind, Anchors, InjectionOutcome, IntegrationInjector, ANCHOR_SET_VERSION};
pub use providers::{standard_provider, StandardProvider};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Missing required integration fields: {0}")]
    InvalidDescriptor(String),
    #[error("OAuth server source not found: {}", .0.display())]
    ServerNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OAuthResult<T> = Result<T, OAuthError>;

/// Everything needed to register one OAuth2 service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthDescriptor {
    /// Service id used as the config key and route segment, e.g. `google-analytics`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Client id variable first, client secret second.
    pub env_vars: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OAuthDescriptor {
    pub fn validate(&self) -> OAuthResult<()> {
        let mut missing = Vec::new();
        if self.id.trim().is_empty() {
            missing.push("id");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.env_vars.iter().all(|v| v.trim().is_empty()) {
            missing.push("envVars");
        }
        if self.auth_url.trim().is_empty() {
            missing.push("authUrl");
        }
        if self.token_url.trim().is_empty() {
            missing.push("tokenUrl");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OAuthError::InvalidDescriptor(missing.join(", ")))
        }
    }

    /// Key in the server's config table; quoted when the id is not a bare
    /// JS identifier.
    pub fn config_key(&self) -> String {
        codegen::object_key(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str) -> OAuthDescriptor {
        OAuthDescriptor {
            id: id.to_string(),
            name: "Google Analytics".to_string(),
            icon: None,
            env_vars: vec!["GA_CLIENT_ID".into(), "GA_CLIENT_SECRET".into()],
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            scopes: vec![],
        }
    }

    #[test]
    fn hyphenated_ids_are_quoted() {
        assert_eq!(descriptor("google-analytics").config_key(), "'google-analytics'");
        assert_eq!(descriptor("slack").config_key(), "slack");
        assert_eq!(descriptor("google.analytics").config_key(), "'google.analytics'");
    }

    #[test]
    fn validate_lists_every_missing_field() {
        let mut desc = descriptor("");
        desc.env_vars.clear();
        desc.token_url.clear();
        let err = desc.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required integration fields: id, envVars, tokenUrl"
        );
        assert!(descriptor("slack").validate().is_ok());
    }
}
