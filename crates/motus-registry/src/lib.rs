//! Motus registry: the store of departments, agents and workflows plus the
//! artifacts derived from it.
//!
//! [`RegistryManager`] owns an in-memory snapshot of the three registry
//! documents. Every mutation validates referential integrity, updates the
//! snapshot, generates or patches files on disk, and persists the documents
//! through a [`store::RegistryBackend`].

pub mod artifacts;
pub mod config;
pub mod diagnostics;
pub mod docs;
pub mod integrations;
pub mod manager;
pub mod query;
pub mod store;
pub mod validator;

pub use manager::{RegistryExport, RegistryImport, RegistryManager};
pub use query::{AgentFilter, DepartmentFilter, RegistryStatistics, SearchResults, WorkflowFilter};
pub use store::{DocumentKind, FsBackend, MemoryBackend, RegistryBackend};
pub use validator::Validator;

use motus_types::entity::EntityKind;

fn in_department(department: &Option<String>) -> String {
    match department {
        Some(d) => format!(" in department '{d}'"),
        None => String::new(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Missing required {entity} fields: {}", .fields.join(", "))]
    MissingRequiredField {
        entity: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("{kind} '{name}' already exists{}", in_department(.department))]
    AlreadyExists {
        kind: EntityKind,
        name: String,
        department: Option<String>,
    },
    #[error("{kind} '{name}' does not exist")]
    ForeignKeyNotFound { kind: EntityKind, name: String },
    #[error("{kind} '{name}' not found{}", in_department(.department))]
    NotFound {
        kind: EntityKind,
        name: String,
        department: Option<String>,
    },
    #[error("Registries not loaded. Call load() first.")]
    NotLoaded,
    #[error("Invalid update for {kind} '{name}': {message}")]
    InvalidUpdate {
        kind: EntityKind,
        name: String,
        message: String,
    },
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Malformed {kind} registry: {message}")]
    InvalidDocument { kind: DocumentKind, message: String },
    #[error("Template error: {0}")]
    Template(#[from] motus_templates::TemplateError),
    #[error("OAuth error: {0}")]
    OAuth(#[from] motus_oauth::OAuthError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = RegistryError::MissingRequiredField {
            entity: "agent",
            fields: vec!["displayName", "type"],
        };
        assert_eq!(err.to_string(), "Missing required agent fields: displayName, type");

        let err = RegistryError::ForeignKeyNotFound {
            kind: EntityKind::Department,
            name: "finance".into(),
        };
        assert_eq!(err.to_string(), "Department 'finance' does not exist");

        let err = RegistryError::AlreadyExists {
            kind: EntityKind::Workflow,
            name: "monthly-review".into(),
            department: Some("finance".into()),
        };
        assert_eq!(
            err.to_string(),
            "Workflow 'monthly-review' already exists in department 'finance'"
        );

        assert_eq!(
            RegistryError::NotLoaded.to_string(),
            "Registries not loaded. Call load() first."
        );
    }
}
