//! Registry documents and their persistence backends.
//!
//! The registry is three JSON documents, one per collection. Each keeps its
//! records in a name-keyed map next to a small metadata block. Saving writes
//! them one after another (departments, agents, workflows) and is not atomic
//! across documents.

use crate::{RegistryError, RegistryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motus_types::entity::{Agent, Department, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Departments,
    Agents,
    Workflows,
}

impl DocumentKind {
    /// Save order.
    pub const ALL: [DocumentKind; 3] = [Self::Departments, Self::Agents, Self::Workflows];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Departments => "departments",
            Self::Agents => "agents",
            Self::Workflows => "workflows",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw document storage.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Contents of a document, `None` when it has never been written.
    async fn read(&self, kind: DocumentKind) -> RegistryResult<Option<String>>;

    async fn write(&self, kind: DocumentKind, contents: &str) -> RegistryResult<()>;
}

/// One JSON file per document in a directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

#[async_trait]
impl RegistryBackend for FsBackend {
    async fn read(&self, kind: DocumentKind) -> RegistryResult<Option<String>> {
        tokio::fs::create_dir_all(&self.dir).await?;
        match tokio::fs::read_to_string(self.path(kind)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, kind: DocumentKind, contents: &str) -> RegistryResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path(kind), contents).await?;
        Ok(())
    }
}

/// In-process backend for tests. Writes to selected documents can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    docs: Mutex<HashMap<DocumentKind, String>>,
    failing: Mutex<HashSet<DocumentKind>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DocumentKind) -> Option<String> {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
    }

    pub fn insert(&self, kind: DocumentKind, contents: impl Into<String>) {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, contents.into());
    }

    /// Make every later write to `kind` fail.
    pub fn fail_writes(&self, kind: DocumentKind) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind);
    }

    pub fn clear_failures(&self) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl RegistryBackend for MemoryBackend {
    async fn read(&self, kind: DocumentKind) -> RegistryResult<Option<String>> {
        Ok(self.get(kind))
    }

    async fn write(&self, kind: DocumentKind, contents: &str) -> RegistryResult<()> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&kind);
        if failing {
            return Err(RegistryError::Backend(format!("write to {kind} refused")));
        }
        self.insert(kind, contents);
        Ok(())
    }
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentsMetadata {
    #[serde(default)]
    pub total_departments: usize,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsMetadata {
    #[serde(default)]
    pub total_agents: usize,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowsMetadata {
    #[serde(default)]
    pub total_workflows: usize,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! fresh_metadata {
    ($ty:ident, $total:ident) => {
        impl Default for $ty {
            fn default() -> Self {
                Self {
                    $total: 0,
                    last_updated: Utc::now(),
                    extra: Map::new(),
                }
            }
        }
    };
}

fresh_metadata!(DepartmentsMetadata, total_departments);
fresh_metadata!(AgentsMetadata, total_agents);
fresh_metadata!(WorkflowsMetadata, total_workflows);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentsDocument {
    #[serde(default)]
    pub departments: BTreeMap<String, Department>,
    #[serde(default)]
    pub metadata: DepartmentsMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentsDocument {
    #[serde(default)]
    pub agents: BTreeMap<String, Agent>,
    #[serde(default)]
    pub metadata: AgentsMetadata,
}

/// Workflows keyed by composite id `{department}-{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowsDocument {
    #[serde(default)]
    pub workflows: BTreeMap<String, Workflow>,
    #[serde(default)]
    pub metadata: WorkflowsMetadata,
}

/// The loaded registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub departments: DepartmentsDocument,
    pub agents: AgentsDocument,
    pub workflows: WorkflowsDocument,
}

impl Snapshot {
    /// Empty collections with zeroed counters and a fresh `lastUpdated`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bring counters in line with the collections.
    pub fn recount(&mut self) {
        self.departments.metadata.total_departments = self.departments.departments.len();
        self.agents.metadata.total_agents = self.agents.agents.len();
        self.workflows.metadata.total_workflows = self.workflows.workflows.len();
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.departments.metadata.last_updated = now;
        self.agents.metadata.last_updated = now;
        self.workflows.metadata.last_updated = now;
    }
}

fn parse<T: for<'de> Deserialize<'de> + Default>(
    kind: DocumentKind,
    raw: Option<String>,
) -> RegistryResult<T> {
    match raw {
        None => Ok(T::default()),
        Some(text) => serde_json::from_str(&text).map_err(|e| RegistryError::InvalidDocument {
            kind,
            message: e.to_string(),
        }),
    }
}

/// Read all three documents. Missing documents load as empty collections.
pub async fn load_snapshot(backend: &dyn RegistryBackend) -> RegistryResult<Snapshot> {
    let departments = parse(
        DocumentKind::Departments,
        backend.read(DocumentKind::Departments).await?,
    )?;
    let agents = parse(DocumentKind::Agents, backend.read(DocumentKind::Agents).await?)?;
    let workflows = parse(
        DocumentKind::Workflows,
        backend.read(DocumentKind::Workflows).await?,
    )?;
    Ok(Snapshot {
        departments,
        agents,
        workflows,
    })
}

/// Stamp `lastUpdated` and write every document in save order.
///
/// A failure part-way leaves earlier documents written and later ones stale.
pub async fn save_snapshot(
    backend: &dyn RegistryBackend,
    snapshot: &mut Snapshot,
) -> RegistryResult<()> {
    snapshot.recount();
    snapshot.stamp(Utc::now());
    for kind in DocumentKind::ALL {
        let contents = match kind {
            DocumentKind::Departments => serde_json::to_string_pretty(&snapshot.departments)?,
            DocumentKind::Agents => serde_json::to_string_pretty(&snapshot.agents)?,
            DocumentKind::Workflows => serde_json::to_string_pretty(&snapshot.workflows)?,
        };
        backend.write(kind, &contents).await?;
        debug!(document = %kind, "Saved registry document");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_documents_load_empty() {
        let backend = MemoryBackend::new();
        let snapshot = load_snapshot(&backend).await.unwrap();
        assert!(snapshot.departments.departments.is_empty());
        assert_eq!(snapshot.agents.metadata.total_agents, 0);
    }

    #[tokio::test]
    async fn malformed_document_is_an_error() {
        let backend = MemoryBackend::new();
        backend.insert(DocumentKind::Agents, "{ not json");
        let err = load_snapshot(&backend).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidDocument {
                kind: DocumentKind::Agents,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn document_shape_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path().join("config/registries"));
        let doc = json!({
            "departments": {
                "finance": {
                    "name": "finance",
                    "displayName": "Finance",
                    "description": "Budget and bills",
                    "created": "2026-02-23T10:00:00Z"
                }
            },
            "metadata": {"totalDepartments": 1, "lastUpdated": "2026-02-23T10:00:00Z"}
        });
        backend
            .write(DocumentKind::Departments, &doc.to_string())
            .await
            .unwrap();

        let mut snapshot = load_snapshot(&backend).await.unwrap();
        assert_eq!(snapshot.departments.metadata.total_departments, 1);
        save_snapshot(&backend, &mut snapshot).await.unwrap();

        let written = std::fs::read_to_string(backend.path(DocumentKind::Departments)).unwrap();
        assert!(written.starts_with("{\n  \"departments\": {"));
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["metadata"]["totalDepartments"], json!(1));
        assert_ne!(value["metadata"]["lastUpdated"], json!("2026-02-23T10:00:00Z"));
        assert!(backend.path(DocumentKind::Workflows).exists());
    }

    #[tokio::test]
    async fn failed_write_stops_later_documents() {
        let backend = MemoryBackend::new();
        backend.fail_writes(DocumentKind::Agents);
        let mut snapshot = Snapshot::empty();
        let err = save_snapshot(&backend, &mut snapshot).await.unwrap_err();
        assert!(matches!(err, RegistryError::Backend(_)));
        assert!(backend.get(DocumentKind::Departments).is_some());
        assert!(backend.get(DocumentKind::Agents).is_none());
        assert!(backend.get(DocumentKind::Workflows).is_none());
    }
}
