//! Registry entity records and the inputs used to create them.
//!
//! Every record keeps the JSON keys it does not model in an `extra` map so
//! that import/export and shallow-merge updates never drop data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Default version stamped on new records.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Default agent model.
pub const DEFAULT_MODEL: &str = "sonnet";

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_true() -> bool {
    true
}

/// Which collection an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Department,
    Agent,
    Workflow,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Department => write!(f, "Department"),
            Self::Agent => write!(f, "Agent"),
            Self::Workflow => write!(f, "Workflow"),
        }
    }
}

// ─── Department ──────────────────────────────────────────────────────────────

/// Lifecycle status of a department. The registry only ever assigns `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for DepartmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// How an integration authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationKind {
    #[serde(rename = "api-key")]
    ApiKey,
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => write!(f, "api-key"),
            Self::OAuth2 => write!(f, "oauth2"),
        }
    }
}

/// An external service a department depends on.
///
/// `id`, `icon`, `auth_url`, `token_url` and `scopes` are optional overrides
/// for OAuth2 integrations; absent values come from the well-known provider
/// table when the integration is registered with the OAuth server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IntegrationKind,
    #[serde(default)]
    pub env_vars: Vec<String>,
    /// How to obtain credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Integration {
    /// A bare integration with no setup metadata.
    pub fn new(name: impl Into<String>, kind: IntegrationKind, env_vars: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            env_vars,
            setup: None,
            setup_url: None,
            id: None,
            icon: None,
            auth_url: None,
            token_url: None,
            scopes: None,
            extra: Map::new(),
        }
    }

    pub fn is_oauth(&self) -> bool {
        self.kind == IntegrationKind::OAuth2
    }
}

/// A department responsibility: either a free-form line or a titled task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Responsibility {
    Section {
        title: String,
        #[serde(default)]
        tasks: Vec<String>,
    },
    Note(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Unique kebab-case key.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub status: DepartmentStatus,
    #[serde(default = "default_version")]
    pub version: String,
    /// Agent names belonging to this department, in insertion order.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Workflow names (not composite ids) belonging to this department.
    #[serde(default)]
    pub workflows: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub responsibilities: Vec<Responsibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Department {
    pub fn is_active(&self) -> bool {
        self.status == DepartmentStatus::Active
    }
}

// ─── Agent ───────────────────────────────────────────────────────────────────

/// Role of an agent. Selects the definition template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    DataFetcher,
    Orchestrator,
    Specialist,
}

impl AgentType {
    pub const ALL: [AgentType; 3] = [Self::DataFetcher, Self::Orchestrator, Self::Specialist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataFetcher => "data-fetcher",
            Self::Orchestrator => "orchestrator",
            Self::Specialist => "specialist",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data-fetcher" => Ok(Self::DataFetcher),
            "orchestrator" => Ok(Self::Orchestrator),
            "specialist" => Ok(Self::Specialist),
            other => Err(format!(
                "Invalid agent type: {other}. Must be data-fetcher, orchestrator, or specialist"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Globally unique key.
    pub name: String,
    pub display_name: String,
    /// Owning department (foreign key).
    pub department: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub description: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Path of the executable stub for data-fetchers, relative to the base path
    /// unless absolute.
    #[serde(default)]
    pub script: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
    /// Names of workflows listing this agent.
    #[serde(default)]
    pub used_in_workflows: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    /// The script path, only for data-fetchers that declare one.
    pub fn fetcher_script(&self) -> Option<&str> {
        match (self.kind, self.script.as_deref()) {
            (AgentType::DataFetcher, Some(script)) if !script.is_empty() => Some(script),
            _ => None,
        }
    }
}

// ─── Workflow ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "scheduled" => Ok(Self::Scheduled),
            other => Err(format!(
                "Invalid trigger type: {other}. Must be manual or scheduled"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    /// Human schedule, e.g. `daily 9:00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            kind: TriggerKind::Manual,
            schedule: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub destination: Option<String>,
}

impl Default for WorkflowOutput {
    fn default() -> Self {
        Self {
            kind: "console".to_string(),
            destination: None,
        }
    }
}

/// An agent invocation inside a workflow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAgent {
    pub name: String,
    #[serde(default)]
    pub prompt: String,
}

/// A group of agent invocations run together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub group: u32,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub agents: Vec<StepAgent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,
    pub display_name: String,
    pub department: String,
    pub description: String,
    pub orchestrator: String,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub output: WorkflowOutput,
    pub estimated_duration: String,
    pub created: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_success_rate() -> f64 {
    1.0
}

impl Workflow {
    /// Composite registry key.
    pub fn id(&self) -> String {
        workflow_id(&self.department, &self.name)
    }
}

/// Composite workflow key: `{department}-{name}`.
pub fn workflow_id(department: &str, name: &str) -> String {
    format!("{department}-{name}")
}

// ─── Creation inputs ─────────────────────────────────────────────────────────
//
// Required string fields default to empty so that payloads missing them
// deserialize and are rejected with a single "missing fields" error.

fn missing(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewDepartment {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub created: Option<DateTime<Utc>>,
    pub status: Option<DepartmentStatus>,
    pub version: Option<String>,
    pub integrations: Vec<Integration>,
    pub responsibilities: Vec<Responsibility>,
}

impl NewDepartment {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub const REQUIRED: &'static [&'static str] = &["name", "displayName", "description"];

    pub fn missing_fields(&self) -> Vec<&'static str> {
        missing(&[
            ("name", present(&self.name)),
            ("displayName", present(&self.display_name)),
            ("description", present(&self.description)),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAgent {
    pub name: String,
    pub display_name: String,
    pub department: String,
    #[serde(rename = "type")]
    pub kind: Option<AgentType>,
    pub description: String,
    pub tools: Vec<String>,
    pub model: Option<String>,
    pub script: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

impl NewAgent {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        department: impl Into<String>,
        kind: AgentType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            department: department.into(),
            kind: Some(kind),
            description: description.into(),
            ..Self::default()
        }
    }

    pub const REQUIRED: &'static [&'static str] =
        &["name", "displayName", "department", "type", "description"];

    pub fn missing_fields(&self) -> Vec<&'static str> {
        missing(&[
            ("name", present(&self.name)),
            ("displayName", present(&self.display_name)),
            ("department", present(&self.department)),
            ("type", self.kind.is_some()),
            ("description", present(&self.description)),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWorkflow {
    pub name: String,
    pub display_name: String,
    pub department: String,
    pub description: String,
    pub orchestrator: Option<String>,
    pub agents: Vec<String>,
    pub steps: Vec<WorkflowStep>,
    pub trigger: Option<Trigger>,
    pub output: Option<WorkflowOutput>,
    pub estimated_duration: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

impl NewWorkflow {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        department: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            department: department.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub const REQUIRED: &'static [&'static str] =
        &["name", "displayName", "department", "description"];

    pub fn missing_fields(&self) -> Vec<&'static str> {
        missing(&[
            ("name", present(&self.name)),
            ("displayName", present(&self.display_name)),
            ("department", present(&self.department)),
            ("description", present(&self.description)),
        ])
    }
}
