//! The registry manager: CRUD over the three collections with referential
//! integrity and artifact generation.

use crate::artifacts;
use crate::store::{
    load_snapshot, save_snapshot, AgentsDocument, DepartmentsDocument, FsBackend,
    RegistryBackend, Snapshot, WorkflowsDocument,
};
use crate::validator::Validator;
use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use motus_oauth::IntegrationInjector;
use motus_templates::TemplateEngine;
use motus_types::config::RegistryConfig;
use motus_types::entity::{
    workflow_id, Agent, Department, DepartmentStatus, EntityKind, NewAgent, NewDepartment,
    NewWorkflow, Trigger, Workflow, WorkflowOutput, DEFAULT_VERSION,
};
use motus_types::ValidationReport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Whole-registry dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryExport {
    pub departments: DepartmentsDocument,
    pub agents: AgentsDocument,
    pub workflows: WorkflowsDocument,
    pub exported: DateTime<Utc>,
}

/// Collections to restore. Absent collections are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryImport {
    pub departments: Option<DepartmentsDocument>,
    pub agents: Option<AgentsDocument>,
    pub workflows: Option<WorkflowsDocument>,
}

impl From<RegistryExport> for RegistryImport {
    fn from(export: RegistryExport) -> Self {
        Self {
            departments: Some(export.departments),
            agents: Some(export.agents),
            workflows: Some(export.workflows),
        }
    }
}

pub struct RegistryManager {
    pub(crate) config: RegistryConfig,
    backend: Arc<dyn RegistryBackend>,
    pub(crate) templates: TemplateEngine,
    pub(crate) injector: IntegrationInjector,
    validator: Validator,
    snapshot: Option<Snapshot>,
}

impl RegistryManager {
    /// Manager over the JSON files under `<base>/<registries_dir>`.
    pub fn new(config: RegistryConfig) -> Self {
        let backend = Arc::new(FsBackend::new(config.registries_path()));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: RegistryConfig, backend: Arc<dyn RegistryBackend>) -> Self {
        let templates = TemplateEngine::new(config.templates_path());
        let injector = IntegrationInjector::new(config.oauth_server_path())
            .with_token_dir(config.token_dir.clone());
        Self {
            config,
            backend,
            templates,
            injector,
            validator: Validator::new(),
            snapshot: None,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn templates_mut(&mut self) -> &mut TemplateEngine {
        &mut self.templates
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    pub(crate) fn snapshot(&self) -> RegistryResult<&Snapshot> {
        self.snapshot.as_ref().ok_or(RegistryError::NotLoaded)
    }

    fn snapshot_mut(&mut self) -> RegistryResult<&mut Snapshot> {
        self.snapshot.as_mut().ok_or(RegistryError::NotLoaded)
    }

    /// Read all three documents from the backend.
    pub async fn load(&mut self) -> RegistryResult<()> {
        let snapshot = load_snapshot(self.backend.as_ref()).await?;
        info!(
            departments = snapshot.departments.departments.len(),
            agents = snapshot.agents.agents.len(),
            workflows = snapshot.workflows.workflows.len(),
            "Loaded registries"
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Persist the snapshot. Documents are written departments, agents,
    /// workflows; a failure leaves the earlier ones written.
    pub async fn save(&mut self) -> RegistryResult<()> {
        let backend = Arc::clone(&self.backend);
        let snapshot = self.snapshot_mut()?;
        save_snapshot(backend.as_ref(), snapshot).await?;
        debug!("Saved registries");
        Ok(())
    }

    fn precheck(&self, report: ValidationReport) -> RegistryResult<()> {
        if report.valid {
            Ok(())
        } else {
            Err(RegistryError::Validation(report.errors))
        }
    }

    // ─── Departments ─────────────────────────────────────────────────────────

    pub async fn add_department(&mut self, input: NewDepartment) -> RegistryResult<Department> {
        self.snapshot()?;
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(RegistryError::MissingRequiredField {
                entity: "department",
                fields: missing,
            });
        }
        if self.config.strict_validation {
            let context = serde_json::to_value(&input)?;
            self.precheck(self.validator.validate_department_context(&context))?;
        }

        let snapshot = self.snapshot_mut()?;
        if snapshot.departments.departments.contains_key(&input.name) {
            return Err(RegistryError::AlreadyExists {
                kind: EntityKind::Department,
                name: input.name,
                department: None,
            });
        }

        let department = Department {
            name: input.name,
            display_name: input.display_name,
            description: input.description,
            created: input.created.unwrap_or_else(Utc::now),
            status: input.status.unwrap_or(DepartmentStatus::Active),
            version: input.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            agents: Vec::new(),
            workflows: Vec::new(),
            integrations: input.integrations,
            responsibilities: input.responsibilities,
            updated: None,
            extra: Map::new(),
        };
        snapshot
            .departments
            .departments
            .insert(department.name.clone(), department.clone());
        snapshot.recount();
        info!(department = %department.name, "Added department");

        artifacts::write_department_definition(&mut self.templates, &self.config, &department)
            .await?;
        self.register_integrations(&department).await;
        self.save().await?;
        Ok(department)
    }

    pub async fn update_department(
        &mut self,
        name: &str,
        updates: &Value,
    ) -> RegistryResult<Department> {
        let snapshot = self.snapshot_mut()?;
        let current = snapshot
            .departments
            .departments
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                kind: EntityKind::Department,
                name: name.to_string(),
                department: None,
            })?;
        let merged = merge(current, updates, EntityKind::Department, name)?;
        snapshot
            .departments
            .departments
            .insert(name.to_string(), merged.clone());
        info!(department = %name, "Updated department");
        self.save().await?;
        Ok(merged)
    }

    pub fn department(&self, name: &str) -> RegistryResult<Option<&Department>> {
        Ok(self.snapshot()?.departments.departments.get(name))
    }

    pub fn department_exists(&self, name: &str) -> RegistryResult<bool> {
        Ok(self.department(name)?.is_some())
    }

    // ─── Agents ──────────────────────────────────────────────────────────────

    pub async fn add_agent(&mut self, input: NewAgent) -> RegistryResult<Agent> {
        self.snapshot()?;
        let missing = input.missing_fields();
        let Some(kind) = input.kind.filter(|_| missing.is_empty()) else {
            return Err(RegistryError::MissingRequiredField {
                entity: "agent",
                fields: missing,
            });
        };
        if self.config.strict_validation {
            let mut context = serde_json::to_value(&input)?;
            if input.tools.is_empty() {
                context["tools"] = serde_json::to_value(&self.config.default_tools)?;
            }
            self.precheck(self.validator.validate_agent_context(&context))?;
        }

        let model = input
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());
        let snapshot = self.snapshot_mut()?;
        let Some(department) = snapshot.departments.departments.get_mut(&input.department) else {
            return Err(RegistryError::ForeignKeyNotFound {
                kind: EntityKind::Department,
                name: input.department,
            });
        };
        if snapshot.agents.agents.contains_key(&input.name) {
            return Err(RegistryError::AlreadyExists {
                kind: EntityKind::Agent,
                name: input.name,
                department: None,
            });
        }

        let agent = Agent {
            name: input.name,
            display_name: input.display_name,
            department: input.department,
            kind,
            description: input.description,
            tools: input.tools,
            model,
            script: input.script.filter(|s| !s.trim().is_empty()),
            created: input.created.unwrap_or_else(Utc::now),
            version: input.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            used_in_workflows: Vec::new(),
            updated: None,
            extra: Map::new(),
        };
        push_unique(&mut department.agents, &agent.name);
        let peers: Vec<String> = department
            .agents
            .iter()
            .filter(|a| **a != agent.name)
            .cloned()
            .collect();
        snapshot
            .agents
            .agents
            .insert(agent.name.clone(), agent.clone());
        snapshot.recount();
        info!(agent = %agent.name, department = %agent.department, kind = %agent.kind, "Added agent");

        artifacts::write_agent_definition(&mut self.templates, &self.config, &agent, &peers)
            .await?;
        artifacts::write_fetcher_script(&mut self.templates, &self.config, &agent).await?;
        self.save().await?;
        Ok(agent)
    }

    /// Shallow-merge `updates` over the agent. The department reference is
    /// not re-checked.
    pub async fn update_agent(&mut self, name: &str, updates: &Value) -> RegistryResult<Agent> {
        let snapshot = self.snapshot_mut()?;
        let current = snapshot
            .agents
            .agents
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                kind: EntityKind::Agent,
                name: name.to_string(),
                department: None,
            })?;
        let merged = merge(current, updates, EntityKind::Agent, name)?;
        snapshot
            .agents
            .agents
            .insert(name.to_string(), merged.clone());
        info!(agent = %name, "Updated agent");
        self.save().await?;
        Ok(merged)
    }

    pub fn agent(&self, name: &str) -> RegistryResult<Option<&Agent>> {
        Ok(self.snapshot()?.agents.agents.get(name))
    }

    pub fn agent_exists(&self, name: &str) -> RegistryResult<bool> {
        Ok(self.agent(name)?.is_some())
    }

    // ─── Workflows ───────────────────────────────────────────────────────────

    pub async fn add_workflow(&mut self, input: NewWorkflow) -> RegistryResult<Workflow> {
        self.snapshot()?;
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(RegistryError::MissingRequiredField {
                entity: "workflow",
                fields: missing,
            });
        }
        if self.config.strict_validation {
            let context = serde_json::to_value(&input)?;
            self.precheck(self.validator.validate_workflow_context(&context))?;
        }

        let snapshot = self.snapshot_mut()?;
        let Some(department) = snapshot.departments.departments.get_mut(&input.department) else {
            return Err(RegistryError::ForeignKeyNotFound {
                kind: EntityKind::Department,
                name: input.department,
            });
        };
        let id = workflow_id(&input.department, &input.name);
        if snapshot.workflows.workflows.contains_key(&id) {
            return Err(RegistryError::AlreadyExists {
                kind: EntityKind::Workflow,
                name: input.name,
                department: Some(input.department),
            });
        }

        let orchestrator = input
            .orchestrator
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| format!("{}-orchestrator", input.department));
        let workflow = Workflow {
            name: input.name,
            display_name: input.display_name,
            department: input.department,
            description: input.description,
            orchestrator,
            agents: input.agents,
            steps: input.steps,
            trigger: input.trigger.unwrap_or_else(Trigger::default),
            output: input.output.unwrap_or_else(WorkflowOutput::default),
            estimated_duration: input
                .estimated_duration
                .unwrap_or_else(|| "unknown".to_string()),
            created: input.created.unwrap_or_else(Utc::now),
            version: input.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            last_run: None,
            run_count: 0,
            success_rate: 1.0,
            updated: None,
            extra: Map::new(),
        };

        push_unique(&mut department.workflows, &workflow.name);
        for agent_name in &workflow.agents {
            // Unknown agents are tolerated here and surface in validate().
            if let Some(agent) = snapshot.agents.agents.get_mut(agent_name) {
                push_unique(&mut agent.used_in_workflows, &workflow.name);
            }
        }
        snapshot.workflows.workflows.insert(id, workflow.clone());
        snapshot.recount();
        info!(workflow = %workflow.name, department = %workflow.department, "Added workflow");

        self.save().await?;
        Ok(workflow)
    }

    pub async fn update_workflow(
        &mut self,
        department: &str,
        name: &str,
        updates: &Value,
    ) -> RegistryResult<Workflow> {
        let id = workflow_id(department, name);
        let snapshot = self.snapshot_mut()?;
        let current = snapshot
            .workflows
            .workflows
            .get(&id)
            .ok_or_else(|| RegistryError::NotFound {
                kind: EntityKind::Workflow,
                name: name.to_string(),
                department: Some(department.to_string()),
            })?;
        let merged = merge(current, updates, EntityKind::Workflow, name)?;
        snapshot.workflows.workflows.insert(id, merged.clone());
        info!(workflow = %name, department = %department, "Updated workflow");
        self.save().await?;
        Ok(merged)
    }

    pub fn workflow(&self, department: &str, name: &str) -> RegistryResult<Option<&Workflow>> {
        Ok(self
            .snapshot()?
            .workflows
            .workflows
            .get(&workflow_id(department, name)))
    }

    pub fn workflow_exists(&self, department: &str, name: &str) -> RegistryResult<bool> {
        Ok(self.workflow(department, name)?.is_some())
    }

    // ─── Bulk ────────────────────────────────────────────────────────────────

    pub fn export(&self) -> RegistryResult<RegistryExport> {
        let snapshot = self.snapshot()?;
        Ok(RegistryExport {
            departments: snapshot.departments.clone(),
            agents: snapshot.agents.clone(),
            workflows: snapshot.workflows.clone(),
            exported: Utc::now(),
        })
    }

    /// Replace the supplied collections wholesale and persist. Works on an
    /// unloaded manager and leaves it loaded. Records are not validated.
    pub async fn import(&mut self, data: RegistryImport) -> RegistryResult<()> {
        let snapshot = self.snapshot.get_or_insert_with(Snapshot::empty);
        if let Some(departments) = data.departments {
            snapshot.departments = departments;
        }
        if let Some(agents) = data.agents {
            snapshot.agents = agents;
        }
        if let Some(workflows) = data.workflows {
            snapshot.workflows = workflows;
        }
        snapshot.recount();
        info!(
            departments = snapshot.departments.departments.len(),
            agents = snapshot.agents.agents.len(),
            workflows = snapshot.workflows.workflows.len(),
            "Imported registries"
        );
        self.save().await
    }

    /// Empty every collection and persist.
    pub async fn reset(&mut self) -> RegistryResult<()> {
        self.snapshot = Some(Snapshot::empty());
        info!("Reset registries");
        self.save().await
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Overlay the top-level keys of `updates` on the record, stamp `updated`,
/// and decode back into the record type.
fn merge<T: Serialize + DeserializeOwned>(
    record: &T,
    updates: &Value,
    kind: EntityKind,
    name: &str,
) -> RegistryResult<T> {
    let invalid = |message: String| RegistryError::InvalidUpdate {
        kind,
        name: name.to_string(),
        message,
    };
    let Value::Object(patch) = updates else {
        return Err(invalid("updates must be a JSON object".into()));
    };
    let mut value = serde_json::to_value(record)?;
    let Value::Object(target) = &mut value else {
        return Err(invalid("record is not a JSON object".into()));
    };
    for (key, field) in patch {
        target.insert(key.clone(), field.clone());
    }
    target.insert("updated".into(), serde_json::to_value(Utc::now())?);
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use motus_types::entity::AgentType;
    use serde_json::json;

    async fn manager(dir: &std::path::Path) -> (RegistryManager, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let mut manager =
            RegistryManager::with_backend(RegistryConfig::with_base(dir), backend.clone());
        manager.load().await.unwrap();
        (manager, backend)
    }

    fn finance() -> NewDepartment {
        NewDepartment::new("finance", "Finance", "Budgets, bills and forecasting")
    }

    #[tokio::test]
    async fn reads_before_load_fail() {
        let dir = tempfile::tempdir().unwrap();
        let manager = RegistryManager::with_backend(
            RegistryConfig::with_base(dir.path()),
            Arc::new(MemoryBackend::new()),
        );
        assert!(!manager.is_loaded());
        assert!(matches!(
            manager.department("finance"),
            Err(RegistryError::NotLoaded)
        ));
        assert!(matches!(manager.export(), Err(RegistryError::NotLoaded)));
    }

    #[tokio::test]
    async fn missing_fields_are_all_listed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path()).await;
        let err = manager
            .add_agent(NewAgent {
                name: "budget-tracker".into(),
                ..NewAgent::default()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required agent fields: displayName, department, type, description"
        );
    }

    #[tokio::test]
    async fn department_defaults_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path()).await;
        let dept = manager.add_department(finance()).await.unwrap();
        assert_eq!(dept.status, DepartmentStatus::Active);
        assert_eq!(dept.version, "1.0.0");
        assert!(dir.path().join("agents/finance-admin.md").exists());

        let err = manager.add_department(finance()).await.unwrap_err();
        assert_eq!(err.to_string(), "Department 'finance' already exists");
    }

    #[tokio::test]
    async fn agent_defaults_model_and_links_department() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path()).await;
        manager.add_department(finance()).await.unwrap();

        let agent = manager
            .add_agent(NewAgent::new(
                "budget-tracker",
                "Budget Tracker",
                "finance",
                AgentType::Specialist,
                "Tracks spending against the monthly budget",
            ))
            .await
            .unwrap();
        assert_eq!(agent.model, "sonnet");
        assert!(agent.tools.is_empty());
        assert_eq!(
            manager.department("finance").unwrap().unwrap().agents,
            vec!["budget-tracker"]
        );
        let definition =
            std::fs::read_to_string(dir.path().join("agents/budget-tracker.md")).unwrap();
        assert!(definition.contains("tools: Read, Write, Task"));
    }

    #[tokio::test]
    async fn workflow_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path()).await;
        manager.add_department(finance()).await.unwrap();
        let wf = manager
            .add_workflow(NewWorkflow::new(
                "monthly-review",
                "Monthly Review",
                "finance",
                "Review the month's spending",
            ))
            .await
            .unwrap();
        assert_eq!(wf.orchestrator, "finance-orchestrator");
        assert_eq!(wf.estimated_duration, "unknown");
        assert_eq!(wf.output.kind, "console");
        assert_eq!(wf.run_count, 0);
        assert!(manager.workflow_exists("finance", "monthly-review").unwrap());
        assert!(!manager.workflow_exists("marketing", "monthly-review").unwrap());
    }

    #[tokio::test]
    async fn update_merges_and_stamps() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path()).await;
        manager.add_department(finance()).await.unwrap();

        let updated = manager
            .update_department("finance", &json!({"status": "inactive", "owner": "sam"}))
            .await
            .unwrap();
        assert_eq!(updated.status, DepartmentStatus::Inactive);
        assert_eq!(updated.display_name, "Finance");
        assert!(updated.updated.is_some());
        assert_eq!(updated.extra.get("owner"), Some(&json!("sam")));

        let err = manager
            .update_department("finance", &json!({"status": "paused"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUpdate { .. }));

        let err = manager
            .update_agent("ghost", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Agent 'ghost' not found");
    }

    #[tokio::test]
    async fn strict_mode_rejects_weak_input() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let mut config = RegistryConfig::with_base(dir.path());
        config.strict_validation = true;
        let mut manager = RegistryManager::with_backend(config, backend);
        manager.load().await.unwrap();

        let err = manager
            .add_department(NewDepartment::new("Finance", "Finance", "tbd"))
            .await
            .unwrap_err();
        let RegistryError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert!(errors
            .iter()
            .any(|e| e.starts_with("Department name must be in kebab-case")));
        assert!(!manager.department_exists("Finance").unwrap());
    }

    #[tokio::test]
    async fn reset_empties_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, backend) = manager(dir.path()).await;
        manager.add_department(finance()).await.unwrap();
        manager.reset().await.unwrap();
        assert!(!manager.department_exists("finance").unwrap());
        let raw = backend.get(crate::DocumentKind::Departments).unwrap();
        assert!(raw.contains("\"totalDepartments\": 0"));
    }
}
