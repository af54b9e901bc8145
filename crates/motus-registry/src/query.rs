//! Read-only views over the loaded registry: filtered listings, counters and
//! free-text search.

use crate::manager::RegistryManager;
use crate::RegistryResult;
use motus_types::entity::{Agent, AgentType, Department, DepartmentStatus, TriggerKind, Workflow};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFilter {
    pub status: Option<DepartmentStatus>,
}

impl DepartmentFilter {
    pub fn matches(&self, department: &Department) -> bool {
        self.status.is_none_or(|s| department.status == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFilter {
    pub department: Option<String>,
    pub kind: Option<AgentType>,
}

impl AgentFilter {
    pub fn matches(&self, agent: &Agent) -> bool {
        self.department
            .as_deref()
            .is_none_or(|d| agent.department == d)
            && self.kind.is_none_or(|k| agent.kind == k)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowFilter {
    pub department: Option<String>,
    pub trigger: Option<TriggerKind>,
}

impl WorkflowFilter {
    pub fn matches(&self, workflow: &Workflow) -> bool {
        self.department
            .as_deref()
            .is_none_or(|d| workflow.department == d)
            && self.trigger.is_none_or(|t| workflow.trigger.kind == t)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStats {
    pub total: usize,
    pub by_type: BTreeMap<AgentType, usize>,
    pub by_department: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStats {
    pub total: usize,
    pub by_type: BTreeMap<TriggerKind, usize>,
    pub by_department: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationStats {
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStatistics {
    pub departments: DepartmentStats,
    pub agents: AgentStats,
    pub workflows: WorkflowStats,
    pub integrations: IntegrationStats,
}

/// Records whose name, display name or description contain the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults<'a> {
    pub departments: Vec<&'a Department>,
    pub agents: Vec<&'a Agent>,
    pub workflows: Vec<&'a Workflow>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.agents.is_empty() && self.workflows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.departments.len() + self.agents.len() + self.workflows.len()
    }
}

fn hit(needle: &str, fields: [&str; 3]) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(needle))
}

impl RegistryManager {
    pub fn list_departments(&self, filter: &DepartmentFilter) -> RegistryResult<Vec<&Department>> {
        Ok(self
            .snapshot()?
            .departments
            .departments
            .values()
            .filter(|d| filter.matches(d))
            .collect())
    }

    pub fn list_agents(&self, filter: &AgentFilter) -> RegistryResult<Vec<&Agent>> {
        Ok(self
            .snapshot()?
            .agents
            .agents
            .values()
            .filter(|a| filter.matches(a))
            .collect())
    }

    pub fn list_workflows(&self, filter: &WorkflowFilter) -> RegistryResult<Vec<&Workflow>> {
        Ok(self
            .snapshot()?
            .workflows
            .workflows
            .values()
            .filter(|w| filter.matches(w))
            .collect())
    }

    pub fn list_agents_by_department(&self, department: &str) -> RegistryResult<Vec<&Agent>> {
        self.list_agents(&AgentFilter {
            department: Some(department.to_string()),
            kind: None,
        })
    }

    pub fn list_workflows_by_department(
        &self,
        department: &str,
    ) -> RegistryResult<Vec<&Workflow>> {
        self.list_workflows(&WorkflowFilter {
            department: Some(department.to_string()),
            trigger: None,
        })
    }

    pub fn statistics(&self) -> RegistryResult<RegistryStatistics> {
        let snapshot = self.snapshot()?;
        let departments = &snapshot.departments.departments;
        let agents = &snapshot.agents.agents;
        let workflows = &snapshot.workflows.workflows;

        let active = departments.values().filter(|d| d.is_active()).count();

        let mut agent_stats = AgentStats {
            total: agents.len(),
            by_type: AgentType::ALL.iter().map(|&k| (k, 0)).collect(),
            by_department: departments.keys().map(|d| (d.clone(), 0)).collect(),
        };
        for agent in agents.values() {
            *agent_stats.by_type.entry(agent.kind).or_default() += 1;
            *agent_stats
                .by_department
                .entry(agent.department.clone())
                .or_default() += 1;
        }

        let mut workflow_stats = WorkflowStats {
            total: workflows.len(),
            by_type: [TriggerKind::Manual, TriggerKind::Scheduled]
                .iter()
                .map(|&k| (k, 0))
                .collect(),
            by_department: departments.keys().map(|d| (d.clone(), 0)).collect(),
        };
        for workflow in workflows.values() {
            *workflow_stats.by_type.entry(workflow.trigger.kind).or_default() += 1;
            *workflow_stats
                .by_department
                .entry(workflow.department.clone())
                .or_default() += 1;
        }

        Ok(RegistryStatistics {
            departments: DepartmentStats {
                total: departments.len(),
                active,
                inactive: departments.len() - active,
            },
            agents: agent_stats,
            workflows: workflow_stats,
            integrations: IntegrationStats {
                total: departments.values().map(|d| d.integrations.len()).sum(),
            },
        })
    }

    /// Case-insensitive substring search across all three collections.
    pub fn search(&self, query: &str) -> RegistryResult<SearchResults<'_>> {
        let snapshot = self.snapshot()?;
        let needle = query.to_lowercase();
        Ok(SearchResults {
            departments: snapshot
                .departments
                .departments
                .values()
                .filter(|d| hit(&needle, [&d.name, &d.display_name, &d.description].map(String::as_str)))
                .collect(),
            agents: snapshot
                .agents
                .agents
                .values()
                .filter(|a| hit(&needle, [&a.name, &a.display_name, &a.description].map(String::as_str)))
                .collect(),
            workflows: snapshot
                .workflows
                .workflows
                .values()
                .filter(|w| hit(&needle, [&w.name, &w.display_name, &w.description].map(String::as_str)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use motus_types::config::RegistryConfig;
    use motus_types::entity::{NewAgent, NewDepartment, NewWorkflow, Trigger};
    use std::sync::Arc;

    async fn seeded(dir: &std::path::Path) -> RegistryManager {
        let mut m = RegistryManager::with_backend(
            RegistryConfig::with_base(dir),
            Arc::new(MemoryBackend::new()),
        );
        m.load().await.unwrap();
        m.add_department(NewDepartment::new(
            "marketing",
            "Marketing",
            "Social media and content",
        ))
        .await
        .unwrap();
        m.add_department(NewDepartment::new("finance", "Finance", "Budgets"))
            .await
            .unwrap();
        m.add_agent(NewAgent::new(
            "trend-analyzer",
            "Trend Analyzer",
            "marketing",
            AgentType::Specialist,
            "Spots trends in SOCIAL metrics",
        ))
        .await
        .unwrap();
        let mut wf = NewWorkflow::new("daily-brief", "Daily Brief", "marketing", "Morning digest");
        wf.trigger = Some(Trigger {
            kind: TriggerKind::Scheduled,
            schedule: Some("daily 9:00".into()),
            enabled: true,
        });
        m.add_workflow(wf).await.unwrap();
        m
    }

    #[tokio::test]
    async fn statistics_cover_every_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let m = seeded(dir.path()).await;
        let stats = m.statistics().unwrap();
        assert_eq!(stats.departments.total, 2);
        assert_eq!(stats.departments.active, 2);
        assert_eq!(stats.agents.by_type.len(), 3);
        assert_eq!(stats.agents.by_type[&AgentType::Specialist], 1);
        assert_eq!(stats.agents.by_type[&AgentType::Orchestrator], 0);
        assert_eq!(stats.agents.by_department["finance"], 0);
        assert_eq!(stats.workflows.by_type[&TriggerKind::Scheduled], 1);
        assert_eq!(stats.workflows.by_type[&TriggerKind::Manual], 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["agents"]["byType"]["data-fetcher"], 0);
        assert_eq!(json["workflows"]["byDepartment"]["marketing"], 1);
    }

    #[tokio::test]
    async fn filters_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let m = seeded(dir.path()).await;
        assert_eq!(m.list_agents_by_department("marketing").unwrap().len(), 1);
        assert!(m.list_agents_by_department("finance").unwrap().is_empty());
        assert!(m
            .list_agents(&AgentFilter {
                department: None,
                kind: Some(AgentType::DataFetcher),
            })
            .unwrap()
            .is_empty());
        assert_eq!(
            m.list_workflows(&WorkflowFilter {
                department: None,
                trigger: Some(TriggerKind::Scheduled),
            })
            .unwrap()
            .len(),
            1
        );

        let results = m.search("social").unwrap();
        assert_eq!(results.departments.len(), 1);
        assert_eq!(results.agents.len(), 1);
        assert!(results.workflows.is_empty());
        assert!(m.search("nothing-matches").unwrap().is_empty());
    }
}
