//! Documentation generated from the registry: a commands reference plus one
//! page per department.

use crate::manager::RegistryManager;
use crate::RegistryResult;
use motus_types::entity::AgentType;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

pub const COMMANDS_REFERENCE_TEMPLATE: &str = "docs/commands-reference.md";
pub const DEPARTMENT_DOC_TEMPLATE: &str = "docs/department.md";

/// Files written by [`RegistryManager::generate_docs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedDocs {
    pub commands_reference: PathBuf,
    pub departments: Vec<PathBuf>,
}

impl GeneratedDocs {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.commands_reference).chain(&self.departments)
    }
}

impl RegistryManager {
    /// `<docs_dir>/COMMANDS_REFERENCE.md`
    pub fn commands_reference_path(&self) -> PathBuf {
        self.config.docs_path().join("COMMANDS_REFERENCE.md")
    }

    /// `<docs_dir>/departments/<department>-department.md`
    pub fn department_doc_path(&self, department: &str) -> PathBuf {
        self.config
            .docs_path()
            .join("departments")
            .join(format!("{department}-department.md"))
    }

    fn docs_contexts(&self) -> RegistryResult<(Value, Vec<(String, Value)>)> {
        let stats = self.statistics()?;
        let mut summaries = Vec::new();
        let mut pages = Vec::new();

        for department in self.list_departments(&Default::default())? {
            let agents = self.list_agents_by_department(&department.name)?;
            let workflows = self.list_workflows_by_department(&department.name)?;

            let mut summary = serde_json::to_value(department)?;
            summary["agentCount"] = json!(agents.len());
            summary["workflowCount"] = json!(workflows.len());
            summary["workflows"] = serde_json::to_value(&workflows)?;
            summaries.push(summary);

            let page = json!({
                "department": department,
                "agentCount": agents.len(),
                "agents": agents,
                "workflowCount": workflows.len(),
                "workflows": workflows,
            });
            pages.push((department.name.clone(), page));
        }

        let by_type = &stats.agents.by_type;
        let count = |kind: AgentType| by_type.get(&kind).copied().unwrap_or(0);
        let reference = json!({
            "stats": stats,
            "departments": summaries,
            "typeCounts": {
                "dataFetcher": count(AgentType::DataFetcher),
                "orchestrator": count(AgentType::Orchestrator),
                "specialist": count(AgentType::Specialist),
            },
        });
        Ok((reference, pages))
    }

    /// Render the commands reference and every department page.
    pub async fn generate_docs(&mut self) -> RegistryResult<GeneratedDocs> {
        let (reference, pages) = self.docs_contexts()?;

        let commands_reference = self.commands_reference_path();
        self.templates
            .render_to_file(COMMANDS_REFERENCE_TEMPLATE, &reference, &commands_reference)
            .await?;
        info!(path = %commands_reference.display(), "Generated commands reference");

        let mut departments = Vec::with_capacity(pages.len());
        for (name, page) in pages {
            let path = self.department_doc_path(&name);
            self.templates
                .render_to_file(DEPARTMENT_DOC_TEMPLATE, &page, &path)
                .await?;
            departments.push(path);
        }
        info!(count = departments.len(), "Generated department docs");

        Ok(GeneratedDocs {
            commands_reference,
            departments,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::RegistryManager;
    use crate::store::MemoryBackend;
    use motus_types::config::RegistryConfig;
    use motus_types::entity::{AgentType, NewAgent, NewDepartment, NewWorkflow};
    use std::sync::Arc;

    #[tokio::test]
    async fn docs_reflect_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = RegistryManager::with_backend(
            RegistryConfig::with_base(dir.path()),
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
        m.add_agent(NewAgent::new(
            "social-fetcher",
            "Social Fetcher",
            "marketing",
            AgentType::DataFetcher,
            "Fetch social metrics",
        ))
        .await
        .unwrap();
        let mut wf = NewWorkflow::new(
            "weekly-report",
            "Weekly Report",
            "marketing",
            "Summarise the week",
        );
        wf.agents = vec!["social-fetcher".into()];
        m.add_workflow(wf).await.unwrap();

        let docs = m.generate_docs().await.unwrap();
        assert_eq!(docs.paths().count(), 2);

        let reference = std::fs::read_to_string(&docs.commands_reference).unwrap();
        assert!(reference.contains("- **Total Agents**: 1"));
        assert!(reference.contains("`/motus marketing weekly-report` - Summarise the week"));
        assert!(reference.contains("### Data Fetchers (1)"));
        assert!(reference.contains("[View full documentation](departments/marketing-department.md)"));

        let page = std::fs::read_to_string(&docs.departments[0]).unwrap();
        assert!(docs.departments[0].ends_with("org-docs/departments/marketing-department.md"));
        assert!(page.starts_with("# Marketing Department"));
        assert!(page.contains("## Agents (1)"));
        assert!(page.contains("- **Used in**: weekly-report"));
        assert!(page.contains("`/motus marketing weekly-report`"));
        assert!(page.contains("- **Trigger**: manual\n"));
    }
}
