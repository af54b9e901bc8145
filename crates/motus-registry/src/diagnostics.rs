//! Consistency checks between the collections, and between the registry and
//! the files generated from it.

use crate::artifacts;
use crate::manager::RegistryManager;
use crate::RegistryResult;
use motus_types::entity::{workflow_id, Agent, Department};
use motus_types::ValidationReport;
use std::path::PathBuf;
use tracing::{info, warn};

async fn exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

impl RegistryManager {
    /// Dangling references between the three collections. Never fails once
    /// loaded; problems are reported, not raised.
    pub fn validate(&self) -> RegistryResult<ValidationReport> {
        let snapshot = self.snapshot()?;
        let departments = &snapshot.departments.departments;
        let agents = &snapshot.agents.agents;
        let workflows = &snapshot.workflows.workflows;
        let mut report = ValidationReport::new(Vec::new(), Vec::new());

        for agent in agents.values() {
            if !departments.contains_key(&agent.department) {
                report.error(format!(
                    "Agent '{}' references non-existent department '{}'",
                    agent.name, agent.department
                ));
            }
        }

        for workflow in workflows.values() {
            if !departments.contains_key(&workflow.department) {
                report.error(format!(
                    "Workflow '{}' references non-existent department '{}'",
                    workflow.name, workflow.department
                ));
            }
            for agent in &workflow.agents {
                if !agents.contains_key(agent) {
                    report.error(format!(
                        "Workflow '{}' references non-existent agent '{}'",
                        workflow.name, agent
                    ));
                }
            }
        }

        for (name, department) in departments {
            for agent in &department.agents {
                if !agents.contains_key(agent) {
                    report.error(format!(
                        "Department '{name}' lists non-existent agent '{agent}'"
                    ));
                }
            }
            for workflow in &department.workflows {
                if !workflows.contains_key(&workflow_id(name, workflow)) {
                    report.error(format!(
                        "Department '{name}' lists non-existent workflow '{workflow}'"
                    ));
                }
            }
        }

        Ok(report)
    }

    /// Registry entries whose generated files are gone. Missing definition
    /// files are errors; a missing data-fetcher script is a warning.
    pub async fn validate_files(&self) -> RegistryResult<ValidationReport> {
        let snapshot = self.snapshot()?;
        let mut report = ValidationReport::new(Vec::new(), Vec::new());

        for name in snapshot.departments.departments.keys() {
            let path = artifacts::department_definition_path(&self.config, name);
            if !exists(&path).await {
                report.error(format!(
                    "Department '{name}' missing agent file: {}",
                    path.display()
                ));
            }
        }

        for (name, agent) in &snapshot.agents.agents {
            let path = artifacts::agent_definition_path(&self.config, name);
            if !exists(&path).await {
                report.error(format!(
                    "Agent '{name}' missing definition file: {}",
                    path.display()
                ));
            }
            if let Some(script) = artifacts::script_path(&self.config, agent) {
                if !exists(&script).await {
                    report.warn(format!(
                        "Data-fetcher '{name}' missing script: {}",
                        script.display()
                    ));
                }
            }
        }

        Ok(report)
    }

    /// Regenerate every artifact `validate_files` would report missing.
    /// Existing files are left alone. Returns the paths written.
    pub async fn repair_files(&mut self) -> RegistryResult<Vec<PathBuf>> {
        let snapshot = self.snapshot()?;
        let departments: Vec<Department> =
            snapshot.departments.departments.values().cloned().collect();
        let agents: Vec<(Agent, Vec<String>)> = snapshot
            .agents
            .agents
            .values()
            .map(|agent| {
                let peers = snapshot
                    .departments
                    .departments
                    .get(&agent.department)
                    .map(|d| {
                        d.agents
                            .iter()
                            .filter(|a| **a != agent.name)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                (agent.clone(), peers)
            })
            .collect();

        let mut written = Vec::new();
        for department in &departments {
            let path = artifacts::department_definition_path(&self.config, &department.name);
            if !exists(&path).await {
                written.push(
                    artifacts::write_department_definition(
                        &mut self.templates,
                        &self.config,
                        department,
                    )
                    .await?,
                );
            }
        }
        for (agent, peers) in &agents {
            let path = artifacts::agent_definition_path(&self.config, &agent.name);
            if !exists(&path).await {
                written.push(
                    artifacts::write_agent_definition(
                        &mut self.templates,
                        &self.config,
                        agent,
                        peers,
                    )
                    .await?,
                );
            }
            if agent.fetcher_script().is_some() {
                if let Some(script) =
                    artifacts::write_fetcher_script(&mut self.templates, &self.config, agent)
                        .await?
                {
                    written.push(script);
                }
            }
        }

        if written.is_empty() {
            info!("No generated files were missing");
        } else {
            warn!(count = written.len(), "Regenerated missing files");
        }
        Ok(written)
    }
}
