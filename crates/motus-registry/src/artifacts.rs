//! Files derived from registry records: definition files for departments and
//! agents, and executable stubs for data-fetchers.

use crate::RegistryResult;
use motus_templates::TemplateEngine;
use motus_types::config::RegistryConfig;
use motus_types::entity::{Agent, AgentType, Department};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;

pub const DEPARTMENT_TEMPLATE: &str = "department/department-agent.md";
pub const SCRIPT_TEMPLATE: &str = "agent/data-fetcher-script.js";

pub fn agent_template(kind: AgentType) -> &'static str {
    match kind {
        AgentType::DataFetcher => "agent/data-fetcher-agent.md",
        AgentType::Orchestrator => "agent/orchestrator-agent.md",
        AgentType::Specialist => "agent/specialist-agent.md",
    }
}

/// `<agents_dir>/<department>-admin.md`
pub fn department_definition_path(config: &RegistryConfig, department: &str) -> PathBuf {
    config.agents_path().join(format!("{department}-admin.md"))
}

/// `<agents_dir>/<agent>.md`
pub fn agent_definition_path(config: &RegistryConfig, agent: &str) -> PathBuf {
    config.agents_path().join(format!("{agent}.md"))
}

/// Script path for a data-fetcher, resolved against the base path.
pub fn script_path(config: &RegistryConfig, agent: &Agent) -> Option<PathBuf> {
    agent.fetcher_script().map(|script| config.resolve(script))
}

pub fn department_context(department: &Department, config: &RegistryConfig) -> Value {
    let name = format!("{}-admin", department.name);
    let display_name = format!("{} Admin", department.display_name);
    let description = format!("Master agent for {} department", department.display_name);
    json!({
        "name": name,
        "displayName": display_name,
        "description": description,
        "department": department.name,
        "departmentDescription": department.description,
        "integrations": department.integrations,
        "responsibilities": department.responsibilities,
        "frontmatter": {
            "name": name,
            "description": description,
            "tools": config.default_tools,
            "model": config.default_model,
        },
    })
}

/// Render context for an agent. `peers` are the other agents of its department.
pub fn agent_context(agent: &Agent, config: &RegistryConfig, peers: &[String]) -> Value {
    let tools = if agent.tools.is_empty() {
        &config.default_tools
    } else {
        &agent.tools
    };
    json!({
        "name": agent.name,
        "displayName": agent.display_name,
        "description": agent.description,
        "department": agent.department,
        "type": agent.kind,
        "tools": tools,
        "model": agent.model,
        "scriptPath": agent.script,
        "agents": peers,
        "frontmatter": {
            "name": agent.name,
            "description": agent.description,
            "tools": tools,
            "model": agent.model,
        },
    })
}

pub async fn write_department_definition(
    templates: &mut TemplateEngine,
    config: &RegistryConfig,
    department: &Department,
) -> RegistryResult<PathBuf> {
    let path = department_definition_path(config, &department.name);
    let context = department_context(department, config);
    templates
        .render_to_file(DEPARTMENT_TEMPLATE, &context, &path)
        .await?;
    info!(department = %department.name, path = %path.display(), "Generated department agent");
    Ok(path)
}

pub async fn write_agent_definition(
    templates: &mut TemplateEngine,
    config: &RegistryConfig,
    agent: &Agent,
    peers: &[String],
) -> RegistryResult<PathBuf> {
    let path = agent_definition_path(config, &agent.name);
    let context = agent_context(agent, config, peers);
    templates
        .render_to_file(agent_template(agent.kind), &context, &path)
        .await?;
    info!(agent = %agent.name, path = %path.display(), "Generated agent definition");
    Ok(path)
}

/// Generate the data-fetcher stub unless something already exists at its path.
///
/// Returns the path written, or `None` when the agent has no script or the
/// file was left alone.
pub async fn write_fetcher_script(
    templates: &mut TemplateEngine,
    config: &RegistryConfig,
    agent: &Agent,
) -> RegistryResult<Option<PathBuf>> {
    let Some(path) = script_path(config, agent) else {
        return Ok(None);
    };
    if tokio::fs::try_exists(&path).await? {
        info!(agent = %agent.name, path = %path.display(), "Script already exists, leaving it untouched");
        return Ok(None);
    }
    let context = agent_context(agent, config, &[]);
    templates
        .render_to_file(SCRIPT_TEMPLATE, &context, &path)
        .await?;
    make_executable(&path).await?;
    info!(agent = %agent.name, path = %path.display(), "Generated implementation script");
    Ok(Some(path))
}

#[cfg(unix)]
async fn make_executable(path: &std::path::Path) -> RegistryResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &std::path::Path) -> RegistryResult<()> {
    Ok(())
}
