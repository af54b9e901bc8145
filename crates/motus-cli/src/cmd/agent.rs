//! Agent commands.

use super::{open_registry, or_exit, print_json, read_json, Context};
use crate::ui;
use motus_registry::artifacts::{agent_definition_path, script_path};
use motus_registry::AgentFilter;
use motus_types::entity::{AgentType, NewAgent};
use std::path::PathBuf;

/// Flag values for `agent add`.
pub struct AgentInput {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub department: Option<String>,
    pub kind: Option<AgentType>,
    pub description: Option<String>,
    pub tools: Vec<String>,
    pub model: Option<String>,
    pub script: Option<String>,
}

impl From<AgentInput> for NewAgent {
    fn from(input: AgentInput) -> Self {
        NewAgent {
            name: input.name.unwrap_or_default(),
            display_name: input.display_name.unwrap_or_default(),
            department: input.department.unwrap_or_default(),
            kind: input.kind,
            description: input.description.unwrap_or_default(),
            tools: input.tools,
            model: input.model,
            script: input.script,
            ..NewAgent::default()
        }
    }
}

pub fn cmd_agent_add(ctx: &Context, file: Option<PathBuf>, input: AgentInput) {
    let new_agent: NewAgent = match file {
        Some(path) => read_json(&path),
        None => input.into(),
    };

    let (rt, mut registry) = open_registry(ctx);
    if let Some(kind) = new_agent.kind {
        let detected = registry.validator().detect_agent_type(&new_agent.description);
        if let Some(d) = detected.filter(|d| d.kind != kind) {
            ui::check_warn(&format!(
                "description reads like a {} agent ({:.0}% keyword match)",
                d.kind,
                d.confidence * 100.0
            ));
        }
    }
    let agent = or_exit(rt.block_on(registry.add_agent(new_agent)));

    ui::success(&format!(
        "Agent '{}' ({}) added to '{}'",
        agent.name, agent.kind, agent.department
    ));
    ui::kv(
        "Definition",
        &agent_definition_path(registry.config(), &agent.name)
            .display()
            .to_string(),
    );
    if let Some(script) = script_path(registry.config(), &agent) {
        ui::kv("Script", &script.display().to_string());
    }
}

pub fn cmd_agent_list(ctx: &Context, department: Option<String>, kind: Option<AgentType>, json: bool) {
    let (_rt, registry) = open_registry(ctx);
    let agents = or_exit(registry.list_agents(&AgentFilter { department, kind }));

    if json {
        print_json(&agents);
        return;
    }
    if agents.is_empty() {
        ui::empty("No agents registered.");
        return;
    }
    println!(
        "{:<26} {:<20} {:<14} {:<8}",
        "NAME", "DEPARTMENT", "TYPE", "MODEL"
    );
    println!("{}", "-".repeat(70));
    for a in agents {
        println!(
            "{:<26} {:<20} {:<14} {:<8}",
            a.name, a.department, a.kind, a.model
        );
    }
}

pub fn cmd_agent_show(ctx: &Context, name: &str) {
    let (_rt, registry) = open_registry(ctx);
    let Some(agent) = or_exit(registry.agent(name)) else {
        ui::error_with_fix(
            &format!("Agent '{name}' not found"),
            "run `motus agent list` to see registered agents",
        );
        std::process::exit(1);
    };

    ui::section(&agent.display_name);
    ui::kv("Name", &agent.name);
    ui::kv("Department", &agent.department);
    ui::kv("Type", agent.kind.as_str());
    ui::kv("Model", &agent.model);
    ui::kv("Tools", &agent.tools.join(", "));
    if let Some(script) = &agent.script {
        ui::kv("Script", script);
    }
    ui::kv("Workflows", &agent.used_in_workflows.join(", "));
    ui::kv("Description", &agent.description);
}
