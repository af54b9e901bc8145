//! Workflow commands.

use super::{open_registry, or_exit, print_json, read_json, Context};
use crate::ui;
use motus_registry::WorkflowFilter;
use motus_types::entity::{NewWorkflow, Trigger, TriggerKind};
use std::path::PathBuf;

/// Flag values for `workflow add`.
pub struct WorkflowInput {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub agents: Vec<String>,
    pub orchestrator: Option<String>,
    pub schedule: Option<String>,
}

impl From<WorkflowInput> for NewWorkflow {
    fn from(input: WorkflowInput) -> Self {
        let trigger = input.schedule.map(|schedule| Trigger {
            kind: TriggerKind::Scheduled,
            schedule: Some(schedule),
            enabled: true,
        });
        NewWorkflow {
            name: input.name.unwrap_or_default(),
            display_name: input.display_name.unwrap_or_default(),
            department: input.department.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            agents: input.agents,
            orchestrator: input.orchestrator,
            trigger,
            ..NewWorkflow::default()
        }
    }
}

pub fn cmd_workflow_add(ctx: &Context, file: Option<PathBuf>, input: WorkflowInput) {
    let new_workflow: NewWorkflow = match file {
        Some(path) => read_json(&path),
        None => input.into(),
    };

    let (rt, mut registry) = open_registry(ctx);
    for agent in &new_workflow.agents {
        if !or_exit(registry.agent_exists(agent)) {
            ui::check_warn(&format!("agent '{agent}' is not registered yet"));
        }
    }
    let workflow = or_exit(rt.block_on(registry.add_workflow(new_workflow)));

    ui::success(&format!(
        "Workflow '{}' added to '{}'",
        workflow.name, workflow.department
    ));
    ui::kv("Orchestrator", &workflow.orchestrator);
    ui::kv("Trigger", workflow.trigger.kind.as_str());
    if let Some(schedule) = &workflow.trigger.schedule {
        ui::kv("Schedule", schedule);
    }
}

pub fn cmd_workflow_list(
    ctx: &Context,
    department: Option<String>,
    trigger: Option<TriggerKind>,
    json: bool,
) {
    let (_rt, registry) = open_registry(ctx);
    let workflows = or_exit(registry.list_workflows(&WorkflowFilter { department, trigger }));

    if json {
        print_json(&workflows);
        return;
    }
    if workflows.is_empty() {
        ui::empty("No workflows registered.");
        return;
    }
    println!(
        "{:<24} {:<20} {:<10} {:>6} {:>6}",
        "NAME", "DEPARTMENT", "TRIGGER", "AGENTS", "RUNS"
    );
    println!("{}", "-".repeat(70));
    for w in workflows {
        println!(
            "{:<24} {:<20} {:<10} {:>6} {:>6}",
            w.name,
            w.department,
            w.trigger.kind,
            w.agents.len(),
            w.run_count
        );
    }
}

pub fn cmd_workflow_show(ctx: &Context, department: &str, name: &str) {
    let (_rt, registry) = open_registry(ctx);
    let Some(workflow) = or_exit(registry.workflow(department, name)) else {
        ui::error_with_fix(
            &format!("Workflow '{name}' not found in department '{department}'"),
            &format!("run `motus workflow list --department {department}`"),
        );
        std::process::exit(1);
    };

    ui::section(&workflow.display_name);
    ui::kv("Id", &workflow.id());
    ui::kv("Description", &workflow.description);
    ui::kv("Orchestrator", &workflow.orchestrator);
    ui::kv("Agents", &workflow.agents.join(", "));
    ui::kv("Trigger", workflow.trigger.kind.as_str());
    if let Some(schedule) = &workflow.trigger.schedule {
        ui::kv("Schedule", schedule);
    }
    ui::kv("Output", &workflow.output.kind);
    ui::kv("Duration", &workflow.estimated_duration);
    ui::kv("Runs", &workflow.run_count.to_string());
    for step in &workflow.steps {
        let agents: Vec<&str> = step.agents.iter().map(|a| a.name.as_str()).collect();
        let mode = if step.parallel { "parallel" } else { "sequential" };
        ui::kv(
            &format!("Step {}", step.group),
            &format!("{} ({mode})", agents.join(", ")),
        );
    }
}
