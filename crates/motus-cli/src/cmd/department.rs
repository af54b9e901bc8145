//! Department commands.

use super::{open_registry, or_exit, print_json, read_json, Context};
use crate::ui;
use motus_registry::artifacts::department_definition_path;
use motus_registry::DepartmentFilter;
use motus_types::entity::{DepartmentStatus, Integration, NewDepartment};
use std::path::PathBuf;

pub fn cmd_department_add(
    ctx: &Context,
    file: Option<PathBuf>,
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    integrations: Vec<Integration>,
) {
    let mut input: NewDepartment = match file {
        Some(path) => read_json(&path),
        None => NewDepartment::new(
            name.unwrap_or_default(),
            display_name.unwrap_or_default(),
            description.unwrap_or_default(),
        ),
    };
    input.integrations.extend(integrations);

    let (rt, mut registry) = open_registry(ctx);
    let department = or_exit(rt.block_on(registry.add_department(input)));

    ui::success(&format!("Department '{}' created", department.name));
    ui::kv(
        "Admin agent",
        &department_definition_path(registry.config(), &department.name)
            .display()
            .to_string(),
    );
    let oauth = department.integrations.iter().filter(|i| i.is_oauth()).count();
    if oauth > 0 {
        ui::kv("OAuth", &format!("{oauth} integration(s) sent to the OAuth manager"));
    }
    ui::hint(&format!(
        "add agents with `motus agent add --department {}`",
        department.name
    ));
}

pub fn cmd_department_list(ctx: &Context, status: Option<DepartmentStatus>, json: bool) {
    let (_rt, registry) = open_registry(ctx);
    let departments = or_exit(registry.list_departments(&DepartmentFilter { status }));

    if json {
        print_json(&departments);
        return;
    }
    if departments.is_empty() {
        ui::empty("No departments registered.");
        return;
    }
    println!(
        "{:<22} {:<26} {:<9} {:>6} {:>9}",
        "NAME", "DISPLAY NAME", "STATUS", "AGENTS", "WORKFLOWS"
    );
    println!("{}", "-".repeat(76));
    for d in departments {
        println!(
            "{:<22} {:<26} {:<9} {:>6} {:>9}",
            d.name,
            d.display_name,
            d.status,
            d.agents.len(),
            d.workflows.len()
        );
    }
}

pub fn cmd_department_show(ctx: &Context, name: &str) {
    let (_rt, registry) = open_registry(ctx);
    let Some(department) = or_exit(registry.department(name)) else {
        ui::error_with_fix(
            &format!("Department '{name}' not found"),
            "run `motus department list` to see registered departments",
        );
        std::process::exit(1);
    };

    ui::section(&department.display_name);
    ui::kv("Name", &department.name);
    ui::kv("Status", &department.status.to_string());
    ui::kv("Version", &department.version);
    ui::kv("Created", &department.created.to_rfc3339());
    ui::kv("Description", &department.description);
    ui::kv("Agents", &department.agents.join(", "));
    ui::kv("Workflows", &department.workflows.join(", "));
    if !department.integrations.is_empty() {
        ui::blank();
        ui::section("Integrations");
        for i in &department.integrations {
            ui::kv(&i.name, &format!("{} {}", i.kind, i.env_vars.join(", ")));
        }
    }
}
