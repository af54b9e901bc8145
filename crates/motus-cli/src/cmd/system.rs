//! Whole-registry commands: validation, repair, stats, search, export/import, docs.

use super::{open_registry, or_exit, print_json, read_json, Context};
use crate::ui;
use motus_registry::RegistryImport;
use motus_types::report::ValidationReport;
use std::path::{Path, PathBuf};

fn print_report(report: &ValidationReport) {
    for e in &report.errors {
        ui::check_fail(e);
    }
    for w in &report.warnings {
        ui::check_warn(w);
    }
    if report.valid {
        ui::check_ok(&format!(
            "Registry is consistent ({} warning(s))",
            report.warnings.len()
        ));
    }
}

pub fn cmd_validate(ctx: &Context, files: bool, json: bool) {
    let (rt, registry) = open_registry(ctx);
    let mut report = or_exit(registry.validate());
    if files {
        report.merge(or_exit(rt.block_on(registry.validate_files())));
    }

    if json {
        print_json(&report);
    } else {
        ui::section("Registry validation");
        print_report(&report);
        if !report.valid && files {
            ui::hint("`motus repair` regenerates missing definition files");
        }
    }
    if !report.valid {
        std::process::exit(1);
    }
}

pub fn cmd_repair(ctx: &Context) {
    let (rt, mut registry) = open_registry(ctx);
    let written = or_exit(rt.block_on(registry.repair_files()));
    if written.is_empty() {
        ui::check_ok("Nothing to repair");
        return;
    }
    for path in &written {
        ui::check_ok(&format!("regenerated {}", path.display()));
    }
    ui::success(&format!("{} file(s) restored", written.len()));
}

pub fn cmd_stats(ctx: &Context, json: bool) {
    let (_rt, registry) = open_registry(ctx);
    let stats = or_exit(registry.statistics());
    if json {
        print_json(&stats);
        return;
    }

    ui::section("Departments");
    ui::kv("Total", &stats.departments.total.to_string());
    ui::kv("Active", &stats.departments.active.to_string());
    ui::kv("Inactive", &stats.departments.inactive.to_string());
    ui::blank();
    ui::section("Agents");
    ui::kv("Total", &stats.agents.total.to_string());
    for (kind, count) in &stats.agents.by_type {
        ui::kv(kind.as_str(), &count.to_string());
    }
    ui::blank();
    ui::section("Workflows");
    ui::kv("Total", &stats.workflows.total.to_string());
    for (kind, count) in &stats.workflows.by_type {
        ui::kv(kind.as_str(), &count.to_string());
    }
    ui::blank();
    ui::kv("Integrations", &stats.integrations.total.to_string());
}

pub fn cmd_search(ctx: &Context, query: &str) {
    let (_rt, registry) = open_registry(ctx);
    let results = or_exit(registry.search(query));
    if results.is_empty() {
        ui::empty(&format!("No matches for '{query}'."));
        return;
    }

    if !results.departments.is_empty() {
        ui::section("Departments");
        for d in &results.departments {
            ui::kv(&d.name, &d.display_name);
        }
    }
    if !results.agents.is_empty() {
        ui::section("Agents");
        for a in &results.agents {
            ui::kv(&a.name, &format!("{} ({})", a.display_name, a.department));
        }
    }
    if !results.workflows.is_empty() {
        ui::section("Workflows");
        for w in &results.workflows {
            ui::kv(&w.id(), &w.display_name);
        }
    }
    ui::blank();
    ui::hint(&format!("{} match(es)", results.len()));
}

pub fn cmd_export(ctx: &Context, output: Option<PathBuf>) {
    let (_rt, registry) = open_registry(ctx);
    let export = or_exit(registry.export());
    match output {
        None => print_json(&export),
        Some(path) => {
            let body = or_exit(serde_json::to_string_pretty(&export));
            or_exit(std::fs::write(&path, body));
            ui::success(&format!("Registry exported to {}", path.display()));
        }
    }
}

pub fn cmd_import(ctx: &Context, file: &Path) {
    let data: RegistryImport = read_json(file);
    let (rt, mut registry) = open_registry(ctx);
    or_exit(rt.block_on(registry.import(data)));
    let stats = or_exit(registry.statistics());
    ui::success(&format!(
        "Imported {} department(s), {} agent(s), {} workflow(s)",
        stats.departments.total, stats.agents.total, stats.workflows.total
    ));
    ui::hint("run `motus validate --files` to check generated files");
}

pub fn cmd_docs(ctx: &Context) {
    let (rt, mut registry) = open_registry(ctx);
    let docs = or_exit(rt.block_on(registry.generate_docs()));
    for path in docs.paths() {
        ui::check_ok(&path.display().to_string());
    }
    ui::success("Documentation generated");
}
