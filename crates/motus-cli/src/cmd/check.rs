//! Offline checks that need no registry on disk.

use crate::cli::NameKind;
use crate::ui;
use motus_registry::validator::NameReport;
use motus_registry::Validator;
use motus_types::report::ValidationReport;

fn print_name_report(value: &str, report: &ValidationReport, suggestions: &[String]) {
    if report.valid {
        ui::check_ok(&format!("'{value}' is a valid name"));
    }
    for e in &report.errors {
        ui::check_fail(e);
    }
    for w in &report.warnings {
        ui::check_warn(w);
    }
    if !suggestions.is_empty() {
        ui::hint(&format!("try: {}", suggestions.join(", ")));
    }
}

pub fn cmd_check_name(kind: NameKind, value: &str) {
    let validator = Validator::new();
    let NameReport {
        report,
        suggestions,
    } = match kind {
        NameKind::Department => NameReport {
            report: validator.validate_department_name(value),
            suggestions: Vec::new(),
        },
        NameKind::Agent => validator.validate_agent_name(value),
        NameKind::Workflow => NameReport {
            report: validator.validate_workflow_name(value),
            suggestions: Vec::new(),
        },
        NameKind::EnvVar => validator.validate_env_var_name(value),
    };
    print_name_report(value, &report, &suggestions);
    if !report.valid {
        std::process::exit(1);
    }
}

pub fn cmd_check_type(description: &str) {
    let validator = Validator::new();
    let Some(detection) = validator.detect_agent_type(description) else {
        ui::check_warn("No agent type keywords found in the description");
        return;
    };

    ui::kv("Type", detection.kind.as_str());
    ui::kv(
        "Confidence",
        &format!("{:.0}%", detection.confidence * 100.0),
    );
    for (kind, score) in &detection.scores {
        ui::kv(kind.as_str(), &score.to_string());
    }
    let tools = validator.suggest_tools(Some(detection.kind), false);
    ui::kv("Tools", &tools.join(", "));
}
