//! Naming, content and context checks for registry input.
//!
//! The manager only consults these when `strict_validation` is enabled; the
//! CLI exposes them directly through `motus check`.

use motus_types::entity::AgentType;
use motus_types::ValidationReport;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{2,50}$").expect("kebab regex is valid"));

static UPPER_SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]{2,50}$").expect("env var regex is valid"));

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&/=]*)$",
    )
    .expect("URL regex is valid")
});

static SCHEDULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^daily \d{1,2}:\d{2}$",
        r"(?i)^weekly (monday|tuesday|wednesday|thursday|friday|saturday|sunday) \d{1,2}:\d{2}$",
        r"^monthly \d{1,2}(st|nd|rd|th) \d{1,2}:\d{2}$",
        r"^hourly$",
        r"^every \d+ (hours|minutes)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("schedule regex is valid"))
    .collect()
});

const GENERIC_PHRASES: &[&str] = &[
    "does stuff",
    "handles things",
    "manages data",
    "tbd",
    "todo",
    "placeholder",
];

const PARALLEL_INDICATORS: &[&str] = &["and", "&", ",", "multiple", "all", "both"];

const ACTION_VERBS: &[&str] = &[
    "fetch", "get", "retrieve", "analyze", "process", "create", "update",
];

fn type_keywords(kind: AgentType) -> &'static [&'static str] {
    match kind {
        AgentType::DataFetcher => &[
            "fetch", "get", "retrieve", "pull", "read", "collect", "api", "data", "from",
            "endpoint",
        ],
        AgentType::Orchestrator => &[
            "orchestrate",
            "coordinate",
            "manage",
            "combine",
            "workflow",
            "agents",
            "multiple",
            "parallel",
            "steps",
        ],
        AgentType::Specialist => &[
            "analyze",
            "process",
            "transform",
            "calculate",
            "determine",
            "generate",
            "create",
        ],
    }
}

/// A name check together with corrected spellings worth offering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameReport {
    #[serde(flatten)]
    pub report: ValidationReport,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDetection {
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub confidence: f64,
    /// Keyword hits per type, in `AgentType::ALL` order.
    pub scores: Vec<(AgentType, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelHint {
    pub should_be_parallel: bool,
    pub action_count: usize,
    pub confidence: f64,
}

fn report(errors: Vec<String>) -> ValidationReport {
    ValidationReport::new(errors, Vec::new())
}

fn length(s: &str) -> usize {
    s.chars().count()
}

/// Loose truthiness of a context field: absent, null, false, zero and the
/// empty string all count as missing.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn require(context: &Value, fields: &[&str], errors: &mut Vec<String>) {
    for field in fields {
        if !truthy(context.get(*field)) {
            errors.push(format!("Missing required field: {field}"));
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    // ─── Names ───────────────────────────────────────────────────────────────

    pub fn validate_department_name(&self, name: &str) -> ValidationReport {
        if name.is_empty() {
            return report(vec!["Department name is required".into()]);
        }
        let mut errors = Vec::new();
        if length(name) < 3 {
            errors.push("Department name must be at least 3 characters".into());
        }
        if length(name) > 30 {
            errors.push("Department name must be less than 30 characters".into());
        }
        if !KEBAB_CASE.is_match(name) {
            errors.push("Department name must be in kebab-case (lowercase, hyphens only)".into());
            errors.push("Examples: marketing, finance, customer-success".into());
        }
        report(errors)
    }

    pub fn validate_agent_name(&self, name: &str) -> NameReport {
        if name.is_empty() {
            return NameReport {
                report: report(vec!["Agent name is required".into()]),
                suggestions: Vec::new(),
            };
        }
        let mut errors = Vec::new();
        if length(name) < 3 {
            errors.push("Agent name must be at least 3 characters".into());
        }
        if length(name) > 50 {
            errors.push("Agent name must be less than 50 characters".into());
        }
        if !KEBAB_CASE.is_match(name) {
            errors.push("Agent name must be in kebab-case (lowercase, hyphens only)".into());
        }
        if name.split('-').count() < 2 {
            errors.push(
                "Agent name should follow action-noun pattern (e.g., data-fetcher, trend-analyzer, report-creator)"
                    .into(),
            );
        }
        NameReport {
            report: report(errors),
            suggestions: self.suggest_agent_name(name),
        }
    }

    pub fn validate_workflow_name(&self, name: &str) -> ValidationReport {
        if name.is_empty() {
            return report(vec!["Workflow name is required".into()]);
        }
        let mut errors = Vec::new();
        if length(name) < 3 {
            errors.push("Workflow name must be at least 3 characters".into());
        }
        if length(name) > 50 {
            errors.push("Workflow name must be less than 50 characters".into());
        }
        if !KEBAB_CASE.is_match(name) {
            errors.push("Workflow name must be in kebab-case (lowercase, hyphens only)".into());
            errors.push("Examples: daily-brief, weekly-report, monthly-summary".into());
        }
        report(errors)
    }

    pub fn validate_env_var_name(&self, name: &str) -> NameReport {
        if name.is_empty() {
            return NameReport {
                report: report(vec!["Environment variable name is required".into()]),
                suggestions: Vec::new(),
            };
        }
        let mut errors = Vec::new();
        if !UPPER_SNAKE_CASE.is_match(name) {
            errors.push("Environment variable must be in UPPER_SNAKE_CASE".into());
            errors.push("Examples: API_KEY, TWITTER_API_SECRET, DATABASE_URL".into());
        }
        NameReport {
            report: report(errors),
            suggestions: vec![upper_underscored(name)],
        }
    }

    // ─── Detection ───────────────────────────────────────────────────────────

    /// Guess an agent type from keywords in its description. Ties go to the
    /// earliest type in `AgentType::ALL`.
    pub fn detect_agent_type(&self, description: &str) -> Option<TypeDetection> {
        if description.is_empty() {
            return None;
        }
        let lower = description.to_lowercase();
        let scores: Vec<(AgentType, usize)> = AgentType::ALL
            .iter()
            .map(|&kind| {
                let hits = type_keywords(kind)
                    .iter()
                    .filter(|k| lower.contains(*k))
                    .count();
                (kind, hits)
            })
            .collect();

        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        if best == 0 {
            return None;
        }
        let kind = scores.iter().find(|(_, s)| *s == best)?.0;
        Some(TypeDetection {
            kind,
            confidence: best as f64 / type_keywords(kind).len() as f64,
            scores,
        })
    }

    pub fn detect_parallel_execution(&self, step_description: &str) -> ParallelHint {
        let lower = step_description.to_lowercase();
        let multiple = PARALLEL_INDICATORS.iter().any(|i| lower.contains(i));
        let action_count = ACTION_VERBS.iter().filter(|v| lower.contains(*v)).count();
        ParallelHint {
            should_be_parallel: multiple || action_count > 1,
            action_count,
            confidence: if multiple { 0.8 } else { 0.5 },
        }
    }

    // ─── Content ─────────────────────────────────────────────────────────────

    pub fn validate_description(
        &self,
        description: &str,
        min_length: usize,
        max_length: usize,
    ) -> ValidationReport {
        if description.is_empty() {
            return report(vec!["Description is required".into()]);
        }
        let mut errors = Vec::new();
        let len = length(description);
        if len < min_length {
            errors.push(format!(
                "Description must be at least {min_length} characters (currently {len})"
            ));
        }
        if len > max_length {
            errors.push(format!(
                "Description must be less than {max_length} characters (currently {len})"
            ));
        }
        let lower = description.to_lowercase();
        if GENERIC_PHRASES.iter().any(|p| lower.contains(p)) {
            errors.push(
                "Description appears to be generic or placeholder text. Please provide a specific description."
                    .into(),
            );
        }
        report(errors)
    }

    pub fn validate_url(&self, url: &str) -> ValidationReport {
        if url.is_empty() {
            return report(vec!["URL is required".into()]);
        }
        if URL.is_match(url) {
            report(Vec::new())
        } else {
            report(vec![
                "Invalid URL format. Must start with http:// or https://".into(),
            ])
        }
    }

    pub fn validate_schedule(&self, schedule: &str) -> ValidationReport {
        if schedule.is_empty() {
            return report(vec!["Schedule is required".into()]);
        }
        if SCHEDULES.iter().any(|re| re.is_match(schedule)) {
            return report(Vec::new());
        }
        report(
            [
                "Invalid schedule format",
                "Valid formats:",
                "  - daily HH:MM (e.g., daily 9:00)",
                "  - weekly DAY HH:MM (e.g., weekly monday 10:00)",
                "  - monthly Nth HH:MM (e.g., monthly 1st 08:00)",
                "  - hourly",
                "  - every N hours/minutes (e.g., every 4 hours)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }

    pub async fn validate_file_path(&self, path: &Path) -> ValidationReport {
        match tokio::fs::try_exists(path).await {
            Ok(true) => report(Vec::new()),
            _ => report(vec![format!(
                "File or directory does not exist: {}",
                path.display()
            )]),
        }
    }

    // ─── Contexts ────────────────────────────────────────────────────────────

    pub fn validate_agent_context(&self, context: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        require(
            context,
            &["name", "description", "department", "type"],
            &mut errors,
        );

        if truthy(context.get("name")) {
            match context["name"].as_str() {
                Some(name) => errors.extend(self.validate_agent_name(name).report.errors),
                None => errors.push("Agent name must be a string".into()),
            }
        }
        if let Some(description) = context.get("description").and_then(Value::as_str) {
            if !description.is_empty() {
                errors.extend(self.validate_description(description, 10, 500).errors);
            }
        }
        if truthy(context.get("type")) {
            let kind = &context["type"];
            let known = kind
                .as_str()
                .is_some_and(|k| k.parse::<AgentType>().is_ok());
            if !known {
                let shown = kind.as_str().map(str::to_string).unwrap_or_else(|| kind.to_string());
                errors.push(format!(
                    "Invalid agent type: {shown}. Must be data-fetcher, orchestrator, or specialist"
                ));
            }
        }
        match context.get("tools") {
            Some(Value::Array(tools)) if tools.is_empty() => {
                errors.push("At least one tool must be specified".into());
            }
            tools @ Some(_) if truthy(tools) && !tools.is_some_and(Value::is_array) => {
                errors.push("Tools must be an array".into());
            }
            _ => {}
        }
        if let Some(env_var) = context.get("envVar").and_then(Value::as_str) {
            if !env_var.is_empty() {
                errors.extend(self.validate_env_var_name(env_var).report.errors);
            }
        }
        if let Some(url) = context.get("apiUrl").and_then(Value::as_str) {
            if !url.is_empty() {
                errors.extend(self.validate_url(url).errors);
            }
        }
        report(errors)
    }

    pub fn validate_department_context(&self, context: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        require(context, &["name", "displayName", "description"], &mut errors);

        if let Some(name) = context.get("name").and_then(Value::as_str) {
            if !name.is_empty() {
                errors.extend(self.validate_department_name(name).errors);
            }
        }
        if let Some(description) = context.get("description").and_then(Value::as_str) {
            if !description.is_empty() {
                errors.extend(self.validate_description(description, 20, 500).errors);
            }
        }
        for (field, label) in [
            ("agents", "Agents"),
            ("workflows", "Workflows"),
            ("integrations", "Integrations"),
        ] {
            let value = context.get(field);
            if truthy(value) && !value.is_some_and(Value::is_array) {
                errors.push(format!("{label} must be an array"));
            }
        }
        report(errors)
    }

    pub fn validate_workflow_context(&self, context: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        require(
            context,
            &["name", "displayName", "description", "department", "steps"],
            &mut errors,
        );

        if let Some(name) = context.get("name").and_then(Value::as_str) {
            if !name.is_empty() {
                errors.extend(self.validate_workflow_name(name).errors);
            }
        }
        if let Some(description) = context.get("description").and_then(Value::as_str) {
            if !description.is_empty() {
                errors.extend(self.validate_description(description, 20, 500).errors);
            }
        }

        match context.get("steps") {
            Some(Value::Array(steps)) => {
                if steps.is_empty() {
                    errors.push("At least one step is required".into());
                } else if steps.len() > 15 {
                    errors.push("Maximum 15 steps allowed".into());
                }
                for (i, step) in steps.iter().enumerate() {
                    let step_no = i + 1;
                    let agents = step.get("agents").and_then(Value::as_array);
                    if agents.is_none_or(|a| a.is_empty()) {
                        errors.push(format!("Step {step_no}: must have at least one agent"));
                    }
                    for (j, agent) in agents.into_iter().flatten().enumerate() {
                        let agent_no = j + 1;
                        if !truthy(agent.get("name")) {
                            errors.push(format!(
                                "Step {step_no}, Agent {agent_no}: missing agent name"
                            ));
                        }
                        if !truthy(agent.get("prompt")) {
                            errors.push(format!("Step {step_no}, Agent {agent_no}: missing prompt"));
                        }
                    }
                }
            }
            steps if truthy(steps) => errors.push("Steps must be an array".into()),
            _ => {}
        }

        if let Some(trigger) = context.get("trigger").filter(|t| truthy(Some(t))) {
            let schedule = trigger.get("schedule");
            if trigger.get("type").and_then(Value::as_str) == Some("scheduled") && !truthy(schedule)
            {
                errors.push("Scheduled trigger must have a schedule".into());
            }
            if let Some(schedule) = schedule.and_then(Value::as_str) {
                if !schedule.is_empty() {
                    errors.extend(self.validate_schedule(schedule).errors);
                }
            }
        }
        report(errors)
    }

    // ─── Suggestions ─────────────────────────────────────────────────────────

    /// Up to three corrected names: the kebab-cased spelling, then action
    /// prefixes for single-word names.
    pub fn suggest_agent_name(&self, name: &str) -> Vec<String> {
        if name.is_empty() {
            return Vec::new();
        }
        let mut kebab = String::with_capacity(name.len());
        for c in name.to_lowercase().chars() {
            let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            };
            if !(c == '-' && kebab.ends_with('-')) {
                kebab.push(c);
            }
        }

        let mut suggestions = Vec::new();
        if kebab != name {
            suggestions.push(kebab.clone());
        }
        if !kebab.contains('-') {
            for action in ["data", "trend", "report", "content", "task"] {
                suggestions.push(format!("{action}-{kebab}"));
            }
        }
        let mut seen = std::collections::HashSet::new();
        suggestions.retain(|s| seen.insert(s.clone()));
        suggestions.truncate(3);
        suggestions
    }

    pub fn suggest_tools(&self, kind: Option<AgentType>, needs_api: bool) -> Vec<String> {
        let mut tools: Vec<String> = match kind {
            Some(AgentType::DataFetcher) => vec!["Bash", "Read"],
            Some(AgentType::Orchestrator) => vec!["Task", "Read", "Write"],
            Some(AgentType::Specialist) => vec!["Read", "Write", "Task"],
            None => vec!["Read", "Write"],
        }
        .into_iter()
        .map(String::from)
        .collect();
        if needs_api && !tools.iter().any(|t| t == "Bash") {
            tools.insert(0, "Bash".into());
        }
        tools
    }

    pub fn suggest_env_var_name(&self, department: &str, service: &str) -> String {
        format!(
            "{}_{}_KEY",
            upper_underscored(department),
            upper_underscored(service)
        )
    }
}

fn upper_underscored(s: &str) -> String {
    s.to_uppercase()
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}
