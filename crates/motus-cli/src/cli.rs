//! Clap CLI definitions for Motus.

use clap::{Parser, Subcommand, ValueEnum};
use motus_types::entity::{AgentType, DepartmentStatus, Integration, IntegrationKind, TriggerKind};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  motus department add --name finance --display-name Finance --description \"Budget and bills\"
  motus agent add --name budget-tracker --department finance --type data-fetcher \\
      --display-name \"Budget Tracker\" --description \"Tracks monthly budget usage\"
  motus workflow add --name monthly-review --department finance --agent budget-tracker \\
      --display-name \"Monthly Review\" --description \"Review the month\"
  motus validate --files        Check registry entries against generated files
  motus docs                    Regenerate org docs from the registry";

/// Motus: declarative registry for departments, agents and workflows.
#[derive(Parser)]
#[command(name = "motus", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file (default: ~/.motus/motus.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root, overriding `base_path` from the config file.
    #[arg(long, global = true)]
    pub base: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage departments (add, list, show) [*].
    #[command(subcommand)]
    Department(DepartmentCommands),
    /// Manage agents (add, list, show) [*].
    #[command(subcommand)]
    Agent(AgentCommands),
    /// Manage workflows (add, list, show) [*].
    #[command(subcommand)]
    Workflow(WorkflowCommands),
    /// Check referential integrity, and optionally generated files.
    Validate {
        /// Also check that every generated file exists.
        #[arg(long)]
        files: bool,
        /// Output as JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Regenerate missing definition files and scripts.
    Repair,
    /// Show registry statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Search names and descriptions across the registry.
    Search { query: String },
    /// Export the whole registry as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace registry collections from an export file.
    Import { file: PathBuf },
    /// Generate the commands reference and department docs.
    Docs,
    /// Inspect templates [*].
    #[command(subcommand)]
    Templates(TemplateCommands),
    /// Run naming and type checks without touching the registry [*].
    #[command(subcommand)]
    Check(CheckCommands),
}

#[derive(Subcommand)]
pub enum DepartmentCommands {
    /// Add a department and generate its admin agent.
    Add {
        /// Read the department from a JSON file instead of flags.
        #[arg(long, conflicts_with_all = ["name", "display_name", "description"])]
        file: Option<PathBuf>,
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        display_name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        description: Option<String>,
        /// Integration as NAME:TYPE[:ENV,ENV] (TYPE is api-key or oauth2). Repeatable.
        #[arg(long = "integration", value_parser = parse_integration)]
        integrations: Vec<Integration>,
    },
    /// List departments.
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        json: bool,
    },
    /// Show one department.
    Show { name: String },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Add an agent and generate its definition (and script for data-fetchers).
    Add {
        /// Read the agent from a JSON file instead of flags.
        #[arg(long, conflicts_with_all = ["name", "display_name", "department", "description"])]
        file: Option<PathBuf>,
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        display_name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        department: Option<String>,
        /// data-fetcher, orchestrator or specialist.
        #[arg(long = "type", required_unless_present = "file")]
        kind: Option<AgentType>,
        #[arg(long, required_unless_present = "file")]
        description: Option<String>,
        /// Tool the agent may use. Repeatable.
        #[arg(long = "tool")]
        tools: Vec<String>,
        #[arg(long)]
        model: Option<String>,
        /// Script path for data-fetchers, relative to the project root.
        #[arg(long)]
        script: Option<String>,
    },
    /// List agents.
    List {
        #[arg(long)]
        department: Option<String>,
        #[arg(long = "type")]
        kind: Option<AgentType>,
        #[arg(long)]
        json: bool,
    },
    /// Show one agent.
    Show { name: String },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Add a workflow to a department.
    Add {
        /// Read the workflow from a JSON file instead of flags.
        #[arg(long, conflicts_with_all = ["name", "display_name", "department", "description"])]
        file: Option<PathBuf>,
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        display_name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        department: Option<String>,
        #[arg(long, required_unless_present = "file")]
        description: Option<String>,
        /// Participating agent. Repeatable.
        #[arg(long = "agent")]
        agents: Vec<String>,
        #[arg(long)]
        orchestrator: Option<String>,
        /// Schedule such as "daily 9:00". Makes the trigger scheduled.
        #[arg(long)]
        schedule: Option<String>,
    },
    /// List workflows.
    List {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        trigger: Option<TriggerKind>,
        #[arg(long)]
        json: bool,
    },
    /// Show one workflow.
    Show { department: String, name: String },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List bundled and on-disk templates.
    List {
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Validate a name against the naming rules for its kind.
    Name {
        #[arg(value_enum)]
        kind: NameKind,
        value: String,
    },
    /// Guess the agent type a description suggests.
    Type { description: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for DepartmentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => DepartmentStatus::Active,
            StatusArg::Inactive => DepartmentStatus::Inactive,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NameKind {
    Department,
    Agent,
    Workflow,
    EnvVar,
}

/// Parse `NAME:TYPE[:ENV,ENV]`.
pub fn parse_integration(raw: &str) -> Result<Integration, String> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err("integration name is empty".into());
    }
    let kind = match parts.next().map(str::trim) {
        Some("api-key") | None => IntegrationKind::ApiKey,
        Some("oauth2") => IntegrationKind::OAuth2,
        Some(other) => {
            return Err(format!(
                "unknown integration type '{other}', expected api-key or oauth2"
            ))
        }
    };
    let env_vars = parts
        .next()
        .map(|vars| {
            vars.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Ok(Integration::new(name, kind, env_vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn integration_flag() {
        let i = parse_integration("Slack:oauth2:SLACK_CLIENT_ID, SLACK_CLIENT_SECRET").unwrap();
        assert_eq!(i.name, "Slack");
        assert!(i.is_oauth());
        assert_eq!(i.env_vars, vec!["SLACK_CLIENT_ID", "SLACK_CLIENT_SECRET"]);

        let i = parse_integration("Buffer").unwrap();
        assert_eq!(i.kind, IntegrationKind::ApiKey);
        assert!(i.env_vars.is_empty());

        assert!(parse_integration("X:smtp").is_err());
    }

    #[test]
    fn agent_add_parses_type() {
        let cli = Cli::try_parse_from([
            "motus",
            "agent",
            "add",
            "--name",
            "budget-tracker",
            "--display-name",
            "Budget Tracker",
            "--department",
            "finance",
            "--type",
            "data-fetcher",
            "--description",
            "Tracks monthly budget usage",
            "--tool",
            "Bash",
        ])
        .unwrap();
        let Commands::Agent(AgentCommands::Add { kind, tools, .. }) = cli.command else {
            panic!("expected agent add");
        };
        assert_eq!(kind, Some(AgentType::DataFetcher));
        assert_eq!(tools, vec!["Bash"]);

        assert!(Cli::try_parse_from(["motus", "agent", "list", "--type", "robot"]).is_err());
    }
}
