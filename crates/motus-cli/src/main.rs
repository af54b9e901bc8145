//! Motus CLI: manage the department, agent and workflow registry and the
//! files generated from it.
//!
//! Every command loads the registry from the project root, runs one
//! operation, and exits non-zero on failure.

mod cli;
mod cmd;
mod ui;

use crate::cli::*;
use clap::Parser;

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing_stderr();

    let ctx = cmd::Context {
        config: cli.config,
        base: cli.base,
    };

    match cli.command {
        Commands::Department(sub) => match sub {
            DepartmentCommands::Add {
                file,
                name,
                display_name,
                description,
                integrations,
            } => cmd::department::cmd_department_add(
                &ctx,
                file,
                name,
                display_name,
                description,
                integrations,
            ),
            DepartmentCommands::List { status, json } => {
                cmd::department::cmd_department_list(&ctx, status.map(Into::into), json)
            }
            DepartmentCommands::Show { name } => cmd::department::cmd_department_show(&ctx, &name),
        },
        Commands::Agent(sub) => match sub {
            AgentCommands::Add {
                file,
                name,
                display_name,
                department,
                kind,
                description,
                tools,
                model,
                script,
            } => {
                let input = cmd::agent::AgentInput {
                    name,
                    display_name,
                    department,
                    kind,
                    description,
                    tools,
                    model,
                    script,
                };
                cmd::agent::cmd_agent_add(&ctx, file, input)
            }
            AgentCommands::List {
                department,
                kind,
                json,
            } => cmd::agent::cmd_agent_list(&ctx, department, kind, json),
            AgentCommands::Show { name } => cmd::agent::cmd_agent_show(&ctx, &name),
        },
        Commands::Workflow(sub) => match sub {
            WorkflowCommands::Add {
                file,
                name,
                display_name,
                department,
                description,
                agents,
                orchestrator,
                schedule,
            } => {
                let input = cmd::workflow::WorkflowInput {
                    name,
                    display_name,
                    department,
                    description,
                    agents,
                    orchestrator,
                    schedule,
                };
                cmd::workflow::cmd_workflow_add(&ctx, file, input)
            }
            WorkflowCommands::List {
                department,
                trigger,
                json,
            } => cmd::workflow::cmd_workflow_list(&ctx, department, trigger, json),
            WorkflowCommands::Show { department, name } => {
                cmd::workflow::cmd_workflow_show(&ctx, &department, &name)
            }
        },
        Commands::Validate { files, json } => cmd::system::cmd_validate(&ctx, files, json),
        Commands::Repair => cmd::system::cmd_repair(&ctx),
        Commands::Stats { json } => cmd::system::cmd_stats(&ctx, json),
        Commands::Search { query } => cmd::system::cmd_search(&ctx, &query),
        Commands::Export { output } => cmd::system::cmd_export(&ctx, output),
        Commands::Import { file } => cmd::system::cmd_import(&ctx, &file),
        Commands::Docs => cmd::system::cmd_docs(&ctx),
        Commands::Templates(TemplateCommands::List { category }) => {
            cmd::templates::cmd_templates_list(&ctx, category.as_deref())
        }
        Commands::Check(sub) => match sub {
            CheckCommands::Name { kind, value } => cmd::check::cmd_check_name(kind, &value),
            CheckCommands::Type { description } => cmd::check::cmd_check_type(&description),
        },
    }
}
