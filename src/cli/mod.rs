//! Command-line front end.

pub mod browse;
pub mod render;

use crate::client::ApiClient;
use crate::config::Config;
use crate::list::ListController;
use crate::models::{Category, Incident, IncidentInput, SortBy, SortOrder, Status};
use crate::service::{HttpIncidentService, IncidentService};
use crate::state::IncidentQueries;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(name = "incident-report")]
#[command(about = "Track safety and maintenance incidents", long_about = None)]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides configuration)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print results as JSON instead of cards
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List incidents
    List(ListArgs),

    /// Show one incident
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Report a new incident
    Create(CreateArgs),

    /// Change an incident; omitted fields keep their current value
    Update {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,

        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Delete an incident
    Delete {
        #[arg(value_name = "INCIDENT_ID")]
        id: String,
    },

    /// Interactive list with search, filters, paging and editing
    Browse,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Match against title or description
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(short, long)]
    pub category: Option<Category>,

    #[arg(short = 'S', long)]
    pub status: Option<Status>,

    #[arg(long, default_value_t = SortBy::CreatedAt)]
    pub sort_by: SortBy,

    #[arg(long, default_value_t = SortOrder::Desc)]
    pub sort_order: SortOrder,

    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Rows per page (defaults to the configured size)
    #[arg(short = 'n', long)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub title: String,

    #[arg(short, long)]
    pub description: String,

    #[arg(short, long)]
    pub category: Category,

    #[arg(short = 'S', long, default_value_t = Status::Open)]
    pub status: Status,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub category: Option<Category>,

    #[arg(short = 'S', long)]
    pub status: Option<Status>,
}

impl UpdateArgs {
    fn apply(self, mut input: IncidentInput) -> IncidentInput {
        if let Some(title) = self.title {
            input.title = title;
        }
        if let Some(description) = self.description {
            input.description = description;
        }
        if let Some(category) = self.category {
            input.category = category;
        }
        if let Some(status) = self.status {
            input.status = status;
        }
        input
    }
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(endpoint) = self.endpoint.as_ref().filter(|e| !e.trim().is_empty()) {
            config.api.base_url = endpoint.clone();
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }
    }
}

/// Execute a parsed command line against the configured API
pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let api = ApiClient::new(&config.api)?;
    let service: Arc<dyn IncidentService> = Arc::new(HttpIncidentService::new(api));
    let queries = Arc::new(IncidentQueries::new(service, &config.cache));
    let mut controller = ListController::new(Arc::clone(&queries), &config.list);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    execute(cli.command, cli.json, &queries, &mut controller, &mut out).await
}

/// Run one command, writing its output to `out`
pub async fn execute<W: Write>(
    command: Commands,
    json: bool,
    queries: &IncidentQueries,
    controller: &mut ListController,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => {
            controller.set_search_input(args.search.unwrap_or_default());
            controller.flush_search();
            controller.set_category(args.category);
            controller.set_status(args.status);
            controller.set_sort(args.sort_by, args.sort_order);
            if let Some(page_size) = args.page_size {
                controller.set_page_size(page_size);
            }
            controller.set_page(args.page);

            let page = controller.refresh().await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(page)?)?;
            } else {
                writeln!(out, "{}", render::page(page))?;
            }
        }

        Commands::Get { id } => {
            let incident = queries.get(&id).await?;
            print_incident(&incident, json, out)?;
        }

        Commands::Create(args) => {
            let input = IncidentInput::new(args.title, args.description, args.category, args.status);
            controller.open_create()?;
            let incident = submit(controller, input, out).await?;
            print_incident(&incident, json, out)?;
        }

        Commands::Update { id, fields } => {
            let current = queries.get(&id).await?;
            let input = fields.apply(current.to_input());
            controller.open_edit(current)?;
            let incident = submit(controller, input, out).await?;
            print_incident(&incident, json, out)?;
        }

        Commands::Delete { id } => {
            controller.open_delete(id)?;
            let result = controller.confirm_delete().await;
            report(controller, out)?;
            result?;
        }

        Commands::Browse => {
            let stdin = BufReader::new(tokio::io::stdin());
            browse::run(controller, stdin, out).await?;
        }
    }

    Ok(())
}

async fn submit<W: Write>(
    controller: &mut ListController,
    input: IncidentInput,
    out: &mut W,
) -> anyhow::Result<Incident> {
    let result = controller.submit_form(input).await;
    report(controller, out)?;
    Ok(result?)
}

fn print_incident<W: Write>(incident: &Incident, json: bool, out: &mut W) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(incident)?)?;
    } else {
        writeln!(out, "{}", render::card(incident))?;
    }
    Ok(())
}

fn report<W: Write>(controller: &mut ListController, out: &mut W) -> anyhow::Result<()> {
    if let Some(notification) = controller.take_notification() {
        writeln!(out, "{}", render::notification(&notification))?;
    }
    Ok(())
}
