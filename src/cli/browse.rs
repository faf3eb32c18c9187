//! Interactive list session.
//!
//! Reads one command per line. Search text goes through the controller's
//! debounce slot; the loop sleeps until the slot's deadline and reloads the
//! list once the text settles.

use crate::error::AppError;
use crate::list::{ActionState, FormTarget, ListController};
use crate::models::{Category, IncidentInput, SortBy, SortOrder, Status};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{sleep_until, Instant};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::debug;

use super::render;

pub const HELP: &str = "\
Commands:
  search <text>            filter by title or description (empty clears)
  category <name|all>      safety, maintenance
  status <name|all>        open, in-progress, success
  sort <field> [asc|desc]  created_at, updated_at, title
  size <n>                 rows per page
  page <n> | next | prev
  new [<title> | <description> | <category> | <status>]
  edit <row> [<title> | <description> | <category> | <status>]
  submit <title> | <description> | <category> | <status>
  delete <row> | confirm | cancel
  refresh | help | quit";

/// Form values typed on one line, `|`-separated; blank parts are left unset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
}

impl FormFields {
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut parts = text.split('|').map(str::trim);
        let mut next = || parts.next().filter(|part| !part.is_empty());

        let title = next().map(str::to_string);
        let description = next().map(str::to_string);
        let category = next()
            .map(|c| Category::from_str(c).map_err(|_| format!("Unknown category '{}'", c)))
            .transpose()?;
        let status = next()
            .map(|s| Status::from_str(s).map_err(|_| format!("Unknown status '{}'", s)))
            .transpose()?;

        Ok(Self {
            title,
            description,
            category,
            status,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill the form: unset fields keep the values of `base`
    pub fn apply(self, base: Option<IncidentInput>) -> IncidentInput {
        let base = base.unwrap_or_else(|| {
            IncidentInput::new(String::new(), String::new(), Category::Safety, Status::Open)
        });
        IncidentInput {
            title: self.title.unwrap_or(base.title),
            description: self.description.unwrap_or(base.description),
            category: self.category.unwrap_or(base.category),
            status: self.status.unwrap_or(base.status),
        }
    }
}

/// One parsed line of input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Category(Option<Category>),
    Status(Option<Status>),
    Sort(SortBy, Option<SortOrder>),
    Size(u32),
    Page(u32),
    Next,
    Prev,
    New(FormFields),
    Edit(usize, FormFields),
    Submit(FormFields),
    Delete(usize),
    Confirm,
    Cancel,
    Refresh,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "category" => Command::Category(parse_filter(rest, "category")?),
            "status" => Command::Status(parse_filter(rest, "status")?),
            "sort" => {
                let mut args = rest.split_whitespace();
                let field = args.next().ok_or("Usage: sort <field> [asc|desc]")?;
                let sort_by =
                    SortBy::from_str(field).map_err(|_| format!("Unknown sort field '{}'", field))?;
                let order = args
                    .next()
                    .map(|o| SortOrder::from_str(o).map_err(|_| format!("Unknown sort order '{}'", o)))
                    .transpose()?;
                Command::Sort(sort_by, order)
            }
            "size" => Command::Size(parse_number(rest, "size")?),
            "page" => Command::Page(parse_number(rest, "page")?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "new" => Command::New(FormFields::parse(rest)?),
            "edit" => {
                let (row, fields) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Command::Edit(parse_row(row)?, FormFields::parse(fields)?)
            }
            "submit" => Command::Submit(FormFields::parse(rest)?),
            "delete" => Command::Delete(parse_row(rest)?),
            "confirm" | "y" => Command::Confirm,
            "cancel" => Command::Cancel,
            "refresh" | "r" | "" => Command::Refresh,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("Unknown command '{}'; type 'help'", other)),
        };
        Ok(command)
    }
}

fn parse_filter<T: FromStr>(text: &str, name: &str) -> Result<Option<T>, String> {
    if text.is_empty() || text.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    T::from_str(text)
        .map(Some)
        .map_err(|_| format!("Unknown {} '{}'", name, text))
}

fn parse_number(text: &str, name: &str) -> Result<u32, String> {
    text.parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("Usage: {} <positive number>", name))
}

/// Rows are shown 1-based
fn parse_row(text: &str) -> Result<usize, String> {
    text.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| n - 1)
        .ok_or_else(|| "Usage: <row number as shown in the list>".to_string())
}

enum Flow {
    Continue,
    Reload,
    Quit,
}

/// Run the session until `quit` or end of input
pub async fn run<R, W>(controller: &mut ListController, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = LinesStream::new(input.lines());
    writeln!(out, "Type 'help' for commands.")?;
    reload(controller, out).await?;

    loop {
        let deadline = controller.search_deadline();

        // Input first: a line typed at the deadline replaces the pending search.
        tokio::select! {
            biased;

            line = lines.next() => {
                let Some(line) = line else { break };
                match execute(controller, &line?, out).await? {
                    Flow::Continue => {}
                    Flow::Reload => reload(controller, out).await?,
                    Flow::Quit => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if controller.settle_search(Instant::now()) {
                    reload(controller, out).await?;
                }
            }
        }
    }

    Ok(())
}

async fn execute<W: Write>(
    controller: &mut ListController,
    line: &str,
    out: &mut W,
) -> anyhow::Result<Flow> {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(message) => {
            writeln!(out, "{}", message)?;
            return Ok(Flow::Continue);
        }
    };
    debug!(?command, "Browse command");

    let changed = match command {
        Command::Search(text) => {
            controller.set_search_input(text);
            false
        }
        Command::Category(category) => controller.set_category(category),
        Command::Status(status) => controller.set_status(status),
        Command::Sort(sort_by, order) => {
            let order = order.unwrap_or(controller.filters().sort_order);
            controller.set_sort(sort_by, order)
        }
        Command::Size(size) => controller.set_page_size(size),
        Command::Page(page) => controller.set_page(page),
        Command::Next => controller.next_page(),
        Command::Prev => controller.previous_page(),
        Command::New(fields) => {
            if let Err(err) = controller.open_create() {
                writeln!(out, "{}", render::error(&err))?;
                return Ok(Flow::Continue);
            }
            return submit_or_prompt(controller, fields, out).await;
        }
        Command::Edit(row, fields) => {
            let Some(incident) = controller.row(row).cloned() else {
                writeln!(out, "No row {} on this page", row + 1)?;
                return Ok(Flow::Continue);
            };
            if let Err(err) = controller.open_edit(incident) {
                writeln!(out, "{}", render::error(&err))?;
                return Ok(Flow::Continue);
            }
            return submit_or_prompt(controller, fields, out).await;
        }
        Command::Submit(fields) => return submit(controller, fields, out).await,
        Command::Delete(row) => {
            let Some(id) = controller.row(row).map(|incident| incident.id.clone()) else {
                writeln!(out, "No row {} on this page", row + 1)?;
                return Ok(Flow::Continue);
            };
            match controller.open_delete(id) {
                Ok(()) => show_action(controller, out)?,
                Err(err) => writeln!(out, "{}", render::error(&err))?,
            }
            return Ok(Flow::Continue);
        }
        Command::Confirm => {
            let result = controller.confirm_delete().await;
            return finish(controller, result, out);
        }
        Command::Cancel => {
            if let Err(err) = controller.cancel_action() {
                writeln!(out, "{}", render::error(&err))?;
            }
            return Ok(Flow::Continue);
        }
        Command::Refresh => true,
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Quit),
    };

    Ok(if changed { Flow::Reload } else { Flow::Continue })
}

async fn submit_or_prompt<W: Write>(
    controller: &mut ListController,
    fields: FormFields,
    out: &mut W,
) -> anyhow::Result<Flow> {
    if fields.is_empty() {
        show_action(controller, out)?;
        return Ok(Flow::Continue);
    }
    submit(controller, fields, out).await
}

async fn submit<W: Write>(
    controller: &mut ListController,
    fields: FormFields,
    out: &mut W,
) -> anyhow::Result<Flow> {
    let base = match controller.action() {
        ActionState::Form {
            target: FormTarget::Edit(incident),
            ..
        } => Some(incident.to_input()),
        _ => None,
    };

    let input = fields.apply(base);
    let result = controller.submit_form(input).await;
    finish(controller, result.map(|_| ()), out)
}

/// Report the outcome of a submission; a success reloads the list
fn finish<W: Write>(
    controller: &mut ListController,
    result: Result<(), AppError>,
    out: &mut W,
) -> anyhow::Result<Flow> {
    if let Some(notification) = controller.take_notification() {
        writeln!(out, "{}", render::notification(&notification))?;
    }

    match result {
        Ok(()) => Ok(Flow::Reload),
        Err(err @ AppError::Validation(_)) => {
            writeln!(out, "{}", render::error(&err))?;
            Ok(Flow::Continue)
        }
        Err(AppError::Api { .. } | AppError::Transport { .. }) => Ok(Flow::Continue),
        Err(err) => {
            writeln!(out, "{}", render::error(&err))?;
            Ok(Flow::Continue)
        }
    }
}

fn show_action<W: Write>(controller: &ListController, out: &mut W) -> anyhow::Result<()> {
    if let Some(prompt) = render::action(controller.action()) {
        writeln!(out, "{}", prompt)?;
    }
    Ok(())
}

async fn reload<W: Write>(controller: &mut ListController, out: &mut W) -> anyhow::Result<()> {
    let rendered = controller.refresh().await.map(render::page);
    match rendered {
        Ok(text) => writeln!(out, "{}", text)?,
        Err(_) => {
            if let Some(notification) = controller.take_notification() {
                writeln!(out, "{}", render::notification(&notification))?;
            }
        }
    }
    Ok(())
}
