//! Plain-text rendering of incidents, pages and notifications.

use crate::error::AppError;
use crate::list::{ActionState, FormTarget, Notification, NotificationLevel, PageSummary};
use crate::models::{Incident, PaginatedResponse};
use std::fmt::Write;

const DATE_FORMAT: &str = "%b %d, %Y";
const PAGER_WIDTH: u32 = 5;

/// One incident as a card
pub fn card(incident: &Incident) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  [{}] [{}]",
        incident.title, incident.status, incident.category
    );
    let _ = writeln!(out, "  {}", incident.description);
    let _ = write!(
        out,
        "  Created {}",
        incident.created_at.format(DATE_FORMAT)
    );
    if incident.was_updated() {
        let _ = write!(out, "  Updated {}", incident.updated_at.format(DATE_FORMAT));
    }
    let _ = write!(out, "\n  id: {}", incident.id);
    out
}

/// A page of incidents with numbered rows and the pager footer
pub fn page(response: &PaginatedResponse<Incident>) -> String {
    let mut out = String::new();

    if response.is_empty() {
        out.push_str("No incidents found\n");
    }

    for (index, incident) in response.data.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", index + 1, indent(&card(incident), 5));
    }

    let summary = PageSummary::from_response(response);
    let _ = writeln!(out, "{}", summary);
    out.push_str(&pager(&summary));
    out
}

/// Pager line, e.g. `< prev  1 [2] 3  next >`
pub fn pager(summary: &PageSummary) -> String {
    if summary.total_pages == 0 {
        return String::new();
    }

    let pages: Vec<String> = summary
        .page_window(PAGER_WIDTH)
        .into_iter()
        .map(|page| {
            if page == summary.page {
                format!("[{}]", page)
            } else {
                page.to_string()
            }
        })
        .collect();

    format!(
        "{}  {}  {}",
        if summary.has_previous() { "< prev" } else { "      " },
        pages.join(" "),
        if summary.has_next() { "next >" } else { "" }
    )
    .trim_end()
    .to_string()
}

pub fn notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Success => format!("[ok] {}", notification.message),
        NotificationLevel::Error => format!("[error] {}", notification.message),
    }
}

/// Error text; validation failures are listed per field
pub fn error(err: &AppError) -> String {
    match err {
        AppError::Validation(failure) => failure
            .fields
            .iter()
            .map(|field| format!("  {}: {}", field.field, field.message))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.user_message(),
    }
}

/// Prompt for the open form or confirmation
pub fn action(action: &ActionState) -> Option<String> {
    match action {
        ActionState::Idle => None,
        ActionState::Form {
            target: FormTarget::Create,
            ..
        } => Some(
            "Create incident: submit <title> | <description> | <category> | <status>".to_string(),
        ),
        ActionState::Form {
            target: FormTarget::Edit(incident),
            ..
        } => Some(format!(
            "Edit incident: submit <title> | <description> | <category> | <status>\n  current: {} | {} | {} | {}",
            incident.title, incident.description, incident.category, incident.status
        )),
        ActionState::ConfirmDelete { id, .. } => Some(format!(
            "Delete incident {}? This action cannot be undone. Type 'confirm' or 'cancel'.",
            id
        )),
    }
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
