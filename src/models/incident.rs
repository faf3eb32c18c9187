use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::error::{AppError, Result};

/// An incident record as held by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Server-assigned identifier
    pub id: String,

    /// Short human-readable title
    pub title: String,

    /// Detailed description
    pub description: String,

    pub category: Category,

    pub status: Status,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Form values pre-filled from this record, for editing
    pub fn to_input(&self) -> IncidentInput {
        IncidentInput {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            status: self.status,
        }
    }

    /// Whether the record changed after creation
    pub fn was_updated(&self) -> bool {
        self.updated_at > self.created_at
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    Safety,
    Maintenance,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    #[strum(to_string = "In Progress", serialize = "in-progress", serialize = "in_progress")]
    InProgress,
    Success,
}

/// Body of create and update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IncidentInput {
    #[validate(length(min = 3, message = "Title must be at least 3 characters"))]
    pub title: String,

    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    pub category: Category,

    pub status: Status,
}

impl IncidentInput {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        status: Status,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            status,
        }
    }

    /// Run field validation, returning the field errors on failure
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(AppError::from)
    }
}
