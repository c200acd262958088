//! Export staging.
//!
//! File destinations (JSON, CSV) render content locally. Integration and
//! notification destinations are only staged: the request is logged and a
//! receipt returned, nothing is sent anywhere.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{StoryStatus, UserStory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Jira,
    Taiga,
    Trello,
    Json,
    Csv,
    Slack,
    Teams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    Integration,
    File,
    Notification,
}

impl Destination {
    pub const ALL: [Destination; 7] = [
        Self::Jira,
        Self::Taiga,
        Self::Trello,
        Self::Json,
        Self::Csv,
        Self::Slack,
        Self::Teams,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jira => "jira",
            Self::Taiga => "taiga",
            Self::Trello => "trello",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Slack => "slack",
            Self::Teams => "teams",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "jira" => Some(Self::Jira),
            "taiga" => Some(Self::Taiga),
            "trello" => Some(Self::Trello),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "slack" => Some(Self::Slack),
            "teams" => Some(Self::Teams),
            _ => None,
        }
    }

    pub fn kind(&self) -> DestinationKind {
        match self {
            Self::Jira | Self::Taiga | Self::Trello => DestinationKind::Integration,
            Self::Json | Self::Csv => DestinationKind::File,
            Self::Slack | Self::Teams => DestinationKind::Notification,
        }
    }
}

/// Which stories to export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExportScope {
    #[default]
    All,
    Mvp(String),
    ReadyForSprint,
}

pub fn select_stories(db: &Database, scope: &ExportScope) -> Result<Vec<UserStory>> {
    match scope {
        ExportScope::All => db.list_stories(),
        ExportScope::Mvp(id) => db.mvp_stories(id),
        ExportScope::ReadyForSprint => Ok(db
            .list_stories()?
            .into_iter()
            .filter(|s| s.status == StoryStatus::ReadyForSprint)
            .collect()),
    }
}

/// Record of a staged (never delivered) export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReceipt {
    pub destination: Destination,
    pub story_count: usize,
    pub staged_at: DateTime<Utc>,
    pub delivered: bool,
}

#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// Rendered file content for a file destination.
    File {
        destination: Destination,
        content: String,
        story_count: usize,
    },
    Staged(ExportReceipt),
}

pub fn export(
    stories: &[UserStory],
    destination: Destination,
    scope: &ExportScope,
) -> Result<ExportOutcome> {
    match destination {
        Destination::Json => Ok(ExportOutcome::File {
            destination,
            content: render_json(stories)?,
            story_count: stories.len(),
        }),
        Destination::Csv => Ok(ExportOutcome::File {
            destination,
            content: render_csv(stories),
            story_count: stories.len(),
        }),
        _ => {
            tracing::info!(
                destination = destination.as_str(),
                scope = ?scope,
                stories = stories.len(),
                "Export staged; no integration is configured to deliver it"
            );
            Ok(ExportOutcome::Staged(ExportReceipt {
                destination,
                story_count: stories.len(),
                staged_at: Utc::now(),
                delivered: false,
            }))
        }
    }
}

pub fn render_json(stories: &[UserStory]) -> Result<String> {
    Ok(serde_json::to_string_pretty(stories)?)
}

const CSV_HEADER: [&str; 13] = [
    "id",
    "title",
    "role",
    "feature",
    "benefit",
    "acceptance_criteria",
    "status",
    "priority",
    "story_points",
    "business_value",
    "tags",
    "mvp_id",
    "updated_at",
];

/// One header row plus one row per story. Tags are joined with `;`.
pub fn render_csv(stories: &[UserStory]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));
    for story in stories {
        push_row(
            &mut out,
            [
                story.id.clone(),
                story.title.clone(),
                story.role.clone(),
                story.feature.clone(),
                story.benefit.clone(),
                story.acceptance_criteria.clone(),
                story.status.as_str().to_string(),
                story.priority.as_str().to_string(),
                story.story_points.to_string(),
                story.business_value.to_string(),
                story.tags.join(";"),
                story.mvp_id.clone().unwrap_or_default(),
                story.updated_at.to_rfc3339(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row: Vec<String> = fields.into_iter().map(|f| csv_field(&f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
