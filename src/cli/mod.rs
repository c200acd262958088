//! CLI argument definitions for storymap.

pub mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Backend;
use crate::export::Destination;
use crate::models::{IdeaStatus, MvpStatus, Priority, StoryStatus};
use crate::planning::{ReadinessFilter, SortKey};

/// storymap - capture user stories, group them into MVPs and check sprint readiness.
#[derive(Parser, Debug)]
#[command(name = "smap")]
#[command(author, version, about = "Local requirements management for user stories and MVPs", long_about = None)]
pub struct Cli {
    /// Print JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (defaults to <config dir>/storymap/config.json)
    #[arg(long, global = true, env = "STORYMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the data files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Key the document is stored under
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Fail on a corrupt document instead of treating it as empty
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// User story management
    Story {
        #[command(subcommand)]
        command: StoryCommands,
    },

    /// MVP management
    Mvp {
        #[command(subcommand)]
        command: MvpCommands,
    },

    /// Capture ideas and turn them into stories
    Idea {
        #[command(subcommand)]
        command: IdeaCommands,
    },

    /// Grooming view: filtered stories grouped by status, with totals
    Backlog {
        #[command(flatten)]
        filter: StoryFilterArgs,

        /// Group stories into status columns
        #[arg(long)]
        board: bool,
    },

    /// Sprint readiness checklist for each story
    Readiness {
        /// Which stories to show: all, ready or not-ready
        #[arg(long, default_value = "all", value_parser = parse_readiness_filter)]
        filter: ReadinessFilter,

        /// Only assess stories in this MVP
        #[arg(long)]
        mvp: Option<String>,

        /// Story ids with unresolved dependencies
        #[arg(long = "blocked")]
        blocked: Vec<String>,
    },

    /// Overview of stories, MVPs and readiness
    Dashboard,

    /// Export stories to a file format or stage them for an integration
    Export {
        /// jira, taiga, trello, json, csv, slack or teams
        #[arg(value_parser = parse_destination)]
        destination: Destination,

        /// Only export stories in this MVP
        #[arg(long, conflicts_with = "ready_only")]
        mvp: Option<String>,

        /// Only export stories that are ready for sprint
        #[arg(long)]
        ready_only: bool,

        /// Write file exports here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Remember who is using this workspace (cosmetic)
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "product-owner")]
        role: String,
    },

    /// Forget the remembered user
    Logout,

    /// Show the remembered user
    Whoami,

    /// Delete all stories and MVPs
    Reset {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Load sample stories, MVPs and ideas into an empty workspace
    Seed,

    /// Report on the stored document: origin, version and dangling references
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum StoryCommands {
    /// Create a story
    Add(StoryDraftArgs),

    /// Preview the "As a..., I want... so that..." sentence without saving
    Preview(StoryDraftArgs),

    /// List stories
    List {
        #[command(flatten)]
        filter: StoryFilterArgs,

        /// Sort order: stored, priority, value, points or updated
        #[arg(long, default_value = "stored", value_parser = parse_sort_key)]
        sort: SortKey,
    },

    /// Show one story
    Show { id: String },

    /// Change fields of a story
    Update {
        id: String,
        #[command(flatten)]
        fields: StoryUpdateArgs,
    },

    /// Delete a story
    Delete { id: String },

    /// Move a story into an MVP
    Assign { id: String, mvp: String },

    /// Move a story back to the unassigned backlog
    Unassign { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoryDraftArgs {
    /// Story title (defaults to the feature text)
    pub title: Option<String>,

    /// Story id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, default_value = "")]
    pub role: String,

    #[arg(long, default_value = "")]
    pub feature: String,

    #[arg(long, default_value = "")]
    pub benefit: String,

    #[arg(long, default_value = "")]
    pub acceptance: String,

    #[arg(long, default_value = "medium", value_parser = parse_priority)]
    pub priority: Priority,

    /// 1, 2, 3, 5, 8, 13, 21 or ?
    #[arg(long, default_value = "")]
    pub estimate: String,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Business value, 1-100
    #[arg(long)]
    pub value: Option<u32>,

    /// Initial status
    #[arg(long, value_parser = parse_story_status)]
    pub status: Option<StoryStatus>,

    /// Assign to this MVP on creation
    #[arg(long)]
    pub mvp: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoryUpdateArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub feature: Option<String>,
    #[arg(long)]
    pub benefit: Option<String>,
    #[arg(long)]
    pub acceptance: Option<String>,
    #[arg(long, value_parser = parse_story_status)]
    pub status: Option<StoryStatus>,
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub points: Option<u32>,
    #[arg(long)]
    pub value: Option<u32>,
    /// Replace tags with this comma-separated list
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoryFilterArgs {
    /// Match title, feature, benefit or tags (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    #[arg(long, value_parser = parse_story_status)]
    pub status: Option<StoryStatus>,

    /// Only stories in this MVP
    #[arg(long, conflicts_with = "unassigned")]
    pub mvp: Option<String>,

    /// Only stories not in any MVP
    #[arg(long)]
    pub unassigned: bool,
}

#[derive(Subcommand, Debug)]
pub enum MvpCommands {
    /// Create an MVP
    Add {
        name: String,
        /// MVP id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Target date, e.g. 2025-03-01
        #[arg(long, default_value = "")]
        target_date: String,
        #[arg(long, value_parser = parse_mvp_status)]
        status: Option<MvpStatus>,
    },

    /// List MVPs with their stories
    List,

    /// Show one MVP with its stories and progress
    Show { id: String },

    /// Change fields of an MVP
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        target_date: Option<String>,
        #[arg(long, value_parser = parse_mvp_status)]
        status: Option<MvpStatus>,
    },

    /// Delete an MVP; its stories return to the unassigned backlog
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum IdeaCommands {
    /// Capture an idea at the top of the list
    Add {
        title: String,
        /// Idea id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
        /// Defaults to the signed-in email
        #[arg(long)]
        author: Option<String>,
    },

    /// List ideas, newest first
    List {
        /// new, reviewed or moved
        #[arg(long, value_parser = parse_idea_status)]
        status: Option<IdeaStatus>,
    },

    /// Change fields of an idea
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replace tags with this comma-separated list
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, value_parser = parse_idea_status)]
        status: Option<IdeaStatus>,
    },

    /// Move an idea to a position in the list (0 is the top)
    Move { id: String, position: usize },

    /// Delete an idea
    Delete { id: String },

    /// Create a story from an idea and mark the idea as moved
    Promote {
        id: String,
        #[command(flatten)]
        story: PromoteArgs,
    },
}

/// Story fields that override what the idea supplies.
#[derive(Args, Debug, Clone, Default)]
pub struct PromoteArgs {
    /// Id of the new story (generated when omitted)
    #[arg(long = "story-id")]
    pub story_id: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub feature: Option<String>,
    #[arg(long)]
    pub benefit: Option<String>,
    #[arg(long)]
    pub acceptance: Option<String>,
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    /// 1, 2, 3, 5, 8, 13, 21 or ?
    #[arg(long)]
    pub estimate: Option<String>,
    #[arg(long)]
    pub value: Option<u32>,
    /// Assign the new story to this MVP
    #[arg(long)]
    pub mvp: Option<String>,
}

fn invalid(kind: &str, value: &str, allowed: &[&str]) -> String {
    format!("invalid {} '{}' (expected one of: {})", kind, value, allowed.join(", "))
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    Backend::from_str(s).ok_or_else(|| invalid("backend", s, &["sqlite", "file", "memory"]))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s).ok_or_else(|| {
        invalid(
            "priority",
            s,
            &Priority::ALL.map(|p| p.as_str()),
        )
    })
}

fn parse_story_status(s: &str) -> Result<StoryStatus, String> {
    StoryStatus::from_str(s)
        .ok_or_else(|| invalid("status", s, &StoryStatus::ALL.map(|p| p.as_str())))
}

fn parse_mvp_status(s: &str) -> Result<MvpStatus, String> {
    MvpStatus::from_str(s).ok_or_else(|| invalid("status", s, &MvpStatus::ALL.map(|p| p.as_str())))
}

fn parse_idea_status(s: &str) -> Result<IdeaStatus, String> {
    IdeaStatus::from_str(s).ok_or_else(|| invalid("status", s, &IdeaStatus::ALL.map(|p| p.as_str())))
}

fn parse_readiness_filter(s: &str) -> Result<ReadinessFilter, String> {
    ReadinessFilter::from_str(s).ok_or_else(|| invalid("filter", s, &["all", "ready", "not-ready"]))
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    SortKey::from_str(s).ok_or_else(|| {
        invalid(
            "sort",
            s,
            &["stored", "priority", "value", "points", "updated"],
        )
    })
}

fn parse_destination(s: &str) -> Result<Destination, String> {
    Destination::from_str(s)
        .ok_or_else(|| invalid("destination", s, &Destination::ALL.map(|d| d.as_str())))
}
