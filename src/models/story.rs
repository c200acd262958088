use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single requirement: "As a `role`, I want `feature` so that `benefit`."
///
/// Stories are the owning side of the story/MVP relationship. `mvp_id` is a
/// plain lookup key into the MVP collection; `None` means the story sits in the
/// unassigned backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub benefit: String,
    #[serde(default)]
    pub acceptance_criteria: String,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub story_points: u32,
    /// Intended range is 1-100; not enforced.
    #[serde(default)]
    pub business_value: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mvp_id: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl UserStory {
    /// Build a story with the given id and title, everything else empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            role: String::new(),
            feature: String::new(),
            benefit: String::new(),
            acceptance_criteria: String::new(),
            status: StoryStatus::default(),
            priority: Priority::default(),
            story_points: 0,
            business_value: 0,
            tags: Vec::new(),
            mvp_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow-merge the `Some` fields of `input` and stamp `updated_at`.
    pub fn apply(&mut self, input: UpdateStoryInput, now: DateTime<Utc>) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(role) = input.role {
            self.role = role;
        }
        if let Some(feature) = input.feature {
            self.feature = feature;
        }
        if let Some(benefit) = input.benefit {
            self.benefit = benefit;
        }
        if let Some(acceptance_criteria) = input.acceptance_criteria {
            self.acceptance_criteria = acceptance_criteria;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(story_points) = input.story_points {
            self.story_points = story_points;
        }
        if let Some(business_value) = input.business_value {
            self.business_value = business_value;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(mvp_id) = input.mvp_id {
            self.mvp_id = mvp_id;
        }
        self.updated_at = now;
    }

    /// The canonical one-line rendering of the story.
    pub fn narrative(&self) -> String {
        format!(
            "As a {}, I want {} so that {}.",
            self.role, self.feature, self.benefit
        )
    }
}

/// Grooming status of a story. Transitions are caller-controlled.
///
/// - `Draft`: Captured, not yet refined
/// - `Groomed`: Refined with the team
/// - `ReadyForSprint`: Meets the readiness checklist and can be pulled into a sprint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatus {
    #[default]
    Draft,
    Groomed,
    ReadyForSprint,
}

impl StoryStatus {
    pub const ALL: [StoryStatus; 3] = [Self::Draft, Self::Groomed, Self::ReadyForSprint];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Groomed => "groomed",
            Self::ReadyForSprint => "ready-for-sprint",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "groomed" => Some(Self::Groomed),
            "ready-for-sprint" => Some(Self::ReadyForSprint),
            _ => None,
        }
    }
}

/// Story priority, ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Partial update for a story. `None` fields are left untouched.
///
/// `mvp_id` is doubly optional: `None` keeps the current assignment,
/// `Some(None)` clears it and `Some(Some(id))` reassigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryInput {
    pub title: Option<String>,
    pub role: Option<String>,
    pub feature: Option<String>,
    pub benefit: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub status: Option<StoryStatus>,
    pub priority: Option<Priority>,
    pub story_points: Option<u32>,
    pub business_value: Option<u32>,
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub mvp_id: Option<Option<String>>,
}

impl UpdateStoryInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.role.is_none()
            && self.feature.is_none()
            && self.benefit.is_none()
            && self.acceptance_criteria.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.story_points.is_none()
            && self.business_value.is_none()
            && self.tags.is_none()
            && self.mvp_id.is_none()
    }
}
