//! Story drafts: turn loosely typed form input into a [`UserStory`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Idea, Priority, StoryStatus, UserStory};

/// Planning-poker estimates accepted by the builder.
pub const ESTIMATE_SCALE: [u32; 7] = [1, 2, 3, 5, 8, 13, 21];

const PREVIEW_PROMPT: &str = "Complete the fields above to see your user story preview.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Estimate '{0}' is not on the scale 1, 2, 3, 5, 8, 13, 21 or '?'")]
    InvalidEstimate(String),
    #[error("A story needs a title or a feature description")]
    MissingTitle,
}

/// Form state for a story being written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: Option<String>,
    pub role: String,
    pub feature: String,
    pub benefit: String,
    pub acceptance_criteria: String,
    pub priority: Priority,
    /// Raw estimate as typed: a scale value, `?`, or empty.
    pub estimate: String,
    /// Comma-separated tags.
    pub tags: String,
    pub business_value: Option<u32>,
}

impl StoryDraft {
    /// Start a draft from a captured idea: its title, its description as the
    /// feature text and its tags.
    pub fn from_idea(idea: &Idea) -> Self {
        Self {
            title: Some(idea.title.clone()).filter(|t| !t.trim().is_empty()),
            feature: idea.description.clone(),
            tags: idea.tags.join(","),
            ..Default::default()
        }
    }

    /// "As a {role}, I want {feature} so that {benefit}." once all three are filled.
    pub fn preview(&self) -> String {
        let filled = |s: &str| !s.trim().is_empty();
        if !filled(&self.role) || !filled(&self.feature) || !filled(&self.benefit) {
            return PREVIEW_PROMPT.to_string();
        }
        format!(
            "As a {}, I want {} so that {}.",
            self.role.trim(),
            self.feature.trim(),
            self.benefit.trim()
        )
    }

    /// Parsed estimate: empty and `?` mean unknown (0 points).
    pub fn story_points(&self) -> Result<u32, DraftError> {
        parse_estimate(&self.estimate)
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    /// Build a draft-status, unassigned story.
    pub fn into_story(self, id: impl Into<String>, now: DateTime<Utc>) -> Result<UserStory, DraftError> {
        let story_points = self.story_points()?;
        let tags = self.tag_list();

        let title = match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ if !self.feature.trim().is_empty() => title_from_feature(&self.feature),
            _ => return Err(DraftError::MissingTitle),
        };

        Ok(UserStory {
            id: id.into(),
            title,
            role: self.role.trim().to_string(),
            feature: self.feature.trim().to_string(),
            benefit: self.benefit.trim().to_string(),
            acceptance_criteria: self.acceptance_criteria,
            status: StoryStatus::Draft,
            priority: self.priority,
            story_points,
            business_value: self.business_value.unwrap_or(0),
            tags,
            mvp_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

pub fn parse_estimate(raw: &str) -> Result<u32, DraftError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "?" {
        return Ok(0);
    }
    raw.parse::<u32>()
        .ok()
        .filter(|points| ESTIMATE_SCALE.contains(points))
        .ok_or_else(|| DraftError::InvalidEstimate(raw.to_string()))
}

/// Split on commas, trimming and dropping empties. Duplicates are kept.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Capitalize the first letter of the feature text.
fn title_from_feature(feature: &str) -> String {
    let feature = feature.trim();
    let mut chars = feature.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> StoryDraft {
        StoryDraft {
            role: "Customer".to_string(),
            feature: "search for products by name".to_string(),
            benefit: "I can quickly find what I'm looking for".to_string(),
            estimate: "8".to_string(),
            tags: "Search, Frontend, ,Search".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn preview_requires_the_three_parts() {
        assert_eq!(
            draft().preview(),
            "As a Customer, I want search for products by name so that I can quickly find what I'm looking for."
        );

        let mut partial = draft();
        partial.benefit = " ".to_string();
        assert_eq!(partial.preview(), PREVIEW_PROMPT);
    }

    #[test]
    fn estimates_follow_the_scale() {
        assert_eq!(parse_estimate("13"), Ok(13));
        assert_eq!(parse_estimate("?"), Ok(0));
        assert_eq!(parse_estimate(""), Ok(0));
        assert_eq!(
            parse_estimate("4"),
            Err(DraftError::InvalidEstimate("4".to_string()))
        );
        assert!(parse_estimate("-1").is_err());
    }

    #[test]
    fn into_story_builds_an_unassigned_draft() {
        let now = Utc::now();
        let story = draft().into_story("US-9", now).unwrap();
        assert_eq!(story.title, "Search for products by name");
        assert_eq!(story.status, StoryStatus::Draft);
        assert_eq!(story.story_points, 8);
        assert_eq!(story.tags, vec!["Search", "Frontend", "Search"]);
        assert_eq!(story.mvp_id, None);
        assert_eq!(story.created_at, now);
    }

    #[test]
    fn idea_seeds_title_feature_and_tags() {
        let mut idea = Idea::new("I1", "Dark mode", Utc::now());
        idea.description = "switch to a dark theme at night".to_string();
        idea.tags = vec!["UI".to_string(), "Accessibility".to_string()];

        let story = StoryDraft::from_idea(&idea).into_story("US-7", Utc::now()).unwrap();
        assert_eq!(story.title, "Dark mode");
        assert_eq!(story.feature, "switch to a dark theme at night");
        assert_eq!(story.tags, vec!["UI", "Accessibility"]);
        assert_eq!(story.story_points, 0);
    }

    #[test]
    fn explicit_title_wins_and_one_is_required() {
        let mut titled = draft();
        titled.title = Some("Product Search".to_string());
        assert_eq!(titled.into_story("US-1", Utc::now()).unwrap().title, "Product Search");

        let empty = StoryDraft::default();
        assert_eq!(
            empty.into_story("US-2", Utc::now()).unwrap_err(),
            DraftError::MissingTitle
        );
    }
}
