//! Backlog grooming views: search, priority filter, status board and totals.

use std::cmp::Reverse;

use serde::Serialize;

use crate::models::{Priority, StoryStatus, UserStory};

/// Search and filter criteria for the backlog.
#[derive(Debug, Clone, Default)]
pub struct BacklogQuery {
    /// Case-insensitive term matched against title, feature, benefit and tags.
    pub search: Option<String>,
    /// `None` means all priorities.
    pub priority: Option<Priority>,
    pub status: Option<StoryStatus>,
    /// Restrict to one MVP, or to unassigned stories with `Some(None)`.
    pub mvp: Option<Option<String>>,
}

impl BacklogQuery {
    pub fn matches(&self, story: &UserStory) -> bool {
        if let Some(priority) = self.priority {
            if story.priority != priority {
                return false;
            }
        }
        if let Some(status) = self.status {
            if story.status != status {
                return false;
            }
        }
        if let Some(mvp) = &self.mvp {
            if story.mvp_id.as_deref() != mvp.as_deref() {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => matches_search(story, &term.to_lowercase()),
        }
    }

    pub fn apply<'a>(&self, stories: &'a [UserStory]) -> Vec<&'a UserStory> {
        stories.iter().filter(|s| self.matches(s)).collect()
    }
}

fn matches_search(story: &UserStory, needle: &str) -> bool {
    story.title.to_lowercase().contains(needle)
        || story.feature.to_lowercase().contains(needle)
        || story.benefit.to_lowercase().contains(needle)
        || story
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

/// Orderings offered by the backlog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Keep insertion order.
    #[default]
    Stored,
    /// Critical first.
    Priority,
    /// Highest business value first.
    BusinessValue,
    /// Largest estimate first.
    StoryPoints,
    /// Most recently updated first.
    Updated,
}

impl SortKey {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "stored" => Some(Self::Stored),
            "priority" => Some(Self::Priority),
            "value" => Some(Self::BusinessValue),
            "points" => Some(Self::StoryPoints),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// Stable sort, so ties keep insertion order.
pub fn sort_stories(stories: &mut [&UserStory], key: SortKey) {
    match key {
        SortKey::Stored => {}
        SortKey::Priority => stories.sort_by_key(|s| Reverse(s.priority)),
        SortKey::BusinessValue => stories.sort_by_key(|s| Reverse(s.business_value)),
        SortKey::StoryPoints => stories.sort_by_key(|s| Reverse(s.story_points)),
        SortKey::Updated => stories.sort_by_key(|s| Reverse(s.updated_at)),
    }
}

/// One status column of the grooming board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<'a> {
    pub status: StoryStatus,
    pub stories: Vec<&'a UserStory>,
}

/// Group stories into draft → groomed → ready-for-sprint columns, keeping order.
pub fn board<'a>(stories: &[&'a UserStory]) -> Vec<BoardColumn<'a>> {
    StoryStatus::ALL
        .iter()
        .map(|&status| BoardColumn {
            status,
            stories: stories
                .iter()
                .copied()
                .filter(|s| s.status == status)
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklogStats {
    pub total_stories: usize,
    pub sprint_ready: usize,
    pub total_points: u64,
    /// Rounded percentage of ready-for-sprint stories; 0 for an empty backlog.
    pub readiness_percent: u32,
}

pub fn stats(stories: &[&UserStory]) -> BacklogStats {
    let total_stories = stories.len();
    let sprint_ready = stories
        .iter()
        .filter(|s| s.status == StoryStatus::ReadyForSprint)
        .count();
    let total_points = stories.iter().map(|s| u64::from(s.story_points)).sum();

    BacklogStats {
        total_stories,
        sprint_ready,
        total_points,
        readiness_percent: percent(sprint_ready as f64, total_stories as f64),
    }
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
pub(crate) fn percent(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        0
    } else {
        (part / whole * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn story(id: &str, title: &str, priority: Priority, status: StoryStatus) -> UserStory {
        let mut story = UserStory::new(id, title, Utc::now());
        story.priority = priority;
        story.status = status;
        story
    }

    fn sample() -> Vec<UserStory> {
        let mut login = story("US-1", "User Login", Priority::High, StoryStatus::ReadyForSprint);
        login.tags = vec!["Authentication".to_string()];
        login.story_points = 3;
        let mut search = story("US-2", "Product Search", Priority::Medium, StoryStatus::Draft);
        search.feature = "search for products by name".to_string();
        search.story_points = 8;
        let mut cart = story("US-3", "Shopping Cart", Priority::Critical, StoryStatus::Groomed);
        cart.mvp_id = Some("mvp-2".to_string());
        cart.story_points = 5;
        vec![login, search, cart]
    }

    #[test]
    fn search_is_case_insensitive_across_fields_and_tags() {
        let stories = sample();
        let by_tag = BacklogQuery {
            search: Some("AUTH".to_string()),
            ..Default::default()
        };
        assert_eq!(by_tag.apply(&stories)[0].id, "US-1");

        let by_feature = BacklogQuery {
            search: Some("by name".to_string()),
            ..Default::default()
        };
        let ids: Vec<_> = by_feature.apply(&stories).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["US-2"]);

        let blank = BacklogQuery {
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.apply(&stories).len(), 3);
    }

    #[test]
    fn filters_combine() {
        let stories = sample();
        let query = BacklogQuery {
            priority: Some(Priority::Critical),
            mvp: Some(Some("mvp-2".to_string())),
            ..Default::default()
        };
        assert_eq!(query.apply(&stories).len(), 1);

        let unassigned = BacklogQuery {
            mvp: Some(None),
            ..Default::default()
        };
        assert_eq!(unassigned.apply(&stories).len(), 2);
    }

    #[test]
    fn board_groups_by_status_in_column_order() {
        let stories = sample();
        let refs: Vec<_> = stories.iter().collect();
        let columns = board(&refs);

        let layout: Vec<_> = columns
            .iter()
            .map(|c| (c.status, c.stories.iter().map(|s| s.id.as_str()).collect::<Vec<_>>()))
            .collect();
        assert_eq!(
            layout,
            vec![
                (StoryStatus::Draft, vec!["US-2"]),
                (StoryStatus::Groomed, vec!["US-3"]),
                (StoryStatus::ReadyForSprint, vec!["US-1"]),
            ]
        );
    }

    #[test]
    fn stats_round_readiness() {
        let stories = sample();
        let refs: Vec<_> = stories.iter().collect();
        assert_eq!(
            stats(&refs),
            BacklogStats {
                total_stories: 3,
                sprint_ready: 1,
                total_points: 16,
                readiness_percent: 33,
            }
        );
        assert_eq!(stats(&[]).readiness_percent, 0);
    }

    #[test]
    fn stats_total_survives_u32_overflow() {
        let mut stories = sample();
        stories[0].story_points = u32::MAX;
        stories[1].story_points = 1;
        stories[2].story_points = 0;
        let refs: Vec<_> = stories.iter().collect();
        assert_eq!(stats(&refs).total_points, 4_294_967_296);
    }

    #[test]
    fn sorting_is_stable_and_descending() {
        let mut stories = sample();
        stories[0].updated_at = Utc::now() - Duration::days(2);
        stories[2].updated_at = Utc::now() + Duration::days(1);

        let mut refs: Vec<_> = stories.iter().collect();
        sort_stories(&mut refs, SortKey::Priority);
        let ids: Vec<_> = refs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["US-3", "US-1", "US-2"]);

        sort_stories(&mut refs, SortKey::Updated);
        assert_eq!(refs[0].id, "US-3");
        assert_eq!(refs[2].id, "US-1");
    }
}
