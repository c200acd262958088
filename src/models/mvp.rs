use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserStory;

/// A named grouping of stories representing a planned release increment.
///
/// Membership is recorded on [`UserStory::mvp_id`] only. An MVP never lists
/// its stories; use [`MvpWithStories`] for a derived view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mvp {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form target date, normally `YYYY-MM-DD`.
    #[serde(default)]
    pub target_date: String,
    #[serde(default)]
    pub status: MvpStatus,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Mvp {
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            target_date: String::new(),
            status: MvpStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow-merge the `Some` fields of `input` and stamp `updated_at`.
    pub fn apply(&mut self, input: UpdateMvpInput, now: DateTime<Utc>) {
        if let Some(name) = input.name {
            self.name = name;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(target_date) = input.target_date {
            self.target_date = target_date;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Planning status of an MVP.
///
/// - `Planning`: Scope still being decided
/// - `ReadyForSprint`: Enough stories are ready to start delivery
/// - `RequirementsComplete`: All requirements are captured and groomed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MvpStatus {
    #[default]
    Planning,
    ReadyForSprint,
    RequirementsComplete,
}

impl MvpStatus {
    pub const ALL: [MvpStatus; 3] = [
        Self::Planning,
        Self::ReadyForSprint,
        Self::RequirementsComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::ReadyForSprint => "ready-for-sprint",
            Self::RequirementsComplete => "requirements-complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planning" => Some(Self::Planning),
            "ready-for-sprint" => Some(Self::ReadyForSprint),
            "requirements-complete" => Some(Self::RequirementsComplete),
            _ => None,
        }
    }
}

/// Partial update for an MVP. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMvpInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<String>,
    pub status: Option<MvpStatus>,
}

/// An MVP with its member stories, derived by filtering on `mvp_id`.
///
/// The `mvp` fields are flattened into the JSON output, with an additional
/// `stories` array in story insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpWithStories {
    #[serde(flatten)]
    pub mvp: Mvp,
    pub stories: Vec<UserStory>,
}

impl MvpWithStories {
    /// Collect the members of `mvp` out of `stories`.
    pub fn derive(mvp: Mvp, stories: &[UserStory]) -> Self {
        let members = stories
            .iter()
            .filter(|s| s.mvp_id.as_deref() == Some(mvp.id.as_str()))
            .cloned()
            .collect();
        Self {
            mvp,
            stories: members,
        }
    }

    /// Sum of member story points, widened so large estimates cannot overflow.
    pub fn total_points(&self) -> u64 {
        self.stories.iter().map(|s| u64::from(s.story_points)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_picks_only_members_in_order() {
        let now = Utc::now();
        let mvp = Mvp::new("M1", "Auth", now);

        let mut a = UserStory::new("A", "a", now);
        a.mvp_id = Some("M1".to_string());
        a.story_points = 3;
        let b = UserStory::new("B", "b", now);
        let mut c = UserStory::new("C", "c", now);
        c.mvp_id = Some("M1".to_string());
        c.story_points = 5;
        let mut d = UserStory::new("D", "d", now);
        d.mvp_id = Some("M2".to_string());

        let view = MvpWithStories::derive(mvp, &[a, b, c, d]);
        let ids: Vec<_> = view.stories.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(view.total_points(), 8);
    }

    #[test]
    fn total_points_does_not_wrap() {
        let now = Utc::now();
        let mut big = UserStory::new("A", "a", now);
        big.mvp_id = Some("M1".to_string());
        big.story_points = u32::MAX;
        let mut one = UserStory::new("B", "b", now);
        one.mvp_id = Some("M1".to_string());
        one.story_points = 1;

        let view = MvpWithStories::derive(Mvp::new("M1", "Auth", now), &[big, one]);
        assert_eq!(view.total_points(), 4_294_967_296);
    }

    #[test]
    fn flattened_view_serializes_member_stories() {
        let now = Utc::now();
        let view = MvpWithStories::derive(Mvp::new("M1", "Auth", now), &[]);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["id"], "M1");
        assert_eq!(value["status"], "planning");
        assert!(value["stories"].as_array().unwrap().is_empty());
    }
}
