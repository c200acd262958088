use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw feature idea captured before it is written up as a story.
///
/// Ideas live in their own record, newest first. Promoting an idea creates a
/// [`super::UserStory`] and marks the idea [`IdeaStatus::Moved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: IdeaStatus,
    /// Story created from this idea, once promoted.
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            author: String::new(),
            status: IdeaStatus::default(),
            story_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateIdeaInput, now: DateTime<Utc>) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(description) = input.description {
            self.description = description;
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(author) = input.author {
            self.author = author;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Triage state of an idea.
///
/// - `New`: Just captured
/// - `Reviewed`: Discussed, not yet written up
/// - `Moved`: Turned into a user story
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum IdeaStatus {
    #[default]
    New,
    Reviewed,
    Moved,
}

impl IdeaStatus {
    pub const ALL: [IdeaStatus; 3] = [Self::New, Self::Reviewed, Self::Moved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Moved => "moved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "reviewed" => Some(Self::Reviewed),
            "moved" => Some(Self::Moved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIdeaInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author: Option<String>,
    pub status: Option<IdeaStatus>,
}

impl UpdateIdeaInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.author.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_on_read() {
        let idea: Idea = serde_json::from_str(r#"{"id":"I1","title":"Dark mode"}"#).unwrap();
        assert_eq!(idea.status, IdeaStatus::New);
        assert!(idea.tags.is_empty());
        assert_eq!(idea.story_id, None);
    }

    #[test]
    fn status_uses_kebab_names() {
        for status in IdeaStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(IdeaStatus::from_str(status.as_str()), Some(status));
        }
    }
}
