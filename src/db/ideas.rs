//! Idea list operations. Ideas are kept newest first under [`IDEAS_KEY`].

use chrono::Utc;

use super::{Database, IDEAS_KEY};
use crate::error::{Result, StoreError};
use crate::models::{Idea, IdeaStatus, UpdateIdeaInput, UserStory};

impl Database {
    pub fn list_ideas(&self) -> Result<Vec<Idea>> {
        Ok(self.read_side_record(IDEAS_KEY)?.unwrap_or_default())
    }

    pub fn get_idea(&self, id: &str) -> Result<Option<Idea>> {
        Ok(self.list_ideas()?.into_iter().find(|i| i.id == id))
    }

    /// Insert `idea` at the top of the list.
    pub fn add_idea(&self, idea: Idea) -> Result<Idea> {
        self.modify_ideas(|ideas| {
            ideas.insert(0, idea.clone());
            Ok(Some(()))
        })?;
        tracing::debug!(id = %idea.id, "Added idea");
        Ok(idea)
    }

    pub fn update_idea(&self, id: &str, input: UpdateIdeaInput) -> Result<Option<Idea>> {
        self.modify_ideas(|ideas| {
            Ok(ideas.iter_mut().find(|i| i.id == id).map(|idea| {
                idea.apply(input, Utc::now());
                idea.clone()
            }))
        })
    }

    pub fn delete_idea(&self, id: &str) -> Result<bool> {
        let removed = self.modify_ideas(|ideas| {
            let before = ideas.len();
            ideas.retain(|i| i.id != id);
            Ok((ideas.len() != before).then_some(()))
        })?;
        Ok(removed.is_some())
    }

    /// Move an idea to `position` (0 is the top), clamped to the list.
    /// Returns the position it ended up at.
    pub fn move_idea(&self, id: &str, position: usize) -> Result<Option<usize>> {
        self.modify_ideas(|ideas| {
            let Some(from) = ideas.iter().position(|i| i.id == id) else {
                return Ok(None);
            };
            let idea = ideas.remove(from);
            let to = position.min(ideas.len());
            ideas.insert(to, idea);
            Ok(Some(to))
        })
    }

    /// Append `story` to the document and mark the idea as moved to it.
    ///
    /// The story is written before the idea. Fails without writing anything if
    /// the idea was already promoted.
    pub fn promote_idea(&self, id: &str, story: UserStory) -> Result<Option<(Idea, UserStory)>> {
        let _guard = self.lock();
        let mut ideas = self.list_ideas()?;
        let Some(idea) = ideas.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if idea.status == IdeaStatus::Moved || idea.story_id.is_some() {
            return Err(StoreError::IdeaAlreadyPromoted(idea.id.clone()));
        }

        self.modify_locked(|doc| {
            doc.stories.push(story.clone());
            Ok(Some(()))
        })?;

        idea.status = IdeaStatus::Moved;
        idea.story_id = Some(story.id.clone());
        idea.updated_at = Utc::now();
        let idea = idea.clone();
        self.write_ideas(&ideas)?;

        tracing::info!(idea = %idea.id, story = %story.id, "Promoted idea to story");
        Ok(Some((idea, story)))
    }

    /// Store `ideas` only if the list is empty. Returns whether it was written.
    pub fn seed_ideas_if_empty(&self, ideas: Vec<Idea>) -> Result<bool> {
        let seeded = self.modify_ideas(|current| {
            if !current.is_empty() {
                return Ok(None);
            }
            *current = ideas;
            Ok(Some(()))
        })?;
        Ok(seeded.is_some())
    }

    fn write_ideas(&self, ideas: &[Idea]) -> Result<()> {
        let raw = serde_json::to_string(ideas)?;
        self.store.set(IDEAS_KEY, &raw)
    }

    fn modify_ideas<R>(
        &self,
        f: impl FnOnce(&mut Vec<Idea>) -> Result<Option<R>>,
    ) -> Result<Option<R>> {
        let _guard = self.lock();
        let mut ideas = self.list_ideas()?;
        let outcome = f(&mut ideas)?;
        if outcome.is_some() {
            self.write_ideas(&ideas)?;
        }
        Ok(outcome)
    }
}
