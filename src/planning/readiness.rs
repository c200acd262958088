//! Sprint readiness: a fixed six-item checklist evaluated per story.
//!
//! Readiness is always recomputed from the story's fields and never stored.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::UserStory;

/// One item of the readiness checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    HasRole,
    HasFeature,
    HasBenefit,
    HasAcceptance,
    HasEstimate,
    NoDependencies,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Self::HasRole,
        Self::HasFeature,
        Self::HasBenefit,
        Self::HasAcceptance,
        Self::HasEstimate,
        Self::NoDependencies,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::HasRole => "Role Defined",
            Self::HasFeature => "Feature Described",
            Self::HasBenefit => "Benefit Explained",
            Self::HasAcceptance => "Acceptance Criteria",
            Self::HasEstimate => "Story Points",
            Self::NoDependencies => "No Blockers",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HasRole => "User role is specified",
            Self::HasFeature => "Feature/functionality is clear",
            Self::HasBenefit => "Value/benefit is articulated",
            Self::HasAcceptance => "Clear acceptance criteria exist",
            Self::HasEstimate => "Effort estimate is provided",
            Self::NoDependencies => "All dependencies are resolved",
        }
    }
}

/// Facts about a story that do not live on the story itself.
///
/// Stories carry no dependency list, so blocked stories are supplied here.
#[derive(Debug, Clone, Default)]
pub struct ReadinessContext {
    pub blocked_ids: HashSet<String>,
}

impl ReadinessContext {
    pub fn with_blocked<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked_ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CriterionResult {
    pub criterion: Criterion,
    pub met: bool,
}

/// Checklist outcome for one story.
#[derive(Debug, Clone, Serialize)]
pub struct StoryReadiness {
    pub story_id: String,
    pub title: String,
    pub checks: Vec<CriterionResult>,
    /// Percentage of criteria met, 0.0 to 100.0.
    pub score: f64,
    pub ready: bool,
}

impl StoryReadiness {
    pub fn unmet(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.checks.iter().filter(|c| !c.met).map(|c| c.criterion)
    }
}

fn is_filled(text: &str) -> bool {
    !text.trim().is_empty()
}

pub fn criterion_met(story: &UserStory, criterion: Criterion, ctx: &ReadinessContext) -> bool {
    match criterion {
        Criterion::HasRole => is_filled(&story.role),
        Criterion::HasFeature => is_filled(&story.feature),
        Criterion::HasBenefit => is_filled(&story.benefit),
        Criterion::HasAcceptance => is_filled(&story.acceptance_criteria),
        Criterion::HasEstimate => story.story_points > 0,
        Criterion::NoDependencies => !ctx.blocked_ids.contains(&story.id),
    }
}

pub fn assess(story: &UserStory, ctx: &ReadinessContext) -> StoryReadiness {
    let checks: Vec<CriterionResult> = Criterion::ALL
        .iter()
        .map(|&criterion| CriterionResult {
            criterion,
            met: criterion_met(story, criterion, ctx),
        })
        .collect();

    let met = checks.iter().filter(|c| c.met).count();
    let score = met as f64 / checks.len() as f64 * 100.0;

    StoryReadiness {
        story_id: story.id.clone(),
        title: story.title.clone(),
        ready: met == checks.len(),
        checks,
        score,
    }
}

/// Which stories a readiness report should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadinessFilter {
    #[default]
    All,
    Ready,
    NotReady,
}

impl ReadinessFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "ready" => Some(Self::Ready),
            "not-ready" => Some(Self::NotReady),
            _ => None,
        }
    }

    fn admits(&self, readiness: &StoryReadiness) -> bool {
        match self {
            Self::All => true,
            Self::Ready => readiness.ready,
            Self::NotReady => !readiness.ready,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub stories: Vec<StoryReadiness>,
    /// Counts over all assessed stories, before filtering.
    pub total: usize,
    pub ready: usize,
    pub not_ready: usize,
    pub average_score: f64,
}

pub fn report(
    stories: &[UserStory],
    ctx: &ReadinessContext,
    filter: ReadinessFilter,
) -> ReadinessReport {
    let assessed: Vec<StoryReadiness> = stories.iter().map(|s| assess(s, ctx)).collect();

    let total = assessed.len();
    let ready = assessed.iter().filter(|r| r.ready).count();
    let average_score = if total == 0 {
        0.0
    } else {
        assessed.iter().map(|r| r.score).sum::<f64>() / total as f64
    };

    ReadinessReport {
        stories: assessed.into_iter().filter(|r| filter.admits(r)).collect(),
        total,
        ready,
        not_ready: total - ready,
        average_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn complete_story(id: &str) -> UserStory {
        let mut story = UserStory::new(id, "User Registration", Utc::now());
        story.role = "User".to_string();
        story.feature = "create an account".to_string();
        story.benefit = "I can access personalized features".to_string();
        story.acceptance_criteria = "Given...\nWhen...\nThen...".to_string();
        story.story_points = 5;
        story
    }

    #[test]
    fn complete_story_is_ready() {
        let readiness = assess(&complete_story("US-1"), &ReadinessContext::default());
        assert!(readiness.ready);
        assert_eq!(readiness.score, 100.0);
        assert_eq!(readiness.unmet().count(), 0);
    }

    #[test]
    fn blank_fields_and_zero_points_count_as_unmet() {
        let mut story = complete_story("US-3");
        story.role = "   ".to_string();
        story.benefit.clear();
        story.story_points = 0;

        let readiness = assess(&story, &ReadinessContext::default());
        assert!(!readiness.ready);
        assert_eq!(readiness.score, 50.0);
        assert_eq!(
            readiness.unmet().collect::<Vec<_>>(),
            vec![Criterion::HasRole, Criterion::HasBenefit, Criterion::HasEstimate]
        );
    }

    #[test]
    fn blocked_stories_fail_the_dependency_check() {
        let ctx = ReadinessContext::with_blocked(["US-2"]);
        let readiness = assess(&complete_story("US-2"), &ctx);
        assert!(!readiness.ready);
        assert!((readiness.score - 500.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn report_counts_before_filtering() {
        let mut draft = complete_story("US-2");
        draft.acceptance_criteria.clear();
        let stories = vec![complete_story("US-1"), draft];

        let report = report(&stories, &ReadinessContext::default(), ReadinessFilter::NotReady);
        assert_eq!(report.total, 2);
        assert_eq!(report.ready, 1);
        assert_eq!(report.not_ready, 1);
        assert_eq!(report.stories.len(), 1);
        assert_eq!(report.stories[0].story_id, "US-2");
        assert!((report.average_score - (100.0 + 500.0 / 6.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_report_has_zero_average() {
        let report = report(&[], &ReadinessContext::default(), ReadinessFilter::All);
        assert_eq!(report.total, 0);
        assert_eq!(report.average_score, 0.0);
    }
}
