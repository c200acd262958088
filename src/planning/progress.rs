//! MVP progress and dashboard summaries.

use serde::Serialize;

use super::backlog::percent;
use crate::models::{MvpStatus, MvpWithStories, Priority, StoryStatus, UserStory};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MvpProgress {
    pub mvp_id: String,
    pub name: String,
    pub status: MvpStatus,
    pub story_count: usize,
    pub total_points: u64,
    /// Points of member stories that are ready for sprint.
    pub ready_points: u64,
    /// `ready_points / total_points * 100`, 0 when there are no points.
    pub progress: f64,
    /// Member stories at high or critical priority.
    pub urgent_stories: usize,
}

pub fn mvp_progress(view: &MvpWithStories) -> MvpProgress {
    let total_points = view.total_points();
    let ready_points = view
        .stories
        .iter()
        .filter(|s| s.status == StoryStatus::ReadyForSprint)
        .map(|s| u64::from(s.story_points))
        .sum();
    let progress = if total_points > 0 {
        ready_points as f64 / total_points as f64 * 100.0
    } else {
        0.0
    };

    MvpProgress {
        mvp_id: view.mvp.id.clone(),
        name: view.mvp.name.clone(),
        status: view.mvp.status,
        story_count: view.stories.len(),
        total_points,
        ready_points,
        progress,
        urgent_stories: view
            .stories
            .iter()
            .filter(|s| s.priority >= Priority::High)
            .count(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub mvp_count: usize,
    pub requirements_complete: usize,
    pub assigned_stories: usize,
    pub total_points: u64,
    /// Rounded share of assigned stories at high or critical priority.
    pub urgent_percent: u32,
}

pub fn portfolio(views: &[MvpWithStories]) -> PortfolioSummary {
    let assigned_stories: usize = views.iter().map(|v| v.stories.len()).sum();
    let urgent: usize = views
        .iter()
        .flat_map(|v| v.stories.iter())
        .filter(|s| s.priority >= Priority::High)
        .count();

    PortfolioSummary {
        mvp_count: views.len(),
        requirements_complete: views
            .iter()
            .filter(|v| v.mvp.status == MvpStatus::RequirementsComplete)
            .count(),
        assigned_stories,
        total_points: views.iter().map(|v| v.total_points()).sum(),
        urgent_percent: percent(urgent as f64, assigned_stories as f64),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount<S> {
    pub status: S,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_stories: usize,
    pub stories_by_status: Vec<StatusCount<StoryStatus>>,
    pub total_mvps: usize,
    pub mvps_by_status: Vec<StatusCount<MvpStatus>>,
    pub unassigned_stories: usize,
    pub total_points: u64,
    /// Rounded percentage of stories that are ready for sprint.
    pub readiness_rate: u32,
    pub mvps: Vec<MvpProgress>,
}

pub fn dashboard(stories: &[UserStory], views: &[MvpWithStories]) -> Dashboard {
    let ready = stories
        .iter()
        .filter(|s| s.status == StoryStatus::ReadyForSprint)
        .count();

    Dashboard {
        total_stories: stories.len(),
        stories_by_status: StoryStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: stories.iter().filter(|s| s.status == status).count(),
            })
            .collect(),
        total_mvps: views.len(),
        mvps_by_status: MvpStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: views.iter().filter(|v| v.mvp.status == status).count(),
            })
            .collect(),
        unassigned_stories: stories.iter().filter(|s| s.mvp_id.is_none()).count(),
        total_points: stories.iter().map(|s| u64::from(s.story_points)).sum(),
        readiness_rate: percent(ready as f64, stories.len() as f64),
        mvps: views.iter().map(mvp_progress).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mvp;
    use chrono::Utc;

    fn member(id: &str, mvp: &str, points: u32, status: StoryStatus, priority: Priority) -> UserStory {
        let mut story = UserStory::new(id, id, Utc::now());
        story.mvp_id = Some(mvp.to_string());
        story.story_points = points;
        story.status = status;
        story.priority = priority;
        story
    }

    fn fixture() -> (Vec<UserStory>, Vec<MvpWithStories>) {
        let now = Utc::now();
        let stories = vec![
            member("US-1", "mvp-1", 5, StoryStatus::Groomed, Priority::High),
            member("US-2", "mvp-1", 3, StoryStatus::ReadyForSprint, Priority::High),
            member("US-3", "mvp-1", 2, StoryStatus::Draft, Priority::Medium),
            member("US-4", "mvp-2", 8, StoryStatus::Groomed, Priority::Critical),
            UserStory::new("US-5", "loose", now),
        ];
        let mut auth = Mvp::new("mvp-1", "Core Authentication", now);
        auth.status = MvpStatus::ReadyForSprint;
        let catalog = Mvp::new("mvp-2", "Product Catalog", now);
        let empty = Mvp::new("mvp-3", "Later", now);

        let views = vec![auth, catalog, empty]
            .into_iter()
            .map(|m| MvpWithStories::derive(m, &stories))
            .collect();
        (stories, views)
    }

    #[test]
    fn progress_is_ready_points_over_total() {
        let (_, views) = fixture();
        let progress = mvp_progress(&views[0]);
        assert_eq!(progress.story_count, 3);
        assert_eq!(progress.total_points, 10);
        assert_eq!(progress.ready_points, 3);
        assert!((progress.progress - 30.0).abs() < 1e-9);
        assert_eq!(progress.urgent_stories, 2);

        assert_eq!(mvp_progress(&views[2]).progress, 0.0);
    }

    #[test]
    fn ready_points_widen_past_u32() {
        let stories = vec![
            member("US-1", "mvp-1", u32::MAX, StoryStatus::ReadyForSprint, Priority::Low),
            member("US-2", "mvp-1", 1, StoryStatus::ReadyForSprint, Priority::Low),
        ];
        let view = MvpWithStories::derive(Mvp::new("mvp-1", "Big", Utc::now()), &stories);
        let progress = mvp_progress(&view);
        assert_eq!(progress.ready_points, 4_294_967_296);
        assert_eq!(progress.total_points, 4_294_967_296);
        assert!((progress.progress - 100.0).abs() < 1e-9);
        assert_eq!(dashboard(&stories, &[view]).total_points, 4_294_967_296);
    }

    #[test]
    fn portfolio_totals() {
        let (_, views) = fixture();
        let summary = portfolio(&views);
        assert_eq!(summary.mvp_count, 3);
        assert_eq!(summary.requirements_complete, 0);
        assert_eq!(summary.assigned_stories, 4);
        assert_eq!(summary.total_points, 18);
        assert_eq!(summary.urgent_percent, 75);
    }

    #[test]
    fn dashboard_counts() {
        let (stories, views) = fixture();
        let dash = dashboard(&stories, &views);
        assert_eq!(dash.total_stories, 5);
        assert_eq!(dash.unassigned_stories, 1);
        assert_eq!(dash.total_points, 18);
        assert_eq!(dash.readiness_rate, 20);
        assert_eq!(dash.stories_by_status[0].count, 2);
        assert_eq!(dash.mvps_by_status[0].count, 2);
        assert_eq!(dash.mvps_by_status[1].count, 1);
        assert_eq!(dash.mvps.len(), 3);
    }
}
