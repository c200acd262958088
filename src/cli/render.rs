//! Plain-text rendering for terminal output.

use std::fmt::Write;

use crate::models::{Idea, IdeaStatus, MvpWithStories, StoryStatus, UserStory};
use crate::planning::backlog::{BacklogStats, BoardColumn};
use crate::planning::{Dashboard, MvpProgress, ReadinessReport, StoryReadiness};

const DRAFT: char = '◇';
const GROOMED: char = '○';
const READY: char = '●';

/// Get the status symbol for a story status.
fn status_symbol(status: StoryStatus) -> char {
    match status {
        StoryStatus::Draft => DRAFT,
        StoryStatus::Groomed => GROOMED,
        StoryStatus::ReadyForSprint => READY,
    }
}

fn points(n: u64) -> String {
    if n == 1 {
        "1 pt".to_string()
    } else {
        format!("{} pts", n)
    }
}

/// `● US-1 User Login (3 pts, high)`
pub fn story_line(story: &UserStory) -> String {
    format!(
        "{} {} {} ({}, {})",
        status_symbol(story.status),
        story.id,
        story.title,
        points(u64::from(story.story_points)),
        story.priority.as_str()
    )
}

pub fn story_list(stories: &[&UserStory]) -> String {
    if stories.is_empty() {
        return "No stories.\n".to_string();
    }
    let mut out = String::new();
    for story in stories {
        out.push_str(&story_line(story));
        out.push('\n');
    }
    out
}

pub fn story_detail(story: &UserStory, readiness: &StoryReadiness) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", story.id, story.title);
    let _ = writeln!(out, "  {}", story.narrative());
    let _ = writeln!(out, "  status:   {}", story.status.as_str());
    let _ = writeln!(out, "  priority: {}", story.priority.as_str());
    let _ = writeln!(out, "  points:   {}", story.story_points);
    let _ = writeln!(out, "  value:    {}", story.business_value);
    if !story.tags.is_empty() {
        let _ = writeln!(out, "  tags:     {}", story.tags.join(", "));
    }
    let _ = writeln!(
        out,
        "  mvp:      {}",
        story.mvp_id.as_deref().unwrap_or("(unassigned)")
    );
    if !story.acceptance_criteria.trim().is_empty() {
        let _ = writeln!(out, "  acceptance criteria:");
        for line in story.acceptance_criteria.lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }
    let _ = writeln!(out, "  readiness: {:.0}%", readiness.score);
    for check in &readiness.checks {
        let mark = if check.met { '✓' } else { '✗' };
        let _ = writeln!(out, "    {} {}", mark, check.criterion.label());
    }
    out
}

fn idea_symbol(status: IdeaStatus) -> char {
    match status {
        IdeaStatus::New => DRAFT,
        IdeaStatus::Reviewed => GROOMED,
        IdeaStatus::Moved => READY,
    }
}

/// `◇ idea-1 Dark mode [UI, Accessibility] by Mike`
pub fn idea_line(idea: &Idea) -> String {
    let mut line = format!("{} {} {}", idea_symbol(idea.status), idea.id, idea.title);
    if !idea.tags.is_empty() {
        let _ = write!(line, " [{}]", idea.tags.join(", "));
    }
    if !idea.author.is_empty() {
        let _ = write!(line, " by {}", idea.author);
    }
    if let Some(story_id) = &idea.story_id {
        let _ = write!(line, " -> {}", story_id);
    }
    line
}

pub fn idea_list(ideas: &[Idea]) -> String {
    if ideas.is_empty() {
        return "No ideas.\n".to_string();
    }
    let mut out = String::new();
    for (position, idea) in ideas.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}", position, idea_line(idea));
        if !idea.description.is_empty() {
            let _ = writeln!(out, "    {}", idea.description);
        }
    }
    out
}

/// Render MVPs as trees of their member stories, followed by the unassigned backlog.
///
/// Example output:
/// ```text
/// mvp-1 Core Authentication [planning] 8 pts
/// ├── ● US-1 User Login (3 pts, high)
/// └── ○ US-2 Password Reset (5 pts, medium)
/// Unassigned
/// └── ◇ US-3 Product Search (8 pts, medium)
/// ```
pub fn mvp_tree(views: &[MvpWithStories], unassigned: &[UserStory]) -> String {
    let mut output = String::new();
    for view in views {
        let _ = writeln!(
            output,
            "{} {} [{}] {}",
            view.mvp.id,
            view.mvp.name,
            view.mvp.status.as_str(),
            points(view.total_points())
        );
        render_children(&mut output, &view.stories);
    }
    if !unassigned.is_empty() {
        output.push_str("Unassigned\n");
        render_children(&mut output, unassigned);
    }
    if output.is_empty() {
        output.push_str("No MVPs.\n");
    }
    output
}

fn render_children(output: &mut String, stories: &[UserStory]) {
    for (i, story) in stories.iter().enumerate() {
        let branch = if i == stories.len() - 1 { "└── " } else { "├── " };
        output.push_str(branch);
        output.push_str(&story_line(story));
        output.push('\n');
    }
}

pub fn mvp_detail(view: &MvpWithStories, progress: &MvpProgress) -> String {
    let mut out = mvp_tree(std::slice::from_ref(view), &[]);
    if !view.mvp.description.is_empty() {
        let _ = writeln!(out, "  {}", view.mvp.description);
    }
    if !view.mvp.target_date.is_empty() {
        let _ = writeln!(out, "  target: {}", view.mvp.target_date);
    }
    let _ = writeln!(
        out,
        "  progress: {:.0}% ({} of {} ready)",
        progress.progress,
        points(progress.ready_points),
        points(progress.total_points)
    );
    out
}

pub fn board(columns: &[BoardColumn<'_>], stats: &BacklogStats) -> String {
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "{} ({})", column.status.as_str(), column.stories.len());
        for story in &column.stories {
            let _ = writeln!(out, "  {}", story_line(story));
        }
    }
    out.push_str(&stats_line(stats));
    out
}

pub fn stats_line(stats: &BacklogStats) -> String {
    format!(
        "{} stories, {} ready for sprint, {}, {}% ready\n",
        stats.total_stories,
        stats.sprint_ready,
        points(stats.total_points),
        stats.readiness_percent
    )
}

pub fn readiness(report: &ReadinessReport) -> String {
    let mut out = String::new();
    for story in &report.stories {
        let mark = if story.ready { READY } else { DRAFT };
        let _ = write!(out, "{} {} {} {:.0}%", mark, story.story_id, story.title, story.score);
        let unmet: Vec<&str> = story.unmet().map(|c| c.label()).collect();
        if !unmet.is_empty() {
            let _ = write!(out, " missing: {}", unmet.join(", "));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} ready, {} not ready, average {:.0}%",
        report.ready, report.not_ready, report.average_score
    );
    out
}

pub fn dashboard(dash: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Stories: {} ({} unassigned, {})",
        dash.total_stories,
        dash.unassigned_stories,
        points(dash.total_points)
    );
    for entry in &dash.stories_by_status {
        let _ = writeln!(out, "  {:<17}{}", entry.status.as_str(), entry.count);
    }
    let _ = writeln!(out, "MVPs: {}", dash.total_mvps);
    for entry in &dash.mvps_by_status {
        let _ = writeln!(out, "  {:<22}{}", entry.status.as_str(), entry.count);
    }
    let _ = writeln!(out, "Sprint readiness: {}%", dash.readiness_rate);
    for mvp in &dash.mvps {
        let _ = writeln!(
            out,
            "  {} {:.0}% ({} stories, {})",
            mvp.name,
            mvp.progress,
            mvp.story_count,
            points(mvp.total_points)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mvp, Priority};
    use chrono::Utc;

    fn story(id: &str, title: &str, status: StoryStatus, pts: u32) -> UserStory {
        let mut story = UserStory::new(id, title, Utc::now());
        story.status = status;
        story.story_points = pts;
        story
    }

    #[test]
    fn story_line_shows_symbol_points_and_priority() {
        let mut login = story("US-1", "User Login", StoryStatus::ReadyForSprint, 3);
        login.priority = Priority::High;
        assert_eq!(story_line(&login), "● US-1 User Login (3 pts, high)");
        assert_eq!(
            story_line(&story("US-2", "Tiny", StoryStatus::Draft, 1)),
            "◇ US-2 Tiny (1 pt, medium)"
        );
    }

    #[test]
    fn tree_lists_members_then_unassigned() {
        let mut login = story("US-1", "User Login", StoryStatus::ReadyForSprint, 3);
        login.mvp_id = Some("mvp-1".to_string());
        let mut reset = story("US-2", "Password Reset", StoryStatus::Groomed, 5);
        reset.mvp_id = Some("mvp-1".to_string());
        let search = story("US-3", "Product Search", StoryStatus::Draft, 8);
        let stories = vec![login, reset, search.clone()];

        let view = MvpWithStories::derive(Mvp::new("mvp-1", "Core Authentication", Utc::now()), &stories);
        let output = mvp_tree(&[view], &[search]);
        assert_eq!(
            output,
            "mvp-1 Core Authentication [planning] 8 pts\n\
             ├── ● US-1 User Login (3 pts, medium)\n\
             └── ○ US-2 Password Reset (5 pts, medium)\n\
             Unassigned\n\
             └── ◇ US-3 Product Search (8 pts, medium)\n"
        );
    }

    #[test]
    fn empty_tree_says_so() {
        assert_eq!(mvp_tree(&[], &[]), "No MVPs.\n");
    }

    #[test]
    fn totals_beyond_u32_render() {
        assert_eq!(points(u64::from(u32::MAX) + 1), "4294967296 pts");
    }

    #[test]
    fn ideas_list_with_position_and_promotion() {
        let mut idea = Idea::new("idea-1", "Dark mode", Utc::now());
        idea.tags = vec!["UI".to_string()];
        idea.author = "Mike".to_string();
        let mut moved = Idea::new("idea-2", "Social login", Utc::now());
        moved.status = IdeaStatus::Moved;
        moved.story_id = Some("US-4".to_string());

        assert_eq!(
            idea_list(&[idea, moved]),
            " 0. ◇ idea-1 Dark mode [UI] by Mike\n 1. ● idea-2 Social login -> US-4\n"
        );
        assert_eq!(idea_list(&[]), "No ideas.\n");
    }

    #[test]
    fn empty_mvp_has_no_children() {
        let view = MvpWithStories::derive(Mvp::new("mvp-9", "Later", Utc::now()), &[]);
        assert_eq!(mvp_tree(&[view], &[]), "mvp-9 Later [planning] 0 pts\n");
    }
}
