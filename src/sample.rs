//! Sample workspace loaded by `smap seed`.

use chrono::{DateTime, Duration, Utc};

use crate::models::*;

struct SampleStory {
    id: &'static str,
    title: &'static str,
    role: &'static str,
    feature: &'static str,
    benefit: &'static str,
    acceptance: &'static str,
    status: StoryStatus,
    priority: Priority,
    points: u32,
    value: u32,
    tags: &'static [&'static str],
    mvp: Option<&'static str>,
}

const STORIES: &[SampleStory] = &[
    SampleStory {
        id: "US-001",
        title: "Account Sign-up",
        role: "Visitor",
        feature: "register with my email address and a password",
        benefit: "my saved data follows me between devices",
        acceptance: "Given I am on the sign-up page\nWhen I submit a valid email and password\nThen a confirmation email is sent",
        status: StoryStatus::Groomed,
        priority: Priority::High,
        points: 5,
        value: 80,
        tags: &["Authentication", "Frontend"],
        mvp: Some("mvp-1"),
    },
    SampleStory {
        id: "US-002",
        title: "Sign In",
        role: "Member",
        feature: "sign in with my email and password",
        benefit: "I can reach my account securely",
        acceptance: "Given I have an account\nWhen I enter the right credentials\nThen I land on my dashboard",
        status: StoryStatus::ReadyForSprint,
        priority: Priority::Critical,
        points: 3,
        value: 90,
        tags: &["Authentication", "Security"],
        mvp: Some("mvp-1"),
    },
    SampleStory {
        id: "US-003",
        title: "Forgotten Password",
        role: "Member",
        feature: "reset a password I no longer remember",
        benefit: "I am not locked out of my account",
        acceptance: "",
        status: StoryStatus::Draft,
        priority: Priority::Medium,
        points: 3,
        value: 55,
        tags: &["Authentication", "Email"],
        mvp: Some("mvp-1"),
    },
    SampleStory {
        id: "US-004",
        title: "Catalog Browsing",
        role: "Shopper",
        feature: "page through every product in the catalog",
        benefit: "I can see what is on offer",
        acceptance: "Given I open the catalog\nWhen products exist\nThen they are listed twenty per page",
        status: StoryStatus::ReadyForSprint,
        priority: Priority::High,
        points: 8,
        value: 85,
        tags: &["Catalog", "Frontend"],
        mvp: Some("mvp-2"),
    },
    SampleStory {
        id: "US-005",
        title: "Catalog Search",
        role: "Shopper",
        feature: "search products by name or category",
        benefit: "I find what I came for quickly",
        acceptance: "Given I am in the catalog\nWhen I type a search term\nThen matching products are shown",
        status: StoryStatus::Groomed,
        priority: Priority::High,
        points: 5,
        value: 75,
        tags: &["Catalog", "Search"],
        mvp: Some("mvp-2"),
    },
    SampleStory {
        id: "US-006",
        title: "Order History",
        role: "Member",
        feature: "see the orders I placed before",
        benefit: "I can reorder or track a delivery",
        acceptance: "",
        status: StoryStatus::Draft,
        priority: Priority::Low,
        points: 0,
        value: 40,
        tags: &["Orders"],
        mvp: None,
    },
];

/// Sample stories spread over two MVPs plus one unassigned story.
pub fn document(now: DateTime<Utc>) -> Document {
    let stories = STORIES
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let created = now - Duration::hours((STORIES.len() - i) as i64);
            UserStory {
                id: s.id.to_string(),
                title: s.title.to_string(),
                role: s.role.to_string(),
                feature: s.feature.to_string(),
                benefit: s.benefit.to_string(),
                acceptance_criteria: s.acceptance.to_string(),
                status: s.status,
                priority: s.priority,
                story_points: s.points,
                business_value: s.value,
                tags: s.tags.iter().map(|t| t.to_string()).collect(),
                mvp_id: s.mvp.map(str::to_string),
                created_at: created,
                updated_at: created,
            }
        })
        .collect();

    let mut auth = Mvp::new("mvp-1", "Accounts", now);
    auth.description = "Sign-up, sign-in and recovery".to_string();
    auth.target_date = (now + Duration::weeks(4)).format("%Y-%m-%d").to_string();
    auth.status = MvpStatus::ReadyForSprint;

    let mut catalog = Mvp::new("mvp-2", "Catalog", now);
    catalog.description = "Browsing and finding products".to_string();
    catalog.target_date = (now + Duration::weeks(8)).format("%Y-%m-%d").to_string();

    Document {
        stories,
        mvps: vec![auth, catalog],
        ..Document::default()
    }
}

/// Sample ideas, newest first.
pub fn ideas(now: DateTime<Utc>) -> Vec<Idea> {
    let idea = |id: &str, title: &str, description: &str, tags: &[&str], author: &str, age_hours: i64| {
        let mut idea = Idea::new(id, title, now - Duration::hours(age_hours));
        idea.description = description.to_string();
        idea.tags = tags.iter().map(|t| t.to_string()).collect();
        idea.author = author.to_string();
        idea
    };

    let mut reviewed = idea(
        "idea-2",
        "Dark theme",
        "offer a dark colour scheme for evening use",
        &["UI", "Accessibility"],
        "Priya",
        26,
    );
    reviewed.status = IdeaStatus::Reviewed;

    vec![
        idea(
            "idea-1",
            "Saved payment details",
            "let returning shoppers pay without re-entering their card",
            &["Checkout", "UX"],
            "Tomas",
            2,
        ),
        reviewed,
    ]
}
