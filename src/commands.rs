//! Command handlers behind the `smap` binary.
//!
//! Each handler reads or mutates through [`Database`] and writes either
//! human-readable text or JSON to the supplied writer.

use std::fs;
use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::cli::{
    render, Cli, Commands, IdeaCommands, MvpCommands, PromoteArgs, StoryCommands, StoryDraftArgs,
    StoryFilterArgs, StoryUpdateArgs,
};
use crate::config::StorymapConfig;
use crate::db::{CorruptPolicy, Database};
use crate::export::{self, ExportOutcome, ExportScope};
use crate::models::*;
use crate::planning::builder::parse_tags;
use crate::planning::{backlog, progress, readiness, BacklogQuery, ReadinessContext, StoryDraft};
use crate::sample;

/// Output settings shared by every handler.
pub struct Output<'a, W: Write> {
    pub writer: &'a mut W,
    pub json: bool,
}

impl<W: Write> Output<'_, W> {
    fn emit<T: Serialize>(&mut self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value)?;
            writeln!(self.writer, "{}", rendered)?;
        } else {
            write!(self.writer, "{}", text())?;
        }
        Ok(())
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn resolve_config(cli: &Cli) -> StorymapConfig {
    let mut config = StorymapConfig::load(cli.config.as_deref());
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(key) = &cli.key {
        config.storage_key = key.clone();
    }
    if cli.strict {
        config.corrupt_policy = CorruptPolicy::Fail;
    }
    config
}

pub fn run<W: Write>(command: Commands, db: &Database, out: &mut Output<'_, W>) -> Result<()> {
    match command {
        Commands::Story { command } => run_story(command, db, out),
        Commands::Mvp { command } => run_mvp(command, db, out),
        Commands::Idea { command } => run_idea(command, db, out),
        Commands::Backlog { filter, board } => backlog_view(db, &filter, board, out),
        Commands::Readiness {
            filter,
            mvp,
            blocked,
        } => {
            let stories = match &mvp {
                Some(id) => {
                    require_mvp(db, id)?;
                    db.mvp_stories(id)?
                }
                None => db.list_stories()?,
            };
            let ctx = ReadinessContext::with_blocked(blocked);
            let report = readiness::report(&stories, &ctx, filter);
            out.emit(&report, || render::readiness(&report))
        }
        Commands::Dashboard => {
            let stories = db.list_stories()?;
            let views = db.list_mvps_with_stories()?;
            let dash = progress::dashboard(&stories, &views);
            out.emit(&dash, || render::dashboard(&dash))
        }
        Commands::Export {
            destination,
            mvp,
            ready_only,
            out: path,
        } => {
            let scope = match mvp {
                Some(id) => {
                    require_mvp(db, &id)?;
                    ExportScope::Mvp(id)
                }
                None if ready_only => ExportScope::ReadyForSprint,
                None => ExportScope::All,
            };
            let stories = export::select_stories(db, &scope)?;
            match export::export(&stories, destination, &scope)? {
                ExportOutcome::File {
                    destination,
                    content,
                    story_count,
                } => match path {
                    Some(path) => {
                        fs::write(&path, content)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        let summary = json!({
                            "destination": destination,
                            "storyCount": story_count,
                            "path": path,
                        });
                        out.emit(&summary, || {
                            format!(
                                "Wrote {} stories as {} to {}\n",
                                story_count,
                                destination.as_str(),
                                path.display()
                            )
                        })
                    }
                    None => {
                        out.writer.write_all(content.as_bytes())?;
                        Ok(())
                    }
                },
                ExportOutcome::Staged(receipt) => out.emit(&receipt, || {
                    format!(
                        "Staged {} stories for {}; nothing was sent (no integration configured)\n",
                        receipt.story_count,
                        receipt.destination.as_str()
                    )
                }),
            }
        }
        Commands::Login { email, role } => {
            let profile = Profile {
                email,
                role,
                signed_in_at: Some(Utc::now()),
            };
            db.save_profile(&profile)?;
            out.emit(&profile, || {
                format!("Signed in as {} ({})\n", profile.email, profile.role)
            })
        }
        Commands::Logout => {
            db.clear_profile()?;
            out.emit(&json!({ "signedIn": false }), || "Signed out\n".to_string())
        }
        Commands::Whoami => {
            let profile = db.profile()?;
            out.emit(&profile, || match &profile {
                Some(p) => format!("{} ({})\n", p.email, p.role),
                None => "Not signed in\n".to_string(),
            })
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("Refusing to delete all stories and MVPs without --yes");
            }
            db.clear_all()?;
            out.emit(&json!({ "reset": true }), || {
                "Deleted all stories and MVPs\n".to_string()
            })
        }
        Commands::Seed => {
            let now = Utc::now();
            let document = sample::document(now);
            let counts = (document.stories.len(), document.mvps.len());
            let seeded_document = db.seed_if_empty(document)?;
            let seeded_ideas = db.seed_ideas_if_empty(sample::ideas(now))?;
            out.emit(
                &json!({ "stories": seeded_document, "ideas": seeded_ideas }),
                || {
                    let mut text = if seeded_document {
                        format!("Loaded {} sample stories in {} MVPs\n", counts.0, counts.1)
                    } else {
                        "Stories or MVPs already exist; left them alone\n".to_string()
                    };
                    text.push_str(if seeded_ideas {
                        "Loaded sample ideas\n"
                    } else {
                        "Ideas already exist; left them alone\n"
                    });
                    text
                },
            )
        }
        Commands::Doctor => doctor(db, out),
    }
}

fn run_story<W: Write>(command: StoryCommands, db: &Database, out: &mut Output<'_, W>) -> Result<()> {
    match command {
        StoryCommands::Add(args) => {
            let status = args.status;
            let mvp = args.mvp.clone();
            let id = args.id.clone().unwrap_or_else(|| generate_id("US"));
            let mut story = draft_from_args(args).into_story(id, Utc::now())?;
            if let Some(status) = status {
                story.status = status;
            }
            if let Some(mvp) = mvp {
                require_mvp(db, &mvp)?;
                story.mvp_id = Some(mvp);
            }

            let story = db.add_story(story)?;
            out.emit(&story, || {
                format!("Created {}\n  {}\n", render::story_line(&story), story.narrative())
            })
        }
        StoryCommands::Preview(args) => {
            let draft = draft_from_args(args);
            let preview = draft.preview();
            let points = draft.story_points()?;
            out.emit(
                &json!({ "preview": preview, "storyPoints": points, "tags": draft.tag_list() }),
                || format!("{}\n", preview),
            )
        }
        StoryCommands::List { filter, sort } => {
            let stories = db.list_stories()?;
            let mut selected = query_from_args(&filter).apply(&stories);
            backlog::sort_stories(&mut selected, sort);
            out.emit(&selected, || render::story_list(&selected))
        }
        StoryCommands::Show { id } => {
            let story = require_story(db, &id)?;
            let assessed = readiness::assess(&story, &ReadinessContext::default());
            out.emit(&story, || render::story_detail(&story, &assessed))
        }
        StoryCommands::Update { id, fields } => {
            let input = update_from_args(fields);
            if input.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let Some(story) = db.update_story(&id, input)? else {
                bail!("Story not found: {}", id);
            };
            out.emit(&story, || format!("Updated {}\n", render::story_line(&story)))
        }
        StoryCommands::Delete { id } => {
            if !db.delete_story(&id)? {
                bail!("Story not found: {}", id);
            }
            out.emit(&json!({ "deleted": id }), || format!("Deleted story {}\n", id))
        }
        StoryCommands::Assign { id, mvp } => {
            let Some(story) = db.assign_story(&id, Some(&mvp))? else {
                bail!("Story not found: {}", id);
            };
            out.emit(&story, || format!("Assigned {} to {}\n", story.id, mvp))
        }
        StoryCommands::Unassign { id } => {
            let Some(story) = db.assign_story(&id, None)? else {
                bail!("Story not found: {}", id);
            };
            out.emit(&story, || format!("Moved {} to the unassigned backlog\n", story.id))
        }
    }
}

fn run_mvp<W: Write>(command: MvpCommands, db: &Database, out: &mut Output<'_, W>) -> Result<()> {
    match command {
        MvpCommands::Add {
            name,
            id,
            description,
            target_date,
            status,
        } => {
            let id = id.unwrap_or_else(|| generate_id("MVP"));
            let mut mvp = Mvp::new(id, name, Utc::now());
            mvp.description = description;
            mvp.target_date = target_date;
            mvp.status = status.unwrap_or_default();

            let mvp = db.add_mvp(mvp)?;
            out.emit(&mvp, || format!("Created MVP {} {}\n", mvp.id, mvp.name))
        }
        MvpCommands::List => {
            let views = db.list_mvps_with_stories()?;
            if out.json {
                return out.emit(&views, String::new);
            }
            let unassigned = db.unassigned_stories()?;
            out.emit(&views, || render::mvp_tree(&views, &unassigned))
        }
        MvpCommands::Show { id } => {
            let Some(view) = db.get_mvp_with_stories(&id)? else {
                bail!("MVP not found: {}", id);
            };
            let progress = progress::mvp_progress(&view);
            out.emit(&json!({ "mvp": view, "progress": progress }), || {
                render::mvp_detail(&view, &progress)
            })
        }
        MvpCommands::Update {
            id,
            name,
            description,
            target_date,
            status,
        } => {
            let input = UpdateMvpInput {
                name,
                description,
                target_date,
                status,
            };
            let Some(mvp) = db.update_mvp(&id, input)? else {
                bail!("MVP not found: {}", id);
            };
            out.emit(&mvp, || format!("Updated MVP {} {}\n", mvp.id, mvp.name))
        }
        MvpCommands::Delete { id } => {
            let Some(unassigned) = db.delete_mvp(&id)? else {
                bail!("MVP not found: {}", id);
            };
            out.emit(&json!({ "deleted": id, "unassigned": unassigned }), || {
                format!(
                    "Deleted MVP {}; {} stories returned to the backlog\n",
                    id, unassigned
                )
            })
        }
    }
}

fn run_idea<W: Write>(command: IdeaCommands, db: &Database, out: &mut Output<'_, W>) -> Result<()> {
    match command {
        IdeaCommands::Add {
            title,
            id,
            description,
            tags,
            author,
        } => {
            let author = match author {
                Some(author) => author,
                None => db
                    .profile()?
                    .map(|p| p.email)
                    .unwrap_or_else(|| "You".to_string()),
            };
            let mut idea = Idea::new(id.unwrap_or_else(|| generate_id("IDEA")), title, Utc::now());
            idea.description = description;
            idea.tags = parse_tags(&tags);
            idea.author = author;

            let idea = db.add_idea(idea)?;
            out.emit(&idea, || format!("Captured {}\n", render::idea_line(&idea)))
        }
        IdeaCommands::List { status } => {
            let ideas: Vec<Idea> = db
                .list_ideas()?
                .into_iter()
                .filter(|i| status.map_or(true, |s| i.status == s))
                .collect();
            out.emit(&ideas, || render::idea_list(&ideas))
        }
        IdeaCommands::Update {
            id,
            title,
            description,
            tags,
            author,
            status,
        } => {
            let input = UpdateIdeaInput {
                title,
                description,
                tags: tags.as_deref().map(parse_tags),
                author,
                status,
            };
            if input.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            let Some(idea) = db.update_idea(&id, input)? else {
                bail!("Idea not found: {}", id);
            };
            out.emit(&idea, || format!("Updated {}\n", render::idea_line(&idea)))
        }
        IdeaCommands::Move { id, position } => {
            let Some(position) = db.move_idea(&id, position)? else {
                bail!("Idea not found: {}", id);
            };
            out.emit(&json!({ "moved": id, "position": position }), || {
                format!("Moved idea {} to position {}\n", id, position)
            })
        }
        IdeaCommands::Delete { id } => {
            if !db.delete_idea(&id)? {
                bail!("Idea not found: {}", id);
            }
            out.emit(&json!({ "deleted": id }), || format!("Deleted idea {}\n", id))
        }
        IdeaCommands::Promote { id, story } => {
            let Some(idea) = db.get_idea(&id)? else {
                bail!("Idea not found: {}", id);
            };
            if let Some(mvp) = &story.mvp {
                require_mvp(db, mvp)?;
            }
            let mvp = story.mvp.clone();
            let story_id = story.story_id.clone().unwrap_or_else(|| generate_id("US"));
            let mut new_story = promote_draft(&idea, story).into_story(story_id, Utc::now())?;
            new_story.mvp_id = mvp;

            let Some((idea, story)) = db.promote_idea(&id, new_story)? else {
                bail!("Idea not found: {}", id);
            };
            out.emit(&json!({ "idea": idea, "story": story }), || {
                format!(
                    "Promoted idea {} to {}\n  {}\n",
                    idea.id,
                    render::story_line(&story),
                    story.narrative()
                )
            })
        }
    }
}

/// The idea's draft with any flags given on the command line laid over it.
fn promote_draft(idea: &Idea, args: PromoteArgs) -> StoryDraft {
    let mut draft = StoryDraft::from_idea(idea);
    if let Some(title) = args.title {
        draft.title = Some(title);
    }
    if let Some(role) = args.role {
        draft.role = role;
    }
    if let Some(feature) = args.feature {
        draft.feature = feature;
    }
    if let Some(benefit) = args.benefit {
        draft.benefit = benefit;
    }
    if let Some(acceptance) = args.acceptance {
        draft.acceptance_criteria = acceptance;
    }
    if let Some(priority) = args.priority {
        draft.priority = priority;
    }
    if let Some(estimate) = args.estimate {
        draft.estimate = estimate;
    }
    draft.business_value = args.value;
    draft
}

fn backlog_view<W: Write>(
    db: &Database,
    filter: &StoryFilterArgs,
    board: bool,
    out: &mut Output<'_, W>,
) -> Result<()> {
    let stories = db.list_stories()?;
    let selected = query_from_args(filter).apply(&stories);
    let stats = backlog::stats(&selected);

    if board {
        let columns = backlog::board(&selected);
        out.emit(&json!({ "columns": columns, "stats": stats }), || {
            render::board(&columns, &stats)
        })
    } else {
        out.emit(&json!({ "stories": selected, "stats": stats }), || {
            let mut text = render::story_list(&selected);
            text.push_str(&render::stats_line(&stats));
            text
        })
    }
}

fn doctor<W: Write>(db: &Database, out: &mut Output<'_, W>) -> Result<()> {
    let loaded = db.load()?;
    let document = &loaded.document;
    let ideas = db.list_ideas()?.len();
    let dangling: Vec<&str> = document
        .dangling_assignments()
        .iter()
        .map(|s| s.id.as_str())
        .collect();

    let report = json!({
        "backend": db.backend_name(),
        "key": db.key(),
        "policy": db.policy().as_str(),
        "origin": loaded.origin,
        "version": document.version,
        "stories": document.stories.len(),
        "mvps": document.mvps.len(),
        "ideas": ideas,
        "danglingAssignments": dangling,
    });

    out.emit(&report, || {
        let mut text = format!(
            "backend: {}\nkey: {}\norigin: {}\nversion: {}\nstories: {}\nmvps: {}\nideas: {}\n",
            db.backend_name(),
            db.key(),
            loaded.origin.as_str(),
            document.version,
            document.stories.len(),
            document.mvps.len(),
            ideas
        );
        if dangling.is_empty() {
            text.push_str("no dangling assignments\n");
        } else {
            text.push_str(&format!(
                "stories pointing at missing MVPs: {}\n",
                dangling.join(", ")
            ));
        }
        text
    })
}

fn require_story(db: &Database, id: &str) -> Result<UserStory> {
    db.get_story(id)?
        .with_context(|| format!("Story not found: {}", id))
}

fn require_mvp(db: &Database, id: &str) -> Result<Mvp> {
    db.get_mvp(id)?
        .with_context(|| format!("MVP not found: {}", id))
}

fn draft_from_args(args: StoryDraftArgs) -> StoryDraft {
    StoryDraft {
        title: args.title,
        role: args.role,
        feature: args.feature,
        benefit: args.benefit,
        acceptance_criteria: args.acceptance,
        priority: args.priority,
        estimate: args.estimate,
        tags: args.tags,
        business_value: args.value,
    }
}

fn update_from_args(fields: StoryUpdateArgs) -> UpdateStoryInput {
    UpdateStoryInput {
        title: fields.title,
        role: fields.role,
        feature: fields.feature,
        benefit: fields.benefit,
        acceptance_criteria: fields.acceptance,
        status: fields.status,
        priority: fields.priority,
        story_points: fields.points,
        business_value: fields.value,
        tags: fields.tags.as_deref().map(parse_tags),
        mvp_id: None,
    }
}

fn query_from_args(filter: &StoryFilterArgs) -> BacklogQuery {
    let mvp = if filter.unassigned {
        Some(None)
    } else {
        filter.mvp.clone().map(Some)
    };
    BacklogQuery {
        search: filter.search.clone(),
        priority: filter.priority,
        status: filter.status,
        mvp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn exec(db: &Database, args: &[&str]) -> Result<String> {
        let mut argv = vec!["smap"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut buf = Vec::new();
        let mut out = Output {
            writer: &mut buf,
            json: cli.json,
        };
        run(cli.command, db, &mut out)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn add_assign_and_delete_mvp_round_trip() {
        let db = Database::open_memory();
        exec(&db, &["mvp", "add", "Core Authentication", "--id", "mvp-1"]).unwrap();
        exec(
            &db,
            &["story", "add", "User Login", "--id", "US-1", "--estimate", "3", "--mvp", "mvp-1"],
        )
        .unwrap();
        assert_eq!(db.mvp_stories("mvp-1").unwrap().len(), 1);

        let text = exec(&db, &["mvp", "delete", "mvp-1"]).unwrap();
        assert_eq!(text, "Deleted MVP mvp-1; 1 stories returned to the backlog\n");
        assert_eq!(db.get_story("US-1").unwrap().unwrap().mvp_id, None);
    }

    #[test]
    fn add_rejects_unknown_mvp_and_off_scale_estimate() {
        let db = Database::open_memory();
        let err = exec(&db, &["story", "add", "Login", "--mvp", "nope"]).unwrap_err();
        assert!(err.to_string().contains("MVP not found: nope"));

        let err = exec(&db, &["story", "add", "Login", "--estimate", "4"]).unwrap_err();
        assert!(err.to_string().contains("not on the scale"));
        assert!(db.list_stories().unwrap().is_empty());
    }

    #[test]
    fn update_requires_a_field_and_an_existing_story() {
        let db = Database::open_memory();
        assert!(exec(&db, &["story", "update", "US-1"]).is_err());
        let err = exec(&db, &["story", "update", "US-1", "--points", "5"]).unwrap_err();
        assert_eq!(err.to_string(), "Story not found: US-1");
    }

    #[test]
    fn list_json_filters_unassigned() {
        let db = Database::open_memory();
        exec(&db, &["mvp", "add", "Catalog", "--id", "mvp-2"]).unwrap();
        exec(&db, &["story", "add", "Cart", "--id", "US-1", "--mvp", "mvp-2"]).unwrap();
        exec(&db, &["story", "add", "Search", "--id", "US-2"]).unwrap();

        let text = exec(&db, &["story", "list", "--unassigned", "--json"]).unwrap();
        let listed: Vec<UserStory> = serde_json::from_str(&text).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "US-2");
    }

    #[test]
    fn promote_builds_story_from_idea_and_flags() {
        let db = Database::open_memory();
        exec(&db, &["login", "--email", "po@example.com"]).unwrap();
        exec(
            &db,
            &["idea", "add", "Dark mode", "--id", "I1", "--description", "use a dark theme", "--tags", "UI"],
        )
        .unwrap();
        assert_eq!(db.get_idea("I1").unwrap().unwrap().author, "po@example.com");

        let text = exec(
            &db,
            &["idea", "promote", "I1", "--story-id", "US-9", "--role", "Night owl", "--benefit", "my eyes rest", "--estimate", "2"],
        )
        .unwrap();
        assert!(text.contains("Promoted idea I1 to ◇ US-9 Dark mode (2 pts, medium)"));
        assert!(text.contains("As a Night owl, I want use a dark theme so that my eyes rest."));

        let idea = db.get_idea("I1").unwrap().unwrap();
        assert_eq!(idea.status, IdeaStatus::Moved);
        assert_eq!(idea.story_id.as_deref(), Some("US-9"));
        assert_eq!(db.get_story("US-9").unwrap().unwrap().tags, vec!["UI"]);

        let err = exec(&db, &["idea", "promote", "I1"]).unwrap_err();
        assert!(err.to_string().contains("already"));
        assert_eq!(db.list_stories().unwrap().len(), 1);
    }

    #[test]
    fn promote_with_bad_estimate_leaves_idea_untouched() {
        let db = Database::open_memory();
        exec(&db, &["idea", "add", "Export to PDF", "--id", "I1"]).unwrap();
        assert!(exec(&db, &["idea", "promote", "I1", "--estimate", "4"]).is_err());
        assert_eq!(db.get_idea("I1").unwrap().unwrap().status, IdeaStatus::New);
        assert!(db.list_stories().unwrap().is_empty());
    }

    #[test]
    fn seed_fills_only_an_empty_workspace() {
        let db = Database::open_memory();
        let text = exec(&db, &["seed"]).unwrap();
        assert!(text.starts_with("Loaded 6 sample stories in 2 MVPs"));
        let stories = db.list_stories().unwrap().len();
        let ideas = db.list_ideas().unwrap().len();

        let text = exec(&db, &["seed"]).unwrap();
        assert!(text.contains("already exist"));
        assert_eq!(db.list_stories().unwrap().len(), stories);
        assert_eq!(db.list_ideas().unwrap().len(), ideas);
    }

    #[test]
    fn reset_needs_confirmation() {
        let db = Database::open_memory();
        exec(&db, &["story", "add", "Search"]).unwrap();
        assert!(exec(&db, &["reset"]).is_err());
        assert_eq!(db.list_stories().unwrap().len(), 1);

        exec(&db, &["reset", "--yes"]).unwrap();
        assert!(db.list_stories().unwrap().is_empty());
    }

    #[test]
    fn doctor_reports_recovered_documents() {
        let db = Database::open_memory();
        db.store().set(db.key(), "not json").unwrap();
        let text = exec(&db, &["doctor", "--json"]).unwrap();
        let report: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(report["origin"], "recovered");
        assert_eq!(report["stories"], 0);
        assert_eq!(report["ideas"], 0);
    }

    #[test]
    fn whoami_reflects_login_and_logout() {
        let db = Database::open_memory();
        assert_eq!(exec(&db, &["whoami"]).unwrap(), "Not signed in\n");
        exec(&db, &["login", "--email", "po@example.com"]).unwrap();
        assert_eq!(exec(&db, &["whoami"]).unwrap(), "po@example.com (product-owner)\n");
        exec(&db, &["logout"]).unwrap();
        assert_eq!(exec(&db, &["whoami"]).unwrap(), "Not signed in\n");
    }
}
