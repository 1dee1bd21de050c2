//! Plan stage: ideas file -> planned items.
//!
//! Reads one idea per line, skips ideas that already have an item (dedup is
//! on the exact idea string across both collections), and for each new idea
//! asks the idea collaborator for an outline, then fetches background clips
//! and narration concurrently. A single idea's failure is reported and the
//! loop continues; items already persisted are never dropped.

use crate::collab::{AssetLibrary, IdeaGenerator, Narrator};
use crate::config::Config;
use crate::errors::StageError;
use crate::events::StageEvent;
use crate::model::{Item, ItemProps};
use crate::store::{Collection, ItemStore};
use crate::ui;
use std::collections::HashSet;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub planned: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Read the ideas file, creating an empty one (plus parents) when absent so
/// the operator has somewhere to type. Whitespace-only lines are filtered.
fn read_ideas(config: &Config) -> Result<Vec<String>, StageError> {
    if !config.ideas_file.exists() {
        if let Some(parent) = config.ideas_file.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StageError::IdeasReadFailed {
                path: config.ideas_file.clone(),
                source,
            })?;
        }
        std::fs::write(&config.ideas_file, "").map_err(|source| StageError::IdeasReadFailed {
            path: config.ideas_file.clone(),
            source,
        })?;
        ui::warn(&format!(
            "Created {} - add one video topic per line",
            config.ideas_file.display()
        ));
        return Ok(Vec::new());
    }

    let text = std::fs::read_to_string(&config.ideas_file).map_err(|source| {
        StageError::IdeasReadFailed {
            path: config.ideas_file.clone(),
            source,
        }
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub async fn run_plan(
    config: &Config,
    store: &ItemStore,
    ideas_gen: &dyn IdeaGenerator,
    assets: &dyn AssetLibrary,
    narrator: &dyn Narrator,
) -> Result<PlanReport, StageError> {
    let ideas = read_ideas(config)?;
    if ideas.is_empty() {
        ui::dim("No ideas to plan.");
        return Ok(PlanReport::default());
    }

    // Dedup against everything ever planned, archived items included.
    let mut known: HashSet<String> = store
        .load(Collection::Active)?
        .into_iter()
        .chain(store.load(Collection::Archive)?)
        .map(|item| item.idea)
        .collect();

    let mut report = PlanReport::default();

    for idea in ideas {
        if known.contains(&idea) {
            StageEvent::PlanSkipped { idea: idea.clone() }.emit();
            ui::dim(&format!("Skipping (already planned): {idea}"));
            report.skipped += 1;
            continue;
        }

        ui::step(&format!("Planning: {idea}"));
        match plan_one(config, store, ideas_gen, assets, narrator, &idea).await {
            Ok(item) => {
                StageEvent::ItemPlanned {
                    id: item.id.clone(),
                    idea: idea.clone(),
                }
                .emit();
                ui::ok(&format!("Planned {} ({})", item.props.title, item.id));
                known.insert(idea);
                report.planned += 1;
            }
            Err(e) => {
                StageEvent::StageError {
                    message: format!("plan failed for \"{idea}\": {e}"),
                }
                .emit();
                ui::error(&format!("Plan failed for \"{idea}\": {e}"));
                report.failed += 1;
            }
        }
    }

    StageEvent::StageDone {
        stage: "plan".into(),
        ok: report.planned,
        failed: report.failed,
    }
    .emit();
    Ok(report)
}

async fn plan_one(
    config: &Config,
    store: &ItemStore,
    ideas_gen: &dyn IdeaGenerator,
    assets: &dyn AssetLibrary,
    narrator: &dyn Narrator,
    idea: &str,
) -> anyhow::Result<Item> {
    let outline = ideas_gen.outline(idea).await?;
    let id = crate::model::new_item_id();
    let audio_dest = config.assets_dir.join(format!("{id}_tts.mp3"));

    // Clips and narration are independent; fetch them concurrently and wait
    // for both before building the item.
    let (clips, narration) = tokio::join!(
        assets.fetch_clips(
            &outline.search_keyword,
            config.clips_per_item,
            &config.assets_dir,
            &id,
        ),
        narrator.narrate(&outline.script, &audio_dest),
    );
    let clips = clips?;
    let narration = narration?;

    let item = Item::with_id(
        id,
        idea,
        ItemProps {
            title: outline.title,
            subtitle: outline.subtitle,
            media_paths: clips,
            audio_path: narration.audio_path,
            bgm_path: None,
            theme_color: outline.color,
            transcript: narration.transcript,
        },
    );

    store.save_item(Collection::Active, &item)?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CollabError;
    use crate::model::ItemStatus;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    struct FakeIdeas;

    #[async_trait]
    impl IdeaGenerator for FakeIdeas {
        async fn outline(&self, idea: &str) -> Result<crate::model::PlanOutline, CollabError> {
            if idea.contains("poison") {
                return Err(CollabError::Api {
                    status: 500,
                    message: "upstream blew up".into(),
                });
            }
            Ok(crate::model::PlanOutline {
                title: format!("Title for {idea}"),
                subtitle: "sub".into(),
                search_keyword: "keyword".into(),
                mood: "calm".into(),
                script: "A short script.".into(),
                color: "#123456".into(),
            })
        }
    }

    struct FakeAssets;

    #[async_trait]
    impl AssetLibrary for FakeAssets {
        async fn fetch_clips(
            &self,
            _keyword: &str,
            count: usize,
            dest_dir: &Path,
            item_id: &str,
        ) -> Result<Vec<PathBuf>, CollabError> {
            Ok((0..count)
                .map(|n| dest_dir.join(format!("{item_id}_bg{n}.mp4")))
                .collect())
        }
    }

    struct FakeNarrator;

    #[async_trait]
    impl Narrator for FakeNarrator {
        async fn narrate(
            &self,
            _script: &str,
            dest: &Path,
        ) -> Result<crate::collab::Narration, CollabError> {
            Ok(crate::collab::Narration {
                audio_path: dest.to_path_buf(),
                transcript: None,
            })
        }
    }

    fn setup(ideas: &str) -> (Config, ItemStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false).unwrap();
        config.ensure_directories().unwrap();
        std::fs::write(&config.ideas_file, ideas).unwrap();
        let store = ItemStore::new(config.data_dir.clone());
        (config, store, dir)
    }

    #[tokio::test]
    async fn test_plan_happy_path() {
        let (config, store, _dir) = setup("cats\n");
        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report.planned, 1);

        let items = store.load(Collection::Active).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].idea, "cats");
        assert_eq!(items[0].status, ItemStatus::Planned);
        assert!(items[0].final_video_path.is_none());
    }

    #[tokio::test]
    async fn test_plan_dedupes_same_idea() {
        let (config, store, _dir) = setup("cats\ncats\n");
        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report.planned, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.load(Collection::Active).unwrap().len(), 1);

        // A second run plans nothing new.
        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report.planned, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.load(Collection::Active).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plan_dedupes_against_archive() {
        let (config, store, _dir) = setup("cats\n");
        run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        let id = store.load(Collection::Active).unwrap()[0].id.clone();
        store
            .move_items(&[id.as_str()], Collection::Active, Collection::Archive)
            .unwrap();

        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report.planned, 0);
        assert_eq!(report.skipped, 1);
        assert!(store.load(Collection::Active).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_ideas_are_filtered() {
        let (config, store, _dir) = setup("   \n\t\n\n");
        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report, PlanReport::default());
        assert!(store.load(Collection::Active).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_idea_does_not_drop_the_rest() {
        let (config, store, _dir) = setup("cats\npoison pill\ndogs\n");
        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report.planned, 2);
        assert_eq!(report.failed, 1);

        let items = store.load(Collection::Active).unwrap();
        let ideas: Vec<&str> = items.iter().map(|i| i.idea.as_str()).collect();
        assert!(ideas.contains(&"cats"));
        assert!(ideas.contains(&"dogs"));
    }

    #[tokio::test]
    async fn test_missing_ideas_file_is_created_and_yields_nothing() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false).unwrap();
        config.ensure_directories().unwrap();
        let store = ItemStore::new(config.data_dir.clone());

        let report = run_plan(&config, &store, &FakeIdeas, &FakeAssets, &FakeNarrator)
            .await
            .unwrap();
        assert_eq!(report, PlanReport::default());
        assert!(config.ideas_file.exists());
    }
}
