//! Organize run integration tests.
//!
//! These drive full pipeline runs over real temp directories with recording
//! mock collaborators:
//! - canonical TV and movie relocation
//! - idempotence across repeated runs
//! - duplicate policy in both configurations
//! - Plex exclusion and index skip behavior
//! - collaborator failure containment

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use reelsort_core::{
    testing::{RecordingCleanupHook, RecordingPostMoveHook, RecordingTorrentRemover},
    Config, OrganizeError, Organizer, RunSummary, INDEX_FILENAME,
};

struct TestHarness {
    root: TempDir,
    config: Config,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(mut config: Config) -> Self {
        // The media tools and torrent client are exercised through recording
        // mocks, never through the real collaborators.
        config.subtitles.enable_embedding = false;
        config.audio.enable_scan = false;
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
            config,
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn touch(&self, rel: &str) -> PathBuf {
        let path = self.root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dirs");
        fs::write(&path, rel.as_bytes()).expect("Failed to create file");
        path
    }

    fn organize(&self) -> RunSummary {
        Organizer::new(self.config.clone())
            .organize(self.path(), None)
            .expect("Organize run failed")
    }

    /// Relative path -> content for every file under the root.
    fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        let mut tree = BTreeMap::new();
        for entry in walkdir::WalkDir::new(self.path())
            .min_depth(1)
            .into_iter()
            .flatten()
        {
            if entry.file_type().is_file() {
                let rel = entry
                    .path()
                    .strip_prefix(self.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned();
                tree.insert(rel, fs::read(entry.path()).unwrap());
            }
        }
        tree
    }

    fn exists(&self, rel: &str) -> bool {
        self.root.path().join(rel).exists()
    }
}

#[test]
fn test_tv_episode_moves_to_canonical_path() {
    let harness = TestHarness::new();
    harness.touch("tv/Black Bird/S01E01.mp4");
    fs::create_dir_all(harness.path().join("movies")).unwrap();

    let summary = harness.organize();

    assert_eq!(summary.moved, 1);
    assert!(harness.exists("tv/Black Bird/Season 01/Black Bird S01E01.mp4"));
    assert!(!harness.exists("tv/Black Bird/S01E01.mp4"));
    // The episode landed canonically, so it was indexed under its show root.
    assert!(harness.exists(&format!("tv/Black Bird/{}", INDEX_FILENAME)));
}

#[test]
fn test_movie_release_name_is_cleaned_up() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.BluRay.x264-[YTS.AM].mp4");

    let summary = harness.organize();

    assert_eq!(summary.moved, 1);
    assert!(harness.exists("movies/Venom (2018) [BluRay].mp4"));
    assert!(harness.exists(&format!("movies/{}", INDEX_FILENAME)));
}

#[test]
fn test_movie_quality_omitted_when_disabled() {
    let mut config = Config::default();
    config.settings.include_quality = false;
    let harness = TestHarness::with_config(config);
    harness.touch("movies/Venom.2018.BluRay.x264.mp4");

    harness.organize();
    assert!(harness.exists("movies/Venom (2018).mp4"));
}

#[test]
fn test_non_kept_files_are_deleted_before_parsing() {
    let harness = TestHarness::new();
    harness.touch("movies/random_file.txt");
    harness.touch("movies/Venom.2018.mp4");

    let summary = harness.organize();

    // The text file was cleanup's problem, never the parser's: no skip
    // entry is recorded for it.
    assert_eq!(summary.files_deleted, 1);
    assert!(summary.skips.is_empty());
    assert!(!harness.exists("movies/random_file.txt"));
}

#[test]
fn test_unparseable_video_is_skipped_and_kept() {
    let harness = TestHarness::new();
    harness.touch("movies/Totally Unparseable.mkv");

    let summary = harness.organize();

    assert_eq!(summary.moved, 0);
    assert_eq!(summary.skipped(), 1);
    assert!(harness.exists("movies/Totally Unparseable.mkv"));
}

#[test]
fn test_run_is_idempotent() {
    let harness = TestHarness::new();
    harness.touch("tv/Black Bird/Black.Bird.S01E02.1080p.WEBRip.mkv");
    harness.touch("movies/Venom.2018.BluRay.x264-[YTS.AM].mp4");

    let first = harness.organize();
    assert_eq!(first.moved, 2);
    let after_first = harness.snapshot();

    let second = harness.organize();
    let after_second = harness.snapshot();

    // Byte-identical tree, index files included, and nothing re-processed.
    assert_eq!(after_first, after_second);
    assert_eq!(second.moved, 0);
    assert_eq!(second.already_indexed, 2);
    assert_eq!(second.indexed_added, 0);
    assert!(second.skips.is_empty());
}

#[test]
fn test_duplicate_kept_by_default() {
    let harness = TestHarness::new();
    let source = harness.touch("movies/release/Venom.2018.mp4");
    let dest = harness.touch("movies/Venom (2018).mp4");
    let dest_content = fs::read(&dest).unwrap();

    let summary = harness.organize();

    assert_eq!(summary.duplicates_kept, 1);
    assert_eq!(summary.moved, 0);
    assert!(source.exists());
    assert_eq!(fs::read(&dest).unwrap(), dest_content);
}

#[test]
fn test_duplicate_replaced_when_enabled() {
    let mut config = Config::default();
    config.settings.delete_duplicates = true;
    let harness = TestHarness::with_config(config);
    let source = harness.touch("movies/release/Venom.2018.mp4");
    let dest = harness.touch("movies/Venom (2018).mp4");
    let dest_content = fs::read(&dest).unwrap();

    let summary = harness.organize();

    assert_eq!(summary.duplicates_replaced, 1);
    assert!(!source.exists());
    // The pre-existing destination is authoritative and untouched.
    assert_eq!(fs::read(&dest).unwrap(), dest_content);
}

#[test]
fn test_plex_managed_content_is_never_touched() {
    let harness = TestHarness::new();
    harness.touch("movies/Plex Versions/Optimized for TV/Venom.2018.mp4");
    harness.touch("movies/Plex Versions/notes.txt");

    let summary = harness.organize();

    assert_eq!(summary.moved, 0);
    assert_eq!(summary.files_deleted, 0);
    assert!(harness.exists("movies/Plex Versions/Optimized for TV/Venom.2018.mp4"));
    assert!(harness.exists("movies/Plex Versions/notes.txt"));
}

#[test]
fn test_indexed_file_is_not_reprocessed() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom (2018).mp4");

    let first = harness.organize();
    assert_eq!(first.moved, 0);
    assert_eq!(first.indexed_added, 1);

    let second = harness.organize();
    assert_eq!(second.already_indexed, 1);
    assert_eq!(second.indexed_added, 0);
    assert!(harness.exists("movies/Venom (2018).mp4"));
}

#[test]
fn test_single_item_tv_folder() {
    let harness = TestHarness::new();
    // No tv/ or movies/ child: the start path is the unit to organize, and
    // its own name is the show name.
    let start = harness.path().join("downloads/tv/Black Bird");
    fs::create_dir_all(&start).unwrap();
    fs::write(start.join("Black.Bird.S01E05.720p.mkv"), b"x").unwrap();

    let summary = Organizer::new(harness.config.clone())
        .organize(&start, None)
        .unwrap();

    assert_eq!(summary.moved, 1);
    assert!(start.join("Season 01/Black Bird S01E05 [720p].mkv").exists());
    assert!(start.join(INDEX_FILENAME).exists());
}

#[test]
fn test_single_item_movie_folder() {
    let harness = TestHarness::new();
    let start = harness.path().join("downloads/Venom.2018.BluRay");
    fs::create_dir_all(&start).unwrap();
    fs::write(start.join("Venom.2018.BluRay.x264.mp4"), b"x").unwrap();
    fs::write(start.join("RARBG.txt"), b"junk").unwrap();

    let summary = Organizer::new(harness.config.clone())
        .organize(&start, None)
        .unwrap();

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.files_deleted, 1);
    assert!(start.join("Venom (2018) [BluRay].mp4").exists());
}

#[test]
fn test_missing_start_path_is_fatal() {
    let result = Organizer::new(Config::default()).organize(Path::new("/no/such/path"), None);
    assert!(matches!(result, Err(OrganizeError::NotADirectory { .. })));
}

#[test]
fn test_torrent_removal_on_completion_token() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.mp4");

    let remover = RecordingTorrentRemover::new();
    Organizer::new(harness.config.clone())
        .with_torrent_remover(Box::new(remover.clone()))
        .organize(harness.path(), Some("abc123"))
        .unwrap();

    assert_eq!(remover.removed_hashes(), vec!["abc123".to_string()]);
}

#[test]
fn test_test_sentinel_skips_torrent_removal() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.mp4");

    let remover = RecordingTorrentRemover::new();
    Organizer::new(harness.config.clone())
        .with_torrent_remover(Box::new(remover.clone()))
        .organize(harness.path(), Some("test"))
        .unwrap();

    assert!(remover.removed_hashes().is_empty());
}

#[test]
fn test_torrent_removal_failure_does_not_fail_the_run() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.mp4");

    let remover = RecordingTorrentRemover::failing();
    let summary = Organizer::new(harness.config.clone())
        .with_torrent_remover(Box::new(remover.clone()))
        .organize(harness.path(), Some("abc123"))
        .unwrap();

    assert_eq!(summary.moved, 1);
    assert_eq!(remover.removed_hashes(), vec!["abc123".to_string()]);
}

#[test]
fn test_post_move_hooks_run_for_moved_files() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.mp4");
    harness.touch("movies/Totally Unparseable.mkv");

    let hook = RecordingPostMoveHook::new();
    Organizer::new(harness.config.clone())
        .with_post_move_hook(Box::new(hook.clone()))
        .organize(harness.path(), None)
        .unwrap();

    // Only the moved file reached the hook; the skipped one never did.
    assert_eq!(
        hook.seen_paths(),
        vec![harness.path().join("movies/Venom (2018).mp4")]
    );
}

#[test]
fn test_failing_post_move_hook_is_contained() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.mp4");
    harness.touch("movies/Other.Film.2019.mp4");

    let hook = RecordingPostMoveHook::failing();
    let summary = Organizer::new(harness.config.clone())
        .with_post_move_hook(Box::new(hook.clone()))
        .organize(harness.path(), None)
        .unwrap();

    // Both files still moved and both hook attempts were made.
    assert_eq!(summary.moved, 2);
    assert_eq!(hook.seen_paths().len(), 2);
}

#[test]
fn test_cleanup_hook_sees_each_section_root() {
    let harness = TestHarness::new();
    harness.touch("tv/Black Bird/S01E01.mp4");
    harness.touch("movies/Venom.2018.mp4");

    let hook = RecordingCleanupHook::new();
    Organizer::new(harness.config.clone())
        .with_cleanup_hook(Box::new(hook.clone()))
        .organize(harness.path(), None)
        .unwrap();

    assert_eq!(
        hook.seen_roots(),
        vec![harness.path().join("tv"), harness.path().join("movies")]
    );
}

#[test]
fn test_cleanup_removes_emptied_release_folders() {
    let harness = TestHarness::new();
    harness.touch("movies/Venom.2018.BluRay/Venom.2018.BluRay.mp4");
    harness.touch("movies/Venom.2018.BluRay/Subs/english.srt");

    let summary = harness.organize();

    assert_eq!(summary.moved, 1);
    assert!(harness.exists("movies/Venom (2018) [BluRay].mp4"));
    // The release folder lost its video and its Subs folder, then fell to
    // the post-move cleanup.
    assert!(!harness.exists("movies/Venom.2018.BluRay"));
}
