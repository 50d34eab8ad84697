use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::{DirEntry, WalkDir};

use super::types::{RunSummary, Skip, SkipReason};
use super::OrganizeError;
use crate::classifier::{self, Layout};
use crate::cleaner;
use crate::config::Config;
use crate::hooks::{CleanupHook, PostMoveHook, TorrentRemover};
use crate::index::{index_root_for, should_index, IndexStore};
use crate::media::{MediaItem, MediaKind};
use crate::mover::{self, MoveOutcome};
use crate::namer::{render, sanitize, season_dir_name};
use crate::parser::{self, normalize_title, KindHint, ParsedName};

/// Completion token value that means "dry signal, do not touch the torrent
/// client".
const TEST_TOKEN: &str = "test";

/// How files under a section root are interpreted.
#[derive(Debug, Clone)]
enum Section {
    /// The `tv/` subtree of a library root; show identity comes from the
    /// directory under `tv/`.
    Tv,
    /// The `movies/` subtree of a library root.
    Movies,
    /// A single downloaded item folder; `name` is the folder's own name.
    Single { name: String },
}

/// Drives one start path through the organize pipeline.
pub struct Organizer {
    config: Config,
    torrent_remover: Option<Box<dyn TorrentRemover>>,
    post_move_hooks: Vec<Box<dyn PostMoveHook>>,
    cleanup_hooks: Vec<Box<dyn CleanupHook>>,
}

impl Organizer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            torrent_remover: None,
            post_move_hooks: Vec::new(),
            cleanup_hooks: Vec::new(),
        }
    }

    /// Injects the torrent-removal collaborator, invoked on run completion.
    pub fn with_torrent_remover(mut self, remover: Box<dyn TorrentRemover>) -> Self {
        self.torrent_remover = Some(remover);
        self
    }

    /// Injects a collaborator run per file between move and final cleanup.
    pub fn with_post_move_hook(mut self, hook: Box<dyn PostMoveHook>) -> Self {
        self.post_move_hooks.push(hook);
        self
    }

    /// Injects a collaborator run per section root as its cleanup phase
    /// begins, before anything is deleted.
    pub fn with_cleanup_hook(mut self, hook: Box<dyn CleanupHook>) -> Self {
        self.cleanup_hooks.push(hook);
        self
    }

    /// Run the pipeline against `start`.
    ///
    /// `completion_token` is an opaque "a download finished" token passed to
    /// the torrent-removal collaborator; `None` or `"test"` skips that step.
    /// Only precondition failures abort; per-file problems are recorded in
    /// the returned [`RunSummary`].
    pub fn organize(
        &self,
        start: &Path,
        completion_token: Option<&str>,
    ) -> Result<RunSummary, OrganizeError> {
        if !start.is_dir() {
            return Err(OrganizeError::NotADirectory {
                path: start.to_path_buf(),
            });
        }
        fs::read_dir(start).map_err(|e| OrganizeError::Unreadable {
            path: start.to_path_buf(),
            source: e,
        })?;

        let layout = classifier::classify(start);
        let mut summary = RunSummary::default();
        let mut index = IndexStore::new();

        match &layout {
            Layout::LibraryRoot { tv_dir, movies_dir } => {
                info!("Organizing library root {}", start.display());
                if let Some(tv) = tv_dir {
                    self.process_section(tv, &Section::Tv, &mut index, &mut summary);
                }
                if let Some(movies) = movies_dir {
                    self.process_section(movies, &Section::Movies, &mut index, &mut summary);
                }
            }
            Layout::SingleItem { name } => {
                info!("Organizing single item {}", start.display());
                self.process_section(
                    start,
                    &Section::Single { name: name.clone() },
                    &mut index,
                    &mut summary,
                );
            }
        }

        self.notify_run_complete(completion_token);
        info!("Run complete: {}", summary);
        Ok(summary)
    }

    fn process_section(
        &self,
        root: &Path,
        section: &Section,
        index: &mut IndexStore,
        summary: &mut RunSummary,
    ) {
        if !root.is_dir() {
            debug!("Section root {} does not exist, skipping", root.display());
            return;
        }

        for hook in &self.cleanup_hooks {
            if let Err(e) = hook.run(root) {
                error!(
                    "Cleanup hook {} failed for {}: {}",
                    hook.name(),
                    root.display(),
                    e
                );
            }
        }

        let pre = cleaner::clean(root, &self.config);
        summary.files_deleted += pre.files_deleted;
        summary.dirs_deleted += pre.dirs_deleted;

        for file in collect_candidates(root, &self.config) {
            if !file.exists() {
                continue;
            }
            self.process_file(&file, root, section, index, summary);
        }

        let post = cleaner::clean(root, &self.config);
        summary.files_deleted += post.files_deleted;
        summary.dirs_deleted += post.dirs_deleted;
    }

    fn process_file(
        &self,
        file: &Path,
        root: &Path,
        section: &Section,
        index: &mut IndexStore,
        summary: &mut RunSummary,
    ) {
        let current_index_root = index_root_for(file, root);
        if index.is_indexed(&current_index_root, file) {
            debug!("Already indexed, skipping {}", file.display());
            summary.already_indexed += 1;
            return;
        }

        let Some(filename) = file.file_name().and_then(|n| n.to_str()) else {
            summary.skips.push(Skip {
                path: file.to_path_buf(),
                reason: SkipReason::Filesystem("non-UTF-8 file name".to_string()),
            });
            return;
        };

        let Some((item, destination)) = self.plan(file, filename, root, section) else {
            debug!("No grammar match for {}, leaving in place", file.display());
            summary.skips.push(Skip {
                path: file.to_path_buf(),
                reason: SkipReason::ParseNoMatch,
            });
            return;
        };

        if file == destination {
            // Already canonical; an index miss just re-adds it.
            self.record_canonical(&destination, root, index, summary);
            return;
        }

        match mover::move_file(file, &destination, &self.config) {
            Ok(MoveOutcome::Moved) => {
                summary.moved += 1;
                self.record_canonical(&destination, root, index, summary);
                self.run_post_move_hooks(&item, &destination);
            }
            Ok(MoveOutcome::KeptDuplicate) => {
                summary.duplicates_kept += 1;
            }
            Ok(MoveOutcome::ReplacedDuplicate) => {
                summary.duplicates_replaced += 1;
                // The surviving destination is canonical; make sure the
                // index knows it.
                self.record_canonical(&destination, root, index, summary);
            }
            Err(e) => {
                error!("Failed to move {}: {}", file.display(), e);
                summary.skips.push(Skip {
                    path: file.to_path_buf(),
                    reason: SkipReason::Filesystem(e.to_string()),
                });
            }
        }
    }

    /// Work out what a file is and where it belongs. `None` means the
    /// grammar did not match and the file must be left untouched.
    fn plan(
        &self,
        file: &Path,
        filename: &str,
        root: &Path,
        section: &Section,
    ) -> Option<(MediaItem, PathBuf)> {
        let config = &self.config;
        let treat_as_tv = match section {
            Section::Tv => true,
            Section::Movies => false,
            Section::Single { .. } => classifier::is_tv_path(file),
        };

        let extension = filename.rsplit_once('.')?.1.to_lowercase();

        if treat_as_tv {
            let ParsedName::Episode {
                title,
                season,
                episode,
                quality,
            } = parser::parse(filename, KindHint::Tv, config)?
            else {
                return None;
            };

            // The directory is authoritative over the filename for show
            // identity; the parsed title is only a fallback.
            let show = match section {
                Section::Tv => dir_show_name(file, root)
                    .map(|raw| normalize_title(&raw, config))
                    .or(title)?,
                Section::Single { name } => normalize_title(name, config),
                Section::Movies => unreachable!("movies section is never TV"),
            };
            if show.is_empty() {
                return None;
            }

            let dest_dir = match section {
                Section::Tv => root.join(sanitize(&show)).join(season_dir_name(season)),
                _ => root.join(season_dir_name(season)),
            };
            let item = MediaItem {
                path: file.to_path_buf(),
                extension,
                kind: MediaKind::Episode {
                    show,
                    season,
                    episode,
                    quality,
                },
            };
            let destination = dest_dir.join(render(&item, config));
            Some((item, destination))
        } else {
            let ParsedName::Movie {
                title,
                year,
                quality,
            } = parser::parse(filename, KindHint::Movie, config)?
            else {
                return None;
            };

            let item = MediaItem {
                path: file.to_path_buf(),
                extension,
                kind: MediaKind::Movie {
                    title,
                    year,
                    quality,
                },
            };
            let destination = root.join(render(&item, config));
            Some((item, destination))
        }
    }

    /// Record a file that now sits at its canonical path. The guard
    /// re-verifies canonical form so a raw name can never be indexed.
    fn record_canonical(
        &self,
        path: &Path,
        root: &Path,
        index: &mut IndexStore,
        summary: &mut RunSummary,
    ) {
        let index_root = index_root_for(path, root);
        if !should_index(&index_root, path, &self.config) {
            debug!("Not indexable yet: {}", path.display());
            return;
        }
        if index.is_indexed(&index_root, path) {
            return;
        }
        match index.record(&index_root, path) {
            Ok(()) => summary.indexed_added += 1,
            Err(e) => error!("Failed to index {}: {}", path.display(), e),
        }
    }

    fn run_post_move_hooks(&self, item: &MediaItem, final_path: &Path) {
        for hook in &self.post_move_hooks {
            if let Err(e) = hook.run(item, final_path) {
                error!(
                    "Post-move hook {} failed for {}: {}",
                    hook.name(),
                    final_path.display(),
                    e
                );
            }
        }
    }

    fn notify_run_complete(&self, completion_token: Option<&str>) {
        let Some(token) = completion_token else {
            return;
        };
        if token == TEST_TOKEN {
            info!("Completion token is the test sentinel, skipping torrent removal");
            return;
        }
        let Some(remover) = &self.torrent_remover else {
            debug!("No torrent remover configured");
            return;
        };
        if let Err(e) = remover.remove(token) {
            error!("Torrent removal via {} failed: {}", remover.name(), e);
        }
    }
}

/// Show name from the immediate child of the section root the file lives
/// under; `None` for files sitting directly in the root.
fn dir_show_name(file: &Path, root: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut components = rel.components();
    let first = components.next()?;
    // The single component is the file itself, not a show directory.
    components.next()?;
    first.as_os_str().to_str().map(|s| s.to_string())
}

fn descend(entry: &DirEntry, config: &Config) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    entry
        .file_name()
        .to_str()
        .map(|n| !config.media.is_plex_component(n))
        .unwrap_or(true)
}

/// Video files under `root`, Plex subtrees excluded, in a stable order.
fn collect_candidates(root: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| descend(e, config))
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| config.media.is_video_path(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_dir_show_name() {
        let root = Path::new("/media/tv");
        assert_eq!(
            dir_show_name(Path::new("/media/tv/Black Bird/S01E01.mkv"), root),
            Some("Black Bird".to_string())
        );
        assert_eq!(
            dir_show_name(Path::new("/media/tv/Black Bird/Raw.Dir/S01E01.mkv"), root),
            Some("Black Bird".to_string())
        );
        // Directly under the root there is no show directory.
        assert_eq!(
            dir_show_name(Path::new("/media/tv/S01E01.mkv"), root),
            None
        );
    }

    #[test]
    fn test_collect_candidates_skips_plex_and_non_video() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.mkv"));
        touch(&temp.path().join("notes.txt"));
        touch(&temp.path().join("Plex Versions/optimized.mkv"));
        touch(&temp.path().join("nested/b.mp4"));

        let config = Config::default();
        let candidates = collect_candidates(temp.path(), &config);
        assert_eq!(
            candidates,
            vec![temp.path().join("a.mkv"), temp.path().join("nested/b.mp4")]
        );
    }

    #[test]
    fn test_organize_rejects_missing_start_path() {
        let organizer = Organizer::new(Config::default());
        let result = organizer.organize(Path::new("/no/such/dir"), None);
        assert!(matches!(result, Err(OrganizeError::NotADirectory { .. })));
    }
}
