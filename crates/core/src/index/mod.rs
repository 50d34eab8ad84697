//! Persistent per-root indexing.
//!
//! Records which files are already known to be correctly named and placed,
//! so repeat runs skip them. One index file per relevant root: the movies
//! root for movies, each show's own root for its episodes.

mod backfill;
mod store;

pub use backfill::{generate_indexes, BackfillError, IndexSummary};
pub use store::{index_root_for, should_index, IndexEntry, IndexError, IndexStore};

/// Reserved index filename. Cleanup keeps it unconditionally.
pub const INDEX_FILENAME: &str = ".reelsort.index";
