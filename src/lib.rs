//! Anchor-chained flashcard scheduling over a word-combo vocabulary graph.

pub mod combo;
pub mod graph;
pub mod history;
pub mod scheduler;
pub mod store;
pub mod word;

pub type Result<T> = anyhow::Result<T>;

pub use combo::{Combo, ComboDetails, ComboStoreOutcome, combo_id};
pub use graph::{MAX_BRIDGE_HOPS, WordGraph};
pub use history::{HistoryEntry, HistoryStack};
pub use scheduler::{
    Card, MAX_CARDS_PER_ANCHOR, NextCard, Scheduler, SessionState, load_session, save_session,
};
pub use store::{
    BASE_WORD_DEGREE, Progress, create_store, derive_db_path, ensure_parent_dirs, open_store,
};
pub use word::{Pos, Word, WordStoreOutcome, word_id};
