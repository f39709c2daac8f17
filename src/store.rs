//! SQLite store lifecycle, schema, and scheduling queries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, DatabaseName, OpenFlags, params};
use serde::Serialize;

/// Combo-degree at or above which a word counts as a base word.
pub const BASE_WORD_DEGREE: u32 = 4;

pub fn derive_db_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(name);
    if path.extension().is_none() {
        path.set_extension("bigbean.db");
    }
    path
}

pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn create_store(path: &Path) -> Result<Connection> {
    ensure_parent_dirs(path)?;
    if path.exists() {
        bail!("database already exists at {}", path.display());
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_READ_WRITE,
    )
    .with_context(|| format!("failed to create {}", path.display()))?;

    configure_pragmas(&conn)?;
    install_schema(&conn)?;
    Ok(conn)
}

pub fn open_store(path: &Path) -> Result<Connection> {
    if !path.exists() {
        bail!("database not found at {}", path.display());
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .with_context(|| format!("failed to open {}", path.display()))?;
    configure_pragmas(&conn)?;
    install_schema(&conn)?;
    Ok(conn)
}

pub fn configure_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(Some(DatabaseName::Main), "journal_mode", &"WAL")?;
    conn.pragma_update(Some(DatabaseName::Main), "synchronous", &"NORMAL")?;
    conn.pragma_update(Some(DatabaseName::Main), "temp_store", &"MEMORY")?;
    conn.pragma_update(None, "foreign_keys", &true)?;
    Ok(())
}

pub fn install_schema(conn: &Connection) -> Result<()> {
    const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS word (
  id      TEXT PRIMARY KEY,
  content TEXT NOT NULL,
  pos     TEXT NOT NULL,
  learnt  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS combo (
  id           TEXT PRIMARY KEY,
  display_text TEXT NOT NULL,
  image_path   TEXT
);

CREATE TABLE IF NOT EXISTS combo_map (
  combo_id TEXT NOT NULL,
  word_id  TEXT NOT NULL,
  PRIMARY KEY (combo_id, word_id),
  FOREIGN KEY (combo_id) REFERENCES combo(id) ON DELETE CASCADE,
  FOREIGN KEY (word_id) REFERENCES word(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS combo_map_word_idx ON combo_map(word_id);
"#;

    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Flip a word's learnt flag; fails on an unknown word id.
pub fn set_learnt(conn: &Connection, word_id: &str, learnt: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE word SET learnt = ?1 WHERE id = ?2",
        params![learnt, word_id],
    )?;
    if rows == 0 {
        bail!("cannot mark unknown word `{word_id}` as learnt");
    }
    Ok(())
}

/// Clear every learnt flag, returning how many words were reset.
pub fn clear_all_learnt(conn: &Connection) -> Result<usize> {
    let rows = conn.execute("UPDATE word SET learnt = 0 WHERE learnt = 1", [])?;
    Ok(rows)
}

/// A base-word candidate row for anchor selection.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub id: String,
    pub degree: u32,
    pub learnt: bool,
}

/// Base words (degree >= 4) ordered by degree descending, then id ascending.
///
/// The ordering is deterministic on purpose: random tie-breaks are the
/// scheduler's job, made over this stable result set.
pub fn list_base_word_candidates(conn: &Connection, only_unlearnt: bool) -> Result<Vec<Candidate>> {
    let mut sql = String::from(
        "SELECT w.id, COUNT(cm.combo_id) AS degree, w.learnt
         FROM word w JOIN combo_map cm ON cm.word_id = w.id",
    );
    if only_unlearnt {
        sql.push_str(" WHERE w.learnt = 0");
    }
    sql.push_str(
        " GROUP BY w.id
          HAVING degree >= ?1
          ORDER BY degree DESC, w.id ASC",
    );

    let mut stmt = conn.prepare(&sql)?;
    let candidates = stmt
        .query_map([BASE_WORD_DEGREE], |row| {
            Ok(Candidate {
                id: row.get(0)?,
                degree: row.get(1)?,
                learnt: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(candidates)
}

/// Learning progress over base words only; bridge words are not counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: u32,
    pub learnt: u32,
    pub unlearnt: u32,
}

/// Count learnt and unlearnt base words.
pub fn progress(conn: &Connection) -> Result<Progress> {
    let (total, learnt): (u32, u32) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(learnt), 0) FROM (
           SELECT w.id, w.learnt AS learnt
           FROM word w JOIN combo_map cm ON cm.word_id = w.id
           GROUP BY w.id
           HAVING COUNT(cm.combo_id) >= ?1
         )",
        [BASE_WORD_DEGREE],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(Progress {
        total,
        learnt,
        unlearnt: total - learnt,
    })
}
