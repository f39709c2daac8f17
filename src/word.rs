//! Vocabulary words, their part-of-speech tags, and stable identifiers.

use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

/// Closed set of part-of-speech categories a word can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pos {
    Noun,
    Verb,
    Adjective,
    PhrasalVerb,
}

impl Pos {
    /// Return the canonical tag used in identifiers and storage.
    pub fn as_tag(self) -> &'static str {
        match self {
            Pos::Noun => "n",
            Pos::Verb => "v",
            Pos::Adjective => "j",
            Pos::PhrasalVerb => "pv",
        }
    }

    /// Parse a canonical tag into a `Pos`.
    pub fn from_tag(tag: &str) -> Result<Pos> {
        match tag {
            "n" => Ok(Pos::Noun),
            "v" => Ok(Pos::Verb),
            "j" => Ok(Pos::Adjective),
            "pv" => Ok(Pos::PhrasalVerb),
            other => bail!("unknown part-of-speech tag `{other}`"),
        }
    }
}

/// Lowercase a surface form and collapse whitespace runs into hyphens.
pub(crate) fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Derive the stable word id `lemma-pos-variant`, e.g. `apple-n-0`.
pub fn word_id(lemma: &str, pos: Pos, variant: u32) -> String {
    format!("{}-{}-{}", slugify(lemma), pos.as_tag(), variant)
}

/// A vocabulary atom. `learnt` is the only mutable field and is owned by the
/// scheduler's advance/retreat transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub content: String,
    pub pos: Pos,
    pub learnt: bool,
}

impl Word {
    /// Build an unlearnt word with a derived id.
    pub fn new(lemma: &str, pos: Pos, variant: u32) -> Word {
        Word {
            id: word_id(lemma, pos, variant),
            content: lemma.to_string(),
            pos,
            learnt: false,
        }
    }
}

/// Result of persisting a word row.
pub struct WordStoreOutcome {
    pub id: String,
    pub inserted: bool,
}

/// Persist a word; an existing row with the same id is left untouched.
pub fn store_word(conn: &Connection, word: &Word) -> Result<WordStoreOutcome> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO word (id, content, pos, learnt) VALUES (?1, ?2, ?3, ?4)",
        params![word.id, word.content, word.pos.as_tag(), word.learnt],
    )?;
    Ok(WordStoreOutcome {
        id: word.id.clone(),
        inserted: rows > 0,
    })
}

/// Fetch a word row if present.
pub fn get_word(conn: &Connection, id: &str) -> Result<Option<Word>> {
    let row: Option<(String, String, String, bool)> = conn
        .query_row(
            "SELECT id, content, pos, learnt FROM word WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    match row {
        Some((id, content, tag, learnt)) => Ok(Some(Word {
            id,
            content,
            pos: Pos::from_tag(&tag)?,
            learnt,
        })),
        None => Ok(None),
    }
}

/// Fetch a word row, failing if it does not exist.
pub fn load_word(conn: &Connection, id: &str) -> Result<Word> {
    get_word(conn, id)?.ok_or_else(|| anyhow!("word `{id}` not found"))
}

/// List words ordered by id, optionally filtered by tag and learnt state.
pub fn list_words(conn: &Connection, pos: Option<Pos>, only_unlearnt: bool) -> Result<Vec<Word>> {
    let mut sql = String::from("SELECT id, content, pos, learnt FROM word");
    let mut clauses = Vec::new();
    if pos.is_some() {
        clauses.push("pos = ?1");
    }
    if only_unlearnt {
        clauses.push("learnt = 0");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String, String, bool)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    };
    let rows: Vec<(String, String, String, bool)> = match pos {
        Some(p) => stmt
            .query_map([p.as_tag()], map_row)?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt
            .query_map([], map_row)?
            .collect::<rusqlite::Result<_>>()?,
    };

    rows.into_iter()
        .map(|(id, content, tag, learnt)| {
            Ok(Word {
                id,
                content,
                pos: Pos::from_tag(&tag)?,
                learnt,
            })
        })
        .collect()
}
