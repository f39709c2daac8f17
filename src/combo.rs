//! Flashcard combos and their word memberships.

use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::word::{self, Word, slugify};

/// Derive the stable combo id `slug-g-variant`, e.g. `green-apple-g-0`.
pub fn combo_id(lemmas: &[&str], variant: u32) -> String {
    format!("{}-g-{}", slugify(&lemmas.join(" ")), variant)
}

/// A flashcard prompt built from two or more words. Immutable after creation;
/// `image_path` is an opaque media reference the core never interprets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    pub display_text: String,
    pub image_path: Option<String>,
}

/// Result of persisting a combo row.
pub struct ComboStoreOutcome {
    pub id: String,
    pub inserted: bool,
}

/// Persist a combo and its memberships in one transaction.
///
/// Requires at least two member words, all of which must already exist in the
/// store. Re-inserting an existing combo leaves it untouched.
pub fn store_combo(
    conn: &mut Connection,
    combo: &Combo,
    member_word_ids: &[String],
) -> Result<ComboStoreOutcome> {
    if member_word_ids.len() < 2 {
        bail!(
            "combo `{}` needs at least two member words, got {}",
            combo.id,
            member_word_ids.len()
        );
    }
    for word_id in member_word_ids {
        if word::get_word(conn, word_id)?.is_none() {
            bail!("combo `{}` references unknown word `{word_id}`", combo.id);
        }
    }

    let tx = conn.transaction()?;
    let rows = tx.execute(
        "INSERT OR IGNORE INTO combo (id, display_text, image_path) VALUES (?1, ?2, ?3)",
        params![combo.id, combo.display_text, combo.image_path],
    )?;
    for word_id in member_word_ids {
        tx.execute(
            "INSERT OR IGNORE INTO combo_map (combo_id, word_id) VALUES (?1, ?2)",
            params![combo.id, word_id],
        )?;
    }
    tx.commit()?;

    Ok(ComboStoreOutcome {
        id: combo.id.clone(),
        inserted: rows > 0,
    })
}

/// Fetch a combo row if present.
pub fn get_combo(conn: &Connection, id: &str) -> Result<Option<Combo>> {
    let combo = conn
        .query_row(
            "SELECT id, display_text, image_path FROM combo WHERE id = ?1",
            [id],
            |row| {
                Ok(Combo {
                    id: row.get(0)?,
                    display_text: row.get(1)?,
                    image_path: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(combo)
}

/// Fetch a combo row, failing if it does not exist.
pub fn load_combo(conn: &Connection, id: &str) -> Result<Combo> {
    get_combo(conn, id)?.ok_or_else(|| anyhow!("combo `{id}` not found"))
}

/// List all combos ordered by id.
pub fn list_combos(conn: &Connection) -> Result<Vec<Combo>> {
    let mut stmt =
        conn.prepare("SELECT id, display_text, image_path FROM combo ORDER BY id")?;
    let combos = stmt
        .query_map([], |row| {
            Ok(Combo {
                id: row.get(0)?,
                display_text: row.get(1)?,
                image_path: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(combos)
}

/// Member word ids of a combo, ordered by id.
pub fn list_members_of(conn: &Connection, combo_id: &str) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT word_id FROM combo_map WHERE combo_id = ?1 ORDER BY word_id")?;
    let members = stmt
        .query_map([combo_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(members)
}

/// A combo together with its fully loaded member words.
#[derive(Clone, Debug, Serialize)]
pub struct ComboDetails {
    pub combo: Combo,
    pub words: Vec<Word>,
}

/// Load a combo and its member words for display.
pub fn load_combo_details(conn: &Connection, id: &str) -> Result<ComboDetails> {
    let combo = load_combo(conn, id)?;
    let words = list_members_of(conn, id)?
        .iter()
        .map(|word_id| word::load_word(conn, word_id))
        .collect::<Result<Vec<_>>>()?;
    Ok(ComboDetails { combo, words })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;
    use crate::word::Pos;

    fn memory_store() -> Result<Connection> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", &true)?;
        store::install_schema(&conn)?;
        Ok(conn)
    }

    fn seed_words(conn: &Connection) -> Result<()> {
        word::store_word(conn, &Word::new("green", Pos::Adjective, 0))?;
        word::store_word(conn, &Word::new("apple", Pos::Noun, 0))?;
        Ok(())
    }

    #[test]
    fn combo_id_matches_original_scheme() {
        assert_eq!(combo_id(&["green", "apple"], 0), "green-apple-g-0");
        assert_eq!(combo_id(&["pick up", "phone"], 2), "pick-up-phone-g-2");
    }

    #[test]
    fn store_combo_with_members() -> Result<()> {
        let mut conn = memory_store()?;
        seed_words(&conn)?;

        let combo = Combo {
            id: combo_id(&["green", "apple"], 0),
            display_text: "Green Apple".to_string(),
            image_path: Some("/images/green-apple.jpg".to_string()),
        };
        let members = vec!["green-j-0".to_string(), "apple-n-0".to_string()];
        let outcome = store_combo(&mut conn, &combo, &members)?;
        assert!(outcome.inserted);
        assert!(!store_combo(&mut conn, &combo, &members)?.inserted);

        assert_eq!(load_combo(&conn, "green-apple-g-0")?, combo);
        assert_eq!(
            list_members_of(&conn, "green-apple-g-0")?,
            vec!["apple-n-0", "green-j-0"]
        );
        Ok(())
    }

    #[test]
    fn store_combo_rejects_bad_members() -> Result<()> {
        let mut conn = memory_store()?;
        seed_words(&conn)?;

        let combo = Combo {
            id: "solo-g-0".to_string(),
            display_text: "Solo".to_string(),
            image_path: None,
        };
        assert!(store_combo(&mut conn, &combo, &["apple-n-0".to_string()]).is_err());
        assert!(
            store_combo(
                &mut conn,
                &combo,
                &["apple-n-0".to_string(), "ghost-n-0".to_string()],
            )
            .is_err()
        );
        // Nothing was committed.
        assert!(get_combo(&conn, "solo-g-0")?.is_none());
        Ok(())
    }

    #[test]
    fn combo_details_include_words() -> Result<()> {
        let mut conn = memory_store()?;
        seed_words(&conn)?;
        let combo = Combo {
            id: combo_id(&["green", "apple"], 0),
            display_text: "Green Apple".to_string(),
            image_path: None,
        };
        store_combo(
            &mut conn,
            &combo,
            &["green-j-0".to_string(), "apple-n-0".to_string()],
        )?;

        let details = load_combo_details(&conn, "green-apple-g-0")?;
        assert_eq!(details.combo.display_text, "Green Apple");
        assert_eq!(details.words.len(), 2);
        assert!(details.words.iter().any(|w| w.id == "apple-n-0"));
        Ok(())
    }
}
