use std::path::Path;

use anyhow::Result;

use crate::cli::WordCommand;
use bigbean::open_store;
use bigbean::word::{self, Pos, Word};

pub(crate) fn cmd_word(store_path: &Path, command: WordCommand) -> Result<()> {
    match command {
        WordCommand::Add {
            lemma,
            pos,
            variant,
        } => {
            let conn = open_store(store_path)?;
            let pos = Pos::from_tag(&pos)?;
            let entry = Word::new(&lemma, pos, variant);
            let outcome = word::store_word(&conn, &entry)?;
            if outcome.inserted {
                println!("stored word `{}`", outcome.id);
            } else {
                println!("word `{}` already present", outcome.id);
            }
        }
        WordCommand::List { pos, unlearnt } => {
            let conn = open_store(store_path)?;
            let pos = pos.as_deref().map(Pos::from_tag).transpose()?;
            let words = word::list_words(&conn, pos, unlearnt)?;
            if words.is_empty() {
                println!("no words registered");
                return Ok(());
            }
            for w in words {
                let mark = if w.learnt { "learnt" } else { "to learn" };
                println!("{} ({}, {mark})", w.id, w.pos.as_tag());
            }
        }
        WordCommand::Show { id } => {
            let conn = open_store(store_path)?;
            let entry = word::load_word(&conn, &id)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }
    Ok(())
}
