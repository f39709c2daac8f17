use std::path::Path;

use anyhow::Result;

use crate::cli::ComboCommand;
use bigbean::combo::{self, Combo};
use bigbean::{open_store, word};

pub(crate) fn cmd_combo(store_path: &Path, command: ComboCommand) -> Result<()> {
    match command {
        ComboCommand::Add {
            display,
            image,
            words,
            variant,
        } => {
            let mut conn = open_store(store_path)?;
            // The derived id uses surface forms, in member order.
            let mut lemmas = Vec::with_capacity(words.len());
            for id in &words {
                lemmas.push(word::load_word(&conn, id)?.content);
            }
            let lemma_refs: Vec<&str> = lemmas.iter().map(|s| s.as_str()).collect();
            let entry = Combo {
                id: combo::combo_id(&lemma_refs, variant),
                display_text: display,
                image_path: image,
            };
            let outcome = combo::store_combo(&mut conn, &entry, &words)?;
            if outcome.inserted {
                println!("stored combo `{}` with {} member(s)", outcome.id, words.len());
            } else {
                println!("combo `{}` already present", outcome.id);
            }
        }
        ComboCommand::List => {
            let conn = open_store(store_path)?;
            let combos = combo::list_combos(&conn)?;
            if combos.is_empty() {
                println!("no combos registered");
                return Ok(());
            }
            for c in combos {
                println!("{} -> {}", c.id, c.display_text);
            }
        }
        ComboCommand::Show { id } => {
            let conn = open_store(store_path)?;
            let details = combo::load_combo_details(&conn, &id)?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
    }
    Ok(())
}
