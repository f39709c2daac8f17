use std::path::Path;

use anyhow::{Result, bail};

mod combo;
mod drill;
mod new;
mod word;

pub(crate) use combo::cmd_combo;
pub(crate) use drill::cmd_drill;
pub(crate) use new::cmd_new;
pub(crate) use word::cmd_word;

use bigbean::graph::{MAX_BRIDGE_HOPS, WordGraph};
use bigbean::{open_store, store};

pub(crate) fn require_store_path(path: Option<&Path>) -> Result<&Path> {
    match path {
        Some(p) => Ok(p),
        None => bail!("specify --db PATH for this command"),
    }
}

pub(crate) fn cmd_bridge(store_path: &Path, word_a: &str, word_b: &str) -> Result<()> {
    let conn = open_store(store_path)?;
    let graph = WordGraph::build(&conn)?;
    match graph.find_bridge(word_a, word_b) {
        Some(path) => {
            println!("{} combo(s) bridge `{word_a}` to `{word_b}`:", path.len());
            for combo_id in path {
                println!("  {combo_id}");
            }
        }
        None => println!(
            "no bridge between `{word_a}` and `{word_b}` within {MAX_BRIDGE_HOPS} hops"
        ),
    }
    Ok(())
}

pub(crate) fn cmd_stats(store_path: &Path, json: bool) -> Result<()> {
    let conn = open_store(store_path)?;
    let progress = store::progress(&conn)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
    } else {
        println!(
            "{} base words: {} learnt, {} to learn",
            progress.total, progress.learnt, progress.unlearnt
        );
    }
    Ok(())
}

pub(crate) fn cmd_reset(store_path: &Path) -> Result<()> {
    let conn = open_store(store_path)?;
    let rows = store::clear_all_learnt(&conn)?;
    println!("cleared the learnt flag on {rows} word(s)");
    Ok(())
}
