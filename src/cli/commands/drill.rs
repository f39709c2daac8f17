use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use rusqlite::Connection;

use bigbean::graph::WordGraph;
use bigbean::scheduler::{Card, NextCard, Scheduler, SessionState, load_session, save_session};
use bigbean::{open_store, store, word};

pub(crate) fn cmd_drill(store_path: &Path, seed: Option<u64>, resume: Option<&Path>) -> Result<()> {
    let conn = open_store(store_path)?;
    let graph = WordGraph::build(&conn)?;
    let mut scheduler = Scheduler::new(&conn, &graph, seed);
    let mut session = match resume {
        Some(path) => load_session(path)?,
        None => SessionState::new(),
    };

    println!("Drill REPL. Commands: next, back, stats, reset, save <path>, help, quit.");
    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("drill> ");
        io::stdout().flush().ok();
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap();
        let remaining: Vec<&str> = parts.collect();

        let result = match cmd {
            "help" => {
                println!(
                    "Commands:\n  next         show the next card\n  back         undo the last card\n  stats        learning progress over base words\n  reset        forget all progress and restart\n  save <path>  write the session as JSON for --resume\n  quit/exit    leave the drill"
                );
                Ok(())
            }
            "quit" | "exit" => break,
            "next" => next_card(&conn, &mut scheduler, &mut session),
            "back" => go_back(&conn, &mut scheduler, &mut session),
            "stats" => show_stats(&conn),
            "reset" => do_reset(&mut scheduler, &mut session),
            "save" => save(&remaining, &session),
            _ => Err(anyhow!("unknown command `{cmd}`")),
        };

        if let Err(err) = result {
            eprintln!("error: {err}");
        }
    }

    Ok(())
}

fn next_card(conn: &Connection, scheduler: &mut Scheduler<'_>, session: &mut SessionState) -> Result<()> {
    match scheduler.advance(session)? {
        NextCard::Card(card) => render_card(conn, &card),
        NextCard::Complete => {
            let progress = store::progress(conn)?;
            println!(
                "all {} base words learnt; use `reset` to start over",
                progress.total
            );
            Ok(())
        }
    }
}

fn go_back(conn: &Connection, scheduler: &mut Scheduler<'_>, session: &mut SessionState) -> Result<()> {
    match scheduler.retreat(session)? {
        Some(card) => render_card(conn, &card),
        None => {
            println!("back at the beginning");
            Ok(())
        }
    }
}

fn show_stats(conn: &Connection) -> Result<()> {
    let progress = store::progress(conn)?;
    println!(
        "{} base words: {} learnt, {} to learn",
        progress.total, progress.learnt, progress.unlearnt
    );
    Ok(())
}

fn do_reset(scheduler: &mut Scheduler<'_>, session: &mut SessionState) -> Result<()> {
    scheduler.reset(session)?;
    println!("progress cleared; the next card starts fresh");
    Ok(())
}

fn save(args: &[&str], session: &SessionState) -> Result<()> {
    if args.len() != 1 {
        bail!("save expects a path, e.g. save session.json");
    }
    let path = Path::new(args[0]);
    save_session(path, session)?;
    println!("session saved to {}", path.display());
    Ok(())
}

fn render_card(conn: &Connection, card: &Card) -> Result<()> {
    println!("{}", card.combo.display_text);
    if let Some(image) = &card.combo.image_path {
        println!("  image: {image}");
    }
    for word_id in &card.member_words {
        let entry = word::load_word(conn, word_id)?;
        let marker = if entry.id == card.anchor { "*" } else { " " };
        println!("  {marker} {} ({})", entry.content, entry.pos.as_tag());
    }
    println!(
        "  learning `{}` ({}/{})",
        card.anchor, card.card_number, card.max_cards
    );
    Ok(())
}
