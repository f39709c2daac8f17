mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bigbean", version, about = "Anchor-chained vocabulary drilling")]
struct Cli {
    /// Path to an existing vocabulary database
    #[arg(short = 'd', long = "db", global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new vocabulary database initialised with schema and PRAGMAs
    New {
        /// Project name or path for the database file
        name: String,
    },
    /// Manage vocabulary words
    Word {
        #[command(subcommand)]
        command: WordCommand,
    },
    /// Manage flashcard combos
    Combo {
        #[command(subcommand)]
        command: ComboCommand,
    },
    /// Find the shortest combo bridge between two words
    Bridge {
        /// First word id, e.g. apple-n-0
        word_a: String,
        /// Second word id
        word_b: String,
    },
    /// Show learning progress over base words
    Stats {
        /// Emit JSON instead of the plain summary
        #[arg(long)]
        json: bool,
    },
    /// Clear every learnt flag
    Reset,
    /// Interactive drill REPL
    Drill {
        /// Seed for reproducible tie-breaks
        #[arg(long)]
        seed: Option<u64>,
        /// Resume a session saved from a previous drill
        #[arg(long, value_name = "PATH")]
        resume: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum WordCommand {
    /// Insert a word with a derived `lemma-pos-variant` id
    Add {
        /// Surface form, e.g. "apple" or "pick up"
        lemma: String,
        /// Part-of-speech tag: n, v, j, or pv
        #[arg(long)]
        pos: String,
        /// Disambiguating variant index
        #[arg(long, default_value_t = 0)]
        variant: u32,
    },
    /// List words
    List {
        /// Filter by part-of-speech tag
        #[arg(long)]
        pos: Option<String>,
        /// Only words not yet learnt
        #[arg(long)]
        unlearnt: bool,
    },
    /// Show a word as JSON
    Show { id: String },
}

#[derive(Subcommand)]
enum ComboCommand {
    /// Insert a combo linking two or more existing words
    Add {
        /// Human-readable prompt, e.g. "Green Apple"
        #[arg(long)]
        display: String,
        /// Optional illustrative media reference
        #[arg(long)]
        image: Option<String>,
        /// Member word ids (repeat; at least two)
        #[arg(long = "word", value_name = "WORD_ID", required = true)]
        words: Vec<String>,
        /// Disambiguating variant index for the derived id
        #[arg(long, default_value_t = 0)]
        variant: u32,
    },
    /// List combos
    List,
    /// Show a combo and its member words as JSON
    Show { id: String },
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::New { name } => commands::cmd_new(&name),
        Command::Word { command } => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_word(store_path, command)
        }
        Command::Combo { command } => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_combo(store_path, command)
        }
        Command::Bridge { word_a, word_b } => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_bridge(store_path, &word_a, &word_b)
        }
        Command::Stats { json } => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_stats(store_path, json)
        }
        Command::Reset => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_reset(store_path)
        }
        Command::Drill { seed, resume } => {
            let store_path = commands::require_store_path(cli.store.as_deref())?;
            commands::cmd_drill(store_path, seed, resume.as_deref())
        }
    }
}
