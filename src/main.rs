use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fieldwatch::board::status::status_text;
use fieldwatch::model::now_ms;
use fieldwatch::notify::Locale;
use fieldwatch::session::Session;
use fieldwatch::transfer::{self, ConflictChoice};

#[derive(Parser)]
#[command(name = "fieldwatch")]
#[command(about = "Spawn tracking board", long_about = None)]
struct Cli {
    /// Data directory (defaults to ~/.fieldwatch)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// English map names and spoken alerts
    #[arg(long)]
    en: bool,

    /// Two-part durations read as hours.minutes instead of minutes.seconds
    #[arg(long)]
    nosec: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored notes as a transfer payload
    Export,

    /// Import a transfer payload from a file (or stdin)
    Import {
        file: Option<PathBuf>,
        /// Replace notes that already exist instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },

    /// List the stored notes
    Notes,

    /// List the map catalog
    Catalog {
        /// Only starred maps
        #[arg(long)]
        starred: bool,
    },

    /// Toggle a star on a map (name picks between maps sharing a level)
    Star { level: u32, name: Option<String> },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .context("cannot locate a home directory (pass --data-dir)")?
            .join(".fieldwatch"),
    };
    let locale = if cli.en { Locale::EnUs } else { Locale::ZhTw };
    let mut session = Session::open(&data_dir, locale, cli.nosec)?;

    let Some(command) = cli.command else {
        return fieldwatch::tui_shell::run(session);
    };

    if let Some(warning) = session.migration_warning.take() {
        eprintln!("{warning}");
    }

    match command {
        Commands::Export => {
            let payload = transfer::export_payload(session.board.notes())?;
            println!("{payload}");
        }

        Commands::Import { file, overwrite } => {
            let payload = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("read stdin")?;
                    buf
                }
            };
            let records = transfer::parse_payload(&payload)?;
            let plan = transfer::plan_import(
                records,
                &session.catalog,
                session.board.notes(),
                now_ms(),
            )?;
            let skipped = if overwrite { 0 } else { plan.conflicts.len() };
            let choice = if overwrite {
                ConflictChoice::OverwriteAll
            } else {
                ConflictChoice::SkipConflicts
            };
            let applied = session.board.import(plan, choice, now_ms());
            session.persist()?;
            if skipped > 0 {
                println!("Imported {applied} notes ({skipped} already present, skipped)");
            } else {
                println!("Imported {applied} notes");
            }
        }

        Commands::Notes => {
            let now = now_ms();
            for note in session.board.notes() {
                let star = if note.is_starred { "*" } else { " " };
                let name = if cli.en {
                    session.catalog.en_name(note.map_level, &note.note_text)
                } else {
                    note.note_text.clone()
                };
                println!(
                    "{star} Lv{:<3} {:<24} ch{:<3} {}",
                    note.map_level,
                    name,
                    note.channel,
                    status_text(note, now)
                );
            }
        }

        Commands::Catalog { starred } => {
            for entry in session.catalog.entries() {
                if starred && !entry.is_starred {
                    continue;
                }
                let star = if entry.is_starred { "*" } else { " " };
                let name = if cli.en { &entry.en_name } else { &entry.name };
                println!("{star} EP{:<2} Lv{:<3} {}", entry.episode, entry.level, name);
            }
        }

        Commands::Star { level, name } => {
            let starred = session.toggle_star(level, name.as_deref())?;
            session.persist()?;
            println!("Lv{level} {}", if starred { "starred" } else { "unstarred" });
        }
    }

    Ok(())
}
