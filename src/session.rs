//! Glue between the persisted store and the live board: bootstraps the
//! catalog (running any pending migrations), loads notes, and carries the
//! feature flags every surface needs.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::board::{Board, SortMode, StateTarget};
use crate::catalog::{Catalog, migrate};
use crate::model::{Millis, Note, NoteState, now_ms};
use crate::notify::Locale;
use crate::parse::{self, TimeToken};
use crate::store::{LocalStore, Theme};

pub struct Session {
    pub store: LocalStore,
    pub catalog: Catalog,
    pub board: Board,
    pub theme: Theme,
    pub locale: Locale,
    pub nosec: bool,
    /// Set when a catalog migration step failed on startup; the cursor was
    /// left behind so the step retries next launch.
    pub migration_warning: Option<String>,
}

/// A shorthand line that parsed but still needs a map chosen, carried
/// through the disambiguation dialog.
#[derive(Clone, Debug)]
pub struct NoteDraft {
    pub map_level: u32,
    pub channel: u32,
    pub token: Option<String>,
}

#[derive(Debug)]
pub enum LineOutcome {
    Added { id: String, map_level: u32 },
    NeedsMapPick { draft: NoteDraft, candidates: Vec<MapChoice> },
}

#[derive(Clone, Debug)]
pub struct MapChoice {
    pub episode: u32,
    pub name: String,
    pub en_name: String,
}

impl Session {
    pub fn open(data_dir: &Path, locale: Locale, nosec: bool) -> Result<Session> {
        let store = LocalStore::open(data_dir)?;

        let stored = store.load_map_data()?;
        let (entries, version) = match stored {
            Some(entries) => (entries, store.load_map_version()?),
            // Fresh install: the built-in catalog is already current.
            None => (
                crate::catalog::data::builtin_entries(),
                migrate::migrations().len(),
            ),
        };
        let outcome = migrate::run_pending(entries, version);
        store.save_map_data(&outcome.entries)?;
        store.save_map_version(outcome.version)?;
        let migration_warning = outcome
            .error
            .as_ref()
            .map(|e| format!("catalog update stalled: {e:#}"));
        let catalog = Catalog::new(outcome.entries);

        let notes = store.load_notes()?;
        let mut board = Board::new(notes, SortMode::ByTime);
        board.refresh_stars(&catalog);

        let theme = store.load_theme()?;

        Ok(Session {
            store,
            catalog,
            board,
            theme,
            locale,
            nosec,
            migration_warning,
        })
    }

    /// Write the note list out if anything changed since the last call.
    pub fn persist(&mut self) -> Result<bool> {
        if self.board.take_dirty() {
            self.store.save_notes(self.board.notes())?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        self.store.save_theme(self.theme)?;
        Ok(self.theme)
    }

    /// Star or unstar a catalog entry, persist the catalog, and rewrite the
    /// stars on any notes pointing at it.
    pub fn toggle_star(&mut self, level: u32, name: Option<&str>) -> Result<bool> {
        let toggled = match name {
            Some(name) => self.catalog.toggle_star(level, name),
            None => self.catalog.toggle_star_by_level(level),
        };
        let Some(starred) = toggled else {
            bail!("no map at level {level}");
        };
        self.store.save_map_data(self.catalog.entries())?;
        self.board.refresh_stars(&self.catalog);
        Ok(starred)
    }

    /// One shorthand line in, one note out, unless the level hosts several
    /// maps and none was named; then the caller gets the candidate list and
    /// finishes through [`Session::add_with_map`].
    pub fn submit_line(&mut self, line: &str, now: Millis) -> Result<LineOutcome> {
        let parsed = parse::parse_line(line, &self.catalog);
        let map_level = parsed
            .map_level
            .context("line must start with a map level")?;
        let channel = parsed
            .channel
            .with_context(|| format!("no channel number for level {map_level}"))?;

        let hosts = self.catalog.by_level(map_level);
        if hosts.is_empty() {
            bail!("no map at level {map_level}");
        }

        let draft = NoteDraft {
            map_level,
            channel,
            token: parsed.token,
        };
        match parsed.map_name {
            Some(name) => {
                let id = self.add_with_map(&draft, &name, now)?;
                Ok(LineOutcome::Added { id, map_level })
            }
            None if hosts.len() > 1 => {
                let mut candidates: Vec<MapChoice> = hosts
                    .iter()
                    .map(|e| MapChoice {
                        episode: e.episode,
                        name: e.name.clone(),
                        en_name: e.en_name.clone(),
                    })
                    .collect();
                candidates.sort_by(|a, b| a.episode.cmp(&b.episode).then(a.name.cmp(&b.name)));
                Ok(LineOutcome::NeedsMapPick { draft, candidates })
            }
            None => {
                let name = hosts[0].name.clone();
                let id = self.add_with_map(&draft, &name, now)?;
                Ok(LineOutcome::Added { id, map_level })
            }
        }
    }

    pub fn add_with_map(&mut self, draft: &NoteDraft, name: &str, now: Millis) -> Result<String> {
        let entry = self
            .catalog
            .find(draft.map_level, name)
            .with_context(|| format!("no map {name:?} at level {}", draft.map_level))?;
        if draft.channel < 1 {
            bail!("channel numbers start at 1");
        }

        // Stage notation carries its own cap, e.g. `2/5` on a 4-stage map.
        let mut max_stages = entry.max_stages;
        let state = match draft.token.as_deref() {
            None => NoteState::On { on_time: now },
            Some(token) => match parse::parse_time_token(token, self.nosec)? {
                TimeToken::On => NoteState::On { on_time: now },
                TimeToken::Stage { stage, max } => {
                    max_stages = max;
                    NoteState::Stage { stage, stage_time: Some(now) }
                }
                TimeToken::Cooldown { seconds } => NoteState::Cooldown {
                    respawn_time: TimeToken::respawn_at(seconds, now),
                },
            },
        };

        let mut note = Note::new(
            draft.map_level,
            entry.name.clone(),
            draft.channel,
            state,
            max_stages,
        );
        note.is_starred = entry.is_starred;
        let id = note.id.clone();
        self.board.add_note(note, now);
        Ok(id)
    }

    /// Manual state change from the update dialog.
    pub fn update_state(&mut self, id: &str, target: StateTarget) -> Result<()> {
        if !self.board.set_state(id, target, &self.catalog, now_ms()) {
            bail!("note is gone");
        }
        Ok(())
    }
}
