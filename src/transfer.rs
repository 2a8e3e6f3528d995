//! Clipboard import/export. The payload is a single-line JSON array of
//! compact records so it survives chat clients; older verbose field names
//! are still accepted on the way in.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::model::{Millis, Note, NoteState, new_note_id};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(rename = "l", alias = "mapLevel")]
    pub map_level: u32,
    #[serde(rename = "n", alias = "noteText", default, skip_serializing_if = "Option::is_none")]
    pub note_text: Option<String>,
    #[serde(rename = "c", alias = "channel")]
    pub channel: u32,
    #[serde(rename = "s", alias = "state")]
    pub state: String,
    #[serde(rename = "o", alias = "onTime", default, skip_serializing_if = "Option::is_none")]
    pub on_time: Option<Millis>,
    #[serde(rename = "r", alias = "respawnTime", default, skip_serializing_if = "Option::is_none")]
    pub respawn_time: Option<Millis>,
}

impl TransferRecord {
    fn from_note(note: &Note) -> Self {
        TransferRecord {
            map_level: note.map_level,
            note_text: Some(note.note_text.clone()),
            channel: note.channel,
            state: note.state.tag(),
            on_time: note.on_time(),
            respawn_time: note.respawn_time(),
        }
    }
}

pub fn export_payload(notes: &[Note]) -> Result<String> {
    let records: Vec<TransferRecord> = notes.iter().map(TransferRecord::from_note).collect();
    serde_json::to_string(&records).context("encoding transfer payload")
}

pub fn parse_payload(payload: &str) -> Result<Vec<TransferRecord>> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        bail!("clipboard is empty, nothing to import");
    }
    let records: Vec<TransferRecord> =
        serde_json::from_str(trimmed).context("transfer payload is not a note list")?;
    if records.is_empty() {
        bail!("payload holds no notes, nothing to import");
    }
    Ok(records)
}

/// A record whose (level, channel, name) already exists on the board.
#[derive(Clone, Debug)]
pub struct Conflict {
    pub existing_id: String,
    pub incoming: Note,
}

#[derive(Debug, Default)]
pub struct ImportPlan {
    pub fresh: Vec<Note>,
    pub conflicts: Vec<Conflict>,
}

impl ImportPlan {
    pub fn is_empty(&self) -> bool {
        self.fresh.is_empty() && self.conflicts.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictChoice {
    OverwriteAll,
    SkipConflicts,
}

/// Materialize records against the catalog and split them into fresh notes
/// and conflicts with what is already on the board. A cooldown that expired
/// before import comes in pre-latched so it does not announce on arrival.
pub fn plan_import(
    records: Vec<TransferRecord>,
    catalog: &Catalog,
    existing: &[Note],
    now: Millis,
) -> Result<ImportPlan> {
    let mut plan = ImportPlan::default();
    for record in records {
        let note = materialize(record, catalog, now)?;
        let clash = existing.iter().find(|n| n.dedup_key() == note.dedup_key());
        match clash {
            Some(existing_note) => plan.conflicts.push(Conflict {
                existing_id: existing_note.id.clone(),
                incoming: note,
            }),
            None => plan.fresh.push(note),
        }
    }
    Ok(plan)
}

fn materialize(record: TransferRecord, catalog: &Catalog, now: Millis) -> Result<Note> {
    if record.channel < 1 {
        bail!(
            "record for level {} has channel {}, channels start at 1",
            record.map_level,
            record.channel
        );
    }
    let entry = match record.note_text.as_deref() {
        Some(name) => catalog.find(record.map_level, name),
        None => catalog.first_by_level(record.map_level),
    }
    .or_else(|| catalog.first_by_level(record.map_level));

    let note_text = record
        .note_text
        .or_else(|| entry.map(|e| e.name.clone()))
        .unwrap_or_else(|| record.map_level.to_string());

    let state = NoteState::from_parts(&record.state, record.on_time, None, record.respawn_time)
        .with_context(|| format!("record for level {} channel {}", record.map_level, record.channel))?;

    let mut note = Note {
        id: new_note_id(),
        map_level: record.map_level,
        note_text,
        channel: record.channel,
        state,
        max_stages: entry.map(|e| e.max_stages).unwrap_or(4),
        is_starred: entry.map(|e| e.is_starred).unwrap_or(false),
        has_sound: true,
        has_alerted: false,
        is_warning: false,
        is_highlight: false,
    };
    if let NoteState::Cooldown { respawn_time } = note.state {
        if respawn_time <= now {
            note.has_alerted = true;
        }
    }
    Ok(note)
}

/// Fold a plan into the note list. Overwriting keeps the existing note's id
/// so anything pointing at it stays valid.
pub fn apply_import(notes: &mut Vec<Note>, plan: ImportPlan, choice: ConflictChoice) -> usize {
    let mut applied = plan.fresh.len();
    notes.extend(plan.fresh);
    if choice == ConflictChoice::OverwriteAll {
        for conflict in plan.conflicts {
            if let Some(existing) = notes.iter_mut().find(|n| n.id == conflict.existing_id) {
                let id = existing.id.clone();
                *existing = conflict.incoming;
                existing.id = id;
                applied += 1;
            }
        }
    }
    applied
}
