use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Epoch milliseconds, matching the persisted JSON shapes.
pub type Millis = i64;

pub fn now_ms() -> Millis {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as Millis
}

/// The one state a note is always in. Exactly one timestamp is carried,
/// matching the state; the flat `onTime`/`stageTime`/`respawnTime` trio of
/// the persisted shape is reconstructed on serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteState {
    On { on_time: Millis },
    Stage { stage: u32, stage_time: Option<Millis> },
    Cooldown { respawn_time: Millis },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateCategory {
    On = 1,
    Stage = 2,
    Cooldown = 3,
}

impl NoteState {
    pub fn category(&self) -> StateCategory {
        match self {
            NoteState::On { .. } => StateCategory::On,
            NoteState::Stage { .. } => StateCategory::Stage,
            NoteState::Cooldown { .. } => StateCategory::Cooldown,
        }
    }

    pub fn tag(&self) -> String {
        match self {
            NoteState::On { .. } => "ON".to_string(),
            NoteState::Stage { stage, .. } => format!("STAGE_{}", stage),
            NoteState::Cooldown { .. } => "CD".to_string(),
        }
    }

    /// Rebuild the tagged state from the flat persisted representation.
    pub fn from_parts(
        tag: &str,
        on_time: Option<Millis>,
        stage_time: Option<Millis>,
        respawn_time: Option<Millis>,
    ) -> Result<Self> {
        if tag.eq_ignore_ascii_case("on") {
            return Ok(NoteState::On {
                on_time: on_time.unwrap_or(0),
            });
        }
        if tag == "CD" {
            return Ok(NoteState::Cooldown {
                respawn_time: respawn_time.unwrap_or(0),
            });
        }
        if let Some(rest) = tag.strip_prefix("STAGE_") {
            let stage: u32 = rest
                .parse()
                .map_err(|_| anyhow!("bad stage in note state {:?}", tag))?;
            return Ok(NoteState::Stage { stage, stage_time });
        }
        Err(anyhow!("unknown note state {:?}", tag))
    }
}

/// One tracked channel instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoteRecord", into = "NoteRecord")]
pub struct Note {
    pub id: String,
    pub map_level: u32,
    pub note_text: String,
    pub channel: u32,
    pub state: NoteState,
    pub max_stages: u32,
    pub is_starred: bool,
    pub has_sound: bool,
    /// Latch: one alert per cooldown expiry. Reset on every transition.
    pub has_alerted: bool,
    pub is_warning: bool,
    pub is_highlight: bool,
}

impl Note {
    pub fn new(
        map_level: u32,
        note_text: String,
        channel: u32,
        state: NoteState,
        max_stages: u32,
    ) -> Self {
        Note {
            id: new_note_id(),
            map_level,
            note_text,
            channel,
            state,
            max_stages,
            is_starred: false,
            has_sound: true,
            has_alerted: false,
            is_warning: false,
            is_highlight: false,
        }
    }

    pub fn on_time(&self) -> Option<Millis> {
        match self.state {
            NoteState::On { on_time } => Some(on_time),
            _ => None,
        }
    }

    pub fn stage_time(&self) -> Option<Millis> {
        match self.state {
            NoteState::Stage { stage_time, .. } => stage_time,
            _ => None,
        }
    }

    pub fn respawn_time(&self) -> Option<Millis> {
        match self.state {
            NoteState::Cooldown { respawn_time } => Some(respawn_time),
            _ => None,
        }
    }

    /// Key the import merge (and manual duplicate detection) goes by.
    pub fn dedup_key(&self) -> (u32, u32, &str) {
        (self.map_level, self.channel, self.note_text.as_str())
    }
}

/// Persisted/wire shape of a note: flat fields, camelCase, `state` as the
/// `"ON" | "CD" | "STAGE_<n>"` string. Transient flags default to false when
/// absent from an older snapshot.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    id: String,
    map_level: u32,
    note_text: String,
    channel: u32,
    state: String,
    #[serde(default)]
    on_time: Option<Millis>,
    #[serde(default)]
    stage_time: Option<Millis>,
    #[serde(default)]
    respawn_time: Option<Millis>,
    #[serde(default = "default_max_stages")]
    max_stages: u32,
    #[serde(default)]
    is_starred: bool,
    #[serde(default = "default_true")]
    has_sound: bool,
    #[serde(default)]
    has_alerted: bool,
    #[serde(default)]
    is_warning: bool,
    #[serde(default)]
    is_highlight: bool,
}

fn default_max_stages() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

impl TryFrom<NoteRecord> for Note {
    type Error = anyhow::Error;

    fn try_from(rec: NoteRecord) -> Result<Self> {
        let state =
            NoteState::from_parts(&rec.state, rec.on_time, rec.stage_time, rec.respawn_time)?;
        Ok(Note {
            id: rec.id,
            map_level: rec.map_level,
            note_text: rec.note_text,
            channel: rec.channel,
            state,
            max_stages: rec.max_stages.max(1),
            is_starred: rec.is_starred,
            has_sound: rec.has_sound,
            has_alerted: rec.has_alerted,
            is_warning: rec.is_warning,
            is_highlight: rec.is_highlight,
        })
    }
}

impl From<Note> for NoteRecord {
    fn from(note: Note) -> Self {
        NoteRecord {
            state: note.state.tag(),
            on_time: note.on_time(),
            stage_time: note.stage_time(),
            respawn_time: note.respawn_time(),
            id: note.id,
            map_level: note.map_level,
            note_text: note.note_text,
            channel: note.channel,
            max_stages: note.max_stages,
            is_starred: note.is_starred,
            has_sound: note.has_sound,
            has_alerted: note.has_alerted,
            is_warning: note.is_warning,
            is_highlight: note.is_highlight,
        }
    }
}

/// One catalog row. `(level, name)` is the authoritative key; a level may
/// host several named maps across episodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub episode: u32,
    pub level: u32,
    pub name: String,
    #[serde(default)]
    pub en_name: String,
    #[serde(default)]
    pub image_path: Option<String>,
    pub max_stages: u32,
    pub respawn_seconds: u32,
    #[serde(default)]
    pub is_starred: bool,
}

/// 16 bytes of entropy, hex-encoded. Never reused.
pub fn new_note_id() -> String {
    let mut bytes = [0u8; 16];
    if getrandom::getrandom(&mut bytes).is_err() {
        // List keys only need uniqueness within one user's collection.
        let ms = now_ms();
        return format!("t{:x}", ms);
    }
    let mut out = String::with_capacity(32);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with_state(state: NoteState) -> Note {
        Note {
            id: "x".to_string(),
            map_level: 1,
            note_text: String::new(),
            channel: 1,
            state,
            max_stages: 4,
            is_starred: false,
            has_sound: true,
            has_alerted: false,
            is_warning: false,
            is_highlight: false,
        }
    }

    #[test]
    fn note_roundtrips_through_flat_record() {
        let mut note = note_with_state(NoteState::Cooldown {
            respawn_time: 1_700_000_000_000,
        });
        note.map_level = 83;
        note.note_text = "大教堂至聖所".to_string();
        note.channel = 2;
        note.is_starred = true;

        let json = serde_json::to_string(&note).unwrap();
        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note, back);

        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["state"], "CD");
        assert_eq!(raw["respawnTime"], 1_700_000_000_000i64);
        assert_eq!(raw["onTime"], serde_json::Value::Null);
    }

    #[test]
    fn exactly_one_timestamp_is_active() {
        let cases = [
            (NoteState::On { on_time: 5 }, (Some(5), None, None)),
            (
                NoteState::Stage {
                    stage: 3,
                    stage_time: Some(7),
                },
                (None, Some(7), None),
            ),
            (
                NoteState::Cooldown { respawn_time: 9 },
                (None, None, Some(9)),
            ),
        ];
        for (state, want) in cases {
            let note = note_with_state(state);
            assert_eq!(
                (note.on_time(), note.stage_time(), note.respawn_time()),
                want
            );
        }
    }

    #[test]
    fn transient_flags_default_false_on_load() {
        let json = r#"{"id":"a","mapLevel":80,"noteText":"大教堂懺悔路","channel":3,
            "state":"ON","onTime":123}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(!note.is_warning);
        assert!(!note.is_highlight);
        assert!(!note.has_alerted);
        assert!(note.has_sound);
        assert_eq!(note.max_stages, 4);
    }

    #[test]
    fn stage_state_parses_and_rejects_garbage() {
        let st = NoteState::from_parts("STAGE_3", None, Some(12), None).unwrap();
        assert_eq!(
            st,
            NoteState::Stage {
                stage: 3,
                stage_time: Some(12)
            }
        );
        assert!(NoteState::from_parts("STAGE_x", None, None, None).is_err());
        assert!(NoteState::from_parts("RESTING", None, None, None).is_err());
        // Old snapshots carried lowercase "on".
        assert!(NoteState::from_parts("on", Some(1), None, None).is_ok());
    }
}
