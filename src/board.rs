pub mod alerts;
pub mod sort;
pub mod status;

use crate::catalog::Catalog;
use crate::model::{Millis, Note, NoteState};

pub use sort::SortMode;

/// Where an update dialog or shorthand token wants a note to go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateTarget {
    On,
    Stage(u32),
    /// Cooldown from the map's configured respawn interval.
    DefaultCooldown,
    /// Cooldown ending at an explicit time.
    CooldownUntil(Millis),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelAdjust {
    Changed(u32),
    AtMinimum,
    UnknownNote,
}

/// The live note list plus its sort mode. Every mutation sets a dirty flag
/// the caller drains to decide when to persist.
#[derive(Debug, Default)]
pub struct Board {
    notes: Vec<Note>,
    sort_mode: SortMode,
    dirty: bool,
}

impl Board {
    pub fn new(notes: Vec<Note>, sort_mode: SortMode) -> Self {
        let mut board = Board { notes, sort_mode, dirty: false };
        board.resort(crate::model::now_ms());
        board
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        self.dirty = true;
        &mut self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn toggle_sort_mode(&mut self, now: Millis) -> SortMode {
        self.sort_mode = self.sort_mode.toggled();
        self.resort(now);
        self.sort_mode
    }

    /// True once since the last call if anything changed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Duplicates are allowed but flagged: a new note matching an existing
    /// one on (level, channel, name) comes in with its warning lamp lit.
    pub fn add_note(&mut self, mut note: Note, now: Millis) {
        let duplicate = self
            .notes
            .iter()
            .any(|n| n.dedup_key() == note.dedup_key());
        note.is_warning = duplicate;
        self.notes.push(note);
        self.dirty = true;
        self.resort(now);
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.notes.is_empty() {
            self.notes.clear();
            self.dirty = true;
        }
    }

    /// Apply a state transition. Re-entering ON keeps the original on-time
    /// and re-entering the same stage keeps its timestamp; everything else
    /// restamps. The alert latch drops on every call so the next expiry
    /// announces again, and leaving for cooldown clears the duplicate
    /// warning since the spot has been reconciled.
    pub fn set_state(
        &mut self,
        id: &str,
        target: StateTarget,
        catalog: &Catalog,
        now: Millis,
    ) -> bool {
        let Some(note) = self.find_mut(id) else {
            return false;
        };
        match target {
            StateTarget::On => {
                if !matches!(note.state, NoteState::On { .. }) {
                    note.state = NoteState::On { on_time: now };
                }
            }
            StateTarget::Stage(stage) => {
                let stage = stage.clamp(1, note.max_stages.max(1));
                let keep = match note.state {
                    NoteState::Stage { stage: s, stage_time } if s == stage => stage_time,
                    _ => None,
                };
                note.state = NoteState::Stage {
                    stage,
                    stage_time: keep.or(Some(now)),
                };
            }
            StateTarget::DefaultCooldown => {
                let seconds = catalog
                    .find(note.map_level, &note.note_text)
                    .or_else(|| catalog.first_by_level(note.map_level))
                    .map(|e| e.respawn_seconds)
                    .unwrap_or(crate::catalog::data::DEFAULT_RESPAWN_SECS);
                note.state = NoteState::Cooldown {
                    respawn_time: now + (seconds as i64) * 1000,
                };
                note.is_warning = false;
            }
            StateTarget::CooldownUntil(respawn_time) => {
                note.state = NoteState::Cooldown { respawn_time };
                note.is_warning = false;
            }
        }
        note.has_alerted = false;
        self.dirty = true;
        self.resort(now);
        true
    }

    /// Channel 1 is the floor; decrementing past it is refused.
    pub fn adjust_channel(&mut self, id: &str, delta: i32, now: Millis) -> ChannelAdjust {
        let Some(note) = self.find_mut(id) else {
            return ChannelAdjust::UnknownNote;
        };
        let next = note.channel as i64 + delta as i64;
        if next < 1 {
            return ChannelAdjust::AtMinimum;
        }
        note.channel = next as u32;
        note.is_highlight = true;
        let channel = note.channel;
        self.dirty = true;
        self.resort(now);
        ChannelAdjust::Changed(channel)
    }

    pub fn toggle_sound(&mut self, id: &str) -> Option<bool> {
        let note = self.find_mut(id)?;
        note.has_sound = !note.has_sound;
        let enabled = note.has_sound;
        self.dirty = true;
        Some(enabled)
    }

    pub fn set_all_sound(&mut self, enabled: bool) {
        for note in &mut self.notes {
            note.has_sound = enabled;
        }
        self.dirty = true;
    }

    /// Highlight every note on a level; used when an ambiguous shorthand
    /// line needed a map picked and the pick should be visible.
    pub fn set_highlight(&mut self, map_level: u32) {
        for note in &mut self.notes {
            note.is_highlight = note.map_level == map_level;
        }
    }

    pub fn clear_highlights(&mut self) {
        for note in &mut self.notes {
            note.is_highlight = false;
            note.is_warning = false;
        }
    }

    /// Fold an import plan in and re-sort.
    pub fn import(
        &mut self,
        plan: crate::transfer::ImportPlan,
        choice: crate::transfer::ConflictChoice,
        now: Millis,
    ) -> usize {
        let applied = crate::transfer::apply_import(&mut self.notes, plan, choice);
        if applied > 0 {
            self.dirty = true;
            self.resort(now);
        }
        applied
    }

    /// Run the alert pass; marks dirty only when a latch actually flipped so
    /// the half-second cadence does not rewrite an idle board.
    pub fn scan_alerts(
        &mut self,
        catalog: &Catalog,
        locale: crate::notify::Locale,
        now: Millis,
    ) -> Vec<alerts::Alert> {
        let before = self.notes.iter().filter(|n| n.has_alerted).count();
        let out = alerts::scan(&mut self.notes, catalog, locale, now);
        if self.notes.iter().filter(|n| n.has_alerted).count() != before {
            self.dirty = true;
        }
        out
    }

    pub fn resort(&mut self, now: Millis) {
        let mode = self.sort_mode;
        self.notes.sort_by(|a, b| sort::compare(a, b, mode, now));
    }

    /// Re-derive each note's star from the catalog after stars change.
    pub fn refresh_stars(&mut self, catalog: &Catalog) {
        for note in &mut self.notes {
            let starred = catalog
                .find(note.map_level, &note.note_text)
                .or_else(|| catalog.first_by_level(note.map_level))
                .map(|e| e.is_starred)
                .unwrap_or(false);
            if note.is_starred != starred {
                note.is_starred = starred;
                self.dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(notes: Vec<Note>) -> Board {
        Board::new(notes, SortMode::ByTime)
    }

    fn note(level: u32, name: &str, channel: u32) -> Note {
        Note::new(
            level,
            name.to_string(),
            channel,
            NoteState::On { on_time: 1_000 },
            4,
        )
    }

    #[test]
    fn duplicate_add_lights_warning() {
        let mut board = board_with(vec![note(83, "大教堂至聖所", 2)]);
        board.add_note(note(83, "大教堂至聖所", 2), 2_000);
        board.add_note(note(83, "大教堂至聖所", 3), 2_000);
        let warnings: Vec<bool> = board.notes().iter().map(|n| n.is_warning).collect();
        assert_eq!(warnings.iter().filter(|w| **w).count(), 1);
    }

    #[test]
    fn on_is_idempotent_and_resets_latch() {
        let catalog = Catalog::builtin();
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();
        board.notes_mut()[0].has_alerted = true;

        assert!(board.set_state(&id, StateTarget::On, &catalog, 9_000));
        let n = board.get(&id).unwrap();
        assert_eq!(n.on_time(), Some(1_000));
        assert!(!n.has_alerted);
    }

    #[test]
    fn same_stage_keeps_its_time() {
        let catalog = Catalog::builtin();
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();

        board.set_state(&id, StateTarget::Stage(3), &catalog, 5_000);
        assert_eq!(board.get(&id).unwrap().stage_time(), Some(5_000));
        board.set_state(&id, StateTarget::Stage(3), &catalog, 9_000);
        assert_eq!(board.get(&id).unwrap().stage_time(), Some(5_000));
        board.set_state(&id, StateTarget::Stage(2), &catalog, 9_000);
        assert_eq!(board.get(&id).unwrap().stage_time(), Some(9_000));
    }

    #[test]
    fn stage_clamps_to_max() {
        let catalog = Catalog::builtin();
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();
        board.set_state(&id, StateTarget::Stage(9), &catalog, 5_000);
        assert!(matches!(
            board.get(&id).unwrap().state,
            NoteState::Stage { stage: 4, .. }
        ));
    }

    #[test]
    fn default_cooldown_uses_catalog_interval() {
        let catalog = Catalog::builtin();
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();
        let secs = catalog.find(83, "大教堂至聖所").unwrap().respawn_seconds as i64;

        board.set_state(&id, StateTarget::DefaultCooldown, &catalog, 10_000);
        assert_eq!(board.get(&id).unwrap().respawn_time(), Some(10_000 + secs * 1000));
    }

    #[test]
    fn cooldown_clears_duplicate_warning() {
        let catalog = Catalog::builtin();
        let mut board = board_with(vec![note(83, "大教堂至聖所", 2)]);
        board.add_note(note(83, "大教堂至聖所", 2), 2_000);
        let id = board
            .notes()
            .iter()
            .find(|n| n.is_warning)
            .unwrap()
            .id
            .clone();
        board.set_state(&id, StateTarget::CooldownUntil(99_000), &catalog, 2_500);
        assert!(!board.get(&id).unwrap().is_warning);
    }

    #[test]
    fn channel_floor_is_one() {
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();
        assert_eq!(board.adjust_channel(&id, -1, 2_000), ChannelAdjust::AtMinimum);
        assert_eq!(board.get(&id).unwrap().channel, 1);
        assert_eq!(board.adjust_channel(&id, 1, 2_000), ChannelAdjust::Changed(2));
        assert_eq!(
            board.adjust_channel("nope", 1, 2_000),
            ChannelAdjust::UnknownNote
        );
    }

    #[test]
    fn sound_toggle_flips_and_reports() {
        let mut board = board_with(vec![note(83, "大教堂至聖所", 1)]);
        let id = board.notes()[0].id.clone();
        board.take_dirty();
        assert_eq!(board.toggle_sound(&id), Some(false));
        assert_eq!(board.toggle_sound(&id), Some(true));
        assert_eq!(board.toggle_sound("nope"), None);
        assert!(board.take_dirty());
    }

    #[test]
    fn dirty_flag_drains() {
        let mut board = board_with(vec![]);
        assert!(!board.take_dirty());
        board.add_note(note(83, "大教堂至聖所", 1), 2_000);
        assert!(board.take_dirty());
        assert!(!board.take_dirty());
    }
}
