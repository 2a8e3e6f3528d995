use std::cmp::Ordering;

use crate::model::{Millis, Note, NoteState, StateCategory};

/// An ON note older than this stops being urgent and sinks below everything
/// with a live timer.
pub const ON_STALE_MS: Millis = 30 * 60 * 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    ByTime,
    ByMap,
}

impl SortMode {
    pub fn toggled(self) -> Self {
        match self {
            SortMode::ByTime => SortMode::ByMap,
            SortMode::ByMap => SortMode::ByTime,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByTime => "by time",
            SortMode::ByMap => "by map",
        }
    }
}

pub fn compare(a: &Note, b: &Note, mode: SortMode, now: Millis) -> Ordering {
    match mode {
        // Levels are not unique, so two notes can tie on (level, channel);
        // the time ordering is the final tie-break.
        SortMode::ByMap => a
            .map_level
            .cmp(&b.map_level)
            .reverse()
            .then_with(|| a.channel.cmp(&b.channel))
            .then_with(|| time_order(a, b, now)),
        SortMode::ByTime => time_order(a, b, now),
    }
}

fn time_order(a: &Note, b: &Note, now: Millis) -> Ordering {
    let a_stale = is_stale_on(a, now);
    let b_stale = is_stale_on(b, now);
    if a_stale != b_stale {
        // Stale ON entries sink to the bottom.
        return if a_stale { Ordering::Greater } else { Ordering::Less };
    }
    category_rank(a)
        .cmp(&category_rank(b))
        .then_with(|| within_category(a, b))
}

fn is_stale_on(note: &Note, now: Millis) -> bool {
    match note.state {
        NoteState::On { on_time } => now - on_time > ON_STALE_MS,
        _ => false,
    }
}

fn category_rank(note: &Note) -> u8 {
    match note.state.category() {
        StateCategory::On => 1,
        StateCategory::Stage => 2,
        StateCategory::Cooldown => 3,
    }
}

fn within_category(a: &Note, b: &Note) -> Ordering {
    match (&a.state, &b.state) {
        // Longest on the field first.
        (NoteState::On { on_time: ta }, NoteState::On { on_time: tb }) => ta.cmp(tb),
        (
            NoteState::Stage { stage: sa, stage_time: ta },
            NoteState::Stage { stage: sb, stage_time: tb },
        ) => sb.cmp(sa).then_with(|| cmp_opt(ta, tb)),
        (
            NoteState::Cooldown { respawn_time: ta },
            NoteState::Cooldown { respawn_time: tb },
        ) => ta.cmp(tb),
        _ => Ordering::Equal,
    }
}

// Timestamped stage entries ahead of ones recorded without a time.
fn cmp_opt(a: &Option<Millis>, b: &Option<Millis>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(level: u32, channel: u32, state: NoteState) -> Note {
        Note::new(level, String::new(), channel, state, 4)
    }

    fn sorted(mut notes: Vec<Note>, mode: SortMode, now: Millis) -> Vec<Note> {
        notes.sort_by(|a, b| compare(a, b, mode, now));
        notes
    }

    #[test]
    fn categories_order_on_stage_cd() {
        let now = 1_000_000;
        let out = sorted(
            vec![
                note(80, 1, NoteState::Cooldown { respawn_time: now + 60_000 }),
                note(81, 1, NoteState::Stage { stage: 2, stage_time: Some(now) }),
                note(82, 1, NoteState::On { on_time: now }),
            ],
            SortMode::ByTime,
            now,
        );
        assert_eq!(out[0].map_level, 82);
        assert_eq!(out[1].map_level, 81);
        assert_eq!(out[2].map_level, 80);
    }

    #[test]
    fn stale_on_sinks_below_cooldowns() {
        let now = 10_000_000;
        let out = sorted(
            vec![
                note(80, 1, NoteState::On { on_time: now - ON_STALE_MS - 1 }),
                note(81, 1, NoteState::Cooldown { respawn_time: now + 60_000 }),
                note(82, 1, NoteState::On { on_time: now - 1000 }),
            ],
            SortMode::ByTime,
            now,
        );
        assert_eq!(out[0].map_level, 82);
        assert_eq!(out[1].map_level, 81);
        assert_eq!(out[2].map_level, 80);
    }

    #[test]
    fn higher_stage_first_then_earlier_stage_time() {
        let now = 1_000_000;
        let out = sorted(
            vec![
                note(80, 1, NoteState::Stage { stage: 2, stage_time: Some(now - 100) }),
                note(81, 1, NoteState::Stage { stage: 3, stage_time: None }),
                note(82, 1, NoteState::Stage { stage: 3, stage_time: Some(now - 50) }),
            ],
            SortMode::ByTime,
            now,
        );
        assert_eq!(out[0].map_level, 82);
        assert_eq!(out[1].map_level, 81);
        assert_eq!(out[2].map_level, 80);
    }

    #[test]
    fn cooldowns_soonest_first() {
        let now = 1_000_000;
        let out = sorted(
            vec![
                note(80, 1, NoteState::Cooldown { respawn_time: now + 300_000 }),
                note(81, 1, NoteState::Cooldown { respawn_time: now + 60_000 }),
            ],
            SortMode::ByTime,
            now,
        );
        assert_eq!(out[0].map_level, 81);
    }

    #[test]
    fn by_map_descends_level_then_ascends_channel() {
        let now = 1_000_000;
        let out = sorted(
            vec![
                note(80, 2, NoteState::On { on_time: now }),
                note(83, 1, NoteState::Cooldown { respawn_time: now }),
                note(80, 1, NoteState::On { on_time: now }),
            ],
            SortMode::ByMap,
            now,
        );
        assert_eq!((out[0].map_level, out[0].channel), (83, 1));
        assert_eq!((out[1].map_level, out[1].channel), (80, 1));
        assert_eq!((out[2].map_level, out[2].channel), (80, 2));
    }

    #[test]
    fn by_map_ties_break_on_time() {
        let now = 1_000_000;
        let mut late = note(70, 1, NoteState::Cooldown { respawn_time: now + 300_000 });
        late.note_text = "水路橋地區".into();
        let mut soon = note(70, 1, NoteState::Cooldown { respawn_time: now + 60_000 });
        soon.note_text = "阿雷魯諾男爵領".into();
        let out = sorted(vec![late, soon], SortMode::ByMap, now);
        assert_eq!(out[0].note_text, "阿雷魯諾男爵領");
        assert_eq!(out[1].note_text, "水路橋地區");
    }
}
