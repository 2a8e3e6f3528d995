use crate::model::{Millis, Note, NoteState};

/// `m:ss`, or `h:mm:ss` once an hour is on the clock.
pub fn format_clock(mut seconds: i64) -> String {
    if seconds < 0 {
        seconds = 0;
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// One-line status cell for the board list.
pub fn status_text(note: &Note, now: Millis) -> String {
    match note.state {
        NoteState::On { on_time } => {
            format!("ON {}", format_clock((now - on_time) / 1000))
        }
        NoteState::Stage { stage, stage_time } => match stage_time {
            Some(t) => format!(
                "stage {}/{} {}",
                stage,
                note.max_stages,
                format_clock((now - t) / 1000)
            ),
            None => format!("stage {}/{}", stage, note.max_stages),
        },
        NoteState::Cooldown { respawn_time } => {
            if respawn_time <= now {
                "respawned".to_string()
            } else {
                format!("CD {}", format_clock((respawn_time - now) / 1000))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_rolls_into_hours() {
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(3605), "1:00:05");
        assert_eq!(format_clock(-3), "0:00");
    }

    #[test]
    fn expired_cooldown_reads_respawned() {
        let note = Note::new(
            80,
            "x".to_string(),
            1,
            NoteState::Cooldown { respawn_time: 1000 },
            4,
        );
        assert_eq!(status_text(&note, 2000), "respawned");
        assert_eq!(status_text(&note, 0), "CD 0:01");
    }
}
