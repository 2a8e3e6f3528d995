use crate::catalog::Catalog;
use crate::model::{Millis, Note, NoteState};
use crate::notify::{Locale, Notifier, Severity};

/// A cooldown that expired longer ago than this gets a silent visual alert
/// instead of speech, so reopening an old board does not talk over itself.
pub const FRESH_ALERT_WINDOW_MS: Millis = 3 * 60 * 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Alert {
    Spoken { text: String, locale: Locale },
    Visual { text: String },
}

/// One pass over the board: announce and latch every expired, unalerted
/// cooldown that has sound enabled. Muted notes are left unlatched, so a
/// note muted at expiry and unmuted later still alerts once.
pub fn scan(notes: &mut [Note], catalog: &Catalog, locale: Locale, now: Millis) -> Vec<Alert> {
    let mut out = Vec::new();
    for note in notes.iter_mut() {
        let NoteState::Cooldown { respawn_time } = note.state else {
            continue;
        };
        if respawn_time > now || note.has_alerted || !note.has_sound {
            continue;
        }
        note.has_alerted = true;
        let text = announcement(note, catalog, locale);
        if now - respawn_time <= FRESH_ALERT_WINDOW_MS {
            out.push(Alert::Spoken { text, locale });
        } else {
            out.push(Alert::Visual { text });
        }
    }
    out
}

/// Route one scan's output: speech for fresh expiries, status line for the
/// rest (and for everything when speech is unavailable downstream).
pub fn deliver(alerts: Vec<Alert>, notifier: &mut dyn Notifier) {
    for alert in alerts {
        match alert {
            Alert::Spoken { text, locale } => {
                notifier.speak(&text, locale);
                notifier.status(Severity::Warning, text);
            }
            Alert::Visual { text } => notifier.status(Severity::Warning, text),
        }
    }
}

fn announcement(note: &Note, catalog: &Catalog, locale: Locale) -> String {
    let episode = catalog.episode_of(note.map_level).unwrap_or(0);
    match locale {
        Locale::ZhTw => format!(
            "EP {episode}, {} 分流 {}, CD已結束",
            note.note_text, note.channel
        ),
        Locale::EnUs => format!(
            "Episode {episode}, {} channel {}, cooldown finished",
            catalog.en_name(note.map_level, &note.note_text),
            note.channel
        ),
    }
}
