use std::process::{Command, Stdio};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    ZhTw,
    EnUs,
}

impl Locale {
    pub fn bcp47(self) -> &'static str {
        match self {
            Locale::ZhTw => "zh-TW",
            Locale::EnUs => "en-US",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Outbound side effects: spoken alerts and status-line messages. The TUI
/// owns the production impl; tests record instead.
pub trait Notifier {
    fn speak(&mut self, text: &str, locale: Locale);
    fn status(&mut self, severity: Severity, text: String);
    /// Short non-verbal nudge, e.g. when a new note lands. No-op by default.
    fn cue(&mut self) {}
}

/// Fire-and-forget speech through whichever system synthesizer is around.
/// Failure to spawn is swallowed; the visual status line is the fallback.
pub fn speak_system(text: &str, locale: Locale) {
    let (say_voice, espeak_voice, spd_lang) = match locale {
        Locale::ZhTw => ("Meijia", "zh", "zh"),
        Locale::EnUs => ("Samantha", "en-us", "en"),
    };
    let candidates: [(&str, &[&str]); 3] = [
        ("say", &["-v", say_voice]),
        ("espeak-ng", &["-v", espeak_voice]),
        ("spd-say", &["-l", spd_lang]),
    ];
    for (program, args) in candidates {
        let spawned = Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if spawned.is_ok() {
            return;
        }
    }
}

/// Captures everything for assertions.
#[derive(Debug, Default)]
pub struct Recorder {
    pub spoken: Vec<(String, Locale)>,
    pub statuses: Vec<(Severity, String)>,
    pub cues: usize,
}

impl Notifier for Recorder {
    fn speak(&mut self, text: &str, locale: Locale) {
        self.spoken.push((text.to_string(), locale));
    }

    fn status(&mut self, severity: Severity, text: String) {
        self.statuses.push((severity, text));
    }

    fn cue(&mut self) {
        self.cues += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_cues() {
        let mut recorder = Recorder::default();
        recorder.cue();
        recorder.cue();
        assert_eq!(recorder.cues, 2);
        assert!(recorder.spoken.is_empty());
    }
}
