use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::board::alerts;
use crate::model::now_ms;
use crate::notify::{Locale, Notifier, Severity, speak_system};
use crate::session::{LineOutcome, MapChoice, NoteDraft, Session};
use crate::transfer::ImportPlan;

use super::input::Input;
use super::{modal, view};

pub(super) struct Modal {
    pub(super) kind: ModalKind,
}

pub(super) enum ModalKind {
    /// Ambiguous level: pick which map the line meant.
    MapPick {
        draft: NoteDraft,
        candidates: Vec<MapChoice>,
        selected: usize,
    },
    /// State buttons for one note.
    UpdateStatus { note_id: String, max_stages: u32 },
    /// Free-form cooldown entry for one note.
    CustomCooldown { note_id: String, input: Input },
    ImportPaste { input: Input },
    ImportConflicts { plan: ImportPlan },
    ConfirmClear,
    Viewer {
        title: String,
        lines: Vec<String>,
        scroll: usize,
    },
}

pub(super) struct App {
    pub(super) session: Session,
    pub(super) input: Input,
    pub(super) modal: Option<Modal>,
    pub(super) selected: usize,
    pub(super) status: Option<(Severity, String)>,
    pub(super) muted: bool,
    pub(super) show_clock: bool,
    pub(super) quit: bool,
}

impl App {
    pub(super) fn new(session: Session) -> Self {
        let mut app = App {
            session,
            input: Input::default(),
            modal: None,
            selected: 0,
            status: None,
            muted: false,
            show_clock: false,
            quit: false,
        };
        if let Some(warning) = app.session.migration_warning.take() {
            app.status = Some((Severity::Warning, warning));
        }
        app
    }

    pub(super) fn status(&mut self, severity: Severity, text: impl Into<String>) {
        self.status = Some((severity, text.into()));
    }

    pub(super) fn selected_note_id(&self) -> Option<String> {
        self.session
            .board
            .notes()
            .get(self.selected)
            .map(|n| n.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.session.board.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Persist mutations; storage trouble goes to the status line rather
    /// than tearing the board down.
    pub(super) fn persist(&mut self) {
        if let Err(err) = self.session.persist() {
            self.status(Severity::Error, format!("save failed: {err:#}"));
        }
    }
}

impl Notifier for App {
    fn speak(&mut self, text: &str, locale: Locale) {
        if !self.muted {
            speak_system(text, locale);
        }
    }

    fn status(&mut self, severity: Severity, text: String) {
        self.status = Some((severity, text));
    }

    fn cue(&mut self) {
        if !self.muted {
            use std::io::Write;
            print!("\u{7}");
            io::stdout().flush().ok();
        }
    }
}

pub(super) fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut last_resort = Instant::now();
    let mut last_scan = Instant::now();

    loop {
        if last_resort.elapsed() >= Duration::from_secs(1) {
            app.session.board.resort(now_ms());
            app.clamp_selection();
            last_resort = Instant::now();
        }
        if last_scan.elapsed() >= Duration::from_millis(500) {
            let locale = app.session.locale;
            let fired =
                app.session
                    .board
                    .scan_alerts(&app.session.catalog, locale, now_ms());
            alerts::deliver(fired, app);
            app.persist();
            last_scan = Instant::now();
        }

        terminal.draw(|f| view::draw(f, app)).context("draw")?;
        if app.quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50)).context("poll")? {
            match event::read().context("read event")? {
                Event::Key(k) if k.kind == KeyEventKind::Press => handle_key(app, k),
                _ => {}
            }
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit = true;
        return;
    }

    if app.modal.is_some() {
        modal::handle_modal_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if !app.input.buf.is_empty() {
                app.input.clear();
            } else {
                app.session.board.clear_highlights();
                app.quit = true;
            }
        }

        KeyCode::Enter => {
            if app.input.buf.is_empty() {
                open_update_modal(app);
            } else {
                submit_line(app);
            }
        }

        KeyCode::Up => {
            if app.input.buf.is_empty() {
                app.selected = app.selected.saturating_sub(1);
            } else {
                app.input.history_up();
            }
        }
        KeyCode::Down => {
            if app.input.buf.is_empty() {
                let len = app.session.board.len();
                if len > 0 {
                    app.selected = (app.selected + 1).min(len - 1);
                }
            } else {
                app.input.history_down();
            }
        }

        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),

        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.clear();
        }

        // Single-key commands live on an empty line; typing a shorthand
        // line always starts with a digit, so there is no collision.
        KeyCode::Char(c) if app.input.buf.is_empty() && !c.is_ascii_digit() => command_key(app, c),

        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.insert_char(c);
        }

        _ => {}
    }
}

fn command_key(app: &mut App, c: char) {
    match c {
        'q' => app.quit = true,
        's' => {
            let mode = app.session.board.toggle_sort_mode(now_ms());
            app.status(Severity::Info, format!("sorting {}", mode.label()));
        }
        't' => match app.session.toggle_theme() {
            Ok(theme) => app.status(Severity::Info, format!("{} theme", theme.as_str())),
            Err(err) => app.status(Severity::Error, format!("{err:#}")),
        },
        'l' => {
            app.session.locale = match app.session.locale {
                Locale::ZhTw => Locale::EnUs,
                Locale::EnUs => Locale::ZhTw,
            };
            app.status(
                Severity::Info,
                format!("alerts in {}", app.session.locale.bcp47()),
            );
        }
        'w' => app.show_clock = !app.show_clock,
        'm' => {
            app.muted = !app.muted;
            let text = if app.muted { "speech muted" } else { "speech on" };
            app.status(Severity::Info, text);
        }
        'a' => {
            if let Some(id) = app.selected_note_id() {
                if let Some(on) = app.session.board.toggle_sound(&id) {
                    let text = if on { "sound on" } else { "sound off" };
                    app.status(Severity::Info, text);
                }
                app.persist();
            }
        }
        'b' | 'B' => {
            app.session.board.set_all_sound(c == 'b');
            app.status(
                Severity::Info,
                if c == 'b' { "all sounds on" } else { "all sounds off" },
            );
            app.persist();
        }
        '*' => {
            let Some(id) = app.selected_note_id() else {
                return;
            };
            let Some((level, name)) = app
                .session
                .board
                .get(&id)
                .map(|n| (n.map_level, n.note_text.clone()))
            else {
                return;
            };
            match app.session.toggle_star(level, Some(&name)) {
                Ok(true) => app.status(Severity::Success, format!("starred {name}")),
                Ok(false) => app.status(Severity::Info, format!("unstarred {name}")),
                Err(err) => app.status(Severity::Error, format!("{err:#}")),
            }
            app.persist();
        }
        '+' | '=' | '-' => {
            let Some(id) = app.selected_note_id() else {
                return;
            };
            let delta = if c == '-' { -1 } else { 1 };
            use crate::board::ChannelAdjust;
            match app.session.board.adjust_channel(&id, delta, now_ms()) {
                ChannelAdjust::Changed(ch) => {
                    app.status(Severity::Info, format!("channel {ch}"))
                }
                ChannelAdjust::AtMinimum => {
                    app.status(Severity::Warning, "channel 1 is the floor")
                }
                ChannelAdjust::UnknownNote => {}
            }
            app.persist();
        }
        'D' => {
            if let Some(id) = app.selected_note_id() {
                app.session.board.delete(&id);
                app.clamp_selection();
                app.status(Severity::Info, "note deleted");
                app.persist();
            }
        }
        'C' => {
            if !app.session.board.is_empty() {
                app.modal = Some(Modal { kind: ModalKind::ConfirmClear });
            }
        }
        'e' => export_to_clipboard(app),
        'i' => open_import_modal(app),
        'h' => {
            app.session.board.clear_highlights();
        }
        _ => {}
    }
}

fn submit_line(app: &mut App) {
    let line = app.input.buf.clone();
    app.input.push_history(&line);
    match app.session.submit_line(&line, now_ms()) {
        Ok(LineOutcome::Added { map_level, .. }) => {
            app.input.clear();
            app.status(Severity::Success, format!("noted level {map_level}"));
            app.cue();
            app.persist();
        }
        Ok(LineOutcome::NeedsMapPick { draft, candidates }) => {
            app.input.clear();
            app.session.board.set_highlight(draft.map_level);
            app.modal = Some(Modal {
                kind: ModalKind::MapPick { draft, candidates, selected: 0 },
            });
        }
        Err(err) => app.status(Severity::Error, format!("{err:#}")),
    }
}

fn open_update_modal(app: &mut App) {
    let Some(id) = app.selected_note_id() else {
        return;
    };
    let max_stages = app.session.board.get(&id).map(|n| n.max_stages).unwrap_or(4);
    app.modal = Some(Modal {
        kind: ModalKind::UpdateStatus { note_id: id, max_stages },
    });
}

fn open_import_modal(app: &mut App) {
    let mut input = Input::default();
    // Prefill from the clipboard when it is reachable; paste still works
    // either way.
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        if let Ok(text) = clipboard.get_text() {
            if text.trim_start().starts_with('[') {
                input.set(text.trim().to_string());
            }
        }
    }
    app.modal = Some(Modal { kind: ModalKind::ImportPaste { input } });
}

fn export_to_clipboard(app: &mut App) {
    if app.session.board.is_empty() {
        app.status(Severity::Info, "nothing to export");
        return;
    }
    let payload = match crate::transfer::export_payload(app.session.board.notes()) {
        Ok(p) => p,
        Err(err) => {
            app.status(Severity::Error, format!("{err:#}"));
            return;
        }
    };

    let copied = arboard::Clipboard::new()
        .and_then(|mut c| c.set_text(payload.clone()))
        .is_ok();
    if copied {
        app.status(
            Severity::Success,
            format!("copied {} notes to clipboard", app.session.board.len()),
        );
    } else {
        app.status(Severity::Warning, "clipboard unavailable, copy from the viewer");
    }
    app.modal = Some(Modal {
        kind: ModalKind::Viewer {
            title: "Export payload".to_string(),
            lines: vec![payload],
            scroll: 0,
        },
    });
}
