use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crossterm::event::{KeyCode, KeyEvent};

use crate::board::StateTarget;
use crate::model::now_ms;
use crate::notify::Severity;
use crate::parse::{self, TimeToken};
use crate::transfer::{self, ConflictChoice};

use super::app::{App, Modal, ModalKind};
use super::input::Input;

pub(super) fn draw_modal(frame: &mut ratatui::Frame, app: &App, modal: &Modal) {
    let area = frame.area();
    let w = area.width.saturating_sub(6).clamp(20, 90);
    let h = area.height.saturating_sub(6).clamp(8, 22);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let box_area = Rect { x, y, width: w, height: h };

    frame.render_widget(Clear, box_area);

    let block = Block::default().borders(Borders::ALL).title(title(modal));
    frame.render_widget(block.clone(), box_area);
    let inner = block.inner(box_area);

    match &modal.kind {
        ModalKind::MapPick { candidates, selected, .. } => {
            let mut lines = vec![Line::from("This level hosts more than one map:"), Line::from("")];
            for (i, c) in candidates.iter().enumerate() {
                let marker = if i == *selected { "> " } else { "  " };
                let style = if i == *selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                lines.push(Line::from(Span::styled(
                    format!("{marker}{}. EP{} {} ({})", i + 1, c.episode, c.name, c.en_name),
                    style,
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("Enter/digit picks, Esc cancels"));
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }

        ModalKind::UpdateStatus { note_id, max_stages } => {
            let mut lines = Vec::new();
            if let Some(note) = app.session.board.get(note_id) {
                lines.push(Line::from(format!(
                    "Lv{} {} ch{}",
                    note.map_level, note.note_text, note.channel
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("  o      mark ON"));
            lines.push(Line::from(format!("  1-{max_stages}    mark stage")));
            lines.push(Line::from("  d      cooldown at the map's interval"));
            lines.push(Line::from("  c      cooldown from a typed duration"));
            lines.push(Line::from(""));
            lines.push(Line::from("Esc closes"));
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }

        ModalKind::CustomCooldown { input, .. } => {
            draw_prompted_input(
                frame,
                inner,
                &[
                    "Duration until respawn: mm.ss, hh.mm.ss, or bare minutes.",
                    "`on` and `a/b` stage notation also work here.",
                ],
                "CD ",
                input,
            );
        }

        ModalKind::ImportPaste { input } => {
            draw_prompted_input(
                frame,
                inner,
                &["Paste a note payload and press Enter."],
                "> ",
                input,
            );
        }

        ModalKind::ImportConflicts { plan } => {
            let mut lines = vec![Line::from(format!(
                "{} new, {} already on the board:",
                plan.fresh.len(),
                plan.conflicts.len()
            ))];
            lines.push(Line::from(""));
            for c in plan.conflicts.iter().take(8) {
                lines.push(Line::from(format!(
                    "  Lv{} {} ch{}",
                    c.incoming.map_level, c.incoming.note_text, c.incoming.channel
                )));
            }
            if plan.conflicts.len() > 8 {
                lines.push(Line::from(format!("  ... {} more", plan.conflicts.len() - 8)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("o overwrite all / s skip conflicts / Esc cancel"));
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }

        ModalKind::ConfirmClear => {
            let lines = vec![
                Line::from(format!("Delete all {} notes?", app.session.board.len())),
                Line::from(""),
                Line::from("y confirms, Esc cancels"),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }

        ModalKind::Viewer { lines, scroll, .. } => {
            let text: Vec<Line> = lines.iter().map(|s| Line::from(s.as_str())).collect();
            let scroll = (*scroll).min(lines.len().saturating_sub(1)) as u16;
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }).scroll((scroll, 0)),
                inner,
            );
        }
    }
}

fn draw_prompted_input(
    frame: &mut ratatui::Frame,
    inner: Rect,
    help: &[&str],
    prompt: &str,
    input: &Input,
) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(inner);

    let lines: Vec<Line> = help.iter().map(|s| Line::from(*s)).collect();
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), parts[0]);

    let input_line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::raw(input.buf.as_str()),
    ]);
    frame.render_widget(
        Paragraph::new(input_line).block(Block::default().borders(Borders::ALL)),
        parts[1],
    );
    let x = prompt.len() as u16 + input.cursor as u16;
    frame.set_cursor_position((parts[1].x + 1 + x, parts[1].y + 1));
}

fn title(modal: &Modal) -> &'static str {
    match modal.kind {
        ModalKind::MapPick { .. } => " Which map? ",
        ModalKind::UpdateStatus { .. } => " Update status ",
        ModalKind::CustomCooldown { .. } => " Custom cooldown ",
        ModalKind::ImportPaste { .. } => " Import notes ",
        ModalKind::ImportConflicts { .. } => " Import conflicts ",
        ModalKind::ConfirmClear => " Clear all ",
        ModalKind::Viewer { .. } => " Viewer ",
    }
}

pub(super) fn handle_modal_key(app: &mut App, key: KeyEvent) {
    enum ModalAction {
        None,
        Close,
        CancelPick,
        PickMap(usize),
        SetState { note_id: String, target: StateTarget },
        OpenCustom { note_id: String },
        SubmitCustom { note_id: String, raw: String },
        SubmitImport(String),
        ResolveImport(ConflictChoice),
        ClearAll,
    }

    let action = {
        let Some(m) = app.modal.as_mut() else {
            return;
        };

        match &mut m.kind {
            ModalKind::MapPick { candidates, selected, .. } => match key.code {
                KeyCode::Esc => ModalAction::CancelPick,
                KeyCode::Up => {
                    *selected = selected.saturating_sub(1);
                    ModalAction::None
                }
                KeyCode::Down => {
                    *selected = (*selected + 1).min(candidates.len().saturating_sub(1));
                    ModalAction::None
                }
                KeyCode::Enter => ModalAction::PickMap(*selected),
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    let n = c.to_digit(10).unwrap_or(0) as usize;
                    if n >= 1 && n <= candidates.len() {
                        ModalAction::PickMap(n - 1)
                    } else {
                        ModalAction::None
                    }
                }
                _ => ModalAction::None,
            },

            ModalKind::UpdateStatus { note_id, max_stages } => match key.code {
                KeyCode::Esc => ModalAction::Close,
                KeyCode::Char('o') | KeyCode::Char('O') => ModalAction::SetState {
                    note_id: note_id.clone(),
                    target: StateTarget::On,
                },
                KeyCode::Char('d') => ModalAction::SetState {
                    note_id: note_id.clone(),
                    target: StateTarget::DefaultCooldown,
                },
                KeyCode::Char('c') => ModalAction::OpenCustom { note_id: note_id.clone() },
                KeyCode::Char(ch) if ch.is_ascii_digit() => {
                    let n = ch.to_digit(10).unwrap_or(0);
                    if n >= 1 && n <= *max_stages {
                        ModalAction::SetState {
                            note_id: note_id.clone(),
                            target: StateTarget::Stage(n),
                        }
                    } else {
                        ModalAction::None
                    }
                }
                _ => ModalAction::None,
            },

            ModalKind::CustomCooldown { note_id, input } => match key.code {
                KeyCode::Esc => ModalAction::Close,
                KeyCode::Enter => ModalAction::SubmitCustom {
                    note_id: note_id.clone(),
                    raw: input.buf.clone(),
                },
                KeyCode::Backspace => {
                    input.backspace();
                    ModalAction::None
                }
                KeyCode::Delete => {
                    input.delete();
                    ModalAction::None
                }
                KeyCode::Left => {
                    input.move_left();
                    ModalAction::None
                }
                KeyCode::Right => {
                    input.move_right();
                    ModalAction::None
                }
                KeyCode::Char(c) => {
                    input.insert_char(c);
                    ModalAction::None
                }
                _ => ModalAction::None,
            },

            ModalKind::ImportPaste { input } => match key.code {
                KeyCode::Esc => ModalAction::Close,
                KeyCode::Enter => ModalAction::SubmitImport(input.buf.clone()),
                KeyCode::Backspace => {
                    input.backspace();
                    ModalAction::None
                }
                KeyCode::Delete => {
                    input.delete();
                    ModalAction::None
                }
                KeyCode::Left => {
                    input.move_left();
                    ModalAction::None
                }
                KeyCode::Right => {
                    input.move_right();
                    ModalAction::None
                }
                KeyCode::Char(c) => {
                    input.insert_char(c);
                    ModalAction::None
                }
                _ => ModalAction::None,
            },

            ModalKind::ImportConflicts { .. } => match key.code {
                KeyCode::Esc => ModalAction::Close,
                KeyCode::Char('o') => ModalAction::ResolveImport(ConflictChoice::OverwriteAll),
                KeyCode::Char('s') => ModalAction::ResolveImport(ConflictChoice::SkipConflicts),
                _ => ModalAction::None,
            },

            ModalKind::ConfirmClear => match key.code {
                KeyCode::Esc | KeyCode::Char('n') => ModalAction::Close,
                KeyCode::Enter | KeyCode::Char('y') => ModalAction::ClearAll,
                _ => ModalAction::None,
            },

            ModalKind::Viewer { scroll, .. } => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => ModalAction::Close,
                KeyCode::Up => {
                    *scroll = scroll.saturating_sub(1);
                    ModalAction::None
                }
                KeyCode::Down => {
                    *scroll += 1;
                    ModalAction::None
                }
                _ => ModalAction::None,
            },
        }
    };

    match action {
        ModalAction::None => {}
        ModalAction::Close => app.modal = None,

        ModalAction::CancelPick => {
            app.session.board.clear_highlights();
            app.modal = None;
        }

        ModalAction::PickMap(index) => {
            let Some(Modal { kind: ModalKind::MapPick { draft, candidates, .. } }) =
                app.modal.take()
            else {
                return;
            };
            let Some(choice) = candidates.get(index) else {
                return;
            };
            app.session.board.clear_highlights();
            match app.session.add_with_map(&draft, &choice.name, now_ms()) {
                Ok(_) => {
                    app.status(Severity::Success, format!("noted {}", choice.name));
                    app.persist();
                }
                Err(err) => app.status(Severity::Error, format!("{err:#}")),
            }
        }

        ModalAction::SetState { note_id, target } => {
            app.modal = None;
            match app.session.update_state(&note_id, target) {
                Ok(()) => app.persist(),
                Err(err) => app.status(Severity::Error, format!("{err:#}")),
            }
        }

        ModalAction::OpenCustom { note_id } => {
            app.modal = Some(Modal {
                kind: ModalKind::CustomCooldown { note_id, input: Input::default() },
            });
        }

        ModalAction::SubmitCustom { note_id, raw } => {
            let target = match parse::parse_time_token(&raw, app.session.nosec) {
                Ok(TimeToken::On) => StateTarget::On,
                Ok(TimeToken::Stage { stage, .. }) => StateTarget::Stage(stage),
                Ok(TimeToken::Cooldown { seconds }) => {
                    StateTarget::CooldownUntil(TimeToken::respawn_at(seconds, now_ms()))
                }
                Err(err) => {
                    app.status(Severity::Error, format!("{err:#}"));
                    return;
                }
            };
            app.modal = None;
            match app.session.update_state(&note_id, target) {
                Ok(()) => app.persist(),
                Err(err) => app.status(Severity::Error, format!("{err:#}")),
            }
        }

        ModalAction::SubmitImport(payload) => {
            let planned = transfer::parse_payload(&payload).and_then(|records| {
                transfer::plan_import(
                    records,
                    &app.session.catalog,
                    app.session.board.notes(),
                    now_ms(),
                )
            });
            match planned {
                Ok(plan) if plan.conflicts.is_empty() => {
                    app.modal = None;
                    let n = app
                        .session
                        .board
                        .import(plan, ConflictChoice::SkipConflicts, now_ms());
                    app.status(Severity::Success, format!("imported {n} notes"));
                    app.persist();
                }
                Ok(plan) => {
                    app.modal = Some(Modal { kind: ModalKind::ImportConflicts { plan } });
                }
                Err(err) => app.status(Severity::Error, format!("{err:#}")),
            }
        }

        ModalAction::ClearAll => {
            app.modal = None;
            app.session.board.clear();
            app.selected = 0;
            app.status(Severity::Info, "board cleared");
            app.persist();
        }

        ModalAction::ResolveImport(choice) => {
            let Some(Modal { kind: ModalKind::ImportConflicts { plan } }) = app.modal.take()
            else {
                return;
            };
            let n = app.session.board.import(plan, choice, now_ms());
            app.status(Severity::Success, format!("imported {n} notes"));
            app.persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    use crate::notify::Locale;
    use crate::session::Session;

    fn app_with_notes(dir: &tempfile::TempDir) -> App {
        let mut session = Session::open(dir.path(), Locale::ZhTw, false).unwrap();
        session.submit_line("83 1 on", 1_000).unwrap();
        session.submit_line("81 2 5", 1_000).unwrap();
        App::new(session)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_modal_key(app, KeyEvent::new(code, KeyModifiers::empty()));
    }

    #[test]
    fn confirmed_clear_empties_the_board() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_notes(&dir);
        app.modal = Some(Modal { kind: ModalKind::ConfirmClear });

        press(&mut app, KeyCode::Char('y'));
        assert!(app.modal.is_none());
        assert!(app.session.board.is_empty());

        // The cleared board was persisted.
        let store = crate::store::LocalStore::open(dir.path()).unwrap();
        assert!(store.load_notes().unwrap().is_empty());
    }

    #[test]
    fn cancelled_clear_keeps_the_notes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_notes(&dir);
        app.modal = Some(Modal { kind: ModalKind::ConfirmClear });

        press(&mut app, KeyCode::Esc);
        assert!(app.modal.is_none());
        assert_eq!(app.session.board.len(), 2);
    }
}
