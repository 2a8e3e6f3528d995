use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use time::{OffsetDateTime, UtcOffset};

use crate::board::status::status_text;
use crate::model::{Note, now_ms};
use crate::notify::{Locale, Severity};
use crate::store::Theme;

use super::app::App;
use super::modal;

struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    selected_bg: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            text: Color::White,
            dim: Color::DarkGray,
            accent: Color::Cyan,
            selected_bg: Color::Rgb(40, 40, 60),
        },
        Theme::Light => Palette {
            text: Color::Black,
            dim: Color::Gray,
            accent: Color::Blue,
            selected_bg: Color::Rgb(215, 225, 235),
        },
    }
}

pub(super) fn draw(frame: &mut Frame, app: &App) {
    let pal = palette(app.session.theme);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, &pal, chunks[0]);
    draw_table(frame, app, &pal, chunks[1]);
    draw_input(frame, app, &pal, chunks[2]);
    draw_status(frame, app, &pal, chunks[3]);

    if let Some(m) = &app.modal {
        modal::draw_modal(frame, app, m);
    }
}

fn draw_header(frame: &mut Frame, app: &App, pal: &Palette, area: ratatui::layout::Rect) {
    let muted = if app.muted { " · muted" } else { "" };
    let header = Line::from(vec![
        Span::styled("fieldwatch", Style::default().fg(pal.accent).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  {} notes · sort {} · {}{muted}",
                app.session.board.len(),
                app.session.board.sort_mode().label(),
                app.session.locale.bcp47(),
            ),
            Style::default().fg(pal.dim),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn draw_table(frame: &mut Frame, app: &App, pal: &Palette, area: ratatui::layout::Rect) {
    let now = now_ms();
    let english = app.session.locale == Locale::EnUs;

    let rows: Vec<Row> = app
        .session
        .board
        .notes()
        .iter()
        .enumerate()
        .map(|(i, note)| note_row(app, note, i == app.selected, english, now, pal))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(4),
            Constraint::Min(14),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Length(2),
        ],
    )
    .header(
        Row::new(["", "Lv", "Map", "Ch", "Status", ""])
            .style(Style::default().fg(pal.dim).add_modifier(Modifier::UNDERLINED)),
    )
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(pal.dim)));

    frame.render_widget(table, area);
}

fn note_row<'a>(
    app: &App,
    note: &'a Note,
    selected: bool,
    english: bool,
    now: i64,
    pal: &Palette,
) -> Row<'a> {
    let star = if note.is_starred { "★" } else { " " };
    let sound = if note.has_sound { "♪" } else { " " };
    let name = if english {
        app.session.catalog.en_name(note.map_level, &note.note_text)
    } else {
        note.note_text.clone()
    };

    let status = if app.show_clock {
        clock_text(note).unwrap_or_else(|| status_text(note, now))
    } else {
        status_text(note, now)
    };

    let mut style = Style::default().fg(pal.text);
    if note.is_warning {
        style = style.fg(Color::Red);
    } else if note.is_highlight {
        style = style.fg(Color::Yellow);
    }
    if selected {
        style = style.bg(pal.selected_bg);
    }

    Row::new(vec![
        Cell::from(star),
        Cell::from(note.map_level.to_string()),
        Cell::from(name),
        Cell::from(note.channel.to_string()),
        Cell::from(status),
        Cell::from(sound),
    ])
    .style(style)
}

// Wall-clock respawn time for CD notes when the clock view is on.
fn clock_text(note: &Note) -> Option<String> {
    let respawn = note.respawn_time()?;
    let at = OffsetDateTime::from_unix_timestamp(respawn / 1000).ok()?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let local = at.to_offset(offset);
    Some(format!(
        "@ {:02}:{:02}:{:02}",
        local.hour(),
        local.minute(),
        local.second()
    ))
}

fn draw_input(frame: &mut Frame, app: &App, pal: &Palette, area: ratatui::layout::Rect) {
    let hint = if app.input.buf.is_empty() {
        "level [map] channel [on|a/b|time] · Enter updates selection"
    } else {
        ""
    };
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(pal.accent)),
        Span::raw(app.input.buf.as_str()),
        Span::styled(hint, Style::default().fg(pal.dim)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(pal.dim)),
        ),
        area,
    );
    if app.modal.is_none() {
        let x = 2 + app.input.cursor as u16;
        frame.set_cursor_position((area.x + 1 + x, area.y + 1));
    }
}

fn draw_status(frame: &mut Frame, app: &App, pal: &Palette, area: ratatui::layout::Rect) {
    let Some((severity, text)) = &app.status else {
        let keys = "q quit · s sort · t theme · l lang · e export · i import · * star · a sound · +/- ch · D del · C clear";
        frame.render_widget(
            Paragraph::new(Span::styled(keys, Style::default().fg(pal.dim))),
            area,
        );
        return;
    };
    let color = match severity {
        Severity::Info => pal.dim,
        Severity::Success => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(text.as_str(), Style::default().fg(color))),
        area,
    );
}
