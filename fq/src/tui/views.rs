//! Study view rendering
//!
//! Draws the header, the card, the key hints and the overlays from the
//! App. Rendering never modifies state.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};
use tracing::trace;

use super::app::{App, Overlay};
use crate::domain::{Presentation, SessionCard, Tier};
use crate::notice::{Notice, NoticeLevel};
use crate::study::{SessionPhase, StudySession};

mod colors {
    use ratatui::style::Color;

    pub const NEW: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const LEARNING: Color = Color::Rgb(255, 215, 0); // Gold
    pub const MASTERED: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const XP: Color = Color::Rgb(147, 112, 219); // Medium purple
    pub const DIM: Color = Color::DarkGray;
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::New => colors::NEW,
        Tier::Learning => colors::LEARNING,
        Tier::Mastered => colors::MASTERED,
    }
}

fn notice_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Info => colors::HEADER,
        NoticeLevel::Success => colors::MASTERED,
        NoticeLevel::Warning => colors::LEARNING,
    }
}

/// Render the study view
pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(8), Constraint::Length(1)])
        .split(area);

    render_header(app, frame, chunks[0]);
    render_body(app.session(), app.cell_width(), frame, chunks[1]);
    render_footer(app, frame, chunks[2]);
    render_notices(&app.session().notices().visible(), frame, area);

    match app.overlay() {
        Overlay::None => {}
        Overlay::Help => render_help_overlay(app.session(), frame, area),
        Overlay::Tags { cursor } => render_tags_overlay(app.session(), *cursor, frame, area),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    trace!("render_header: called");
    let session = app.session();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(2)])
        .split(area);

    let mode = if session.mode().is_cross_deck() {
        "All decks"
    } else {
        "Deck"
    };
    let mut title = vec![
        Span::styled(
            app.title().to_string(),
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  [{}]", mode), Style::default().fg(colors::DIM)),
    ];
    if !session.tag_filter().is_empty() {
        let tags: Vec<&str> = session.tag_filter().iter().map(String::as_str).collect();
        title.push(Span::styled(
            format!("  tags: {}", tags.join(", ")),
            Style::default().fg(colors::LEARNING),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(title)), rows[0]);

    let mut stats = vec![
        Span::raw(format!("Remaining: {}  ", session.remaining())),
        Span::raw(format!("Done: {}  ", session.completed())),
        Span::styled(
            format!("Session: +{} XP", session.session_xp()),
            Style::default().fg(colors::XP),
        ),
    ];
    if let Some(xp) = session.current_card().and_then(|c| session.experience(&c.card.deck_id)) {
        stats.push(Span::styled(
            format!("  Lv {} {}/{} xp", xp.level, xp.xp, xp.xp_to_next_level),
            Style::default().fg(colors::XP),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(stats)), rows[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::BOTTOM))
        .gauge_style(Style::default().fg(colors::MASTERED))
        .percent(session.progress_percent().min(100))
        .label(format!("{}%", session.progress_percent()));
    frame.render_widget(gauge, rows[2]);
}

fn render_body(session: &StudySession, cell_width: i32, frame: &mut Frame, area: Rect) {
    trace!(phase = ?session.phase(), "render_body: called");
    match session.phase() {
        SessionPhase::Complete { .. } | SessionPhase::Finished => {
            let text = vec![
                Line::from(Span::styled(
                    "SESSION COMPLETE!",
                    Style::default().fg(colors::MASTERED).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("You earned {} XP", session.session_xp())),
                Line::from(format!("{} cards studied", session.completed())),
            ];
            render_centered_text(text, frame, area);
        }
        SessionPhase::Idle => {
            let text = if session.mode().is_cross_deck() && !session.cards().is_empty() {
                vec![
                    Line::from("No cards ready right now."),
                    Line::from(Span::styled(
                        "Answered cards come back after their cooldown. Press c to clear filters.",
                        Style::default().fg(colors::DIM),
                    )),
                ]
            } else {
                vec![Line::from("No cards to study.")]
            };
            render_centered_text(text, frame, area);
        }
        SessionPhase::Studying | SessionPhase::Advancing { .. } => match session.current_card() {
            Some(card) => render_card(session, card, cell_width, frame, area),
            None => render_centered_text(vec![Line::from("Loading...")], frame, area),
        },
    }
}

fn render_centered_text(text: Vec<Line<'static>>, frame: &mut Frame, area: Rect) {
    let inner = centered_rect(80, 50, area);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

/// Columns the card shifts for a drag offset
fn card_shift(offset: i32, cell_width: i32, room: u16) -> i32 {
    let columns = offset / cell_width.max(1);
    columns.clamp(-i32::from(room), i32::from(room))
}

fn render_card(session: &StudySession, card: &SessionCard, cell_width: i32, frame: &mut Frame, area: Rect) {
    trace!(card_id = %card.id(), "render_card: called");
    let mut card_area = centered_rect(70, 90, area);

    let room = card_area.x.saturating_sub(area.x);
    let shift = card_shift(session.drag_offset(), cell_width, room);
    let max_x = area.right().saturating_sub(card_area.width);
    card_area.x = (i32::from(card_area.x) + shift).clamp(i32::from(area.x), i32::from(max_x.max(area.x))) as u16;

    let border_color = match card.presentation {
        Presentation::Answered { tier } => tier_color(tier),
        _ => tier_color(card.tier),
    };
    let mut title = vec![Span::styled(
        format!(" {} ", card.tier.label()),
        Style::default().fg(tier_color(card.tier)).add_modifier(Modifier::BOLD),
    )];
    if session.mode().is_cross_deck() {
        title.push(Span::styled(format!(" {} ", card.deck_title), Style::default().fg(colors::DIM)));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Line::from(title));

    let mut lines = vec![
        Line::from(Span::styled("QUESTION", Style::default().fg(colors::DIM))),
        Line::from(Span::styled(
            card.card.front.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    match card.presentation {
        Presentation::Unrevealed => {
            lines.push(Line::from(Span::styled(
                "Press space to reveal the answer",
                Style::default().fg(colors::DIM),
            )));
        }
        Presentation::Revealed | Presentation::Answered { .. } => {
            lines.push(Line::from(Span::styled("ANSWER", Style::default().fg(colors::DIM))));
            lines.push(Line::from(card.card.back.clone()));
            lines.push(Line::from(""));
        }
    }

    match card.presentation {
        Presentation::Revealed => {
            let offset = session.drag_offset();
            let hint = if offset < 0 {
                Span::styled("◀ NEW", Style::default().fg(colors::NEW))
            } else if offset > 0 {
                Span::styled("MASTERED ▶", Style::default().fg(colors::MASTERED))
            } else {
                Span::styled(
                    "1 new · 2 learning · 3 mastered · or swipe",
                    Style::default().fg(colors::DIM),
                )
            };
            lines.push(Line::from(hint));
        }
        Presentation::Answered { tier } => {
            lines.push(Line::from(Span::styled(
                format!("Answered: {}", tier),
                Style::default().fg(tier_color(tier)),
            )));
        }
        Presentation::Unrevealed => {}
    }

    if card.streak > 0 {
        lines.push(Line::from(Span::styled(
            format!("Streak: {}", card.streak),
            Style::default().fg(colors::XP),
        )));
    }
    if !card.card.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("#{}", card.card.tags.join(" #")),
            Style::default().fg(colors::DIM),
        )));
    }

    frame.render_widget(Clear, card_area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        card_area,
    );
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        key_span("space"),
        Span::raw(" flip  "),
        key_span("1/2/3"),
        Span::raw(" answer  "),
        key_span("←/→"),
        Span::raw(" swipe  "),
    ];
    if app.session().mode().is_cross_deck() {
        spans.extend([key_span("t"), Span::raw(" tags  "), key_span("c"), Span::raw(" clear  ")]);
    }
    spans.extend([key_span("?"), Span::raw(" help  "), key_span("q"), Span::raw(" quit")]);
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_span(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().fg(colors::KEYBIND))
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

/// Stack notices in the top-right corner, newest on top
fn render_notices(notices: &[Notice], frame: &mut Frame, area: Rect) {
    let width = 40.min(area.width);
    let mut y = area.y;
    let now = Instant::now();
    for notice in notices.iter().filter(|n| !n.is_expired(now)) {
        if y + 4 > area.y + area.height {
            break;
        }
        let rect = Rect::new(area.x + area.width - width, y, width, 4);
        let color = notice_color(notice.level);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(Span::styled(
                notice.title.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(notice.body.clone()).block(block).wrap(Wrap { trim: true }),
            rect,
        );
        y += 4;
    }
}

fn render_help_overlay(session: &StudySession, frame: &mut Frame, area: Rect) {
    trace!("render_help_overlay: called");
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )),
        Line::from(""),
        key_line("space/enter", "Flip the card"),
        key_line("1", "Answer: still new (0 XP)"),
        key_line("2", "Answer: learning (+5 XP)"),
        key_line("3", "Answer: mastered (+15 XP)"),
        key_line("←/h", "Swipe left (new)"),
        key_line("→/l", "Swipe right (mastered)"),
        key_line("drag", "Drag the card with the mouse to swipe"),
    ];
    if session.mode().is_cross_deck() {
        help_text.push(key_line("t", "Filter by tags"));
        help_text.push(key_line("c", "Clear tag filters"));
    }
    help_text.push(key_line("?", "Toggle help"));
    help_text.push(key_line("q/esc", "Leave the session"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(colors::DIM),
    )));

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

fn render_tags_overlay(session: &StudySession, cursor: usize, frame: &mut Frame, area: Rect) {
    trace!(cursor, "render_tags_overlay: called");
    let popup_area = centered_rect(50, 60, area);
    frame.render_widget(Clear, popup_area);

    let tags = session.all_tags();
    let mut lines = Vec::with_capacity(tags.len() + 2);
    if tags.is_empty() {
        lines.push(Line::from(Span::styled("No tags on any card", Style::default().fg(colors::DIM))));
    }
    for (i, tag) in tags.iter().enumerate() {
        let mark = if session.tag_filter().contains(tag) { "[x]" } else { "[ ]" };
        let mut style = Style::default();
        if i == cursor {
            style = style.fg(colors::HEADER).add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(format!("{} {}", mark, tag), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "space toggle · c clear · esc close",
        Style::default().fg(colors::DIM),
    )));

    let block = Block::default()
        .title(" Tags ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::domain::{Card, Classification};
    use crate::notice::NoticeQueue;
    use crate::study::{SessionTiming, StudyMode};

    fn app(mode: StudyMode) -> App {
        let card = Card {
            id: "c1".to_string(),
            deck_id: "d1".to_string(),
            front: "Capital of France".to_string(),
            back: "Paris".to_string(),
            tags: vec!["geo".to_string()],
        };
        let timing = SessionTiming::for_mode(&mode);
        let session = StudySession::new(
            mode,
            vec![SessionCard::new(card, "Geography", Classification::default())],
            HashMap::new(),
            timing,
            NoticeQueue::default(),
            Instant::now(),
        );
        App::new(session, "Geography", 8)
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_answer_hidden_until_flip() {
        let mut app = app(StudyMode::SingleDeck {
            deck_id: "d1".to_string(),
        });
        let screen = draw(&app);
        assert!(screen.contains("Capital of France"));
        assert!(!screen.contains("Paris"));
        assert!(screen.contains("RED - NEW"));

        app.session_mut().flip();
        let screen = draw(&app);
        assert!(screen.contains("Paris"));
    }

    #[test]
    fn test_cross_deck_shows_deck_and_tag_hints() {
        let app = app(StudyMode::CrossDeck);
        let screen = draw(&app);
        assert!(screen.contains("All decks"));
        assert!(screen.contains("tags"));
    }

    #[test]
    fn test_notices_render() {
        let app = app(StudyMode::CrossDeck);
        app.session().notices().push(NoticeLevel::Success, "CORRECT!", "+15 XP");
        let screen = draw(&app);
        assert!(screen.contains("CORRECT!"));
    }

    #[test]
    fn test_card_shift_clamps_to_room() {
        assert_eq!(card_shift(0, 8, 10), 0);
        assert_eq!(card_shift(40, 8, 10), 5);
        assert_eq!(card_shift(-400, 8, 10), -10);
        assert_eq!(card_shift(400, 8, 3), 3);
    }
}
