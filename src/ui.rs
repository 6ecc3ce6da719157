use crate::app::App;
use crate::domain::Severity;
use crate::mode::PROMPT;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Color, Line, Modifier, Span, Style};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

/// Header, list window, message pane, status or command line. The list gets
/// exactly the rows the viewport was sized for.
pub fn draw(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(app.config.log_rows),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, rows[0]);
    draw_list(frame, app, rows[1]);
    if app.config.log_rows > 0 {
        draw_logs(frame, app, rows[2]);
    }
    draw_bottom_line(frame, app, rows[3]);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.content().title()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    let nav = app.navigator();
    let arrows = format!(
        "{}{}",
        if nav.can_go_back() { "<" } else { " " },
        if nav.can_go_forward() { ">" } else { " " }
    );
    spans.push(Span::styled(arrows, Style::default().fg(Color::DarkGray)));
    if app.content().len() > 0 {
        spans.push(Span::styled(
            format!(" {}/{}", app.viewport().selection() + 1, app.content().len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if app.busy {
        spans.push(Span::styled(
            " BUSY ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .visible_entries()
        .iter()
        .map(|entry| {
            let style = if entry.is_dir {
                Style::default().fg(Color::Blue)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(entry.display_line.as_str(), style))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightGreen)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if app.content().len() > 0 {
        state.select(Some(app.viewport().screen_row()));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .logs
        .iter()
        .rev()
        .take(usize::from(area.height))
        .rev()
        .map(|line| Line::styled(line.as_str(), Style::default().fg(Color::DarkGray)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_bottom_line(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(line) = app.command_line() {
        frame.render_widget(Paragraph::new(format!("{PROMPT}{}", line.buffer())), area);
        let column = u16::try_from(line.cursor()).unwrap_or(u16::MAX);
        frame.set_cursor_position((area.x.saturating_add(column), area.y));
        return;
    }

    let Some(status) = &app.status else {
        return;
    };
    let style = match status.severity {
        Severity::Info => Style::default().fg(Color::Gray),
        Severity::Error => Style::default().fg(Color::Red),
    };
    frame.render_widget(Paragraph::new(Line::styled(status.to_string(), style)), area);
}
