//! All drawing / rendering functions.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::{Column, Field, LoadState, NoticeLevel, Overlay, RecordForm, SortDirection};

use super::app::{App, Popup};

pub fn draw(frame: &mut ratatui::Frame, app: &mut App) {
    draw_main(frame, app);
    match app.popup() {
        Popup::None => {}
        Popup::Notice => draw_notice_popup(frame, app),
        Popup::Confirm => draw_confirm_popup(frame, app),
        Popup::AddForm | Popup::EditForm => draw_form_popup(frame, app),
    }
}

fn draw_main(frame: &mut ratatui::Frame, app: &mut App) {
    let area = frame.area();

    let refreshing = app.table.is_refreshing();
    let border_color = if refreshing { Color::Yellow } else { Color::Cyan };
    let outer = Block::default()
        .title(" chem-table ")
        .title_alignment(Alignment::Left)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Table
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Controls bar
        ])
        .split(inner);

    draw_table(frame, app, chunks[0]);

    let status_line =
        Paragraph::new(Line::from(build_status_line(app))).style(Style::default().fg(Color::White));
    frame.render_widget(status_line, chunks[1]);

    let controls = "a:add  \u{23ce}:edit  space:select  A:all  J/K:move  d:delete  1-8:sort  r:refresh  s:save  q:quit";
    let controls_bar = Paragraph::new(controls)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(controls_bar, chunks[2]);
}

fn build_status_line(app: &App) -> Vec<Span<'_>> {
    let mut spans = Vec::new();

    match app.table.load_state() {
        LoadState::Idle => {}
        LoadState::InFlight => spans.push(Span::styled(
            " Loading...",
            Style::default().fg(Color::Yellow),
        )),
        LoadState::Loaded(_) => spans.push(Span::styled(
            format!(" {} rows", app.table.rows().len()),
            Style::default().fg(Color::Green),
        )),
        LoadState::Failed(_) => spans.push(Span::styled(
            " Load failed",
            Style::default().fg(Color::Red),
        )),
    }

    let selected = app.table.selected_indices().len();
    if selected > 0 {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!("{selected} selected"),
            Style::default().fg(Color::Yellow),
        ));
    }

    if !app.status.is_empty() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            app.status.as_str(),
            Style::default().fg(Color::Cyan),
        ));
    }

    spans
}

fn header_label(app: &App, index: usize, column: Column) -> String {
    let Some(field) = column.field() else {
        return String::new();
    };
    let arrow = match (app.sorted_column == Some(index), app.table.sort_direction(index)) {
        (true, Some(SortDirection::Ascending)) => " \u{25b2}",
        (true, Some(SortDirection::Descending)) => " \u{25bc}",
        _ => "",
    };
    format!("{index} {}{arrow}", field.label())
}

fn draw_table(frame: &mut ratatui::Frame, app: &mut App, area: Rect) {
    let header = Row::new(
        Column::ALL
            .iter()
            .enumerate()
            .map(|(i, &column)| Cell::from(header_label(app, i, column))),
    )
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let checkbox = if app.table.is_selected(i) { "[x]" } else { "[ ]" };
            let cells = std::iter::once(checkbox.to_string()).chain(row.cells.iter().cloned());
            let style = if app.table.is_selected(i) {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new(cells).style(style)
        })
        .collect();

    let widths = Column::ALL.map(|column| match column {
        Column::Select => Constraint::Length(3),
        Column::Field(Field::ChemicalName) => Constraint::Min(16),
        Column::Field(field) if field.is_numeric() => Constraint::Length(12),
        Column::Field(_) => Constraint::Min(8),
    });

    let empty_hint = match app.table.load_state() {
        LoadState::InFlight => " Loading... ",
        _ if app.table.rows().is_empty() => " No rows ",
        _ => "",
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(empty_hint))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);
    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_notice_popup(frame: &mut ratatui::Frame, app: &App) {
    let Some(notice) = app.notice.as_ref() else {
        return;
    };
    let (title, color) = match notice.level {
        NoticeLevel::Info => (" Info ", Color::Green),
        NoticeLevel::Warning => (" Notice ", Color::Yellow),
        NoticeLevel::Error => (" Error ", Color::Red),
    };

    let area = centered_rect(50, 7, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let message = Paragraph::new(format!(" {}", notice.message))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    frame.render_widget(message, chunks[0]);

    let help = Paragraph::new(" Enter/Esc to close").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);
}

fn draw_confirm_popup(frame: &mut ratatui::Frame, app: &App) {
    let Some(question) = app.table.pending_confirmation() else {
        return;
    };
    let area = centered_rect(60, 6, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let question = Paragraph::new(format!(" {question}"))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    frame.render_widget(question, chunks[0]);

    let help = Paragraph::new(" y: delete | n/Esc: keep").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);
}

fn draw_form_popup(frame: &mut ratatui::Frame, app: &App) {
    let (title, form) = match app.table.overlay() {
        Overlay::Add(form) => (" Add Chemical ", form),
        Overlay::Edit(form) => (" Edit Chemical ", form),
        Overlay::None => return,
    };

    let height = u16::try_from(Field::ALL.len()).unwrap_or(8) + 5;
    let area = centered_rect(52, height, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Id
            Constraint::Min(4),    // Fields
            Constraint::Length(1), // Help
        ])
        .split(inner);

    let id = Paragraph::new(format!(" Id: {}", form.id)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(id, chunks[0]);

    frame.render_widget(Table::new(form_rows(form), [
        Constraint::Length(2),
        Constraint::Length(15),
        Constraint::Min(10),
    ]), chunks[1]);

    let help = Paragraph::new(" Tab: next | Enter: save | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}

fn form_rows(form: &RecordForm) -> Vec<Row<'_>> {
    Field::ALL
        .iter()
        .map(|&field| {
            let is_active = form.active() == field;
            let style = if is_active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if is_active { ">" } else { " " };
            let value = if is_active {
                format!("{}_", form.get(field))
            } else {
                form.get(field).to_string()
            };
            Row::new(vec![marker.to_string(), format!("{}:", field.label()), value]).style(style)
        })
        .collect()
}

/// Returns a centered rectangle of the given size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
