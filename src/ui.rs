use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::model::{FlashLevel, ResourceList};
use crate::picker::Picker;
use crate::session::SessionTarget;
use crate::view::{LOGS_PAGE, PICKER_PAGE, ResourceView};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);

pub fn render<L: ResourceList>(frame: &mut Frame, view: &ResourceView<L>) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], view);
    let pages = view.pages();
    if pages.is_visible(PICKER_PAGE) {
        render_picker(frame, root[1], view.picker(), None);
    } else if pages.is_visible(LOGS_PAGE) {
        render_picker(
            frame,
            root[1],
            view.logs().picker(),
            Some(view.logs().previous()),
        );
    } else {
        render_table(frame, root[1], view);
    }
    render_footer(frame, root[2], view);

    if view.show_help() {
        render_help_modal(frame, view);
    }
}

fn render_header<L: ResourceList>(frame: &mut Frame, area: Rect, view: &ResourceView<L>) {
    let settings = view.settings();
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " podview ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        format!(" ctx:{} ", compact_text(&settings.context, 24)),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(" ns:{} ", settings.namespace_scope),
        Color::White,
        PL_B,
        PL_C,
    );
    let crumbs = match view.pages().previous() {
        Some(previous) => format!(" {previous} > {} ", view.current_page()),
        None => format!(" {} ", view.current_page()),
    };
    push_powerline_segment(&mut spans, crumbs, Color::White, PL_C, BG);

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG).fg(Color::White)),
        area,
    );
}

fn render_table<L: ResourceList>(frame: &mut Frame, area: Rect, view: &ResourceView<L>) {
    let sort = view.sort();
    let headers = view.list().headers();
    let header_row = Row::new(headers.iter().enumerate().map(|(index, header)| {
        let label = if index == sort.column {
            let arrow = if sort.ascending { "↑" } else { "↓" };
            format!("{header}{arrow}")
        } else {
            header.clone()
        };
        Cell::from(label).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let visible_rows = view.visible_rows();
    let rows = visible_rows.iter().map(|row| {
        Row::new(
            row.columns
                .iter()
                .map(|column| Cell::from(column.clone()).style(Style::default().fg(Color::White))),
        )
    });

    let block = Block::default()
        .title(format!(
            "{}({}) [{}]",
            view.title(),
            view.settings().namespace_scope,
            visible_rows.len()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    let table = Table::new(rows, column_constraints(headers.len()))
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(view.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

/// Container choices for a pod. `previous` is set on the log page.
fn render_picker(
    frame: &mut Frame,
    area: Rect,
    picker: &Picker<SessionTarget>,
    previous: Option<bool>,
) {
    let mut title = format!("{} ({})", picker.title(), picker.items().len());
    if previous == Some(true) {
        title.push_str(" [previous]");
    }

    let header = Row::new(["#", "CONTAINER"].map(|header| {
        Cell::from(header).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));
    let rows = picker.items().iter().enumerate().map(|(index, item)| {
        Row::new(vec![
            Cell::from((index + 1).to_string()).style(Style::default().fg(MUTED)),
            Cell::from(item.clone()).style(Style::default().fg(Color::White)),
        ])
    });

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    let table = Table::new(rows, [Constraint::Length(4), Constraint::Min(10)])
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(picker.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_footer<L: ResourceList>(frame: &mut Frame, area: Rect, view: &ResourceView<L>) {
    let line = match view.current_flash() {
        Some(flash) => {
            let (fg, bg) = match flash.level {
                FlashLevel::Info => (Color::White, PL_B),
                FlashLevel::Warn => (Color::Black, WARN),
                FlashLevel::Error => (Color::Black, ERROR),
            };
            let mut spans = Vec::new();
            push_powerline_segment(&mut spans, format!(" {} ", flash.message), fg, bg, BG);
            Line::from(spans)
        }
        None => Line::from(
            view.hints()
                .into_iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(format!(" {key}"), Style::default().fg(ACCENT)),
                        Span::styled(
                            format!(" {}", action.description),
                            Style::default().fg(MUTED),
                        ),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn render_help_modal<L: ResourceList>(frame: &mut Frame, view: &ResourceView<L>) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "podview help  context:{}  scope:{}  page:{}",
            view.settings().context,
            view.settings().namespace_scope,
            view.current_page()
        )),
        Line::from(""),
    ];
    for (key, action) in view.hints() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<14}", key.to_string()), Style::default().fg(ACCENT)),
            Span::raw(action.description.clone()),
        ]));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

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

fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    let width = (100 / columns as u16).max(1);
    (0..columns)
        .map(|_| Constraint::Percentage(width))
        .collect()
}
