//! Drawing of the editor screen.
//!
//! Layout: title bar, category list on the left, details (or the edit form)
//! on the right, key help and status at the bottom. Delete confirmation and
//! prompts are drawn as centered dialogs on top.

use crate::config::Category;
use crate::editor::form::{CategoryForm, FormField};
use crate::editor::state::{EditSession, EditTarget, EditorState, Mode, Prompt, StatusKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

const ACCENT: Color = Color::Cyan;

/// Draws the whole editor for the current state.
pub fn render(frame: &mut Frame, state: &EditorState) {
    let [title, body, help, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_title(frame, title, state);

    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(body);
    draw_category_list(frame, list_area, state);

    match state.mode() {
        Mode::Editing(session) => draw_form(frame, detail_area, session),
        _ => draw_details(frame, detail_area, state.config().categories.get(state.selected())),
    }

    frame.render_widget(
        Paragraph::new(help_text(state.mode())).style(Style::default().fg(Color::DarkGray)),
        help,
    );
    draw_status(frame, status, state);

    match state.mode() {
        Mode::ConfirmingDelete { index } => draw_confirm_delete(frame, state, *index),
        Mode::Prompt(prompt) => draw_prompt(frame, prompt),
        _ => {}
    }
}

fn draw_title(frame: &mut Frame, area: Rect, state: &EditorState) {
    let mut spans = vec![
        Span::styled(
            " SmartFiler config ",
            Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(state.config_path().display().to_string()),
    ];
    if state.is_dirty() {
        spans.push(Span::styled(" [modified]", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_category_list(frame: &mut Frame, area: Rect, state: &EditorState) {
    let categories = &state.config().categories;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" Categories ({}) ", categories.len()));

    if categories.is_empty() {
        frame.render_widget(
            Paragraph::new("No categories yet.\nPress a to add one.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(category.name.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(state.selected()));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_details(frame: &mut Frame, area: Rect, category: Option<&Category>) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");
    let Some(category) = category else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let extensions = if category.extensions.is_empty() {
        "(none)".to_string()
    } else {
        category.extensions.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let patterns = if category.patterns.is_empty() {
        "(none)".to_string()
    } else {
        category.patterns.join(", ")
    };

    let mut lines = vec![
        detail_line("Name", &category.name),
        detail_line("Extensions", &extensions),
        detail_line("Patterns", &patterns),
        detail_line("Match mode", category.match_mode.description()),
        detail_line("Destination", &category.destination),
    ];
    if category.is_inert() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "This category can never match a file.",
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn detail_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value.to_string()),
    ])
}

fn draw_form(frame: &mut Frame, area: Rect, session: &EditSession) {
    let title = match session.target {
        EditTarget::New => " New category ",
        EditTarget::Existing(_) => " Edit category ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(title);

    frame.render_widget(
        Paragraph::new(Text::from(form_lines(&session.form, session.field)))
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn form_lines(form: &CategoryForm, active: FormField) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = field == active;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let marker = if focused { "▶ " } else { "  " };
        let mut value = form.value(field).to_string();
        if focused && field != FormField::MatchMode {
            value.push('█');
        }

        lines.push(Line::from(vec![
            Span::styled(format!("{}{:<12}", marker, field.label()), label_style),
            Span::raw(value),
        ]));
        if focused {
            lines.push(Line::styled(
                format!("  {:<12}{}", "", field.hint()),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    lines
}

fn help_text(mode: &Mode) -> &'static str {
    match mode {
        Mode::Browsing => {
            " a add  u edit  d delete  J/K reorder  t test name  o open  s save  q quit"
        }
        Mode::Editing(_) => " Tab next field  Shift-Tab previous  Enter apply  Esc cancel",
        Mode::ConfirmingDelete { .. } => " y delete  n cancel",
        Mode::Prompt(_) => " Enter submit  Esc close",
    }
}

fn draw_status(frame: &mut Frame, area: Rect, state: &EditorState) {
    let Some(status) = state.status() else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
    };
    frame.render_widget(
        Paragraph::new(format!(" {}", status.text)).style(Style::default().fg(color)),
        area,
    );
}

fn draw_confirm_delete(frame: &mut Frame, state: &EditorState, index: usize) {
    let name = state
        .config()
        .categories
        .get(index)
        .map(|c| c.name.as_str())
        .unwrap_or_default();
    let area = centered(frame.area(), 50, 5);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(" Confirm Delete ", Style::default().fg(Color::Red)));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(vec![
            Line::raw(format!("Delete category '{}'?", name)),
            Line::styled("y = yes, n = no", Style::default().fg(Color::DarkGray)),
        ]))
        .block(block),
        area,
    );
}

fn draw_prompt(frame: &mut Frame, prompt: &Prompt) {
    let area = centered(frame.area(), 70, prompt_height(prompt.result.len()));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(format!(" {} ", prompt.kind.title()));

    let mut lines = vec![
        Line::from(vec![
            Span::styled("> ", Style::default().fg(ACCENT)),
            Span::raw(format!("{}█", prompt.input)),
        ]),
        Line::raw(""),
    ];
    lines.extend(prompt.result.iter().map(|line| Line::raw(line.clone())));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

/// Dialog height for a prompt showing `result_lines` lines of output.
fn prompt_height(result_lines: usize) -> u16 {
    u16::try_from(result_lines)
        .unwrap_or(u16::MAX)
        .saturating_add(5)
}

/// A `width` x `height` rectangle in the middle of `area`, clamped to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
