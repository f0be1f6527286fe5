//! View Rendering
//!
//! Draws the three top-level views into a ratatui buffer:
//!
//! ```text
//! Prompt                 Chat                     Settings
//! ┌ Actions ─────────┐   ┌ Chat ─────────────┐    ┌ Settings ───────────┐
//! │ > chat   Send .. │   │ You: hi           │    │ action timeout  30s │
//! │   clear  Start ..│   │ Assistant: You .. │    │ on local error ...  │
//! └──────────────────┘   └───────────────────┘    └─────────────────────┘
//! ┌ Prompt ──────────┐   ┌ Prompt ───────────┐
//! │ You: _           │   │ You: _            │
//! └──────────────────┘   └───────────────────┘
//!  status bar / notices
//! ```

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

use bridge_core::{ActionSummary, NotifyLevel, View};

use crate::display::{DisplayRole, DisplayState};
use crate::theme::{
    ACCENT, DIM_GRAY, ERROR_RED, INFO_BLUE, SUCCESS_GREEN, USER_GREEN, WARNING_AMBER,
};

/// Input box height (lines, including borders)
pub const INPUT_HEIGHT: u16 = 3;

/// Renderer-local state the views need besides [`DisplayState`]
#[derive(Debug, Default)]
pub struct ViewModel<'a> {
    /// Text being typed
    pub input: &'a str,
    /// Registered actions, sorted by name
    pub actions: &'a [ActionSummary],
    /// Highlighted action in the prompt view
    pub selected_action: usize,
    /// Effective configuration, as `(label, value)` rows
    pub settings: &'a [(String, String)],
}

/// Draw the active view plus status line
pub fn render(state: &DisplayState, model: &ViewModel<'_>, area: Rect, buf: &mut Buffer) {
    let notice_height = u16::try_from(state.notices.len()).unwrap_or(u16::MAX);
    let [body, notices, status] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(notice_height),
        Constraint::Length(1),
    ])
    .areas(area);

    match state.view {
        View::Prompt => render_prompt(model, body, buf),
        View::Chat => render_chat(state, model, body, buf),
        View::Settings => render_settings(model, body, buf),
    }

    render_notices(state, notices, buf);
    render_status(state, status, buf);
}

fn render_prompt(model: &ViewModel<'_>, area: Rect, buf: &mut Buffer) {
    let [list, input] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(INPUT_HEIGHT)]).areas(area);

    let name_width = model.actions.iter().map(|a| a.name.len()).max().unwrap_or(0);
    let lines: Vec<Line> = model
        .actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let selected = i == model.selected_action;
            let marker = if selected { "> " } else { "  " };
            let name_style = if selected {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<name_width$}  ", action.name), name_style),
                Span::styled(
                    action.description.clone().unwrap_or_default(),
                    Style::default().fg(DIM_GRAY),
                ),
            ])
        })
        .collect();

    Paragraph::new(lines)
        .block(titled("Actions"))
        .render(list, buf);
    render_input(model.input, input, buf);
}

fn render_chat(state: &DisplayState, model: &ViewModel<'_>, area: Rect, buf: &mut Buffer) {
    let [history, input] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(INPUT_HEIGHT)]).areas(area);

    let block = titled(View::Chat.title());
    let inner = block.inner(history);
    block.render(history, buf);

    let width = usize::from(inner.width.max(1));
    let height = usize::from(inner.height);
    let mut lines: Vec<(String, Style)> = Vec::new();

    for item in &state.chat_history {
        let role = DisplayRole::from(item.role);
        let content = format!("{}{}", role.prefix(), item.content);
        push_wrapped(&mut lines, &content, width, role_style(role));
    }
    if let Some(partial) = &state.partial_message {
        let content = format!("{}{}_", DisplayRole::Assistant.prefix(), partial);
        push_wrapped(&mut lines, &content, width, role_style(DisplayRole::Assistant));
    }

    // Stick to the bottom: show the last `height` lines
    let start = lines.len().saturating_sub(height);
    for (row, (line, style)) in lines[start..].iter().enumerate() {
        let y = inner.y + u16::try_from(row).unwrap_or(u16::MAX);
        buf.set_stringn(inner.x, y, line, width, *style);
    }

    render_input(model.input, input, buf);
}

fn render_settings(model: &ViewModel<'_>, area: Rect, buf: &mut Buffer) {
    let label_width = model.settings.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let mut lines: Vec<Line> = model
        .settings
        .iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:<label_width$}  "), Style::default().fg(DIM_GRAY)),
                Span::raw(value.clone()),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::styled(
        "Run the `home` action to go back",
        Style::default().fg(DIM_GRAY),
    ));

    Paragraph::new(lines)
        .block(titled(View::Settings.title()))
        .render(area, buf);
}

fn render_input(input: &str, area: Rect, buf: &mut Buffer) {
    let block = titled("Prompt");
    let inner = block.inner(area);
    block.render(area, buf);

    let width = usize::from(inner.width);
    if width < 5 {
        return;
    }

    // Keep the cursor end visible when the input is wider than the box
    let full = format!("You: {input}_");
    let wrapped = textwrap::wrap(&full, width);
    if let Some(last) = wrapped.last() {
        buf.set_stringn(inner.x, inner.y, last, width, Style::default().fg(USER_GREEN));
    }
}

fn render_notices(state: &DisplayState, area: Rect, buf: &mut Buffer) {
    for (row, shown) in state.notices.iter().enumerate() {
        let Ok(offset) = u16::try_from(row) else { break };
        if offset >= area.height {
            break;
        }
        let notice = &shown.notice;
        let text = match &notice.title {
            Some(title) => format!(" {title}: {}", notice.message),
            None => format!(" {}", notice.message),
        };
        buf.set_stringn(
            area.x,
            area.y + offset,
            text,
            usize::from(area.width),
            Style::default().fg(level_color(notice.level)),
        );
    }
}

fn render_status(state: &DisplayState, area: Rect, buf: &mut Buffer) {
    let status = format!(
        " {} | {} | Enter run | Up/Down pick action | Esc quit",
        state.status(),
        state.view
    );
    let style = if state.is_busy() {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(DIM_GRAY)
    };
    buf.set_stringn(area.x, area.y, status, usize::from(area.width), style);
}

fn push_wrapped(lines: &mut Vec<(String, Style)>, content: &str, width: usize, style: Style) {
    for line in textwrap::wrap(content, width) {
        lines.push((line.into_owned(), style));
    }
    lines.push((String::new(), Style::default()));
}

fn titled(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM_GRAY))
        .title(Span::styled(format!(" {title} "), Style::default().fg(ACCENT)))
}

fn role_style(role: DisplayRole) -> Style {
    match role {
        DisplayRole::User => Style::default().fg(Color::Green),
        DisplayRole::Assistant => Style::default().fg(ACCENT),
        DisplayRole::System => Style::default().fg(DIM_GRAY),
    }
}

fn level_color(level: NotifyLevel) -> Color {
    match level {
        NotifyLevel::Info => INFO_BLUE,
        NotifyLevel::Warning => WARNING_AMBER,
        NotifyLevel::Error => ERROR_RED,
        NotifyLevel::Success => SUCCESS_GREEN,
    }
}
