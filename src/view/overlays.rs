//! Overlay rendering (error notification, pickers, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use djset_rs::model::{PickerItem, UiState};

/// A `width` x `height` rect centred in `area`, shrunk to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

fn popup_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    let Some(error_msg) = &ui_state.error_message else {
        return;
    };

    let popup_width: u16 = 52;
    let inner_width = popup_width.saturating_sub(4).max(1);
    let line_count = (error_msg.chars().count() as u16).div_ceil(inner_width).max(1);
    let popup_area = centered(frame.area(), popup_width, line_count + 2);

    frame.render_widget(Clear, popup_area);

    let error_widget = Paragraph::new(error_msg.as_str())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(popup_block(" Error (Esc to dismiss) ", Color::Red));

    frame.render_widget(error_widget, popup_area);
}

pub fn render_picker(frame: &mut Frame, title: &str, items: &[PickerItem], selected: usize) {
    let widest = items
        .iter()
        .map(|item| item.label.chars().count().max(item.detail.chars().count()) + 4)
        .max()
        .unwrap_or(30);
    let popup_width = (widest as u16 + 4).clamp(35, 64);
    let popup_height = (items.len() as u16 * 2 + 2).max(6);
    let popup_area = centered(frame.area(), popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(vec![
                Line::from(format!(" {}", item.label)),
                Line::from(Span::styled(
                    format!("   {}", item.detail),
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ])
            .style(style)
        })
        .collect();

    let list = List::new(list_items).block(popup_block(title, Color::Cyan));

    let mut list_state = ListState::default();
    list_state.select(Some(selected));

    frame.render_stateful_widget(list, popup_area, &mut list_state);
}

pub fn render_help_popup(frame: &mut Frame) {
    let keybindings = [
        ("", "── Navigation ──"),
        ("Tab / Shift+Tab", "Switch catalog / canvas"),
        ("↑ / ↓", "Move selection"),
        ("", ""),
        ("", "── Catalog ──"),
        ("Enter", "Place song on the canvas"),
        ("P", "Play song"),
        ("", ""),
        ("", "── Canvas ──"),
        ("C", "Connect to another song"),
        ("T", "Choose transition"),
        ("X", "Remove outgoing connection"),
        ("D / Delete", "Remove song"),
        ("Shift+Arrows", "Move song"),
        ("Enter / P", "Play from this song"),
        ("", ""),
        ("", "── Playback ──"),
        ("Space", "Play / Pause"),
        ("[ / ]", "Previous / next entry"),
        ("Click timeline", "Seek"),
        ("", ""),
        ("", "── General ──"),
        ("H", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_area = centered(frame.area(), 62, keybindings.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(popup_block(" Help (H or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
