//! Layout rendering (catalog list and canvas)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use djset_rs::model::queue::position_of_node;
use djset_rs::model::{ActiveSection, AppModel, Node};
use super::utils::{render_scrollable_list, truncate_string};

const CARD_WIDTH: u16 = 24;
const CARD_HEIGHT: u16 = 5;
const CARD_GAP: u16 = 2;

fn section_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    }
}

pub fn render_catalog(frame: &mut Frame, area: Rect, model: &AppModel) {
    let ui_state = model.ui_state();
    let focused = ui_state.active_section == ActiveSection::Catalog;
    let playing = model.playback().current_song.as_ref().map(|song| song.id.clone());

    let items: Vec<ListItem> = model
        .catalog()
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let style = if i == ui_state.catalog_selected && focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == ui_state.catalog_selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if playing.as_ref() == Some(&song.id) { "▶ " } else { "  " };

            ListItem::new(vec![
                Line::from(format!("{marker}{}", song.title)),
                Line::from(Span::styled(
                    format!("  {} · {}", song.artist, song.duration_label),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Catalog (Enter: place, P: play) ")
        .padding(Padding::horizontal(1))
        .border_style(section_border(focused));

    render_scrollable_list(frame, area, items, ui_state.catalog_selected, block);
}

/// Screen rect of a node card, if it fits inside `inner`
fn card_rect(inner: Rect, node: &Node) -> Option<Rect> {
    let x = inner
        .x
        .saturating_add((node.position.x as u16).saturating_mul(CARD_WIDTH + CARD_GAP));
    let y = inner
        .y
        .saturating_add((node.position.y as u16).saturating_mul(CARD_HEIGHT));
    let fits = x.saturating_add(CARD_WIDTH) <= inner.right()
        && y.saturating_add(CARD_HEIGHT) <= inner.bottom();
    fits.then_some(Rect {
        x,
        y,
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
    })
}

pub fn render_canvas(frame: &mut Frame, area: Rect, model: &AppModel) {
    let ui_state = model.ui_state();
    let focused = ui_state.active_section == ActiveSection::Canvas;
    let graph = model.graph();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Canvas (C: connect, T: transition, X: cut, D: delete) ")
        .border_style(section_border(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if graph.nodes().is_empty() {
        let hint = Paragraph::new("Pick songs from the catalog and press Enter to place them here")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, inner);
        return;
    }

    let playing_node = model.playback().current_node.as_ref();
    let transitioning = model.transitioning_edge();
    let text_width = CARD_WIDTH.saturating_sub(2) as usize;
    let mut hidden = 0;

    for (i, node) in graph.nodes().iter().enumerate() {
        let Some(rect) = card_rect(inner, node) else {
            hidden += 1;
            continue;
        };

        let outgoing = graph.outgoing(&node.id);
        let is_transitioning = outgoing.is_some_and(|edge| Some(&edge.id) == transitioning);
        let border = if i == ui_state.node_selected && focused {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if is_transitioning {
            Style::default().fg(Color::Magenta)
        } else if playing_node == Some(&node.id) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let title = match position_of_node(model.queue(), &node.id) {
            Some(index) => format!(" #{} ", index + 1),
            None => " - ".to_string(),
        };
        let next = outgoing
            .and_then(|edge| graph.node(&edge.target))
            .map(|target| format!("→ {}", target.song.title))
            .unwrap_or_else(|| "→ (end)".to_string());
        let transition = outgoing
            .and_then(|edge| edge.transition.as_ref())
            .map(|rule| format!("≈ {}", rule.label))
            .unwrap_or_default();
        let transition_style = if is_transitioning {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                truncate_string(&node.song.title, text_width),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(truncate_string(&next, text_width)),
            Line::from(Span::styled(truncate_string(&transition, text_width), transition_style)),
        ])
        .block(Block::default().borders(Borders::ALL).title(title).border_style(border));
        frame.render_widget(card, rect);
    }

    if hidden > 0 {
        let note = Line::from(Span::styled(
            format!(" {hidden} off-screen "),
            Style::default().fg(Color::Yellow),
        ))
        .right_aligned();
        let row = Rect {
            y: inner.y + inner.height.saturating_sub(1),
            height: 1.min(inner.height),
            ..inner
        };
        frame.render_widget(Paragraph::new(note), row);
    }
}
