//! Timeline rendering: one segment per queue entry, a box for each
//! transition clip between them, and the playhead underneath

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use djset_rs::model::timeline::has_transition_box;
use djset_rs::model::{AppModel, PlaybackStatus, TimelineArea};
use super::utils::truncate_string;

const SEGMENT_COLORS: [Color; 2] = [Color::Blue, Color::Cyan];

pub fn render_timeline(frame: &mut Frame, area: Rect, model: &mut AppModel) -> Option<TimelineArea> {
    let block = Block::default().borders(Borders::ALL).title(" Timeline ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if model.queue().is_empty() || inner.width == 0 || inner.height == 0 {
        let hint = Paragraph::new("Connect songs on the canvas to build a queue")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, inner);
        return None;
    }

    let widths = model.measure_timeline(inner.width);
    let queue = model.queue();
    let state = model.playback();
    let transitioning = model.transitioning_edge();
    let idle = model.status() == PlaybackStatus::Idle;

    let mut spans = Vec::new();
    for (i, entry) in queue.iter().enumerate() {
        let width = widths.segment(i).max(0.0) as usize;
        let current = !idle && i == state.index && state.current_node.as_ref() == Some(&entry.node_id);
        let mut style = Style::default()
            .fg(Color::Black)
            .bg(SEGMENT_COLORS[i % SEGMENT_COLORS.len()]);
        if current && !state.in_transition {
            style = style.bg(Color::Yellow).add_modifier(Modifier::BOLD);
        }
        spans.push(Span::styled(truncate_string(&entry.song.title, width), style));

        if has_transition_box(queue, i) {
            let box_width = widths.transition_box().max(0.0) as usize;
            let active = entry.edge_to_next.is_some() && entry.edge_to_next.as_ref() == transitioning;
            let style = if active {
                Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Magenta)
            };
            spans.push(Span::styled("≈".repeat(box_width), style));
        }
    }

    let mut lines = vec![Line::from(spans)];
    if !idle && inner.height > 1 {
        let column = model.playhead_offset().max(0.0) as usize;
        let column = column.min(inner.width.saturating_sub(1) as usize);
        lines.push(Line::from(vec![
            Span::raw(" ".repeat(column)),
            Span::styled("▲", Style::default().fg(Color::Yellow)),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    Some(TimelineArea {
        x: inner.x,
        y: inner.y,
        width: inner.width,
        height: inner.height,
    })
}
