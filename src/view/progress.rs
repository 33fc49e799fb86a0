//! Progress bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use djset_rs::model::{AppModel, PlaybackStatus};
use super::utils::format_duration;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, model: &AppModel) {
    let state = model.playback();
    let song = state.current_song.as_ref();

    let status_text = match (model.status(), song) {
        (PlaybackStatus::Idle, _) | (_, None) => " Nothing playing".to_string(),
        (PlaybackStatus::PlayingTransition, Some(song)) => {
            format!(" ≈ Transition out of {} | {}", song.title, song.artist)
        }
        (PlaybackStatus::Paused, Some(song)) => format!(" ⏸  {} | {}", song.title, song.artist),
        (PlaybackStatus::PlayingSong, Some(song)) => format!(" ▶ {} | {}", song.title, song.artist),
    };

    let time_str = match state.segment_duration {
        Some(duration) => format!("{} / {}", format_duration(state.elapsed), format_duration(duration)),
        None => format!("{} / --:--", format_duration(state.elapsed)),
    };

    let progress_ratio = match state.segment_duration {
        Some(duration) if !duration.is_zero() => {
            (state.elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    let queue_info = if model.queue().is_empty() {
        " Queue empty ".to_string()
    } else {
        format!(" Entry {} of {} ", state.index + 1, model.queue().len())
    };
    let footer = match &model.ui_state().status_message {
        Some(message) => format!(" {message} |{queue_info}| H: help "),
        None => format!("{queue_info}| H: help "),
    };

    let gauge_color = if state.in_transition { Color::Magenta } else { Color::Green };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{status_text} "))
                .title_bottom(Line::from(footer).right_aligned()),
        )
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(progress_ratio)
        .label(time_str);

    frame.render_widget(gauge, area);
}
