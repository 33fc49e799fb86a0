//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Catalog list and canvas
//! - `timeline`: Queue timeline with segments, transition boxes and playhead
//! - `progress`: Playback status bar
//! - `overlays`: Modal overlays (error, pickers, help)

mod utils;
mod layout;
mod timeline;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use djset_rs::model::{AppModel, TimelineArea};

pub struct AppView;

impl AppView {
    /// Draw one frame and report where the timeline ended up, so clicks can
    /// be mapped back onto it.
    pub fn render(frame: &mut Frame, model: &mut AppModel) -> Option<TimelineArea> {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Catalog + canvas
                Constraint::Length(4), // Timeline
                Constraint::Length(3), // Progress bar with playback info
            ])
            .split(frame.area());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Catalog
                Constraint::Percentage(70), // Canvas
            ])
            .split(chunks[0]);

        layout::render_catalog(frame, main_chunks[0], model);
        layout::render_canvas(frame, main_chunks[1], model);

        let timeline_area = timeline::render_timeline(frame, chunks[1], model);
        progress::render_progress_bar(frame, chunks[2], model);

        let ui_state = model.ui_state();
        if ui_state.show_connect_picker {
            overlays::render_picker(
                frame,
                " Connect to (↑↓ Enter Esc) ",
                &model.connect_options(),
                ui_state.connect_selected,
            );
        }

        if ui_state.show_transition_picker {
            overlays::render_picker(
                frame,
                " Transition (↑↓ Enter Esc) ",
                &model.transition_options(),
                ui_state.transition_selected,
            );
        }

        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }

        // Error notification goes on top of everything else
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        timeline_area
    }
}
