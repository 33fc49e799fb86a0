//! Core type definitions for the front end

use std::time::Instant;

/// Which pane of the UI is currently focused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActiveSection {
    #[default]
    Catalog,
    Canvas,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Catalog => ActiveSection::Canvas,
            ActiveSection::Canvas => ActiveSection::Catalog,
        }
    }

    pub fn prev(self) -> Self {
        // Only two panes, so both directions agree
        self.next()
    }
}

/// A choice offered by one of the picker popups
#[derive(Clone, Debug, PartialEq)]
pub struct PickerItem {
    pub label: String,
    pub detail: String,
}

/// Screen cells covered by the timeline segments. One column is one
/// timeline unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl TimelineArea {
    /// Timeline offset under a terminal cell, if the cell is on the timeline
    pub fn offset_at(&self, column: u16, row: u16) -> Option<f64> {
        let inside = column >= self.x
            && column < self.x.saturating_add(self.width)
            && row >= self.y
            && row < self.y.saturating_add(self.height);
        // Aim for the middle of the clicked cell
        inside.then(|| f64::from(column - self.x) + 0.5)
    }
}

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub catalog_selected: usize,
    pub node_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub status_message: Option<String>,
    pub show_connect_picker: bool,
    pub connect_selected: usize,
    pub show_transition_picker: bool,
    pub transition_selected: usize,
    pub show_help_popup: bool,
    /// Where the timeline was drawn last frame
    pub timeline_area: Option<TimelineArea>,
}

impl UiState {
    pub fn has_popup(&self) -> bool {
        self.show_connect_picker || self.show_transition_picker || self.show_help_popup
    }
}
