//! Model module - Set data and playback state
//!
//! This module contains the data structures and state management for the
//! set builder. It is organized into submodules by responsibility:
//!
//! - `song`: Catalog entries and transition rules
//! - `catalog`: Loading and validating the song catalog
//! - `graph`: Canvas nodes and the connections between them
//! - `queue`: Linear playback queue derived from the graph
//! - `playback`: Playback engine sequencing songs and transition clips
//! - `timeline`: Playhead projection onto the rendered timeline
//! - `types`: Front end state (focus, selections, popups)
//! - `app_model`: Coordinating model that keeps all of the above in step

pub mod song;
pub mod catalog;
pub mod graph;
pub mod queue;
pub mod playback;
pub mod timeline;
mod types;
mod app_model;

// Re-export all public types for convenient access
pub use song::{
    EdgeId, NodeId, SongId, SongMetadata, TransitionRule, TransitionTarget,
    format_clock, parse_clock,
};

pub use catalog::Catalog;
pub use graph::{Edge, Node, Position, SetGraph};
pub use queue::{QueueEntry, build_queue};
pub use playback::{Effect, PlaybackEngine, PlaybackState, PlaybackStatus};
pub use timeline::{SeekTarget, SegmentWidths, WidthCache, compute_offset, locate};

pub use types::{ActiveSection, PickerItem, TimelineArea, UiState};

pub use app_model::AppModel;
