//! Main application model with state management

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::catalog::Catalog;
use super::graph::{Position, SetGraph};
use super::playback::{Effect, PlaybackEngine, PlaybackState, PlaybackStatus};
use super::queue::{QueueEntry, build_queue, position_of_node};
use super::song::{EdgeId, NodeId, SongId, SongMetadata, TransitionRule, format_clock};
use super::timeline::{SegmentWidths, WidthCache, compute_offset, layout_segments, locate};
use super::types::{ActiveSection, PickerItem, TimelineArea, UiState};
use crate::audio::OutputMessage;

/// Nodes per row when the canvas places a new node
pub const CANVAS_COLUMNS: usize = 4;
/// Transition box width on the terminal timeline, in columns
pub const TIMELINE_TRANSITION_COLUMNS: f64 = 3.0;
pub const TIMELINE_MIN_SEGMENT_COLUMNS: f64 = 6.0;

/// Main application model containing all state
///
/// Every graph mutation rebuilds the queue before returning, so readers never
/// see a queue derived from an older graph.
pub struct AppModel {
    catalog: Catalog,
    graph: SetGraph,
    queue: Vec<QueueEntry>,
    engine: PlaybackEngine,
    widths: WidthCache,
    ui_state: UiState,
    should_quit: bool,
}

impl AppModel {
    pub fn new(catalog: Catalog, songs_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            graph: SetGraph::new(),
            queue: Vec::new(),
            engine: PlaybackEngine::new(songs_dir),
            widths: WidthCache::new(),
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &SetGraph {
        &self.graph
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn playback(&self) -> &PlaybackState {
        self.engine.state()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.engine.status()
    }

    pub fn transitioning_edge(&self) -> Option<&EdgeId> {
        self.engine.state().transitioning_edge.as_ref()
    }

    /// Playhead position on the timeline, in the units of the last measurement
    pub fn playhead_offset(&self) -> f64 {
        let state = self.engine.state();
        let fallback;
        let widths = match self.widths.current() {
            Some(widths) => widths,
            None => {
                fallback = SegmentWidths::new(Vec::new());
                &fallback
            }
        };
        compute_offset(
            &self.queue,
            state.index,
            state.elapsed,
            state.segment_duration,
            state.in_transition,
            widths,
        )
    }

    /// Segment widths for a timeline `viewport` columns wide, re-measured
    /// only when the queue or the viewport changed.
    pub fn measure_timeline(&mut self, viewport: u16) -> SegmentWidths {
        let queue = &self.queue;
        self.widths
            .get_or_measure(queue.len(), u32::from(viewport), || {
                layout_segments(
                    queue,
                    f64::from(viewport),
                    TIMELINE_MIN_SEGMENT_COLUMNS,
                    TIMELINE_TRANSITION_COLUMNS,
                )
            })
            .clone()
    }

    // ========================================================================
    // Graph mutations
    // ========================================================================

    /// Place a catalog song on the next free canvas cell.
    pub fn add_node(&mut self, song: &SongId) -> Option<NodeId> {
        let Some(song) = self.catalog.get(song).cloned() else {
            tracing::warn!(song = %song, "Song not in catalog");
            return None;
        };
        let position = self.free_position();
        let id = self.graph.add_node(song, position);
        self.rebuild_queue();
        Some(id)
    }

    pub fn move_node(&mut self, id: &NodeId, dx: i32, dy: i32) -> bool {
        let Some(node) = self.graph.node(id) else {
            return false;
        };
        let target = Position::new(
            (node.position.x + dx as f32).max(0.0),
            (node.position.y + dy as f32).max(0.0),
        );
        if self.graph.nodes().iter().any(|other| other.position == target) {
            return false;
        }
        // Position changes never affect the queue
        self.graph.move_node(id, target)
    }

    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let removed = self.graph.remove_node(id);
        if removed {
            self.rebuild_queue();
            let len = self.graph.nodes().len();
            if self.ui_state.node_selected >= len {
                self.ui_state.node_selected = len.saturating_sub(1);
            }
        }
        removed
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Option<EdgeId> {
        let edge = self.graph.connect(source, target);
        if edge.is_some() {
            self.rebuild_queue();
        }
        edge
    }

    pub fn disconnect(&mut self, edge: &EdgeId) -> bool {
        let removed = self.graph.disconnect(edge);
        if removed {
            self.rebuild_queue();
        }
        removed
    }

    pub fn set_edge_transition(&mut self, edge: &EdgeId, rule: Option<TransitionRule>) -> bool {
        let changed = self.graph.set_edge_transition(edge, rule);
        if changed {
            self.rebuild_queue();
        }
        changed
    }

    fn rebuild_queue(&mut self) {
        self.queue = build_queue(self.graph.nodes(), self.graph.edges());
        self.engine.queue_changed(&self.queue);
        // Transition boxes may have come or gone without the entry count changing
        self.widths.invalidate();
        tracing::debug!(
            entries = self.queue.len(),
            revision = self.graph.revision(),
            "Queue rebuilt"
        );
    }

    fn free_position(&self) -> Position {
        let columns = CANVAS_COLUMNS;
        (0..)
            .map(|slot: usize| Position::new((slot % columns) as f32, (slot / columns) as f32))
            .find(|candidate| self.graph.nodes().iter().all(|node| node.position != *candidate))
            .unwrap_or_default()
    }

    // ========================================================================
    // Playback commands
    // ========================================================================

    pub fn select_song(&mut self, song: &Arc<SongMetadata>) -> Vec<Effect> {
        self.engine.select(song, &self.queue)
    }

    pub fn select_entry(&mut self, index: usize) -> Vec<Effect> {
        self.engine.select_entry(index, &self.queue)
    }

    pub fn toggle_play_pause(&mut self) -> Vec<Effect> {
        self.engine.toggle_play_pause(&self.queue)
    }

    pub fn seek(&mut self, index: usize, fraction: f64) -> Vec<Effect> {
        self.engine.seek(index, fraction, &self.queue)
    }

    /// Play the selected canvas node: its queue entry when it is queued,
    /// otherwise just its song.
    pub fn play_selected_node(&mut self) -> Vec<Effect> {
        let Some(id) = self.selected_node() else {
            return Vec::new();
        };
        match position_of_node(&self.queue, &id) {
            Some(index) => self.engine.select_entry(index, &self.queue),
            None => match self.graph.node(&id).map(|node| node.song.clone()) {
                Some(song) => self.engine.select(&song, &self.queue),
                None => Vec::new(),
            },
        }
    }

    /// Jump `delta` entries away from the playing one, staying inside the
    /// queue. From idle any step starts the first entry.
    pub fn step_entry(&mut self, delta: isize) -> Vec<Effect> {
        if self.queue.is_empty() {
            return Vec::new();
        }
        if self.engine.status() == PlaybackStatus::Idle {
            return self.engine.select_entry(0, &self.queue);
        }
        let last = self.queue.len() - 1;
        let index = self
            .engine
            .state()
            .index
            .saturating_add_signed(delta)
            .min(last);
        self.engine.select_entry(index, &self.queue)
    }

    /// Seek to whatever segment lies under a timeline offset.
    pub fn seek_to_offset(&mut self, offset: f64) -> Vec<Effect> {
        let Some(widths) = self.widths.current() else {
            return Vec::new();
        };
        match locate(&self.queue, offset, widths) {
            Some(target) => self.engine.seek(target.index, target.fraction, &self.queue),
            None => Vec::new(),
        }
    }

    pub fn handle_output(&mut self, message: OutputMessage) -> Vec<Effect> {
        self.engine.handle(message, &self.queue)
    }

    /// The output refused to start. Only the engine hears about it; the
    /// interface stays usable and the next play press tries again.
    pub fn play_rejected(&mut self, reason: &str) {
        self.engine.play_rejected(reason);
    }

    // ========================================================================
    // UI State
    // ========================================================================

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_should_quit(&mut self, quit: bool) {
        self.should_quit = quit;
    }

    pub fn set_timeline_area(&mut self, area: Option<TimelineArea>) {
        self.ui_state.timeline_area = area;
    }

    pub fn cycle_section_forward(&mut self) {
        self.ui_state.active_section = self.ui_state.active_section.next();
    }

    pub fn cycle_section_backward(&mut self) {
        self.ui_state.active_section = self.ui_state.active_section.prev();
    }

    pub fn move_selection_up(&mut self) {
        let state = &mut self.ui_state;
        if state.show_connect_picker {
            state.connect_selected = state.connect_selected.saturating_sub(1);
        } else if state.show_transition_picker {
            state.transition_selected = state.transition_selected.saturating_sub(1);
        } else {
            match state.active_section {
                ActiveSection::Catalog => state.catalog_selected = state.catalog_selected.saturating_sub(1),
                ActiveSection::Canvas => state.node_selected = state.node_selected.saturating_sub(1),
            }
        }
    }

    pub fn move_selection_down(&mut self) {
        let limit = if self.ui_state.show_connect_picker {
            self.connect_options().len()
        } else if self.ui_state.show_transition_picker {
            self.transition_options().len()
        } else {
            match self.ui_state.active_section {
                ActiveSection::Catalog => self.catalog.len(),
                ActiveSection::Canvas => self.graph.nodes().len(),
            }
        };

        let state = &mut self.ui_state;
        let selected = if state.show_connect_picker {
            &mut state.connect_selected
        } else if state.show_transition_picker {
            &mut state.transition_selected
        } else {
            match state.active_section {
                ActiveSection::Catalog => &mut state.catalog_selected,
                ActiveSection::Canvas => &mut state.node_selected,
            }
        };
        if *selected + 1 < limit {
            *selected += 1;
        }
    }

    pub fn selected_catalog_song(&self) -> Option<&Arc<SongMetadata>> {
        self.catalog.songs().get(self.ui_state.catalog_selected)
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.graph
            .nodes()
            .get(self.ui_state.node_selected)
            .map(|node| node.id.clone())
    }

    /// Make `id` the canvas selection, e.g. right after placing it.
    pub fn select_node(&mut self, id: &NodeId) {
        if let Some(index) = self.graph.nodes().iter().position(|node| &node.id == id) {
            self.ui_state.node_selected = index;
        }
    }

    // ========================================================================
    // Pickers
    // ========================================================================

    /// Nodes the selected node could play into
    fn connect_targets(&self) -> Vec<NodeId> {
        let source = self.selected_node();
        self.graph
            .nodes()
            .iter()
            .filter(|node| Some(&node.id) != source.as_ref())
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn connect_options(&self) -> Vec<PickerItem> {
        self.connect_targets()
            .iter()
            .filter_map(|id| self.graph.node(id))
            .map(|node| PickerItem {
                label: node.song.title.clone(),
                detail: node.song.artist.clone(),
            })
            .collect()
    }

    /// Transition choices for the selected node's outgoing edge. The first
    /// entry always clears the transition.
    fn transition_choices(&self) -> Vec<Option<TransitionRule>> {
        let Some(source) = self.selected_node() else {
            return Vec::new();
        };
        let Some(edge) = self.graph.outgoing(&source) else {
            return Vec::new();
        };
        let (Some(from), Some(to)) = (self.graph.node(&edge.source), self.graph.node(&edge.target)) else {
            return Vec::new();
        };

        std::iter::once(None)
            .chain(
                from.song
                    .available_transitions_to(&to.song.id)
                    .map(|rule| Some(rule.clone())),
            )
            .collect()
    }

    pub fn transition_options(&self) -> Vec<PickerItem> {
        self.transition_choices()
            .into_iter()
            .map(|choice| match choice {
                Some(rule) => PickerItem {
                    label: rule.label.clone(),
                    detail: format!(
                        "cut {} / resume {}",
                        format_clock(rule.cut_point),
                        format_clock(rule.resume_point)
                    ),
                },
                None => PickerItem {
                    label: "No transition".to_string(),
                    detail: "cut straight to the next song".to_string(),
                },
            })
            .collect()
    }

    pub fn show_connect_picker(&mut self) -> bool {
        if self.connect_targets().is_empty() {
            self.set_error("Add another song to the canvas first".to_string());
            return false;
        }
        self.ui_state.show_connect_picker = true;
        self.ui_state.connect_selected = 0;
        true
    }

    pub fn hide_connect_picker(&mut self) {
        self.ui_state.show_connect_picker = false;
    }

    pub fn is_connect_picker_open(&self) -> bool {
        self.ui_state.show_connect_picker
    }

    /// Connect the selected node to the picked target and close the picker.
    pub fn confirm_connect(&mut self) -> Option<EdgeId> {
        let source = self.selected_node()?;
        let target = self
            .connect_targets()
            .get(self.ui_state.connect_selected)
            .cloned();
        self.hide_connect_picker();
        let edge = self.connect(&source, &target?);
        if edge.is_none() {
            self.set_status("Already connected".to_string());
        }
        edge
    }

    pub fn show_transition_picker(&mut self) -> bool {
        let choices = self.transition_choices();
        if choices.is_empty() {
            self.set_error("Connect this song to another one first".to_string());
            return false;
        }

        // Preselect whatever the edge currently uses
        let current = self
            .selected_node()
            .and_then(|node| self.graph.outgoing(&node))
            .and_then(|edge| edge.transition.as_ref())
            .map(|rule| rule.name.clone());
        let selected = choices
            .iter()
            .position(|choice| choice.as_ref().map(|rule| &rule.name) == current.as_ref())
            .unwrap_or(0);

        self.ui_state.show_transition_picker = true;
        self.ui_state.transition_selected = selected;
        true
    }

    pub fn hide_transition_picker(&mut self) {
        self.ui_state.show_transition_picker = false;
    }

    pub fn is_transition_picker_open(&self) -> bool {
        self.ui_state.show_transition_picker
    }

    pub fn confirm_transition(&mut self) -> bool {
        let choice = self
            .transition_choices()
            .into_iter()
            .nth(self.ui_state.transition_selected);
        let edge = self
            .selected_node()
            .and_then(|node| self.graph.outgoing(&node))
            .map(|edge| edge.id.clone());
        self.hide_transition_picker();

        match (edge, choice) {
            (Some(edge), Some(rule)) => self.set_edge_transition(&edge, rule),
            _ => false,
        }
    }

    // ========================================================================
    // Messages and help
    // ========================================================================

    pub fn set_error(&mut self, message: String) {
        self.ui_state.error_message = Some(message);
        self.ui_state.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.ui_state.error_message = None;
        self.ui_state.error_timestamp = None;
    }

    pub fn has_error(&self) -> bool {
        self.ui_state.error_message.is_some()
    }

    pub fn auto_clear_old_errors(&mut self) {
        if let Some(timestamp) = self.ui_state.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                self.clear_error();
            }
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.ui_state.status_message = Some(message);
    }

    pub fn show_help_popup(&mut self) {
        self.ui_state.show_help_popup = true;
    }

    pub fn hide_help_popup(&mut self) {
        self.ui_state.show_help_popup = false;
    }

    pub fn is_help_popup_open(&self) -> bool {
        self.ui_state.show_help_popup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::audio::OutputEvent;

    fn model() -> AppModel {
        AppModel::new(Catalog::bundled().unwrap(), "songs")
    }

    fn loaded(model: &AppModel, seconds: u64) -> OutputMessage {
        OutputMessage {
            generation: model.playback().generation,
            event: OutputEvent::Loaded {
                duration: Duration::from_secs(seconds),
            },
        }
    }

    /// Just Dance -> Dynamite -> Starships, the first hop through "Fire Wordplay"
    fn three_song_set(model: &mut AppModel) -> Vec<NodeId> {
        let nodes: Vec<NodeId> = ["12", "17", "4"]
            .iter()
            .map(|id| model.add_node(&SongId::new(*id)).unwrap())
            .collect();
        model.connect(&nodes[0], &nodes[1]).unwrap();
        model.connect(&nodes[1], &nodes[2]).unwrap();
        nodes
    }

    #[test]
    fn graph_mutations_rebuild_the_queue() {
        let mut model = model();
        let nodes = three_song_set(&mut model);
        assert_eq!(model.queue().len(), 3);
        assert_eq!(model.queue()[0].transition.as_ref().unwrap().name, "Fire Wordplay");

        let edge = model.graph().outgoing(&nodes[1]).unwrap().id.clone();
        assert!(model.disconnect(&edge));
        assert_eq!(model.queue().len(), 2);

        assert!(model.remove_node(&nodes[0]));
        assert_eq!(model.queue().len(), 1);
        assert_eq!(model.queue()[0].song.id.as_str(), "17");
    }

    #[test]
    fn unknown_songs_are_not_placed() {
        let mut model = model();
        assert!(model.add_node(&SongId::new("999")).is_none());
        assert!(model.graph().nodes().is_empty());
    }

    #[test]
    fn new_nodes_fill_free_canvas_cells() {
        let mut model = model();
        let a = model.add_node(&SongId::new("12")).unwrap();
        let b = model.add_node(&SongId::new("17")).unwrap();
        model.remove_node(&a);
        let c = model.add_node(&SongId::new("4")).unwrap();

        assert_eq!(model.graph().node(&b).unwrap().position, Position::new(1.0, 0.0));
        assert_eq!(model.graph().node(&c).unwrap().position, Position::new(0.0, 0.0));
    }

    #[test]
    fn moving_onto_another_node_is_refused() {
        let mut model = model();
        let a = model.add_node(&SongId::new("12")).unwrap();
        model.add_node(&SongId::new("17")).unwrap();

        assert!(!model.move_node(&a, 1, 0));
        assert!(model.move_node(&a, 0, 1));
        assert_eq!(model.graph().node(&a).unwrap().position, Position::new(0.0, 1.0));
    }

    #[test]
    fn click_on_the_timeline_seeks_within_the_playing_song() {
        let mut model = model();
        three_song_set(&mut model);
        model.select_entry(0);
        let message = loaded(&model, 240);
        model.handle_output(message);
        let generation = model.playback().generation;

        let widths = model.measure_timeline(66);
        let half_of_first = widths.segment(0) / 2.0;
        let effects = model.seek_to_offset(half_of_first);

        assert_eq!(effects, vec![Effect::Seek(Duration::from_secs(120))]);
        assert_eq!(model.playback().generation, generation);
        assert_eq!(model.playback().elapsed, Duration::from_secs(120));
    }

    #[test]
    fn playhead_tracks_the_measured_layout() {
        let mut model = model();
        three_song_set(&mut model);
        // Two transition boxes share the row with three segments
        let widths = model.measure_timeline(66);
        assert_eq!(widths.segment(0), 20.0);

        model.select_entry(1);
        assert_eq!(model.playhead_offset(), 20.0 + TIMELINE_TRANSITION_COLUMNS);
    }

    #[test]
    fn playhead_crosses_the_transition_box_during_the_clip() {
        let mut model = model();
        let a = model.add_node(&SongId::new("12")).unwrap();
        let b = model.add_node(&SongId::new("17")).unwrap();
        model.connect(&a, &b).unwrap();
        // One box of 3 leaves 31 columns per segment
        model.measure_timeline(66);

        model.select_entry(0);
        let message = loaded(&model, 241);
        model.handle_output(message);
        let progress = |model: &AppModel, seconds| OutputMessage {
            generation: model.playback().generation,
            event: OutputEvent::Progress { position: Duration::from_secs(seconds) },
        };
        let message = progress(&model, 241);
        model.handle_output(message);
        let song_end = model.playhead_offset();
        assert_eq!(song_end, 31.0);

        let ended = OutputMessage { generation: model.playback().generation, event: OutputEvent::Ended };
        model.handle_output(ended);
        assert_eq!(model.status(), PlaybackStatus::PlayingTransition);
        let message = loaded(&model, 12);
        model.handle_output(message);
        assert_eq!(model.playhead_offset(), song_end);

        let message = progress(&model, 6);
        model.handle_output(message);
        assert_eq!(model.playhead_offset(), 32.5);
    }

    #[test]
    fn transition_picker_sets_and_clears_the_edge_transition() {
        let mut model = model();
        let nodes = three_song_set(&mut model);
        model.select_node(&nodes[0]);

        assert!(model.show_transition_picker());
        let options = model.transition_options();
        assert_eq!(options[0].label, "No transition");
        assert_eq!(options.len(), 3);
        // The edge starts on its preferred rule
        assert_eq!(model.ui_state().transition_selected, 1);

        model.move_selection_up();
        assert!(model.confirm_transition());
        assert!(!model.queue()[0].has_transition());
        assert!(!model.is_transition_picker_open());
    }

    #[test]
    fn transition_picker_needs_an_outgoing_edge() {
        let mut model = model();
        model.add_node(&SongId::new("12")).unwrap();

        assert!(!model.show_transition_picker());
        assert!(model.has_error());
    }

    #[test]
    fn connect_picker_offers_every_other_node() {
        let mut model = model();
        let a = model.add_node(&SongId::new("12")).unwrap();
        model.add_node(&SongId::new("17")).unwrap();
        model.add_node(&SongId::new("4")).unwrap();
        model.select_node(&a);

        assert!(model.show_connect_picker());
        let options = model.connect_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].label, "Starships");

        model.move_selection_down();
        let edge = model.confirm_connect().unwrap();
        assert_eq!(model.graph().edge(&edge).unwrap().source, a);
        assert_eq!(model.queue().len(), 2);
        assert_eq!(model.queue()[1].song.id.as_str(), "4");
    }

    #[test]
    fn editing_the_graph_keeps_the_playing_node() {
        let mut model = model();
        let nodes = three_song_set(&mut model);
        model.select_entry(1);

        model.remove_node(&nodes[0]);

        assert_eq!(model.playback().index, 0);
        assert_eq!(model.playback().current_node.as_ref(), Some(&nodes[1]));
        assert_eq!(model.status(), PlaybackStatus::PlayingSong);
    }

    #[test]
    fn selection_stays_within_bounds() {
        let mut model = model();
        for _ in 0..10 {
            model.move_selection_down();
        }
        assert_eq!(model.ui_state().catalog_selected, model.catalog().len() - 1);

        model.move_selection_up();
        model.cycle_section_forward();
        model.move_selection_down();
        assert_eq!(model.ui_state().node_selected, 0);
    }

    #[test]
    fn stepping_walks_the_queue_and_stops_at_the_ends() {
        let mut model = model();
        three_song_set(&mut model);

        model.step_entry(1);
        assert_eq!(model.playback().index, 0);
        model.step_entry(1);
        model.step_entry(1);
        model.step_entry(1);
        assert_eq!(model.playback().index, 2);
        model.step_entry(-5);
        assert_eq!(model.playback().index, 0);
        assert_eq!(model.status(), PlaybackStatus::PlayingSong);
    }

    #[test]
    fn playing_an_unqueued_node_plays_its_song() {
        let mut model = model();
        three_song_set(&mut model);
        let loose = model.add_node(&SongId::new("7")).unwrap();
        model.select_node(&loose);

        model.play_selected_node();

        assert_eq!(model.playback().current_song.as_ref().unwrap().id.as_str(), "7");
        assert!(model.playback().current_node.is_none());

        let queued = model.queue()[1].node_id.clone();
        model.select_node(&queued);
        model.play_selected_node();
        assert_eq!(model.playback().index, 1);
    }

    #[test]
    fn rejected_play_pauses_without_an_error_popup() {
        let mut model = model();
        model.add_node(&SongId::new("12")).unwrap();
        model.toggle_play_pause();

        model.play_rejected("autoplay blocked");

        assert_eq!(model.status(), PlaybackStatus::Paused);
        assert!(!model.has_error());
        assert!(!model.ui_state().has_popup());
        assert_eq!(model.toggle_play_pause(), vec![Effect::Play]);
    }
}
