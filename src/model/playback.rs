//! Playback engine: sequences songs and transition clips through one output
//!
//! The engine is a reducer. Commands and output events update
//! [`PlaybackState`] and return the [`Effect`]s the caller must carry out on
//! the audio output, so the whole state machine runs without an audio device.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::queue::{QueueEntry, position_of_node, position_of_song};
use super::song::{EdgeId, NodeId, SongMetadata};
use crate::audio::{AudioSource, OutputEvent, OutputMessage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    PlayingSong,
    PlayingTransition,
    Paused,
}

/// Work for the audio output
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Replace the current source; events from it carry `generation`
    Load { generation: u64, source: AudioSource },
    Play,
    Pause,
    Seek(Duration),
    Stop,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackState {
    pub index: usize,
    pub elapsed: Duration,
    /// Length of the active segment, known once the output reports it
    pub segment_duration: Option<Duration>,
    pub is_playing: bool,
    pub in_transition: bool,
    /// Edge whose transition clip is playing right now
    pub transitioning_edge: Option<EdgeId>,
    pub current_song: Option<Arc<SongMetadata>>,
    /// Queue node being played; `None` for songs selected outside the queue
    pub current_node: Option<NodeId>,
    /// Identity of the loaded source
    pub generation: u64,
}

impl PlaybackState {
    pub fn status(&self) -> PlaybackStatus {
        match (&self.current_song, self.is_playing, self.in_transition) {
            (None, _, _) => PlaybackStatus::Idle,
            (Some(_), false, _) => PlaybackStatus::Paused,
            (Some(_), true, true) => PlaybackStatus::PlayingTransition,
            (Some(_), true, false) => PlaybackStatus::PlayingSong,
        }
    }

    fn is_current_entry(&self, entry: &QueueEntry) -> bool {
        self.current_node.as_ref() == Some(&entry.node_id)
    }
}

pub struct PlaybackEngine {
    state: PlaybackState,
    songs_dir: PathBuf,
}

impl PlaybackEngine {
    pub fn new(songs_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: PlaybackState::default(),
            songs_dir: songs_dir.into(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    /// Play `song`, placing the playhead on its first queue entry (or entry 0
    /// when the song is not queued).
    pub fn select(&mut self, song: &Arc<SongMetadata>, queue: &[QueueEntry]) -> Vec<Effect> {
        match position_of_song(queue, &song.id) {
            Some(index) => self.play_entry_at(index, queue),
            None => {
                tracing::debug!(song = %song.id, "Selected song is not in the queue");
                self.begin_song(song.clone(), None, 0)
            }
        }
    }

    /// A caller switched songs without going through the queue.
    pub fn song_changed_externally(
        &mut self,
        song: &Arc<SongMetadata>,
        queue: &[QueueEntry],
    ) -> Vec<Effect> {
        tracing::debug!(song = %song.id, "Song changed outside the queue");
        self.select(song, queue)
    }

    /// Play a specific queue entry from its start.
    pub fn select_entry(&mut self, index: usize, queue: &[QueueEntry]) -> Vec<Effect> {
        if index >= queue.len() {
            tracing::debug!(index, len = queue.len(), "Ignoring selection outside the queue");
            return Vec::new();
        }
        self.play_entry_at(index, queue)
    }

    pub fn toggle_play_pause(&mut self, queue: &[QueueEntry]) -> Vec<Effect> {
        if self.state.current_song.is_none() {
            if queue.is_empty() {
                return Vec::new();
            }
            return self.play_entry_at(0, queue);
        }

        self.state.is_playing = !self.state.is_playing;
        tracing::info!(action = if self.state.is_playing { "resumed" } else { "paused" }, "Playback toggled");
        if self.state.is_playing {
            vec![Effect::Play]
        } else {
            vec![Effect::Pause]
        }
    }

    /// Jump to `fraction` of queue entry `index`.
    ///
    /// Seeking inside the song already loaded moves the position in place;
    /// any other target (including any seek during a transition clip) starts
    /// that entry from the top.
    pub fn seek(&mut self, index: usize, fraction: f64, queue: &[QueueEntry]) -> Vec<Effect> {
        let Some(entry) = queue.get(index) else {
            tracing::debug!(index, len = queue.len(), "Ignoring seek outside the queue");
            return Vec::new();
        };

        let in_place = !self.state.in_transition
            && self.state.index == index
            && self.state.is_current_entry(entry);
        if !in_place {
            return self.play_entry_at(index, queue);
        }

        let Some(duration) = self.state.segment_duration.filter(|d| !d.is_zero()) else {
            tracing::debug!(index, "Segment duration unknown, ignoring seek");
            return Vec::new();
        };
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        let position = duration.mul_f64(fraction);

        tracing::debug!(index, ?position, "Seeking within segment");
        self.state.elapsed = position;
        vec![Effect::Seek(position)]
    }

    /// Apply an event reported by the audio output.
    pub fn handle(&mut self, message: OutputMessage, queue: &[QueueEntry]) -> Vec<Effect> {
        if message.generation != self.state.generation || self.state.current_song.is_none() {
            tracing::trace!(generation = message.generation, "Dropping event from a replaced source");
            return Vec::new();
        }

        match message.event {
            OutputEvent::Loaded { duration } => {
                self.state.segment_duration = Some(duration);
                Vec::new()
            }
            OutputEvent::Progress { position } => {
                self.state.elapsed = position;
                Vec::new()
            }
            OutputEvent::Ended => self.on_ended(queue),
        }
    }

    /// The output refused to start playing. Without a fresh user gesture a
    /// retry would fail the same way, so the engine just stops claiming to
    /// play.
    pub fn play_rejected(&mut self, reason: &str) {
        tracing::warn!(reason, "Playback start rejected");
        self.state.is_playing = false;
    }

    /// Re-resolve the playhead after the queue was rebuilt.
    pub fn queue_changed(&mut self, queue: &[QueueEntry]) {
        if self.state.current_song.is_none() {
            self.state.index = 0;
            return;
        }

        let resolved = self
            .state
            .current_node
            .as_ref()
            .and_then(|node| position_of_node(queue, node));
        match resolved {
            Some(index) => {
                self.state.index = index;
                let edge_still_leads_on = queue[index].edge_to_next == self.state.transitioning_edge;
                if self.state.in_transition && !edge_still_leads_on {
                    tracing::debug!("Transitioning edge was removed, clip plays out");
                    self.state.transitioning_edge = None;
                }
            }
            None => {
                if self.state.current_node.is_some() {
                    tracing::debug!("Playing node left the queue");
                }
                self.state.index = 0;
                self.state.current_node = None;
                self.state.transitioning_edge = None;
            }
        }
    }

    fn on_ended(&mut self, queue: &[QueueEntry]) -> Vec<Effect> {
        if self.state.in_transition {
            self.state.in_transition = false;
            self.state.transitioning_edge = None;
            // The entry the clip left was deleted; nothing is known to follow it
            if self.state.current_node.is_none() {
                tracing::info!("Transition source left the queue, stopping");
                return self.stop();
            }
            return self.advance(queue);
        }

        // Songs played from outside the queue have nothing to continue into
        let Some(entry) = queue
            .get(self.state.index)
            .filter(|entry| self.state.is_current_entry(entry))
        else {
            return self.stop();
        };

        match (&entry.transition, &entry.edge_to_next) {
            (Some(rule), Some(edge)) => {
                tracing::info!(edge = %edge, transition = %rule.name, "Playing transition");
                self.state.in_transition = true;
                self.state.transitioning_edge = Some(edge.clone());
                let source = rule.audio_source(&self.songs_dir);
                self.begin(source)
            }
            _ => self.advance(queue),
        }
    }

    fn advance(&mut self, queue: &[QueueEntry]) -> Vec<Effect> {
        let next = self.state.index + 1;
        if next < queue.len() {
            self.play_entry_at(next, queue)
        } else {
            tracing::info!("Reached the end of the queue");
            self.stop()
        }
    }

    fn play_entry_at(&mut self, index: usize, queue: &[QueueEntry]) -> Vec<Effect> {
        let entry = &queue[index];
        self.begin_song(entry.song.clone(), Some(entry.node_id.clone()), index)
    }

    fn begin_song(&mut self, song: Arc<SongMetadata>, node: Option<NodeId>, index: usize) -> Vec<Effect> {
        tracing::info!(song = %song.id, title = %song.title, index, "Playing song");
        let source = song.audio_source(&self.songs_dir);
        self.state.current_song = Some(song);
        self.state.current_node = node;
        self.state.index = index;
        self.state.in_transition = false;
        self.state.transitioning_edge = None;
        self.begin(source)
    }

    /// Swap in a new source and start it from zero.
    fn begin(&mut self, source: AudioSource) -> Vec<Effect> {
        self.state.generation += 1;
        self.state.elapsed = Duration::ZERO;
        self.state.segment_duration = None;
        self.state.is_playing = true;
        vec![
            Effect::Load {
                generation: self.state.generation,
                source,
            },
            Effect::Play,
        ]
    }

    fn stop(&mut self) -> Vec<Effect> {
        self.state = PlaybackState {
            generation: self.state.generation,
            ..PlaybackState::default()
        };
        vec![Effect::Stop]
    }
}
