//! Audio output seam
//!
//! The playback engine never touches an audio device directly. It emits
//! effects (load, play, pause, seek, stop) that the controller forwards to an
//! [`AudioOutput`], and the output reports back through an event channel.
//! Every event is tagged with the generation of the source that produced it
//! so the engine can drop events from a source it already replaced.
//!
//! Two outputs exist: [`RodioOutput`] plays the files on the default audio
//! device, [`ClockOutput`] only advances a clock and backs `--silent` runs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

mod clock;
#[cfg(feature = "speaker")]
mod rodio_output;

pub use clock::ClockOutput;
#[cfg(feature = "speaker")]
pub use rodio_output::RodioOutput;

/// Length assumed for transition clips the catalog gives no length for
pub const DEFAULT_CLIP_LENGTH: Duration = Duration::from_secs(8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Song,
    Transition,
}

/// Something the output can load and play
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSource {
    pub path: PathBuf,
    pub length: Option<Duration>,
    pub kind: SourceKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OutputEvent {
    Loaded { duration: Duration },
    Progress { position: Duration },
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputMessage {
    pub generation: u64,
    pub event: OutputEvent,
}

pub type OutputEventSender = mpsc::UnboundedSender<OutputMessage>;
pub type OutputEventReceiver = mpsc::UnboundedReceiver<OutputMessage>;

pub fn output_channel() -> (OutputEventSender, OutputEventReceiver) {
    mpsc::unbounded_channel()
}

pub trait AudioOutput {
    /// Replace the current source. Nothing from the previous source may be
    /// reported after this returns.
    fn load(&mut self, generation: u64, source: &AudioSource);

    /// Start or resume playback. May be refused, e.g. when nothing is loaded.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn stop(&mut self);

    /// Called on every display tick so outputs without their own event
    /// source can report progress.
    fn poll(&mut self) {}
}
