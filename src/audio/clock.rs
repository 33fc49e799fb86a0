//! Silent output driven by a clock

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::time::Instant;

use super::{AudioOutput, AudioSource, OutputEvent, OutputEventSender, OutputMessage};

struct ClockSource {
    generation: u64,
    length: Duration,
    base: Duration,
    started: Option<Instant>,
    ended: bool,
}

impl ClockSource {
    fn position(&self) -> Duration {
        let running = self.started.map(|t| t.elapsed()).unwrap_or_default();
        (self.base + running).min(self.length)
    }
}

/// Output that plays nothing audible and advances a clock instead.
///
/// Source lengths come from catalog metadata, which is all the engine needs
/// to sequence songs and transition clips.
pub struct ClockOutput {
    events: OutputEventSender,
    default_clip_length: Duration,
    current: Option<ClockSource>,
}

impl ClockOutput {
    pub fn new(events: OutputEventSender, default_clip_length: Duration) -> Self {
        Self {
            events,
            default_clip_length,
            current: None,
        }
    }

    fn send(&self, generation: u64, event: OutputEvent) {
        // The receiver only goes away during shutdown
        let _ = self.events.send(OutputMessage { generation, event });
    }
}

impl AudioOutput for ClockOutput {
    fn load(&mut self, generation: u64, source: &AudioSource) {
        let length = source.length.unwrap_or(self.default_clip_length);
        tracing::debug!(generation, path = %source.path.display(), ?length, "Loading source");

        self.current = Some(ClockSource {
            generation,
            length,
            base: Duration::ZERO,
            started: None,
            ended: false,
        });
        self.send(generation, OutputEvent::Loaded { duration: length });
    }

    fn play(&mut self) -> Result<()> {
        let Some(source) = self.current.as_mut() else {
            bail!("no source loaded");
        };
        if source.ended {
            source.base = Duration::ZERO;
            source.ended = false;
        }
        if source.started.is_none() {
            source.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(source) = self.current.as_mut() {
            source.base = source.position();
            source.started = None;
        }
    }

    fn seek(&mut self, position: Duration) {
        if let Some(source) = self.current.as_mut() {
            source.base = position.min(source.length);
            source.ended = false;
            if source.started.is_some() {
                source.started = Some(Instant::now());
            }
        }
    }

    fn stop(&mut self) {
        self.current = None;
    }

    fn poll(&mut self) {
        let Some(source) = self.current.as_mut() else {
            return;
        };
        if source.ended || source.started.is_none() {
            return;
        }

        let position = source.position();
        let generation = source.generation;
        let finished = position >= source.length;
        if finished {
            source.ended = true;
            source.base = source.length;
            source.started = None;
        }

        self.send(generation, OutputEvent::Progress { position });
        if finished {
            self.send(generation, OutputEvent::Ended);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::audio::{DEFAULT_CLIP_LENGTH, OutputEventReceiver, SourceKind, output_channel};

    fn source(length: Option<Duration>) -> AudioSource {
        AudioSource {
            path: PathBuf::from("songs/test.mp3"),
            length,
            kind: SourceKind::Song,
        }
    }

    fn drain(rx: &mut OutputEventReceiver) -> Vec<OutputMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    #[tokio::test(start_paused = true)]
    async fn reports_loaded_progress_and_end() {
        let (tx, mut rx) = output_channel();
        let mut output = ClockOutput::new(tx, DEFAULT_CLIP_LENGTH);

        output.load(3, &source(Some(Duration::from_secs(10))));
        output.play().unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        output.poll();

        let messages = drain(&mut rx);
        assert_eq!(
            messages,
            vec![
                OutputMessage { generation: 3, event: OutputEvent::Loaded { duration: Duration::from_secs(10) } },
                OutputMessage { generation: 3, event: OutputEvent::Progress { position: Duration::from_secs(4) } },
            ]
        );

        tokio::time::advance(Duration::from_secs(7)).await;
        output.poll();
        output.poll();

        let events: Vec<_> = drain(&mut rx).into_iter().map(|m| m.event).collect();
        assert_eq!(
            events,
            vec![OutputEvent::Progress { position: Duration::from_secs(10) }, OutputEvent::Ended]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_the_clock() {
        let (tx, mut rx) = output_channel();
        let mut output = ClockOutput::new(tx, DEFAULT_CLIP_LENGTH);

        output.load(1, &source(Some(Duration::from_secs(60))));
        output.play().unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        output.pause();
        tokio::time::advance(Duration::from_secs(30)).await;
        output.play().unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        output.poll();

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.event, OutputEvent::Progress { position: Duration::from_secs(6) });
    }

    #[tokio::test(start_paused = true)]
    async fn seek_moves_the_clock() {
        let (tx, mut rx) = output_channel();
        let mut output = ClockOutput::new(tx, DEFAULT_CLIP_LENGTH);

        output.load(1, &source(Some(Duration::from_secs(60))));
        output.play().unwrap();
        output.seek(Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(2)).await;
        output.poll();

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.event, OutputEvent::Progress { position: Duration::from_secs(32) });
    }

    #[test]
    fn refuses_to_play_without_a_source() {
        let (tx, _rx) = output_channel();
        let mut output = ClockOutput::new(tx, DEFAULT_CLIP_LENGTH);
        assert!(output.play().is_err());
    }

    #[test]
    fn clips_without_length_use_the_default() {
        let (tx, mut rx) = output_channel();
        let mut output = ClockOutput::new(tx, Duration::from_secs(5));

        output.load(9, &source(None));

        let messages = drain(&mut rx);
        assert_eq!(messages[0].event, OutputEvent::Loaded { duration: Duration::from_secs(5) });
    }
}
