//! Speaker output through rodio
//!
//! rodio's output stream has to stay on the thread that opened it, so a
//! dedicated audio thread owns the stream and the sink. [`RodioOutput`] is a
//! handle that forwards commands to that thread, and the thread reports
//! position and end of file on the output channel.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::{AudioOutput, AudioSource, OutputEvent, OutputEventSender, OutputMessage};

/// How often the audio thread reports the playing position
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
/// Longest a play request waits for the audio thread to answer
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

enum Command {
    Load {
        generation: u64,
        path: PathBuf,
        length: Option<Duration>,
    },
    Play(mpsc::Sender<Result<()>>),
    Pause,
    Seek(Duration),
    Stop,
}

/// Plays sources on the default audio device.
///
/// Opening the device or decoding a file can fail; either way the failure
/// comes back from the next [`AudioOutput::play`].
pub struct RodioOutput {
    commands: mpsc::Sender<Command>,
}

impl RodioOutput {
    pub fn new(events: OutputEventSender) -> Result<Self> {
        let (commands, receiver) = mpsc::channel();
        thread::Builder::new()
            .name("djset-audio".to_string())
            .spawn(move || AudioThread::open(events).run(receiver))
            .context("Failed to start the audio thread")?;
        Ok(Self { commands })
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Audio thread is gone, dropping command");
        }
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, generation: u64, source: &AudioSource) {
        self.send(Command::Load {
            generation,
            path: source.path.clone(),
            length: source.length,
        });
    }

    fn play(&mut self) -> Result<()> {
        let (reply, response) = mpsc::channel();
        self.commands
            .send(Command::Play(reply))
            .map_err(|_| anyhow!("audio thread is gone"))?;
        response
            .recv_timeout(REPLY_TIMEOUT)
            .context("audio thread did not answer")?
    }

    fn pause(&mut self) {
        self.send(Command::Pause);
    }

    fn seek(&mut self, position: Duration) {
        self.send(Command::Seek(position));
    }

    fn stop(&mut self) {
        self.send(Command::Stop);
    }
}

struct Loaded {
    generation: u64,
    sink: Sink,
    length: Option<Duration>,
    ended: bool,
}

struct AudioThread {
    events: OutputEventSender,
    stream: std::result::Result<OutputStream, String>,
    current: Option<Loaded>,
    /// Why the last load failed; the next play reports it
    load_error: Option<String>,
}

impl AudioThread {
    fn open(events: OutputEventSender) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio prints to stderr on drop, which would land on the TUI
                stream.log_on_drop(false);
                tracing::info!("Audio output device opened");
                Ok(stream)
            }
            Err(e) => {
                tracing::warn!(error = %e, "No audio output device");
                Err(e.to_string())
            }
        };

        Self {
            events,
            stream,
            current: None,
            load_error: None,
        }
    }

    /// Serve commands until every handle is dropped.
    fn run(mut self, commands: mpsc::Receiver<Command>) {
        loop {
            match commands.recv_timeout(PROGRESS_INTERVAL) {
                Ok(command) => self.apply(command),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            self.report_progress();
        }

        if let Some(loaded) = self.current.take() {
            loaded.sink.stop();
        }
        tracing::debug!("Audio thread stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Load {
                generation,
                path,
                length,
            } => self.load(generation, &path, length),
            Command::Play(reply) => {
                // The caller may have timed out already
                let _ = reply.send(self.play());
            }
            Command::Pause => {
                if let Some(loaded) = &self.current {
                    loaded.sink.pause();
                }
            }
            Command::Seek(position) => self.seek(position),
            Command::Stop => {
                if let Some(loaded) = self.current.take() {
                    loaded.sink.stop();
                }
                self.load_error = None;
            }
        }
    }

    fn load(&mut self, generation: u64, path: &Path, fallback_length: Option<Duration>) {
        if let Some(previous) = self.current.take() {
            previous.sink.stop();
        }
        self.load_error = None;

        match self.decode(path) {
            Ok((sink, decoded_length)) => {
                let length = decoded_length.or(fallback_length);
                tracing::debug!(generation, path = %path.display(), ?length, "Loaded audio file");
                if let Some(duration) = length {
                    self.send(generation, OutputEvent::Loaded { duration });
                }
                self.current = Some(Loaded {
                    generation,
                    sink,
                    length,
                    ended: false,
                });
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(path = %path.display(), error = %reason, "Could not load audio file");
                self.load_error = Some(reason);
            }
        }
    }

    /// A paused sink holding the decoded file, and the file's length when
    /// the decoder knows it.
    fn decode(&self, path: &Path) -> Result<(Sink, Option<Duration>)> {
        let stream = self
            .stream
            .as_ref()
            .map_err(|e| anyhow!("no audio output device: {e}"))?;
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let length = decoder.total_duration();

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.append(decoder);
        Ok((sink, length))
    }

    fn play(&mut self) -> Result<()> {
        if let Some(reason) = &self.load_error {
            bail!("{reason}");
        }
        let Some(loaded) = &self.current else {
            bail!("no source loaded");
        };
        loaded.sink.play();
        Ok(())
    }

    fn seek(&mut self, position: Duration) {
        let Some(loaded) = self.current.as_mut() else {
            return;
        };
        match loaded.sink.try_seek(position) {
            Ok(()) => loaded.ended = false,
            Err(e) => tracing::warn!(error = %e, ?position, "Seek failed"),
        }
    }

    fn report_progress(&mut self) {
        let Some(loaded) = self.current.as_mut() else {
            return;
        };
        if loaded.ended || loaded.sink.is_paused() {
            return;
        }

        let generation = loaded.generation;
        let finished = loaded.sink.empty();
        let position = match (finished, loaded.length) {
            (true, Some(length)) => length,
            _ => loaded.sink.get_pos(),
        };
        if finished {
            loaded.ended = true;
        }

        self.send(generation, OutputEvent::Progress { position });
        if finished {
            self.send(generation, OutputEvent::Ended);
        }
    }

    fn send(&self, generation: u64, event: OutputEvent) {
        // The receiver only goes away during shutdown
        let _ = self.events.send(OutputMessage { generation, event });
    }
}
