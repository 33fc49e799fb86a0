//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and the audio output, and carries out the
//! effects the playback engine asks for.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key and mouse event handling
//! - `playback`: Playback control methods
//! - `canvas`: Placing, wiring and removing songs on the canvas
//! - `player_events`: Audio output event listener

mod input;
mod playback;
mod canvas;
mod player_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use djset_rs::audio::AudioOutput;
use djset_rs::model::{AppModel, Effect};

pub type SharedOutput = Arc<Mutex<Box<dyn AudioOutput + Send>>>;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) output: SharedOutput,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, output: SharedOutput) -> Self {
        Self { model, output }
    }

    /// Run a model command and carry out the effects it returns. The model
    /// stays locked until the output has seen every effect.
    pub(crate) async fn dispatch<F>(&self, command: F)
    where
        F: FnOnce(&mut AppModel) -> Vec<Effect>,
    {
        let mut model = self.model.lock().await;
        let effects = command(&mut model);
        if effects.is_empty() {
            return;
        }
        let mut output = self.output.lock().await;
        Self::apply_effects(&mut model, &mut **output, effects);
    }

    pub(crate) fn apply_effects(
        model: &mut AppModel,
        output: &mut (dyn AudioOutput + Send),
        effects: Vec<Effect>,
    ) {
        for effect in effects {
            match effect {
                Effect::Load { generation, source } => output.load(generation, &source),
                Effect::Play => {
                    if let Err(e) = output.play() {
                        model.play_rejected(&format!("{e:#}"));
                    }
                }
                Effect::Pause => output.pause(),
                Effect::Seek(position) => output.seek(position),
                Effect::Stop => output.stop(),
            }
        }
    }

    /// Display tick: let the output report progress and expire old errors.
    pub async fn tick(&self) {
        self.output.lock().await.poll();
        self.model.lock().await.auto_clear_old_errors();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use anyhow::{Result, bail};
    use djset_rs::audio::AudioSource;
    use djset_rs::model::{Catalog, NodeId, SongId};

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Call {
        Load(u64, AudioSource),
        Play,
        Pause,
        Seek(Duration),
        Stop,
    }

    /// Output that records every call and can refuse to play
    pub(crate) struct FakeOutput {
        calls: Arc<StdMutex<Vec<Call>>>,
        reject_play: bool,
    }

    impl FakeOutput {
        pub(crate) fn record(&self, call: Call) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    impl AudioOutput for FakeOutput {
        fn load(&mut self, generation: u64, source: &AudioSource) {
            self.record(Call::Load(generation, source.clone()));
        }

        fn play(&mut self) -> Result<()> {
            self.record(Call::Play);
            if self.reject_play {
                bail!("autoplay blocked");
            }
            Ok(())
        }

        fn pause(&mut self) {
            self.record(Call::Pause);
        }

        fn seek(&mut self, position: Duration) {
            self.record(Call::Seek(position));
        }

        fn stop(&mut self) {
            self.record(Call::Stop);
        }
    }

    pub(crate) struct Harness {
        pub(crate) controller: AppController,
        calls: Arc<StdMutex<Vec<Call>>>,
    }

    impl Harness {
        pub(crate) fn new(reject_play: bool) -> Self {
            let calls = Arc::new(StdMutex::new(Vec::new()));
            let output: Box<dyn AudioOutput + Send> = Box::new(FakeOutput {
                calls: calls.clone(),
                reject_play,
            });
            let model = AppModel::new(Catalog::bundled().unwrap(), "songs");
            Self {
                controller: AppController::new(Arc::new(Mutex::new(model)), Arc::new(Mutex::new(output))),
                calls,
            }
        }

        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        /// Place and chain the given catalog songs in order
        pub(crate) async fn chain(&self, songs: &[&str]) -> Vec<NodeId> {
            let mut model = self.controller.model.lock().await;
            let nodes: Vec<NodeId> = songs
                .iter()
                .map(|id| model.add_node(&SongId::new(*id)).unwrap())
                .collect();
            for pair in nodes.windows(2) {
                model.connect(&pair[0], &pair[1]).unwrap();
            }
            nodes
        }
    }

    #[tokio::test]
    async fn effects_reach_the_output_in_order() {
        let harness = Harness::new(false);
        harness.chain(&["12", "17"]).await;

        harness.controller.dispatch(|model| model.select_entry(1)).await;

        let calls = harness.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Load(1, source) if source.path.ends_with("Dynamite.mp3")));
        assert_eq!(calls[1], Call::Play);
    }

    #[tokio::test]
    async fn refused_play_is_fed_back_to_the_engine() {
        let harness = Harness::new(true);
        harness.chain(&["12"]).await;

        harness.controller.dispatch(|model| model.toggle_play_pause()).await;

        let model = harness.controller.model.lock().await;
        assert!(!model.playback().is_playing);
        assert!(!model.has_error());
    }

    #[tokio::test]
    async fn commands_without_effects_leave_the_output_alone() {
        let harness = Harness::new(false);

        harness.controller.dispatch(|model| model.toggle_play_pause()).await;

        assert!(harness.calls().is_empty());
    }
}
