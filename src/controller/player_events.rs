//! Audio output event listener

use tokio::task::JoinHandle;

use djset_rs::audio::{OutputEvent, OutputEventReceiver, OutputMessage};

use super::AppController;

impl AppController {
    pub fn start_output_event_listener(&self, mut events: OutputEventReceiver) -> JoinHandle<()> {
        let controller = self.clone();
        tracing::info!("Starting audio output event listener");

        tokio::spawn(async move {
            while let Some(message) = events.recv().await {
                if controller.model.lock().await.should_quit() {
                    tracing::debug!("Output event listener shutting down");
                    break;
                }
                controller.handle_output_message(message).await;
            }
        })
    }

    pub async fn handle_output_message(&self, message: OutputMessage) {
        match &message.event {
            OutputEvent::Loaded { duration } => {
                tracing::debug!(generation = message.generation, ?duration, "OutputEvent::Loaded");
            }
            OutputEvent::Progress { position } => {
                tracing::trace!(generation = message.generation, ?position, "OutputEvent::Progress");
            }
            OutputEvent::Ended => {
                tracing::debug!(generation = message.generation, "OutputEvent::Ended");
            }
        }
        self.dispatch(|model| model.handle_output(message)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use djset_rs::audio::{OutputEvent, OutputMessage, SourceKind, output_channel};
    use djset_rs::model::PlaybackStatus;

    use crate::controller::tests::{Call, Harness};

    async fn generation(harness: &Harness) -> u64 {
        harness.controller.model.lock().await.playback().generation
    }

    async fn send(harness: &Harness, event: OutputEvent) {
        let message = OutputMessage {
            generation: generation(harness).await,
            event,
        };
        harness.controller.handle_output_message(message).await;
    }

    #[tokio::test]
    async fn song_end_plays_the_transition_then_the_next_song() {
        let harness = Harness::new(false);
        harness.chain(&["12", "17"]).await;
        harness.controller.toggle_playback().await;
        harness.clear_calls();

        send(&harness, OutputEvent::Ended).await;
        {
            let model = harness.controller.model.lock().await;
            assert_eq!(model.status(), PlaybackStatus::PlayingTransition);
            assert!(model.transitioning_edge().is_some());
        }
        send(&harness, OutputEvent::Ended).await;

        let calls = harness.calls();
        assert_eq!(calls.len(), 4);
        match (&calls[0], &calls[2]) {
            (Call::Load(_, clip), Call::Load(_, song)) => {
                assert_eq!(clip.kind, SourceKind::Transition);
                assert_eq!(clip.path, PathBuf::from("songs/just dance to dynamite.mp3"));
                assert_eq!(song.path, PathBuf::from("songs/Dynamite.mp3"));
            }
            other => panic!("unexpected calls {other:?}"),
        }
        assert_eq!(harness.controller.model.lock().await.playback().index, 1);
    }

    #[tokio::test]
    async fn progress_updates_elapsed_time() {
        let harness = Harness::new(false);
        harness.chain(&["4"]).await;
        harness.controller.toggle_playback().await;

        send(&harness, OutputEvent::Loaded { duration: Duration::from_secs(210) }).await;
        send(&harness, OutputEvent::Progress { position: Duration::from_secs(42) }).await;

        let model = harness.controller.model.lock().await;
        assert_eq!(model.playback().elapsed, Duration::from_secs(42));
        assert_eq!(model.playback().segment_duration, Some(Duration::from_secs(210)));
    }

    #[tokio::test]
    async fn listener_drains_the_channel_into_the_engine() {
        let harness = Harness::new(false);
        harness.chain(&["4"]).await;
        harness.controller.toggle_playback().await;

        let (tx, rx) = output_channel();
        let listener = harness.controller.start_output_event_listener(rx);
        tx.send(OutputMessage {
            generation: generation(&harness).await,
            event: OutputEvent::Ended,
        })
        .unwrap();
        drop(tx);
        listener.await.unwrap();

        let model = harness.controller.model.lock().await;
        assert_eq!(model.status(), PlaybackStatus::Idle);
        assert_eq!(harness.calls().last(), Some(&Call::Stop));
    }
}
