//! Playback control methods

use super::AppController;

impl AppController {
    pub async fn toggle_playback(&self) {
        tracing::debug!("Toggling playback");
        self.dispatch(|model| model.toggle_play_pause()).await;
    }

    pub async fn next_entry(&self) {
        tracing::debug!("Skipping to next queue entry");
        self.dispatch(|model| model.step_entry(1)).await;
    }

    pub async fn previous_entry(&self) {
        tracing::debug!("Skipping to previous queue entry");
        self.dispatch(|model| model.step_entry(-1)).await;
    }

    /// Play the song under the catalog cursor, queued or not.
    pub async fn play_catalog_song(&self) {
        self.dispatch(|model| match model.selected_catalog_song().cloned() {
            Some(song) => model.select_song(&song),
            None => Vec::new(),
        })
        .await;
    }

    pub async fn play_selected_node(&self) {
        self.dispatch(|model| model.play_selected_node()).await;
    }

    /// Seek to the timeline position under a terminal cell.
    pub async fn seek_at(&self, column: u16, row: u16) {
        self.dispatch(|model| {
            let offset = model
                .ui_state()
                .timeline_area
                .and_then(|area| area.offset_at(column, row));
            match offset {
                Some(offset) => {
                    tracing::debug!(column, offset, "Timeline clicked");
                    model.seek_to_offset(offset)
                }
                None => Vec::new(),
            }
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use djset_rs::audio::{OutputEvent, OutputMessage};
    use djset_rs::model::{PlaybackStatus, TimelineArea};

    use crate::controller::tests::{Call, Harness};

    #[tokio::test]
    async fn toggle_starts_pauses_and_resumes() {
        let harness = Harness::new(false);
        harness.chain(&["12", "17"]).await;

        harness.controller.toggle_playback().await;
        harness.controller.toggle_playback().await;
        harness.controller.toggle_playback().await;

        let calls = harness.calls();
        assert!(matches!(calls[0], Call::Load(..)));
        assert_eq!(&calls[1..], [Call::Play, Call::Pause, Call::Play]);
    }

    #[tokio::test]
    async fn stepping_past_the_end_replays_the_last_entry() {
        let harness = Harness::new(false);
        harness.chain(&["12", "17"]).await;

        harness.controller.next_entry().await;
        harness.controller.next_entry().await;
        harness.controller.next_entry().await;
        harness.controller.previous_entry().await;

        let model = harness.controller.model.lock().await;
        assert_eq!(model.playback().index, 0);
        assert_eq!(model.status(), PlaybackStatus::PlayingSong);
    }

    #[tokio::test]
    async fn clicking_the_timeline_seeks_in_place() {
        let harness = Harness::new(false);
        harness.chain(&["12", "17"]).await;
        harness.controller.next_entry().await;
        {
            let mut model = harness.controller.model.lock().await;
            let message = OutputMessage {
                generation: model.playback().generation,
                event: OutputEvent::Loaded { duration: Duration::from_secs(200) },
            };
            model.handle_output(message);
            // 41 columns: one transition box of 3, two segments of 19
            model.measure_timeline(41);
            model.set_timeline_area(Some(TimelineArea { x: 2, y: 10, width: 41, height: 2 }));
        }
        harness.clear_calls();

        // Column 11 is the middle of cell 9, i.e. offset 9.5 of 19
        harness.controller.seek_at(11, 10).await;

        assert_eq!(harness.calls(), [Call::Seek(Duration::from_secs(100))]);
    }

    #[tokio::test]
    async fn clicks_off_the_timeline_are_ignored() {
        let harness = Harness::new(false);
        harness.chain(&["12"]).await;
        harness.controller.toggle_playback().await;
        harness.clear_calls();

        harness.controller.seek_at(0, 0).await;

        assert!(harness.calls().is_empty());
    }
}
