//! Placing, wiring and removing songs on the canvas

use super::AppController;

impl AppController {
    /// Put the song under the catalog cursor on the canvas.
    pub async fn add_selected_song(&self) {
        let mut model = self.model.lock().await;
        let Some(song) = model.selected_catalog_song().cloned() else {
            return;
        };
        if let Some(node) = model.add_node(&song.id) {
            tracing::info!(node = %node, title = %song.title, "Song placed on canvas");
            model.select_node(&node);
            model.set_status(format!("Added {}", song.title));
        }
    }

    pub async fn remove_selected_node(&self) {
        let mut model = self.model.lock().await;
        if let Some(node) = model.selected_node() {
            if model.remove_node(&node) {
                tracing::info!(node = %node, "Node removed from canvas");
            }
        }
    }

    pub async fn disconnect_selected_node(&self) {
        let mut model = self.model.lock().await;
        let edge = model
            .selected_node()
            .and_then(|node| model.graph().outgoing(&node))
            .map(|edge| edge.id.clone());
        match edge {
            Some(edge) => {
                model.disconnect(&edge);
                tracing::info!(edge = %edge, "Connection removed");
            }
            None => model.set_error("This song is not connected to anything".to_string()),
        }
    }

    pub async fn move_selected_node(&self, dx: i32, dy: i32) {
        let mut model = self.model.lock().await;
        if let Some(node) = model.selected_node() {
            model.move_node(&node, dx, dy);
        }
    }

    pub async fn open_connect_picker(&self) {
        let mut model = self.model.lock().await;
        if model.selected_node().is_some() {
            model.show_connect_picker();
        }
    }

    pub async fn confirm_connect(&self) {
        let mut model = self.model.lock().await;
        if let Some(edge) = model.confirm_connect() {
            let transition = model
                .graph()
                .edge(&edge)
                .and_then(|edge| edge.transition.as_ref())
                .map(|rule| rule.label.clone());
            tracing::info!(edge = %edge, transition = transition.as_deref(), "Songs connected");
        }
    }

    pub async fn open_transition_picker(&self) {
        let mut model = self.model.lock().await;
        if model.selected_node().is_some() {
            model.show_transition_picker();
        }
    }

    pub async fn confirm_transition(&self) {
        let mut model = self.model.lock().await;
        if model.confirm_transition() {
            tracing::info!("Transition updated");
        }
    }
}
