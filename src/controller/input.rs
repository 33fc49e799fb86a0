//! Key and mouse event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use djset_rs::model::ActiveSection;
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let mut model = self.model.lock().await;

        // Handle error message first (blocks all other interactions)
        if model.has_error() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error();
            }
            return Ok(());
        }

        // Handle help popup
        if model.is_help_popup_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?')) {
                model.hide_help_popup();
            }
            return Ok(());
        }

        // Handle connect picker modal
        if model.is_connect_picker_open() {
            match key.code {
                KeyCode::Up => model.move_selection_up(),
                KeyCode::Down => model.move_selection_down(),
                KeyCode::Enter => {
                    drop(model);
                    self.confirm_connect().await;
                }
                KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C') => model.hide_connect_picker(),
                _ => {}
            }
            return Ok(());
        }

        // Handle transition picker modal
        if model.is_transition_picker_open() {
            match key.code {
                KeyCode::Up => model.move_selection_up(),
                KeyCode::Down => model.move_selection_down(),
                KeyCode::Enter => {
                    drop(model);
                    self.confirm_transition().await;
                }
                KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('T') => model.hide_transition_picker(),
                _ => {}
            }
            return Ok(());
        }

        let section = model.ui_state().active_section;

        // Canvas editing keys
        if section == ActiveSection::Canvas {
            let shift = key.modifiers.contains(KeyModifiers::SHIFT);
            let step = match key.code {
                KeyCode::Left if shift => Some((-1, 0)),
                KeyCode::Right if shift => Some((1, 0)),
                KeyCode::Up if shift => Some((0, -1)),
                KeyCode::Down if shift => Some((0, 1)),
                _ => None,
            };
            if let Some((dx, dy)) = step {
                drop(model);
                self.move_selected_node(dx, dy).await;
                return Ok(());
            }

            match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => {
                    drop(model);
                    self.open_connect_picker().await;
                    return Ok(());
                }
                KeyCode::Char('t') | KeyCode::Char('T') => {
                    drop(model);
                    self.open_transition_picker().await;
                    return Ok(());
                }
                KeyCode::Char('x') | KeyCode::Char('X') => {
                    drop(model);
                    self.disconnect_selected_node().await;
                    return Ok(());
                }
                KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                    drop(model);
                    self.remove_selected_node().await;
                    return Ok(());
                }
                KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('P') => {
                    drop(model);
                    self.play_selected_node().await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Catalog keys
        if section == ActiveSection::Catalog {
            match key.code {
                KeyCode::Enter => {
                    drop(model);
                    self.add_selected_song().await;
                    return Ok(());
                }
                KeyCode::Char('p') | KeyCode::Char('P') => {
                    drop(model);
                    self.play_catalog_song().await;
                    return Ok(());
                }
                _ => {}
            }
        }

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true);
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    model.cycle_section_backward();
                } else {
                    model.cycle_section_forward();
                }
            }
            KeyCode::BackTab => {
                model.cycle_section_backward();
            }
            KeyCode::Up => {
                model.move_selection_up();
            }
            KeyCode::Down => {
                model.move_selection_down();
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            KeyCode::Char(']') => {
                drop(model);
                self.next_entry().await;
            }
            KeyCode::Char('[') => {
                drop(model);
                self.previous_entry().await;
            }
            // Show help popup
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                model.show_help_popup();
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn handle_mouse_event(&self, mouse: MouseEvent) {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if self.model.lock().await.ui_state().has_popup() {
                return;
            }
            self.seek_at(mouse.column, mouse.row).await;
        }
    }
}
