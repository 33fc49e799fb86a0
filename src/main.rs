mod controller;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use djset_rs::audio::{AudioOutput, ClockOutput, OutputEventSender, output_channel};
use djset_rs::config::Config;
use djset_rs::logging;
use djset_rs::model::AppModel;

use controller::AppController;
use view::AppView;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    if let Err(e) = logging::init_logging(&config.log_filter) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== djset-rs starting ===");

    let catalog = config.load_catalog()?;
    tracing::info!(
        songs = catalog.len(),
        songs_dir = %config.songs_dir.display(),
        tick = ?config.tick(),
        "Catalog ready"
    );

    let (events_tx, events_rx) = output_channel();
    let output = open_output(&config, events_tx)?;

    let model = Arc::new(Mutex::new(AppModel::new(catalog, config.songs_dir.clone())));
    let controller = AppController::new(model.clone(), Arc::new(Mutex::new(output)));
    let listener = controller.start_output_event_listener(events_rx);

    tracing::info!("Starting TUI...");

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller, config.tick()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    listener.abort();

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("djset-rs shutting down");
    Ok(())
}

fn open_output(config: &Config, events: OutputEventSender) -> Result<Box<dyn AudioOutput + Send>> {
    if config.silent {
        tracing::info!("Silent mode, playback follows a clock");
        return Ok(Box::new(ClockOutput::new(events, config.clip_length())));
    }
    speaker_output(config, events)
}

#[cfg(feature = "speaker")]
fn speaker_output(_config: &Config, events: OutputEventSender) -> Result<Box<dyn AudioOutput + Send>> {
    let output = djset_rs::audio::RodioOutput::new(events)?;
    Ok(Box::new(output))
}

#[cfg(not(feature = "speaker"))]
fn speaker_output(config: &Config, events: OutputEventSender) -> Result<Box<dyn AudioOutput + Send>> {
    tracing::warn!("Built without speaker support, playback follows a clock");
    Ok(Box::new(ClockOutput::new(events, config.clip_length())))
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
    tick: Duration,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.tick().await;

                let mut model = model.lock().await;
                let mut timeline_area = None;
                terminal.draw(|f| {
                    timeline_area = AppView::render(f, &mut model);
                })?;
                model.set_timeline_area(timeline_area);
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    // Errors are surfaced through the model, no need to log
                    let _ = controller.handle_key_event(key).await;
                }
                Some(Ok(Event::Mouse(mouse))) => controller.handle_mouse_event(mouse).await,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }

        if model.lock().await.should_quit() {
            break;
        }
    }

    Ok(())
}
