use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::logging;
use crate::mpris::ControlCmd;
use crate::surface::PlaybackSurface;
use crate::sync::{NetEvent, Requests};

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    if let Some(path) = logging::init(&settings.logging) {
        info!(log = %path.display(), "encore starting");
    }

    let source = startup::build_source(&settings);
    let (net_tx, net_rx) = mpsc::channel::<NetEvent>();
    let requests = Requests::new(source, net_tx);

    let (store, state_path) = startup::restore_store(&settings);
    let (audio_player, media_rx) = AudioPlayer::new(settings.audio.clone());
    let surface = PlaybackSurface::new(audio_player, &settings.controls);

    let mut app = App::new(&settings.ui, requests.source_label());
    startup::initial_fetches(&mut app, &requests);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    let mut session = event_loop::Session::new(
        app,
        store,
        surface,
        requests,
        Some(mpris),
        settings.ui.clone(),
        settings.controls.clone(),
        state_path,
    );

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &mut session, &media_rx, &net_rx, &control_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    session
        .surface
        .output()
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));
    info!("encore stopped");

    run_result
}
