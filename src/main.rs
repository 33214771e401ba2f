mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::{AppSettings, DATA_DIR_VAR, LOG_VAR};
use crate::state::messages::{StorageRequest, StorageResponse, UiEvent};
use crate::state::storage::{SaveState, StorageWorker};
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};
use ulti_engine::{Store, Tournament};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let settings = AppSettings::load();
    let store = Store::new(&settings.data_dir);
    let tournament = Tournament::from_snapshot(store.load());

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Error);
    info!("data directory: {}", settings.data_dir.display());

    let app = Arc::new(Mutex::new(App::new(settings, tournament)));

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (storage_req_tx, storage_req_rx) = mpsc::channel::<StorageRequest>(100);
    let (storage_resp_tx, mut storage_resp_rx) = mpsc::channel::<StorageResponse>(100);

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Storage thread
    let storage_worker = StorageWorker::new(store, storage_req_rx, storage_resp_tx);
    let storage_task = tokio::spawn(storage_worker.run());

    // First frame
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    let terminal = main_ui_loop(
        terminal,
        app,
        ui_event_rx,
        storage_req_tx,
        &mut storage_resp_rx,
    )
    .await;

    input_handler.abort();
    // The request sender is gone, so the worker drains what is queued and exits.
    if let Err(e) = storage_task.await {
        error!("storage worker stopped abnormally: {e}");
    }

    drop(terminal);
    cleanup_terminal();
    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("ultistats {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> String {
    format!(
        "ultistats - mixed ultimate sideline tracker

Usage:
  ultistats
  ultistats --help
  ultistats --version

Environment:
  {DATA_DIR_VAR}   Directory for roster, game history and the active game
                       (default $XDG_CONFIG_HOME/ultistats or ~/.config/ultistats)
  {LOG_VAR}        Log level shown in the log pane: error, warn, info, debug, trace"
    )
}

/// Runs until the user quits, then hands the terminal back.
async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    storage_requests: mpsc::Sender<StorageRequest>,
    storage_responses: &mut mpsc::Receiver<StorageResponse>,
) -> Terminal<CrosstermBackend<Stdout>> {
    let mut save_state = SaveState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                match ui_event {
                    UiEvent::KeyPressed(key_event) => {
                        if !keys::handle_key_bindings(key_event, &app, &storage_requests).await {
                            break;
                        }
                    }
                    UiEvent::Resize | UiEvent::AppStarted => {}
                }
                let mut app_guard = app.lock().await;
                draw::draw(&mut terminal, &mut app_guard, save_state);
            }

            Some(response) = storage_responses.recv() => {
                handle_storage_response(response, &app, &mut save_state).await;
                let mut app_guard = app.lock().await;
                draw::draw(&mut terminal, &mut app_guard, save_state);
            }
        }
    }

    terminal
}

async fn handle_storage_response(
    response: StorageResponse,
    app: &Arc<Mutex<App>>,
    save_state: &mut SaveState,
) {
    match response {
        StorageResponse::SaveStateChanged { save_state: next } => {
            *save_state = next;
        }
        StorageResponse::RosterLoaded { roster } => {
            let mut guard = app.lock().await;
            guard.on_roster_loaded(roster);
        }
        StorageResponse::Error { message } => {
            error!("Storage error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
