use crate::state::storage::SaveState;
use crossterm::event::KeyEvent;
use ulti_engine::{Roster, Snapshot};

#[derive(Debug, Clone)]
pub enum StorageRequest {
    /// Persist the whole engine state. Fire and forget.
    Save(Box<Snapshot>),
    /// Read back the last saved roster.
    LoadRoster,
}

#[derive(Debug)]
pub enum StorageResponse {
    SaveStateChanged { save_state: SaveState },
    RosterLoaded { roster: Option<Roster> },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
