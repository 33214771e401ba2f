use crate::state::messages::{StorageRequest, StorageResponse};
use log::{debug, error};
use tokio::sync::mpsc;
use ulti_engine::{Snapshot, Store, StoreError};

const SAVING_CHAR: char = '⠿';
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct SaveState {
    pub is_saving: bool,
    pub indicator: char,
}

impl Default for SaveState {
    fn default() -> Self {
        Self { is_saving: false, indicator: ' ' }
    }
}

/// Owns the on-disk store. Runs blocking file I/O off the UI task and
/// reports back over `responses`.
pub struct StorageWorker {
    store: Store,
    requests: mpsc::Receiver<StorageRequest>,
    responses: mpsc::Sender<StorageResponse>,
    /// A non-save request pulled off the queue while coalescing saves.
    deferred: Option<StorageRequest>,
}

impl StorageWorker {
    pub fn new(
        store: Store,
        requests: mpsc::Receiver<StorageRequest>,
        responses: mpsc::Sender<StorageResponse>,
    ) -> Self {
        Self { store, requests, responses, deferred: None }
    }

    pub async fn run(mut self) {
        loop {
            let request = match self.deferred.take() {
                Some(request) => request,
                None => match self.requests.recv().await {
                    Some(request) => request,
                    None => break,
                },
            };
            let response = match request {
                StorageRequest::Save(snapshot) => {
                    let snapshot = self.latest_snapshot(*snapshot);
                    self.handle_save(snapshot).await
                }
                StorageRequest::LoadRoster => self.handle_load_roster().await,
            };

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send storage response: {e}");
                break;
            }
        }
    }

    /// Saves queued behind this one supersede it.
    fn latest_snapshot(&mut self, mut snapshot: Snapshot) -> Snapshot {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                StorageRequest::Save(next) => snapshot = *next,
                other => {
                    self.deferred = Some(other);
                    break;
                }
            }
        }
        snapshot
    }

    async fn handle_save(&self, snapshot: Snapshot) -> StorageResponse {
        self.set_save_state(SaveState { is_saving: true, indicator: SAVING_CHAR })
            .await;

        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || store.save(&snapshot)).await;

        let failure = match result {
            Ok(Ok(())) => {
                debug!("state saved to {}", self.store.dir().display());
                None
            }
            Ok(Err(err)) => Some(save_failed(&err)),
            Err(join_err) => {
                let message = format!("Save task failed: {join_err}");
                error!("{message}");
                Some(StorageResponse::Error { message })
            }
        };

        match failure {
            Some(response) => {
                self.set_save_state(SaveState { is_saving: false, indicator: ERROR_CHAR })
                    .await;
                response
            }
            None => StorageResponse::SaveStateChanged { save_state: SaveState::default() },
        }
    }

    async fn handle_load_roster(&self) -> StorageResponse {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.load_roster()).await {
            Ok(Ok(roster)) => StorageResponse::RosterLoaded { roster },
            Ok(Err(err)) => {
                error!("roster reload failed: {err}");
                StorageResponse::Error { message: format!("Could not load saved roster: {err}") }
            }
            Err(join_err) => StorageResponse::Error { message: format!("Load task failed: {join_err}") },
        }
    }

    async fn set_save_state(&self, save_state: SaveState) {
        let _ = self
            .responses
            .send(StorageResponse::SaveStateChanged { save_state })
            .await;
    }
}

fn save_failed(err: &StoreError) -> StorageResponse {
    error!("save failed: {err}");
    StorageResponse::Error { message: format!("Save failed: {err}") }
}
