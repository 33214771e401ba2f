//! The engine context: roster, finished games and the game being played.
//! Front-ends hold one of these and route every command through it.

use crate::error::{EngineError, EngineResult};
use crate::game::{Game, GameConfig};
use crate::roster::Roster;
use crate::stats::{PlayerStats, StatsQuery};
use crate::store::Snapshot;
use crate::{Player, PlayerId};
use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsScope {
    /// Every finished game, over the current roster.
    Tournament,
    /// One finished game, over its roster snapshot.
    Game(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tournament {
    pub roster: Roster,
    /// Newest first.
    pub history: Vec<Game>,
    pub active: Option<Game>,
}

impl Tournament {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tournament = Self {
            roster: snapshot.roster,
            history: snapshot.history,
            active: snapshot.active,
        };
        tournament
            .history
            .sort_by(|a, b| b.start_time.cmp(&a.start_time));
        // A game saved right as it finished belongs in history.
        tournament.archive_finished();
        tournament
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            roster: self.roster.clone(),
            history: self.history.clone(),
            active: self.active.clone(),
        }
    }

    pub fn active(&self) -> EngineResult<&Game> {
        self.active.as_ref().ok_or(EngineError::NoActiveGame)
    }

    pub fn history_game(&self, id: &str) -> EngineResult<&Game> {
        self.history
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| EngineError::UnknownGame(id.to_string()))
    }

    pub fn start_game(&mut self, config: GameConfig) -> EngineResult<&Game> {
        if self.active.is_some() {
            return Err(EngineError::GameInProgress);
        }
        let game = Game::start(self.roster.players(), config)?;
        Ok(self.active.insert(game))
    }

    /// Run `op` against the active game. A game that finished during `op`
    /// is moved into history.
    pub fn with_active<T>(
        &mut self,
        op: impl FnOnce(&mut Game) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let game = self.active.as_mut().ok_or(EngineError::NoActiveGame)?;
        let out = op(game)?;
        self.archive_finished();
        Ok(out)
    }

    /// End the active game early and archive it. Returns its id.
    pub fn end_active_game(&mut self) -> EngineResult<String> {
        self.with_active(|game| {
            game.end_manually()?;
            Ok(game.id.clone())
        })
    }

    /// Delete a roster player unless the active game references them.
    pub fn delete_player(&mut self, id: &PlayerId) -> EngineResult<Player> {
        let player = self
            .roster
            .find(id)
            .ok_or_else(|| EngineError::UnknownPlayer(id.clone()))?;
        if self.active.as_ref().is_some_and(|g| g.involves_player(id)) {
            return Err(EngineError::PlayerInUse(player.name.clone()));
        }
        self.roster.remove(id)
    }

    pub fn delete_game(&mut self, id: &str) -> EngineResult<Game> {
        let index = self
            .history
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| EngineError::UnknownGame(id.to_string()))?;
        let game = self.history.remove(index);
        info!("deleted game {} vs {}", game.id, game.opponent_name);
        Ok(game)
    }

    pub fn edit_history_outcome(
        &mut self,
        game_id: &str,
        point_number: u16,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<()> {
        let game = self
            .history
            .iter_mut()
            .find(|g| g.id == game_id)
            .ok_or_else(|| EngineError::UnknownGame(game_id.to_string()))?;
        game.edit_outcome(point_number, goal, assist)
    }

    /// Tournament totals first, then each finished game newest first.
    pub fn stats_scopes(&self) -> Vec<StatsScope> {
        std::iter::once(StatsScope::Tournament)
            .chain(self.history.iter().map(|g| StatsScope::Game(g.id.clone())))
            .collect()
    }

    pub fn scope_label(&self, scope: &StatsScope) -> String {
        match scope {
            StatsScope::Tournament => "Tournament Totals".to_string(),
            StatsScope::Game(id) => match self.history_game(id) {
                Ok(game) => format!("vs {} ({})", game.opponent_name, game.result_label()),
                Err(_) => format!("game {id}"),
            },
        }
    }

    pub fn stats(&self, scope: &StatsScope, query: &StatsQuery) -> EngineResult<Vec<PlayerStats>> {
        match scope {
            StatsScope::Tournament => Ok(query.run(&self.history, self.roster.players())),
            StatsScope::Game(id) => {
                let game = self.history_game(id)?;
                Ok(query.run([game], &game.roster))
            }
        }
    }

    /// Move a completed active game to the front of history, replacing any
    /// entry with the same id.
    fn archive_finished(&mut self) {
        if !self.active.as_ref().is_some_and(|g| g.is_complete) {
            return;
        }
        if let Some(game) = self.active.take() {
            self.history.retain(|g| g.id != game.id);
            info!("archived game {} ({})", game.id, game.result_label());
            self.history.insert(0, game);
        }
    }
}
