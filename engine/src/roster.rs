use crate::error::{EngineError, EngineResult};
use crate::{Gender, LinePreference, Player, PlayerId, Role};
use log::debug;
use serde::{Deserialize, Serialize};

/// Ordered list of players with case-insensitively unique names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn find(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    /// Whether `name` is taken by anyone other than `except`.
    pub fn has_name(&self, name: &str, except: Option<&PlayerId>) -> bool {
        let wanted = name.trim().to_lowercase();
        self.players
            .iter()
            .filter(|p| Some(&p.id) != except)
            .any(|p| p.name.to_lowercase() == wanted)
    }

    pub fn add(
        &mut self,
        name: &str,
        gender: Gender,
        line: LinePreference,
        role: Role,
    ) -> EngineResult<PlayerId> {
        let name = self.check_name(name, None)?;
        let player = Player::new(name, gender, line, role);
        let id = player.id.clone();
        debug!("roster: added {} ({id})", player.name);
        self.players.push(player);
        Ok(id)
    }

    pub fn edit(
        &mut self,
        id: &PlayerId,
        name: &str,
        gender: Gender,
        line: LinePreference,
        role: Role,
    ) -> EngineResult<()> {
        let name = self.check_name(name, Some(id))?;
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| EngineError::UnknownPlayer(id.clone()))?;
        player.name = name;
        player.gender = gender;
        player.line = line;
        player.role = role;
        Ok(())
    }

    /// Remove a player outright. Callers holding game state should go through
    /// [`crate::Tournament::delete_player`] instead.
    pub fn remove(&mut self, id: &PlayerId) -> EngineResult<Player> {
        let index = self
            .players
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| EngineError::UnknownPlayer(id.clone()))?;
        let player = self.players.remove(index);
        debug!("roster: removed {}", player.name);
        Ok(player)
    }

    /// Add every name in a comma-separated list to one bucket. Blank and
    /// already-present names are skipped. Returns the ids that were added.
    pub fn quick_add(
        &mut self,
        names: &str,
        gender: Gender,
        line: LinePreference,
        role: Role,
    ) -> Vec<PlayerId> {
        names
            .split(',')
            .filter_map(|name| self.add(name, gender, line, role).ok())
            .collect()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }

    fn check_name(&self, name: &str, except: Option<&PlayerId>) -> EngineResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }
        if self.has_name(name, except) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }
}
