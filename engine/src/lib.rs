pub mod error;
pub mod game;
pub mod line;
pub mod point;
pub mod roster;
pub mod rotation;
pub mod stats;
pub mod store;
pub mod tournament;

pub use error::{EngineError, EngineResult, Severity};
pub use game::{EndReason, Game, GameConfig, ScoreEvent};
pub use line::{LineDraft, LineIssue};
pub use point::{Point, PointState};
pub use roster::Roster;
pub use rotation::{AbbaInfo, AbbaLetter, GenderQuota, abba_info};
pub use stats::{PlayerStats, SortDirection, StatsColumn, StatsFilter, StatsQuery, StatsSort};
pub use store::{Snapshot, Store, StoreError};
pub use tournament::{StatsScope, Tournament};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Players on the field for every point.
pub const LINE_SIZE: usize = 7;
/// Handler-capable players (handlers + hybrids) a line should carry.
pub const MIN_HANDLERS: usize = 3;
/// A roster needs at least this many players before a game can start.
pub const MIN_ROSTER: usize = LINE_SIZE;
/// First team to this score triggers halftime.
pub const HALFTIME_SCORE: u16 = 8;
/// First team to this score wins.
pub const SCORE_CAP: u16 = 15;

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// Gender-matching category used for ratio rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    #[serde(rename = "MMP")]
    Mmp,
    #[serde(rename = "FMP")]
    Fmp,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Mmp => "MMP",
            Gender::Fmp => "FMP",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Gender::Mmp => Gender::Fmp,
            Gender::Fmp => Gender::Mmp,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of the disc a player prefers to start points on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinePreference {
    #[default]
    Offense,
    Defense,
    Flex,
}

impl LinePreference {
    pub fn label(&self) -> &'static str {
        match self {
            LinePreference::Offense => "Offense",
            LinePreference::Defense => "Defense",
            LinePreference::Flex => "Flex",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LinePreference::Offense => LinePreference::Defense,
            LinePreference::Defense => LinePreference::Flex,
            LinePreference::Flex => LinePreference::Offense,
        }
    }

    pub fn covers(&self, side: Side) -> bool {
        match self {
            LinePreference::Flex => true,
            LinePreference::Offense => side == Side::Offense,
            LinePreference::Defense => side == Side::Defense,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Handler,
    Cutter,
    Hybrid,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Handler => "Handler",
            Role::Cutter => "Cutter",
            Role::Hybrid => "Hybrid",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Role::Handler => Role::Cutter,
            Role::Cutter => Role::Hybrid,
            Role::Hybrid => Role::Handler,
        }
    }

    /// Handlers and hybrids both count toward the handler minimum.
    pub fn is_handler_capable(&self) -> bool {
        matches!(self, Role::Handler | Role::Hybrid)
    }
}

/// The side our team starts a point on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Offense,
    Defense,
}

impl Side {
    pub fn label(&self) -> &'static str {
        match self {
            Side::Offense => "Offense",
            Side::Defense => "Defense",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Side::Offense => Side::Defense,
            Side::Defense => Side::Offense,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Moonlight,
    Opponent,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::Moonlight => Team::Opponent,
            Team::Opponent => Team::Moonlight,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Moonlight Score")]
    MoonlightScore,
    #[serde(rename = "Opponent Score")]
    OpponentScore,
}

impl Outcome {
    pub fn scored_by(team: Team) -> Self {
        match team {
            Team::Moonlight => Outcome::MoonlightScore,
            Team::Opponent => Outcome::OpponentScore,
        }
    }

    pub fn scorer(&self) -> Option<Team> {
        match self {
            Outcome::InProgress => None,
            Outcome::MoonlightScore => Some(Team::Moonlight),
            Outcome::OpponentScore => Some(Team::Opponent),
        }
    }

    pub fn is_complete(&self) -> bool {
        *self != Outcome::InProgress
    }
}

/// Stable player identity. Lines, goals and assists refer to players by id so
/// that historical games survive later roster edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        PlayerId(generate_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        PlayerId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub gender: Gender,
    pub line: LinePreference,
    pub role: Role,
}

impl Player {
    /// Build a player with a freshly generated id.
    pub fn new(name: impl Into<String>, gender: Gender, line: LinePreference, role: Role) -> Self {
        Self {
            id: PlayerId::generate(),
            name: name.into(),
            gender,
            line,
            role,
        }
    }

    pub fn is_eligible_for(&self, side: Side) -> bool {
        self.line.covers(side)
    }

    pub fn is_handler_capable(&self) -> bool {
        self.role.is_handler_capable()
    }
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Ids are `id_<unix millis>_<sequence>`: unique within a process and ordered
/// across restarts by the timestamp.
pub fn generate_id() -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("id_{}_{seq:x}", Utc::now().timestamp_millis())
}
