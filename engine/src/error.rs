use crate::PlayerId;
use crate::line::LineIssue;
use crate::point::PointState;

pub type EngineResult<T> = Result<T, EngineError>;

/// How the front-end should treat a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// User-correctable input. Shown as a blocking message; nothing changed.
    Validation,
    /// User-overridable. Retrying with an explicit acknowledgement proceeds.
    Warning,
    /// An operation was called outside its legal state.
    InvalidTransition,
}

/// Every engine operation returns this on failure and leaves state untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Please add at least {required} players to the roster before starting a game.")]
    RosterTooSmall { required: usize, found: usize },

    #[error("Player name cannot be empty.")]
    EmptyName,

    #[error("Player \"{0}\" already exists.")]
    DuplicateName(String),

    #[error("Player {0} not found.")]
    UnknownPlayer(PlayerId),

    #[error("{0} is on a line in the active game and cannot be deleted.")]
    PlayerInUse(String),

    #[error("{0}")]
    InvalidLine(LineIssue),

    /// The line is playable but needs explicit acknowledgement.
    #[error("{0}")]
    LineWarning(LineIssue),

    #[error("No available replacements with matching gender.")]
    NoReplacement,

    #[error("{incoming} cannot replace {outgoing}: replacements must be the same gender.")]
    GenderMismatch { outgoing: String, incoming: String },

    #[error("{0} is already on the line.")]
    AlreadyOnLine(String),

    #[error("Please select both a Goal and an Assist.")]
    MissingScorer,

    #[error("Goal and assist must be different players.")]
    SameScorer,

    #[error("{0} is not on the line for this point.")]
    NotOnLine(PlayerId),

    #[error("Cannot {action} on point {point}: point is {state}.")]
    InvalidTransition {
        action: &'static str,
        point: u16,
        state: PointState,
    },

    #[error("Point {0} does not exist.")]
    UnknownPoint(u16),

    #[error("Game is already complete.")]
    GameComplete,

    #[error("A game is already in progress.")]
    GameInProgress,

    #[error("No active game.")]
    NoActiveGame,

    #[error("Game {0} not found.")]
    UnknownGame(String),
}

impl EngineError {
    pub fn severity(&self) -> Severity {
        match self {
            EngineError::LineWarning(_) => Severity::Warning,
            EngineError::InvalidTransition { .. }
            | EngineError::GameComplete
            | EngineError::NoActiveGame => Severity::InvalidTransition,
            _ => Severity::Validation,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}
