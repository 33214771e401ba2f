//! Lifecycle of a single point: `LinePending -> InProgress -> Scored`.

use crate::error::{EngineError, EngineResult};
use crate::line::validate_line;
use crate::rotation::GenderQuota;
use crate::{Outcome, Player, PlayerId, Side, Team};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointState {
    /// No line confirmed yet.
    LinePending,
    /// Line on the field, waiting for someone to score.
    InProgress,
    /// Terminal.
    Scored,
}

impl fmt::Display for PointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointState::LinePending => f.write_str("waiting for a line"),
            PointState::InProgress => f.write_str("in progress"),
            PointState::Scored => f.write_str("already scored"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// 1-based, dense within a game.
    pub number: u16,
    pub starting_side: Side,
    /// Empty until confirmed, then exactly the fielded players.
    #[serde(default)]
    pub line: Vec<Player>,
    pub outcome: Outcome,
    #[serde(default)]
    pub goal: Option<PlayerId>,
    #[serde(default)]
    pub assist: Option<PlayerId>,
}

impl Point {
    pub fn new(number: u16, starting_side: Side) -> Self {
        Self {
            number,
            starting_side,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PointState {
        if self.outcome.is_complete() {
            PointState::Scored
        } else if self.line.is_empty() {
            PointState::LinePending
        } else {
            PointState::InProgress
        }
    }

    pub fn has_on_line(&self, id: &PlayerId) -> bool {
        self.line.iter().any(|p| &p.id == id)
    }

    pub fn involves(&self, id: &PlayerId) -> bool {
        self.has_on_line(id) || self.goal.as_ref() == Some(id) || self.assist.as_ref() == Some(id)
    }

    /// Confirm the line. Fatal issues are always rejected; a handler
    /// shortfall is rejected unless `acknowledge_warning` is set.
    pub fn set_line(
        &mut self,
        line: Vec<Player>,
        quota: GenderQuota,
        acknowledge_warning: bool,
    ) -> EngineResult<()> {
        self.expect_state("set the line", PointState::LinePending)?;
        if let Some(issue) = validate_line(&line, quota) {
            if issue.is_fatal() {
                return Err(EngineError::InvalidLine(issue));
            }
            if !acknowledge_warning {
                return Err(EngineError::LineWarning(issue));
            }
            debug!("point {}: line accepted with warning: {issue}", self.number);
        }
        self.line = line;
        Ok(())
    }

    pub fn record_own_score(
        &mut self,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<()> {
        self.expect_state("record a score", PointState::InProgress)?;
        let (goal, assist) = self.check_scorers(goal, assist)?;
        self.outcome = Outcome::MoonlightScore;
        self.goal = Some(goal);
        self.assist = Some(assist);
        Ok(())
    }

    pub fn record_opponent_score(&mut self) -> EngineResult<()> {
        self.expect_state("record a score", PointState::InProgress)?;
        self.outcome = Outcome::OpponentScore;
        Ok(())
    }

    /// Correct goal/assist on a point we already scored. Score totals are
    /// unaffected.
    pub fn edit_outcome(
        &mut self,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<()> {
        if self.outcome != Outcome::MoonlightScore {
            return Err(EngineError::InvalidTransition {
                action: "edit the score",
                point: self.number,
                state: self.state(),
            });
        }
        let (goal, assist) = self.check_scorers(goal, assist)?;
        self.goal = Some(goal);
        self.assist = Some(assist);
        Ok(())
    }

    pub fn scored_by(&self) -> Option<Team> {
        self.outcome.scorer()
    }

    fn expect_state(&self, action: &'static str, expected: PointState) -> EngineResult<()> {
        let state = self.state();
        if state != expected {
            return Err(EngineError::InvalidTransition {
                action,
                point: self.number,
                state,
            });
        }
        Ok(())
    }

    fn check_scorers(
        &self,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<(PlayerId, PlayerId)> {
        let (Some(goal), Some(assist)) = (goal, assist) else {
            return Err(EngineError::MissingScorer);
        };
        if goal == assist {
            return Err(EngineError::SameScorer);
        }
        for id in [goal, assist] {
            if !self.has_on_line(id) {
                return Err(EngineError::NotOnLine(id.clone()));
            }
        }
        Ok((goal.clone(), assist.clone()))
    }
}
