//! Game controller: owns the point sequence, running score, halftime and
//! end conditions.

use crate::error::{EngineError, EngineResult};
use crate::line::{self, LineDraft};
use crate::point::{Point, PointState};
use crate::rotation::{AbbaInfo, abba_info};
use crate::{
    Gender, HALFTIME_SCORE, MIN_ROSTER, Outcome, Player, PlayerId, SCORE_CAP, Side, Team,
    generate_id,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_OPPONENT: &str = "Opponent";

/// Chosen on the setup screen before the first pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub initial_offense: Team,
    /// The "A" gender of the ABBA rotation.
    pub a_gender: Gender,
    pub opponent_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_offense: Team::Moonlight,
            a_gender: Gender::Mmp,
            opponent_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    #[serde(rename = "Score limit reached")]
    ScoreLimit,
    #[serde(rename = "Ended manually")]
    Manual,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::ScoreLimit => f.write_str("Score limit reached"),
            EndReason::Manual => f.write_str("Ended manually"),
        }
    }
}

/// What a scoring transition did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEvent {
    pub scorer: Team,
    pub halftime_triggered: bool,
    /// Set when this score finished the game.
    pub ended: Option<EndReason>,
    /// Starting side of the appended point, if one was appended.
    pub next_side: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    /// Frozen copy of the roster at kickoff.
    pub roster: Vec<Player>,
    pub initial_offense: Team,
    pub a_gender: Gender,
    pub opponent_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub end_reason: Option<EndReason>,
    #[serde(default)]
    pub is_halftime: bool,
    /// "Next score triggers halftime"
    #[serde(default)]
    pub halftime_armed: bool,
    pub moonlight_score: u16,
    pub opponent_score: u16,
    pub points: Vec<Point>,
}

impl Game {
    /// Start a game against a deep copy of `roster`. Fails without a full
    /// line's worth of players.
    pub fn start(roster: &[Player], config: GameConfig) -> EngineResult<Self> {
        if roster.len() < MIN_ROSTER {
            return Err(EngineError::RosterTooSmall {
                required: MIN_ROSTER,
                found: roster.len(),
            });
        }
        let opponent_name = match config.opponent_name.trim() {
            "" => DEFAULT_OPPONENT.to_string(),
            name => name.to_string(),
        };
        let first_side = match config.initial_offense {
            Team::Moonlight => Side::Offense,
            Team::Opponent => Side::Defense,
        };
        let game = Self {
            id: generate_id(),
            roster: roster.to_vec(),
            initial_offense: config.initial_offense,
            a_gender: config.a_gender,
            opponent_name,
            start_time: Utc::now(),
            end_time: None,
            is_complete: false,
            end_reason: None,
            is_halftime: false,
            halftime_armed: false,
            moonlight_score: 0,
            opponent_score: 0,
            points: vec![Point::new(1, first_side)],
        };
        info!(
            "game {} started vs {} ({} players, A = {})",
            game.id,
            game.opponent_name,
            game.roster.len(),
            game.a_gender
        );
        Ok(game)
    }

    pub fn abba(&self, point_number: u16) -> AbbaInfo {
        abba_info(point_number, self.a_gender)
    }

    pub fn point(&self, number: u16) -> Option<&Point> {
        self.points.iter().find(|p| p.number == number)
    }

    /// The trailing point still being played, if the game is live.
    pub fn current_point(&self) -> Option<&Point> {
        if self.is_complete {
            return None;
        }
        self.points.last().filter(|p| !p.outcome.is_complete())
    }

    pub fn current_state(&self) -> Option<PointState> {
        self.current_point().map(Point::state)
    }

    pub fn play_count(&self, player: &PlayerId) -> usize {
        line::play_count(player, &self.points)
    }

    pub fn find_player(&self, id: &PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| &p.id == id)
    }

    pub fn involves_player(&self, id: &PlayerId) -> bool {
        self.points.iter().any(|p| p.involves(id))
    }

    /// Suggested line for the current point.
    pub fn propose_line(&self) -> EngineResult<LineDraft> {
        let point = self.require_current("suggest a line", PointState::LinePending)?;
        let abba = self.abba(point.number);
        Ok(LineDraft::suggest(
            point.number,
            point.starting_side,
            abba.quota,
            &self.roster,
            &self.points,
        ))
    }

    pub fn set_line(&mut self, line: Vec<Player>, acknowledge_warning: bool) -> EngineResult<()> {
        let quota = {
            let point = self.require_current("set the line", PointState::LinePending)?;
            self.abba(point.number).quota
        };
        self.check_line_members(&line)?;
        let point = self.current_point_mut()?;
        point.set_line(line, quota, acknowledge_warning)?;
        debug!("game {}: line set for point {}", self.id, self.points.len());
        Ok(())
    }

    pub fn record_own_score(
        &mut self,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<ScoreEvent> {
        self.current_point_mut()?.record_own_score(goal, assist)?;
        Ok(self.after_score(Team::Moonlight))
    }

    pub fn record_opponent_score(&mut self) -> EngineResult<ScoreEvent> {
        self.current_point_mut()?.record_opponent_score()?;
        Ok(self.after_score(Team::Opponent))
    }

    /// Arm or disarm "next score triggers halftime". Ignored once halftime
    /// has happened.
    pub fn arm_halftime(&mut self, armed: bool) -> EngineResult<()> {
        self.ensure_live()?;
        self.halftime_armed = armed && !self.is_halftime;
        Ok(())
    }

    /// Correct goal/assist on an already scored point. Allowed on finished
    /// games too.
    pub fn edit_outcome(
        &mut self,
        point_number: u16,
        goal: Option<&PlayerId>,
        assist: Option<&PlayerId>,
    ) -> EngineResult<()> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.number == point_number)
            .ok_or(EngineError::UnknownPoint(point_number))?;
        point.edit_outcome(goal, assist)?;
        debug!("game {}: point {point_number} score edited", self.id);
        Ok(())
    }

    /// End before the score cap. The unplayed trailing point is discarded.
    pub fn end_manually(&mut self) -> EngineResult<()> {
        self.ensure_live()?;
        if self.points.last().is_some_and(|p| !p.outcome.is_complete()) {
            self.points.pop();
        }
        self.finish(EndReason::Manual);
        Ok(())
    }

    pub fn won(&self) -> bool {
        self.moonlight_score > self.opponent_score
    }

    /// e.g. "W 15 - 10"
    pub fn result_label(&self) -> String {
        format!(
            "{} {} - {}",
            if self.won() { "W" } else { "L" },
            self.moonlight_score,
            self.opponent_score
        )
    }

    pub fn count_points(&self, outcome: Outcome) -> u16 {
        let n = self.points.iter().filter(|p| p.outcome == outcome).count();
        u16::try_from(n).unwrap_or(u16::MAX)
    }

    fn after_score(&mut self, scorer: Team) -> ScoreEvent {
        let score = match scorer {
            Team::Moonlight => &mut self.moonlight_score,
            Team::Opponent => &mut self.opponent_score,
        };
        *score += 1;
        debug!(
            "game {}: {:?} scored, {}-{}",
            self.id, scorer, self.moonlight_score, self.opponent_score
        );

        if self.moonlight_score >= SCORE_CAP || self.opponent_score >= SCORE_CAP {
            self.finish(EndReason::ScoreLimit);
            return ScoreEvent {
                scorer,
                halftime_triggered: false,
                ended: Some(EndReason::ScoreLimit),
                next_side: None,
            };
        }

        let halftime_triggered = !self.is_halftime
            && (self.moonlight_score >= HALFTIME_SCORE
                || self.opponent_score >= HALFTIME_SCORE
                || self.halftime_armed);
        if halftime_triggered {
            self.is_halftime = true;
            self.halftime_armed = false;
            info!(
                "game {}: halftime at {}-{}",
                self.id, self.moonlight_score, self.opponent_score
            );
        }

        let next_side = self.next_starting_side(scorer, halftime_triggered);
        let number = u16::try_from(self.points.len() + 1).unwrap_or(u16::MAX);
        self.points.push(Point::new(number, next_side));

        ScoreEvent {
            scorer,
            halftime_triggered,
            ended: None,
            next_side: Some(next_side),
        }
    }

    /// The team that scored pulls next, so it starts on defense. On the
    /// halftime point the side follows the opening pull instead.
    fn next_starting_side(&self, scorer: Team, halftime_triggered: bool) -> Side {
        if halftime_triggered {
            let second_half = match self.initial_offense {
                Team::Moonlight => Side::Defense,
                Team::Opponent => Side::Offense,
            };
            return match scorer {
                Team::Moonlight => second_half,
                Team::Opponent => second_half.flipped(),
            };
        }
        match scorer {
            Team::Moonlight => Side::Defense,
            Team::Opponent => Side::Offense,
        }
    }

    fn finish(&mut self, reason: EndReason) {
        self.moonlight_score = self.count_points(Outcome::MoonlightScore);
        self.opponent_score = self.count_points(Outcome::OpponentScore);
        self.is_complete = true;
        self.halftime_armed = false;
        self.end_reason = Some(reason);
        self.end_time = Some(Utc::now());
        info!(
            "game {} vs {} over ({reason}): {}",
            self.id,
            self.opponent_name,
            self.result_label()
        );
    }

    /// Every fielded player must be a distinct member of the roster snapshot.
    fn check_line_members(&self, line: &[Player]) -> EngineResult<()> {
        let mut seen = HashSet::with_capacity(line.len());
        for player in line {
            if self.find_player(&player.id).is_none() {
                return Err(EngineError::UnknownPlayer(player.id.clone()));
            }
            if !seen.insert(&player.id) {
                return Err(EngineError::AlreadyOnLine(player.name.clone()));
            }
        }
        Ok(())
    }

    fn ensure_live(&self) -> EngineResult<()> {
        if self.is_complete {
            return Err(EngineError::GameComplete);
        }
        Ok(())
    }

    fn require_current(&self, action: &'static str, expected: PointState) -> EngineResult<&Point> {
        self.ensure_live()?;
        let point = self.points.last().ok_or(EngineError::UnknownPoint(1))?;
        let state = point.state();
        if state != expected {
            return Err(EngineError::InvalidTransition {
                action,
                point: point.number,
                state,
            });
        }
        Ok(point)
    }

    fn current_point_mut(&mut self) -> EngineResult<&mut Point> {
        self.ensure_live()?;
        let next = u16::try_from(self.points.len() + 1).unwrap_or(u16::MAX);
        self.points.last_mut().ok_or(EngineError::UnknownPoint(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deep_flex, seven_flex};
    use crate::{Gender, LINE_SIZE};

    fn start(initial_offense: Team) -> Game {
        let config = GameConfig {
            initial_offense,
            a_gender: Gender::Mmp,
            opponent_name: "Revolver".to_string(),
        };
        Game::start(&deep_flex(8), config).unwrap()
    }

    fn field_line(game: &mut Game) {
        let draft = game.propose_line().unwrap();
        game.set_line(draft.line, true).unwrap();
    }

    fn we_score(game: &mut Game) -> ScoreEvent {
        field_line(game);
        let line = &game.points.last().unwrap().line;
        let (goal, assist) = (line[0].id.clone(), line[1].id.clone());
        game.record_own_score(Some(&goal), Some(&assist)).unwrap()
    }

    fn they_score(game: &mut Game) -> ScoreEvent {
        field_line(game);
        game.record_opponent_score().unwrap()
    }

    #[test]
    fn lines_must_be_distinct_roster_players() {
        let mut game = Game::start(&deep_flex(6), GameConfig::default()).unwrap();
        let mut line = game.propose_line().unwrap().line;
        let mmps: Vec<usize> = (0..line.len())
            .filter(|&i| line[i].gender == Gender::Mmp)
            .collect();
        line[mmps[1]] = line[mmps[0]].clone();

        let err = game.set_line(line.clone(), true).unwrap_err();
        assert_eq!(err, EngineError::AlreadyOnLine(line[mmps[0]].name.clone()));
        assert_eq!(err.severity(), crate::Severity::Validation);
        assert_eq!(game.current_state(), Some(PointState::LinePending));

        let mut line = game.propose_line().unwrap().line;
        let stranger = Player::new("Stranger", line[0].gender, line[0].line, line[0].role);
        line[0] = stranger.clone();
        assert_eq!(
            game.set_line(line, true),
            Err(EngineError::UnknownPlayer(stranger.id))
        );
        assert!(game.points[0].line.is_empty());
    }

    #[test]
    fn small_rosters_cannot_start() {
        let mut roster = seven_flex();
        roster.pop();
        let err = Game::start(&roster, GameConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::RosterTooSmall { required: 7, found: 6 });
    }

    #[test]
    fn new_game_has_one_pending_point() {
        let game = Game::start(&seven_flex(), GameConfig::default()).unwrap();
        assert_eq!(game.points.len(), 1);
        assert_eq!(game.points[0].number, 1);
        assert_eq!(game.points[0].starting_side, Side::Offense);
        assert_eq!(game.current_state(), Some(PointState::LinePending));
        assert_eq!(game.opponent_name, DEFAULT_OPPONENT);
        assert_eq!((game.moonlight_score, game.opponent_score), (0, 0));
    }

    #[test]
    fn opponent_receiving_starts_us_on_defense() {
        let game = start(Team::Opponent);
        assert_eq!(game.points[0].starting_side, Side::Defense);
    }

    #[test]
    fn first_point_scenario() {
        let mut game = Game::start(&seven_flex(), GameConfig::default()).unwrap();
        let abba = game.abba(1);
        assert_eq!(abba.label(), "MMP 2");
        assert_eq!((abba.required_mmp(), abba.required_fmp()), (4, 3));

        let draft = game.propose_line().unwrap();
        assert_eq!(draft.line.len(), LINE_SIZE);
        assert_eq!(draft.line.iter().filter(|p| p.gender == Gender::Mmp).count(), 4);
        assert_eq!(draft.line.iter().filter(|p| p.gender == Gender::Fmp).count(), 3);
        game.set_line(draft.line, false).unwrap();
        assert_eq!(game.current_state(), Some(PointState::InProgress));
    }

    #[test]
    fn roster_snapshot_is_independent() {
        let mut roster = seven_flex();
        let game = Game::start(&roster, GameConfig::default()).unwrap();
        roster[0].name = "Renamed".to_string();
        assert_eq!(game.roster[0].name, "m1");
    }

    #[test]
    fn scoring_appends_the_next_point() {
        let mut game = start(Team::Moonlight);
        let event = we_score(&mut game);
        assert_eq!(event.next_side, Some(Side::Defense));
        assert_eq!(game.points.len(), 2);
        assert_eq!(game.points[1].number, 2);
        assert_eq!(game.points[1].starting_side, Side::Defense);

        let event = they_score(&mut game);
        assert_eq!(event.next_side, Some(Side::Offense));
        assert_eq!(game.points[2].starting_side, Side::Offense);
        assert_eq!((game.moonlight_score, game.opponent_score), (1, 1));
    }

    #[test]
    fn running_score_matches_point_outcomes() {
        let mut game = start(Team::Moonlight);
        for i in 0..11 {
            if i % 3 == 0 { they_score(&mut game) } else { we_score(&mut game) };
            assert_eq!(game.moonlight_score, game.count_points(Outcome::MoonlightScore));
            assert_eq!(game.opponent_score, game.count_points(Outcome::OpponentScore));
            let pending = game.points.iter().filter(|p| !p.outcome.is_complete()).count();
            assert_eq!(pending, 1);
        }
    }

    #[test]
    fn halftime_at_eight_flips_the_side() {
        let mut game = start(Team::Moonlight);
        for _ in 0..6 {
            they_score(&mut game);
        }
        for _ in 0..7 {
            we_score(&mut game);
        }
        assert!(!game.is_halftime);
        assert_eq!((game.moonlight_score, game.opponent_score), (7, 6));

        let event = we_score(&mut game);
        assert!(event.halftime_triggered);
        assert!(game.is_halftime);
        assert_eq!(event.next_side, Some(Side::Defense));
        assert_eq!(game.points.last().unwrap().starting_side, Side::Defense);

        let later = we_score(&mut game);
        assert!(!later.halftime_triggered);
        assert!(game.is_halftime);
    }

    #[test]
    fn halftime_on_opponent_score_takes_the_complement() {
        let mut game = start(Team::Moonlight);
        for _ in 0..7 {
            they_score(&mut game);
        }
        let event = they_score(&mut game);
        assert!(event.halftime_triggered);
        assert_eq!(event.next_side, Some(Side::Offense));
    }

    #[test]
    fn halftime_side_follows_the_opening_pull() {
        let mut game = start(Team::Opponent);
        game.arm_halftime(true).unwrap();
        let event = we_score(&mut game);
        assert!(event.halftime_triggered);
        assert_eq!(event.next_side, Some(Side::Offense));
    }

    #[test]
    fn armed_halftime_fires_once_and_clears() {
        let mut game = start(Team::Moonlight);
        game.arm_halftime(true).unwrap();
        assert!(game.halftime_armed);
        let event = they_score(&mut game);
        assert!(event.halftime_triggered);
        assert!(!game.halftime_armed);

        game.arm_halftime(true).unwrap();
        assert!(!game.halftime_armed);
        assert!(!they_score(&mut game).halftime_triggered);
    }

    #[test]
    fn fifteen_ends_the_game_without_a_new_point() {
        let mut game = start(Team::Moonlight);
        for _ in 0..10 {
            they_score(&mut game);
        }
        for _ in 0..14 {
            we_score(&mut game);
        }
        assert_eq!((game.moonlight_score, game.opponent_score), (14, 10));
        let before = game.points.len();

        let event = we_score(&mut game);
        assert_eq!(event.ended, Some(EndReason::ScoreLimit));
        assert_eq!(event.next_side, None);
        assert_eq!(game.points.len(), before);
        assert!(game.is_complete);
        assert_eq!(game.end_reason, Some(EndReason::ScoreLimit));
        assert_eq!(game.result_label(), "W 15 - 10");
        assert!(game.end_time.is_some());
        assert_eq!(game.current_point(), None);
        assert_eq!(game.record_opponent_score(), Err(EngineError::GameComplete));
    }

    #[test]
    fn manual_end_drops_only_the_trailing_point() {
        let mut game = start(Team::Moonlight);
        we_score(&mut game);
        they_score(&mut game);
        field_line(&mut game);
        assert_eq!(game.points.len(), 3);

        game.end_manually().unwrap();
        assert_eq!(game.points.len(), 2);
        assert!(game.points.iter().all(|p| p.outcome.is_complete()));
        assert_eq!(game.end_reason, Some(EndReason::Manual));
        assert_eq!(EndReason::Manual.to_string(), "Ended manually");
        assert_eq!((game.moonlight_score, game.opponent_score), (1, 1));
        assert_eq!(game.end_manually(), Err(EngineError::GameComplete));
    }

    #[test]
    fn final_scores_are_recounted_from_points() {
        let mut game = start(Team::Moonlight);
        we_score(&mut game);
        game.moonlight_score = 9;
        game.end_manually().unwrap();
        assert_eq!(game.moonlight_score, 1);
    }

    #[test]
    fn scoring_before_the_line_is_an_invalid_transition() {
        let mut game = start(Team::Moonlight);
        let err = game.record_opponent_score().unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { point: 1, .. }));
        assert_eq!(game.points.len(), 1);
        assert_eq!(game.opponent_score, 0);
    }

    #[test]
    fn proposing_needs_a_pending_point() {
        let mut game = start(Team::Moonlight);
        field_line(&mut game);
        assert!(matches!(
            game.propose_line(),
            Err(EngineError::InvalidTransition { state: PointState::InProgress, .. })
        ));
    }

    #[test]
    fn edits_keep_the_score() {
        let mut game = start(Team::Moonlight);
        we_score(&mut game);
        they_score(&mut game);
        let line = game.points[0].line.clone();
        game.edit_outcome(1, Some(&line[2].id), Some(&line[3].id)).unwrap();
        assert_eq!(game.points[0].goal, Some(line[2].id.clone()));
        assert_eq!((game.moonlight_score, game.opponent_score), (1, 1));
        assert_eq!(game.points.len(), 3);

        assert!(game.edit_outcome(2, Some(&line[2].id), Some(&line[3].id)).is_err());
        assert!(game.edit_outcome(3, Some(&line[2].id), Some(&line[3].id)).is_err());
        assert_eq!(
            game.edit_outcome(9, Some(&line[2].id), Some(&line[3].id)),
            Err(EngineError::UnknownPoint(9))
        );
    }

    #[test]
    fn abba_follows_point_numbers() {
        let mut game = start(Team::Moonlight);
        we_score(&mut game);
        assert_eq!(game.abba(game.points[1].number).label(), "FMP 1");
        let draft = game.propose_line().unwrap();
        assert_eq!(draft.quota.fmp, 4);
    }
}
