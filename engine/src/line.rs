//! Line suggestion, validation and manual substitution.
//!
//! Suggestions favour whoever has played the fewest points so far, then
//! allocate roles greedily so the line carries at least [`MIN_HANDLERS`]
//! handler-capable players.

use crate::error::{EngineError, EngineResult};
use crate::point::Point;
use crate::rotation::GenderQuota;
use crate::{Gender, LINE_SIZE, MIN_HANDLERS, Player, PlayerId, Role, Side};
use log::debug;
use std::fmt;

/// Why a line cannot be confirmed as-is. Everything except
/// [`LineIssue::FewHandlers`] is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineIssue {
    NoEligiblePlayers,
    ShortPool { quota: GenderQuota },
    WrongSize { found: usize },
    GenderRatio { required_mmp: usize, found_mmp: usize },
    FewHandlers { found: usize },
}

impl LineIssue {
    pub fn is_fatal(&self) -> bool {
        !self.is_warning()
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, LineIssue::FewHandlers { .. })
    }

    /// Fatal issues caused by the roster itself rather than the line.
    pub fn is_roster_shortage(&self) -> bool {
        matches!(self, LineIssue::NoEligiblePlayers | LineIssue::ShortPool { .. })
    }
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineIssue::NoEligiblePlayers => write!(f, "Fatal: Roster lacks eligible players."),
            LineIssue::ShortPool { quota } => write!(f, "Fatal: Roster lacks players for {quota}."),
            LineIssue::WrongSize { found } => write!(
                f,
                "Fatal: Line must have {LINE_SIZE} players. Current: {found}."
            ),
            LineIssue::GenderRatio { required_mmp, found_mmp } => write!(
                f,
                "Fatal: Gender ratio invalid. Required: {required_mmp} MMPs, Found: {found_mmp}."
            ),
            LineIssue::FewHandlers { found } => write!(
                f,
                "Warning: Line has only {found} handlers/hybrids. Minimum is {MIN_HANDLERS}."
            ),
        }
    }
}

/// First matching issue in priority order, or `None` for a clean line.
pub fn validate_line(line: &[Player], quota: GenderQuota) -> Option<LineIssue> {
    if line.is_empty() {
        return Some(LineIssue::NoEligiblePlayers);
    }
    if line.len() != LINE_SIZE {
        return Some(LineIssue::WrongSize { found: line.len() });
    }
    let found_mmp = line.iter().filter(|p| p.gender == Gender::Mmp).count();
    if found_mmp != quota.mmp {
        return Some(LineIssue::GenderRatio {
            required_mmp: quota.mmp,
            found_mmp,
        });
    }
    let handlers = line.iter().filter(|p| p.is_handler_capable()).count();
    if handlers < MIN_HANDLERS {
        return Some(LineIssue::FewHandlers { found: handlers });
    }
    None
}

/// Number of points whose line includes this player.
pub fn play_count(player: &PlayerId, points: &[Point]) -> usize {
    points.iter().filter(|p| p.has_on_line(player)).count()
}

/// Propose a line of exactly [`LINE_SIZE`] players for a point starting on
/// `side`, or report that the roster cannot meet the quota.
pub fn suggest_line(
    roster: &[Player],
    side: Side,
    quota: GenderQuota,
    past_points: &[Point],
) -> Result<Vec<Player>, LineIssue> {
    let mut eligible: Vec<(usize, &Player)> = roster
        .iter()
        .filter(|p| p.is_eligible_for(side))
        .map(|p| (play_count(&p.id, past_points), p))
        .collect();
    // Stable: ties keep roster order.
    eligible.sort_by_key(|(played, _)| *played);

    let pool = |gender: Gender| -> Vec<&Player> {
        eligible
            .iter()
            .filter(|(_, p)| p.gender == gender)
            .map(|(_, p)| *p)
            .collect()
    };
    let mmp_pool = pool(Gender::Mmp);
    let fmp_pool = pool(Gender::Fmp);
    if mmp_pool.len() < quota.mmp || fmp_pool.len() < quota.fmp {
        debug!(
            "cannot suggest {side:?} line: {} MMP / {} FMP eligible for {quota}",
            mmp_pool.len(),
            fmp_pool.len()
        );
        return Err(LineIssue::ShortPool { quota });
    }

    let combined: Vec<&Player> = mmp_pool[..quota.mmp]
        .iter()
        .chain(fmp_pool[..quota.fmp].iter())
        .copied()
        .collect();
    Ok(allocate_roles(&combined))
}

/// Greedy role allocation over the least-played pool: pure handlers first (up
/// to the minimum), hybrids to cover any handler shortfall, cutters for the
/// remaining slots, then leftover hybrids and handlers.
/// The final handler fill goes past plain greedy so a pool that meets the
/// gender quota always yields a full line instead of a short one.
fn allocate_roles(pool: &[&Player]) -> Vec<Player> {
    let by_role = |role: Role| -> Vec<&Player> {
        pool.iter().filter(|p| p.role == role).copied().collect()
    };
    let mut handlers = by_role(Role::Handler).into_iter();
    let mut hybrids = by_role(Role::Hybrid).into_iter();
    let mut cutters = by_role(Role::Cutter).into_iter();

    let mut line: Vec<Player> = Vec::with_capacity(LINE_SIZE);
    line.extend(handlers.by_ref().take(MIN_HANDLERS).cloned());
    let short = MIN_HANDLERS.saturating_sub(line.len());
    line.extend(hybrids.by_ref().take(short).cloned());

    let open = LINE_SIZE.saturating_sub(line.len());
    line.extend(cutters.by_ref().take(open).cloned());
    let open = LINE_SIZE.saturating_sub(line.len());
    line.extend(hybrids.by_ref().take(open).cloned());
    let open = LINE_SIZE.saturating_sub(line.len());
    line.extend(handlers.take(open).cloned());
    line
}

/// A proposed line for one point, editable by single-player swaps until it
/// is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDraft {
    pub point_number: u16,
    pub side: Side,
    pub quota: GenderQuota,
    pub line: Vec<Player>,
    shortage: Option<LineIssue>,
}

impl LineDraft {
    pub fn suggest(
        point_number: u16,
        side: Side,
        quota: GenderQuota,
        roster: &[Player],
        past_points: &[Point],
    ) -> Self {
        let (line, shortage) = match suggest_line(roster, side, quota, past_points) {
            Ok(line) => (line, None),
            Err(issue) => (Vec::new(), Some(issue)),
        };
        Self {
            point_number,
            side,
            quota,
            line,
            shortage,
        }
    }

    pub fn issue(&self) -> Option<LineIssue> {
        if self.line.is_empty()
            && let Some(shortage) = self.shortage
        {
            return Some(shortage);
        }
        validate_line(&self.line, self.quota)
    }

    pub fn is_fatal(&self) -> bool {
        self.issue().is_some_and(|issue| issue.is_fatal())
    }

    /// Bench players who may replace `outgoing`: not already on the line and
    /// of the same gender, so the quota cannot change.
    pub fn replacement_candidates<'a>(
        &self,
        roster: &'a [Player],
        outgoing: &PlayerId,
    ) -> Vec<&'a Player> {
        let Some(out) = self.line.iter().find(|p| &p.id == outgoing) else {
            return Vec::new();
        };
        roster
            .iter()
            .filter(|p| p.gender == out.gender && !self.contains(&p.id))
            .collect()
    }

    /// Replace one line member and re-validate.
    pub fn swap(&mut self, outgoing: &PlayerId, incoming: &Player) -> EngineResult<Option<LineIssue>> {
        let slot = self
            .line
            .iter()
            .position(|p| &p.id == outgoing)
            .ok_or_else(|| EngineError::NotOnLine(outgoing.clone()))?;
        if self.contains(&incoming.id) {
            return Err(EngineError::AlreadyOnLine(incoming.name.clone()));
        }
        let out = &self.line[slot];
        if out.gender != incoming.gender {
            return Err(EngineError::GenderMismatch {
                outgoing: out.name.clone(),
                incoming: incoming.name.clone(),
            });
        }
        debug!("point {}: swap {} -> {}", self.point_number, out.name, incoming.name);
        self.line[slot] = incoming.clone();
        Ok(self.issue())
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.line.iter().any(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deep_flex, player, seven_flex};
    use crate::rotation::abba_info;
    use crate::{LinePreference, Outcome};

    fn quota_4_3() -> GenderQuota {
        GenderQuota { mmp: 4, fmp: 3 }
    }

    fn played(number: u16, line: Vec<Player>) -> Point {
        let mut point = Point::new(number, Side::Offense);
        point.line = line;
        point.outcome = Outcome::OpponentScore;
        point
    }

    #[test]
    fn empty_line_lacks_eligible_players() {
        assert_eq!(validate_line(&[], quota_4_3()), Some(LineIssue::NoEligiblePlayers));
        assert_eq!(
            LineIssue::NoEligiblePlayers.to_string(),
            "Fatal: Roster lacks eligible players."
        );
    }

    #[test]
    fn clean_line_has_no_issue() {
        assert_eq!(validate_line(&seven_flex(), quota_4_3()), None);
    }

    #[test]
    fn size_is_checked_before_ratio() {
        let mut line = seven_flex();
        line.pop();
        line.pop();
        assert_eq!(
            validate_line(&line, quota_4_3()),
            Some(LineIssue::WrongSize { found: 5 })
        );
    }

    #[test]
    fn ratio_is_checked_before_handlers() {
        let line = seven_flex();
        let issue = validate_line(&line, GenderQuota { mmp: 3, fmp: 4 });
        assert_eq!(
            issue,
            Some(LineIssue::GenderRatio { required_mmp: 3, found_mmp: 4 })
        );
        assert!(issue.is_some_and(|i| i.is_fatal()));
    }

    #[test]
    fn handler_shortfall_is_only_a_warning() {
        let mut line = seven_flex();
        line[0].role = Role::Cutter;
        let issue = validate_line(&line, quota_4_3());
        assert_eq!(issue, Some(LineIssue::FewHandlers { found: 2 }));
        assert!(issue.is_some_and(|i| i.is_warning()));
    }

    #[test]
    fn validation_is_deterministic() {
        let line = seven_flex();
        let first = validate_line(&line[..6], quota_4_3());
        for _ in 0..5 {
            assert_eq!(validate_line(&line[..6], quota_4_3()), first);
        }
    }

    #[test]
    fn suggestion_meets_the_quota() {
        let roster = seven_flex();
        let line = suggest_line(&roster, Side::Offense, quota_4_3(), &[]).unwrap();
        assert_eq!(line.len(), 7);
        assert_eq!(line.iter().filter(|p| p.gender == Gender::Mmp).count(), 4);
        assert_eq!(line.iter().filter(|p| p.gender == Gender::Fmp).count(), 3);
        assert_eq!(validate_line(&line, quota_4_3()), None);
    }

    #[test]
    fn ineligible_side_is_excluded() {
        let mut roster = deep_flex(5);
        for p in roster.iter_mut().filter(|p| p.gender == Gender::Mmp).take(2) {
            p.line = LinePreference::Defense;
        }
        let line = suggest_line(&roster, Side::Offense, quota_4_3(), &[]).unwrap();
        assert!(line.iter().all(|p| p.is_eligible_for(Side::Offense)));
    }

    #[test]
    fn short_pool_is_reported() {
        let mut roster = seven_flex();
        roster[6].line = LinePreference::Defense;
        assert_eq!(
            suggest_line(&roster, Side::Offense, quota_4_3(), &[]),
            Err(LineIssue::ShortPool { quota: quota_4_3() })
        );
        assert_eq!(
            LineIssue::ShortPool { quota: quota_4_3() }.to_string(),
            "Fatal: Roster lacks players for 4 MMPs & 3 FMPs."
        );
    }

    #[test]
    fn least_played_are_picked_first_with_roster_order_ties() {
        let roster = vec![
            player("m1", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("m2", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("m3", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("m4", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("m5", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("f1", Gender::Fmp, LinePreference::Flex, Role::Handler),
            player("f2", Gender::Fmp, LinePreference::Flex, Role::Handler),
            player("f3", Gender::Fmp, LinePreference::Flex, Role::Handler),
        ];
        let history = vec![played(1, vec![roster[0].clone()])];
        let line = suggest_line(&roster, Side::Offense, quota_4_3(), &history).unwrap();
        let ids: Vec<&str> = line.iter().map(|p| p.id.as_str()).collect();
        // handlers first, then cutters in least-played / roster order
        assert_eq!(ids, vec!["f1", "f2", "f3", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn role_allocation_order_is_pinned() {
        let pool_players = vec![
            player("m1", Gender::Mmp, LinePreference::Flex, Role::Hybrid),
            player("m2", Gender::Mmp, LinePreference::Flex, Role::Cutter),
            player("m3", Gender::Mmp, LinePreference::Flex, Role::Handler),
            player("m4", Gender::Mmp, LinePreference::Flex, Role::Hybrid),
            player("f1", Gender::Fmp, LinePreference::Flex, Role::Cutter),
            player("f2", Gender::Fmp, LinePreference::Flex, Role::Handler),
            player("f3", Gender::Fmp, LinePreference::Flex, Role::Cutter),
        ];
        let pool: Vec<&Player> = pool_players.iter().collect();
        let ids: Vec<String> = allocate_roles(&pool).into_iter().map(|p| p.id.0).collect();
        // 2 handlers, 1 hybrid to reach 3, all cutters, then the spare hybrid
        assert_eq!(ids, vec!["m3", "f2", "m1", "m2", "f1", "f3", "m4"]);
    }

    #[test]
    fn surplus_handlers_still_fill_the_line() {
        let pool_players = vec![
            player("m1", Gender::Mmp, LinePreference::Flex, Role::Handler),
            player("m2", Gender::Mmp, LinePreference::Flex, Role::Handler),
            player("m3", Gender::Mmp, LinePreference::Flex, Role::Handler),
            player("m4", Gender::Mmp, LinePreference::Flex, Role::Handler),
            player("f1", Gender::Fmp, LinePreference::Flex, Role::Handler),
            player("f2", Gender::Fmp, LinePreference::Flex, Role::Cutter),
            player("f3", Gender::Fmp, LinePreference::Flex, Role::Cutter),
        ];
        let pool: Vec<&Player> = pool_players.iter().collect();
        let line = allocate_roles(&pool);
        assert_eq!(line.len(), 7);
        assert_eq!(validate_line(&line, quota_4_3()), None);
    }

    #[test]
    fn rotation_keeps_play_counts_within_one() {
        let roster = deep_flex(9);
        let mut points: Vec<Point> = Vec::new();
        for n in 1..=30u16 {
            let abba = abba_info(n, Gender::Mmp);
            let line = suggest_line(&roster, Side::Offense, abba.quota, &points).unwrap();
            points.push(played(n, line));

            for gender in [Gender::Mmp, Gender::Fmp] {
                let counts: Vec<usize> = roster
                    .iter()
                    .filter(|p| p.gender == gender)
                    .map(|p| play_count(&p.id, &points))
                    .collect();
                let max = counts.iter().max().copied().unwrap_or(0);
                let min = counts.iter().min().copied().unwrap_or(0);
                assert!(max - min <= 1, "point {n}: {gender} counts {counts:?}");
            }
        }
    }

    #[test]
    fn swap_requires_matching_gender() {
        let mut roster = seven_flex();
        roster.push(player("m5", Gender::Mmp, LinePreference::Flex, Role::Handler));
        roster.push(player("f4", Gender::Fmp, LinePreference::Flex, Role::Handler));
        let mut draft = LineDraft::suggest(1, Side::Offense, quota_4_3(), &roster, &[]);
        let outgoing = PlayerId::from("m2");

        let candidates: Vec<&str> = draft
            .replacement_candidates(&roster, &outgoing)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(candidates, vec!["m5"]);

        let err = draft.swap(&outgoing, &roster[8]).unwrap_err();
        assert!(matches!(err, EngineError::GenderMismatch { .. }));

        assert_eq!(draft.swap(&outgoing, &roster[7]), Ok(None));
        assert!(draft.contains(&PlayerId::from("m5")));
        assert!(!draft.contains(&outgoing));
    }

    #[test]
    fn swap_revalidates_handlers() {
        let mut roster = seven_flex();
        roster.push(player("m5", Gender::Mmp, LinePreference::Flex, Role::Cutter));
        let mut draft = LineDraft::suggest(1, Side::Offense, quota_4_3(), &roster, &[]);
        let issue = draft.swap(&PlayerId::from("m1"), &roster[7]).unwrap();
        assert_eq!(issue, Some(LineIssue::FewHandlers { found: 2 }));
        assert!(!draft.is_fatal());
    }

    #[test]
    fn swap_rejects_players_already_on_line() {
        let roster = seven_flex();
        let mut draft = LineDraft::suggest(1, Side::Offense, quota_4_3(), &roster, &[]);
        let err = draft.swap(&PlayerId::from("m1"), &roster[1]).unwrap_err();
        assert_eq!(err, EngineError::AlreadyOnLine("m2".to_string()));
    }

    #[test]
    fn short_draft_reports_the_shortage() {
        let roster = seven_flex();
        let draft = LineDraft::suggest(2, Side::Offense, GenderQuota { mmp: 3, fmp: 4 }, &roster, &[]);
        assert!(draft.line.is_empty());
        assert!(draft.is_fatal());
        assert!(draft.issue().is_some_and(|i| i.is_roster_shortage()));
    }
}
