//! Per-player statistics derived from completed point logs.

use crate::game::Game;
use crate::{Gender, Outcome, Player, Role, Side};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub player: Player,
    pub points_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub offense_points: u32,
    pub holds: u32,
    pub defense_points: u32,
    pub breaks: u32,
}

impl PlayerStats {
    fn empty(player: &Player) -> Self {
        Self {
            player: player.clone(),
            points_played: 0,
            goals: 0,
            assists: 0,
            offense_points: 0,
            holds: 0,
            defense_points: 0,
            breaks: 0,
        }
    }

    /// Share of offensive points played that we scored. 0 with no offensive points.
    pub fn hold_pct(&self) -> f64 {
        percent(self.holds, self.offense_points)
    }

    pub fn break_pct(&self) -> f64 {
        percent(self.breaks, self.defense_points)
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole) * 100.0
}

/// Stats for every player in `pool`, in pool order. Only completed points
/// count.
pub fn compute<'a>(games: impl IntoIterator<Item = &'a Game>, pool: &[Player]) -> Vec<PlayerStats> {
    let mut stats: Vec<PlayerStats> = pool.iter().map(PlayerStats::empty).collect();
    for game in games {
        for point in game.points.iter().filter(|p| p.outcome.is_complete()) {
            let we_scored = point.outcome == Outcome::MoonlightScore;
            for entry in stats.iter_mut() {
                let id = &entry.player.id;
                if point.goal.as_ref() == Some(id) {
                    entry.goals += 1;
                }
                if point.assist.as_ref() == Some(id) {
                    entry.assists += 1;
                }
                if !point.has_on_line(id) {
                    continue;
                }
                entry.points_played += 1;
                match point.starting_side {
                    Side::Offense => {
                        entry.offense_points += 1;
                        entry.holds += u32::from(we_scored);
                    }
                    Side::Defense => {
                        entry.defense_points += 1;
                        entry.breaks += u32::from(we_scored);
                    }
                }
            }
        }
    }
    stats
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatsColumn {
    Name,
    #[default]
    PointsPlayed,
    Goals,
    Assists,
    HoldPct,
    BreakPct,
}

impl StatsColumn {
    pub const ALL: [StatsColumn; 6] = [
        StatsColumn::Name,
        StatsColumn::PointsPlayed,
        StatsColumn::Goals,
        StatsColumn::Assists,
        StatsColumn::HoldPct,
        StatsColumn::BreakPct,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatsColumn::Name => "Player",
            StatsColumn::PointsPlayed => "Pts",
            StatsColumn::Goals => "Goals",
            StatsColumn::Assists => "Assists",
            StatsColumn::HoldPct => "Hold %",
            StatsColumn::BreakPct => "Break %",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn compare(&self, a: &PlayerStats, b: &PlayerStats) -> Ordering {
        match self {
            StatsColumn::Name => a
                .player
                .name
                .to_lowercase()
                .cmp(&b.player.name.to_lowercase()),
            StatsColumn::PointsPlayed => a.points_played.cmp(&b.points_played),
            StatsColumn::Goals => a.goals.cmp(&b.goals),
            StatsColumn::Assists => a.assists.cmp(&b.assists),
            StatsColumn::HoldPct => a.hold_pct().total_cmp(&b.hold_pct()),
            StatsColumn::BreakPct => a.break_pct().total_cmp(&b.break_pct()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSort {
    pub column: StatsColumn,
    pub direction: SortDirection,
}

impl StatsSort {
    /// Re-selecting the active column flips the direction; a new column
    /// starts descending.
    pub fn select(&mut self, column: StatsColumn) {
        if self.column == column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }

    /// Stable: ties keep their incoming order in both directions.
    pub fn apply(&self, rows: &mut [PlayerStats]) {
        rows.sort_by(|a, b| {
            let ord = self.column.compare(a, b);
            match self.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
}

/// `None` means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsFilter {
    pub gender: Option<Gender>,
    pub role: Option<Role>,
}

impl StatsFilter {
    pub fn matches(&self, player: &Player) -> bool {
        self.gender.is_none_or(|g| g == player.gender) && self.role.is_none_or(|r| r == player.role)
    }

    /// All -> MMP -> FMP -> All
    pub fn cycle_gender(&mut self) {
        self.gender = match self.gender {
            None => Some(Gender::Mmp),
            Some(Gender::Mmp) => Some(Gender::Fmp),
            Some(Gender::Fmp) => None,
        };
    }

    /// All -> Handler -> Cutter -> Hybrid -> All
    pub fn cycle_role(&mut self) {
        self.role = match self.role {
            None => Some(Role::Handler),
            Some(Role::Handler) => Some(Role::Cutter),
            Some(Role::Cutter) => Some(Role::Hybrid),
            Some(Role::Hybrid) => None,
        };
    }

    pub fn gender_label(&self) -> &'static str {
        self.gender.map_or("All", |g| g.label())
    }

    pub fn role_label(&self) -> &'static str {
        self.role.map_or("All", |r| r.label())
    }
}

/// Filter then sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsQuery {
    pub filter: StatsFilter,
    pub sort: StatsSort,
}

impl StatsQuery {
    pub fn run<'a>(&self, games: impl IntoIterator<Item = &'a Game>, pool: &[Player]) -> Vec<PlayerStats> {
        let mut rows: Vec<PlayerStats> = compute(games, pool)
            .into_iter()
            .filter(|row| self.filter.matches(&row.player))
            .collect();
        self.sort.apply(&mut rows);
        rows
    }
}
