//! ABBA gender-ratio rotation.
//!
//! Points run in cycles of four. Within a cycle the configured majority
//! gender ("A") leads positions 1 and 4 and the other gender ("B") leads
//! positions 2 and 3, walking the fixed sequence `A2, B1, B2, A1`.

use crate::{Gender, LINE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Players of each gender a line must field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderQuota {
    pub mmp: usize,
    pub fmp: usize,
}

impl GenderQuota {
    /// Four of the leading gender, three of the other.
    pub fn led_by(gender: Gender) -> Self {
        let lead = LINE_SIZE.div_ceil(2);
        let rest = LINE_SIZE - lead;
        match gender {
            Gender::Mmp => Self { mmp: lead, fmp: rest },
            Gender::Fmp => Self { mmp: rest, fmp: lead },
        }
    }

    pub fn required(&self, gender: Gender) -> usize {
        match gender {
            Gender::Mmp => self.mmp,
            Gender::Fmp => self.fmp,
        }
    }

    pub fn total(&self) -> usize {
        self.mmp + self.fmp
    }
}

impl fmt::Display for GenderQuota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MMPs & {} FMPs", self.mmp, self.fmp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbbaLetter {
    A,
    B,
}

/// Derived per-point rotation info. Never persisted: always recomputed from
/// the point number and the game's majority gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbbaInfo {
    pub letter: AbbaLetter,
    /// 1 or 2: which instance of the letter inside the cycle.
    pub instance: u8,
    /// The gender leading this point.
    pub majority_gender: Gender,
    pub quota: GenderQuota,
}

impl AbbaInfo {
    /// e.g. "MMP 2"
    pub fn label(&self) -> String {
        format!("{} {}", self.majority_gender, self.instance)
    }

    pub fn required_mmp(&self) -> usize {
        self.quota.mmp
    }

    pub fn required_fmp(&self) -> usize {
        self.quota.fmp
    }
}

const CYCLE: [(AbbaLetter, u8); 4] = [
    (AbbaLetter::A, 2),
    (AbbaLetter::B, 1),
    (AbbaLetter::B, 2),
    (AbbaLetter::A, 1),
];

/// Rotation info for a 1-based point number. Point 0 is treated as point 1.
pub fn abba_info(point_number: u16, a_gender: Gender) -> AbbaInfo {
    let position = (usize::from(point_number.max(1)) - 1) % CYCLE.len();
    let (letter, instance) = CYCLE[position];
    let majority_gender = match letter {
        AbbaLetter::A => a_gender,
        AbbaLetter::B => a_gender.other(),
    };
    AbbaInfo {
        letter,
        instance,
        majority_gender,
        quota: GenderQuota::led_by(majority_gender),
    }
}
