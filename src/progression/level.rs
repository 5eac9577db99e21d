// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! XP and level curve.
//!
//! Levels 1-9 follow a fixed doubling table; from level 10 on every level
//! costs a flat [`XP_PER_LEVEL_AFTER_TABLE`].

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// XP at which levels 2 through 10 begin.
const LEVEL_THRESHOLDS: [u64; 9] = [80, 200, 400, 800, 1600, 3200, 6400, 12800, 25600];

/// XP required per level once past the fixed table.
const XP_PER_LEVEL_AFTER_TABLE: u64 = 51_200;

/// Level reached at the last table threshold.
const FIRST_OPEN_LEVEL: u32 = LEVEL_THRESHOLDS.len() as u32 + 1;

/// Map cumulative XP to a level (always ≥ 1).
pub fn level_for_xp(xp: u64) -> u32 {
    let table_top = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
    if xp < table_top {
        // Number of thresholds already crossed, plus the base level.
        return LEVEL_THRESHOLDS.iter().take_while(|&&t| xp >= t).count() as u32 + 1;
    }

    let extra = (xp - table_top) / XP_PER_LEVEL_AFTER_TABLE;
    FIRST_OPEN_LEVEL.saturating_add(u32::try_from(extra).unwrap_or(u32::MAX))
}

/// XP threshold at which `level + 1` begins.
pub fn xp_for_next_level(level: u32) -> u64 {
    let level = level.max(1);
    if level < FIRST_OPEN_LEVEL {
        return LEVEL_THRESHOLDS[(level - 1) as usize];
    }

    let table_top = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
    let open_levels = u64::from(level - FIRST_OPEN_LEVEL + 1);
    table_top.saturating_add(open_levels.saturating_mul(XP_PER_LEVEL_AFTER_TABLE))
}

/// XP threshold at which `level` itself begins.
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        0
    } else {
        xp_for_next_level(level - 1)
    }
}

/// A level transition caused by an XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
}

impl LevelUp {
    /// Compare levels before and after an award.
    pub fn between(old_xp: u64, new_xp: u64) -> Option<Self> {
        let old_level = level_for_xp(old_xp);
        let new_level = level_for_xp(new_xp);
        (new_level > old_level).then_some(Self {
            old_level,
            new_level,
        })
    }
}

/// Progress-bar view of a user's XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelProgress {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub experience_points: u64,
    pub level: u32,
    /// XP at which the current level began
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub level_floor_xp: u64,
    /// XP at which the next level begins
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub next_level_xp: u64,
}

impl LevelProgress {
    pub fn for_xp(xp: u64) -> Self {
        let level = level_for_xp(xp);
        Self {
            experience_points: xp,
            level,
            level_floor_xp: xp_for_level(level),
            next_level_xp: xp_for_next_level(level),
        }
    }
}
