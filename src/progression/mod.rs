// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progression rules: streaks, the XP level curve, and achievements.
//!
//! Everything in here is pure and synchronous. Callers supply "today" and
//! the user's current state; persistence lives in the services layer.

pub mod achievements;
pub mod level;
pub mod streak;

pub use achievements::{Achievement, AchievementId, ProgressSnapshot, ACHIEVEMENTS, CATALOG_VERSION};
pub use level::{level_for_xp, xp_for_next_level, LevelProgress, LevelUp};
pub use streak::{StreakError, StreakState};

/// XP awarded for each accepted check-in.
pub const CHECKIN_XP: u64 = 10;

/// XP awarded to a check-in's author when another user likes it.
pub const LIKE_RECEIVED_XP: u64 = 5;
