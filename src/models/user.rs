// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::{level_for_xp, LevelProgress, LevelUp};

/// User profile and progression state stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID from the session token (also used as document ID)
    pub user_id: u64,
    pub username: String,
    pub display_name: String,
    /// Cumulative XP, never decreases
    #[serde(default)]
    pub experience_points: u64,
    /// Always `level_for_xp(experience_points)`
    #[serde(default = "default_level")]
    pub level: u32,
    /// Lifetime accepted check-ins
    #[serde(default)]
    pub total_checkins: u64,
    /// Lifetime likes given to other check-ins
    #[serde(default)]
    pub likes_given: u64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_level() -> u32 {
    1
}

impl User {
    /// A fresh user at level 1 with no XP.
    pub fn new(user_id: u64, username: &str, display_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            display_name: display_name.to_string(),
            experience_points: 0,
            level: 1,
            total_checkins: 0,
            likes_given: 0,
            created_at: now,
        }
    }

    /// Add XP and recompute the level.
    pub fn award_xp(&mut self, amount: u64) -> Option<LevelUp> {
        let old_xp = self.experience_points;
        self.experience_points = old_xp.saturating_add(amount);
        self.level = level_for_xp(self.experience_points);
        LevelUp::between(old_xp, self.experience_points)
    }

    pub fn progress(&self) -> LevelProgress {
        LevelProgress::for_xp(self.experience_points)
    }
}
