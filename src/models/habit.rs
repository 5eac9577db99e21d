// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::StreakState;

/// A habit owned by one user.
///
/// Streak fields are written only by the check-in flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Random UUID (also used as document ID)
    pub id: String,
    /// Owner
    pub user_id: u64,
    pub title: String,
    pub category: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub last_checkin_date: Option<NaiveDate>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(
        user_id: u64,
        title: &str,
        category: &str,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title: title.to_string(),
            category: category.to_string(),
            start_date,
            current_streak: 0,
            longest_streak: 0,
            last_checkin_date: None,
            created_at: now,
        }
    }

    pub fn streak(&self) -> StreakState {
        StreakState {
            current: self.current_streak,
            longest: self.longest_streak,
            last_checkin_date: self.last_checkin_date,
        }
    }

    pub fn set_streak(&mut self, streak: StreakState) {
        self.current_streak = streak.current;
        self.longest_streak = streak.longest;
        self.last_checkin_date = streak.last_checkin_date;
    }
}
