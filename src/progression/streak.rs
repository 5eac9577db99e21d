// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily streak calculation for a single habit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streak fields carried on a habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_checkin_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreakError {
    /// "Today" is not strictly after the last check-in (same day or clock skew).
    #[error("check-in date {today} is not after last check-in {last}")]
    NotAfterLastCheckIn { last: NaiveDate, today: NaiveDate },
}

impl StreakState {
    /// Apply a check-in on `today` and return the updated state.
    ///
    /// Checking in the day after the last check-in extends the streak; any
    /// gap of one or more missed days restarts it at 1.
    pub fn advance(self, today: NaiveDate) -> Result<Self, StreakError> {
        debug_assert!(
            self.longest >= self.current,
            "longest streak {} below current streak {}",
            self.longest,
            self.current
        );

        let current = match self.last_checkin_date {
            None => 1,
            Some(last) => match (today - last).num_days() {
                days if days <= 0 => {
                    return Err(StreakError::NotAfterLastCheckIn { last, today });
                }
                1 => self.current.saturating_add(1),
                _ => 1,
            },
        };

        Ok(Self {
            current,
            longest: self.longest.max(current),
            last_checkin_date: Some(today),
        })
    }
}
