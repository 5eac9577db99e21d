// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in and like records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One accepted check-in. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    /// `{user_id}_{habit_id}_{date}`, so a second check-in on the same day
    /// collides at the storage layer.
    pub id: String,
    pub user_id: u64,
    pub habit_id: String,
    /// Habit title at check-in time (the feed outlives habit deletion)
    pub habit_title: String,
    pub content: String,
    /// Server-local calendar day of the check-in
    pub checkin_date: NaiveDate,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CheckIn {
    pub fn document_id(user_id: u64, habit_id: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", user_id, habit_id, date.format("%Y-%m-%d"))
    }
}

/// A user's like on a check-in. At most one per (user, check-in).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub check_in_id: String,
    /// User who liked
    pub user_id: u64,
    /// Author of the liked check-in
    pub author_id: u64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.check_in_id, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_per_day() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();

        assert_eq!(CheckIn::document_id(7, "abc", d1), "7_abc_2024-01-05");
        assert_ne!(
            CheckIn::document_id(7, "abc", d1),
            CheckIn::document_id(7, "abc", d2)
        );
    }
}
