// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unlocked achievement records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::AchievementId;

/// A (user, achievement) unlock. Append-only, at most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub user_id: u64,
    /// Catalog string ID (see `AchievementId::as_str`)
    pub achievement_id: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedAchievement {
    pub fn new(user_id: u64, id: AchievementId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            achievement_id: id.as_str().to_string(),
            unlocked_at: now,
        }
    }

    pub fn document_id(&self) -> String {
        format!("{}_{}", self.user_id, self.achievement_id)
    }

    /// Parsed catalog ID; `None` for entries retired from the catalog.
    pub fn id(&self) -> Option<AchievementId> {
        AchievementId::parse(&self.achievement_id)
    }
}
