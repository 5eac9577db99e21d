// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement awarding.
//!
//! Runs after check-ins, habit creation and likes. Nothing here fails the
//! surrounding request: storage errors are logged and the affected
//! achievement is simply not reported this time.

use chrono::{DateTime, NaiveTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::HabitStore;
use crate::models::{Notification, NotificationKind, UnlockedAchievement, User};
use crate::progression::achievements::evaluate;
use crate::progression::{Achievement, AchievementId, ProgressSnapshot};

/// Check-in details that feed streak and time-of-day conditions.
#[derive(Debug, Clone, Copy)]
pub struct CheckInContext {
    pub current_streak: u32,
    pub local_time: NaiveTime,
}

#[derive(Clone)]
pub struct AchievementService {
    store: Arc<dyn HabitStore>,
}

impl AchievementService {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }

    /// IDs the user has unlocked, ignoring entries no longer in the catalog.
    pub async fn unlocked_ids(&self, user_id: u64) -> crate::error::Result<HashSet<AchievementId>> {
        Ok(self
            .store
            .list_unlocked_achievements(user_id)
            .await?
            .iter()
            .filter_map(UnlockedAchievement::id)
            .collect())
    }

    /// Evaluate the catalog against `user`'s current state and record
    /// first-time unlocks. Returns the achievements newly unlocked by this call.
    pub async fn evaluate_and_award(
        &self,
        user: &User,
        check_in: Option<CheckInContext>,
        now: DateTime<Utc>,
    ) -> Vec<&'static Achievement> {
        let habit_count = match self.store.list_habits(user.user_id).await {
            Ok(habits) => habits.len() as u64,
            Err(e) => {
                tracing::warn!(user_id = user.user_id, error = %e, "Failed to count habits for achievements");
                0
            }
        };

        let snapshot = ProgressSnapshot {
            current_streak: check_in.map(|c| c.current_streak).unwrap_or(0),
            total_checkins: user.total_checkins,
            level: user.level,
            habit_count,
            likes_given: user.likes_given,
            checkin_time: check_in.map(|c| c.local_time),
        };

        // Fast path only: the store's uniqueness check is authoritative.
        let already_unlocked = match self.unlocked_ids(user.user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(user_id = user.user_id, error = %e, "Failed to load unlocked achievements");
                HashSet::new()
            }
        };

        let mut awarded = Vec::new();
        for achievement in evaluate(&snapshot, &already_unlocked) {
            let unlock = UnlockedAchievement::new(user.user_id, achievement.id, now);
            match self.store.insert_unlocked_achievement(&unlock).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = user.user_id,
                        achievement = achievement.id.as_str(),
                        "Achievement unlocked"
                    );
                    self.notify(user.user_id, achievement, now).await;
                    awarded.push(achievement);
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(
                        user_id = user.user_id,
                        achievement = achievement.id.as_str(),
                        "Achievement already unlocked by a concurrent request"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = user.user_id,
                        achievement = achievement.id.as_str(),
                        error = %e,
                        "Failed to record achievement unlock"
                    );
                }
            }
        }

        awarded
    }

    async fn notify(&self, user_id: u64, achievement: &Achievement, now: DateTime<Utc>) {
        let notification = Notification::new(
            user_id,
            NotificationKind::AchievementUnlocked,
            format!("Achievement unlocked: {}", achievement.name),
            now,
        );
        if let Err(e) = self.store.create_notification(&notification).await {
            tracing::warn!(user_id, error = %e, "Failed to create achievement notification");
        }
    }
}
