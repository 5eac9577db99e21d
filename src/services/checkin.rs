// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in processing service.
//!
//! Handles the core workflow for one check-in:
//! 1. Load the user and the habit, and verify ownership
//! 2. Reject a second check-in for the same habit on the same day
//! 3. Advance the habit's streak
//! 4. Atomically store the check-in, streak and XP award
//! 5. Award any newly earned achievements (best-effort)

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

use crate::db::HabitStore;
use crate::error::{AppError, Result};
use crate::models::{CheckIn, Habit, Notification, NotificationKind, User};
use crate::progression::{Achievement, LevelUp, CHECKIN_XP};
use crate::services::achievements::{AchievementService, CheckInContext};

/// Everything the caller needs to render the result of a check-in.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    /// Habit with updated streak fields
    pub habit: Habit,
    /// User after the XP award
    pub user: User,
    pub level_up: Option<LevelUp>,
    /// Achievements unlocked by this check-in (possibly empty)
    pub awarded: Vec<&'static Achievement>,
}

#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn HabitStore>,
    achievements: AchievementService,
}

impl CheckInService {
    pub fn new(store: Arc<dyn HabitStore>, achievements: AchievementService) -> Self {
        Self {
            store,
            achievements,
        }
    }

    /// Submit today's check-in for a habit.
    ///
    /// `local_now` is the server-local wall-clock time of the request; its
    /// date is the check-in day. `now` is the same instant in UTC and is
    /// used for stored timestamps.
    pub async fn submit_check_in(
        &self,
        user_id: u64,
        habit_id: &str,
        content: &str,
        local_now: NaiveDateTime,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome> {
        let today = local_now.date();
        tracing::info!(user_id, habit_id, %today, "Processing check-in");

        if self.store.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let mut habit = self
            .store
            .get_habit(habit_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit_id)))?;

        if habit.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "Habit {} belongs to another user",
                habit_id
            )));
        }

        let duplicate = || AppError::DuplicateCheckIn {
            habit_id: habit_id.to_string(),
            date: today,
        };

        // Early exit; the store's uniqueness constraint is the real guard.
        let check_in_id = CheckIn::document_id(user_id, habit_id, today);
        if self.store.get_check_in(&check_in_id).await?.is_some() {
            tracing::debug!(user_id, habit_id, "Duplicate check-in rejected early");
            return Err(duplicate());
        }

        let streak = habit.streak().advance(today).map_err(|e| {
            tracing::warn!(user_id, habit_id, error = %e, "Check-in not after last check-in");
            duplicate()
        })?;
        habit.set_streak(streak);

        let check_in = CheckIn {
            id: check_in_id,
            user_id,
            habit_id: habit.id.clone(),
            habit_title: habit.title.clone(),
            content: content.to_string(),
            checkin_date: today,
            created_at: now,
        };

        let update = self
            .store
            .commit_check_in(&check_in, &habit, CHECKIN_XP)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => {
                    tracing::info!(user_id, habit_id, "Concurrent duplicate check-in rejected");
                    duplicate()
                }
                other => other,
            })?;

        tracing::info!(
            user_id,
            habit_id,
            current_streak = habit.current_streak,
            longest_streak = habit.longest_streak,
            experience_points = update.user.experience_points,
            level = update.user.level,
            "Check-in recorded"
        );

        if let Some(level_up) = update.level_up {
            self.notify_level_up(user_id, level_up, now).await;
        }

        let context = CheckInContext {
            current_streak: habit.current_streak,
            local_time: local_now.time(),
        };
        let awarded = self
            .achievements
            .evaluate_and_award(&update.user, Some(context), now)
            .await;

        Ok(CheckInOutcome {
            check_in,
            habit,
            user: update.user,
            level_up: update.level_up,
            awarded,
        })
    }

    async fn notify_level_up(&self, user_id: u64, level_up: LevelUp, now: DateTime<Utc>) {
        let notification = Notification::new(
            user_id,
            NotificationKind::LevelUp,
            format!("You reached level {}!", level_up.new_level),
            now,
        );
        if let Err(e) = self.store.create_notification(&notification).await {
            tracing::warn!(user_id, error = %e, "Failed to create level-up notification");
        }
    }
}
