// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `MemoryDb` wrapper that injects storage failures for service tests.

use async_trait::async_trait;

use super::{FeedCursor, HabitStore, MemoryDb, ProgressUpdate};
use crate::error::AppError;
use crate::models::{CheckIn, Habit, Like, Notification, UnlockedAchievement, User};
use crate::progression::AchievementId;

/// Which operations misbehave. Everything else goes straight to `inner`.
#[derive(Debug, Default)]
pub struct Faults {
    /// Unlock inserts that report a uniqueness conflict
    pub conflicting_unlocks: Vec<AchievementId>,
    /// Unlock inserts that fail with a database error
    pub failing_unlocks: Vec<AchievementId>,
    pub fail_list_unlocks: bool,
    /// `get_check_in` always reports "absent", as a racing request would see it
    pub hide_check_ins: bool,
    /// Served by `get_habit` in place of the stored habit, as read before
    /// a concurrent commit
    pub stale_habit: Option<Habit>,
    pub fail_count_likes: bool,
}

pub struct FaultyStore {
    pub inner: MemoryDb,
    faults: Faults,
}

impl FaultyStore {
    pub fn new(inner: MemoryDb, faults: Faults) -> Self {
        Self { inner, faults }
    }
}

fn injected(what: &str) -> AppError {
    AppError::Database(format!("injected failure: {}", what))
}

#[async_trait]
impl HabitStore for FaultyStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.inner.get_user(user_id).await
    }

    async fn upsert_user_profile(&self, user: &User) -> Result<User, AppError> {
        self.inner.upsert_user_profile(user).await
    }

    async fn award_xp(&self, user_id: u64, amount: u64) -> Result<ProgressUpdate, AppError> {
        self.inner.award_xp(user_id, amount).await
    }

    async fn top_users(&self, limit: u32) -> Result<Vec<User>, AppError> {
        self.inner.top_users(limit).await
    }

    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>, AppError> {
        if let Some(stale) = self.faults.stale_habit.as_ref().filter(|h| h.id == habit_id) {
            return Ok(Some(stale.clone()));
        }
        self.inner.get_habit(habit_id).await
    }

    async fn list_habits(&self, user_id: u64) -> Result<Vec<Habit>, AppError> {
        self.inner.list_habits(user_id).await
    }

    async fn create_habit(&self, habit: &Habit) -> Result<(), AppError> {
        self.inner.create_habit(habit).await
    }

    async fn update_habit_details(&self, habit: &Habit) -> Result<(), AppError> {
        self.inner.update_habit_details(habit).await
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError> {
        self.inner.delete_habit(habit_id).await
    }

    async fn get_check_in(&self, check_in_id: &str) -> Result<Option<CheckIn>, AppError> {
        if self.faults.hide_check_ins {
            return Ok(None);
        }
        self.inner.get_check_in(check_in_id).await
    }

    async fn commit_check_in(
        &self,
        check_in: &CheckIn,
        habit: &Habit,
        xp: u64,
    ) -> Result<ProgressUpdate, AppError> {
        self.inner.commit_check_in(check_in, habit, xp).await
    }

    async fn list_check_ins_for_habit(
        &self,
        habit_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.inner.list_check_ins_for_habit(habit_id, limit).await
    }

    async fn recent_check_ins(
        &self,
        cursor: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.inner.recent_check_ins(cursor, limit).await
    }

    async fn commit_like(&self, like: &Like) -> Result<User, AppError> {
        self.inner.commit_like(like).await
    }

    async fn count_likes(&self, check_in_id: &str) -> Result<u64, AppError> {
        if self.faults.fail_count_likes {
            return Err(injected("count_likes"));
        }
        self.inner.count_likes(check_in_id).await
    }

    async fn list_unlocked_achievements(
        &self,
        user_id: u64,
    ) -> Result<Vec<UnlockedAchievement>, AppError> {
        if self.faults.fail_list_unlocks {
            return Err(injected("list_unlocked_achievements"));
        }
        self.inner.list_unlocked_achievements(user_id).await
    }

    async fn insert_unlocked_achievement(
        &self,
        unlock: &UnlockedAchievement,
    ) -> Result<(), AppError> {
        if let Some(id) = unlock.id() {
            if self.faults.conflicting_unlocks.contains(&id) {
                return Err(AppError::Conflict(format!(
                    "{} already unlocked",
                    unlock.document_id()
                )));
            }
            if self.faults.failing_unlocks.contains(&id) {
                return Err(injected("insert_unlocked_achievement"));
            }
        }
        self.inner.insert_unlocked_achievement(unlock).await
    }

    async fn create_notification(&self, notification: &Notification) -> Result<(), AppError> {
        self.inner.create_notification(notification).await
    }

    async fn list_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError> {
        self.inner.list_notifications(user_id, limit).await
    }

    async fn mark_notification_read(
        &self,
        user_id: u64,
        notification_id: &str,
    ) -> Result<bool, AppError> {
        self.inner
            .mark_notification_read(user_id, notification_id)
            .await
    }

    async fn mark_all_notifications_read(&self, user_id: u64) -> Result<usize, AppError> {
        self.inner.mark_all_notifications_read(user_id).await
    }
}
