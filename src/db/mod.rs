// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`HabitStore`] is the storage contract the services depend on. Every
//! uniqueness rule (one check-in per user/habit/day, one unlock per
//! user/achievement, one like per user/check-in) is enforced here and
//! reported as [`AppError::Conflict`]; callers treat their own existence
//! checks as early exits only.

pub mod firestore;
pub mod memory;
#[cfg(test)]
pub mod testing;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{CheckIn, Habit, Like, Notification, UnlockedAchievement, User};
use crate::progression::LevelUp;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const HABITS: &str = "habits";
    pub const CHECKINS: &str = "checkins";
    pub const LIKES: &str = "likes";
    pub const UNLOCKED_ACHIEVEMENTS: &str = "unlocked_achievements";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Position in the community feed (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub check_in_id: String,
}

impl FeedCursor {
    pub fn for_check_in(check_in: &CheckIn) -> Self {
        Self {
            created_at: check_in.created_at,
            check_in_id: check_in.id.clone(),
        }
    }

    /// Whether `check_in` sorts strictly after this cursor in feed order.
    pub fn precedes(&self, check_in: &CheckIn) -> bool {
        (check_in.created_at, check_in.id.as_str()) < (self.created_at, self.check_in_id.as_str())
    }
}

/// User state after an atomic XP award.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// User after XP and counters were applied
    pub user: User,
    pub level_up: Option<LevelUp>,
}

#[async_trait]
pub trait HabitStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError>;

    /// Create or update profile fields. Progression fields of an existing
    /// user are left untouched.
    async fn upsert_user_profile(&self, user: &User) -> Result<User, AppError>;

    /// Atomically add XP to a user and recompute their level.
    async fn award_xp(&self, user_id: u64, amount: u64) -> Result<ProgressUpdate, AppError>;

    /// Users ordered by XP, highest first.
    async fn top_users(&self, limit: u32) -> Result<Vec<User>, AppError>;

    // ─── Habits ──────────────────────────────────────────────────

    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>, AppError>;

    async fn list_habits(&self, user_id: u64) -> Result<Vec<Habit>, AppError>;

    async fn create_habit(&self, habit: &Habit) -> Result<(), AppError>;

    /// Write title and category only; streak fields are not touched.
    async fn update_habit_details(&self, habit: &Habit) -> Result<(), AppError>;

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError>;

    // ─── Check-ins ───────────────────────────────────────────────

    async fn get_check_in(&self, check_in_id: &str) -> Result<Option<CheckIn>, AppError>;

    /// Atomically insert `check_in` (failing with `Conflict` if its ID
    /// exists), store the habit's new streak fields, and add `xp` plus one
    /// check-in to the owner.
    async fn commit_check_in(
        &self,
        check_in: &CheckIn,
        habit: &Habit,
        xp: u64,
    ) -> Result<ProgressUpdate, AppError>;

    /// Check-ins for one habit, newest first.
    async fn list_check_ins_for_habit(
        &self,
        habit_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError>;

    /// All users' check-ins, newest first, strictly after `cursor`.
    async fn recent_check_ins(
        &self,
        cursor: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError>;

    // ─── Likes ───────────────────────────────────────────────────

    /// Atomically insert `like` (failing with `Conflict` if the user already
    /// liked the check-in) and bump the liker's `likes_given`.
    async fn commit_like(&self, like: &Like) -> Result<User, AppError>;

    async fn count_likes(&self, check_in_id: &str) -> Result<u64, AppError>;

    // ─── Achievements ────────────────────────────────────────────

    async fn list_unlocked_achievements(
        &self,
        user_id: u64,
    ) -> Result<Vec<UnlockedAchievement>, AppError>;

    /// Insert an unlock, failing with `Conflict` if the pair exists.
    async fn insert_unlocked_achievement(
        &self,
        unlock: &UnlockedAchievement,
    ) -> Result<(), AppError>;

    // ─── Notifications ───────────────────────────────────────────

    async fn create_notification(&self, notification: &Notification) -> Result<(), AppError>;

    /// Notifications for a user, newest first.
    async fn list_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError>;

    /// Returns `false` if no such notification belongs to the user.
    async fn mark_notification_read(
        &self,
        user_id: u64,
        notification_id: &str,
    ) -> Result<bool, AppError>;

    /// Returns the number of notifications changed.
    async fn mark_all_notifications_read(&self, user_id: u64) -> Result<usize, AppError>;
}
