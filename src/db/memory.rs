// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! Uniqueness is enforced with `DashMap::entry`, which holds the shard lock
//! between the existence check and the insert. When several maps are locked
//! at once they are always taken in the order check-ins/likes, habits, users.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use super::{FeedCursor, HabitStore, ProgressUpdate};
use crate::error::AppError;
use crate::models::{CheckIn, Habit, Like, Notification, UnlockedAchievement, User};
use crate::progression::LevelUp;

#[derive(Default)]
struct Tables {
    users: DashMap<u64, User>,
    habits: DashMap<String, Habit>,
    check_ins: DashMap<String, CheckIn>,
    likes: DashMap<String, Like>,
    unlocked: DashMap<String, UnlockedAchievement>,
    notifications: DashMap<String, Notification>,
}

/// Process-local `HabitStore`. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_not_found(user_id: u64) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, String)) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
}

#[async_trait]
impl HabitStore for MemoryDb {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        Ok(self.tables.users.get(&user_id).map(|u| u.clone()))
    }

    async fn upsert_user_profile(&self, user: &User) -> Result<User, AppError> {
        let mut entry = self
            .tables
            .users
            .entry(user.user_id)
            .or_insert_with(|| user.clone());
        entry.username = user.username.clone();
        entry.display_name = user.display_name.clone();
        Ok(entry.clone())
    }

    async fn award_xp(&self, user_id: u64, amount: u64) -> Result<ProgressUpdate, AppError> {
        let mut user = self
            .tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        let level_up = user.award_xp(amount);
        Ok(ProgressUpdate {
            user: user.clone(),
            level_up,
        })
    }

    async fn top_users(&self, limit: u32) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.tables.users.iter().map(|u| u.clone()).collect();
        users.sort_by(|a, b| {
            b.experience_points
                .cmp(&a.experience_points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>, AppError> {
        Ok(self.tables.habits.get(habit_id).map(|h| h.clone()))
    }

    async fn list_habits(&self, user_id: u64) -> Result<Vec<Habit>, AppError> {
        let mut habits: Vec<Habit> = self
            .tables
            .habits
            .iter()
            .filter(|h| h.user_id == user_id)
            .map(|h| h.clone())
            .collect();
        habits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(habits)
    }

    async fn create_habit(&self, habit: &Habit) -> Result<(), AppError> {
        match self.tables.habits.entry(habit.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Habit {} already exists",
                habit.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(habit.clone());
                Ok(())
            }
        }
    }

    async fn update_habit_details(&self, habit: &Habit) -> Result<(), AppError> {
        let mut stored = self
            .tables
            .habits
            .get_mut(&habit.id)
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit.id)))?;
        stored.title = habit.title.clone();
        stored.category = habit.category.clone();
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError> {
        self.tables.habits.remove(habit_id);
        Ok(())
    }

    async fn get_check_in(&self, check_in_id: &str) -> Result<Option<CheckIn>, AppError> {
        Ok(self.tables.check_ins.get(check_in_id).map(|c| c.clone()))
    }

    async fn commit_check_in(
        &self,
        check_in: &CheckIn,
        habit: &Habit,
        xp: u64,
    ) -> Result<ProgressUpdate, AppError> {
        let slot = match self.tables.check_ins.entry(check_in.id.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "Check-in {} already exists",
                    check_in.id
                )))
            }
            Entry::Vacant(slot) => slot,
        };

        let mut stored_habit = self
            .tables
            .habits
            .get_mut(&habit.id)
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit.id)))?;
        let mut user = self
            .tables
            .users
            .get_mut(&check_in.user_id)
            .ok_or_else(|| user_not_found(check_in.user_id))?;

        stored_habit.set_streak(habit.streak());
        let level_up: Option<LevelUp> = user.award_xp(xp);
        user.total_checkins += 1;
        slot.insert(check_in.clone());

        Ok(ProgressUpdate {
            user: user.clone(),
            level_up,
        })
    }

    async fn list_check_ins_for_habit(
        &self,
        habit_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let mut check_ins: Vec<CheckIn> = self
            .tables
            .check_ins
            .iter()
            .filter(|c| c.habit_id == habit_id)
            .map(|c| c.clone())
            .collect();
        newest_first(&mut check_ins, |c| (c.created_at, c.id.clone()));
        check_ins.truncate(limit as usize);
        Ok(check_ins)
    }

    async fn recent_check_ins(
        &self,
        cursor: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let mut check_ins: Vec<CheckIn> = self
            .tables
            .check_ins
            .iter()
            .filter(|c| cursor.as_ref().map_or(true, |cur| cur.precedes(c)))
            .map(|c| c.clone())
            .collect();
        newest_first(&mut check_ins, |c| (c.created_at, c.id.clone()));
        check_ins.truncate(limit as usize);
        Ok(check_ins)
    }

    async fn commit_like(&self, like: &Like) -> Result<User, AppError> {
        let slot = match self.tables.likes.entry(like.document_id()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "User {} already liked check-in {}",
                    like.user_id, like.check_in_id
                )))
            }
            Entry::Vacant(slot) => slot,
        };

        let mut liker = self
            .tables
            .users
            .get_mut(&like.user_id)
            .ok_or_else(|| user_not_found(like.user_id))?;
        liker.likes_given += 1;
        slot.insert(like.clone());

        Ok(liker.clone())
    }

    async fn count_likes(&self, check_in_id: &str) -> Result<u64, AppError> {
        Ok(self
            .tables
            .likes
            .iter()
            .filter(|l| l.check_in_id == check_in_id)
            .count() as u64)
    }

    async fn list_unlocked_achievements(
        &self,
        user_id: u64,
    ) -> Result<Vec<UnlockedAchievement>, AppError> {
        let mut unlocked: Vec<UnlockedAchievement> = self
            .tables
            .unlocked
            .iter()
            .filter(|u| u.user_id == user_id)
            .map(|u| u.clone())
            .collect();
        unlocked.sort_by(|a, b| a.unlocked_at.cmp(&b.unlocked_at));
        Ok(unlocked)
    }

    async fn insert_unlocked_achievement(
        &self,
        unlock: &UnlockedAchievement,
    ) -> Result<(), AppError> {
        match self.tables.unlocked.entry(unlock.document_id()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Achievement {} already unlocked for user {}",
                unlock.achievement_id, unlock.user_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(unlock.clone());
                Ok(())
            }
        }
    }

    async fn create_notification(&self, notification: &Notification) -> Result<(), AppError> {
        self.tables
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError> {
        let mut notifications: Vec<Notification> = self
            .tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.clone())
            .collect();
        newest_first(&mut notifications, |n| (n.created_at, n.id.clone()));
        notifications.truncate(limit as usize);
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: u64,
        notification_id: &str,
    ) -> Result<bool, AppError> {
        match self.tables.notifications.get_mut(notification_id) {
            Some(mut n) if n.user_id == user_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: u64) -> Result<usize, AppError> {
        let mut changed = 0;
        for mut n in self.tables.notifications.iter_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    async fn seeded() -> (MemoryDb, Habit) {
        let db = MemoryDb::new();
        let now = Utc::now();
        db.upsert_user_profile(&User::new(1, "ada", "Ada", now))
            .await
            .unwrap();
        let habit = Habit::new(1, "Read", "learning", now.date_naive(), now);
        db.create_habit(&habit).await.unwrap();
        (db, habit)
    }

    fn check_in_for(habit: &Habit, date: NaiveDate) -> CheckIn {
        CheckIn {
            id: CheckIn::document_id(habit.user_id, &habit.id, date),
            user_id: habit.user_id,
            habit_id: habit.id.clone(),
            habit_title: habit.title.clone(),
            content: String::new(),
            checkin_date: date,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_check_in_rejects_same_id() {
        let (db, habit) = seeded().await;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let check_in = check_in_for(&habit, date);

        let first = db.commit_check_in(&check_in, &habit, 10).await.unwrap();
        assert_eq!(first.user.experience_points, 10);
        assert_eq!(first.user.total_checkins, 1);

        let second = db.commit_check_in(&check_in, &habit, 10).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        // XP was not applied twice
        let user = db.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.experience_points, 10);
        assert_eq!(user.total_checkins, 1);
    }

    #[tokio::test]
    async fn test_upsert_profile_keeps_progression() {
        let (db, _) = seeded().await;
        db.award_xp(1, 90).await.unwrap();

        let updated = db
            .upsert_user_profile(&User::new(1, "ada2", "Ada L.", Utc::now()))
            .await
            .unwrap();

        assert_eq!(updated.username, "ada2");
        assert_eq!(updated.experience_points, 90);
        assert_eq!(updated.level, 2);
    }

    #[tokio::test]
    async fn test_unlock_insert_is_unique() {
        let db = MemoryDb::new();
        let unlock = UnlockedAchievement::new(
            1,
            crate::progression::AchievementId::FirstCheckIn,
            Utc::now(),
        );

        db.insert_unlocked_achievement(&unlock).await.unwrap();
        let again = db.insert_unlocked_achievement(&unlock).await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(db.list_unlocked_achievements(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notifications_scoped_to_owner() {
        let db = MemoryDb::new();
        let n = Notification::new(
            2,
            crate::models::NotificationKind::Like,
            "hi".to_string(),
            Utc::now(),
        );
        db.create_notification(&n).await.unwrap();

        assert!(!db.mark_notification_read(3, &n.id).await.unwrap());
        assert!(db.mark_notification_read(2, &n.id).await.unwrap());
        assert_eq!(db.mark_all_notifications_read(2).await.unwrap(), 0);
    }
}
