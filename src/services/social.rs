// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Likes and the XP/notification side effects they trigger.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::HabitStore;
use crate::error::{AppError, Result};
use crate::models::{Like, Notification, NotificationKind, User};
use crate::progression::{Achievement, LIKE_RECEIVED_XP};
use crate::services::achievements::AchievementService;

/// Result of liking a check-in.
#[derive(Debug, Clone)]
pub struct LikeOutcome {
    pub check_in_id: String,
    /// `None` if the like was stored but the count could not be read
    pub like_count: Option<u64>,
    /// Achievements the liker unlocked
    pub awarded: Vec<&'static Achievement>,
}

#[derive(Clone)]
pub struct SocialService {
    store: Arc<dyn HabitStore>,
    achievements: AchievementService,
}

impl SocialService {
    pub fn new(store: Arc<dyn HabitStore>, achievements: AchievementService) -> Self {
        Self {
            store,
            achievements,
        }
    }

    /// Like a check-in.
    ///
    /// The like itself is the only part that can fail the request. Author
    /// XP, notifications, achievements and the returned like count are
    /// best-effort once it is stored.
    pub async fn like_check_in(
        &self,
        liker_id: u64,
        check_in_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LikeOutcome> {
        let check_in = self
            .store
            .get_check_in(check_in_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Check-in {} not found", check_in_id)))?;

        let like = Like {
            check_in_id: check_in.id.clone(),
            user_id: liker_id,
            author_id: check_in.user_id,
            created_at: now,
        };

        let liker = self.store.commit_like(&like).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Check-in {} already liked", check_in_id))
            }
            other => other,
        })?;

        tracing::info!(
            liker_id,
            author_id = check_in.user_id,
            check_in_id,
            "Check-in liked"
        );

        if check_in.user_id != liker_id {
            self.reward_author(&liker, check_in.user_id, check_in_id, now)
                .await;
        }

        let awarded = self
            .achievements
            .evaluate_and_award(&liker, None, now)
            .await;

        let like_count = match self.store.count_likes(check_in_id).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(check_in_id, error = %e, "Failed to count likes");
                None
            }
        };

        Ok(LikeOutcome {
            check_in_id: check_in.id,
            like_count,
            awarded,
        })
    }

    async fn reward_author(
        &self,
        liker: &User,
        author_id: u64,
        check_in_id: &str,
        now: DateTime<Utc>,
    ) {
        match self.store.award_xp(author_id, LIKE_RECEIVED_XP).await {
            Ok(update) => {
                self.achievements
                    .evaluate_and_award(&update.user, None, now)
                    .await;
            }
            Err(e) => {
                tracing::warn!(author_id, check_in_id, error = %e, "Failed to award like XP");
            }
        }

        let mut notification = Notification::new(
            author_id,
            NotificationKind::Like,
            format!("{} liked your check-in", liker.display_name),
            now,
        );
        notification.actor_id = Some(liker.user_id);
        notification.check_in_id = Some(check_in_id.to_string());

        if let Err(e) = self.store.create_notification(&notification).await {
            tracing::warn!(author_id, error = %e, "Failed to create like notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{FaultyStore, Faults};
    use crate::db::MemoryDb;
    use crate::models::{CheckIn, Habit};
    use crate::progression::AchievementId;
    use crate::services::CheckInService;

    async fn setup() -> (Arc<MemoryDb>, SocialService, CheckIn) {
        let store = Arc::new(MemoryDb::new());
        let now = Utc::now();
        for (id, name) in [(1, "author"), (2, "fan")] {
            store
                .upsert_user_profile(&User::new(id, name, name, now))
                .await
                .unwrap();
        }
        let habit = Habit::new(1, "Run", "fitness", now.date_naive(), now);
        store.create_habit(&habit).await.unwrap();

        let dyn_store: Arc<dyn HabitStore> = store.clone();
        let achievements = AchievementService::new(dyn_store.clone());
        let check_ins = CheckInService::new(dyn_store.clone(), achievements.clone());
        let outcome = check_ins
            .submit_check_in(1, &habit.id, "5k", now.naive_local(), now)
            .await
            .unwrap();

        (
            store,
            SocialService::new(dyn_store, achievements),
            outcome.check_in,
        )
    }

    #[tokio::test]
    async fn test_like_awards_author_and_notifies() {
        let (store, social, check_in) = setup().await;
        let author_xp_before = store.get_user(1).await.unwrap().unwrap().experience_points;

        let outcome = social
            .like_check_in(2, &check_in.id, Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.like_count, Some(1));
        assert!(outcome
            .awarded
            .iter()
            .any(|a| a.id == AchievementId::FirstLikeGiven));

        let author = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(author.experience_points, author_xp_before + LIKE_RECEIVED_XP);

        let notifications = store.list_notifications(1, 10).await.unwrap();
        let like_note = notifications
            .iter()
            .find(|n| n.kind == NotificationKind::Like)
            .expect("like notification");
        assert_eq!(like_note.actor_id, Some(2));
        assert_eq!(like_note.check_in_id.as_deref(), Some(check_in.id.as_str()));
    }

    #[tokio::test]
    async fn test_second_like_is_conflict() {
        let (store, social, check_in) = setup().await;

        social
            .like_check_in(2, &check_in.id, Utc::now())
            .await
            .unwrap();
        let again = social.like_check_in(2, &check_in.id, Utc::now()).await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(store.count_likes(&check_in.id).await.unwrap(), 1);
        assert_eq!(store.get_user(2).await.unwrap().unwrap().likes_given, 1);
    }

    #[tokio::test]
    async fn test_self_like_earns_no_xp() {
        let (store, social, check_in) = setup().await;
        let before = store.get_user(1).await.unwrap().unwrap().experience_points;

        social
            .like_check_in(1, &check_in.id, Utc::now())
            .await
            .unwrap();

        let after = store.get_user(1).await.unwrap().unwrap().experience_points;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_like_missing_check_in() {
        let (_, social, _) = setup().await;
        let result = social.like_check_in(2, "nope", Utc::now()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_survives_failed_count() {
        let (store, _, check_in) = setup().await;
        let faults = Faults {
            fail_count_likes: true,
            ..Default::default()
        };
        let faulty: Arc<dyn HabitStore> =
            Arc::new(FaultyStore::new(store.as_ref().clone(), faults));
        let social = SocialService::new(faulty.clone(), AchievementService::new(faulty));

        let outcome = social
            .like_check_in(2, &check_in.id, Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.like_count, None);
        assert_eq!(store.count_likes(&check_in.id).await.unwrap(), 1);
        assert_eq!(store.get_user(2).await.unwrap().unwrap().likes_given, 1);
        assert!(outcome
            .awarded
            .iter()
            .any(|a| a.id == AchievementId::FirstLikeGiven));
    }
}
