// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`HabitStore`].
//!
//! Uniqueness rules map onto document IDs: a check-in, like, or unlock is
//! written with an `exists = false` precondition, so a second writer for
//! the same key fails at commit time regardless of what it read first.

use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{paths, FirestoreQueryDirection, FirestoreTimestamp, FirestoreWritePrecondition};

use super::{collections, FeedCursor, HabitStore, ProgressUpdate};
use crate::error::AppError;
use crate::models::{CheckIn, Habit, Like, Notification, UnlockedAchievement, User};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Extra rows fetched past the feed cursor to skip same-timestamp entries.
const FEED_TIE_SLACK: u32 = 10;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Map Firestore errors, keeping uniqueness violations distinguishable.
fn db_error(err: FirestoreError) -> AppError {
    match err {
        FirestoreError::DataConflictError(e) => AppError::Conflict(e.to_string()),
        other => AppError::Database(other.to_string()),
    }
}

/// What a read-then-write transaction found.
enum TxOutcome<T> {
    Committed(T),
    AlreadyExists,
    MissingUser,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Insert a document that must not exist yet.
    async fn insert_unique<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Mark notifications read in transactions of at most `BATCH_SIZE` writes.
    async fn batch_mark_read(&self, notifications: &[Notification]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in notifications.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for notification in chunk {
                let mut read = notification.clone();
                read.read = true;
                client
                    .fluent()
                    .update()
                    .fields(paths!(Notification::{read}))
                    .in_col(collections::NOTIFICATIONS)
                    .document_id(&read.id)
                    .object(&read)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add notification update to transaction: {}",
                            e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit notification updates: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl HabitStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(db_error)
    }

    async fn upsert_user_profile(&self, user: &User) -> Result<User, AppError> {
        let profile = user.clone();
        let doc_id = user.user_id.to_string();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let profile = profile.clone();
                let doc_id = doc_id.clone();
                Box::pin(async move {
                    let existing: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&doc_id)
                        .await?;

                    let merged = match existing {
                        Some(mut stored) => {
                            stored.username = profile.username;
                            stored.display_name = profile.display_name;
                            stored
                        }
                        None => profile,
                    };

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&doc_id)
                        .object(&merged)
                        .add_to_transaction(transaction)?;

                    Ok(merged)
                })
            })
            .await
            .map_err(db_error)
    }

    async fn award_xp(&self, user_id: u64, amount: u64) -> Result<ProgressUpdate, AppError> {
        let doc_id = user_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let doc_id = doc_id.clone();
                Box::pin(async move {
                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&doc_id)
                        .await?;
                    let Some(mut user) = stored else {
                        return Ok(TxOutcome::MissingUser);
                    };

                    let level_up = user.award_xp(amount);

                    db.fluent()
                        .update()
                        .fields(paths!(User::{experience_points, level}))
                        .in_col(collections::USERS)
                        .document_id(&doc_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok(TxOutcome::Committed(ProgressUpdate { user, level_up }))
                })
            })
            .await
            .map_err(db_error)?;

        match outcome {
            TxOutcome::Committed(update) => Ok(update),
            TxOutcome::MissingUser | TxOutcome::AlreadyExists => {
                Err(AppError::NotFound(format!("User {} not found", user_id)))
            }
        }
    }

    async fn top_users(&self, limit: u32) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([(
                "experience_points",
                FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    // ─── Habit Operations ────────────────────────────────────────

    async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HABITS)
            .obj()
            .one(habit_id)
            .await
            .map_err(db_error)
    }

    async fn list_habits(&self, user_id: u64) -> Result<Vec<Habit>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::HABITS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn create_habit(&self, habit: &Habit) -> Result<(), AppError> {
        self.insert_unique(collections::HABITS, &habit.id, habit)
            .await
    }

    async fn update_habit_details(&self, habit: &Habit) -> Result<(), AppError> {
        let _: Habit = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(Habit::{title, category}))
            .in_col(collections::HABITS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&habit.id)
            .object(habit)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::HABITS)
            .document_id(habit_id)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    // ─── Check-in Operations ─────────────────────────────────────

    async fn get_check_in(&self, check_in_id: &str) -> Result<Option<CheckIn>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHECKINS)
            .obj()
            .one(check_in_id)
            .await
            .map_err(db_error)
    }

    /// Commit a check-in in one transaction.
    ///
    /// The check-in write carries an `exists = false` precondition, so two
    /// racing requests for the same day cannot both commit even if both
    /// read "absent" first. Firestore retries the loser, which then sees the
    /// winner's document and reports a conflict.
    async fn commit_check_in(
        &self,
        check_in: &CheckIn,
        habit: &Habit,
        xp: u64,
    ) -> Result<ProgressUpdate, AppError> {
        let check_in = check_in.clone();
        let habit = habit.clone();
        let user_doc_id = check_in.user_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let check_in = check_in.clone();
                let habit = habit.clone();
                let user_doc_id = user_doc_id.clone();
                Box::pin(async move {
                    let existing: Option<CheckIn> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::CHECKINS)
                        .obj()
                        .one(&check_in.id)
                        .await?;
                    if existing.is_some() {
                        return Ok(TxOutcome::AlreadyExists);
                    }

                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&user_doc_id)
                        .await?;
                    let Some(mut user) = stored else {
                        return Ok(TxOutcome::MissingUser);
                    };

                    let level_up = user.award_xp(xp);
                    user.total_checkins += 1;

                    db.fluent()
                        .update()
                        .in_col(collections::CHECKINS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&check_in.id)
                        .object(&check_in)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .fields(paths!(Habit::{current_streak, longest_streak, last_checkin_date}))
                        .in_col(collections::HABITS)
                        .precondition(FirestoreWritePrecondition::Exists(true))
                        .document_id(&habit.id)
                        .object(&habit)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .fields(paths!(User::{experience_points, level, total_checkins}))
                        .in_col(collections::USERS)
                        .document_id(&user_doc_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok(TxOutcome::Committed(ProgressUpdate { user, level_up }))
                })
            })
            .await
            .map_err(db_error)?;

        match outcome {
            TxOutcome::Committed(update) => {
                tracing::debug!(
                    user_id = check_in.user_id,
                    check_in_id = %check_in.id,
                    "Check-in committed atomically"
                );
                Ok(update)
            }
            TxOutcome::AlreadyExists => Err(AppError::Conflict(format!(
                "Check-in {} already exists",
                check_in.id
            ))),
            TxOutcome::MissingUser => Err(AppError::NotFound(format!(
                "User {} not found",
                check_in.user_id
            ))),
        }
    }

    async fn list_check_ins_for_habit(
        &self,
        habit_id: &str,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let habit_id = habit_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHECKINS)
            .filter(move |q| q.for_all([q.field("habit_id").eq(habit_id.clone())]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn recent_check_ins(
        &self,
        cursor: Option<FeedCursor>,
        limit: u32,
    ) -> Result<Vec<CheckIn>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHECKINS);

        let mut results: Vec<CheckIn> = if let Some(cursor) = cursor.clone() {
            // `<=` plus in-memory filtering keeps entries sharing the
            // cursor's timestamp but sorting after its ID.
            query
                .filter(move |q| {
                    q.for_all([q
                        .field("created_at")
                        .less_than_or_equal(FirestoreTimestamp(cursor.created_at))])
                })
                .order_by([
                    ("created_at", FirestoreQueryDirection::Descending),
                    ("id", FirestoreQueryDirection::Descending),
                ])
                .limit(limit.saturating_add(FEED_TIE_SLACK))
                .obj()
                .query()
                .await
                .map_err(db_error)?
        } else {
            query
                .order_by([
                    ("created_at", FirestoreQueryDirection::Descending),
                    ("id", FirestoreQueryDirection::Descending),
                ])
                .limit(limit)
                .obj()
                .query()
                .await
                .map_err(db_error)?
        };

        if let Some(cursor) = cursor {
            results.retain(|c| cursor.precedes(c));
        }
        results.truncate(limit as usize);
        Ok(results)
    }

    // ─── Like Operations ─────────────────────────────────────────

    async fn commit_like(&self, like: &Like) -> Result<User, AppError> {
        let like = like.clone();
        let like_doc_id = like.document_id();
        let user_doc_id = like.user_id.to_string();

        let outcome = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let like = like.clone();
                let like_doc_id = like_doc_id.clone();
                let user_doc_id = user_doc_id.clone();
                Box::pin(async move {
                    let existing: Option<Like> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::LIKES)
                        .obj()
                        .one(&like_doc_id)
                        .await?;
                    if existing.is_some() {
                        return Ok(TxOutcome::AlreadyExists);
                    }

                    let stored: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&user_doc_id)
                        .await?;
                    let Some(mut liker) = stored else {
                        return Ok(TxOutcome::MissingUser);
                    };
                    liker.likes_given += 1;

                    db.fluent()
                        .update()
                        .in_col(collections::LIKES)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&like_doc_id)
                        .object(&like)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .fields(paths!(User::{likes_given}))
                        .in_col(collections::USERS)
                        .document_id(&user_doc_id)
                        .object(&liker)
                        .add_to_transaction(transaction)?;

                    Ok(TxOutcome::Committed(liker))
                })
            })
            .await
            .map_err(db_error)?;

        match outcome {
            TxOutcome::Committed(liker) => Ok(liker),
            TxOutcome::AlreadyExists => Err(AppError::Conflict(format!(
                "User {} already liked check-in {}",
                like.user_id, like.check_in_id
            ))),
            TxOutcome::MissingUser => Err(AppError::NotFound(format!(
                "User {} not found",
                like.user_id
            ))),
        }
    }

    async fn count_likes(&self, check_in_id: &str) -> Result<u64, AppError> {
        let check_in_id = check_in_id.to_string();
        let likes: Vec<Like> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LIKES)
            .filter(move |q| q.for_all([q.field("check_in_id").eq(check_in_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        Ok(likes.len() as u64)
    }

    // ─── Achievement Operations ──────────────────────────────────

    async fn list_unlocked_achievements(
        &self,
        user_id: u64,
    ) -> Result<Vec<UnlockedAchievement>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::UNLOCKED_ACHIEVEMENTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("unlocked_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn insert_unlocked_achievement(
        &self,
        unlock: &UnlockedAchievement,
    ) -> Result<(), AppError> {
        self.insert_unique(
            collections::UNLOCKED_ACHIEVEMENTS,
            &unlock.document_id(),
            unlock,
        )
        .await
    }

    // ─── Notification Operations ─────────────────────────────────

    async fn create_notification(&self, notification: &Notification) -> Result<(), AppError> {
        self.insert_unique(collections::NOTIFICATIONS, &notification.id, notification)
            .await
    }

    async fn list_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(db_error)
    }

    async fn mark_notification_read(
        &self,
        user_id: u64,
        notification_id: &str,
    ) -> Result<bool, AppError> {
        let stored: Option<Notification> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::NOTIFICATIONS)
            .obj()
            .one(notification_id)
            .await
            .map_err(db_error)?;

        let Some(notification) = stored.filter(|n| n.user_id == user_id) else {
            return Ok(false);
        };

        self.batch_mark_read(std::slice::from_ref(&notification))
            .await?;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, user_id: u64) -> Result<usize, AppError> {
        let unread: Vec<Notification> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::NOTIFICATIONS)
            .filter(move |q| {
                q.for_all([q.field("user_id").eq(user_id), q.field("read").eq(false)])
            })
            .obj()
            .query()
            .await
            .map_err(db_error)?;

        self.batch_mark_read(&unread).await?;

        tracing::debug!(user_id, count = unread.len(), "Marked notifications read");
        Ok(unread.len())
    }
}
