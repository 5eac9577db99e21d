// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum NotificationKind {
    Like,
    AchievementUnlocked,
    LevelUp,
}

/// Notification stored per recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Random UUID (also used as document ID)
    pub id: String,
    /// Recipient
    pub user_id: u64,
    pub kind: NotificationKind,
    pub message: String,
    /// User who caused the notification, if any
    #[serde(default)]
    pub actor_id: Option<u64>,
    #[serde(default)]
    pub check_in_id: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(user_id: u64, kind: NotificationKind, message: String, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            kind,
            message,
            actor_id: None,
            check_in_id: None,
            created_at: now,
            read: false,
        }
    }
}
