// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community feed, like and notification routes.

use crate::db::FeedCursor;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Notification, NotificationKind};
use crate::routes::habits::CheckInSummary;
use crate::routes::AchievementSummary;
use crate::services::LikeOutcome;
use crate::time_utils::{format_utc_rfc3339, now_local_and_utc};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_FEED_LIMIT: u32 = 20;
const MAX_FEED_LIMIT: u32 = 50;
const NOTIFICATION_LIMIT: u32 = 50;
const CURSOR_PARTS: usize = 3;

/// Social routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(feed))
        .route("/api/checkins/{id}/like", post(like_check_in))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/{id}/read", post(mark_read))
}

// ─── Feed ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedQuery {
    /// Opaque cursor from a previous response's `next_cursor`
    cursor: Option<String>,
    limit: Option<u32>,
}

fn parse_cursor(cursor: Option<&str>) -> Result<Option<FeedCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor = || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.splitn(CURSOR_PARTS, ':').collect();
            if parts.len() != CURSOR_PARTS || parts[2].is_empty() {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let created_at =
                chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(FeedCursor {
                created_at,
                check_in_id: parts[2].to_string(),
            })
        })
        .transpose()
}

fn encode_cursor(cursor: &FeedCursor) -> String {
    let payload = format!(
        "{}:{}:{}",
        cursor.created_at.timestamp(),
        cursor.created_at.timestamp_subsec_nanos(),
        cursor.check_in_id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedItem {
    #[serde(flatten)]
    pub check_in: CheckInSummary,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub like_count: u64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedResponse {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<String>,
}

/// Everyone's check-ins, newest first.
async fn feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let cursor = parse_cursor(params.cursor.as_deref())?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    // Fetch one extra to know whether another page exists
    let mut check_ins = state.db.recent_check_ins(cursor, limit + 1).await?;
    let has_more = check_ins.len() > limit as usize;
    check_ins.truncate(limit as usize);

    let next_cursor = if has_more {
        check_ins
            .last()
            .map(|last| encode_cursor(&FeedCursor::for_check_in(last)))
    } else {
        None
    };

    let like_counts = try_join_all(
        check_ins
            .iter()
            .map(|check_in| state.db.count_likes(&check_in.id)),
    )
    .await?;

    let items = check_ins
        .into_iter()
        .zip(like_counts)
        .map(|(check_in, like_count)| FeedItem {
            check_in: check_in.into(),
            like_count,
        })
        .collect();

    Ok(Json(FeedResponse { items, next_cursor }))
}

// ─── Likes ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeResponse {
    pub check_in_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub like_count: Option<u64>,
    pub awarded_achievements: Vec<AchievementSummary>,
}

impl From<LikeOutcome> for LikeResponse {
    fn from(outcome: LikeOutcome) -> Self {
        Self {
            check_in_id: outcome.check_in_id,
            like_count: outcome.like_count,
            awarded_achievements: outcome
                .awarded
                .into_iter()
                .map(AchievementSummary::from)
                .collect(),
        }
    }
}

async fn like_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(check_in_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let (_, now) = now_local_and_utc();
    let outcome = state
        .social
        .like_check_in(user.user_id, &check_in_id, now)
        .await?;
    Ok(Json(outcome.into()))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub actor_id: Option<u64>,
    pub check_in_id: Option<String>,
    pub created_at: String,
    pub read: bool,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message,
            actor_id: n.actor_id,
            check_in_id: n.check_in_id,
            created_at: format_utc_rfc3339(n.created_at),
            read: n.read,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread: u32,
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<NotificationsResponse>> {
    let notifications = state
        .db
        .list_notifications(user.user_id, NOTIFICATION_LIMIT)
        .await?;
    let unread = notifications.iter().filter(|n| !n.read).count() as u32;

    Ok(Json(NotificationsResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        unread,
    }))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(notification_id): Path<String>,
) -> Result<Json<MarkReadResponse>> {
    if !state
        .db
        .mark_notification_read(user.user_id, &notification_id)
        .await?
    {
        return Err(AppError::NotFound(format!(
            "Notification {} not found",
            notification_id
        )));
    }
    Ok(Json(MarkReadResponse { updated: 1 }))
}

async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MarkReadResponse>> {
    let updated = state.db.mark_all_notifications_read(user.user_id).await?;
    tracing::debug!(user_id = user.user_id, updated, "Marked notifications read");
    Ok(Json(MarkReadResponse { updated }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_cursor_roundtrip_keeps_underscored_ids() {
        let cursor = FeedCursor {
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 7, 15, 0).unwrap()
                + chrono::Duration::nanoseconds(1234),
            check_in_id: "42_0c6f_2024-03-01".to_string(),
        };
        let encoded = encode_cursor(&cursor);
        assert_eq!(parse_cursor(Some(&encoded)).unwrap(), Some(cursor));
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(parse_cursor(Some("not base64!")).is_err());
        let missing_id = URL_SAFE_NO_PAD.encode("1700000000:0:");
        assert!(parse_cursor(Some(&missing_id)).is_err());
        let bad_secs = URL_SAFE_NO_PAD.encode("soon:0:abc");
        assert!(parse_cursor(Some(&bad_secs)).is_err());
        assert_eq!(parse_cursor(None).unwrap(), None);
    }
}
