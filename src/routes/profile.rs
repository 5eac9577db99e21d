// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, achievement and leaderboard routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::progression::{LevelProgress, ACHIEVEMENTS, CATALOG_VERSION};
use crate::time_utils::{format_utc_rfc3339, now_local_and_utc};
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Profile routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/achievements", get(list_achievements))
        .route("/api/leaderboard", get(leaderboard))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub username: String,
    pub display_name: String,
    pub progress: LevelProgress,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_checkins: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub likes_given: u64,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            progress: user.progress(),
            user_id: user.user_id,
            username: user.username,
            display_name: user.display_name,
            total_checkins: user.total_checkins,
            likes_given: user.likes_given,
            created_at: format_utc_rfc3339(user.created_at),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 32))]
    username: String,
    /// Defaults to the username
    #[validate(length(min = 1, max = 64))]
    display_name: Option<String>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile".to_string()))?;
    Ok(Json(profile.into()))
}

/// Create the caller's profile, or rename it. XP and counters are kept.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()?;

    let username = body.username.trim();
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(username);

    let (_, now) = now_local_and_utc();
    let profile = User::new(user.user_id, username, display_name, now);
    let stored = state.db.upsert_user_profile(&profile).await?;

    tracing::info!(user_id = user.user_id, username, "Profile saved");
    Ok(Json(stored.into()))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementsResponse {
    pub catalog_version: u32,
    pub achievements: Vec<AchievementStatus>,
}

/// The full catalog with the caller's unlock state.
async fn list_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AchievementsResponse>> {
    let unlocked: HashMap<String, String> = state
        .db
        .list_unlocked_achievements(user.user_id)
        .await?
        .into_iter()
        .map(|u| (u.achievement_id, format_utc_rfc3339(u.unlocked_at)))
        .collect();

    let achievements = ACHIEVEMENTS
        .iter()
        .map(|achievement| {
            let unlocked_at = unlocked.get(achievement.id.as_str()).cloned();
            AchievementStatus {
                id: achievement.id.as_str().to_string(),
                name: achievement.name.to_string(),
                description: achievement.description.to_string(),
                unlocked: unlocked_at.is_some(),
                unlocked_at,
            }
        })
        .collect();

    Ok(Json(AchievementsResponse {
        catalog_version: CATALOG_VERSION,
        achievements,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub rank: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub display_name: String,
    pub level: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub experience_points: u64,
}

async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LeaderboardEntry>>> {
    let users = state.db.top_users(state.config.leaderboard_size).await?;

    let entries = users
        .into_iter()
        .zip(1..)
        .map(|(user, rank)| LeaderboardEntry {
            rank,
            user_id: user.user_id,
            display_name: user.display_name,
            level: user.level,
            experience_points: user.experience_points,
        })
        .collect();

    Ok(Json(entries))
}
