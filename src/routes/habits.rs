// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit and check-in routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CheckIn, Habit};
use crate::routes::AchievementSummary;
use crate::services::CheckInOutcome;
use crate::time_utils::{format_utc_rfc3339, now_local_and_utc};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DEFAULT_HISTORY_LIMIT: u32 = 30;
const MAX_HISTORY_LIMIT: u32 = 365;

/// Habit routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/habits", get(list_habits).post(create_habit))
        .route(
            "/api/habits/{id}",
            get(get_habit).put(update_habit).delete(delete_habit),
        )
        .route(
            "/api/habits/{id}/checkins",
            get(list_check_ins).post(submit_check_in),
        )
}

// ─── Habits ──────────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HabitResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub start_date: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_checkin_date: Option<String>,
}

impl From<Habit> for HabitResponse {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            title: habit.title,
            category: habit.category,
            start_date: habit.start_date.to_string(),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak,
            last_checkin_date: habit.last_checkin_date.map(|d| d.to_string()),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct CreateHabitRequest {
    #[validate(length(min = 1, max = 100))]
    title: String,
    #[validate(length(min = 1, max = 50))]
    category: String,
    /// Defaults to today
    start_date: Option<NaiveDate>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateHabitRequest {
    #[validate(length(min = 1, max = 100))]
    title: String,
    #[validate(length(min = 1, max = 50))]
    category: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateHabitResponse {
    pub habit: HabitResponse,
    pub awarded_achievements: Vec<AchievementSummary>,
}

async fn list_habits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<HabitResponse>>> {
    let habits = state.db.list_habits(user.user_id).await?;
    Ok(Json(habits.into_iter().map(HabitResponse::from).collect()))
}

async fn create_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<CreateHabitResponse>)> {
    body.validate()?;

    let (local_now, now) = now_local_and_utc();
    let start_date = body.start_date.unwrap_or(local_now.date());

    let (habit, awarded) = state
        .habits
        .create(
            user.user_id,
            body.title.trim(),
            body.category.trim(),
            start_date,
            now,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateHabitResponse {
            habit: habit.into(),
            awarded_achievements: awarded.into_iter().map(AchievementSummary::from).collect(),
        }),
    ))
}

async fn get_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(habit_id): Path<String>,
) -> Result<Json<HabitResponse>> {
    let habit = state.habits.get_owned(user.user_id, &habit_id).await?;
    Ok(Json(habit.into()))
}

async fn update_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(habit_id): Path<String>,
    Json(body): Json<UpdateHabitRequest>,
) -> Result<Json<HabitResponse>> {
    body.validate()?;

    let habit = state
        .habits
        .update_details(
            user.user_id,
            &habit_id,
            body.title.trim(),
            body.category.trim(),
        )
        .await?;
    Ok(Json(habit.into()))
}

async fn delete_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(habit_id): Path<String>,
) -> Result<StatusCode> {
    state.habits.delete(user.user_id, &habit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Check-ins ───────────────────────────────────────────────

#[derive(Deserialize, Validate, Default)]
pub struct CheckInRequest {
    #[serde(default)]
    #[validate(length(max = 500))]
    content: String,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInSummary {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub user_id: u64,
    pub habit_id: String,
    pub habit_title: String,
    pub content: String,
    pub checkin_date: String,
    pub created_at: String,
}

impl From<CheckIn> for CheckInSummary {
    fn from(check_in: CheckIn) -> Self {
        Self {
            id: check_in.id,
            user_id: check_in.user_id,
            habit_id: check_in.habit_id,
            habit_title: check_in.habit_title,
            content: check_in.content,
            checkin_date: check_in.checkin_date.to_string(),
            created_at: format_utc_rfc3339(check_in.created_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInResponse {
    pub check_in: CheckInSummary,
    pub habit: HabitResponse,
    pub progress: crate::progression::LevelProgress,
    pub level_up: Option<crate::progression::LevelUp>,
    pub awarded_achievements: Vec<AchievementSummary>,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        Self {
            progress: outcome.user.progress(),
            check_in: outcome.check_in.into(),
            habit: outcome.habit.into(),
            level_up: outcome.level_up,
            awarded_achievements: outcome
                .awarded
                .into_iter()
                .map(AchievementSummary::from)
                .collect(),
        }
    }
}

/// Submit today's check-in. Returns 409 if already checked in today.
async fn submit_check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(habit_id): Path<String>,
    body: Option<Json<CheckInRequest>>,
) -> Result<(StatusCode, Json<CheckInResponse>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let (local_now, now) = now_local_and_utc();
    let outcome = state
        .check_ins
        .submit_check_in(user.user_id, &habit_id, &body.content, local_now, now)
        .await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

async fn list_check_ins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(habit_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<CheckInSummary>>> {
    let habit = state.habits.get_owned(user.user_id, &habit_id).await?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let check_ins = state.db.list_check_ins_for_habit(&habit.id, limit).await?;
    Ok(Json(check_ins.into_iter().map(CheckInSummary::from).collect()))
}
