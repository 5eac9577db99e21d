// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use habit_tracker::error::AppError;

mod common;

#[test]
fn test_is_conflict_matches() {
    assert!(AppError::Conflict("exists".to_string()).is_conflict());

    let err = AppError::DuplicateCheckIn {
        habit_id: "h1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    assert!(err.is_conflict());
}

#[test]
fn test_is_conflict_no_match() {
    assert!(!AppError::BadRequest("Bad Request".to_string()).is_conflict());
    assert!(!AppError::Database("timeout".to_string()).is_conflict());
    assert!(!AppError::NotFound("habit".to_string()).is_conflict());
}

#[tokio::test]
async fn test_duplicate_check_in_response_body() {
    let err = AppError::DuplicateCheckIn {
        habit_id: "h1".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = common::json_body(response).await;
    assert_eq!(body["error"], "duplicate_checkin");
    assert_eq!(body["details"], "Already checked in to habit h1 on 2024-01-01");
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let response = AppError::Database("connection reset".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = common::json_body(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}
