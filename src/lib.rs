// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Habit Tracker: daily habits, streaks, XP levels and achievements
//!
//! This crate provides the backend API for a social habit tracker. The
//! progression rules live in [`progression`]; [`services`] wires them to
//! storage and [`routes`] exposes them over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod progression;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::HabitStore;
use services::{AchievementService, CheckInService, HabitService, SocialService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn HabitStore>,
    pub achievements: AchievementService,
    pub habits: HabitService,
    pub check_ins: CheckInService,
    pub social: SocialService,
}

impl AppState {
    /// Build the services on top of a store.
    pub fn new(config: Config, db: Arc<dyn HabitStore>) -> Self {
        let achievements = AchievementService::new(db.clone());
        Self {
            config,
            habits: HabitService::new(db.clone(), achievements.clone()),
            check_ins: CheckInService::new(db.clone(), achievements.clone()),
            social: SocialService::new(db.clone(), achievements.clone()),
            achievements,
            db,
        }
    }
}
