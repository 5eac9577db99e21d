// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit management with ownership checks.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use crate::db::HabitStore;
use crate::error::{AppError, Result};
use crate::models::Habit;
use crate::progression::Achievement;
use crate::services::achievements::AchievementService;

#[derive(Clone)]
pub struct HabitService {
    store: Arc<dyn HabitStore>,
    achievements: AchievementService,
}

impl HabitService {
    pub fn new(store: Arc<dyn HabitStore>, achievements: AchievementService) -> Self {
        Self {
            store,
            achievements,
        }
    }

    /// Fetch a habit, failing unless `user_id` owns it.
    pub async fn get_owned(&self, user_id: u64, habit_id: &str) -> Result<Habit> {
        let habit = self
            .store
            .get_habit(habit_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Habit {} not found", habit_id)))?;

        if habit.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "Habit {} belongs to another user",
                habit_id
            )));
        }
        Ok(habit)
    }

    /// Create a habit and award habit-count achievements.
    pub async fn create(
        &self,
        user_id: u64,
        title: &str,
        category: &str,
        start_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(Habit, Vec<&'static Achievement>)> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let habit = Habit::new(user_id, title, category, start_date, now);
        self.store.create_habit(&habit).await?;
        tracing::info!(user_id, habit_id = %habit.id, "Habit created");

        let awarded = self.achievements.evaluate_and_award(&user, None, now).await;
        Ok((habit, awarded))
    }

    pub async fn update_details(
        &self,
        user_id: u64,
        habit_id: &str,
        title: &str,
        category: &str,
    ) -> Result<Habit> {
        let mut habit = self.get_owned(user_id, habit_id).await?;
        habit.title = title.to_string();
        habit.category = category.to_string();
        self.store.update_habit_details(&habit).await?;
        Ok(habit)
    }

    pub async fn delete(&self, user_id: u64, habit_id: &str) -> Result<()> {
        self.get_owned(user_id, habit_id).await?;
        self.store.delete_habit(habit_id).await?;
        tracing::info!(user_id, habit_id, "Habit deleted");
        Ok(())
    }
}
