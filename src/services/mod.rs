// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod checkin;
pub mod habits;
pub mod social;

pub use achievements::{AchievementService, CheckInContext};
pub use checkin::{CheckInOutcome, CheckInService};
pub use habits::HabitService;
pub use social::{LikeOutcome, SocialService};
