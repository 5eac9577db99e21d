// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod checkin;
pub mod habit;
pub mod notification;
pub mod user;

pub use achievement::UnlockedAchievement;
pub use checkin::{CheckIn, Like};
pub use habit::Habit;
pub use notification::{Notification, NotificationKind};
pub use user::User;
