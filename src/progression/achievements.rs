// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement catalog and unlock evaluation.
//!
//! The catalog is the single source of truth for both the evaluator and the
//! badge list served to clients. Bump [`CATALOG_VERSION`] whenever an entry
//! is added or its condition changes.

use chrono::NaiveTime;
use std::collections::HashSet;

/// Version of the achievement catalog served to clients.
pub const CATALOG_VERSION: u32 = 1;

/// Check-ins strictly before this local hour count as early.
const EARLY_BIRD_HOUR: u32 = 8;

/// Unique identifier for each achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementId {
    FirstCheckIn,
    Streak3,
    Streak7,
    Streak30,
    Streak100,
    Level5,
    Level10,
    FirstLikeGiven,
    FirstHabit,
    FiveHabits,
    EarlyBird,
}

impl AchievementId {
    /// Stable string ID used in storage and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstCheckIn => "first_checkin",
            Self::Streak3 => "streak_3",
            Self::Streak7 => "streak_7",
            Self::Streak30 => "streak_30",
            Self::Streak100 => "streak_100",
            Self::Level5 => "level_5",
            Self::Level10 => "level_10",
            Self::FirstLikeGiven => "first_like_given",
            Self::FirstHabit => "first_habit",
            Self::FiveHabits => "five_habits",
            Self::EarlyBird => "early_bird",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ACHIEVEMENTS
            .iter()
            .map(|a| a.id)
            .find(|id| id.as_str() == s)
    }
}

/// State the unlock conditions are tested against.
///
/// Built by the caller after the triggering event has been applied.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    /// Current streak of the habit just checked into (0 if not a check-in)
    pub current_streak: u32,
    /// Lifetime check-ins, including the one just made
    pub total_checkins: u64,
    pub level: u32,
    pub habit_count: u64,
    pub likes_given: u64,
    /// Local wall-clock time of the triggering check-in
    pub checkin_time: Option<NaiveTime>,
}

/// A catalog entry.
#[derive(Debug)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub condition: fn(&ProgressSnapshot) -> bool,
}

impl Achievement {
    pub fn is_met(&self, snapshot: &ProgressSnapshot) -> bool {
        (self.condition)(snapshot)
    }
}

pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: AchievementId::FirstCheckIn,
        name: "First Step",
        description: "Complete your first check-in",
        condition: |s| s.total_checkins >= 1,
    },
    Achievement {
        id: AchievementId::Streak3,
        name: "Warming Up",
        description: "Reach a 3-day streak on any habit",
        condition: |s| s.current_streak >= 3,
    },
    Achievement {
        id: AchievementId::Streak7,
        name: "One Week Strong",
        description: "Reach a 7-day streak on any habit",
        condition: |s| s.current_streak >= 7,
    },
    Achievement {
        id: AchievementId::Streak30,
        name: "Monthly Master",
        description: "Reach a 30-day streak on any habit",
        condition: |s| s.current_streak >= 30,
    },
    Achievement {
        id: AchievementId::Streak100,
        name: "Centurion",
        description: "Reach a 100-day streak on any habit",
        condition: |s| s.current_streak >= 100,
    },
    Achievement {
        id: AchievementId::Level5,
        name: "Rising Star",
        description: "Reach level 5",
        condition: |s| s.level >= 5,
    },
    Achievement {
        id: AchievementId::Level10,
        name: "Habit Hero",
        description: "Reach level 10",
        condition: |s| s.level >= 10,
    },
    Achievement {
        id: AchievementId::FirstLikeGiven,
        name: "Cheerleader",
        description: "Like someone's check-in",
        condition: |s| s.likes_given >= 1,
    },
    Achievement {
        id: AchievementId::FirstHabit,
        name: "Getting Started",
        description: "Create your first habit",
        condition: |s| s.habit_count >= 1,
    },
    Achievement {
        id: AchievementId::FiveHabits,
        name: "Juggler",
        description: "Track five habits",
        condition: |s| s.habit_count >= 5,
    },
    Achievement {
        id: AchievementId::EarlyBird,
        name: "Early Bird",
        description: "Check in before 8 AM",
        condition: |s| {
            s.checkin_time
                .and_then(|t| NaiveTime::from_hms_opt(EARLY_BIRD_HOUR, 0, 0).map(|cutoff| t < cutoff))
                .unwrap_or(false)
        },
    },
];

/// Catalog entries whose condition holds and that are not yet unlocked.
pub fn evaluate(
    snapshot: &ProgressSnapshot,
    already_unlocked: &HashSet<AchievementId>,
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !already_unlocked.contains(&a.id))
        .filter(|a| a.is_met(snapshot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_IDS: [AchievementId; 11] = [
        AchievementId::FirstCheckIn,
        AchievementId::Streak3,
        AchievementId::Streak7,
        AchievementId::Streak30,
        AchievementId::Streak100,
        AchievementId::Level5,
        AchievementId::Level10,
        AchievementId::FirstLikeGiven,
        AchievementId::FirstHabit,
        AchievementId::FiveHabits,
        AchievementId::EarlyBird,
    ];

    fn ids(found: &[&Achievement]) -> Vec<AchievementId> {
        found.iter().map(|a| a.id).collect()
    }

    fn entry(id: AchievementId) -> &'static Achievement {
        ACHIEVEMENTS
            .iter()
            .find(|a| a.id == id)
            .unwrap_or_else(|| panic!("{} missing from catalog", id.as_str()))
    }

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for achievement in ACHIEVEMENTS {
            assert!(seen.insert(achievement.id.as_str()));
            assert_eq!(AchievementId::parse(achievement.id.as_str()), Some(achievement.id));
        }
        assert_eq!(AchievementId::parse("nope"), None);
    }

    #[test]
    fn test_every_id_has_exactly_one_catalog_entry() {
        assert_eq!(ACHIEVEMENTS.len(), ALL_IDS.len());
        for id in ALL_IDS {
            let matches = ACHIEVEMENTS.iter().filter(|a| a.id == id).count();
            assert_eq!(matches, 1, "{} has {} catalog entries", id.as_str(), matches);
        }
    }

    #[test]
    fn test_first_checkin_only() {
        let snapshot = ProgressSnapshot {
            current_streak: 1,
            total_checkins: 1,
            level: 1,
            habit_count: 1,
            checkin_time: NaiveTime::from_hms_opt(12, 0, 0),
            ..Default::default()
        };
        let unlocked = HashSet::from([AchievementId::FirstHabit]);

        assert_eq!(ids(&evaluate(&snapshot, &unlocked)), vec![AchievementId::FirstCheckIn]);
    }

    #[test]
    fn test_streak_thresholds() {
        let snapshot = ProgressSnapshot {
            current_streak: 7,
            total_checkins: 7,
            level: 1,
            ..Default::default()
        };
        let unlocked = HashSet::from([AchievementId::FirstCheckIn]);
        let found = ids(&evaluate(&snapshot, &unlocked));

        assert_eq!(found, vec![AchievementId::Streak3, AchievementId::Streak7]);
    }

    #[test]
    fn test_already_unlocked_is_skipped() {
        let snapshot = ProgressSnapshot {
            current_streak: 3,
            total_checkins: 3,
            level: 1,
            ..Default::default()
        };
        let unlocked = HashSet::from([AchievementId::FirstCheckIn, AchievementId::Streak3]);

        assert!(evaluate(&snapshot, &unlocked).is_empty());
    }

    #[test]
    fn test_early_bird_cutoff() {
        let early = ProgressSnapshot {
            checkin_time: NaiveTime::from_hms_opt(7, 59, 59),
            ..Default::default()
        };
        let on_time = ProgressSnapshot {
            checkin_time: NaiveTime::from_hms_opt(8, 0, 0),
            ..Default::default()
        };
        let no_checkin = ProgressSnapshot::default();

        let early_bird = entry(AchievementId::EarlyBird);
        assert!(early_bird.is_met(&early));
        assert!(!early_bird.is_met(&on_time));
        assert!(!early_bird.is_met(&no_checkin));
    }

    #[test]
    fn test_level_and_social_conditions() {
        let snapshot = ProgressSnapshot {
            level: 10,
            likes_given: 1,
            habit_count: 5,
            ..Default::default()
        };
        let found = ids(&evaluate(&snapshot, &HashSet::new()));

        assert_eq!(
            found,
            vec![
                AchievementId::Level5,
                AchievementId::Level10,
                AchievementId::FirstLikeGiven,
                AchievementId::FirstHabit,
                AchievementId::FiveHabits,
            ]
        );
    }
}
