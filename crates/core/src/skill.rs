//! Skill levels, achievement badges, and the threshold policy that derives
//! a member's level on a lyric from their practice history.
//!
//! Everything here is pure: repositories feed in aggregates loaded from the
//! practice log and persist whatever [`SkillPolicy::recompute`] returns.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LEVEL_NOVICE: &str = "novice";
pub const LEVEL_LEARNING: &str = "learning";
pub const LEVEL_PROFICIENT: &str = "proficient";
pub const LEVEL_MASTER: &str = "master";

/// All valid skill level strings, lowest first.
pub const VALID_SKILL_LEVELS: &[&str] =
    &[LEVEL_NOVICE, LEVEL_LEARNING, LEVEL_PROFICIENT, LEVEL_MASTER];

pub const BADGE_REACHED_LEARNING: &str = "reached_learning";
pub const BADGE_REACHED_PROFICIENT: &str = "reached_proficient";
pub const BADGE_REACHED_MASTER: &str = "reached_master";

/// Accepted wire format for goal dates.
pub const GOAL_DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Skill level
// ---------------------------------------------------------------------------

/// Four-tier proficiency classification, ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Novice,
    Learning,
    Proficient,
    Master,
}

impl SkillLevel {
    /// Every level in ascending order.
    pub const ALL: [SkillLevel; 4] = [
        SkillLevel::Novice,
        SkillLevel::Learning,
        SkillLevel::Proficient,
        SkillLevel::Master,
    ];

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            LEVEL_NOVICE => Ok(Self::Novice),
            LEVEL_LEARNING => Ok(Self::Learning),
            LEVEL_PROFICIENT => Ok(Self::Proficient),
            LEVEL_MASTER => Ok(Self::Master),
            _ => Err(CoreError::Validation(format!(
                "Invalid skill level '{s}'. Must be one of: {}",
                VALID_SKILL_LEVELS.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Novice => LEVEL_NOVICE,
            Self::Learning => LEVEL_LEARNING,
            Self::Proficient => LEVEL_PROFICIENT,
            Self::Master => LEVEL_MASTER,
        }
    }

    /// Badge earned on first reaching this level. Novice has none.
    pub fn badge(&self) -> Option<Badge> {
        match self {
            Self::Novice => None,
            Self::Learning => Some(Badge::ReachedLearning),
            Self::Proficient => Some(Badge::ReachedProficient),
            Self::Master => Some(Badge::ReachedMaster),
        }
    }

    /// Display metadata for progress bars and legends.
    pub fn info(&self) -> LevelDisplay {
        match self {
            Self::Novice => LevelDisplay {
                label: "Novice",
                color: "#9e9e9e",
                icon: "dashicons-star-empty",
                progress_value: 0,
                description: "Not yet practiced. Start with a read-through of the text.",
            },
            Self::Learning => LevelDisplay {
                label: "Learning",
                color: "#2196f3",
                icon: "dashicons-star-half",
                progress_value: 33,
                description: "Getting familiar with the notes and words.",
            },
            Self::Proficient => LevelDisplay {
                label: "Proficient",
                color: "#ff9800",
                icon: "dashicons-star-filled",
                progress_value: 66,
                description: "Comfortable singing the part with the score.",
            },
            Self::Master => LevelDisplay {
                label: "Master",
                color: "#4caf50",
                icon: "dashicons-awards",
                progress_value: 100,
                description: "Performance ready, confident without the score.",
            },
        }
    }
}

/// Static display metadata attached to each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelDisplay {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub progress_value: u8,
    pub description: &'static str,
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// Achievement badge identifiers. Each is earned at most once per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    ReachedLearning,
    ReachedProficient,
    ReachedMaster,
}

impl Badge {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            BADGE_REACHED_LEARNING => Ok(Self::ReachedLearning),
            BADGE_REACHED_PROFICIENT => Ok(Self::ReachedProficient),
            BADGE_REACHED_MASTER => Ok(Self::ReachedMaster),
            _ => Err(CoreError::Validation(format!("Invalid badge '{s}'"))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReachedLearning => BADGE_REACHED_LEARNING,
            Self::ReachedProficient => BADGE_REACHED_PROFICIENT,
            Self::ReachedMaster => BADGE_REACHED_MASTER,
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Count, sum, and latest timestamp over one (member, lyric) pair's sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAggregate {
    pub practice_count: i64,
    pub total_minutes: i64,
    pub last_practiced_at: Option<Timestamp>,
}

/// Derived skill state for one member on one lyric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub member_id: DbId,
    pub lyric_id: DbId,
    pub skill_level: SkillLevel,
    pub practice_count: i64,
    pub total_practice_minutes: i64,
    pub last_practice_date: Option<Timestamp>,
    pub goal_date: Option<Date>,
    pub achievement_badges: BTreeSet<Badge>,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Minimums a record must meet to sit at a level. Both must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub min_sessions: i64,
    pub min_minutes: Option<i64>,
}

impl LevelThreshold {
    pub const fn sessions(min_sessions: i64) -> Self {
        Self {
            min_sessions,
            min_minutes: None,
        }
    }

    fn is_met(&self, practice_count: i64, total_minutes: i64) -> bool {
        practice_count >= self.min_sessions
            && self
                .min_minutes
                .map_or(true, |minutes| total_minutes >= minutes)
    }
}

/// Threshold table mapping practice totals onto skill levels.
///
/// Defaults: learning at 1 session, proficient at 5, master at 10, with no
/// minute requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillPolicy {
    learning: LevelThreshold,
    proficient: LevelThreshold,
    master: LevelThreshold,
}

impl Default for SkillPolicy {
    fn default() -> Self {
        Self {
            learning: LevelThreshold::sessions(1),
            proficient: LevelThreshold::sessions(5),
            master: LevelThreshold::sessions(10),
        }
    }
}

impl SkillPolicy {
    /// Build a policy, rejecting tables that are not monotonic.
    pub fn new(
        learning: LevelThreshold,
        proficient: LevelThreshold,
        master: LevelThreshold,
    ) -> Result<Self, CoreError> {
        if learning.min_sessions < 1 {
            return Err(CoreError::Validation(
                "learning threshold must require at least one session".to_string(),
            ));
        }

        let ordered = [
            (LEVEL_LEARNING, learning),
            (LEVEL_PROFICIENT, proficient),
            (LEVEL_MASTER, master),
        ];
        for (name, threshold) in &ordered {
            if threshold.min_minutes.is_some_and(|m| m < 0) {
                return Err(CoreError::Validation(format!(
                    "{name} minutes threshold must not be negative"
                )));
            }
        }
        for pair in ordered.windows(2) {
            let (lower_name, lower) = pair[0];
            let (upper_name, upper) = pair[1];
            if upper.min_sessions < lower.min_sessions {
                return Err(CoreError::Validation(format!(
                    "{upper_name} session threshold ({}) is below {lower_name} ({})",
                    upper.min_sessions, lower.min_sessions
                )));
            }
            let lower_minutes = lower.min_minutes.unwrap_or(0);
            let upper_minutes = upper.min_minutes.unwrap_or(0);
            if upper_minutes < lower_minutes {
                return Err(CoreError::Validation(format!(
                    "{upper_name} minutes threshold ({upper_minutes}) is below \
                     {lower_name} ({lower_minutes})"
                )));
            }
        }

        Ok(Self {
            learning,
            proficient,
            master,
        })
    }

    /// Threshold for `level`. Novice always requires nothing.
    pub fn threshold(&self, level: SkillLevel) -> LevelThreshold {
        match level {
            SkillLevel::Novice => LevelThreshold::sessions(0),
            SkillLevel::Learning => self.learning,
            SkillLevel::Proficient => self.proficient,
            SkillLevel::Master => self.master,
        }
    }

    /// Highest level whose threshold the totals meet.
    pub fn level_for(&self, practice_count: i64, total_minutes: i64) -> SkillLevel {
        SkillLevel::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| self.threshold(*level).is_met(practice_count, total_minutes))
            .unwrap_or(SkillLevel::Novice)
    }

    /// Rebuild a pair's record from its aggregated session log.
    ///
    /// Counts and totals come straight from `aggregate`; the goal date and
    /// previously earned badges carry over from `previous`. Every level at or
    /// below the new one contributes its badge, so crossing several levels
    /// at once awards each of them and a badge is never awarded twice.
    pub fn recompute(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        previous: Option<&SkillRecord>,
        aggregate: &SessionAggregate,
    ) -> SkillRecord {
        let skill_level = self.level_for(aggregate.practice_count, aggregate.total_minutes);

        let mut achievement_badges = previous
            .map(|r| r.achievement_badges.clone())
            .unwrap_or_default();
        achievement_badges.extend(
            SkillLevel::ALL
                .iter()
                .filter(|level| **level <= skill_level)
                .filter_map(SkillLevel::badge),
        );

        SkillRecord {
            member_id,
            lyric_id,
            skill_level,
            practice_count: aggregate.practice_count,
            total_practice_minutes: aggregate.total_minutes,
            last_practice_date: aggregate.last_practiced_at,
            goal_date: previous.and_then(|r| r.goal_date),
            achievement_badges,
        }
    }

    /// Re-derive the level of a stored record under the current thresholds.
    pub fn rederive(&self, mut record: SkillRecord) -> SkillRecord {
        record.skill_level = self.level_for(record.practice_count, record.total_practice_minutes);
        record
    }

    /// Ordered level table for legends and progress bars.
    pub fn levels(&self) -> IndexMap<&'static str, SkillLevelInfo> {
        SkillLevel::ALL
            .iter()
            .map(|level| {
                let display = level.info();
                let threshold = self.threshold(*level);
                (
                    level.as_str(),
                    SkillLevelInfo {
                        label: display.label,
                        color: display.color,
                        icon: display.icon,
                        progress_value: display.progress_value,
                        description: display.description,
                        min_sessions: threshold.min_sessions,
                        min_minutes: threshold.min_minutes,
                    },
                )
            })
            .collect()
    }

    /// Load thresholds from `SKILL_*` environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load thresholds through an arbitrary variable lookup.
    ///
    /// Unset session counts fall back to the defaults; unset minutes leave
    /// that level without a minutes requirement.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let read = |key: &str| -> Result<Option<i64>, CoreError> {
            match get(key) {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                    CoreError::Validation(format!("{key} must be an integer, got '{raw}'"))
                }),
            }
        };
        let threshold = |level: &str, default: LevelThreshold| -> Result<LevelThreshold, CoreError> {
            Ok(LevelThreshold {
                min_sessions: read(&format!("SKILL_{level}_SESSIONS"))?
                    .unwrap_or(default.min_sessions),
                min_minutes: read(&format!("SKILL_{level}_MINUTES"))?,
            })
        };

        Self::new(
            threshold("LEARNING", defaults.learning)?,
            threshold("PROFICIENT", defaults.proficient)?,
            threshold("MASTER", defaults.master)?,
        )
    }
}

/// One entry of the level table returned by `skill_levels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillLevelInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub progress_value: u8,
    pub description: &'static str,
    pub min_sessions: i64,
    pub min_minutes: Option<i64>,
}

// ---------------------------------------------------------------------------
// Goal dates
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` goal date and reject dates before `today`.
pub fn parse_goal_date(raw: &str, today: Date) -> Result<Date, CoreError> {
    let goal = Date::parse_from_str(raw.trim(), GOAL_DATE_FORMAT).map_err(|_| {
        CoreError::Validation(format!("goal_date '{raw}' is not a valid YYYY-MM-DD date"))
    })?;

    if goal < today {
        return Err(CoreError::Validation(format!(
            "goal_date {goal} is in the past"
        )));
    }
    Ok(goal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
