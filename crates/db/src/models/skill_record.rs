//! Skill record rows.

use std::collections::BTreeSet;

use choir_core::error::CoreError;
use choir_core::skill::{Badge, SkillLevel, SkillRecord};
use choir_core::types::{Date, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `skill_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SkillRecordRow {
    pub member_id: DbId,
    pub lyric_id: DbId,
    pub skill_level: String,
    pub practice_count: i64,
    pub total_practice_minutes: i64,
    pub last_practice_date: Option<Timestamp>,
    pub goal_date: Option<Date>,
    pub achievement_badges: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SkillRecordRow {
    /// Parse the text columns into typed levels and badges.
    ///
    /// Unrecognized values mean the stored row is corrupt, so they surface as
    /// [`CoreError::Internal`] rather than a client-facing validation error.
    pub fn into_domain(self) -> Result<SkillRecord, CoreError> {
        let achievement_badges = self
            .achievement_badges
            .iter()
            .map(|b| Badge::from_str_value(b))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| self.corrupt(e))?;
        let skill_level =
            SkillLevel::from_str_value(&self.skill_level).map_err(|e| self.corrupt(e))?;

        Ok(SkillRecord {
            member_id: self.member_id,
            lyric_id: self.lyric_id,
            skill_level,
            practice_count: self.practice_count,
            total_practice_minutes: self.total_practice_minutes,
            last_practice_date: self.last_practice_date,
            goal_date: self.goal_date,
            achievement_badges,
        })
    }

    fn corrupt(&self, err: CoreError) -> CoreError {
        CoreError::Internal(format!(
            "corrupt skill record for member {} lyric {}: {err}",
            self.member_id, self.lyric_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn row(level: &str, badges: &[&str]) -> SkillRecordRow {
        SkillRecordRow {
            member_id: 1,
            lyric_id: 2,
            skill_level: level.to_string(),
            practice_count: 5,
            total_practice_minutes: 75,
            last_practice_date: None,
            goal_date: None,
            achievement_badges: badges.iter().map(|b| b.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn converts_level_and_badges() {
        let record = row("proficient", &["reached_learning", "reached_proficient"])
            .into_domain()
            .unwrap();
        assert_eq!(record.skill_level, SkillLevel::Proficient);
        assert_eq!(record.achievement_badges.len(), 2);
    }

    #[test]
    fn unknown_level_is_an_internal_error() {
        assert_matches!(row("guru", &[]).into_domain(), Err(CoreError::Internal(_)));
    }

    #[test]
    fn unknown_badge_is_an_internal_error() {
        assert_matches!(
            row("learning", &["reached_guru"]).into_domain(),
            Err(CoreError::Internal(msg)) if msg.contains("member 1 lyric 2")
        );
    }
}
