//! Repository for the `skill_records` table.

use choir_core::skill::SkillRecord;
use choir_core::types::{Date, DbId};
use sqlx::{PgExecutor, PgPool};

use crate::models::skill_record::SkillRecordRow;

/// Column list for `skill_records` queries.
const COLUMNS: &str = "member_id, lyric_id, skill_level, practice_count, \
    total_practice_minutes, last_practice_date, goal_date, achievement_badges, \
    created_at, updated_at";

pub struct SkillRecordRepo;

impl SkillRecordRepo {
    /// Find the record for a pair.
    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        member_id: DbId,
        lyric_id: DbId,
    ) -> Result<Option<SkillRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM skill_records \
             WHERE member_id = $1 AND lyric_id = $2"
        );
        sqlx::query_as::<_, SkillRecordRow>(&query)
            .bind(member_id)
            .bind(lyric_id)
            .fetch_optional(executor)
            .await
    }

    /// All records for a member, ordered by lyric id.
    pub async fn list_for_member(
        pool: &PgPool,
        member_id: DbId,
    ) -> Result<Vec<SkillRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM skill_records \
             WHERE member_id = $1 \
             ORDER BY lyric_id"
        );
        sqlx::query_as::<_, SkillRecordRow>(&query)
            .bind(member_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the derived columns of a record.
    ///
    /// `goal_date` is only written on insert; an existing goal is kept.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        record: &SkillRecord,
    ) -> Result<SkillRecordRow, sqlx::Error> {
        let badges: Vec<String> = record
            .achievement_badges
            .iter()
            .map(|b| b.as_str().to_string())
            .collect();

        let query = format!(
            "INSERT INTO skill_records \
                (member_id, lyric_id, skill_level, practice_count, total_practice_minutes, \
                 last_practice_date, goal_date, achievement_badges) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (member_id, lyric_id) DO UPDATE SET \
                 skill_level = EXCLUDED.skill_level, \
                 practice_count = EXCLUDED.practice_count, \
                 total_practice_minutes = EXCLUDED.total_practice_minutes, \
                 last_practice_date = EXCLUDED.last_practice_date, \
                 achievement_badges = EXCLUDED.achievement_badges, \
                 updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SkillRecordRow>(&query)
            .bind(record.member_id)
            .bind(record.lyric_id)
            .bind(record.skill_level.as_str())
            .bind(record.practice_count)
            .bind(record.total_practice_minutes)
            .bind(record.last_practice_date)
            .bind(record.goal_date)
            .bind(badges)
            .fetch_one(executor)
            .await
    }

    /// Overwrite or clear the goal date. Returns `None` if no record exists.
    pub async fn set_goal(
        pool: &PgPool,
        member_id: DbId,
        lyric_id: DbId,
        goal_date: Option<Date>,
    ) -> Result<Option<SkillRecordRow>, sqlx::Error> {
        let query = format!(
            "UPDATE skill_records SET goal_date = $3, updated_at = now() \
             WHERE member_id = $1 AND lyric_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SkillRecordRow>(&query)
            .bind(member_id)
            .bind(lyric_id)
            .bind(goal_date)
            .fetch_optional(pool)
            .await
    }
}
