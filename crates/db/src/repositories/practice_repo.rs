//! Repository for the `practice_sessions` table.

use choir_core::practice::NewPracticeSession;
use choir_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::practice::{LyricTotalsRow, PracticeSessionRow, SessionAggregateRow};

/// Column list for `practice_sessions` queries.
const COLUMNS: &str =
    "id, member_id, lyric_id, duration_minutes, confidence, notes, practiced_at";

/// Append-only access to practice sessions.
pub struct PracticeRepo;

impl PracticeRepo {
    /// Serialize writers for one (member, lyric) pair until the surrounding
    /// transaction ends.
    pub async fn lock_pair(
        conn: &mut PgConnection,
        member_id: DbId,
        lyric_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{member_id}:{lyric_id}"))
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Insert a session with a server-assigned timestamp.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewPracticeSession,
        practiced_at: Timestamp,
    ) -> Result<PracticeSessionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO practice_sessions \
                (member_id, lyric_id, duration_minutes, confidence, notes, practiced_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PracticeSessionRow>(&query)
            .bind(input.member_id)
            .bind(input.lyric_id)
            .bind(input.duration_minutes)
            .bind(input.confidence)
            .bind(&input.notes)
            .bind(practiced_at)
            .fetch_one(conn)
            .await
    }

    /// Count, minute sum, and latest timestamp for one pair.
    pub async fn aggregate(
        conn: &mut PgConnection,
        member_id: DbId,
        lyric_id: DbId,
    ) -> Result<SessionAggregateRow, sqlx::Error> {
        sqlx::query_as::<_, SessionAggregateRow>(
            "SELECT COUNT(*) AS practice_count, \
                    COALESCE(SUM(duration_minutes), 0)::BIGINT AS total_minutes, \
                    MAX(practiced_at) AS last_practiced_at \
             FROM practice_sessions \
             WHERE member_id = $1 AND lyric_id = $2",
        )
        .bind(member_id)
        .bind(lyric_id)
        .fetch_one(conn)
        .await
    }

    /// Most recent sessions for a member, newest first.
    pub async fn recent(
        pool: &PgPool,
        member_id: DbId,
        limit: i64,
    ) -> Result<Vec<PracticeSessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM practice_sessions \
             WHERE member_id = $1 \
             ORDER BY practiced_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, PracticeSessionRow>(&query)
            .bind(member_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Minutes per lyric and the confidence of the latest rated session.
    pub async fn lyric_totals(
        pool: &PgPool,
        member_id: DbId,
    ) -> Result<Vec<LyricTotalsRow>, sqlx::Error> {
        sqlx::query_as::<_, LyricTotalsRow>(
            "SELECT lyric_id, \
                    SUM(duration_minutes)::BIGINT AS total_minutes, \
                    (ARRAY_AGG(confidence ORDER BY practiced_at DESC, id DESC) \
                        FILTER (WHERE confidence IS NOT NULL))[1] AS confidence \
             FROM practice_sessions \
             WHERE member_id = $1 \
             GROUP BY lyric_id \
             ORDER BY lyric_id",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
    }
}
