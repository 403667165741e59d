//! Practice session rows and aggregates.

use choir_core::practice::{LyricPracticeTotals, PracticeSession};
use choir_core::skill::SessionAggregate;
use choir_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `practice_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PracticeSessionRow {
    pub id: DbId,
    pub member_id: DbId,
    pub lyric_id: DbId,
    pub duration_minutes: i32,
    pub confidence: Option<i16>,
    pub notes: Option<String>,
    pub practiced_at: Timestamp,
}

impl PracticeSessionRow {
    pub fn into_domain(self) -> PracticeSession {
        PracticeSession {
            id: self.id,
            member_id: self.member_id,
            lyric_id: self.lyric_id,
            duration_minutes: self.duration_minutes,
            confidence: self.confidence,
            notes: self.notes,
            practiced_at: self.practiced_at,
        }
    }
}

/// COUNT / SUM / MAX over one pair's sessions.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct SessionAggregateRow {
    pub practice_count: i64,
    pub total_minutes: i64,
    pub last_practiced_at: Option<Timestamp>,
}

impl From<SessionAggregateRow> for SessionAggregate {
    fn from(row: SessionAggregateRow) -> Self {
        Self {
            practice_count: row.practice_count,
            total_minutes: row.total_minutes,
            last_practiced_at: row.last_practiced_at,
        }
    }
}

/// Per-lyric totals for one member.
#[derive(Debug, Clone, FromRow)]
pub struct LyricTotalsRow {
    pub lyric_id: DbId,
    pub total_minutes: i64,
    pub confidence: Option<i16>,
}

impl From<LyricTotalsRow> for LyricPracticeTotals {
    fn from(row: LyricTotalsRow) -> Self {
        Self {
            lyric_id: row.lyric_id,
            total_minutes: row.total_minutes,
            confidence: row.confidence,
        }
    }
}
