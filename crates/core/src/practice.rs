//! Practice sessions, recommendation ranking, and per-member summaries.
//!
//! The ranking and summary helpers are evaluated against pre-loaded data
//! passed in by the caller; no repository access happens here.

use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::skill::{SkillLevel, SkillRecord};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Longest single session accepted, in minutes (one day).
pub const MAX_SESSION_MINUTES: i32 = 1_440;

/// Maximum length of free-text session notes.
pub const MAX_NOTES_LENGTH: u64 = 2_000;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Input for logging a practice session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPracticeSession {
    pub member_id: DbId,
    pub lyric_id: DbId,
    #[validate(range(
        min = 1,
        max = MAX_SESSION_MINUTES,
        message = "duration_minutes must be between 1 and 1440"
    ))]
    pub duration_minutes: i32,
    #[validate(range(min = 1, max = 5, message = "confidence must be between 1 and 5"))]
    pub confidence: Option<i16>,
    #[validate(length(
        max = MAX_NOTES_LENGTH,
        message = "notes must be at most 2000 characters"
    ))]
    pub notes: Option<String>,
}

impl NewPracticeSession {
    /// Validate field bounds and normalize notes (trimmed, empty dropped).
    pub fn into_validated(mut self) -> Result<Self, CoreError> {
        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.validate()?;
        Ok(self)
    }
}

/// An immutable, logged practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: DbId,
    pub member_id: DbId,
    pub lyric_id: DbId,
    pub duration_minutes: i32,
    pub confidence: Option<i16>,
    pub notes: Option<String>,
    pub practiced_at: Timestamp,
}

/// Result of logging a session: the stored row and the recomputed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedPractice {
    pub session: PracticeSession,
    pub skill: SkillRecord,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// A member's accumulated practice on one lyric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricPracticeTotals {
    pub lyric_id: DbId,
    pub total_minutes: i64,
    /// Confidence from the member's most recent rated session.
    pub confidence: Option<i16>,
}

/// Catalog identity used to name and order recommendations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricTitle {
    pub lyric_id: DbId,
    pub title: String,
}

/// One entry of the least-practiced ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeastPracticed {
    pub lyric_id: DbId,
    pub title: String,
    pub total_minutes: i64,
    pub confidence: Option<i16>,
}

/// Rank catalog lyrics by how little the member has practiced them.
///
/// Every lyric in `titles` is a candidate; lyrics absent from `totals` count
/// as never practiced (zero minutes, no confidence). Order is total minutes
/// ascending, then confidence ascending with unrated first, then title
/// (case-insensitive), then lyric id.
pub fn rank_least_practiced(
    titles: &[LyricTitle],
    totals: &[LyricPracticeTotals],
    n: usize,
) -> Vec<LeastPracticed> {
    let by_lyric: HashMap<DbId, &LyricPracticeTotals> =
        totals.iter().map(|t| (t.lyric_id, t)).collect();

    let mut ranked: Vec<LeastPracticed> = titles
        .iter()
        .map(|t| {
            let practiced = by_lyric.get(&t.lyric_id);
            LeastPracticed {
                lyric_id: t.lyric_id,
                title: t.title.clone(),
                total_minutes: practiced.map_or(0, |p| p.total_minutes),
                confidence: practiced.and_then(|p| p.confidence),
            }
        })
        .collect();

    ranked.sort_by(compare_least_practiced);
    ranked.truncate(n);
    ranked
}

fn compare_least_practiced(a: &LeastPracticed, b: &LeastPracticed) -> Ordering {
    a.total_minutes
        .cmp(&b.total_minutes)
        // `None < Some(_)`, so unrated lyrics come first.
        .then_with(|| a.confidence.cmp(&b.confidence))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.lyric_id.cmp(&b.lyric_id))
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Dashboard totals across all of a member's skill records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeSummary {
    pub member_id: DbId,
    pub total_sessions: i64,
    pub total_minutes: i64,
    pub lyrics_practiced: i64,
    pub goals_set: i64,
    pub level_counts: IndexMap<&'static str, i64>,
}

/// Fold a member's skill records into a [`PracticeSummary`].
pub fn summarize(member_id: DbId, records: &[SkillRecord]) -> PracticeSummary {
    let mut level_counts: IndexMap<&'static str, i64> =
        SkillLevel::ALL.iter().map(|l| (l.as_str(), 0)).collect();

    for record in records {
        *level_counts.entry(record.skill_level.as_str()).or_insert(0) += 1;
    }

    PracticeSummary {
        member_id,
        total_sessions: records.iter().map(|r| r.practice_count).sum(),
        total_minutes: records.iter().map(|r| r.total_practice_minutes).sum(),
        lyrics_practiced: records.len() as i64,
        goals_set: records.iter().filter(|r| r.goal_date.is_some()).count() as i64,
        level_counts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
