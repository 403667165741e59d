//! Storage seams injected into the services.
//!
//! Each trait is object-safe so services hold `Arc<dyn ...>` and the binary
//! decides between the PostgreSQL and in-memory implementations.

use async_trait::async_trait;

use crate::catalog::{CatalogItem, CatalogQuery};
use crate::error::CoreError;
use crate::pagination::Page;
use crate::practice::{
    LoggedPractice, LyricPracticeTotals, LyricTitle, NewPracticeSession, PracticeSession,
};
use crate::skill::{SkillPolicy, SkillRecord};
use crate::types::{Date, DbId, Timestamp};

/// Append-only practice session storage.
#[async_trait]
pub trait PracticeLogRepository: Send + Sync {
    /// Append a validated session and recompute its pair's skill record.
    ///
    /// Both writes happen in one atomic unit: either the session and the
    /// recomputed record are stored, or neither is.
    async fn append_and_recompute(
        &self,
        session: &NewPracticeSession,
        practiced_at: Timestamp,
        policy: &SkillPolicy,
    ) -> Result<LoggedPractice, CoreError>;

    /// Most recent sessions first, ties broken by id descending.
    async fn recent(&self, member_id: DbId, limit: i64) -> Result<Vec<PracticeSession>, CoreError>;

    /// Per-lyric minute totals and latest confidence for a member.
    async fn lyric_totals(&self, member_id: DbId) -> Result<Vec<LyricPracticeTotals>, CoreError>;
}

/// Derived skill record storage.
#[async_trait]
pub trait SkillRecordRepository: Send + Sync {
    async fn find(&self, member_id: DbId, lyric_id: DbId) -> Result<Option<SkillRecord>, CoreError>;

    /// All records for a member, ordered by lyric id.
    async fn list_for_member(&self, member_id: DbId) -> Result<Vec<SkillRecord>, CoreError>;

    /// Rebuild a pair's record from the session log, outside of an append.
    ///
    /// Takes the same per-pair exclusion as
    /// [`PracticeLogRepository::append_and_recompute`] and applies the same
    /// [`SkillPolicy::recompute`]. Returns `None` when the pair has no
    /// sessions.
    async fn recompute(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        policy: &SkillPolicy,
    ) -> Result<Option<SkillRecord>, CoreError>;

    /// Overwrite (or clear, with `None`) the goal date of an existing record.
    ///
    /// Returns `None` when no record exists for the pair.
    async fn set_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        goal_date: Option<Date>,
    ) -> Result<Option<SkillRecord>, CoreError>;
}

/// Read access to lyric attributes. The catalog's lifecycle is owned elsewhere.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn lyric_exists(&self, lyric_id: DbId) -> Result<bool, CoreError>;

    /// Every lyric's id and title, the candidate set for recommendations.
    async fn titles(&self) -> Result<Vec<LyricTitle>, CoreError>;

    /// One filtered, sorted page plus the total match count.
    async fn search(&self, query: &CatalogQuery) -> Result<Page<CatalogItem>, CoreError>;
}

/// Resolves member identities managed by an external system.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn member_exists(&self, member_id: DbId) -> Result<bool, CoreError>;
}

/// Liveness check for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn is_healthy(&self) -> bool;
}
