//! PostgreSQL implementations of the `choir_core` repository traits.

use async_trait::async_trait;
use choir_core::catalog::{CatalogItem, CatalogQuery};
use choir_core::error::CoreError;
use choir_core::pagination::Page;
use choir_core::practice::{
    LoggedPractice, LyricPracticeTotals, LyricTitle, NewPracticeSession, PracticeSession,
};
use choir_core::repository::{
    CatalogRepository, MemberDirectory, PracticeLogRepository, SkillRecordRepository, StoreHealth,
};
use choir_core::skill::{SkillPolicy, SkillRecord};
use choir_core::types::{Date, DbId, Timestamp};

use crate::models::catalog::group_genres;
use crate::repositories::{CatalogRepo, MemberRepo, PracticeRepo, SkillRecordRepo};
use crate::{health_check, map_db_error, DbPool};

// ---------------------------------------------------------------------------
// Practice log + skill records
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgPracticeStore {
    pool: DbPool,
}

impl PgPracticeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PracticeLogRepository for PgPracticeStore {
    async fn append_and_recompute(
        &self,
        input: &NewPracticeSession,
        practiced_at: Timestamp,
        policy: &SkillPolicy,
    ) -> Result<LoggedPractice, CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        PracticeRepo::lock_pair(&mut tx, input.member_id, input.lyric_id)
            .await
            .map_err(map_db_error)?;
        let session = PracticeRepo::insert(&mut tx, input, practiced_at)
            .await
            .map_err(map_db_error)?
            .into_domain();
        let aggregate = PracticeRepo::aggregate(&mut tx, input.member_id, input.lyric_id)
            .await
            .map_err(map_db_error)?;
        let previous = SkillRecordRepo::find(&mut *tx, input.member_id, input.lyric_id)
            .await
            .map_err(map_db_error)?
            .map(|row| row.into_domain())
            .transpose()?;

        let record = policy.recompute(
            input.member_id,
            input.lyric_id,
            previous.as_ref(),
            &aggregate.into(),
        );
        let skill = SkillRecordRepo::upsert(&mut *tx, &record)
            .await
            .map_err(map_db_error)?
            .into_domain()?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(LoggedPractice { session, skill })
    }

    async fn recent(&self, member_id: DbId, limit: i64) -> Result<Vec<PracticeSession>, CoreError> {
        let rows = PracticeRepo::recent(&self.pool, member_id, limit)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(|row| row.into_domain()).collect())
    }

    async fn lyric_totals(&self, member_id: DbId) -> Result<Vec<LyricPracticeTotals>, CoreError> {
        let rows = PracticeRepo::lyric_totals(&self.pool, member_id)
            .await
            .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SkillRecordRepository for PgPracticeStore {
    async fn find(&self, member_id: DbId, lyric_id: DbId) -> Result<Option<SkillRecord>, CoreError> {
        SkillRecordRepo::find(&self.pool, member_id, lyric_id)
            .await
            .map_err(map_db_error)?
            .map(|row| row.into_domain())
            .transpose()
    }

    async fn list_for_member(&self, member_id: DbId) -> Result<Vec<SkillRecord>, CoreError> {
        SkillRecordRepo::list_for_member(&self.pool, member_id)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(|row| row.into_domain())
            .collect()
    }

    async fn recompute(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        policy: &SkillPolicy,
    ) -> Result<Option<SkillRecord>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        PracticeRepo::lock_pair(&mut tx, member_id, lyric_id)
            .await
            .map_err(map_db_error)?;
        let aggregate = PracticeRepo::aggregate(&mut tx, member_id, lyric_id)
            .await
            .map_err(map_db_error)?;
        if aggregate.practice_count == 0 {
            return Ok(None);
        }
        let previous = SkillRecordRepo::find(&mut *tx, member_id, lyric_id)
            .await
            .map_err(map_db_error)?
            .map(|row| row.into_domain())
            .transpose()?;

        let record = policy.recompute(member_id, lyric_id, previous.as_ref(), &aggregate.into());
        let skill = SkillRecordRepo::upsert(&mut *tx, &record)
            .await
            .map_err(map_db_error)?
            .into_domain()?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(Some(skill))
    }

    async fn set_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        goal_date: Option<Date>,
    ) -> Result<Option<SkillRecord>, CoreError> {
        SkillRecordRepo::set_goal(&self.pool, member_id, lyric_id, goal_date)
            .await
            .map_err(map_db_error)?
            .map(|row| row.into_domain())
            .transpose()
    }
}

#[async_trait]
impl StoreHealth for PgPracticeStore {
    async fn is_healthy(&self) -> bool {
        health_check(&self.pool).await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCatalog {
    pool: DbPool,
}

impl PgCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalog {
    async fn lyric_exists(&self, lyric_id: DbId) -> Result<bool, CoreError> {
        CatalogRepo::exists(&self.pool, lyric_id)
            .await
            .map_err(map_db_error)
    }

    async fn titles(&self) -> Result<Vec<LyricTitle>, CoreError> {
        let rows = CatalogRepo::titles(&self.pool).await.map_err(map_db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Page<CatalogItem>, CoreError> {
        let total_count = CatalogRepo::count(&self.pool, &query.filters)
            .await
            .map_err(map_db_error)?;
        let rows = CatalogRepo::page(&self.pool, query)
            .await
            .map_err(map_db_error)?;

        let ids: Vec<DbId> = rows.iter().map(|row| row.id).collect();
        let mut genres = group_genres(
            CatalogRepo::genres_for(&self.pool, &ids)
                .await
                .map_err(map_db_error)?,
        );
        let items = rows
            .into_iter()
            .map(|row| row.into_item(&mut genres))
            .collect();

        Ok(Page::new(items, total_count, query.page, query.per_page))
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgMembers {
    pool: DbPool,
}

impl PgMembers {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberDirectory for PgMembers {
    async fn member_exists(&self, member_id: DbId) -> Result<bool, CoreError> {
        MemberRepo::exists(&self.pool, member_id)
            .await
            .map_err(map_db_error)
    }
}
