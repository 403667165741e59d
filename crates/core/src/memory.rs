//! In-memory repositories for tests and database-free deployments.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::catalog::{CatalogItem, CatalogQuery};
use crate::error::CoreError;
use crate::pagination::{page_offset, Page};
use crate::practice::{
    LoggedPractice, LyricPracticeTotals, LyricTitle, NewPracticeSession, PracticeSession,
};
use crate::repository::{
    CatalogRepository, MemberDirectory, PracticeLogRepository, SkillRecordRepository, StoreHealth,
};
use crate::skill::{SessionAggregate, SkillPolicy, SkillRecord};
use crate::types::{Date, DbId, Timestamp};

fn poisoned(name: &str) -> CoreError {
    CoreError::Internal(format!("{name} lock poisoned"))
}

// ---------------------------------------------------------------------------
// Practice log + skill records
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct PracticeState {
    sessions: Vec<PracticeSession>,
    records: HashMap<(DbId, DbId), SkillRecord>,
    last_id: DbId,
}

impl PracticeState {
    fn aggregate(&self, member_id: DbId, lyric_id: DbId) -> SessionAggregate {
        let mut aggregate = SessionAggregate {
            practice_count: 0,
            total_minutes: 0,
            last_practiced_at: None,
        };
        for s in self
            .sessions
            .iter()
            .filter(|s| s.member_id == member_id && s.lyric_id == lyric_id)
        {
            aggregate.practice_count += 1;
            aggregate.total_minutes += i64::from(s.duration_minutes);
            aggregate.last_practiced_at = aggregate.last_practiced_at.max(Some(s.practiced_at));
        }
        aggregate
    }

    fn recompute(
        &mut self,
        member_id: DbId,
        lyric_id: DbId,
        policy: &SkillPolicy,
    ) -> Option<SkillRecord> {
        let aggregate = self.aggregate(member_id, lyric_id);
        if aggregate.practice_count == 0 {
            return None;
        }
        let key = (member_id, lyric_id);
        let record = policy.recompute(member_id, lyric_id, self.records.get(&key), &aggregate);
        self.records.insert(key, record.clone());
        Some(record)
    }
}

/// Practice sessions and skill records behind a single lock, so an append
/// and its recompute are observed together.
#[derive(Debug, Default)]
pub struct InMemoryPracticeStore {
    state: RwLock<PracticeState>,
}

impl InMemoryPracticeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PracticeState>, CoreError> {
        self.state.read().map_err(|_| poisoned("practice store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PracticeState>, CoreError> {
        self.state.write().map_err(|_| poisoned("practice store"))
    }
}

#[async_trait]
impl PracticeLogRepository for InMemoryPracticeStore {
    async fn append_and_recompute(
        &self,
        input: &NewPracticeSession,
        practiced_at: Timestamp,
        policy: &SkillPolicy,
    ) -> Result<LoggedPractice, CoreError> {
        let mut state = self.write()?;

        state.last_id += 1;
        let session = PracticeSession {
            id: state.last_id,
            member_id: input.member_id,
            lyric_id: input.lyric_id,
            duration_minutes: input.duration_minutes,
            confidence: input.confidence,
            notes: input.notes.clone(),
            practiced_at,
        };
        state.sessions.push(session.clone());

        let skill = state
            .recompute(input.member_id, input.lyric_id, policy)
            .ok_or_else(|| CoreError::Internal("appended session missing from log".to_string()))?;

        Ok(LoggedPractice { session, skill })
    }

    async fn recent(&self, member_id: DbId, limit: i64) -> Result<Vec<PracticeSession>, CoreError> {
        let state = self.read()?;
        let mut sessions: Vec<PracticeSession> = state
            .sessions
            .iter()
            .filter(|s| s.member_id == member_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.practiced_at
                .cmp(&a.practiced_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        sessions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(sessions)
    }

    async fn lyric_totals(&self, member_id: DbId) -> Result<Vec<LyricPracticeTotals>, CoreError> {
        let state = self.read()?;

        // lyric -> (minutes, latest rated (practiced_at, id, confidence))
        let mut by_lyric: HashMap<DbId, (i64, Option<(Timestamp, DbId, i16)>)> = HashMap::new();
        for s in state.sessions.iter().filter(|s| s.member_id == member_id) {
            let entry = by_lyric.entry(s.lyric_id).or_insert((0, None));
            entry.0 += i64::from(s.duration_minutes);
            if let Some(confidence) = s.confidence {
                let candidate = (s.practiced_at, s.id, confidence);
                let newer = entry
                    .1
                    .map_or(true, |(time, id, _)| (time, id) < (candidate.0, candidate.1));
                if newer {
                    entry.1 = Some(candidate);
                }
            }
        }

        let mut totals: Vec<LyricPracticeTotals> = by_lyric
            .into_iter()
            .map(|(lyric_id, (total_minutes, latest))| LyricPracticeTotals {
                lyric_id,
                total_minutes,
                confidence: latest.map(|(_, _, c)| c),
            })
            .collect();
        totals.sort_by_key(|t| t.lyric_id);
        Ok(totals)
    }
}

#[async_trait]
impl SkillRecordRepository for InMemoryPracticeStore {
    async fn find(&self, member_id: DbId, lyric_id: DbId) -> Result<Option<SkillRecord>, CoreError> {
        Ok(self.read()?.records.get(&(member_id, lyric_id)).cloned())
    }

    async fn list_for_member(&self, member_id: DbId) -> Result<Vec<SkillRecord>, CoreError> {
        let state = self.read()?;
        let mut records: Vec<SkillRecord> = state
            .records
            .values()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.lyric_id);
        Ok(records)
    }

    async fn recompute(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        policy: &SkillPolicy,
    ) -> Result<Option<SkillRecord>, CoreError> {
        Ok(self.write()?.recompute(member_id, lyric_id, policy))
    }

    async fn set_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        goal_date: Option<Date>,
    ) -> Result<Option<SkillRecord>, CoreError> {
        let mut state = self.write()?;
        Ok(state.records.get_mut(&(member_id, lyric_id)).map(|record| {
            record.goal_date = goal_date;
            record.clone()
        }))
    }
}

#[async_trait]
impl StoreHealth for InMemoryPracticeStore {
    async fn is_healthy(&self) -> bool {
        self.state.read().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A fixed lyric catalog held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn lyric_exists(&self, lyric_id: DbId) -> Result<bool, CoreError> {
        Ok(self.items.iter().any(|item| item.id == lyric_id))
    }

    async fn titles(&self) -> Result<Vec<LyricTitle>, CoreError> {
        Ok(self
            .items
            .iter()
            .map(|item| LyricTitle {
                lyric_id: item.id,
                title: item.title.clone(),
            })
            .collect())
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Page<CatalogItem>, CoreError> {
        let mut matched: Vec<&CatalogItem> = self
            .items
            .iter()
            .filter(|item| query.filters.matches(item))
            .collect();
        matched.sort_by(|a, b| query.sort.compare(a, b));

        let total_count = matched.len() as i64;
        let offset = usize::try_from(page_offset(query.page, query.per_page)).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.per_page).unwrap_or(0);
        let page_items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(Page::new(page_items, total_count, query.page, query.per_page))
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// A fixed set of known member ids.
#[derive(Debug, Default)]
pub struct InMemoryMembers {
    ids: HashSet<DbId>,
}

impl InMemoryMembers {
    pub fn new(ids: impl IntoIterator<Item = DbId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMembers {
    async fn member_exists(&self, member_id: DbId) -> Result<bool, CoreError> {
        Ok(self.ids.contains(&member_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
