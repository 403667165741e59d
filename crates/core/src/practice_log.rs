//! Practice Log service: logs sessions and answers history queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::error::CoreError;
use crate::pagination::{
    clamp_limit, DEFAULT_RECENT_LIMIT, DEFAULT_RECOMMENDATION_LIMIT, MAX_RECENT_LIMIT,
    MAX_RECOMMENDATION_LIMIT,
};
use crate::practice::{
    rank_least_practiced, summarize, LeastPracticed, LoggedPractice, NewPracticeSession,
    PracticeSession, PracticeSummary,
};
use crate::repository::{CatalogRepository, MemberDirectory, PracticeLogRepository};
use crate::skill_aggregator::SkillAggregator;
use crate::types::DbId;

/// One async mutex per (member, lyric) pair.
///
/// Entries nobody is holding are dropped on the next acquisition so the map
/// only grows with concurrent writers.
#[derive(Debug, Default)]
struct PairLocks {
    inner: Mutex<HashMap<(DbId, DbId), Arc<tokio::sync::Mutex<()>>>>,
}

impl PairLocks {
    fn lock_for(&self, member_id: DbId, lyric_id: DbId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry((member_id, lyric_id)).or_default().clone()
    }
}

pub struct PracticeLog {
    log: Arc<dyn PracticeLogRepository>,
    catalog: Arc<dyn CatalogRepository>,
    members: Arc<dyn MemberDirectory>,
    skills: Arc<SkillAggregator>,
    locks: PairLocks,
}

impl PracticeLog {
    pub fn new(
        log: Arc<dyn PracticeLogRepository>,
        catalog: Arc<dyn CatalogRepository>,
        members: Arc<dyn MemberDirectory>,
        skills: Arc<SkillAggregator>,
    ) -> Self {
        Self {
            log,
            catalog,
            members,
            skills,
            locks: PairLocks::default(),
        }
    }

    /// Validate and append a session, returning it with the recomputed
    /// skill record for its pair.
    ///
    /// Unknown members or lyrics are validation failures; nothing is stored.
    pub async fn log_session(
        &self,
        input: NewPracticeSession,
    ) -> Result<LoggedPractice, CoreError> {
        let input = input.into_validated()?;

        if !self.members.member_exists(input.member_id).await? {
            return Err(CoreError::Validation(format!(
                "member_id {} does not reference an existing member",
                input.member_id
            )));
        }
        if !self.catalog.lyric_exists(input.lyric_id).await? {
            return Err(CoreError::Validation(format!(
                "lyric_id {} does not reference an existing lyric",
                input.lyric_id
            )));
        }

        let pair_lock = self.locks.lock_for(input.member_id, input.lyric_id);
        let _guard = pair_lock.lock().await;

        let logged = self
            .log
            .append_and_recompute(&input, Utc::now(), self.skills.policy())
            .await?;

        tracing::info!(
            session_id = logged.session.id,
            member_id = input.member_id,
            lyric_id = input.lyric_id,
            duration_minutes = input.duration_minutes,
            skill_level = logged.skill.skill_level.as_str(),
            practice_count = logged.skill.practice_count,
            "Practice session logged",
        );
        Ok(logged)
    }

    /// Most recent sessions for a member. `limit` is clamped to 1..=100.
    pub async fn recent_sessions(
        &self,
        member_id: DbId,
        limit: Option<i64>,
    ) -> Result<Vec<PracticeSession>, CoreError> {
        self.ensure_member(member_id).await?;
        let limit = clamp_limit(limit, DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT);
        let sessions = self.log.recent(member_id, limit).await?;
        tracing::debug!(member_id, limit, count = sessions.len(), "Loaded recent sessions");
        Ok(sessions)
    }

    /// Catalog lyrics the member has spent the least time on.
    /// `n` is clamped to 1..=50.
    pub async fn least_practiced(
        &self,
        member_id: DbId,
        n: Option<i64>,
    ) -> Result<Vec<LeastPracticed>, CoreError> {
        self.ensure_member(member_id).await?;
        let n = clamp_limit(n, DEFAULT_RECOMMENDATION_LIMIT, MAX_RECOMMENDATION_LIMIT);

        let titles = self.catalog.titles().await?;
        let totals = self.log.lyric_totals(member_id).await?;
        let ranked = rank_least_practiced(&titles, &totals, n as usize);

        tracing::debug!(member_id, n, candidates = titles.len(), "Ranked practice recommendations");
        Ok(ranked)
    }

    /// Aggregate totals across all of a member's skill records.
    pub async fn practice_summary(&self, member_id: DbId) -> Result<PracticeSummary, CoreError> {
        let records = self.skills.list_skills(member_id).await?;
        Ok(summarize(member_id, &records))
    }

    async fn ensure_member(&self, member_id: DbId) -> Result<(), CoreError> {
        if self.members.member_exists(member_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "Member",
                id: member_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::CatalogItem;
    use crate::memory::{InMemoryCatalog, InMemoryMembers, InMemoryPracticeStore};
    use crate::repository::SkillRecordRepository;
    use crate::skill::{Badge, SkillLevel, SkillPolicy, SkillRecord};

    const MEMBER: DbId = 1;
    const LYRIC_A: DbId = 1;
    const LYRIC_B: DbId = 2;
    const LYRIC_C: DbId = 3;

    fn lyric(id: DbId, title: &str) -> CatalogItem {
        let added = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        CatalogItem {
            id,
            title: title.to_string(),
            composer: None,
            language: None,
            difficulty: None,
            genres: vec![],
            year: None,
            excerpt: None,
            date_added: added,
            last_modified: added,
        }
    }

    struct Fixture {
        service: PracticeLog,
        store: Arc<InMemoryPracticeStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryPracticeStore::new());
        let members = Arc::new(InMemoryMembers::new([MEMBER, 2]));
        let catalog = Arc::new(InMemoryCatalog::new(vec![
            lyric(LYRIC_A, "A"),
            lyric(LYRIC_B, "B"),
            lyric(LYRIC_C, "C"),
        ]));
        let skills = Arc::new(SkillAggregator::new(
            store.clone(),
            members.clone(),
            SkillPolicy::default(),
        ));
        let service = PracticeLog::new(store.clone(), catalog, members, skills);
        Fixture { service, store }
    }

    fn session(lyric_id: DbId, minutes: i32, confidence: Option<i16>) -> NewPracticeSession {
        NewPracticeSession {
            member_id: MEMBER,
            lyric_id,
            duration_minutes: minutes,
            confidence,
            notes: None,
        }
    }

    async fn stored(store: &InMemoryPracticeStore, member_id: DbId, lyric_id: DbId) -> SkillRecord {
        store.find(member_id, lyric_id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn log_session_returns_session_and_skill() {
        let f = fixture();
        let logged = f
            .service
            .log_session(session(LYRIC_A, 30, Some(3)))
            .await
            .unwrap();

        assert_eq!(logged.session.duration_minutes, 30);
        assert_eq!(logged.session.confidence, Some(3));
        assert_eq!(logged.skill.practice_count, 1);
        assert_eq!(logged.skill.skill_level, SkillLevel::Learning);
        assert!(logged.skill.achievement_badges.contains(&Badge::ReachedLearning));
    }

    #[tokio::test]
    async fn counts_and_minutes_track_the_log() {
        let f = fixture();
        let durations = [10, 20, 30, 5, 15];
        for minutes in durations {
            f.service
                .log_session(session(LYRIC_B, minutes, None))
                .await
                .unwrap();
        }

        let record = stored(&f.store, MEMBER, LYRIC_B).await;
        assert_eq!(record.practice_count, durations.len() as i64);
        assert_eq!(record.total_practice_minutes, 80);
        assert_eq!(record.skill_level, SkillLevel::Proficient);
    }

    #[tokio::test]
    async fn invalid_duration_changes_no_state() {
        let f = fixture();
        for minutes in [0, -5] {
            assert_matches!(
                f.service.log_session(session(LYRIC_A, minutes, None)).await,
                Err(CoreError::Validation(_))
            );
        }
        assert!(f.service.recent_sessions(MEMBER, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_lyric_or_member_is_a_validation_error() {
        let f = fixture();
        assert_matches!(
            f.service.log_session(session(404, 10, None)).await,
            Err(CoreError::Validation(msg)) if msg.contains("lyric_id")
        );

        let mut stranger = session(LYRIC_A, 10, None);
        stranger.member_id = 77;
        assert_matches!(
            f.service.log_session(stranger).await,
            Err(CoreError::Validation(msg)) if msg.contains("member_id")
        );
    }

    #[tokio::test]
    async fn recent_sessions_clamps_limit() {
        let f = fixture();
        for _ in 0..3 {
            f.service
                .log_session(session(LYRIC_A, 10, None))
                .await
                .unwrap();
        }

        let one = f.service.recent_sessions(MEMBER, Some(0)).await.unwrap();
        assert_eq!(one.len(), 1);
        let all = f.service.recent_sessions(MEMBER, Some(500)).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[2].id);
    }

    #[tokio::test]
    async fn reads_for_unknown_member_are_not_found() {
        let f = fixture();
        assert_matches!(
            f.service.recent_sessions(404, None).await,
            Err(CoreError::NotFound { entity: "Member", id: 404 })
        );
        assert_matches!(
            f.service.least_practiced(404, None).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn least_practiced_ranks_never_practiced_first() {
        let f = fixture();
        f.service
            .log_session(session(LYRIC_A, 10, Some(4)))
            .await
            .unwrap();
        f.service
            .log_session(session(LYRIC_C, 5, Some(2)))
            .await
            .unwrap();

        let ranked = f.service.least_practiced(MEMBER, Some(3)).await.unwrap();
        let ids: Vec<_> = ranked.iter().map(|r| r.lyric_id).collect();
        assert_eq!(ids, vec![LYRIC_B, LYRIC_C, LYRIC_A]);
    }

    #[tokio::test]
    async fn practice_summary_totals_records() {
        let f = fixture();
        f.service
            .log_session(session(LYRIC_A, 10, None))
            .await
            .unwrap();
        f.service
            .log_session(session(LYRIC_B, 25, None))
            .await
            .unwrap();

        let summary = f.service.practice_summary(MEMBER).await.unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_minutes, 35);
        assert_eq!(summary.lyrics_practiced, 2);
        assert_eq!(summary.level_counts["learning"], 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_logs_for_one_pair_are_all_counted() {
        let f = fixture();
        let service = Arc::new(f.service);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.log_session(session(LYRIC_A, 3, None)).await })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let record = stored(&f.store, MEMBER, LYRIC_A).await;
        assert_eq!(record.practice_count, 20);
        assert_eq!(record.total_practice_minutes, 60);
        assert_eq!(record.skill_level, SkillLevel::Master);
    }
}
