//! Skill Aggregator service: skill record reads, recomputation, and goals.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use crate::error::CoreError;
use crate::practice::PracticeSession;
use crate::repository::{MemberDirectory, SkillRecordRepository};
use crate::skill::{parse_goal_date, SkillLevelInfo, SkillPolicy, SkillRecord};
use crate::types::{Date, DbId};

pub struct SkillAggregator {
    records: Arc<dyn SkillRecordRepository>,
    members: Arc<dyn MemberDirectory>,
    policy: SkillPolicy,
}

impl SkillAggregator {
    pub fn new(
        records: Arc<dyn SkillRecordRepository>,
        members: Arc<dyn MemberDirectory>,
        policy: SkillPolicy,
    ) -> Self {
        Self {
            records,
            members,
            policy,
        }
    }

    pub fn policy(&self) -> &SkillPolicy {
        &self.policy
    }

    /// Rebuild the skill record for a session's pair from the full log.
    ///
    /// [`PracticeLog::log_session`](crate::practice_log::PracticeLog::log_session)
    /// already recomputes inside its append. This is the standalone re-sync
    /// entry point, for records that need rebuilding after the thresholds
    /// change or after sessions were imported outside the service.
    pub async fn on_session_logged(
        &self,
        session: &PracticeSession,
    ) -> Result<SkillRecord, CoreError> {
        let record = self
            .records
            .recompute(session.member_id, session.lyric_id, &self.policy)
            .await?
            .ok_or_else(|| CoreError::skill_not_found(session.lyric_id))?;

        tracing::info!(
            member_id = session.member_id,
            lyric_id = session.lyric_id,
            skill_level = record.skill_level.as_str(),
            "Skill record recomputed",
        );
        Ok(record)
    }

    /// The member's record for a lyric, with its level re-derived under the
    /// current thresholds.
    pub async fn get_skill(
        &self,
        member_id: DbId,
        lyric_id: DbId,
    ) -> Result<Option<SkillRecord>, CoreError> {
        self.ensure_member(member_id).await?;
        let record = self.records.find(member_id, lyric_id).await?;
        tracing::debug!(member_id, lyric_id, found = record.is_some(), "Loaded skill record");
        Ok(record.map(|r| self.policy.rederive(r)))
    }

    /// All of a member's records ordered by lyric id.
    pub async fn list_skills(&self, member_id: DbId) -> Result<Vec<SkillRecord>, CoreError> {
        self.ensure_member(member_id).await?;
        let records = self.records.list_for_member(member_id).await?;
        Ok(records
            .into_iter()
            .map(|r| self.policy.rederive(r))
            .collect())
    }

    /// Set or overwrite the goal date (`YYYY-MM-DD`, today or later in UTC).
    pub async fn set_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        goal_date: &str,
    ) -> Result<SkillRecord, CoreError> {
        let goal = parse_goal_date(goal_date, Utc::now().date_naive())?;
        let record = self.write_goal(member_id, lyric_id, Some(goal)).await?;
        tracing::info!(member_id, lyric_id, goal_date = %goal, "Goal date set");
        Ok(record)
    }

    pub async fn clear_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
    ) -> Result<SkillRecord, CoreError> {
        let record = self.write_goal(member_id, lyric_id, None).await?;
        tracing::info!(member_id, lyric_id, "Goal date cleared");
        Ok(record)
    }

    /// Ordered level table with display metadata and active thresholds.
    pub fn skill_levels(&self) -> IndexMap<&'static str, SkillLevelInfo> {
        self.policy.levels()
    }

    async fn write_goal(
        &self,
        member_id: DbId,
        lyric_id: DbId,
        goal: Option<Date>,
    ) -> Result<SkillRecord, CoreError> {
        self.ensure_member(member_id).await?;
        self.records
            .set_goal(member_id, lyric_id, goal)
            .await?
            .map(|r| self.policy.rederive(r))
            .ok_or_else(|| CoreError::skill_not_found(lyric_id))
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
    use chrono::Duration;

    use super::*;
    use crate::memory::{InMemoryMembers, InMemoryPracticeStore};
    use crate::practice::NewPracticeSession;
    use crate::repository::PracticeLogRepository;
    use crate::skill::{Badge, LevelThreshold, SkillLevel};

    const MEMBER: DbId = 1;
    const LYRIC: DbId = 10;

    fn aggregator(store: Arc<InMemoryPracticeStore>, policy: SkillPolicy) -> SkillAggregator {
        SkillAggregator::new(store, Arc::new(InMemoryMembers::new([MEMBER])), policy)
    }

    async fn practice(store: &InMemoryPracticeStore, times: usize) {
        let input = NewPracticeSession {
            member_id: MEMBER,
            lyric_id: LYRIC,
            duration_minutes: 15,
            confidence: None,
            notes: None,
        };
        for _ in 0..times {
            store
                .append_and_recompute(&input, Utc::now(), &SkillPolicy::default())
                .await
                .unwrap();
        }
    }

    fn day_offset(days: i64) -> String {
        (Utc::now().date_naive() + Duration::days(days)).to_string()
    }

    #[tokio::test]
    async fn get_skill_is_none_before_any_practice() {
        let store = Arc::new(InMemoryPracticeStore::new());
        let skills = aggregator(store, SkillPolicy::default());
        assert!(skills.get_skill(MEMBER, LYRIC).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_skill_for_unknown_member_is_not_found() {
        let store = Arc::new(InMemoryPracticeStore::new());
        let skills = aggregator(store, SkillPolicy::default());
        assert_matches!(
            skills.get_skill(99, LYRIC).await,
            Err(CoreError::NotFound { entity: "Member", .. })
        );
    }

    #[tokio::test]
    async fn get_skill_rederives_under_current_policy() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 6).await;

        let strict = SkillPolicy::new(
            LevelThreshold::sessions(1),
            LevelThreshold::sessions(8),
            LevelThreshold::sessions(12),
        )
        .unwrap();
        let skills = aggregator(store, strict);

        let record = skills.get_skill(MEMBER, LYRIC).await.unwrap().unwrap();
        assert_eq!(record.skill_level, SkillLevel::Learning);
        assert!(record.achievement_badges.contains(&Badge::ReachedProficient));
    }

    #[tokio::test]
    async fn on_session_logged_recomputes_from_log() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 4).await;
        let skills = aggregator(store.clone(), SkillPolicy::default());

        let recent = store.recent(MEMBER, 1).await.unwrap();
        let record = skills.on_session_logged(&recent[0]).await.unwrap();
        assert_eq!(record.practice_count, 4);
        assert_eq!(record.total_practice_minutes, 60);
    }

    #[tokio::test]
    async fn goal_tomorrow_is_set_and_visible() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 1).await;
        let skills = aggregator(store, SkillPolicy::default());

        let tomorrow = day_offset(1);
        skills.set_goal(MEMBER, LYRIC, &tomorrow).await.unwrap();

        let record = skills.get_skill(MEMBER, LYRIC).await.unwrap().unwrap();
        assert_eq!(record.goal_date.map(|d| d.to_string()), Some(tomorrow));
    }

    #[tokio::test]
    async fn goal_yesterday_is_rejected() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 1).await;
        let skills = aggregator(store, SkillPolicy::default());

        assert_matches!(
            skills.set_goal(MEMBER, LYRIC, &day_offset(-1)).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn set_goal_overwrites_and_clear_removes() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 1).await;
        let skills = aggregator(store, SkillPolicy::default());

        skills.set_goal(MEMBER, LYRIC, &day_offset(10)).await.unwrap();
        let second = skills.set_goal(MEMBER, LYRIC, &day_offset(20)).await.unwrap();
        assert_eq!(second.goal_date.map(|d| d.to_string()), Some(day_offset(20)));

        let cleared = skills.clear_goal(MEMBER, LYRIC).await.unwrap();
        assert!(cleared.goal_date.is_none());
    }

    #[tokio::test]
    async fn goal_without_record_is_not_found() {
        let store = Arc::new(InMemoryPracticeStore::new());
        let skills = aggregator(store, SkillPolicy::default());

        assert_matches!(
            skills.set_goal(MEMBER, LYRIC, &day_offset(3)).await,
            Err(CoreError::NotFound { entity: "SkillRecord", id: LYRIC })
        );
        assert_matches!(
            skills.clear_goal(MEMBER, LYRIC).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn practice_after_goal_keeps_goal() {
        let store = Arc::new(InMemoryPracticeStore::new());
        practice(&store, 1).await;
        let skills = aggregator(store.clone(), SkillPolicy::default());
        skills.set_goal(MEMBER, LYRIC, &day_offset(5)).await.unwrap();

        practice(&store, 1).await;
        let record = skills.get_skill(MEMBER, LYRIC).await.unwrap().unwrap();
        assert_eq!(record.practice_count, 2);
        assert!(record.goal_date.is_some());
    }

    #[test]
    fn skill_levels_lists_four_levels_in_order() {
        let store = Arc::new(InMemoryPracticeStore::new());
        let skills = aggregator(store, SkillPolicy::default());
        let levels = skills.skill_levels();
        let keys: Vec<_> = levels.keys().copied().collect();
        assert_eq!(keys, vec!["novice", "learning", "proficient", "master"]);
    }
}
