use std::sync::Arc;

use choir_core::catalog::CatalogItem;
use choir_core::catalog_service::CatalogService;
use choir_core::memory::{InMemoryCatalog, InMemoryMembers, InMemoryPracticeStore};
use choir_core::practice_log::PracticeLog;
use choir_core::repository::{
    CatalogRepository, MemberDirectory, PracticeLogRepository, SkillRecordRepository, StoreHealth,
};
use choir_core::skill::SkillPolicy;
use choir_core::skill_aggregator::SkillAggregator;
use choir_core::types::DbId;
use choir_db::{DbPool, PgCatalog, PgMembers, PgPracticeStore};

use crate::config::ServerConfig;

/// The storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub practice_log: Arc<dyn PracticeLogRepository>,
    pub skill_records: Arc<dyn SkillRecordRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub members: Arc<dyn MemberDirectory>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: DbPool) -> Self {
        let practice = Arc::new(PgPracticeStore::new(pool.clone()));
        Self {
            practice_log: practice.clone(),
            skill_records: practice.clone(),
            catalog: Arc::new(PgCatalog::new(pool.clone())),
            members: Arc::new(PgMembers::new(pool)),
            health: practice,
        }
    }

    /// Process-local repositories over a fixed catalog and member set.
    pub fn in_memory(catalog: Vec<CatalogItem>, members: impl IntoIterator<Item = DbId>) -> Self {
        let practice = Arc::new(InMemoryPracticeStore::new());
        Self {
            practice_log: practice.clone(),
            skill_records: practice.clone(),
            catalog: Arc::new(InMemoryCatalog::new(catalog)),
            members: Arc::new(InMemoryMembers::new(members)),
            health: practice,
        }
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Practice session logging and history.
    pub practice: Arc<PracticeLog>,
    /// Skill records, goals, and the level table.
    pub skills: Arc<SkillAggregator>,
    /// Catalog listings.
    pub catalog: Arc<CatalogService>,
    /// Backing store liveness, reported by `/health`.
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    /// Wire the services onto the given repositories.
    pub fn new(config: ServerConfig, repos: Repositories, policy: SkillPolicy) -> Self {
        let skills = Arc::new(SkillAggregator::new(
            repos.skill_records,
            repos.members.clone(),
            policy,
        ));
        let practice = Arc::new(PracticeLog::new(
            repos.practice_log,
            repos.catalog.clone(),
            repos.members,
            skills.clone(),
        ));

        Self {
            config: Arc::new(config),
            practice,
            skills,
            catalog: Arc::new(CatalogService::new(repos.catalog)),
            health: repos.health,
        }
    }
}
