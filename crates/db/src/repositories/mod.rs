//! Repository layer: one unit struct per table family, with async query
//! functions that take a pool or a transaction connection.

pub mod catalog_repo;
pub mod member_repo;
pub mod practice_repo;
pub mod skill_record_repo;

pub use catalog_repo::CatalogRepo;
pub use member_repo::MemberRepo;
pub use practice_repo::PracticeRepo;
pub use skill_record_repo::SkillRecordRepo;
