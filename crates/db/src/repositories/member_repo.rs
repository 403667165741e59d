//! Repository for the `members` table.

use choir_core::types::DbId;
use sqlx::PgPool;

pub struct MemberRepo;

impl MemberRepo {
    /// Whether a member with this id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
