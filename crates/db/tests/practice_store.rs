//! Integration tests for the PostgreSQL repositories.
//!
//! Exercises the store adapters against a real database:
//! - Atomic append + recompute, including concurrent writers on one pair
//! - Recent-session ordering and per-lyric totals
//! - Goal date updates that survive later recomputes
//! - Catalog filtering, sorting, and pagination

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use choir_core::catalog::{CatalogQuery, CatalogRequest};
use choir_core::practice::NewPracticeSession;
use choir_core::repository::{
    CatalogRepository, MemberDirectory, PracticeLogRepository, SkillRecordRepository,
};
use choir_core::skill::{Badge, SkillLevel, SkillPolicy};
use choir_core::types::{DbId, Timestamp};
use choir_db::{PgCatalog, PgMembers, PgPracticeStore};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed(pool: &PgPool) -> (DbId, Vec<DbId>) {
    let member_id: DbId =
        sqlx::query_scalar("INSERT INTO members (display_name) VALUES ('Alto One') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let latin: DbId = sqlx::query_scalar(
        "INSERT INTO languages (slug, name) VALUES ('latin', 'Latin') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    let sacred: DbId = sqlx::query_scalar(
        "INSERT INTO genres (slug, name) VALUES ('sacred', 'Sacred') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let mut lyric_ids = Vec::new();
    for (title, year) in [
        ("Ave Verum Corpus", Some(1791)),
        ("Bogoroditse Devo", Some(1915)),
        ("Cantique de Jean Racine", None),
    ] {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO lyrics (title, language_id, difficulty, release_year) \
             VALUES ($1, $2, 3, $3) RETURNING id",
        )
        .bind(title)
        .bind(latin)
        .bind(year)
        .fetch_one(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO lyric_genres (lyric_id, genre_id) VALUES ($1, $2)")
            .bind(id)
            .bind(sacred)
            .execute(pool)
            .await
            .unwrap();
        lyric_ids.push(id);
    }

    (member_id, lyric_ids)
}

fn session(
    member_id: DbId,
    lyric_id: DbId,
    minutes: i32,
    confidence: Option<i16>,
) -> NewPracticeSession {
    NewPracticeSession {
        member_id,
        lyric_id,
        duration_minutes: minutes,
        confidence,
        notes: None,
    }
}

fn at(minute: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2026, 9, 1, 19, 0, 0).unwrap() + Duration::minutes(minute)
}

// ---------------------------------------------------------------------------
// Test: append + recompute
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn append_recomputes_skill_record(pool: PgPool) {
    let (member, lyrics) = seed(&pool).await;
    let store = PgPracticeStore::new(pool);
    let policy = SkillPolicy::default();

    let mut last = None;
    for i in 0..5 {
        last = Some(
            store
                .append_and_recompute(&session(member, lyrics[0], 12, Some(3)), at(i), &policy)
                .await
                .unwrap(),
        );
    }
    let logged = last.unwrap();

    assert_eq!(logged.skill.practice_count, 5);
    assert_eq!(logged.skill.total_practice_minutes, 60);
    assert_eq!(logged.skill.skill_level, SkillLevel::Proficient);
    assert_eq!(logged.skill.last_practice_date, Some(at(4)));
    assert!(logged.skill.achievement_badges.contains(&Badge::ReachedLearning));
    assert!(logged.skill.achievement_badges.contains(&Badge::ReachedProficient));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_appends_are_all_counted(pool: PgPool) {
    let (member, lyrics) = seed(&pool).await;
    let store = Arc::new(PgPracticeStore::new(pool));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            let input = session(member, lyrics[1], 5, None);
            tokio::spawn(async move {
                store
                    .append_and_recompute(&input, at(i), &SkillPolicy::default())
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = store.find(member, lyrics[1]).await.unwrap().unwrap();
    assert_eq!(record.practice_count, 10);
    assert_eq!(record.total_practice_minutes, 50);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn unknown_lyric_is_a_validation_error(pool: PgPool) {
    let (member, _) = seed(&pool).await;
    let store = PgPracticeStore::new(pool);

    let result = store
        .append_and_recompute(&session(member, 9_999, 10, None), at(0), &SkillPolicy::default())
        .await;
    assert!(matches!(result, Err(choir_core::error::CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Test: reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn recent_and_totals(pool: PgPool) {
    let (member, lyrics) = seed(&pool).await;
    let store = PgPracticeStore::new(pool);
    let policy = SkillPolicy::default();

    store
        .append_and_recompute(&session(member, lyrics[0], 10, Some(2)), at(0), &policy)
        .await
        .unwrap();
    store
        .append_and_recompute(&session(member, lyrics[0], 15, Some(5)), at(1), &policy)
        .await
        .unwrap();
    store
        .append_and_recompute(&session(member, lyrics[2], 7, None), at(2), &policy)
        .await
        .unwrap();

    let recent = store.recent(member, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].lyric_id, lyrics[2]);

    let totals = store.lyric_totals(member).await.unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].total_minutes, 25);
    assert_eq!(totals[0].confidence, Some(5));
    assert_eq!(totals[1].confidence, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn goal_survives_recompute(pool: PgPool) {
    let (member, lyrics) = seed(&pool).await;
    let store = PgPracticeStore::new(pool);
    let policy = SkillPolicy::default();
    let goal = chrono::NaiveDate::from_ymd_opt(2030, 6, 1);

    assert!(store.set_goal(member, lyrics[0], goal).await.unwrap().is_none());

    store
        .append_and_recompute(&session(member, lyrics[0], 10, None), at(0), &policy)
        .await
        .unwrap();
    store.set_goal(member, lyrics[0], goal).await.unwrap().unwrap();
    let logged = store
        .append_and_recompute(&session(member, lyrics[0], 10, None), at(1), &policy)
        .await
        .unwrap();

    assert_eq!(logged.skill.goal_date, goal);
    assert_eq!(store.list_for_member(member).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: catalog and members
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn catalog_search_filters_and_sorts(pool: PgPool) {
    let (member, lyrics) = seed(&pool).await;
    let catalog = PgCatalog::new(pool.clone());
    let members = PgMembers::new(pool);

    assert!(members.member_exists(member).await.unwrap());
    assert!(catalog.lyric_exists(lyrics[0]).await.unwrap());
    assert_eq!(catalog.titles().await.unwrap().len(), 3);

    let by_year = CatalogQuery::new(CatalogRequest {
        sort: Some("release_year".to_string()),
        direction: Some("desc".to_string()),
        ..Default::default()
    })
    .unwrap();
    let page = catalog.search(&by_year).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![lyrics[1], lyrics[0], lyrics[2]]);
    assert_eq!(page.items[0].genres[0].slug, "sacred");
    assert_eq!(page.items[0].language.as_ref().unwrap().name, "Latin");

    let search = CatalogQuery::new(CatalogRequest {
        search: Some("devo".to_string()),
        ..Default::default()
    })
    .unwrap();
    let page = catalog.search(&search).await.unwrap();
    assert_eq!(page.total_count, 1);

    let past_end = CatalogQuery::new(CatalogRequest {
        page: Some(5),
        ..Default::default()
    })
    .unwrap();
    let page = catalog.search(&past_end).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn catalog_prefix_filter_handles_non_latin_titles(pool: PgPool) {
    seed(&pool).await;
    for title in ["Богородице Дево", "Ärger", "1812 Overture"] {
        sqlx::query("INSERT INTO lyrics (title) VALUES ($1)")
            .bind(title)
            .execute(&pool)
            .await
            .unwrap();
    }
    let catalog = PgCatalog::new(pool);

    let prefix = |raw: &str| {
        CatalogQuery::new(CatalogRequest {
            starts_with: Some(raw.to_string()),
            ..Default::default()
        })
        .unwrap()
    };

    let cyrillic = catalog.search(&prefix("б")).await.unwrap();
    assert_eq!(cyrillic.total_count, 1);
    assert_eq!(cyrillic.items[0].title, "Богородице Дево");

    let accented = catalog.search(&prefix("Ä")).await.unwrap();
    assert_eq!(accented.total_count, 1);

    let non_alpha = catalog.search(&prefix("#")).await.unwrap();
    assert_eq!(non_alpha.total_count, 1);
    assert_eq!(non_alpha.items[0].title, "1812 Overture");
}
