//! Repository for the lyric catalog (`lyrics`, `languages`, `genres`,
//! `lyric_genres`).
//!
//! Filtered listings are assembled with [`QueryBuilder`] so every user value
//! is bound, never interpolated.

use choir_core::catalog::{CatalogFilters, CatalogQuery, CatalogSort, SortField, StartsWith};
use choir_core::pagination::page_offset;
use choir_core::types::DbId;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::catalog::{LyricGenreRow, LyricRow, LyricTitleRow};

/// Projection for catalog listings.
const SELECT_COLUMNS: &str = "SELECT l.id, l.title, l.composer, \
    lang.slug AS language_slug, lang.name AS language_name, \
    l.difficulty, l.release_year, l.excerpt, l.created_at, l.updated_at";

/// Lyrics joined with their (optional) language.
const FROM_CLAUSE: &str = " FROM lyrics l LEFT JOIN languages lang ON lang.id = l.language_id";

pub struct CatalogRepo;

impl CatalogRepo {
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM lyrics WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Id and title of every lyric, ordered by id.
    pub async fn titles(pool: &PgPool) -> Result<Vec<LyricTitleRow>, sqlx::Error> {
        sqlx::query_as::<_, LyricTitleRow>("SELECT id, title FROM lyrics ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Number of lyrics matching the filters.
    pub async fn count(pool: &PgPool, filters: &CatalogFilters) -> Result<i64, sqlx::Error> {
        let mut builder = build_count(filters);
        builder.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// One sorted page of matching lyrics.
    pub async fn page(pool: &PgPool, query: &CatalogQuery) -> Result<Vec<LyricRow>, sqlx::Error> {
        let mut builder = build_page(query);
        builder.build_query_as::<LyricRow>().fetch_all(pool).await
    }

    /// Genres for a set of lyrics, ordered by lyric then genre name.
    pub async fn genres_for(
        pool: &PgPool,
        lyric_ids: &[DbId],
    ) -> Result<Vec<LyricGenreRow>, sqlx::Error> {
        if lyric_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, LyricGenreRow>(
            "SELECT lg.lyric_id, g.slug, g.name \
             FROM lyric_genres lg \
             JOIN genres g ON g.id = lg.genre_id \
             WHERE lg.lyric_id = ANY($1) \
             ORDER BY lg.lyric_id, g.name",
        )
        .bind(lyric_ids)
        .fetch_all(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Query assembly
// ---------------------------------------------------------------------------

fn build_count(filters: &CatalogFilters) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*)");
    builder.push(FROM_CLAUSE);
    push_filters(&mut builder, filters);
    builder
}

fn build_page(query: &CatalogQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_COLUMNS);
    builder.push(FROM_CLAUSE);
    push_filters(&mut builder, &query.filters);
    push_order(&mut builder, &query.sort);
    builder
        .push(" LIMIT ")
        .push_bind(query.per_page)
        .push(" OFFSET ")
        .push_bind(page_offset(query.page, query.per_page));
    builder
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, filters: &CatalogFilters) {
    builder.push(" WHERE TRUE");

    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (l.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.composer ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR lang.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(genre) = &filters.genre {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM lyric_genres lg \
                 JOIN genres g ON g.id = lg.genre_id \
                 WHERE lg.lyric_id = l.id AND g.slug = ",
            )
            .push_bind(genre.clone())
            .push(")");
    }
    if let Some(language) = &filters.language {
        builder.push(" AND lang.slug = ").push_bind(language.clone());
    }
    if let Some(difficulty) = filters.difficulty {
        builder.push(" AND l.difficulty = ").push_bind(difficulty);
    }
    match filters.starts_with {
        Some(StartsWith::Letter(letter)) => {
            builder
                .push(" AND LOWER(LEFT(l.title, 1)) = ")
                .push_bind(letter.to_string());
        }
        Some(StartsWith::NonAlpha) => {
            builder.push(" AND l.title !~ '^[[:alpha:]]'");
        }
        None => {}
    }
    if let Some(from) = filters.year_from {
        builder.push(" AND l.release_year >= ").push_bind(from);
    }
    if let Some(to) = filters.year_to {
        builder.push(" AND l.release_year <= ").push_bind(to);
    }
}

fn push_order(builder: &mut QueryBuilder<'static, Postgres>, sort: &CatalogSort) {
    let direction = sort.direction.as_sql();
    let primary = match sort.field {
        SortField::Title => format!("LOWER(l.title) COLLATE \"C\" {direction}"),
        SortField::DateAdded => format!("l.created_at {direction}"),
        SortField::LastModified => format!("l.updated_at {direction}"),
        SortField::ReleaseYear => format!("l.release_year {direction} NULLS LAST"),
    };
    builder.push(" ORDER BY ").push(primary).push(", l.id ASC");
}

/// Escape `ILIKE` wildcards so search text matches literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
