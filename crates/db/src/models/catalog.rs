//! Lyric catalog rows.

use std::collections::HashMap;

use choir_core::catalog::{CatalogItem, Term};
use choir_core::practice::LyricTitle;
use choir_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A `lyrics` row joined with its language.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LyricRow {
    pub id: DbId,
    pub title: String,
    pub composer: Option<String>,
    pub language_slug: Option<String>,
    pub language_name: Option<String>,
    pub difficulty: Option<i16>,
    pub release_year: Option<i32>,
    pub excerpt: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LyricRow {
    /// Assemble the listing projection, taking this lyric's genres out of
    /// the pre-loaded map.
    pub fn into_item(self, genres: &mut HashMap<DbId, Vec<Term>>) -> CatalogItem {
        let language = match (self.language_slug, self.language_name) {
            (Some(slug), Some(name)) => Some(Term { slug, name }),
            _ => None,
        };
        CatalogItem {
            id: self.id,
            genres: genres.remove(&self.id).unwrap_or_default(),
            title: self.title,
            composer: self.composer,
            language,
            difficulty: self.difficulty,
            year: self.release_year,
            excerpt: self.excerpt,
            date_added: self.created_at,
            last_modified: self.updated_at,
        }
    }
}

/// A genre attached to a lyric.
#[derive(Debug, Clone, FromRow)]
pub struct LyricGenreRow {
    pub lyric_id: DbId,
    pub slug: String,
    pub name: String,
}

/// Group genre rows by lyric, keeping row order.
pub fn group_genres(rows: Vec<LyricGenreRow>) -> HashMap<DbId, Vec<Term>> {
    let mut grouped: HashMap<DbId, Vec<Term>> = HashMap::new();
    for row in rows {
        grouped.entry(row.lyric_id).or_default().push(Term {
            slug: row.slug,
            name: row.name,
        });
    }
    grouped
}

/// Id and title only.
#[derive(Debug, Clone, FromRow)]
pub struct LyricTitleRow {
    pub id: DbId,
    pub title: String,
}

impl From<LyricTitleRow> for LyricTitle {
    fn from(row: LyricTitleRow) -> Self {
        Self {
            lyric_id: row.id,
            title: row.title,
        }
    }
}
