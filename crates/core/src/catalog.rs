//! Catalog listing types: filters, sort order, and the validated query.
//!
//! Filtering and ordering are defined here once. The PostgreSQL repository
//! translates them into SQL; the in-memory repository evaluates
//! [`CatalogFilters::matches`] and [`CatalogSort::compare`] directly.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::pagination::{clamp_page, clamp_per_page};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_DIFFICULTY: i16 = 1;
pub const MAX_DIFFICULTY: i16 = 5;

pub const SORT_TITLE: &str = "title";
pub const SORT_DATE_ADDED: &str = "date_added";
pub const SORT_LAST_MODIFIED: &str = "last_modified";
pub const SORT_RELEASE_YEAR: &str = "release_year";

/// Valid sort field names.
pub const VALID_SORT_FIELDS: &[&str] = &[
    SORT_TITLE,
    SORT_DATE_ADDED,
    SORT_LAST_MODIFIED,
    SORT_RELEASE_YEAR,
];

/// `starts_with` value selecting titles that do not begin with a letter.
pub const NON_ALPHA_PREFIX: &str = "#";

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A taxonomy term (language or genre).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub slug: String,
    pub name: String,
}

/// Read projection of a lyric for catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: DbId,
    pub title: String,
    pub composer: Option<String>,
    pub language: Option<Term>,
    pub difficulty: Option<i16>,
    pub genres: Vec<Term>,
    pub year: Option<i32>,
    pub excerpt: Option<String>,
    pub date_added: Timestamp,
    pub last_modified: Timestamp,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// First-character filter on titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartsWith {
    /// Lowercased letter in any script.
    Letter(char),
    /// Titles whose first character is not a letter.
    NonAlpha,
}

impl StartsWith {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw == NON_ALPHA_PREFIX {
            return Ok(Self::NonAlpha);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphabetic() => Ok(Self::Letter(fold_case(c))),
            _ => Err(CoreError::Validation(format!(
                "starts_with must be a single letter or '{NON_ALPHA_PREFIX}', got '{raw}'"
            ))),
        }
    }

    fn matches(&self, title: &str) -> bool {
        let first = title.chars().next();
        match self {
            Self::Letter(letter) => first.is_some_and(|c| fold_case(c) == *letter),
            Self::NonAlpha => !first.is_some_and(char::is_alphabetic),
        }
    }
}

/// Lowercase a single character, keeping the first char of multi-char mappings.
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Validated catalog filters. `None` means the filter is not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub difficulty: Option<i16>,
    pub starts_with: Option<StartsWith>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl CatalogFilters {
    /// Evaluate the filters against one item.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = item.title.to_lowercase().contains(&needle)
                || item
                    .composer
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle))
                || item
                    .language
                    .as_ref()
                    .is_some_and(|l| l.name.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !item.genres.iter().any(|g| &g.slug == genre) {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if item.language.as_ref().map(|l| &l.slug) != Some(language) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if item.difficulty != Some(difficulty) {
                return false;
            }
        }
        if let Some(starts_with) = self.starts_with {
            if !starts_with.matches(&item.title) {
                return false;
            }
        }
        if let Some(from) = self.year_from {
            if !item.year.is_some_and(|y| y >= from) {
                return false;
            }
        }
        if let Some(to) = self.year_to {
            if !item.year.is_some_and(|y| y <= to) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Title,
    DateAdded,
    LastModified,
    ReleaseYear,
}

impl SortField {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw {
            SORT_TITLE => Ok(Self::Title),
            SORT_DATE_ADDED => Ok(Self::DateAdded),
            SORT_LAST_MODIFIED => Ok(Self::LastModified),
            SORT_RELEASE_YEAR => Ok(Self::ReleaseYear),
            _ => Err(CoreError::Validation(format!(
                "Invalid sort field '{raw}'. Must be one of: {}",
                VALID_SORT_FIELDS.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Accepts `asc`/`desc` in any case.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CoreError::Validation(format!(
                "Invalid sort direction '{raw}'. Must be 'asc' or 'desc'"
            ))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort order for catalog pages. Ties always fall back to id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl CatalogSort {
    /// Total order over items matching the SQL `ORDER BY` of the database
    /// repository. Undated items sort last in both directions.
    pub fn compare(&self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        let directed = |ord: Ordering| match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };

        let primary = match self.field {
            SortField::Title => directed(a.title.to_lowercase().cmp(&b.title.to_lowercase())),
            SortField::DateAdded => directed(a.date_added.cmp(&b.date_added)),
            SortField::LastModified => directed(a.last_modified.cmp(&b.last_modified)),
            SortField::ReleaseYear => match (a.year, b.year) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Raw catalog query parameters as received from a caller.
///
/// Filter forms submit empty values (`difficulty=&page=`) for "any", so a
/// blank numeric parameter reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRequest {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub difficulty: Option<i16>,
    pub starts_with: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_from: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub year_to: Option<i32>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub per_page: Option<i64>,
}

/// Parse an optional numeric parameter, treating an empty value as `None`.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

/// A validated catalog query with page bounds already clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filters: CatalogFilters,
    pub sort: CatalogSort,
    pub page: i64,
    pub per_page: i64,
}

impl CatalogQuery {
    /// Validate filters and sort, clamp `page` and `per_page`.
    pub fn new(request: CatalogRequest) -> Result<Self, CoreError> {
        if let Some(difficulty) = request.difficulty {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
                return Err(CoreError::Validation(format!(
                    "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}, \
                     got {difficulty}"
                )));
            }
        }
        if let (Some(from), Some(to)) = (request.year_from, request.year_to) {
            if from > to {
                return Err(CoreError::Validation(format!(
                    "year_from ({from}) must not be after year_to ({to})"
                )));
            }
        }

        let starts_with = non_blank(request.starts_with)
            .map(|raw| StartsWith::parse(&raw))
            .transpose()?;
        let field = non_blank(request.sort)
            .map(|raw| SortField::parse(&raw))
            .transpose()?
            .unwrap_or_default();
        let direction = non_blank(request.direction)
            .map(|raw| SortDirection::parse(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            filters: CatalogFilters {
                search: non_blank(request.search),
                genre: non_blank(request.genre),
                language: non_blank(request.language),
                difficulty: request.difficulty,
                starts_with,
                year_from: request.year_from,
                year_to: request.year_to,
            },
            sort: CatalogSort { field, direction },
            page: clamp_page(request.page),
            per_page: clamp_per_page(request.per_page),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
