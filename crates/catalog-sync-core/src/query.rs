//! Browse views over a catalog snapshot: filtered listings, home rows and
//! similar titles.

use crate::state::CatalogSnapshot;
use catalog_sync_models::CatalogItem;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Rating at or above which a title counts as acclaimed
pub const ACCLAIMED_RATING: f64 = 8.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Release year, newest first
    #[default]
    Latest,
    /// Rating, highest first
    Rating,
    /// Display title, alphabetical
    Title,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" | "year" | "newest" => Ok(SortOrder::Latest),
            "rating" | "top" => Ok(SortOrder::Rating),
            "title" | "name" => Ok(SortOrder::Title),
            other => Err(format!("Unknown sort order: {} (expected latest, rating or title)", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrowseFilter {
    /// Keep items with any of these genres; empty keeps everything
    pub genres: Vec<String>,
    /// Inclusive release year bounds. Items without a year never match a bound.
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: f64,
}

impl BrowseFilter {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        let genre_ok = self.genres.is_empty()
            || self
                .genres
                .iter()
                .any(|g| item.genre_tags.iter().any(|tag| tag.eq_ignore_ascii_case(g)));

        let year_ok = match (self.year_from, self.year_to) {
            (None, None) => true,
            (from, to) => match item.release_year {
                Some(year) => from.map_or(true, |f| year >= f) && to.map_or(true, |t| year <= t),
                None => false,
            },
        };

        genre_ok && year_ok && item.rating_score >= self.min_rating
    }
}

fn by_rating_desc(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.rating_score.partial_cmp(&a.rating_score).unwrap_or(Ordering::Equal)
}

fn by_year_desc(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    // Items without a year sort last
    b.release_year.cmp(&a.release_year)
}

fn by_title(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    a.display_title().to_lowercase().cmp(&b.display_title().to_lowercase())
}

/// Filter then sort. Sorting is stable: ties keep catalog order.
pub fn browse(items: &[CatalogItem], filter: &BrowseFilter, order: SortOrder) -> Vec<CatalogItem> {
    let mut result: Vec<CatalogItem> = items.iter().filter(|i| filter.matches(i)).cloned().collect();
    match order {
        SortOrder::Latest => result.sort_by(by_year_desc),
        SortOrder::Rating => result.sort_by(by_rating_desc),
        SortOrder::Title => result.sort_by(by_title),
    }
    result
}

fn everything(snapshot: &CatalogSnapshot) -> Vec<CatalogItem> {
    snapshot.movies.iter().chain(snapshot.shows.iter()).cloned().collect()
}

pub fn trending(snapshot: &CatalogSnapshot, limit: usize) -> Vec<CatalogItem> {
    let mut items = everything(snapshot);
    items.sort_by(by_rating_desc);
    items.truncate(limit);
    items
}

pub fn acclaimed(snapshot: &CatalogSnapshot, limit: usize) -> Vec<CatalogItem> {
    everything(snapshot)
        .into_iter()
        .filter(|i| i.rating_score >= ACCLAIMED_RATING)
        .take(limit)
        .collect()
}

pub fn new_releases(snapshot: &CatalogSnapshot, limit: usize) -> Vec<CatalogItem> {
    let mut items = everything(snapshot);
    items.sort_by(by_year_desc);
    items.truncate(limit);
    items
}

/// Titles from either collection sharing a genre with `item`, excluding it.
pub fn similar(snapshot: &CatalogSnapshot, item: &CatalogItem, limit: usize) -> Vec<CatalogItem> {
    everything(snapshot)
        .into_iter()
        .filter(|other| !(other.id == item.id && other.collection() == item.collection()))
        .filter(|other| other.shares_genre_with(item))
        .take(limit)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeRows {
    pub trending: Vec<CatalogItem>,
    pub acclaimed: Vec<CatalogItem>,
    pub new_releases: Vec<CatalogItem>,
}

pub fn home_rows(snapshot: &CatalogSnapshot, limit: usize) -> HomeRows {
    HomeRows {
        trending: trending(snapshot, limit),
        acclaimed: acclaimed(snapshot, limit),
        new_releases: new_releases(snapshot, limit),
    }
}
