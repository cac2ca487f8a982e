use crate::collection::Collection;
use crate::draft::ItemPatch;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier, unique within its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(value)
    }
}

/// A movie or a show as held in memory by the synchronizer.
///
/// The `*_primary` fields carry the display language, the `*_secondary`
/// fields the English original. Which collection an item lives in is fixed
/// by its [`ItemDetails`] variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title_primary: String,
    pub title_secondary: String,
    pub description_primary: String,
    pub description_secondary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_image_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image_ref: Option<String>,
    /// Absent means the item is not playable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_ref: Option<String>,
    pub release_year: Option<i32>,
    pub rating_score: f64,
    #[serde(default)]
    pub genre_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_tag: Option<String>,
    #[serde(default)]
    pub cast_names: Vec<String>,
    pub details: ItemDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDetails {
    Movie {
        #[serde(default)]
        duration_label: Option<String>,
        #[serde(default)]
        director_primary: Option<String>,
        #[serde(default)]
        director_secondary: Option<String>,
    },
    Show {
        season_count: u32,
        #[serde(default)]
        creator_primary: Option<String>,
        #[serde(default)]
        creator_secondary: Option<String>,
    },
}

impl ItemDetails {
    pub fn empty_for(collection: Collection) -> Self {
        match collection {
            Collection::Movies => ItemDetails::Movie {
                duration_label: None,
                director_primary: None,
                director_secondary: None,
            },
            Collection::Shows => ItemDetails::Show {
                season_count: 1,
                creator_primary: None,
                creator_secondary: None,
            },
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            ItemDetails::Movie { .. } => Collection::Movies,
            ItemDetails::Show { .. } => Collection::Shows,
        }
    }
}

impl CatalogItem {
    pub fn collection(&self) -> Collection {
        self.details.collection()
    }

    pub fn display_title(&self) -> &str {
        &self.title_primary
    }

    pub fn is_playable(&self) -> bool {
        self.playback_ref
            .as_deref()
            .map(|r| !r.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn duration_label(&self) -> Option<&str> {
        match &self.details {
            ItemDetails::Movie { duration_label, .. } => duration_label.as_deref(),
            ItemDetails::Show { .. } => None,
        }
    }

    pub fn season_count(&self) -> Option<u32> {
        match &self.details {
            ItemDetails::Show { season_count, .. } => Some(*season_count),
            ItemDetails::Movie { .. } => None,
        }
    }

    /// Director for movies, creator for shows, in the display language.
    pub fn credit(&self) -> Option<&str> {
        match &self.details {
            ItemDetails::Movie { director_primary, .. } => director_primary.as_deref(),
            ItemDetails::Show { creator_primary, .. } => creator_primary.as_deref(),
        }
    }

    pub fn shares_genre_with(&self, other: &CatalogItem) -> bool {
        self.genre_tags.iter().any(|g| other.genre_tags.contains(g))
    }

    /// Shallow-merge `patch` over this item.
    ///
    /// Fields absent from the patch keep their current value. The id and the
    /// collection never change; kind-specific patch fields that do not apply
    /// to this item's collection are ignored.
    pub fn merged_with(&self, patch: &ItemPatch) -> CatalogItem {
        let mut merged = self.clone();

        if let Some(ref v) = patch.title_primary {
            merged.title_primary = v.clone();
        }
        if let Some(ref v) = patch.title_secondary {
            merged.title_secondary = v.clone();
        }
        if let Some(ref v) = patch.description_primary {
            merged.description_primary = v.clone();
        }
        if let Some(ref v) = patch.description_secondary {
            merged.description_secondary = v.clone();
        }
        if patch.poster_image_ref.is_some() {
            merged.poster_image_ref = patch.poster_image_ref.clone();
        }
        if patch.banner_image_ref.is_some() {
            merged.banner_image_ref = patch.banner_image_ref.clone();
        }
        if patch.playback_ref.is_some() {
            merged.playback_ref = patch.playback_ref.clone();
        }
        if patch.release_year.is_some() {
            merged.release_year = patch.release_year;
        }
        if let Some(score) = patch.rating_score {
            merged.rating_score = score;
        }
        if let Some(ref genres) = patch.genre_tags {
            merged.genre_tags = genres.clone();
        }
        if patch.maturity_tag.is_some() {
            merged.maturity_tag = patch.maturity_tag.clone();
        }
        if let Some(ref cast) = patch.cast_names {
            merged.cast_names = cast.clone();
        }

        match &mut merged.details {
            ItemDetails::Movie {
                duration_label,
                director_primary,
                director_secondary,
            } => {
                if patch.duration_label.is_some() {
                    *duration_label = patch.duration_label.clone();
                }
                if patch.credit_primary.is_some() {
                    *director_primary = patch.credit_primary.clone();
                }
                if patch.credit_secondary.is_some() {
                    *director_secondary = patch.credit_secondary.clone();
                }
            }
            ItemDetails::Show {
                season_count,
                creator_primary,
                creator_secondary,
            } => {
                if let Some(seasons) = patch.season_count {
                    *season_count = seasons;
                }
                if patch.credit_primary.is_some() {
                    *creator_primary = patch.credit_primary.clone();
                }
                if patch.credit_secondary.is_some() {
                    *creator_secondary = patch.credit_secondary.clone();
                }
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_movie(id: i64, title: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId(id),
            title_primary: title.to_string(),
            title_secondary: title.to_string(),
            description_primary: String::new(),
            description_secondary: String::new(),
            poster_image_ref: None,
            banner_image_ref: None,
            playback_ref: None,
            release_year: Some(2001),
            rating_score: 7.0,
            genre_tags: vec!["Drama".to_string()],
            maturity_tag: Some("PG-13".to_string()),
            cast_names: vec![],
            details: ItemDetails::empty_for(Collection::Movies),
        }
    }

    #[test]
    fn test_merged_with_keeps_untouched_fields() {
        let movie = create_movie(3, "Heat");
        let patch = ItemPatch {
            rating_score: Some(8.3),
            duration_label: Some("2h 50m".to_string()),
            ..ItemPatch::default()
        };

        let merged = movie.merged_with(&patch);
        assert_eq!(merged.id, ItemId(3));
        assert_eq!(merged.title_primary, "Heat");
        assert_eq!(merged.rating_score, 8.3);
        assert_eq!(merged.duration_label(), Some("2h 50m"));
        assert_eq!(merged.genre_tags, vec!["Drama".to_string()]);
    }

    #[test]
    fn test_merged_with_ignores_fields_of_other_collection() {
        let movie = create_movie(3, "Heat");
        let patch = ItemPatch {
            season_count: Some(4),
            ..ItemPatch::default()
        };

        let merged = movie.merged_with(&patch);
        assert_eq!(merged.collection(), Collection::Movies);
        assert_eq!(merged.season_count(), None);
    }

    #[test]
    fn test_is_playable() {
        let mut movie = create_movie(1, "Alien");
        assert!(!movie.is_playable());
        movie.playback_ref = Some("  ".to_string());
        assert!(!movie.is_playable());
        movie.playback_ref = Some("https://cdn.example.com/alien.m3u8".to_string());
        assert!(movie.is_playable());
    }

    #[test]
    fn test_details_serde_tag() {
        let movie = create_movie(1, "Alien");
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["details"]["kind"], "movie");

        let back: CatalogItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, movie);
    }
}
