use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row as stored by the remote catalog service.
///
/// The remote schema splits every localized pair in two columns: the plain
/// column (`title`) holds the English value and the `_ar` column
/// (`title_ar`) holds the display-language value. Loosely typed columns are
/// kept as raw JSON and coerced during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Value>,
    // Timestamps stay as text: the service emits them with and without offsets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RawRecord {
    pub fn with_id(id: ItemId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Overlay every column set in `patch` onto this record.
    pub fn overlay(&mut self, patch: &RawRecord) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if patch.$field.is_some() {
                    self.$field = patch.$field.clone();
                })*
            };
        }
        take!(
            title, title_ar, description, description_ar, image, banner, video_url, year, rating,
            genre, maturity_rating, director, director_ar, creator, creator_ar, cast, duration,
            seasons, created_at, updated_at
        );
    }
}
