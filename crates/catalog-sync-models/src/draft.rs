use crate::lenient;
use serde::{Deserialize, Serialize};

/// A catalog entry as submitted by the admin console, before it has an id.
///
/// Deserialization accepts the console's field names (`title`, `titleEn`,
/// `videoUrl`, `rating`, ...) and coerces loosely typed values: a rating of
/// `"7.5"` becomes `7.5`, a missing genre list becomes empty. The console's
/// `director` and `creator` keys both land in the credit fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "ConsoleDraft")]
pub struct ItemDraft {
    pub title_primary: String,
    pub title_secondary: String,
    pub description_primary: String,
    pub description_secondary: String,
    pub poster_image_ref: Option<String>,
    pub banner_image_ref: Option<String>,
    pub playback_ref: Option<String>,
    pub release_year: Option<i32>,
    pub rating_score: f64,
    pub genre_tags: Vec<String>,
    pub maturity_tag: Option<String>,
    pub cast_names: Vec<String>,
    /// Director (movies) or creator (shows) in the display language
    pub credit_primary: Option<String>,
    pub credit_secondary: Option<String>,
    pub duration_label: Option<String>,
    pub season_count: Option<u32>,
}

impl ItemDraft {
    pub fn titled(title: &str) -> Self {
        Self {
            title_primary: title.to_string(),
            ..Self::default()
        }
    }
}

/// A partial set of fields to shallow-merge over an existing item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "ConsolePatch")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_image_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_count: Option<u32>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == ItemPatch::default()
    }

    pub fn touches_title(&self) -> bool {
        self.title_primary.is_some() || self.title_secondary.is_some()
    }

    pub fn touches_description(&self) -> bool {
        self.description_primary.is_some() || self.description_secondary.is_some()
    }

    pub fn touches_credit(&self) -> bool {
        self.credit_primary.is_some() || self.credit_secondary.is_some()
    }
}

/// First value that is present and not blank, else the first present one.
fn pick_credit(candidates: [Option<String>; 3]) -> Option<String> {
    let filled = candidates
        .iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .cloned();
    filled.or_else(|| candidates.into_iter().flatten().next())
}

/// Wire shape of [`ItemDraft`]. The console sends `director` or `creator`
/// depending on the form, sometimes both, so they are read separately.
#[derive(Default, Deserialize)]
#[serde(default)]
struct ConsoleDraft {
    #[serde(alias = "title")]
    title_primary: String,
    #[serde(alias = "titleEn", alias = "title_en")]
    title_secondary: String,
    #[serde(alias = "description")]
    description_primary: String,
    #[serde(alias = "descriptionEn", alias = "description_en")]
    description_secondary: String,
    #[serde(alias = "image", alias = "poster")]
    poster_image_ref: Option<String>,
    #[serde(alias = "banner")]
    banner_image_ref: Option<String>,
    #[serde(alias = "videoUrl", alias = "video_url")]
    playback_ref: Option<String>,
    #[serde(alias = "year", deserialize_with = "lenient::optional_year")]
    release_year: Option<i32>,
    #[serde(alias = "rating", deserialize_with = "lenient::score")]
    rating_score: f64,
    #[serde(alias = "genre", alias = "genres", deserialize_with = "lenient::string_list")]
    genre_tags: Vec<String>,
    #[serde(alias = "maturityRating", alias = "maturity_rating")]
    maturity_tag: Option<String>,
    #[serde(alias = "cast", deserialize_with = "lenient::string_list")]
    cast_names: Vec<String>,
    credit_primary: Option<String>,
    director: Option<String>,
    creator: Option<String>,
    credit_secondary: Option<String>,
    #[serde(rename = "directorEn")]
    director_en: Option<String>,
    #[serde(rename = "creatorEn")]
    creator_en: Option<String>,
    #[serde(alias = "duration")]
    duration_label: Option<String>,
    #[serde(alias = "seasons", deserialize_with = "lenient::optional_count")]
    season_count: Option<u32>,
}

impl From<ConsoleDraft> for ItemDraft {
    fn from(wire: ConsoleDraft) -> Self {
        Self {
            title_primary: wire.title_primary,
            title_secondary: wire.title_secondary,
            description_primary: wire.description_primary,
            description_secondary: wire.description_secondary,
            poster_image_ref: wire.poster_image_ref,
            banner_image_ref: wire.banner_image_ref,
            playback_ref: wire.playback_ref,
            release_year: wire.release_year,
            rating_score: wire.rating_score,
            genre_tags: wire.genre_tags,
            maturity_tag: wire.maturity_tag,
            cast_names: wire.cast_names,
            credit_primary: pick_credit([wire.credit_primary, wire.director, wire.creator]),
            credit_secondary: pick_credit([wire.credit_secondary, wire.director_en, wire.creator_en]),
            duration_label: wire.duration_label,
            season_count: wire.season_count,
        }
    }
}

/// Wire shape of [`ItemPatch`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct ConsolePatch {
    #[serde(alias = "title")]
    title_primary: Option<String>,
    #[serde(alias = "titleEn")]
    title_secondary: Option<String>,
    #[serde(alias = "description")]
    description_primary: Option<String>,
    #[serde(alias = "descriptionEn")]
    description_secondary: Option<String>,
    #[serde(alias = "image")]
    poster_image_ref: Option<String>,
    #[serde(alias = "banner")]
    banner_image_ref: Option<String>,
    #[serde(alias = "videoUrl")]
    playback_ref: Option<String>,
    #[serde(alias = "year", deserialize_with = "lenient::optional_year")]
    release_year: Option<i32>,
    #[serde(alias = "rating", deserialize_with = "lenient::optional_score")]
    rating_score: Option<f64>,
    #[serde(alias = "genre", deserialize_with = "lenient::optional_string_list")]
    genre_tags: Option<Vec<String>>,
    #[serde(alias = "maturityRating")]
    maturity_tag: Option<String>,
    #[serde(alias = "cast", deserialize_with = "lenient::optional_string_list")]
    cast_names: Option<Vec<String>>,
    credit_primary: Option<String>,
    director: Option<String>,
    creator: Option<String>,
    credit_secondary: Option<String>,
    #[serde(rename = "directorEn")]
    director_en: Option<String>,
    #[serde(rename = "creatorEn")]
    creator_en: Option<String>,
    #[serde(alias = "duration")]
    duration_label: Option<String>,
    #[serde(alias = "seasons", deserialize_with = "lenient::optional_count")]
    season_count: Option<u32>,
}

impl From<ConsolePatch> for ItemPatch {
    fn from(wire: ConsolePatch) -> Self {
        Self {
            title_primary: wire.title_primary,
            title_secondary: wire.title_secondary,
            description_primary: wire.description_primary,
            description_secondary: wire.description_secondary,
            poster_image_ref: wire.poster_image_ref,
            banner_image_ref: wire.banner_image_ref,
            playback_ref: wire.playback_ref,
            release_year: wire.release_year,
            rating_score: wire.rating_score,
            genre_tags: wire.genre_tags,
            maturity_tag: wire.maturity_tag,
            cast_names: wire.cast_names,
            credit_primary: pick_credit([wire.credit_primary, wire.director, wire.creator]),
            credit_secondary: pick_credit([wire.credit_secondary, wire.director_en, wire.creator_en]),
            duration_label: wire.duration_label,
            season_count: wire.season_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_draft_from_console_fields() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "title": "X",
            "year": 2020,
            "rating": "7.5"
        }))
        .unwrap();

        assert_eq!(draft.title_primary, "X");
        assert_eq!(draft.release_year, Some(2020));
        assert_eq!(draft.rating_score, 7.5);
        assert!(draft.genre_tags.is_empty());
        assert!(draft.cast_names.is_empty());
    }

    #[test]
    fn test_draft_malformed_rating_defaults_to_zero() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "title": "Y",
            "rating": "excellent",
            "genre": "Drama",
            "seasons": "3"
        }))
        .unwrap();

        assert_eq!(draft.rating_score, 0.0);
        assert!(draft.genre_tags.is_empty());
        assert_eq!(draft.season_count, Some(3));
    }

    #[test]
    fn test_patch_only_carries_present_fields() {
        let patch: ItemPatch = serde_json::from_value(json!({ "rating": "9.1" })).unwrap();
        assert_eq!(patch.rating_score, Some(9.1));
        assert!(patch.title_primary.is_none());
        assert!(!patch.touches_title());
        assert!(!patch.is_empty());
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn test_draft_accepts_director_and_creator_together() {
        let draft: ItemDraft = serde_json::from_value(json!({
            "title": "Heat",
            "director": "",
            "creator": "Michael Mann",
            "directorEn": "Michael Mann"
        }))
        .unwrap();
        assert_eq!(draft.credit_primary.as_deref(), Some("Michael Mann"));
        assert_eq!(draft.credit_secondary.as_deref(), Some("Michael Mann"));

        let patch: ItemPatch = serde_json::from_value(json!({
            "director": "Denis Villeneuve",
            "creator": "Frank Herbert"
        }))
        .unwrap();
        assert_eq!(patch.credit_primary.as_deref(), Some("Denis Villeneuve"));
        assert!(patch.touches_credit());
    }

    #[test]
    fn test_blank_credit_is_still_a_change() {
        let patch: ItemPatch = serde_json::from_value(json!({ "creator": "" })).unwrap();
        assert_eq!(patch.credit_primary.as_deref(), Some(""));
    }

    #[test]
    fn test_draft_reads_its_own_serialized_form() {
        let draft = ItemDraft {
            credit_primary: Some("Ridley Scott".to_string()),
            rating_score: 8.4,
            ..ItemDraft::titled("Alien")
        };
        let back: ItemDraft = serde_json::from_value(serde_json::to_value(&draft).unwrap()).unwrap();
        assert_eq!(back, draft);
    }
}
