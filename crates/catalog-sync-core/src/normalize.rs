//! Field mapping between remote rows and in-memory catalog items.
//!
//! Incoming rows prefer the display-language (`_ar`) column and fall back to
//! the plain column. Outgoing writes split the pair again: the `_ar` column
//! takes the display value, the plain column the English value (or the
//! display value when no English value was given).

use catalog_sync_models::lenient::{integer_from_value, score_from_value, strings_from_value};
use catalog_sync_models::{CatalogItem, Collection, ItemDetails, ItemDraft, ItemId, ItemPatch, RawRecord};
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("{0} record has no id")]
    MissingId(Collection),
}

/// Trim a text field; blank becomes `None`.
fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn prefer(primary: Option<&str>, secondary: Option<&str>) -> Option<String> {
    clean(primary).or_else(|| clean(secondary))
}

fn clean_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| clean(Some(v.as_str())))
        .collect()
}

fn finite_or_zero(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn seasons_at_least_one(count: Option<i64>) -> u32 {
    count
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .unwrap_or(1)
}

/// Build the in-memory item for a row of `collection`.
pub fn item_from_raw(collection: Collection, raw: &RawRecord) -> Result<CatalogItem, NormalizeError> {
    let id = raw.id.ok_or(NormalizeError::MissingId(collection))?;

    let details = match collection {
        Collection::Movies => ItemDetails::Movie {
            duration_label: clean(raw.duration.as_deref()),
            director_primary: prefer(raw.director_ar.as_deref(), raw.director.as_deref()),
            director_secondary: clean(raw.director.as_deref()),
        },
        Collection::Shows => ItemDetails::Show {
            season_count: seasons_at_least_one(raw.seasons.as_ref().and_then(integer_from_value)),
            creator_primary: prefer(raw.creator_ar.as_deref(), raw.creator.as_deref()),
            creator_secondary: clean(raw.creator.as_deref()),
        },
    };

    Ok(CatalogItem {
        id,
        title_primary: prefer(raw.title_ar.as_deref(), raw.title.as_deref()).unwrap_or_default(),
        title_secondary: clean(raw.title.as_deref()).unwrap_or_default(),
        description_primary: prefer(raw.description_ar.as_deref(), raw.description.as_deref())
            .unwrap_or_default(),
        description_secondary: clean(raw.description.as_deref()).unwrap_or_default(),
        poster_image_ref: clean(raw.image.as_deref()),
        banner_image_ref: clean(raw.banner.as_deref()),
        playback_ref: clean(raw.video_url.as_deref()),
        release_year: raw
            .year
            .as_ref()
            .and_then(integer_from_value)
            .and_then(|y| i32::try_from(y).ok()),
        rating_score: raw.rating.as_ref().map(score_from_value).unwrap_or(0.0),
        genre_tags: raw.genre.as_ref().map(strings_from_value).unwrap_or_default(),
        maturity_tag: clean(raw.maturity_rating.as_deref()),
        cast_names: raw.cast.as_ref().map(strings_from_value).unwrap_or_default(),
        details,
    })
}

/// Build the in-memory item for a draft that never reached the service.
pub fn item_from_draft(collection: Collection, id: ItemId, draft: &ItemDraft) -> CatalogItem {
    let details = match collection {
        Collection::Movies => ItemDetails::Movie {
            duration_label: clean(draft.duration_label.as_deref()),
            director_primary: prefer(draft.credit_primary.as_deref(), draft.credit_secondary.as_deref()),
            director_secondary: clean(draft.credit_secondary.as_deref()),
        },
        Collection::Shows => ItemDetails::Show {
            season_count: seasons_at_least_one(draft.season_count.map(i64::from)),
            creator_primary: prefer(draft.credit_primary.as_deref(), draft.credit_secondary.as_deref()),
            creator_secondary: clean(draft.credit_secondary.as_deref()),
        },
    };

    CatalogItem {
        id,
        title_primary: prefer(Some(draft.title_primary.as_str()), Some(draft.title_secondary.as_str())).unwrap_or_default(),
        title_secondary: clean(Some(draft.title_secondary.as_str())).unwrap_or_default(),
        description_primary: prefer(Some(draft.description_primary.as_str()), Some(draft.description_secondary.as_str()))
            .unwrap_or_default(),
        description_secondary: clean(Some(draft.description_secondary.as_str())).unwrap_or_default(),
        poster_image_ref: clean(draft.poster_image_ref.as_deref()),
        banner_image_ref: clean(draft.banner_image_ref.as_deref()),
        playback_ref: clean(draft.playback_ref.as_deref()),
        release_year: draft.release_year,
        rating_score: finite_or_zero(draft.rating_score),
        genre_tags: clean_list(&draft.genre_tags),
        maturity_tag: clean(draft.maturity_tag.as_deref()),
        cast_names: clean_list(&draft.cast_names),
        details,
    }
}

/// Re-apply the normalization rules to an item built in memory, e.g. after
/// a local shallow merge.
pub fn normalize_item(item: CatalogItem) -> CatalogItem {
    let details = match item.details {
        ItemDetails::Movie {
            duration_label,
            director_primary,
            director_secondary,
        } => ItemDetails::Movie {
            duration_label: clean(duration_label.as_deref()),
            director_primary: prefer(director_primary.as_deref(), director_secondary.as_deref()),
            director_secondary: clean(director_secondary.as_deref()),
        },
        ItemDetails::Show {
            season_count,
            creator_primary,
            creator_secondary,
        } => ItemDetails::Show {
            season_count: season_count.max(1),
            creator_primary: prefer(creator_primary.as_deref(), creator_secondary.as_deref()),
            creator_secondary: clean(creator_secondary.as_deref()),
        },
    };

    CatalogItem {
        id: item.id,
        title_primary: prefer(Some(item.title_primary.as_str()), Some(item.title_secondary.as_str())).unwrap_or_default(),
        title_secondary: clean(Some(item.title_secondary.as_str())).unwrap_or_default(),
        description_primary: prefer(Some(item.description_primary.as_str()), Some(item.description_secondary.as_str()))
            .unwrap_or_default(),
        description_secondary: clean(Some(item.description_secondary.as_str())).unwrap_or_default(),
        poster_image_ref: clean(item.poster_image_ref.as_deref()),
        banner_image_ref: clean(item.banner_image_ref.as_deref()),
        playback_ref: clean(item.playback_ref.as_deref()),
        release_year: item.release_year,
        rating_score: finite_or_zero(item.rating_score),
        genre_tags: clean_list(&item.genre_tags),
        maturity_tag: clean(item.maturity_tag.as_deref()),
        cast_names: clean_list(&item.cast_names),
        details,
    }
}

/// Split a localized pair into `(plain column, _ar column)`.
fn split_pair(primary: Option<&str>, secondary: Option<&str>) -> (Option<String>, Option<String>) {
    let primary = clean(primary);
    let secondary = clean(secondary).or_else(|| primary.clone());
    (secondary, primary)
}

fn list_value(values: &[String]) -> Value {
    Value::Array(clean_list(values).into_iter().map(Value::String).collect())
}

fn score_value(score: f64) -> Value {
    serde_json::Number::from_f64(finite_or_zero(score))
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Outgoing row for a new item.
pub fn raw_from_draft(collection: Collection, draft: &ItemDraft) -> RawRecord {
    let (title, title_ar) = split_pair(Some(draft.title_primary.as_str()), Some(draft.title_secondary.as_str()));
    let (description, description_ar) =
        split_pair(Some(draft.description_primary.as_str()), Some(draft.description_secondary.as_str()));
    let (credit, credit_ar) = split_pair(draft.credit_primary.as_deref(), draft.credit_secondary.as_deref());

    let mut raw = RawRecord {
        title,
        title_ar,
        description,
        description_ar,
        image: clean(draft.poster_image_ref.as_deref()),
        banner: clean(draft.banner_image_ref.as_deref()),
        video_url: clean(draft.playback_ref.as_deref()),
        year: draft.release_year.map(Value::from),
        rating: Some(score_value(draft.rating_score)),
        genre: Some(list_value(&draft.genre_tags)),
        maturity_rating: clean(draft.maturity_tag.as_deref()),
        cast: Some(list_value(&draft.cast_names)),
        ..RawRecord::default()
    };

    match collection {
        Collection::Movies => {
            raw.director = credit;
            raw.director_ar = credit_ar;
            raw.duration = clean(draft.duration_label.as_deref());
        }
        Collection::Shows => {
            raw.creator = credit;
            raw.creator_ar = credit_ar;
            raw.seasons = Some(Value::from(seasons_at_least_one(draft.season_count.map(i64::from))));
        }
    }
    raw
}

/// Outgoing partial row for an update of `current`. Only the columns the
/// patch touches are set, plus `updated_at`. Localized pairs are split from
/// the merged item, so touching one side never overwrites the other.
pub fn raw_from_patch(current: &CatalogItem, patch: &ItemPatch) -> RawRecord {
    let merged = current.merged_with(patch);
    let mut raw = RawRecord {
        image: patch.poster_image_ref.as_deref().map(|v| v.trim().to_string()),
        banner: patch.banner_image_ref.as_deref().map(|v| v.trim().to_string()),
        video_url: patch.playback_ref.as_deref().map(|v| v.trim().to_string()),
        year: patch.release_year.map(Value::from),
        rating: patch.rating_score.map(score_value),
        genre: patch.genre_tags.as_deref().map(list_value),
        maturity_rating: patch.maturity_tag.as_deref().map(|v| v.trim().to_string()),
        cast: patch.cast_names.as_deref().map(list_value),
        updated_at: Some(Utc::now().to_rfc3339()),
        ..RawRecord::default()
    };

    if patch.touches_title() {
        let (title, title_ar) = split_pair(Some(merged.title_primary.as_str()), Some(merged.title_secondary.as_str()));
        raw.title = title;
        raw.title_ar = title_ar;
    }
    if patch.touches_description() {
        let (description, description_ar) = split_pair(
            Some(merged.description_primary.as_str()),
            Some(merged.description_secondary.as_str()),
        );
        raw.description = description;
        raw.description_ar = description_ar;
    }

    let (credit_primary, credit_secondary) = match &merged.details {
        ItemDetails::Movie {
            director_primary,
            director_secondary,
            ..
        } => (director_primary.as_deref(), director_secondary.as_deref()),
        ItemDetails::Show {
            creator_primary,
            creator_secondary,
            ..
        } => (creator_primary.as_deref(), creator_secondary.as_deref()),
    };
    let credit = if patch.touches_credit() {
        Some(split_pair(credit_primary, credit_secondary))
    } else {
        None
    };

    match current.collection() {
        Collection::Movies => {
            if let Some((director, director_ar)) = credit {
                raw.director = director;
                raw.director_ar = director_ar;
            }
            raw.duration = patch.duration_label.as_deref().map(|v| v.trim().to_string());
        }
        Collection::Shows => {
            if let Some((creator, creator_ar)) = credit {
                raw.creator = creator;
                raw.creator_ar = creator_ar;
            }
            raw.seasons = patch
                .season_count
                .map(|n| Value::from(seasons_at_least_one(Some(i64::from(n)))));
        }
    }
    raw
}

/// Full outgoing row for an in-memory item, id included.
pub fn raw_from_item(item: &CatalogItem) -> RawRecord {
    let (title, title_ar) = split_pair(Some(item.title_primary.as_str()), Some(item.title_secondary.as_str()));
    let (description, description_ar) =
        split_pair(Some(item.description_primary.as_str()), Some(item.description_secondary.as_str()));

    let mut raw = RawRecord {
        title,
        title_ar,
        description,
        description_ar,
        image: item.poster_image_ref.clone(),
        banner: item.banner_image_ref.clone(),
        video_url: item.playback_ref.clone(),
        year: item.release_year.map(Value::from),
        rating: Some(score_value(item.rating_score)),
        genre: Some(list_value(&item.genre_tags)),
        maturity_rating: item.maturity_tag.clone(),
        cast: Some(list_value(&item.cast_names)),
        ..RawRecord::with_id(item.id)
    };

    match &item.details {
        ItemDetails::Movie {
            duration_label,
            director_primary,
            director_secondary,
        } => {
            let (director, director_ar) = split_pair(director_primary.as_deref(), director_secondary.as_deref());
            raw.director = director;
            raw.director_ar = director_ar;
            raw.duration = duration_label.clone();
        }
        ItemDetails::Show {
            season_count,
            creator_primary,
            creator_secondary,
        } => {
            let (creator, creator_ar) = split_pair(creator_primary.as_deref(), creator_secondary.as_deref());
            raw.creator = creator;
            raw.creator_ar = creator_ar;
            raw.seasons = Some(Value::from((*season_count).max(1)));
        }
    }
    raw
}
