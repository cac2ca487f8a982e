//! Built-in sample catalog, shown when neither the catalog service nor the
//! local fallback store has anything for a collection.

use catalog_sync_models::{CatalogItem, Collection, ItemDetails, ItemId};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn the_godfather() -> CatalogItem {
    CatalogItem {
        id: ItemId(1),
        title_primary: "العراب".to_string(),
        title_secondary: "The Godfather".to_string(),
        description_primary: "بطريرك عجوز لسلالة إجرامية منظمة ينقل السيطرة على إمبراطوريته السرية إلى ابنه المتردد في ملحمة عن الأسرة والسلطة والعنف.".to_string(),
        description_secondary: "The aging patriarch of an organized crime dynasty transfers control of his clandestine empire to his reluctant son.".to_string(),
        poster_image_ref: Some("https://image.tmdb.org/t/p/w500/3bhkrj58Vtu7enYsRolD1fZdja1.jpg".to_string()),
        banner_image_ref: Some("https://image.tmdb.org/t/p/original/tmU7GeKVybMWFButWEGl2M4GeiP.jpg".to_string()),
        playback_ref: None,
        release_year: Some(1972),
        rating_score: 9.2,
        genre_tags: strings(&["جريمة", "دراما"]),
        maturity_tag: Some("R".to_string()),
        cast_names: strings(&["مارلون براندو", "آل باتشينو", "جيمس كان"]),
        details: ItemDetails::Movie {
            duration_label: Some("2س 55د".to_string()),
            director_primary: Some("فرانسيس فورد كوبولا".to_string()),
            director_secondary: Some("Francis Ford Coppola".to_string()),
        },
    }
}

fn the_dark_knight() -> CatalogItem {
    CatalogItem {
        id: ItemId(2),
        title_primary: "فارس الظلام".to_string(),
        title_secondary: "The Dark Knight".to_string(),
        description_primary: "عندما يعيث الجوكر الفوضى في شوارع جوثام، يجب على باتمان أن يقبل واحدة من أعظم التحديات النفسية والجسدية للقتال ضد الظلم.".to_string(),
        description_secondary: "When the Joker wreaks havoc on Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.".to_string(),
        poster_image_ref: Some("https://image.tmdb.org/t/p/w500/qJ2tW6WMUDux911r6m7haRef0WH.jpg".to_string()),
        banner_image_ref: Some("https://image.tmdb.org/t/p/original/hqkIcbrOHL86UncnHIsHVcVmzue.jpg".to_string()),
        playback_ref: None,
        release_year: Some(2008),
        rating_score: 9.0,
        genre_tags: strings(&["أكشن", "جريمة", "دراما"]),
        maturity_tag: Some("PG-13".to_string()),
        cast_names: strings(&["كريستيان بيل", "هيث ليدجر", "آرون إيكهارت"]),
        details: ItemDetails::Movie {
            duration_label: Some("2س 32د".to_string()),
            director_primary: Some("كريستوفر نولان".to_string()),
            director_secondary: Some("Christopher Nolan".to_string()),
        },
    }
}

fn breaking_bad() -> CatalogItem {
    CatalogItem {
        id: ItemId(1),
        title_primary: "بريكنغ باد".to_string(),
        title_secondary: "Breaking Bad".to_string(),
        description_primary: "أستاذ كيمياء في المدرسة الثانوية يتم تشخيصه بسرطان الرئة غير القابل للعلاج ويتجه لتصنيع المخدرات مع طالب سابق لتأمين مستقبل عائلته المالي.".to_string(),
        description_secondary: "A high school chemistry teacher diagnosed with inoperable lung cancer turns to manufacturing drugs with a former student to secure his family's future.".to_string(),
        poster_image_ref: Some("https://image.tmdb.org/t/p/w500/ggFHVNu6YYI5L9pCfOacjizRGt.jpg".to_string()),
        banner_image_ref: Some("https://image.tmdb.org/t/p/original/suopoADq0k8YZr4dQXcU6pToj6s.jpg".to_string()),
        playback_ref: None,
        release_year: Some(2008),
        rating_score: 9.5,
        genre_tags: strings(&["جريمة", "دراما", "إثارة"]),
        maturity_tag: Some("TV-MA".to_string()),
        cast_names: strings(&["برايان كرانستون", "آرون بول", "آنا جن"]),
        details: ItemDetails::Show {
            season_count: 5,
            creator_primary: Some("فينس جيليجان".to_string()),
            creator_secondary: Some("Vince Gilligan".to_string()),
        },
    }
}

/// Sample items for `collection`, never empty.
pub fn seed_items(collection: Collection) -> Vec<CatalogItem> {
    match collection {
        Collection::Movies => vec![the_godfather(), the_dark_knight()],
        Collection::Shows => vec![breaking_bad()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_is_non_empty_and_well_formed() {
        for collection in Collection::ALL {
            let items = seed_items(collection);
            assert!(!items.is_empty());

            let ids: HashSet<ItemId> = items.iter().map(|i| i.id).collect();
            assert_eq!(ids.len(), items.len());
            assert!(items.iter().all(|i| i.collection() == collection));
            assert!(items.iter().all(|i| !i.title_primary.is_empty()));
        }
    }
}
