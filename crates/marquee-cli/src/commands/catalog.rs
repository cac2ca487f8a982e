use super::parse_collection;
use crate::context::CatalogContext;
use crate::output::Output;
use catalog_sync_core::{browse, home_rows, similar, BrowseFilter, SortOrder};
use catalog_sync_models::ItemId;
use color_eyre::Result;
use serde_json::json;

/// Filters and ordering for `marquee list`
pub struct Listing {
    pub genres: Vec<String>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
    pub min_rating: f64,
    pub sort: String,
}

impl Listing {
    fn into_query(self) -> Result<(BrowseFilter, SortOrder)> {
        let order = self.sort.parse::<SortOrder>().map_err(|e| color_eyre::eyre::eyre!(e))?;
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(color_eyre::eyre::eyre!("--from-year {} is after --to-year {}", from, to));
            }
        }
        let filter = BrowseFilter {
            genres: self.genres.into_iter().filter(|g| !g.trim().is_empty()).collect(),
            year_from: self.from_year,
            year_to: self.to_year,
            min_rating: self.min_rating,
        };
        Ok((filter, order))
    }
}

pub async fn run_list(collection: &str, listing: Listing, output: &Output) -> Result<()> {
    let collection = parse_collection(collection)?;
    let (filter, order) = listing.into_query()?;

    let ctx = CatalogContext::open_loaded(output).await?;
    let items = ctx.sync.items(collection).await;
    let shown = browse(&items, &filter, order);
    tracing::debug!(collection = %collection, total = items.len(), shown = shown.len(), "Listing collection");

    output.items(&format!("{} ({} of {})", collection, shown.len(), items.len()), &shown);
    ctx.sync.teardown();
    Ok(())
}

pub async fn run_show(collection: &str, id: i64, similar_limit: usize, output: &Output) -> Result<()> {
    let collection = parse_collection(collection)?;
    let ctx = CatalogContext::open_loaded(output).await?;

    let item = ctx
        .sync
        .find(collection, ItemId(id))
        .await
        .ok_or_else(|| color_eyre::eyre::eyre!("No {} entry with id {}", collection, id))?;

    let snapshot = ctx.sync.snapshot().await;
    let related = similar(&snapshot, &item, similar_limit);

    if output.is_human() {
        output.item_detail(&item);
        if similar_limit > 0 {
            println!();
            output.items("More like this", &related);
        }
    } else {
        output.json(&json!({ "item": item, "similar": related }));
    }
    ctx.sync.teardown();
    Ok(())
}

pub async fn run_home(limit: usize, output: &Output) -> Result<()> {
    let ctx = CatalogContext::open_loaded(output).await?;
    let rows = home_rows(&ctx.sync.snapshot().await, limit);

    if output.is_human() {
        output.items("Trending now", &rows.trending);
        println!();
        output.items("Critically acclaimed", &rows.acclaimed);
        println!();
        output.items("New releases", &rows.new_releases);
    } else {
        output.json(&json!(rows));
    }
    ctx.sync.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(sort: &str, from: Option<i32>, to: Option<i32>) -> Listing {
        Listing {
            genres: vec!["Drama".to_string(), " ".to_string()],
            from_year: from,
            to_year: to,
            min_rating: 7.0,
            sort: sort.to_string(),
        }
    }

    #[test]
    fn test_listing_into_query() {
        let (filter, order) = listing("rating", Some(1990), None).into_query().unwrap();
        assert_eq!(order, SortOrder::Rating);
        assert_eq!(filter.genres, vec!["Drama".to_string()]);
        assert_eq!(filter.year_from, Some(1990));
        assert_eq!(filter.min_rating, 7.0);
    }

    #[test]
    fn test_listing_rejects_bad_input() {
        assert!(listing("shuffle", None, None).into_query().is_err());
        assert!(listing("latest", Some(2020), Some(2000)).into_query().is_err());
    }
}
