use super::{parse_collection, prompts};
use crate::context::CatalogContext;
use crate::output::Output;
use catalog_sync_core::{AdminAuth, AuthError};
use catalog_sync_models::{ItemDraft, ItemId, ItemPatch};
use clap::Args;
use color_eyre::Result;

/// Title fields shared by `add` and `edit`.
///
/// Only the flags given on the command line are applied; with `edit` the rest
/// of the title is left untouched.
#[derive(Args, Debug, Default)]
pub struct ItemArgs {
    /// JSON object with admin console field names, e.g. '{"title": "..", "year": 2020}'
    #[arg(long)]
    pub data: Option<String>,

    /// Title in the display language
    #[arg(long)]
    pub title: Option<String>,

    /// Original (English) title
    #[arg(long)]
    pub title_en: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub description_en: Option<String>,

    /// Poster image URL
    #[arg(long)]
    pub poster: Option<String>,

    /// Banner image URL
    #[arg(long)]
    pub banner: Option<String>,

    /// Playback URL
    #[arg(long)]
    pub video: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub rating: Option<f64>,

    /// Comma-separated genres
    #[arg(long, value_delimiter = ',')]
    pub genre: Option<Vec<String>>,

    /// Maturity rating, e.g. PG-13
    #[arg(long)]
    pub maturity: Option<String>,

    /// Comma-separated cast names
    #[arg(long, value_delimiter = ',')]
    pub cast: Option<Vec<String>>,

    /// Director (movies) or creator (shows)
    #[arg(long)]
    pub credit: Option<String>,

    #[arg(long)]
    pub credit_en: Option<String>,

    /// Running time label (movies)
    #[arg(long)]
    pub duration: Option<String>,

    /// Number of seasons (shows)
    #[arg(long)]
    pub seasons: Option<u32>,
}

impl ItemArgs {
    pub fn into_draft(self) -> Result<ItemDraft> {
        let mut draft: ItemDraft = match &self.data {
            Some(data) => serde_json::from_str(data)
                .map_err(|e| color_eyre::eyre::eyre!("Invalid --data JSON: {}", e))?,
            None => ItemDraft::default(),
        };
        let patch = self.into_patch()?;

        if let Some(v) = patch.title_primary {
            draft.title_primary = v;
        }
        if let Some(v) = patch.title_secondary {
            draft.title_secondary = v;
        }
        if let Some(v) = patch.description_primary {
            draft.description_primary = v;
        }
        if let Some(v) = patch.description_secondary {
            draft.description_secondary = v;
        }
        if let Some(v) = patch.rating_score {
            draft.rating_score = v;
        }
        if let Some(v) = patch.genre_tags {
            draft.genre_tags = v;
        }
        if let Some(v) = patch.cast_names {
            draft.cast_names = v;
        }
        draft.poster_image_ref = patch.poster_image_ref.or(draft.poster_image_ref);
        draft.banner_image_ref = patch.banner_image_ref.or(draft.banner_image_ref);
        draft.playback_ref = patch.playback_ref.or(draft.playback_ref);
        draft.release_year = patch.release_year.or(draft.release_year);
        draft.maturity_tag = patch.maturity_tag.or(draft.maturity_tag);
        draft.credit_primary = patch.credit_primary.or(draft.credit_primary);
        draft.credit_secondary = patch.credit_secondary.or(draft.credit_secondary);
        draft.duration_label = patch.duration_label.or(draft.duration_label);
        draft.season_count = patch.season_count.or(draft.season_count);

        if draft.title_primary.trim().is_empty() {
            return Err(color_eyre::eyre::eyre!("A title is required (--title or \"title\" in --data)"));
        }
        Ok(draft)
    }

    /// Flags override fields from `--data`
    pub fn into_patch(self) -> Result<ItemPatch> {
        let mut patch: ItemPatch = match &self.data {
            Some(data) => serde_json::from_str(data)
                .map_err(|e| color_eyre::eyre::eyre!("Invalid --data JSON: {}", e))?,
            None => ItemPatch::default(),
        };

        patch.title_primary = self.title.or(patch.title_primary);
        patch.title_secondary = self.title_en.or(patch.title_secondary);
        patch.description_primary = self.description.or(patch.description_primary);
        patch.description_secondary = self.description_en.or(patch.description_secondary);
        patch.poster_image_ref = self.poster.or(patch.poster_image_ref);
        patch.banner_image_ref = self.banner.or(patch.banner_image_ref);
        patch.playback_ref = self.video.or(patch.playback_ref);
        patch.release_year = self.year.or(patch.release_year);
        patch.rating_score = self.rating.or(patch.rating_score);
        patch.genre_tags = self.genre.or(patch.genre_tags);
        patch.maturity_tag = self.maturity.or(patch.maturity_tag);
        patch.cast_names = self.cast.or(patch.cast_names);
        patch.credit_primary = self.credit.or(patch.credit_primary);
        patch.credit_secondary = self.credit_en.or(patch.credit_secondary);
        patch.duration_label = self.duration.or(patch.duration_label);
        patch.season_count = self.seasons.or(patch.season_count);
        Ok(patch)
    }
}

pub async fn run_add(collection: &str, fields: ItemArgs, output: &Output) -> Result<()> {
    let collection = parse_collection(collection)?;
    let draft = fields.into_draft()?;

    let ctx = CatalogContext::open_loaded(output).await?;
    ctx.require_admin()?;

    let written = ctx.sync.add(draft, collection).await;
    let item = written.value();
    output.written("Added", &written, &format!("{} #{} \"{}\"", collection, item.id, item.display_title()));
    ctx.sync.teardown();
    Ok(())
}

pub async fn run_edit(collection: &str, id: i64, fields: ItemArgs, output: &Output) -> Result<()> {
    let collection = parse_collection(collection)?;
    let patch = fields.into_patch()?;
    if patch.is_empty() {
        return Err(color_eyre::eyre::eyre!("Nothing to change. Pass at least one field flag or --data."));
    }

    let ctx = CatalogContext::open_loaded(output).await?;
    ctx.require_admin()?;

    match ctx.sync.update(ItemId(id), patch, collection).await {
        Some(written) => {
            let item = written.value();
            output.written("Updated", &written, &format!("{} #{} \"{}\"", collection, item.id, item.display_title()));
        }
        None => output.error(format!("No {} entry with id {}", collection, id)),
    }
    ctx.sync.teardown();
    Ok(())
}

pub async fn run_delete(collection: &str, id: i64, yes: bool, output: &Output) -> Result<()> {
    let collection = parse_collection(collection)?;
    let ctx = CatalogContext::open_loaded(output).await?;
    ctx.require_admin()?;

    let id = ItemId(id);
    let label = match ctx.sync.find(collection, id).await {
        Some(item) => format!("{} #{} \"{}\"", collection, id, item.display_title()),
        None => format!("{} #{}", collection, id),
    };

    if !yes && !prompts::prompt_yes_no(&format!("Delete {}?", label), Some(false))? {
        output.info("Nothing deleted");
        ctx.sync.teardown();
        return Ok(());
    }

    let written = ctx.sync.delete(id, collection).await;
    if written.value().is_none() {
        output.info(format!("{} was not in the local catalog", label));
    }
    output.written("Deleted", &written, &label);
    ctx.sync.teardown();
    Ok(())
}

pub async fn run_login(username: Option<String>, output: &Output) -> Result<()> {
    let ctx = CatalogContext::open()?;
    let mut auth = ctx.admin();

    let username = match username {
        Some(u) => u,
        None => prompts::prompt_string("Admin username", Some(ctx.config.admin.username.as_str()))?,
    };
    let password = rpassword::prompt_password("Admin password: ")
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read password: {}", e))?;

    login_with(&mut auth, &username, &password, output)
}

fn login_with(auth: &mut AdminAuth, username: &str, password: &str, output: &Output) -> Result<()> {
    match auth.login(username, password) {
        Ok(session) => {
            output.success(format!("Signed in as {} ({})", session.username, session.role));
            Ok(())
        }
        Err(AuthError::NotConfigured) => Err(color_eyre::eyre::eyre!(
            "No admin password configured. Run `marquee config set-password` first."
        )),
        Err(e) => Err(color_eyre::eyre::eyre!("{}", e)),
    }
}

pub async fn run_logout(output: &Output) -> Result<()> {
    let ctx = CatalogContext::open()?;
    let mut auth = ctx.admin();
    let was_signed_in = auth.is_authenticated();

    auth.logout()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to sign out: {}", e))?;
    if was_signed_in {
        output.success("Signed out");
    } else {
        output.info("Not signed in");
    }
    Ok(())
}
