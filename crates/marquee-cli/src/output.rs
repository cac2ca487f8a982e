use catalog_sync_core::Written;
use catalog_sync_models::{CatalogItem, Collection};
use clap::ValueEnum;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", msg.as_ref(), |m| println!("{} {}", "✓".green(), m));
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.message("info", msg.as_ref(), |m| println!("{}", m));
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", msg.as_ref(), |m| println!("{} {}", "⚠".yellow(), m));
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        // Shown even in quiet mode
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            _ => self.print_json(&json!({ "type": "error", "message": msg.as_ref() })),
        }
    }

    fn message(&self, kind: &str, msg: &str, human: impl FnOnce(&str)) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => human(msg),
            _ => self.print_json(&json!({ "type": kind, "message": msg })),
        }
    }

    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet && self.format != OutputFormat::Human {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(data).unwrap_or_default()),
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            OutputFormat::Human => println!("{}", data),
        }
    }

    /// One row per title. JSON formats emit the items as an array.
    pub fn items(&self, heading: &str, items: &[CatalogItem]) {
        if self.quiet {
            return;
        }
        if !self.is_human() {
            self.print_json(&json!({ "heading": heading, "items": items }));
            return;
        }

        println!("{}", heading.bold().bright_cyan());
        if items.is_empty() {
            println!("  {}", "(nothing here)".dimmed());
            return;
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Original").add_attribute(Attribute::Bold),
            Cell::new("Year").add_attribute(Attribute::Bold),
            Cell::new("Rating").add_attribute(Attribute::Bold),
            Cell::new("Genres").add_attribute(Attribute::Bold),
        ]);
        for item in items {
            table.add_row(vec![
                Cell::new(item.id.to_string()),
                Cell::new(item.display_title()),
                Cell::new(&item.title_secondary),
                Cell::new(item.release_year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())),
                rating_cell(item.rating_score),
                Cell::new(item.genre_tags.join(", ")),
            ]);
        }
        println!("{}", table);
    }

    /// Full record for a single title.
    pub fn item_detail(&self, item: &CatalogItem) {
        if self.quiet {
            return;
        }
        if !self.is_human() {
            self.print_json(&json!({ "item": item }));
            return;
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        table.set_header(vec![
            Cell::new(item.display_title()).fg(Color::Cyan).add_attribute(Attribute::Bold),
            Cell::new(&item.title_secondary),
        ]);

        let credit_label = match item.collection() {
            Collection::Movies => "Director",
            Collection::Shows => "Creator",
        };
        let mut rows: Vec<(&str, String)> = vec![
            ("ID", format!("{} ({})", item.id, item.collection())),
            ("Year", item.release_year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string())),
            ("Rating", format!("{:.1}", item.rating_score)),
            ("Genres", item.genre_tags.join(", ")),
            ("Maturity", item.maturity_tag.clone().unwrap_or_default()),
            (credit_label, item.credit().unwrap_or_default().to_string()),
            ("Cast", item.cast_names.join(", ")),
        ];
        if let Some(duration) = item.duration_label() {
            rows.push(("Duration", duration.to_string()));
        }
        if let Some(seasons) = item.season_count() {
            rows.push(("Seasons", seasons.to_string()));
        }
        rows.push((
            "Playable",
            if item.is_playable() { "✓".green().to_string() } else { "✗".red().to_string() },
        ));

        for (label, value) in rows {
            table.add_row(vec![Cell::new(label), Cell::new(value)]);
        }
        println!("{}", table);

        if !item.description_primary.is_empty() {
            println!("\n{}", item.description_primary);
        }
    }

    /// Report how a catalog write landed.
    pub fn written<T: Serialize>(&self, action: &str, written: &Written<T>, label: &str) {
        let remote = written.is_remote();
        if !self.is_human() {
            self.json(&json!({
                "type": "write",
                "action": action,
                "label": label,
                "result": written,
            }));
            return;
        }
        if remote {
            self.success(format!("{} {}", action, label));
        } else {
            self.warn(format!(
                "{} {} locally only; the catalog service did not accept the change",
                action, label
            ));
        }
    }
}

fn rating_cell(rating: f64) -> Cell {
    let cell = Cell::new(format!("{:.1}", rating));
    if rating >= catalog_sync_core::query::ACCLAIMED_RATING {
        cell.fg(Color::Green)
    } else {
        cell
    }
}
