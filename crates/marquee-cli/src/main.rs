use clap::{ArgAction, Parser, Subcommand};
use commands::{admin, catalog, clear, config, watch};

mod commands;
mod context;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Marquee - Keep the movie and show catalog in sync")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a collection, optionally filtered and sorted
    #[command(long_about = "Load the catalog and list one collection. Filters combine: an item must match every filter given. Items without a release year are hidden as soon as a year bound is set.")]
    List {
        /// movies or shows
        #[arg(default_value = "movies")]
        collection: String,

        /// Keep items tagged with any of these genres (comma-separated)
        #[arg(long, value_delimiter = ',')]
        genre: Vec<String>,

        /// Earliest release year
        #[arg(long)]
        from_year: Option<i32>,

        /// Latest release year
        #[arg(long)]
        to_year: Option<i32>,

        /// Minimum rating
        #[arg(long, default_value_t = 0.0)]
        min_rating: f64,

        /// Sort order: latest, rating or title
        #[arg(long, default_value = "latest")]
        sort: String,
    },
    /// Show one title and similar titles
    Show {
        collection: String,
        id: i64,

        /// How many similar titles to list
        #[arg(long, default_value_t = 6)]
        similar: usize,
    },
    /// Show the home page rows: trending, acclaimed and new releases
    Home {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Add a title (admin)
    #[command(long_about = "Add a title to a collection. Fields come from flags, from --data (a JSON object using the admin console field names), or both; flags win. When the catalog service rejects the write the title is kept locally and the command says so.")]
    Add {
        collection: String,

        #[command(flatten)]
        fields: admin::ItemArgs,
    },
    /// Edit a title (admin)
    Edit {
        collection: String,
        id: i64,

        #[command(flatten)]
        fields: admin::ItemArgs,
    },
    /// Delete a title (admin)
    Delete {
        collection: String,
        id: i64,

        /// Do not ask for confirmation
        #[arg(short, long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Sign in to the admin console
    Login {
        /// Admin username (defaults to the configured one)
        #[arg(long)]
        username: Option<String>,
    },
    /// Sign out of the admin console
    Logout,
    /// Follow live catalog changes until interrupted
    #[command(long_about = "Load the catalog, subscribe to both collections and print every change the catalog service pushes. Press Ctrl-C to stop; the subscriptions are released on exit.")]
    Watch,
    /// Manage configuration and credentials
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Clear local data
    #[command(long_about = "Clear locally stored data. Use --fallback to drop the offline catalog snapshot, --session to sign out, --credentials to remove stored secrets, or --all for everything.")]
    Clear {
        /// Clear everything
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the offline catalog snapshot
        #[arg(long, action = ArgAction::SetTrue)]
        fallback: bool,

        /// Clear the saved admin session
        #[arg(long, action = ArgAction::SetTrue)]
        session: bool,

        /// Clear stored credentials
        #[arg(long, action = ArgAction::SetTrue)]
        credentials: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration file
    Init {
        /// Catalog service URL
        #[arg(long)]
        url: Option<String>,

        /// Backend: rest or memory
        #[arg(long)]
        backend: Option<String>,

        /// Overwrite an existing file without asking
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store the catalog service API key
    SetKey {
        /// The key (prompted for when omitted)
        key: Option<String>,
    },
    /// Store the admin console password
    SetPassword,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let logging_config = context::load_config().ok().and_then(|c| c.logging);
    logging::init_logging(cli.verbose, cli.quiet, logging_config.as_ref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::List {
            collection,
            genre,
            from_year,
            to_year,
            min_rating,
            sort,
        } => {
            let listing = catalog::Listing {
                genres: genre,
                from_year,
                to_year,
                min_rating,
                sort,
            };
            catalog::run_list(&collection, listing, &output).await
        }
        Commands::Show { collection, id, similar } => catalog::run_show(&collection, id, similar, &output).await,
        Commands::Home { limit } => catalog::run_home(limit, &output).await,
        Commands::Add { collection, fields } => admin::run_add(&collection, fields, &output).await,
        Commands::Edit { collection, id, fields } => admin::run_edit(&collection, id, fields, &output).await,
        Commands::Delete { collection, id, yes } => admin::run_delete(&collection, id, yes, &output).await,
        Commands::Login { username } => admin::run_login(username, &output).await,
        Commands::Logout => admin::run_logout(&output).await,
        Commands::Watch => watch::run_watch(&output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Clear {
            all,
            fallback,
            session,
            credentials,
        } => clear::run_clear(all, fallback, session, credentials, &output).await,
    }
}
