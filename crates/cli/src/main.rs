use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use libris::modules::{
    books::{
        catalog::Catalog,
        models::{BookStatus, EditBook, Genre, NewBook},
        views::{filter_books, genre_universe, BookFilter, Selection},
    },
    recommendations::{
        client::{Recommender, SuggestionDraft},
        gemini::GeminiClient,
    },
};
use libris_kernel::settings::Settings;
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "libris-cli", version, about = "Manage the Libris catalog")]
struct Cli {
    /// Directory holding the catalog slot; overrides `storage.data_dir`
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log at info level instead of warnings only
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List books matching a search term and filters
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "All")]
        genre: Selection<Genre>,
        #[arg(long, default_value = "All")]
        status: Selection<BookStatus>,
    },
    /// Show the genres present in the catalog
    Genres,
    /// Add a book
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long, default_value = "Fiction")]
        genre: Genre,
        #[arg(long)]
        cover: Option<String>,
    },
    /// Edit an existing book; omitted fields keep their values
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        genre: Option<Genre>,
        #[arg(long)]
        cover: Option<String>,
    },
    /// Check a book out or return it
    Toggle { id: String },
    /// Delete a book
    Delete { id: String },
    /// Ask the AI for one book suggestion
    Recommend {
        prompt: String,
        /// Add the suggestion to the catalog
        #[arg(long)]
        accept: bool,
    },
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn not_found(id: &str) -> anyhow::Error {
    anyhow!("book '{id}' not found")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load Libris settings")?;
    if !cli.verbose {
        settings.telemetry.level = "warn".to_string();
    }
    libris_telemetry::init(&settings.telemetry)?;

    let data_dir = cli.data_dir.unwrap_or(settings.storage.data_dir.clone());
    let mut catalog = Catalog::open(&data_dir);

    match cli.command {
        Command::List {
            search,
            genre,
            status,
        } => {
            let filter = BookFilter {
                search,
                genre,
                status,
            };
            print_json(&filter_books(catalog.list(), &filter))?;
        }
        Command::Genres => {
            print_json(&genre_universe(catalog.list()))?;
        }
        Command::Add {
            title,
            author,
            genre,
            cover,
        } => {
            let draft = NewBook {
                cover_image_url: cover,
                ..NewBook::new(title, author, genre)
            };
            draft.validate()?;
            print_json(&catalog.add(draft))?;
        }
        Command::Edit {
            id,
            title,
            author,
            genre,
            cover,
        } => {
            let existing = catalog.get(&id).ok_or_else(|| not_found(&id))?;
            let edit = EditBook {
                title: title.unwrap_or_else(|| existing.title.clone()),
                author: author.unwrap_or_else(|| existing.author.clone()),
                genre: genre.unwrap_or(existing.genre),
                status: None,
                cover_image_url: cover,
            };
            edit.validate()?;
            let updated = edit.apply_to(existing);
            catalog.update(updated.clone());
            print_json(&updated)?;
        }
        Command::Toggle { id } => {
            let book = catalog.toggle_status(&id).ok_or_else(|| not_found(&id))?;
            print_json(&book)?;
        }
        Command::Delete { id } => {
            if !catalog.delete(&id) {
                return Err(not_found(&id));
            }
            print_json(&json!({ "deleted": id }))?;
        }
        Command::Recommend { prompt, accept } => {
            let api_key = settings.recommendation.resolve_api_key()?;
            let recommender =
                Recommender::new(GeminiClient::new(&settings.recommendation, api_key)?);

            let suggestion = recommender.recommend(&prompt).await.map_err(|err| {
                tracing::error!(error = %err, "error generating recommendation");
                anyhow!(err.user_message())
            })?;

            if accept {
                let draft = SuggestionDraft::from(suggestion);
                print_json(&catalog.add(draft.into_new_book()))?;
            } else {
                print_json(&suggestion)?;
            }
        }
    }

    if !catalog.is_persisted() {
        eprintln!("warning: catalog changes could not be saved to {}", data_dir.display());
    }

    Ok(())
}
