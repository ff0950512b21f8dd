//! Search binary entry point.
//!
//! This binary provides a command-line interface for searching the book
//! catalogs. It supports both single-query and interactive REPL modes, with
//! flexible output formatting (table or JSON).
//!
//! # Examples
//!
//! Single query with default settings:
//! ```bash
//! search --query "walden"
//! ```
//!
//! Mood-augmented search as JSON:
//! ```bash
//! search --query "poetry" --mood calm --format json
//! ```
//!
//! Derive the mood from quiz answers:
//! ```bash
//! search --query "essays" --answers 4,2,4,3,5
//! ```
//!
//! Interactive mode:
//! ```bash
//! search --interactive
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use moodsync::{
    config::SearchConfig,
    models::{Book, BookSource},
    mood::MoodKey,
    query::{BookSearchEngine, SearchQuery},
    service::{HttpMoodService, LocalMoodAnalyzer, MoodAnalyzer, TrackRecommender},
    session::{Event, Screen, SearchOutcome, SearchSession},
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Output format for search results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-friendly table with colored sources
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Search binary CLI for querying the book catalogs
#[derive(Parser, Debug)]
#[command(
    name = "search",
    version,
    about = "Search Google Books, Project Gutenberg and Open Library at once",
    long_about = "Query several public book catalogs concurrently, optionally steered by a \
                  mood. Results are deduplicated by title and ranked with free Gutenberg \
                  books first.

EXAMPLES:
  Single query:
    search --query \"walden\"

  Mood-augmented JSON output:
    search --query \"poetry\" --mood calm --format json

  Mood from quiz answers (energy, stress, emotion, need, focus):
    search --query \"essays\" --answers 4,2,4,3,5

  Interactive mode:
    search --interactive"
)]
struct Args {
    /// Search query (required for single-query mode, omitted in interactive mode)
    #[arg(long, value_name = "TEXT", conflicts_with = "interactive")]
    query: Option<String>,

    /// Mood used to augment the query
    #[arg(long, value_name = "MOOD", conflicts_with = "answers")]
    mood: Option<MoodKey>,

    /// Five comma-separated quiz answers (1-5) to derive the mood from
    #[arg(long, value_name = "A,B,C,D,E", value_delimiter = ',')]
    answers: Option<Vec<u8>>,

    /// Maximum number of results
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Per-catalog timeout in seconds
    #[arg(long, value_name = "SECS", env = "MOODSYNC_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH", env = "MOODSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable interactive REPL mode
    #[arg(long, short = 'i')]
    interactive: bool,

    /// Logging verbosity level
    #[arg(long, default_value = "warn", value_name = "LEVEL")]
    log_level: String,
}

/// Setup logging with the specified level
fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

/// Load configuration and apply command-line overrides
fn load_config(args: &Args) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SearchConfig::default(),
    };

    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(limit) = args.limit {
        config.page_size = limit;
    }
    config.validate().with_context(|| "Invalid configuration")?;

    Ok(config)
}

/// Truncate to at most `max` characters, appending an ellipsis when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Format results as a pretty table
fn format_results_table(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found. Try a different search.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Title").add_attribute(Attribute::Bold),
        Cell::new("Authors").add_attribute(Attribute::Bold),
        Cell::new("Source").add_attribute(Attribute::Bold),
        Cell::new("Rating").add_attribute(Attribute::Bold),
        Cell::new("Download").add_attribute(Attribute::Bold),
    ]);

    for (idx, book) in books.iter().enumerate() {
        let color = match book.source {
            BookSource::Gutenberg => Color::Green,
            BookSource::GoogleBooks => Color::Cyan,
            BookSource::OpenLibrary => Color::Yellow,
        };

        let rating = if book.average_rating > 0.0 {
            format!("{:.1}", book.average_rating)
        } else {
            "-".to_string()
        };

        let download = match (&book.pdf_url, &book.epub_url) {
            (Some(_), _) => "PDF",
            (None, Some(_)) => "EPUB",
            _ if book.is_free() => "Free",
            _ => "",
        };

        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(truncate(&book.title, 60)),
            Cell::new(truncate(&book.authors.join(", "), 40)),
            Cell::new(book.source.display_name()).fg(color),
            Cell::new(rating),
            Cell::new(download),
        ]);
    }

    table.to_string()
}

/// Format results as JSON
fn format_results_json(books: &[Book]) -> Result<String> {
    serde_json::to_string_pretty(books).with_context(|| "Failed to serialize results to JSON")
}

fn print_results(books: &[Book], format: OutputFormat, elapsed_secs: f64) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", format_results_table(books));
            println!("\nFound {} books in {:.2}s", books.len(), elapsed_secs);
        }
        OutputFormat::Json => println!("{}", format_results_json(books)?),
    }
    Ok(())
}

/// Display detailed view of a single result
fn display_book_detail(book: &Book, rank: usize) {
    println!("\n{}", "═".repeat(80));
    println!("Rank: {}", rank);
    println!("Title: {}", book.title);
    println!("Authors: {}", book.authors.join(", "));
    println!("Source: {}", book.source.display_name());
    println!("Categories: {}", book.categories.join(", "));
    if book.average_rating > 0.0 {
        println!(
            "Rating: {:.1} ({} ratings)",
            book.average_rating, book.ratings_count
        );
    }
    if let Some(date) = &book.published_date {
        println!("Published: {}", date);
    }
    if let Some(pages) = book.page_count {
        println!("Pages: {}", pages);
    }
    if let Some(publisher) = &book.publisher {
        println!("Publisher: {}", publisher);
    }
    if let Some(isbn) = &book.isbn {
        println!("ISBN: {}", isbn);
    }
    if let Some(editions) = book.editions {
        println!("Editions: {}", editions);
    }
    if let Some(downloads) = book.download_count {
        println!("Downloads: {}", downloads);
    }
    for (label, url) in [
        ("PDF", &book.pdf_url),
        ("EPUB", &book.epub_url),
        ("Text", &book.text_url),
    ] {
        if let Some(url) = url {
            println!("{}: {}", label, url);
        }
    }
    if let Some(link) = book.online_link() {
        println!("Online: {}", link);
    }
    println!("\n{}", book.description);
    println!("{}", "═".repeat(80));
}

fn print_help() {
    println!("Commands:");
    println!("  <query>          - Search for books");
    println!("  /mood MOOD       - Augment searches with a mood");
    println!("                     (anxious, stressed, melancholic, calm, upbeat, balanced)");
    println!("  /mood clear      - Clear the mood");
    println!("  /quiz A B C D E  - Derive the mood from five 1-5 answers");
    println!("  /tracks          - Show music suggestions for the current mood");
    println!("  /limit N         - Set number of results to N");
    println!("  /format table    - Use table output format");
    println!("  /format json     - Use JSON output format");
    println!("  /detail N        - Show full details for result rank N");
    println!("  /back            - Return from details to the result list");
    println!("  /help            - Show this help");
    println!("  Ctrl+D or Ctrl+C - Exit");
}

/// Run a search through the session and print accepted results
async fn run_search(
    session: &SearchSession<BookSearchEngine>,
    query: &SearchQuery,
    format: OutputFormat,
) -> Result<Option<Vec<Book>>> {
    debug!(query = %query.text, mood = ?query.mood, "executing search");
    let start = Instant::now();

    match session.search(query).await {
        Ok(SearchOutcome::Accepted(books)) => {
            print_results(&books, format, start.elapsed().as_secs_f64())?;
            Ok(Some(books))
        }
        Ok(SearchOutcome::Superseded) => Ok(None),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Run interactive REPL mode
async fn run_interactive(
    session: SearchSession<BookSearchEngine>,
    mood_service: HttpMoodService,
    mut mood: Option<MoodKey>,
    mut limit: Option<usize>,
    mut format: OutputFormat,
) -> Result<()> {
    println!("Interactive Book Search");
    print_help();
    println!();

    let mut rl = DefaultEditor::new().with_context(|| "Failed to create readline editor")?;

    let mut screen = Screen::default().on(Event::ChooseBooks);
    let mut last_results: Vec<Book> = Vec::new();

    loop {
        let prompt = match mood {
            Some(m) => format!("Search [{}]> ", m),
            None => "Search> ".to_string(),
        };

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                error!("Error reading input: {}", err);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        if !line.starts_with('/') {
            let query = SearchQuery::new(line, mood, limit);
            match run_search(&session, &query, format).await {
                Ok(Some(books)) => {
                    last_results = books;
                    screen = screen.on(Event::ResultsReady);
                }
                Ok(None) => {}
                Err(e) => eprintln!("{}", e),
            }
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "/help" => print_help(),
            "/mood" => match parts.get(1) {
                Some(&"clear") => {
                    mood = None;
                    println!("Cleared mood");
                }
                Some(value) => match value.parse::<MoodKey>() {
                    Ok(m) => {
                        mood = Some(m);
                        println!("Set mood to {}", m.category().name);
                    }
                    Err(e) => eprintln!("{}", e),
                },
                None => eprintln!("Usage: /mood MOOD  or  /mood clear"),
            },
            "/quiz" => {
                let answers: Result<Vec<u8>, _> =
                    parts[1..].iter().map(|p| p.parse::<u8>()).collect();
                let Ok(answers) = answers else {
                    eprintln!("Usage: /quiz A B C D E  (each 1-5)");
                    continue;
                };

                let mut quiz = Screen::default().on(Event::ChooseMusic);
                for _ in &answers {
                    quiz = quiz.on(Event::AnswerRecorded);
                }
                match LocalMoodAnalyzer.analyze(&answers).await {
                    Ok(analysis) if quiz.on(Event::MoodAnalyzed) == Screen::MoodResult => {
                        mood = Some(analysis.mood);
                        println!(
                            "Mood: {} - {}",
                            analysis.category_name, analysis.description
                        );
                    }
                    Ok(_) => eprintln!("Quiz incomplete"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "/tracks" => {
                let Some(m) = mood else {
                    eprintln!("Set a mood first with /mood or /quiz");
                    continue;
                };
                match mood_service.tracks(m).await {
                    Ok(tracks) if tracks.is_empty() => println!("No tracks for {}", m),
                    Ok(tracks) => {
                        for track in tracks {
                            println!("  {} - {}", track.name, track.artist);
                        }
                    }
                    Err(e) => eprintln!("Could not fetch tracks: {}", e),
                }
            }
            "/limit" => match parts.get(1).map(|n| n.parse::<usize>()) {
                Some(Ok(n)) if n > 0 => {
                    limit = Some(n);
                    println!("Set limit to {}", n);
                }
                _ => eprintln!("Usage: /limit N  (positive integer)"),
            },
            "/format" => match parts.get(1) {
                Some(&"table") => {
                    format = OutputFormat::Table;
                    println!("Set output format to table");
                }
                Some(&"json") => {
                    format = OutputFormat::Json;
                    println!("Set output format to JSON");
                }
                _ => eprintln!("Usage: /format [table|json]"),
            },
            "/detail" => match parts.get(1).map(|n| n.parse::<usize>()) {
                Some(Ok(rank)) if rank > 0 && rank <= last_results.len() => {
                    if let Screen::BookDetails { .. } = screen {
                        screen = screen.on(Event::Back);
                    }
                    screen = screen.on(Event::SelectBook(rank - 1));
                    if let Screen::BookDetails { index } = screen {
                        display_book_detail(&last_results[index], index + 1);
                    }
                }
                Some(Ok(rank)) if rank > last_results.len() => {
                    eprintln!(
                        "Rank {} out of range (last search had {} results)",
                        rank,
                        last_results.len()
                    );
                }
                _ => eprintln!("Usage: /detail N"),
            },
            "/back" => {
                screen = screen.on(Event::Back);
                if screen == Screen::BookResults {
                    print_results(&last_results, format, 0.0)?;
                }
            }
            other => eprintln!("Unknown command: {}. Type /help for available commands.", other),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level);

    let config = load_config(&args)?;

    let mood = match &args.answers {
        Some(answers) => {
            let analysis = LocalMoodAnalyzer
                .analyze(answers)
                .await
                .with_context(|| "Invalid quiz answers")?;
            info!("Derived mood {} from quiz answers", analysis.mood);
            Some(analysis.mood)
        }
        None => args.mood,
    };

    let engine = BookSearchEngine::from_config(&config)
        .with_context(|| "Failed to create search engine")?;
    info!("Searching catalogs: {:?}", engine.sources());
    let session = SearchSession::new(engine);

    if args.interactive {
        let mood_service = HttpMoodService::new(&config.mood_service_url, config.timeout())
            .with_context(|| "Failed to create mood service client")?;
        return run_interactive(session, mood_service, mood, None, args.format).await;
    }

    let Some(text) = args.query.as_deref() else {
        anyhow::bail!(
            "Either --query or --interactive must be specified.\n\
             Use --help for usage information."
        );
    };

    let query = SearchQuery::new(text, mood, None);
    run_search(&session, &query, args.format).await?;

    Ok(())
}
