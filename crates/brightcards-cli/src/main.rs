//! Brightcards CLI
//!
//! Command-line host for the scheduling engine: add cards, list the due
//! queue, submit reviews, and inspect parameters.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use brightcards_core::{
    Card, CardId, CardState, CardStore, DeckId, Grade, ParameterSet, Scheduler, Storage,
};

/// Brightcards - spaced-repetition scheduling from the command line
#[derive(Parser, Debug)]
#[command(name = "brightcards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Brightcards flashcard scheduler")]
#[command(long_about = "Brightcards schedules flashcards with the FSRS memory model.\n\nCards move New → Learning → Review, lapsing into Relearning when forgotten.")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "BRIGHTCARDS_DB")]
    db: Option<PathBuf>,

    /// Parameter set JSON file (weights, retention, ladders)
    #[arg(long, global = true, env = "BRIGHTCARDS_PARAMS")]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new card
    Add {
        /// Deck to add the card to (a fresh deck is created when omitted)
        #[arg(long)]
        deck: Option<DeckId>,
        /// Opaque content reference stored with the card
        #[arg(long)]
        content: Option<String>,
    },

    /// List cards that are due now
    Due {
        /// Only cards from this deck
        #[arg(long)]
        deck: Option<DeckId>,
        /// Maximum number of cards to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Submit a review
    Review {
        /// Card to review
        card: CardId,
        /// again, hard, good (or normal), easy, or 1-4
        grade: Grade,
        /// Review time, RFC3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show what each grade would do, without saving
    Preview {
        /// Card to preview
        card: CardId,
        /// Preview time, RFC3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show a card and its review history
    Show {
        /// Card to show
        card: CardId,
    },

    /// Show collection statistics
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the active parameter set as JSON
    Params,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let scheduler = load_scheduler(cli.params.as_deref())?;

    if let Commands::Params = cli.command {
        println!("{}", scheduler.params().to_json_pretty());
        return Ok(());
    }

    let storage = Storage::new(cli.db).context("failed to open card database")?;

    match cli.command {
        Commands::Add { deck, content } => run_add(&storage, deck, content),
        Commands::Due { deck, limit, json } => run_due(&storage, deck, limit, json),
        Commands::Review { card, grade, at } => run_review(&storage, &scheduler, card, grade, at),
        Commands::Preview { card, at } => run_preview(&storage, &scheduler, card, at),
        Commands::Show { card } => run_show(&storage, &scheduler, card),
        Commands::Stats { json } => run_stats(&storage, json),
        Commands::Params => Ok(()),
    }
}

/// Build the scheduler from `--params`, falling back to defaults
fn load_scheduler(path: Option<&std::path::Path>) -> anyhow::Result<Scheduler> {
    let params = match path {
        Some(path) => {
            let params = ParameterSet::from_path(path)
                .with_context(|| format!("failed to load parameters from {}", path.display()))?;
            info!("Loaded parameters from {}", path.display());
            params
        }
        None => ParameterSet::default(),
    };
    Ok(Scheduler::new(params)?)
}

fn load_card(storage: &Storage, id: CardId) -> anyhow::Result<Card> {
    storage
        .get_card(&id)?
        .with_context(|| format!("no card with id {}", id))
}

/// Run add command
fn run_add(storage: &Storage, deck: Option<DeckId>, content: Option<String>) -> anyhow::Result<()> {
    let deck = deck.unwrap_or_default();
    let mut card = Card::new(deck, Utc::now());
    if let Some(content) = content {
        card = card.with_content(content);
    }
    storage.insert_card(&card)?;

    println!("{}: {}", "Card".white().bold(), card.id);
    println!("{}: {}", "Deck".white().bold(), card.deck_id);
    println!("{}: {}", "Due".white().bold(), format_time(card.due));
    Ok(())
}

/// Run due command
fn run_due(storage: &Storage, deck: Option<DeckId>, limit: usize, json: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    let cards = storage.due_cards(deck, now, Some(limit))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("{}", "Nothing due.".dimmed());
        return Ok(());
    }

    println!("{}", format!("=== {} due ===", cards.len()).cyan().bold());
    for card in &cards {
        println!(
            "  {}  {:10}  due {}  {}",
            card.id,
            colored_state(card.state),
            format_time(card.due),
            card.content.as_deref().unwrap_or("").dimmed()
        );
    }
    Ok(())
}

/// Run review command
fn run_review(
    storage: &Storage,
    scheduler: &Scheduler,
    id: CardId,
    grade: Grade,
    at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let at = at.unwrap_or_else(Utc::now);
    let outcome = storage.review(&id, grade, at, scheduler)?;
    let card = &outcome.card;

    println!(
        "{} {} → {}",
        "Reviewed".green().bold(),
        colored_state(outcome.log.state_before),
        colored_state(card.state)
    );
    println!("{}: {}", "Next due".white().bold(), format_time(card.due));
    println!("{}: {}", "Interval".white().bold(), format_interval(card.scheduled_days));
    if let Some(s) = card.stability {
        println!("{}: {:.2} days", "Stability".white().bold(), s);
    }
    if let (Some(d), Some(label)) = (card.difficulty, card.difficulty_label()) {
        println!("{}: {:.2} ({})", "Difficulty".white().bold(), d, label);
    }
    if outcome.log.is_lapse() {
        println!("{}: {}", "Lapses".yellow().bold(), card.lapses);
    }
    Ok(())
}

/// Run preview command
fn run_preview(
    storage: &Storage,
    scheduler: &Scheduler,
    id: CardId,
    at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let at = at.unwrap_or_else(Utc::now);
    let card = load_card(storage, id)?;
    let preview = scheduler.preview(&card, at)?;

    println!("{}", format!("=== Preview {} ===", card.id).cyan().bold());
    for (grade, outcome) in preview.iter() {
        println!(
            "  {:6} {:10} in {:>10}  (due {})",
            grade.to_string().bold(),
            colored_state(outcome.card.state),
            format_interval(outcome.card.scheduled_days),
            format_time(outcome.card.due)
        );
    }
    Ok(())
}

/// Run show command
fn run_show(storage: &Storage, scheduler: &Scheduler, id: CardId) -> anyhow::Result<()> {
    let card = load_card(storage, id)?;
    let logs = storage.review_logs(&id)?;
    let now = Utc::now();

    println!("{}", format!("=== Card {} ===", card.id).cyan().bold());
    println!("{}: {}", "Deck".white().bold(), card.deck_id);
    if let Some(content) = &card.content {
        println!("{}: {}", "Content".white().bold(), content);
    }
    println!("{}: {}", "State".white().bold(), colored_state(card.state));
    println!("{}: {}", "Due".white().bold(), format_time(card.due));
    println!("{}: {} ({} lapses)", "Reviews".white().bold(), card.reps, card.lapses);
    if let Some(r) = scheduler.retrievability_at(&card, now) {
        println!("{}: {:.1}%", "Recall probability".white().bold(), r * 100.0);
    }

    if !logs.is_empty() {
        println!();
        println!("{}", "=== History ===".yellow().bold());
        for log in &logs {
            println!(
                "  {}  {:6} {} → {}  S {:.2}  D {:.2}  next {}",
                format_time(log.reviewed_at),
                log.grade.to_string(),
                log.state_before,
                log.state_after,
                log.stability_after,
                log.difficulty_after,
                format_interval(log.scheduled_days)
            );
        }
    }
    Ok(())
}

/// Run stats command
fn run_stats(storage: &Storage, json: bool) -> anyhow::Result<()> {
    let stats = storage.stats(Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Brightcards Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Total Cards".white().bold(), stats.total_cards);
    println!("{}: {}", "Due Now".white().bold(), stats.due_cards);
    println!("{}: {}", "Total Reviews".white().bold(), stats.total_reviews);
    println!("{}: {}", "Total Lapses".white().bold(), stats.total_lapses);
    if let Some(r) = stats.average_retrievability {
        println!("{}: {:.1}%", "Average Recall".white().bold(), r * 100.0);
    }
    if let Some(d) = stats.average_difficulty {
        println!("{}: {:.2}", "Average Difficulty".white().bold(), d);
    }
    if let Some(s) = stats.average_stability {
        println!("{}: {:.1} days", "Average Stability".white().bold(), s);
    }

    println!();
    println!("{}", "=== State Distribution ===".yellow().bold());
    let total = stats.total_cards.max(0) as usize;
    print_distribution_bar("New", stats.new_cards as usize, total, "white");
    print_distribution_bar("Learning", stats.learning_cards as usize, total, "yellow");
    print_distribution_bar("Review", stats.review_cards as usize, total, "green");
    print_distribution_bar("Relearning", stats.relearning_cards as usize, total, "red");
    Ok(())
}

fn colored_state(state: CardState) -> colored::ColoredString {
    let name = state.as_str();
    match state {
        CardState::New => name.white(),
        CardState::Learning => name.yellow(),
        CardState::Review => name.green(),
        CardState::Relearning => name.red(),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Human-readable interval: minutes under an hour, hours under a day
fn format_interval(days: f64) -> String {
    let minutes = days * 1440.0;
    if minutes < 60.0 {
        format!("{:.0}m", minutes)
    } else if days < 1.0 {
        format!("{:.1}h", minutes / 60.0)
    } else {
        format!("{:.0}d", days)
    }
}

fn print_distribution_bar(label: &str, count: usize, total: usize, color: &str) {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let empty = bar_width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));
    let colored_bar = match color {
        "green" => bar.green(),
        "yellow" => bar.yellow(),
        "red" => bar.red(),
        _ => bar.white(),
    };

    println!(
        "  {:12} [{:30}] {:>4} ({:>5.1}%)",
        label, colored_bar, count, percentage
    );
}
