use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use speedy_summary::app::App;
use speedy_summary::config::Config;
use speedy_summary::models::{
    HistoryItem, OptionValue, Sender, SummaryFocus, SummaryLength, SummaryOptions, SummaryStyle,
};
use speedy_summary::session::Phase;
use speedy_summary::stats::{Distribution, Statistics, TimeRange};

#[derive(Parser)]
#[command(name = "speedy-summary", version, about = "Summarize documents and chat about them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a PDF and add it to the history
    Summarize {
        file: PathBuf,
        #[arg(long)]
        length: Option<SummaryLength>,
        #[arg(long)]
        style: Option<SummaryStyle>,
        #[arg(long)]
        focus: Option<SummaryFocus>,
    },
    /// List past summaries, newest first
    History {
        #[arg(long)]
        json: bool,
    },
    /// Print one summary in full
    Show { id: String },
    /// Delete a summary from the history
    Delete { id: String },
    /// Statistics over the history
    Stats {
        #[arg(long, default_value = "all")]
        range: TimeRange,
        /// Use randomly generated demo data instead of the history
        #[arg(long)]
        demo: bool,
        #[arg(long)]
        json: bool,
    },
    /// Ask questions about a summary, one per line on stdin
    Chat { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let mut app = App::new(&config)
        .await
        .context("failed to start")?;

    if let Some(failure) = &app.load_failure {
        eprintln!("Warning: {} (starting with an empty history)", failure);
    }

    match cli.command {
        Command::Summarize {
            file,
            length,
            style,
            focus,
        } => {
            let defaults = app.options;
            let options = SummaryOptions::new(
                length.unwrap_or(defaults.length),
                style.unwrap_or(defaults.style),
                focus.unwrap_or(defaults.focus),
            );
            summarize(&mut app, &file, options).await?;
        }

        Command::History { json } => {
            let items = app.ledger.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No summaries yet");
            } else {
                for item in &items {
                    print_history_line(item);
                }
            }
        }

        Command::Show { id } => {
            let Some(item) = app.ledger.get(&id) else {
                bail!("no summary with id {}", id);
            };
            print_history_line(&item);
            println!();
            println!("{}", item.body());
        }

        Command::Delete { id } => {
            if app.delete_history_item(&id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No summary with id {}", id);
            }
        }

        Command::Stats { range, demo, json } => {
            let stats = app.statistics(range, demo);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_statistics(&stats);
            }
        }

        Command::Chat { id } => {
            chat(&mut app, &id).await?;
        }
    }

    Ok(())
}

async fn summarize(app: &mut App, file: &PathBuf, options: SummaryOptions) -> anyhow::Result<()> {
    app.select_document(file)
        .with_context(|| format!("cannot use {}", file.display()))?;
    app.run_until_settled().await?;

    if app.session.phase() != Phase::TextExtracted {
        let reason = app
            .session
            .state()
            .last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "extraction did not complete".to_string());
        bail!("{}", reason);
    }

    app.request_summary(options)?;
    if let Err(e) = app.run_until_settled().await {
        // The summary is still in the history for this run; only the write failed.
        eprintln!("Warning: {}", e);
    }

    match app.session.phase() {
        Phase::Summarized => {
            if let Some(summary) = &app.session.state().summary {
                println!("{}", summary);
            }
            if let Some(item) = app.ledger.list().first() {
                println!();
                println!("Saved as {}", item.id);
            }
            Ok(())
        }
        _ => {
            let reason = app
                .session
                .state()
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "summary did not complete".to_string());
            bail!("{}", reason)
        }
    }
}

async fn chat(app: &mut App, id: &str) -> anyhow::Result<()> {
    app.bind_chat(Some(id))?;
    let mut printed = print_new_messages(app, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Err(e) = app.ask(&line) {
            eprintln!("Not sent: {}", e);
            continue;
        }
        app.run_until_settled().await?;
        printed = print_new_messages(app, printed);
    }
    Ok(())
}

fn print_new_messages(app: &App, already_printed: usize) -> usize {
    let messages = app.chat.messages();
    for message in &messages[already_printed..] {
        if message.sender == Sender::Assistant {
            println!("{}\n", message.content);
        }
    }
    messages.len()
}

fn print_history_line(item: &HistoryItem) {
    println!(
        "{}  {}  {}  [{}, {}, {}]",
        item.id,
        item.date.format("%Y-%m-%d %H:%M"),
        item.title,
        item.options.length,
        item.options.style,
        item.options.focus
    );
}

fn print_distribution<T: OptionValue>(name: &str, distribution: &Distribution<T>) {
    let parts: Vec<String> = distribution
        .iter()
        .map(|(value, count)| format!("{} {}", value.as_str(), count))
        .collect();
    println!(
        "{:<8} {}  (most popular: {})",
        name,
        parts.join(", "),
        distribution.most_popular().as_str()
    );
}

fn print_statistics(stats: &Statistics) {
    let kind = if stats.synthetic { "demo data" } else { "history" };
    println!("Statistics for {} ({})", stats.time_range, kind);
    println!("Total summaries: {}", stats.total);
    println!();
    print_distribution("Length", &stats.by_length);
    print_distribution("Style", &stats.by_style);
    print_distribution("Focus", &stats.by_focus);
    println!();

    let max = stats.timeline.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bucket in &stats.timeline {
        let width = (bucket.count * 40 / max) as usize;
        println!("{:>8} {:>4} {}", bucket.label, bucket.count, "#".repeat(width));
    }
}
