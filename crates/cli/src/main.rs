//! # birdbook-cli
//!
//! Command-line front end for the birdbook API.

use anyhow::{bail, Context, Result};
use birdbook_core::{age_label, Badge, Bird, Chick, ChickStatus, FarmStats, Pair, Record};
use birdbook_http::{
    Confirm, DataCache, FarmClient, FormState, Resource, Workspace, DEFAULT_API_URL,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;
use tracing_subscriber::EnvFilter;

/// birdbook - bird, pair and chick records
#[derive(Parser)]
#[command(name = "birdbook")]
#[command(author, version, about = "Bird farm records from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API base URL
    #[arg(long, env = "BIRDBOOK_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Output format (table, json)
    #[arg(short = 'f', long = "format", default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Adult birds
    Birds {
        #[command(subcommand)]
        action: Action,
    },
    /// Breeding pairs
    Pairs {
        #[command(subcommand)]
        action: Action,
    },
    /// Chicks
    Chicks {
        #[command(subcommand)]
        action: Action,
    },
    /// Totals across all three lists
    Stats,
}

#[derive(Subcommand)]
enum Action {
    /// Show every record
    List,
    /// Create a record
    Add {
        /// Field value (FIELD=VALUE), e.g. RingNo=B001
        #[arg(short = 's', long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },
    /// Change fields of an existing record
    Edit {
        id: String,
        /// Field value (FIELD=VALUE); an empty value clears the field
        #[arg(short = 's', long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },
    /// Delete a record
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format for results.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Pretty table output (default)
    #[default]
    Table,
}

/// How a record type is shown and where the workspace keeps it.
trait Listing: Record {
    const COLLECTION: Resource;

    fn cached(cache: &DataCache) -> &[Self];

    fn form(ws: &mut Workspace) -> &mut FormState<Self>;

    fn columns() -> &'static [&'static str];

    fn row(&self, today: NaiveDate) -> Vec<String>;

    /// Column shown as a coloured badge, if any.
    fn badge(&self) -> Option<(usize, Badge)> {
        None
    }
}

impl Listing for Bird {
    const COLLECTION: Resource = Resource::Birds;

    fn cached(cache: &DataCache) -> &[Self] {
        &cache.birds
    }

    fn form(ws: &mut Workspace) -> &mut FormState<Self> {
        &mut ws.birds
    }

    fn columns() -> &'static [&'static str] {
        &[
            "BirdID", "RingNo", "Species", "Sex", "Color", "BirthDate", "Age(mo)", "Origin",
            "Notes",
        ]
    }

    fn row(&self, today: NaiveDate) -> Vec<String> {
        vec![
            self.bird_id.clone(),
            self.ring_no.clone(),
            self.species.clone(),
            self.sex.clone(),
            self.color.clone(),
            self.birth_date.clone(),
            age_label(&self.birth_date, today),
            self.origin.clone(),
            self.notes.clone(),
        ]
    }
}

impl Listing for Pair {
    const COLLECTION: Resource = Resource::Pairs;

    fn cached(cache: &DataCache) -> &[Self] {
        &cache.pairs
    }

    fn form(ws: &mut Workspace) -> &mut FormState<Self> {
        &mut ws.pairs
    }

    fn columns() -> &'static [&'static str] {
        Pair::HEADER
    }

    fn row(&self, _today: NaiveDate) -> Vec<String> {
        vec![
            self.pair_id.clone(),
            self.male_id.clone(),
            self.female_id.clone(),
            self.start_date.clone(),
            self.end_date.clone(),
            self.status.clone(),
            self.notes.clone(),
        ]
    }
}

impl Listing for Chick {
    const COLLECTION: Resource = Resource::Chicks;

    fn cached(cache: &DataCache) -> &[Self] {
        &cache.chicks
    }

    fn form(ws: &mut Workspace) -> &mut FormState<Self> {
        &mut ws.chicks
    }

    fn columns() -> &'static [&'static str] {
        &[
            "ChickID", "ClutchID", "BirdID", "RingNo", "HatchDate", "Age(mo)", "Sex", "Color",
            "Status", "Notes",
        ]
    }

    fn row(&self, today: NaiveDate) -> Vec<String> {
        vec![
            self.chick_id.clone(),
            self.clutch_id.clone(),
            self.bird_id.clone(),
            self.ring_no.clone(),
            self.hatch_date.clone(),
            age_label(&self.hatch_date, today),
            self.sex.clone(),
            self.color.clone(),
            if self.status.trim().is_empty() {
                "-".to_string()
            } else {
                self.status.clone()
            },
            self.notes.clone(),
        ]
    }

    fn badge(&self) -> Option<(usize, Badge)> {
        Some((8, ChickStatus::badge(&self.status)))
    }
}

/// Terminal yes/no prompt.
struct Prompt;

impl Confirm for Prompt {
    fn confirm(&self, prompt: &str) -> bool {
        let Ok(mut rl) = DefaultEditor::new() else {
            return false;
        };
        match rl.readline(&format!("{prompt} [y/N] ")) {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let client = FarmClient::new(&cli.api_url).context("Failed to create API client")?;
    let mut ws = Workspace::new(client);
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Birds { action } => run::<Bird>(&mut ws, action, cli.format, today).await,
        Command::Pairs { action } => run::<Pair>(&mut ws, action, cli.format, today).await,
        Command::Chicks { action } => run::<Chick>(&mut ws, action, cli.format, today).await,
        Command::Stats => {
            ws.load().await;
            warn_message(&ws);
            print_stats(&ws.cache.stats(), cli.format)
        }
    }
}

/// Run one action against the collection of `R`.
async fn run<R: Listing>(
    ws: &mut Workspace,
    action: Action,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<()> {
    let resource = R::COLLECTION;
    match action {
        Action::List => {
            ws.load().await;
            warn_message(ws);
            print_records(R::cached(&ws.cache), format, today)
        }
        Action::Add { fields } => {
            let form = R::form(ws);
            form.reset();
            form.fields = apply_fields::<R>(&form.fields, &fields)?;
            let saved = ws.save(resource).await;
            finish(ws, saved)
        }
        Action::Edit { id, fields } => {
            ws.load().await;
            if !ws.edit(resource, &id) {
                bail!("{} {id} not found", R::KIND);
            }
            let form = R::form(ws);
            form.fields = apply_fields::<R>(&form.fields, &fields)?;
            let saved = ws.save(resource).await;
            finish(ws, saved)
        }
        Action::Delete { id, yes } => {
            ws.load().await;
            let deleted = if yes {
                ws.delete(resource, &id, &|_: &str| true).await
            } else {
                ws.delete(resource, &id, &Prompt).await
            };
            if !deleted && ws.message().is_none() {
                println!("{}", "Cancelled".yellow());
                return Ok(());
            }
            finish(ws, deleted)
        }
    }
}

/// Report the workspace status line; a failed mutation is an error.
fn finish(ws: &Workspace, ok: bool) -> Result<()> {
    let message = ws.message().unwrap_or_default();
    if ok {
        println!("{}", message.green());
        Ok(())
    } else {
        bail!("{message}")
    }
}

fn warn_message(ws: &Workspace) {
    if let Some(message) = ws.message() {
        eprintln!("{} {message}", "Warning:".yellow().bold());
    }
}

/// Set form fields from `FIELD=VALUE` assignments.
///
/// Field names are the record's column names; the id column cannot be set.
fn apply_fields<R: Record>(fields: &R::Input, assignments: &[String]) -> Result<R::Input> {
    let mut json = serde_json::to_value(fields)?;
    let object = json
        .as_object_mut()
        .context("form fields are not a JSON object")?;

    for assignment in assignments {
        let (key, value) = assignment.split_once('=').with_context(|| {
            format!("Invalid field format: '{assignment}'. Expected FIELD=VALUE format")
        })?;
        let key = key.trim();
        if key == R::ID_FIELD || !R::HEADER.contains(&key) {
            bail!(
                "Unknown {} field '{key}'. Expected one of: {}",
                R::KIND,
                R::HEADER[1..].join(", ")
            );
        }
        object.insert(key.to_string(), JsonValue::String(value.to_string()));
    }

    Ok(serde_json::from_value(json)?)
}

fn print_records<R: Listing>(records: &[R], format: OutputFormat, today: NaiveDate) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("(no {})", R::RESOURCE);
                return Ok(());
            }
            for line in render_table(records, today) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Lay out records as aligned text columns, measured in terminal cells.
fn render_table<R: Listing>(records: &[R], today: NaiveDate) -> Vec<String> {
    let columns = R::columns();
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.row(today)).collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| UnicodeWidthStr::width(*c)).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| pad(name, *width).bold().to_string())
        .collect();
    lines.push(header.join("  "));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );

    for (record, row) in records.iter().zip(&rows) {
        let badge = record.badge();
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                let text = pad(cell, *width);
                match badge {
                    Some((column, badge)) if column == i => paint(&text, badge),
                    _ => text,
                }
            })
            .collect();
        lines.push(cells.join("  ").trim_end().to_string());
    }

    lines
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn paint(text: &str, badge: Badge) -> String {
    match badge {
        Badge::Danger => text.red().bold().to_string(),
        Badge::Warning => text.yellow().to_string(),
        Badge::Success => text.green().to_string(),
        Badge::None => text.dimmed().to_string(),
    }
}

fn print_stats(stats: &FarmStats, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stats)?),
        OutputFormat::Table => {
            println!(
                "{:<10}{:>6}  (male {}, female {})",
                "Birds".bold(),
                stats.total_birds,
                stats.male_birds,
                stats.female_birds
            );
            println!("{:<10}{:>6}", "Species".bold(), stats.species);
            println!(
                "{:<10}{:>6}  (active {})",
                "Pairs".bold(),
                stats.total_pairs,
                stats.active_pairs
            );
            println!(
                "{:<10}{:>6}  (alive {})",
                "Chicks".bold(),
                stats.total_chicks,
                stats.live_chicks
            );
        }
    }
    Ok(())
}
