// WiseWhisk command-line front end.
// Thin shell over the rules engine: parse input, call the copilot, print.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use wisewhisk_core::config::AppConfig;
use wisewhisk_core::engine::{
    split_comparison_query, ChatReply, ComparisonResult, Copilot, ProductReport, QuickAnalysis, ReplyKind,
};
use wisewhisk_core::logging;
use wisewhisk_core::lookup::{DatabaseStats, LocalFoodDatabase, OpenFoodFactsClient, ProductSource};
use wisewhisk_core::models::{CustomIngredient, NutritionRecord, UserProfile, ALLERGY_OPTIONS, DIETARY_OPTIONS};
use wisewhisk_core::session::{Session, SessionStore};

#[derive(Parser)]
#[command(
    name = "wisewhisk",
    version,
    about = "WiseWhisk ingredient co-pilot",
    long_about = "Look up, score and compare food products from Open Food Facts, check them against your allergies, and analyze ingredient lists."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Allergy to check products against (repeatable)
    #[arg(long = "allergy", global = true)]
    allergies: Vec<String>,

    /// Path of the local CSV food catalog
    #[arg(long, global = true, env = "WISEWHISK_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Answer from the local catalog only, without network calls
    #[arg(long, global = true)]
    offline: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single chat question, e.g. "Compare Coke vs Pepsi"
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Look a product up by barcode
    Scan { barcode: String },

    /// Analyze a pasted ingredient list
    Analyze {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Compare two products side by side
    Compare {
        item_a: String,
        item_b: String,

        /// Write the plain-text report to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show local catalog statistics
    Stats {
        /// Number of labels to list
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Interactive chat (default)
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(path) = cli.cache_path.clone() {
        config.cache_path = path;
    }
    logging::init_tracing(config.log_json || cli.json_logs, cli.verbose);

    let catalog = LocalFoodDatabase::load_or_empty(&config.cache_path);
    let remote: Arc<dyn ProductSource> = if cli.offline {
        info!("Offline mode: answering from the local catalog only");
        Arc::new(catalog.clone())
    } else {
        Arc::new(OpenFoodFactsClient::new(&config).context("Failed to build the Open Food Facts client")?)
    };
    let copilot = Copilot::new(remote, catalog);

    let mut store = SessionStore::new();
    let session_id = store.create();
    let session = store.get_mut(&session_id).context("Session vanished")?;

    if !cli.allergies.is_empty() {
        let profile = UserProfile {
            allergies: cli.allergies.iter().cloned().collect(),
            ..UserProfile::default()
        };
        session.update_profile(profile)?;
    }

    let out = Output { json: cli.json };
    match cli.command.unwrap_or(Command::Chat) {
        Command::Ask { query } => {
            let reply = copilot.handle_query(session, &query.join(" ")).await;
            out.reply(&reply)?;
        }
        Command::Scan { barcode } => scan(&copilot, session, &barcode, &out).await?,
        Command::Analyze { text } => analyze(&copilot, session, &text.join(" "), &out)?,
        Command::Compare { item_a, item_b, export } => {
            compare(&copilot, session, &item_a, &item_b, export, &out).await?
        }
        Command::Stats { top } => out.stats(&copilot.stats(session), top)?,
        Command::Chat => chat(&copilot, session, &out).await?,
    }

    store.end(&session_id);
    Ok(())
}

async fn scan(copilot: &Copilot, session: &mut Session, barcode: &str, out: &Output) -> Result<()> {
    match copilot.scan_barcode(session, barcode).await {
        Some(report) => out.product(&report),
        None => {
            println!("No product found for barcode {}.", barcode.trim());
            Ok(())
        }
    }
}

fn analyze(copilot: &Copilot, session: &mut Session, text: &str, out: &Output) -> Result<()> {
    match copilot.quick_analyze(session, text) {
        Some(analysis) => out.analysis(&analysis),
        None => {
            println!("No ingredients found in that text.");
            Ok(())
        }
    }
}

async fn compare(
    copilot: &Copilot,
    session: &mut Session,
    item_a: &str,
    item_b: &str,
    export: Option<PathBuf>,
    out: &Output,
) -> Result<()> {
    match copilot.compare(session, item_a, item_b).await {
        Ok(result) => {
            out.comparison(&result)?;
            if let Some(path) = export {
                std::fs::write(&path, result.render_report(Local::now()))
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                println!("Report saved to {}", path.display());
            }
        }
        Err(failure) => println!("Comparison incomplete: {}.", failure),
    }
    Ok(())
}

const CHAT_HELP: &str = "\
Commands:
  /scan <barcode>             look a product up by barcode
  /analyze <ingredients>      analyze a pasted ingredient list
  /compare <a> vs <b>         compare two products
  /profile                    show your profile
  /allergies <a, b, ...>      set allergies (empty to clear)
  /goals <text>               set health goals
  /diet <a, b, ...>           set dietary preferences
  /add <name> | <kcal> | <protein> | <fat> | <sugar> | <sodium> | <labels>
                              add a custom ingredient (per 100g)
  /custom                     list custom ingredients
  /custom clear               remove all custom ingredients
  /history [n]                show recent activity
  /export <file>              save activity history as CSV
  /clear                      clear activity history
  /stats                      catalog statistics
  /help                       this help
  /quit                       leave
Anything else is sent to the assistant.";

async fn chat(copilot: &Copilot, session: &mut Session, out: &Output) -> Result<()> {
    if let Some(welcome) = session.transcript().first() {
        println!("{}\n", welcome.content);
    }
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nyou> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
            let arg = arg.trim();
            match name {
                "quit" | "exit" | "q" => break,
                "help" => println!("{}", CHAT_HELP),
                "scan" if !arg.is_empty() => scan(copilot, session, arg, out).await?,
                "analyze" if !arg.is_empty() => analyze(copilot, session, arg, out)?,
                "compare" => match split_comparison_query(arg) {
                    Some((a, b)) => compare(copilot, session, &a, &b, None, out).await?,
                    None => println!("Usage: /compare <a> vs <b>"),
                },
                "profile" => print_profile(session.profile()),
                "allergies" => {
                    let mut profile = session.profile().clone();
                    profile.allergies = split_list(arg);
                    apply_profile(session, profile);
                }
                "goals" => {
                    let mut profile = session.profile().clone();
                    profile.health_goals = arg.to_string();
                    apply_profile(session, profile);
                }
                "diet" => {
                    let mut profile = session.profile().clone();
                    profile.dietary_preferences = split_list(arg);
                    apply_profile(session, profile);
                }
                "add" => match parse_custom_ingredient(arg) {
                    Ok(ingredient) => match session.add_custom_ingredient(ingredient) {
                        Ok(()) => println!("Ingredient added."),
                        Err(e) => println!("{}", e),
                    },
                    Err(msg) => println!("{}", msg),
                },
                "custom" if arg == "clear" => {
                    session.clear_custom_ingredients();
                    println!("Custom ingredients cleared.");
                }
                "custom" => print_custom(session.custom_ingredients()),
                "history" => {
                    let n = arg.parse().unwrap_or(10);
                    print_history(session, n);
                }
                "export" if !arg.is_empty() => {
                    let csv = session.activity().to_csv()?;
                    std::fs::write(arg, csv).with_context(|| format!("Failed to write {}", arg))?;
                    println!("History saved to {}", arg);
                }
                "clear" => {
                    session.activity_mut().clear();
                    println!("History cleared.");
                }
                "stats" => out.stats(&copilot.stats(session), 10)?,
                _ => println!("Unknown or incomplete command. Type /help."),
            }
            continue;
        }

        let reply = copilot.handle_query(session, line).await;
        out.reply(&reply)?;
    }

    println!(
        "Bye! {} analyses, {} comparisons this session.",
        session.analysis_count(),
        session.comparisons_made()
    );
    Ok(())
}

fn apply_profile(session: &mut Session, profile: UserProfile) {
    match session.update_profile(profile) {
        Ok(()) => print_profile(session.profile()),
        Err(e) => println!("{}", e),
    }
}

fn split_list(raw: &str) -> std::collections::BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_custom_ingredient(raw: &str) -> std::result::Result<CustomIngredient, String> {
    let fields: Vec<&str> = raw.split('|').map(str::trim).collect();
    if fields.len() < 6 {
        return Err("Usage: /add <name> | <kcal> | <protein> | <fat> | <sugar> | <sodium> | <labels>".to_string());
    }

    let number = |idx: usize, what: &str| -> std::result::Result<f64, String> {
        fields[idx]
            .parse::<f64>()
            .map_err(|_| format!("{} must be a number, got '{}'", what, fields[idx]))
    };

    Ok(CustomIngredient {
        name: fields[0].to_string(),
        calories: number(1, "kcal")?,
        protein: number(2, "protein")?,
        fat: number(3, "fat")?,
        sugar: number(4, "sugar")?,
        sodium: number(5, "sodium")?,
        labels: fields.get(6).copied().unwrap_or_default().to_string(),
    })
}

fn print_profile(profile: &UserProfile) {
    let list = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "None".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    println!("Goals: {}", profile.health_goals);
    println!("Allergies: {}", list(&profile.allergies));
    println!("Dietary preferences: {}", list(&profile.dietary_preferences));
    println!("(Known allergies: {})", ALLERGY_OPTIONS.join(", "));
    println!("(Common diets: {})", DIETARY_OPTIONS.join(", "));
}

fn print_custom(items: &[CustomIngredient]) {
    if items.is_empty() {
        println!("No custom ingredients.");
        return;
    }
    for item in items {
        println!("- {}", item.to_record().summary());
    }
}

fn print_history(session: &Session, n: usize) {
    if session.activity().is_empty() {
        println!("No activity yet.");
        return;
    }
    for entry in session.activity().recent(n) {
        println!(
            "{}  {:<16} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action_kind,
            entry.details
        );
    }
}

/// Prints results either as text or as JSON.
struct Output {
    json: bool,
}

impl Output {
    fn emit_json<T: Serialize>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }

    fn reply(&self, reply: &ChatReply) -> Result<()> {
        if self.emit_json(reply)? {
            return Ok(());
        }
        println!("[{}] {}", reply.intent, reply.message);
        match &reply.kind {
            ReplyKind::Comparison(result) => print!("\n{}", result.render_report(Local::now())),
            ReplyKind::Product(report) => print_nutrients(&report.record),
            _ => {}
        }
        Ok(())
    }

    fn product(&self, report: &ProductReport) -> Result<()> {
        if self.emit_json(report)? {
            return Ok(());
        }
        let record = &report.record;
        println!("{}", record.name);
        if let Some(brand) = record.brand.as_deref() {
            println!("Brand: {}", brand);
        }
        println!("Nutri-Score: {}", record.nutri_grade);
        println!("Health score: {}/100", report.health_score);
        for adjustment in &report.breakdown {
            println!("  {}", adjustment);
        }
        print_nutrients(record);
        if !record.ingredients_text.is_empty() {
            println!("Ingredients: {}", record.ingredients_text);
        }
        if report.allergens.performed {
            if report.allergens.is_clear() {
                println!("No allergens detected based on your profile.");
            } else {
                println!("ALLERGEN WARNING: contains {}", join(&report.allergens.found));
            }
        }
        Ok(())
    }

    fn analysis(&self, analysis: &QuickAnalysis) -> Result<()> {
        if self.emit_json(analysis)? {
            return Ok(());
        }
        println!("Found {} ingredients:", analysis.ingredients.len());
        for ingredient in &analysis.ingredients {
            println!("  - {}", ingredient);
        }
        if analysis.warnings.is_empty() {
            println!("No major concerns detected.");
        }
        for warning in &analysis.warnings {
            println!("Warning: {}", warning);
        }
        if !analysis.allergens.is_clear() {
            println!("ALLERGEN WARNING: contains {}", join(&analysis.allergens.found));
        }
        Ok(())
    }

    fn comparison(&self, result: &ComparisonResult) -> Result<()> {
        if self.emit_json(result)? {
            return Ok(());
        }
        print!("{}", result.render_report(Local::now()));
        Ok(())
    }

    fn stats(&self, stats: &DatabaseStats, top: usize) -> Result<()> {
        if self.emit_json(stats)? {
            return Ok(());
        }
        println!("Total items: {}", stats.total_items);
        println!("Database items: {}", stats.database_items);
        println!("Custom items: {}", stats.custom_items);
        let top_categories = stats.top_categories(top);
        if !top_categories.is_empty() {
            println!("Top labels:");
            for (label, count) in top_categories {
                println!("  {:<24} {}", label, count);
            }
        }
        Ok(())
    }
}

fn print_nutrients(record: &NutritionRecord) {
    let v = NutritionRecord::display_value;
    println!(
        "Per 100g: {} kcal | protein {}g | carbs {}g | sugar {}g | fat {}g | sodium {}g",
        v(record.energy_kcal_per_100g),
        v(record.protein_g),
        v(record.carbohydrates_g),
        v(record.sugar_g),
        v(record.fat_g),
        v(record.sodium_g)
    );
}

fn join(items: &std::collections::BTreeSet<String>) -> String {
    items.iter().cloned().collect::<Vec<_>>().join(", ")
}
