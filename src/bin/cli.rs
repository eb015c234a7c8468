//! F1 Race CLI - scrape, clean, engineer features and train

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use f1race::config::PipelineConfig;
use f1race::pipeline;
use f1race::training::{EventRanking, SearchResult, TrainingReport};

#[cfg(feature = "scraper")]
use f1race::data::TableKind;
#[cfg(feature = "scraper")]
use f1race::scraper::{first_race_pages, PageOutcome, PageTables, ResultsScraper, ScraperConfig};
#[cfg(feature = "scraper")]
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "f1race")]
#[command(author, version, about = "Formula 1 results pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to f1race.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the raw data directory
    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,

    /// Override the cleaned data directory
    #[arg(long, global = true)]
    clean_dir: Option<PathBuf>,

    /// Override the output directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape raw race and qualifying tables (requires scraper feature)
    #[cfg(feature = "scraper")]
    Scrape {
        /// Only scrape this table (race or qualifying)
        #[arg(long, value_parser = parse_kind)]
        only: Option<TableKind>,

        /// Delay between requests in milliseconds
        #[arg(long)]
        delay: Option<u64>,
    },

    /// List every results-style table on each season's opening page
    #[cfg(feature = "scraper")]
    Inspect,

    /// Clean raw tables into the canonical schema
    Clean,

    /// Join cleaned tables and engineer features
    Features {
        /// Write the feature table to this CSV (default: output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search hyperparameters, train and evaluate on the test season
    Train {
        /// Season held out for evaluation
        #[arg(long)]
        test_season: Option<i32>,

        /// Number of sampled configurations
        #[arg(long)]
        n_iter: Option<usize>,
    },

    /// Search hyperparameters over every season, without a hold-out
    Tune {
        /// Number of sampled configurations
        #[arg(long)]
        n_iter: Option<usize>,
    },

    /// Clean, build features and train in one go
    Run,
}

#[cfg(feature = "scraper")]
fn parse_kind(value: &str) -> std::result::Result<TableKind, String> {
    match value {
        "race" | "corrida" => Ok(TableKind::Race),
        "qualifying" | "quali" | "classificacao" => Ok(TableKind::Qualifying),
        other => Err(format!("unknown table kind: {}", other)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    println!("{}", "F1 Race CLI v0.3.0".cyan().bold());
    println!();

    let mut config = PipelineConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.raw_dir {
        config.paths.raw_dir = dir;
    }
    if let Some(dir) = cli.clean_dir {
        config.paths.clean_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.paths.output_dir = dir;
    }

    match cli.command {
        #[cfg(feature = "scraper")]
        Commands::Scrape { only, delay } => {
            if let Some(delay) = delay {
                config.scrape.delay_ms = delay;
            }
            run_scrape(&config, only)?;
        }
        #[cfg(feature = "scraper")]
        Commands::Inspect => run_inspect(&config)?,
        Commands::Clean => run_clean(&config)?,
        Commands::Features { output } => run_features(&config, output)?,
        Commands::Train { test_season, n_iter } => {
            if let Some(season) = test_season {
                config.training.test_season = season;
            }
            if let Some(n) = n_iter {
                config.training.n_iter = n;
            }
            config.validate()?;
            run_train(&config)?;
        }
        Commands::Tune { n_iter } => {
            if let Some(n) = n_iter {
                config.training.n_iter = n;
            }
            run_tune(&config)?;
        }
        Commands::Run => {
            run_clean(&config)?;
            run_features(&config, None)?;
            run_train(&config)?;
        }
    }

    Ok(())
}

#[cfg(feature = "scraper")]
fn run_scrape(config: &PipelineConfig, only: Option<TableKind>) -> Result<()> {
    let kinds: Vec<TableKind> = match only {
        Some(kind) => vec![kind],
        None => vec![TableKind::Race, TableKind::Qualifying],
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let scraper = ResultsScraper::new(ScraperConfig::from(config.scrape.clone()))?;

    for kind in kinds {
        let path = config.paths.raw_path(kind);
        println!("{} {} tables -> {}", "Scraping".green(), kind.label(), path.display());

        let pb = ProgressBar::new(scraper.pages().len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        let result = rt.block_on(scraper.scrape_to_file(kind, &path, |page, outcome| {
            let status = match outcome {
                PageOutcome::Scraped { rows } => format!("{} rows", rows),
                PageOutcome::NoTable => "no table".to_string(),
                PageOutcome::Failed => "failed".to_string(),
            };
            pb.set_message(format!("{} {} ({})", page.event, page.season, status));
            pb.inc(1);
        }));
        pb.finish_and_clear();

        match result {
            Ok(summary) => println!(
                "{}: {} rows from {}/{} pages ({} failed)",
                "Saved".green(),
                summary.rows,
                summary.pages_with_table,
                summary.pages,
                summary.failed_pages
            ),
            Err(f1race::PipelineError::NothingScraped(label)) => {
                let message = format!("No {} data was collected; nothing written", label);
                println!("{}", message.yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[cfg(feature = "scraper")]
fn run_inspect(config: &PipelineConfig) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let scraper = ResultsScraper::new(ScraperConfig::from(config.scrape.clone()))?;
    let pages = first_race_pages();
    for report in rt.block_on(scraper.inspect(&pages)) {
        print_page_tables(&report);
    }

    println!();
    println!("{}", "Table exploration finished".green());
    Ok(())
}

#[cfg(feature = "scraper")]
fn print_page_tables(report: &PageTables) {
    println!();
    println!(
        "{} {} {}",
        report.page.season.to_string().cyan().bold(),
        report.page.event.replace('_', " ").bold(),
        report.page.url().dimmed()
    );

    let Some(tables) = &report.tables else {
        println!("  {}", "Page could not be fetched".red());
        return;
    };
    if tables.is_empty() {
        println!("  No tables on this page");
        return;
    }

    for (i, table) in tables.iter().enumerate() {
        let section = table.section.as_deref().unwrap_or("(no section heading)");
        println!("  {} {}: {}", "Table".yellow(), i + 1, section);
        if table.headers.is_empty() {
            println!("    (no header cells)");
        } else {
            println!("    {:?}", table.headers);
        }
    }
}

fn run_clean(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Cleaning raw tables...".green());

    for summary in pipeline::clean_all(config).context("Cleaning failed")? {
        println!(
            "  {:<12} {:>6} raw rows -> {:>6} clean rows  ({})",
            summary.kind.label(),
            summary.raw_rows,
            summary.clean_rows,
            config.paths.clean_path(summary.kind).display()
        );
    }

    Ok(())
}

fn run_features(config: &PipelineConfig, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "Building features...".green());

    let features = pipeline::build_features(config).context("Feature engineering failed")?;
    let path = output.unwrap_or_else(|| config.paths.features_path());
    pipeline::save_features(&features, &path)?;

    println!(
        "{}: {} rows, {} constructors -> {}",
        "Saved".green(),
        features.len(),
        features.constructors.len(),
        path.display()
    );

    Ok(())
}

fn run_train(config: &PipelineConfig) -> Result<()> {
    println!(
        "{} (test season {}, {} configurations, {} folds)",
        "Training".green(),
        config.training.test_season,
        config.training.n_iter,
        config.training.n_splits
    );

    let report = pipeline::train(config).context("Training failed")?;
    print_report(&report);
    println!();
    println!("{}: {}", "Report".green(), config.paths.report_path().display());

    Ok(())
}

fn run_tune(config: &PipelineConfig) -> Result<()> {
    println!(
        "{} over every season ({} configurations, {} folds)",
        "Tuning".green(),
        config.training.n_iter,
        config.training.n_splits
    );

    let result = pipeline::tune(config).context("Tuning failed")?;
    print_search(&result);
    Ok(())
}

fn print_search(result: &SearchResult) {
    println!();
    println!("{}", "Search:".yellow().bold());
    println!(
        "  Best mean R² (CV): {:.4} ({:.2}%)",
        result.best_score,
        result.best_score * 100.0
    );
    println!("  Best params:       {:?}", result.best_params);
}

fn print_report(report: &TrainingReport) {
    println!();
    println!("{}", "Search:".yellow().bold());
    println!("  Best mean R² (CV): {:.4}", report.cv_score);
    println!("  Best params:       {:?}", report.best_params);

    let m = &report.regression;
    println!();
    println!("{}", format!("Regression ({}):", report.test_season).yellow().bold());
    println!("  MAE:  {:.4} (~{:.1} positions)", m.mae, m.mae);
    println!("  RMSE: {:.4}", m.rmse);
    println!("  R²:   {:.4} ({:.2}%)", m.r2, m.r2 * 100.0);

    let a = &report.accuracy;
    println!();
    println!("{}", "Race accuracy:".yellow().bold());
    println!("  Events:  {}", a.total_events);
    println!(
        "  Winner:  {}/{} = {:.2}%",
        a.winner_hits,
        a.total_events,
        a.winner_rate() * 100.0
    );
    println!(
        "  Podium:  {}/{} = {:.2}%",
        a.podium_hits,
        a.podium_slots,
        a.podium_rate() * 100.0
    );
    println!(
        "  Top 10:  {}/{} = {:.2}%",
        a.top10_hits,
        a.top10_slots,
        a.top10_rate() * 100.0
    );

    if let Some(example) = &report.example {
        print_example(example);
    }
}

fn print_example(example: &EventRanking) {
    println!();
    println!("{} {}", "Example:".yellow().bold(), example.event);

    println!("  {}", "Actual".bold());
    for row in &example.by_actual {
        println!("    {:<24} {:>4.0} {:>7.2}", row.driver, row.actual, row.predicted);
    }
    println!("  {}", "Predicted".bold());
    for row in &example.by_predicted {
        println!("    {:<24} {:>4.0} {:>7.2}", row.driver, row.actual, row.predicted);
    }
}
