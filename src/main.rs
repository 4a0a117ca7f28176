use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::{ColoredString, Colorize};
use seo_scorer::{
    missing_elements, over_optimized_keywords, AnalysisReport, ContentScorer, ContentSnapshot,
    ScoreBand,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Parser)]
#[command(
    name = "seo-scorer",
    about = "Score HTML content for SEO quality and keyword stuffing",
    version
)]
struct Cli {
    /// HTML body files to analyze (reads stdin if none provided)
    files: Vec<PathBuf>,

    /// Keyword to track; accepts comma-separated lists and may be repeated
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Page title
    #[arg(long, default_value = "")]
    title: String,

    /// Meta description
    #[arg(long, default_value = "")]
    description: String,

    /// JSON snapshot with "title", "description" and "body" fields
    #[arg(long, conflicts_with_all = ["files", "title", "description"])]
    snapshot: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the reports
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seo_scorer=warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut scorer = ContentScorer::new();
    for entry in &cli.keywords {
        let added = scorer.add_keywords_from_input(entry);
        info!(?added, "keywords added");
    }

    if let Some(path) = &cli.snapshot {
        let snapshot = ContentSnapshot::from_json_file(path)?;
        return emit(&scorer, &snapshot, cli.format, None);
    }

    if cli.files.is_empty() {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read stdin")?;
        let snapshot = ContentSnapshot::new(&cli.title, &cli.description, body);
        emit(&scorer, &snapshot, cli.format, None)?;
    } else {
        for path in &cli.files {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let snapshot = ContentSnapshot::new(&cli.title, &cli.description, body);
            emit(&scorer, &snapshot, cli.format, Some(&path.display().to_string()))?;
        }
    }
    Ok(())
}

fn emit(
    scorer: &ContentScorer,
    snapshot: &ContentSnapshot,
    format: Format,
    label: Option<&str>,
) -> Result<()> {
    let report = scorer.analyze_content(snapshot);
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_text(snapshot, &report, label),
    }
    Ok(())
}

fn print_text(snapshot: &ContentSnapshot, report: &AnalysisReport, label: Option<&str>) {
    if let Some(label) = label {
        println!("{}", label.bold());
    }

    let score = format!("{} ({})", report.score, report.score_band.as_str());
    let danger = format!("{} ({})", report.danger_score, report.danger_band.as_str());
    println!("SEO score:     {}", paint_quality(&score, report.score_band));
    println!("Danger score:  {}", paint_risk(&danger, report.danger_band));
    println!(
        "Words:         {} ({} min read)",
        report.word_count, report.reading_time_minutes
    );

    let densities = &report.keyword_analysis.densities;
    if !densities.is_empty() {
        println!("\n{}", "Keywords".bold());
        for (keyword, data) in densities {
            println!("  {keyword}: {} x, {:.2}%", data.count, data.density);
        }
        println!("  total density: {:.2}%", report.keyword_analysis.total_density);
    }

    let stuffed = over_optimized_keywords(&report.keyword_analysis);
    if !stuffed.is_empty() {
        println!("\n{}", "Over-optimized keywords".bold());
        for (keyword, density) in &stuffed {
            println!("  {} {:.1}%", keyword.red(), density);
        }
        println!("  recommended density: 0.5% - 2%");
    }

    let missing = missing_elements(snapshot, report);
    if !missing.is_empty() {
        println!("\n{}", "To reach 100".bold());
        for item in &missing {
            println!("  \u{2022} {item}");
        }
    }

    if !report.suggestions.is_empty() {
        println!("\n{}", "Suggestions".bold());
        for suggestion in &report.suggestions {
            println!("  {suggestion}");
        }
    }
}

fn paint_quality(text: &str, band: ScoreBand) -> ColoredString {
    match band {
        ScoreBand::Low => text.red(),
        ScoreBand::Medium => text.yellow(),
        ScoreBand::High => text.green(),
    }
}

fn paint_risk(text: &str, band: ScoreBand) -> ColoredString {
    match band {
        ScoreBand::Low => text.green(),
        ScoreBand::Medium => text.yellow(),
        ScoreBand::High => text.red(),
    }
}
