// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ej_dashboard::chart::StackedBar;
use ej_dashboard::dashboard::{self, DashboardView, Selection};
use ej_dashboard::{init_logging, load_csv, AppConfig, Dataset};

#[derive(Parser)]
#[command(name = "ej-dashboard", author, version, about = "Demographics by environmental-justice risk, per county")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// EJ dataset CSV (overrides the config file)
    #[arg(short, long, value_name = "CSV", global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal dashboard (default)
    Tui,
    /// List the selectable counties
    Counties,
    /// Print both charts for one county and EJI category
    Show {
        #[arg(long)]
        county: String,
        /// Low, Low/Moderate, Moderate/High or High
        #[arg(long, default_value = "Low")]
        bucket: String,
        /// Print the dashboard view as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.data, None);
    init_logging(&config.logging);

    // Missing or malformed data is fatal before any UI starts
    let dataset = load_csv(&config.data.csv_path)?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => run_ui_mode(dataset)?,
        Commands::Counties => {
            for info in dataset.counties() {
                println!("{}, {} ({} tracts)", info.county, info.state_abbr, info.rows);
            }
        }
        Commands::Show { county, bucket, json } => run_show(&dataset, &county, &bucket, json)?,
    }

    Ok(())
}

fn run_show(dataset: &Dataset, county: &str, bucket: &str, json: bool) -> Result<()> {
    let selection = Selection::parse(dataset, county, bucket)?;
    let view = dashboard::render(dataset, &selection)?;

    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize dashboard")?;
        println!("{}", out);
    } else {
        print_view(&view);
    }

    Ok(())
}

fn print_view(view: &DashboardView) {
    println!("{}", view_text(view));
}

fn view_text(view: &DashboardView) -> String {
    let mut lines = vec![
        view.title.clone(),
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".to_string(),
    ];

    for panel in [&view.bucket_panel, &view.overall_panel] {
        lines.push(String::new());
        lines.push(format!("{} ({} tracts)", panel.heading, panel.rows));
        lines.extend(chart_lines(&panel.chart));
    }

    lines.join("\n")
}

/// One line per segment; `*` marks segments that carry an on-bar annotation
fn chart_lines(chart: &StackedBar) -> Vec<String> {
    if chart.is_blank() {
        return vec!["  (no population)".to_string()];
    }

    chart
        .segments
        .iter()
        .map(|segment| {
            let marker = if chart.annotations.iter().any(|a| a.demographic == segment.demographic) {
                "*"
            } else {
                " "
            };
            let bar = "█".repeat((segment.percentage / 2.0).round() as usize);
            format!("{} {:<7} {:>5.1}% {}", marker, segment.label, segment.percentage, bar)
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(feature = "tui")]
fn run_ui_mode(dataset: Dataset) -> Result<()> {
    println!("🖥️  Loading EJ Dashboard UI...\n");

    let mut app = ui::App::new(dataset)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_dataset: Dataset) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: ej-dashboard show --county <COUNTY> --bucket <CATEGORY>");
    std::process::exit(1);
}
