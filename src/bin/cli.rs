//! Binary entry point for the reljoin query CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use reljoin::{
    model::{Price, Product, ProductId, Review},
    query::{
        profile::profile_snapshot,
        projection::{BestReviewRow, ProductReviewRow, ProductReviewSummary, RecentReviewRow},
        Queries, QueryKind, QueryOutput,
    },
    snapshot::{JsonFileSource, SeedSource, Snapshot, SnapshotSource},
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{default_config_path, CliConfig};
use crate::ui::{Theme, Ui};

/// Exit status for a request that named a resource with no data.
const EXIT_NOT_FOUND: i32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "reljoin",
    version,
    about = "Run relational join queries over product and review snapshots",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "RELJOIN_CONFIG",
        help = "Path to cli.toml (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "RELJOIN_DATA",
        help = "JSON snapshot to query instead of the built-in seed"
    )]
    data: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        help = "Output format for query results"
    )]
    format: Option<OutputFormat>,

    #[arg(long, global = true, value_enum, help = "Color theme for text output")]
    theme: Option<ThemeArg>,

    #[arg(
        long,
        global = true,
        value_name = "RFC3339",
        value_parser = parse_now,
        help = "Reference time for seed dates and the recent-review window"
    )]
    now: Option<OffsetDateTime>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the named queries.
    List,
    /// Run a named query.
    Query {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List active products.
    Products,
    /// List all reviews.
    Reviews,
    /// List reviews for one product.
    ProductReviews {
        #[arg(value_name = "ID")]
        id: u32,
    },
    /// Write the seed snapshot as JSON.
    Seed {
        #[arg(long, value_name = "FILE", help = "Write to FILE instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Manage the CLI config file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the resolved config path and query options.
    Show,
    /// Write a config file holding the defaults.
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Plain => Theme::Plain,
        }
    }
}

fn parse_now(raw: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|err| format!("invalid RFC 3339 time: {err}"))
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        let code = match err.downcast_ref::<reljoin::Error>() {
            Some(err) if err.is_not_found() => EXIT_NOT_FOUND,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RELJOIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    let format = match cli.format {
        Some(format) => format,
        None => config.format()?.unwrap_or_default(),
    };
    let theme = match cli.theme {
        Some(theme) => theme,
        None => config.theme()?.unwrap_or(ThemeArg::Auto),
    };
    let ui = Ui::new(theme.into());
    let now = cli.now.unwrap_or_else(OffsetDateTime::now_utc);

    match &cli.command {
        Command::List => {
            let kinds: Vec<_> = QueryKind::ALL
                .iter()
                .map(|kind| QueryListing {
                    name: kind.as_str(),
                    description: kind.describe(),
                })
                .collect();
            emit(format, &kinds, || {
                ui.list(
                    "Queries",
                    kinds
                        .iter()
                        .map(|kind| format!("{:<34} {}", kind.name, kind.description)),
                )
            })?;
        }
        Command::Query { name } => {
            let kind: QueryKind = name.parse()?;
            let snapshot = load_snapshot(&cli, &config, now)?;
            let queries = Queries::new(&snapshot, now).with_options(config.query_options()?);
            let output = queries.run(kind)?;
            emit(format, &output, || print_output(&ui, kind.as_str(), &output))?;
        }
        Command::Products => {
            let snapshot = load_snapshot(&cli, &config, now)?;
            let output = QueryOutput::Products(Queries::new(&snapshot, now).products());
            emit(format, &output, || print_output(&ui, "products", &output))?;
        }
        Command::Reviews => {
            let snapshot = load_snapshot(&cli, &config, now)?;
            let output = QueryOutput::Reviews(Queries::new(&snapshot, now).reviews());
            emit(format, &output, || print_output(&ui, "reviews", &output))?;
        }
        Command::ProductReviews { id } => {
            let snapshot = load_snapshot(&cli, &config, now)?;
            let reviews = Queries::new(&snapshot, now).reviews_for_product(ProductId(*id))?;
            let output = QueryOutput::Reviews(reviews);
            let title = format!("reviews for product {id}");
            emit(format, &output, || print_output(&ui, &title, &output))?;
        }
        Command::Seed { output } => {
            let snapshot = Snapshot::seed(now)?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match output {
                Some(path) => {
                    fs::write(path, json)?;
                    ui.success(&format!("Wrote seed snapshot to {}", path.display()));
                }
                None => println!("{json}"),
            }
        }
        Command::Config { action } => match action {
            ConfigCommand::Show => {
                let options = config.query_options()?;
                let view = ConfigView {
                    path: config.path().map(PathBuf::from).or_else(default_config_path),
                    data: config.data_path().cloned(),
                    min_price: options.min_price,
                    min_rating: options.min_rating.get(),
                    recent_window_days: options.recent_window.whole_days(),
                };
                emit(format, &view, || {
                    ui.section(
                        "Config",
                        [
                            ("path", display_or(view.path.as_deref(), "<none>")),
                            ("data", display_or(view.data.as_deref(), "<seed>")),
                            ("min_price", view.min_price.to_string()),
                            ("min_rating", view.min_rating.to_string()),
                            ("recent_window_days", view.recent_window_days.to_string()),
                        ],
                    )
                })?;
            }
            ConfigCommand::Init { force } => {
                let path = config.write_defaults(*force)?;
                ui.success(&format!("Wrote defaults to {}", path.display()));
            }
        },
    }

    if let Some(profile) = profile_snapshot(false) {
        info!(
            build_ns = profile.build_ns,
            build_count = profile.build_count,
            probe_ns = profile.probe_ns,
            probe_count = profile.probe_count,
            aggregate_ns = profile.aggregate_ns,
            sort_ns = profile.sort_ns,
            "query.profile"
        );
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct QueryListing {
    name: &'static str,
    description: &'static str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView {
    path: Option<PathBuf>,
    data: Option<PathBuf>,
    min_price: Price,
    min_rating: u8,
    recent_window_days: i64,
}

fn display_or(path: Option<&Path>, fallback: &str) -> String {
    path.map_or_else(|| fallback.to_string(), |path| path.display().to_string())
}

fn load_snapshot(
    cli: &Cli,
    config: &CliConfig,
    now: OffsetDateTime,
) -> Result<Snapshot, Box<dyn Error>> {
    let source: Box<dyn SnapshotSource> = match cli.data.as_ref().or(config.data_path()) {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(SeedSource::new(now)),
    };
    let snapshot = source.load()?;
    info!(source = %source.describe(), "snapshot.ready");
    Ok(snapshot)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_output(ui: &Ui, title: &str, output: &QueryOutput) {
    let title = format!("{title} ({} rows)", output.len());
    match output {
        QueryOutput::ProductReviews(rows) => ui.table(
            &title,
            &["PRODUCT", "NAME", "PRICE", "REVIEW", "TITLE", "RATING", "REVIEWER"],
            &rows.iter().map(product_review_cells).collect::<Vec<_>>(),
        ),
        QueryOutput::Summaries(rows) => ui.table(
            &title,
            &["PRODUCT", "NAME", "REVIEWS", "AVERAGE"],
            &rows.iter().map(summary_cells).collect::<Vec<_>>(),
        ),
        QueryOutput::Recent(rows) => ui.table(
            &title,
            &["PRODUCT", "NAME", "RECENT", "TITLE", "REVIEWER"],
            &rows.iter().map(recent_cells).collect::<Vec<_>>(),
        ),
        QueryOutput::Best(rows) => ui.table(
            &title,
            &["PRODUCT", "NAME", "PRICE", "BEST", "TITLE", "REVIEWER"],
            &rows.iter().map(best_cells).collect::<Vec<_>>(),
        ),
        QueryOutput::Products(rows) => ui.table(
            &title,
            &["ID", "NAME", "PRICE", "CREATED", "DESCRIPTION"],
            &rows.iter().map(product_cells).collect::<Vec<_>>(),
        ),
        QueryOutput::Reviews(rows) => ui.table(
            &title,
            &["ID", "PRODUCT", "RATING", "TITLE", "REVIEWER", "DATE"],
            &rows.iter().map(review_cells).collect::<Vec<_>>(),
        ),
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn product_review_cells(row: &ProductReviewRow) -> Vec<String> {
    vec![
        row.product_id.to_string(),
        row.product_name.clone(),
        row.product_price.to_string(),
        or_dash(row.review_id),
        or_dash(row.review_title.as_deref()),
        or_dash(row.review_rating),
        or_dash(row.reviewer_name.as_deref()),
    ]
}

fn summary_cells(row: &ProductReviewSummary) -> Vec<String> {
    vec![
        row.product_id.to_string(),
        row.product_name.clone(),
        row.review_count.to_string(),
        format!("{:.2}", row.average_rating),
    ]
}

fn recent_cells(row: &RecentReviewRow) -> Vec<String> {
    vec![
        row.product_id.to_string(),
        row.product_name.clone(),
        if row.has_recent_review { "yes" } else { "no" }.to_string(),
        row.recent_review_title.clone(),
        row.recent_reviewer.clone(),
    ]
}

fn best_cells(row: &BestReviewRow) -> Vec<String> {
    vec![
        row.product_id.to_string(),
        row.product_name.clone(),
        row.product_price.to_string(),
        row.best_rating.to_string(),
        row.best_review_title.clone(),
        row.reviewer_name.clone(),
    ]
}

fn product_cells(product: &Product) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.name.clone(),
        product.price.to_string(),
        product.created_date.date().to_string(),
        product.description.clone(),
    ]
}

fn review_cells(review: &Review) -> Vec<String> {
    vec![
        review.id.to_string(),
        review.product_id.to_string(),
        review.rating.to_string(),
        review.title.clone(),
        review.reviewer_name.clone(),
        review.review_date.date().to_string(),
    ]
}
