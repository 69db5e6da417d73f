use activity_summary::app::ports::{GeocoderPort, StorePort};
use activity_summary::clock::SystemClock;
use activity_summary::config::Config;
use activity_summary::infra::http_feed::HttpFeed;
use activity_summary::infra::http_geocoder::HttpGeocoder;
use activity_summary::infra::sqlite_store::SqliteStore;
use activity_summary::{logging, metrics, DatasetSummary};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "activity_summary")]
#[command(about = "Activity and boundary rankings for OpenActive feeds")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $SUMMARY_CONFIG or summary.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest forward from the stored cursor and refresh the rankings
    Update {
        #[arg(long)]
        dataset: String,
    },
    /// Print the current summary as JSON
    Show {
        #[arg(long)]
        dataset: String,
        /// Number of ranked names to include per category
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Clear samples, cursor and both rankings
    Restart {
        #[arg(long)]
        dataset: String,
    },
    /// Clear samples and both rankings but keep the cursor
    RestartFromLastPage {
        #[arg(long)]
        dataset: String,
    },
    ClearSamples {
        #[arg(long)]
        dataset: String,
    },
    ClearLastPage {
        #[arg(long)]
        dataset: String,
    },
    ClearActivities {
        #[arg(long)]
        dataset: String,
    },
    ClearBoundaries {
        #[arg(long)]
        dataset: String,
    },
}

impl Commands {
    fn dataset(&self) -> &str {
        match self {
            Commands::Update { dataset }
            | Commands::Show { dataset, .. }
            | Commands::Restart { dataset }
            | Commands::RestartFromLastPage { dataset }
            | Commands::ClearSamples { dataset }
            | Commands::ClearLastPage { dataset }
            | Commands::ClearActivities { dataset }
            | Commands::ClearBoundaries { dataset } => dataset.as_str(),
        }
    }
}

async fn open_summary(config: &Config, dataset_id: &str) -> anyhow::Result<DatasetSummary> {
    let store: Arc<dyn StorePort> = Arc::new(
        SqliteStore::open(&config.summary.db_path).with_context(|| {
            format!(
                "opening summary store at {}",
                config.summary.db_path.display()
            )
        })?,
    );
    let feed = Arc::new(HttpFeed::new(config.http_timeout())?);
    let geocoder: Option<Arc<dyn GeocoderPort>> = match &config.geocoder {
        Some(g) => Some(Arc::new(HttpGeocoder::new(
            &g.base_url,
            g.area_type.clone(),
            config.http_timeout(),
        )?)),
        None => None,
    };

    let registry = config.registry();
    let summary = DatasetSummary::open(
        &registry,
        dataset_id,
        config.settings(),
        store,
        feed,
        geocoder,
        Arc::new(SystemClock),
    )
    .await?;
    Ok(summary)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let summary = open_summary(&config, cli.command.dataset()).await?;
    info!(
        "Opened '{}' at {} (sample cap {}, up to {} pages per update)",
        summary.info().title,
        summary.info().feed_url,
        summary.settings().sample_cap,
        summary.settings().max_pages_per_update
    );

    match cli.command {
        Commands::Update { .. } => {
            let report = summary.update().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Show { limit, .. } => {
            let report = summary.report(limit).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Restart { .. } => summary.restart().await?,
        Commands::RestartFromLastPage { .. } => summary.restart_from_last_page().await?,
        Commands::ClearSamples { .. } => summary.clear_samples().await?,
        Commands::ClearLastPage { .. } => summary.clear_last_page().await?,
        Commands::ClearActivities { .. } => summary.clear_activities().await?,
        Commands::ClearBoundaries { .. } => summary.clear_boundaries().await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let dataset = cli.command.dataset().to_string();
    info!("Running command for dataset {}", dataset);

    if let Err(e) = run(cli).await {
        error!("Command for {} failed: {:#}", dataset, e);
        return Err(e);
    }
    Ok(())
}
