use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recs_core::listing::load_listings;
use recs_core::moderation::score_listing;
use recs_core::persist::{read_artifact_meta, save_artifact};
use recs_core::{Index, RecommendationEngine};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the listing recommendation index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index artifact from a CSV/JSON/JSONL file or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long, env = "RECOMMENDER_DATA_PATH", default_value = "data/sample_listings.csv")]
        input: PathBuf,
        /// Output artifact file
        #[arg(long, env = "RECOMMENDER_MODEL_PATH", default_value = "artifacts/recommender.idx")]
        output: PathBuf,
        /// Write the artifact even when the corpus has no listings
        #[arg(long, default_value_t = false)]
        allow_empty: bool,
    },
    /// Recommend listings for a set of recently seen listing ids
    Recommend {
        /// Artifact to load; rebuilt in memory from --data when absent
        #[arg(long, env = "RECOMMENDER_MODEL_PATH", default_value = "artifacts/recommender.idx")]
        artifact: PathBuf,
        #[arg(long, env = "RECOMMENDER_DATA_PATH", default_value = "data/sample_listings.csv")]
        data: PathBuf,
        /// Recently seen listing ids (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        recent: Vec<String>,
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=20))]
        limit: u16,
    },
    /// Screen listing text against the banned keyword table
    Moderate {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Print the header of an artifact
    Inspect {
        #[arg(long, env = "RECOMMENDER_MODEL_PATH", default_value = "artifacts/recommender.idx")]
        artifact: PathBuf,
    },
}

#[derive(Serialize)]
struct BuildSummary {
    output: String,
    num_listings: u64,
    num_terms: u64,
    created_at: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, allow_empty } => build(&input, &output, allow_empty),
        Commands::Recommend { artifact, data, recent, limit } => {
            let engine = RecommendationEngine::from_paths(&artifact, &data)
                .with_context(|| format!("constructing recommender from {} / {}", artifact.display(), data.display()))?;
            engine.index().ensure_servable()?;
            let results = engine.recommend(&recent, limit as usize);
            tracing::info!(recent = recent.len(), returned = results.len(), "recommend");
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Commands::Moderate { title, description } => {
            let verdict = score_listing(&title, &description);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Commands::Inspect { artifact } => {
            let meta = read_artifact_meta(&artifact)?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(())
        }
    }
}

fn build(input: &Path, output: &Path, allow_empty: bool) -> Result<()> {
    let listings = load_listings(input).with_context(|| format!("reading listings from {}", input.display()))?;
    tracing::info!(num_listings = listings.len(), "ingested listings");

    let index = Index::build(listings);
    if index.is_empty_corpus() && !allow_empty {
        bail!("no listings found in {}; pass --allow-empty to write the artifact anyway", input.display());
    }
    let meta = save_artifact(output, &index)?;

    let summary = BuildSummary {
        output: output.display().to_string(),
        num_listings: meta.num_listings,
        num_terms: meta.num_terms,
        created_at: meta.created_at,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}
