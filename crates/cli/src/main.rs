use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{Catalog, Movie};
use pipeline::{
    encode_catalog, EncoderConfig, DEFAULT_MAX_TFIDF_FEATURES, DEFAULT_MAX_WORDS,
};
use ranker::{ModelShape, RankingModel};
use server::{Recommender, RecommenderSettings, ScorerKind, TitleRecommendations};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// CineMatch - Content + neural movie recommender
#[derive(Parser)]
#[command(name = "cinematch")]
#[command(about = "Recommend movies similar to the ones you like", long_about = None)]
struct Cli {
    /// Path to the IMDB Top-1000 CSV file
    #[arg(short, long, default_value = "data/imdb_top_1000.csv")]
    catalog: PathBuf,

    /// Seed for the ranking model when no weights file is used
    #[arg(long, default_value = "42")]
    seed: u64,

    /// JSON weights file for the ranking model
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Rank by content similarity only, skipping the ranking model
    #[arg(long)]
    similarity_only: bool,

    /// Vocabulary size of the model's text branch
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Number of TF-IDF terms used for overview similarity
    #[arg(long, default_value_t = DEFAULT_MAX_TFIDF_FEATURES)]
    max_tfidf_features: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies similar to one title
    Recommend {
        /// Title to get recommendations for (case-insensitive)
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Recommend for several titles at once (1 to 5)
    Multi {
        /// Titles to get recommendations for; repeat the flag per title
        #[arg(long = "title", required = true)]
        titles: Vec<String>,

        /// Number of recommendations per title
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show every attribute of a movie
    Show {
        #[arg(long)]
        title: String,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },

    /// Write the ranking model's weights as JSON
    ExportWeights {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading catalog from {}...", cli.catalog.display());
    let start = Instant::now();
    let catalog = Catalog::load_from_csv(&cli.catalog).context("Failed to load catalog")?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        catalog.len(),
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match &cli.command {
        Commands::Recommend { title, limit } => {
            let recommender = build_recommender(&cli, catalog).await?;
            handle_recommend(&recommender, title, *limit)?
        }
        Commands::Multi { titles, limit } => {
            let recommender = build_recommender(&cli, catalog).await?;
            handle_multi(&recommender, titles, *limit)?
        }
        Commands::Show { title } => handle_show(&catalog, title)?,
        Commands::Search { title, limit } => handle_search(&catalog, title, *limit),
        Commands::Benchmark {
            requests,
            concurrent,
        } => {
            let recommender = Arc::new(build_recommender(&cli, catalog).await?);
            handle_benchmark(recommender, *requests, *concurrent).await?
        }
        Commands::ExportWeights { out } => handle_export(&cli, &catalog, out)?,
    }

    Ok(())
}

/// Build the recommender off the async runtime
async fn build_recommender(cli: &Cli, catalog: Catalog) -> Result<Recommender> {
    let scorer = if cli.similarity_only {
        ScorerKind::Uniform
    } else {
        ScorerKind::Model {
            seed: cli.seed,
            weights_path: cli.weights.clone(),
        }
    };
    let settings = RecommenderSettings {
        encoder: encoder_config(cli),
        scorer,
        ..RecommenderSettings::default()
    };

    let start = Instant::now();
    let recommender = tokio::task::spawn_blocking(move || Recommender::build(catalog, &settings))
        .await
        .context("Recommender build task panicked")??;
    println!(
        "{} Built recommender ({} scorer) in {:?}",
        "✓".green(),
        recommender.scorer_name(),
        start.elapsed()
    );
    Ok(recommender)
}

/// Handle the 'recommend' command
fn handle_recommend(recommender: &Recommender, title: &str, limit: usize) -> Result<()> {
    let recommendations = recommender.recommend_one(title, limit)?;
    print_recommendations(title, &recommendations);
    Ok(())
}

/// Handle the 'multi' command
fn handle_multi(recommender: &Recommender, titles: &[String], limit: usize) -> Result<()> {
    let results = recommender.recommend_many(titles, limit)?;
    for (title, entry) in &results {
        print_entry(title, entry);
        println!();
    }
    Ok(())
}

/// Handle the 'show' command
fn handle_show(catalog: &Catalog, title: &str) -> Result<()> {
    let movie = catalog
        .find_by_title(title)
        .ok_or_else(|| anyhow!("Movie '{}' not found in database.", title))?;

    println!("{}", movie.title.bold().blue());
    print_field("Year", movie.released_year.map(|y| y.to_string()));
    print_field("Certificate", movie.certificate.clone());
    print_field("Runtime", movie.runtime.clone());
    print_field("Genre", Some(movie.genres.join(", ")));
    print_field("Director", Some(movie.director.clone()));
    let stars: Vec<&str> = [
        movie.star1.as_deref(),
        movie.star2.as_deref(),
        movie.star3.as_deref(),
        movie.star4.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    print_field("Stars", (!stars.is_empty()).then(|| stars.join(", ")));
    print_field("IMDB rating", movie.imdb_rating.map(|r| format!("{:.1}", r)));
    print_field("Meta score", movie.meta_score.map(|m| format!("{:.0}", m)));
    print_field("Votes", movie.no_of_votes.map(|v| v.to_string()));
    print_field("Gross", movie.gross.map(|g| format!("${}", g)));
    print_field("Poster", movie.poster_link.clone());
    println!("\n{}", movie.overview);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(catalog: &Catalog, title: &str, limit: usize) {
    let matches = catalog.search(title, limit);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
    }
    for (idx, movie) in matches {
        println!(
            "{}: {} ({}) [{}] {}",
            idx,
            movie.title,
            movie
                .released_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "????".to_string()),
            movie.genres.join(", "),
            movie
                .imdb_rating
                .map(|r| format!("★ {:.1}", r))
                .unwrap_or_default()
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: Arc<Recommender>,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    // Random catalog titles to query
    let n = recommender.catalog().len();
    let titles: Vec<String> = (0..requests)
        .filter_map(|_| recommender.catalog().get(rand::random_range(0..n)))
        .map(|m| m.title.clone())
        .collect();

    // Limit how many recommendations run at once
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = vec![];
    for title in titles {
        let recommender = Arc::clone(&recommender);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let elapsed = tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                recommender.recommend_one(&title, 5)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await??;
            Ok::<_, anyhow::Error>(elapsed)
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let total_latency: Duration = timings.iter().sum();
    let avg_latency = total_latency / timings.len() as u32;
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", timings.len(), concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Handle the 'export-weights' command
fn handle_export(cli: &Cli, catalog: &Catalog, out: &Path) -> Result<()> {
    let (_, tables) = encode_catalog(catalog, &encoder_config(cli))?;
    let shape = ModelShape::from_tables(&tables, catalog.len());
    let model = RankingModel::load_or_initialize(cli.weights.as_deref(), shape, cli.seed)?;

    model
        .save(out)
        .with_context(|| format!("Failed to write weights to {}", out.display()))?;
    println!(
        "{} Wrote {} parameters ({} genres, {} token ids, {} directors, {} movies) to {}",
        "✓".green(),
        model.parameter_count(),
        shape.n_genres,
        shape.vocab_size,
        shape.n_directors,
        shape.n_items,
        out.display()
    );
    Ok(())
}

fn encoder_config(cli: &Cli) -> EncoderConfig {
    EncoderConfig {
        max_words: cli.max_words,
        max_tfidf_features: cli.max_tfidf_features,
        ..EncoderConfig::default()
    }
}

/// Value at the given fraction of a sorted, non-empty list
fn percentile(sorted: &[Duration], fraction: f64) -> Duration {
    let idx = ((sorted.len() as f64 * fraction) as usize).min(sorted.len() - 1);
    sorted[idx]
}

fn print_field(label: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        println!("{}{}: {}", "• ".green(), label, value);
    }
}

fn print_entry(title: &str, entry: &TitleRecommendations) {
    match entry {
        Ok(movies) => print_recommendations(title, movies),
        Err(e) => {
            println!("{}", format!("Recommendations for '{}':", title).bold().blue());
            println!("  {}", e.to_string().red());
        }
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(title: &str, movies: &[Movie]) {
    println!("{}", format!("Recommendations for '{}':", title).bold().blue());
    for (i, movie) in movies.iter().enumerate() {
        let year = movie
            .released_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "????".to_string());
        println!(
            "{}. {} ({}) [{}] - {}",
            (i + 1).to_string().green(),
            movie.title,
            year,
            movie.genres.join(", "),
            movie.director
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_catalog() -> Catalog {
        let movie = |title: &str, genre: &str, director: &str, overview: &str| {
            Movie::new(title, vec![genre.to_string()], director, overview)
        };
        Catalog::from_movies(vec![
            movie("Heat", "Crime", "Michael Mann", "A detective hunts a crew of thieves in Los Angeles."),
            movie("Up", "Animation", "Pete Docter", "An old man ties balloons to his house and flies away."),
            movie("Soul", "Animation", "Pete Docter", "A jazz musician loses his way before a big gig."),
        ])
    }

    #[test]
    fn test_encoder_flags_default_to_server_defaults() {
        let cli = Cli::try_parse_from(["cinematch", "search", "--title", "heat"]).unwrap();
        assert_eq!(encoder_config(&cli), EncoderConfig::default());
    }

    #[test]
    fn test_export_uses_encoder_flags() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("weights.json");
        let cli = Cli::try_parse_from([
            "cinematch",
            "--max-words",
            "6",
            "--max-tfidf-features",
            "4",
            "export-weights",
            "--out",
            out.to_str().unwrap(),
        ])
        .unwrap();

        let catalog = small_catalog();
        handle_export(&cli, &catalog, &out).unwrap();

        let small = EncoderConfig {
            max_words: 6,
            max_tfidf_features: 4,
            ..EncoderConfig::default()
        };
        let (_, tables) = encode_catalog(&catalog, &small).unwrap();
        let shape = ModelShape::from_tables(&tables, catalog.len());
        assert!(RankingModel::load(&out, shape).is_ok());

        // Default-sized tables describe a different embedding table
        let (_, tables) = encode_catalog(&catalog, &EncoderConfig::default()).unwrap();
        let default_shape = ModelShape::from_tables(&tables, catalog.len());
        assert_ne!(default_shape, shape);
        assert!(RankingModel::load(&out, default_shape).is_err());
    }
}
