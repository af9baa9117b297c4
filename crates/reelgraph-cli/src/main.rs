//! ReelGraph CLI
//!
//! Command-line interface for graph-based movie recommendations over a
//! MovieLens-style dataset (`movies.csv` + `ratings.csv`).

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod data;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use reelgraph_core::ids::{movie_node_id, user_node_id};
use reelgraph_engine::eval::{evaluate, split_per_user, SplitMode};
use reelgraph_engine::walk::{
    WalkParams, DEFAULT_NUM_WALKS, DEFAULT_RESTART_PROB_SIMILAR, DEFAULT_RESTART_PROB_USER,
    DEFAULT_WALK_LENGTH,
};
use reelgraph_engine::{
    EngineKind, FindSimilarParams, Metric, RecommendParams, Recommender,
};
use reelgraph_graph::{build_graph, GraphData};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// ReelGraph - graph-based movie recommendations
#[derive(Parser, Debug)]
#[command(name = "reelgraph")]
#[command(about = "Graph-based movie recommendations", long_about = None)]
struct Args {
    /// Directory containing movies.csv and ratings.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Root seed for the stochastic engine
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print node and edge counts of the loaded graph
    Summary,
    /// Rank the movies most similar to a reference movie
    Similar {
        /// External movie id (the number after "M")
        movie_id: u32,

        #[arg(long, value_enum, default_value = "random-walk")]
        engine: EngineArg,

        /// Result list size
        #[arg(short, long, default_value_t = 10)]
        k: usize,

        #[command(flatten)]
        similarity: SimilarityArgs,

        #[command(flatten)]
        walk: WalkArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Produce a top-N recommendation list for a user
    Recommend {
        /// External user id (the number after "U")
        user_id: u32,

        #[arg(long, value_enum, default_value = "random-walk")]
        engine: EngineArg,

        /// Result list size
        #[arg(short = 'n', long, default_value_t = 10)]
        top_n: usize,

        /// Ratings below this do not qualify as preference seeds
        #[arg(long, default_value_t = 4.0)]
        min_user_rating: f64,

        /// Restrict recommendations to one genre (case-insensitive)
        #[arg(short, long)]
        genre: Option<String>,

        /// Per-seed similar-list size for aggregation (similarity engine)
        #[arg(long, default_value_t = 20)]
        k_similar: usize,

        #[command(flatten)]
        similarity: SimilarityArgs,

        #[command(flatten)]
        walk: WalkArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run an offline train/test evaluation
    Evaluate {
        /// Recommendations per user
        #[arg(short, long, default_value_t = 10)]
        k: usize,

        #[arg(long, value_enum, default_value = "random-walk")]
        engine: EngineArg,

        /// How held-out interactions are chosen per user
        #[arg(long, value_enum, default_value = "last-out")]
        split: SplitArg,

        /// Interactions held out per user (last-out split)
        #[arg(long, default_value_t = 1)]
        holdout: usize,

        /// Fraction held out per user (random split)
        #[arg(long, default_value_t = 0.2)]
        test_frac: f64,

        /// Ratings below this do not qualify as preference seeds
        #[arg(long, default_value_t = 4.0)]
        min_user_rating: f64,

        #[command(flatten)]
        similarity: SimilarityArgs,

        #[command(flatten)]
        walk: WalkArgs,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Flags for the similarity engine.
#[derive(Parser, Debug)]
struct SimilarityArgs {
    #[arg(long, value_enum, default_value = "jaccard")]
    metric: MetricArg,

    /// Minimum shared raters for a similarity to count
    #[arg(long, default_value_t = 3)]
    min_co_raters: usize,
}

/// Flags for the random-walk engine.
#[derive(Parser, Debug)]
struct WalkArgs {
    #[arg(long, default_value_t = DEFAULT_NUM_WALKS)]
    num_walks: usize,

    #[arg(long, default_value_t = DEFAULT_WALK_LENGTH)]
    walk_length: usize,

    /// Restart probability (defaults per subcommand when omitted)
    #[arg(long)]
    restart_prob: Option<f64>,
}

impl WalkArgs {
    fn to_params(&self, default_restart: f64) -> WalkParams {
        WalkParams {
            num_walks: self.num_walks,
            walk_length: self.walk_length,
            restart_prob: self.restart_prob.unwrap_or(default_restart),
        }
    }
}

/// Output flags shared by the ranking subcommands.
#[derive(Parser, Debug)]
struct OutputArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Also write the ranking to a CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    RandomWalk,
    Similarity,
}

impl From<EngineArg> for EngineKind {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::RandomWalk => EngineKind::RandomWalk,
            EngineArg::Similarity => EngineKind::Similarity,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Jaccard,
    Cosine,
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Jaccard => Metric::Jaccard,
            MetricArg::Cosine => Metric::Cosine,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SplitArg {
    LastOut,
    Random,
}

/// One row of ranked output, as printed, exported, and serialized.
#[derive(Debug, Serialize)]
struct RankedRow {
    rank: usize,
    movie_id: String,
    title: String,
    score: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let movies = data::load_movies(&args.data_dir.join("movies.csv"))?;
    let ratings = data::load_ratings(&args.data_dir.join("ratings.csv"))?;
    info!(
        movies = movies.len(),
        ratings = ratings.len(),
        "dataset loaded"
    );

    match args.command {
        Command::Summary => {
            let (graph, _) = build_graph(&movies, &ratings)?;
            let summary = graph.summary();
            println!("users:  {}", summary.users);
            println!("movies: {}", summary.movies);
            println!("genres: {}", summary.genres);
            println!("edges:  {}", summary.edges);
        }

        Command::Similar {
            movie_id,
            engine,
            k,
            similarity,
            walk,
            output,
        } => {
            let (graph, _) = build_graph(&movies, &ratings)?;
            let mut recommender = Recommender::new(&graph, args.seed);
            let params = FindSimilarParams {
                engine: engine.into(),
                k,
                metric: similarity.metric.into(),
                min_co_raters: similarity.min_co_raters,
                walk: walk.to_params(DEFAULT_RESTART_PROB_SIMILAR),
            };
            let similar = recommender.find_similar(&movie_node_id(movie_id), &params)?;
            let rows: Vec<RankedRow> = similar
                .into_iter()
                .enumerate()
                .map(|(i, (id, score))| RankedRow {
                    rank: i + 1,
                    title: title_of(&graph, &id),
                    movie_id: id,
                    score: Some(score),
                })
                .collect();
            emit_rows(&rows, &output)?;
        }

        Command::Recommend {
            user_id,
            engine,
            top_n,
            min_user_rating,
            genre,
            k_similar,
            similarity,
            walk,
            output,
        } => {
            let (graph, _) = build_graph(&movies, &ratings)?;
            let mut recommender = Recommender::new(&graph, args.seed);
            let params = RecommendParams {
                engine: engine.into(),
                top_n,
                min_user_rating,
                genre_filter: genre,
                metric: similarity.metric.into(),
                min_co_raters: similarity.min_co_raters,
                k_similar,
                walk: walk.to_params(DEFAULT_RESTART_PROB_USER),
            };
            let rec = recommender.recommend_for_user(&user_node_id(user_id), &params)?;
            if rec.fallback_used {
                eprintln!("(no personalized candidates; showing popular movies)");
            }
            let rows: Vec<RankedRow> = rec
                .items
                .into_iter()
                .enumerate()
                .map(|(i, item)| RankedRow {
                    rank: i + 1,
                    title: title_of(&graph, &item.movie_id),
                    movie_id: item.movie_id,
                    score: item.score,
                })
                .collect();
            emit_rows(&rows, &output)?;
        }

        Command::Evaluate {
            k,
            engine,
            split,
            holdout,
            test_frac,
            min_user_rating,
            similarity,
            walk,
            json,
        } => {
            let mode = match split {
                SplitArg::LastOut => SplitMode::LastOut { holdout },
                SplitArg::Random => SplitMode::Random { test_frac },
            };
            let (train, test) = split_per_user(&ratings, mode, args.seed)?;
            info!(train = train.len(), test = test.len(), "ratings split");

            let params = RecommendParams {
                engine: engine.into(),
                min_user_rating,
                metric: similarity.metric.into(),
                min_co_raters: similarity.min_co_raters,
                walk: walk.to_params(DEFAULT_RESTART_PROB_USER),
                ..RecommendParams::default()
            };
            let report = evaluate(&movies, &train, &test, k, &params, args.seed)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("users evaluated: {}", report.users_evaluated);
                println!("users with recs: {}", report.users_with_recs);
                println!("precision@{k}:   {:.4}", report.precision);
                println!("recall@{k}:      {:.4}", report.recall);
                println!("map@{k}:         {:.4}", report.map);
                println!("ndcg@{k}:        {:.4}", report.ndcg);
                println!("hit rate:        {:.4}", report.hit_rate);
                println!("coverage:        {:.4}", report.coverage);
            }
        }
    }

    Ok(())
}

fn title_of(graph: &GraphData, movie_id: &str) -> String {
    match graph.get_node(movie_id).and_then(|node| node.title()) {
        Some(title) => title.to_string(),
        None => movie_id.to_string(),
    }
}

fn emit_rows(rows: &[RankedRow], output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.export {
        export_csv(rows, path)?;
        info!(path = %path.display(), "ranking exported");
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("(no results)");
        return Ok(());
    }
    for row in rows {
        match row.score {
            Some(score) => {
                println!("{:>3}. {:<8} {:<50} {score:.6}", row.rank, row.movie_id, row.title)
            }
            None => println!("{:>3}. {:<8} {:<50} -", row.rank, row.movie_id, row.title),
        }
    }
    Ok(())
}

fn export_csv(rows: &[RankedRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
