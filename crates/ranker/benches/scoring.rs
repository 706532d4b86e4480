//! Benchmarks for ranking model inference
//!
//! Run with: cargo bench --package ranker
//!
//! Scores one query against a synthetic catalog with seeded weights.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Catalog, Movie};
use pipeline::{encode_catalog, EncoderConfig};
use ranker::{ModelShape, RankingModel, Scorer};

const GENRES: &[&str] = &["Action", "Comedy", "Crime", "Drama", "Horror", "Romance", "Sci-Fi"];
const WORDS: &[&str] = &[
    "detective", "city", "family", "war", "love", "heist", "journey", "ship", "murder", "secret",
    "prison", "robot", "island", "king", "revenge", "school", "band", "storm", "desert", "spy",
];

fn synthetic_catalog(n: usize) -> Catalog {
    let movies = (0..n)
        .map(|i| {
            let genres = vec![GENRES[i % GENRES.len()].to_string()];
            let overview: Vec<&str> = (0..30).map(|k| WORDS[(i * 5 + k) % WORDS.len()]).collect();
            Movie::new(
                format!("Movie {}", i),
                genres,
                format!("Director {}", i % 100),
                overview.join(" "),
            )
        })
        .collect();
    Catalog::from_movies(movies)
}

fn bench_score_one_query(c: &mut Criterion) {
    let catalog = synthetic_catalog(1000);
    let (_, tables) = encode_catalog(&catalog, &EncoderConfig::default()).unwrap();
    let model = RankingModel::initialize(ModelShape::from_tables(&tables, catalog.len()), 42);
    let features = tables.query_features(&catalog.movies()[0]).unwrap();

    c.bench_function("score_1000_items", |b| {
        b.iter(|| black_box(model.score(black_box(&features)).unwrap()))
    });
}

criterion_group!(benches, bench_score_one_query);
criterion_main!(benches);
