use data_loader::Catalog;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/imdb_top_1000.csv");

    println!("Loading movie catalog...\n");

    let start = Instant::now();
    let catalog = Catalog::load_from_csv(path)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let genres: std::collections::BTreeSet<_> = catalog
        .movies()
        .iter()
        .flat_map(|m| m.genres.iter())
        .collect();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", catalog.len());
    println!("Distinct genres: {}", genres.len());
    println!("Duplicate titles: {}", catalog.duplicate_titles().len());
}
