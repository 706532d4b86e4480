//! Integration tests for the pipeline.
//!
//! These tests run encoding and similarity construction together on small
//! catalogs, including one loaded from a CSV file.

use data_loader::{Catalog, Movie};
use pipeline::{
    build_similarity, encode_catalog, EncoderConfig, SimilarityMatrix, SimilarityWeights,
};
use std::io::Write;

fn create_test_catalog() -> Catalog {
    Catalog::from_movies(vec![
        Movie::new("A", vec!["Drama".into()], "D1", "a story"),
        Movie::new("B", vec!["Drama".into()], "D1", "another story"),
        Movie::new("C", vec!["Action".into()], "D2", "explosions"),
    ])
}

fn similarity_for(catalog: &Catalog) -> SimilarityMatrix {
    let (encoded, _) = encode_catalog(catalog, &EncoderConfig::default()).unwrap();
    build_similarity(
        &encoded.genre_matrix,
        &encoded.tfidf_matrix,
        &encoded.director_matrix,
        &SimilarityWeights::default(),
    )
    .unwrap()
}

#[test]
fn test_similar_movies_score_higher() {
    let catalog = create_test_catalog();
    let sim = similarity_for(&catalog);

    // A and B share genre, director and (after stop words) overview
    assert!((sim.get(0, 1) - 1.0).abs() < 1e-5);
    // C shares nothing with A
    assert!(sim.get(0, 2).abs() < 1e-6);
    assert!(sim.get(0, 1) > sim.get(0, 2));
}

#[test]
fn test_similarity_is_symmetric() {
    let catalog = Catalog::from_movies(vec![
        Movie::new("Heat", vec!["Crime".into(), "Drama".into()], "Michael Mann", "A heist crew and a detective in Los Angeles."),
        Movie::new("Collateral", vec!["Crime".into(), "Thriller".into()], "Michael Mann", "A cab driver and a hitman in Los Angeles."),
        Movie::new("Alien", vec!["Horror".into(), "Sci-Fi".into()], "Ridley Scott", "A crew meets a deadly creature."),
        Movie::new("Gladiator", vec!["Action".into(), "Drama".into()], "Ridley Scott", "A general becomes a slave and a gladiator."),
    ]);
    let sim = similarity_for(&catalog);

    for i in 0..sim.len() {
        for j in 0..sim.len() {
            assert_eq!(sim.get(i, j), sim.get(j, i), "asymmetry at ({}, {})", i, j);
        }
    }
}

#[test]
fn test_encoding_is_deterministic() {
    let catalog = create_test_catalog();
    let config = EncoderConfig::default();

    let (first, first_tables) = encode_catalog(&catalog, &config).unwrap();
    let (second, second_tables) = encode_catalog(&catalog, &config).unwrap();

    assert_eq!(first_tables, second_tables);
    assert_eq!(first.genre_matrix, second.genre_matrix);
    assert_eq!(first.director_matrix, second.director_matrix);
    assert_eq!(first.text_sequences, second.text_sequences);
    assert_eq!(first.tfidf_matrix, second.tfidf_matrix);
}

#[test]
fn test_pipeline_on_csv_catalog() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Poster_Link,Series_Title,Released_Year,Certificate,Runtime,Genre,IMDB_Rating,Overview,Meta_score,Director,Star1,Star2,Star3,Star4,No_of_Votes,Gross"
    )
    .unwrap();
    writeln!(
        file,
        "http://x/1.jpg,The Godfather,1972,A,175 min,\"Crime, Drama\",9.2,An organized crime dynasty's aging patriarch transfers control.,100,Francis Ford Coppola,Marlon Brando,Al Pacino,James Caan,Diane Keaton,1620367,\"134,966,411\""
    )
    .unwrap();
    writeln!(
        file,
        "http://x/2.jpg,The Godfather: Part II,1974,A,202 min,\"Crime, Drama\",9.0,The early life and career of Vito Corleone in 1920s New York City.,90,Francis Ford Coppola,Al Pacino,Robert De Niro,Robert Duvall,Diane Keaton,1129952,\"57,300,000\""
    )
    .unwrap();
    writeln!(
        file,
        "http://x/3.jpg,Toy Story,1995,U,81 min,\"Animation, Adventure, Comedy\",8.3,A cowboy doll is profoundly threatened by a new spaceman figure.,95,John Lasseter,Tom Hanks,Tim Allen,Don Rickles,Jim Varney,887429,\"191,796,233\""
    )
    .unwrap();
    file.flush().unwrap();

    let catalog = Catalog::load_from_csv(file.path()).unwrap();
    let (encoded, tables) = encode_catalog(&catalog, &EncoderConfig::default()).unwrap();

    assert_eq!(tables.genres.len(), 5);
    assert_eq!(tables.directors.len(), 2);
    assert_eq!(encoded.genre_matrix.nrows(), 3);

    let sim = similarity_for(&catalog);
    assert!(sim.get(0, 1) > sim.get(0, 2));
}
