#![allow(missing_docs)]

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Once};

use reljoin::model::{Price, Product, ProductId, Rating, Review, ReviewId};
use reljoin::query::projection::{NOT_AVAILABLE, NO_REVIEWS, PRODUCT_NOT_FOUND};
use reljoin::query::{Executor, Queries, QueryKind, QueryOutput};
use reljoin::snapshot::Snapshot;
use reljoin::{Error, Result};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("reljoin=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn seed() -> Result<Snapshot> {
    init_tracing();
    Snapshot::seed(NOW)
}

fn rating(value: u8) -> Rating {
    Rating::new(value).expect("valid rating")
}

#[test]
fn products_with_reviews_skips_the_inactive_tablet() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_with_reviews()?;
    let per_product = |id| rows.iter().filter(|row| row.product_id == ProductId(id)).count();
    assert_eq!(rows.len(), 7);
    assert_eq!(
        [per_product(1), per_product(2), per_product(3), per_product(4)],
        [2, 1, 3, 1]
    );
    assert_eq!(per_product(5), 0, "tablet is removed by the active filter");
    assert!(rows.iter().all(|row| row.review_id.is_some()));
    Ok(())
}

#[test]
fn active_product_without_reviews_gets_one_absent_row() -> Result<()> {
    init_tracing();
    let seed = Snapshot::seed(NOW)?;
    let mut products = seed.products().to_vec();
    products.push(Product::new(6, "Monitor", Price::from_cents(24_999), NOW));
    let snapshot = Snapshot::new(products, seed.reviews().to_vec())?;
    let queries = Queries::new(&snapshot, NOW);

    let rows = queries.products_with_reviews()?;
    let monitor: Vec<_> = rows
        .iter()
        .filter(|row| row.product_id == ProductId(6))
        .collect();
    assert_eq!(monitor.len(), 1);
    assert_eq!(monitor[0].review_id, None);
    assert_eq!(monitor[0].review_title, None);
    assert_eq!(rows.last().map(|row| row.product_id), Some(ProductId(6)));

    assert_eq!(queries.products_groupjoin_flatten()?, rows);
    assert!(queries
        .products_inner_join()?
        .iter()
        .all(|row| row.product_id != ProductId(6)));

    let summary = queries.products_review_summary()?;
    let monitor = summary
        .iter()
        .find(|row| row.product_id == ProductId(6))
        .expect("monitor summary");
    assert_eq!((monitor.review_count, monitor.average_rating), (0, 0.0));

    let best = queries.products_best_review()?;
    let monitor = best.last().expect("monitor sorts last with rating 0");
    assert_eq!(monitor.product_id, ProductId(6));
    assert_eq!(monitor.best_rating, 0);
    assert_eq!(monitor.best_review_title, NO_REVIEWS);
    assert_eq!(monitor.reviewer_name, NOT_AVAILABLE);
    Ok(())
}

#[test]
fn reviews_with_products_marks_dangling_reviews() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).reviews_with_products()?;
    let ids: Vec<u32> = rows.iter().filter_map(|row| row.review_id).map(|id| id.0).collect();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());
    for row in &rows[7..] {
        assert_eq!(row.product_id, ProductId(0));
        assert_eq!(row.product_name, PRODUCT_NOT_FOUND);
        assert_eq!(row.product_price, Price::ZERO);
    }
    assert_eq!(rows[0].product_name, "Laptop");
    Ok(())
}

#[test]
fn inner_join_never_emits_unmatched_products() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_inner_join()?;
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|row| row.review_id.is_some()));
    assert!(rows.iter().all(|row| row.product_id != ProductId(5)));
    Ok(())
}

#[test]
fn review_summary_averages_per_product() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_review_summary()?;
    let names: Vec<&str> = rows.iter().map(|row| row.product_name.as_str()).collect();
    assert_eq!(names, vec!["Headphones", "Laptop", "Smart Watch", "Smartphone"]);
    let headphones = &rows[0];
    assert_eq!(headphones.review_count, 3);
    assert!((headphones.average_rating - 10.0 / 3.0).abs() < 1e-9);
    assert_eq!(rows[1].average_rating, 4.0);
    Ok(())
}

#[test]
fn best_review_over_seed() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_best_review()?;
    let got: Vec<(&str, u8, &str)> = rows
        .iter()
        .map(|row| {
            (
                row.product_name.as_str(),
                row.best_rating,
                row.best_review_title.as_str(),
            )
        })
        .collect();
    assert_eq!(
        got,
        vec![
            ("Headphones", 5, "Best headphones ever"),
            ("Laptop", 5, "Great laptop!"),
            ("Smartphone", 5, "Excellent phone"),
            ("Smart Watch", 3, "Average watch"),
        ]
    );
    Ok(())
}

#[test]
fn best_review_tie_goes_to_first_in_input_order() -> Result<()> {
    init_tracing();
    let products = vec![Product::new(1, "Laptop", Price::from_cents(99_999), NOW)];
    let reviews = vec![
        Review::new(10, 1, "Solid", rating(4), NOW).by("A"),
        Review::new(11, 1, "First five", rating(5), NOW).by("B"),
        Review::new(12, 1, "Second five", rating(5), NOW).by("C"),
    ];
    let snapshot = Snapshot::new(products, reviews)?;
    for _ in 0..3 {
        let rows = Queries::new(&snapshot, NOW).products_best_review()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].best_rating, 5);
        assert_eq!(rows[0].best_review_title, "First five");
        assert_eq!(rows[0].reviewer_name, "B");
    }
    Ok(())
}

#[test]
fn high_rating_join_keeps_only_qualifying_pairs() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_high_rating_left_join()?;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.review_rating.is_some_and(|r| r >= 4)));
    assert!(rows.iter().all(|row| row.product_price > Price::from_cents(10_000)));
    assert!(
        rows.iter().all(|row| row.product_name != "Smart Watch"),
        "smart watch only has a 3-star review"
    );
    let ratings: Vec<u8> = rows.iter().filter_map(|row| row.review_rating).collect();
    assert_eq!(ratings, vec![5, 5, 5, 4]);
    Ok(())
}

#[test]
fn recent_reviews_use_a_seven_day_window() -> Result<()> {
    let snapshot = seed()?;
    let rows = Queries::new(&snapshot, NOW).products_recent_review_left_join()?;
    let got: Vec<(u32, &str)> = rows
        .iter()
        .map(|row| (row.product_id.0, row.recent_review_title.as_str()))
        .collect();
    assert_eq!(
        got,
        vec![
            (1, "No recent reviews"),
            (2, "No recent reviews"),
            (3, "Best headphones ever"),
            (3, "Good but pricey"),
            (3, "Disappointing"),
            (4, "Average watch"),
        ]
    );
    assert!(!rows[0].has_recent_review);
    assert_eq!(rows[0].recent_reviewer, NOT_AVAILABLE);
    Ok(())
}

#[test]
fn recent_window_is_relative_to_now() -> Result<()> {
    let snapshot = seed()?;
    let later = NOW + Duration::days(30);
    let rows = Queries::new(&snapshot, later).products_recent_review_left_join()?;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| !row.has_recent_review));
    Ok(())
}

#[test]
fn listings_and_not_found() -> Result<()> {
    let snapshot = seed()?;
    let queries = Queries::new(&snapshot, NOW);
    assert_eq!(queries.products().len(), 4);
    assert_eq!(queries.reviews().len(), 9);
    let laptop = queries.reviews_for_product(ProductId(1))?;
    assert_eq!(
        laptop.iter().map(|review| review.id).collect::<Vec<_>>(),
        vec![ReviewId(1), ReviewId(2)]
    );
    let err = queries
        .reviews_for_product(ProductId(42))
        .expect_err("no reviews for 42");
    assert_eq!(err.code(), "NotFound");
    Ok(())
}

#[test]
fn run_by_name_serializes_camel_case_rows() -> Result<()> {
    let snapshot = seed()?;
    let output = Queries::new(&snapshot, NOW).run("reviews-with-products".parse()?)?;
    assert!(matches!(output, QueryOutput::ProductReviews(_)));
    let json = serde_json::to_value(&output)?;
    let last = &json[8];
    assert_eq!(last["productId"], 0);
    assert_eq!(last["productName"], PRODUCT_NOT_FOUND);
    assert_eq!(last["reviewId"], 9);
    assert_eq!(last["reviewerName"], "Unknown");
    Ok(())
}

#[test]
fn cancelled_executor_aborts_every_join_query() -> Result<()> {
    let snapshot = seed()?;
    let token = Arc::new(AtomicBool::new(true));
    let queries = Queries::new(&snapshot, NOW).with_executor(Executor::with_cancel(token));
    for kind in QueryKind::ALL {
        match kind {
            QueryKind::Products | QueryKind::Reviews => assert!(queries.run(kind).is_ok()),
            _ => assert!(matches!(queries.run(kind), Err(Error::Cancelled)), "{kind}"),
        }
    }
    Ok(())
}
