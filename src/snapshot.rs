//! Immutable record snapshots and the sources that produce them.
//!
//! A [`Snapshot`] is the whole "database" a query sees: two ordered
//! collections, validated once on construction and never mutated afterwards.
//! Anything that can hand over such a pair implements [`SnapshotSource`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Price, Product, Rating, Review};

/// Products and reviews in their natural (insertion) order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    products: Vec<Product>,
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    reviews: Vec<Review>,
}

impl Snapshot {
    /// Validates primary-key uniqueness in both collections.
    ///
    /// Reviews may reference product ids that do not exist.
    pub fn new(products: Vec<Product>, reviews: Vec<Review>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(Error::DuplicateId {
                    entity: "product",
                    id: product.id.0,
                });
            }
        }
        let mut seen = HashSet::with_capacity(reviews.len());
        for review in &reviews {
            if !seen.insert(review.id) {
                return Err(Error::DuplicateId {
                    entity: "review",
                    id: review.id.0,
                });
            }
        }
        Ok(Self { products, reviews })
    }

    /// Decodes a `{"products": [...], "reviews": [...]}` document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_slice(bytes)?;
        Self::new(raw.products, raw.reviews)
    }

    /// All products, active or not.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// All reviews, including those with dangling product ids.
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Active products in snapshot order.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|product| product.is_active)
    }

    /// The demo catalog: five products (the tablet inactive) and nine
    /// reviews, two of which point at products that do not exist.
    ///
    /// Timestamps are offsets from `now`.
    pub fn seed(now: OffsetDateTime) -> Result<Self> {
        let days = |n: i64| now - Duration::days(n);
        let products = vec![
            Product::new(1, "Laptop", Price::from_cents(99_999), days(30))
                .with_description("High performance laptop"),
            Product::new(2, "Smartphone", Price::from_cents(69_999), days(20))
                .with_description("Latest smartphone model"),
            Product::new(3, "Headphones", Price::from_cents(19_999), days(10))
                .with_description("Noise cancelling headphones"),
            Product::new(4, "Smart Watch", Price::from_cents(29_999), days(5))
                .with_description("Fitness tracking watch"),
            Product::new(5, "Tablet", Price::from_cents(39_999), days(15))
                .with_description("10-inch tablet")
                .inactive(),
        ];
        let review = |id, product, title: &str, rating, age, content: &str, by: &str| {
            Rating::new(rating).map(|rating| {
                Review::new(id, product, title, rating, days(age))
                    .with_content(content)
                    .by(by)
            })
        };
        let reviews = vec![
            review(1, 1, "Great laptop!", 5, 25, "Very fast and reliable", "John Doe")?,
            review(
                2,
                1,
                "Battery life could be better",
                3,
                20,
                "Performance is good but battery drains quickly",
                "Jane Smith",
            )?,
            review(3, 2, "Excellent phone", 5, 15, "Camera quality is amazing", "Mike Johnson")?,
            review(
                4,
                3,
                "Best headphones ever",
                5,
                5,
                "Noise cancellation works perfectly",
                "Sarah Williams",
            )?,
            review(
                5,
                3,
                "Good but pricey",
                4,
                3,
                "Features are good but too expensive",
                "Tom Brown",
            )?,
            review(6, 3, "Disappointing", 1, 1, "Broke after 2 weeks", "Alex Green")?,
            review(7, 4, "Average watch", 3, 2, "Does the job but nothing special", "Lisa White")?,
            review(
                8,
                999,
                "Ghost review 1",
                2,
                1,
                "This review has invalid product",
                "Ghost Reviewer",
            )?,
            review(9, 888, "Ghost review 2", 4, 2, "Another invalid product review", "Unknown")?,
        ];
        Self::new(products, reviews)
    }
}

/// Anything that can materialize a [`Snapshot`].
pub trait SnapshotSource {
    /// Produces a fresh snapshot.
    fn load(&self) -> Result<Snapshot>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Built-in demo catalog anchored at a fixed time.
#[derive(Debug, Clone, Copy)]
pub struct SeedSource {
    now: OffsetDateTime,
}

impl SeedSource {
    /// Seed whose relative dates are computed from `now`.
    pub fn new(now: OffsetDateTime) -> Self {
        Self { now }
    }
}

impl SnapshotSource for SeedSource {
    fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot::seed(self.now)?;
        info!(
            products = snapshot.products.len(),
            reviews = snapshot.reviews.len(),
            "snapshot.load.seed"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        "seed".to_owned()
    }
}

/// JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Source reading from `path` on every load.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for JsonFileSource {
    fn load(&self) -> Result<Snapshot> {
        let bytes = fs::read(&self.path)?;
        let snapshot = Snapshot::from_json(&bytes)?;
        info!(
            path = %self.path.display(),
            products = snapshot.products.len(),
            reviews = snapshot.reviews.len(),
            "snapshot.load.file"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
