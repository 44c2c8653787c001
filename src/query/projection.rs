//! Row shapes returned by the query catalog.
//!
//! Fields derived from the optional side of an outer join are always present
//! in the row; absence renders as `null` or as the documented placeholder.
//! Field names are the camelCase JSON keys.

use serde::Serialize;

use crate::model::{Price, Product, ProductId, Review, ReviewId};
use crate::query::aggregate::ReviewStats;
use crate::query::join::Match;

/// Product name rendered when a review points at a missing product.
pub const PRODUCT_NOT_FOUND: &str = "Product Not Found";
/// Title rendered when a product has no review in the recent window.
pub const NO_RECENT_REVIEWS: &str = "No recent reviews";
/// Title rendered when a product has no reviews at all.
pub const NO_REVIEWS: &str = "No reviews";
/// Reviewer rendered whenever there is no review to read from.
pub const NOT_AVAILABLE: &str = "N/A";

/// One product paired with at most one review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviewRow {
    /// Product id, or `0` when the review's product is missing.
    pub product_id: ProductId,
    /// Product name, or [`PRODUCT_NOT_FOUND`].
    pub product_name: String,
    /// Product price, zero when the product is missing.
    pub product_price: Price,
    /// Review id; `None` without a review.
    pub review_id: Option<ReviewId>,
    /// Review title.
    pub review_title: Option<String>,
    /// Review rating, 1 to 5.
    pub review_rating: Option<u8>,
    /// Who wrote the review.
    pub reviewer_name: Option<String>,
}

impl ProductReviewRow {
    /// Product-driven row; an absent review nulls every review field.
    pub fn from_product(product: &Product, review: Match<&Review>) -> Self {
        let review = review.present();
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_price: product.price,
            review_id: review.map(|r| r.id),
            review_title: review.map(|r| r.title.clone()),
            review_rating: review.map(|r| r.rating.get()),
            reviewer_name: review.map(|r| r.reviewer_name.clone()),
        }
    }

    /// Row for a matched pair.
    pub fn matched(product: &Product, review: &Review) -> Self {
        Self::from_product(product, Match::Present(review))
    }

    /// Review-driven row; an absent product renders id `0`,
    /// [`PRODUCT_NOT_FOUND`], and a zero price.
    pub fn from_review(product: Match<&Product>, review: &Review) -> Self {
        let (product_id, product_name, product_price) = match product {
            Match::Present(product) => (product.id, product.name.clone(), product.price),
            Match::Absent => (ProductId(0), PRODUCT_NOT_FOUND.to_owned(), Price::ZERO),
        };
        Self {
            product_id,
            product_name,
            product_price,
            review_id: Some(review.id),
            review_title: Some(review.title.clone()),
            review_rating: Some(review.rating.get()),
            reviewer_name: Some(review.reviewer_name.clone()),
        }
    }
}

/// Review count and mean rating for a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviewSummary {
    /// Product id.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Number of reviews pointing at the product.
    pub review_count: usize,
    /// Mean rating, `0.0` when there are no reviews.
    pub average_rating: f64,
}

impl ProductReviewSummary {
    /// Absent stats render as zero reviews with a zero average.
    pub fn new(product: &Product, stats: Match<&ReviewStats>) -> Self {
        let stats = stats.map_or(ReviewStats::empty(product.id), |s| *s);
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            review_count: stats.count,
            average_rating: stats.average,
        }
    }
}

/// Whether a product has a review inside the recent window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentReviewRow {
    /// Product id.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Whether a review fell inside the window.
    pub has_recent_review: bool,
    /// Review title, or [`NO_RECENT_REVIEWS`].
    pub recent_review_title: String,
    /// Reviewer, or [`NOT_AVAILABLE`].
    pub recent_reviewer: String,
}

impl RecentReviewRow {
    /// Product-driven row; an absent review renders the placeholders.
    pub fn new(product: &Product, review: Match<&Review>) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            has_recent_review: review.is_present(),
            recent_review_title: review
                .map_or(NO_RECENT_REVIEWS.to_owned(), |r| r.title.clone()),
            recent_reviewer: review.map_or(NOT_AVAILABLE.to_owned(), |r| r.reviewer_name.clone()),
        }
    }
}

/// Highest rating of a product and the review that carries it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestReviewRow {
    /// Product id.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Product price.
    pub product_price: Price,
    /// Highest rating, `0` without reviews.
    pub best_rating: u8,
    /// Title of the first review with the highest rating, or [`NO_REVIEWS`].
    pub best_review_title: String,
    /// Author of that review, or [`NOT_AVAILABLE`].
    pub reviewer_name: String,
}

impl BestReviewRow {
    /// Row for a product whose review group was empty.
    pub fn no_reviews(product: &Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_price: product.price,
            best_rating: 0,
            best_review_title: NO_REVIEWS.to_owned(),
            reviewer_name: NOT_AVAILABLE.to_owned(),
        }
    }

    /// Row for a product whose maximum is `best_rating`. A missing
    /// representative still renders the placeholder text.
    pub fn with_best(product: &Product, best_rating: u8, review: Option<&Review>) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_price: product.price,
            best_rating,
            best_review_title: review.map_or(NO_REVIEWS.to_owned(), |r| r.title.clone()),
            reviewer_name: review.map_or(NOT_AVAILABLE.to_owned(), |r| r.reviewer_name.clone()),
        }
    }
}
