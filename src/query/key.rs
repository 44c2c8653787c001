//! Key selectors for the product/review relationship.
//!
//! Any `Fn(&T) -> K` with `K: Eq + Hash` works as a selector for the join
//! engine; the functions here are the ones the query catalog uses. Outer and
//! inner selectors must agree on `K`, so a scalar key can never be compared
//! against a composite one.

use crate::model::{Product, ProductId, Review, ReviewId};

/// Composite key matching a review to a `(product, rating)` pair.
///
/// Equality holds only when both fields match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProductRatingKey {
    /// Product the rating belongs to.
    pub product_id: ProductId,
    /// Star count; `0` stands for "no rating" and never matches a review.
    pub rating: u8,
}

impl ProductRatingKey {
    /// Builds a key from its parts.
    pub fn new(product_id: ProductId, rating: u8) -> Self {
        Self { product_id, rating }
    }
}

/// Primary key of a product.
pub fn product_id(product: &Product) -> ProductId {
    product.id
}

/// Primary key of a review.
pub fn review_id(review: &Review) -> ReviewId {
    review.id
}

/// Foreign key from a review to its product.
pub fn review_product_id(review: &Review) -> ProductId {
    review.product_id
}

/// Composite `(product_id, rating)` key of a review.
pub fn review_product_rating(review: &Review) -> ProductRatingKey {
    ProductRatingKey::new(review.product_id, review.rating.get())
}
