//! The product/review query catalog.
//!
//! Each query borrows one [`Snapshot`], runs a join pipeline through the
//! [`Executor`], and returns fully materialized, ordered rows.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Price, Product, ProductId, Rating, Review, ReviewId};
use crate::query::aggregate::{max_rating_per_product, review_stats, GroupMax, ReviewStats};
use crate::query::executor::Executor;
use crate::query::join::{flatten, Match};
use crate::query::key::{
    product_id, review_product_id, review_product_rating, ProductRatingKey,
};
use crate::query::order::Orderer;
use crate::query::projection::{
    BestReviewRow, ProductReviewRow, ProductReviewSummary, RecentReviewRow,
};
use crate::snapshot::Snapshot;

/// Tunables for the filtered queries.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    /// Products must cost strictly more than this in the high-rating query.
    pub min_price: Price,
    /// Reviews must rate at least this in the high-rating query.
    pub min_rating: Rating,
    /// How far back a review still counts as recent.
    pub recent_window: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            min_price: Price::from_cents(10_000),
            min_rating: Rating::new(4).unwrap_or(Rating::MAX),
            recent_window: Duration::days(7),
        }
    }
}

/// Every query the catalog can run by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum QueryKind {
    ProductsWithReviews,
    ReviewsWithProducts,
    ProductsInnerJoin,
    ProductsReviewSummary,
    ProductsGroupJoinFlatten,
    ProductsHighRatingLeftJoin,
    ProductsRecentReviewLeftJoin,
    ProductsBestReview,
    Products,
    Reviews,
}

impl QueryKind {
    /// All named queries in catalog order.
    pub const ALL: [QueryKind; 10] = [
        QueryKind::ProductsWithReviews,
        QueryKind::ReviewsWithProducts,
        QueryKind::ProductsInnerJoin,
        QueryKind::ProductsReviewSummary,
        QueryKind::ProductsGroupJoinFlatten,
        QueryKind::ProductsHighRatingLeftJoin,
        QueryKind::ProductsRecentReviewLeftJoin,
        QueryKind::ProductsBestReview,
        QueryKind::Products,
        QueryKind::Reviews,
    ];

    /// Kebab-case name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::ProductsWithReviews => "products-with-reviews",
            QueryKind::ReviewsWithProducts => "reviews-with-products",
            QueryKind::ProductsInnerJoin => "products-inner-join",
            QueryKind::ProductsReviewSummary => "products-review-summary",
            QueryKind::ProductsGroupJoinFlatten => "products-groupjoin-flatten",
            QueryKind::ProductsHighRatingLeftJoin => "products-high-rating-left-join",
            QueryKind::ProductsRecentReviewLeftJoin => "products-recent-review-left-join",
            QueryKind::ProductsBestReview => "products-best-review",
            QueryKind::Products => "products",
            QueryKind::Reviews => "reviews",
        }
    }

    /// One-line description for listings.
    pub fn describe(self) -> &'static str {
        match self {
            QueryKind::ProductsWithReviews => "active products left-joined to their reviews",
            QueryKind::ReviewsWithProducts => "every review right-joined to its product",
            QueryKind::ProductsInnerJoin => "active products that have reviews",
            QueryKind::ProductsReviewSummary => "review count and average rating per product",
            QueryKind::ProductsGroupJoinFlatten => "group join flattened back to a left join",
            QueryKind::ProductsHighRatingLeftJoin => "expensive products with high ratings",
            QueryKind::ProductsRecentReviewLeftJoin => "products with reviews in the recent window",
            QueryKind::ProductsBestReview => "highest-rated review per product",
            QueryKind::Products => "active products",
            QueryKind::Reviews => "all reviews",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QueryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownQuery(s.to_owned()))
    }
}

/// Rows produced by [`Queries::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Product/review pairs from the join queries.
    ProductReviews(Vec<ProductReviewRow>),
    /// Per-product review aggregates.
    Summaries(Vec<ProductReviewSummary>),
    /// Recent-window rows.
    Recent(Vec<RecentReviewRow>),
    /// Best-review rows.
    Best(Vec<BestReviewRow>),
    /// Plain product listing.
    Products(Vec<Product>),
    /// Plain review listing.
    Reviews(Vec<Review>),
}

impl QueryOutput {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            QueryOutput::ProductReviews(rows) => rows.len(),
            QueryOutput::Summaries(rows) => rows.len(),
            QueryOutput::Recent(rows) => rows.len(),
            QueryOutput::Best(rows) => rows.len(),
            QueryOutput::Products(rows) => rows.len(),
            QueryOutput::Reviews(rows) => rows.len(),
        }
    }

    /// Whether the query produced no rows. Not an error.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only queries over one snapshot.
pub struct Queries<'s> {
    snapshot: &'s Snapshot,
    executor: Executor,
    options: QueryOptions,
    now: OffsetDateTime,
}

impl<'s> Queries<'s> {
    /// Queries with default options, a plain executor, and `now` as the
    /// reference time for the recent-review window.
    pub fn new(snapshot: &'s Snapshot, now: OffsetDateTime) -> Self {
        Self {
            snapshot,
            executor: Executor::new(),
            options: QueryOptions::default(),
            now,
        }
    }

    /// Replaces the executor, e.g. with one holding a cancel token.
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Replaces the query options.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs a query by kind.
    pub fn run(&self, kind: QueryKind) -> Result<QueryOutput> {
        let output = match kind {
            QueryKind::ProductsWithReviews => {
                QueryOutput::ProductReviews(self.products_with_reviews()?)
            }
            QueryKind::ReviewsWithProducts => {
                QueryOutput::ProductReviews(self.reviews_with_products()?)
            }
            QueryKind::ProductsInnerJoin => {
                QueryOutput::ProductReviews(self.products_inner_join()?)
            }
            QueryKind::ProductsReviewSummary => {
                QueryOutput::Summaries(self.products_review_summary()?)
            }
            QueryKind::ProductsGroupJoinFlatten => {
                QueryOutput::ProductReviews(self.products_groupjoin_flatten()?)
            }
            QueryKind::ProductsHighRatingLeftJoin => {
                QueryOutput::ProductReviews(self.products_high_rating_left_join()?)
            }
            QueryKind::ProductsRecentReviewLeftJoin => {
                QueryOutput::Recent(self.products_recent_review_left_join()?)
            }
            QueryKind::ProductsBestReview => QueryOutput::Best(self.products_best_review()?),
            QueryKind::Products => QueryOutput::Products(self.products()),
            QueryKind::Reviews => QueryOutput::Reviews(self.reviews()),
        };
        info!(query = kind.as_str(), rows = output.len(), "query.run");
        Ok(output)
    }

    fn by_product_then_review() -> Orderer<ProductReviewRow> {
        Orderer::new()
            .asc(|row: &ProductReviewRow| row.product_id)
            .asc_or(|row: &ProductReviewRow| row.review_id, ReviewId(0))
    }

    /// Active products left-joined to their reviews, ordered by product id
    /// then review id (absent review sorts as id 0).
    pub fn products_with_reviews(&self) -> Result<Vec<ProductReviewRow>> {
        let rows = self.executor.left_join(
            self.snapshot.active_products(),
            self.snapshot.reviews(),
            product_id,
            review_product_id,
            ProductReviewRow::from_product,
        )?;
        self.executor.order(&Self::by_product_then_review(), rows)
    }

    /// Every review with its product, if any, ordered by review id.
    pub fn reviews_with_products(&self) -> Result<Vec<ProductReviewRow>> {
        let rows = self.executor.right_join(
            self.snapshot.products(),
            self.snapshot.reviews(),
            product_id,
            review_product_id,
            ProductReviewRow::from_review,
        )?;
        let order =
            Orderer::new().asc_or(|row: &ProductReviewRow| row.review_id, ReviewId(0));
        self.executor.order(&order, rows)
    }

    /// Active products paired with each of their reviews; products without
    /// reviews are dropped.
    pub fn products_inner_join(&self) -> Result<Vec<ProductReviewRow>> {
        let rows = self.executor.inner_join(
            self.snapshot.active_products(),
            self.snapshot.reviews(),
            product_id,
            review_product_id,
            ProductReviewRow::matched,
        )?;
        self.executor.order(&Self::by_product_then_review(), rows)
    }

    /// Review count and average rating per active product, by name.
    pub fn products_review_summary(&self) -> Result<Vec<ProductReviewSummary>> {
        let stats = self
            .executor
            .aggregate(|| review_stats(self.snapshot.reviews()))?;
        let rows = self.executor.left_join(
            self.snapshot.active_products(),
            &stats,
            product_id,
            |stats: &ReviewStats| stats.product_id,
            ProductReviewSummary::new,
        )?;
        let order =
            Orderer::new().asc_ref(|row: &ProductReviewSummary| row.product_name.as_str());
        self.executor.order(&order, rows)
    }

    /// Group join flattened with an absent row for empty groups; identical
    /// rows to [`Queries::products_with_reviews`].
    pub fn products_groupjoin_flatten(&self) -> Result<Vec<ProductReviewRow>> {
        let groups = self.executor.group_join(
            self.snapshot.active_products(),
            self.snapshot.reviews(),
            product_id,
            review_product_id,
            |product, reviews| (product, reviews.to_vec()),
        )?;
        let rows = flatten(groups, |product, review| {
            ProductReviewRow::from_product(product, review)
        });
        self.executor.order(&Self::by_product_then_review(), rows)
    }

    /// Active products above the price floor joined to reviews at or above
    /// the rating floor, keeping matched rows only. Ordered by rating
    /// descending, then product name.
    pub fn products_high_rating_left_join(&self) -> Result<Vec<ProductReviewRow>> {
        let QueryOptions {
            min_price,
            min_rating,
            ..
        } = self.options;
        let rows = self.executor.left_join(
            self.snapshot
                .active_products()
                .filter(|product| product.price > min_price),
            self.snapshot
                .reviews()
                .iter()
                .filter(|review| review.rating >= min_rating),
            product_id,
            review_product_id,
            ProductReviewRow::from_product,
        )?;
        let rows = rows
            .into_iter()
            .filter(|row| row.review_rating.is_some())
            .collect();
        let order = Orderer::new()
            .desc_or(|row: &ProductReviewRow| row.review_rating, 0)
            .asc_ref(|row: &ProductReviewRow| row.product_name.as_str());
        self.executor.order(&order, rows)
    }

    /// Active products joined to reviews written within the recent window,
    /// ordered by product id.
    pub fn products_recent_review_left_join(&self) -> Result<Vec<RecentReviewRow>> {
        let since = self
            .now
            .checked_sub(self.options.recent_window)
            .unwrap_or(PrimitiveDateTime::MIN.assume_utc());
        let rows = self.executor.left_join(
            self.snapshot.active_products(),
            self.snapshot
                .reviews()
                .iter()
                .filter(|review| review.review_date >= since),
            product_id,
            review_product_id,
            RecentReviewRow::new,
        )?;
        let order = Orderer::new().asc(|row: &RecentReviewRow| row.product_id);
        self.executor.order(&order, rows)
    }

    /// Highest rating per active product with the first review that
    /// achieves it. Ordered by best rating descending, then product name.
    pub fn products_best_review(&self) -> Result<Vec<BestReviewRow>> {
        let maxima = self
            .executor
            .aggregate(|| max_rating_per_product(self.snapshot.reviews()))?;
        let with_max = self.executor.left_join(
            self.snapshot.active_products(),
            &maxima,
            product_id,
            |max: &GroupMax| max.product_id,
            |product, max| (product, max.map(|max| max.max_rating)),
        )?;
        let best = self
            .executor
            .build(self.snapshot.reviews(), review_product_rating)?;
        let rows = with_max
            .into_iter()
            .map(|(product, max)| match max {
                Match::Absent => BestReviewRow::no_reviews(product),
                Match::Present(rating) => {
                    let key = ProductRatingKey::new(product.id, rating.get());
                    BestReviewRow::with_best(product, rating.get(), best.first(&key))
                }
            })
            .collect();
        let order = Orderer::new()
            .desc(|row: &BestReviewRow| row.best_rating)
            .asc_ref(|row: &BestReviewRow| row.product_name.as_str());
        self.executor.order(&order, rows)
    }

    /// Active products in snapshot order.
    pub fn products(&self) -> Vec<Product> {
        self.snapshot.active_products().cloned().collect()
    }

    /// All reviews in snapshot order.
    pub fn reviews(&self) -> Vec<Review> {
        self.snapshot.reviews().to_vec()
    }

    /// Reviews pointing at `id`, in snapshot order.
    ///
    /// An empty result is reported as [`Error::NotFound`], since the caller
    /// asked for one specific product.
    pub fn reviews_for_product(&self, id: ProductId) -> Result<Vec<Review>> {
        let reviews: Vec<Review> = self
            .snapshot
            .reviews()
            .iter()
            .filter(|review| review.product_id == id)
            .cloned()
            .collect();
        if reviews.is_empty() {
            return Err(Error::NotFound(format!("No reviews found for product {id}")));
        }
        Ok(reviews)
    }
}
