//! Record types held by a [`Snapshot`](crate::snapshot::Snapshot).
//!
//! Records carry no behavior beyond validation on construction. A review's
//! `product_id` is a plain foreign key: it is allowed to name a product that
//! does not exist in the snapshot.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Primary key of a [`Product`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

/// Primary key of a [`Review`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Star rating in the inclusive range `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: Rating = Rating(1);
    /// Highest accepted rating.
    pub const MAX: Rating = Rating(5);

    /// Validates `value` against the `1..=5` range.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidRating(value))
        }
    }

    /// Returns the raw star count.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-negative decimal amount with two fractional digits, stored as cents.
///
/// Serialized as a JSON number (`999.99`). Deserialization rejects negative
/// and non-finite inputs and rounds to the nearest cent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    /// Zero amount, used when a projection has no product to read from.
    pub const ZERO: Price = Price { cents: 0 };

    /// Builds a price from a whole number of cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Converts a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidPrice(amount.to_string()));
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return Err(Error::InvalidPrice(amount.to_string()));
        }
        Ok(Self {
            cents: cents as u64,
        })
    }

    /// Returns the amount in cents.
    pub const fn cents(self) -> u64 {
        self.cents
    }

    /// Returns the amount as a floating point decimal for rendering.
    pub fn as_decimal(self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = f64::deserialize(deserializer)?;
        Price::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

/// Catalog entry that reviews point at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique within a snapshot.
    pub id: ProductId,
    /// Display name; also a sort key.
    pub name: String,
    /// Free text.
    #[serde(default)]
    pub description: String,
    /// List price.
    pub price: Price,
    /// When the product was listed.
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
    /// Inactive products are skipped by product-driven queries.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Creates an active product with an empty description.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        price: Price,
        created_date: OffsetDateTime,
    ) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            description: String::new(),
            price,
            created_date,
            is_active: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the product inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A rating left against a product id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique within a snapshot.
    pub id: ReviewId,
    /// Headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Star rating.
    pub rating: Rating,
    /// Author.
    #[serde(default)]
    pub reviewer_name: String,
    /// When the review was written.
    #[serde(with = "time::serde::rfc3339")]
    pub review_date: OffsetDateTime,
    /// Reviewed product; may be dangling.
    pub product_id: ProductId,
}

impl Review {
    /// Creates a review with empty content and reviewer name.
    pub fn new(
        id: u32,
        product_id: u32,
        title: impl Into<String>,
        rating: Rating,
        review_date: OffsetDateTime,
    ) -> Self {
        Self {
            id: ReviewId(id),
            title: title.into(),
            content: String::new(),
            rating,
            reviewer_name: String::new(),
            review_date,
            product_id: ProductId(product_id),
        }
    }

    /// Sets the review body.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the reviewer name.
    pub fn by(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer_name = reviewer.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_rejects_out_of_range() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(5).map(Rating::get).ok(), Some(5));
    }

    #[test]
    fn rating_deserialization_is_validated() {
        let ok: Rating = serde_json::from_str("4").expect("valid rating");
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn price_rounds_to_cents_and_formats() -> Result<()> {
        let price = Price::from_decimal(999.99)?;
        assert_eq!(price.cents(), 99_999);
        assert_eq!(price.to_string(), "999.99");
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert!(Price::from_decimal(-1.0).is_err());
        assert!(Price::from_decimal(f64::NAN).is_err());
        Ok(())
    }

    #[test]
    fn price_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_cents(19_999)).expect("serialize");
        assert_eq!(json, "199.99");
    }

    #[test]
    fn review_round_trips_with_camel_case_fields() {
        let json = r#"{
            "id": 3,
            "title": "Excellent phone",
            "rating": 5,
            "reviewerName": "Mike Johnson",
            "reviewDate": "2024-05-01T12:00:00Z",
            "productId": 2
        }"#;
        let review: Review = serde_json::from_str(json).expect("parse review");
        assert_eq!(review.product_id, ProductId(2));
        assert_eq!(review.reviewer_name, "Mike Johnson");
        assert!(review.content.is_empty());
    }
}
