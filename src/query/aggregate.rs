//! Group-by and per-group reductions.
//!
//! Groups are kept in first-seen key order and members in input order, so a
//! reduction over the same input always yields the same sequence.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::model::{ProductId, Rating, Review};
use crate::query::key::review_product_id;

/// One partition produced by [`group_by`].
#[derive(Debug, Clone)]
pub struct Group<'a, K, T> {
    /// Shared key of every member.
    pub key: K,
    /// Members in input order.
    pub members: Vec<&'a T>,
}

/// Ordered partitioning of a collection by key.
#[derive(Debug, Clone)]
pub struct Groups<'a, K, T> {
    index: FxHashMap<K, usize>,
    groups: Vec<Group<'a, K, T>>,
}

impl<'a, K, T> Groups<'a, K, T>
where
    K: Eq + Hash,
{
    /// Members for `key`, or `None` when nothing had that key.
    pub fn get(&self, key: &K) -> Option<&[&'a T]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].members.as_slice())
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Group<'a, K, T>> {
        self.groups.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the input was empty.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reduces every group to one value, in group order.
    pub fn reduce<R, F>(&self, mut f: F) -> Vec<R>
    where
        F: FnMut(&K, &[&'a T]) -> R,
    {
        self.groups
            .iter()
            .map(|group| f(&group.key, group.members.as_slice()))
            .collect()
    }
}

/// Partitions `items` by `key` in one pass.
pub fn group_by<'a, K, T, It, F>(items: It, key: F) -> Groups<'a, K, T>
where
    K: Eq + Hash + Clone,
    T: 'a,
    It: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> K,
{
    let mut index: FxHashMap<K, usize> = FxHashMap::default();
    let mut groups: Vec<Group<'a, K, T>> = Vec::new();
    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&slot) => groups[slot].members.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push(Group {
                    key: k,
                    members: vec![item],
                });
            }
        }
    }
    Groups { index, groups }
}

/// Arithmetic mean of `value` over `items`; exactly `0.0` when empty.
pub fn average<T, F>(items: &[&T], value: F) -> f64
where
    F: Fn(&T) -> f64,
{
    if items.is_empty() {
        return 0.0;
    }
    let total: f64 = items.iter().map(|item| value(*item)).sum();
    total / items.len() as f64
}

/// Largest `value` over `items`, or `None` when empty.
pub fn max_by<T, V, F>(items: &[&T], value: F) -> Option<V>
where
    V: Ord,
    F: Fn(&T) -> V,
{
    items.iter().map(|item| value(*item)).max()
}

/// Review count and mean rating for one product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Product the reviews point at.
    pub product_id: ProductId,
    /// Number of reviews.
    pub count: usize,
    /// Mean rating.
    pub average: f64,
}

impl ReviewStats {
    /// Stats for a product with no reviews.
    pub fn empty(product_id: ProductId) -> Self {
        Self {
            product_id,
            count: 0,
            average: 0.0,
        }
    }
}

/// Highest rating observed for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMax {
    /// Product the reviews point at.
    pub product_id: ProductId,
    /// Highest rating in the group.
    pub max_rating: Rating,
}

/// Count and average rating per referenced product id, in first-seen order.
pub fn review_stats<'a, It>(reviews: It) -> Vec<ReviewStats>
where
    It: IntoIterator<Item = &'a Review>,
{
    group_by(reviews, review_product_id).reduce(|&product_id, members| ReviewStats {
        product_id,
        count: members.len(),
        average: average(members, |review| f64::from(review.rating.get())),
    })
}

/// Maximum rating per referenced product id, in first-seen order.
pub fn max_rating_per_product<'a, It>(reviews: It) -> Vec<GroupMax>
where
    It: IntoIterator<Item = &'a Review>,
{
    group_by(reviews, review_product_id)
        .reduce(|&product_id, members| {
            max_by(members, |review| review.rating).map(|max_rating| GroupMax {
                product_id,
                max_rating,
            })
        })
        .into_iter()
        .flatten()
        .collect()
}
