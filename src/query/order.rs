//! Stable multi-key ordering of materialized rows.

use std::cmp::Ordering;

/// Sort direction for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

type Comparator<R> = Box<dyn Fn(&R, &R) -> Ordering>;

/// Ordered list of sort keys applied with a stable sort.
///
/// Keys are compared in the order they were added; rows equal on every key
/// keep their input order. Keys read from an optional slot go through
/// [`Orderer::asc_or`] / [`Orderer::desc_or`], which substitute the given
/// default before comparing so that absence never takes part in ordering.
pub struct Orderer<R> {
    keys: Vec<Comparator<R>>,
}

impl<R> Default for Orderer<R> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<R> Orderer<R> {
    /// Empty orderer; sorting with it leaves rows untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key with an explicit direction.
    pub fn by<K, F>(mut self, direction: Direction, key: F) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K + 'static,
    {
        self.keys.push(Box::new(move |a, b| {
            let ord = key(a).cmp(&key(b));
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }));
        self
    }

    /// Appends a key read by reference, so borrowed fields such as names
    /// are compared without cloning.
    pub fn by_ref<K, F>(mut self, direction: Direction, key: F) -> Self
    where
        K: Ord + ?Sized,
        F: for<'a> Fn(&'a R) -> &'a K + 'static,
    {
        self.keys.push(Box::new(move |a, b| {
            let ord = key(a).cmp(key(b));
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }));
        self
    }

    /// Ascending counterpart of [`Orderer::by_ref`].
    pub fn asc_ref<K, F>(self, key: F) -> Self
    where
        K: Ord + ?Sized,
        F: for<'a> Fn(&'a R) -> &'a K + 'static,
    {
        self.by_ref(Direction::Asc, key)
    }

    /// Appends an ascending key.
    pub fn asc<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K + 'static,
    {
        self.by(Direction::Asc, key)
    }

    /// Appends a descending key.
    pub fn desc<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K + 'static,
    {
        self.by(Direction::Desc, key)
    }

    /// Appends an ascending key over an optional value, substituting `default`
    /// for `None`.
    pub fn asc_or<K, F>(self, key: F, default: K) -> Self
    where
        K: Ord + Clone + 'static,
        F: Fn(&R) -> Option<K> + 'static,
    {
        self.by(Direction::Asc, move |row| {
            key(row).unwrap_or_else(|| default.clone())
        })
    }

    /// Descending counterpart of [`Orderer::asc_or`].
    pub fn desc_or<K, F>(self, key: F, default: K) -> Self
    where
        K: Ord + Clone + 'static,
        F: Fn(&R) -> Option<K> + 'static,
    {
        self.by(Direction::Desc, move |row| {
            key(row).unwrap_or_else(|| default.clone())
        })
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys were added.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two rows key by key.
    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        for key in &self.keys {
            let ord = key(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Sorts `rows` in place. Stable.
    pub fn sort(&self, rows: &mut [R]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }

    /// Consumes and returns `rows` sorted.
    pub fn sorted(&self, mut rows: Vec<R>) -> Vec<R> {
        self.sort(&mut rows);
        rows
    }
}
