//! Hash-based equi-joins over borrowed record collections.
//!
//! Every join kind runs the same two phases: [`Lookup::build`] makes one pass
//! over the inner collection, grouping records by key while keeping their
//! input order, then a probe makes one pass over the outer collection in its
//! input order. Output order is therefore outer order first, inner group
//! order second.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Slot on the optional side of an outer join.
///
/// `Absent` means "no matching record", not an error. Projectors decide
/// which default each derived field takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Match<T> {
    /// A matching record.
    Present(T),
    /// No record matched the key.
    Absent,
}

impl<T> Match<T> {
    /// Returns `true` for [`Match::Present`].
    pub fn is_present(&self) -> bool {
        matches!(self, Match::Present(_))
    }

    /// Returns `true` for [`Match::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Match::Absent)
    }

    /// Maps the present value.
    pub fn map<U, F>(self, f: F) -> Match<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Match::Present(value) => Match::Present(f(value)),
            Match::Absent => Match::Absent,
        }
    }

    /// Applies `f` to the present value or substitutes `default`.
    pub fn map_or<U, F>(self, default: U, f: F) -> U
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Match::Present(value) => f(value),
            Match::Absent => default,
        }
    }

    /// Converts into an `Option`, for projections that render absence as null.
    pub fn present(self) -> Option<T> {
        match self {
            Match::Present(value) => Some(value),
            Match::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Match<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Match::Present(value),
            None => Match::Absent,
        }
    }
}

/// Build side of a join: inner records grouped by key.
#[derive(Debug)]
pub struct Lookup<'i, K, I> {
    table: FxHashMap<K, Vec<&'i I>>,
    rows: usize,
}

impl<'i, K, I> Lookup<'i, K, I>
where
    K: Eq + Hash,
{
    /// Groups `inner` by `key` in a single pass. Records sharing a key keep
    /// their relative input order.
    pub fn build<It, F>(inner: It, key: F) -> Self
    where
        It: IntoIterator<Item = &'i I>,
        F: Fn(&I) -> K,
    {
        let mut table: FxHashMap<K, Vec<&'i I>> = FxHashMap::default();
        let mut rows = 0;
        for record in inner {
            table.entry(key(record)).or_default().push(record);
            rows += 1;
        }
        Self { table, rows }
    }

    /// All inner records with `key`, in input order. Empty when none match.
    pub fn matches(&self, key: &K) -> &[&'i I] {
        self.table.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First inner record with `key` in input order.
    pub fn first(&self, key: &K) -> Option<&'i I> {
        self.matches(key).first().copied()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.table.len()
    }

    /// Number of inner records consumed by the build.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Emits one row per (outer, match) pair; unmatched outer records emit
    /// nothing.
    pub fn probe_inner<'o, O, It, KF, P, R>(
        &self,
        outer: It,
        outer_key: KF,
        mut project: P,
    ) -> Vec<R>
    where
        O: 'o,
        It: IntoIterator<Item = &'o O>,
        KF: Fn(&O) -> K,
        P: FnMut(&'o O, &'i I) -> R,
    {
        let mut rows = Vec::new();
        for record in outer {
            for &inner in self.matches(&outer_key(record)) {
                rows.push(project(record, inner));
            }
        }
        rows
    }

    /// Like [`Lookup::probe_inner`], but an unmatched outer record emits
    /// exactly one row with [`Match::Absent`].
    pub fn probe_left<'o, O, It, KF, P, R>(
        &self,
        outer: It,
        outer_key: KF,
        mut project: P,
    ) -> Vec<R>
    where
        O: 'o,
        It: IntoIterator<Item = &'o O>,
        KF: Fn(&O) -> K,
        P: FnMut(&'o O, Match<&'i I>) -> R,
    {
        let mut rows = Vec::new();
        for record in outer {
            let matches = self.matches(&outer_key(record));
            if matches.is_empty() {
                rows.push(project(record, Match::Absent));
                continue;
            }
            for &inner in matches {
                rows.push(project(record, Match::Present(inner)));
            }
        }
        rows
    }

    /// Emits exactly one row per outer record carrying its whole group.
    pub fn probe_group<'o, O, It, KF, P, R>(
        &self,
        outer: It,
        outer_key: KF,
        mut project: P,
    ) -> Vec<R>
    where
        O: 'o,
        It: IntoIterator<Item = &'o O>,
        KF: Fn(&O) -> K,
        P: FnMut(&'o O, &[&'i I]) -> R,
    {
        outer
            .into_iter()
            .map(|record| project(record, self.matches(&outer_key(record))))
            .collect()
    }
}

/// Inner equi-join of `outer` and `inner`.
pub fn inner_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
    outer: Oi,
    inner: Ii,
    outer_key: OK,
    inner_key: IK,
    project: P,
) -> Vec<R>
where
    O: 'o,
    I: 'i,
    K: Eq + Hash,
    Oi: IntoIterator<Item = &'o O>,
    Ii: IntoIterator<Item = &'i I>,
    OK: Fn(&O) -> K,
    IK: Fn(&I) -> K,
    P: FnMut(&'o O, &'i I) -> R,
{
    Lookup::build(inner, inner_key).probe_inner(outer, outer_key, project)
}

/// Left-outer equi-join: every outer record appears at least once.
pub fn left_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
    outer: Oi,
    inner: Ii,
    outer_key: OK,
    inner_key: IK,
    project: P,
) -> Vec<R>
where
    O: 'o,
    I: 'i,
    K: Eq + Hash,
    Oi: IntoIterator<Item = &'o O>,
    Ii: IntoIterator<Item = &'i I>,
    OK: Fn(&O) -> K,
    IK: Fn(&I) -> K,
    P: FnMut(&'o O, Match<&'i I>) -> R,
{
    Lookup::build(inner, inner_key).probe_left(outer, outer_key, project)
}

/// Right-outer equi-join: every `right` record appears at least once.
///
/// Runs [`left_join`] with the roles swapped, so rows follow `right` order.
/// Callers that need a particular order still sort explicitly.
pub fn right_join<'l, 'r, L, Rt, K, Li, Ri, LK, RK, P, R>(
    left: Li,
    right: Ri,
    left_key: LK,
    right_key: RK,
    mut project: P,
) -> Vec<R>
where
    L: 'l,
    Rt: 'r,
    K: Eq + Hash,
    Li: IntoIterator<Item = &'l L>,
    Ri: IntoIterator<Item = &'r Rt>,
    LK: Fn(&L) -> K,
    RK: Fn(&Rt) -> K,
    P: FnMut(Match<&'l L>, &'r Rt) -> R,
{
    left_join(right, left, right_key, left_key, |r, l| project(l, r))
}

/// Group join: one row per outer record with the full, ordered match group.
pub fn group_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
    outer: Oi,
    inner: Ii,
    outer_key: OK,
    inner_key: IK,
    project: P,
) -> Vec<R>
where
    O: 'o,
    I: 'i,
    K: Eq + Hash,
    Oi: IntoIterator<Item = &'o O>,
    Ii: IntoIterator<Item = &'i I>,
    OK: Fn(&O) -> K,
    IK: Fn(&I) -> K,
    P: FnMut(&'o O, &[&'i I]) -> R,
{
    Lookup::build(inner, inner_key).probe_group(outer, outer_key, project)
}

/// Flattens group-join output into one row per group member, or one
/// [`Match::Absent`] row for an empty group.
///
/// `flatten(group_join(..))` yields the same rows, in the same order, as
/// [`left_join`] with the same inputs.
pub fn flatten<G, I, It, P, R>(groups: It, mut project: P) -> Vec<R>
where
    It: IntoIterator<Item = (G, Vec<I>)>,
    P: FnMut(&G, Match<I>) -> R,
{
    let mut rows = Vec::new();
    for (outer, members) in groups {
        if members.is_empty() {
            rows.push(project(&outer, Match::Absent));
            continue;
        }
        for member in members {
            rows.push(project(&outer, Match::Present(member)));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Left {
        id: u32,
    }

    #[derive(Debug, PartialEq)]
    struct Right {
        id: u32,
        left_id: u32,
    }

    fn lefts(ids: &[u32]) -> Vec<Left> {
        ids.iter().map(|&id| Left { id }).collect()
    }

    fn rights(pairs: &[(u32, u32)]) -> Vec<Right> {
        pairs
            .iter()
            .map(|&(id, left_id)| Right { id, left_id })
            .collect()
    }

    #[test]
    fn inner_join_emits_matches_in_group_order() {
        let outer = lefts(&[1, 2, 3]);
        let inner = rights(&[(10, 2), (11, 1), (12, 2), (13, 9)]);
        let rows = inner_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, r| (l.id, r.id));
        assert_eq!(rows, vec![(1, 11), (2, 10), (2, 12)]);
    }

    #[test]
    fn left_join_emits_one_absent_row_per_unmatched_outer() {
        let outer = lefts(&[1, 2, 3]);
        let inner = rights(&[(10, 2), (12, 2)]);
        let rows = left_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, r| {
            (l.id, r.map(|r| r.id).present())
        });
        assert_eq!(rows, vec![(1, None), (2, Some(10)), (2, Some(12)), (3, None)]);
    }

    #[test]
    fn right_join_follows_right_order_and_marks_missing_left() {
        let outer = lefts(&[1, 2]);
        let inner = rights(&[(10, 2), (11, 999), (12, 1)]);
        let rows = right_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, r| {
            (l.map_or(0, |l| l.id), r.id)
        });
        assert_eq!(rows, vec![(2, 10), (0, 11), (1, 12)]);
    }

    #[test]
    fn group_join_keeps_empty_groups() {
        let outer = lefts(&[1, 2]);
        let inner = rights(&[(10, 2), (11, 2)]);
        let rows = group_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, group| {
            (l.id, group.iter().map(|r| r.id).collect::<Vec<_>>())
        });
        assert_eq!(rows, vec![(1, vec![]), (2, vec![10, 11])]);
    }

    #[test]
    fn flatten_matches_left_join() {
        let outer = lefts(&[1, 2, 3]);
        let inner = rights(&[(10, 3), (11, 1), (12, 3)]);
        let grouped = group_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, group| {
            (l, group.to_vec())
        });
        let flattened = flatten(grouped, |l, r| (l.id, r.map(|r| r.id).present()));
        let joined = left_join(&outer, &inner, |l| l.id, |r| r.left_id, |l, r| {
            (l.id, r.map(|r| r.id).present())
        });
        assert_eq!(flattened, joined);
    }

    #[test]
    fn lookup_first_picks_earliest_record() {
        let inner = rights(&[(20, 5), (21, 5), (22, 6)]);
        let lookup = Lookup::build(&inner, |r| r.left_id);
        assert_eq!(lookup.first(&5).map(|r| r.id), Some(20));
        assert_eq!(lookup.first(&7), None);
        assert_eq!(lookup.key_count(), 2);
        assert_eq!(lookup.row_count(), 3);
    }

    #[test]
    fn composite_tuple_keys_compare_all_fields() {
        let outer = [(1u32, 5u8), (1, 4)];
        let inner = [(1u32, 5u8, "a"), (1, 3, "b"), (2, 4, "c")];
        let rows = left_join(&outer, &inner, |o| (o.0, o.1), |i| (i.0, i.1), |o, i| {
            (o.1, i.map(|i| i.2).present())
        });
        assert_eq!(rows, vec![(5, Some("a")), (4, None)]);
    }
}
