//! Query executor.
//!
//! Wraps the join, aggregation, and ordering primitives with a cancel token,
//! profiling timers, and `tracing` events. A set token is observed after
//! every build phase, before the matching probe starts, and before
//! aggregation and ordering.

use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::query::join::{Lookup, Match};
use crate::query::order::Orderer;
use crate::query::profile::{profile_timer, record_profile_timer, QueryProfileKind};

/// Runs join pipelines over borrowed snapshots.
#[derive(Clone, Debug, Default)]
pub struct Executor {
    cancel: Option<Arc<AtomicBool>>,
}

impl Executor {
    /// Executor without a cancel token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that aborts with [`Error::Cancelled`] once `token` is set.
    pub fn with_cancel(token: Arc<AtomicBool>) -> Self {
        Self {
            cancel: Some(token),
        }
    }

    fn check_cancel(&self) -> Result<()> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::SeqCst) {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// Builds the lookup for an inner collection, then checks the token.
    pub fn build<'i, K, I, It, F>(&self, inner: It, key: F) -> Result<Lookup<'i, K, I>>
    where
        K: Eq + Hash,
        I: 'i,
        It: IntoIterator<Item = &'i I>,
        F: Fn(&I) -> K,
    {
        self.check_cancel()?;
        let timer = profile_timer();
        let lookup = Lookup::build(inner, key);
        record_profile_timer(QueryProfileKind::Build, timer);
        debug!(
            keys = lookup.key_count(),
            rows = lookup.row_count(),
            "query.join.build"
        );
        self.check_cancel()?;
        Ok(lookup)
    }

    fn probe<R, F>(&self, kind: &'static str, probe: F) -> Vec<R>
    where
        F: FnOnce() -> Vec<R>,
    {
        let timer = profile_timer();
        let rows = probe();
        record_profile_timer(QueryProfileKind::Probe, timer);
        debug!(kind, rows = rows.len(), "query.join.probe");
        rows
    }

    /// Cancellable [`inner_join`](crate::query::join::inner_join).
    pub fn inner_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
        &self,
        outer: Oi,
        inner: Ii,
        outer_key: OK,
        inner_key: IK,
        project: P,
    ) -> Result<Vec<R>>
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
        let lookup = self.build(inner, inner_key)?;
        Ok(self.probe("inner", || lookup.probe_inner(outer, outer_key, project)))
    }

    /// Cancellable [`left_join`](crate::query::join::left_join).
    pub fn left_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
        &self,
        outer: Oi,
        inner: Ii,
        outer_key: OK,
        inner_key: IK,
        project: P,
    ) -> Result<Vec<R>>
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
        let lookup = self.build(inner, inner_key)?;
        Ok(self.probe("left", || lookup.probe_left(outer, outer_key, project)))
    }

    /// Cancellable [`right_join`](crate::query::join::right_join).
    pub fn right_join<'l, 'r, L, Rt, K, Li, Ri, LK, RK, P, R>(
        &self,
        left: Li,
        right: Ri,
        left_key: LK,
        right_key: RK,
        mut project: P,
    ) -> Result<Vec<R>>
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
        self.left_join(right, left, right_key, left_key, |r, l| project(l, r))
    }

    /// Cancellable [`group_join`](crate::query::join::group_join).
    pub fn group_join<'o, 'i, O, I, K, Oi, Ii, OK, IK, P, R>(
        &self,
        outer: Oi,
        inner: Ii,
        outer_key: OK,
        inner_key: IK,
        project: P,
    ) -> Result<Vec<R>>
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
        let lookup = self.build(inner, inner_key)?;
        Ok(self.probe("group", || lookup.probe_group(outer, outer_key, project)))
    }

    /// Runs an aggregation step under the profiler.
    pub fn aggregate<R, F>(&self, reduce: F) -> Result<Vec<R>>
    where
        F: FnOnce() -> Vec<R>,
    {
        self.check_cancel()?;
        let timer = profile_timer();
        let groups = reduce();
        record_profile_timer(QueryProfileKind::Aggregate, timer);
        debug!(groups = groups.len(), "query.aggregate");
        Ok(groups)
    }

    /// Applies `orderer` to fully materialized rows.
    pub fn order<R>(&self, orderer: &Orderer<R>, mut rows: Vec<R>) -> Result<Vec<R>> {
        self.check_cancel()?;
        let timer = profile_timer();
        orderer.sort(&mut rows);
        record_profile_timer(QueryProfileKind::Sort, timer);
        debug!(rows = rows.len(), keys = orderer.len(), "query.order");
        Ok(rows)
    }
}
