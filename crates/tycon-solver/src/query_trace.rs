//! Structured tracing for the public query entry points.
//!
//! Events use target `tycon::query` and are intended to be consumed with:
//! `TYCON_LOG=tycon::query=trace TYCON_LOG_FORMAT=json`.
//!
//! Environment:
//! - `TYCON_QUERY_RUN_ID`: optional run identifier attached to every event.

use crate::TypeId;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "tycon::query", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| {
            std::env::var("TYCON_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string())
        })
        .as_str()
}

#[inline]
pub(crate) fn relation_start(query_id: u64, op: &'static str, source: TypeId, target: TypeId) {
    trace!(
        target: "tycon::query",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        source_type_id = source.index(),
        target_type_id = target.index()
    );
}

#[inline]
pub(crate) fn relation_end(query_id: u64, op: &'static str, result: bool) {
    trace!(
        target: "tycon::query",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result
    );
}

#[inline]
pub(crate) fn solve_end(query_id: u64, variables: usize, constraints: usize, conflicts: usize) {
    trace!(
        target: "tycon::query",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op = "solve",
        variables,
        constraints,
        conflicts
    );
}
