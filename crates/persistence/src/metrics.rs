//! Query and connection pool metrics for the ZoneNotify store.
//!
//! Every repository query goes through a [`QueryTimer`]; the `/metrics`
//! handler refreshes the pool gauges before each scrape.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Outcome label of a finished query.
fn outcome_label<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::RowNotFound) => "not_found",
        Err(_) => "error",
    }
}

/// Times one named repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_zone_by_id");
/// let result = sqlx::query_as::<_, ZoneEntity>(...).fetch_optional(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records `zonenotify_db_query_duration_seconds` labelled by query and
    /// outcome. Failures also bump `zonenotify_db_query_errors_total`.
    pub fn finish<T>(self, result: &Result<T, sqlx::Error>) {
        let outcome = outcome_label(result);

        histogram!(
            "zonenotify_db_query_duration_seconds",
            "query" => self.query,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if outcome == "error" {
            counter!("zonenotify_db_query_errors_total", "query" => self.query).increment(1);
        }
    }
}

/// Connection counts of the pool at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub in_use: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self::from_counts(pool.size(), pool.num_idle(), pool.options().get_max_connections())
    }

    /// `idle` can briefly exceed `size` while sqlx reaps connections.
    fn from_counts(size: u32, idle: usize, max: u32) -> Self {
        let idle = u32::try_from(idle).unwrap_or(u32::MAX).min(size);
        Self {
            in_use: size - idle,
            idle,
            max,
        }
    }
}

/// Publishes `zonenotify_db_pool_connections{state}` and the pool ceiling.
pub fn record_pool_metrics(pool: &PgPool) {
    let snapshot = PoolSnapshot::of(pool);

    gauge!("zonenotify_db_pool_connections", "state" => "in_use").set(f64::from(snapshot.in_use));
    gauge!("zonenotify_db_pool_connections", "state" => "idle").set(f64::from(snapshot.idle));
    gauge!("zonenotify_db_pool_max_connections").set(f64::from(snapshot.max));
}
