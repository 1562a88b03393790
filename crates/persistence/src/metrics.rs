//! Database metrics: statement timings and pool occupancy.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Records how long one named statement took.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "pickup_db_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Publishes pool gauges. Called periodically by the pool metrics job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("pickup_db_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("pickup_db_connections_idle").set(idle as f64);
    gauge!("pickup_db_connections_total").set(size as f64);
}

/// Times a repository statement.
///
/// ```ignore
/// let timer = QueryTimer::new("insert_reservation");
/// let result = sqlx::query_scalar(...).fetch_optional(&mut *conn).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(&self.query_name, self.start.elapsed().as_secs_f64());
    }
}
