//! Background job scheduler and job implementations.

mod deactivate_games;
mod pool_metrics;
mod scheduler;

pub use deactivate_games::DeactivatePastGamesJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
