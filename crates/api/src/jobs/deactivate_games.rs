//! Marks games whose booked time has passed as inactive.

use chrono::Utc;
use metrics::counter;
use persistence::repositories::GameRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct DeactivatePastGamesJob {
    games: GameRepository,
}

impl DeactivatePastGamesJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            games: GameRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for DeactivatePastGamesJob {
    fn name(&self) -> &'static str {
        "deactivate_past_games"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let deactivated = self
            .games
            .deactivate_past_games(Utc::now())
            .await
            .map_err(|e| format!("Failed to deactivate past games: {}", e))?;

        if deactivated > 0 {
            counter!("games_deactivated_total").increment(deactivated);
            info!(deactivated, "Deactivated past games");
        }
        Ok(())
    }
}
