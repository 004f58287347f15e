use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::locks::KeyedLocks;
use game_core::{DailyQuota, GuessTransition, local_date};
use game_persistence::StoreError;
use game_persistence::repositories::{GameRepository, GuessRecorded};
use game_types::{
    AuthenticatedUser, DashboardResponse, GameId, GameView, Guess, GuessOutcome, UserId,
};

/// Entry point for every player-facing game operation.
///
/// Starts are serialized per user and guesses per game inside this process;
/// the repository's transactions cover concurrent writers elsewhere.
pub struct GameManager {
    games: GameRepository,
    quota: DailyQuota,
    user_locks: KeyedLocks<UserId>,
    game_locks: KeyedLocks<GameId>,
}

impl GameManager {
    pub fn new(db: DatabaseConnection, quota: DailyQuota) -> Self {
        Self {
            games: GameRepository::new(db),
            quota,
            user_locks: KeyedLocks::new(),
            game_locks: KeyedLocks::new(),
        }
    }

    pub fn quota(&self) -> DailyQuota {
        self.quota
    }

    pub async fn start_game(&self, user: &AuthenticatedUser) -> Result<GameId, StoreError> {
        self.start_game_at(user, Utc::now()).await
    }

    pub async fn start_game_at(
        &self,
        user: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> Result<GameId, StoreError> {
        let _guard = self.user_locks.lock(user.user_id).await;
        let game = self.games.start_game(user.user_id, now, &self.quota).await?;
        Ok(game.id())
    }

    pub async fn submit_guess(
        &self,
        user: &AuthenticatedUser,
        game_id: GameId,
        raw: &str,
    ) -> Result<GuessOutcome, StoreError> {
        let _guard = self.game_locks.lock(game_id).await;
        let recorded = self
            .games
            .submit_guess(game_id, user.user_id, raw, Utc::now())
            .await?;

        debug!(game_id = %game_id, status = ?recorded.transition.status(), "Guess recorded");
        to_outcome(recorded)
    }

    pub async fn game_view(
        &self,
        user: &AuthenticatedUser,
        game_id: GameId,
    ) -> Result<GameView, StoreError> {
        self.games.game_view(game_id, user.user_id).await
    }

    pub async fn dashboard(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<DashboardResponse, StoreError> {
        let games_played_today = self
            .games
            .games_started_on(user.user_id, local_date(Utc::now()))
            .await?;

        Ok(DashboardResponse {
            username: user.username.clone(),
            is_admin: user.is_admin,
            games_played_today,
            remaining_games: self.quota.remaining_games(games_played_today),
            max_games_per_day: self.quota.max_games_per_day,
        })
    }

    /// Drop lock entries that no request currently holds.
    pub fn prune_locks(&self) -> usize {
        self.user_locks.prune() + self.game_locks.prune()
    }
}

fn to_outcome(recorded: GuessRecorded) -> Result<GuessOutcome, StoreError> {
    let revealed_word = recorded
        .game
        .revealed_word()
        .map(str::to_string)
        .unwrap_or_default();

    let outcome = match recorded.transition {
        GuessTransition::Continuing {
            remaining_attempts, ..
        } => GuessOutcome::Continue {
            feedback: recorded.guess.to_result()?,
            remaining_attempts,
        },
        GuessTransition::Won { .. } => GuessOutcome::Won {
            feedback: recorded.guess.to_result()?,
            revealed_word,
        },
        GuessTransition::Lost { .. } => GuessOutcome::Lost {
            revealed_word,
            all_guesses: recorded
                .history
                .iter()
                .map(Guess::to_result)
                .collect::<Result<_, _>>()?,
        },
    };

    Ok(outcome)
}
