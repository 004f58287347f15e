use chrono::{Local, NaiveDate};
use game_core::{day_bounds, local_date};
use game_types::{DailyReport, GameError, UserGameReport, UserId, UserReport};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use super::user_repository::UserRepository;
use crate::StoreError;
use crate::entities::{game_sessions, guesses, prelude::*};

/// Read-only queries behind the admin views.
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn daily_report(&self, date: NaiveDate) -> Result<DailyReport, StoreError> {
        let (start, end) = day_bounds(date, &Local);

        let total_users = Users::find().count(&self.db).await?;

        let started_today = GameSessions::find()
            .filter(game_sessions::Column::StartedAt.gte(start))
            .filter(game_sessions::Column::StartedAt.lt(end));

        let games_today = started_today.clone().count(&self.db).await?;
        let won_today = started_today
            .filter(game_sessions::Column::Won.eq(true))
            .count(&self.db)
            .await?;

        Ok(DailyReport {
            date,
            total_users,
            games_today,
            won_today,
        })
    }

    /// Every game of one user, oldest first.
    pub async fn user_report(&self, user_id: UserId) -> Result<UserReport, StoreError> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(UserRepository::model_to_user)
            .ok_or(GameError::user_not_found(user_id))?;

        let sessions = GameSessions::find()
            .filter(game_sessions::Column::UserId.eq(user_id))
            .order_by_asc(game_sessions::Column::StartedAt)
            .find_also_related(Words)
            .all(&self.db)
            .await?;

        let mut games = Vec::with_capacity(sessions.len());
        for (session, word) in sessions {
            let word = word.ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "game {} references missing word {}",
                    session.id, session.word_id
                ))
            })?;

            let correct_guesses = Guesses::find()
                .filter(guesses::Column::GameId.eq(session.id))
                .filter(guesses::Column::GuessText.eq(word.value.as_str()))
                .count(&self.db)
                .await?;

            games.push(UserGameReport {
                game_id: session.id,
                date: local_date(session.started_at),
                word: word.value,
                attempts: session.attempts,
                won: session.won,
                correct_guesses,
            });
        }

        Ok(UserReport {
            no_games_played: games.is_empty(),
            user,
            games,
        })
    }
}
