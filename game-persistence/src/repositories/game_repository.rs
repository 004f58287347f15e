use chrono::{DateTime, Local, NaiveDate, Utc};
use game_core::{DailyQuota, Game, GuessTransition, day_bounds, local_date};
use game_types::{GameError, GameId, GameSession, GameView, Guess, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::word_repository::pick_random_word;
use crate::StoreError;
use crate::entities::{game_sessions, guesses, prelude::*, users};

pub(crate) fn model_to_session(model: game_sessions::Model) -> GameSession {
    GameSession {
        id: model.id,
        user_id: model.user_id,
        word_id: model.word_id,
        started_at: model.started_at,
        attempts: model.attempts,
        finished: model.finished,
        won: model.won,
    }
}

fn model_to_guess(model: guesses::Model) -> Guess {
    Guess {
        id: model.id,
        game_id: model.game_id,
        text: model.guess_text,
        feedback: model.feedback,
        created_at: model.created_at,
    }
}

pub async fn insert_game_session<C: ConnectionTrait>(
    conn: &C,
    session: &GameSession,
) -> Result<(), StoreError> {
    game_sessions::ActiveModel {
        id: ActiveValue::Set(session.id),
        user_id: ActiveValue::Set(session.user_id),
        word_id: ActiveValue::Set(session.word_id),
        started_at: ActiveValue::Set(session.started_at),
        attempts: ActiveValue::Set(session.attempts),
        finished: ActiveValue::Set(session.finished),
        won: ActiveValue::Set(session.won),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Write back a session's progress, but only if the stored row still has
/// `expected_attempts` and is not finished. Otherwise another writer got
/// there first and the update is refused with [`StoreError::Conflict`].
pub async fn update_game_session<C: ConnectionTrait>(
    conn: &C,
    session: &GameSession,
    expected_attempts: i32,
) -> Result<(), StoreError> {
    let result = GameSessions::update_many()
        .col_expr(game_sessions::Column::Attempts, Expr::value(session.attempts))
        .col_expr(game_sessions::Column::Finished, Expr::value(session.finished))
        .col_expr(game_sessions::Column::Won, Expr::value(session.won))
        .filter(game_sessions::Column::Id.eq(session.id))
        .filter(game_sessions::Column::Attempts.eq(expected_attempts))
        .filter(game_sessions::Column::Finished.eq(false))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        warn!(game_id = %session.id, expected_attempts, "Stale game session update rejected");
        return Err(StoreError::Conflict {
            game_id: session.id,
        });
    }

    Ok(())
}

pub async fn insert_guess<C: ConnectionTrait>(
    conn: &C,
    game_id: GameId,
    text: &str,
    feedback: &str,
    created_at: DateTime<Utc>,
) -> Result<Guess, StoreError> {
    let model = guesses::ActiveModel {
        id: ActiveValue::NotSet,
        game_id: ActiveValue::Set(game_id),
        guess_text: ActiveValue::Set(text.to_string()),
        feedback: ActiveValue::Set(feedback.to_string()),
        created_at: ActiveValue::Set(created_at),
    }
    .insert(conn)
    .await?;

    Ok(model_to_guess(model))
}

/// Games `user_id` started on server-local calendar day `date`.
pub async fn count_games_for_user_on_date<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    date: NaiveDate,
) -> Result<u64, StoreError> {
    let (start, end) = day_bounds(date, &Local);

    let count = GameSessions::find()
        .filter(game_sessions::Column::UserId.eq(user_id))
        .filter(game_sessions::Column::StartedAt.gte(start))
        .filter(game_sessions::Column::StartedAt.lt(end))
        .count(conn)
        .await?;

    Ok(count)
}

/// Rewrite a user's row in place so the transaction takes SQLite's write
/// lock before its first read. Other writers wait on the busy timeout.
/// Returns whether the user exists.
async fn lock_user_row<C: ConnectionTrait>(conn: &C, user_id: UserId) -> Result<bool, StoreError> {
    let result = Users::update_many()
        .col_expr(users::Column::Username, Expr::col(users::Column::Username).into())
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Same as [`lock_user_row`] for a game session. A missing session is left
/// for the following load to report.
async fn lock_game_row<C: ConnectionTrait>(conn: &C, game_id: GameId) -> Result<(), StoreError> {
    GameSessions::update_many()
        .col_expr(
            game_sessions::Column::Attempts,
            Expr::col(game_sessions::Column::Attempts).into(),
        )
        .filter(game_sessions::Column::Id.eq(game_id))
        .exec(conn)
        .await?;

    Ok(())
}

/// Guesses of one game in submission order.
pub async fn list_guesses_for_game<C: ConnectionTrait>(
    conn: &C,
    game_id: GameId,
) -> Result<Vec<Guess>, StoreError> {
    let guesses = Guesses::find()
        .filter(guesses::Column::GameId.eq(game_id))
        .order_by_asc(guesses::Column::Id)
        .all(conn)
        .await?;

    Ok(guesses.into_iter().map(model_to_guess).collect())
}

pub async fn get_game_session<C: ConnectionTrait>(
    conn: &C,
    game_id: GameId,
) -> Result<GameSession, StoreError> {
    GameSessions::find_by_id(game_id)
        .one(conn)
        .await?
        .map(model_to_session)
        .ok_or_else(|| GameError::game_not_found(game_id).into())
}

/// Load a session together with its secret word.
pub async fn load_game<C: ConnectionTrait>(conn: &C, game_id: GameId) -> Result<Game, StoreError> {
    let (session, word) = GameSessions::find_by_id(game_id)
        .find_also_related(Words)
        .one(conn)
        .await?
        .ok_or(GameError::game_not_found(game_id))?;

    let word = word.ok_or_else(|| {
        StoreError::Corrupt(format!(
            "game {} references missing word {}",
            session.id, session.word_id
        ))
    })?;

    Ok(Game::from_parts(model_to_session(session), word.value))
}

/// Like [`load_game`], but a game owned by someone else is reported as
/// missing.
async fn load_owned_game<C: ConnectionTrait>(
    conn: &C,
    game_id: GameId,
    user_id: UserId,
) -> Result<Game, StoreError> {
    let game = load_game(conn, game_id).await?;
    if game.session.user_id != user_id {
        return Err(GameError::game_not_found(game_id).into());
    }
    Ok(game)
}

/// Everything produced by one accepted guess.
#[derive(Debug, Clone)]
pub struct GuessRecorded {
    pub game: Game,
    pub guess: Guess,
    pub transition: GuessTransition,
    /// All guesses of the game, including this one
    pub history: Vec<Guess>,
}

pub struct GameRepository {
    db: DatabaseConnection,
}

impl GameRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Check the quota, draw a word and create the session in one
    /// transaction.
    pub async fn start_game(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        quota: &DailyQuota,
    ) -> Result<Game, StoreError> {
        let txn = self.db.begin().await?;

        if !lock_user_row(&txn, user_id).await? {
            return Err(GameError::user_not_found(user_id).into());
        }

        let games_today = count_games_for_user_on_date(&txn, user_id, local_date(now)).await?;
        quota.ensure_can_start(games_today)?;

        let word = pick_random_word(&txn).await?;
        let game = Game::new(Uuid::new_v4(), user_id, &word, now);
        insert_game_session(&txn, &game.session).await?;

        txn.commit().await?;

        info!(
            game_id = %game.id(),
            user_id = %user_id,
            games_today = games_today + 1,
            "Game started"
        );
        Ok(game)
    }

    /// Apply one guess to a game owned by `user_id` and persist the result.
    pub async fn submit_guess(
        &self,
        game_id: GameId,
        user_id: UserId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<GuessRecorded, StoreError> {
        let txn = self.db.begin().await?;

        lock_game_row(&txn, game_id).await?;
        let mut game = load_owned_game(&txn, game_id, user_id).await?;
        let expected_attempts = game.session.attempts;
        let transition = game.submit_guess(raw)?;

        let guess = insert_guess(&txn, game_id, raw, &transition.feedback().code(), now).await?;
        update_game_session(&txn, &game.session, expected_attempts).await?;
        let history = list_guesses_for_game(&txn, game_id).await?;

        txn.commit().await?;

        if game.is_finished() {
            info!(
                game_id = %game_id,
                user_id = %user_id,
                attempts = game.session.attempts,
                won = game.session.won,
                "Game finished"
            );
        }

        Ok(GuessRecorded {
            game,
            guess,
            transition,
            history,
        })
    }

    pub async fn game_view(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> Result<GameView, StoreError> {
        let game = load_owned_game(&self.db, game_id, user_id).await?;
        let guesses = list_guesses_for_game(&self.db, game_id).await?;
        Ok(game.view(&guesses)?)
    }

    pub async fn get_game_session(&self, game_id: GameId) -> Result<GameSession, StoreError> {
        get_game_session(&self.db, game_id).await
    }

    pub async fn games_started_on(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<u64, StoreError> {
        count_games_for_user_on_date(&self.db, user_id, date).await
    }

    /// Whether `user_id` may start another game on `as_of`.
    pub async fn can_start_game(
        &self,
        user_id: UserId,
        as_of: NaiveDate,
        quota: &DailyQuota,
    ) -> Result<bool, StoreError> {
        let games = count_games_for_user_on_date(&self.db, user_id, as_of).await?;
        Ok(quota.can_start_game(games))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{connect_and_migrate, connect_to_database, connect_to_memory_database};
    use crate::repositories::{UserRepository, WordRepository};
    use chrono::Duration;
    use game_types::{GameStatus, MAX_ATTEMPTS};
    use migration::{Migrator, MigratorTrait};

    struct TestContext {
        db: DatabaseConnection,
        games: GameRepository,
        user_id: UserId,
    }

    async fn setup(words: &[&str]) -> TestContext {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        WordRepository::new(db.clone()).seed(&words).await.unwrap();
        let user = UserRepository::new(db.clone())
            .create_user("player1", "hash", false)
            .await
            .unwrap();

        TestContext {
            games: GameRepository::new(db.clone()),
            db,
            user_id: user.id,
        }
    }

    #[tokio::test]
    async fn test_start_game_creates_fresh_session() {
        let ctx = setup(&["CRANE"]).await;

        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        let stored = ctx.games.get_game_session(game.id()).await.unwrap();
        assert_eq!(stored.attempts, 0);
        assert!(!stored.finished);
        assert!(!stored.won);
        assert_eq!(stored.user_id, ctx.user_id);
    }

    #[tokio::test]
    async fn test_quota_blocks_fourth_game() {
        let ctx = setup(&["CRANE", "SLATE"]).await;
        let quota = DailyQuota::default();
        let now = Utc::now();

        for _ in 0..3 {
            ctx.games.start_game(ctx.user_id, now, &quota).await.unwrap();
        }

        let result = ctx.games.start_game(ctx.user_id, now, &quota).await;
        assert!(matches!(
            result,
            Err(StoreError::Game(GameError::QuotaExceeded { limit: 3 }))
        ));

        let today = ctx.games.games_started_on(ctx.user_id, local_date(now)).await.unwrap();
        assert_eq!(today, 3);
        assert!(!ctx
            .games
            .can_start_game(ctx.user_id, local_date(now), &quota)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_quota_ignores_other_days() {
        let ctx = setup(&["CRANE"]).await;
        let quota = DailyQuota::default();
        let now = Utc::now();
        let earlier = now - Duration::days(2);

        for _ in 0..3 {
            ctx.games.start_game(ctx.user_id, earlier, &quota).await.unwrap();
        }

        assert!(ctx
            .games
            .can_start_game(ctx.user_id, local_date(now), &quota)
            .await
            .unwrap());
        assert!(ctx.games.start_game(ctx.user_id, now, &quota).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_game_with_empty_repository() {
        let ctx = setup(&[]).await;

        let result = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Game(GameError::EmptyRepository))
        ));
        let today = ctx
            .games
            .games_started_on(ctx.user_id, local_date(Utc::now()))
            .await
            .unwrap();
        assert_eq!(today, 0);
    }

    #[tokio::test]
    async fn test_start_game_unknown_user() {
        let ctx = setup(&["CRANE"]).await;

        let result = ctx
            .games
            .start_game(Uuid::new_v4(), Utc::now(), &DailyQuota::default())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Game(GameError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_submit_guess_persists_feedback() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        let recorded = ctx
            .games
            .submit_guess(game.id(), ctx.user_id, "CRANE", Utc::now())
            .await
            .unwrap();

        assert_eq!(recorded.guess.feedback, "GGGXG");
        assert_eq!(recorded.history.len(), 1);
        assert!(matches!(
            recorded.transition,
            GuessTransition::Continuing { remaining_attempts: 4, .. }
        ));

        let view = ctx.games.game_view(game.id(), ctx.user_id).await.unwrap();
        assert_eq!(view.attempts, 1);
        assert_eq!(view.status, GameStatus::Active);
        assert_eq!(view.revealed_word, None);
        assert_eq!(view.guesses[0].feedback, "GGGXG");
    }

    #[tokio::test]
    async fn test_win_on_last_attempt() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        for _ in 0..MAX_ATTEMPTS - 1 {
            ctx.games
                .submit_guess(game.id(), ctx.user_id, "SLOTH", Utc::now())
                .await
                .unwrap();
        }

        let recorded = ctx
            .games
            .submit_guess(game.id(), ctx.user_id, "CRATE", Utc::now())
            .await
            .unwrap();
        assert!(matches!(recorded.transition, GuessTransition::Won { .. }));

        let stored = ctx.games.get_game_session(game.id()).await.unwrap();
        assert_eq!(stored.attempts, MAX_ATTEMPTS);
        assert!(stored.finished);
        assert!(stored.won);
    }

    #[tokio::test]
    async fn test_finished_game_rejects_guess_without_writing() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        ctx.games
            .submit_guess(game.id(), ctx.user_id, "CRATE", Utc::now())
            .await
            .unwrap();

        let result = ctx
            .games
            .submit_guess(game.id(), ctx.user_id, "SLOTH", Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Game(GameError::GameAlreadyFinished { .. }))
        ));

        let guesses = list_guesses_for_game(&ctx.db, game.id()).await.unwrap();
        assert_eq!(guesses.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_guess_does_not_consume_attempt() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        for bad in ["crane", "CRAN", "CRANES", "CR4NE"] {
            let result = ctx
                .games
                .submit_guess(game.id(), ctx.user_id, bad, Utc::now())
                .await;
            assert!(matches!(
                result,
                Err(StoreError::Game(GameError::InvalidGuessFormat { .. }))
            ));
        }

        let stored = ctx.games.get_game_session(game.id()).await.unwrap();
        assert_eq!(stored.attempts, 0);
    }

    #[tokio::test]
    async fn test_other_users_game_is_not_found() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let result = ctx
            .games
            .submit_guess(game.id(), stranger, "CRANE", Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Game(GameError::NotFound { .. }))
        ));
        assert!(ctx.games.game_view(game.id(), stranger).await.is_err());
    }

    #[tokio::test]
    async fn test_stale_update_is_rejected() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        // Two writers load the same snapshot
        let mut first = load_game(&ctx.db, game.id()).await.unwrap();
        let mut second = load_game(&ctx.db, game.id()).await.unwrap();

        first.submit_guess("SLOTH").unwrap();
        update_game_session(&ctx.db, &first.session, 0).await.unwrap();

        second.submit_guess("CRANE").unwrap();
        let result = update_game_session(&ctx.db, &second.session, 0).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        let stored = ctx.games.get_game_session(game.id()).await.unwrap();
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_games() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();
        ctx.games
            .submit_guess(game.id(), ctx.user_id, "CRANE", Utc::now())
            .await
            .unwrap();

        ctx.db
            .execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .unwrap();
        Users::delete_by_id(ctx.user_id).exec(&ctx.db).await.unwrap();

        assert!(matches!(
            ctx.games.get_game_session(game.id()).await,
            Err(StoreError::Game(GameError::NotFound { .. }))
        ));
        assert!(list_guesses_for_game(&ctx.db, game.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_update_rolls_back_guess_insert() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();

        let mut stale = load_game(&ctx.db, game.id()).await.unwrap();
        stale.submit_guess("SLOTH").unwrap();

        let txn = ctx.db.begin().await.unwrap();
        insert_guess(&txn, game.id(), "SLOTH", "XXXGX", Utc::now())
            .await
            .unwrap();
        // Expecting 3 prior attempts against a fresh row matches nothing
        let result = update_game_session(&txn, &stale.session, 3).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        drop(txn);

        assert!(list_guesses_for_game(&ctx.db, game.id()).await.unwrap().is_empty());
        let stored = ctx.games.get_game_session(game.id()).await.unwrap();
        assert_eq!(stored.attempts, 0);
        assert!(!stored.finished);
    }

    #[tokio::test]
    async fn test_undecodable_stored_feedback_is_corrupt() {
        let ctx = setup(&["CRATE"]).await;
        let game = ctx
            .games
            .start_game(ctx.user_id, Utc::now(), &DailyQuota::default())
            .await
            .unwrap();
        insert_guess(&ctx.db, game.id(), "SLOTH", "XXQGX", Utc::now())
            .await
            .unwrap();

        let result = ctx.games.game_view(game.id(), ctx.user_id).await;
        match result {
            Err(StoreError::Corrupt(message)) => assert!(message.contains("'Q'")),
            other => panic!("Expected Corrupt, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_starts_across_pools_respect_quota() {
        let path = std::env::temp_dir().join(format!("guessword-{}.db", Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let db = connect_and_migrate(&url).await.unwrap();
        WordRepository::new(db.clone())
            .seed(&["CRANE".to_string()])
            .await
            .unwrap();
        let user = UserRepository::new(db.clone())
            .create_user("player1", "hash", false)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let games = GameRepository::new(connect_to_database(&url).await.unwrap());
            let user_id = user.id;
            handles.push(tokio::spawn(async move {
                games
                    .start_game(user_id, Utc::now(), &DailyQuota::default())
                    .await
            }));
        }

        let mut started = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => started += 1,
                Err(StoreError::Game(GameError::QuotaExceeded { .. })) => refused += 1,
                Err(other) => panic!("Unexpected error: {}", other),
            }
        }
        assert_eq!(started, 3);
        assert_eq!(refused, 3);

        drop(db);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
