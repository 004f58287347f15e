use game_core::random_index;
use game_types::{GameError, Word, WordId};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{debug, info};

use crate::StoreError;
use crate::entities::{prelude::*, words};

fn model_to_word(model: words::Model) -> Word {
    Word {
        id: model.id,
        value: model.value,
    }
}

/// Uniformly pick one stored word.
pub async fn pick_random_word<C: ConnectionTrait>(conn: &C) -> Result<Word, StoreError> {
    let count = Words::find().count(conn).await?;
    let index = random_index(count, &mut rand::rng())?;

    let word = Words::find()
        .order_by_asc(words::Column::Id)
        .offset(index)
        .limit(1)
        .one(conn)
        .await?
        // A concurrent delete could shrink the table between the two queries
        .ok_or(GameError::EmptyRepository)?;

    debug!(word_id = word.id, "Picked secret word");
    Ok(model_to_word(word))
}

pub async fn find_word<C: ConnectionTrait>(conn: &C, id: WordId) -> Result<Word, StoreError> {
    Words::find_by_id(id)
        .one(conn)
        .await?
        .map(model_to_word)
        .ok_or_else(|| GameError::word_not_found(id).into())
}

pub struct WordRepository {
    db: DatabaseConnection,
}

impl WordRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn pick_random_word(&self) -> Result<Word, StoreError> {
        pick_random_word(&self.db).await
    }

    pub async fn find_by_id(&self, id: WordId) -> Result<Word, StoreError> {
        find_word(&self.db, id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Word>, StoreError> {
        let words = Words::find()
            .order_by_asc(words::Column::Value)
            .all(&self.db)
            .await?;
        Ok(words.into_iter().map(model_to_word).collect())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(Words::find().count(&self.db).await?)
    }

    /// Insert every word not already stored. Returns how many were added.
    pub async fn seed(&self, values: &[String]) -> Result<usize, StoreError> {
        let txn = self.db.begin().await?;
        let mut inserted = 0;

        for value in values {
            let existing = Words::find()
                .filter(words::Column::Value.eq(value.as_str()))
                .one(&txn)
                .await?;
            if existing.is_some() {
                continue;
            }

            words::ActiveModel {
                id: ActiveValue::NotSet,
                value: ActiveValue::Set(value.clone()),
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }

        txn.commit().await?;
        info!(inserted, offered = values.len(), "Seeded word repository");
        Ok(inserted)
    }
}
