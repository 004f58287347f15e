use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Guesses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Guesses::GameId).uuid().not_null())
                    .col(ColumnDef::new(Guesses::GuessText).string_len(5).not_null())
                    .col(ColumnDef::new(Guesses::Feedback).string_len(5).not_null())
                    .col(
                        ColumnDef::new(Guesses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_guesses_game_id")
                            .from(Guesses::Table, Guesses::GameId)
                            .to(GameSessions::Table, GameSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_guesses_game_id")
                    .table(Guesses::Table)
                    .col(Guesses::GameId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Guesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Guesses {
    Table,
    Id,
    GameId,
    GuessText,
    Feedback,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GameSessions {
    Table,
    Id,
}
