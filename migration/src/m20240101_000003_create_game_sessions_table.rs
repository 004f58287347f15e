use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameSessions::UserId).uuid().not_null())
                    .col(ColumnDef::new(GameSessions::WordId).integer().not_null())
                    .col(
                        ColumnDef::new(GameSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameSessions::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameSessions::Finished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GameSessions::Won)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_sessions_user_id")
                            .from(GameSessions::Table, GameSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_sessions_word_id")
                            .from(GameSessions::Table, GameSessions::WordId)
                            .to(Words::Table, Words::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily quota counts games per user within a started_at range
        manager
            .create_index(
                Index::create()
                    .name("idx_game_sessions_user_started_at")
                    .table(GameSessions::Table)
                    .col(GameSessions::UserId)
                    .col(GameSessions::StartedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_sessions_started_at")
                    .table(GameSessions::Table)
                    .col(GameSessions::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameSessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GameSessions {
    Table,
    Id,
    UserId,
    WordId,
    StartedAt,
    Attempts,
    Finished,
    Won,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Words {
    Table,
    Id,
}
