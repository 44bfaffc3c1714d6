use sea_orm_migration::prelude::*;

/// Creates the `game_like` table recording which user liked which game,
/// with a unique index so a user can like a game at most once.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GameLike {
    Table,
    Id,
    GameId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameLike::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameLike::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GameLike::GameId).uuid().not_null())
                    .col(ColumnDef::new(GameLike::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(GameLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_like_game_id")
                            .from(GameLike::Table, GameLike::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_like_game_user")
                    .table(GameLike::Table)
                    .col(GameLike::GameId)
                    .col(GameLike::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameLike::Table).to_owned())
            .await
    }
}
