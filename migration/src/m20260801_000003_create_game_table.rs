use sea_orm_migration::prelude::*;

/// Creates the `game` table for storing game metadata, file references and
/// play/like counters.
///
/// `author` is JSON: a bare identifier string for records created through
/// this API, with room for the embedded-object shape found in imported data.
/// `author_id` and a nullable `game_dir_name` exist for legacy rows only.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[allow(clippy::enum_variant_names)]
#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
    CreatedAt,
    LastUpdated,
    Title,
    Description,
    Category,
    GameType,
    Content,
    Image,
    Author,
    AuthorId,
    MainFile,
    AssetFiles,
    Thumbnails,
    SettingsWidth,
    SettingsHeight,
    SettingsFullscreen,
    Likes,
    Plays,
    GameDirName,
}

#[async_trait::async_trait]
#[allow(clippy::too_many_lines)]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Game::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Game::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Game::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Game::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Game::Title).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Game::Description)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Game::Category).string_len(50).not_null())
                    .col(ColumnDef::new(Game::GameType).string_len(20).not_null())
                    .col(ColumnDef::new(Game::Content).text().not_null().default(""))
                    .col(ColumnDef::new(Game::Image).string_len(500).not_null())
                    .col(ColumnDef::new(Game::Author).json().null())
                    .col(ColumnDef::new(Game::AuthorId).string_len(255).null())
                    .col(ColumnDef::new(Game::MainFile).string_len(500).null())
                    .col(ColumnDef::new(Game::AssetFiles).json().not_null())
                    .col(ColumnDef::new(Game::Thumbnails).json().not_null())
                    .col(
                        ColumnDef::new(Game::SettingsWidth)
                            .integer()
                            .not_null()
                            .default(800),
                    )
                    .col(
                        ColumnDef::new(Game::SettingsHeight)
                            .integer()
                            .not_null()
                            .default(600),
                    )
                    .col(
                        ColumnDef::new(Game::SettingsFullscreen)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Game::Likes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Game::Plays)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Game::GameDirName).string_len(100).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Game::Table).to_owned())
            .await
    }
}
