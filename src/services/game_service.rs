//! Upload, edit and delete pipelines for games.
//!
//! These are the only multi-step mutations in the system: they touch both the
//! asset store and the game table, with no transaction spanning the two.
//! Ordering is deliberate and mirrors the error contract: files are written
//! before the record on upload (a storage failure prevents the insert; files
//! already on disk stay behind for manual cleanup), and on delete the record
//! removal proceeds even when disk cleanup fails.

use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::dto::{EditForm, FilePart, UploadForm};
use crate::entities::{game, user};
use crate::error::AppError;
use crate::storage::{AssetStore, is_placeholder_image};

pub struct GameService;

impl GameService {
    /// Create a game from an upload payload: allocate the game directory,
    /// persist the main file, asset files (expanding zip archives) and the
    /// optional thumbnail, then insert the record.
    ///
    /// # Errors
    ///
    /// `Storage` if any file write fails (no record is inserted), `Internal`
    /// if the insert itself fails.
    pub async fn upload(
        db: &DatabaseConnection,
        assets: &AssetStore,
        author: &user::Model,
        placeholder_image: &str,
        form: UploadForm,
    ) -> Result<game::Model, AppError> {
        let game_id = Uuid::new_v4();
        let dir_name = format!("game_{game_id}");

        assets
            .create_game_dir(&dir_name)
            .await
            .map_err(AppError::Storage)?;
        tracing::info!(game_id = %game_id, dir = %dir_name, "created game directory");

        let main_name = assets
            .place_file(&dir_name, &form.main_file.file_name, &form.main_file.data)
            .await
            .map_err(AppError::Storage)?;
        let main_url = AssetStore::game_file_url(&dir_name, &main_name);

        let mut asset_urls = Vec::new();
        for part in &form.asset_files {
            Self::store_asset_part(assets, &dir_name, part, &mut asset_urls).await?;
        }

        let (image, thumbnails) = match form.thumbnail {
            Some(part) => {
                let name = assets
                    .place_file(&dir_name, &part.file_name, &part.data)
                    .await
                    .map_err(AppError::Storage)?;
                let url = AssetStore::game_file_url(&dir_name, &name);
                (url.clone(), vec![url])
            }
            None => (placeholder_image.to_string(), Vec::new()),
        };

        let now = chrono::Utc::now().fixed_offset();
        let record = game::ActiveModel {
            id: Set(game_id),
            created_at: Set(now),
            last_updated: Set(now),
            title: Set(form.title),
            description: Set(form.description),
            category: Set(form.category),
            game_type: Set(form.game_type.as_str().to_string()),
            content: Set(String::new()),
            image: Set(image),
            author: Set(Some(serde_json::Value::String(author.id.to_string()))),
            author_id: Set(None),
            main_file: Set(Some(main_url)),
            asset_files: Set(serde_json::json!(asset_urls)),
            thumbnails: Set(serde_json::json!(thumbnails)),
            settings_width: Set(800),
            settings_height: Set(600),
            settings_fullscreen: Set(true),
            likes: Set(0),
            plays: Set(0),
            game_dir_name: Set(Some(dir_name)),
        };

        let created = record.insert(db).await?;
        tracing::info!(game_id = %created.id, title = %created.title, "game uploaded");
        Ok(created)
    }

    /// Apply an edit payload to an existing game.
    ///
    /// Only fields present in the payload are touched; `last_updated` is
    /// bumped on success. A legacy record without a directory name gets
    /// `game_{id}` assigned and persisted here.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Forbidden` when the caller is not the
    /// owner, `BadRequest` when image removal lacks a replacement, `Storage`
    /// when a file write fails.
    #[allow(clippy::too_many_lines)]
    pub async fn update(
        db: &DatabaseConnection,
        assets: &AssetStore,
        caller: &user::Model,
        game_id: Uuid,
        form: EditForm,
    ) -> Result<game::Model, AppError> {
        let existing = Self::find_game(db, game_id).await?;

        if !existing.is_owned_by(caller.id, &caller.email) {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this game".to_string(),
            ));
        }

        // A cover image is mandatory: removal requires a replacement.
        if form.remove_image_file && form.image.is_none() {
            return Err(AppError::BadRequest(
                "A cover image is required".to_string(),
            ));
        }

        // Legacy records predating game_dir_name get one on first edit.
        let dir_name = existing
            .game_dir_name
            .clone()
            .unwrap_or_else(|| format!("game_{game_id}"));
        let assign_dir_name = existing.game_dir_name.is_none();

        let mut active: game::ActiveModel = existing.clone().into();

        if let Some(title) = form.title {
            active.title = Set(title);
        }
        if let Some(description) = form.description {
            active.description = Set(description);
        }
        if let Some(category) = form.category {
            active.category = Set(category);
        }
        if let Some(game_type) = form.game_type {
            active.game_type = Set(game_type.as_str().to_string());
        }
        if let Some(settings) = form.settings {
            active.settings_width = Set(settings.width);
            active.settings_height = Set(settings.height);
            active.settings_fullscreen = Set(settings.fullscreen);
        }

        // Main file: replace, or remove when explicitly flagged.
        if let Some(part) = &form.main_file {
            let name = assets
                .place_file(&dir_name, &part.file_name, &part.data)
                .await
                .map_err(AppError::Storage)?;

            if let Some(old) = &existing.main_file {
                Self::best_effort_remove(assets, old, "previous main file").await;
            }
            active.main_file = Set(Some(AssetStore::game_file_url(&dir_name, &name)));
        } else if form.remove_game_file {
            if let Some(old) = &existing.main_file {
                Self::best_effort_remove(assets, old, "main file").await;
            }
            active.main_file = Set(None);
        }

        // Cover image: replace, deleting the old one unless it is a stock
        // placeholder.
        if let Some(part) = &form.image {
            let name = assets
                .place_file(&dir_name, &part.file_name, &part.data)
                .await
                .map_err(AppError::Storage)?;

            if !is_placeholder_image(&existing.image) {
                Self::best_effort_remove(assets, &existing.image, "previous cover image").await;
            }
            active.image = Set(AssetStore::game_file_url(&dir_name, &name));
        }

        let mut asset_urls = existing.asset_file_list();

        // Explicit removals: best-effort on disk, always dropped from the set.
        if !form.remove_asset_files.is_empty() {
            for url in &form.remove_asset_files {
                Self::best_effort_remove(assets, url, "asset file").await;
            }
            asset_urls.retain(|url| !form.remove_asset_files.contains(url));
        }

        let mut assets_changed = !form.remove_asset_files.is_empty();
        for part in &form.asset_files {
            Self::store_asset_part(assets, &dir_name, part, &mut asset_urls).await?;
            assets_changed = true;
        }
        if assets_changed {
            active.asset_files = Set(serde_json::json!(asset_urls));
        }

        if assign_dir_name {
            active.game_dir_name = Set(Some(dir_name));
        }
        active.last_updated = Set(chrono::Utc::now().fixed_offset());

        let updated = active.update(db).await?;
        tracing::info!(game_id = %updated.id, "game updated");
        Ok(updated)
    }

    /// Delete a game: best-effort disk cleanup, then record removal.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Forbidden` when the caller is not the
    /// owner, `Internal` if the record delete fails.
    pub async fn delete(
        db: &DatabaseConnection,
        assets: &AssetStore,
        caller: &user::Model,
        game_id: Uuid,
    ) -> Result<(), AppError> {
        let existing = Self::find_game(db, game_id).await?;

        if !existing.is_owned_by(caller.id, &caller.email) {
            return Err(AppError::Forbidden(
                "You do not have permission to delete this game".to_string(),
            ));
        }

        // Policy point: disk-cleanup failures are logged and never block the
        // record delete. Change the handling here to change the policy.
        if let Err(err) = Self::purge_assets(assets, &existing).await {
            tracing::warn!(
                game_id = %game_id,
                error = %err,
                "asset cleanup failed; deleting record anyway"
            );
        }

        game::Entity::delete_by_id(game_id).exec(db).await?;
        tracing::info!(game_id = %game_id, "game deleted");
        Ok(())
    }

    /// Load a game or fail with `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists for the id.
    pub async fn find_game(
        db: &DatabaseConnection,
        game_id: Uuid,
    ) -> Result<game::Model, AppError> {
        game::Entity::find_by_id(game_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
    }

    /// Store one asset part: zip archives are expanded into their member
    /// files, anything else is copied under its sanitized name.
    async fn store_asset_part(
        assets: &AssetStore,
        dir_name: &str,
        part: &FilePart,
        asset_urls: &mut Vec<String>,
    ) -> Result<(), AppError> {
        if part.is_zip() {
            let extracted = assets
                .extract_archive(dir_name, &part.data)
                .await
                .map_err(AppError::Storage)?;
            tracing::info!(
                archive = %part.file_name,
                files = extracted.len(),
                "expanded asset archive"
            );
            for relative in extracted {
                asset_urls.push(AssetStore::game_file_url(dir_name, &relative));
            }
        } else {
            let name = assets
                .place_file(dir_name, &part.file_name, &part.data)
                .await
                .map_err(AppError::Storage)?;
            asset_urls.push(AssetStore::game_file_url(dir_name, &name));
        }
        Ok(())
    }

    /// Remove the whole asset footprint of a game: cover image (unless a
    /// placeholder), then the game directory, falling back to per-file
    /// deletion for legacy records without one.
    async fn purge_assets(assets: &AssetStore, game: &game::Model) -> anyhow::Result<()> {
        if !is_placeholder_image(&game.image) {
            assets.remove_url(&game.image).await?;
        }

        if let Some(dir_name) = &game.game_dir_name {
            assets.remove_game_dir(dir_name).await?;
        } else {
            if let Some(main) = &game.main_file {
                assets.remove_url(main).await?;
            }
            for url in game.asset_file_list() {
                assets.remove_url(&url).await?;
            }
        }
        Ok(())
    }

    /// Delete a file behind a stored URL, logging failures instead of
    /// propagating them.
    async fn best_effort_remove(assets: &AssetStore, url: &str, what: &str) {
        if let Err(err) = assets.remove_url(url).await {
            tracing::warn!(url = %url, error = %err, "failed to remove {what}");
        }
    }
}
