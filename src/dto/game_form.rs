//! Typed views of the multipart payloads consumed by the upload and edit
//! pipelines. Fields are parsed and validated here, once, at the pipeline
//! boundary; handlers and services never touch raw multipart state.

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::entities::GameType;
use crate::error::AppError;

/// An uploaded file buffered in memory.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl FilePart {
    /// Whether this part is an archive that the pipelines expand in place.
    #[must_use]
    pub fn is_zip(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".zip")
    }
}

/// Playback configuration carried on the `settings` multipart field as a
/// JSON string.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub fullscreen: bool,
}

const fn default_width() -> i32 {
    800
}

const fn default_height() -> i32 {
    600
}

/// `POST /games` payload: all metadata fields and the main file are required.
#[derive(Debug)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub game_type: GameType,
    pub main_file: FilePart,
    pub asset_files: Vec<FilePart>,
    pub thumbnail: Option<FilePart>,
}

/// `PUT /games/{id}` payload: every field is optional; absent fields leave
/// the record untouched.
#[derive(Debug, Default)]
pub struct EditForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub game_type: Option<GameType>,
    pub settings: Option<PlaybackSettings>,
    pub main_file: Option<FilePart>,
    pub image: Option<FilePart>,
    pub remove_game_file: bool,
    pub remove_image_file: bool,
    pub remove_asset_files: Vec<String>,
    pub asset_files: Vec<FilePart>,
}

/// Accumulates fields common to both forms while draining the multipart body.
#[derive(Debug, Default)]
struct RawForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    game_type: Option<String>,
    settings: Option<String>,
    main_file: Option<FilePart>,
    image: Option<FilePart>,
    remove_game_file: bool,
    remove_image_file: bool,
    remove_asset_files: Option<String>,
    asset_files: Vec<FilePart>,
}

impl RawForm {
    async fn drain(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut raw = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => raw.title = Some(text(field).await?),
                "description" => raw.description = Some(text(field).await?),
                "category" => raw.category = Some(text(field).await?),
                "gameType" => raw.game_type = Some(text(field).await?),
                "settings" => raw.settings = Some(text(field).await?),
                "removeGameFile" => raw.remove_game_file = text(field).await? == "true",
                "removeImageFile" => raw.remove_image_file = text(field).await? == "true",
                "removeAssetFiles" => raw.remove_asset_files = Some(text(field).await?),
                // Clients send the asset part count alongside the parts; the
                // parts themselves are discovered by name prefix.
                "assetFilesCount" => {
                    let _ = text(field).await?;
                }
                "mainFile" | "gameFile" => raw.main_file = file(field).await?,
                "image" | "thumbnailFile" => raw.image = file(field).await?,
                n if n.starts_with("assetFile_") => {
                    if let Some(part) = file(field).await? {
                        raw.asset_files.push(part);
                    }
                }
                _ => {}
            }
        }

        Ok(raw)
    }

    fn parsed_game_type(&self) -> Result<Option<GameType>, AppError> {
        match self.game_type.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => GameType::from_str(s)
                .map(Some)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown game type: {s}"))),
        }
    }

    /// Parsed `settings` JSON; a malformed value is logged and ignored.
    fn parsed_settings(&self) -> Option<PlaybackSettings> {
        let text = self.settings.as_deref()?;
        match serde_json::from_str(text) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed settings field");
                None
            }
        }
    }

    /// Parsed `removeAssetFiles` JSON array; a malformed value is logged and
    /// treated as empty.
    fn parsed_remove_asset_files(&self) -> Vec<String> {
        let Some(text) = self.remove_asset_files.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str(text) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed removeAssetFiles field");
                Vec::new()
            }
        }
    }
}

impl UploadForm {
    /// Parse and validate an upload payload.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when a required field or the main file is missing,
    /// or the multipart body is malformed.
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, AppError> {
        let raw = RawForm::drain(multipart).await?;

        let title = required(raw.title.as_deref(), "title")?;
        let description = required(raw.description.as_deref(), "description")?;
        let category = required(raw.category.as_deref(), "category")?;
        validate_lengths(&title, &description)?;
        let game_type = raw
            .parsed_game_type()?
            .ok_or_else(|| AppError::BadRequest("Missing required field: gameType".to_string()))?;

        let main_file = raw
            .main_file
            .ok_or_else(|| AppError::BadRequest("Missing main game file".to_string()))?;

        Ok(Self {
            title,
            description,
            category,
            game_type,
            main_file,
            asset_files: raw.asset_files,
            thumbnail: raw.image,
        })
    }
}

impl EditForm {
    /// Parse an edit payload. Unlike uploads, everything is optional here;
    /// cross-field rules (e.g. image removal without replacement) are
    /// enforced by the edit pipeline against the stored record.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when the multipart body is malformed or a
    /// supplied `gameType` is not a known type.
    pub async fn from_multipart(multipart: Multipart) -> Result<Self, AppError> {
        let raw = RawForm::drain(multipart).await?;

        let game_type = raw.parsed_game_type()?;
        let settings = raw.parsed_settings();
        let remove_asset_files = raw.parsed_remove_asset_files();

        validate_lengths(
            raw.title.as_deref().unwrap_or_default(),
            raw.description.as_deref().unwrap_or_default(),
        )?;

        Ok(Self {
            title: raw.title.filter(|s| !s.is_empty()),
            description: raw.description.filter(|s| !s.is_empty()),
            category: raw.category.filter(|s| !s.is_empty()),
            game_type,
            settings,
            main_file: raw.main_file,
            image: raw.image,
            remove_game_file: raw.remove_game_file,
            remove_image_file: raw.remove_image_file,
            remove_asset_files,
            asset_files: raw.asset_files,
        })
    }
}

/// The body-size ceiling surfaces as a distinct 413; everything else about a
/// broken multipart stream is the caller's 400.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the size limit".to_string())
    } else {
        AppError::BadRequest(format!("Multipart error: {e}"))
    }
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

/// Buffer a file field; parts without content are treated as absent.
async fn file(field: Field<'_>) -> Result<Option<FilePart>, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let data = field.bytes().await.map_err(multipart_error)?;

    if data.is_empty() {
        return Ok(None);
    }

    Ok(Some(FilePart {
        file_name,
        data: data.to_vec(),
    }))
}

fn validate_lengths(title: &str, description: &str) -> Result<(), AppError> {
    if title.len() > 100 {
        return Err(AppError::BadRequest(
            "Title cannot be more than 100 characters".to_string(),
        ));
    }
    if description.len() > 500 {
        return Err(AppError::BadRequest(
            "Description cannot be more than 500 characters".to_string(),
        ));
    }
    Ok(())
}

fn required(value: Option<&str>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(format!(
            "Missing required field: {name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_detection_is_case_insensitive() {
        let part = FilePart {
            file_name: "Assets.ZIP".to_string(),
            data: vec![1],
        };
        assert!(part.is_zip());

        let part = FilePart {
            file_name: "assets.zip.png".to_string(),
            data: vec![1],
        };
        assert!(!part.is_zip());
    }

    #[test]
    fn settings_parse_uses_defaults_for_missing_keys() {
        let raw = RawForm {
            settings: Some(r#"{"width": 1024}"#.to_string()),
            ..Default::default()
        };
        let settings = raw.parsed_settings().map(|s| (s.width, s.height, s.fullscreen));
        assert_eq!(settings, Some((1024, 600, false)));
    }

    #[test]
    fn malformed_settings_are_ignored() {
        let raw = RawForm {
            settings: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(raw.parsed_settings().is_none());
    }

    #[test]
    fn malformed_removal_list_is_empty() {
        let raw = RawForm {
            remove_asset_files: Some("not json".to_string()),
            ..Default::default()
        };
        assert!(raw.parsed_remove_asset_files().is_empty());
    }

    #[test]
    fn unknown_game_type_is_rejected() {
        let raw = RawForm {
            game_type: Some("flash".to_string()),
            ..Default::default()
        };
        assert!(raw.parsed_game_type().is_err());
    }
}
