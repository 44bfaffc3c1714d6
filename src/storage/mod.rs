//! Asset store: the on-disk directory tree holding uploaded game files.
//!
//! Layout mirrors the public URL space: a game's files live in
//! `{root}/games/{game_dir_name}/...` and are referenced from game records as
//! site-relative URLs `/uploads/games/{game_dir_name}/...`. Avatars live in
//! the sibling `{root}/avatars/` directory. All disk mutation for the
//! upload/edit/delete pipelines goes through [`AssetStore`].

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

/// URL prefix under which the asset store root is served.
const URL_PREFIX: &str = "/uploads/";

/// Handle to the uploads root directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

/// A single entry pulled out of an uploaded zip archive.
struct ArchiveEntry {
    /// Path relative to the game directory, as stored in the archive.
    relative: PathBuf,
    /// File contents; `None` for directory entries.
    data: Option<Vec<u8>>,
}

impl AssetStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The uploads root on disk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem directory for a game.
    #[must_use]
    pub fn game_dir(&self, dir_name: &str) -> PathBuf {
        self.root.join("games").join(dir_name)
    }

    /// Create a game's directory (idempotent).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn create_game_dir(&self, dir_name: &str) -> anyhow::Result<PathBuf> {
        let dir = self.game_dir(dir_name);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create game directory {}", dir.display()))?;
        Ok(dir)
    }

    /// Site-relative URL for a file inside a game's directory.
    #[must_use]
    pub fn game_file_url(dir_name: &str, relative: &str) -> String {
        format!("{URL_PREFIX}games/{dir_name}/{relative}")
    }

    /// Site-relative URL for an avatar file.
    #[must_use]
    pub fn avatar_url(file_name: &str) -> String {
        format!("{URL_PREFIX}avatars/{file_name}")
    }

    /// Resolve a stored `/uploads/...` URL to a filesystem path.
    ///
    /// Returns `None` for URLs outside the uploads space or containing parent
    /// traversal; external URLs (placeholders) resolve to nothing.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(URL_PREFIX)?;
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Write a file into a game's directory under its sanitized original
    /// name, appending `_1`, `_2`, ... before the extension on collision.
    ///
    /// Returns the file name actually used.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write fails.
    pub async fn place_file(
        &self,
        dir_name: &str,
        original_name: &str,
        data: &[u8],
    ) -> anyhow::Result<String> {
        let dir = self.create_game_dir(dir_name).await?;
        let safe_name = sanitize_file_name(original_name);

        let mut final_name = safe_name.clone();
        let mut counter = 1;
        while tokio::fs::try_exists(dir.join(&final_name)).await? {
            final_name = numbered_name(&safe_name, counter);
            counter += 1;
        }

        let dest = dir.join(&final_name);
        tokio::fs::write(&dest, data)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(final_name)
    }

    /// Expand a zip archive into a game's directory, preserving the entries'
    /// relative paths. Entries whose file name starts with `.` are skipped,
    /// as are entries that would escape the game directory. The archive
    /// itself is never written to disk.
    ///
    /// Returns the relative paths of the extracted files.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is unreadable or a write fails.
    pub async fn extract_archive(
        &self,
        dir_name: &str,
        archive: &[u8],
    ) -> anyhow::Result<Vec<String>> {
        let entries = read_archive_entries(archive)?;
        let dir = self.create_game_dir(dir_name).await?;

        let mut extracted = Vec::new();
        for entry in entries {
            let dest = dir.join(&entry.relative);
            match entry.data {
                None => {
                    tokio::fs::create_dir_all(&dest).await.with_context(|| {
                        format!("failed to create directory {}", dest.display())
                    })?;
                }
                Some(data) => {
                    if let Some(parent) = dest.parent() {
                        tokio::fs::create_dir_all(parent).await.with_context(|| {
                            format!("failed to create directory {}", parent.display())
                        })?;
                    }
                    tokio::fs::write(&dest, &data)
                        .await
                        .with_context(|| format!("failed to write {}", dest.display()))?;
                    extracted.push(entry.relative.to_string_lossy().into_owned());
                }
            }
        }
        Ok(extracted)
    }

    /// Best-effort removal of the file behind a stored URL. A missing file or
    /// an unresolvable URL is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures other than the file being absent.
    pub async fn remove_url(&self, url: &str) -> anyhow::Result<()> {
        let Some(path) = self.resolve_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    /// Recursively delete a game's entire directory. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures other than the directory being absent.
    pub async fn remove_game_dir(&self, dir_name: &str) -> anyhow::Result<()> {
        let dir = self.game_dir(dir_name);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", dir.display())),
        }
    }

    /// Write an avatar file under `{root}/avatars/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write fails.
    pub async fn place_avatar(&self, file_name: &str, data: &[u8]) -> anyhow::Result<()> {
        let dir = self.root.join("avatars");
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create avatar directory {}", dir.display()))?;
        let dest = dir.join(file_name);
        tokio::fs::write(&dest, data)
            .await
            .with_context(|| format!("failed to write {}", dest.display()))?;
        Ok(())
    }
}

/// Whether a cover-image URL points at a stock placeholder rather than an
/// uploaded file. Placeholders are never deleted from disk.
#[must_use]
pub fn is_placeholder_image(url: &str) -> bool {
    url.contains("placeholder") || url.contains("picsum")
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.trim_matches(['.', '_']).is_empty() {
        "file".to_string()
    } else {
        safe
    }
}

/// `photo.png` -> `photo_1.png`, `archive` -> `archive_1`.
fn numbered_name(name: &str, counter: u32) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}_{counter}.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ),
        _ => format!("{name}_{counter}"),
    }
}

/// Decode all usable entries of a zip archive into memory.
fn read_archive_entries(archive: &[u8]) -> anyhow::Result<Vec<ArchiveEntry>> {
    let cursor = std::io::Cursor::new(archive);
    let mut zip = zip::ZipArchive::new(cursor).context("failed to open zip archive")?;

    let mut entries = Vec::new();
    for index in 0..zip.len() {
        let mut file = zip
            .by_index(index)
            .with_context(|| format!("failed to read zip entry {index}"))?;

        // enclosed_name rejects entries that would escape the target directory
        let Some(relative) = file.enclosed_name() else {
            tracing::warn!(entry = file.name(), "skipping unsafe zip entry");
            continue;
        };

        // Skip hidden files
        let hidden = relative
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }

        if file.is_dir() {
            entries.push(ArchiveEntry {
                relative,
                data: None,
            });
        } else {
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)
                .with_context(|| format!("failed to decompress zip entry {index}"))?;
            entries.push(ArchiveEntry {
                relative,
                data: Some(data),
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            match data {
                Some(bytes) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => {
                    writer.add_directory(*name, options).unwrap();
                }
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_file_name("my game (1).html"), "my_game__1_.html");
        assert_eq!(sanitize_file_name("sprite.png"), "sprite.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("???"), "file");
    }

    #[test]
    fn numbered_name_keeps_extension() {
        assert_eq!(numbered_name("photo.png", 1), "photo_1.png");
        assert_eq!(numbered_name("photo.png", 12), "photo_12.png");
        assert_eq!(numbered_name("archive", 2), "archive_2");
    }

    #[test]
    fn resolve_url_maps_into_root() {
        let store = AssetStore::new("/srv/uploads");
        assert_eq!(
            store.resolve_url("/uploads/games/game_1/main.js"),
            Some(PathBuf::from("/srv/uploads/games/game_1/main.js"))
        );
    }

    #[test]
    fn resolve_url_rejects_traversal_and_foreign_urls() {
        let store = AssetStore::new("/srv/uploads");
        assert_eq!(store.resolve_url("/uploads/../secrets"), None);
        assert_eq!(store.resolve_url("/elsewhere/file.png"), None);
        assert_eq!(store.resolve_url("https://picsum.photos/400/225"), None);
    }

    #[test]
    fn placeholder_urls_are_detected() {
        assert!(is_placeholder_image("https://picsum.photos/400/225"));
        assert!(is_placeholder_image("/images/placeholder.png"));
        assert!(!is_placeholder_image("/uploads/games/game_1/cover.png"));
    }

    #[tokio::test]
    async fn place_file_suffixes_on_collision() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AssetStore::new(tmp.path());

        let first = store.place_file("game_1", "sprite.png", b"one").await.unwrap();
        let second = store.place_file("game_1", "sprite.png", b"two").await.unwrap();

        assert_eq!(first, "sprite.png");
        assert_eq!(second, "sprite_1.png");
        let on_disk = std::fs::read(store.game_dir("game_1").join("sprite_1.png")).unwrap();
        assert_eq!(on_disk, b"two");
    }

    #[tokio::test]
    async fn extract_archive_preserves_structure_and_skips_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AssetStore::new(tmp.path());

        let archive = build_zip(&[
            ("a.png", Some(b"aaa".as_slice())),
            ("sub/", None),
            ("sub/b.png", Some(b"bbb".as_slice())),
            (".DS_Store", Some(b"junk".as_slice())),
        ]);

        let mut extracted = store.extract_archive("game_2", &archive).await.unwrap();
        extracted.sort();

        assert_eq!(extracted, vec!["a.png".to_string(), "sub/b.png".to_string()]);
        assert!(store.game_dir("game_2").join("sub/b.png").is_file());
        assert!(!store.game_dir("game_2").join(".DS_Store").exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AssetStore::new(tmp.path());

        store.place_file("game_3", "main.js", b"x").await.unwrap();
        store.remove_game_dir("game_3").await.unwrap();
        // Second removal of an absent directory is still Ok
        store.remove_game_dir("game_3").await.unwrap();
        store
            .remove_url("/uploads/games/game_3/main.js")
            .await
            .unwrap();
    }
}
