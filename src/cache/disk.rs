//! On-disk image tier
//!
//! Images are stored as PNG files under the disk cache directory. The tier
//! never evicts; files stay until invalidated.
//!
//! With [`DiskKeying::Fixed`] every identifier maps to the same file,
//! `project_lunch.png`, so the tier holds exactly one image: the last one
//! written. [`DiskKeying::Hashed`] names each file after a SHA-256 prefix
//! of the identifier instead.
//!
//! Writes go to a temporary file that is renamed over the target, so a
//! reader never sees a half-written image. Concurrent writers to the same
//! slot are not ordered against each other; the last rename wins.

use crate::config::DiskKeying;
use crate::error::{FetchError, FetchResult};
use crate::payload::Image;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

/// Filename of the single slot used by [`DiskKeying::Fixed`]
pub const FIXED_SLOT_NAME: &str = "project_lunch.png";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Persistent PNG tier
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    keying: DiskKeying,
}

impl DiskCache {
    pub fn new(dir: PathBuf, keying: DiskKeying) -> Self {
        Self { dir, keying }
    }

    /// Directory holding the cached files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keying(&self) -> DiskKeying {
        self.keying
    }

    /// File that `key` is stored in
    pub fn path_for(&self, key: &str) -> PathBuf {
        match self.keying {
            DiskKeying::Fixed => self.dir.join(FIXED_SLOT_NAME),
            DiskKeying::Hashed => self.dir.join(format!("{}.png", hash_key(key))),
        }
    }

    /// Read and decode the file for `key`. A missing file is `Ok(None)`.
    pub async fn load(&self, key: &str) -> FetchResult<Option<Image>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FetchError::fs(&path, &e)),
        };

        debug!("Disk tier hit for {} at {}", key, path.display());
        Image::decode(bytes).map(Some)
    }

    /// Write `image` as PNG to the file for `key`, creating the directory
    /// on first use
    pub async fn store(&self, key: &str, image: &Image) -> FetchResult<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FetchError::fs(&self.dir, &e))?;

        let png = image.to_png()?;
        let path = self.path_for(key);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("png.{}-{}.tmp", std::process::id(), seq));

        fs::write(&tmp, &png)
            .await
            .map_err(|e| FetchError::fs(&tmp, &e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(FetchError::fs(&path, &e));
        }

        debug!("Disk tier stored {} at {}", key, path.display());
        Ok(path)
    }

    /// Delete the file for `key` if present
    pub async fn remove(&self, key: &str) -> FetchResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FetchError::fs(&path, &e)),
        }
    }

    /// Delete every cached PNG, returning how many were removed
    pub async fn clear(&self) -> FetchResult<usize> {
        let mut removed = 0;
        for path in self.files().await? {
            fs::remove_file(&path)
                .await
                .map_err(|e| FetchError::fs(&path, &e))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// All cached PNG files
    pub async fn files(&self) -> FetchResult<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(FetchError::fs(&self.dir, &e)),
        };

        let mut files = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FetchError::fs(&self.dir, &e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// First 12 hex chars of the SHA-256 of `key`
fn hash_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::fixtures;
    use tempfile::TempDir;

    fn image(w: u32, h: u32) -> Image {
        Image::decode(fixtures::png(w, h)).unwrap()
    }

    #[test]
    fn fixed_keying_uses_one_slot() {
        let disk = DiskCache::new(PathBuf::from("/c"), DiskKeying::Fixed);
        assert_eq!(disk.path_for("https://a/1.png"), PathBuf::from("/c/project_lunch.png"));
        assert_eq!(disk.path_for("https://a/2.png"), disk.path_for("https://a/1.png"));
    }

    #[test]
    fn hashed_keying_is_deterministic() {
        let disk = DiskCache::new(PathBuf::from("/c"), DiskKeying::Hashed);
        let a = disk.path_for("https://a/1.png");
        assert_eq!(a, disk.path_for("https://a/1.png"));
        assert_ne!(a, disk.path_for("https://a/2.png"));
        assert_eq!(a.file_name().unwrap().len(), "0123456789ab.png".len());
    }

    #[tokio::test]
    async fn two_writes_leave_one_file_in_fixed_mode() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::new(temp.path().join("DiskCache"), DiskKeying::Fixed);

        disk.store("https://example.com/a.png", &image(2, 2)).await.unwrap();
        disk.store("https://example.com/b.png", &image(3, 1)).await.unwrap();

        let files = disk.files().await.unwrap();
        assert_eq!(files.len(), 1);

        // The slot holds the last write, whatever key asks for it
        let loaded = disk.load("https://example.com/a.png").await.unwrap().unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 1));
    }

    #[tokio::test]
    async fn hashed_mode_keeps_both() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::new(temp.path().to_path_buf(), DiskKeying::Hashed);

        disk.store("a", &image(2, 2)).await.unwrap();
        disk.store("b", &image(3, 1)).await.unwrap();

        assert_eq!(disk.files().await.unwrap().len(), 2);
        let a = disk.load("a").await.unwrap().unwrap();
        assert_eq!(a.width(), 2);
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::new(temp.path().join("absent"), DiskKeying::Fixed);
        assert!(disk.load("x").await.unwrap().is_none());
        assert!(disk.files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_decode_failure() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::new(temp.path().to_path_buf(), DiskKeying::Fixed);
        std::fs::write(disk.path_for("x"), b"not a png").unwrap();

        assert!(matches!(
            disk.load("x").await.unwrap_err(),
            FetchError::DecodeFailure(_)
        ));
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::new(temp.path().to_path_buf(), DiskKeying::Hashed);
        disk.store("a", &image(1, 1)).await.unwrap();
        disk.store("b", &image(1, 1)).await.unwrap();

        disk.remove("a").await.unwrap();
        disk.remove("a").await.unwrap();
        assert_eq!(disk.files().await.unwrap().len(), 1);

        assert_eq!(disk.clear().await.unwrap(), 1);
        assert!(disk.files().await.unwrap().is_empty());
    }
}
