use super::item::ImageStatus;
use super::orchestrator::Session;
use crate::utils::filename::download_file_name;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no item at index {0}")]
    NoSuchItem(usize),
    #[error("item {index} has no image yet (status: {status:?})")]
    NotReady { index: usize, status: ImageStatus },
    #[error("failed to export image to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Session {
    /// Copy a generated image into `dir`, named after its prompt.
    /// An existing file with the same name gets a numeric suffix instead of
    /// being overwritten.
    pub async fn export_image(&self, index: usize, dir: &Path) -> Result<PathBuf, ExportError> {
        let item = self.item(index).await.ok_or(ExportError::NoSuchItem(index))?;
        let image = item.result().ok_or(ExportError::NotReady {
            index,
            status: item.status(),
        })?;

        tokio::fs::create_dir_all(dir).await.map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let target = unique_path(dir, &download_file_name(&item.prompt, &image.format)).await?;
        tokio::fs::copy(&image.image_url, &target)
            .await
            .map_err(|source| ExportError::Io {
                path: target.clone(),
                source,
            })?;

        info!(index, path = %target.display(), "image exported");
        Ok(target)
    }
}

/// First of `name.ext`, `name-2.ext`, `name-3.ext`, ... that does not exist.
/// A path whose existence cannot be checked is an error, never a free slot.
async fn unique_path(dir: &Path, file_name: &str) -> Result<PathBuf, ExportError> {
    let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    let mut n = 1;
    loop {
        let name = match (n, ext.is_empty()) {
            (1, _) => file_name.to_string(),
            (_, true) => format!("{}-{}", stem, n),
            (_, false) => format!("{}-{}.{}", stem, n, ext),
        };
        let candidate = dir.join(name);
        let taken = tokio::fs::try_exists(&candidate)
            .await
            .map_err(|source| ExportError::Io {
                path: candidate.clone(),
                source,
            })?;
        if !taken {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unique_path_skips_taken_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("fox.png"), b"1").unwrap();
        std::fs::write(tmp.path().join("fox-2.png"), b"2").unwrap();

        let path = unique_path(tmp.path(), "fox.png").await.unwrap();
        assert_eq!(path, tmp.path().join("fox-3.png"));
    }

    #[tokio::test]
    async fn test_unique_path_reports_unreadable_location() {
        let tmp = tempfile::TempDir::new().unwrap();
        let not_a_dir = tmp.path().join("plain-file");
        std::fs::write(&not_a_dir, b"x").unwrap();

        let err = unique_path(&not_a_dir, "fox.png").await.unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
