use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub async fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path).await?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Basically move a file. Renames `from` -> `to`.
pub async fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    tokio::fs::rename(from.as_ref(), to.as_ref())
        .await
        .with_context(|| {
            format!(
                "Unable to move file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })
}

/// Creates the directory and any missing parents.
pub(crate) async fn make_dir(p: impl AsRef<Path>) -> Result<()> {
    let p = p.as_ref();
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

/// Resolves `p` to an absolute path. The path must exist.
pub(crate) async fn canonicalize(p: impl AsRef<Path>) -> Result<PathBuf> {
    let p = p.as_ref();
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}

/// The paths of the entries in directory `p`, sorted.
pub(crate) async fn read_dir(p: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let p = p.as_ref();
    let mut entries = tokio::fs::read_dir(p)
        .await
        .with_context(|| format!("Unable to read directory {}", p.to_string_lossy()))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Unable to read an entry in {}", p.to_string_lossy()))?
    {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Writes `contents` to a sibling of `path` and then renames it over `path`, so a reader never
/// sees a partially written file.
pub(crate) async fn write_replace(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("The path {} has no file name", path.display()))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    write(&tmp, contents).await?;
    rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_replace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        write(&path, "old").await.unwrap();
        write_replace(&path, "new").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "new");
        let entries = read_dir(dir.path()).await.unwrap();
        assert_eq!(entries, vec![path]);
    }

    #[tokio::test]
    async fn test_canonicalize_missing() {
        let dir = TempDir::new().unwrap();
        assert!(canonicalize(dir.path().join("nope")).await.is_err());
    }
}
