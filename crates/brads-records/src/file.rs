//! Typed JSON record files with atomic replacement.
//!
//! Each record is a single JSON document in its own file. Writes use the
//! temp-file-then-rename pattern: on POSIX systems a rename within one
//! filesystem is atomic, so a reader never observes a partially-written
//! record and a crash mid-write leaves the previous record intact. The
//! temporary file may be left behind after a crash; a subsequent successful
//! write replaces it.

use crate::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Reads and decodes the JSON record at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read (a
/// missing record surfaces as the not-found IO condition) and
/// [`Error::Json`](crate::Error::Json) if its contents are not a valid
/// encoding of `T`.
pub async fn read_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let bytes = tokio::fs::read(path.as_ref()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes `value` and atomically replaces the record at `path` with it.
///
/// The record is first written to a sibling `.tmp` file, then renamed over
/// the target. On failure the target is left unchanged and the temporary
/// file is removed on a best-effort basis.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if `value` fails to
/// serialize, or [`Error::Io`](crate::Error::Io) if the temporary file
/// cannot be written or the rename fails.
pub async fn write_json<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let bytes = serde_json::to_vec(value)?;
    if let Err(err) = tokio::fs::write(&temp_path, bytes).await {
        // Best-effort cleanup of temp file
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err.into());
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Derives the temporary path used while replacing `path`.
///
/// Record files in numeric-ID directories are extensionless, so the `.tmp`
/// suffix also keeps the temporary file invisible to ID listings.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: u32,
        name: String,
    }

    #[test]
    fn make_temp_path_without_extension() {
        let path = Path::new("/ns/issues/3/0");
        let temp = make_temp_path(path);
        assert_eq!(temp, Path::new("/ns/issues/3/0.tmp"));
    }

    #[test]
    fn make_temp_path_with_extension() {
        let path = Path::new("/path/to/record.json");
        let temp = make_temp_path(path);
        assert_eq!(temp, Path::new("/path/to/record.json.tmp"));
    }

    #[tokio::test]
    async fn round_trips_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1");

        let record = TestRecord {
            id: 7,
            name: "Alice".to_string(),
        };
        write_json(&path, &record).await.unwrap();

        let read: TestRecord = read_json(&path).await.unwrap();
        assert_eq!(read, record);
    }

    #[tokio::test]
    async fn write_replaces_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0");

        tokio::fs::write(&path, "old content").await.unwrap();
        let record = TestRecord {
            id: 42,
            name: "New".to_string(),
        };
        write_json(&path, &record).await.unwrap();

        let read: TestRecord = read_json(&path).await.unwrap();
        assert_eq!(read, record);
    }

    #[tokio::test]
    async fn temp_file_is_gone_after_successful_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2");

        let record = TestRecord {
            id: 1,
            name: "Test".to_string(),
        };
        write_json(&path, &record).await.unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("2.tmp").exists());
    }

    #[tokio::test]
    async fn read_missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<TestRecord, _>(dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let record = TestRecord {
            id: 1,
            name: "Test".to_string(),
        };
        let err = write_json(dir.path().join("no-such-dir").join("1"), &record)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
