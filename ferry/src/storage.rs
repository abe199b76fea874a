//! Store and retrieve handlers over a rooted directory.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ferry_proto::MAX_PAYLOAD;

use crate::error::StorageError;

/// Monotonic counter for unique temp file names.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Files stored under a root directory, addressed by packet name.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Directory every name is resolved against.
    root: PathBuf,
}

impl Storage {
    /// Creates a storage rooted at `root`. The directory is not touched.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a packet name to a path under the root.
    ///
    /// Rejects names that are empty, not UTF-8, absolute, or contain `..`.
    pub fn resolve(&self, name: &[u8]) -> Result<PathBuf, StorageError> {
        let invalid = || StorageError::InvalidName(String::from_utf8_lossy(name).into_owned());
        let text = std::str::from_utf8(name).map_err(|_| invalid())?;

        let mut rel = PathBuf::new();
        for component in Path::new(text).components() {
            match component {
                Component::Normal(part) => rel.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid());
                }
            }
        }
        if rel.as_os_str().is_empty() {
            return Err(invalid());
        }
        Ok(self.root.join(rel))
    }

    /// Writes `payload` under `name`, creating intermediate directories.
    ///
    /// The bytes land in a temp sibling first and are renamed into place,
    /// so a failed store leaves no partial file behind.
    pub async fn store(&self, name: &[u8], payload: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        let write_err = |source| StorageError::Write {
            name: String::from_utf8_lossy(name).into_owned(),
            source,
        };

        let parent = path.parent().unwrap_or(self.root.as_path());
        if parent != self.root {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let temp_path = temp_sibling(&path);
        let result = async {
            tokio::fs::write(&temp_path, payload).await?;
            tokio::fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Reads the whole file stored under `name`.
    pub async fn retrieve(&self, name: &[u8]) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        let display = || String::from_utf8_lossy(name).into_owned();
        let read_err = |source| StorageError::Read {
            name: display(),
            source,
        };

        let meta = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(display()));
            }
            Err(e) => return Err(read_err(e)),
        };
        if meta.is_dir() {
            return Err(read_err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "is a directory",
            )));
        }
        if meta.len() > MAX_PAYLOAD {
            return Err(StorageError::TooLarge {
                name: display(),
                size: meta.len(),
            });
        }

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound(display())),
            Err(e) => Err(read_err(e)),
        }
    }
}

/// Returns a unique hidden path in the same directory as `path`.
///
/// The temp name does not embed the target's file name, so it stays short
/// even when the target name is at the filesystem limit.
fn temp_sibling(path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".ferry-{}-{seq}", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        (dir, storage)
    }

    #[test]
    fn resolve_joins_relative_names() {
        let storage = Storage::new("/srv");
        assert_eq!(storage.resolve(b"a.txt").unwrap(), Path::new("/srv/a.txt"));
        assert_eq!(
            storage.resolve(b"./docs/b.txt").unwrap(),
            Path::new("/srv/docs/b.txt")
        );
    }

    #[test]
    fn resolve_rejects_escaping_names() {
        let storage = Storage::new("/srv");
        for name in [&b""[..], b".", b"../etc/passwd", b"a/../../b", b"/etc/passwd", b"\xff\xfe"] {
            assert!(
                matches!(storage.resolve(name), Err(StorageError::InvalidName(_))),
                "{name:?}"
            );
        }
    }

    #[tokio::test]
    async fn store_bare_name() {
        let (dir, storage) = storage();
        storage.store(b"a.txt", b"hello").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn store_creates_intermediate_dirs() {
        let (dir, storage) = storage();
        storage.store(b"x/y/z.bin", &[1, 2, 3]).await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("x/y/z.bin")).unwrap(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn store_empty_payload_creates_empty_file() {
        let (dir, storage) = storage();
        storage.store(b"empty", b"").await.unwrap();
        assert_eq!(std::fs::metadata(dir.path().join("empty")).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn store_overwrites_and_leaves_no_temp_files() {
        let (dir, storage) = storage();
        storage.store(b"f", b"first version").await.unwrap();
        storage.store(b"f", b"second").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("f")).unwrap(), b"second");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn store_name_at_limit() {
        let (dir, storage) = storage();
        let name = [b'a'; 255];
        storage.store(&name, b"hello").await.unwrap();
        assert_eq!(storage.retrieve(&name).await.unwrap(), b"hello");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn store_under_a_file_fails() {
        let (dir, storage) = storage();
        std::fs::write(dir.path().join("plain"), b"x").unwrap();
        let err = storage.store(b"plain/child", b"y").await.unwrap_err();
        assert!(matches!(err, StorageError::Write { .. }), "{err}");
    }

    #[tokio::test]
    async fn retrieve_missing() {
        let (_dir, storage) = storage();
        let err = storage.retrieve(b"missing.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref n) if n == "missing.txt"));
        assert_eq!(err.to_string(), "missing.txt: no such file");
    }

    #[tokio::test]
    async fn retrieve_directory_fails() {
        let (dir, storage) = storage();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(matches!(
            storage.retrieve(b"sub").await,
            Err(StorageError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn retrieve_is_repeatable() {
        let (_dir, storage) = storage();
        storage.store(b"data.bin", &[9u8; 4096]).await.unwrap();
        let first = storage.retrieve(b"data.bin").await.unwrap();
        let second = storage.retrieve(b"data.bin").await.unwrap();
        assert_eq!(first.len(), 4096);
        assert_eq!(first, second);
    }
}
