use crate::error::PortalError;
use axum::body::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const FALLBACK_NAME: &str = "document";
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Uploaded bytes written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Local directory holding uploaded files.
///
/// Stored paths are only ever trusted for their final component; every read,
/// write and unlink happens inside `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), PortalError> {
        if fs::try_exists(&self.root).await? {
            return Ok(());
        }
        fs::create_dir_all(&self.root).await?;
        info!(path = %self.root.display(), "created upload directory");
        Ok(())
    }

    /// Stream an upload to a freshly named file, failing once `limit` bytes
    /// are exceeded. Partial files are removed on any error.
    pub async fn create<S, E>(
        &self,
        original_name: &str,
        limit: u64,
        stream: S,
    ) -> Result<StoredFile, PortalError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<PortalError>,
    {
        let (path, mut file) = self.open_unique(original_name).await?;

        match copy_limited(&mut file, stream, limit).await {
            Ok(size) => {
                file.flush().await?;
                Ok(StoredFile { path, size })
            }
            Err(err) => {
                drop(file);
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "failed to remove partial upload");
                }
                Err(err)
            }
        }
    }

    /// Map a stored filepath to its location inside the upload root.
    pub fn resolve(&self, filepath: &str) -> Result<PathBuf, PortalError> {
        Path::new(filepath)
            .file_name()
            .map(|name| self.root.join(name))
            .ok_or_else(|| PortalError::FileMissing(PathBuf::from(filepath)))
    }

    pub async fn read(&self, filepath: &str) -> Result<Vec<u8>, PortalError> {
        let path = self.resolve(filepath)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PortalError::FileMissing(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Unlink a stored file. Callers decide whether a failure matters.
    pub async fn remove(&self, filepath: &str) -> Result<(), PortalError> {
        let path = self.resolve(filepath)?;
        fs::remove_file(&path).await?;
        Ok(())
    }

    async fn open_unique(&self, original_name: &str) -> Result<(PathBuf, fs::File), PortalError> {
        let base = sanitize_basename(original_name);
        let millis = Utc::now().timestamp_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{millis}-{base}")
            } else {
                format!("{millis}-{attempt}-{base}")
            };
            let path = self.root.join(name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free stored name for {base}"),
        )
        .into())
    }
}

async fn copy_limited<S, E>(file: &mut fs::File, stream: S, limit: u64) -> Result<u64, PortalError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<PortalError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        written += chunk.len() as u64;
        if written > limit {
            return Err(PortalError::BadUpload(format!(
                "File exceeds the {limit} byte upload limit."
            )));
        }
        file.write_all(&chunk).await?;
    }

    Ok(written)
}

/// Last path component of a client filename, without control characters.
fn sanitize_basename(original: &str) -> String {
    let last = original
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read_dir failed").count()
    }

    #[test]
    fn basename_strips_directories_and_controls() {
        assert_eq!(sanitize_basename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_basename(r"C:\Users\me\scan.pdf"), "scan.pdf");
        assert_eq!(sanitize_basename("re\u{7}port.pdf"), "report.pdf");
        assert_eq!(sanitize_basename("dir/"), "dir");
        assert_eq!(sanitize_basename("/"), FALLBACK_NAME);
        assert_eq!(sanitize_basename(".."), FALLBACK_NAME);
    }

    #[test]
    fn resolve_stays_inside_root() {
        let store = FileStore::new("/srv/uploads");
        let path = store.resolve("/somewhere/else/123-a.pdf").unwrap();
        assert_eq!(path, PathBuf::from("/srv/uploads/123-a.pdf"));
        assert!(store.resolve("/").is_err());
    }

    #[tokio::test]
    async fn create_writes_all_chunks_with_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let stored = store
            .create("notes.pdf", 1024, chunks(&[b"%PDF-", b"1.4"]))
            .await
            .unwrap();

        assert_eq!(stored.size, 8);
        let name = stored.path.file_name().unwrap().to_str().unwrap();
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "notes.pdf");
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let a = store.create("a.pdf", 64, chunks(&[b"one"])).await.unwrap();
        let b = store.create("a.pdf", 64, chunks(&[b"two"])).await.unwrap();

        assert_ne!(a.path, b.path);
        assert_eq!(std::fs::read(&a.path).unwrap(), b"one");
        assert_eq!(std::fs::read(&b.path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store
            .create("big.pdf", 4, chunks(&[b"abc", b"def"]))
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::BadUpload(_)));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn read_missing_file_is_reported_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let err = store.read("uploads/nope.pdf").await.unwrap_err();
        assert!(matches!(err, PortalError::FileMissing(_)));
        assert!(store.remove("uploads/nope.pdf").await.is_err());
    }

    #[tokio::test]
    async fn ensure_root_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("a/b/uploads"));
        store.ensure_root().await.unwrap();
        store.ensure_root().await.unwrap();
        assert!(store.root().is_dir());
    }
}
