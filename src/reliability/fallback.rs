// Append serialized events to a JSON lines file when the broker cannot take them.
// The file is opened on first use and shared by every publisher worker; each line is
// written with a single `write_all` under the mutex so lines never interleave.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to open fallback file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write fallback file: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SinkStats {
    pub lines_written: u64,
    pub bytes_written: u64,
    pub write_failures: u64,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    file: OnceCell<Mutex<File>>,
    lines_written: AtomicU64,
    bytes_written: AtomicU64,
    write_failures: AtomicU64,
}

/// Shared append-only fallback target. Cloning shares the same file handle.
#[derive(Debug, Clone)]
pub struct FallbackSink {
    inner: Arc<Inner>,
}

impl FallbackSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                file: OnceCell::new(),
                lines_written: AtomicU64::new(0),
                bytes_written: AtomicU64::new(0),
                write_failures: AtomicU64::new(0),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Append `payload` followed by a newline.
    ///
    /// An open failure is not cached: the next call tries to open the file again.
    pub async fn write(&self, payload: &[u8]) -> Result<(), SinkError> {
        let result = self.append_line(payload).await;
        match &result {
            Ok(()) => {
                self.inner.lines_written.fetch_add(1, Ordering::Relaxed);
                self.inner
                    .bytes_written
                    .fetch_add(payload.len() as u64 + 1, Ordering::Relaxed);
            }
            Err(_) => {
                self.inner.write_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Flush and fsync the file if it was ever opened.
    pub async fn sync(&self) -> Result<(), SinkError> {
        if let Some(file) = self.inner.file.get() {
            let mut file = file.lock().await;
            file.flush().await?;
            file.sync_data().await?;
        }
        Ok(())
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            lines_written: self.inner.lines_written.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            write_failures: self.inner.write_failures.load(Ordering::Relaxed),
        }
    }

    async fn append_line(&self, payload: &[u8]) -> Result<(), SinkError> {
        let file = self
            .inner
            .file
            .get_or_try_init(|| Self::open(&self.inner.path))
            .await?;

        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');

        let mut file = file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn open(path: &Path) -> Result<Mutex<File>, SinkError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Open {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Opened fallback file {}", path.display());
        Ok(Mutex::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn appends_one_line_per_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fallback.log");
        let sink = FallbackSink::new(&path);

        sink.write(br#"{"n":1}"#).await.unwrap();
        sink.write(br#"{"n":2}"#).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "{\"n\":1}\n{\"n\":2}\n");

        let stats = sink.stats();
        assert_eq!(stats.lines_written, 2);
        assert_eq!(stats.bytes_written, 16);
        assert_eq!(stats.write_failures, 0);
    }

    #[tokio::test]
    async fn keeps_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fallback.log");
        tokio::fs::write(&path, "previous\n").await.unwrap();

        let sink = FallbackSink::new(&path);
        sink.write(b"next").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "previous\nnext\n");
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/fallback.log");
        let sink = FallbackSink::new(&path);

        sink.write(b"line").await.unwrap();
        sink.sync().await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_failure_is_counted_and_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let sink = FallbackSink::new(temp_dir.path());

        let err = sink.write(b"line").await.unwrap_err();
        assert!(matches!(err, SinkError::Open { .. }));
        assert_eq!(sink.stats().write_failures, 1);
        assert_eq!(sink.stats().lines_written, 0);
    }

    #[tokio::test]
    async fn clones_share_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shared.log");
        let sink = FallbackSink::new(&path);

        let mut handles = Vec::new();
        for worker in 0..5 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..20 {
                    sink.write(format!("worker-{worker}-{i}").as_bytes())
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 100);
        assert!(content.lines().all(|line| line.starts_with("worker-")));
        assert_eq!(sink.stats().lines_written, 100);
    }
}
